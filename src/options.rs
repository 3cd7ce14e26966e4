//! Extraction options and configuration.

use std::path::PathBuf;

use chrono::Datelike;

use crate::parser::TableDetectorConfig;

/// Phrase that introduces the statement total on credit-card invoices.
pub const DEFAULT_TOTAL_PHRASE: &str = "total da sua fatura é";

/// Footer boilerplate that ends the transaction list.
pub const DEFAULT_END_MARKERS: [&str; 4] = [
    "Lançamentosnocartão",
    "Lançamentos nocartão",
    "Lançamentos no cartão",
    "LANCAMENTOSNOCARTAO",
];

/// Options for extracting a statement.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Error handling mode during structural conversion
    pub error_mode: ErrorMode,

    /// Raw-text engine for the line strategy
    pub text_engine: TextEngine,

    /// Phrase that precedes the statement total
    pub total_phrase: String,

    /// Header markers of the date column
    pub date_markers: Vec<String>,

    /// Header markers of the description column
    pub establishment_markers: Vec<String>,

    /// Header markers of the value column
    pub value_markers: Vec<String>,

    /// Rows matching any of these end the transaction list
    pub end_markers: Vec<String>,

    /// Year assumed for `DD/MM` dates (None = current year)
    pub reference_year: Option<i32>,

    /// Emit dates as `YYYY-MM-DD` when they parse
    pub iso_dates: bool,

    /// Characters kept in the result's text sample
    pub sample_len: usize,

    /// Lines shorter than this are skipped by the generic line parser
    pub min_generic_line_len: usize,

    /// Directory for decrypted temporary copies (None = OS temp dir)
    pub temp_dir: Option<PathBuf>,

    /// Stream-mode table detection thresholds
    pub table_detector: TableDetectorConfig,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (skip pages that fail to render).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Set the raw-text engine.
    pub fn with_text_engine(mut self, engine: TextEngine) -> Self {
        self.text_engine = engine;
        self
    }

    /// Set the statement-total phrase.
    pub fn with_total_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.total_phrase = phrase.into();
        self
    }

    /// Replace the date-column markers.
    pub fn with_date_markers<S: Into<String>>(mut self, markers: impl IntoIterator<Item = S>) -> Self {
        self.date_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the description-column markers.
    pub fn with_establishment_markers<S: Into<String>>(
        mut self,
        markers: impl IntoIterator<Item = S>,
    ) -> Self {
        self.establishment_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the value-column markers.
    pub fn with_value_markers<S: Into<String>>(mut self, markers: impl IntoIterator<Item = S>) -> Self {
        self.value_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the end-of-transactions markers.
    pub fn with_end_markers<S: Into<String>>(mut self, markers: impl IntoIterator<Item = S>) -> Self {
        self.end_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// Set the year assumed for dates without one.
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    /// Emit ISO-8601 dates.
    pub fn iso_dates(mut self) -> Self {
        self.iso_dates = true;
        self
    }

    /// Set the text sample length.
    pub fn with_sample_len(mut self, len: usize) -> Self {
        self.sample_len = len;
        self
    }

    /// Set the generic parser's minimum line length.
    pub fn with_min_generic_line_len(mut self, len: usize) -> Self {
        self.min_generic_line_len = len;
        self
    }

    /// Set the directory for decrypted temporary copies.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Set table detector thresholds.
    pub fn with_table_detector(mut self, config: TableDetectorConfig) -> Self {
        self.table_detector = config;
        self
    }

    /// The configured reference year, or the current local year.
    pub fn effective_year(&self) -> i32 {
        self.reference_year
            .unwrap_or_else(|| chrono::Local::now().year())
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            text_engine: TextEngine::PdfExtract,
            total_phrase: DEFAULT_TOTAL_PHRASE.to_string(),
            date_markers: vec!["data".to_string()],
            establishment_markers: ["estabelecimento", "descricao", "historico"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            value_markers: ["valor", "r$", "us$"].iter().map(|s| s.to_string()).collect(),
            end_markers: DEFAULT_END_MARKERS.iter().map(|s| s.to_string()).collect(),
            reference_year: None,
            iso_dates: false,
            sample_len: 500,
            min_generic_line_len: 10,
            temp_dir: None,
            table_detector: TableDetectorConfig::default(),
        }
    }
}

/// Error handling mode during structural conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any page error
    #[default]
    Strict,
    /// Skip pages that fail and continue
    Lenient,
}

/// Which engine produces raw text for the line strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEngine {
    /// `pdf-extract` over the plain document bytes
    #[default]
    PdfExtract,
    /// Positioned spans grouped into baseline lines
    Layout,
}
