//! Pipeline orchestration: load, structure or extract text, normalize.
//!
//! A run is strictly sequential and owns everything it touches, including
//! the temporary decrypted copy when one is needed. The strategy is chosen
//! by the caller; a strategy that finds nothing never hands over to the
//! other one.

use std::fmt;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::extract::{extract_lines, BankClassifier, Normalizer, TableExtractor};
use crate::loader::{BackendOpener, DocumentLoader, LopdfOpener};
use crate::model::{BankType, ExtractionResult, RowOutcome};
use crate::options::ExtractOptions;
use crate::parser::StructuralConverter;
use crate::text::TextExtractor;

/// Extraction strategy for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Structural conversion and header-matched tables, with the statement total.
    #[default]
    Table,
    /// Raw text, bank classification and per-bank line rules.
    Line,
}

/// Stages a run moves through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Loading,
    Structuring,
    TextExtracting,
    Normalizing,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Loading => "loading",
            Stage::Structuring => "structuring",
            Stage::TextExtracting => "text-extracting",
            Stage::Normalizing => "normalizing",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

fn enter(stage: Stage) {
    log::debug!("Pipeline stage: {}", stage);
}

/// Statement extraction pipeline.
///
/// # Example
///
/// ```no_run
/// use extrato::{ExtractOptions, Pipeline, Strategy};
///
/// let bytes = std::fs::read("fatura.pdf").unwrap();
/// let pipeline = Pipeline::new(ExtractOptions::default());
/// let result = pipeline.extract(&bytes, None, Strategy::Table).unwrap();
/// println!("{} transactions", result.transaction_count);
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline<O = LopdfOpener> {
    options: ExtractOptions,
    loader: DocumentLoader<O>,
}

impl Pipeline<LopdfOpener> {
    /// Pipeline backed by lopdf.
    pub fn new(options: ExtractOptions) -> Self {
        Self::with_opener(LopdfOpener, options)
    }
}

impl Default for Pipeline<LopdfOpener> {
    fn default() -> Self {
        Self::new(ExtractOptions::default())
    }
}

impl<O: BackendOpener> Pipeline<O> {
    /// Pipeline over a custom PDF backend.
    pub fn with_opener(opener: O, options: ExtractOptions) -> Self {
        let mut loader = DocumentLoader::new(opener);
        if let Some(dir) = &options.temp_dir {
            loader = loader.with_temp_dir(dir.clone());
        }
        Self { options, loader }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Run one document through `strategy`.
    ///
    /// The line strategy expects already-decrypted input and ignores
    /// `password`.
    pub fn extract(
        &self,
        bytes: &[u8],
        password: Option<&str>,
        strategy: Strategy,
    ) -> Result<ExtractionResult> {
        let result = match strategy {
            Strategy::Table => self.extract_table(bytes, password),
            Strategy::Line => {
                if password.is_some() {
                    log::debug!("Line strategy ignores the supplied password");
                }
                self.extract_line(bytes)
            }
        };

        match &result {
            Ok(r) => log::info!(
                "{:?} strategy: {} transactions, bank {}",
                strategy,
                r.transaction_count,
                r.bank_type
            ),
            Err(e) => log::warn!("{:?} strategy failed: {}", strategy, e),
        }
        result
    }

    /// Table strategy: full statement conversion plus the statement total.
    ///
    /// # Errors
    /// Loader and converter errors surface unchanged;
    /// [`Error::NoTransactionsFound`] when no table passes the header check.
    pub fn extract_table(&self, bytes: &[u8], password: Option<&str>) -> Result<ExtractionResult> {
        enter(Stage::Loading);
        let loaded = self.loader.load(bytes, password)?;

        enter(Stage::Structuring);
        let document = StructuralConverter::from_options(&self.options).convert(&loaded)?;
        let text = document.plain_text();
        let bank = BankClassifier::new().classify(&text);

        let extraction = TableExtractor::new(&self.options).extract(&document);
        if extraction.accepted_tables == 0 {
            log::warn!("No transaction table found in {} pages", document.page_count());
            return Err(Error::NoTransactionsFound);
        }

        enter(Stage::Normalizing);
        let normalizer = Normalizer::from_options(&self.options);
        let total = extraction.total_amount.as_deref();
        let outcomes: Vec<RowOutcome> = extraction
            .rows
            .iter()
            .map(|row| normalizer.normalize(row, bank, total))
            .collect();

        let mut result =
            ExtractionResult::from_outcomes(bank, outcomes, &text, self.options.sample_len);
        result.total_amount = extraction.total_amount;
        result.stats.tables_accepted = extraction.accepted_tables as u32;

        enter(Stage::Done);
        Ok(result)
    }

    /// Line strategy over a PDF: raw text, classification, line rules.
    ///
    /// Protected documents fail with [`Error::ProtectedDocument`]; there is
    /// no password path here.
    pub fn extract_line(&self, bytes: &[u8]) -> Result<ExtractionResult> {
        enter(Stage::Loading);
        let loaded = self.loader.load(bytes, None)?;

        enter(Stage::TextExtracting);
        let text = TextExtractor::new(self.options.text_engine).extract(&loaded)?;

        Ok(self.extract_text(&text))
    }

    /// Line strategy over already-extracted text.
    pub fn extract_text(&self, text: &str) -> ExtractionResult {
        let bank = BankClassifier::new().classify(text);
        let lines = extract_lines(text, bank, &self.options);
        if lines.rows.is_empty() {
            log::warn!("No transaction lines matched ({} rules)", lines.bank);
        }

        enter(Stage::Normalizing);
        let normalizer = Normalizer::from_options(&self.options);
        let outcomes: Vec<RowOutcome> = lines
            .rows
            .iter()
            .map(|row| normalizer.normalize(row, lines.bank, None))
            .collect();
        let result = ExtractionResult::from_outcomes(bank, outcomes, text, self.options.sample_len);

        enter(Stage::Done);
        result
    }

    /// Raw text of a PDF, as the line strategy sees it.
    pub fn document_text(&self, bytes: &[u8], password: Option<&str>) -> Result<String> {
        let loaded = self.loader.load(bytes, password)?;
        TextExtractor::new(self.options.text_engine).extract(&loaded)
    }

    /// Bank detected in a PDF's raw text.
    pub fn classify_document(&self, bytes: &[u8], password: Option<&str>) -> Result<BankType> {
        let text = self.document_text(bytes, password)?;
        Ok(BankClassifier::new().classify(&text))
    }

    /// Run independent documents in parallel; results keep input order.
    pub fn extract_batch<D>(&self, documents: &[D], strategy: Strategy) -> Vec<Result<ExtractionResult>>
    where
        D: AsRef<[u8]> + Sync,
    {
        log::debug!("Extracting batch of {} documents", documents.len());
        documents
            .par_iter()
            .map(|doc| self.extract(doc.as_ref(), None, strategy))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> Pipeline {
        Pipeline::new(ExtractOptions::default().with_reference_year(2024))
    }

    #[test]
    fn test_generic_text_line() {
        let result = pipeline().extract_text("23/12/2024 SUPERMERCADO BRASIL R$ 45,90");
        assert_eq!(result.bank_type, BankType::Unknown);
        assert_eq!(result.transaction_count, 1);

        let t = &result.transactions[0];
        assert_eq!(t.date, "23/12/2024");
        assert_eq!(t.description, "SUPERMERCADO BRASIL");
        assert_eq!(t.value, "45.90");
        assert_eq!(t.bank, BankType::Generic);
    }

    #[test]
    fn test_known_bank_text_uses_its_rules() {
        let text = "Banco do Brasil\nExtrato de conta\n10/01/2024 Pix - Enviado 150,00 D 849,90 C";
        let result = pipeline().extract_text(text);
        assert_eq!(result.bank_type, BankType::BancoBrasil);
        assert_eq!(result.transactions[0].bank, BankType::BancoBrasil);
        assert_eq!(result.transactions[0].value, "-150.00");
    }

    #[test]
    fn test_no_lines_is_an_empty_result() {
        let result = pipeline().extract_text("nothing to see");
        assert!(result.is_empty());
        assert_eq!(result.transaction_count, 0);
        assert_eq!(result.text_sample, "nothing to see");
    }

    #[test]
    fn test_line_strategy_rejects_non_pdf() {
        let err = pipeline().extract(b"plain text", Some("pw"), Strategy::Line).unwrap_err();
        assert!(matches!(err, Error::UnreadableDocument(_)));
    }

    #[test]
    fn test_batch_keeps_order() {
        let docs: Vec<Vec<u8>> = vec![b"one".to_vec(), b"two".to_vec()];
        let results = pipeline().extract_batch(&docs, Strategy::Table);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_err()));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::TextExtracting.to_string(), "text-extracting");
    }
}
