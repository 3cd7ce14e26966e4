//! Structural conversion: loaded document to paragraphs and tables.

use crate::error::{Error, Result};
use crate::loader::{LoadedDocument, PdfBackend};
use crate::model::{Block, Document, Metadata, Page, Paragraph};
use crate::options::{ErrorMode, ExtractOptions};

use super::layout::{group_into_lines, SpanExtractor};
use super::table_detector::{TableDetector, TableDetectorConfig};

/// Baseline tolerance for paragraph lines, as a fraction of font size.
const LINE_TOLERANCE: f32 = 0.3;

/// Renders a loaded document into its structural representation.
///
/// Each page's spans go through the table detector first; whatever is left
/// becomes one paragraph per baseline line. Blocks keep top-to-bottom order.
#[derive(Debug, Clone, Default)]
pub struct StructuralConverter {
    detector: TableDetector,
    error_mode: ErrorMode,
}

impl StructuralConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converter configured from extraction options.
    pub fn from_options(options: &ExtractOptions) -> Self {
        Self {
            detector: TableDetector::with_config(options.table_detector.clone()),
            error_mode: options.error_mode,
        }
    }

    pub fn with_detector_config(mut self, config: TableDetectorConfig) -> Self {
        self.detector = TableDetector::with_config(config);
        self
    }

    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Convert every page.
    ///
    /// Renderer failures surface as [`Error::Conversion`]; in lenient mode a
    /// failing page is kept empty instead.
    pub fn convert<B: PdfBackend>(&self, loaded: &LoadedDocument<B>) -> Result<Document> {
        let backend = loaded.backend();
        let pages = backend.pages();

        let mut document = Document::new();
        document.metadata = Metadata {
            page_count: pages.len() as u32,
            decrypted: loaded.was_decrypted(),
            ..Metadata::with_version(loaded.format().version.clone())
        };

        let extractor = SpanExtractor::new(backend);
        for (&number, &page_id) in &pages {
            let mut page = match backend.page_size(page_id) {
                Some((width, height)) => Page::new(number, width, height),
                None => Page::a4(number),
            };

            let spans = match extractor.page_spans(page_id) {
                Ok(spans) => spans,
                Err(e) if self.error_mode == ErrorMode::Lenient => {
                    log::warn!("Skipping page {}: {}", number, e);
                    document.add_page(page);
                    continue;
                }
                Err(e) => return Err(Error::Conversion(format!("page {number}: {e}"))),
            };

            let (tables, rest) = self.detector.detect(spans);
            log::debug!(
                "Page {}: {} tables, {} loose spans",
                number,
                tables.len(),
                rest.len()
            );

            let mut blocks: Vec<(f32, Block)> = tables
                .iter()
                .map(|t| (t.top_y, Block::Table(self.detector.to_table(t))))
                .collect();
            blocks.extend(group_into_lines(rest, LINE_TOLERANCE).into_iter().map(|line| {
                let paragraph = Paragraph::with_text(line.text()).font_size(line.font_size);
                (line.y, Block::Paragraph(paragraph))
            }));
            blocks.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

            for (_, block) in blocks {
                page.add_block(block);
            }
            document.add_page(page);
        }

        Ok(document)
    }
}
