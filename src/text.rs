//! Raw page text for the line strategy.

use std::panic::{self, AssertUnwindSafe};

use crate::error::{Error, Result};
use crate::loader::{LoadedDocument, PdfBackend};
use crate::options::TextEngine;
use crate::parser::{group_into_lines, SpanExtractor};

/// Baseline tolerance when rebuilding lines from spans.
const LINE_TOLERANCE: f32 = 0.3;

/// Extracts raw text, independently of the structural converter.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor {
    engine: TextEngine,
}

impl TextExtractor {
    pub fn new(engine: TextEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> TextEngine {
        self.engine
    }

    /// Extract the text of every page, pages separated by a blank line.
    pub fn extract<B: PdfBackend>(&self, loaded: &LoadedDocument<B>) -> Result<String> {
        match self.engine {
            TextEngine::PdfExtract => extract_with_pdf_extract(loaded.bytes()),
            TextEngine::Layout => extract_with_layout(loaded.backend()),
        }
    }
}

fn extract_with_pdf_extract(bytes: &[u8]) -> Result<String> {
    // pdf-extract panics on some malformed font programs
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes)
    }));

    match outcome {
        Ok(result) => Ok(result?),
        Err(_) => Err(Error::TextExtract(
            "text engine aborted on malformed content".to_string(),
        )),
    }
}

/// One line of text per baseline, in reading order.
fn extract_with_layout<B: PdfBackend>(backend: &B) -> Result<String> {
    let extractor = SpanExtractor::new(backend);
    let mut pages = Vec::new();

    for (number, page_id) in backend.pages() {
        let spans = extractor
            .page_spans(page_id)
            .map_err(|e| Error::TextExtract(format!("page {number}: {e}")))?;
        let lines: Vec<String> = group_into_lines(spans, LINE_TOLERANCE)
            .iter()
            .map(|line| line.text())
            .collect();
        pages.push(lines.join("\n"));
    }

    Ok(pages.join("\n\n"))
}
