//! # extrato
//!
//! Transaction extraction from bank and credit-card statement PDFs.
//!
//! A statement goes through one of two strategies and comes out as a list of
//! normalized [`Transaction`] records plus diagnostics:
//!
//! - **Table strategy**: the document is rendered into paragraphs and tables,
//!   tables whose header names a date, description and value column are
//!   read row by row, and the statement total is picked up when stated.
//! - **Line strategy**: raw page text is classified by issuing bank and
//!   parsed line by line with that bank's layout rules, or generic ones.
//!
//! ## Quick Start
//!
//! ```no_run
//! use extrato::{extract_from_document, JsonFormat};
//!
//! fn main() -> extrato::Result<()> {
//!     let bytes = std::fs::read("fatura.pdf")?;
//!     let result = extract_from_document(&bytes, Some("12345"))?;
//!
//!     println!("{}", result.to_json(JsonFormat::Pretty)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Protected documents**: one decryption retry through a temporary copy
//!   that is always removed
//! - **Bank rules**: Nubank, Itaú, Bradesco, Banco do Brasil, Santander and
//!   Caixa layouts, with a generic fallback
//! - **Locale-aware values**: `1.234,56`, `(5,00)` and `12,50-` all normalize
//!   to two-digit decimals
//! - **Parallel batches**: independent documents run on Rayon

pub mod detect;
pub mod error;
pub mod extract;
pub mod loader;
pub mod model;
pub mod options;
pub mod parser;
pub mod pipeline;
pub mod text;

pub use detect::{detect_format_from_bytes, is_pdf_bytes, PdfFormat};
pub use error::{Error, ErrorCategory, Result};
pub use extract::{classify, BankClassifier};
pub use loader::{BackendOpener, DocumentLoader, LoadedDocument, LopdfOpener, PdfBackend};
pub use model::{
    BankType, Block, Document, ExtractionResult, ExtractionStats, JsonFormat, Page, Paragraph,
    RawTransactionRow, RowOutcome, Table, TableCell, TableRow, Transaction,
};
pub use options::{ErrorMode, ExtractOptions, TextEngine};
pub use parser::{StructuralConverter, TableDetectorConfig};
pub use pipeline::{Pipeline, Stage, Strategy};
pub use text::TextExtractor;

/// Extract transactions from a statement with the table strategy.
///
/// # Arguments
///
/// * `bytes` - PDF file content
/// * `password` - Password to retry with if the document is protected
///
/// # Errors
///
/// [`Error::ProtectedDocument`], [`Error::UnreadableDocument`],
/// [`Error::Conversion`] or [`Error::NoTransactionsFound`].
pub fn extract_from_document(bytes: &[u8], password: Option<&str>) -> Result<ExtractionResult> {
    extract_from_document_with_options(bytes, password, ExtractOptions::default())
}

/// Table strategy with custom options.
///
/// # Example
///
/// ```no_run
/// use extrato::{extract_from_document_with_options, ExtractOptions};
///
/// let bytes = std::fs::read("fatura.pdf").unwrap();
/// let options = ExtractOptions::new().lenient().iso_dates();
/// let result = extract_from_document_with_options(&bytes, None, options).unwrap();
/// ```
pub fn extract_from_document_with_options(
    bytes: &[u8],
    password: Option<&str>,
    options: ExtractOptions,
) -> Result<ExtractionResult> {
    Pipeline::new(options).extract_table(bytes, password)
}

/// Extract transactions from an unprotected statement with the line strategy.
pub fn extract_bank_statement(bytes: &[u8]) -> Result<ExtractionResult> {
    extract_bank_statement_with_options(bytes, ExtractOptions::default())
}

/// Line strategy with custom options.
pub fn extract_bank_statement_with_options(
    bytes: &[u8],
    options: ExtractOptions,
) -> Result<ExtractionResult> {
    Pipeline::new(options).extract_line(bytes)
}

/// Line strategy over text that was already extracted.
///
/// ```
/// let result = extrato::extract_bank_statement_text("23/12/2024 SUPERMERCADO BRASIL R$ 45,90");
/// assert_eq!(result.transactions[0].value, "45.90");
/// ```
pub fn extract_bank_statement_text(text: &str) -> ExtractionResult {
    extract_bank_statement_text_with_options(text, ExtractOptions::default())
}

/// Text-only line strategy with custom options.
pub fn extract_bank_statement_text_with_options(text: &str, options: ExtractOptions) -> ExtractionResult {
    Pipeline::new(options).extract_text(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_points_reject_non_pdf() {
        assert!(matches!(
            extract_from_document(b"not a pdf", None),
            Err(Error::UnreadableDocument(_))
        ));
        assert!(matches!(
            extract_bank_statement(b"not a pdf"),
            Err(Error::UnreadableDocument(_))
        ));
    }

    #[test]
    fn test_text_entry_point() {
        let options = ExtractOptions::new().with_reference_year(2024).iso_dates();
        let result = extract_bank_statement_text_with_options("05/01 PADARIA REAL 12,50 Itaú", options);
        assert_eq!(result.bank_type, BankType::Itau);
        assert_eq!(result.transactions[0].date, "2024-01-05");
    }
}
