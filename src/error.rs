//! Error types for statement extraction.

use std::io;
use thiserror::Error;

/// Result type alias for extrato operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting a statement.
///
/// The first group is what callers see at the boundary. The second group is
/// raised by the PDF backend and translated by the loader and converter.
#[derive(Error, Debug)]
pub enum Error {
    /// The document is access-protected and no password was supplied.
    #[error("Document is password protected; supply a password to read it")]
    ProtectedDocument,

    /// The document could not be opened, even after decryption.
    #[error("Unreadable document: {0}")]
    UnreadableDocument(String),

    /// The renderer failed to produce a structural representation.
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Raw text could not be extracted from the document.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// The table strategy accepted no transaction table at all.
    #[error("No transaction table found in document")]
    NoTransactionsFound,

    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The bytes are not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The backend reports the document as encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// The provided password is incorrect.
    #[error("Invalid password")]
    InvalidPassword,

    /// Error serializing a result.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Coarse grouping of errors, used by callers deciding whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Protected or unreadable input; the caller must change the input.
    InputAccess,
    /// The document opened but could not be rendered.
    Structural,
    /// The document rendered but held nothing extractable.
    Extraction,
    /// Backend-level failure that escaped translation.
    Internal,
}

impl Error {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::ProtectedDocument
            | Error::UnreadableDocument(_)
            | Error::UnknownFormat
            | Error::UnsupportedVersion(_)
            | Error::Encrypted
            | Error::InvalidPassword => ErrorCategory::InputAccess,
            Error::Conversion(_) | Error::TextExtract(_) => ErrorCategory::Structural,
            Error::NoTransactionsFound => ErrorCategory::Extraction,
            Error::Io(_) | Error::PdfParse(_) | Error::Serialization(_) => ErrorCategory::Internal,
        }
    }

    /// Whether the backend signalled access protection.
    pub fn is_protection(&self) -> bool {
        matches!(self, Error::Encrypted | Error::ProtectedDocument)
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<pdf_extract::OutputError> for Error {
    fn from(err: pdf_extract::OutputError) -> Self {
        Error::TextExtract(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ProtectedDocument;
        assert_eq!(
            err.to_string(),
            "Document is password protected; supply a password to read it"
        );

        let err = Error::UnreadableDocument("bad xref".to_string());
        assert_eq!(err.to_string(), "Unreadable document: bad xref");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.category(), ErrorCategory::Internal);
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            Error::ProtectedDocument.category(),
            ErrorCategory::InputAccess
        );
        assert_eq!(
            Error::Conversion("x".into()).category(),
            ErrorCategory::Structural
        );
        assert_eq!(
            Error::NoTransactionsFound.category(),
            ErrorCategory::Extraction
        );
        assert!(Error::Encrypted.is_protection());
        assert!(!Error::InvalidPassword.is_protection());
    }
}
