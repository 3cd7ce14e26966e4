//! Document loading with one password retry.
//!
//! A direct open is attempted first. When the backend reports access
//! protection and a password is available, a decrypted copy is written to a
//! uniquely named temporary file, reopened once, and read back into memory.
//! The temporary file is removed when the loader returns, whatever the
//! outcome.

mod backend;

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::detect::{detect_format_from_bytes, PdfFormat};
use crate::error::{Error, Result};

pub use backend::{
    decode_text_simple, get_number_from_value, BackendFontInfo, BackendOpener, ContentOp,
    LopdfBackend, LopdfOpener, PageId, PdfBackend, PdfValue,
};

/// A document opened by the loader.
pub struct LoadedDocument<B> {
    backend: B,
    bytes: Vec<u8>,
    decrypted: bool,
    format: PdfFormat,
}

impl<B: PdfBackend> LoadedDocument<B> {
    /// The opened backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Plain document bytes; the decrypted copy when decryption happened.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Whether a password was needed to open the document.
    pub fn was_decrypted(&self) -> bool {
        self.decrypted
    }

    /// Header information of the original bytes.
    pub fn format(&self) -> &PdfFormat {
        &self.format
    }

    /// Number of pages reported by the backend.
    pub fn page_count(&self) -> usize {
        self.backend.pages().len()
    }
}

impl<B> std::fmt::Debug for LoadedDocument<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedDocument")
            .field("bytes", &self.bytes.len())
            .field("decrypted", &self.decrypted)
            .field("format", &self.format)
            .finish()
    }
}

/// Resolves raw bytes into a [`LoadedDocument`].
#[derive(Debug, Clone, Default)]
pub struct DocumentLoader<O> {
    opener: O,
    temp_dir: Option<PathBuf>,
}

impl<O: BackendOpener> DocumentLoader<O> {
    /// Create a loader around an opener; temporary copies go to the OS temp dir.
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            temp_dir: None,
        }
    }

    /// Create decrypted copies under `dir` instead of the OS temp dir.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// The underlying opener.
    pub fn opener(&self) -> &O {
        &self.opener
    }

    /// Open `bytes`, decrypting with `password` if the document is protected.
    ///
    /// # Errors
    /// * [`Error::ProtectedDocument`] if protected and no password was given
    /// * [`Error::UnreadableDocument`] if the bytes are not a PDF, the open
    ///   fails for another reason, or the retry after decryption fails
    pub fn load(&self, bytes: &[u8], password: Option<&str>) -> Result<LoadedDocument<O::Backend>> {
        let format = detect_format_from_bytes(bytes)
            .map_err(|e| Error::UnreadableDocument(e.to_string()))?;
        log::debug!("Loading {} ({} bytes)", format, bytes.len());

        match self.opener.open_bytes(bytes) {
            Ok(backend) => Ok(LoadedDocument {
                backend,
                bytes: bytes.to_vec(),
                decrypted: false,
                format,
            }),
            Err(e) if e.is_protection() => match password {
                None => {
                    log::warn!("Document is protected and no password was supplied");
                    Err(Error::ProtectedDocument)
                }
                Some(password) => self.load_decrypted(bytes, password, format),
            },
            Err(e) => Err(Error::UnreadableDocument(e.to_string())),
        }
    }

    /// Decrypt into a temp copy and retry the open exactly once.
    fn load_decrypted(
        &self,
        bytes: &[u8],
        password: &str,
        format: PdfFormat,
    ) -> Result<LoadedDocument<O::Backend>> {
        // Dropped on every return below, which unlinks the file
        let mut temp = self.create_temp()?;
        log::debug!("Decrypting into {}", temp.path().display());

        self.opener
            .write_decrypted(bytes, password, temp.as_file_mut())
            .map_err(|e| Error::UnreadableDocument(format!("decryption failed: {e}")))?;
        temp.as_file_mut()
            .flush()
            .map_err(|e| Error::UnreadableDocument(e.to_string()))?;

        let backend = self
            .opener
            .open_file(temp.path())
            .map_err(|e| Error::UnreadableDocument(format!("reopen after decryption failed: {e}")))?;
        let plain = read_back(temp.path())?;

        log::info!("Document decrypted ({} bytes)", plain.len());
        Ok(LoadedDocument {
            backend,
            bytes: plain,
            decrypted: true,
            format,
        })
    }

    fn create_temp(&self) -> Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("extrato-").suffix(".pdf");
        let temp = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };
        Ok(temp?)
    }
}

fn read_back(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| Error::UnreadableDocument(e.to_string()))
}
