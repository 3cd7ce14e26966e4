//! Protected-document handling with a scripted backend.
//!
//! The fake opener treats any document containing `/Encrypt` as protected
//! and "decrypts" it by writing a plain document, so every branch of the
//! password retry can be driven without real encryption.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use tempfile::TempDir;

use extrato::error::{Error, Result};
use extrato::loader::{BackendFontInfo, ContentOp, DocumentLoader, PageId};
use extrato::{BackendOpener, ExtractOptions, PdfBackend, Pipeline, Strategy};

const PROTECTED: &[u8] = b"%PDF-1.7\n/Encrypt <<>>\n%%EOF";
const PLAIN: &[u8] = b"%PDF-1.7\nplain\n%%EOF";

struct FakeBackend;

impl PdfBackend for FakeBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        BTreeMap::new()
    }

    fn page_fonts(&self, _page: PageId) -> Result<Vec<BackendFontInfo>> {
        Ok(vec![])
    }

    fn page_content(&self, _page: PageId) -> Result<Vec<u8>> {
        Ok(vec![])
    }

    fn decode_content(&self, _data: &[u8]) -> Result<Vec<ContentOp>> {
        Ok(vec![])
    }

    fn decode_text(&self, _page: PageId, _font_name: &[u8], bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).to_string()
    }
}

/// What `write_decrypted` produces for the right password.
#[derive(Clone, Copy)]
enum Decrypts {
    ToPlain,
    ToStillProtected,
}

struct FakeOpener {
    password: &'static str,
    decrypts: Decrypts,
}

impl FakeOpener {
    fn new(password: &'static str) -> Self {
        Self {
            password,
            decrypts: Decrypts::ToPlain,
        }
    }
}

fn is_protected(data: &[u8]) -> bool {
    data.windows(8).any(|w| w == b"/Encrypt")
}

impl BackendOpener for FakeOpener {
    type Backend = FakeBackend;

    fn open_bytes(&self, data: &[u8]) -> Result<FakeBackend> {
        if is_protected(data) {
            Err(Error::Encrypted)
        } else {
            Ok(FakeBackend)
        }
    }

    fn write_decrypted(&self, _data: &[u8], password: &str, out: &mut dyn Write) -> Result<()> {
        if password != self.password {
            return Err(Error::InvalidPassword);
        }
        match self.decrypts {
            Decrypts::ToPlain => out.write_all(PLAIN)?,
            Decrypts::ToStillProtected => out.write_all(PROTECTED)?,
        }
        Ok(())
    }
}

fn is_empty_dir(dir: &Path) -> bool {
    std::fs::read_dir(dir).map(|mut d| d.next().is_none()).unwrap_or(false)
}

#[test]
fn test_plain_document_needs_no_temp_file() {
    let dir = TempDir::new().unwrap();
    let loader = DocumentLoader::new(FakeOpener::new("secret")).with_temp_dir(dir.path());

    let loaded = loader.load(PLAIN, Some("secret")).unwrap();
    assert!(!loaded.was_decrypted());
    assert_eq!(loaded.bytes(), PLAIN);
    assert!(is_empty_dir(dir.path()));
}

#[test]
fn test_protected_without_password() {
    let dir = TempDir::new().unwrap();
    let loader = DocumentLoader::new(FakeOpener::new("secret")).with_temp_dir(dir.path());

    let err = loader.load(PROTECTED, None).unwrap_err();
    assert!(matches!(err, Error::ProtectedDocument));
    assert!(is_empty_dir(dir.path()));
}

#[test]
fn test_protected_with_correct_password() {
    let dir = TempDir::new().unwrap();
    let loader = DocumentLoader::new(FakeOpener::new("secret")).with_temp_dir(dir.path());

    let loaded = loader.load(PROTECTED, Some("secret")).unwrap();
    assert!(loaded.was_decrypted());
    assert_eq!(loaded.bytes(), PLAIN);
    assert_eq!(loaded.format().version, "1.7");
    assert!(is_empty_dir(dir.path()));
}

#[test]
fn test_protected_with_wrong_password() {
    let dir = TempDir::new().unwrap();
    let loader = DocumentLoader::new(FakeOpener::new("secret")).with_temp_dir(dir.path());

    let err = loader.load(PROTECTED, Some("guess")).unwrap_err();
    assert!(matches!(err, Error::UnreadableDocument(_)));
    assert!(is_empty_dir(dir.path()));
}

#[test]
fn test_retry_happens_once() {
    let dir = TempDir::new().unwrap();
    let opener = FakeOpener {
        password: "secret",
        decrypts: Decrypts::ToStillProtected,
    };
    let loader = DocumentLoader::new(opener).with_temp_dir(dir.path());

    let err = loader.load(PROTECTED, Some("secret")).unwrap_err();
    assert!(matches!(err, Error::UnreadableDocument(_)));
    assert!(is_empty_dir(dir.path()));
}

#[test]
fn test_temp_copy_removed_when_later_stage_fails() {
    let dir = TempDir::new().unwrap();
    let options = ExtractOptions::new().with_temp_dir(dir.path());
    let pipeline = Pipeline::with_opener(FakeOpener::new("secret"), options);

    // Decryption succeeds; the empty document then has no tables
    let err = pipeline.extract(PROTECTED, Some("secret"), Strategy::Table).unwrap_err();
    assert!(matches!(err, Error::NoTransactionsFound));
    assert!(is_empty_dir(dir.path()));
}

#[test]
fn test_line_strategy_never_decrypts() {
    let dir = TempDir::new().unwrap();
    let options = ExtractOptions::new().with_temp_dir(dir.path());
    let pipeline = Pipeline::with_opener(FakeOpener::new("secret"), options);

    let err = pipeline.extract(PROTECTED, Some("secret"), Strategy::Line).unwrap_err();
    assert!(matches!(err, Error::ProtectedDocument));
    assert!(is_empty_dir(dir.path()));
}
