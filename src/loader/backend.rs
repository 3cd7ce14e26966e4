//! PDF backend abstraction layer.
//!
//! Isolates the concrete PDF library (lopdf) from layout analysis and from
//! the loader's protection handling, so both can be driven by a fake in tests.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use lopdf::{Document as LopdfDocument, Object, Stream};

use crate::error::{Error, Result};

/// Page identifier: (object number, generation number).
pub type PageId = (u32, u16);

/// Font information returned by the backend.
#[derive(Debug, Clone)]
pub struct BackendFontInfo {
    /// Font resource name (key in the page's font dictionary).
    pub name: Vec<u8>,
    /// Base font name (e.g., "Helvetica-Bold").
    pub base_font: String,
}

/// A value from a PDF content stream operand.
#[derive(Debug, Clone)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

/// A single operation from a PDF content stream.
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

/// Abstract interface for an opened, readable PDF document.
pub trait PdfBackend {
    /// Return all pages as (page_number → PageId).
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Return font info for a given page.
    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>>;

    /// Return the raw (decompressed) content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>>;

    /// Parse raw content stream bytes into a sequence of operations.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>>;

    /// Decode a text byte sequence using the font's encoding on the given page.
    /// Falls back to simple decoding if the font or encoding is unavailable.
    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String;

    /// Page width and height in points, when the page declares a media box.
    fn page_size(&self, _page: PageId) -> Option<(f32, f32)> {
        None
    }
}

/// Opens documents into a [`PdfBackend`] and produces decrypted copies.
///
/// The loader only ever talks to this trait, which keeps the
/// protect/decrypt/retry sequence independent of lopdf.
pub trait BackendOpener: Send + Sync {
    type Backend: PdfBackend;

    /// Open a document held in memory.
    ///
    /// Must fail with [`Error::Encrypted`] when the document is
    /// access-protected.
    fn open_bytes(&self, data: &[u8]) -> Result<Self::Backend>;

    /// Open a document from disk.
    fn open_file(&self, path: &Path) -> Result<Self::Backend> {
        let data = std::fs::read(path)?;
        self.open_bytes(&data)
    }

    /// Decrypt `data` with `password` and write a plain copy to `out`.
    fn write_decrypted(&self, data: &[u8], password: &str, out: &mut dyn Write) -> Result<()>;
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16(&utf16).unwrap_or_default();
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1, which covers the accented letters of WinAnsi statements
    bytes.iter().map(|&b| b as char).collect()
}

/// Helper: extract a number from a [`PdfValue`].
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(r) => Some(*r),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// lopdf implementation
// ---------------------------------------------------------------------------

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from an in-memory byte slice.
    ///
    /// Documents protected only by an empty user password are decrypted in
    /// place; anything else protected fails with [`Error::Encrypted`].
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        match LopdfDocument::load_mem(data) {
            Ok(doc) => Self::from_doc(doc),
            Err(e) => Err(load_error(e, data)),
        }
    }

    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::load_bytes(&data)
    }

    fn from_doc(mut doc: LopdfDocument) -> Result<Self> {
        if doc.is_encrypted() && doc.decrypt("").is_err() {
            return Err(Error::Encrypted);
        }
        Ok(Self { doc })
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }
}

/// A document that declares `/Encrypt` but cannot be parsed failed on its
/// protection, not on its syntax.
fn load_error(err: lopdf::Error, data: &[u8]) -> Error {
    let declares_encryption = data.windows(b"/Encrypt".len()).any(|w| w == b"/Encrypt");
    match Error::from(err) {
        Error::PdfParse(msg) if declares_encryption => {
            log::debug!("Load failed on a document with /Encrypt: {}", msg);
            Error::Encrypted
        }
        other => other,
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>> {
        let lopdf_fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        Ok(lopdf_fonts
            .iter()
            .map(|(name, font_dict)| {
                let base_font = font_dict
                    .get(b"BaseFont")
                    .ok()
                    .and_then(|o| o.as_name().ok())
                    .map(|n| String::from_utf8_lossy(n).to_string())
                    .unwrap_or_else(|| "Unknown".to_string());
                BackendFontInfo {
                    name: name.clone(),
                    base_font,
                }
            })
            .collect())
    }

    fn page_content(&self, page_id: PageId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        // A page without Contents is blank, not broken
        let contents = match page_dict.get(b"Contents") {
            Ok(c) => c,
            Err(_) => return Ok(Vec::new()),
        };

        match contents {
            Object::Reference(r) => match self.doc.get_object(*r) {
                Ok(Object::Stream(s)) => stream_content(s),
                _ => Err(Error::PdfParse("Invalid content stream".to_string())),
            },
            Object::Array(arr) => {
                let mut content = Vec::new();
                for obj in arr {
                    if let Object::Reference(r) = obj {
                        if let Ok(Object::Stream(s)) = self.doc.get_object(*r) {
                            match stream_content(s) {
                                Ok(data) => {
                                    content.extend_from_slice(&data);
                                    content.push(b' ');
                                }
                                Err(e) => log::warn!("Skipping content stream {:?}: {}", r, e),
                            }
                        }
                    }
                }
                Ok(content)
            }
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
        let content =
            lopdf::content::Content::decode(data).map_err(|e| Error::PdfParse(e.to_string()))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect())
    }

    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String {
        if let Ok(lopdf_fonts) = self.doc.get_page_fonts(page) {
            if let Some(font_dict) = lopdf_fonts.get(font_name) {
                if let Ok(enc) = font_dict.get_font_encoding(&self.doc) {
                    if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                        return text;
                    }
                }
            }
        }
        decode_text_simple(bytes)
    }

    fn page_size(&self, page: PageId) -> Option<(f32, f32)> {
        let page_dict = self.doc.get_dictionary(page).ok()?;
        let media_box = page_dict.get(b"MediaBox").ok()?.as_array().ok()?;
        if media_box.len() < 4 {
            return None;
        }
        let width = media_box[2].as_float().ok()?;
        let height = media_box[3].as_float().ok()?;
        Some((width, height))
    }
}

/// Raw bytes of a content stream; unfiltered streams are stored as-is.
fn stream_content(stream: &Stream) -> Result<Vec<u8>> {
    if stream.dict.get(b"Filter").is_err() {
        return Ok(stream.content.clone());
    }
    stream
        .decompressed_content()
        .map_err(|e| Error::PdfParse(e.to_string()))
}

/// Convert a `lopdf::Object` to [`PdfValue`].
fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(r) => PdfValue::Real(*r),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(b, _) => PdfValue::Str(b.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}

/// [`BackendOpener`] producing [`LopdfBackend`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfOpener;

impl BackendOpener for LopdfOpener {
    type Backend = LopdfBackend;

    fn open_bytes(&self, data: &[u8]) -> Result<LopdfBackend> {
        LopdfBackend::load_bytes(data)
    }

    fn open_file(&self, path: &Path) -> Result<LopdfBackend> {
        LopdfBackend::load_file(path)
    }

    fn write_decrypted(&self, data: &[u8], password: &str, mut out: &mut dyn Write) -> Result<()> {
        let mut doc = LopdfDocument::load_mem(data)?;
        if doc.is_encrypted() {
            doc.decrypt(password).map_err(|_| Error::InvalidPassword)?;
        }
        doc.save_to(&mut out)?;
        Ok(())
    }
}
