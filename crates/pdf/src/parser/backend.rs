use std::collections::BTreeMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Object};

use crate::{DocumentInfo, PdfError};

/// A page identifier mirroring `lopdf::ObjectId`: (object number, generation number).
pub type PageId = (u32, u16);

/// Page height used when a page has no readable MediaBox (US Letter).
pub const DEFAULT_PAGE_HEIGHT: f32 = 792.0;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// A font entry from a page's resource dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct FontResource {
    /// Resource key as used by `Tf` (e.g. `b"F1"`).
    pub key: Vec<u8>,
    /// `BaseFont` name, when the font dictionary declares one.
    pub base_font: Option<String>,
}

/// Operand of a content-stream operation, detached from `lopdf::Object`.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<Operand>),
    Other,
}

impl Operand {
    pub fn as_number(&self) -> Option<f32> {
        match self {
            Operand::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// A single content-stream operation (operator + operands).
#[derive(Debug, Clone, PartialEq)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<Operand>,
}

impl ContentOp {
    /// Numeric operand at `index`, if present.
    pub fn number(&self, index: usize) -> Option<f32> {
        self.operands.get(index).and_then(Operand::as_number)
    }
}

fn to_operand(obj: &Object) -> Operand {
    match obj {
        Object::Integer(i) => Operand::Number(*i as f32),
        Object::Real(f) => Operand::Number(*f),
        Object::Name(n) => Operand::Name(n.clone()),
        Object::String(s, _) => Operand::Str(s.clone()),
        Object::Array(items) => Operand::Array(items.iter().map(to_operand).collect()),
        _ => Operand::Other,
    }
}

/// Best-effort decoding of raw PDF string bytes.
///
/// UTF-16BE with a BOM first, then UTF-8, then Latin-1 byte-for-byte.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if let Some(payload) = bytes.strip_prefix(b"\xFE\xFF") {
        return decode_utf16be(payload);
    }
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Decode UTF-16BE code units; a trailing odd byte is dropped.
fn decode_utf16be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

// ---------------------------------------------------------------------------
// PageSource trait
// ---------------------------------------------------------------------------

/// Read access to the pages of a PDF.
///
/// The text-state machine in [`super::layout`] only talks to this trait, so
/// it can be driven by pre-built operations in tests.
pub trait PageSource {
    /// Mapping from 1-based page number to [`PageId`].
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Fonts declared in the page resources.
    fn page_fonts(&self, page: PageId) -> Result<Vec<FontResource>, PdfError>;

    /// Decoded operations of the page's content stream.
    fn page_operations(&self, page: PageId) -> Result<Vec<ContentOp>, PdfError>;

    /// Page height in points from the MediaBox.
    fn page_height(&self, page: PageId) -> f32;

    /// Decode string bytes shown with the given font.
    fn decode_text(&self, page: PageId, font_key: &[u8], bytes: &[u8]) -> String;
}

// ---------------------------------------------------------------------------
// LopdfSource
// ---------------------------------------------------------------------------

/// [`PageSource`] backed by [`lopdf::Document`].
pub struct LopdfSource {
    doc: lopdf::Document,
}

impl LopdfSource {
    /// Parse a PDF from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;
        Self::from_document(doc)
    }

    /// Wrap an already parsed document. Encrypted documents are refused.
    pub fn from_document(doc: lopdf::Document) -> Result<Self, PdfError> {
        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }

        Ok(Self { doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Page count plus `Title` and `Author` from the trailer's Info dictionary.
    pub fn info(&self) -> DocumentInfo {
        let info = self.info_dict();
        let text = |key: &[u8]| -> Option<String> {
            let value = match info?.get(key).ok()? {
                Object::String(bytes, _) => decode_text_simple(bytes),
                _ => return None,
            };
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };

        DocumentInfo {
            page_count: self.page_count(),
            title: text(b"Title"),
            author: text(b"Author"),
        }
    }

    fn info_dict(&self) -> Option<&Dictionary> {
        match self.doc.trailer.get(b"Info").ok()? {
            Object::Reference(id) => self.doc.get_dictionary(*id).ok(),
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Walk up the page tree to find the MediaBox array.
    fn find_media_box(&self, dict: &Dictionary) -> Option<Vec<f32>> {
        if let Ok(obj) = dict.get(b"MediaBox") {
            let resolved = match obj {
                Object::Reference(id) => self.doc.get_object(*id).ok()?,
                other => other,
            };
            if let Ok(items) = resolved.as_array() {
                return items.iter().map(|o| self.number(o)).collect();
            }
        }

        let parent_id = dict.get(b"Parent").ok()?.as_reference().ok()?;
        let parent = self.doc.get_dictionary(parent_id).ok()?;
        self.find_media_box(parent)
    }

    fn number(&self, obj: &Object) -> Option<f32> {
        let resolved = match obj {
            Object::Reference(id) => self.doc.get_object(*id).ok()?,
            other => other,
        };
        match resolved {
            Object::Integer(i) => Some(*i as f32),
            Object::Real(f) => Some(*f),
            _ => None,
        }
    }

    /// `Encoding` name declared by a page font, e.g. `Identity-H`.
    fn font_encoding(&self, page: PageId, font_key: &[u8]) -> Option<String> {
        let fonts = self.doc.get_page_fonts(page).ok()?;
        let font = fonts.get(font_key)?;
        match font.get(b"Encoding").ok()? {
            Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
            _ => None,
        }
    }
}

impl PageSource for LopdfSource {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<FontResource>, PdfError> {
        let fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page fonts: {}", e)))?;

        Ok(fonts
            .iter()
            .map(|(key, dict)| FontResource {
                key: key.clone(),
                base_font: dict
                    .get(b"BaseFont")
                    .ok()
                    .and_then(|o| o.as_name().ok())
                    .map(|n| String::from_utf8_lossy(n).into_owned()),
            })
            .collect())
    }

    fn page_operations(&self, page: PageId) -> Result<Vec<ContentOp>, PdfError> {
        let data = self
            .doc
            .get_page_content(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page content: {}", e)))?;
        let content = Content::decode(&data)
            .map_err(|e| PdfError::Parse(format!("content stream decode error: {}", e)))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operands: op.operands.iter().map(to_operand).collect(),
                operator: op.operator,
            })
            .collect())
    }

    fn page_height(&self, page: PageId) -> f32 {
        let media_box = self
            .doc
            .get_dictionary(page)
            .ok()
            .and_then(|dict| self.find_media_box(dict));

        match media_box.as_deref() {
            Some([_, lly, _, ury, ..]) if ury > lly => ury - lly,
            _ => {
                log::debug!(
                    "page {:?} has no usable MediaBox, assuming {}pt",
                    page,
                    DEFAULT_PAGE_HEIGHT
                );
                DEFAULT_PAGE_HEIGHT
            }
        }
    }

    fn decode_text(&self, page: PageId, font_key: &[u8], bytes: &[u8]) -> String {
        // Identity-H/V fonts use 2-byte codes; try them as UTF-16BE first.
        let is_identity = self
            .font_encoding(page, font_key)
            .is_some_and(|enc| enc.contains("Identity"));
        if is_identity && bytes.len() >= 2 && bytes.len() % 2 == 0 {
            let decoded = decode_utf16be(bytes);
            if !decoded.chars().all(|c| c == '\u{FFFD}' || c == '\0') {
                return decoded;
            }
        }

        decode_text_simple(bytes)
    }
}
