use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box with a top-left origin (y grows downward).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BBox {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        BBox { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn center_x(&self) -> f64 {
        (self.x0 + self.x1) / 2.0
    }
}

/// One merged horizontal line of text as produced by the PDF extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    /// 1-based page number.
    pub page: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub font_family: String,
    #[serde(default)]
    pub is_bold: bool,
    #[serde(default)]
    pub is_italic: bool,
    #[serde(default)]
    pub bbox: BBox,
}

/// Leading list-style numbering detected at the start of a line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberingPattern {
    #[default]
    None,
    Numbered,
    MultiLevel,
    Roman,
    Lettered,
}

impl NumberingPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            NumberingPattern::None => "none",
            NumberingPattern::Numbered => "numbered",
            NumberingPattern::MultiLevel => "multi_level",
            NumberingPattern::Roman => "roman",
            NumberingPattern::Lettered => "lettered",
        }
    }
}

impl fmt::Display for NumberingPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Layout, typography and text features derived for a single line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    // font
    pub font_rank: usize,
    pub relative_size: f64,
    pub is_bold: bool,
    pub is_italic: bool,
    pub font_family: String,
    // text
    pub word_count: usize,
    pub char_count: usize,
    pub is_short: bool,
    pub is_very_short: bool,
    pub is_all_caps: bool,
    pub is_title_case: bool,
    pub uppercase_ratio: f64,
    pub has_numbering: bool,
    pub numbering_pattern: NumberingPattern,
    // position
    pub text_width_ratio: f64,
    pub is_left_aligned: bool,
    pub is_centered: bool,
    pub is_indented: bool,
    pub indent_level: u32,
    pub left_margin: f64,
}

/// A line paired with its computed features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedLine {
    pub line: TextLine,
    pub features: FeatureSet,
}

/// Heading level assigned to a line.
///
/// Unknown labels on the wire deserialize as [`Classification::Body`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    H1,
    H2,
    H3,
    #[serde(rename = "BODY")]
    #[serde(other)]
    Body,
}

impl Classification {
    pub fn is_heading(&self) -> bool {
        !matches!(self, Classification::Body)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::H1 => "H1",
            Classification::H2 => "H2",
            Classification::H3 => "H3",
            Classification::Body => "BODY",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A line after heading classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedLine {
    pub line: TextLine,
    pub features: FeatureSet,
    pub heading_score: f64,
    pub classification: Classification,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: Vec<String>,
    pub children: Vec<Section>,
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Section {
            title: title.into(),
            content: Vec::new(),
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source_file: String,
    pub total_blocks: usize,
    pub total_pages: usize,
    /// Caller-supplied fields, serialized alongside the fixed ones.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl DocumentMetadata {
    pub fn new(source_file: impl Into<String>, total_blocks: usize, total_pages: usize) -> Self {
        DocumentMetadata {
            source_file: source_file.into(),
            total_blocks,
            total_pages,
            extra: BTreeMap::new(),
        }
    }

    /// Attach an extra caller-supplied field.
    pub fn with_field(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// The final outline: metadata plus top-level sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentTree {
    pub metadata: DocumentMetadata,
    pub sections: Vec<Section>,
}

impl DocumentTree {
    /// Read a tree back from its JSON form.
    ///
    /// Runs of H3 headings nest without bound, so the parser's recursion
    /// limit is lifted and deep input grows the stack on demand.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut de = serde_json::Deserializer::from_str(json);
        de.disable_recursion_limit();
        let tree = DocumentTree::deserialize(serde_stacker::Deserializer::new(&mut de))?;
        de.end()?;
        Ok(tree)
    }
}
