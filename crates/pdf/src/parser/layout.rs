//! Text extraction and line assembly.
//!
//! Walks each page's content stream with a small text-state machine, turning
//! every shown string into a positioned [`TextRun`], then merges runs that
//! share a baseline into [`TextLine`]s with a top-left-origin bounding box.
//!
//! # Pipeline
//!
//! ```text
//! content ops  ->  TextRun[]  ->  TextLine[]
//!   (per page)     extract        group_runs_into_lines
//! ```

use doctree_core::{BBox, TextLine};

use super::backend::{ContentOp, FontResource, Operand, PageId, PageSource};
use crate::cleanup::clean_line_text;
use crate::PdfError;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One shown string at a position on the page (PDF user space, origin at the
/// bottom-left).
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    /// Left edge.
    pub x: f32,
    /// Baseline, text rise included.
    pub y: f32,
    /// Estimated rendered width.
    pub width: f32,
    /// Rendered font size, text matrix scale included.
    pub font_size: f32,
    /// Base font name, or the resource key when the font is not declared.
    pub font_name: String,
}

impl TextRun {
    fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Distance of the run's top edge from the top of the page.
    fn top(&self, page_height: f32) -> f32 {
        page_height - (self.y + self.font_size)
    }

    /// Distance of the baseline from the top of the page.
    fn bottom(&self, page_height: f32) -> f32 {
        page_height - self.y
    }
}

/// Knobs for merging runs into lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineOptions {
    /// Runs whose tops differ by at most this many points share a line.
    pub y_tolerance: f32,
    /// A horizontal gap wider than this between runs becomes a space.
    pub min_word_gap: f32,
}

impl Default for LineOptions {
    fn default() -> Self {
        Self {
            y_tolerance: 5.0,
            min_word_gap: 1.5,
        }
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Glyph width as a fraction of font size; no font metrics are read.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// A `TJ` displacement wider than this fraction of the font size is a word gap.
const TJ_WORD_GAP_RATIO: f32 = 0.15;

const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

// ---------------------------------------------------------------------------
// Internal: PDF text-state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct TextState {
    font_key: Vec<u8>,
    font_name: String,
    font_size: f32,
    /// [a, b, c, d, tx, ty]
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    /// Tz / 100
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_name: String::new(),
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn x(&self) -> f32 {
        self.text_matrix[4]
    }

    fn y(&self) -> f32 {
        self.text_matrix[5] + self.text_rise
    }

    /// `font_size * sqrt(b^2 + d^2)`
    fn effective_font_size(&self) -> f32 {
        let scale = (self.text_matrix[1].powi(2) + self.text_matrix[3].powi(2)).sqrt();
        (self.font_size * scale).abs()
    }

    /// Horizontal scale of text space into user space.
    fn x_scale(&self) -> f32 {
        (self.text_matrix[0].powi(2) + self.text_matrix[1].powi(2)).sqrt()
    }

    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Td: translate the line matrix and restart the text matrix there.
    fn translate_line(&mut self, tx: f32, ty: f32) {
        let m = self.line_matrix;
        self.line_matrix[4] = m[0] * tx + m[2] * ty + m[4];
        self.line_matrix[5] = m[1] * tx + m[3] * ty + m[5];
        self.text_matrix = self.line_matrix;
    }

    /// T*
    fn next_line(&mut self) {
        self.translate_line(0.0, -self.leading);
    }

    fn set_matrix(&mut self, m: [f32; 6]) {
        self.text_matrix = m;
        self.line_matrix = m;
    }

    /// Estimated width in user space.
    fn text_width(&self, text: &str) -> f32 {
        let chars = text.chars().count() as f32;
        chars * self.font_size * APPROX_CHAR_WIDTH_RATIO * self.horiz_scale * self.x_scale()
    }

    /// Move past `text` in text space, honoring Tc and Tw.
    fn advance_past(&mut self, text: &str) {
        let glyph = self.font_size * APPROX_CHAR_WIDTH_RATIO * self.horiz_scale;
        let dx: f32 = text
            .chars()
            .map(|c| {
                let spacing = if c == ' ' {
                    self.char_spacing + self.word_spacing
                } else {
                    self.char_spacing
                };
                glyph + spacing
            })
            .sum();
        self.advance_x(dx);
    }
}

/// Walks one page, collecting runs.
struct RunCollector<'a> {
    source: &'a dyn PageSource,
    page: PageId,
    fonts: Vec<FontResource>,
    state: TextState,
    runs: Vec<TextRun>,
}

impl RunCollector<'_> {
    fn apply(&mut self, op: &ContentOp) {
        match op.operator.as_str() {
            "BT" => self.state.set_matrix(IDENTITY_MATRIX),
            // Font state survives ET; some producers rely on it.
            "ET" => {}

            "Tf" => self.set_font(op),
            "Tm" => {
                let values: Vec<f32> = (0..6).filter_map(|i| op.number(i)).collect();
                if let Ok(m) = <[f32; 6]>::try_from(values) {
                    self.state.set_matrix(m);
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                    self.state.translate_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                    self.state.leading = -ty;
                    self.state.translate_line(tx, ty);
                }
            }
            "T*" => self.state.next_line(),
            "TL" => {
                if let Some(v) = op.number(0) {
                    self.state.leading = v;
                }
            }
            "Tc" => {
                if let Some(v) = op.number(0) {
                    self.state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = op.number(0) {
                    self.state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = op.number(0) {
                    self.state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = op.number(0) {
                    self.state.text_rise = v;
                }
            }

            "Tj" => {
                if let Some(Operand::Str(bytes)) = op.operands.first() {
                    self.show(bytes);
                }
            }
            "TJ" => {
                if let Some(Operand::Array(items)) = op.operands.first() {
                    self.show_array(items);
                }
            }
            "'" => {
                self.state.next_line();
                if let Some(Operand::Str(bytes)) = op.operands.first() {
                    self.show(bytes);
                }
            }
            "\"" => {
                // aw ac string "
                if let (Some(aw), Some(ac), Some(Operand::Str(bytes))) =
                    (op.number(0), op.number(1), op.operands.get(2))
                {
                    self.state.word_spacing = aw;
                    self.state.char_spacing = ac;
                    self.state.next_line();
                    self.show(bytes);
                }
            }

            _ => {}
        }
    }

    fn set_font(&mut self, op: &ContentOp) {
        let key = match op.operands.first() {
            Some(Operand::Name(n)) | Some(Operand::Str(n)) => n.clone(),
            _ => return,
        };
        let size = op.number(1).unwrap_or(0.0);

        self.state.font_name = self
            .fonts
            .iter()
            .find(|f| f.key == key)
            .and_then(|f| f.base_font.clone())
            .unwrap_or_else(|| String::from_utf8_lossy(&key).into_owned());
        self.state.font_key = key;
        self.state.font_size = size;
    }

    fn decode(&self, bytes: &[u8]) -> String {
        self.source.decode_text(self.page, &self.state.font_key, bytes)
    }

    fn show(&mut self, bytes: &[u8]) {
        let text = self.decode(bytes);
        if text.is_empty() {
            return;
        }
        self.push_run(text.clone(), self.state.x(), self.state.y());
        self.state.advance_past(&text);
    }

    /// `TJ`: strings interleaved with displacements in thousandths of text
    /// space. Contiguous strings form one run; wide displacements become
    /// spaces.
    fn show_array(&mut self, items: &[Operand]) {
        let mut buf = String::new();
        let (mut run_x, run_y) = (self.state.x(), self.state.y());

        for item in items {
            match item {
                Operand::Str(bytes) => {
                    let fragment = self.decode(bytes);
                    if buf.is_empty() {
                        run_x = self.state.x();
                    }
                    buf.push_str(&fragment);
                    self.state.advance_past(&fragment);
                }
                other => {
                    let Some(adjust) = other.as_number() else {
                        continue;
                    };
                    let dx = -adjust / 1000.0 * self.state.font_size * self.state.horiz_scale;
                    if dx > self.state.font_size * TJ_WORD_GAP_RATIO && !buf.is_empty() {
                        buf.push(' ');
                    }
                    self.state.advance_x(dx);
                }
            }
        }

        let text = buf.trim_end();
        if !text.is_empty() {
            self.push_run(text.to_string(), run_x, run_y);
        }
    }

    fn push_run(&mut self, text: String, x: f32, y: f32) {
        let width = self.state.text_width(&text);
        self.runs.push(TextRun {
            text,
            x,
            y,
            width,
            font_size: self.state.effective_font_size(),
            font_name: self.state.font_name.clone(),
        });
    }
}

// ---------------------------------------------------------------------------
// Public API: run extraction
// ---------------------------------------------------------------------------

/// Walk a page's content stream and collect its [`TextRun`]s.
///
/// Handles `BT ET Tf Tm Td TD T* TL Tc Tw Tz Ts Tj TJ ' "`; all other
/// operators are ignored.
pub fn extract_page_runs(
    source: &dyn PageSource,
    page: PageId,
) -> Result<Vec<TextRun>, PdfError> {
    let ops = source.page_operations(page)?;
    let fonts = source.page_fonts(page).unwrap_or_else(|e| {
        log::warn!("page {:?}: {}", page, e);
        Vec::new()
    });

    let mut collector = RunCollector {
        source,
        page,
        fonts,
        state: TextState::default(),
        runs: Vec::new(),
    };
    for op in &ops {
        collector.apply(op);
    }

    Ok(collector.runs)
}

// ---------------------------------------------------------------------------
// Public API: run -> line grouping
// ---------------------------------------------------------------------------

/// Merge a page's runs into lines, top of the page first.
///
/// Runs are ordered by top edge then left edge. A run starts a new line when
/// its top is more than `y_tolerance` away from the top of the line's first
/// run. Lines whose cleaned text is empty are dropped.
pub fn group_runs_into_lines(
    runs: Vec<TextRun>,
    page: usize,
    page_height: f32,
    options: &LineOptions,
) -> Vec<TextLine> {
    let mut runs: Vec<TextRun> = runs
        .into_iter()
        .filter(|r| !r.text.trim().is_empty())
        .collect();
    runs.sort_by(|a, b| {
        a.top(page_height)
            .total_cmp(&b.top(page_height))
            .then(a.x.total_cmp(&b.x))
    });

    let mut lines = Vec::new();
    let mut current: Vec<TextRun> = Vec::new();
    let mut current_top = 0.0;

    for run in runs {
        let top = run.top(page_height);
        if !current.is_empty() && (top - current_top).abs() > options.y_tolerance {
            lines.extend(assemble_line(
                std::mem::take(&mut current),
                page,
                page_height,
                options,
            ));
        }
        if current.is_empty() {
            current_top = top;
        }
        current.push(run);
    }
    if !current.is_empty() {
        lines.extend(assemble_line(current, page, page_height, options));
    }

    lines
}

/// Join runs known to share a line, left to right.
fn assemble_line(
    mut runs: Vec<TextRun>,
    page: usize,
    page_height: f32,
    options: &LineOptions,
) -> Option<TextLine> {
    runs.sort_by(|a, b| a.x.total_cmp(&b.x));

    let mut raw = String::new();
    let mut prev_right: Option<f32> = None;
    for run in &runs {
        if let Some(right) = prev_right {
            if run.x - right > options.min_word_gap {
                raw.push(' ');
            }
        }
        raw.push_str(&run.text);
        prev_right = Some(prev_right.map_or(run.right(), |r| r.max(run.right())));
    }

    let text = clean_line_text(&raw);
    if text.is_empty() {
        return None;
    }

    // Font attributes come from the topmost run (leftmost on ties), so a
    // larger inline font on the same baseline wins.
    let first = runs.iter().min_by(|a, b| {
        a.top(page_height)
            .total_cmp(&b.top(page_height))
            .then(a.x.total_cmp(&b.x))
    })?;
    let family = first.font_name.to_lowercase();

    let (mut x0, mut y0) = (f32::INFINITY, f32::INFINITY);
    let (mut x1, mut y1) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for run in &runs {
        x0 = x0.min(run.x);
        y0 = y0.min(run.top(page_height));
        x1 = x1.max(run.right());
        y1 = y1.max(run.bottom(page_height));
    }
    let bbox = BBox::new(round2(x0), round2(y0), round2(x1), round2(y1));

    Some(TextLine {
        text,
        page,
        font_size: (first.font_size > 0.0).then(|| round2(first.font_size)),
        font_family: first.font_name.clone(),
        is_bold: family.contains("bold"),
        is_italic: family.contains("italic") || family.contains("oblique"),
        bbox,
    })
}

fn round2(value: f32) -> f64 {
    (f64::from(value) * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Public API: multi-page extraction
// ---------------------------------------------------------------------------

/// Extract lines from every page, in page order.
pub fn extract_lines(
    source: &dyn PageSource,
    options: &LineOptions,
) -> Result<Vec<TextLine>, PdfError> {
    let mut lines = Vec::new();

    for (&page_num, &page_id) in &source.pages() {
        let runs = extract_page_runs(source, page_id)?;
        let run_count = runs.len();
        let page_lines = group_runs_into_lines(
            runs,
            page_num as usize,
            source.page_height(page_id),
            options,
        );
        log::debug!(
            "page {}: {} runs -> {} lines",
            page_num,
            run_count,
            page_lines.len()
        );
        lines.extend(page_lines);
    }

    Ok(lines)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
