//! Feature extraction for heading detection.
//!
//! Turns positioned [`TextLine`]s into [`EnrichedLine`]s carrying a fixed
//! [`FeatureSet`]. Font features are page-relative: statistics are computed
//! once per page before any line is annotated.
//!
//! # Pipeline
//!
//! ```text
//! TextLine[]  ->  PageFontStats (per page)  ->  font / text / position features  ->  EnrichedLine[]
//! ```

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::FeatureConfig;
use crate::types::{BBox, EnrichedLine, FeatureSet, NumberingPattern, TextLine};

// ---------------------------------------------------------------------------
// Page statistics
// ---------------------------------------------------------------------------

/// Font-size statistics shared by every line of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageFontStats {
    /// Most common font size on the page.
    pub body_text_size: f64,
    /// Distinct sizes on the page, largest first.
    pub unique_sizes: Vec<f64>,
}

/// Compute [`PageFontStats`] for every page that has at least one sized line.
///
/// The body size is the modal size. When several sizes tie for the highest
/// count, the one that occurs first in line order wins.
pub fn compute_page_stats(lines: &[TextLine]) -> BTreeMap<usize, PageFontStats> {
    // (size, count) in first-seen order per page.
    let mut counts: BTreeMap<usize, Vec<(f64, usize)>> = BTreeMap::new();

    for line in lines {
        let Some(size) = line.font_size.filter(|s| s.is_finite()) else {
            continue;
        };
        let page = counts.entry(line.page).or_default();
        match page.iter_mut().find(|(s, _)| *s == size) {
            Some((_, n)) => *n += 1,
            None => page.push((size, 1)),
        }
    }

    counts
        .into_iter()
        .filter_map(|(page, sizes)| {
            let mut best: Option<(f64, usize)> = None;
            for &(size, n) in &sizes {
                match best {
                    Some((_, best_n)) if n <= best_n => {}
                    _ => best = Some((size, n)),
                }
            }
            let (body_text_size, _) = best?;

            let mut unique_sizes: Vec<f64> = sizes.iter().map(|(s, _)| *s).collect();
            unique_sizes.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

            Some((
                page,
                PageFontStats {
                    body_text_size,
                    unique_sizes,
                },
            ))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Annotate every line with its [`FeatureSet`], preserving input order.
pub fn enrich(lines: Vec<TextLine>, config: &FeatureConfig) -> Vec<EnrichedLine> {
    if lines.is_empty() {
        return Vec::new();
    }

    let page_stats = compute_page_stats(&lines);
    log::debug!(
        "font statistics computed for {} of {} lines across {} pages",
        lines.iter().filter(|l| l.font_size.is_some()).count(),
        lines.len(),
        page_stats.len()
    );

    lines
        .into_iter()
        .map(|line| {
            let features = line_features(&line, page_stats.get(&line.page), config);
            EnrichedLine { line, features }
        })
        .collect()
}

/// Derive the full feature set of one line given its page's statistics.
pub fn line_features(
    line: &TextLine,
    stats: Option<&PageFontStats>,
    config: &FeatureConfig,
) -> FeatureSet {
    let font = font_features(line, stats);
    let text = text_features(&line.text, config);
    let position = position_features(&line.bbox, config);

    FeatureSet {
        font_rank: font.font_rank,
        relative_size: font.relative_size,
        is_bold: font.is_bold,
        is_italic: line.is_italic,
        font_family: font.font_family,
        word_count: text.word_count,
        char_count: text.char_count,
        is_short: text.is_short,
        is_very_short: text.is_very_short,
        is_all_caps: text.is_all_caps,
        is_title_case: text.is_title_case,
        uppercase_ratio: text.uppercase_ratio,
        has_numbering: text.numbering_pattern != NumberingPattern::None,
        numbering_pattern: text.numbering_pattern,
        text_width_ratio: position.text_width_ratio,
        is_left_aligned: position.is_left_aligned,
        is_centered: position.is_centered,
        is_indented: position.is_indented,
        indent_level: position.indent_level,
        left_margin: position.left_margin,
    }
}

// ---------------------------------------------------------------------------
// Font features
// ---------------------------------------------------------------------------

/// Substrings of a font family name that imply a bold weight.
const BOLD_FAMILY_MARKERS: [&str; 3] = ["bold", "heavy", "black"];

struct FontFeatures {
    font_rank: usize,
    relative_size: f64,
    is_bold: bool,
    font_family: String,
}

fn font_features(line: &TextLine, stats: Option<&PageFontStats>) -> FontFeatures {
    let size = line.font_size.filter(|s| s.is_finite()).unwrap_or(0.0);

    let (body_size, font_rank) = match stats {
        Some(stats) => (
            stats.body_text_size,
            font_rank(size, &stats.unique_sizes),
        ),
        // No sized line on this page: the line is its own reference.
        None => (if size != 0.0 { size } else { 1.0 }, 1),
    };

    let relative_size = if body_size > 0.0 {
        size / body_size
    } else {
        1.0
    };

    let font_family = line.font_family.to_lowercase();
    let is_bold = line.is_bold
        || BOLD_FAMILY_MARKERS
            .iter()
            .any(|marker| font_family.contains(marker));

    FontFeatures {
        font_rank,
        relative_size: round_to(relative_size, 2),
        is_bold,
        font_family,
    }
}

/// 1-based position of `size` in the descending `unique_sizes`; sizes not
/// present rank last.
fn font_rank(size: f64, unique_sizes: &[f64]) -> usize {
    unique_sizes
        .iter()
        .position(|s| *s == size)
        .map(|i| i + 1)
        .unwrap_or(unique_sizes.len())
}

// ---------------------------------------------------------------------------
// Text features
// ---------------------------------------------------------------------------

struct TextFeatures {
    word_count: usize,
    char_count: usize,
    is_short: bool,
    is_very_short: bool,
    is_all_caps: bool,
    is_title_case: bool,
    uppercase_ratio: f64,
    numbering_pattern: NumberingPattern,
}

fn text_features(text: &str, config: &FeatureConfig) -> TextFeatures {
    let text = text.trim();
    let word_count = text.split_whitespace().count();
    let char_count = text.chars().count();
    let uppercase = text.chars().filter(|c| c.is_uppercase()).count();

    TextFeatures {
        word_count,
        char_count,
        is_short: word_count < config.short_words,
        is_very_short: word_count < config.very_short_words,
        is_all_caps: is_upper(text) && char_count > config.all_caps_min_chars,
        is_title_case: is_title_case(text),
        uppercase_ratio: round_to(uppercase as f64 / char_count.max(1) as f64, 2),
        numbering_pattern: detect_numbering(text),
    }
}

/// At least one cased character and no lowercase ones.
fn is_upper(text: &str) -> bool {
    text.chars().any(char::is_uppercase) && !text.chars().any(char::is_lowercase)
}

/// Title case in the word-structure sense: every uppercase letter starts a
/// cased run and every lowercase letter continues one. Requires at least one
/// cased character, so `"1.1 Scope"` and `"Chapter 1: Introduction"` qualify
/// while `"Hello world"` and `"NASA Report"` do not.
pub fn is_title_case(text: &str) -> bool {
    let mut cased = false;
    let mut previous_is_cased = false;

    for c in text.chars() {
        if c.is_uppercase() {
            if previous_is_cased {
                return false;
            }
            previous_is_cased = true;
            cased = true;
        } else if c.is_lowercase() {
            if !previous_is_cased {
                return false;
            }
            previous_is_cased = true;
            cased = true;
        } else {
            previous_is_cased = false;
        }
    }

    cased
}

/// Classify leading numbering, testing the most specific pattern first.
pub fn detect_numbering(text: &str) -> NumberingPattern {
    static RE_MULTI_LEVEL: OnceLock<Regex> = OnceLock::new();
    static RE_NUMBERED: OnceLock<Regex> = OnceLock::new();
    static RE_ROMAN: OnceLock<Regex> = OnceLock::new();
    static RE_LETTERED: OnceLock<Regex> = OnceLock::new();

    let re_multi_level = RE_MULTI_LEVEL.get_or_init(|| Regex::new(r"^\d+(\.\d+)+").unwrap());
    let re_numbered = RE_NUMBERED.get_or_init(|| Regex::new(r"^\d+\.").unwrap());
    let re_roman = RE_ROMAN.get_or_init(|| Regex::new(r"(?i)^[ivxlcdm]+\.").unwrap());
    let re_lettered = RE_LETTERED.get_or_init(|| Regex::new(r"^[A-Z]\.").unwrap());

    let text = text.trim();
    if re_multi_level.is_match(text) {
        NumberingPattern::MultiLevel
    } else if re_numbered.is_match(text) {
        NumberingPattern::Numbered
    } else if re_roman.is_match(text) {
        NumberingPattern::Roman
    } else if re_lettered.is_match(text) {
        NumberingPattern::Lettered
    } else {
        NumberingPattern::None
    }
}

// ---------------------------------------------------------------------------
// Position features
// ---------------------------------------------------------------------------

struct PositionFeatures {
    text_width_ratio: f64,
    is_left_aligned: bool,
    is_centered: bool,
    is_indented: bool,
    indent_level: u32,
    left_margin: f64,
}

fn position_features(bbox: &BBox, config: &FeatureConfig) -> PositionFeatures {
    let x0 = bbox.x0;
    let text_width = bbox.width().max(1.0);
    let page_center = config.page_width / 2.0;

    let indent_level = if config.indent_step > 0.0 {
        ((x0 - config.left_margin) / config.indent_step)
            .floor()
            .max(0.0) as u32
    } else {
        0
    };

    PositionFeatures {
        text_width_ratio: round_to(text_width / config.page_width.max(1.0), 3),
        is_left_aligned: x0 < config.left_margin + config.left_align_tolerance,
        is_centered: (bbox.center_x() - page_center).abs() < config.center_tolerance,
        is_indented: x0 > config.left_margin + config.indent_tolerance,
        indent_level,
        left_margin: round_to(x0, 2),
    }
}

/// Round to a fixed number of decimal places.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, page: usize, size: f64) -> TextLine {
        TextLine {
            text: text.to_string(),
            page,
            font_size: Some(size),
            font_family: "Helvetica".to_string(),
            is_bold: false,
            is_italic: false,
            bbox: BBox::new(50.0, 100.0, 400.0, 112.0),
        }
    }

    fn at(mut l: TextLine, x0: f64, x1: f64) -> TextLine {
        l.bbox = BBox::new(x0, l.bbox.y0, x1, l.bbox.y1);
        l
    }

    fn features_of(lines: Vec<TextLine>) -> Vec<FeatureSet> {
        enrich(lines, &FeatureConfig::default())
            .into_iter()
            .map(|e| e.features)
            .collect()
    }

    // =====================================================================
    // compute_page_stats
    // =====================================================================

    #[test]
    fn test_page_stats_body_size_is_mode() {
        let lines = vec![
            line("Title", 1, 24.0),
            line("a", 1, 12.0),
            line("b", 1, 12.0),
            line("Sub", 1, 16.0),
        ];
        let stats = compute_page_stats(&lines);
        let page = &stats[&1];
        assert_eq!(page.body_text_size, 12.0);
        assert_eq!(page.unique_sizes, vec![24.0, 16.0, 12.0]);
    }

    #[test]
    fn test_page_stats_tie_goes_to_first_seen_size() {
        let lines = vec![
            line("a", 1, 14.0),
            line("b", 1, 10.0),
            line("c", 1, 10.0),
            line("d", 1, 14.0),
        ];
        let stats = compute_page_stats(&lines);
        assert_eq!(stats[&1].body_text_size, 14.0);

        let reversed = vec![
            line("b", 1, 10.0),
            line("a", 1, 14.0),
            line("c", 1, 10.0),
            line("d", 1, 14.0),
        ];
        let stats = compute_page_stats(&reversed);
        assert_eq!(stats[&1].body_text_size, 10.0);
    }

    #[test]
    fn test_page_stats_are_per_page() {
        let lines = vec![
            line("a", 1, 12.0),
            line("b", 1, 12.0),
            line("c", 2, 9.0),
        ];
        let stats = compute_page_stats(&lines);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[&1].body_text_size, 12.0);
        assert_eq!(stats[&2].body_text_size, 9.0);
        assert_eq!(stats[&2].unique_sizes, vec![9.0]);
    }

    #[test]
    fn test_page_stats_skip_unsized_lines() {
        let mut unsized_line = line("x", 3, 0.0);
        unsized_line.font_size = None;
        let stats = compute_page_stats(&[unsized_line]);
        assert!(stats.is_empty());
    }

    // =====================================================================
    // font features
    // =====================================================================

    #[test]
    fn test_font_rank_and_relative_size_are_page_relative() {
        let features = features_of(vec![
            line("Big", 1, 24.0),
            line("body", 1, 12.0),
            line("body", 1, 12.0),
            // Same 12pt size is the largest on page 2.
            line("Page two", 2, 12.0),
            line("small", 2, 8.0),
            line("small", 2, 8.0),
        ]);
        assert_eq!(features[0].font_rank, 1);
        assert_eq!(features[0].relative_size, 2.0);
        assert_eq!(features[1].font_rank, 2);
        assert_eq!(features[1].relative_size, 1.0);
        assert_eq!(features[3].font_rank, 1);
        assert_eq!(features[3].relative_size, 1.5);
    }

    #[test]
    fn test_relative_size_rounded_to_two_decimals() {
        let features = features_of(vec![
            line("Heading", 1, 14.0),
            line("body", 1, 11.0),
            line("body", 1, 11.0),
        ]);
        // 14 / 11 = 1.2727...
        assert_eq!(features[0].relative_size, 1.27);
    }

    #[test]
    fn test_missing_font_size_on_sized_page_ranks_last() {
        let mut unsized_line = line("no size", 1, 0.0);
        unsized_line.font_size = None;
        let features = features_of(vec![
            line("Big", 1, 20.0),
            line("body", 1, 10.0),
            unsized_line,
        ]);
        assert_eq!(features[2].font_rank, 2);
        assert_eq!(features[2].relative_size, 0.0);
    }

    #[test]
    fn test_missing_font_size_on_unsized_page_uses_fallback() {
        let mut unsized_line = line("alone", 4, 0.0);
        unsized_line.font_size = None;
        let features = features_of(vec![unsized_line]);
        assert_eq!(features[0].font_rank, 1);
        assert_eq!(features[0].relative_size, 0.0);
    }

    #[test]
    fn test_bold_from_flag_or_family_name() {
        let mut flagged = line("a", 1, 12.0);
        flagged.is_bold = true;
        let mut heavy = line("b", 1, 12.0);
        heavy.font_family = "Avenir-Heavy".to_string();
        let mut black = line("c", 1, 12.0);
        black.font_family = "Roboto Black".to_string();
        let plain = line("d", 1, 12.0);

        let features = features_of(vec![flagged, heavy, black, plain]);
        assert!(features[0].is_bold);
        assert!(features[1].is_bold);
        assert!(features[2].is_bold);
        assert!(!features[3].is_bold);
        assert_eq!(features[1].font_family, "avenir-heavy");
    }

    #[test]
    fn test_italic_passes_through() {
        let mut italic = line("a", 1, 12.0);
        italic.is_italic = true;
        let features = features_of(vec![italic]);
        assert!(features[0].is_italic);
    }

    // =====================================================================
    // text features
    // =====================================================================

    #[test]
    fn test_numbering_cascade() {
        assert_eq!(detect_numbering("1.1 Scope"), NumberingPattern::MultiLevel);
        assert_eq!(detect_numbering("2.3.4 Details"), NumberingPattern::MultiLevel);
        assert_eq!(detect_numbering("1. Introduction"), NumberingPattern::Numbered);
        assert_eq!(detect_numbering("IV. Results"), NumberingPattern::Roman);
        assert_eq!(detect_numbering("iv. results"), NumberingPattern::Roman);
        assert_eq!(detect_numbering("B. Background"), NumberingPattern::Lettered);
        assert_eq!(detect_numbering("Introduction"), NumberingPattern::None);
        assert_eq!(detect_numbering("1 Introduction"), NumberingPattern::None);
        assert_eq!(detect_numbering("  3. Indented"), NumberingPattern::Numbered);
    }

    #[test]
    fn test_roman_takes_precedence_over_letter() {
        // "C" is both a roman numeral and a capital letter.
        assert_eq!(detect_numbering("C. Costs"), NumberingPattern::Roman);
    }

    #[test]
    fn test_numbering_sets_flag() {
        let features = features_of(vec![line("1.1 Scope", 1, 12.0), line("Scope", 1, 12.0)]);
        assert!(features[0].has_numbering);
        assert_eq!(features[0].numbering_pattern, NumberingPattern::MultiLevel);
        assert!(!features[1].has_numbering);
        assert_eq!(features[1].numbering_pattern, NumberingPattern::None);
    }

    #[test]
    fn test_title_case() {
        assert!(is_title_case("Chapter 1: Introduction"));
        assert!(is_title_case("1.1 Scope"));
        assert!(is_title_case("Results And Discussion"));
        assert!(!is_title_case("Results and discussion"));
        assert!(!is_title_case("NASA Report"));
        assert!(!is_title_case("1.2.3"));
        assert!(!is_title_case(""));
    }

    #[test]
    fn test_all_caps_requires_more_than_three_chars() {
        let features = features_of(vec![
            line("INTRODUCTION", 1, 12.0),
            line("FAQ", 1, 12.0),
            line("1. SCOPE", 1, 12.0),
            line("Scope", 1, 12.0),
        ]);
        assert!(features[0].is_all_caps);
        assert!(!features[1].is_all_caps);
        assert!(features[2].is_all_caps);
        assert!(!features[3].is_all_caps);
    }

    #[test]
    fn test_word_counts_and_shortness() {
        let features = features_of(vec![
            line("  Executive Summary  ", 1, 12.0),
            line("one two three four five six", 1, 12.0),
            line("one two three four five six seven eight nine ten", 1, 12.0),
        ]);
        assert_eq!(features[0].word_count, 2);
        assert_eq!(features[0].char_count, 17);
        assert!(features[0].is_very_short);
        assert!(features[0].is_short);

        assert!(!features[1].is_very_short);
        assert!(features[1].is_short);

        assert!(!features[2].is_short);
    }

    #[test]
    fn test_uppercase_ratio() {
        let features = features_of(vec![line("ABcd", 1, 12.0), line("", 1, 12.0)]);
        assert_eq!(features[0].uppercase_ratio, 0.5);
        assert_eq!(features[1].uppercase_ratio, 0.0);
        assert_eq!(features[1].word_count, 0);
    }

    // =====================================================================
    // position features
    // =====================================================================

    #[test]
    fn test_left_aligned_body_line() {
        let features = features_of(vec![at(line("body", 1, 12.0), 50.0, 550.0)]);
        let f = &features[0];
        assert!(f.is_left_aligned);
        assert!(!f.is_indented);
        assert_eq!(f.indent_level, 0);
        assert_eq!(f.left_margin, 50.0);
        assert_eq!(f.text_width_ratio, 0.817);
    }

    #[test]
    fn test_centered_line() {
        let features = features_of(vec![at(line("Title", 1, 24.0), 256.0, 356.0)]);
        let f = &features[0];
        assert!(f.is_centered);
        assert!(!f.is_left_aligned);
        assert!(f.is_indented);
    }

    #[test]
    fn test_indent_levels() {
        let features = features_of(vec![
            at(line("a", 1, 12.0), 79.9, 300.0),
            at(line("b", 1, 12.0), 80.0, 300.0),
            at(line("c", 1, 12.0), 145.0, 300.0),
            at(line("d", 1, 12.0), 10.0, 300.0),
        ]);
        assert_eq!(features[0].indent_level, 0);
        assert!(!features[0].is_indented);
        assert_eq!(features[1].indent_level, 1);
        assert!(!features[1].is_indented);
        assert_eq!(features[2].indent_level, 3);
        assert!(features[2].is_indented);
        assert_eq!(features[3].indent_level, 0);
    }

    #[test]
    fn test_degenerate_bbox_width_is_at_least_one_point() {
        let features = features_of(vec![at(line("x", 1, 12.0), 100.0, 100.0)]);
        assert_eq!(features[0].text_width_ratio, round_to(1.0 / 612.0, 3));
    }

    #[test]
    fn test_page_width_comes_from_config_not_geometry() {
        let config = FeatureConfig {
            page_width: 1000.0,
            ..FeatureConfig::default()
        };
        let enriched = enrich(vec![at(line("Title", 1, 12.0), 450.0, 550.0)], &config);
        assert!(enriched[0].features.is_centered);
    }

    // =====================================================================
    // enrich
    // =====================================================================

    #[test]
    fn test_enrich_empty() {
        assert!(enrich(Vec::new(), &FeatureConfig::default()).is_empty());
    }

    #[test]
    fn test_enrich_preserves_order_and_length() {
        let lines = vec![
            line("first", 2, 10.0),
            line("second", 1, 18.0),
            line("third", 2, 14.0),
            line("fourth", 1, 10.0),
        ];
        let enriched = enrich(lines.clone(), &FeatureConfig::default());
        assert_eq!(enriched.len(), lines.len());
        for (e, l) in enriched.iter().zip(&lines) {
            assert_eq!(&e.line, l);
        }
    }
}
