//! Heading classification.
//!
//! Each [`EnrichedLine`] gets an additive raw score from [`ScoringWeights`],
//! normalized to `[0, 1]`, and a level from [`Thresholds`]. One
//! document-wide adjustment follows: the best non-body line on page 1 is
//! promoted to H1 (see [`promote_first_page_heading`]).

use crate::config::{ClassifierConfig, ScoringWeights, Thresholds};
use crate::features::round_to;
use crate::types::{Classification, ClassifiedLine, EnrichedLine, FeatureSet};

/// Classify every line, preserving input order.
pub fn classify(lines: Vec<EnrichedLine>, config: &ClassifierConfig) -> Vec<ClassifiedLine> {
    let mut classified: Vec<ClassifiedLine> = lines
        .into_iter()
        .map(|EnrichedLine { line, features }| {
            let heading_score = heading_score(&features, &config.weights);
            let classification = assign_level(heading_score, &config.thresholds);
            ClassifiedLine {
                line,
                features,
                heading_score,
                classification,
            }
        })
        .collect();

    if let Some(index) = promote_first_page_heading(&mut classified, config.promotion_min_score) {
        log::debug!(
            "promoted page-1 line {} ({:?}, score {}) to H1",
            index,
            classified[index].line.text,
            classified[index].heading_score
        );
    }

    classified
}

/// Sum of the weights whose conditions hold for `f`.
///
/// Font rank, relative size, casing and shortness each contribute at most one
/// tier. Bold, numbering, the uppercase-ratio bonus and the indent penalty
/// apply independently.
pub fn raw_score(f: &FeatureSet, w: &ScoringWeights) -> f64 {
    let mut score = 0.0;

    score += match f.font_rank {
        1 => w.font_rank_1,
        2 => w.font_rank_2,
        3 => w.font_rank_3,
        4 | 5 => w.font_rank_4_5,
        _ => 0.0,
    };

    score += if f.relative_size >= 1.8 {
        w.relative_size_1_8
    } else if f.relative_size >= 1.5 {
        w.relative_size_1_5
    } else if f.relative_size >= 1.3 {
        w.relative_size_1_3
    } else if f.relative_size >= 1.1 {
        w.relative_size_1_1
    } else {
        0.0
    };

    if f.is_bold {
        score += w.bold;
    }
    if f.has_numbering {
        score += w.numbering;
    }

    if f.is_all_caps {
        score += w.all_caps;
    } else if f.is_title_case {
        score += w.title_case;
    }
    if f.uppercase_ratio > w.uppercase_ratio_min {
        score += w.uppercase_ratio;
    }

    if f.is_very_short {
        score += w.very_short;
    } else if f.is_short {
        score += w.short;
    }

    if f.indent_level > w.deep_indent_level {
        score -= w.deep_indent_penalty;
    }

    score
}

/// Raw score over `max_raw_score`, clamped to `[0, 1]` and rounded to
/// three decimals.
pub fn heading_score(f: &FeatureSet, w: &ScoringWeights) -> f64 {
    let raw = raw_score(f, w);
    let normalized = if w.max_raw_score > 0.0 {
        raw / w.max_raw_score
    } else {
        0.0
    };
    round_to(normalized.clamp(0.0, 1.0), 3)
}

/// Map a score to the highest level whose threshold it reaches.
pub fn assign_level(score: f64, thresholds: &Thresholds) -> Classification {
    if score >= thresholds.h1 {
        Classification::H1
    } else if score >= thresholds.h2 {
        Classification::H2
    } else if score >= thresholds.h3 {
        Classification::H3
    } else {
        Classification::Body
    }
}

/// Force the highest-scoring non-body line on page 1 to H1 when its score is
/// strictly above `min_score`. The first line wins a tie. Returns the index
/// of the promoted line.
///
/// This is a title heuristic for single documents whose first page opens with
/// the title. It ignores every page but the first and touches at most one
/// line; treat it as a candidate for removal rather than something to extend.
pub fn promote_first_page_heading(lines: &mut [ClassifiedLine], min_score: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, l) in lines.iter().enumerate() {
        if l.line.page != 1 || !l.classification.is_heading() {
            continue;
        }
        match best {
            Some((_, score)) if l.heading_score <= score => {}
            _ => best = Some((i, l.heading_score)),
        }
    }

    let (index, score) = best?;
    if score <= min_score {
        return None;
    }
    lines[index].classification = Classification::H1;
    Some(index)
}
