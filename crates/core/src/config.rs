//! Tunable constants for the pipeline.
//!
//! Everything the stages need is carried in a single immutable
//! [`PipelineConfig`] that callers pass explicitly. Every struct derives
//! `Deserialize` with `#[serde(default)]`, so a TOML file only needs to name
//! the values it overrides:
//!
//! ```toml
//! [classifier.thresholds]
//! h1 = 0.8
//!
//! [features]
//! page_width = 595.0
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid heading thresholds: {0}")]
    InvalidThresholds(String),
}

/// Score cut-offs for each level. A line takes the highest level whose
/// threshold its score reaches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub h1: f64,
    pub h2: f64,
    pub h3: f64,
    pub body: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            h1: 0.75,
            h2: 0.50,
            h3: 0.35,
            body: 0.0,
        }
    }
}

impl Thresholds {
    /// Check that every threshold lies in `[0, 1]` and that
    /// `h1 >= h2 >= h3 >= body`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("h1", self.h1),
            ("h2", self.h2),
            ("h3", self.h3),
            ("body", self.body),
        ];
        for (name, value) in named {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidThresholds(format!(
                    "{name} = {value} is outside [0, 1]"
                )));
            }
        }
        for pair in named.windows(2) {
            let (hi_name, hi) = pair[0];
            let (lo_name, lo) = pair[1];
            if hi < lo {
                return Err(ConfigError::InvalidThresholds(format!(
                    "{hi_name} ({hi}) must be >= {lo_name} ({lo})"
                )));
            }
        }
        Ok(())
    }
}

/// Additive weights of the heading score. See [`crate::classify`] for how
/// tiers are picked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub font_rank_1: f64,
    pub font_rank_2: f64,
    pub font_rank_3: f64,
    /// Applies to ranks 4 and 5.
    pub font_rank_4_5: f64,

    pub relative_size_1_8: f64,
    pub relative_size_1_5: f64,
    pub relative_size_1_3: f64,
    pub relative_size_1_1: f64,

    pub bold: f64,
    pub numbering: f64,
    pub all_caps: f64,
    pub title_case: f64,
    pub uppercase_ratio: f64,
    /// Ratio above which `uppercase_ratio` earns its bonus.
    pub uppercase_ratio_min: f64,
    pub very_short: f64,
    pub short: f64,
    /// Subtracted when `indent_level` exceeds `deep_indent_level`.
    pub deep_indent_penalty: f64,
    pub deep_indent_level: u32,

    /// Normalization denominator; raw scores above it clamp to 1.0.
    pub max_raw_score: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            font_rank_1: 4.5,
            font_rank_2: 3.5,
            font_rank_3: 2.5,
            font_rank_4_5: 1.5,
            relative_size_1_8: 2.5,
            relative_size_1_5: 2.0,
            relative_size_1_3: 1.8,
            relative_size_1_1: 1.2,
            bold: 2.0,
            numbering: 1.2,
            all_caps: 1.2,
            title_case: 0.8,
            uppercase_ratio: 0.6,
            uppercase_ratio_min: 0.6,
            very_short: 1.2,
            short: 0.8,
            deep_indent_penalty: 0.5,
            deep_indent_level: 2,
            max_raw_score: 11.0,
        }
    }
}

/// Settings for [`crate::classify::classify`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub thresholds: Thresholds,
    pub weights: ScoringWeights,
    /// Best page-1 heading must score strictly above this to be promoted.
    pub promotion_min_score: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            weights: ScoringWeights::default(),
            promotion_min_score: 0.4,
        }
    }
}

/// Geometry and length constants used by [`crate::features`].
///
/// Page geometry is assumed, never read from the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Assumed page width in points (US Letter).
    pub page_width: f64,
    pub left_margin: f64,
    pub left_align_tolerance: f64,
    pub center_tolerance: f64,
    pub indent_tolerance: f64,
    pub indent_step: f64,
    /// Lines with fewer words are "short".
    pub short_words: usize,
    /// Lines with fewer words are "very short".
    pub very_short_words: usize,
    /// `is_all_caps` additionally requires more characters than this.
    pub all_caps_min_chars: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            page_width: 612.0,
            left_margin: 50.0,
            left_align_tolerance: 20.0,
            center_tolerance: 75.0,
            indent_tolerance: 30.0,
            indent_step: 30.0,
            short_words: 10,
            very_short_words: 6,
            all_caps_min_chars: 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub features: FeatureConfig,
    pub classifier: ClassifierConfig,
}

impl PipelineConfig {
    /// Parse and validate a TOML document. Missing tables and keys keep
    /// their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.classifier.thresholds.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let t = Thresholds::default();
        assert_eq!(t.h1, 0.75);
        assert_eq!(t.h2, 0.50);
        assert_eq!(t.h3, 0.35);
        assert_eq!(t.body, 0.0);
        assert!(t.validate().is_ok());
    }

    #[test]
    fn test_thresholds_out_of_order_rejected() {
        let t = Thresholds {
            h1: 0.4,
            h2: 0.6,
            ..Thresholds::default()
        };
        let err = t.validate().unwrap_err();
        assert!(err.to_string().contains("h1"));
    }

    #[test]
    fn test_thresholds_out_of_range_rejected() {
        let t = Thresholds {
            h1: 1.5,
            ..Thresholds::default()
        };
        assert!(matches!(
            t.validate(),
            Err(ConfigError::InvalidThresholds(_))
        ));
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.classifier.promotion_min_score, 0.4);
    }

    #[test]
    fn test_partial_toml_overrides_only_named_fields() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [classifier.thresholds]
            h1 = 0.8

            [classifier.weights]
            bold = 3.0

            [features]
            page_width = 595.0
            "#,
        )
        .unwrap();

        assert_eq!(config.classifier.thresholds.h1, 0.8);
        assert_eq!(config.classifier.thresholds.h2, 0.50);
        assert_eq!(config.classifier.weights.bold, 3.0);
        assert_eq!(config.classifier.weights.font_rank_1, 4.5);
        assert_eq!(config.features.page_width, 595.0);
        assert_eq!(config.features.left_margin, 50.0);
    }

    #[test]
    fn test_invalid_toml_thresholds_rejected() {
        let result = PipelineConfig::from_toml_str(
            r#"
            [classifier.thresholds]
            h2 = 0.9
            "#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidThresholds(_))));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let result = PipelineConfig::from_toml_str("[classifier\nh1 = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_best_case_raw_score_exceeds_denominator() {
        // Best tier of every group; normalization clamps the excess.
        let w = ScoringWeights::default();
        let best = w.font_rank_1
            + w.relative_size_1_8
            + w.bold
            + w.numbering
            + w.all_caps
            + w.uppercase_ratio
            + w.very_short;
        assert!(best >= w.max_raw_score);
    }
}
