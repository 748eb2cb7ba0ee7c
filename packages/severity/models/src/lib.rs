#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Severity result types and shared signal definitions.
//!
//! This crate defines the vocabulary used across the whole triage system:
//! the five input signal groups produced by upstream collaborators
//! ([`signals`]), the fixed 21-slot [`FeatureVector`] fed to trained
//! predictors ([`features`]), the waste taxonomy ([`waste`]), and the
//! [`SeverityResult`] that callers persist and render.

pub mod features;
pub mod signals;
pub mod waste;

pub use features::{FEATURE_COUNT, Feature, FeatureVector};
pub use signals::{
    DetectedObject, DetectionSummary, EmotionCategory, IssueKind, LocationContext, MatchedSite,
    SceneClassification, SignalGroup, SignalSet, SiteKind, SocialSignal, TextSentiment,
    UrgencyLevel, Zone, ZoneFlags,
};
pub use waste::{WasteClassification, WastePriority, WasteType};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Highest possible severity score.
pub const MAX_SCORE: u8 = 100;

/// Severity bucket derived from a 0-100 score.
///
/// Buckets are inclusive on both ends and cover every integer in 0-100
/// exactly once: Clean 0-20, Low 21-40, Medium 41-60, High 61-80,
/// Extreme 81-100.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum SeverityCategory {
    /// 0-20: nothing actionable.
    Clean,
    /// 21-40: minor issue.
    Low,
    /// 41-60: schedule for routine handling.
    Medium,
    /// 61-80: prompt action recommended.
    High,
    /// 81-100: immediate action required.
    Extreme,
}

impl SeverityCategory {
    /// Maps a score to its bucket. Scores above 100 are treated as 100.
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        match score {
            0..=20 => Self::Clean,
            21..=40 => Self::Low,
            41..=60 => Self::Medium,
            61..=80 => Self::High,
            _ => Self::Extreme,
        }
    }

    /// Inclusive score range covered by this bucket.
    #[must_use]
    pub const fn bounds(self) -> (u8, u8) {
        match self {
            Self::Clean => (0, 20),
            Self::Low => (21, 40),
            Self::Medium => (41, 60),
            Self::High => (61, 80),
            Self::Extreme => (81, 100),
        }
    }

    /// Returns all variants of this enum, lowest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Clean,
            Self::Low,
            Self::Medium,
            Self::High,
            Self::Extreme,
        ]
    }
}

/// Which path produced the reported score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PredictionMethod {
    /// The trained predictor produced the score.
    TrainedModel,
    /// The deterministic weighted formula produced the score.
    RuleBased,
}

/// Per-bucket sub-scores from the rule-based formula.
///
/// Bucket scores are on a 0-100 scale before weighting so the
/// presentation layer can draw them as bars directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentBreakdown {
    /// Weighted combination of coverage, dirtiness and object count.
    pub image_analysis: f64,
    /// Coverage-area sub-score.
    pub coverage: f64,
    /// Scene dirtiness sub-score.
    pub dirtiness: f64,
    /// Object-count sub-score (logarithmic).
    pub object_count: f64,
    /// Location sensitivity sub-score derived from the multiplier.
    pub location_context: f64,
    /// Text urgency sub-score.
    pub text_sentiment: f64,
    /// Community upvote sub-score.
    pub social_signals: f64,
    /// Physical and textual risk-factor sub-score.
    pub risk_factors: f64,
    /// Weighted sum of the five buckets before adjustments.
    pub base_score: f64,
    /// Location multiplier applied to the base score.
    pub location_multiplier: f64,
    /// Flat points added for critical/high urgency.
    pub urgency_boost: f64,
    /// Whether the open-dump-near-sensitive-zone amplification fired.
    pub risk_amplified: bool,
}

/// The auditable outcome of a severity computation.
///
/// This is the only value callers persist. Every field needed to render
/// the score gauge, category badge, bucket bars, explanation and waste
/// breakdown is present, so no fusion logic has to be re-derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityResult {
    /// Final severity score (0-100).
    pub score: u8,
    /// Bucket derived from [`Self::score`].
    pub category: SeverityCategory,
    /// Which path produced [`Self::score`].
    pub prediction_method: PredictionMethod,
    /// Overall confidence (0-1).
    pub confidence: f64,
    /// Rule-based sub-scores (always computed).
    pub component_breakdown: ComponentBreakdown,
    /// Templated explanation text.
    pub explanation: String,
    /// Rule-based score, kept for comparison even when the trained path
    /// won.
    pub rule_based_score: u8,
    /// Predictor family, when the trained path produced the score.
    pub model_type: Option<String>,
    /// Uncalibrated predictor output, when the trained path produced the
    /// score.
    pub raw_model_score: Option<f64>,
    /// Whether post-prediction calibration was applied.
    pub calibrated: bool,
    /// The exact vector fed to the predictor.
    pub model_features: Option<FeatureVector>,
    /// Waste composition for garbage reports with detection data.
    pub waste_classification: Option<WasteClassification>,
}

impl SeverityResult {
    /// Absolute gap between the trained and rule-based scores.
    ///
    /// `None` when the rule-based path produced the result.
    #[must_use]
    pub const fn score_divergence(&self) -> Option<u8> {
        match self.prediction_method {
            PredictionMethod::TrainedModel => Some(self.score.abs_diff(self.rule_based_score)),
            PredictionMethod::RuleBased => None,
        }
    }
}

/// Overall priority across a batch of results.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum PriorityLevel {
    /// Empty batch.
    None,
    /// Nothing above routine.
    Low,
    /// Average severity is at least medium.
    Medium,
    /// At least one high result or two hotspots.
    High,
    /// An extreme result or three hotspots.
    Critical,
}

/// Summary statistics over many results (city-wide monitoring).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Mean score, rounded to one decimal.
    pub average_severity: f64,
    /// Highest score in the batch.
    pub max_severity: u8,
    /// Number of High or Extreme results.
    pub hotspot_count: usize,
    /// Overall priority for the batch.
    pub priority_level: PriorityLevel,
    /// Number of results summarized.
    pub total_analyzed: usize,
}

/// Clamps `value` into `[0, 1]`, replacing non-finite input with
/// `neutral`.
#[must_use]
pub fn sanitize_unit(value: f64, neutral: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        neutral
    }
}

/// Clamps `value` to be non-negative, replacing non-finite input with
/// `neutral`.
#[must_use]
pub fn sanitize_non_negative(value: f64, neutral: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_boundaries() {
        let cases = [
            (0, SeverityCategory::Clean),
            (20, SeverityCategory::Clean),
            (21, SeverityCategory::Low),
            (40, SeverityCategory::Low),
            (41, SeverityCategory::Medium),
            (60, SeverityCategory::Medium),
            (61, SeverityCategory::High),
            (80, SeverityCategory::High),
            (81, SeverityCategory::Extreme),
            (100, SeverityCategory::Extreme),
        ];
        for (score, expected) in cases {
            assert_eq!(
                SeverityCategory::from_score(score),
                expected,
                "score {score}"
            );
        }
    }

    #[test]
    fn category_table_is_total_and_non_overlapping() {
        for score in 0..=MAX_SCORE {
            let matching: Vec<_> = SeverityCategory::all()
                .iter()
                .filter(|c| {
                    let (lo, hi) = c.bounds();
                    (lo..=hi).contains(&score)
                })
                .collect();
            assert_eq!(matching.len(), 1, "score {score} matched {matching:?}");
            assert_eq!(*matching[0], SeverityCategory::from_score(score));
        }
    }

    #[test]
    fn prediction_method_serializes_snake_case() {
        let json = serde_json::to_string(&PredictionMethod::TrainedModel).unwrap();
        assert_eq!(json, "\"trained_model\"");
        assert_eq!(PredictionMethod::RuleBased.to_string(), "rule_based");
    }

    #[test]
    fn sanitize_replaces_non_finite() {
        assert!((sanitize_unit(f64::NAN, 0.5) - 0.5).abs() < f64::EPSILON);
        assert!((sanitize_unit(1.7, 0.5) - 1.0).abs() < f64::EPSILON);
        assert!(sanitize_unit(-0.2, 0.5).abs() < f64::EPSILON);
        assert!(sanitize_non_negative(f64::INFINITY, 0.0).abs() < f64::EPSILON);
        assert!((sanitize_non_negative(3.5, 0.0) - 3.5).abs() < f64::EPSILON);
    }
}
