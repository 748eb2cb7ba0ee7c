#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Feature extraction for trained severity predictors.
//!
//! [`build`] turns whatever signal groups are available into the fixed
//! 21-slot [`FeatureVector`]. Missing groups contribute neutral values and
//! every numeric input is clamped into its documented range, so a
//! predictor never sees `NaN` or an out-of-range value.

use civic_triage_location::{MAX_MULTIPLIER, MIN_MULTIPLIER};
use civic_triage_severity_models::{
    DetectionSummary, Feature, FeatureVector, LocationContext, SceneClassification, SocialSignal,
    TextSentiment, UrgencyLevel, sanitize_non_negative, sanitize_unit,
};

/// Neutral scene confidence used when no scene classification exists.
const NEUTRAL_SCENE_CONFIDENCE: f64 = 0.5;

/// Neutral text sentiment.
const NEUTRAL_SENTIMENT: f64 = 0.5;

/// Neutral location multiplier.
const NEUTRAL_MULTIPLIER: f64 = 1.0;

const fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

/// Builds the feature vector from the available signal groups.
#[must_use]
pub fn build(
    detection: Option<&DetectionSummary>,
    scene: Option<&SceneClassification>,
    location: Option<&LocationContext>,
    text: Option<&TextSentiment>,
    social: Option<&SocialSignal>,
) -> FeatureVector {
    let mut features = FeatureVector::default();

    if let Some(detection) = detection {
        features.set(Feature::ObjectCount, f64::from(detection.object_count));
        features.set(
            Feature::CoverageArea,
            sanitize_unit(detection.coverage_area, 0.0),
        );
        features.set(
            Feature::Density,
            sanitize_non_negative(detection.density, 0.0),
        );
        features.set(Feature::HasOverflow, flag(detection.has_overflow));
        features.set(Feature::IsOpenDump, flag(detection.is_open_dump));
        features.set(Feature::BinDetected, flag(detection.bin_detected));
    }

    let default_scene = SceneClassification::default();
    let scene = scene.unwrap_or(&default_scene);
    features.set(
        Feature::DirtinessScore,
        sanitize_unit(scene.dirtiness_score, 0.0),
    );
    features.set(
        Feature::SceneConfidence,
        sanitize_unit(scene.confidence, NEUTRAL_SCENE_CONFIDENCE),
    );
    features.set(
        Feature::DirtyIndicators,
        sanitize_unit(scene.dirty_indicators, 0.0),
    );
    features.set(
        Feature::CleanIndicators,
        sanitize_unit(scene.clean_indicators, 0.0),
    );

    let multiplier = location.map_or(NEUTRAL_MULTIPLIER, |l| multiplier(l.multiplier));
    features.set(Feature::LocationMultiplier, multiplier);
    if let Some(location) = location {
        features.set(Feature::ZoneEducational, flag(location.zones.educational));
        features.set(Feature::ZoneHealthcare, flag(location.zones.healthcare));
        features.set(Feature::ZoneEco, flag(location.zones.eco));
        features.set(Feature::ZoneResidential, flag(location.zones.residential));
    }

    features.set(
        Feature::SentimentScore,
        text.map_or(NEUTRAL_SENTIMENT, |t| {
            sanitize_unit(t.sentiment_score, NEUTRAL_SENTIMENT)
        }),
    );
    if let Some(text) = text {
        features.set(
            Feature::TextBoostNormalized,
            sanitize_unit(text.urgency_boost_normalized, 0.0),
        );
        features.set(
            Feature::UrgencyCritical,
            flag(text.urgency_level == UrgencyLevel::Critical),
        );
        features.set(
            Feature::UrgencyHigh,
            flag(text.urgency_level == UrgencyLevel::High),
        );
        features.set(
            Feature::UrgencyMedium,
            flag(text.urgency_level == UrgencyLevel::Medium),
        );
    }

    if let Some(social) = social {
        features.set(Feature::UpvoteCountNormalized, social.normalized());
    }

    log::trace!("Built feature vector: {:?}", features.values());

    features
}

/// The 21 feature names in vector order.
#[must_use]
pub fn feature_names() -> Vec<&'static str> {
    Feature::names()
}

fn multiplier(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(MIN_MULTIPLIER, MAX_MULTIPLIER)
    } else {
        log::debug!("Non-finite location multiplier, using {NEUTRAL_MULTIPLIER}");
        NEUTRAL_MULTIPLIER
    }
}

#[cfg(test)]
mod tests {
    use civic_triage_severity_models::{FEATURE_COUNT, ZoneFlags};

    use super::*;

    #[test]
    fn all_missing_is_neutral() {
        let features = build(None, None, None, None, None);
        assert_eq!(features.len(), FEATURE_COUNT);
        for (name, value) in features.named() {
            let expected = match name {
                "scene_confidence" | "sentiment_score" => 0.5,
                "location_multiplier" => 1.0,
                _ => 0.0,
            };
            assert!((value - expected).abs() < f64::EPSILON, "{name} = {value}");
        }
    }

    #[test]
    fn length_is_fixed_for_every_combination() {
        let detection = DetectionSummary::default();
        let scene = SceneClassification::default();
        let location = LocationContext::default();
        let text = TextSentiment::default();
        let social = SocialSignal { upvote_count: 12 };

        for mask in 0_u8..32 {
            let features = build(
                (mask & 1 != 0).then_some(&detection),
                (mask & 2 != 0).then_some(&scene),
                (mask & 4 != 0).then_some(&location),
                (mask & 8 != 0).then_some(&text),
                (mask & 16 != 0).then_some(&social),
            );
            assert_eq!(features.values().len(), FEATURE_COUNT);
            assert_eq!(features.named().count(), FEATURE_COUNT);
        }
    }

    #[test]
    fn populates_slots_in_order() {
        let detection = DetectionSummary {
            object_count: 7,
            coverage_area: 0.4,
            density: 2.5,
            has_overflow: true,
            is_open_dump: false,
            bin_detected: true,
            ..DetectionSummary::default()
        };
        let location = LocationContext {
            multiplier: 1.3,
            zones: ZoneFlags {
                eco: true,
                residential: true,
                ..ZoneFlags::default()
            },
            ..LocationContext::default()
        };
        let text = TextSentiment {
            sentiment_score: 0.8,
            urgency_boost_normalized: 0.6,
            urgency_level: UrgencyLevel::High,
            ..TextSentiment::default()
        };

        let features = build(Some(&detection), None, Some(&location), Some(&text), None);
        let values = features.values();
        assert!((values[0] - 7.0).abs() < f64::EPSILON);
        assert!((values[1] - 0.4).abs() < f64::EPSILON);
        assert!((values[2] - 2.5).abs() < f64::EPSILON);
        assert!((values[3] - 1.0).abs() < f64::EPSILON);
        assert!(values[4].abs() < f64::EPSILON);
        assert!((values[5] - 1.0).abs() < f64::EPSILON);
        assert!((values[10] - 1.3).abs() < f64::EPSILON);
        assert!(values[11].abs() < f64::EPSILON);
        assert!((values[13] - 1.0).abs() < f64::EPSILON);
        assert!((values[14] - 1.0).abs() < f64::EPSILON);
        assert!((values[15] - 0.8).abs() < f64::EPSILON);
        assert!((values[16] - 0.6).abs() < f64::EPSILON);
        assert!(values[17].abs() < f64::EPSILON);
        assert!((values[18] - 1.0).abs() < f64::EPSILON);
        assert!(values[19].abs() < f64::EPSILON);
    }

    #[test]
    fn clamps_out_of_range_and_non_finite() {
        let detection = DetectionSummary {
            coverage_area: 3.0,
            density: -1.0,
            ..DetectionSummary::default()
        };
        let scene = SceneClassification {
            dirtiness_score: f64::NAN,
            confidence: f64::INFINITY,
            dirty_indicators: -0.3,
            clean_indicators: 1.2,
        };
        let location = LocationContext {
            multiplier: 4.0,
            ..LocationContext::default()
        };
        let text = TextSentiment {
            sentiment_score: f64::NAN,
            ..TextSentiment::default()
        };

        let features = build(
            Some(&detection),
            Some(&scene),
            Some(&location),
            Some(&text),
            None,
        );
        assert!((features.get(Feature::CoverageArea) - 1.0).abs() < f64::EPSILON);
        assert!(features.get(Feature::Density).abs() < f64::EPSILON);
        assert!(features.get(Feature::DirtinessScore).abs() < f64::EPSILON);
        assert!((features.get(Feature::SceneConfidence) - 0.5).abs() < f64::EPSILON);
        assert!(features.get(Feature::DirtyIndicators).abs() < f64::EPSILON);
        assert!((features.get(Feature::CleanIndicators) - 1.0).abs() < f64::EPSILON);
        assert!((features.get(Feature::LocationMultiplier) - MAX_MULTIPLIER).abs() < f64::EPSILON);
        assert!((features.get(Feature::SentimentScore) - 0.5).abs() < f64::EPSILON);

        let location = LocationContext {
            multiplier: f64::NAN,
            ..LocationContext::default()
        };
        let features = build(None, None, Some(&location), None, None);
        assert!((features.get(Feature::LocationMultiplier) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn upvotes_use_saturating_normalization() {
        let social = SocialSignal { upvote_count: 9 };
        let features = build(None, None, None, None, Some(&social));
        assert!((features.get(Feature::UpvoteCountNormalized) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn names_match_vector_order() {
        let names = feature_names();
        assert_eq!(names.len(), FEATURE_COUNT);
        assert_eq!(names[0], "object_count");
        assert_eq!(names[10], "location_multiplier");
        assert_eq!(names[20], "upvote_count_normalized");
    }
}
