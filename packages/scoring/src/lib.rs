#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Rule-based severity scoring.
//!
//! The formula is a weighted sum of five 0-100 buckets, then adjusted for
//! location and urgency:
//!
//! | Bucket | Weight | Sub-score |
//! |---|---|---|
//! | Image analysis | 40% | coverage 37.5%, dirtiness 37.5%, object count 25% |
//! | Location context | 25% | `(multiplier - 0.9) / 0.6 * 100` |
//! | Text sentiment | 20% | `urgency_boost_normalized * 100` |
//! | Social signals | 10% | `normalized upvotes * 100` |
//! | Risk factors | 5% | overflow 40, open dump 40, major road 20, text hazard 30 |
//!
//! The base sum is multiplied by the location multiplier, critical/high
//! urgency adds 15/10 points, and an open dump in a sensitive zone is
//! amplified by 10%. The result is clipped to 0-100 and rounded.

use civic_triage_location::{MAX_MULTIPLIER, MIN_MULTIPLIER};
use civic_triage_severity_models::{
    ComponentBreakdown, DetectionSummary, LocationContext, MAX_SCORE, SceneClassification,
    SocialSignal, TextSentiment, UrgencyLevel, sanitize_unit,
};

// ── Weights ──────────────────────────────────────────────

const IMAGE_WEIGHT: f64 = 0.40;
const LOCATION_WEIGHT: f64 = 0.25;
const TEXT_WEIGHT: f64 = 0.20;
const SOCIAL_WEIGHT: f64 = 0.10;
const RISK_WEIGHT: f64 = 0.05;

const COVERAGE_SUB_WEIGHT: f64 = 0.375;
const DIRTINESS_SUB_WEIGHT: f64 = 0.375;
const COUNT_SUB_WEIGHT: f64 = 0.25;

// ── Risk points ──────────────────────────────────────────

const OVERFLOW_RISK: f64 = 40.0;
const OPEN_DUMP_RISK: f64 = 40.0;
const MAJOR_ROAD_RISK: f64 = 20.0;
const TEXT_HAZARD_RISK: f64 = 30.0;

/// Amplification for an open dump in a sensitive zone.
const SENSITIVE_DUMP_FACTOR: f64 = 1.1;

/// Object count that saturates the count sub-score.
const COUNT_SATURATION: f64 = 50.0;

/// Multiplier above which the explanation flags a sensitive location.
const HIGH_PRIORITY_MULTIPLIER: f64 = 1.2;

/// Output of the rule-based formula.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleBasedScore {
    /// Final 0-100 score.
    pub score: u8,
    pub breakdown: ComponentBreakdown,
    /// Input-driven explanation fragments, joined with spaces.
    pub explanation: String,
    /// Confidence (0-1) based on which inputs were available.
    pub confidence: f64,
}

/// Scores a report from whatever signal groups are available.
///
/// Missing groups contribute their neutral value. The same inputs always
/// produce the same output.
#[must_use]
pub fn score(
    detection: Option<&DetectionSummary>,
    scene: Option<&SceneClassification>,
    location: Option<&LocationContext>,
    text: Option<&TextSentiment>,
    social: Option<&SocialSignal>,
) -> RuleBasedScore {
    let default_detection = DetectionSummary::default();
    let detection_or_default = detection.unwrap_or(&default_detection);
    let default_scene = SceneClassification::default();
    let scene_or_default = scene.unwrap_or(&default_scene);

    // ── Image ────────────────────────────────────────────
    let coverage = coverage_score(detection_or_default.coverage_area);
    let dirtiness = sanitize_unit(scene_or_default.dirtiness_score, 0.0) * 100.0;
    let object_count = count_score(detection_or_default.object_count);
    let image = coverage.mul_add(
        COVERAGE_SUB_WEIGHT,
        dirtiness.mul_add(DIRTINESS_SUB_WEIGHT, object_count * COUNT_SUB_WEIGHT),
    );

    // ── Location ─────────────────────────────────────────
    let multiplier = location.map_or(1.0, |l| sanitize_multiplier(l.multiplier));
    let location_score =
        ((multiplier - MIN_MULTIPLIER) / (MAX_MULTIPLIER - MIN_MULTIPLIER) * 100.0).clamp(0.0, 100.0);
    let sensitive = location.is_some_and(|l| l.zones.is_sensitive());
    let major_road = location.is_some_and(|l| l.major_road);

    // ── Text ─────────────────────────────────────────────
    let text_score = text.map_or(0.0, |t| sanitize_unit(t.urgency_boost_normalized, 0.0)) * 100.0;
    let urgency = text.map_or(UrgencyLevel::None, |t| t.urgency_level);
    let hazard = text.is_some_and(|t| t.hazard_detected);

    // ── Social ───────────────────────────────────────────
    let social_score = social.map_or(0.0, |s| s.normalized()) * 100.0;

    // ── Risk ─────────────────────────────────────────────
    let risk = risk_score(detection_or_default, major_road, hazard);

    // ── Fusion ───────────────────────────────────────────
    let base = (image * IMAGE_WEIGHT
        + location_score * LOCATION_WEIGHT
        + text_score * TEXT_WEIGHT
        + social_score * SOCIAL_WEIGHT
        + risk * RISK_WEIGHT)
        .clamp(0.0, 100.0);

    let urgency_boost = urgency.flat_boost();
    let mut adjusted = base.mul_add(multiplier, urgency_boost);
    let risk_amplified = detection_or_default.is_open_dump && sensitive;
    if risk_amplified {
        adjusted *= SENSITIVE_DUMP_FACTOR;
    }
    let final_score = to_score(adjusted);

    log::debug!(
        "Rule-based score {final_score} (base {base:.1}, multiplier {multiplier}, \
         urgency +{urgency_boost}, amplified {risk_amplified})"
    );

    let breakdown = ComponentBreakdown {
        image_analysis: round1(image),
        coverage: round1(coverage),
        dirtiness: round1(dirtiness),
        object_count: round1(object_count),
        location_context: round1(location_score),
        text_sentiment: round1(text_score),
        social_signals: round1(social_score),
        risk_factors: round1(risk),
        base_score: round1(base),
        location_multiplier: multiplier,
        urgency_boost,
        risk_amplified,
    };

    RuleBasedScore {
        score: final_score,
        breakdown,
        explanation: explain(detection, scene, location, text, social, risk_amplified),
        confidence: confidence(detection, scene, location, text),
    }
}

/// `min(coverage * 200, 100)`: half the frame covered is the maximum.
#[must_use]
pub fn coverage_score(coverage_area: f64) -> f64 {
    (sanitize_unit(coverage_area, 0.0) * 200.0).min(100.0)
}

/// Logarithmic object-count sub-score: 0 for none, 20 for one, 100 at 50+.
#[must_use]
pub fn count_score(object_count: u32) -> f64 {
    if object_count == 0 {
        return 0.0;
    }
    let n = f64::from(object_count);
    (n.ln() / COUNT_SATURATION.ln()).mul_add(80.0, 20.0).min(100.0)
}

fn risk_score(detection: &DetectionSummary, major_road: bool, text_hazard: bool) -> f64 {
    let mut risk = 0.0;
    if detection.has_overflow {
        risk += OVERFLOW_RISK;
    }
    if detection.is_open_dump {
        risk += OPEN_DUMP_RISK;
    }
    if major_road {
        risk += MAJOR_ROAD_RISK;
    }
    if text_hazard {
        risk += TEXT_HAZARD_RISK;
    }
    f64::min(risk, 100.0)
}

fn sanitize_multiplier(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(MIN_MULTIPLIER, MAX_MULTIPLIER)
    } else {
        1.0
    }
}

/// Weighted availability: scene 30%, detection 30%, text 20%, location 20%.
fn confidence(
    detection: Option<&DetectionSummary>,
    scene: Option<&SceneClassification>,
    location: Option<&LocationContext>,
    text: Option<&TextSentiment>,
) -> f64 {
    let scene_confidence = scene.map_or(0.5, |s| sanitize_unit(s.confidence, 0.5));
    let detection_confidence = if detection.is_some_and(|d| d.object_count > 0) {
        0.8
    } else {
        0.4
    };
    let text_confidence = if text.is_some() { 0.9 } else { 0.5 };
    let location_confidence = if location.is_some() { 0.9 } else { 0.5 };

    let total = scene_confidence * 0.3
        + detection_confidence * 0.3
        + text_confidence * 0.2
        + location_confidence * 0.2;
    (total * 1_000.0).round() / 1_000.0
}

#[allow(clippy::too_many_lines)]
fn explain(
    detection: Option<&DetectionSummary>,
    scene: Option<&SceneClassification>,
    location: Option<&LocationContext>,
    text: Option<&TextSentiment>,
    social: Option<&SocialSignal>,
    risk_amplified: bool,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(detection) = detection {
        parts.push(match detection.object_count {
            0 => "No garbage objects detected.".to_string(),
            n @ 1..=3 => format!("Minimal garbage detected ({n} items)."),
            n @ 4..=10 => format!("Moderate amount of garbage detected ({n} items)."),
            n => format!("Significant garbage accumulation ({n} items)."),
        });

        let coverage_pct = round1(sanitize_unit(detection.coverage_area, 0.0) * 100.0);
        if coverage_pct > 30.0 {
            parts.push(format!("Garbage covers {coverage_pct}% of the visible area."));
        } else if coverage_pct > 10.0 {
            parts.push(format!("Moderate spread ({coverage_pct}% coverage)."));
        }
    }

    if let Some(scene) = scene {
        let dirtiness = sanitize_unit(scene.dirtiness_score, 0.0);
        if dirtiness >= 0.6 {
            parts.push(format!(
                "Scene appears heavily soiled ({:.0}% dirtiness).",
                dirtiness * 100.0
            ));
        } else if dirtiness >= 0.3 {
            parts.push(format!(
                "Scene appears moderately soiled ({:.0}% dirtiness).",
                dirtiness * 100.0
            ));
        }
    }

    if let Some(location) = location {
        if let Some(site) = &location.highest_priority_site {
            parts.push(match site.distance_m {
                Some(d) => format!("Located near {} ({}, {d:.0}m away).", site.name, site.kind),
                None => format!("Located near {} ({}).", site.name, site.kind),
            });
        }
        if sanitize_multiplier(location.multiplier) > HIGH_PRIORITY_MULTIPLIER {
            parts.push("HIGH PRIORITY due to sensitive location proximity.".to_string());
        }
        if location.major_road {
            parts.push("Located on a major road.".to_string());
        }
    }

    if let Some(text) = text {
        if matches!(
            text.urgency_level,
            UrgencyLevel::Critical | UrgencyLevel::High
        ) {
            parts.push(format!(
                "User description indicates {} urgency.",
                text.urgency_level
            ));
        }
        if !text.keywords.is_empty() {
            let keywords: Vec<&str> = text.keywords.iter().take(3).map(String::as_str).collect();
            parts.push(format!("Keywords: {}.", keywords.join(", ")));
        }
        if text.hazard_detected {
            parts.push("Description mentions a physical hazard.".to_string());
        }
    }

    if let Some(social) = social {
        match social.upvote_count {
            n if n > 10 => parts.push(format!("Community validated ({n} upvotes).")),
            n if n > 5 => parts.push(format!("Multiple reports ({n} upvotes).")),
            _ => {}
        }
    }

    if let Some(detection) = detection {
        if detection.is_open_dump {
            parts.push("OPEN DUMP DETECTED - Requires immediate attention.".to_string());
        } else if detection.has_overflow {
            parts.push("Potential overflow or heavy accumulation detected.".to_string());
        }
    }

    if risk_amplified {
        parts.push("Open dump near a sensitive zone.".to_string());
    }

    parts.join(" ")
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_score(value: f64) -> u8 {
    if value.is_finite() {
        value.clamp(0.0, f64::from(MAX_SCORE)).round() as u8
    } else {
        0
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
