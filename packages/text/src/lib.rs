#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Keyword-based text analysis for report descriptions.
//!
//! Produces an urgency tier, emotion bucket, sentiment score and boost
//! from fixed vocabularies in [`vocabulary`]. The classifier is
//! intentionally simple and deterministic: every output can be traced back
//! to the literal keywords returned in [`TextSentiment::keywords`].

pub mod vocabulary;

use std::sync::LazyLock;

use civic_triage_severity_models::{EmotionCategory, TextSentiment, UrgencyLevel};
use regex::Regex;

use crate::vocabulary::{HAZARD_TERMS, NEGATIVE_WORDS, POSITIVE_WORDS, URGENCY_KEYWORDS};

/// Lowercase word tokens (Unicode word characters and apostrophes).
static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w']+").expect("valid regex"));

/// Descriptions longer than this are truncated before analysis.
const MAX_TEXT_CHARS: usize = 2_000;

/// Maximum boost points a description can contribute.
const MAX_BOOST_POINTS: f64 = 30.0;

/// Extra boost points when a hazard term is present.
const HAZARD_BOOST_POINTS: f64 = 10.0;

/// Maximum number of keywords returned.
const MAX_KEYWORDS: usize = 5;

/// Sentiment hits needed for full polarity strength.
const FULL_STRENGTH_HITS: f64 = 3.0;

/// Analyzes a report description.
///
/// Absent, empty, or whitespace-only text yields neutral defaults
/// ([`UrgencyLevel::None`], sentiment 0.5).
#[must_use]
pub fn analyze(text: Option<&str>) -> TextSentiment {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return TextSentiment::default();
    };

    let text: String = text.chars().take(MAX_TEXT_CHARS).collect();
    let tokens = tokenize(&text);
    if tokens.is_empty() {
        log::debug!("Description has no word tokens, treating as neutral");
        return TextSentiment {
            urgency_level: UrgencyLevel::Low,
            ..TextSentiment::default()
        };
    }
    let padded = format!(" {} ", tokens.join(" "));

    let mut matched: Vec<&vocabulary::UrgencyKeyword> = URGENCY_KEYWORDS
        .iter()
        .filter(|kw| contains_phrase(&padded, kw.phrase))
        .collect();
    matched.sort_by(|a, b| b.weight.total_cmp(&a.weight));

    let hazard_detected = HAZARD_TERMS.iter().any(|t| contains_phrase(&padded, t));

    let sentiment_score = sentiment(&tokens, matched.len());
    let mut boost = boost_points(matched.first().map(|kw| kw.weight), sentiment_score);
    if hazard_detected {
        boost = (boost + HAZARD_BOOST_POINTS).min(MAX_BOOST_POINTS);
    }

    let urgency_level = if hazard_detected {
        UrgencyLevel::Critical
    } else {
        matched
            .iter()
            .map(|kw| kw.tier)
            .max()
            .unwrap_or(UrgencyLevel::Low)
    };

    let emotion_category = emotion(&text, tokens.len(), matched.len(), sentiment_score);

    TextSentiment {
        sentiment_score: round3(sentiment_score),
        urgency_boost_normalized: boost / MAX_BOOST_POINTS,
        urgency_level,
        emotion_category,
        keywords: matched
            .iter()
            .take(MAX_KEYWORDS)
            .map(|kw| kw.phrase.to_string())
            .collect(),
        hazard_detected,
    }
}

fn tokenize(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

fn contains_phrase(padded: &str, phrase: &str) -> bool {
    padded.contains(&format!(" {phrase} "))
}

/// 0 = positive, 0.5 = neutral, 1 = negative. Urgency keyword matches
/// count as negative hits.
#[allow(clippy::cast_precision_loss)]
fn sentiment(tokens: &[String], urgency_hits: usize) -> f64 {
    let negative = tokens
        .iter()
        .filter(|t| NEGATIVE_WORDS.contains(&t.as_str()))
        .count()
        + urgency_hits;
    let positive = tokens
        .iter()
        .filter(|t| POSITIVE_WORDS.contains(&t.as_str()))
        .count();

    let hits = negative + positive;
    if hits == 0 {
        return 0.5;
    }

    let polarity = (negative as f64 - positive as f64) / hits as f64;
    let strength = (hits as f64 / FULL_STRENGTH_HITS).min(1.0);
    (0.5 + 0.5 * polarity * strength).clamp(0.0, 1.0)
}

/// Whole boost points: 70% strongest keyword weight, 30% sentiment;
/// sentiment alone (max 10 points) when no keyword matched.
fn boost_points(strongest_keyword: Option<f64>, sentiment: f64) -> f64 {
    let points = strongest_keyword.map_or(sentiment * 10.0, |weight| {
        weight.mul_add(0.7, sentiment * 10.0 * 0.3)
    });
    points.round().min(MAX_BOOST_POINTS)
}

#[allow(clippy::cast_precision_loss)]
fn emotion(text: &str, word_count: usize, keyword_hits: usize, sentiment: f64) -> EmotionCategory {
    let density = keyword_hits as f64 / word_count as f64;
    let exclamations = text.matches('!').count();
    let shouted = text
        .split_whitespace()
        .filter(|w| w.chars().filter(char::is_ascii_alphabetic).count() >= 3)
        .filter(|w| !w.chars().any(|c| c.is_ascii_lowercase()))
        .count();

    if sentiment >= 0.75 && (density >= 0.1 || exclamations >= 2 || shouted >= 2) {
        EmotionCategory::Angry
    } else if sentiment >= 0.6 {
        EmotionCategory::Concerned
    } else if sentiment <= 0.3 {
        EmotionCategory::Positive
    } else {
        EmotionCategory::Neutral
    }
}

fn round3(value: f64) -> f64 {
    (value * 1_000.0).round() / 1_000.0
}
