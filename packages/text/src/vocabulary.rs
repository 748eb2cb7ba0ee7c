//! Fixed keyword vocabularies.
//!
//! Multi-word entries are matched as whole phrases against the
//! normalized description, so `"health risk"` only matches those two
//! words in sequence.

use civic_triage_severity_models::UrgencyLevel;

/// An urgency keyword with its tier and boost weight (0-30 points).
pub struct UrgencyKeyword {
    pub phrase: &'static str,
    pub tier: UrgencyLevel,
    pub weight: f64,
}

const fn kw(phrase: &'static str, tier: UrgencyLevel, weight: f64) -> UrgencyKeyword {
    UrgencyKeyword {
        phrase,
        tier,
        weight,
    }
}

/// Urgency keywords, grouped by tier.
pub static URGENCY_KEYWORDS: &[UrgencyKeyword] = &[
    // ── Critical ─────────────────────────────────────────
    kw("emergency", UrgencyLevel::Critical, 30.0),
    kw("critical", UrgencyLevel::Critical, 30.0),
    kw("fire", UrgencyLevel::Critical, 30.0),
    kw("toxic", UrgencyLevel::Critical, 30.0),
    kw("medical waste", UrgencyLevel::Critical, 30.0),
    kw("dangerous", UrgencyLevel::Critical, 25.0),
    kw("hazardous", UrgencyLevel::Critical, 25.0),
    kw("health hazard", UrgencyLevel::Critical, 25.0),
    kw("health risk", UrgencyLevel::Critical, 25.0),
    kw("accident", UrgencyLevel::Critical, 25.0),
    kw("injured", UrgencyLevel::Critical, 25.0),
    // ── High ─────────────────────────────────────────────
    kw("urgent", UrgencyLevel::High, 20.0),
    kw("immediate", UrgencyLevel::High, 20.0),
    kw("overflowing", UrgencyLevel::High, 20.0),
    kw("overflow", UrgencyLevel::High, 20.0),
    kw("severe", UrgencyLevel::High, 20.0),
    kw("blocked", UrgencyLevel::High, 18.0),
    kw("blocking", UrgencyLevel::High, 18.0),
    kw("terrible", UrgencyLevel::High, 18.0),
    kw("awful", UrgencyLevel::High, 18.0),
    // ── Medium ───────────────────────────────────────────
    kw("disgusting", UrgencyLevel::Medium, 15.0),
    kw("smelly", UrgencyLevel::Medium, 15.0),
    kw("stinking", UrgencyLevel::Medium, 15.0),
    kw("piling up", UrgencyLevel::Medium, 15.0),
    kw("everywhere", UrgencyLevel::Medium, 12.0),
    kw("spreading", UrgencyLevel::Medium, 12.0),
    kw("deep", UrgencyLevel::Medium, 12.0),
];

/// Terms that indicate a physical hazard beyond ordinary litter.
pub static HAZARD_TERMS: &[&str] = &[
    "fire",
    "smoke",
    "burning",
    "toxic",
    "chemical",
    "chemicals",
    "medical waste",
    "syringe",
    "syringes",
    "needles",
    "asbestos",
    "gas leak",
];

/// Words that push sentiment towards negative.
pub static NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "worst",
    "horrible",
    "filthy",
    "dirty",
    "nasty",
    "rotten",
    "mess",
    "broken",
    "unsafe",
    "sick",
    "angry",
    "frustrated",
    "annoyed",
    "ridiculous",
    "unacceptable",
    "ignored",
    "complaint",
    "rats",
    "flies",
    "mosquitoes",
    "damage",
    "damaged",
];

/// Words that push sentiment towards positive.
pub static POSITIVE_WORDS: &[&str] = &[
    "clean",
    "good",
    "great",
    "nice",
    "fine",
    "fixed",
    "resolved",
    "better",
    "thanks",
    "thank",
    "appreciate",
    "tidy",
    "happy",
    "excellent",
];
