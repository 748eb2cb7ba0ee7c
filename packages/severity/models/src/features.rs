//! The fixed-order numeric vector consumed by trained predictors.
//!
//! The layout is part of the model artifact contract: detection (6),
//! scene (4), location (5), text (5), social (1). Storing the values in a
//! `[f64; 21]` makes every other length unrepresentable.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, IntoStaticStr};

/// Number of slots in a [`FeatureVector`].
pub const FEATURE_COUNT: usize = 21;

/// One named slot of the feature vector, in vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Feature {
    // ── Detection ───────────────────────────────────────
    ObjectCount,
    CoverageArea,
    Density,
    HasOverflow,
    IsOpenDump,
    BinDetected,

    // ── Scene ───────────────────────────────────────────
    DirtinessScore,
    SceneConfidence,
    DirtyIndicators,
    CleanIndicators,

    // ── Location ────────────────────────────────────────
    LocationMultiplier,
    ZoneEducational,
    ZoneHealthcare,
    ZoneEco,
    ZoneResidential,

    // ── Text ────────────────────────────────────────────
    SentimentScore,
    TextBoostNormalized,
    UrgencyCritical,
    UrgencyHigh,
    UrgencyMedium,

    // ── Social ──────────────────────────────────────────
    UpvoteCountNormalized,
}

impl Feature {
    /// All slots in vector order.
    pub const ALL: [Self; FEATURE_COUNT] = [
        Self::ObjectCount,
        Self::CoverageArea,
        Self::Density,
        Self::HasOverflow,
        Self::IsOpenDump,
        Self::BinDetected,
        Self::DirtinessScore,
        Self::SceneConfidence,
        Self::DirtyIndicators,
        Self::CleanIndicators,
        Self::LocationMultiplier,
        Self::ZoneEducational,
        Self::ZoneHealthcare,
        Self::ZoneEco,
        Self::ZoneResidential,
        Self::SentimentScore,
        Self::TextBoostNormalized,
        Self::UrgencyCritical,
        Self::UrgencyHigh,
        Self::UrgencyMedium,
        Self::UpvoteCountNormalized,
    ];

    /// Position of this slot in the vector.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// `snake_case` name of this slot.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Names of all slots in vector order.
    #[must_use]
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|f| f.name()).collect()
    }
}

/// Exactly [`FEATURE_COUNT`] ordered values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Wraps already-ordered values.
    #[must_use]
    pub const fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    /// Value in the given slot.
    #[must_use]
    pub const fn get(&self, feature: Feature) -> f64 {
        self.0[feature.index()]
    }

    /// Overwrites the value in the given slot.
    pub const fn set(&mut self, feature: Feature, value: f64) {
        self.0[feature.index()] = value;
    }

    /// Values in vector order.
    #[must_use]
    pub const fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    /// Always [`FEATURE_COUNT`].
    #[must_use]
    pub const fn len(&self) -> usize {
        FEATURE_COUNT
    }

    /// Never empty; present for API symmetry with slices.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Pairs each slot name with its value, in order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        Feature::ALL.iter().map(|f| (f.name(), self.get(*f)))
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self([0.0; FEATURE_COUNT])
    }
}
