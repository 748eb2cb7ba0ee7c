//! Waste taxonomy used for garbage reports.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Waste stream a detected object belongs to.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WasteType {
    /// Batteries, chemicals, medical waste
    Hazardous,
    /// Food and organic matter
    Wet,
    /// Paper, cardboard, packaging
    Dry,
    /// Plastic, glass, metal containers
    Recyclable,
    /// Electronics, cables, phones
    EWaste,
    /// Anything that doesn't match the taxonomy
    Other,
}

impl WasteType {
    /// Handling priority for this waste stream.
    #[must_use]
    pub const fn priority(self) -> WastePriority {
        match self {
            Self::Hazardous => WastePriority::Critical,
            Self::EWaste => WastePriority::High,
            Self::Wet | Self::Recyclable | Self::Other => WastePriority::Medium,
            Self::Dry => WastePriority::Low,
        }
    }

    /// Human label, e.g. `"E-Waste"`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hazardous => "Hazardous",
            Self::Wet => "Wet",
            Self::Dry => "Dry",
            Self::Recyclable => "Recyclable",
            Self::EWaste => "E-Waste",
            Self::Other => "Other",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Hazardous,
            Self::Wet,
            Self::Dry,
            Self::Recyclable,
            Self::EWaste,
            Self::Other,
        ]
    }
}

/// Handling priority for a waste stream.
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum WastePriority {
    Low,
    Medium,
    High,
    Critical,
}

/// Waste composition of a garbage report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteClassification {
    /// Fraction of the report per waste type. Sums to 1.0 when non-empty;
    /// empty when nothing was detected.
    pub composition: BTreeMap<WasteType, f64>,
    /// Type with the largest share ([`WasteType::Other`] when empty).
    pub primary_type: WasteType,
    pub is_hazardous: bool,
    /// Two or more types each hold at least 20%.
    pub is_mixed: bool,
    pub priority: WastePriority,
    /// Disposal and handling recommendations.
    pub recommendations: Vec<String>,
    /// [`Self::recommendations`] joined into one line.
    pub disposal_text: String,
    /// Short label such as `"Mixed Waste (Dry, Wet)"`.
    pub label: String,
}
