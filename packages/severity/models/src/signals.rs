//! Input signal groups produced by upstream collaborators.
//!
//! Every group is transient and recomputed per report. Numeric fields are
//! deserialized as-is; range enforcement happens where the values are
//! consumed so that a single bad reading degrades to a neutral value
//! instead of rejecting the report.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Saturation point for upvote normalization: this many votes maps to 1.0.
const UPVOTE_SATURATION: f64 = 99.0;

/// One object reported by the upstream detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    /// Detector class id (COCO numbering), if the detector reports one.
    #[serde(default)]
    pub class_id: Option<u32>,
    /// Detector class label.
    #[serde(default)]
    pub class_name: String,
    /// Detection confidence (0-1).
    #[serde(default)]
    pub confidence: f64,
}

/// Aggregated object-detection output for one photo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSummary {
    /// Number of detected objects.
    pub object_count: u32,
    /// Fraction of the frame covered by detections (0-1).
    pub coverage_area: f64,
    /// Objects per unit area.
    pub density: f64,
    /// A bin was detected overflowing.
    pub has_overflow: bool,
    /// The scene looks like an open dump.
    pub is_open_dump: bool,
    /// A waste bin is visible.
    pub bin_detected: bool,
    /// Individual detections, used for waste classification.
    pub detections: Vec<DetectedObject>,
}

/// Whole-scene cleanliness classification.
///
/// The four values are independent probabilities and need not sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneClassification {
    /// How dirty the scene looks (0-1).
    pub dirtiness_score: f64,
    /// Classifier confidence (0-1).
    pub confidence: f64,
    /// Share of dirty-scene indicators (0-1).
    pub dirty_indicators: f64,
    /// Share of clean-scene indicators (0-1).
    pub clean_indicators: f64,
}

impl Default for SceneClassification {
    fn default() -> Self {
        Self {
            dirtiness_score: 0.0,
            confidence: 0.5,
            dirty_indicators: 0.0,
            clean_indicators: 0.0,
        }
    }
}

/// Kinds of nearby sites that affect report priority.
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
pub enum SiteKind {
    School,
    Kindergarten,
    College,
    University,
    Hospital,
    Clinic,
    Doctors,
    Pharmacy,
    Park,
    NatureReserve,
    Playground,
    Residential,
    Apartments,
    Commercial,
    Industrial,
}

impl SiteKind {
    /// Zone this kind of site belongs to.
    #[must_use]
    pub const fn zone(self) -> Zone {
        match self {
            Self::School | Self::Kindergarten | Self::College | Self::University => {
                Zone::Educational
            }
            Self::Hospital | Self::Clinic | Self::Doctors | Self::Pharmacy => Zone::Healthcare,
            Self::Park | Self::NatureReserve | Self::Playground => Zone::Eco,
            Self::Residential | Self::Apartments => Zone::Residential,
            Self::Commercial | Self::Industrial => Zone::Commercial,
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::School,
            Self::Kindergarten,
            Self::College,
            Self::University,
            Self::Hospital,
            Self::Clinic,
            Self::Doctors,
            Self::Pharmacy,
            Self::Park,
            Self::NatureReserve,
            Self::Playground,
            Self::Residential,
            Self::Apartments,
            Self::Commercial,
            Self::Industrial,
        ]
    }
}

/// Land-use zone around a report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Zone {
    Educational,
    Healthcare,
    Eco,
    Residential,
    #[default]
    Commercial,
}

/// Which zones have at least one matching nearby site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneFlags {
    pub educational: bool,
    pub healthcare: bool,
    pub eco: bool,
    pub residential: bool,
}

impl ZoneFlags {
    /// Marks `zone` as present. Commercial has no flag.
    pub const fn insert(&mut self, zone: Zone) {
        match zone {
            Zone::Educational => self.educational = true,
            Zone::Healthcare => self.healthcare = true,
            Zone::Eco => self.eco = true,
            Zone::Residential => self.residential = true,
            Zone::Commercial => {}
        }
    }

    /// Whether `zone` is flagged.
    #[must_use]
    pub const fn contains(self, zone: Zone) -> bool {
        match zone {
            Zone::Educational => self.educational,
            Zone::Healthcare => self.healthcare,
            Zone::Eco => self.eco,
            Zone::Residential => self.residential,
            Zone::Commercial => false,
        }
    }

    /// True when a school, healthcare or eco zone is flagged.
    #[must_use]
    pub const fn is_sensitive(self) -> bool {
        self.educational || self.healthcare || self.eco
    }
}

/// The site that drove the location multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedSite {
    pub kind: SiteKind,
    pub name: String,
    /// Distance from the report in metres, when known.
    pub distance_m: Option<f64>,
}

/// Geographic sensitivity context for a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationContext {
    /// Priority multiplier in `[0.9, 1.5]`.
    pub multiplier: f64,
    /// Zones with at least one nearby site.
    pub zones: ZoneFlags,
    /// Zone of the highest-priority site.
    pub primary_zone: Zone,
    /// Names of the closest sensitive sites (at most three).
    pub critical_sites: Vec<String>,
    /// Site that produced [`Self::multiplier`].
    pub highest_priority_site: Option<MatchedSite>,
    /// The report sits on a major road.
    pub major_road: bool,
}

impl Default for LocationContext {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            zones: ZoneFlags::default(),
            primary_zone: Zone::Commercial,
            critical_sites: Vec::new(),
            highest_priority_site: None,
            major_road: false,
        }
    }
}

/// Urgency tier extracted from the report description.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UrgencyLevel {
    /// No description was given.
    #[default]
    None,
    /// A description was given but contains no urgency keywords.
    Low,
    Medium,
    High,
    Critical,
}

impl UrgencyLevel {
    /// Flat points the rule-based formula adds after the multiplier.
    #[must_use]
    pub const fn flat_boost(self) -> f64 {
        match self {
            Self::Critical => 15.0,
            Self::High => 10.0,
            Self::Medium | Self::Low | Self::None => 0.0,
        }
    }
}

/// Coarse emotion bucket of the report description.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EmotionCategory {
    Angry,
    Concerned,
    #[default]
    Neutral,
    Positive,
}

/// Deterministic text analysis of the report description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextSentiment {
    /// 0 = clearly positive, 0.5 = neutral, 1 = clearly negative/urgent.
    pub sentiment_score: f64,
    /// Text boost points scaled to 0-1.
    pub urgency_boost_normalized: f64,
    pub urgency_level: UrgencyLevel,
    pub emotion_category: EmotionCategory,
    /// Matched urgency keywords, strongest first.
    pub keywords: Vec<String>,
    /// A hazard term (fire, toxic, medical waste, ...) was matched.
    pub hazard_detected: bool,
}

impl Default for TextSentiment {
    fn default() -> Self {
        Self {
            sentiment_score: 0.5,
            urgency_boost_normalized: 0.0,
            urgency_level: UrgencyLevel::None,
            emotion_category: EmotionCategory::Neutral,
            keywords: Vec::new(),
            hazard_detected: false,
        }
    }
}

/// Community validation of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialSignal {
    pub upvote_count: u32,
}

impl SocialSignal {
    /// Saturating 0-1 normalization: `ln(n + 1) / ln(100)`, capped at 1.
    ///
    /// 0 votes → 0.0, 9 votes → 0.5, 99+ votes → 1.0.
    #[must_use]
    pub fn normalized(self) -> f64 {
        let votes = f64::from(self.upvote_count);
        ((votes + 1.0).ln() / (UPVOTE_SATURATION + 1.0).ln()).min(1.0)
    }
}

/// Type of civic issue being reported.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IssueKind {
    #[default]
    Garbage,
    Pothole,
}

/// One of the five signal groups, used to name missing inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SignalGroup {
    Detection,
    Scene,
    Location,
    Text,
    Social,
}

/// Every signal collected for one report. All groups are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalSet {
    pub issue_kind: IssueKind,
    pub detection: Option<DetectionSummary>,
    pub scene: Option<SceneClassification>,
    pub location: Option<LocationContext>,
    pub text: Option<TextSentiment>,
    pub social: Option<SocialSignal>,
    /// Raw description, used only for waste keyword hints.
    pub description: Option<String>,
}

impl SignalSet {
    /// Signal groups that were not supplied.
    #[must_use]
    pub fn missing_groups(&self) -> Vec<SignalGroup> {
        let mut missing = Vec::new();
        if self.detection.is_none() {
            missing.push(SignalGroup::Detection);
        }
        if self.scene.is_none() {
            missing.push(SignalGroup::Scene);
        }
        if self.location.is_none() {
            missing.push(SignalGroup::Location);
        }
        if self.text.is_none() {
            missing.push(SignalGroup::Text);
        }
        if self.social.is_none() {
            missing.push(SignalGroup::Social);
        }
        missing
    }

    /// True when no signal group at all was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing_groups().len() == 5
    }
}
