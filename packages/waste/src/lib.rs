#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Waste-stream classification for garbage reports.
//!
//! Each detected object is mapped to a [`WasteType`] by its COCO class id
//! when the id is known, then by words in its class name, and otherwise
//! falls into [`WasteType::Other`]. The resulting counts become a
//! composition of fractions that sums to 1.0.

use std::collections::{BTreeMap, BTreeSet};

use civic_triage_severity_models::{
    DetectedObject, DetectionSummary, WasteClassification, WastePriority, WasteType,
};

/// Minimum detector confidence for a hazardous object to flag the report.
pub const HAZARD_CONFIDENCE: f64 = 0.5;

/// Extra weight per waste keyword found in the description.
const DESCRIPTION_BONUS: f64 = 0.5;

/// Share at which a waste type counts towards "mixed".
const MIXED_SHARE: f64 = 0.2;

/// Share at which a waste type is named in a mixed label.
const LABEL_SHARE: f64 = 0.15;

/// Maximum types named in a mixed label.
const MAX_LABEL_TYPES: usize = 3;

/// Recyclable share above which resource recovery is recommended.
const HIGH_RECYCLABLE_SHARE: f64 = 0.5;

/// Types matched by keyword, in precedence order.
const KEYWORD_TYPES: [WasteType; 5] = [
    WasteType::Hazardous,
    WasteType::Wet,
    WasteType::Dry,
    WasteType::Recyclable,
    WasteType::EWaste,
];

/// Maps a COCO class id to a waste type.
///
/// COCO has no hazardous classes. Id 73 (book) is treated as dry waste.
#[must_use]
pub const fn type_for_class_id(class_id: u32) -> Option<WasteType> {
    match class_id {
        46..=55 => Some(WasteType::Wet),
        73 | 84 => Some(WasteType::Dry),
        39 | 40 | 41 | 44 | 45 => Some(WasteType::Recyclable),
        63..=67 | 76 => Some(WasteType::EWaste),
        _ => None,
    }
}

/// Keywords that identify a waste type in class names and descriptions.
#[must_use]
pub const fn keywords(waste: WasteType) -> &'static [&'static str] {
    match waste {
        WasteType::Hazardous => &[
            "battery", "chemical", "medical", "syringe", "toxic", "paint", "oil",
        ],
        WasteType::Wet => &["food", "organic", "vegetable", "fruit", "kitchen"],
        WasteType::Dry => &["paper", "cardboard", "wrapper", "packaging", "box"],
        WasteType::Recyclable => &["plastic", "bottle", "can", "glass", "metal"],
        WasteType::EWaste => &["electronic", "phone", "computer", "battery", "wire", "cable"],
        WasteType::Other => &[],
    }
}

/// Waste type of a single detected object.
#[must_use]
pub fn classify_object(object: &DetectedObject) -> WasteType {
    object
        .class_id
        .and_then(type_for_class_id)
        .or_else(|| {
            let words = words(&object.class_name);
            KEYWORD_TYPES
                .into_iter()
                .find(|waste| keywords(*waste).iter().any(|kw| words.contains(*kw)))
        })
        .unwrap_or(WasteType::Other)
}

/// Classifies the detections of one report.
#[must_use]
pub fn classify(detection: &DetectionSummary) -> WasteClassification {
    classify_with_description(detection, None)
}

/// Classifies the detections of one report, using the description as a
/// secondary hint.
///
/// Description keywords only add weight when at least one object was
/// detected, but a hazardous keyword in the description always flags the
/// report as hazardous.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn classify_with_description(
    detection: &DetectionSummary,
    description: Option<&str>,
) -> WasteClassification {
    let mut weights: BTreeMap<WasteType, f64> = BTreeMap::new();
    let mut is_hazardous = false;

    for object in &detection.detections {
        let waste = classify_object(object);
        *weights.entry(waste).or_insert(0.0) += 1.0;
        if waste == WasteType::Hazardous && object.confidence >= HAZARD_CONFIDENCE {
            is_hazardous = true;
        }
    }

    let description_words = description.map(words).unwrap_or_default();
    if !weights.is_empty() {
        for waste in KEYWORD_TYPES {
            let hits = keywords(waste)
                .iter()
                .filter(|kw| description_words.contains(**kw))
                .count();
            if hits > 0 {
                *weights.entry(waste).or_insert(0.0) += DESCRIPTION_BONUS * hits as f64;
            }
        }
    }
    if keywords(WasteType::Hazardous)
        .iter()
        .any(|kw| description_words.contains(*kw))
    {
        is_hazardous = true;
    }

    let total: f64 = weights.values().sum();
    let composition: BTreeMap<WasteType, f64> = if total > 0.0 {
        weights
            .into_iter()
            .map(|(waste, weight)| (waste, weight / total))
            .collect()
    } else {
        BTreeMap::new()
    };

    let primary_type = primary_type(&composition);
    let is_mixed = composition
        .values()
        .filter(|share| **share >= MIXED_SHARE)
        .count()
        > 1;
    let priority = if is_hazardous {
        WastePriority::Critical
    } else {
        primary_type.priority()
    };

    let recommendations = recommendations(primary_type, is_hazardous, is_mixed, &composition);
    let label = label(primary_type, is_hazardous, is_mixed, &composition);

    log::debug!(
        "Classified {} detections as {label} (priority {priority})",
        detection.detections.len()
    );

    WasteClassification {
        disposal_text: recommendations.join("; "),
        composition,
        primary_type,
        is_hazardous,
        is_mixed,
        priority,
        recommendations,
        label,
    }
}

fn words(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Largest share wins; ties go to the type listed first.
fn primary_type(composition: &BTreeMap<WasteType, f64>) -> WasteType {
    let mut best: Option<(WasteType, f64)> = None;
    for (waste, share) in composition {
        if best.is_none_or(|(_, top)| *share > top) {
            best = Some((*waste, *share));
        }
    }
    best.map_or(WasteType::Other, |(waste, _)| waste)
}

fn recommendations(
    primary: WasteType,
    is_hazardous: bool,
    is_mixed: bool,
    composition: &BTreeMap<WasteType, f64>,
) -> Vec<String> {
    let mut out: Vec<&str> = Vec::new();

    if is_hazardous {
        out.extend([
            "HAZARDOUS WASTE - Requires specialized disposal",
            "Contact hazardous waste management authority",
            "Do not mix with regular waste",
        ]);
    }
    if is_mixed {
        out.extend([
            "Mixed waste detected - Segregation required",
            "Separate into dry, wet, and recyclable categories",
        ]);
    }

    match primary {
        WasteType::Wet => out.extend(["Wet waste: Suitable for composting", "Collect in green bins"]),
        WasteType::Dry => out.extend([
            "Dry waste: Can be sent to recycling",
            "Collect in blue bins",
        ]),
        WasteType::Recyclable => {
            out.extend([
                "Recyclable materials detected",
                "Clean and send to recycling facility",
            ]);
            if composition
                .get(&WasteType::Recyclable)
                .is_some_and(|share| *share > HIGH_RECYCLABLE_SHARE)
            {
                out.push("High recyclable content - Good for resource recovery");
            }
        }
        WasteType::EWaste => out.extend([
            "E-waste detected - Special handling required",
            "Contact authorized e-waste recycler",
            "Do not dispose in regular bins",
        ]),
        WasteType::Hazardous | WasteType::Other => {}
    }

    if out.is_empty() {
        out.push("Regular waste disposal procedures apply");
    }

    out.into_iter().map(str::to_string).collect()
}

fn label(
    primary: WasteType,
    is_hazardous: bool,
    is_mixed: bool,
    composition: &BTreeMap<WasteType, f64>,
) -> String {
    if is_hazardous {
        return if primary == WasteType::Hazardous {
            stream_name(primary)
        } else {
            format!("Hazardous {}", stream_name(primary))
        };
    }

    if is_mixed {
        let mut named: Vec<(WasteType, f64)> = composition
            .iter()
            .filter(|(_, share)| **share >= LABEL_SHARE)
            .map(|(waste, share)| (*waste, *share))
            .collect();
        named.sort_by(|a, b| b.1.total_cmp(&a.1));
        let names: Vec<&str> = named
            .iter()
            .take(MAX_LABEL_TYPES)
            .map(|(waste, _)| waste.label())
            .collect();
        return format!("Mixed Waste ({})", names.join(", "));
    }

    stream_name(primary)
}

fn stream_name(waste: WasteType) -> String {
    match waste {
        WasteType::EWaste => waste.label().to_string(),
        _ => format!("{} Waste", waste.label()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(class_id: Option<u32>, class_name: &str, confidence: f64) -> DetectedObject {
        DetectedObject {
            class_id,
            class_name: class_name.to_string(),
            confidence,
        }
    }

    fn summary(detections: Vec<DetectedObject>) -> DetectionSummary {
        DetectionSummary {
            object_count: u32::try_from(detections.len()).unwrap(),
            detections,
            ..DetectionSummary::default()
        }
    }

    fn share(result: &WasteClassification, waste: WasteType) -> f64 {
        result.composition.get(&waste).copied().unwrap_or(0.0)
    }

    #[test]
    fn no_detections_yields_empty_composition() {
        let result = classify(&DetectionSummary::default());
        assert!(result.composition.is_empty());
        assert_eq!(result.primary_type, WasteType::Other);
        assert!(!result.is_hazardous);
        assert!(!result.is_mixed);
        assert_eq!(result.label, "Other Waste");
        assert_eq!(
            result.recommendations,
            vec!["Regular waste disposal procedures apply".to_string()]
        );
        assert_eq!(result.disposal_text, "Regular waste disposal procedures apply");
    }

    #[test]
    fn class_id_takes_precedence_over_name() {
        assert_eq!(classify_object(&object(Some(46), "banana", 0.9)), WasteType::Wet);
        assert_eq!(classify_object(&object(Some(39), "bottle", 0.9)), WasteType::Recyclable);
        assert_eq!(classify_object(&object(Some(67), "cell phone", 0.9)), WasteType::EWaste);
        // 73 is listed for both dry and e-waste; dry wins
        assert_eq!(classify_object(&object(Some(73), "book", 0.9)), WasteType::Dry);
    }

    #[test]
    fn class_name_keywords_are_the_fallback() {
        assert_eq!(classify_object(&object(None, "battery", 0.9)), WasteType::Hazardous);
        assert_eq!(classify_object(&object(Some(0), "plastic bag", 0.9)), WasteType::Recyclable);
        assert_eq!(classify_object(&object(None, "Cardboard Box", 0.9)), WasteType::Dry);
        assert_eq!(classify_object(&object(None, "tire", 0.9)), WasteType::Other);
        // whole words only: "toilet" must not match "oil"
        assert_eq!(classify_object(&object(None, "toilet", 0.9)), WasteType::Other);
    }

    #[test]
    fn composition_sums_to_one() {
        let result = classify(&summary(vec![
            object(Some(39), "bottle", 0.9),
            object(Some(40), "wine glass", 0.8),
            object(Some(44), "spoon", 0.7),
            object(Some(46), "banana", 0.6),
        ]));
        let total: f64 = result.composition.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!((share(&result, WasteType::Recyclable) - 0.75).abs() < 1e-9);
        assert!((share(&result, WasteType::Wet) - 0.25).abs() < 1e-9);
        assert_eq!(result.primary_type, WasteType::Recyclable);
        assert!(result.is_mixed);
        assert_eq!(result.label, "Mixed Waste (Recyclable, Wet)");
        assert!(
            result
                .recommendations
                .iter()
                .any(|r| r.starts_with("High recyclable content"))
        );
    }

    #[test]
    fn small_minority_is_not_mixed() {
        let mut detections: Vec<_> = (0..9).map(|_| object(Some(39), "bottle", 0.9)).collect();
        detections.push(object(Some(46), "banana", 0.9));
        let result = classify(&summary(detections));
        assert!(!result.is_mixed);
        assert_eq!(result.label, "Recyclable Waste");
        assert_eq!(result.priority, WastePriority::Medium);
    }

    #[test]
    fn hazardous_requires_confident_detection() {
        let weak = classify(&summary(vec![object(None, "battery", 0.4)]));
        assert!(!weak.is_hazardous);
        assert_eq!(weak.primary_type, WasteType::Hazardous);

        let strong = classify(&summary(vec![
            object(Some(39), "bottle", 0.9),
            object(Some(39), "bottle", 0.9),
            object(None, "battery", 0.5),
        ]));
        assert!(strong.is_hazardous);
        assert_eq!(strong.priority, WastePriority::Critical);
        assert_eq!(strong.label, "Hazardous Recyclable Waste");
        assert_eq!(
            strong.recommendations[0],
            "HAZARDOUS WASTE - Requires specialized disposal"
        );
    }

    #[test]
    fn description_adds_bonus_weight() {
        let result = classify_with_description(
            &summary(vec![object(Some(39), "bottle", 0.9)]),
            Some("Food and plastic everywhere"),
        );
        // recyclable 1 + 0.5, wet 0.5
        assert!((share(&result, WasteType::Recyclable) - 0.75).abs() < 1e-9);
        assert!((share(&result, WasteType::Wet) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn description_alone_only_flags_hazard() {
        let result =
            classify_with_description(&DetectionSummary::default(), Some("toxic paint cans"));
        assert!(result.composition.is_empty());
        assert!(result.is_hazardous);
        assert_eq!(result.priority, WastePriority::Critical);
        assert_eq!(result.label, "Hazardous Other Waste");
    }

    #[test]
    fn e_waste_recommendations() {
        let result = classify(&summary(vec![object(Some(63), "laptop", 0.9)]));
        assert_eq!(result.primary_type, WasteType::EWaste);
        assert_eq!(result.priority, WastePriority::High);
        assert_eq!(result.recommendations.len(), 3);
        assert_eq!(result.label, "E-Waste");
    }
}
