#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Severity fusion engine.
//!
//! [`SeverityFusionEngine::calculate_severity`] always computes the
//! rule-based score. When the trained path is requested it also builds the
//! feature vector and asks the predictor; a successful prediction becomes
//! the reported score, and any failure silently falls back to the
//! rule-based result. The category is always derived from the final score.

pub mod config;
pub mod handle;
pub mod observer;

use std::sync::Arc;

use civic_triage_predictor::{PredictorInfo, TrainedPrediction};
use civic_triage_scoring::RuleBasedScore;
use civic_triage_severity_models::{
    BatchSummary, IssueKind, PredictionMethod, PriorityLevel, SeverityCategory, SeverityResult,
    SignalGroup, SignalSet,
};

pub use crate::config::{ConfigurationError, EngineConfig};
pub use crate::handle::{PredictorHandle, PredictorLoader};
pub use crate::observer::{DivergenceObserver, NullObserver, null_observer};

/// Scores at or above this add the critical-situation banner.
const CRITICAL_BANNER_SCORE: u8 = 80;

/// Scores at or above this recommend prompt action.
const PROMPT_ACTION_SCORE: u8 = 60;

/// Errors returned by [`SeverityFusionEngine::calculate_severity`].
#[derive(Debug, thiserror::Error)]
pub enum SeverityError {
    /// Every signal group was absent.
    #[error("No signals supplied (missing: {})", join_groups(.missing))]
    NoSignals {
        /// The collaborator outputs that were not supplied.
        missing: Vec<SignalGroup>,
    },
}

fn join_groups(groups: &[SignalGroup]) -> String {
    groups
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Combines rule-based and trained scoring into one auditable result.
///
/// Engines are cheap to clone and safe to share across threads.
#[derive(Clone)]
pub struct SeverityFusionEngine {
    config: EngineConfig,
    predictor: Arc<PredictorHandle>,
    observer: Arc<dyn DivergenceObserver>,
}

impl std::fmt::Debug for SeverityFusionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeverityFusionEngine")
            .field("config", &self.config)
            .field("predictor", &self.predictor)
            .finish_non_exhaustive()
    }
}

impl SeverityFusionEngine {
    /// Builds an engine from validated configuration.
    ///
    /// The predictor artifact is not read until the first trained-path
    /// computation.
    ///
    /// # Errors
    ///
    /// * If the configuration is inconsistent
    pub fn new(config: EngineConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let predictor = if config.use_trained_model {
            PredictorHandle::lazy(config.model_path.clone())
        } else {
            PredictorHandle::disabled()
        };
        Ok(Self {
            config,
            predictor: Arc::new(predictor),
            observer: null_observer(),
        })
    }

    /// Builds an engine around an existing predictor handle, e.g. one
    /// shared with other engines or wrapping a test double.
    ///
    /// # Errors
    ///
    /// * If the configuration is inconsistent
    pub fn with_predictor(
        config: EngineConfig,
        predictor: Arc<PredictorHandle>,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            config,
            predictor,
            observer: null_observer(),
        })
    }

    /// Replaces the divergence observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn DivergenceObserver>) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The shared predictor handle.
    #[must_use]
    pub const fn predictor(&self) -> &Arc<PredictorHandle> {
        &self.predictor
    }

    /// Scores a report using the configured `use_trained_model` default.
    ///
    /// # Errors
    ///
    /// * If no signal group was supplied
    pub fn calculate(&self, signals: &SignalSet) -> Result<SeverityResult, SeverityError> {
        self.calculate_severity(signals, self.config.use_trained_model)
    }

    /// Scores a report.
    ///
    /// Never panics and never surfaces predictor faults: when the trained
    /// path is unavailable or fails, the rule-based score is reported.
    ///
    /// # Errors
    ///
    /// * If no signal group was supplied
    pub fn calculate_severity(
        &self,
        signals: &SignalSet,
        use_trained_model: bool,
    ) -> Result<SeverityResult, SeverityError> {
        if signals.is_empty() {
            return Err(SeverityError::NoSignals {
                missing: signals.missing_groups(),
            });
        }

        let detection = signals.detection.as_ref();
        let scene = signals.scene.as_ref();
        let location = signals.location.as_ref();
        let text = signals.text.as_ref();
        let social = signals.social.as_ref();

        let rule_based = civic_triage_scoring::score(detection, scene, location, text, social);

        let trained = if use_trained_model {
            let features = civic_triage_features::build(detection, scene, location, text, social);
            self.predictor
                .predict(&features)
                .map(|prediction| (prediction, features))
        } else {
            None
        };

        let waste_classification = match (signals.issue_kind, detection) {
            (IssueKind::Garbage, Some(detection)) => Some(
                civic_triage_waste::classify_with_description(
                    detection,
                    signals.description.as_deref(),
                ),
            ),
            _ => None,
        };

        let result = match trained {
            Some((prediction, features)) => {
                log::debug!(
                    "Trained {} score {} (rule-based {})",
                    prediction.model_type,
                    prediction.score,
                    rule_based.score
                );
                self.observer.observe(prediction.score, rule_based.score);
                let explanation = trained_explanation(&rule_based, &prediction);
                SeverityResult {
                    score: prediction.score,
                    category: SeverityCategory::from_score(prediction.score),
                    prediction_method: PredictionMethod::TrainedModel,
                    confidence: prediction.confidence,
                    component_breakdown: rule_based.breakdown,
                    explanation,
                    rule_based_score: rule_based.score,
                    model_type: Some(prediction.model_type),
                    raw_model_score: Some(prediction.raw_score),
                    calibrated: prediction.calibrated,
                    model_features: Some(features),
                    waste_classification,
                }
            }
            None => {
                log::debug!("Rule-based score {}", rule_based.score);
                SeverityResult {
                    score: rule_based.score,
                    category: SeverityCategory::from_score(rule_based.score),
                    prediction_method: PredictionMethod::RuleBased,
                    confidence: rule_based.confidence,
                    explanation: explanation(rule_based.score, &rule_based.explanation),
                    component_breakdown: rule_based.breakdown,
                    rule_based_score: rule_based.score,
                    model_type: None,
                    raw_model_score: None,
                    calibrated: false,
                    model_features: None,
                    waste_classification,
                }
            }
        };

        Ok(result)
    }

    /// Metadata about the configured predictor (loads it on first call).
    #[must_use]
    pub fn model_info(&self) -> PredictorInfo {
        self.predictor.info()
    }
}

/// Summary statistics over many results.
///
/// Priority is critical when any score reaches 80 or there are three
/// hotspots, high when any score reaches 60 or there are two hotspots,
/// medium when the average reaches 40, otherwise low. An empty batch has
/// priority [`PriorityLevel::None`].
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize(results: &[SeverityResult]) -> BatchSummary {
    let Some(max_severity) = results.iter().map(|r| r.score).max() else {
        return BatchSummary {
            average_severity: 0.0,
            max_severity: 0,
            hotspot_count: 0,
            priority_level: PriorityLevel::None,
            total_analyzed: 0,
        };
    };

    let total: f64 = results.iter().map(|r| f64::from(r.score)).sum();
    let average_severity = (total / results.len() as f64 * 10.0).round() / 10.0;
    let hotspot_count = results
        .iter()
        .filter(|r| r.category >= SeverityCategory::High)
        .count();

    let priority_level = if max_severity >= 80 || hotspot_count >= 3 {
        PriorityLevel::Critical
    } else if max_severity >= 60 || hotspot_count >= 2 {
        PriorityLevel::High
    } else if average_severity >= 40.0 {
        PriorityLevel::Medium
    } else {
        PriorityLevel::Low
    };

    BatchSummary {
        average_severity,
        max_severity,
        hotspot_count,
        priority_level,
        total_analyzed: results.len(),
    }
}

/// Header, input fragments, and action line for a final score.
fn explanation(score: u8, fragments: &str) -> String {
    let mut parts = vec![format!(
        "Severity: {} ({score}/100).",
        SeverityCategory::from_score(score)
    )];
    if score >= CRITICAL_BANNER_SCORE {
        parts.push("CRITICAL SITUATION DETECTED.".to_string());
    }
    if !fragments.is_empty() {
        parts.push(fragments.to_string());
    }
    if score >= CRITICAL_BANNER_SCORE {
        parts.push("IMMEDIATE ACTION REQUIRED.".to_string());
    } else if score >= PROMPT_ACTION_SCORE {
        parts.push("Prompt action recommended.".to_string());
    }
    parts.join(" ")
}

fn trained_explanation(rule_based: &RuleBasedScore, prediction: &TrainedPrediction) -> String {
    let mut text = explanation(prediction.score, &rule_based.explanation);
    text.push_str(&format!(
        " [Predicted by trained {} model: raw={:.1}, {}={}]",
        prediction.model_type,
        prediction.raw_score,
        if prediction.calibrated {
            "calibrated"
        } else {
            "score"
        },
        prediction.score
    ));
    text
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;
    use std::sync::Mutex;

    use civic_triage_predictor::SeverityPredictor;
    use civic_triage_severity_models::{
        DetectedObject, DetectionSummary, FEATURE_COUNT, FeatureVector, LocationContext, MAX_SCORE,
        SceneClassification, SocialSignal, TextSentiment, UrgencyLevel, WasteType, ZoneFlags,
    };

    use super::*;

    struct FixedPredictor(Option<u8>);

    impl SeverityPredictor for FixedPredictor {
        fn predict(&self, _features: &FeatureVector) -> Option<TrainedPrediction> {
            self.0.map(|score| TrainedPrediction {
                score,
                raw_score: f64::from(score),
                confidence: 0.95,
                model_type: "fixed".to_string(),
                calibrated: false,
            })
        }

        fn model_type(&self) -> &str {
            "fixed"
        }
    }

    #[derive(Default)]
    struct RecordingObserver(Mutex<Vec<(u8, u8)>>);

    impl DivergenceObserver for RecordingObserver {
        fn observe(&self, trained_score: u8, rule_based_score: u8) {
            self.0.lock().unwrap().push((trained_score, rule_based_score));
        }
    }

    fn engine_with(predictor: Option<u8>) -> SeverityFusionEngine {
        let handle = PredictorHandle::with_predictor(Arc::new(FixedPredictor(predictor)));
        SeverityFusionEngine::with_predictor(EngineConfig::default(), Arc::new(handle)).unwrap()
    }

    fn garbage_report() -> SignalSet {
        SignalSet {
            detection: Some(DetectionSummary {
                object_count: 8,
                coverage_area: 0.35,
                has_overflow: true,
                detections: vec![DetectedObject {
                    class_id: Some(39),
                    class_name: "bottle".to_string(),
                    confidence: 0.9,
                }],
                ..DetectionSummary::default()
            }),
            scene: Some(SceneClassification {
                dirtiness_score: 0.7,
                confidence: 0.8,
                ..SceneClassification::default()
            }),
            text: Some(TextSentiment {
                urgency_boost_normalized: 0.5,
                urgency_level: UrgencyLevel::High,
                ..TextSentiment::default()
            }),
            social: Some(SocialSignal { upvote_count: 4 }),
            ..SignalSet::default()
        }
    }

    #[test]
    fn no_signals_is_an_error() {
        let engine = SeverityFusionEngine::new(EngineConfig::rule_based()).unwrap();
        let err = engine
            .calculate_severity(&SignalSet::default(), false)
            .unwrap_err();
        let SeverityError::NoSignals { missing } = &err;
        assert_eq!(missing.len(), 5);
        assert_eq!(
            err.to_string(),
            "No signals supplied (missing: detection, scene, location, text, social)"
        );
    }

    #[test]
    fn rule_based_path() {
        let engine = SeverityFusionEngine::new(EngineConfig::rule_based()).unwrap();
        let result = engine.calculate_severity(&garbage_report(), false).unwrap();
        assert_eq!(result.prediction_method, PredictionMethod::RuleBased);
        assert_eq!(result.score, result.rule_based_score);
        assert_eq!(result.category, SeverityCategory::from_score(result.score));
        assert!(result.model_type.is_none());
        assert!(result.model_features.is_none());
        assert!(result.score_divergence().is_none());
        assert!(result.explanation.starts_with("Severity: "));
    }

    #[test]
    fn trained_path_reports_model_score() {
        let observer = Arc::new(RecordingObserver::default());
        let engine = engine_with(Some(80)).with_observer(observer.clone());
        let result = engine.calculate_severity(&garbage_report(), true).unwrap();

        assert_eq!(result.prediction_method, PredictionMethod::TrainedModel);
        assert_eq!(result.score, 80);
        assert_eq!(result.category, SeverityCategory::High);
        assert_eq!(result.model_type.as_deref(), Some("fixed"));
        assert!((result.confidence - 0.95).abs() < f64::EPSILON);
        assert_eq!(result.model_features.map(|f| f.len()), Some(FEATURE_COUNT));
        assert!(result.explanation.contains("[Predicted by trained fixed model"));
        assert_eq!(
            result.score_divergence(),
            Some(80_u8.abs_diff(result.rule_based_score))
        );

        let seen = observer.0.lock().unwrap();
        assert_eq!(*seen, vec![(80, result.rule_based_score)]);
    }

    #[test]
    fn failing_predictor_degrades_to_rule_based() {
        let engine = engine_with(None);
        let result = engine.calculate_severity(&garbage_report(), true).unwrap();
        assert_eq!(result.prediction_method, PredictionMethod::RuleBased);
        assert_eq!(result.score, result.rule_based_score);
    }

    struct OutOfRangePredictor;

    impl SeverityPredictor for OutOfRangePredictor {
        fn predict(&self, _features: &FeatureVector) -> Option<TrainedPrediction> {
            Some(TrainedPrediction {
                score: 200,
                raw_score: 200.0,
                confidence: f64::NAN,
                model_type: "out_of_range".to_string(),
                calibrated: false,
            })
        }

        fn model_type(&self) -> &str {
            "out_of_range"
        }
    }

    #[test]
    fn out_of_range_prediction_degrades_to_rule_based() {
        let observer = Arc::new(RecordingObserver::default());
        let handle = PredictorHandle::with_predictor(Arc::new(OutOfRangePredictor));
        let engine = SeverityFusionEngine::with_predictor(EngineConfig::default(), Arc::new(handle))
            .unwrap()
            .with_observer(observer.clone());
        let result = engine.calculate_severity(&garbage_report(), true).unwrap();

        assert!(result.score <= MAX_SCORE);
        assert_eq!(result.prediction_method, PredictionMethod::RuleBased);
        assert_eq!(result.score, result.rule_based_score);
        assert!(result.confidence.is_finite());
        assert!(result.model_type.is_none());
        assert!(observer.0.lock().unwrap().is_empty());
    }

    #[test]
    fn per_call_flag_skips_predictor() {
        let engine = engine_with(Some(100));
        let result = engine.calculate_severity(&garbage_report(), false).unwrap();
        assert_eq!(result.prediction_method, PredictionMethod::RuleBased);
    }

    #[test]
    fn nonexistent_model_path_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let engine =
            SeverityFusionEngine::new(EngineConfig::trained(dir.path().join("nope.json"))).unwrap();
        let result = engine.calculate(&garbage_report()).unwrap();
        assert_eq!(result.prediction_method, PredictionMethod::RuleBased);
        assert!(!engine.model_info().loaded);
    }

    #[test]
    fn classifier_artifact_end_to_end() {
        let mut biases = [0.0; 5];
        biases[3] = 6.0;
        let json = serde_json::json!({
            "model_type": "softmax_classifier",
            "weights": vec![vec![0.0; FEATURE_COUNT]; 5],
            "biases": biases,
        });
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{json}").unwrap();

        let engine = SeverityFusionEngine::new(EngineConfig::trained(file.path())).unwrap();
        let result = engine.calculate(&garbage_report()).unwrap();
        assert_eq!(result.prediction_method, PredictionMethod::TrainedModel);
        assert_eq!(result.score, 80);
        assert!(!result.calibrated);
        assert_eq!(result.model_type.as_deref(), Some("softmax_classifier"));
        assert!(result.explanation.ends_with("score=80]"));

        let info = engine.model_info();
        assert!(info.loaded);
        assert_eq!(info.feature_count, FEATURE_COUNT);
    }

    #[test]
    fn category_follows_final_score() {
        for score in [0, 20, 21, 40, 41, 60, 61, 80, 81, 100] {
            let result = engine_with(Some(score))
                .calculate_severity(&garbage_report(), true)
                .unwrap();
            assert_eq!(result.category, SeverityCategory::from_score(score), "{score}");
        }
    }

    #[test]
    fn deterministic() {
        let engine = SeverityFusionEngine::new(EngineConfig::rule_based()).unwrap();
        let a = engine.calculate_severity(&garbage_report(), false).unwrap();
        let b = engine.calculate_severity(&garbage_report(), false).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn open_dump_near_school_raises_score() {
        let engine = SeverityFusionEngine::new(EngineConfig::rule_based()).unwrap();
        let mut report = garbage_report();
        report.detection.as_mut().unwrap().is_open_dump = true;
        report.location = Some(LocationContext::default());
        let plain = engine.calculate_severity(&report, false).unwrap();

        report.location = Some(LocationContext {
            zones: ZoneFlags {
                educational: true,
                ..ZoneFlags::default()
            },
            ..LocationContext::default()
        });
        let school = engine.calculate_severity(&report, false).unwrap();
        assert!(school.score > plain.score);
    }

    #[test]
    fn attaches_waste_for_garbage_only() {
        let engine = SeverityFusionEngine::new(EngineConfig::rule_based()).unwrap();
        let result = engine.calculate_severity(&garbage_report(), false).unwrap();
        let waste = result.waste_classification.unwrap();
        assert_eq!(waste.primary_type, WasteType::Recyclable);

        let pothole = SignalSet {
            issue_kind: IssueKind::Pothole,
            ..garbage_report()
        };
        let result = engine.calculate_severity(&pothole, false).unwrap();
        assert!(result.waste_classification.is_none());
    }

    #[test]
    fn concurrent_use() {
        let engine = engine_with(Some(55));
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                std::thread::spawn(move || engine.calculate_severity(&garbage_report(), true))
            })
            .collect();
        for thread in threads {
            assert_eq!(thread.join().unwrap().unwrap().score, 55);
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EngineConfig::trained("");
        assert!(matches!(
            SeverityFusionEngine::new(config),
            Err(ConfigurationError::Invalid { .. })
        ));
    }

    fn result_with(score: u8) -> SeverityResult {
        engine_with(Some(score))
            .calculate_severity(&garbage_report(), true)
            .unwrap()
    }

    #[test]
    fn summary_of_empty_batch() {
        let summary = summarize(&[]);
        assert_eq!(summary.priority_level, PriorityLevel::None);
        assert_eq!(summary.total_analyzed, 0);
    }

    #[test]
    fn summary_priorities() {
        let low = summarize(&[result_with(10), result_with(30)]);
        assert_eq!(low.priority_level, PriorityLevel::Low);
        assert!((low.average_severity - 20.0).abs() < f64::EPSILON);
        assert_eq!(low.max_severity, 30);

        let medium = summarize(&[result_with(45), result_with(50)]);
        assert_eq!(medium.priority_level, PriorityLevel::Medium);

        let high = summarize(&[result_with(65), result_with(20)]);
        assert_eq!(high.priority_level, PriorityLevel::High);
        assert_eq!(high.hotspot_count, 1);

        let critical = summarize(&[result_with(85)]);
        assert_eq!(critical.priority_level, PriorityLevel::Critical);

        let many = summarize(&[result_with(61), result_with(62), result_with(63)]);
        assert_eq!(many.hotspot_count, 3);
        assert_eq!(many.priority_level, PriorityLevel::Critical);
        assert!((many.average_severity - 62.0).abs() < f64::EPSILON);
    }
}
