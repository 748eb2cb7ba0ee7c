//! Lazily-loaded, shared predictor handle.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use civic_triage_predictor::{
    ModelPredictor, PredictorInfo, SeverityPredictor, TrainedPrediction,
};
use civic_triage_severity_models::{FEATURE_COUNT, Feature, FeatureVector, MAX_SCORE};

/// Reads a predictor from an artifact path.
pub type PredictorLoader = fn(&Path) -> Option<Arc<dyn SeverityPredictor>>;

fn load_model(path: &Path) -> Option<Arc<dyn SeverityPredictor>> {
    ModelPredictor::load(path).map(|p| Arc::new(p) as Arc<dyn SeverityPredictor>)
}

/// Owns at most one predictor for the lifetime of an engine.
///
/// The artifact is read on first use. Concurrent first callers block until
/// the single load finishes, so every caller sees either no predictor or a
/// fully initialized one. After that the handle is read-only.
pub struct PredictorHandle {
    path: Option<PathBuf>,
    loader: PredictorLoader,
    predictor: OnceLock<Option<Arc<dyn SeverityPredictor>>>,
    fault_logged: AtomicBool,
}

impl std::fmt::Debug for PredictorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictorHandle")
            .field("path", &self.path)
            .field("initialized", &self.predictor.get().is_some())
            .finish_non_exhaustive()
    }
}

impl PredictorHandle {
    /// A handle that loads the artifact at `path` on first use.
    #[must_use]
    pub fn lazy(path: impl Into<PathBuf>) -> Self {
        Self::lazy_with(path, load_model)
    }

    /// A handle that calls `loader` with `path` on first use.
    #[must_use]
    pub fn lazy_with(path: impl Into<PathBuf>, loader: PredictorLoader) -> Self {
        Self {
            path: Some(path.into()),
            loader,
            predictor: OnceLock::new(),
            fault_logged: AtomicBool::new(false),
        }
    }

    /// A handle that never provides a predictor.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            path: None,
            loader: load_model,
            predictor: OnceLock::from(None),
            fault_logged: AtomicBool::new(false),
        }
    }

    /// A handle around an already-constructed predictor.
    #[must_use]
    pub fn with_predictor(predictor: Arc<dyn SeverityPredictor>) -> Self {
        Self {
            path: None,
            loader: load_model,
            predictor: OnceLock::from(Some(predictor)),
            fault_logged: AtomicBool::new(false),
        }
    }

    /// The predictor, loading it on first call.
    #[must_use]
    pub fn get(&self) -> Option<&Arc<dyn SeverityPredictor>> {
        self.predictor
            .get_or_init(|| {
                let path = self.path.as_deref()?;
                (self.loader)(path)
            })
            .as_ref()
    }

    /// Whether a predictor is available (loads on first call).
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.get().is_some()
    }

    /// Runs the predictor, or returns `None` when unavailable or faulty.
    ///
    /// A prediction with a score above 100 or a confidence outside `[0, 1]`
    /// is a fault. The first fault is logged as a warning; later faults are
    /// logged at debug level.
    #[must_use]
    pub fn predict(&self, features: &FeatureVector) -> Option<TrainedPrediction> {
        let predictor = self.get()?;
        let prediction = predictor.predict(features).filter(|p| {
            let in_range = p.score <= MAX_SCORE && (0.0..=1.0).contains(&p.confidence);
            if !in_range {
                log::debug!(
                    "{} predictor returned score={} confidence={}",
                    predictor.model_type(),
                    p.score,
                    p.confidence
                );
            }
            in_range
        });
        if prediction.is_none() {
            if self.fault_logged.swap(true, Ordering::Relaxed) {
                log::debug!(
                    "{} predictor failed, using rule-based score",
                    predictor.model_type()
                );
            } else {
                log::warn!(
                    "{} predictor failed, falling back to rule-based scoring",
                    predictor.model_type()
                );
            }
        }
        prediction
    }

    /// Metadata about the predictor (loads on first call).
    #[must_use]
    pub fn info(&self) -> PredictorInfo {
        match self.get() {
            Some(predictor) => PredictorInfo {
                loaded: true,
                path: self.path.clone(),
                model_type: Some(predictor.model_type().to_string()),
                feature_count: FEATURE_COUNT,
                feature_names: Feature::names(),
            },
            None => PredictorInfo::unavailable(self.path.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;
    use std::sync::atomic::AtomicUsize;

    use super::*;

    struct CountingPredictor {
        calls: AtomicUsize,
        score: Option<u8>,
        confidence: f64,
    }

    impl CountingPredictor {
        const fn new(score: Option<u8>, confidence: f64) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                score,
                confidence,
            }
        }
    }

    impl SeverityPredictor for CountingPredictor {
        fn predict(&self, _features: &FeatureVector) -> Option<TrainedPrediction> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.score.map(|score| TrainedPrediction {
                score,
                raw_score: f64::from(score),
                confidence: self.confidence,
                model_type: "counting".to_string(),
                calibrated: false,
            })
        }

        fn model_type(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn missing_artifact_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let handle = PredictorHandle::lazy(dir.path().join("missing.json"));
        assert!(!handle.is_available());
        assert!(handle.predict(&FeatureVector::default()).is_none());
        let info = handle.info();
        assert!(!info.loaded);
        assert_eq!(info.path, Some(dir.path().join("missing.json")));
    }

    #[test]
    fn loads_artifact_once() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::json!({
            "model_type": "linear_regressor",
            "weights": vec![0.0; FEATURE_COUNT],
            "intercept": 33.0,
        });
        write!(file, "{json}").unwrap();

        let handle = Arc::new(PredictorHandle::lazy(file.path()));
        let threads: Vec<_> = (0..4)
            .map(|_| {
                let handle = Arc::clone(&handle);
                std::thread::spawn(move || handle.predict(&FeatureVector::default()))
            })
            .collect();
        for thread in threads {
            let prediction = thread.join().unwrap().unwrap();
            assert_eq!(prediction.score, 33);
        }

        // The artifact is no longer consulted after the first load
        drop(file);
        assert!(handle.is_available());
        assert_eq!(handle.info().model_type.as_deref(), Some("linear_regressor"));
    }

    #[test]
    fn concurrent_first_callers_share_one_load() {
        static LOADS: AtomicUsize = AtomicUsize::new(0);

        fn slow_loader(_path: &Path) -> Option<Arc<dyn SeverityPredictor>> {
            LOADS.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            Some(Arc::new(CountingPredictor::new(Some(41), 0.9)))
        }

        let handle = Arc::new(PredictorHandle::lazy_with("unused.json", slow_loader));
        let barrier = Arc::new(std::sync::Barrier::new(8));
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let handle = Arc::clone(&handle);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    handle.predict(&FeatureVector::default())
                })
            })
            .collect();
        for thread in threads {
            assert_eq!(thread.join().unwrap().unwrap().score, 41);
        }
        assert_eq!(LOADS.load(Ordering::SeqCst), 1);

        assert!(handle.is_available());
        assert_eq!(LOADS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_load_is_not_retried() {
        static LOADS: AtomicUsize = AtomicUsize::new(0);

        fn missing_loader(_path: &Path) -> Option<Arc<dyn SeverityPredictor>> {
            LOADS.fetch_add(1, Ordering::SeqCst);
            None
        }

        let handle = PredictorHandle::lazy_with("missing.json", missing_loader);
        for _ in 0..3 {
            assert!(handle.predict(&FeatureVector::default()).is_none());
        }
        assert!(!handle.info().loaded);
        assert_eq!(LOADS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn disabled_handle_never_predicts() {
        let handle = PredictorHandle::disabled();
        assert!(handle.predict(&FeatureVector::default()).is_none());
        assert!(!handle.info().loaded);
    }

    #[test]
    fn injected_predictor_is_used() {
        let predictor = Arc::new(CountingPredictor::new(None, 0.9));
        let handle = PredictorHandle::with_predictor(predictor.clone());
        assert!(handle.predict(&FeatureVector::default()).is_none());
        assert!(handle.predict(&FeatureVector::default()).is_none());
        assert_eq!(predictor.calls.load(Ordering::Relaxed), 2);
        assert_eq!(handle.info().model_type.as_deref(), Some("counting"));
    }

    #[test]
    fn out_of_range_predictions_are_faults() {
        for (score, confidence) in [(200, 0.9), (100, f64::NAN), (50, 1.5), (50, -0.1)] {
            let predictor = Arc::new(CountingPredictor::new(Some(score), confidence));
            let handle = PredictorHandle::with_predictor(predictor.clone());
            assert!(
                handle.predict(&FeatureVector::default()).is_none(),
                "score={score} confidence={confidence}"
            );
            assert_eq!(predictor.calls.load(Ordering::Relaxed), 1);
        }

        let handle =
            PredictorHandle::with_predictor(Arc::new(CountingPredictor::new(Some(100), 1.0)));
        assert_eq!(handle.predict(&FeatureVector::default()).unwrap().score, 100);
    }
}
