#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report files and engine setup for the `civic_triage` binary.
//!
//! A report file carries the raw inputs for one citizen report: the
//! detector and scene outputs, the report position with the sites the
//! caller found around it, the free-text description, and the upvote
//! count. [`RawReport::into_signals`] runs the location and text analyzers
//! over the raw parts so the engine receives a complete [`SignalSet`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use civic_triage_location::NearbySite;
use civic_triage_severity::{
    ConfigurationError, EngineConfig, SeverityError, SeverityFusionEngine,
};
use civic_triage_severity_models::{
    DetectionSummary, IssueKind, LocationContext, SceneClassification, SeverityResult, SignalSet,
    SiteKind, SocialSignal, TextSentiment,
};
use serde::{Deserialize, Serialize};

/// One citizen report as read from disk.
///
/// Precomputed `location` or `text` groups take precedence over the raw
/// fields they would otherwise be derived from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawReport {
    /// Caller-side identifier, echoed in batch output.
    pub id: Option<String>,
    pub issue_kind: IssueKind,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Sites found near the report.
    pub nearby_sites: Vec<NearbySite>,
    /// Per-kind site counts, used when no individual sites are known.
    pub site_counts: BTreeMap<SiteKind, u32>,
    pub major_road: bool,
    pub description: Option<String>,
    pub upvote_count: Option<u32>,
    pub detection: Option<DetectionSummary>,
    pub scene: Option<SceneClassification>,
    pub location: Option<LocationContext>,
    pub text: Option<TextSentiment>,
}

impl RawReport {
    /// Derives the signal set, running the location and text analyzers
    /// where precomputed groups are absent.
    #[must_use]
    pub fn into_signals(self) -> SignalSet {
        let derived_location = if self.location.is_none() {
            self.analyze_location()
        } else {
            None
        };
        let location = self.location.or(derived_location);
        let text = self.text.or_else(|| {
            self.description
                .as_deref()
                .map(|d| civic_triage_text::analyze(Some(d)))
        });

        SignalSet {
            issue_kind: self.issue_kind,
            detection: self.detection,
            scene: self.scene,
            location,
            text,
            social: self.upvote_count.map(|upvote_count| SocialSignal { upvote_count }),
            description: self.description,
        }
    }

    fn analyze_location(&self) -> Option<LocationContext> {
        let point = match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => civic_triage_location::valid_point(lat, lng),
            _ => None,
        };

        if !self.nearby_sites.is_empty() || point.is_some() {
            Some(civic_triage_location::analyze(
                point,
                &self.nearby_sites,
                self.major_road,
            ))
        } else if !self.site_counts.is_empty() {
            Some(civic_triage_location::analyze_counts(
                &self.site_counts,
                self.major_road,
            ))
        } else if self.major_road {
            Some(civic_triage_location::analyze(None, &[], true))
        } else {
            None
        }
    }
}

/// Result or error for one report in a batch.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SeverityResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Builds the engine configuration from an optional TOML file and CLI
/// overrides.
///
/// # Errors
///
/// * If the config file cannot be read or parsed
/// * If the resulting options are inconsistent
pub fn resolve_config(
    config_path: Option<&Path>,
    model_path: Option<PathBuf>,
    rule_based_only: bool,
) -> Result<EngineConfig, ConfigurationError> {
    let mut config = match config_path {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(model_path) = model_path {
        config.model_path = model_path;
    }
    if rule_based_only {
        config.use_trained_model = false;
    }
    config.validate()?;
    Ok(config)
}

/// Scores one report.
///
/// # Errors
///
/// * If the report carries no signals at all
pub fn score_report(
    engine: &SeverityFusionEngine,
    report: RawReport,
) -> Result<SeverityResult, SeverityError> {
    engine.calculate(&report.into_signals())
}

/// Scores every report, keeping per-report failures in the output.
#[must_use]
pub fn score_batch(engine: &SeverityFusionEngine, reports: Vec<RawReport>) -> Vec<ScoredReport> {
    reports
        .into_iter()
        .map(|report| {
            let id = report.id.clone();
            match score_report(engine, report) {
                Ok(result) => ScoredReport {
                    id,
                    result: Some(result),
                    error: None,
                },
                Err(e) => {
                    log::warn!("Skipping report {}: {e}", id.as_deref().unwrap_or("<unnamed>"));
                    ScoredReport {
                        id,
                        result: None,
                        error: Some(e.to_string()),
                    }
                }
            }
        })
        .collect()
}
