#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Location context analysis for civic issue reports.
//!
//! Turns the list of sensitive sites near a report (schools, hospitals,
//! parks, ...) into a priority multiplier in `[0.9, 1.5]`, zone flags, and
//! the site names used in explanation text. Querying for nearby sites is
//! the caller's job; this crate only scores what it is given.
//!
//! Multipliers never stack: a report next to both a school (1.5×) and a
//! park (1.3×) gets 1.5×, the single largest applicable value.

use std::collections::BTreeMap;

use civic_triage_severity_models::{LocationContext, MatchedSite, SiteKind, Zone, ZoneFlags};
use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

/// Lowest multiplier a location can produce.
pub const MIN_MULTIPLIER: f64 = 0.9;

/// Highest multiplier a location can produce.
pub const MAX_MULTIPLIER: f64 = 1.5;

/// Sites closer than this get their full multiplier.
const FULL_PRIORITY_RADIUS_M: f64 = 100.0;

/// Sites beyond this get the minimum decay factor.
const DECAY_RADIUS_M: f64 = 500.0;

/// Fraction of the bonus lost between the two radii.
const MAX_DECAY: f64 = 0.3;

/// Number of site names kept for explanations.
const MAX_CRITICAL_SITES: usize = 3;

/// A site near the report, as found by the caller's spatial query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbySite {
    pub kind: SiteKind,
    #[serde(default)]
    pub name: Option<String>,
    /// Site latitude (WGS84), used when `distance_m` is absent.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Site longitude (WGS84), used when `distance_m` is absent.
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Precomputed distance from the report in metres.
    #[serde(default)]
    pub distance_m: Option<f64>,
}

impl NearbySite {
    /// A site at a known distance.
    #[must_use]
    pub fn at_distance(kind: SiteKind, name: impl Into<String>, distance_m: f64) -> Self {
        Self {
            kind,
            name: Some(name.into()),
            latitude: None,
            longitude: None,
            distance_m: Some(distance_m),
        }
    }

    /// A site at a known position.
    #[must_use]
    pub fn at_position(
        kind: SiteKind,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            kind,
            name: Some(name.into()),
            latitude: Some(latitude),
            longitude: Some(longitude),
            distance_m: None,
        }
    }

    fn display_name(&self) -> String {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .map_or_else(|| self.kind.to_string(), str::to_string)
    }

    fn position(&self) -> Option<Point<f64>> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => valid_point(lat, lng),
            _ => None,
        }
    }
}

/// Builds a point from latitude/longitude, rejecting values outside
/// WGS84 bounds with a warning.
#[must_use]
pub fn valid_point(latitude: f64, longitude: f64) -> Option<Point<f64>> {
    if latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
    {
        Some(Point::new(longitude, latitude))
    } else {
        log::warn!("Ignoring invalid coordinates ({latitude}, {longitude})");
        None
    }
}

/// Base multiplier for a site kind before distance decay.
#[must_use]
pub const fn base_multiplier(kind: SiteKind) -> f64 {
    match kind {
        SiteKind::School | SiteKind::Kindergarten => 1.5,
        SiteKind::College
        | SiteKind::University
        | SiteKind::Hospital
        | SiteKind::Clinic
        | SiteKind::Doctors => 1.4,
        SiteKind::Pharmacy
        | SiteKind::Park
        | SiteKind::NatureReserve
        | SiteKind::Playground => 1.3,
        SiteKind::Residential | SiteKind::Apartments | SiteKind::Commercial => 1.0,
        SiteKind::Industrial => 0.9,
    }
}

/// Share of a site's bonus that survives at `distance_m`.
///
/// Unknown distances count as close: the caller's query radius already
/// limited the site list.
#[must_use]
pub fn distance_factor(distance_m: Option<f64>) -> f64 {
    match distance_m {
        None => 1.0,
        Some(d) if d <= FULL_PRIORITY_RADIUS_M => 1.0,
        Some(d) if d <= DECAY_RADIUS_M => {
            1.0 - ((d - FULL_PRIORITY_RADIUS_M) / (DECAY_RADIUS_M - FULL_PRIORITY_RADIUS_M))
                * MAX_DECAY
        }
        Some(_) => 1.0 - MAX_DECAY,
    }
}

/// Multiplier for one site after distance decay.
#[must_use]
pub fn adjusted_multiplier(kind: SiteKind, distance_m: Option<f64>) -> f64 {
    1.0 + (base_multiplier(kind) - 1.0) * distance_factor(distance_m)
}

/// Analyzes the sites around a report.
///
/// `point` is the report location; it is only needed for sites given by
/// position rather than by distance.
#[must_use]
pub fn analyze(
    point: Option<Point<f64>>,
    sites: &[NearbySite],
    major_road: bool,
) -> LocationContext {
    let mut ranked: Vec<(&NearbySite, Option<f64>)> = sites
        .iter()
        .map(|site| (site, resolve_distance(point, site)))
        .collect();
    ranked.sort_by(|a, b| a.1.unwrap_or(0.0).total_cmp(&b.1.unwrap_or(0.0)));

    let mut zones = ZoneFlags::default();
    let mut best: Option<(f64, &NearbySite, Option<f64>)> = None;

    for &(site, distance) in &ranked {
        zones.insert(site.kind.zone());

        let adjusted = adjusted_multiplier(site.kind, distance);
        if best.is_none_or(|(current, _, _)| adjusted > current) {
            best = Some((adjusted, site, distance));
        }
    }

    let critical_sites = ranked
        .iter()
        .filter(|(site, _)| is_sensitive(site.kind.zone()))
        .take(MAX_CRITICAL_SITES)
        .map(|(site, _)| format!("{} ({})", site.display_name(), site.kind))
        .collect();

    let multiplier = best.map_or(1.0, |(m, _, _)| round2(m));

    LocationContext {
        multiplier: multiplier.clamp(MIN_MULTIPLIER, MAX_MULTIPLIER),
        zones,
        primary_zone: best.map_or(Zone::Commercial, |(_, site, _)| site.kind.zone()),
        critical_sites,
        highest_priority_site: best.map(|(_, site, distance)| MatchedSite {
            kind: site.kind,
            name: site.display_name(),
            distance_m: distance.map(round1),
        }),
        major_road,
    }
}

/// Analyzes per-kind site counts when positions are unknown.
///
/// No distance decay is applied, so every counted kind contributes its
/// full base multiplier.
#[must_use]
pub fn analyze_counts(counts: &BTreeMap<SiteKind, u32>, major_road: bool) -> LocationContext {
    let sites: Vec<NearbySite> = counts
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(kind, _)| NearbySite {
            kind: *kind,
            name: None,
            latitude: None,
            longitude: None,
            distance_m: None,
        })
        .collect();

    analyze(None, &sites, major_road)
}

const fn is_sensitive(zone: Zone) -> bool {
    matches!(zone, Zone::Educational | Zone::Healthcare | Zone::Eco)
}

fn resolve_distance(point: Option<Point<f64>>, site: &NearbySite) -> Option<f64> {
    if let Some(distance) = site.distance_m {
        if distance.is_finite() && distance >= 0.0 {
            return Some(distance);
        }
        log::warn!(
            "Ignoring invalid distance {distance} for site {}",
            site.display_name()
        );
    }

    match (point, site.position()) {
        (Some(origin), Some(target)) => Some(Haversine.distance(origin, target)),
        _ => None,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
