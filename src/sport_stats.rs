//! Per-sport summary calculations.
//!
//! For running, cycling and swimming independently: totals, best-time
//! distance records, the longest activity and the biggest climb. Two
//! exclusion policies apply and they are deliberately asymmetric:
//!
//! - Totals always cover the full sport population, matching what a plain
//!   stats page would show.
//! - Distance records come from the highlight-filtered population (matcher
//!   claims and highlight-excluded titles removed).
//! - Longest activity and biggest climb come from the longest-eligible
//!   population, which removes only the title exclusions. A filter claim
//!   governs which highlight card shows an activity, not whether it can earn
//!   a superlative.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{DistanceFilter, ReviewSettings};
use crate::matcher::badge_for;
use crate::{Activity, SportType};

/// Elevation gain below this is not worth a "biggest climb" card.
const MIN_CLIMB_METERS: f64 = 50.0;

/// The three sports summarized in a year in review. Cycling merges outdoor
/// and virtual rides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportSport {
    Running,
    Cycling,
    Swimming,
}

impl ReportSport {
    pub const ALL: [ReportSport; 3] = [
        ReportSport::Running,
        ReportSport::Cycling,
        ReportSport::Swimming,
    ];

    /// Whether a sport type belongs to this report group.
    pub fn contains(self, sport_type: SportType) -> bool {
        match self {
            ReportSport::Running => sport_type.is_run(),
            ReportSport::Cycling => sport_type.is_bike(),
            ReportSport::Swimming => sport_type == SportType::Swim,
        }
    }

    /// The sport types that make up this group.
    pub fn member_types(self) -> &'static [SportType] {
        match self {
            ReportSport::Running => &[SportType::Run, SportType::TrailRun],
            ReportSport::Cycling => &[SportType::Ride, SportType::VirtualRide],
            ReportSport::Swimming => &[SportType::Swim],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReportSport::Running => "Running",
            ReportSport::Cycling => "Cycling",
            ReportSport::Swimming => "Swimming",
        }
    }
}

/// Best time within one configured distance band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceRecord {
    /// Display label of the band, e.g. "Half Marathon"
    pub label: String,
    /// Band target in kilometers
    pub target_km: f64,
    pub activity: Activity,
    /// min/km for running, min/100m for swimming, km/h for cycling
    pub pace: f64,
}

/// Summary of one sport for the review period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SportHighlights {
    pub sport: ReportSport,
    /// Sum over every activity of the sport, exclusions ignored
    pub total_distance_km: f64,
    pub total_time_minutes: f64,
    pub total_elevation_meters: f64,
    pub activity_count: u32,
    /// min/km for running, min/100m for swimming, km/h for cycling. Zero
    /// totals propagate a non-finite sentinel; render as "N/A".
    pub average: f64,
    pub distance_records: Vec<DistanceRecord>,
    pub longest_activity: Option<Activity>,
    /// Only present when the biggest gain clears [`MIN_CLIMB_METERS`]
    pub biggest_climb: Option<Activity>,
}

/// Compute summaries for all three sports.
///
/// A sport whose highlight-filtered population is empty is omitted even when
/// its totals are non-zero; the caller reads absence as "nothing to display".
pub fn compute_sport_highlights(
    activities: &[Activity],
    settings: &ReviewSettings,
    claimed_ids: &BTreeSet<String>,
) -> BTreeMap<ReportSport, SportHighlights> {
    ReportSport::ALL
        .iter()
        .filter_map(|&sport| {
            compute_for_sport(sport, activities, settings, claimed_ids)
                .map(|summary| (sport, summary))
        })
        .collect()
}

/// Parallel variant. The three sports share no mutable state, so they are
/// computed concurrently.
#[cfg(feature = "parallel")]
pub fn compute_sport_highlights_parallel(
    activities: &[Activity],
    settings: &ReviewSettings,
    claimed_ids: &BTreeSet<String>,
) -> BTreeMap<ReportSport, SportHighlights> {
    ReportSport::ALL
        .par_iter()
        .filter_map(|&sport| {
            compute_for_sport(sport, activities, settings, claimed_ids)
                .map(|summary| (sport, summary))
        })
        .collect()
}

fn compute_for_sport(
    sport: ReportSport,
    activities: &[Activity],
    settings: &ReviewSettings,
    claimed_ids: &BTreeSet<String>,
) -> Option<SportHighlights> {
    let population: Vec<&Activity> = activities
        .iter()
        .filter(|a| sport.contains(a.sport_type))
        .collect();
    if population.is_empty() {
        return None;
    }

    let highlight_filtered: Vec<&Activity> = population
        .iter()
        .filter(|a| {
            !claimed_ids.contains(&a.id)
                && !settings.is_excluded_from_highlights(a)
                && settings.is_sport_allowed(a.sport_type)
        })
        .copied()
        .collect();
    if highlight_filtered.is_empty() {
        debug!(
            "[SportStats] {} omitted: nothing left after highlight filtering",
            sport.label()
        );
        return None;
    }

    // Filter claims do not apply here: a claimed activity stays eligible for
    // the longest and biggest-climb superlatives.
    let longest_eligible: Vec<&Activity> = population
        .iter()
        .filter(|a| !settings.is_excluded_from_highlights(a))
        .copied()
        .collect();

    let total_distance_km: f64 = population.iter().map(|a| a.distance_km).sum();
    let total_time_minutes: f64 = population.iter().map(|a| a.moving_time_minutes).sum();
    let total_elevation_meters: f64 = population.iter().map(|a| a.elevation_gain_meters).sum();

    let longest_activity = longest_eligible
        .iter()
        .max_by(|a, b| a.distance_km.total_cmp(&b.distance_km))
        .map(|a| (*a).clone());

    let biggest_climb = longest_eligible
        .iter()
        .max_by(|a, b| a.elevation_gain_meters.total_cmp(&b.elevation_gain_meters))
        .filter(|a| a.elevation_gain_meters > MIN_CLIMB_METERS)
        .map(|a| (*a).clone());

    Some(SportHighlights {
        sport,
        total_distance_km,
        total_time_minutes,
        total_elevation_meters,
        activity_count: population.len() as u32,
        average: average_for(sport, total_distance_km, total_time_minutes),
        distance_records: distance_records(sport, settings, &highlight_filtered),
        longest_activity,
        biggest_climb,
    })
}

// ============================================================================
// Distance Records
// ============================================================================

fn distance_records(
    sport: ReportSport,
    settings: &ReviewSettings,
    population: &[&Activity],
) -> Vec<DistanceRecord> {
    let mut seen_targets: Vec<f64> = Vec::new();
    let mut records = Vec::new();

    for &member in sport.member_types() {
        let Some(config) = settings.filter_for(member) else {
            continue;
        };
        for filter in &config.distance_filters {
            let target = filter.target_km();
            // One band per target value, first configuration wins.
            if seen_targets.iter().any(|&t| (t - target).abs() < 1e-9) {
                continue;
            }
            seen_targets.push(target);

            if let Some(record) = best_in_band(sport, member, filter, population) {
                records.push(record);
            }
        }
    }

    records
}

/// Fastest activity (lowest moving time) within one distance band.
fn best_in_band(
    sport: ReportSport,
    member: SportType,
    filter: &DistanceFilter,
    population: &[&Activity],
) -> Option<DistanceRecord> {
    population
        .iter()
        .copied()
        .filter(|a| filter.matches(a.distance_km))
        .min_by(|a, b| a.moving_time_minutes.total_cmp(&b.moving_time_minutes))
        .map(|activity| DistanceRecord {
            label: badge_for(member, filter),
            target_km: filter.target_km(),
            activity: activity.clone(),
            pace: pace_for(sport, activity),
        })
}

// ============================================================================
// Pace Semantics
// ============================================================================

/// Per-sport pace or speed of one activity.
fn pace_for(sport: ReportSport, activity: &Activity) -> f64 {
    match sport {
        ReportSport::Running => activity.moving_time_minutes / activity.distance_km,
        ReportSport::Swimming => activity.moving_time_minutes / (activity.distance_km * 10.0),
        ReportSport::Cycling => activity.distance_km / (activity.moving_time_minutes / 60.0),
    }
}

/// Per-sport average over the full population totals.
fn average_for(sport: ReportSport, total_distance_km: f64, total_time_minutes: f64) -> f64 {
    match sport {
        ReportSport::Running => total_time_minutes / total_distance_km,
        ReportSport::Swimming => total_time_minutes / (total_distance_km * 10.0),
        ReportSport::Cycling => total_distance_km / (total_time_minutes / 60.0),
    }
}
