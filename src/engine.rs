//! # Review Engine
//!
//! Wires the components into one pipeline: triathlon detection and highlight
//! matching feed the aggregator, whose claim set feeds the per-sport
//! summaries, while the calendar aggregation runs off the raw list.
//!
//! Every invocation is a pure function of (activities, settings, year). The
//! caller hands in an immutable snapshot; no state is shared across calls,
//! so concurrent or reactive callers need no coordination.

use std::collections::BTreeSet;

use chrono::Datelike;
use log::info;
use serde::{Deserialize, Serialize};

use crate::calendar::{compute_year_stats, YearStats};
use crate::config::ReviewSettings;
use crate::highlights::{aggregate_highlights, RaceHighlight};
use crate::matcher::match_highlights;
use crate::sport_stats::{ReportSport, SportHighlights};
use crate::triathlon::detect_triathlons;
use crate::Activity;

#[cfg(not(feature = "parallel"))]
use crate::sport_stats::compute_sport_highlights;

#[cfg(feature = "parallel")]
use crate::sport_stats::compute_sport_highlights_parallel;

/// The complete derived view over one activity history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearInReview {
    /// Year the calendar stats cover
    pub year: i32,
    /// Deduplicated highlights, longest first
    pub highlights: Vec<RaceHighlight>,
    /// Per-sport summaries; sports with nothing to display are absent
    pub sports: std::collections::BTreeMap<ReportSport, SportHighlights>,
    /// Ids claimed by matcher filters
    pub claimed_ids: BTreeSet<String>,
    /// Ids hidden from highlight computation by title patterns
    pub excluded_ids: BTreeSet<String>,
    /// Ids hidden from downstream stats pages by title patterns
    pub stats_excluded_ids: BTreeSet<String>,
    pub stats: YearStats,
}

impl YearInReview {
    /// Serialize for the surrounding application.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Run the full review pipeline.
///
/// `year` selects the calendar aggregation window; `None` falls back to the
/// most recent activity's year. The highlight and per-sport views always
/// cover the whole input list, which the caller has already windowed.
pub fn compute_year_in_review(
    activities: &[Activity],
    settings: &ReviewSettings,
    year: Option<i32>,
) -> YearInReview {
    let year = year
        .or_else(|| activities.iter().map(|a| a.date.year()).max())
        .unwrap_or(0);

    let triathlons = detect_triathlons(activities);
    let matcher_output = match_highlights(activities, settings);
    let summary = aggregate_highlights(&triathlons, matcher_output);

    #[cfg(feature = "parallel")]
    let sports = compute_sport_highlights_parallel(activities, settings, &summary.claimed_ids);
    #[cfg(not(feature = "parallel"))]
    let sports = compute_sport_highlights(activities, settings, &summary.claimed_ids);

    let excluded_ids: BTreeSet<String> = activities
        .iter()
        .filter(|a| settings.is_excluded_from_highlights(a))
        .map(|a| a.id.clone())
        .collect();
    let stats_excluded_ids: BTreeSet<String> = activities
        .iter()
        .filter(|a| settings.is_excluded_from_stats(a))
        .map(|a| a.id.clone())
        .collect();

    let stats = compute_year_stats(activities, year);

    info!(
        "[Review] {} activities in, {} highlight(s), {} sport summary(ies), year {}",
        activities.len(),
        summary.highlights.len(),
        sports.len(),
        year
    );

    YearInReview {
        year,
        highlights: summary.highlights,
        sports,
        claimed_ids: summary.claimed_ids,
        excluded_ids,
        stats_excluded_ids,
        stats,
    }
}
