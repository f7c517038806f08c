//! Highlight merging and deduplication.
//!
//! Built-in detector output (triathlons) and matcher output are merged into
//! one list with at most one highlight per underlying activity id. Dropping
//! later duplicates silently is a defined policy, not an error: the first
//! component to surface an activity owns it.

use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDateTime;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::matcher::MatcherOutput;
use crate::triathlon::TriathlonRace;
use crate::{Activity, SportType};

/// Category of a highlight event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HighlightKind {
    #[serde(rename = "triathlon")]
    Triathlon,
    #[serde(rename = "half-marathon")]
    HalfMarathon,
    #[serde(rename = "15k-run")]
    FifteenKRun,
    #[serde(rename = "10k-run")]
    TenKRun,
    #[serde(rename = "5k-run")]
    FiveKRun,
    #[serde(rename = "long-run")]
    LongRun,
    #[serde(rename = "long-ride")]
    LongRide,
    #[serde(rename = "custom-highlight")]
    CustomHighlight,
}

/// A notable activity or multi-activity event surfaced for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceHighlight {
    /// Underlying activity id, or a synthetic `tri-<date>` id for
    /// multi-sport events
    pub id: String,
    pub name: String,
    pub date: NaiveDateTime,
    pub kind: HighlightKind,
    pub distance_km: f64,
    pub duration_minutes: f64,
    pub elevation_meters: Option<f64>,
    /// Sub-legs for multi-sport events, empty for single activities
    #[serde(default)]
    pub activities: Vec<Activity>,
    /// Display label, e.g. "Half Marathon" or "Full Distance Triathlon"
    pub badge: String,
    /// Sport of a single-activity highlight; multi-sport events carry none
    pub sport_type: Option<SportType>,
}

impl RaceHighlight {
    /// Convert a detected triathlon into its highlight form.
    pub fn from_triathlon(race: &TriathlonRace) -> Self {
        Self {
            id: format!("tri-{}", race.date.format("%Y-%m-%d")),
            name: race.name.clone(),
            date: race.start_time(),
            kind: HighlightKind::Triathlon,
            distance_km: race.total_distance_km,
            duration_minutes: race.total_time_minutes,
            elevation_meters: (race.total_elevation_meters > 0.0)
                .then_some(race.total_elevation_meters),
            activities: vec![race.swim.clone(), race.bike.clone(), race.run.clone()],
            badge: race.tier.label().to_string(),
            sport_type: None,
        }
    }

    /// Ids of the activities this highlight is built from.
    fn underlying_ids(&self) -> Vec<&str> {
        if self.activities.is_empty() {
            vec![self.id.as_str()]
        } else {
            self.activities.iter().map(|a| a.id.as_str()).collect()
        }
    }
}

/// Merged, deduplicated highlight list plus the matcher's claim set.
#[derive(Debug, Clone, Default)]
pub struct HighlightSummary {
    /// Highlights sorted by distance, longest first
    pub highlights: Vec<RaceHighlight>,
    /// Activity ids claimed by matcher filters
    pub claimed_ids: BTreeSet<String>,
}

/// Merge triathlon and matcher output.
///
/// Triathlons enter first, so a leg that also satisfies a user filter
/// surfaces as part of the multi-sport event rather than on its own.
pub fn aggregate_highlights(
    triathlons: &[TriathlonRace],
    matcher_output: MatcherOutput,
) -> HighlightSummary {
    let mut seen: HashSet<String> = HashSet::new();
    let mut highlights: Vec<RaceHighlight> = Vec::new();
    let mut dropped = 0usize;

    let triathlon_highlights = triathlons.iter().map(RaceHighlight::from_triathlon);
    for highlight in triathlon_highlights.chain(matcher_output.highlights) {
        let ids: Vec<String> = highlight
            .underlying_ids()
            .into_iter()
            .map(String::from)
            .collect();
        if ids.iter().any(|id| seen.contains(id)) {
            dropped += 1;
            continue;
        }
        seen.extend(ids);
        highlights.push(highlight);
    }

    // Stable sort keeps insertion order for equal distances.
    highlights.sort_by(|a, b| b.distance_km.total_cmp(&a.distance_km));

    if dropped > 0 {
        debug!("[Highlights] dropped {} duplicate highlight(s)", dropped);
    }
    debug!("[Highlights] {} highlight(s) after merge", highlights.len());

    HighlightSummary {
        highlights,
        claimed_ids: matcher_output.claimed_ids,
    }
}
