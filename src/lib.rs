//! # Highlight Engine
//!
//! Activity classification and highlight detection for endurance sport
//! histories (runs, rides, swims, multi-sport days).
//!
//! This library provides:
//! - Multi-discipline triathlon detection from same-day swim/bike/run combos
//! - User-configurable highlight matching with claim-once arbitration
//! - Per-sport summaries (totals, distance records, longest, biggest climb)
//! - Calendar and time-of-day aggregation for a target year
//!
//! ## Features
//!
//! - **`parallel`** - Compute the per-sport summaries concurrently with rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use highlight_engine::{compute_year_in_review, Activity, ReviewSettings, SportType};
//! use chrono::NaiveDate;
//!
//! let date = NaiveDate::from_ymd_opt(2024, 6, 2)
//!     .unwrap()
//!     .and_hms_opt(9, 0, 0)
//!     .unwrap();
//! let mut marathon = Activity::new("a1", "City Marathon", SportType::Run, date);
//! marathon.distance_km = 42.2;
//! marathon.moving_time_minutes = 225.0;
//!
//! let review = compute_year_in_review(&[marathon], &ReviewSettings::default(), Some(2024));
//! assert_eq!(review.stats.totals.count, 1);
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// User configuration (title patterns, distance filters)
pub mod config;
pub use config::{
    ActivityTypeFilter, DistanceFilter, DistanceOperator, DistanceUnit, ReviewSettings,
    TitlePattern,
};

// Multi-sport day detection
pub mod triathlon;
pub use triathlon::{detect_triathlons, TriathlonRace, TriathlonTier};

// Configurable highlight matching with claim-once arbitration
pub mod matcher;
pub use matcher::{match_highlights, MatcherOutput};

// Highlight merging and deduplication
pub mod highlights;
pub use highlights::{aggregate_highlights, HighlightKind, HighlightSummary, RaceHighlight};

// Per-sport summary calculations
pub mod sport_stats;
#[cfg(feature = "parallel")]
pub use sport_stats::compute_sport_highlights_parallel;
pub use sport_stats::{compute_sport_highlights, DistanceRecord, ReportSport, SportHighlights};

// Calendar and time-of-day aggregation
pub mod calendar;
pub use calendar::{
    compute_year_stats, HeatmapCell, PeriodTotals, TimeOfDayBlock, WeekdayBucket, YearStats,
};

// Review pipeline wiring the components together
pub mod engine;
pub use engine::{compute_year_in_review, YearInReview};

// ============================================================================
// Core Types
// ============================================================================

/// Sport discipline of an activity.
///
/// Unknown sports from the upstream store deserialize to [`SportType::Other`]
/// instead of failing the whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SportType {
    Run,
    TrailRun,
    Ride,
    VirtualRide,
    Swim,
    Walk,
    Hike,
    Workout,
    #[serde(other)]
    Other,
}

impl SportType {
    /// Running-class sports (road and trail).
    pub fn is_run(self) -> bool {
        matches!(self, SportType::Run | SportType::TrailRun)
    }

    /// Bike-class sports (outdoor and virtual rides).
    pub fn is_bike(self) -> bool {
        matches!(self, SportType::Ride | SportType::VirtualRide)
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            SportType::Run => "Run",
            SportType::TrailRun => "Trail Run",
            SportType::Ride => "Ride",
            SportType::VirtualRide => "Virtual Ride",
            SportType::Swim => "Swim",
            SportType::Walk => "Walk",
            SportType::Hike => "Hike",
            SportType::Workout => "Workout",
            SportType::Other => "Other",
        }
    }
}

/// A single recorded activity, as supplied by the external activity store.
///
/// Records are immutable inputs. The engine only reads and classifies them;
/// it never writes back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Opaque unique identifier
    pub id: String,
    /// Free-text activity name
    pub name: String,
    /// Sport discipline
    pub sport_type: SportType,
    /// Start instant with local wall-clock semantics
    pub date: NaiveDateTime,
    /// Distance in kilometers
    pub distance_km: f64,
    /// Moving time in minutes
    pub moving_time_minutes: f64,
    /// Elapsed time in minutes (at least the moving time)
    pub duration_minutes: f64,
    /// Total elevation gain in meters
    pub elevation_gain_meters: f64,
    /// Average speed in km/h
    pub average_speed_kmh: f64,
    /// Maximum speed in km/h
    pub max_speed_kmh: f64,
    /// Average heart rate in bpm (optional)
    pub average_heart_rate: Option<f64>,
    /// Energy expenditure in kcal (optional)
    pub calories: Option<f64>,
    /// Upstream workout type code (optional, e.g. race vs workout)
    pub workout_type: Option<i32>,
}

impl Activity {
    /// Create an activity with zeroed metrics. Fill in the fields you need.
    pub fn new(id: &str, name: &str, sport_type: SportType, date: NaiveDateTime) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            sport_type,
            date,
            distance_km: 0.0,
            moving_time_minutes: 0.0,
            duration_minutes: 0.0,
            elevation_gain_meters: 0.0,
            average_speed_kmh: 0.0,
            max_speed_kmh: 0.0,
            average_heart_rate: None,
            calories: None,
            workout_type: None,
        }
    }

    /// Local calendar date of the start instant.
    pub fn local_date(&self) -> NaiveDate {
        self.date.date()
    }

    /// End instant derived from the elapsed duration.
    pub fn end_time(&self) -> NaiveDateTime {
        self.date + chrono::Duration::seconds((self.duration_minutes * 60.0).round() as i64)
    }

    /// Pace in min/km.
    ///
    /// Zero-distance activities propagate an infinite or NaN sentinel in this
    /// one metric rather than aborting the batch; callers render those as
    /// "N/A".
    pub fn pace_min_per_km(&self) -> f64 {
        self.moving_time_minutes / self.distance_km
    }
}

// ============================================================================
// Formatting Helpers
// ============================================================================

/// Format a duration in minutes as "45min" / "3h 45min".
pub fn format_duration_minutes(minutes: f64) -> String {
    if !minutes.is_finite() {
        return "N/A".to_string();
    }
    let total = minutes.round() as i64;
    if total < 60 {
        format!("{}min", total)
    } else {
        let hours = total / 60;
        let mins = total % 60;
        if mins > 0 {
            format!("{}h {}min", hours, mins)
        } else {
            format!("{}h", hours)
        }
    }
}

/// Format a distance in kilometers as "800m" / "42.2km".
pub fn format_distance_km(km: f64) -> String {
    if km < 1.0 {
        format!("{}m", (km * 1000.0).round() as i64)
    } else {
        format!("{:.1}km", km)
    }
}

/// Format a pace in min/km as "5:30/km". Non-finite paces render as "N/A".
pub fn format_pace_min_per_km(pace: f64) -> String {
    if !pace.is_finite() || pace <= 0.0 {
        return "N/A".to_string();
    }
    let total_seconds = (pace * 60.0).round() as i64;
    format!("{}:{:02}/km", total_seconds / 60, total_seconds % 60)
}

// ============================================================================
// Tests
// ============================================================================
