//! User configuration for highlight detection.
//!
//! The surrounding application persists a settings bundle as JSON and hands
//! an immutable snapshot of it into every engine call. Nothing here is
//! process-wide state.
//!
//! ## Example
//! ```rust
//! use highlight_engine::config::{DistanceFilter, DistanceOperator, DistanceUnit};
//!
//! let filter = DistanceFilter::new(DistanceOperator::Approx, 42.0, DistanceUnit::Km);
//! assert!(filter.matches(42.195));
//! assert!(!filter.matches(45.0));
//! ```

use serde::{Deserialize, Serialize};

use crate::{Activity, SportType};

/// Kilometers per mile.
pub const KM_PER_MILE: f64 = 1.609_344;

/// A case-insensitive title substring with two independent exclusion axes.
///
/// An activity can be hidden from highlight computation while still counting
/// toward totals, or the other way around.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TitlePattern {
    pub pattern: String,
    #[serde(default, alias = "excludeFromHighlights")]
    pub exclude_from_highlights: bool,
    #[serde(default, alias = "excludeFromStats")]
    pub exclude_from_stats: bool,
}

impl TitlePattern {
    /// Case-insensitive substring test against an activity name.
    /// Empty patterns match nothing, so one blank row in the settings UI
    /// cannot swallow the whole history.
    pub fn matches(&self, name: &str) -> bool {
        if self.pattern.is_empty() {
            return false;
        }
        name.to_lowercase().contains(&self.pattern.to_lowercase())
    }
}

/// Comparison operator of a distance filter.
///
/// `Eq` (10 %), `Approx` (5 %) and `Exact` (0.1 km) are three distinct named
/// tolerance policies. Existing configurations depend on the exact bands, so
/// they are kept separate instead of being collapsed into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceOperator {
    /// Distance at or above the target
    #[serde(rename = "gte")]
    Gte,
    /// Distance at or below the target
    #[serde(rename = "lte")]
    Lte,
    /// Within 10 % of the target
    #[serde(rename = "eq")]
    Eq,
    /// Within 5 % of the target
    #[serde(rename = "≈")]
    Approx,
    /// Within 0.1 km of the target, regardless of unit
    #[serde(rename = "=")]
    Exact,
}

/// Unit a distance filter's value is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceUnit {
    #[serde(rename = "km")]
    Km,
    #[serde(rename = "mi")]
    Mi,
}

impl DistanceUnit {
    pub fn label(self) -> &'static str {
        match self {
            DistanceUnit::Km => "km",
            DistanceUnit::Mi => "mi",
        }
    }
}

/// A tolerance band or one-sided bound against an activity's distance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DistanceFilter {
    pub operator: DistanceOperator,
    pub value: f64,
    pub unit: DistanceUnit,
}

impl DistanceFilter {
    pub fn new(operator: DistanceOperator, value: f64, unit: DistanceUnit) -> Self {
        Self {
            operator,
            value,
            unit,
        }
    }

    /// Target distance converted to kilometers.
    pub fn target_km(&self) -> f64 {
        match self.unit {
            DistanceUnit::Km => self.value,
            DistanceUnit::Mi => self.value * KM_PER_MILE,
        }
    }

    /// Whether a distance in kilometers satisfies this filter.
    pub fn matches(&self, distance_km: f64) -> bool {
        let target = self.target_km();
        match self.operator {
            DistanceOperator::Gte => distance_km >= target,
            DistanceOperator::Lte => distance_km <= target,
            DistanceOperator::Eq => (distance_km - target).abs() <= 0.10 * target,
            DistanceOperator::Approx => (distance_km - target).abs() <= 0.05 * target,
            DistanceOperator::Exact => (distance_km - target).abs() <= 0.1,
        }
    }
}

/// Per-sport highlight configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityTypeFilter {
    #[serde(alias = "activityType")]
    pub sport_type: SportType,
    #[serde(default, alias = "distanceFilters")]
    pub distance_filters: Vec<DistanceFilter>,
    /// Free-text substrings evaluated after the distance filters
    #[serde(default, alias = "titlePatterns")]
    pub title_patterns: Vec<String>,
}

impl ActivityTypeFilter {
    pub fn new(sport_type: SportType) -> Self {
        Self {
            sport_type,
            distance_filters: Vec::new(),
            title_patterns: Vec::new(),
        }
    }
}

/// The full year-in-review settings bundle.
///
/// Malformed values (a filter that can match nothing, a non-positive target)
/// are the configuration layer's problem; the engine lets such a filter match
/// nothing rather than failing the computation for the other filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewSettings {
    /// Global title patterns with per-axis exclusion flags
    #[serde(default, alias = "titleIgnorePatterns")]
    pub title_patterns: Vec<TitlePattern>,
    /// Per-sport distance and title filters
    #[serde(default, alias = "activityFilters")]
    pub activity_filters: Vec<ActivityTypeFilter>,
    /// Optional allow-list restricting which sport types may surface in the
    /// per-sport highlight summaries
    #[serde(default, alias = "includeInHighlights")]
    pub include_in_highlights: Option<Vec<SportType>>,
}

impl ReviewSettings {
    /// Parse a settings bundle from its persisted JSON form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The configured filter for a sport, if any.
    pub fn filter_for(&self, sport_type: SportType) -> Option<&ActivityTypeFilter> {
        self.activity_filters
            .iter()
            .find(|f| f.sport_type == sport_type)
    }

    /// Whether an activity is hidden from highlight computation.
    pub fn is_excluded_from_highlights(&self, activity: &Activity) -> bool {
        self.title_patterns
            .iter()
            .any(|p| p.exclude_from_highlights && p.matches(&activity.name))
    }

    /// Whether an activity is hidden from downstream stats pages.
    pub fn is_excluded_from_stats(&self, activity: &Activity) -> bool {
        self.title_patterns
            .iter()
            .any(|p| p.exclude_from_stats && p.matches(&activity.name))
    }

    /// Whether a sport type passes the highlight allow-list.
    pub fn is_sport_allowed(&self, sport_type: SportType) -> bool {
        match &self.include_in_highlights {
            Some(allowed) => allowed.contains(&sport_type),
            None => true,
        }
    }
}
