//! Multi-sport day detection.
//!
//! Groups activities by calendar day and classifies same-day swim/bike/run
//! combinations into a typed triathlon, or rejects the day. Unnamed days must
//! additionally look like one continuous event (leg order, transition gaps,
//! total span) so three unrelated workouts are not misclassified.
//!
//! ## Example
//! ```rust,ignore
//! use highlight_engine::detect_triathlons;
//!
//! let races = detect_triathlons(&activities);
//! for race in &races {
//!     println!("{}: {} ({:.1} km)", race.date, race.name, race.total_distance_km);
//! }
//! ```

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{Activity, SportType};

/// Keywords that mark an activity name as a triathlon event.
pub const TRIATHLON_KEYWORDS: &[&str] = &["triathlon", "ironman", "70.3", "t100", "challenge"];

/// Sport words stripped from the edges of event names, and the second half of
/// auto-generated names like "Morning Run".
const SPORT_WORDS: &[&str] = &[
    "run", "running", "ride", "cycling", "bike", "swim", "swimming", "walk", "hike", "workout",
];

/// First half of auto-generated activity names.
const TIME_WORDS: &[&str] = &["morning", "lunch", "afternoon", "evening", "night"];

/// Minimum leg distances in km (swim, bike, run). The looser gate applies
/// when a leg name carries a triathlon keyword.
const MIN_LEGS_NAMED: (f64, f64, f64) = (0.3, 8.0, 2.0);
const MIN_LEGS_UNNAMED: (f64, f64, f64) = (0.4, 10.0, 2.5);

/// Transition gap bounds between legs, in minutes.
const MIN_TRANSITION_MINUTES: f64 = 0.5;
const MAX_TRANSITION_MINUTES: f64 = 120.0;

/// Maximum elapsed span of an unnamed event, in minutes.
const MAX_EVENT_SPAN_MINUTES: f64 = 12.0 * 60.0;

/// Total elevation gain above which a non-full race becomes a mountain race.
const MOUNTAIN_ELEVATION_METERS: f64 = 1000.0;

/// Distance class of a detected triathlon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriathlonTier {
    Full,
    Half,
    Olympic,
    Sprint,
    Quarter,
    T100,
    Mountain,
    Other,
}

impl TriathlonTier {
    /// Display label, also used as the badge of the resulting highlight.
    pub fn label(self) -> &'static str {
        match self {
            TriathlonTier::Full => "Full Distance Triathlon",
            TriathlonTier::Half => "Half Distance Triathlon",
            TriathlonTier::Olympic => "Olympic Triathlon",
            TriathlonTier::Sprint => "Sprint Triathlon",
            TriathlonTier::Quarter => "Quarter Distance Triathlon",
            TriathlonTier::T100 => "T100 Triathlon",
            TriathlonTier::Mountain => "Mountain Triathlon",
            TriathlonTier::Other => "Triathlon",
        }
    }
}

/// A detected multi-sport event. Derived and recomputed per query, never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriathlonRace {
    /// Calendar date of the event
    pub date: NaiveDate,
    pub swim: Activity,
    pub bike: Activity,
    pub run: Activity,
    /// Sum of the three leg distances in km
    pub total_distance_km: f64,
    /// Elapsed minutes from first leg start to last leg end, transitions
    /// included
    pub total_time_minutes: f64,
    /// Sum of the three legs' elevation gain in meters
    pub total_elevation_meters: f64,
    pub tier: TriathlonTier,
    /// Resolved display name
    pub name: String,
}

impl TriathlonRace {
    /// Start instant of the earliest leg.
    pub fn start_time(&self) -> NaiveDateTime {
        self.swim.date.min(self.bike.date).min(self.run.date)
    }
}

// ============================================================================
// Detection
// ============================================================================

/// Detect triathlons in an activity history, newest first.
pub fn detect_triathlons(activities: &[Activity]) -> Vec<TriathlonRace> {
    let mut days: BTreeMap<NaiveDate, Vec<&Activity>> = BTreeMap::new();
    for activity in activities {
        days.entry(activity.local_date()).or_default().push(activity);
    }

    let mut races: Vec<TriathlonRace> = days
        .iter()
        .filter_map(|(date, day)| classify_day(*date, day))
        .collect();
    races.sort_by(|a, b| b.date.cmp(&a.date));

    debug!(
        "[Triathlon] {} day(s) scanned, {} race(s) detected",
        days.len(),
        races.len()
    );
    races
}

fn classify_day(date: NaiveDate, day: &[&Activity]) -> Option<TriathlonRace> {
    // The longest leg of each discipline represents the day, so a warm-up
    // swim next to the race swim does not distort the tier.
    let swim = longest_leg(day, |s| s == SportType::Swim)?;
    let bike = longest_leg(day, SportType::is_bike)?;
    let run = longest_leg(day, SportType::is_run)?;

    let named = [swim, bike, run]
        .iter()
        .any(|leg| contains_triathlon_keyword(&leg.name));

    let (min_swim, min_bike, min_run) = if named { MIN_LEGS_NAMED } else { MIN_LEGS_UNNAMED };
    if swim.distance_km < min_swim || bike.distance_km < min_bike || run.distance_km < min_run {
        debug!("[Triathlon] {} rejected: leg below minimum distance", date);
        return None;
    }

    if !named && !legs_form_one_event(swim, bike, run) {
        debug!("[Triathlon] {} rejected: legs do not form one event", date);
        return None;
    }

    let total_elevation = swim.elevation_gain_meters
        + bike.elevation_gain_meters
        + run.elevation_gain_meters;

    let mut tier = classify_tier(swim.distance_km, bike.distance_km, run.distance_km);
    if total_elevation > MOUNTAIN_ELEVATION_METERS && tier != TriathlonTier::Full {
        tier = TriathlonTier::Mountain;
    }

    let start = swim.date.min(bike.date).min(run.date);
    let end = swim.end_time().max(bike.end_time()).max(run.end_time());

    Some(TriathlonRace {
        date,
        total_distance_km: swim.distance_km + bike.distance_km + run.distance_km,
        total_time_minutes: minutes_between(start, end),
        total_elevation_meters: total_elevation,
        tier,
        name: resolve_name(swim, bike, run, tier),
        swim: swim.clone(),
        bike: bike.clone(),
        run: run.clone(),
    })
}

fn longest_leg<'a>(day: &[&'a Activity], matches: impl Fn(SportType) -> bool) -> Option<&'a Activity> {
    day.iter()
        .filter(|a| matches(a.sport_type))
        .copied()
        .max_by(|a, b| a.distance_km.total_cmp(&b.distance_km))
}

/// Unnamed days must run swim, bike, run in order with plausible transition
/// gaps and a bounded overall span.
fn legs_form_one_event(swim: &Activity, bike: &Activity, run: &Activity) -> bool {
    if !(swim.date < bike.date && bike.date < run.date) {
        return false;
    }
    let t1 = minutes_between(swim.end_time(), bike.date);
    let t2 = minutes_between(bike.end_time(), run.date);
    if !(MIN_TRANSITION_MINUTES..=MAX_TRANSITION_MINUTES).contains(&t1)
        || !(MIN_TRANSITION_MINUTES..=MAX_TRANSITION_MINUTES).contains(&t2)
    {
        return false;
    }
    minutes_between(swim.date, run.end_time()) <= MAX_EVENT_SPAN_MINUTES
}

fn minutes_between(earlier: NaiveDateTime, later: NaiveDateTime) -> f64 {
    (later - earlier).num_seconds() as f64 / 60.0
}

// ============================================================================
// Tier Classification
// ============================================================================

/// One row of the tier table: a distance predicate over (swim, bike, run) km.
struct TierRule {
    tier: TriathlonTier,
    matches: fn(f64, f64, f64) -> bool,
}

fn full_distance(swim: f64, bike: f64, run: f64) -> bool {
    swim >= 3.0 && bike >= 160.0 && run >= 35.0
}

fn half_distance(swim: f64, bike: f64, run: f64) -> bool {
    swim >= 1.5 && bike >= 80.0 && run >= 18.0
}

fn t100_distance(swim: f64, bike: f64, run: f64) -> bool {
    swim > 0.9 && swim < 2.1 && (87.0..=93.0).contains(&bike) && (8.0..12.0).contains(&run)
}

fn olympic_distance(swim: f64, bike: f64, run: f64) -> bool {
    swim >= 1.0 && bike >= 35.0 && run >= 8.0
}

fn quarter_distance(swim: f64, bike: f64, run: f64) -> bool {
    (0.9..=1.1).contains(&swim) && (35.0..=45.0).contains(&bike) && (8.0..12.0).contains(&run)
}

fn sprint_distance(swim: f64, bike: f64, run: f64) -> bool {
    swim >= 0.5 && bike >= 15.0 && run >= 4.0
}

/// Ordered most-specific first; the first matching row wins.
const TIER_RULES: &[TierRule] = &[
    TierRule {
        tier: TriathlonTier::Full,
        matches: full_distance,
    },
    TierRule {
        tier: TriathlonTier::Half,
        matches: half_distance,
    },
    TierRule {
        tier: TriathlonTier::T100,
        matches: t100_distance,
    },
    TierRule {
        tier: TriathlonTier::Olympic,
        matches: olympic_distance,
    },
    TierRule {
        tier: TriathlonTier::Quarter,
        matches: quarter_distance,
    },
    TierRule {
        tier: TriathlonTier::Sprint,
        matches: sprint_distance,
    },
];

fn classify_tier(swim: f64, bike: f64, run: f64) -> TriathlonTier {
    TIER_RULES
        .iter()
        .find(|rule| (rule.matches)(swim, bike, run))
        .map(|rule| rule.tier)
        .unwrap_or(TriathlonTier::Other)
}

// ============================================================================
// Name Resolution
// ============================================================================

fn contains_triathlon_keyword(name: &str) -> bool {
    let lower = name.to_lowercase();
    TRIATHLON_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Whether a name carries anything identifying it as an event rather than a
/// plain training session.
fn has_event_keyword(name: &str) -> bool {
    let lower = name.to_lowercase();
    contains_triathlon_keyword(&lower)
        || lower.contains("race")
        || lower.split_whitespace().any(|token| token == "tri")
}

/// Auto-generated names like "Morning Run" carry no event information.
fn is_generic_name(name: &str) -> bool {
    let tokens: Vec<String> = name
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect();
    tokens.len() == 2
        && TIME_WORDS.contains(&tokens[0].as_str())
        && SPORT_WORDS.contains(&tokens[1].as_str())
}

/// Strip leading/trailing sport-word tokens and trailing punctuation, so
/// "Swim - IRONMAN Lake City" and "IRONMAN Lake City Run" both resolve to
/// "IRONMAN Lake City".
fn clean_event_name(name: &str) -> String {
    let tokens: Vec<&str> = name.split_whitespace().collect();
    let is_sport_token = |token: &str| {
        let trimmed: String = token
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        SPORT_WORDS.contains(&trimmed.as_str())
    };

    let mut start = 0;
    let mut end = tokens.len();
    while start < end && is_sport_token(tokens[start]) {
        start += 1;
    }
    while end > start && is_sport_token(tokens[end - 1]) {
        end -= 1;
    }

    tokens[start..end]
        .join(" ")
        .trim_end_matches(|c: char| c.is_whitespace() || "-:,.;–".contains(c))
        .trim_start_matches(|c: char| c.is_whitespace() || "-:,.;–".contains(c))
        .to_string()
}

fn resolve_name(swim: &Activity, bike: &Activity, run: &Activity, tier: TriathlonTier) -> String {
    let legs = [swim, bike, run];

    // A keyword-bearing leg name is the event name.
    if let Some(named_leg) = legs.iter().find(|leg| contains_triathlon_keyword(&leg.name)) {
        let cleaned = clean_event_name(&named_leg.name);
        if !cleaned.is_empty() {
            return cleaned;
        }
    }

    // Otherwise the first leg the athlete bothered to rename.
    if let Some(custom) = legs.iter().find(|leg| !is_generic_name(&leg.name)) {
        let cleaned = clean_event_name(&custom.name);
        if !cleaned.is_empty() && has_event_keyword(&cleaned) {
            return cleaned;
        }
    }

    tier.label().to_string()
}
