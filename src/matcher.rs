//! Configurable highlight matching with claim-once arbitration.
//!
//! Each configured sport contributes distance filters and free-text title
//! filters. Distance filters compete for activities: candidates are collected
//! per filter, then the single best candidate is claimed so one physical
//! activity satisfies at most one distance filter. The greedy
//! best-per-filter assignment is an accepted approximation of optimal
//! bipartite matching, not a bug.

use std::collections::BTreeSet;

use log::debug;

use crate::config::{DistanceFilter, DistanceOperator, DistanceUnit, ReviewSettings};
use crate::highlights::{HighlightKind, RaceHighlight};
use crate::{Activity, SportType};

/// Paces closer than this are treated as tied and fall through to the next
/// tie-break rule.
pub const PACE_EPSILON_MIN_PER_KM: f64 = 0.01;

/// Matcher result: the custom highlights plus the ids they claimed.
#[derive(Debug, Clone, Default)]
pub struct MatcherOutput {
    pub highlights: Vec<RaceHighlight>,
    /// Ids claimed by distance or title filters, exposed separately from the
    /// title-pattern exclusions because downstream consumers treat the two
    /// differently.
    pub claimed_ids: BTreeSet<String>,
}

/// Apply the per-sport filters to an activity history.
///
/// Filters are evaluated in configuration order; within one sport the
/// distance filters run before the title filters. Iteration over activities
/// follows the input order, which keeps tie-breaks reproducible.
pub fn match_highlights(activities: &[Activity], settings: &ReviewSettings) -> MatcherOutput {
    let mut output = MatcherOutput::default();

    for filter_config in &settings.activity_filters {
        let eligible: Vec<&Activity> = activities
            .iter()
            .filter(|a| {
                a.sport_type == filter_config.sport_type
                    && !settings.is_excluded_from_highlights(a)
            })
            .collect();

        for distance_filter in &filter_config.distance_filters {
            let target = distance_filter.target_km();
            let winner = eligible
                .iter()
                .copied()
                .filter(|a| {
                    !output.claimed_ids.contains(&a.id)
                        && distance_filter.matches(a.distance_km)
                })
                .fold(None::<&Activity>, |best, candidate| match best {
                    Some(incumbent) if !is_better(candidate, incumbent, target) => Some(incumbent),
                    _ => Some(candidate),
                });

            if let Some(activity) = winner {
                debug!(
                    "[Matcher] {} {:?} {} claimed '{}' ({:.2} km)",
                    filter_config.sport_type.label(),
                    distance_filter.operator,
                    target,
                    activity.name,
                    activity.distance_km
                );
                output.claimed_ids.insert(activity.id.clone());
                output.highlights.push(distance_highlight(
                    activity,
                    filter_config.sport_type,
                    distance_filter,
                ));
            }
        }

        for pattern in &filter_config.title_patterns {
            if pattern.is_empty() {
                continue;
            }
            let needle = pattern.to_lowercase();
            // Title filters are not exclusive with each other per activity
            // name, but a claim still removes the activity from later
            // patterns and filters.
            let matches: Vec<&Activity> = eligible
                .iter()
                .filter(|a| {
                    !output.claimed_ids.contains(&a.id)
                        && a.name.to_lowercase().contains(&needle)
                })
                .copied()
                .collect();
            for activity in matches {
                output.claimed_ids.insert(activity.id.clone());
                output.highlights.push(title_highlight(activity, pattern));
            }
        }
    }

    debug!(
        "[Matcher] {} highlight(s) from {} configured sport(s)",
        output.highlights.len(),
        settings.activity_filters.len()
    );
    output
}

/// Arbitration priority chain: fastest pace, then smallest deviation from
/// the target distance, then the most recent date.
fn is_better(challenger: &Activity, incumbent: &Activity, target_km: f64) -> bool {
    let challenger_pace = challenger.pace_min_per_km();
    let incumbent_pace = incumbent.pace_min_per_km();
    if (challenger_pace - incumbent_pace).abs() > PACE_EPSILON_MIN_PER_KM {
        return challenger_pace.total_cmp(&incumbent_pace).is_lt();
    }

    let challenger_dev = (challenger.distance_km - target_km).abs();
    let incumbent_dev = (incumbent.distance_km - target_km).abs();
    if (challenger_dev - incumbent_dev).abs() > f64::EPSILON {
        return challenger_dev < incumbent_dev;
    }

    challenger.date > incumbent.date
}

fn distance_highlight(
    activity: &Activity,
    sport: SportType,
    filter: &DistanceFilter,
) -> RaceHighlight {
    RaceHighlight {
        id: activity.id.clone(),
        name: activity.name.clone(),
        date: activity.date,
        kind: kind_for(sport, filter),
        distance_km: activity.distance_km,
        duration_minutes: activity.moving_time_minutes,
        elevation_meters: (activity.elevation_gain_meters > 0.0)
            .then_some(activity.elevation_gain_meters),
        activities: Vec::new(),
        badge: badge_for(sport, filter),
        sport_type: Some(activity.sport_type),
    }
}

fn title_highlight(activity: &Activity, pattern: &str) -> RaceHighlight {
    RaceHighlight {
        id: activity.id.clone(),
        name: activity.name.clone(),
        date: activity.date,
        kind: HighlightKind::CustomHighlight,
        distance_km: activity.distance_km,
        duration_minutes: activity.moving_time_minutes,
        elevation_meters: (activity.elevation_gain_meters > 0.0)
            .then_some(activity.elevation_gain_meters),
        activities: Vec::new(),
        badge: pattern.trim().to_string(),
        sport_type: Some(activity.sport_type),
    }
}

// ============================================================================
// Badges and Kinds
// ============================================================================

/// Filter targets within half a kilometer of a standard race distance get
/// the standard name.
fn near(value: f64, target: f64) -> bool {
    (value - target).abs() <= 0.5
}

pub(crate) fn badge_for(sport: SportType, filter: &DistanceFilter) -> String {
    if filter.operator == DistanceOperator::Gte {
        return format!("{}+ {}", format_value(filter.value), filter.unit.label());
    }
    if filter.unit == DistanceUnit::Km {
        if sport.is_run() {
            if near(filter.value, 42.2) {
                return "Marathon".to_string();
            }
            if near(filter.value, 21.1) {
                return "Half Marathon".to_string();
            }
            for standard in [15.0, 10.0, 5.0] {
                if near(filter.value, standard) {
                    return format!("{}K", standard as i64);
                }
            }
        }
        if sport == SportType::Swim && filter.value < 10.0 {
            return format!("{}m", (filter.value * 1000.0).round() as i64);
        }
    }
    format!("{} {}", format_value(filter.value), filter.unit.label())
}

fn kind_for(sport: SportType, filter: &DistanceFilter) -> HighlightKind {
    if filter.operator == DistanceOperator::Gte {
        if sport.is_run() {
            return HighlightKind::LongRun;
        }
        if sport.is_bike() {
            return HighlightKind::LongRide;
        }
        return HighlightKind::CustomHighlight;
    }
    if sport.is_run() && filter.unit == DistanceUnit::Km {
        if near(filter.value, 21.1) {
            return HighlightKind::HalfMarathon;
        }
        if near(filter.value, 15.0) {
            return HighlightKind::FifteenKRun;
        }
        if near(filter.value, 10.0) {
            return HighlightKind::TenKRun;
        }
        if near(filter.value, 5.0) {
            return HighlightKind::FiveKRun;
        }
    }
    HighlightKind::CustomHighlight
}

fn format_value(value: f64) -> String {
    if value.fract().abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ActivityTypeFilter;
    use chrono::NaiveDate;

    fn make_run(id: &str, name: &str, day: u32, distance_km: f64, moving: f64) -> Activity {
        let date = NaiveDate::from_ymd_opt(2024, 4, day)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let mut activity = Activity::new(id, name, SportType::Run, date);
        activity.distance_km = distance_km;
        activity.moving_time_minutes = moving;
        activity.duration_minutes = moving;
        activity
    }

    fn run_settings(filters: Vec<DistanceFilter>, patterns: Vec<&str>) -> ReviewSettings {
        let mut config = ActivityTypeFilter::new(SportType::Run);
        config.distance_filters = filters;
        config.title_patterns = patterns.into_iter().map(String::from).collect();
        ReviewSettings {
            activity_filters: vec![config],
            ..Default::default()
        }
    }

    #[test]
    fn test_fastest_candidate_wins() {
        let activities = vec![
            make_run("slow", "Sunday 10K", 7, 10.0, 60.0),
            make_run("fast", "Race 10K", 14, 10.0, 42.0),
        ];
        let settings = run_settings(
            vec![DistanceFilter::new(
                DistanceOperator::Eq,
                10.0,
                DistanceUnit::Km,
            )],
            vec![],
        );
        let output = match_highlights(&activities, &settings);
        assert_eq!(output.highlights.len(), 1);
        assert_eq!(output.highlights[0].id, "fast");
        assert!(output.claimed_ids.contains("fast"));
    }

    #[test]
    fn test_claim_exclusivity_across_filters() {
        // Both filters accept the 42.2 km run; the first claims it and the
        // second must settle for the 40 km run.
        let activities = vec![
            make_run("a", "City Marathon", 7, 42.2, 230.0),
            make_run("b", "Long Sunday Run", 14, 40.0, 250.0),
        ];
        let settings = run_settings(
            vec![
                DistanceFilter::new(DistanceOperator::Approx, 42.0, DistanceUnit::Km),
                DistanceFilter::new(DistanceOperator::Gte, 38.0, DistanceUnit::Km),
            ],
            vec![],
        );
        let output = match_highlights(&activities, &settings);
        let ids: Vec<&str> = output.highlights.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_pace_tie_breaks_on_deviation() {
        // Identical 6:00 min/km pace; the 10.0 km run sits exactly on the
        // target while the 10.8 km run deviates.
        let activities = vec![
            make_run("far", "Tempo", 7, 10.8, 64.8),
            make_run("close", "Tempo", 8, 10.0, 60.0),
        ];
        let settings = run_settings(
            vec![DistanceFilter::new(
                DistanceOperator::Eq,
                10.0,
                DistanceUnit::Km,
            )],
            vec![],
        );
        let output = match_highlights(&activities, &settings);
        assert_eq!(output.highlights[0].id, "close");
    }

    #[test]
    fn test_deviation_tie_breaks_on_recency() {
        let activities = vec![
            make_run("older", "Tempo", 7, 10.0, 60.0),
            make_run("newer", "Tempo", 21, 10.0, 60.0),
        ];
        let settings = run_settings(
            vec![DistanceFilter::new(
                DistanceOperator::Eq,
                10.0,
                DistanceUnit::Km,
            )],
            vec![],
        );
        let output = match_highlights(&activities, &settings);
        assert_eq!(output.highlights[0].id, "newer");
    }

    #[test]
    fn test_excluded_titles_never_compete() {
        let activities = vec![
            make_run("hidden", "Marathon relay leg", 7, 10.0, 45.0),
            make_run("visible", "Tempo 10K", 14, 10.0, 50.0),
        ];
        let mut settings = run_settings(
            vec![DistanceFilter::new(
                DistanceOperator::Eq,
                10.0,
                DistanceUnit::Km,
            )],
            vec![],
        );
        settings.title_patterns = vec![crate::TitlePattern {
            pattern: "relay".to_string(),
            exclude_from_highlights: true,
            exclude_from_stats: false,
        }];
        let output = match_highlights(&activities, &settings);
        assert_eq!(output.highlights.len(), 1);
        assert_eq!(output.highlights[0].id, "visible");
    }

    #[test]
    fn test_title_patterns_claim_every_match() {
        let activities = vec![
            make_run("p1", "Parkrun #101", 6, 5.0, 24.0),
            make_run("p2", "Parkrun #102", 13, 5.0, 23.5),
            make_run("t1", "Tempo", 20, 8.0, 40.0),
        ];
        let settings = run_settings(vec![], vec!["parkrun"]);
        let output = match_highlights(&activities, &settings);
        assert_eq!(output.highlights.len(), 2);
        assert!(output.claimed_ids.contains("p1"));
        assert!(output.claimed_ids.contains("p2"));
        assert_eq!(output.highlights[0].kind, HighlightKind::CustomHighlight);
        assert_eq!(output.highlights[0].badge, "parkrun");
    }

    #[test]
    fn test_title_patterns_run_after_distance_filters() {
        // The distance filter claims the race first, so the title pattern
        // only picks up the remaining match.
        let activities = vec![
            make_run("race", "Spring 10K", 6, 10.0, 44.0),
            make_run("training", "10K pace practice", 13, 9.5, 50.0),
        ];
        let settings = run_settings(
            vec![DistanceFilter::new(
                DistanceOperator::Eq,
                10.0,
                DistanceUnit::Km,
            )],
            vec!["10k"],
        );
        let output = match_highlights(&activities, &settings);
        let ids: Vec<&str> = output.highlights.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["race", "training"]);
        assert_eq!(output.highlights[0].kind, HighlightKind::TenKRun);
    }

    #[test]
    fn test_badges() {
        let half = DistanceFilter::new(DistanceOperator::Eq, 21.0, DistanceUnit::Km);
        assert_eq!(badge_for(SportType::Run, &half), "Half Marathon");

        let marathon = DistanceFilter::new(DistanceOperator::Approx, 42.0, DistanceUnit::Km);
        assert_eq!(badge_for(SportType::Run, &marathon), "Marathon");

        let swim = DistanceFilter::new(DistanceOperator::Exact, 1.0, DistanceUnit::Km);
        assert_eq!(badge_for(SportType::Swim, &swim), "1000m");

        let long_ride = DistanceFilter::new(DistanceOperator::Gte, 100.0, DistanceUnit::Km);
        assert_eq!(badge_for(SportType::Ride, &long_ride), "100+ km");

        let generic = DistanceFilter::new(DistanceOperator::Eq, 7.5, DistanceUnit::Mi);
        assert_eq!(badge_for(SportType::Ride, &generic), "7.5 mi");
    }

    #[test]
    fn test_kinds() {
        let gte_run = DistanceFilter::new(DistanceOperator::Gte, 30.0, DistanceUnit::Km);
        assert_eq!(kind_for(SportType::Run, &gte_run), HighlightKind::LongRun);

        let gte_ride = DistanceFilter::new(DistanceOperator::Gte, 100.0, DistanceUnit::Km);
        assert_eq!(kind_for(SportType::Ride, &gte_ride), HighlightKind::LongRide);

        let five = DistanceFilter::new(DistanceOperator::Exact, 5.0, DistanceUnit::Km);
        assert_eq!(kind_for(SportType::Run, &five), HighlightKind::FiveKRun);

        let marathon = DistanceFilter::new(DistanceOperator::Approx, 42.0, DistanceUnit::Km);
        assert_eq!(kind_for(SportType::Run, &marathon), HighlightKind::CustomHighlight);
    }

    #[test]
    fn test_zero_distance_sentinel_is_survivable() {
        // A zero-distance activity carries an infinite pace; it loses to any
        // finite pace but must not abort the computation.
        let broken = make_run("broken", "Watch glitch", 7, 0.0, 30.0);
        let activities = vec![broken, make_run("ok", "Recovery jog", 8, 3.0, 20.0)];
        let settings = run_settings(
            vec![DistanceFilter::new(
                DistanceOperator::Lte,
                5.0,
                DistanceUnit::Km,
            )],
            vec![],
        );
        let output = match_highlights(&activities, &settings);
        assert_eq!(output.highlights.len(), 1);
        assert_eq!(output.highlights[0].id, "ok");
    }
}
