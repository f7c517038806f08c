//! Calendar and time-of-day aggregation.
//!
//! A pure reduction of the unfiltered activity list for one calendar year:
//! month buckets, per-sport buckets, weekday buckets, an hour-by-weekday
//! heatmap, the most active day and the preferred training time block.
//!
//! Weekdays are indexed Monday=0 through Sunday=6 everywhere, including the
//! heatmap cell keys. One convention, applied uniformly; no Sunday-first
//! indexing leaks out of this module.

use std::collections::BTreeMap;

use chrono::{Datelike, Timelike};
use serde::{Deserialize, Serialize};

use crate::{Activity, SportType};

/// Accumulated metrics for one bucket (month, sport or weekday).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub count: u32,
    pub distance_km: f64,
    pub elevation_meters: f64,
    pub time_minutes: f64,
}

impl PeriodTotals {
    fn add(&mut self, activity: &Activity) {
        self.count += 1;
        self.distance_km += activity.distance_km;
        self.elevation_meters += activity.elevation_gain_meters;
        self.time_minutes += activity.moving_time_minutes;
    }
}

/// Weekday bucket with per-activity averages derived once counts are known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekdayBucket {
    pub totals: PeriodTotals,
    pub avg_distance_km: f64,
    pub avg_time_minutes: f64,
}

impl WeekdayBucket {
    fn finalize(&mut self) {
        if self.totals.count > 0 {
            let count = self.totals.count as f64;
            self.avg_distance_km = self.totals.distance_km / count;
            self.avg_time_minutes = self.totals.time_minutes / count;
        }
    }
}

/// One observed hour-by-weekday cell. Cells that saw no activity are not
/// materialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    /// Monday=0 .. Sunday=6
    pub weekday: u32,
    /// Hour of day, 0..=23
    pub hour: u32,
    pub count: u32,
    pub distance_km: f64,
    pub time_minutes: f64,
    /// Ids of the contributing activities, in input order
    pub activity_ids: Vec<String>,
}

impl HeatmapCell {
    fn new(weekday: u32, hour: u32) -> Self {
        Self {
            weekday,
            hour,
            count: 0,
            distance_km: 0.0,
            time_minutes: 0.0,
            activity_ids: Vec::new(),
        }
    }
}

/// Time-of-day block of an activity's start hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeOfDayBlock {
    EarlyMorning,
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDayBlock {
    pub const ALL: [TimeOfDayBlock; 5] = [
        TimeOfDayBlock::EarlyMorning,
        TimeOfDayBlock::Morning,
        TimeOfDayBlock::Afternoon,
        TimeOfDayBlock::Evening,
        TimeOfDayBlock::Night,
    ];

    /// Block containing an hour of day. Night wraps past midnight, so it is
    /// `hour >= 21 || hour < 5` rather than a simple range.
    pub fn for_hour(hour: u32) -> Self {
        if hour >= 21 || hour < 5 {
            TimeOfDayBlock::Night
        } else if hour < 9 {
            TimeOfDayBlock::EarlyMorning
        } else if hour < 12 {
            TimeOfDayBlock::Morning
        } else if hour < 17 {
            TimeOfDayBlock::Afternoon
        } else {
            TimeOfDayBlock::Evening
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeOfDayBlock::EarlyMorning => "Early Morning",
            TimeOfDayBlock::Morning => "Morning",
            TimeOfDayBlock::Afternoon => "Afternoon",
            TimeOfDayBlock::Evening => "Evening",
            TimeOfDayBlock::Night => "Night",
        }
    }
}

/// Aggregated calendar statistics for one year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearStats {
    pub year: i32,
    pub totals: PeriodTotals,
    /// All twelve months, zero-filled, January first
    pub monthly: [PeriodTotals; 12],
    pub by_type: BTreeMap<SportType, PeriodTotals>,
    /// Monday=0 .. Sunday=6
    pub weekday: [WeekdayBucket; 7],
    pub heatmap: Vec<HeatmapCell>,
    /// Weekday index with the greatest total time, ties to the earlier index
    pub most_active_day: Option<u32>,
    /// Block with the most activities
    pub preferred_time: Option<TimeOfDayBlock>,
}

impl YearStats {
    fn empty(year: i32) -> Self {
        Self {
            year,
            totals: PeriodTotals::default(),
            monthly: [PeriodTotals::default(); 12],
            by_type: BTreeMap::new(),
            weekday: [WeekdayBucket::default(); 7],
            heatmap: Vec::new(),
            most_active_day: None,
            preferred_time: None,
        }
    }
}

/// Reduce the activity list into [`YearStats`] for one calendar year.
/// Activities outside the year are ignored; an empty year yields zero-filled
/// buckets.
pub fn compute_year_stats(activities: &[Activity], year: i32) -> YearStats {
    let mut stats = YearStats::empty(year);
    let mut heatmap: BTreeMap<(u32, u32), HeatmapCell> = BTreeMap::new();
    let mut block_counts = [0u32; 5];

    for activity in activities.iter().filter(|a| a.date.year() == year) {
        stats.totals.add(activity);
        stats.monthly[activity.date.month0() as usize].add(activity);
        stats
            .by_type
            .entry(activity.sport_type)
            .or_default()
            .add(activity);

        let weekday = activity.date.weekday().num_days_from_monday();
        stats.weekday[weekday as usize].totals.add(activity);

        let hour = activity.date.hour();
        let cell = heatmap
            .entry((weekday, hour))
            .or_insert_with(|| HeatmapCell::new(weekday, hour));
        cell.count += 1;
        cell.distance_km += activity.distance_km;
        cell.time_minutes += activity.moving_time_minutes;
        cell.activity_ids.push(activity.id.clone());

        block_counts[TimeOfDayBlock::for_hour(hour) as usize] += 1;
    }

    for bucket in &mut stats.weekday {
        bucket.finalize();
    }
    stats.heatmap = heatmap.into_values().collect();
    stats.most_active_day = most_active_day(&stats.weekday);
    stats.preferred_time = preferred_block(&block_counts);
    stats
}

fn most_active_day(weekday: &[WeekdayBucket; 7]) -> Option<u32> {
    if weekday.iter().all(|b| b.totals.count == 0) {
        return None;
    }
    let mut best = 0;
    for index in 1..7 {
        if weekday[index].totals.time_minutes > weekday[best].totals.time_minutes {
            best = index;
        }
    }
    Some(best as u32)
}

fn preferred_block(block_counts: &[u32; 5]) -> Option<TimeOfDayBlock> {
    if block_counts.iter().all(|&c| c == 0) {
        return None;
    }
    let mut best = 0;
    for index in 1..5 {
        if block_counts[index] > block_counts[best] {
            best = index;
        }
    }
    Some(TimeOfDayBlock::ALL[best])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_activity(
        id: &str,
        sport: SportType,
        y: i32,
        m: u32,
        d: u32,
        hour: u32,
        distance_km: f64,
        moving: f64,
    ) -> Activity {
        let date = NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        let mut activity = Activity::new(id, "Session", sport, date);
        activity.distance_km = distance_km;
        activity.moving_time_minutes = moving;
        activity.duration_minutes = moving;
        activity
    }

    #[test]
    fn test_empty_year_is_zero_filled() {
        let stats = compute_year_stats(&[], 2024);
        assert_eq!(stats.totals, PeriodTotals::default());
        assert_eq!(stats.monthly.len(), 12);
        assert!(stats.monthly.iter().all(|m| m.count == 0));
        assert!(stats.by_type.is_empty());
        assert!(stats.heatmap.is_empty());
        assert_eq!(stats.most_active_day, None);
        assert_eq!(stats.preferred_time, None);
    }

    #[test]
    fn test_month_buckets() {
        let activities = vec![
            make_activity("a1", SportType::Run, 2024, 1, 10, 8, 10.0, 50.0),
            make_activity("a2", SportType::Run, 2024, 1, 20, 8, 12.0, 60.0),
            make_activity("a3", SportType::Ride, 2024, 11, 3, 10, 40.0, 90.0),
        ];
        let stats = compute_year_stats(&activities, 2024);
        assert_eq!(stats.monthly[0].count, 2);
        assert!((stats.monthly[0].distance_km - 22.0).abs() < 1e-9);
        assert_eq!(stats.monthly[10].count, 1);
        assert_eq!(stats.monthly[5].count, 0);
        assert_eq!(stats.totals.count, 3);
    }

    #[test]
    fn test_year_boundary_activities_stay_in_their_year() {
        let late = make_activity("a1", SportType::Run, 2023, 12, 31, 23, 8.0, 40.0);
        let early = make_activity("a2", SportType::Run, 2024, 1, 1, 1, 8.0, 40.0);
        let activities = vec![late, early];

        let old_year = compute_year_stats(&activities, 2023);
        let new_year = compute_year_stats(&activities, 2024);
        assert_eq!(old_year.totals.count, 1);
        assert_eq!(new_year.totals.count, 1);
        assert_eq!(old_year.monthly[11].count, 1);
        assert_eq!(new_year.monthly[0].count, 1);
    }

    #[test]
    fn test_weekday_indexing_is_monday_first() {
        // 2024-06-03 is a Monday, 2024-06-09 a Sunday.
        let activities = vec![
            make_activity("mon", SportType::Run, 2024, 6, 3, 7, 10.0, 50.0),
            make_activity("sun", SportType::Run, 2024, 6, 9, 7, 10.0, 50.0),
        ];
        let stats = compute_year_stats(&activities, 2024);
        assert_eq!(stats.weekday[0].totals.count, 1);
        assert_eq!(stats.weekday[6].totals.count, 1);
        assert_eq!(stats.weekday[1].totals.count, 0);
    }

    #[test]
    fn test_weekday_averages() {
        let activities = vec![
            make_activity("a1", SportType::Run, 2024, 6, 3, 7, 10.0, 50.0),
            make_activity("a2", SportType::Run, 2024, 6, 10, 7, 20.0, 100.0),
        ];
        let stats = compute_year_stats(&activities, 2024);
        let monday = &stats.weekday[0];
        assert!((monday.avg_distance_km - 15.0).abs() < 1e-9);
        assert!((monday.avg_time_minutes - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_heatmap_cells_are_observed_only() {
        let activities = vec![
            make_activity("a1", SportType::Run, 2024, 6, 3, 7, 10.0, 50.0),
            make_activity("a2", SportType::Run, 2024, 6, 10, 7, 12.0, 55.0),
            make_activity("a3", SportType::Ride, 2024, 6, 4, 18, 40.0, 90.0),
        ];
        let stats = compute_year_stats(&activities, 2024);
        assert_eq!(stats.heatmap.len(), 2);

        let monday_morning = stats
            .heatmap
            .iter()
            .find(|c| c.weekday == 0 && c.hour == 7)
            .unwrap();
        assert_eq!(monday_morning.count, 2);
        assert_eq!(monday_morning.activity_ids, vec!["a1", "a2"]);
        assert!((monday_morning.distance_km - 22.0).abs() < 1e-9);
    }

    #[test]
    fn test_most_active_day_by_time_with_first_encounter_tie() {
        // Tuesday carries more time than Monday despite fewer activities;
        // ties fall back to the earlier weekday index.
        let activities = vec![
            make_activity("a1", SportType::Run, 2024, 6, 3, 7, 5.0, 30.0),
            make_activity("a2", SportType::Run, 2024, 6, 3, 18, 5.0, 30.0),
            make_activity("a3", SportType::Ride, 2024, 6, 4, 18, 80.0, 180.0),
        ];
        let stats = compute_year_stats(&activities, 2024);
        assert_eq!(stats.most_active_day, Some(1));

        let tied = vec![
            make_activity("b1", SportType::Run, 2024, 6, 5, 7, 5.0, 30.0),
            make_activity("b2", SportType::Run, 2024, 6, 8, 7, 5.0, 30.0),
        ];
        let stats = compute_year_stats(&tied, 2024);
        assert_eq!(stats.most_active_day, Some(2));
    }

    #[test]
    fn test_night_block_wraps_past_midnight() {
        assert_eq!(TimeOfDayBlock::for_hour(23), TimeOfDayBlock::Night);
        assert_eq!(TimeOfDayBlock::for_hour(4), TimeOfDayBlock::Night);
        assert_eq!(TimeOfDayBlock::for_hour(5), TimeOfDayBlock::EarlyMorning);
        assert_eq!(TimeOfDayBlock::for_hour(12), TimeOfDayBlock::Afternoon);
        assert_eq!(TimeOfDayBlock::for_hour(20), TimeOfDayBlock::Evening);
    }

    #[test]
    fn test_preferred_time_block() {
        let activities = vec![
            make_activity("a1", SportType::Run, 2024, 6, 3, 6, 5.0, 30.0),
            make_activity("a2", SportType::Run, 2024, 6, 5, 6, 5.0, 30.0),
            make_activity("a3", SportType::Run, 2024, 6, 7, 19, 5.0, 30.0),
        ];
        let stats = compute_year_stats(&activities, 2024);
        assert_eq!(stats.preferred_time, Some(TimeOfDayBlock::EarlyMorning));
    }

    #[test]
    fn test_by_type_buckets() {
        let activities = vec![
            make_activity("a1", SportType::Run, 2024, 6, 3, 7, 10.0, 50.0),
            make_activity("a2", SportType::Ride, 2024, 6, 4, 7, 40.0, 90.0),
            make_activity("a3", SportType::Ride, 2024, 6, 5, 7, 20.0, 45.0),
        ];
        let stats = compute_year_stats(&activities, 2024);
        assert_eq!(stats.by_type.get(&SportType::Run).unwrap().count, 1);
        let rides = stats.by_type.get(&SportType::Ride).unwrap();
        assert_eq!(rides.count, 2);
        assert!((rides.distance_km - 60.0).abs() < 1e-9);
    }
}
