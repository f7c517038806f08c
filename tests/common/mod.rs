//! Shared builders for the integration tests.

use chrono::NaiveDate;
use highlight_engine::{Activity, SportType};

/// Build an activity at a specific date and hour with the given distance and
/// moving time. Elapsed time equals moving time unless a test adjusts it.
#[allow(dead_code)]
pub fn activity(
    id: &str,
    name: &str,
    sport: SportType,
    (year, month, day): (i32, u32, u32),
    (hour, minute): (u32, u32),
    distance_km: f64,
    moving_minutes: f64,
) -> Activity {
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .expect("valid test date")
        .and_hms_opt(hour, minute, 0)
        .expect("valid test time");
    let mut a = Activity::new(id, name, sport, date);
    a.distance_km = distance_km;
    a.moving_time_minutes = moving_minutes;
    a.duration_minutes = moving_minutes;
    a
}

/// A run on a fixed reference day, varying only distance and time.
#[allow(dead_code)]
pub fn run(id: &str, name: &str, day: u32, distance_km: f64, moving_minutes: f64) -> Activity {
    activity(
        id,
        name,
        SportType::Run,
        (2024, 3, day),
        (9, 0),
        distance_km,
        moving_minutes,
    )
}
