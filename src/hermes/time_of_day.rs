//! Bell-curve time-of-day boost with wraparound at midnight.

use chrono::{DateTime, TimeZone, Timelike};

const HOURS_PER_DAY: f64 = 24.0;

/// Shortest distance between two hours on the 24h clock.
pub fn circular_hour_distance(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs();
    diff.min(HOURS_PER_DAY - diff)
}

/// `max_effect * e^(-aggression * d^2)` where `d` is the circular hour distance.
///
/// Larger `aggression_factor` values narrow the peak. Hours are not wrapped
/// here; callers normalize through `Hour` first.
pub fn boost_score(max_effect: f64, aggression_factor: f64, current_hour: f64, optimal_hour: f64) -> f64 {
    let hour_diff = circular_hour_distance(current_hour, optimal_hour);
    max_effect * (-aggression_factor * hour_diff.powi(2)).exp()
}

/// Fractional hour of day, e.g. 21:30 -> 21.5.
pub fn hour_of_day<Tz: TimeZone>(dt: &DateTime<Tz>) -> f64 {
    dt.hour() as f64 + dt.minute() as f64 / 60.0 + dt.second() as f64 / 3600.0
}
