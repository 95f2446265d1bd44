//! Bucket boundary calculation
//!
//! Boundaries split an observed `[min, max]` range into evenly spaced
//! buckets. Every returned list is strictly ascending; a single-element list
//! means the range is degenerate and callers fall back to plain grouping.

use crate::options::DEFAULT_BUCKET_STEPS;
use chrono::{DateTime, Duration, NaiveDate};

/// Offset that makes the lowest boundary exclusive of `min` and the highest
/// exclusive of `max`
pub const EPSILON: f64 = 1e-5;

/// Edge offset for a range: `EPSILON`, widened to a few ULPs of the larger
/// magnitude once `EPSILON` no longer changes the bound
pub fn edge_offset(min: f64, max: f64) -> f64 {
    EPSILON.max(min.abs().max(max.abs()) * f64::EPSILON * 4.0)
}

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Numeric boundaries over `DEFAULT_BUCKET_STEPS` steps
pub fn boundaries_for_number(min: f64, max: f64) -> Option<Vec<f64>> {
    boundaries_for_number_in_steps(min, max, DEFAULT_BUCKET_STEPS)
}

/// Numeric boundaries: `min - edge_offset`, then every `step` rounded to
/// seven decimals while below `max`, then `max + edge_offset`
pub fn boundaries_for_number_in_steps(min: f64, max: f64, steps: usize) -> Option<Vec<f64>> {
    if min.is_nan() || max.is_nan() || max < min {
        return None;
    }
    if min == max {
        return Some(vec![min]);
    }

    let steps = steps.max(1);
    let offset = edge_offset(min, max);
    let lower = min - offset;
    let step = (max - lower) / steps as f64;

    let mut boundaries: Vec<f64> = Vec::with_capacity(steps + 2);
    // Rounding must not pull the first edge back onto `min`.
    let first = round7(lower);
    boundaries.push(if first < min { first } else { lower });
    for i in 1..=steps {
        let boundary = round7(lower + step * i as f64);
        if boundary >= max {
            break;
        }
        push_ascending(&mut boundaries, boundary);
    }
    push_ascending(&mut boundaries, max + offset);
    Some(boundaries)
}

fn round7(value: f64) -> f64 {
    (value * 1e7).round() / 1e7
}

fn push_ascending(boundaries: &mut Vec<f64>, value: f64) {
    if boundaries.last().is_none_or(|last| value > *last) {
        boundaries.push(value);
    }
}

/// Date boundaries over `DEFAULT_BUCKET_STEPS` steps
pub fn boundaries_for_date(min: &str, max: &str) -> Option<Vec<String>> {
    boundaries_for_date_in_steps(min, max, DEFAULT_BUCKET_STEPS)
}

/// Day-precision boundaries from one day before `min` to one day after `max`
///
/// Accepts `YYYY-MM-DD` dates and RFC 3339 timestamps; returns `None` when
/// either bound is empty or unparseable.
pub fn boundaries_for_date_in_steps(min: &str, max: &str, steps: usize) -> Option<Vec<String>> {
    let min = parse_day(min)?;
    let max = parse_day(max)?;
    if max < min {
        return None;
    }
    if min == max {
        return Some(vec![format_day(min)]);
    }

    let start = min - Duration::days(1);
    let end = max + Duration::days(1);
    let days = (end - start).num_days();
    let step = (days / days.min(steps.max(1) as i64)).max(1);

    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        dates.push(current);
        current += Duration::days(step);
    }
    dates.push(end);
    dates.sort();
    dates.dedup();

    Some(dates.into_iter().map(format_day).collect())
}

/// Parse the day of a `YYYY-MM-DD` date or an RFC 3339 timestamp
pub fn parse_day(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.date_naive());
    }
    value
        .get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, DATE_FORMAT).ok())
}

fn format_day(day: NaiveDate) -> String {
    day.format(DATE_FORMAT).to_string()
}
