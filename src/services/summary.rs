use crate::models::readings::{GlucoseRange, Reading};
use serde::Serialize;

/// Aggregate statistics over a set of readings. The optional fields are
/// `None` for an empty set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlucoseSummary {
    pub count: usize,
    pub average: Option<f64>,
    pub minimum: Option<i32>,
    pub maximum: Option<i32>,
    pub percent_in_range: f64,
}

pub fn summarize(readings: &[Reading]) -> GlucoseSummary {
    let count = readings.len();
    if count == 0 {
        return GlucoseSummary {
            count,
            average: None,
            minimum: None,
            maximum: None,
            percent_in_range: 0.0,
        };
    }

    let total: i64 = readings.iter().map(|r| i64::from(r.value)).sum();
    let in_range = readings
        .iter()
        .filter(|r| r.range() == GlucoseRange::InRange)
        .count();

    GlucoseSummary {
        count,
        average: Some(round_one_decimal(total as f64 / count as f64)),
        minimum: readings.iter().map(|r| r.value).min(),
        maximum: readings.iter().map(|r| r.value).max(),
        percent_in_range: round_one_decimal(100.0 * in_range as f64 / count as f64),
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
