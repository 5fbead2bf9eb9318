use crate::models::readings::{
    GlucoseRange, HIGH_THRESHOLD_MG_DL, LOW_THRESHOLD_MG_DL, Reading,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    #[serde(flatten)]
    pub reading: Reading,
    pub range: GlucoseRange,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub value: i32,
    pub label: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetBand {
    pub low: i32,
    pub high: i32,
    pub label: &'static str,
    pub fill: &'static str,
    pub opacity: f64,
}

/// Everything the page needs to draw the glucose chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub points: Vec<ChartPoint>,
    pub reference_lines: [ReferenceLine; 2],
    pub target_band: TargetBand,
}

/// Readings in display order. The sort is stable, so readings sharing a
/// timestamp keep their source order.
pub fn sorted_readings(readings: &[Reading]) -> Vec<Reading> {
    let mut sorted = readings.to_vec();
    sorted.sort_by_key(|r| r.timestamp);
    sorted
}

pub fn to_chart_series(readings: &[Reading]) -> ChartSeries {
    let points = sorted_readings(readings)
        .into_iter()
        .map(|reading| {
            let range = reading.range();
            ChartPoint {
                reading,
                range,
                color: range.color(),
            }
        })
        .collect();

    ChartSeries {
        points,
        reference_lines: [
            ReferenceLine {
                value: LOW_THRESHOLD_MG_DL,
                label: "Low (70 mg/dL)",
                color: "red",
            },
            ReferenceLine {
                value: HIGH_THRESHOLD_MG_DL,
                label: "High (180 mg/dL)",
                color: "orange",
            },
        ],
        target_band: TargetBand {
            low: LOW_THRESHOLD_MG_DL,
            high: HIGH_THRESHOLD_MG_DL,
            label: "Target Range",
            fill: "lightgreen",
            opacity: 0.2,
        },
    }
}
