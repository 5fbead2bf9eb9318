use crate::error::DexcomError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::{format_description, time};
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime};

pub const LOW_THRESHOLD_MG_DL: i32 = 70;
pub const HIGH_THRESHOLD_MG_DL: i32 = 180;

const SECONDS_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
const SUBSECOND_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");
const PARSE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
);
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Formats a reading timestamp the way the readings endpoint and the CSV
/// export expect it. Sub-second precision is written only when present.
pub fn format_timestamp(ts: &PrimitiveDateTime) -> Result<String, time::error::Format> {
    if ts.nanosecond() == 0 {
        ts.format(SECONDS_FORMAT)
    } else {
        ts.format(SUBSECOND_FORMAT)
    }
}

/// Accepts naive ISO-8601 timestamps with optional fractional seconds. A
/// trailing UTC offset is dropped and the wall-clock value kept.
pub fn parse_timestamp(raw: &str) -> Result<PrimitiveDateTime, DexcomError> {
    let raw = raw.trim();
    PrimitiveDateTime::parse(raw, PARSE_FORMAT)
        .or_else(|_| {
            OffsetDateTime::parse(raw, &Rfc3339)
                .map(|dt| PrimitiveDateTime::new(dt.date(), dt.time()))
        })
        .map_err(|e| DexcomError::InvalidInput(format!("bad timestamp {raw:?}: {e}")))
}

pub fn parse_date(raw: &str) -> Result<Date, DexcomError> {
    Date::parse(raw.trim(), DATE_FORMAT)
        .map_err(|e| DexcomError::InvalidInput(format!("bad date {raw:?}: {e}")))
}

pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

mod timestamp_serde {
    use super::*;

    pub fn serialize<S: Serializer>(ts: &PrimitiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        let formatted = format_timestamp(ts).map_err(serde::ser::Error::custom)?;
        s.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<PrimitiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlucoseRange {
    Low,
    InRange,
    High,
}

impl GlucoseRange {
    pub fn classify(value: i32) -> Self {
        if value < LOW_THRESHOLD_MG_DL {
            GlucoseRange::Low
        } else if value > HIGH_THRESHOLD_MG_DL {
            GlucoseRange::High
        } else {
            GlucoseRange::InRange
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            GlucoseRange::Low => "red",
            GlucoseRange::InRange => "green",
            GlucoseRange::High => "orange",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GlucoseRange::Low => "Low",
            GlucoseRange::InRange => "In range",
            GlucoseRange::High => "High",
        }
    }
}

/// A single estimated glucose value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    #[serde(with = "timestamp_serde")]
    pub timestamp: PrimitiveDateTime,
    pub value: i32,
}

impl Reading {
    pub fn range(&self) -> GlucoseRange {
        GlucoseRange::classify(self.value)
    }
}

/// Inclusive time window for a readings request. `start <= end` always holds
/// for values built through the constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeQuery {
    #[serde(with = "timestamp_serde")]
    start: PrimitiveDateTime,
    #[serde(with = "timestamp_serde")]
    end: PrimitiveDateTime,
}

impl RangeQuery {
    pub fn new(start: PrimitiveDateTime, end: PrimitiveDateTime) -> Result<Self, DexcomError> {
        if start > end {
            return Err(DexcomError::InvalidRange);
        }
        Ok(Self { start, end })
    }

    /// Whole calendar days, from midnight on `start` to the last second of `end`.
    pub fn for_dates(start: Date, end: Date) -> Result<Self, DexcomError> {
        Self::new(
            PrimitiveDateTime::new(start, time!(00:00:00)),
            PrimitiveDateTime::new(end, time!(23:59:59)),
        )
    }

    /// Yesterday through today.
    pub fn default_for(today: Date) -> Self {
        let start = today.checked_sub(Duration::days(1)).unwrap_or(today);
        Self {
            start: PrimitiveDateTime::new(start, time!(00:00:00)),
            end: PrimitiveDateTime::new(today, time!(23:59:59)),
        }
    }

    pub fn last_days(today: Date, days: i64) -> Self {
        let start = today.checked_sub(Duration::days(days)).unwrap_or(today);
        Self {
            start: PrimitiveDateTime::new(start, time!(00:00:00)),
            end: PrimitiveDateTime::new(today, time!(23:59:59)),
        }
    }

    pub fn start(&self) -> PrimitiveDateTime {
        self.start
    }

    pub fn end(&self) -> PrimitiveDateTime {
        self.end
    }

    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    pub fn export_filename(&self) -> String {
        format!(
            "glucose_data_{}_to_{}.csv",
            format_date(self.start.date()),
            format_date(self.end.date())
        )
    }
}

/// Readings from the most recent successful load, with the window they cover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedReadings {
    pub range: RangeQuery,
    pub readings: Vec<Reading>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EgvRecord {
    pub display_time: String,
    pub value: i32,
}

#[derive(Debug, Deserialize)]
pub struct EgvsResponse {
    pub egvs: Vec<EgvRecord>,
}

impl TryFrom<EgvRecord> for Reading {
    type Error = DexcomError;

    fn try_from(record: EgvRecord) -> Result<Self, Self::Error> {
        Ok(Reading {
            timestamp: parse_timestamp(&record.display_time)?,
            value: record.value,
        })
    }
}
