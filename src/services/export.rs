use crate::error::DexcomError;
use crate::models::readings::{Reading, format_timestamp, parse_timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    timestamp: String,
    value: i32,
}

/// Writes one `timestamp,value` row per reading, in the order given.
pub fn readings_to_csv(readings: &[Reading]) -> Result<String, DexcomError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for reading in readings {
        let timestamp = format_timestamp(&reading.timestamp)
            .map_err(|e| DexcomError::InvalidInput(format!("cannot format timestamp: {e}")))?;
        writer.serialize(CsvRow {
            timestamp,
            value: reading.value,
        })?;
    }
    // serialize() only emits the header with the first row
    if readings.is_empty() {
        writer.write_record(["timestamp", "value"])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DexcomError::Export(e.into_error().into()))?;

    String::from_utf8(bytes)
        .map_err(|e| DexcomError::InvalidInput(format!("export is not UTF-8: {e}")))
}

pub fn readings_from_csv(data: &str) -> Result<Vec<Reading>, DexcomError> {
    let mut reader = csv::Reader::from_reader(data.as_bytes());

    reader
        .deserialize::<CsvRow>()
        .map(|row| -> Result<Reading, DexcomError> {
            let row = row?;
            Ok(Reading {
                timestamp: parse_timestamp(&row.timestamp)?,
                value: row.value,
            })
        })
        .collect()
}
