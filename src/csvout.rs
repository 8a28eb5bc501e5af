//! CSV rendering of a result set for download.

use crate::upstream::StudentResult;
use serde::Serialize;

const HEADER: [&str; 7] = [
    "timestamp",
    "latitude",
    "longitude",
    "pmTen",
    "pmTwoFive",
    "humidity",
    "temperature",
];

// Serialized with the csv writer so floats come out in their shortest
// round-trippable form.
#[derive(Debug, Serialize)]
struct Row<'a> {
    timestamp: &'a str,
    latitude: f64,
    longitude: f64,
    pm_ten: f64,
    pm_two_five: f64,
    humidity: f64,
    temperature: f64,
}

/// Render the result set as a CSV document: header row plus one row per
/// record, upstream order preserved.
pub fn write_csv(result: &StudentResult) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(HEADER)?;
    for record in &result.data {
        let m = &record.attributes;
        writer.serialize(Row {
            timestamp: &m.date,
            latitude: m.latitude,
            longitude: m.longitude,
            pm_ten: m.pm_ten,
            pm_two_five: m.pm_two_five,
            humidity: m.humidity,
            temperature: m.temperature,
        })?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}
