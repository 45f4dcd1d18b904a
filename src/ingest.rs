//! Ingestion adapter for weekly fare-type ridership exports.
//!
//! Reads a CSV with a header row from a local file, a gzip-compressed file, or
//! an HTTP(S) URL and yields typed [`RawRecord`]s for the configured stations
//! whose period starts inside the configured window. Rows outside the window
//! are dropped on their start date alone, before their counts are read.
//! Count fields are normalized (thousands separators stripped) before parsing;
//! anything still unparseable is a fatal [`FlowError::DataFormat`].

use chrono::NaiveDate;
use csv::StringRecord;
use flate2::read::GzDecoder;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read};
use tracing::{debug, info};

use crate::config::FlowConfig;
use crate::error::{FlowError, Result};
use crate::model::{MonthKey, RawRecord};

// Two-digit years first: `%Y` would read "19" as year 19.
const DATE_FORMATS: &[&str] = &["%m/%d/%y", "%m/%d/%Y", "%Y-%m-%d"];

/// Opens `source` as a byte stream, decompressing `.gz` paths.
pub fn open_source(source: &str) -> Result<Box<dyn Read>> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let bytes = fetch_bytes(source)?;
        debug!(bytes = bytes.len(), "Ridership export downloaded");
        return Ok(Box::new(Cursor::new(bytes)));
    }

    let file = File::open(source).map_err(|e| FlowError::ingestion(source, e))?;
    if source.ends_with(".gz") {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    let resp = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| FlowError::ingestion(url, e))?;
    let bytes = resp.bytes().map_err(|e| FlowError::ingestion(url, e))?;
    Ok(bytes.to_vec())
}

/// Loads every record for the configured stations from `source`.
#[tracing::instrument(skip(config))]
pub fn load_records(source: &str, config: &FlowConfig) -> Result<Vec<RawRecord>> {
    let reader = open_source(source)?;
    read_records(reader, source, config)
}

/// Column positions resolved from the header row.
struct Columns {
    station: usize,
    start: usize,
    end: usize,
    total: usize,
    subcategory: usize,
}

impl Columns {
    fn resolve(headers: &StringRecord, origin: &str, config: &FlowConfig) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| FlowError::ingestion(origin, format!("missing column '{name}'")))
        };
        let ingest = &config.ingest;
        Ok(Self {
            station: find(&ingest.station_column)?,
            start: find(&ingest.start_date_column)?,
            end: find(&ingest.end_date_column)?,
            total: find(&ingest.total_column)?,
            subcategory: find(&ingest.subcategory_column)?,
        })
    }
}

/// Parses CSV rows from `reader`. `origin` names the source in errors.
pub fn read_records<R: Read>(
    reader: R,
    origin: &str,
    config: &FlowConfig,
) -> Result<Vec<RawRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| FlowError::ingestion(origin, e))?
        .clone();
    let columns = Columns::resolve(&headers, origin, config)?;
    let ingest = &config.ingest;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    let mut outside_window = 0usize;
    let mut per_station: BTreeMap<String, usize> = BTreeMap::new();

    for result in rdr.records() {
        let record = result.map_err(|e| FlowError::ingestion(origin, e))?;
        let row = record.position().map(|p| p.line()).unwrap_or_default();
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let station_id = field(columns.station);
        if config.direction_for_station(station_id).is_none() {
            skipped += 1;
            continue;
        }

        let period_start = parse_date(field(columns.start), row, &ingest.start_date_column)?;
        if !config.window.contains(MonthKey::from_date(period_start)) {
            outside_window += 1;
            continue;
        }

        let raw = RawRecord {
            row,
            station_id: station_id.to_string(),
            period_start,
            period_end: parse_date(field(columns.end), row, &ingest.end_date_column)?,
            total_count: parse_count(field(columns.total), row, &ingest.total_column)?,
            subcategory_count: parse_count(
                field(columns.subcategory),
                row,
                &ingest.subcategory_column,
            )?,
        };
        *per_station.entry(raw.station_id.clone()).or_default() += 1;
        records.push(raw);
    }

    for (station, count) in &per_station {
        let direction = config
            .direction_for_station(station)
            .map(|d| d.to_string())
            .unwrap_or_default();
        info!(station = %station, direction = %direction, weekly_records = count, "Station records loaded");
    }
    info!(
        origin,
        records = records.len(),
        skipped_other_stations = skipped,
        skipped_outside_window = outside_window,
        "Ingestion complete"
    );

    Ok(records)
}

/// Parses a ridership count such as `12,345`, `12345` or `12345.0`.
pub fn parse_count(raw: &str, row: u64, column: &str) -> Result<i64> {
    let invalid = || FlowError::DataFormat {
        row,
        column: column.to_string(),
        value: raw.to_string(),
        expected: "a non-negative whole number",
    };

    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Err(invalid());
    }

    let value = match cleaned.parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            let f = cleaned.parse::<f64>().map_err(|_| invalid())?;
            // i64::MAX as f64 rounds up to 2^63, which is already out of range.
            if !f.is_finite() || f.fract() != 0.0 || f.abs() >= i64::MAX as f64 {
                return Err(invalid());
            }
            f as i64
        }
    };

    if value < 0 {
        return Err(invalid());
    }
    Ok(value)
}

pub fn parse_date(raw: &str, row: u64, column: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| FlowError::DataFormat {
            row,
            column: column.to_string(),
            value: raw.to_string(),
            expected: "a date",
        })
}
