//! Output formatting and persistence for flow charts.
//!
//! Supports pretty-printing, JSON chart plans for the renderer, and CSV export
//! of the monthly series. Files are written to a temporary sibling first and
//! renamed into place, so a failed write never leaves a partial file.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::model::{MonthKey, MonthlySeries};
use crate::pipeline::FlowChart;
use crate::timeline::TimelineEntry;

/// Logs the chart using Rust's debug pretty-print format.
pub fn print_pretty(chart: &FlowChart) {
    debug!("{:#?}", chart);
}

/// Logs the chart as pretty-printed JSON.
pub fn print_json(chart: &FlowChart) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(chart)?);
    Ok(())
}

/// Logs one line per timeline step.
pub fn print_timeline(entries: &[TimelineEntry]) {
    for e in entries {
        info!(
            step = e.time_step,
            label = %e.label,
            category = %e.category,
            color = %e.color_token,
            neutral = e.neutral,
            "Timeline"
        );
    }
}

/// Writes the chart plan as pretty JSON to `path`.
pub fn write_chart_json(path: &str, chart: &FlowChart) -> Result<()> {
    let body = serde_json::to_vec_pretty(chart)?;
    write_atomically(Path::new(path), &body)?;
    info!(path, bytes = body.len(), "Chart plan written");
    Ok(())
}

/// One CSV row of the monthly export.
#[derive(Debug, Serialize)]
struct SeriesRow<'a> {
    month: MonthKey,
    direction: &'a str,
    station_id: &'a str,
    total: i64,
    subcategory: i64,
    complement: i64,
    weekly_rows: usize,
    observed: bool,
}

/// Writes both series to a CSV at `path`, one row per (month, direction).
///
/// `stations` pairs each series with its source station identifier.
pub fn write_series_csv(path: &str, series: &[(&MonthlySeries, &str)]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());

    for (s, station_id) in series {
        let direction = s.direction().to_string();
        for m in s.entries() {
            writer.serialize(SeriesRow {
                month: m.month,
                direction: &direction,
                station_id,
                total: m.total,
                subcategory: m.subcategory_amount,
                complement: m.complement_amount,
                weekly_rows: m.weekly_rows,
                observed: m.is_observed(),
            })?;
        }
    }

    let body = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("CSV buffer flush failed: {e}"))?;
    write_atomically(Path::new(path), &body)?;
    info!(path, "Monthly series written");
    Ok(())
}

fn write_atomically(path: &Path, body: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create directory {}", parent.display()))?;
    }

    let mut tmp = PathBuf::from(path);
    tmp.as_mut_os_string().push(".tmp");
    debug!(tmp = %tmp.display(), "Writing temporary file");

    fs::write(&tmp, body).with_context(|| format!("cannot write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("cannot move {} into place", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlowConfig;
    use crate::model::{Direction, RawRecord};
    use crate::pipeline::build_chart;
    use chrono::NaiveDate;
    use std::env;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn chart() -> FlowChart {
        let start = NaiveDate::from_ymd_opt(2019, 1, 5).unwrap();
        let records = vec![RawRecord {
            row: 2,
            station_id: "R468".to_string(),
            period_start: start,
            period_end: NaiveDate::from_ymd_opt(2019, 1, 11).unwrap(),
            total_count: 5000,
            subcategory_count: 1200,
        }];
        build_chart(&records, &FlowConfig::default()).unwrap()
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&chart());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&chart()).unwrap();
    }

    #[test]
    fn test_write_chart_json_round_trips_as_json() {
        let path = temp_path("ridership_flow_test_chart.json");
        let _ = fs::remove_file(&path);

        write_chart_json(&path, &chart()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["bands"]["bands"].as_array().unwrap().len(), 4);
        assert!(!Path::new(&format!("{path}.tmp")).exists());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_series_csv_has_row_per_month_and_direction() {
        let path = temp_path("ridership_flow_test_series.csv");
        let _ = fs::remove_file(&path);

        let c = chart();
        write_series_csv(
            &path,
            &[
                (c.series(Direction::Outbound), "R468"),
                (c.series(Direction::Inbound), "R469"),
            ],
        )
        .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        // 1 header + 24 months x 2 directions
        assert_eq!(lines.len(), 49);
        assert!(lines[0].starts_with("month,direction,station_id,total"));
        assert_eq!(lines[1], "2019-01,outbound,R468,5000,1200,3800,1,true");

        fs::remove_file(&path).unwrap();
    }
}
