use std::collections::HashMap;
use tracing::{debug, info};

use crate::aggregate::quality::{DataQualityWarning, Diagnostics};
use crate::aggregate::split::split_month;
use crate::config::FlowConfig;
use crate::error::{FlowError, Result};
use crate::model::{Direction, MonthKey, MonthlySeries, RawRecord};

/// Both directions' monthly series plus the warnings raised building them.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub outbound: MonthlySeries,
    pub inbound: MonthlySeries,
    pub warnings: Vec<DataQualityWarning>,
}

impl Aggregation {
    pub fn series(&self, direction: Direction) -> &MonthlySeries {
        match direction {
            Direction::Outbound => &self.outbound,
            Direction::Inbound => &self.inbound,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Bucket {
    total: i64,
    subcategory: i64,
    rows: usize,
}

impl Bucket {
    fn add(&mut self, record: &RawRecord, direction: Direction, month: MonthKey) -> Result<()> {
        let overflow = |measure| FlowError::CountOverflow {
            row: record.row,
            month: month.to_string(),
            direction: direction.to_string(),
            measure,
        };
        self.total = self
            .total
            .checked_add(record.total_count)
            .ok_or_else(|| overflow("total"))?;
        self.subcategory = self
            .subcategory
            .checked_add(record.subcategory_count)
            .ok_or_else(|| overflow("sub-category"))?;
        self.rows += 1;
        Ok(())
    }
}

/// Sums weekly records into one aggregate per (month, direction) over the
/// configured window.
///
/// Rows from other stations or outside the window are dropped before
/// grouping. Weekly rows are always summed, never averaged, so a five-week
/// month reports its full total. Months without rows are filled with zeros
/// and reported as [`DataQualityWarning::MissingMonth`].
pub fn aggregate_monthly(records: &[RawRecord], config: &FlowConfig) -> Result<Aggregation> {
    let window = &config.window;
    let mut diagnostics = Diagnostics::default();
    let mut buckets: HashMap<(Direction, MonthKey), Bucket> = HashMap::new();
    let mut outside_window = 0usize;
    let mut unknown_station = 0usize;

    for record in records {
        let Some(direction) = config.direction_for_station(&record.station_id) else {
            unknown_station += 1;
            continue;
        };
        let month = record.month_key();
        if !window.contains(month) {
            outside_window += 1;
            continue;
        }
        if record.period_end < record.period_start {
            diagnostics.push(DataQualityWarning::InvertedPeriod {
                row: record.row,
                station_id: record.station_id.clone(),
                period_start: record.period_start,
                period_end: record.period_end,
            });
        }

        buckets
            .entry((direction, month))
            .or_default()
            .add(record, direction, month)?;
    }

    debug!(outside_window, unknown_station, "Records excluded before grouping");

    let weekly_rows: Vec<usize> = buckets.values().map(|b| b.rows).collect();
    if !weekly_rows.is_empty() {
        let avg = weekly_rows.iter().sum::<usize>() as f64 / weekly_rows.len() as f64;
        info!(
            observed_months = weekly_rows.len(),
            avg_weekly_rows = avg,
            min_weekly_rows = weekly_rows.iter().min().copied().unwrap_or_default(),
            max_weekly_rows = weekly_rows.iter().max().copied().unwrap_or_default(),
            "Weekly records per month"
        );
    }

    let mut build = |direction: Direction| -> Result<MonthlySeries> {
        let mut entries = Vec::with_capacity(window.len());
        for month in window.keys() {
            let bucket = buckets.get(&(direction, month)).copied().unwrap_or_default();

            if bucket.rows == 0 {
                diagnostics.push(DataQualityWarning::MissingMonth { month, direction });
            } else if !config.cadence.accepts(bucket.rows) {
                diagnostics.push(DataQualityWarning::IrregularCadence {
                    month,
                    direction,
                    weekly_rows: bucket.rows,
                    expected_min: config.cadence.min_weeks,
                    expected_max: config.cadence.max_weeks,
                });
            }

            entries.push(split_month(
                month,
                direction,
                bucket.total,
                bucket.subcategory,
                bucket.rows,
                &mut diagnostics,
            ));
        }
        MonthlySeries::new(direction, window, entries)
    };

    let outbound = build(Direction::Outbound)?;
    let inbound = build(Direction::Inbound)?;

    info!(
        first = %window.start,
        last = ?window.last(),
        months = window.len(),
        "Monthly aggregation complete"
    );
    if !diagnostics.is_empty() {
        info!(warnings = diagnostics.len(), "Aggregation raised data quality warnings");
    }

    Ok(Aggregation {
        outbound,
        inbound,
        warnings: diagnostics.into_warnings(),
    })
}
