//! Non-fatal data-quality diagnostics.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use tracing::warn;

use crate::model::{Direction, MonthKey};

/// A finding that does not stop the run. The monthly totals are still
/// produced from whatever rows exist.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityWarning {
    /// The sub-category column summed to more than the total for the month.
    SubcategoryExceedsTotal {
        month: MonthKey,
        direction: Direction,
        total: i64,
        subcategory_amount: i64,
    },
    /// A month had a weekly row count outside the expected cadence.
    IrregularCadence {
        month: MonthKey,
        direction: Direction,
        weekly_rows: usize,
        expected_min: usize,
        expected_max: usize,
    },
    /// No rows at all; the month was filled with zeros.
    MissingMonth { month: MonthKey, direction: Direction },
    /// A record whose period ends before it starts.
    InvertedPeriod {
        row: u64,
        station_id: String,
        period_start: NaiveDate,
        period_end: NaiveDate,
    },
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQualityWarning::SubcategoryExceedsTotal {
                month,
                direction,
                total,
                subcategory_amount,
            } => write!(
                f,
                "{month} {direction}: sub-category {subcategory_amount} exceeds total {total}"
            ),
            DataQualityWarning::IrregularCadence {
                month,
                direction,
                weekly_rows,
                expected_min,
                expected_max,
            } => write!(
                f,
                "{month} {direction}: {weekly_rows} weekly rows, expected {expected_min}-{expected_max}"
            ),
            DataQualityWarning::MissingMonth { month, direction } => {
                write!(f, "{month} {direction}: no records, filled with zero")
            }
            DataQualityWarning::InvertedPeriod {
                row,
                station_id,
                period_start,
                period_end,
            } => write!(
                f,
                "row {row} ({station_id}): period ends {period_end} before it starts {period_start}"
            ),
        }
    }
}

/// Collects warnings for one run, logging each as it arrives.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<DataQualityWarning>,
}

impl Diagnostics {
    pub fn push(&mut self, warning: DataQualityWarning) {
        warn!(warning = %warning, "Data quality warning");
        self.warnings.push(warning);
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<DataQualityWarning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let w = DataQualityWarning::MissingMonth {
            month: "2020-04".parse().unwrap(),
            direction: Direction::Inbound,
        };
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["kind"], "missing_month");
        assert_eq!(json["month"], "2020-04");
        assert_eq!(json["direction"], "inbound");
    }

    #[test]
    fn test_display_mentions_month_and_direction() {
        let w = DataQualityWarning::SubcategoryExceedsTotal {
            month: "2019-06".parse().unwrap(),
            direction: Direction::Outbound,
            total: 10,
            subcategory_amount: 12,
        };
        assert_eq!(
            w.to_string(),
            "2019-06 outbound: sub-category 12 exceeds total 10"
        );
    }

    #[test]
    fn test_diagnostics_collects_in_order() {
        let mut d = Diagnostics::default();
        assert!(d.is_empty());
        d.push(DataQualityWarning::MissingMonth {
            month: "2019-01".parse().unwrap(),
            direction: Direction::Outbound,
        });
        d.push(DataQualityWarning::MissingMonth {
            month: "2019-02".parse().unwrap(),
            direction: Direction::Outbound,
        });
        assert_eq!(d.len(), 2);
        let warnings = d.into_warnings();
        assert!(matches!(
            &warnings[1],
            DataQualityWarning::MissingMonth { month, .. } if month.month() == 2
        ));
    }
}
