//! Sub-category split of a monthly total.
//!
//! The sub-category amount is already summed from its own source column; this
//! step only derives the complement and flags inconsistent months. Values are
//! never clamped, so a month where the sub-category exceeds the total keeps a
//! negative complement and a warning.

use crate::aggregate::quality::{DataQualityWarning, Diagnostics};
use crate::model::{Direction, MonthKey, MonthlyAggregate};

pub fn split_month(
    month: MonthKey,
    direction: Direction,
    total: i64,
    subcategory_amount: i64,
    weekly_rows: usize,
    diagnostics: &mut Diagnostics,
) -> MonthlyAggregate {
    if subcategory_amount > total {
        diagnostics.push(DataQualityWarning::SubcategoryExceedsTotal {
            month,
            direction,
            total,
            subcategory_amount,
        });
    }

    MonthlyAggregate {
        month,
        direction,
        total,
        subcategory_amount,
        complement_amount: total - subcategory_amount,
        weekly_rows,
    }
}

impl MonthlyAggregate {
    /// Share of the total in the sub-category; 0.0 for an empty month.
    pub fn subcategory_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.subcategory_amount as f64 / self.total as f64
        }
    }
}
