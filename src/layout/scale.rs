//! Shared ridership → thickness normalization.
//!
//! One [`ScaleParameters`] is computed from both directions together. Using a
//! per-direction maximum would make equal ridership draw at different widths.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FlowError, Result};
use crate::model::MonthlySeries;

/// Half-thickness bounds of a band, in chart units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThicknessRange {
    pub min_thickness: f64,
    pub max_thickness: f64,
}

impl Default for ThicknessRange {
    fn default() -> Self {
        Self {
            min_thickness: 0.1,
            max_thickness: 2.0,
        }
    }
}

impl ThicknessRange {
    pub fn validate(&self) -> Result<()> {
        let ok = self.min_thickness.is_finite()
            && self.max_thickness.is_finite()
            && self.min_thickness >= 0.0
            && self.max_thickness >= self.min_thickness;
        if ok {
            Ok(())
        } else {
            Err(FlowError::Config(format!(
                "thickness range {}..{} must satisfy 0 <= min <= max",
                self.min_thickness, self.max_thickness
            )))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScaleParameters {
    pub max_total: i64,
    pub min_total: i64,
}

impl ScaleParameters {
    /// Min and max over every month of every series given.
    pub fn from_series(series: &[&MonthlySeries]) -> Self {
        let mut totals = series.iter().flat_map(|s| s.totals()).peekable();
        if totals.peek().is_none() {
            return Self {
                max_total: 0,
                min_total: 0,
            };
        }

        let (min_total, max_total) = totals.fold((i64::MAX, i64::MIN), |(lo, hi), t| {
            (lo.min(t), hi.max(t))
        });

        let scale = Self {
            max_total,
            min_total,
        };
        if scale.is_degenerate() {
            debug!("All totals are zero; every band falls back to min_thickness");
        }
        debug!(max_total, min_total, "Shared thickness scale");
        scale
    }

    /// True when no month carries ridership, so there is nothing to scale by.
    pub fn is_degenerate(&self) -> bool {
        self.max_total <= 0
    }

    /// `min + (max - min) * total / max_total`, or `min` for a degenerate scale.
    pub fn half_thickness(&self, total: i64, range: &ThicknessRange) -> f64 {
        if self.is_degenerate() {
            return range.min_thickness;
        }
        let normalized = total as f64 / self.max_total as f64;
        range.min_thickness + (range.max_thickness - range.min_thickness) * normalized
    }

    pub fn half_thicknesses(&self, series: &MonthlySeries, range: &ThicknessRange) -> Vec<f64> {
        series
            .totals()
            .map(|t| self.half_thickness(t, range))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Direction, MonthKey, MonthWindow, MonthlyAggregate};
    use approx::assert_relative_eq;

    fn series(direction: Direction, totals: &[i64]) -> MonthlySeries {
        let window = MonthWindow::new(MonthKey::january(2019), totals.len() as u32);
        let entries = window
            .keys()
            .zip(totals)
            .map(|(month, &total)| MonthlyAggregate {
                total,
                weekly_rows: 4,
                ..MonthlyAggregate::empty(month, direction)
            })
            .collect();
        MonthlySeries::new(direction, &window, entries).unwrap()
    }

    #[test]
    fn test_scale_spans_both_directions() {
        let a = series(Direction::Outbound, &[1000, 400, 300]);
        let b = series(Direction::Inbound, &[200, 1000, 50]);
        let scale = ScaleParameters::from_series(&[&a, &b]);
        assert_eq!(scale.max_total, 1000);
        assert_eq!(scale.min_total, 50);
    }

    #[test]
    fn test_max_total_reaches_max_thickness() {
        let scale = ScaleParameters {
            max_total: 1000,
            min_total: 0,
        };
        let range = ThicknessRange::default();
        assert_relative_eq!(scale.half_thickness(1000, &range), 2.0);
        assert_relative_eq!(scale.half_thickness(0, &range), 0.1);
        assert_relative_eq!(scale.half_thickness(500, &range), 0.1 + 1.9 * 0.5);
    }

    #[test]
    fn test_degenerate_scale_falls_back_to_min() {
        let a = series(Direction::Outbound, &[0, 0]);
        let b = series(Direction::Inbound, &[0, 0]);
        let scale = ScaleParameters::from_series(&[&a, &b]);
        assert!(scale.is_degenerate());
        let range = ThicknessRange::default();
        assert_eq!(scale.half_thicknesses(&a, &range), vec![0.1, 0.1]);
    }

    #[test]
    fn test_doubled_totals_double_thickness() {
        let a = series(Direction::Outbound, &[200, 800, 60, 0, 1000]);
        let b = series(Direction::Inbound, &[100, 400, 30, 0, 500]);
        let scale = ScaleParameters::from_series(&[&a, &b]);

        let exact = ThicknessRange {
            min_thickness: 0.0,
            max_thickness: 2.0,
        };
        let ha = scale.half_thicknesses(&a, &exact);
        let hb = scale.half_thicknesses(&b, &exact);
        for (x, y) in ha.iter().zip(&hb) {
            assert_eq!(*x, 2.0 * y);
        }

        let offset = ThicknessRange::default();
        let ha = scale.half_thicknesses(&a, &offset);
        let hb = scale.half_thicknesses(&b, &offset);
        for (x, y) in ha.iter().zip(&hb) {
            assert_relative_eq!(x - offset.min_thickness, 2.0 * (y - offset.min_thickness));
        }
    }

    #[test]
    fn test_empty_input_is_degenerate() {
        let scale = ScaleParameters::from_series(&[]);
        assert!(scale.is_degenerate());
    }

    #[test]
    fn test_invalid_range_rejected() {
        let range = ThicknessRange {
            min_thickness: 3.0,
            max_thickness: 2.0,
        };
        assert!(range.validate().is_err());
    }
}
