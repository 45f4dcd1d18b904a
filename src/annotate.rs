//! Literal ridership labels for a handful of chosen months.

use serde::{Deserialize, Serialize};

use crate::config::{AnnotationConfig, FlowConfig};
use crate::layout::{FlowBands, Point};
use crate::model::{Direction, MonthlySeries};

/// Which side of its band a label sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Above,
    Below,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueLabel {
    pub time_step: u32,
    pub direction: Direction,
    pub value: i64,
    pub text: String,
    pub anchor: Point,
    pub placement: Placement,
    pub color_token: String,
}

pub struct AnnotationSelector {
    steps: Vec<u32>,
    offset: f64,
}

impl AnnotationSelector {
    pub fn new(config: &AnnotationConfig) -> Self {
        Self {
            steps: config.steps.clone(),
            offset: config.offset,
        }
    }

    /// Labels for each configured step and direction, skipping zero totals.
    pub fn select(
        &self,
        series: &[&MonthlySeries],
        bands: &FlowBands,
        config: &FlowConfig,
    ) -> Vec<ValueLabel> {
        let mut labels = Vec::new();

        for &step in &self.steps {
            for s in series {
                let Some(month) = s.at_step(step) else {
                    continue;
                };
                if month.total == 0 {
                    continue;
                }
                let Some(profile) = bands.profile(s.direction()) else {
                    continue;
                };

                let i = (step - 1) as usize;
                let style = config.direction(s.direction());
                let y = match style.label_placement {
                    Placement::Above => {
                        profile.centerline[i] + profile.half_thickness[i] + self.offset
                    }
                    Placement::Below => {
                        profile.centerline[i] - profile.half_thickness[i] - self.offset
                    }
                };

                labels.push(ValueLabel {
                    time_step: step,
                    direction: s.direction(),
                    value: month.total,
                    text: format_thousands(month.total),
                    anchor: Point {
                        x: profile.x[i],
                        y,
                    },
                    placement: style.label_placement,
                    color_token: style.total_color.clone(),
                });
            }
        }

        labels
    }
}

/// `1234567` → `"1,234,567"`.
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
