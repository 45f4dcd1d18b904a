//! Time-axis labels aligned to the band x positions.

use serde::Serialize;

use crate::model::MonthWindow;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTick {
    pub step: u32,
    pub x: f64,
    pub label: &'static str,
}

/// One calendar year's extent along the axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSpan {
    pub year: i32,
    pub first_step: u32,
    pub last_step: u32,
    pub center_x: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisLayout {
    pub month_ticks: Vec<MonthTick>,
    pub years: Vec<YearSpan>,
}

/// Ticks every other month from the first step, plus one span per year.
pub fn axis_layout(window: &MonthWindow) -> AxisLayout {
    let mut month_ticks = Vec::new();
    let mut years: Vec<YearSpan> = Vec::new();

    for (i, key) in window.keys().enumerate() {
        let step = i as u32 + 1;
        if i % 2 == 0 {
            month_ticks.push(MonthTick {
                step,
                x: f64::from(step),
                label: key.abbreviation(),
            });
        }

        match years.last_mut() {
            Some(span) if span.year == key.year() => span.last_step = step,
            _ => years.push(YearSpan {
                year: key.year(),
                first_step: step,
                last_step: step,
                center_x: 0.0,
            }),
        }
    }

    for span in &mut years {
        span.center_x = f64::from(span.first_step + span.last_step) / 2.0;
    }

    AxisLayout { month_ticks, years }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MonthKey;

    #[test]
    fn test_reference_window_axis() {
        let axis = axis_layout(&MonthWindow::new(MonthKey::january(2019), 24));

        assert_eq!(axis.month_ticks.len(), 12);
        let first: Vec<_> = axis.month_ticks.iter().take(6).map(|t| t.label).collect();
        assert_eq!(first, vec!["Jan", "Mar", "May", "Jul", "Sep", "Nov"]);
        assert_eq!(axis.month_ticks[6].step, 13);

        assert_eq!(axis.years.len(), 2);
        assert_eq!(axis.years[0].center_x, 6.5);
        assert_eq!(axis.years[1].year, 2020);
        assert_eq!(axis.years[1].first_step, 13);
        assert_eq!(axis.years[1].center_x, 18.5);
    }

    #[test]
    fn test_partial_years() {
        let start: MonthKey = "2019-11".parse().unwrap();
        let axis = axis_layout(&MonthWindow::new(start, 4));
        assert_eq!(axis.years.len(), 2);
        assert_eq!((axis.years[0].first_step, axis.years[0].last_step), (1, 2));
        assert_eq!((axis.years[1].first_step, axis.years[1].last_step), (3, 4));
        assert_eq!(axis.month_ticks[1].label, "Jan");
    }
}
