//! Run configuration for the flow pipeline.
//!
//! Stored as a JSON object on disk. Every field is optional; anything left out
//! falls back to the reference chart (Roosevelt Island Tramway, 2019-2020):
//! ```json
//! {
//!   "window": { "start": "2019-01", "months": 24 },
//!   "outbound": { "station_id": "R468", "baseline": 8.0 },
//!   "inbound": { "station_id": "R469", "baseline": 2.0 },
//!   "thickness": { "min_thickness": 0.1, "max_thickness": 2.0 },
//!   "annotations": { "steps": [3, 7, 11, 15, 16, 19, 23] }
//! }
//! ```
//!
//! When `window` is given but `timeline` or `annotations` is not, the default
//! event table and label steps are trimmed to the window. Steps listed
//! explicitly must all fall inside it.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::annotate::Placement;
use crate::error::{FlowError, Result};
use crate::layout::ThicknessRange;
use crate::model::{Direction, MonthKey, MonthWindow};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub window: MonthWindow,
    pub ingest: IngestConfig,
    pub outbound: DirectionConfig,
    pub inbound: DirectionConfig,
    pub thickness: ThicknessRange,
    /// Vertical rise of the band at the window midpoint, in chart units.
    pub elevation_scale: f64,
    pub cadence: WeeklyCadence,
    pub timeline: TimelineConfig,
    pub annotations: AnnotationConfig,
    pub render: RenderConfig,
}

/// Source column names for the ingestion adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub station_column: String,
    pub start_date_column: String,
    pub end_date_column: String,
    pub total_column: String,
    /// Column summed into the sub-category amount (full-fare riders).
    pub subcategory_column: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionConfig {
    pub station_id: String,
    pub name: String,
    /// Centerline y of the band before elevation is applied.
    pub baseline: f64,
    pub label_placement: Placement,
    pub total_color: String,
    pub subcategory_color: String,
}

/// Weekly rows a month is expected to contain. Anything else is flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklyCadence {
    pub min_weeks: usize,
    pub max_weeks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub step: u32,
    pub label: String,
    pub category: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub events: Vec<TimelineEvent>,
    pub neutral_category: String,
    pub neutral_color: String,
    /// Steps whose event names are printed above the timeline.
    pub highlight_steps: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    /// 1-based time steps that get a literal ridership label.
    pub steps: Vec<u32>,
    /// Gap between the band edge and the label anchor.
    pub offset: f64,
}

/// Figure-level styling handed to the renderer untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub title: String,
    pub subtitle: String,
    pub timeline_title: String,
    /// One line per calendar year, centred under that year's span.
    pub timeline_captions: Vec<YearCaption>,
    pub credit: String,
    pub font_family: Vec<String>,
    pub dpi: u32,
    pub figure_size: (f64, f64),
    pub background: String,
    pub text_color: String,
    pub band_edge_color: String,
    pub band_edge_width: f64,
    pub total_alpha: f64,
    pub subcategory_alpha: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearCaption {
    pub year: i32,
    pub text: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            window: MonthWindow::new(reference_start(), 24),
            ingest: IngestConfig::default(),
            outbound: DirectionConfig {
                station_id: "R468".to_string(),
                name: "Manhattan → Roosevelt Island".to_string(),
                baseline: 8.0,
                label_placement: Placement::Above,
                total_color: "#554F3F".to_string(),
                subcategory_color: "#A99E81".to_string(),
            },
            inbound: DirectionConfig {
                station_id: "R469".to_string(),
                name: "Roosevelt Island → Manhattan".to_string(),
                baseline: 2.0,
                label_placement: Placement::Below,
                total_color: "#4F3E36".to_string(),
                subcategory_color: "#9A7E71".to_string(),
            },
            thickness: ThicknessRange::default(),
            elevation_scale: 1.5,
            cadence: WeeklyCadence::default(),
            timeline: TimelineConfig::default(),
            annotations: AnnotationConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

fn reference_start() -> MonthKey {
    MonthKey::january(2019)
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            station_column: "Remote Station ID".to_string(),
            start_date_column: "From Date".to_string(),
            end_date_column: "To Date".to_string(),
            total_column: "Total Ridership".to_string(),
            subcategory_column: "Full Fare".to_string(),
        }
    }
}

impl Default for DirectionConfig {
    fn default() -> Self {
        Self {
            station_id: String::new(),
            name: String::new(),
            baseline: 0.0,
            label_placement: Placement::Above,
            total_color: "#554F3F".to_string(),
            subcategory_color: "#A99E81".to_string(),
        }
    }
}

impl Default for WeeklyCadence {
    fn default() -> Self {
        Self {
            min_weeks: 4,
            max_weeks: 5,
        }
    }
}

impl WeeklyCadence {
    pub fn accepts(&self, weeks: usize) -> bool {
        (self.min_weeks..=self.max_weeks).contains(&weeks)
    }
}

impl Default for TimelineConfig {
    fn default() -> Self {
        let event = |step: u32, label: &str, category: &str, color: &str| TimelineEvent {
            step,
            label: label.to_string(),
            category: category.to_string(),
            color: color.to_string(),
        };
        Self {
            events: vec![
                event(1, "Jan 2019", "Normal Operations", "#9BA17B"),
                event(12, "Dec 2019", "Normal Operations", "#9BA17B"),
                event(13, "Jan 2020", "Normal Operations", "#9BA17B"),
                event(14, "Feb 2020", "First US Cases", "#D4C5A9"),
                event(15, "Mar 2020", "NYC LOCKDOWN BEGINS", "#A0522D"),
                event(16, "Apr 2020", "Peak Deaths", "#8B4513"),
                event(17, "May 2020", "Phase 1 Reopening", "#D2B48C"),
                event(18, "Jun 2020", "Phase 2 Reopening", "#C9B699"),
                event(24, "Dec 2020", "Vaccines Begin", "#8B9BA3"),
            ],
            neutral_category: String::new(),
            neutral_color: "#E8E8E8".to_string(),
            highlight_steps: vec![15, 16, 17, 24],
        }
    }
}

impl TimelineConfig {
    /// Drops events and highlights that fall after the end of `window`.
    pub fn retain_within(&mut self, window: &MonthWindow) {
        let before = self.events.len();
        self.events.retain(|e| window.key_at(e.step).is_some());
        self.highlight_steps.retain(|s| window.key_at(*s).is_some());
        if self.events.len() < before {
            debug!(
                dropped = before - self.events.len(),
                months = window.months,
                "Default timeline events trimmed to window"
            );
        }
    }
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            steps: vec![3, 7, 11, 15, 16, 19, 23],
            offset: 0.5,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: "Roosevelt Island Tramway\nThe COVID-19 Impact on Ridership  2019-2020"
                .to_string(),
            subtitle: "Watch ridership collapse in March 2020  |  Line thickness = monthly ridership  |  Light tones = tourists".to_string(),
            timeline_title: "NYC COVID-19 Timeline & Interventions".to_string(),
            timeline_captions: vec![
                YearCaption {
                    year: 2019,
                    text: "2019: Normal Operations".to_string(),
                },
                YearCaption {
                    year: 2020,
                    text: "2020: COVID-19 Impact & Recovery".to_string(),
                },
            ],
            credit: "Data: MTA NYCT MetroCard History | Inspired by Charles Minard, 1869"
                .to_string(),
            font_family: ["Georgia", "Times New Roman", "Palatino", "DejaVu Serif"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            dpi: 300,
            figure_size: (24.0, 11.0),
            background: "#f8f8f0".to_string(),
            text_color: "#2c3e50".to_string(),
            band_edge_color: "white".to_string(),
            band_edge_width: 1.5,
            total_alpha: 0.9,
            subcategory_alpha: 0.95,
        }
    }
}

impl FlowConfig {
    /// Loads and validates the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FlowError::Config(format!("cannot read '{path}': {e}")))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let malformed = |e: serde_json::Error| FlowError::Config(format!("malformed config: {e}"));
        let value: serde_json::Value = serde_json::from_str(content).map_err(malformed)?;
        let given = |key: &str| value.get(key).is_some();
        let (own_timeline, own_annotations) = (given("timeline"), given("annotations"));

        let mut config: FlowConfig = serde_json::from_value(value).map_err(malformed)?;
        let window = config.window;
        if !own_timeline {
            config.timeline.retain_within(&window);
        }
        if !own_annotations {
            config.annotations.steps.retain(|s| window.key_at(*s).is_some());
        }
        config.validate()?;
        Ok(config)
    }

    pub fn direction(&self, direction: Direction) -> &DirectionConfig {
        match direction {
            Direction::Outbound => &self.outbound,
            Direction::Inbound => &self.inbound,
        }
    }

    /// Maps a source station identifier to the direction it reports.
    pub fn direction_for_station(&self, station_id: &str) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|d| self.direction(*d).station_id == station_id)
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(FlowError::Config(msg));

        if self.window.is_empty() {
            return fail("window must contain at least one month".to_string());
        }
        self.thickness.validate()?;
        if !self.elevation_scale.is_finite() || self.elevation_scale < 0.0 {
            return fail(format!(
                "elevation_scale must be a non-negative number, got {}",
                self.elevation_scale
            ));
        }
        if self.cadence.min_weeks > self.cadence.max_weeks {
            return fail(format!(
                "cadence min_weeks {} exceeds max_weeks {}",
                self.cadence.min_weeks, self.cadence.max_weeks
            ));
        }

        for d in Direction::ALL {
            let dc = self.direction(d);
            if dc.station_id.trim().is_empty() {
                return fail(format!("{d} station_id is empty"));
            }
            if !dc.baseline.is_finite() {
                return fail(format!("{d} baseline must be finite"));
            }
        }
        if self.outbound.station_id == self.inbound.station_id {
            return fail(format!(
                "both directions use station '{}'",
                self.outbound.station_id
            ));
        }

        // Both bands share the elevation arc, so their gap stays constant.
        let gap = (self.outbound.baseline - self.inbound.baseline).abs();
        if gap < 2.0 * self.thickness.max_thickness {
            return fail(format!(
                "baselines {} and {} are closer than twice max_thickness ({}); bands would overlap",
                self.outbound.baseline, self.inbound.baseline, self.thickness.max_thickness
            ));
        }

        let mut seen = HashSet::new();
        for event in &self.timeline.events {
            if self.window.key_at(event.step).is_none() {
                return fail(format!("timeline event step {} is outside the window", event.step));
            }
            if !seen.insert(event.step) {
                return fail(format!("timeline event step {} is listed twice", event.step));
            }
        }
        for &step in self.timeline.highlight_steps.iter().chain(&self.annotations.steps) {
            if self.window.key_at(step).is_none() {
                return fail(format!("step {step} is outside the {}-month window", self.window.months));
            }
        }
        if !self.annotations.offset.is_finite() {
            return fail("annotation offset must be finite".to_string());
        }

        Ok(())
    }
}
