//! Event timeline drawn beneath the flow bands.
//!
//! A sparse, configured table keyed by time step. Steps without an event are
//! not missing data; they resolve to a neutral entry.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::{TimelineConfig, TimelineEvent};
use crate::model::MonthWindow;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub time_step: u32,
    pub label: String,
    pub category: String,
    pub color_token: String,
    /// True when no event is configured for this step.
    pub neutral: bool,
}

#[derive(Debug, Clone)]
pub struct TimelineRegistry {
    window: MonthWindow,
    events: BTreeMap<u32, TimelineEvent>,
    neutral_category: String,
    neutral_color: String,
    highlight_steps: Vec<u32>,
}

impl TimelineRegistry {
    pub fn new(window: MonthWindow, config: &TimelineConfig) -> Self {
        Self {
            window,
            events: config
                .events
                .iter()
                .map(|e| (e.step, e.clone()))
                .collect(),
            neutral_category: config.neutral_category.clone(),
            neutral_color: config.neutral_color.clone(),
            highlight_steps: config.highlight_steps.clone(),
        }
    }

    pub fn resolve(&self, step: u32) -> TimelineEntry {
        match self.events.get(&step) {
            Some(event) => TimelineEntry {
                time_step: step,
                label: event.label.clone(),
                category: event.category.clone(),
                color_token: event.color.clone(),
                neutral: false,
            },
            None => TimelineEntry {
                time_step: step,
                label: self
                    .window
                    .key_at(step)
                    .map(|k| k.label())
                    .unwrap_or_default(),
                category: self.neutral_category.clone(),
                color_token: self.neutral_color.clone(),
                neutral: true,
            },
        }
    }

    /// One entry per window step, in order.
    pub fn entries(&self) -> Vec<TimelineEntry> {
        (1..=self.window.months).map(|s| self.resolve(s)).collect()
    }

    /// Configured events whose names are called out on the timeline.
    pub fn highlighted(&self) -> Vec<TimelineEntry> {
        self.highlight_steps
            .iter()
            .filter(|s| self.events.contains_key(*s))
            .map(|&s| self.resolve(s))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlowConfig;

    fn registry() -> TimelineRegistry {
        let config = FlowConfig::default();
        TimelineRegistry::new(config.window, &config.timeline)
    }

    #[test]
    fn test_configured_step_resolves_to_event() {
        let entry = registry().resolve(15);
        assert_eq!(entry.label, "Mar 2020");
        assert_eq!(entry.category, "NYC LOCKDOWN BEGINS");
        assert_eq!(entry.color_token, "#A0522D");
        assert!(!entry.neutral);
    }

    #[test]
    fn test_absent_step_is_neutral() {
        let entry = registry().resolve(5);
        assert!(entry.neutral);
        assert_eq!(entry.color_token, "#E8E8E8");
        assert_eq!(entry.category, "");
        assert_eq!(entry.label, "May 2019");
    }

    #[test]
    fn test_entries_cover_window() {
        let entries = registry().entries();
        assert_eq!(entries.len(), 24);
        assert!(entries.iter().enumerate().all(|(i, e)| e.time_step == i as u32 + 1));
        assert_eq!(entries.iter().filter(|e| !e.neutral).count(), 9);
    }

    #[test]
    fn test_highlighted_skips_unconfigured_steps() {
        let mut config = FlowConfig::default();
        config.timeline.highlight_steps = vec![15, 3, 24];
        let registry = TimelineRegistry::new(config.window, &config.timeline);
        let steps: Vec<_> = registry.highlighted().iter().map(|e| e.time_step).collect();
        assert_eq!(steps, vec![15, 24]);
    }
}
