//! End-to-end flow chart construction.
//!
//! One pass: records → monthly series → shared scale → band geometry →
//! timeline and labels. Any fatal error stops the pass before a chart exists,
//! so callers never see a partial chart.

use serde::Serialize;
use tracing::info;

use crate::aggregate::{DataQualityWarning, aggregate_monthly};
use crate::annotate::{AnnotationSelector, ValueLabel};
use crate::config::{FlowConfig, RenderConfig};
use crate::error::Result;
use crate::ingest::load_records;
use crate::layout::{
    AxisLayout, ElevationProfile, FlowBands, ScaleParameters, axis_layout, build_bands,
};
use crate::model::{Direction, MonthWindow, MonthlySeries, RawRecord};
use crate::timeline::{TimelineEntry, TimelineRegistry};

/// Everything the renderer needs, in drawing order where order matters.
#[derive(Debug, Clone, Serialize)]
pub struct FlowChart {
    pub window: MonthWindow,
    pub outbound: MonthlySeries,
    pub inbound: MonthlySeries,
    pub scale: ScaleParameters,
    pub elevation: ElevationProfile,
    pub bands: FlowBands,
    pub timeline: Vec<TimelineEntry>,
    pub highlighted_events: Vec<TimelineEntry>,
    pub labels: Vec<ValueLabel>,
    pub axis: AxisLayout,
    pub warnings: Vec<DataQualityWarning>,
    pub render: RenderConfig,
}

impl FlowChart {
    pub fn series(&self, direction: Direction) -> &MonthlySeries {
        match direction {
            Direction::Outbound => &self.outbound,
            Direction::Inbound => &self.inbound,
        }
    }
}

/// Ingests `source` and builds the chart.
pub fn run(source: &str, config: &FlowConfig) -> Result<FlowChart> {
    config.validate()?;
    let records = load_records(source, config)?;
    build_chart(&records, config)
}

#[tracing::instrument(skip_all, fields(records = records.len()))]
pub fn build_chart(records: &[RawRecord], config: &FlowConfig) -> Result<FlowChart> {
    config.validate()?;

    let aggregation = aggregate_monthly(records, config)?;
    let series = [&aggregation.outbound, &aggregation.inbound];

    for s in series {
        let min = s.totals().min().unwrap_or_default();
        let max = s.totals().max().unwrap_or_default();
        info!(
            direction = %s.direction(),
            station = %config.direction(s.direction()).station_id,
            min_total = min,
            max_total = max,
            "Monthly ridership range"
        );
    }

    let scale = ScaleParameters::from_series(&series);
    info!(
        max_total = scale.max_total,
        min_total = scale.min_total,
        "Scale shared by both directions"
    );

    let elevation = ElevationProfile::generate(config.window.len());
    let bands = build_bands(&series, &scale, &elevation, config)?;

    let registry = TimelineRegistry::new(config.window, &config.timeline);
    let labels = AnnotationSelector::new(&config.annotations).select(&series, &bands, config);

    info!(
        bands = bands.bands.len(),
        labels = labels.len(),
        warnings = aggregation.warnings.len(),
        "Flow chart assembled"
    );

    Ok(FlowChart {
        window: config.window,
        scale,
        elevation,
        bands,
        timeline: registry.entries(),
        highlighted_events: registry.highlighted(),
        labels,
        axis: axis_layout(&config.window),
        render: config.render.clone(),
        warnings: aggregation.warnings,
        outbound: aggregation.outbound,
        inbound: aggregation.inbound,
    })
}
