//! Flow band polygons.
//!
//! Every polygon goes through [`closed_band`], which owns the vertex ordering:
//! top edge left-to-right, then bottom edge right-to-left. Each direction
//! yields a full-width total band and a sub-category cap that sits flush
//! against the band's top edge.

use serde::Serialize;
use tracing::debug;

use crate::config::{DirectionConfig, FlowConfig};
use crate::error::{FlowError, Result};
use crate::layout::elevation::ElevationProfile;
use crate::layout::scale::ScaleParameters;
use crate::model::{Direction, MonthlySeries};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A closed, simple polygon in chart coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polygon {
    vertices: Vec<Point>,
}

impl Polygon {
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Unsigned area (shoelace).
    pub fn area(&self) -> f64 {
        let n = self.vertices.len();
        let twice: f64 = (0..n)
            .map(|i| {
                let a = self.vertices[i];
                let b = self.vertices[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum();
        twice.abs() / 2.0
    }
}

/// Builds the polygon enclosed between `upper` and `lower` over `xs`.
///
/// `xs` must be strictly increasing and `upper[i] >= lower[i]` at every step;
/// together these keep the outline free of self-intersections. Touching edges
/// (zero width) are allowed.
pub fn closed_band(xs: &[f64], upper: &[f64], lower: &[f64]) -> Result<Polygon> {
    if xs.is_empty() {
        return Err(FlowError::Geometry("band needs at least one step".to_string()));
    }
    if upper.len() != xs.len() || lower.len() != xs.len() {
        return Err(FlowError::Geometry(format!(
            "edge lengths differ: {} steps, {} upper, {} lower",
            xs.len(),
            upper.len(),
            lower.len()
        )));
    }
    if let Some(bad) = xs
        .iter()
        .chain(upper)
        .chain(lower)
        .find(|v| !v.is_finite())
    {
        return Err(FlowError::Geometry(format!("non-finite coordinate {bad}")));
    }
    if let Some(w) = xs.windows(2).find(|w| w[1] <= w[0]) {
        return Err(FlowError::Geometry(format!(
            "x positions must increase, got {} then {}",
            w[0], w[1]
        )));
    }
    for i in 0..xs.len() {
        if upper[i] < lower[i] {
            return Err(FlowError::Geometry(format!(
                "edges cross at x={}: upper {} below lower {}",
                xs[i], upper[i], lower[i]
            )));
        }
    }

    let top = xs.iter().zip(upper).map(|(&x, &y)| Point { x, y });
    let bottom = xs.iter().zip(lower).rev().map(|(&x, &y)| Point { x, y });
    Ok(Polygon {
        vertices: top.chain(bottom).collect(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BandLayer {
    Total,
    Subcategory,
}

impl BandLayer {
    /// Sub-category caps draw above the full band.
    pub fn z_order(self) -> u32 {
        match self {
            BandLayer::Total => 10,
            BandLayer::Subcategory => 11,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandGeometry {
    pub direction: Direction,
    pub layer: BandLayer,
    pub z_order: u32,
    pub fill: String,
    pub alpha: f64,
    pub polygon: Polygon,
}

/// Per-step vertical layout of one direction's band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandProfile {
    pub direction: Direction,
    pub x: Vec<f64>,
    /// Baseline plus scaled elevation.
    pub centerline: Vec<f64>,
    pub half_thickness: Vec<f64>,
    /// Width of the sub-category cap, `half_thickness * ratio`.
    pub cap_thickness: Vec<f64>,
}

impl BandProfile {
    pub fn new(
        series: &MonthlySeries,
        baseline: f64,
        scale: &ScaleParameters,
        elevation: &ElevationProfile,
        config: &FlowConfig,
    ) -> Result<Self> {
        if elevation.len() != series.len() {
            return Err(FlowError::Geometry(format!(
                "elevation profile has {} steps, {} series has {}",
                elevation.len(),
                series.direction(),
                series.len()
            )));
        }

        let half_thickness = scale.half_thicknesses(series, &config.thickness);
        let cap_thickness = series
            .entries()
            .iter()
            .zip(&half_thickness)
            .map(|(m, h)| h * m.subcategory_ratio())
            .collect();
        let centerline = elevation
            .offsets(config.elevation_scale)
            .into_iter()
            .map(|offset| baseline + offset)
            .collect();

        Ok(Self {
            direction: series.direction(),
            x: (1..=series.len()).map(|s| s as f64).collect(),
            centerline,
            half_thickness,
            cap_thickness,
        })
    }

    pub fn top_edge(&self) -> Vec<f64> {
        self.centerline
            .iter()
            .zip(&self.half_thickness)
            .map(|(y, h)| y + h)
            .collect()
    }

    pub fn bottom_edge(&self) -> Vec<f64> {
        self.centerline
            .iter()
            .zip(&self.half_thickness)
            .map(|(y, h)| y - h)
            .collect()
    }

    /// Lower edge of the sub-category cap, measured down from the top edge.
    pub fn cap_edge(&self) -> Vec<f64> {
        self.top_edge()
            .iter()
            .zip(&self.cap_thickness)
            .map(|(top, s)| top - s)
            .collect()
    }

    pub fn total_polygon(&self) -> Result<Polygon> {
        closed_band(&self.x, &self.top_edge(), &self.bottom_edge())
    }

    pub fn cap_polygon(&self) -> Result<Polygon> {
        closed_band(&self.x, &self.top_edge(), &self.cap_edge())
    }

    fn geometries(&self, style: &DirectionConfig, config: &FlowConfig) -> Result<[BandGeometry; 2]> {
        let band = |layer: BandLayer, fill: &str, alpha: f64, polygon: Polygon| BandGeometry {
            direction: self.direction,
            layer,
            z_order: layer.z_order(),
            fill: fill.to_string(),
            alpha,
            polygon,
        };
        Ok([
            band(
                BandLayer::Total,
                &style.total_color,
                config.render.total_alpha,
                self.total_polygon()?,
            ),
            band(
                BandLayer::Subcategory,
                &style.subcategory_color,
                config.render.subcategory_alpha,
                self.cap_polygon()?,
            ),
        ])
    }
}

/// Band layout for both directions, ready for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowBands {
    pub profiles: Vec<BandProfile>,
    /// Sorted by z-order: all total bands before any sub-category cap.
    pub bands: Vec<BandGeometry>,
}

impl FlowBands {
    pub fn profile(&self, direction: Direction) -> Option<&BandProfile> {
        self.profiles.iter().find(|p| p.direction == direction)
    }
}

pub fn build_bands(
    series: &[&MonthlySeries],
    scale: &ScaleParameters,
    elevation: &ElevationProfile,
    config: &FlowConfig,
) -> Result<FlowBands> {
    let mut profiles = Vec::with_capacity(series.len());
    let mut bands = Vec::with_capacity(series.len() * 2);

    for s in series {
        let style = config.direction(s.direction());
        let profile = BandProfile::new(s, style.baseline, scale, elevation, config)?;
        let [total, cap] = profile.geometries(style, config)?;
        debug!(
            direction = %s.direction(),
            baseline = style.baseline,
            total_area = total.polygon.area(),
            cap_area = cap.polygon.area(),
            "Band polygons built"
        );
        bands.extend([total, cap]);
        profiles.push(profile);
    }

    bands.sort_by_key(|b| (b.z_order, b.direction));
    Ok(FlowBands { profiles, bands })
}
