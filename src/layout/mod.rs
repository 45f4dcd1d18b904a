//! Geometric layout of the flow chart.
//!
//! Turns monthly scalars into chart coordinates: the shared thickness scale,
//! the elevation arc, band polygons, and axis positions.

pub mod axis;
pub mod band;
pub mod elevation;
pub mod scale;

pub use axis::{AxisLayout, axis_layout};
pub use band::{BandGeometry, BandLayer, BandProfile, FlowBands, Point, Polygon, build_bands, closed_band};
pub use elevation::ElevationProfile;
pub use scale::{ScaleParameters, ThicknessRange};
