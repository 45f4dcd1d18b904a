//! Weekly-to-monthly aggregation.
//!
//! Groups raw weekly rows by (month, direction), sums them, splits the
//! sub-category from the total, and fills every window month so each
//! direction ends up with a gap-free [`crate::model::MonthlySeries`].

pub mod period;
pub mod quality;
pub mod split;

pub use period::{Aggregation, aggregate_monthly};
pub use quality::{DataQualityWarning, Diagnostics};
pub use split::split_month;
