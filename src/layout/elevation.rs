//! The rise-and-fall arc traced by both bands.
//!
//! Purely geometric: a downward parabola over the time steps, 1.0 at the
//! midpoint and tapering toward both ends. Ridership never enters into it.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElevationProfile {
    values: Vec<f64>,
}

impl ElevationProfile {
    /// Profile for steps `1..=steps`: `1 - ((x - mid) / (steps / 2))^2`.
    pub fn generate(steps: usize) -> Self {
        if steps == 0 {
            return Self { values: Vec::new() };
        }
        let first = 1.0;
        let last = steps as f64;
        let mid = (first + last) / 2.0;
        let half_span = steps as f64 / 2.0;

        let values = (1..=steps)
            .map(|i| {
                let d = (i as f64 - mid) / half_span;
                1.0 - d * d
            })
            .collect();
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Vertical offsets in chart units for a given elevation scale.
    pub fn offsets(&self, scale: f64) -> Vec<f64> {
        self.values.iter().map(|v| v * scale).collect()
    }
}
