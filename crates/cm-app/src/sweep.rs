//! pH sweep definitions.

use crate::error::{AppError, AppResult};

/// Uniformly spaced pH values, both ends included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhSweep {
    pub from: f64,
    pub to: f64,
    pub points: usize,
}

impl PhSweep {
    pub fn new(from: f64, to: f64, points: usize) -> AppResult<Self> {
        if !from.is_finite() || !to.is_finite() {
            return Err(AppError::InvalidInput(format!(
                "Sweep bounds must be finite: {} to {}",
                from, to
            )));
        }
        if points < 2 {
            return Err(AppError::InvalidInput(
                "Sweep must have at least 2 points".to_string(),
            ));
        }
        if (from - to).abs() < 1e-12 {
            return Err(AppError::InvalidInput(
                "Start and end values must be different".to_string(),
            ));
        }
        Ok(Self { from, to, points })
    }

    pub fn generate_points(&self) -> Vec<f64> {
        let step = (self.to - self.from) / (self.points - 1) as f64;
        (0..self.points)
            .map(|i| {
                if i == self.points - 1 {
                    self.to
                } else {
                    self.from + step * i as f64
                }
            })
            .collect()
    }
}
