use crate::CoreError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Activity of H+ corresponding to a pH value: `10^-pH`.
pub fn ph_to_activity(ph: Real) -> Result<Real, CoreError> {
    ensure_finite(ph, "pH")?;
    Ok(10f64.powf(-ph))
}

/// pH corresponding to an H+ activity: `-log10(a)`.
pub fn activity_to_ph(activity: Real) -> Result<Real, CoreError> {
    if activity.is_nan() || activity <= 0.0 {
        return Err(CoreError::InvalidArg {
            what: "H+ activity must be strictly positive",
        });
    }
    ensure_finite(activity, "H+ activity").map(|a| -a.log10())
}
