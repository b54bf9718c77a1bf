//! Super-Gaussian spectral window: `exp(-((λ - center) / width)^exponent)`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Window parameters as entered by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowParams {
    pub center: f64,
    pub width: f64,
    /// Odd exponents are expected, but any integer is accepted.
    pub exponent: i32,
}

impl WindowParams {
    /// Parse the three text fields.
    pub fn parse(center: &str, width: &str, exponent: &str) -> Result<Self> {
        let center = parse_field("center", center)?;
        let width = parse_field("width", width)?;
        let exponent = exponent
            .trim()
            .parse::<i32>()
            .map_err(|_| Error::InvalidParameter {
                name: "exponent",
                value: exponent.to_string(),
            })?;
        Ok(Self {
            center,
            width,
            exponent,
        })
    }

    /// Window values over a wavelength axis.
    pub fn apply(&self, wavelength: &[f64]) -> Result<Vec<f64>> {
        apply_window(wavelength, self.center, self.width, self.exponent)
    }
}

fn parse_field(name: &'static str, text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::InvalidParameter {
            name,
            value: text.to_string(),
        })
}

/// Evaluate the super-Gaussian window at every wavelength.
///
/// A zero width, or any overflow or NaN along the way, fails the whole
/// computation so no partially defined window is ever returned. Underflow
/// to zero far from the centre is fine.
pub fn apply_window(wavelength: &[f64], center: f64, width: f64, exponent: i32) -> Result<Vec<f64>> {
    if width == 0.0 {
        return Err(Error::DivideByZero("window width"));
    }

    wavelength
        .iter()
        .map(|&w| {
            let arg = ((w - center) / width).powi(exponent);
            if !arg.is_finite() {
                return Err(Error::NonFinite("window"));
            }
            let value = (-arg).exp();
            if value.is_finite() {
                Ok(value)
            } else {
                Err(Error::NonFinite("window"))
            }
        })
        .collect()
}
