//! Instrument response: ratio of a measured to a theoretical calibration
//! spectrum, and the multiplicative correction derived from it.

use crate::data::model::{max_of, Spectrum};
use crate::error::{Error, Result};

use super::resample::resample;
use super::smooth::Smoother;

/// Normalized instrument response R(λ), peak value 1.
///
/// Positions where the theoretical intensity was zero are excluded from the
/// ratio and hold 0.0.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseCurve {
    wavelength: Vec<f64>,
    ratio: Vec<f64>,
}

/// Elementwise 1/R. `None` marks positions where R is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionFactor {
    wavelength: Vec<f64>,
    factor: Vec<Option<f64>>,
}

/// A response curve together with its correction factor.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub curve: ResponseCurve,
    pub correction: CorrectionFactor,
}

impl ResponseCurve {
    pub fn wavelength(&self) -> &[f64] {
        &self.wavelength
    }

    pub fn ratio(&self) -> &[f64] {
        &self.ratio
    }
}

impl CorrectionFactor {
    pub fn wavelength(&self) -> &[f64] {
        &self.wavelength
    }

    pub fn factor(&self) -> &[Option<f64>] {
        &self.factor
    }
}

/// Derive the instrument response from an experimental and a theoretical
/// calibration spectrum.
///
/// The theoretical spectrum is resampled onto the experimental wavelength
/// grid, clamping to its edge values where the experimental grid reaches
/// past it.
pub fn compute_response(experimental: &Spectrum, theoretical: &Spectrum) -> Result<Response> {
    let (exp_lo, exp_hi) = experimental.range();
    let (theo_lo, theo_hi) = theoretical.range();
    if exp_hi < theo_lo || exp_lo > theo_hi {
        return Err(Error::DisjointDomains);
    }

    let (theo_w, theo_i) = theoretical.ascending();
    let interp_theo = resample(
        &theo_w,
        &theo_i,
        experimental.wavelength(),
        theo_i[0],
        theo_i[theo_i.len() - 1],
    )?;

    let raw: Vec<f64> = experimental
        .intensity()
        .iter()
        .zip(&interp_theo)
        .map(|(&e, &t)| if t != 0.0 { e.abs() / t.abs() } else { 0.0 })
        .collect();

    Response::from_ratio(experimental.wavelength().to_vec(), raw)
}

impl Response {
    /// Normalize a raw ratio and derive its correction factor.
    pub fn from_ratio(wavelength: Vec<f64>, raw: Vec<f64>) -> Result<Self> {
        if wavelength.len() != raw.len() {
            return Err(Error::LengthMismatch {
                x: wavelength.len(),
                y: raw.len(),
            });
        }
        if raw.iter().any(|r| !r.is_finite()) {
            return Err(Error::NonFinite("response ratio"));
        }
        let peak = max_of(&raw);
        if !(peak > 0.0) {
            return Err(Error::ZeroResponse);
        }

        let ratio: Vec<f64> = raw.iter().map(|r| r / peak).collect();
        let factor = guarded_reciprocal(&ratio)?;

        Ok(Self {
            curve: ResponseCurve {
                wavelength: wavelength.clone(),
                ratio,
            },
            correction: CorrectionFactor { wavelength, factor },
        })
    }

    /// Smooth R with the given strategy and rebuild the correction.
    pub fn smoothed(&self, smoother: &Smoother) -> Result<Self> {
        let ratio = smoother.smooth(&self.curve.ratio)?;
        Self::from_ratio(self.curve.wavelength.clone(), ratio)
    }

    /// Apply the correction to a measured spectrum.
    ///
    /// R is resampled onto the measured grid (zero outside the calibrated
    /// range) before taking the reciprocal, so excluded and out-of-range
    /// samples come out as 0.
    pub fn correct(&self, measured: &Spectrum) -> Result<Vec<f64>> {
        let (w, r) = ascending_pairs(&self.curve.wavelength, &self.curve.ratio);
        let on_grid = resample(&w, &r, measured.wavelength(), 0.0, 0.0)?;
        let factor = guarded_reciprocal(&on_grid)?;

        Ok(measured
            .intensity()
            .iter()
            .zip(&factor)
            .map(|(&y, f)| f.map_or(0.0, |f| y * f))
            .collect())
    }
}

/// 1/x where x is non-zero, `None` elsewhere.
pub fn guarded_reciprocal(values: &[f64]) -> Result<Vec<Option<f64>>> {
    values
        .iter()
        .map(|&v| {
            if v == 0.0 {
                return Ok(None);
            }
            let inv = 1.0 / v;
            if inv.is_finite() {
                Ok(Some(inv))
            } else {
                Err(Error::NonFinite("correction factor"))
            }
        })
        .collect()
}

fn ascending_pairs(x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
    if x.len() >= 2 && x[1] < x[0] {
        (x.iter().rev().copied().collect(), y.iter().rev().copied().collect())
    } else {
        (x.to_vec(), y.to_vec())
    }
}
