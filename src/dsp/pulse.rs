//! Transform-limited pulse duration from a spectral intensity.
//!
//! ```text
//!  λ, I(λ)
//!     │  ω = 2πc/λ,  S(ω) = I(λ)·λ²/(2πc)
//!     ▼
//!  resample S onto a uniform ω grid (±K·ω_max, step dw, fill ε)
//!     │  A(ω) = sqrt|S(ω)|      zero spectral phase
//!     ▼
//!  ifft + fftshift  →  E(t)
//!     │  I(t) = |E|² / max|E|²
//!     ▼
//!  half-maximum crossing left and right of centre  →  FWHM
//! ```
//!
//! Wavelengths are in nanometres and `c = 300 nm/fs`, so ω is in rad/fs and
//! the time axis in femtoseconds. The phase is assumed flat, which gives the
//! shortest pulse compatible with the spectrum.

use std::f64::consts::PI;

use rustfft::{num_complex::Complex64, FftPlanner};
use serde::{Deserialize, Serialize};

use crate::data::model::max_of;
use crate::error::{Error, Result};

use super::resample::resample;

/// Speed of light in nm/fs (rounded).
pub const SPEED_OF_LIGHT: f64 = 300.0;

/// Default cap on the uniform frequency grid, in samples (1 GiB of `Complex64`).
pub const DEFAULT_MAX_GRID_LEN: usize = 1 << 26;

/// How the half-maximum crossing time is located.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Crossing {
    /// Time of the sample closest to half maximum.
    #[default]
    Nearest,
    /// Linear interpolation between the two samples bracketing half maximum.
    Interpolated,
}

/// Estimator settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseEstimator {
    /// The ω grid spans `-span_multiple·ω_max .. span_multiple·ω_max`.
    pub span_multiple: f64,
    /// Spectral density outside the measured band.
    pub fill: f64,
    pub crossing: Crossing,
    /// Largest frequency grid that will be transformed.
    pub max_grid_len: usize,
}

impl Default for PulseEstimator {
    fn default() -> Self {
        Self {
            span_multiple: 10.0,
            fill: 1e-30,
            crossing: Crossing::Nearest,
            max_grid_len: DEFAULT_MAX_GRID_LEN,
        }
    }
}

/// Temporal intensity envelope and its FWHM.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseProfile {
    /// Delay axis in fs, zero at the centre.
    pub time: Vec<f64>,
    /// Intensity normalized to a peak of 1.
    pub envelope: Vec<f64>,
    pub fwhm: f64,
}

impl PulseEstimator {
    /// FWHM in fs, or an error when any step is numerically invalid.
    pub fn estimate_fwhm(&self, wavelength: &[f64], intensity: &[f64]) -> Result<f64> {
        self.profile(wavelength, intensity).map(|p| p.fwhm)
    }

    /// Full temporal profile of the transform-limited pulse.
    pub fn profile(&self, wavelength: &[f64], intensity: &[f64]) -> Result<PulseProfile> {
        if wavelength.len() != intensity.len() {
            return Err(Error::LengthMismatch {
                x: wavelength.len(),
                y: intensity.len(),
            });
        }
        let n = wavelength.len();
        if n < 2 {
            return Err(Error::TooShort { len: n, min: 2 });
        }

        let two_pi_c = 2.0 * PI * SPEED_OF_LIGHT;
        let mut freq = Vec::with_capacity(n);
        for &w in wavelength {
            if w == 0.0 {
                return Err(Error::DivideByZero("wavelength"));
            }
            freq.push(two_pi_c / w);
        }
        if freq.iter().any(|f| !f.is_finite()) {
            return Err(Error::NonFinite("angular frequency"));
        }

        let dw = (freq[0] - freq[n - 1]).abs() / (n - 1) as f64;
        if dw == 0.0 {
            return Err(Error::DivideByZero("frequency step"));
        }
        if !dw.is_finite() {
            return Err(Error::NonFinite("frequency step"));
        }

        let grid = self.frequency_grid(&freq, dw)?;

        // Change of variables λ → ω.
        let mut density: Vec<f64> = wavelength
            .iter()
            .zip(intensity)
            .map(|(&w, &i)| i * w * w / two_pi_c)
            .collect();
        if density.iter().any(|d| !d.is_finite()) {
            return Err(Error::NonFinite("spectral density"));
        }
        if freq[n - 1] < freq[0] {
            freq.reverse();
            density.reverse();
        }
        let spectrum = resample(&freq, &density, &grid, self.fill, self.fill)?;

        let mut field: Vec<Complex64> = spectrum
            .iter()
            .map(|s| Complex64::new(s.abs().sqrt(), 0.0))
            .collect();
        inverse_fft(&mut field);
        let len = field.len();
        field.rotate_right(len / 2);

        let power: Vec<f64> = field.iter().map(|e| e.norm_sqr()).collect();
        let peak = max_of(&power);
        if peak == 0.0 {
            return Err(Error::DivideByZero("pulse peak"));
        }
        if !peak.is_finite() {
            return Err(Error::NonFinite("pulse peak"));
        }
        let envelope: Vec<f64> = power.iter().map(|p| p / peak).collect();
        if envelope.iter().any(|e| !e.is_finite()) {
            return Err(Error::NonFinite("pulse envelope"));
        }

        let time = shifted_time_axis(len, dw);
        let fwhm = self.full_width(&time, &envelope)?;

        Ok(PulseProfile {
            time,
            envelope,
            fwhm,
        })
    }

    /// Uniform ω grid with step `dw`, symmetric about zero.
    fn frequency_grid(&self, freq: &[f64], dw: f64) -> Result<Vec<f64>> {
        let f_max = freq.iter().fold(0.0f64, |m, f| m.max(f.abs()));
        let start = -self.span_multiple * f_max;
        let stop = self.span_multiple * f_max;
        let count = ((stop - start) / dw).ceil();
        if !count.is_finite() || count < 1.0 {
            return Err(Error::NonFinite("frequency grid"));
        }
        if count > self.max_grid_len as f64 {
            return Err(Error::GridTooLarge(count as usize));
        }
        Ok((0..count as usize).map(|k| start + k as f64 * dw).collect())
    }

    /// Distance between the right and left half-maximum crossings.
    fn full_width(&self, time: &[f64], envelope: &[f64]) -> Result<f64> {
        let half = envelope.len() / 2;
        let (left, right) = envelope.split_at(half);

        let i_left = nearest_to_half(left).ok_or(Error::NoCrossing)?;
        let i_right = half + nearest_to_half(right).ok_or(Error::NoCrossing)?;

        let (t_left, t_right) = match self.crossing {
            Crossing::Nearest => (time[i_left], time[i_right]),
            Crossing::Interpolated => (
                refine_crossing(time, envelope, i_left),
                refine_crossing(time, envelope, i_right),
            ),
        };

        let fwhm = t_right - t_left;
        if fwhm.is_finite() {
            Ok(fwhm)
        } else {
            Err(Error::NonFinite("FWHM"))
        }
    }
}

/// FWHM with the default estimator settings.
pub fn estimate_fwhm(wavelength: &[f64], intensity: &[f64]) -> Result<f64> {
    PulseEstimator::default().estimate_fwhm(wavelength, intensity)
}

/// Display form of an estimate: two decimals, or `Error`.
pub fn format_fwhm(estimate: &Result<f64>) -> String {
    match estimate {
        Ok(fwhm) => format!("{fwhm:.2}"),
        Err(_) => "Error".to_string(),
    }
}

/// Normalized inverse FFT in place.
fn inverse_fft(buffer: &mut [Complex64]) {
    let mut planner = FftPlanner::new();
    let ifft = planner.plan_fft_inverse(buffer.len());
    ifft.process(buffer);

    let scale = 1.0 / buffer.len() as f64;
    for sample in buffer.iter_mut() {
        *sample *= scale;
    }
}

/// Centred delay axis matching an fftshift-ed transform of `len` samples
/// whose angular frequency step is `dw`.
fn shifted_time_axis(len: usize, dw: f64) -> Vec<f64> {
    let dt = 2.0 * PI / (len as f64 * dw);
    let offset = (len / 2) as f64;
    (0..len).map(|j| (j as f64 - offset) * dt).collect()
}

/// First index whose value is closest to 0.5.
fn nearest_to_half(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.iter().enumerate() {
        let d = (v - 0.5).abs();
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}

/// Interpolated half-maximum time in a segment adjacent to `idx`, falling
/// back to the sample time when neither neighbour brackets 0.5.
fn refine_crossing(time: &[f64], envelope: &[f64], idx: usize) -> f64 {
    let lo = idx.saturating_sub(1);
    let hi = (idx + 1).min(envelope.len() - 1);
    for (a, b) in [(lo, idx), (idx, hi)] {
        if a == b {
            continue;
        }
        let (ea, eb) = (envelope[a] - 0.5, envelope[b] - 0.5);
        if ea == 0.0 {
            return time[a];
        }
        if ea * eb < 0.0 {
            let t = ea / (ea - eb);
            return time[a] + t * (time[b] - time[a]);
        }
    }
    time[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Wavelength grid that is uniform in ω, ascending in λ.
    fn band(omega_center: f64, omega_width: f64, samples: usize) -> Vec<f64> {
        let two_pi_c = 2.0 * PI * SPEED_OF_LIGHT;
        let mut w: Vec<f64> = (0..samples)
            .map(|i| {
                let omega = omega_center - omega_width / 2.0
                    + omega_width * i as f64 / (samples - 1) as f64;
                two_pi_c / omega
            })
            .collect();
        w.reverse();
        w
    }

    #[test]
    fn flat_top_spectrum_gives_sinc_squared_width() {
        let d_omega = 0.1;
        let w = band(2.0 * PI * SPEED_OF_LIGHT / 800.0, d_omega, 201);
        // Flat spectral density per unit ω.
        let intensity: Vec<f64> = w
            .iter()
            .map(|l| 2.0 * PI * SPEED_OF_LIGHT / (l * l))
            .collect();

        let fwhm = estimate_fwhm(&w, &intensity).unwrap();
        let d_nu = d_omega / (2.0 * PI);
        let expected = 0.8859 / d_nu;
        assert!(
            (fwhm - expected).abs() / expected < 0.02,
            "fwhm {fwhm} expected {expected}"
        );
    }

    #[test]
    fn gaussian_spectrum_time_bandwidth_product() {
        let omega0 = 2.0 * PI * SPEED_OF_LIGHT / 800.0;
        let fwhm_omega = 0.05;
        let sigma = fwhm_omega / (2.0 * (2.0 * 2f64.ln()).sqrt());
        let w = band(omega0, 10.0 * fwhm_omega, 801);
        let intensity: Vec<f64> = w
            .iter()
            .map(|l| {
                let omega = 2.0 * PI * SPEED_OF_LIGHT / l;
                let g = (-(omega - omega0).powi(2) / (2.0 * sigma * sigma)).exp();
                g * 2.0 * PI * SPEED_OF_LIGHT / (l * l)
            })
            .collect();

        let fwhm = PulseEstimator {
            crossing: Crossing::Interpolated,
            ..PulseEstimator::default()
        }
        .estimate_fwhm(&w, &intensity)
        .unwrap();
        let expected = 4.0 * 2f64.ln() / fwhm_omega;
        assert!(
            (fwhm - expected).abs() / expected < 0.01,
            "fwhm {fwhm} expected {expected}"
        );
    }

    #[test]
    fn orientation_does_not_matter() {
        let w = band(2.5, 0.08, 101);
        let intensity: Vec<f64> = (0..101).map(|i| 1.0 + (i as f64 * 0.05).sin().abs()).collect();
        let forward = estimate_fwhm(&w, &intensity).unwrap();

        let w_rev: Vec<f64> = w.iter().rev().copied().collect();
        let i_rev: Vec<f64> = intensity.iter().rev().copied().collect();
        let backward = estimate_fwhm(&w_rev, &i_rev).unwrap();
        assert!((forward - backward).abs() < 1e-6);
    }

    #[test]
    fn degenerate_two_sample_spectrum_fails() {
        let r = estimate_fwhm(&[500.0, 500.0], &[1.0, 1.0]);
        assert_eq!(r, Err(Error::DivideByZero("frequency step")));
        assert_eq!(format_fwhm(&r), "Error");
    }

    #[test]
    fn zero_wavelength_fails() {
        assert!(estimate_fwhm(&[0.0, 500.0], &[1.0, 1.0]).is_err());
    }

    #[test]
    fn single_sample_fails() {
        assert_eq!(
            estimate_fwhm(&[500.0], &[1.0]),
            Err(Error::TooShort { len: 1, min: 2 })
        );
    }

    #[test]
    fn zero_spectrum_fails() {
        let w = band(2.5, 0.08, 51);
        let estimator = PulseEstimator {
            fill: 0.0,
            ..PulseEstimator::default()
        };
        assert_eq!(
            estimator.estimate_fwhm(&w, &vec![0.0; 51]),
            Err(Error::DivideByZero("pulse peak"))
        );
    }

    #[test]
    fn oversized_grid_fails() {
        let estimator = PulseEstimator {
            span_multiple: 1e9,
            ..PulseEstimator::default()
        };
        assert!(matches!(
            estimator.estimate_fwhm(&[500.0, 501.0], &[1.0, 1.0]),
            Err(Error::GridTooLarge(_))
        ));
    }

    #[test]
    fn high_resolution_narrowband_spectrum() {
        // 2048 pixels over 5 nm: several million grid samples.
        let w: Vec<f64> = (0..2048)
            .map(|i| 797.5 + 5.0 * i as f64 / 2047.0)
            .collect();
        let sigma = 1.0 / (2.0 * (2.0 * 2f64.ln()).sqrt());
        let intensity: Vec<f64> = w
            .iter()
            .map(|l| (-(l - 800.0).powi(2) / (2.0 * sigma * sigma)).exp())
            .collect();

        let fwhm = estimate_fwhm(&w, &intensity).unwrap();
        // 1 nm at 800 nm: 0.441 / Δν with Δν = c·Δλ/λ².
        let expected = 0.441 * 800.0 * 800.0 / (SPEED_OF_LIGHT * 1.0);
        assert!(
            (fwhm - expected).abs() / expected < 0.05,
            "fwhm {fwhm} expected {expected}"
        );
    }

    #[test]
    fn grid_cap_is_configurable() {
        let w: Vec<f64> = (0..101).map(|i| 790.0 + 0.2 * i as f64).collect();
        let intensity = vec![1.0; 101];
        let capped = PulseEstimator {
            max_grid_len: 1000,
            ..PulseEstimator::default()
        };
        assert!(matches!(
            capped.estimate_fwhm(&w, &intensity),
            Err(Error::GridTooLarge(_))
        ));
        assert!(estimate_fwhm(&w, &intensity).is_ok());
    }

    #[test]
    fn profile_is_centred_and_normalized() {
        let w = band(2.4, 0.1, 101);
        let intensity = vec![1.0; 101];
        let profile = PulseEstimator::default().profile(&w, &intensity).unwrap();
        let mid = profile.time.len() / 2;
        assert_eq!(profile.time[mid], 0.0);
        let peak = max_of(&profile.envelope);
        assert!((peak - 1.0).abs() < 1e-12);
        assert!(profile.envelope[mid] > 0.99);
    }

    #[test]
    fn time_axis_matches_shifted_fftfreq() {
        let t = shifted_time_axis(4, PI / 2.0);
        // fftfreq(4, d = 1/4) shifted: [-2, -1, 0, 1]
        assert_eq!(t, vec![-2.0, -1.0, 0.0, 1.0]);
        let t = shifted_time_axis(5, 2.0 * PI / 5.0);
        for (a, b) in t.iter().zip([-2.0, -1.0, 0.0, 1.0, 2.0]) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn nearest_prefers_first_minimum() {
        assert_eq!(nearest_to_half(&[0.0, 0.4, 0.6, 0.4]), Some(1));
        assert_eq!(nearest_to_half(&[]), None);
    }

    #[test]
    fn formats_two_decimals() {
        assert_eq!(format_fwhm(&Ok(12.3456)), "12.35");
    }
}
