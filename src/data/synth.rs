//! Deterministic synthetic spectra for the simulated spectrometer and the
//! sample-data generator.

use std::f64::consts::PI;

/// Seeded xorshift64* generator for reproducible detector noise.
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    pub fn new(seed: u64) -> Self {
        // splitmix64 scramble; xorshift needs a non-zero state.
        let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        Self {
            state: (z ^ (z >> 31)) | 1,
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Uniform sample in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Normal sample with the given mean and standard deviation.
    pub fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(f64::MIN_POSITIVE);
        let u2 = self.next_f64();
        mean + std_dev * (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}

/// Evenly spaced wavelengths from `start` to `stop` inclusive.
pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if count < 2 {
        return vec![start; count];
    }
    let step = (stop - start) / (count - 1) as f64;
    (0..count).map(|i| start + i as f64 * step).collect()
}

/// Gaussian line with the given full width at half maximum.
pub fn gaussian(x: f64, center: f64, fwhm: f64, amplitude: f64) -> f64 {
    let sigma = fwhm / (2.0 * (2.0 * 2f64.ln()).sqrt());
    amplitude * (-(x - center).powi(2) / (2.0 * sigma * sigma)).exp()
}

/// Blackbody spectral radiance at `wavelength_nm`, normalized to its value
/// at 1 µm so calibration-lamp tables stay in a readable range.
pub fn blackbody(wavelength_nm: f64, temperature_k: f64) -> f64 {
    // hc/k in nm·K
    const HC_OVER_K: f64 = 1.438_777e7;
    let radiance = |l: f64| 1.0 / (l.powi(5) * ((HC_OVER_K / (l * temperature_k)).exp() - 1.0));
    radiance(wavelength_nm) / radiance(1000.0)
}

/// A plausible silicon-detector grating response: broad hump peaking in the
/// red, falling off toward both ends.
pub fn detector_response(wavelength_nm: f64) -> f64 {
    0.05 + gaussian(wavelength_nm, 650.0, 450.0, 0.95)
}

/// Noisy Gaussian laser line sampled at `wavelength`.
pub fn laser_line(
    wavelength: &[f64],
    center: f64,
    fwhm: f64,
    noise: f64,
    rng: &mut SimpleRng,
) -> Vec<f64> {
    wavelength
        .iter()
        .map(|&w| gaussian(w, center, fwhm, 1.0) + rng.gauss(0.0, noise))
        .collect()
}
