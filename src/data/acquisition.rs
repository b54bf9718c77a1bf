//! Live spectrum sources.
//!
//! The calibration pipeline treats a spectrometer as just another spectrum
//! source. Hardware drivers plug in through [`DeviceProvider`] and
//! [`Spectrometer`]; [`SimulatedProvider`] stands in when no device is
//! attached.

use std::fmt;

use anyhow::{bail, Result};

use super::model::Spectrum;
use super::synth::{detector_response, laser_line, linspace, SimpleRng};

/// Identity of a connected spectrometer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub model: String,
    pub serial: String,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}:{}>", self.model, self.serial)
    }
}

/// An opened spectrometer that returns one spectrum per call.
pub trait Spectrometer {
    fn info(&self) -> &DeviceInfo;

    /// Read the current (wavelength, intensity) frame.
    fn acquire(&mut self) -> Result<Spectrum>;
}

/// Enumerates and opens spectrometers.
pub trait DeviceProvider {
    fn list_devices(&self) -> Vec<DeviceInfo>;

    fn open(&self, device: &DeviceInfo) -> Result<Box<dyn Spectrometer>>;
}

// ---------------------------------------------------------------------------
// Simulated device
// ---------------------------------------------------------------------------

/// Offers one simulated spectrometer looking at a femtosecond oscillator.
#[derive(Debug, Clone)]
pub struct SimulatedProvider {
    seed: u64,
}

impl SimulatedProvider {
    pub const MODEL: &'static str = "SIM2048";
    pub const SERIAL: &'static str = "SIM00001";

    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new(42)
    }
}

impl DeviceProvider for SimulatedProvider {
    fn list_devices(&self) -> Vec<DeviceInfo> {
        vec![DeviceInfo {
            model: Self::MODEL.into(),
            serial: Self::SERIAL.into(),
        }]
    }

    fn open(&self, device: &DeviceInfo) -> Result<Box<dyn Spectrometer>> {
        if device.model != Self::MODEL {
            bail!("unknown device {device}");
        }
        log::info!("Opened simulated spectrometer {device}");
        Ok(Box::new(SimulatedSpectrometer::new(device.clone(), self.seed)))
    }
}

/// 2048-pixel detector over 700–900 nm seeing a Gaussian line whose centre
/// wanders by a fraction of a nanometre between frames.
pub struct SimulatedSpectrometer {
    info: DeviceInfo,
    wavelength: Vec<f64>,
    response: Vec<f64>,
    rng: SimpleRng,
}

impl SimulatedSpectrometer {
    const CENTER_NM: f64 = 800.0;
    const FWHM_NM: f64 = 30.0;
    const NOISE: f64 = 0.003;

    pub fn new(info: DeviceInfo, seed: u64) -> Self {
        let wavelength = linspace(700.0, 900.0, 2048);
        let response = wavelength.iter().map(|&w| detector_response(w)).collect();
        Self {
            info,
            wavelength,
            response,
            rng: SimpleRng::new(seed),
        }
    }
}

impl Spectrometer for SimulatedSpectrometer {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn acquire(&mut self) -> Result<Spectrum> {
        let center = Self::CENTER_NM + self.rng.gauss(0.0, 0.2);
        let line = laser_line(&self.wavelength, center, Self::FWHM_NM, Self::NOISE, &mut self.rng);
        let counts = line
            .iter()
            .zip(&self.response)
            .map(|(l, r)| 4000.0 * l * r)
            .collect();
        Ok(Spectrum::new(self.wavelength.clone(), counts)?)
    }
}
