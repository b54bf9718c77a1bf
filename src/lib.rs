//! Spectrometer response calibration and transform-limited pulse duration
//! estimation.
//!
//! A measured and a theoretical calibration spectrum give the instrument
//! response R(λ); its reciprocal corrects subsequently measured spectra,
//! which can be smoothed and windowed before the pulse duration (FWHM) of
//! the shortest pulse compatible with the spectrum is estimated.

pub mod config;
pub mod data;
pub mod dsp;
pub mod error;
pub mod session;

pub use error::{Error, Result};
pub use session::{CalibratedView, CalibrationSession};
