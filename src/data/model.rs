use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Spectrum – one measured or reference (wavelength, intensity) table
// ---------------------------------------------------------------------------

/// A validated spectrum.
///
/// Wavelengths are finite and strictly monotonic, either ascending or
/// descending, and there are at least two samples. The core never mutates a
/// spectrum in place; every transformation builds a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    wavelength: Vec<f64>,
    intensity: Vec<f64>,
    origin: Option<PathBuf>,
}

/// Direction of a spectrum's wavelength axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

impl Spectrum {
    /// Minimum number of samples for interpolation and step derivation.
    pub const MIN_LEN: usize = 2;

    /// Build a spectrum, checking the data-model invariants.
    pub fn new(wavelength: Vec<f64>, intensity: Vec<f64>) -> Result<Self> {
        if wavelength.len() != intensity.len() {
            return Err(Error::LengthMismatch {
                x: wavelength.len(),
                y: intensity.len(),
            });
        }
        if wavelength.len() < Self::MIN_LEN {
            return Err(Error::TooShort {
                len: wavelength.len(),
                min: Self::MIN_LEN,
            });
        }
        if wavelength.iter().any(|v| !v.is_finite()) {
            return Err(Error::NonFiniteInput("wavelength"));
        }
        if intensity.iter().any(|v| !v.is_finite()) {
            return Err(Error::NonFiniteInput("intensity"));
        }

        let ascending = wavelength[1] > wavelength[0];
        for (i, w) in wavelength.windows(2).enumerate() {
            let ok = if ascending { w[1] > w[0] } else { w[1] < w[0] };
            if !ok {
                return Err(Error::NotMonotonic(i + 1));
            }
        }

        Ok(Self {
            wavelength,
            intensity,
            origin: None,
        })
    }

    /// Attach the file the spectrum was read from.
    pub fn with_origin(mut self, path: impl Into<PathBuf>) -> Self {
        self.origin = Some(path.into());
        self
    }

    /// Same wavelength axis with new intensities.
    pub fn with_intensity(&self, intensity: Vec<f64>) -> Result<Self> {
        let mut next = Self::new(self.wavelength.clone(), intensity)?;
        next.origin = self.origin.clone();
        Ok(next)
    }

    pub fn wavelength(&self) -> &[f64] {
        &self.wavelength
    }

    pub fn intensity(&self) -> &[f64] {
        &self.intensity
    }

    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    pub fn len(&self) -> usize {
        self.wavelength.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelength.is_empty()
    }

    pub fn order(&self) -> Order {
        if self.wavelength[1] > self.wavelength[0] {
            Order::Ascending
        } else {
            Order::Descending
        }
    }

    /// Copies of both columns sorted by ascending wavelength.
    pub fn ascending(&self) -> (Vec<f64>, Vec<f64>) {
        match self.order() {
            Order::Ascending => (self.wavelength.clone(), self.intensity.clone()),
            Order::Descending => (
                self.wavelength.iter().rev().copied().collect(),
                self.intensity.iter().rev().copied().collect(),
            ),
        }
    }

    /// Smallest and largest wavelength.
    pub fn range(&self) -> (f64, f64) {
        let first = self.wavelength[0];
        let last = self.wavelength[self.len() - 1];
        (first.min(last), first.max(last))
    }

    /// Largest intensity value.
    pub fn max_intensity(&self) -> f64 {
        max_of(&self.intensity)
    }
}

/// Largest value of a slice, `-inf` when empty.
pub fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}
