//! Smoothing strategies for response curves and measured spectra.
//!
//! Two interchangeable strategies are offered:
//!
//! * **Polynomial**: Savitzky-Golay smoothing, a least-squares cubic fitted
//!   over a sliding 21-sample window. Interior samples use the window centre;
//!   the first and last ten samples are evaluated on the polynomial fitted to
//!   the first and last full window, so the output has the input's length.
//! * **Boxcar**: a 10-sample moving average with "same" output length; edge
//!   samples average over the part of the window that lies inside the data.
//!
//! The polynomial filter needs more arithmetic per sample, so it is only
//! selected on hosts with enough cores ([`SmoothingStrategy::for_cores`]).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Window length of the polynomial smoother.
pub const POLYNOMIAL_WINDOW: usize = 21;
/// Degree of the polynomial smoother.
pub const POLYNOMIAL_DEGREE: usize = 3;
/// Window length of the boxcar smoother.
pub const BOXCAR_WINDOW: usize = 10;

/// Which smoothing algorithm to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmoothingStrategy {
    Polynomial,
    Boxcar,
}

impl SmoothingStrategy {
    /// Boxcar below `threshold` processing units, polynomial otherwise.
    pub fn for_cores(cores: usize, threshold: usize) -> Self {
        if cores < threshold {
            SmoothingStrategy::Boxcar
        } else {
            SmoothingStrategy::Polynomial
        }
    }
}

/// A smoother bound to one strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Smoother {
    strategy: SmoothingStrategy,
}

impl Smoother {
    pub fn new(strategy: SmoothingStrategy) -> Self {
        Self { strategy }
    }

    pub fn polynomial() -> Self {
        Self::new(SmoothingStrategy::Polynomial)
    }

    pub fn boxcar() -> Self {
        Self::new(SmoothingStrategy::Boxcar)
    }

    pub fn strategy(&self) -> SmoothingStrategy {
        self.strategy
    }

    /// Smooth `data` into a new sequence of the same length.
    pub fn smooth(&self, data: &[f64]) -> Result<Vec<f64>> {
        match self.strategy {
            SmoothingStrategy::Polynomial => {
                polynomial_smooth(data, POLYNOMIAL_WINDOW, POLYNOMIAL_DEGREE)
            }
            SmoothingStrategy::Boxcar => boxcar_smooth(data, BOXCAR_WINDOW),
        }
    }
}

// ---------------------------------------------------------------------------
// Polynomial (Savitzky-Golay)
// ---------------------------------------------------------------------------

/// Savitzky-Golay smoothing with an odd `window` and polynomial `degree`.
///
/// Fails when `data` is shorter than the window.
pub fn polynomial_smooth(data: &[f64], window: usize, degree: usize) -> Result<Vec<f64>> {
    if window % 2 == 0 || degree >= window {
        return Err(Error::InvalidParameter {
            name: "smoothing window",
            value: format!("{window} (degree {degree})"),
        });
    }
    let n = data.len();
    if n < window {
        return Err(Error::TooShort {
            len: n,
            min: window,
        });
    }

    let m = window / 2;
    let fit = LocalFit::new(m, degree)?;
    let mut out = vec![0.0; n];

    // Left edge: polynomial through data[0..window], evaluated at offsets -m..0.
    let head = &data[..window];
    for (j, slot) in out.iter_mut().take(m).enumerate() {
        *slot = dot(&fit.hat_row(j as f64 - m as f64), head);
    }

    let centre = fit.hat_row(0.0);
    for i in m..n - m {
        out[i] = dot(&centre, &data[i - m..=i + m]);
    }

    // Right edge: polynomial through the last window, offsets 1..=m.
    let tail = &data[n - window..];
    for k in 1..=m {
        out[n - m - 1 + k] = dot(&fit.hat_row(k as f64), tail);
    }

    if out.iter().any(|v| !v.is_finite()) {
        return Err(Error::NonFinite("polynomial smoothing"));
    }
    Ok(out)
}

/// Least-squares polynomial fit over the offsets `-m..=m`.
struct LocalFit {
    /// Design matrix, one row per offset: `x^0 .. x^degree`.
    design: Vec<Vec<f64>>,
    /// `(JᵀJ)⁻¹`
    normal_inverse: Vec<Vec<f64>>,
}

impl LocalFit {
    fn new(m: usize, degree: usize) -> Result<Self> {
        let p = degree + 1;
        let design: Vec<Vec<f64>> = (0..=2 * m)
            .map(|i| powers(i as f64 - m as f64, p))
            .collect();

        let mut jtj = vec![vec![0.0; p]; p];
        for (r, row) in jtj.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = design.iter().map(|d| d[r] * d[c]).sum();
            }
        }

        Ok(Self {
            design,
            normal_inverse: invert(jtj)?,
        })
    }

    /// Weights mapping the window samples to the fitted value at offset `t`.
    fn hat_row(&self, t: f64) -> Vec<f64> {
        let p = self.normal_inverse.len();
        let tp = powers(t, p);
        // a = tᵀ (JᵀJ)⁻¹, then weight_i = a · J_i
        let a: Vec<f64> = (0..p)
            .map(|l| (0..p).map(|k| tp[k] * self.normal_inverse[k][l]).sum())
            .collect();
        self.design.iter().map(|row| dot(&a, row)).collect()
    }
}

fn powers(x: f64, p: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(p);
    let mut xk = 1.0;
    for _ in 0..p {
        out.push(xk);
        xk *= x;
    }
    out
}

/// Gauss-Jordan inversion with partial pivoting.
fn invert(mut a: Vec<Vec<f64>>) -> Result<Vec<Vec<f64>>> {
    let p = a.len();
    for (i, row) in a.iter_mut().enumerate() {
        row.resize(2 * p, 0.0);
        row[p + i] = 1.0;
    }

    for col in 0..p {
        let pivot_row = (col..p)
            .max_by(|&x, &y| a[x][col].abs().total_cmp(&a[y][col].abs()))
            .unwrap_or(col);
        a.swap(col, pivot_row);

        let pivot = a[col][col];
        if pivot.abs() < 1e-15 {
            return Err(Error::DivideByZero("polynomial fit"));
        }
        for v in a[col].iter_mut() {
            *v /= pivot;
        }

        let pivot_vals = a[col].clone();
        for (r, row) in a.iter_mut().enumerate() {
            if r == col {
                continue;
            }
            let factor = row[col];
            for (v, pv) in row.iter_mut().zip(&pivot_vals) {
                *v -= factor * pv;
            }
        }
    }

    Ok(a.into_iter().map(|row| row[p..].to_vec()).collect())
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

// ---------------------------------------------------------------------------
// Boxcar
// ---------------------------------------------------------------------------

/// Moving average over `window` samples with same-length output.
///
/// Sample `k` averages `data[k - window/2 ..= k + (window - 1)/2]`, using
/// only the indices that exist.
pub fn boxcar_smooth(data: &[f64], window: usize) -> Result<Vec<f64>> {
    if window == 0 {
        return Err(Error::InvalidParameter {
            name: "smoothing window",
            value: "0".into(),
        });
    }
    if data.is_empty() {
        return Err(Error::TooShort { len: 0, min: 1 });
    }

    let n = data.len();
    let left = window / 2;
    let right = window - left;

    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    for v in data {
        prefix.push(prefix[prefix.len() - 1] + v);
    }

    let out: Vec<f64> = (0..n)
        .map(|k| {
            let lo = k.saturating_sub(left);
            let hi = (k + right).min(n);
            (prefix[hi] - prefix[lo]) / (hi - lo) as f64
        })
        .collect();

    if out.iter().any(|v| !v.is_finite()) {
        return Err(Error::NonFinite("boxcar smoothing"));
    }
    Ok(out)
}
