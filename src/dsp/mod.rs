//! Numeric core: calibration, smoothing, windowing and pulse estimation.
//!
//! ```text
//!  experimental cal ─┐
//!                    ├─ response ──► R(λ), 1/R ──┐
//!  theoretical cal ──┘    ▲                      │
//!                      resample                  ▼
//!  measured spectrum ── smooth ──────────► corrected ── window ── pulse ──► FWHM
//! ```

pub mod pulse;
pub mod resample;
pub mod response;
pub mod smooth;
pub mod window;

pub use pulse::{estimate_fwhm, format_fwhm, Crossing, PulseEstimator, PulseProfile};
pub use resample::resample;
pub use response::{compute_response, CorrectionFactor, Response, ResponseCurve};
pub use smooth::{Smoother, SmoothingStrategy};
pub use window::{apply_window, WindowParams};
