//! Error types for the calibration core.

use thiserror::Error;

/// Result type for calibration and estimation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the numeric core.
///
/// None of these are fatal: callers keep their last valid state and report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Paired sequences of different length.
    #[error("length mismatch: {x} abscissa values but {y} ordinate values")]
    LengthMismatch { x: usize, y: usize },

    /// Sequence shorter than the operation requires.
    #[error("sequence too short: {len} samples, at least {min} required")]
    TooShort { len: usize, min: usize },

    /// Interpolation source abscissa not strictly ascending.
    #[error("interpolation abscissa must be strictly ascending")]
    NotAscending,

    /// Wavelength axis with repeated values or a change of direction.
    #[error("wavelength axis is not strictly monotonic at index {0}")]
    NotMonotonic(usize),

    /// A sample that is NaN or infinite.
    #[error("non-finite value in {0}")]
    NonFiniteInput(&'static str),

    /// Calibration spectra whose wavelength ranges do not overlap.
    #[error("calibration spectra cover disjoint wavelength ranges")]
    DisjointDomains,

    /// Response ratio that is zero (or invalid) everywhere.
    #[error("instrument response has no positive maximum")]
    ZeroResponse,

    /// Division by an exact zero.
    #[error("division by zero in {0}")]
    DivideByZero(&'static str),

    /// An intermediate result overflowed or became NaN.
    #[error("numerically invalid result in {0}")]
    NonFinite(&'static str),

    /// Uniform frequency grid would not fit in memory.
    #[error("frequency grid of {0} samples exceeds the transform limit")]
    GridTooLarge(usize),

    /// No half-maximum crossing on one side of the pulse.
    #[error("no half-maximum crossing found")]
    NoCrossing,

    /// A user-supplied filter parameter that does not parse.
    #[error("invalid {name}: '{value}'")]
    InvalidParameter { name: &'static str, value: String },

    /// A session operation that needs an input which is not loaded yet.
    #[error("{0} not loaded")]
    Missing(&'static str),
}
