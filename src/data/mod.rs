//! Data layer: spectrum type, file I/O, and live sources.
//!
//! Architecture:
//! ```text
//!  .txt / .csv / .parquet       spectrometer
//!        │                          │
//!        ▼                          ▼
//!   ┌──────────┐             ┌─────────────┐
//!   │  loader   │             │ acquisition │
//!   └──────────┘             └─────────────┘
//!        │                          │
//!        └────────────┬─────────────┘
//!                     ▼
//!               ┌──────────┐
//!               │ Spectrum  │  validated (λ, I) pairs
//!               └──────────┘
//!                     │  calibration core (crate::dsp)
//!                     ▼
//!               ┌──────────┐
//!               │  export   │  <name>_calibrated.txt
//!               └──────────┘
//! ```

pub mod acquisition;
pub mod export;
pub mod loader;
pub mod model;
pub mod synth;
