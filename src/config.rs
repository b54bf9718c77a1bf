//! Runtime settings and the default calibration-file registry.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::dsp::{PulseEstimator, SmoothingStrategy};

/// Which workflow the tool runs: files from disk, or a live spectrometer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    Offline,
    Live,
}

/// Settings read from an optional JSON file. Missing keys take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Fewer cores than this selects boxcar smoothing for file workflows.
    pub offline_core_threshold: usize,
    /// Fewer cores than this selects boxcar smoothing for live acquisition.
    pub live_core_threshold: usize,
    /// Directory holding the calibration tables and the registry file.
    pub calibration_dir: PathBuf,
    pub registry_file: String,
    pub pulse: PulseEstimator,
    pub export: ExportSettings,
}

/// Decimal places used when writing calibrated spectra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub offline_precision: usize,
    pub live_precision: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            offline_core_threshold: 4,
            live_core_threshold: 16,
            calibration_dir: PathBuf::from("calibrationData"),
            registry_file: "defaultFiles.txt".into(),
            pulse: PulseEstimator::default(),
            export: ExportSettings::default(),
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            offline_precision: 2,
            live_precision: 4,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing settings {}", path.display()))
    }

    /// Settings from `path` when given and readable, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Using default settings: {e:#}");
                Self::default()
            }
        }
    }

    pub fn core_threshold(&self, workflow: Workflow) -> usize {
        match workflow {
            Workflow::Offline => self.offline_core_threshold,
            Workflow::Live => self.live_core_threshold,
        }
    }

    pub fn export_precision(&self, workflow: Workflow) -> usize {
        match workflow {
            Workflow::Offline => self.export.offline_precision,
            Workflow::Live => self.export.live_precision,
        }
    }

    /// Resolve the response-smoothing strategy for a host with `cores`.
    pub fn smoothing_strategy(&self, workflow: Workflow, cores: usize) -> SmoothingStrategy {
        SmoothingStrategy::for_cores(cores, self.core_threshold(workflow))
    }

    pub fn registry_path(&self) -> PathBuf {
        self.calibration_dir.join(&self.registry_file)
    }
}

/// Number of processing units on this host (1 when it cannot be probed).
pub fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

// ---------------------------------------------------------------------------
// Default-file registry
// ---------------------------------------------------------------------------

/// Calibration files preloaded at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultFiles {
    pub experimental: PathBuf,
    pub theoretical: PathBuf,
}

impl DefaultFiles {
    /// Parse two `label:relativePath` lines; paths resolve against `base`.
    pub fn parse(text: &str, base: &Path) -> Option<Self> {
        let mut entries = text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| {
                let (_, path) = l.split_once(':')?;
                let path = path.trim();
                (!path.is_empty()).then(|| base.join(path))
            });

        let experimental = entries.next()??;
        let theoretical = entries.next()??;
        Some(Self {
            experimental,
            theoretical,
        })
    }

    /// Read the registry file; `None` (logged) when absent or malformed.
    pub fn read(path: &Path) -> Option<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                log::warn!("No default calibration files ({}): {e}", path.display());
                return None;
            }
        };
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let parsed = Self::parse(&text, base);
        if parsed.is_none() {
            log::warn!("Malformed default-file registry {}", path.display());
        }
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::Crossing;

    #[test]
    fn thresholds_differ_per_workflow() {
        let s = Settings::default();
        assert_eq!(s.core_threshold(Workflow::Offline), 4);
        assert_eq!(s.core_threshold(Workflow::Live), 16);
        assert_eq!(s.smoothing_strategy(Workflow::Offline, 8), SmoothingStrategy::Polynomial);
        assert_eq!(s.smoothing_strategy(Workflow::Live, 8), SmoothingStrategy::Boxcar);
        assert_eq!(s.export_precision(Workflow::Offline), 2);
        assert_eq!(s.export_precision(Workflow::Live), 4);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let s: Settings = serde_json::from_str(
            r#"{ "live_core_threshold": 8, "pulse": { "crossing": "interpolated" } }"#,
        )
        .unwrap();
        assert_eq!(s.live_core_threshold, 8);
        assert_eq!(s.offline_core_threshold, 4);
        assert_eq!(s.pulse.crossing, Crossing::Interpolated);
        assert_eq!(s.pulse.span_multiple, 10.0);
    }

    #[test]
    fn malformed_settings_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_or_default(Some(path.as_path())), Settings::default());
    }

    #[test]
    fn registry_resolves_against_base() {
        let files =
            DefaultFiles::parse("exp:lamp_measured.txt\ntheo: lamp_theory.txt\n", Path::new("cal"))
                .unwrap();
        assert_eq!(files.experimental, PathBuf::from("cal/lamp_measured.txt"));
        assert_eq!(files.theoretical, PathBuf::from("cal/lamp_theory.txt"));
    }

    #[test]
    fn registry_needs_two_entries() {
        assert!(DefaultFiles::parse("exp:a.txt\n", Path::new("")).is_none());
        assert!(DefaultFiles::parse("exp a.txt\ntheo:b.txt", Path::new("")).is_none());
        assert!(DefaultFiles::read(Path::new("/nonexistent/defaultFiles.txt")).is_none());
    }
}
