use std::path::{Path, PathBuf};

use spectrum_calibrator::config::{DefaultFiles, Settings, Workflow};
use spectrum_calibrator::data::acquisition::{DeviceInfo, DeviceProvider, SimulatedProvider, Spectrometer};
use spectrum_calibrator::data::loader::load_file;
use spectrum_calibrator::dsp::{format_fwhm, Smoother};
use spectrum_calibrator::{CalibratedView, CalibrationSession};

use crate::color::CurveColors;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Current calibration inputs; replaced wholesale by every operation.
    pub session: CalibrationSession,

    /// Last successfully rendered view (kept when a later render fails).
    pub view: Option<CalibratedView>,

    pub settings: Settings,
    pub workflow: Workflow,

    /// Strategy used for the response curve, fixed at startup.
    pub response_smoother: Smoother,

    /// Window parameter text fields.
    pub center_text: String,
    pub width_text: String,
    pub exponent_text: String,

    pub experimental_path: Option<PathBuf>,
    pub theoretical_path: Option<PathBuf>,
    pub spectrum_path: Option<PathBuf>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
    /// Result of the last export.
    pub export_label: String,

    pub colors: CurveColors,

    // ---- live acquisition ----
    pub provider: Box<dyn DeviceProvider>,
    pub devices: Vec<DeviceInfo>,
    pub device: Option<Box<dyn Spectrometer>>,
    pub continuous: bool,
}

impl AppState {
    /// Build the state and preload the registry's calibration files.
    pub fn new(settings: Settings, workflow: Workflow, cores: usize) -> Self {
        let strategy = settings.smoothing_strategy(workflow, cores);
        log::info!("{cores} cores available, response smoothing: {strategy:?}");

        let mut state = Self {
            session: CalibrationSession::new(),
            view: None,
            settings,
            workflow,
            response_smoother: Smoother::new(strategy),
            center_text: String::new(),
            width_text: String::new(),
            exponent_text: String::new(),
            experimental_path: None,
            theoretical_path: None,
            spectrum_path: None,
            status_message: None,
            export_label: String::new(),
            colors: CurveColors::default(),
            provider: Box::new(SimulatedProvider::default()),
            devices: Vec::new(),
            device: None,
            continuous: false,
        };

        if let Some(files) = DefaultFiles::read(&state.settings.registry_path()) {
            state.load_experimental(&files.experimental);
            state.load_theoretical(&files.theoretical);
        }
        state
    }

    /// Adopt a new session, or keep the current one and report the failure.
    fn apply(&mut self, what: &str, next: spectrum_calibrator::Result<CalibrationSession>) -> bool {
        match next {
            Ok(session) => {
                self.session = session;
                self.status_message = None;
                self.refresh();
                true
            }
            Err(e) => {
                log::warn!("{what} failed: {e}");
                self.status_message = Some(format!("{what}: {e}"));
                false
            }
        }
    }

    /// Recompute the display values from the current session.
    pub fn refresh(&mut self) {
        self.export_label.clear();
        if self.session.measured().is_none() {
            return;
        }
        match self.session.render(&self.settings.pulse) {
            Ok(view) => self.view = Some(view),
            Err(e) => {
                log::warn!("Render failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// FWHM text for the side panel.
    pub fn fwhm_text(&self) -> String {
        match &self.view {
            Some(view) => format_fwhm(&view.fwhm()),
            None => "-".into(),
        }
    }

    // ---- calibration ----

    pub fn load_experimental(&mut self, path: &Path) {
        match load_file(path) {
            Ok(sp) => {
                log::info!("Loaded experimental calibration {}", path.display());
                let next = self.session.with_experimental_calibration(sp);
                if self.apply("Calibration", next) {
                    self.experimental_path = Some(path.to_path_buf());
                }
            }
            Err(e) => self.report_load_error(e),
        }
    }

    pub fn load_theoretical(&mut self, path: &Path) {
        match load_file(path) {
            Ok(sp) => {
                log::info!("Loaded theoretical calibration {}", path.display());
                let next = self.session.with_theoretical_calibration(sp);
                if self.apply("Calibration", next) {
                    self.theoretical_path = Some(path.to_path_buf());
                }
            }
            Err(e) => self.report_load_error(e),
        }
    }

    pub fn smooth_response(&mut self) {
        let next = self.session.smooth_response(&self.response_smoother);
        self.apply("Response smoothing", next);
    }

    // ---- measured spectrum ----

    pub fn load_spectrum(&mut self, path: &Path) {
        match load_file(path) {
            Ok(sp) => {
                log::info!("Loaded spectrum {} ({} samples)", path.display(), sp.len());
                self.spectrum_path = Some(path.to_path_buf());
                self.session = self.session.with_measured(sp);
                self.status_message = None;
                self.refresh();
            }
            Err(e) => self.report_load_error(e),
        }
    }

    pub fn smooth_spectrum(&mut self) {
        let next = self.session.smooth_spectrum(&Smoother::polynomial());
        self.apply("Spectrum smoothing", next);
    }

    fn report_load_error(&mut self, e: anyhow::Error) {
        log::error!("Failed to load file: {e:#}");
        self.status_message = Some("Wrong file format".into());
    }

    // ---- spectral window ----

    pub fn set_filter_enabled(&mut self, enabled: bool) {
        self.session = self.session.with_filter_enabled(enabled);
        if enabled && self.session.window().is_none() {
            self.commit_window_fields();
        } else {
            self.refresh();
        }
    }

    /// Parse the window text fields into the session.
    pub fn commit_window_fields(&mut self) {
        let next = self
            .session
            .with_window_text(&self.center_text, &self.width_text, &self.exponent_text);
        if !self.apply("Window", next) {
            self.refresh();
        }
    }

    // ---- export ----

    pub fn export(&mut self) {
        let Some(path) = self.export_path() else {
            self.export_label = "Try again".into();
            return;
        };
        let precision = self.settings.export_precision(self.workflow);
        match self.session.export_to(&path, &self.settings.pulse, precision) {
            Ok(_) => self.export_label = "Saved!".into(),
            Err(e) => {
                log::error!("Export failed: {e:#}");
                self.export_label = "Try again".into();
            }
        }
    }

    fn export_path(&self) -> Option<PathBuf> {
        self.session.default_export_path().or_else(|| {
            self.session
                .measured()
                .map(|_| self.settings.calibration_dir.join("live_calibrated.txt"))
        })
    }

    // ---- live acquisition ----

    pub fn scan_devices(&mut self) {
        self.devices = self.provider.list_devices();
        log::info!("Found {} spectrometer(s)", self.devices.len());
    }

    pub fn select_device(&mut self, index: usize) {
        let Some(info) = self.devices.get(index).cloned() else {
            self.device = None;
            return;
        };
        match self.provider.open(&info) {
            Ok(device) => {
                self.device = Some(device);
                self.acquire();
            }
            Err(e) => {
                log::error!("Opening {info} failed: {e:#}");
                self.status_message = Some(format!("Cannot open {info}"));
                self.device = None;
            }
        }
    }

    pub fn acquire(&mut self) {
        let Some(device) = self.device.as_mut() else {
            return;
        };
        match device.acquire() {
            Ok(sp) => {
                self.session = self.session.with_measured(sp);
                self.refresh();
            }
            Err(e) => {
                log::warn!("Acquisition failed: {e:#}");
                self.status_message = Some(format!("Acquisition failed: {e}"));
            }
        }
    }
}
