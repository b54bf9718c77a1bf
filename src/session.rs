//! The calibration session: every input the display depends on, held as
//! one immutable value.
//!
//! Each operation returns a new session and leaves `self` untouched, so a
//! failed step keeps the last good state on screen.

use std::path::{Path, PathBuf};

use crate::data::export::{calibrated_path, write_columns};
use crate::data::model::{max_of, Spectrum};
use crate::dsp::{PulseEstimator, PulseProfile, Response, Smoother, WindowParams};
use crate::dsp::response::compute_response;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct CalibrationSession {
    experimental: Option<Spectrum>,
    theoretical: Option<Spectrum>,
    response: Option<Response>,
    /// Spectrum as loaded or acquired.
    measured: Option<Spectrum>,
    /// Measured spectrum after any smoothing.
    working: Option<Spectrum>,
    window: Option<WindowParams>,
    filter_enabled: bool,
}

/// Everything the presentation layer draws for one session state.
#[derive(Debug, Clone)]
pub struct CalibratedView {
    pub wavelength: Vec<f64>,
    /// Raw measured spectrum, `|I| / max(I)`.
    pub measured: Vec<f64>,
    /// Corrected (and windowed, when filtering) spectrum, peak 1.
    pub calibrated: Vec<f64>,
    /// Window curve; `None` when filtering is off.
    pub window: Option<Result<Vec<f64>>>,
    pub pulse: Result<PulseProfile>,
    /// Corrected spectrum rescaled to the raw peak, as written on export.
    pub export_intensity: Vec<f64>,
}

impl CalibratedView {
    pub fn fwhm(&self) -> Result<f64> {
        self.pulse.as_ref().map(|p| p.fwhm).map_err(Clone::clone)
    }
}

impl CalibrationSession {
    pub fn new() -> Self {
        Self::default()
    }

    // -- accessors --

    pub fn experimental(&self) -> Option<&Spectrum> {
        self.experimental.as_ref()
    }

    pub fn theoretical(&self) -> Option<&Spectrum> {
        self.theoretical.as_ref()
    }

    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    pub fn measured(&self) -> Option<&Spectrum> {
        self.measured.as_ref()
    }

    pub fn working(&self) -> Option<&Spectrum> {
        self.working.as_ref()
    }

    pub fn window(&self) -> Option<WindowParams> {
        self.window
    }

    pub fn filter_enabled(&self) -> bool {
        self.filter_enabled
    }

    // -- calibration inputs --

    /// Replace the measured calibration spectrum and recompute the response.
    pub fn with_experimental_calibration(&self, spectrum: Spectrum) -> Result<Self> {
        let mut next = self.clone();
        next.experimental = Some(spectrum);
        next.recompute_response()?;
        Ok(next)
    }

    /// Replace the theoretical calibration spectrum and recompute the response.
    pub fn with_theoretical_calibration(&self, spectrum: Spectrum) -> Result<Self> {
        let mut next = self.clone();
        next.theoretical = Some(spectrum);
        next.recompute_response()?;
        Ok(next)
    }

    fn recompute_response(&mut self) -> Result<()> {
        self.response = match (&self.experimental, &self.theoretical) {
            (Some(exp), Some(theo)) => {
                let response = compute_response(exp, theo)?;
                log::info!("Instrument response computed over {} samples", exp.len());
                Some(response)
            }
            _ => None,
        };
        Ok(())
    }

    /// Smooth the response curve with the configured strategy.
    pub fn smooth_response(&self, smoother: &Smoother) -> Result<Self> {
        let response = self.response.as_ref().ok_or(Error::Missing("calibration"))?;
        let mut next = self.clone();
        next.response = Some(response.smoothed(smoother)?);
        log::debug!("Response smoothed ({:?})", smoother.strategy());
        Ok(next)
    }

    // -- measured spectrum --

    /// Install a freshly loaded or acquired spectrum; smoothing starts over.
    pub fn with_measured(&self, spectrum: Spectrum) -> Self {
        let mut next = self.clone();
        next.working = Some(spectrum.clone());
        next.measured = Some(spectrum);
        next
    }

    /// Smooth the working copy of the measured spectrum. Repeated calls
    /// smooth further.
    pub fn smooth_spectrum(&self, smoother: &Smoother) -> Result<Self> {
        let working = self.working.as_ref().ok_or(Error::Missing("spectrum"))?;
        let smoothed = working.with_intensity(smoother.smooth(working.intensity())?)?;
        let mut next = self.clone();
        next.working = Some(smoothed);
        Ok(next)
    }

    // -- spectral window --

    /// Parse and install window parameters from their text fields.
    ///
    /// Fails when a field does not parse or the window cannot be evaluated
    /// on the current spectrum; the previous parameters stay in force.
    pub fn with_window_text(&self, center: &str, width: &str, exponent: &str) -> Result<Self> {
        self.with_window(WindowParams::parse(center, width, exponent)?)
    }

    pub fn with_window(&self, params: WindowParams) -> Result<Self> {
        if let Some(working) = &self.working {
            params.apply(working.wavelength())?;
        }
        let mut next = self.clone();
        next.window = Some(params);
        Ok(next)
    }

    pub fn with_filter_enabled(&self, enabled: bool) -> Self {
        let mut next = self.clone();
        next.filter_enabled = enabled;
        next
    }

    // -- derived values --

    /// Corrected spectrum on the measured grid, before normalization.
    ///
    /// Without a calibration this falls back to `|I| / max(I)`.
    fn corrected(&self, working: &Spectrum) -> Result<Vec<f64>> {
        match &self.response {
            Some(response) => response.correct(working),
            None => normalize_abs(working.intensity()),
        }
    }

    /// Compute every display value for the current state.
    pub fn render(&self, estimator: &PulseEstimator) -> Result<CalibratedView> {
        let measured = self.measured.as_ref().ok_or(Error::Missing("spectrum"))?;
        let working = self.working.as_ref().ok_or(Error::Missing("spectrum"))?;
        let wavelength = working.wavelength().to_vec();

        let mut display = self.corrected(working)?;

        let window = self.filter_enabled.then(|| {
            self.window
                .ok_or(Error::Missing("window parameters"))
                .and_then(|p| p.apply(&wavelength))
        });
        if let Some(Ok(filter)) = &window {
            let peak = display_peak(&display, "calibrated spectrum")?;
            display = display
                .iter()
                .zip(filter)
                .map(|(d, f)| f * d / peak)
                .collect();
        } else if let Some(Err(e)) = &window {
            log::warn!("Spectral window not applied: {e}");
        }

        let peak = display_peak(&display, "calibrated spectrum")?;
        let calibrated = display.iter().map(|d| d / peak).collect();

        let raw_peak = measured.max_intensity();
        let export_intensity = display.iter().map(|d| d * raw_peak).collect();

        let pulse = estimator.profile(&wavelength, &display);
        if let Err(e) = &pulse {
            log::warn!("Pulse estimation failed: {e}");
        }

        Ok(CalibratedView {
            measured: normalize_abs(measured.intensity())?,
            wavelength,
            calibrated,
            window,
            pulse,
            export_intensity,
        })
    }

    /// Where an export of the current spectrum goes by default.
    pub fn default_export_path(&self) -> Option<PathBuf> {
        self.measured
            .as_ref()
            .and_then(|m| m.origin())
            .map(calibrated_path)
    }

    /// Render and write the calibrated spectrum to `path`.
    pub fn export_to(
        &self,
        path: &Path,
        estimator: &PulseEstimator,
        precision: usize,
    ) -> anyhow::Result<CalibratedView> {
        let view = self.render(estimator)?;
        write_columns(path, &view.wavelength, &view.export_intensity, precision)?;
        Ok(view)
    }
}

/// Normalization peak: the maximum when positive, otherwise the largest
/// magnitude, so a fully negative trace (e.g. after dark subtraction) still
/// draws.
fn display_peak(values: &[f64], what: &'static str) -> Result<f64> {
    let max = max_of(values);
    let peak = if max > 0.0 {
        max
    } else {
        values.iter().fold(0.0f64, |m, v| m.max(v.abs()))
    };
    if peak == 0.0 {
        return Err(Error::DivideByZero(what));
    }
    if !peak.is_finite() {
        return Err(Error::NonFinite(what));
    }
    Ok(peak)
}

fn normalize_abs(values: &[f64]) -> Result<Vec<f64>> {
    let peak = display_peak(values, "spectrum normalization")?;
    Ok(values.iter().map(|v| v.abs() / peak).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spectrum(w: &[f64], i: &[f64]) -> Spectrum {
        Spectrum::new(w.to_vec(), i.to_vec()).unwrap()
    }

    fn flat(n: usize) -> Spectrum {
        let w: Vec<f64> = (0..n).map(|i| 700.0 + i as f64).collect();
        spectrum(&w, &vec![1.0; n])
    }

    fn bump(n: usize) -> Spectrum {
        let w: Vec<f64> = (0..n).map(|i| 700.0 + i as f64).collect();
        let i: Vec<f64> = w
            .iter()
            .map(|l| (-((l - 750.0) / 15.0).powi(2)).exp())
            .collect();
        spectrum(&w, &i)
    }

    #[test]
    fn response_needs_both_calibrations() {
        let s = CalibrationSession::new()
            .with_experimental_calibration(flat(10))
            .unwrap();
        assert!(s.response().is_none());
        let s = s.with_theoretical_calibration(flat(10)).unwrap();
        assert!(s.response().is_some());
    }

    #[test]
    fn failed_recompute_leaves_previous_session() {
        let s = CalibrationSession::new()
            .with_experimental_calibration(flat(10))
            .unwrap()
            .with_theoretical_calibration(flat(10))
            .unwrap();
        let far = spectrum(&[1500.0, 1600.0], &[1.0, 1.0]);
        assert_eq!(
            s.with_theoretical_calibration(far).unwrap_err(),
            Error::DisjointDomains
        );
        assert!(s.response().is_some());
    }

    #[test]
    fn render_without_spectrum_is_missing() {
        let err = CalibrationSession::new()
            .render(&PulseEstimator::default())
            .unwrap_err();
        assert_eq!(err, Error::Missing("spectrum"));
    }

    #[test]
    fn uncalibrated_render_normalizes() {
        let s = CalibrationSession::new().with_measured(bump(101));
        let view = s.render(&PulseEstimator::default()).unwrap();
        assert_eq!(view.wavelength.len(), 101);
        assert!((max_of(&view.calibrated) - 1.0).abs() < 1e-12);
        assert!(view.window.is_none());
        assert!(view.fwhm().is_ok());
    }

    #[test]
    fn calibration_divides_out_response() {
        let cal = bump(101);
        let s = CalibrationSession::new()
            .with_experimental_calibration(cal.clone())
            .unwrap()
            .with_theoretical_calibration(flat(101))
            .unwrap()
            .with_measured(cal);
        let view = s.render(&PulseEstimator::default()).unwrap();
        // Measured equals the instrument response, so the corrected spectrum is flat.
        for v in &view.calibrated {
            assert!((v - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn bad_window_text_keeps_previous_parameters() {
        let s = CalibrationSession::new()
            .with_measured(bump(101))
            .with_window_text("750", "20", "2")
            .unwrap();
        assert!(s.with_window_text("750", "0", "2").is_err());
        assert!(s.with_window_text("abc", "20", "2").is_err());
        assert_eq!(s.window().map(|w| w.width), Some(20.0));
    }

    #[test]
    fn filter_applies_only_when_enabled() {
        let s = CalibrationSession::new()
            .with_measured(flat(101))
            .with_window_text("750", "10", "2")
            .unwrap();
        let off = s.render(&PulseEstimator::default()).unwrap();
        assert!(off.calibrated.iter().all(|v| (v - 1.0).abs() < 1e-12));

        let on = s.with_filter_enabled(true).render(&PulseEstimator::default()).unwrap();
        let window = on.window.as_ref().unwrap().as_ref().unwrap();
        assert_eq!(window.len(), 101);
        assert!(on.calibrated[0] < 1e-6);
        assert!((on.calibrated[50] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn enabled_filter_without_parameters_is_skipped() {
        let s = CalibrationSession::new()
            .with_measured(bump(101))
            .with_filter_enabled(true);
        let view = s.render(&PulseEstimator::default()).unwrap();
        assert!(matches!(view.window, Some(Err(Error::Missing(_)))));
    }

    #[test]
    fn smoothing_short_spectrum_is_a_no_op() {
        let s = CalibrationSession::new().with_measured(bump(10));
        assert!(s.smooth_spectrum(&Smoother::polynomial()).is_err());
        assert_eq!(s.working().unwrap().intensity(), s.measured().unwrap().intensity());
    }

    #[test]
    fn smoothing_keeps_raw_measurement() {
        let s = CalibrationSession::new().with_measured(bump(101));
        let smoothed = s.smooth_spectrum(&Smoother::boxcar()).unwrap();
        assert_ne!(
            smoothed.working().unwrap().intensity(),
            smoothed.measured().unwrap().intensity()
        );
        assert_eq!(smoothed.measured(), s.measured());
    }

    #[test]
    fn smooth_response_requires_calibration() {
        assert_eq!(
            CalibrationSession::new()
                .smooth_response(&Smoother::boxcar())
                .unwrap_err(),
            Error::Missing("calibration")
        );
    }

    #[test]
    fn failed_response_smoothing_keeps_response() {
        let s = CalibrationSession::new()
            .with_experimental_calibration(bump(10))
            .unwrap()
            .with_theoretical_calibration(flat(10))
            .unwrap();
        let before = s.response().cloned();
        assert!(matches!(
            s.smooth_response(&Smoother::polynomial()),
            Err(Error::TooShort { len: 10, min: 21 })
        ));
        assert_eq!(s.response().cloned(), before);

        let smoothed = s.smooth_response(&Smoother::boxcar()).unwrap();
        assert_ne!(smoothed.response(), s.response());
        let ratio = smoothed.response().unwrap().curve.ratio();
        assert_eq!(ratio.len(), 10);
        assert_eq!(max_of(ratio), 1.0);
    }

    #[test]
    fn negative_spectrum_still_renders() {
        let w: Vec<f64> = (0..101).map(|i| 700.0 + i as f64).collect();
        let i: Vec<f64> = bump(101).intensity().iter().map(|v| -v - 0.01).collect();
        let s = CalibrationSession::new()
            .with_experimental_calibration(flat(101))
            .unwrap()
            .with_theoretical_calibration(flat(101))
            .unwrap()
            .with_measured(spectrum(&w, &i));

        let view = s.render(&PulseEstimator::default()).unwrap();
        assert_eq!(view.calibrated.len(), 101);
        assert!((max_of(&view.measured) - 1.0).abs() < 1e-12);
        assert!(view.measured.iter().all(|v| *v > 0.0));
        assert!(view.calibrated.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn zero_spectrum_render_fails() {
        let s = CalibrationSession::new().with_measured(spectrum(&[1.0, 2.0], &[0.0, 0.0]));
        assert!(s.render(&PulseEstimator::default()).is_err());
    }
}
