use std::path::Path;

use spectrum_calibrator::config::{DefaultFiles, Settings, Workflow};
use spectrum_calibrator::data::export::{calibrated_path, write_columns};
use spectrum_calibrator::data::loader::load_file;
use spectrum_calibrator::data::synth::{blackbody, detector_response, gaussian, linspace};
use spectrum_calibrator::dsp::{format_fwhm, Smoother, SmoothingStrategy};
use spectrum_calibrator::CalibrationSession;

fn write_pair(dir: &Path) {
    let table_wl = linspace(350.0, 1100.0, 151);
    let table: Vec<f64> = table_wl.iter().map(|&w| blackbody(w, 3000.0)).collect();
    write_columns(&dir.join("theo.txt"), &table_wl, &table, 8).unwrap();

    let pixel_wl = linspace(400.0, 1000.0, 600);
    let counts: Vec<f64> = pixel_wl
        .iter()
        .map(|&w| 4000.0 * blackbody(w, 3000.0) * detector_response(w))
        .collect();
    write_columns(&dir.join("exp.txt"), &pixel_wl, &counts, 6).unwrap();

    std::fs::write(
        dir.join("defaultFiles.txt"),
        "experimental:exp.txt\ntheoretical:theo.txt\n",
    )
    .unwrap();
}

fn write_pulse(path: &Path) {
    let wl = linspace(700.0, 900.0, 512);
    let counts: Vec<f64> = wl
        .iter()
        .map(|&w| 3000.0 * gaussian(w, 800.0, 30.0, 1.0) * detector_response(w))
        .collect();
    write_columns(path, &wl, &counts, 6).unwrap();
}

#[test]
fn offline_calibration_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write_pair(dir.path());
    let spectrum_path = dir.path().join("pulse.txt");
    write_pulse(&spectrum_path);

    let settings = Settings {
        calibration_dir: dir.path().to_path_buf(),
        ..Settings::default()
    };
    let files = DefaultFiles::read(&settings.registry_path()).unwrap();
    assert_eq!(files.experimental, dir.path().join("exp.txt"));

    let strategy = settings.smoothing_strategy(Workflow::Offline, 8);
    assert_eq!(strategy, SmoothingStrategy::Polynomial);

    let session = CalibrationSession::new()
        .with_experimental_calibration(load_file(&files.experimental).unwrap())
        .unwrap()
        .with_theoretical_calibration(load_file(&files.theoretical).unwrap())
        .unwrap()
        .smooth_response(&Smoother::new(strategy))
        .unwrap()
        .with_measured(load_file(&spectrum_path).unwrap())
        .with_window_text("800", "150", "4")
        .unwrap()
        .with_filter_enabled(true);

    let response = session.response().unwrap();
    let peak = response
        .curve
        .ratio()
        .iter()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max);
    assert!((peak - 1.0).abs() < 1e-12);

    let out = session.default_export_path().unwrap();
    assert_eq!(out, calibrated_path(&spectrum_path));
    assert_eq!(out.file_name().unwrap(), "pulse_calibrated.txt");

    let precision = settings.export_precision(Workflow::Offline);
    let view = session.export_to(&out, &settings.pulse, precision).unwrap();

    // Detector response divided out: the calibrated line peaks at 800 nm.
    let (imax, _) = view
        .calibrated
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |acc, (i, &v)| if v > acc.1 { (i, v) } else { acc });
    assert!((view.wavelength[imax] - 800.0).abs() < 2.0);

    // 30 nm at 800 nm is roughly a 31 fs transform limit.
    let fwhm = view.fwhm().unwrap();
    assert!(fwhm > 25.0 && fwhm < 40.0, "fwhm = {fwhm}");
    assert_ne!(format_fwhm(&view.fwhm()), "Error");

    let written = load_file(&out).unwrap();
    assert_eq!(written.len(), 512);
    let text = std::fs::read_to_string(&out).unwrap();
    let first = text.lines().next().unwrap();
    for field in first.split(' ') {
        let decimals = field.split('.').nth(1).unwrap();
        assert_eq!(decimals.len(), 2);
    }
}

#[test]
fn live_export_uses_four_decimals() {
    let dir = tempfile::tempdir().unwrap();
    let spectrum_path = dir.path().join("pulse.dat");
    write_pulse(&spectrum_path);

    let settings = Settings::default();
    let session = CalibrationSession::new().with_measured(load_file(&spectrum_path).unwrap());
    let out = session.default_export_path().unwrap();
    assert_eq!(out.file_name().unwrap(), "pulse_calibrated.dat");

    session
        .export_to(&out, &settings.pulse, settings.export_precision(Workflow::Live))
        .unwrap();
    let text = std::fs::read_to_string(&out).unwrap();
    let first = text.lines().next().unwrap();
    assert_eq!(first.split(' ').next().unwrap(), "700.0000");
}

#[test]
fn degenerate_spectrum_is_not_exported() {
    let dir = tempfile::tempdir().unwrap();
    let spectrum_path = dir.path().join("dark.txt");
    std::fs::write(&spectrum_path, "700 0\n750 0\n800 0\n").unwrap();

    let session = CalibrationSession::new().with_measured(load_file(&spectrum_path).unwrap());
    let out = session.default_export_path().unwrap();
    assert!(session
        .export_to(&out, &Settings::default().pulse, 2)
        .is_err());
    assert!(!out.exists());
}

#[test]
fn unreadable_file_reports_format_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "hello world\n").unwrap();

    let err = load_file(&path).unwrap_err();
    assert!(format!("{err}").contains("wrong file format"));
}
