use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints, PlotUi};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Plots (central panel)
// ---------------------------------------------------------------------------

fn draw_line(plot_ui: &mut PlotUi, x: &[f64], y: &[f64], name: &str, color: Color32) {
    let points: PlotPoints = x.iter().zip(y).map(|(&xi, &yi)| [xi, yi]).collect();
    plot_ui.line(Line::new(points).name(name).color(color).width(1.5));
}

/// Measured, calibrated and window curves against wavelength.
pub fn spectral_plot(ui: &mut Ui, state: &AppState, height: f32) {
    let Some(view) = &state.view else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a spectrum to calibrate  (File → Open spectrum…)");
        });
        return;
    };
    let colors = state.colors;

    Plot::new("spectral_plot")
        .height(height)
        .legend(Legend::default())
        .x_axis_label("Wavelength (nm)")
        .y_axis_label("Intensity (a.u.)")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            draw_line(plot_ui, &view.wavelength, &view.measured, "measured", colors.measured);
            draw_line(
                plot_ui,
                &view.wavelength,
                &view.calibrated,
                "calibrated",
                colors.calibrated,
            );
            if let Some(Ok(window)) = &view.window {
                draw_line(plot_ui, &view.wavelength, window, "window", colors.window);
            }
        });
}

/// Normalized instrument response R(λ).
pub fn response_plot(ui: &mut Ui, state: &AppState, height: f32) {
    let Some(response) = state.session.response() else {
        ui.label("No calibration loaded.");
        return;
    };
    let curve = &response.curve;

    Plot::new("response_plot")
        .height(height)
        .legend(Legend::default())
        .x_axis_label("Wavelength (nm)")
        .y_axis_label("Response (a.u.)")
        .show(ui, |plot_ui| {
            draw_line(
                plot_ui,
                curve.wavelength(),
                curve.ratio(),
                "response",
                state.colors.response,
            );
        });
}

/// Transform-limited temporal intensity, cropped around the peak.
pub fn pulse_plot(ui: &mut Ui, state: &AppState, height: f32) {
    let Some(Ok(profile)) = state.view.as_ref().map(|v| &v.pulse) else {
        ui.label("No pulse estimate.");
        return;
    };

    // Show ±3 FWHM around zero delay.
    let span = 3.0 * profile.fwhm.abs().max(1.0);
    let (time, envelope): (Vec<f64>, Vec<f64>) = profile
        .time
        .iter()
        .zip(&profile.envelope)
        .filter(|(t, _)| t.abs() <= span)
        .map(|(&t, &e)| (t, e))
        .unzip();

    Plot::new("pulse_plot")
        .height(height)
        .legend(Legend::default())
        .x_axis_label("Time (fs)")
        .y_axis_label("Intensity (a.u.)")
        .show(ui, |plot_ui| {
            draw_line(plot_ui, &time, &envelope, "pulse", state.colors.pulse);
        });
}
