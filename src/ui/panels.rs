use std::path::{Path, PathBuf};

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use spectrum_calibrator::config::Workflow;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – calibration, smoothing and window controls
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            calibration_section(ui, state);
            ui.separator();
            spectrum_section(ui, state);
            ui.separator();
            window_section(ui, state);
            ui.separator();

            ui.horizontal(|ui: &mut Ui| {
                ui.strong("FWHM (fs):");
                ui.monospace(state.fwhm_text());
            });

            if state.workflow == Workflow::Live {
                ui.separator();
                live_section(ui, state);
            }
        });
}

fn file_label(path: Option<&Path>) -> String {
    path.and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "not loaded".into())
}

fn calibration_section(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Calibration");
    ui.label(format!("Experimental: {}", file_label(state.experimental_path.as_deref())));
    ui.label(format!("Theoretical: {}", file_label(state.theoretical_path.as_deref())));

    let has_response = state.session.response().is_some();
    ui.label(format!("Smoothing: {:?}", state.response_smoother.strategy()));
    if ui
        .add_enabled(has_response, egui::Button::new("Smooth response"))
        .clicked()
    {
        state.smooth_response();
    }
}

fn spectrum_section(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Spectrum");
    ui.label(file_label(state.spectrum_path.as_deref()));

    let has_spectrum = state.session.measured().is_some();
    ui.horizontal(|ui: &mut Ui| {
        if ui
            .add_enabled(has_spectrum, egui::Button::new("Smooth spectrum"))
            .clicked()
        {
            state.smooth_spectrum();
        }
        if ui
            .add_enabled(has_spectrum, egui::Button::new("Export"))
            .clicked()
        {
            state.export();
        }
    });
    if !state.export_label.is_empty() {
        ui.label(&state.export_label);
    }
}

fn window_section(ui: &mut Ui, state: &mut AppState) {
    let mut enabled = state.session.filter_enabled();
    let has_spectrum = state.session.measured().is_some();
    if ui
        .add_enabled(has_spectrum, egui::Checkbox::new(&mut enabled, "Spectral filter"))
        .changed()
    {
        state.set_filter_enabled(enabled);
    }

    let mut commit = false;
    ui.add_enabled_ui(enabled, |ui: &mut Ui| {
        egui::Grid::new("window_fields")
            .num_columns(2)
            .show(ui, |ui: &mut Ui| {
                for (label, text) in [
                    ("Center (nm)", &mut state.center_text),
                    ("Width (nm)", &mut state.width_text),
                    ("Exponent", &mut state.exponent_text),
                ] {
                    ui.label(label);
                    commit |= ui.text_edit_singleline(text).lost_focus();
                    ui.end_row();
                }
            });
    });
    if commit {
        state.commit_window_fields();
    }
}

fn live_section(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Live");
    if ui.button("Scan devices").clicked() {
        state.scan_devices();
    }

    let current = state
        .device
        .as_ref()
        .map(|d| d.info().to_string())
        .unwrap_or_else(|| {
            if state.devices.is_empty() {
                "No device available".into()
            } else {
                "Select device".into()
            }
        });

    let mut selected = None;
    egui::ComboBox::from_id_salt("device")
        .selected_text(current)
        .show_ui(ui, |ui: &mut Ui| {
            for (i, dev) in state.devices.iter().enumerate() {
                if ui.selectable_label(false, dev.to_string()).clicked() {
                    selected = Some(i);
                }
            }
        });
    if let Some(i) = selected {
        state.select_device(i);
    }

    ui.horizontal(|ui: &mut Ui| {
        let has_device = state.device.is_some();
        if ui
            .add_enabled(has_device, egui::Button::new("Acquire"))
            .clicked()
        {
            state.acquire();
        }
        ui.add_enabled(has_device, egui::Checkbox::new(&mut state.continuous, "Continuous"));
    });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open spectrum…").clicked() {
                if let Some(path) = open_file_dialog("Open spectrum") {
                    state.load_spectrum(&path);
                }
                ui.close_menu();
            }
            if ui.button("Open experimental calibration…").clicked() {
                if let Some(path) = open_file_dialog("Open experimental calibration") {
                    state.load_experimental(&path);
                }
                ui.close_menu();
            }
            if ui.button("Open theoretical calibration…").clicked() {
                if let Some(path) = open_file_dialog("Open theoretical calibration") {
                    state.load_theoretical(&path);
                }
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Export calibrated spectrum").clicked() {
                state.export();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(sp) = state.session.measured() {
            ui.label(format!("{} samples", sp.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(title: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Spectra", &["txt", "dat", "csv", "parquet", "pq"])
        .add_filter("Text", &["txt", "dat"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("All files", &["*"])
        .pick_file()
}
