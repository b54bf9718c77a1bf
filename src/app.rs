use std::time::{Duration, Instant};

use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot};

/// Minimum delay between two acquisitions in continuous mode.
const ACQUISITION_INTERVAL: Duration = Duration::from_millis(250);

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct CalibratorApp {
    pub state: AppState,
    last_acquisition: Option<Instant>,
}

impl CalibratorApp {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            last_acquisition: None,
        }
    }

    fn poll_acquisition(&mut self, ctx: &egui::Context) {
        if !self.state.continuous || self.state.device.is_none() {
            self.last_acquisition = None;
            return;
        }
        let due = self
            .last_acquisition
            .map_or(true, |t| t.elapsed() >= ACQUISITION_INTERVAL);
        if due {
            self.state.acquire();
            self.last_acquisition = Some(Instant::now());
        }
        ctx.request_repaint_after(ACQUISITION_INTERVAL);
    }
}

impl eframe::App for CalibratorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_acquisition(ctx);

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: calibration and window ----
        egui::SidePanel::left("control_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: plots ----
        egui::CentralPanel::default().show(ctx, |ui| {
            let height = ui.available_height();
            plot::spectral_plot(ui, &self.state, height * 0.5);
            ui.columns(2, |cols| {
                plot::response_plot(&mut cols[0], &self.state, height * 0.45);
                plot::pulse_plot(&mut cols[1], &self.state, height * 0.45);
            });
        });
    }
}
