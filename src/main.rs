mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use eframe::egui;
use spectrum_calibrator::config::{available_cores, DefaultFiles, Settings, Workflow};
use spectrum_calibrator::data::export::calibrated_path;
use spectrum_calibrator::data::loader::load_file;
use spectrum_calibrator::dsp::{format_fwhm, Smoother, WindowParams};
use spectrum_calibrator::CalibrationSession;

use app::CalibratorApp;
use state::AppState;

#[derive(Parser)]
#[command(name = "spectrum-calibrator")]
#[command(about = "Spectrometer response calibration and pulse duration estimation")]
#[command(version)]
struct Cli {
    /// Live-acquisition workflow (stricter smoothing threshold, 4-digit export).
    #[arg(long)]
    live: bool,
    /// JSON settings file.
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Override the detected number of processing units.
    #[arg(long)]
    cores: Option<usize>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Calibrate a spectrum file without opening the window.
    Calibrate {
        /// Measured spectrum (txt, dat, csv or parquet).
        spectrum: PathBuf,
        /// Experimental calibration (overrides the registry).
        #[arg(long)]
        experimental: Option<PathBuf>,
        /// Theoretical calibration (overrides the registry).
        #[arg(long)]
        theoretical: Option<PathBuf>,
        /// Smooth the response curve before correcting.
        #[arg(long)]
        smooth_response: bool,
        /// Smooth the measured spectrum before correcting.
        #[arg(long)]
        smooth_spectrum: bool,
        /// Super-Gaussian window: CENTER WIDTH EXPONENT.
        #[arg(long, num_args = 3, value_names = ["CENTER", "WIDTH", "EXPONENT"])]
        window: Option<Vec<String>>,
        /// Output file (defaults to `<stem>_calibrated.<ext>`).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let settings = Settings::load_or_default(cli.settings.as_deref());
    let workflow = if cli.live {
        Workflow::Live
    } else {
        Workflow::Offline
    };
    let cores = cli.cores.unwrap_or_else(available_cores);

    match cli.command {
        Some(Commands::Calibrate {
            spectrum,
            experimental,
            theoretical,
            smooth_response,
            smooth_spectrum,
            window,
            output,
        }) => {
            let registry = DefaultFiles::read(&settings.registry_path());
            let experimental =
                experimental.or_else(|| registry.as_ref().map(|r| r.experimental.clone()));
            let theoretical =
                theoretical.or_else(|| registry.as_ref().map(|r| r.theoretical.clone()));

            let mut session = CalibrationSession::new();
            if let Some(path) = experimental {
                session = session.with_experimental_calibration(load_file(&path)?)?;
            }
            if let Some(path) = theoretical {
                session = session.with_theoretical_calibration(load_file(&path)?)?;
            }
            if session.response().is_none() {
                log::warn!("No calibration pair available, spectrum is only normalized");
            }
            if smooth_response && session.response().is_some() {
                let strategy = settings.smoothing_strategy(workflow, cores);
                session = session.smooth_response(&Smoother::new(strategy))?;
            }

            session = session.with_measured(load_file(&spectrum)?);
            if smooth_spectrum {
                session = session.smooth_spectrum(&Smoother::polynomial())?;
            }
            if let Some(fields) = window {
                let [center, width, exponent] = fields.as_slice() else {
                    return Err(anyhow!("--window takes CENTER WIDTH EXPONENT"));
                };
                let params = WindowParams::parse(center, width, exponent)?;
                session = session.with_window(params)?.with_filter_enabled(true);
            }

            let output = output.unwrap_or_else(|| calibrated_path(&spectrum));
            let precision = settings.export_precision(workflow);
            let view = session
                .export_to(&output, &settings.pulse, precision)
                .with_context(|| format!("exporting {}", output.display()))?;

            println!("FWHM (fs): {}", format_fwhm(&view.fwhm()));
            println!("Wrote {}", output.display());
            Ok(())
        }
        None => run_gui(settings, workflow, cores),
    }
}

fn run_gui(settings: Settings, workflow: Workflow, cores: usize) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    let title = match workflow {
        Workflow::Offline => "Spectrum Calibrator",
        Workflow::Live => "Spectrum Calibrator – Live",
    };

    eframe::run_native(
        title,
        options,
        Box::new(move |_cc| {
            Ok(Box::new(CalibratorApp::new(AppState::new(
                settings, workflow, cores,
            ))))
        }),
    )
    .map_err(|e| anyhow!("{e}"))
}
