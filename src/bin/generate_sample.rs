//! Writes a synthetic calibration set and a measured pulse spectrum:
//!
//! ```text
//! calibrationData/
//!   lamp_theoretical.txt   blackbody lamp table (3000 K)
//!   lamp_experimental.txt  same lamp seen through the detector response
//!   defaultFiles.txt       registry preloaded at startup
//! sample_pulse.txt         800 nm pulse spectrum, two columns
//! sample_pulse.parquet     same spectrum as x/y list columns
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Builder, ListBuilder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use spectrum_calibrator::data::export::write_columns;
use spectrum_calibrator::data::synth::{blackbody, detector_response, gaussian, linspace, SimpleRng};

const LAMP_TEMPERATURE: f64 = 3000.0;

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    let dir = Path::new("calibrationData");
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    // Tabulated lamp: coarse grid, wider than the detector.
    let table_wl = linspace(350.0, 1100.0, 151);
    let table: Vec<f64> = table_wl
        .iter()
        .map(|&w| blackbody(w, LAMP_TEMPERATURE))
        .collect();
    write_columns(&dir.join("lamp_theoretical.txt"), &table_wl, &table, 6)?;

    // Detector pixels, in counts.
    let pixel_wl = linspace(400.0, 1000.0, 2048);
    let counts: Vec<f64> = pixel_wl
        .iter()
        .map(|&w| {
            let signal = 4000.0 * blackbody(w, LAMP_TEMPERATURE) * detector_response(w);
            signal + rng.gauss(0.0, 5.0)
        })
        .collect();
    write_columns(&dir.join("lamp_experimental.txt"), &pixel_wl, &counts, 4)?;

    let registry = "experimental:lamp_experimental.txt\ntheoretical:lamp_theoretical.txt\n";
    std::fs::write(dir.join("defaultFiles.txt"), registry).context("writing registry")?;

    // Measured pulse: 800 nm, 30 nm FWHM, distorted by the detector.
    let pulse_wl = linspace(700.0, 900.0, 1024);
    let pulse: Vec<f64> = pulse_wl
        .iter()
        .map(|&w| {
            let line = gaussian(w, 800.0, 30.0, 1.0) * detector_response(w);
            3000.0 * line + rng.gauss(0.0, 3.0)
        })
        .collect();
    write_columns(Path::new("sample_pulse.txt"), &pulse_wl, &pulse, 4)?;
    write_parquet(Path::new("sample_pulse.parquet"), &pulse_wl, &pulse)?;

    println!(
        "Wrote calibration set to {} and a {}-sample pulse spectrum",
        dir.display(),
        pulse_wl.len()
    );
    Ok(())
}

fn write_parquet(path: &Path, x: &[f64], y: &[f64]) -> Result<()> {
    let list = |values: &[f64]| {
        let mut builder = ListBuilder::new(Float64Builder::new());
        builder.values().append_slice(values);
        builder.append(true);
        builder.finish()
    };

    let item = Arc::new(Field::new("item", DataType::Float64, true));
    let schema = Arc::new(Schema::new(vec![
        Field::new("x", DataType::List(item.clone()), false),
        Field::new("y", DataType::List(item), false),
        Field::new("sample", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(list(x)),
            Arc::new(list(y)),
            Arc::new(StringArray::from(vec!["pulse_800nm"])),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}
