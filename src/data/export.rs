use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Extensions that keep their name on export; everything else becomes `.txt`.
const TEXT_EXTENSIONS: [&str; 3] = ["txt", "dat", "asc"];

/// `dir/name.ext` → `dir/name_calibrated.ext`.
pub fn calibrated_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("spectrum");
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| TEXT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or("txt");
    source.with_file_name(format!("{stem}_calibrated.{ext}"))
}

/// Write two whitespace-separated columns with `precision` decimals.
pub fn write_columns(path: &Path, wavelength: &[f64], intensity: &[f64], precision: usize) -> Result<()> {
    anyhow::ensure!(
        wavelength.len() == intensity.len(),
        "cannot export {} wavelengths with {} intensities",
        wavelength.len(),
        intensity.len()
    );

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    for (w, i) in wavelength.iter().zip(intensity) {
        writer
            .write_record([format!("{w:.precision$}"), format!("{i:.precision$}")])
            .context("writing export row")?;
    }
    writer.flush().context("flushing export file")?;

    log::info!("Exported {} samples to {}", wavelength.len(), path.display());
    Ok(())
}
