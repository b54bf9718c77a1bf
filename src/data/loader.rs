use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, Float32Array, Float64Array, LargeListArray, ListArray};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::Spectrum;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a spectrum from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – `wavelength`/`intensity` (or `x`/`y`) numeric columns
/// * `.csv`     – two comma-separated columns, optional header row
/// * anything else – whitespace-delimited text, two columns per line
pub fn load_file(path: &Path) -> Result<Spectrum> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let spectrum = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "csv" => load_csv(path),
        _ => load_text(path),
    }
    .with_context(|| format!("wrong file format: {}", path.display()))?;

    log::debug!("Read {} samples from {}", spectrum.len(), path.display());
    Ok(spectrum.with_origin(path))
}

// ---------------------------------------------------------------------------
// Whitespace text loader
// ---------------------------------------------------------------------------

fn load_text(path: &Path) -> Result<Spectrum> {
    let text = std::fs::read_to_string(path).context("reading text file")?;
    parse_columns(&text)
}

/// Parse whitespace-delimited `(wavelength, intensity)` lines.
///
/// Blank lines and `#` comments are skipped; columns beyond the second are
/// ignored.
pub fn parse_columns(text: &str) -> Result<Spectrum> {
    let mut wavelength = Vec::new();
    let mut intensity = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(w), Some(i)) = (fields.next(), fields.next()) else {
            bail!("line {}: expected two columns, got '{line}'", line_no + 1);
        };
        wavelength.push(parse_float(w, line_no)?);
        intensity.push(parse_float(i, line_no)?);
    }

    Ok(Spectrum::new(wavelength, intensity)?)
}

fn parse_float(tok: &str, line_no: usize) -> Result<f64> {
    tok.parse::<f64>()
        .with_context(|| format!("line {}: '{tok}' is not a number", line_no + 1))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: `wavelength,intensity` per record. A first record that does
/// not parse as numbers is taken as a header.
fn load_csv(path: &Path) -> Result<Spectrum> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;

    let mut wavelength = Vec::new();
    let mut intensity = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let w = record.get(0).unwrap_or("").parse::<f64>();
        let i = record.get(1).unwrap_or("").parse::<f64>();
        match (w, i) {
            (Ok(w), Ok(i)) => {
                wavelength.push(w);
                intensity.push(i);
            }
            _ if row_no == 0 => continue,
            _ => bail!("CSV row {row_no}: expected two numeric columns"),
        }
    }

    Ok(Spectrum::new(wavelength, intensity)?)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

const WAVELENGTH_COLUMNS: [&str; 2] = ["wavelength", "x"];
const INTENSITY_COLUMNS: [&str; 2] = ["intensity", "y"];

/// Load a Parquet file holding one spectrum.
///
/// Expected schema, either:
/// - `wavelength`, `intensity`: Float64 or Float32, one sample per row, or
/// - `x`, `y`: List<Float64> (one spectrum per row, as written by Pandas
///   or Polars); only the first row is read.
fn load_parquet(path: &Path) -> Result<Spectrum> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut wavelength = Vec::new();
    let mut intensity = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let find = |names: &[&str]| {
            names
                .iter()
                .find_map(|n| schema.index_of(n).ok())
                .with_context(|| format!("Parquet file missing '{}' column", names[0]))
        };
        let w_col = batch.column(find(&WAVELENGTH_COLUMNS)?);
        let i_col = batch.column(find(&INTENSITY_COLUMNS)?);

        match w_col.data_type() {
            DataType::List(_) | DataType::LargeList(_) => {
                if batch.num_rows() == 0 {
                    continue;
                }
                wavelength = extract_f64_list(w_col, 0).context("reading wavelength list")?;
                intensity = extract_f64_list(i_col, 0).context("reading intensity list")?;
                break;
            }
            _ => {
                wavelength.extend(extract_f64_values(w_col).context("reading wavelength")?);
                intensity.extend(extract_f64_values(i_col).context("reading intensity")?);
            }
        }
    }

    Ok(Spectrum::new(wavelength, intensity)?)
}

// -- Parquet / Arrow helpers --

/// Values of a flat Float64 or Float32 column; nulls are rejected.
fn extract_f64_values(col: &Arc<dyn Array>) -> Result<Vec<f64>> {
    if col.null_count() > 0 {
        bail!("null value in numeric column");
    }
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        Ok(arr.values().iter().copied().collect())
    } else if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
        Ok(arr.values().iter().map(|&v| v as f64).collect())
    } else {
        bail!("column type is {:?}, expected Float64 or Float32", col.data_type())
    }
}

/// Extract a `Vec<f64>` from a List or LargeList column at the given row.
fn extract_f64_list(col: &Arc<dyn Array>, row: usize) -> Result<Vec<f64>> {
    if col.is_null(row) {
        bail!("null value in list column");
    }

    let values_array = match col.data_type() {
        DataType::List(_) => col
            .as_any()
            .downcast_ref::<ListArray>()
            .context("expected ListArray")?
            .value(row),
        DataType::LargeList(_) => col
            .as_any()
            .downcast_ref::<LargeListArray>()
            .context("expected LargeListArray")?
            .value(row),
        other => bail!("Expected List or LargeList column, got {other:?}"),
    };

    extract_f64_values(&values_array)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use arrow::array::Float64Array;
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    #[test]
    fn parses_whitespace_columns() {
        let sp = parse_columns("# header\n400.0\t1.5\n\n500.0   2.5  9.9\n600 3\n").unwrap();
        assert_eq!(sp.wavelength(), &[400.0, 500.0, 600.0]);
        assert_eq!(sp.intensity(), &[1.5, 2.5, 3.0]);
    }

    #[test]
    fn single_column_is_wrong_format() {
        assert!(parse_columns("400\n500\n").is_err());
    }

    #[test]
    fn text_that_is_not_numeric_fails() {
        assert!(parse_columns("wavelength intensity\n400 1\n").is_err());
    }

    #[test]
    fn loads_text_file_with_origin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lamp.txt");
        std::fs::write(&path, "700 1\n650 2\n600 3\n").unwrap();
        let sp = load_file(&path).unwrap();
        assert_eq!(sp.len(), 3);
        assert_eq!(sp.origin(), Some(path.as_path()));
    }

    #[test]
    fn loads_csv_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lamp.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "wavelength,intensity").unwrap();
        writeln!(f, "400, 1.0").unwrap();
        writeln!(f, "410, 2.0").unwrap();
        drop(f);
        let sp = load_file(&path).unwrap();
        assert_eq!(sp.wavelength(), &[400.0, 410.0]);
        assert_eq!(sp.intensity(), &[1.0, 2.0]);
    }

    #[test]
    fn loads_flat_parquet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lamp.parquet");
        let schema = Arc::new(Schema::new(vec![
            Field::new("wavelength", DataType::Float64, false),
            Field::new("intensity", DataType::Float64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Float64Array::from(vec![500.0, 510.0, 520.0])),
                Arc::new(Float64Array::from(vec![0.1, 0.2, 0.3])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let sp = load_file(&path).unwrap();
        assert_eq!(sp.wavelength(), &[500.0, 510.0, 520.0]);
        assert_eq!(sp.intensity(), &[0.1, 0.2, 0.3]);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_file(Path::new("/nonexistent/cal.txt")).unwrap_err();
        assert!(format!("{err:#}").contains("wrong file format"));
    }
}
