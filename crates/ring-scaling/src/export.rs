//! Tabular export of the analysis
//!
//! Two tables: one data row per optimal configuration and one row per fitted
//! coefficient pair. CSV writes each table to its own file; JSON writes a
//! single workbook document holding both. Degenerate fits export as empty
//! cells (CSV) or `null` (JSON).
//!
//! Every target file is opened before any of them is written, so a locked or
//! unwritable file leaves no partial export behind.

use crate::fitter::{FittedPoint, ScalingFits};
use crate::pipeline::AnalysisReport;
use crate::{AnalysisConfig, OptimalResult};
use clap::ValueEnum;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Export file {0:?} is open in another program")]
    Locked(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    /// Data table at the output path, fits table beside it
    #[default]
    Csv,
    /// Single JSON workbook with both tables
    Json,
}

/// One row of the data table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DataRow {
    #[serde(rename = "inring_satcount")]
    pub n: u32,
    #[serde(rename = "optimal_ring_count")]
    pub r_opt: u32,
    #[serde(rename = "satcount_total")]
    pub total_sat_count: u64,
    #[serde(rename = "max_total_mbps_per_total_satcount")]
    pub max_mbps_per_sat: f64,
    #[serde(rename = "total_mbps_worst")]
    pub worst_mbps: f64,
    #[serde(rename = "total_mbps_best")]
    pub best_mbps: f64,
    pub fitted_worst: Option<f64>,
    pub fitted_best: Option<f64>,
}

impl DataRow {
    pub fn new(result: &OptimalResult, fitted: &FittedPoint) -> Self {
        Self {
            n: result.n,
            r_opt: result.r_opt,
            total_sat_count: result.total_sat_count,
            max_mbps_per_sat: result.max_mbps_per_sat,
            worst_mbps: result.worst_mbps_at_opt,
            best_mbps: result.best_mbps_at_opt,
            fitted_worst: fitted.fitted_worst,
            fitted_best: fitted.fitted_best,
        }
    }
}

/// One row of the fits table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitRow {
    #[serde(rename = "Description")]
    pub description: &'static str,
    pub a: Option<f64>,
    pub b: Option<f64>,
}

#[derive(Debug, Serialize)]
struct Workbook<'a> {
    generated_at: String,
    config: &'a AnalysisConfig,
    data: Vec<DataRow>,
    fits: Vec<FitRow>,
}

pub fn data_rows(results: &[OptimalResult], fitted: &[FittedPoint]) -> Vec<DataRow> {
    results
        .iter()
        .zip(fitted)
        .map(|(result, point)| DataRow::new(result, point))
        .collect()
}

pub fn fit_rows(fits: &ScalingFits) -> Vec<FitRow> {
    fits.labelled()
        .into_iter()
        .map(|(description, fit)| FitRow {
            description,
            a: fit.map(|f| f.a),
            b: fit.map(|f| f.b),
        })
        .collect()
}

/// Companion path holding the fits table for CSV output
pub fn fits_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "analysis".to_string());
    path.with_file_name(format!("{}_fits.csv", stem))
}

/// Write the report in `format`, returning every file written
pub fn export_report(report: &AnalysisReport, path: &Path, format: ExportFormat) -> Result<Vec<PathBuf>> {
    let rows = data_rows(&report.results, &report.fitted);
    let fits = fit_rows(&report.fits);

    match format {
        ExportFormat::Csv => {
            let fits_file = fits_path(path);
            let [data_out, fits_out] = open_all([path, fits_file.as_path()])?;
            write_csv(data_out, &rows)?;
            write_csv(fits_out, &fits)?;
            info!("Data saved to {:?} and {:?}", path, fits_file);
            Ok(vec![path.to_path_buf(), fits_file])
        }
        ExportFormat::Json => {
            let workbook = Workbook {
                generated_at: chrono::Utc::now().to_rfc3339(),
                config: &report.config,
                data: rows,
                fits,
            };
            let [out] = open_all([path])?;
            let mut writer = BufWriter::new(out);
            serde_json::to_writer_pretty(&mut writer, &workbook)?;
            writer.flush()?;
            info!("Data saved to {:?}", path);
            Ok(vec![path.to_path_buf()])
        }
    }
}

/// What the CLI does after an export attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written(Vec<PathBuf>),
    /// A target was held open elsewhere; nothing was written
    Locked(PathBuf),
}

/// Instruction shown when an export target is held open
pub fn locked_message(path: &Path) -> String {
    format!(
        "The export file {:?} is currently open. Please close it and run the analysis again.",
        path
    )
}

/// Recover from a locked target with a warning; every other failure stays an error
pub fn settle_export(result: Result<Vec<PathBuf>>) -> Result<ExportOutcome> {
    match result {
        Ok(paths) => Ok(ExportOutcome::Written(paths)),
        Err(ExportError::Locked(path)) => {
            warn!("{}", locked_message(&path));
            Ok(ExportOutcome::Locked(path))
        }
        Err(e) => Err(e),
    }
}

fn write_csv<T: Serialize>(file: File, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(BufWriter::new(file));
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Open every target without truncating, then truncate them all.
///
/// A failure on any target removes the files this call created and leaves
/// existing ones untouched.
fn open_all<const N: usize>(paths: [&Path; N]) -> Result<[File; N]> {
    let mut opened: Vec<(File, &Path, bool)> = Vec::with_capacity(N);
    for path in paths {
        match open_export_file(path) {
            Ok((file, created)) => opened.push((file, path, created)),
            Err(e) => {
                for (file, created_path, created) in opened {
                    drop(file);
                    if created {
                        // Best effort; the open error is what gets reported
                        let _ = fs::remove_file(created_path);
                    }
                }
                return Err(e);
            }
        }
    }

    let mut files = Vec::with_capacity(N);
    for (file, _, _) in opened {
        file.set_len(0)?;
        files.push(file);
    }
    files
        .try_into()
        .map_err(|_| ExportError::Io(io::Error::new(io::ErrorKind::Other, "export target count changed")))
}

/// Open `path` for writing, reporting whether this call created it
fn open_export_file(path: &Path) -> Result<(File, bool)> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let existed = path.exists();
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .open(path)
        .map_err(|e| classify_open_error(path, e))?;
    Ok((file, !existed))
}

/// Map "file is held open elsewhere" failures to [`ExportError::Locked`]
fn classify_open_error(path: &Path, err: io::Error) -> ExportError {
    // ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION
    let windows_lock = cfg!(windows) && matches!(err.raw_os_error(), Some(32) | Some(33));
    if err.kind() == io::ErrorKind::PermissionDenied || windows_lock {
        ExportError::Locked(path.to_path_buf())
    } else {
        ExportError::Io(err)
    }
}
