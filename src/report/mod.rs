//! Saving analysis records to disk.
//!
//! The format follows the file extension: `.pdf` for a paginated text report (with an optional
//! plot page), `.json` for the bare record. Files are written to a temporary file next to the
//! target and only renamed into place once complete.

pub mod float;
pub mod json;
pub mod pdf;
pub mod plot;

use crate::config::COLUMN_PLACEHOLDER;
use crate::error::{Result, StatsError};
use log::{debug, info};
use plot::Curve;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A record that can be saved as a report.
pub trait Renderable: Serialize {
    /// Normal curves for the plot page, one per group.
    fn curves(&self) -> Vec<Curve>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Pdf,
    Json,
}

impl ReportFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("pdf") => Ok(ReportFormat::Pdf),
            Some("json") => Ok(ReportFormat::Json),
            _ => Err(StatsError::Render(format!(
                "cannot infer report format from `{}` (expected .pdf or .json)",
                path.display()
            ))),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Pdf => write!(f, "PDF"),
            ReportFormat::Json => write!(f, "JSON"),
        }
    }
}

/// Output path for `column`.
///
/// `{column}` in the template is replaced by the column name. Without the placeholder the
/// template is used as is, which is only allowed when a single column is analysed.
pub fn resolve_filename(template: &str, column: &str, multiple: bool) -> Result<PathBuf> {
    if template.contains(COLUMN_PLACEHOLDER) {
        Ok(PathBuf::from(template.replace(COLUMN_PLACEHOLDER, column)))
    } else if multiple {
        Err(StatsError::Render(format!(
            "filename `{}` must contain `{}` when several columns are analysed",
            template, COLUMN_PLACEHOLDER
        )))
    } else {
        Ok(PathBuf::from(template))
    }
}

/// Resolve and validate every output path before any analysis runs.
pub fn output_paths(filename: Option<&str>, columns: &[String]) -> Result<Vec<Option<PathBuf>>> {
    let Some(template) = filename else {
        return Ok(vec![None; columns.len()]);
    };
    let multiple = columns.len() > 1;
    columns
        .iter()
        .map(|column| {
            let path = resolve_filename(template, column, multiple)?;
            ReportFormat::from_path(&path)?;
            Ok(Some(path))
        })
        .collect()
}

/// Write `record` to `path` in the format its extension names.
///
/// Nothing is left at `path` if rendering fails part-way.
pub fn save<R: Renderable>(record: &R, path: &Path, render_plot: bool) -> Result<()> {
    let format = ReportFormat::from_path(path)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;

    match format {
        ReportFormat::Pdf => {
            let text = json::to_pretty_string(record)?;
            let curves = render_plot.then(|| record.curves());
            pdf::write_pdf(&mut file, &text, curves.as_deref())?;
        }
        ReportFormat::Json => {
            if render_plot {
                debug!("Plot requested for JSON report {}; skipping", path.display());
            }
            json::write_json(&mut file, record)?;
        }
    }

    file.persist(path).map_err(|e| e.error)?;
    info!("Saved {} report to {}", format, path.display());
    Ok(())
}
