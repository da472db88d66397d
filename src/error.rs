//! Error types for csv-stats.
//!
//! The statistics layer (`testing`) reports failures through `anyhow`, the same way it always
//! has. Everything that crosses the public analysis API is folded into [`StatsError`].

use thiserror::Error;

/// Result type alias using [`StatsError`].
pub type Result<T> = std::result::Result<T, StatsError>;

#[derive(Debug, Error)]
pub enum StatsError {
    /// A requested column is not present in the header row.
    #[error("column `{column}` not found (available: {available})")]
    MissingColumn { column: String, available: String },

    /// No usable numeric rows, or a value that is not a number.
    #[error("could not parse column `{column}`: {reason}")]
    Parse { column: String, reason: String },

    /// Repeated-measures design where subjects are not aligned across conditions.
    #[error("unbalanced repeated-measures design: {0}")]
    UnbalancedDesign(String),

    /// Report filename or template misuse.
    #[error("render error: {0}")]
    Render(String),

    /// Too few groups or observations for the requested analysis.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error(transparent)]
    Computation(#[from] anyhow::Error),
}

impl StatsError {
    pub(crate) fn parse(column: &str, reason: impl Into<String>) -> Self {
        StatsError::Parse {
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}
