//! # csv-stats
//!
//! Classical hypothesis tests on "long format" CSV files, where each row is one observation
//! and separate columns name its group and, for repeated measures, its subject.
//!
//! Each entry point reads the file, splits every requested value column into groups and runs
//! the test the design calls for:
//!
//! | groups | subject column | test |
//! |---|---|---|
//! | 1 | no | one-sample t-test |
//! | 2 | no | independent t-test |
//! | 2 | yes | paired t-test |
//! | 3+ | no | one-way ANOVA |
//! | 3+ | yes | repeated-measures ANOVA |
//!
//! Results carry assumption diagnostics (variance homogeneity, normality of residuals and,
//! for repeated measures, sphericity) and per-group descriptive statistics. With a filename
//! they are also saved as a PDF or JSON report.
//!
//! ## Quick Start
//!
//! ```no_run
//! use csv_stats::{anova1way, AnalysisOptions, Anova1WayConfig};
//!
//! let options = AnalysisOptions::new("data.csv", "group", "score").with_filename("score.pdf");
//! let reports = anova1way(&Anova1WayConfig::new(options))?;
//! println!("F = {}, p = {}", reports[0].result.statistic, reports[0].result.p_value);
//! # Ok::<(), csv_stats::StatsError>(())
//! ```
//!
//! ## Module Organization
//!
//! - **[`analysis`]**: entry points, test dispatch and report assembly
//! - **[`data`]**: CSV loading and grouping
//! - **[`testing`]**: the statistical tests and assumption checks
//! - **[`report`]**: PDF and JSON output

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod report;
pub mod testing;

pub use analysis::dispatch::{select_test, TestKind};
pub use analysis::report::{AnalysisReport, TwoWayAnovaReport};
pub use analysis::{anova1way, anova2way, ttest_dep, ttest_ind};
pub use config::{
    AnalysisOptions, Anova1WayConfig, Anova2WayConfig, ColumnSelection, TTestDepConfig,
    TTestIndConfig,
};
pub use error::{Result, StatsError};
pub use report::pdf::read_pdf_record;
