//! Options accepted by the analysis entry points.
//!
//! Each entry point takes one config struct. Required fields go through `new`, optional ones
//! have `with_*` builders and serde defaults, so a config can equally be read from JSON.

use crate::testing::TTestType;
use crate::testing::assumptions::homogeneity::HomogeneityTest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::PathBuf;

/// Value-column sentinel meaning "every remaining column".
pub const WILDCARD: &str = "_";

/// Placeholder substituted by the column name in report filenames.
pub const COLUMN_PLACEHOLDER: &str = "{column}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelection {
    Named(String),
    All,
}

impl ColumnSelection {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, ColumnSelection::All)
    }
}

impl From<&str> for ColumnSelection {
    fn from(name: &str) -> Self {
        if name == WILDCARD {
            ColumnSelection::All
        } else {
            ColumnSelection::Named(name.to_string())
        }
    }
}

impl From<String> for ColumnSelection {
    fn from(name: String) -> Self {
        ColumnSelection::from(name.as_str())
    }
}

impl fmt::Display for ColumnSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSelection::Named(name) => write!(f, "{}", name),
            ColumnSelection::All => write!(f, "{}", WILDCARD),
        }
    }
}

impl<'de> Deserialize<'de> for ColumnSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(ColumnSelection::from(name))
    }
}

fn default_delimiter() -> char {
    ','
}

/// Options shared by every entry point.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisOptions {
    pub data_path: PathBuf,
    pub group_column: String,
    /// A column name, or `"_"` for every column that is not a grouping/subject column.
    pub data_column: ColumnSelection,
    /// Report path. `None` writes nothing. With the wildcard, a template containing `{column}`.
    #[serde(default)]
    pub filename: Option<String>,
    /// Add a page of per-group normal curves to PDF reports.
    #[serde(default)]
    pub render_plot: bool,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default)]
    pub homogeneity_test: HomogeneityTest,
    /// Pinned report timestamp; the current time when unset.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl AnalysisOptions {
    pub fn new(
        data_path: impl Into<PathBuf>,
        group_column: impl Into<String>,
        data_column: impl Into<ColumnSelection>,
    ) -> Self {
        AnalysisOptions {
            data_path: data_path.into(),
            group_column: group_column.into(),
            data_column: data_column.into(),
            filename: None,
            render_plot: false,
            delimiter: default_delimiter(),
            homogeneity_test: HomogeneityTest::default(),
            timestamp: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_render_plot(mut self, render_plot: bool) -> Self {
        self.render_plot = render_plot;
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_homogeneity_test(mut self, test: HomogeneityTest) -> Self {
        self.homogeneity_test = test;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub(crate) fn delimiter_byte(&self) -> crate::Result<u8> {
        if !self.delimiter.is_ascii() {
            return Err(crate::StatsError::Parse {
                column: self.data_column.to_string(),
                reason: format!("delimiter `{}` is not an ASCII character", self.delimiter),
            });
        }
        Ok(self.delimiter as u8)
    }

    pub(crate) fn timestamp_or_now(&self) -> DateTime<Utc> {
        self.timestamp.unwrap_or_else(Utc::now)
    }
}

/// `anova1way`: between-subjects, or within-subjects when a subject column is given.
#[derive(Debug, Clone, Deserialize)]
pub struct Anova1WayConfig {
    #[serde(flatten)]
    pub options: AnalysisOptions,
    #[serde(default)]
    pub repeated_measures_column: Option<String>,
}

impl Anova1WayConfig {
    pub fn new(options: AnalysisOptions) -> Self {
        Anova1WayConfig {
            options,
            repeated_measures_column: None,
        }
    }

    pub fn with_repeated_measures(mut self, column: impl Into<String>) -> Self {
        self.repeated_measures_column = Some(column.into());
        self
    }
}

/// `ttest_ind`: one-sample (single group) or independent two-sample t-test.
#[derive(Debug, Clone, Deserialize)]
pub struct TTestIndConfig {
    #[serde(flatten)]
    pub options: AnalysisOptions,
    /// Population mean for the one-sample case.
    #[serde(default)]
    pub popmean: f64,
    #[serde(default)]
    pub variance: TTestType,
}

impl TTestIndConfig {
    pub fn new(options: AnalysisOptions) -> Self {
        TTestIndConfig {
            options,
            popmean: 0.0,
            variance: TTestType::default(),
        }
    }

    pub fn with_popmean(mut self, popmean: f64) -> Self {
        self.popmean = popmean;
        self
    }

    pub fn with_variance(mut self, variance: TTestType) -> Self {
        self.variance = variance;
        self
    }
}

/// `ttest_dep`: paired t-test over subject-aligned conditions.
#[derive(Debug, Clone, Deserialize)]
pub struct TTestDepConfig {
    #[serde(flatten)]
    pub options: AnalysisOptions,
    pub repeated_measures_column: String,
}

impl TTestDepConfig {
    pub fn new(options: AnalysisOptions, repeated_measures_column: impl Into<String>) -> Self {
        TTestDepConfig {
            options,
            repeated_measures_column: repeated_measures_column.into(),
        }
    }
}

/// `anova2way`: two between-subjects factors with interaction.
#[derive(Debug, Clone, Deserialize)]
pub struct Anova2WayConfig {
    /// `options.group_column` is the first factor.
    #[serde(flatten)]
    pub options: AnalysisOptions,
    pub group_column2: String,
}

impl Anova2WayConfig {
    pub fn new(options: AnalysisOptions, group_column2: impl Into<String>) -> Self {
        Anova2WayConfig {
            options,
            group_column2: group_column2.into(),
        }
    }
}
