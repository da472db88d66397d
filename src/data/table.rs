use crate::config::ColumnSelection;
use crate::error::{Result, StatsError};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::debug;
use std::io::Read;
use std::path::Path;

/// Cell contents treated as a missing observation.
pub const MISSING_TOKENS: [&str; 7] = ["", "NA", "N/A", "NaN", "nan", "null", "None"];

pub fn is_missing(cell: &str) -> bool {
    MISSING_TOKENS.contains(&cell)
}

/// A delimited file held as its header row plus raw string records.
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    records: Vec<StringRecord>,
}

/// One observation of a value column, with its factor levels and optional subject.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub factors: Vec<String>,
    pub subject: Option<String>,
    pub value: f64,
}

/// All usable rows for a single value column.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub value_column: String,
    pub factor_columns: Vec<String>,
    pub subject_column: Option<String>,
    pub rows: Vec<Observation>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All values, in file order.
    pub fn values(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.value).collect()
    }
}

impl Table {
    pub fn from_path<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(file, delimiter)
    }

    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.iter().map(String::from).collect();
        let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Table { headers, records })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| StatsError::MissingColumn {
                column: name.to_string(),
                available: self.headers.join(", "),
            })
    }

    /// Resolve a value-column selection to concrete names, in header order.
    ///
    /// The wildcard selects every column not listed in `excluded`.
    pub fn value_columns(&self, selection: &ColumnSelection, excluded: &[&str]) -> Result<Vec<String>> {
        for name in excluded {
            self.column_index(name)?;
        }

        match selection {
            ColumnSelection::Named(name) => {
                self.column_index(name)?;
                Ok(vec![name.clone()])
            }
            ColumnSelection::All => {
                let columns: Vec<String> = self
                    .headers
                    .iter()
                    .filter(|h| !excluded.contains(&h.as_str()))
                    .cloned()
                    .collect();
                if columns.is_empty() {
                    return Err(StatsError::MissingColumn {
                        column: crate::config::WILDCARD.to_string(),
                        available: self.headers.join(", "),
                    });
                }
                Ok(columns)
            }
        }
    }

    /// Extract the rows used to analyse `value_column`.
    ///
    /// Rows with a missing value, factor label or subject id are dropped. A present value that
    /// is not a finite number (including `inf` or `NAN` spellings that are not missing tokens)
    /// is an error rather than a silently dropped row.
    pub fn dataset(
        &self,
        value_column: &str,
        factor_columns: &[&str],
        subject_column: Option<&str>,
    ) -> Result<Dataset> {
        let value_idx = self.column_index(value_column)?;
        let factor_idx = factor_columns
            .iter()
            .map(|name| self.column_index(name))
            .collect::<Result<Vec<_>>>()?;
        let subject_idx = subject_column.map(|name| self.column_index(name)).transpose()?;

        let mut rows = Vec::with_capacity(self.records.len());
        let mut dropped = 0usize;

        for (line, record) in self.records.iter().enumerate() {
            let cell = |idx: usize| record.get(idx).unwrap_or("");

            let raw_value = cell(value_idx);
            let factors_missing = factor_idx.iter().any(|&idx| is_missing(cell(idx)));
            let subject_missing = subject_idx.is_some_and(|idx| is_missing(cell(idx)));
            if is_missing(raw_value) || factors_missing || subject_missing {
                dropped += 1;
                continue;
            }

            let value = raw_value
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    StatsError::parse(
                        value_column,
                        format!("value `{}` on data row {} is not a finite number", raw_value, line + 1),
                    )
                })?;

            rows.push(Observation {
                factors: factor_idx.iter().map(|&idx| cell(idx).to_string()).collect(),
                subject: subject_idx.map(|idx| cell(idx).to_string()),
                value,
            });
        }

        if dropped > 0 {
            debug!("column `{}`: dropped {} rows with missing entries", value_column, dropped);
        }

        if rows.is_empty() {
            return Err(StatsError::parse(
                value_column,
                "no rows remain after dropping missing values",
            ));
        }

        Ok(Dataset {
            value_column: value_column.to_string(),
            factor_columns: factor_columns.iter().map(|s| s.to_string()).collect(),
            subject_column: subject_column.map(String::from),
            rows,
        })
    }
}
