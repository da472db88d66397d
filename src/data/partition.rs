use crate::data::table::Dataset;
use crate::error::{Result, StatsError};
use ndarray::Array2;
use std::collections::{BTreeMap, BTreeSet};

/// Observations sharing one level of the grouping column.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub label: String,
    pub values: Vec<f64>,
    /// Subject ids aligned with `values`; empty when the dataset has no subject column.
    pub subjects: Vec<String>,
}

/// One sample per group level, sorted by label.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedSample {
    pub groups: Vec<Group>,
}

impl GroupedSample {
    /// Group by the first factor column.
    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self::by_factor(dataset, 0)
    }

    /// Group by the factor column at `factor`.
    pub fn by_factor(dataset: &Dataset, factor: usize) -> Self {
        Self::partition(dataset, |factors| factors[factor].clone())
    }

    /// Group by the combination of all factor columns, labelled `a_b`.
    pub fn by_cells(dataset: &Dataset) -> Self {
        Self::partition(dataset, |factors| factors.join("_"))
    }

    fn partition<F>(dataset: &Dataset, key: F) -> Self
    where
        F: Fn(&[String]) -> String,
    {
        let mut map: BTreeMap<String, Group> = BTreeMap::new();
        for row in &dataset.rows {
            let label = key(&row.factors);
            let group = map.entry(label.clone()).or_insert_with(|| Group {
                label,
                values: Vec::new(),
                subjects: Vec::new(),
            });
            group.values.push(row.value);
            if let Some(subject) = &row.subject {
                group.subjects.push(subject.clone());
            }
        }
        GroupedSample {
            groups: map.into_values().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.label.as_str()).collect()
    }

    pub fn samples(&self) -> Vec<&[f64]> {
        self.groups.iter().map(|g| g.values.as_slice()).collect()
    }

    pub fn total_count(&self) -> usize {
        self.groups.iter().map(|g| g.values.len()).sum()
    }

    /// Every observation minus its group mean, group by group.
    pub fn residuals(&self) -> Vec<f64> {
        self.groups
            .iter()
            .flat_map(|g| {
                let mean = g.values.iter().sum::<f64>() / g.values.len() as f64;
                g.values.iter().map(move |&v| v - mean)
            })
            .collect()
    }
}

/// Subject-aligned observations: one row per subject, one column per condition.
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatedMeasures {
    pub conditions: Vec<String>,
    pub subjects: Vec<String>,
    pub data: Array2<f64>,
}

impl RepeatedMeasures {
    /// Align a grouped sample by subject id.
    ///
    /// Every subject must appear exactly once in every condition.
    pub fn from_grouped(sample: &GroupedSample) -> Result<Self> {
        let mut subjects = BTreeSet::new();
        for group in &sample.groups {
            if group.subjects.len() != group.values.len() {
                return Err(StatsError::UnbalancedDesign(format!(
                    "condition `{}` has observations without a subject id",
                    group.label
                )));
            }
            subjects.extend(group.subjects.iter().cloned());
        }
        let subjects: Vec<String> = subjects.into_iter().collect();
        let index: BTreeMap<&str, usize> = subjects
            .iter()
            .enumerate()
            .map(|(i, s)| (s.as_str(), i))
            .collect();

        let mut data = Array2::from_elem((subjects.len(), sample.len()), f64::NAN);
        for (col, group) in sample.groups.iter().enumerate() {
            let mut seen = vec![false; subjects.len()];
            for (subject, &value) in group.subjects.iter().zip(&group.values) {
                let row = index[subject.as_str()];
                if seen[row] {
                    return Err(StatsError::UnbalancedDesign(format!(
                        "subject `{}` appears more than once in condition `{}`",
                        subject, group.label
                    )));
                }
                seen[row] = true;
                data[[row, col]] = value;
            }
            if let Some(row) = seen.iter().position(|&s| !s) {
                return Err(StatsError::UnbalancedDesign(format!(
                    "subject `{}` is missing from condition `{}`",
                    subjects[row], group.label
                )));
            }
        }

        Ok(RepeatedMeasures {
            conditions: sample.groups.iter().map(|g| g.label.clone()).collect(),
            subjects,
            data,
        })
    }

    pub fn n_subjects(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_conditions(&self) -> usize {
        self.data.ncols()
    }

    /// Values of one condition, in subject order.
    pub fn condition(&self, col: usize) -> Vec<f64> {
        self.data.column(col).to_vec()
    }
}
