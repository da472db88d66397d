//! Loading long-format tables and splitting them into samples.
//!
//! - [`table`]: reads a delimited file and extracts per-column [`Dataset`]s.
//! - [`partition`]: turns a dataset into a [`GroupedSample`], or a subject-aligned
//!   [`RepeatedMeasures`] matrix for within-subjects designs.

pub mod partition;
pub mod table;

pub use partition::{Group, GroupedSample, RepeatedMeasures};
pub use table::{Dataset, Observation, Table};
