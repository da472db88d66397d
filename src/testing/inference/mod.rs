//! Hypothesis tests on group means.
//!
//! - [`parametric`]: one-sample, independent and paired t-tests
//! - [`anova`]: one-way (between and within subjects) and two-way ANOVA

pub mod anova;

pub mod parametric;

pub use anova::{one_way_anova, repeated_measures_anova, two_way_anova, TwoWayAnova};
pub use parametric::{independent_t_test, one_sample_t_test, paired_t_test, t_test};
