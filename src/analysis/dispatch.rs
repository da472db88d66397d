//! Test selection from the shape of the design, and the run of the selected test together
//! with its assumption diagnostics.

use crate::data::partition::{GroupedSample, RepeatedMeasures};
use crate::error::{Result, StatsError};
use crate::testing::assumptions::homogeneity::{homogeneity_of_variance, HomogeneityTest};
use crate::testing::assumptions::normality::normality_of_residuals;
use crate::testing::assumptions::sphericity::sphericity;
use crate::testing::assumptions::{Diagnostic, Diagnostics};
use crate::testing::inference::anova::{
    one_way_anova, repeated_measures_anova, sphericity_corrected_p_value,
};
use crate::testing::inference::parametric::{independent_t_test, one_sample_t_test, paired_t_test};
use crate::testing::{TTestType, TestResult};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    OneSampleTTest,
    IndependentTTest,
    PairedTTest,
    OneWayAnova,
    RepeatedMeasuresAnova,
    TwoWayAnova,
}

impl TestKind {
    pub fn name(&self) -> &'static str {
        match self {
            TestKind::OneSampleTTest => "one_sample_t_test",
            TestKind::IndependentTTest => "independent_t_test",
            TestKind::PairedTTest => "paired_t_test",
            TestKind::OneWayAnova => "one_way_anova",
            TestKind::RepeatedMeasuresAnova => "repeated_measures_anova",
            TestKind::TwoWayAnova => "two_way_anova",
        }
    }

    pub fn is_repeated_measures(&self) -> bool {
        matches!(self, TestKind::PairedTTest | TestKind::RepeatedMeasuresAnova)
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pick the test for `n_groups` distinct groups, with or without a subject column.
pub fn select_test(n_groups: usize, repeated: bool) -> Result<TestKind> {
    match (n_groups, repeated) {
        (0, _) => Err(StatsError::InsufficientData(
            "no groups to analyse".to_string(),
        )),
        (1, false) => Ok(TestKind::OneSampleTTest),
        (1, true) => Err(StatsError::InsufficientData(
            "a repeated-measures design needs at least 2 conditions (got 1)".to_string(),
        )),
        (2, false) => Ok(TestKind::IndependentTTest),
        (2, true) => Ok(TestKind::PairedTTest),
        (_, false) => Ok(TestKind::OneWayAnova),
        (_, true) => Ok(TestKind::RepeatedMeasuresAnova),
    }
}

/// Parameters that only some tests use.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TestParameters {
    /// Population mean of the one-sample t-test.
    pub popmean: f64,
    pub variance: TTestType,
    pub homogeneity_test: HomogeneityTest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestOutcome {
    pub kind: TestKind,
    pub result: TestResult,
    pub diagnostics: Diagnostics,
}

/// A failed diagnostic is reported as not applicable; it never aborts the analysis.
pub(crate) fn diagnostic(check: anyhow::Result<Diagnostic>) -> Diagnostic {
    check.unwrap_or_else(|e| {
        debug!("Diagnostic not computed: {}", e);
        Diagnostic::not_applicable(e.to_string())
    })
}

pub(crate) fn homogeneity(sample: &GroupedSample, test: HomogeneityTest) -> Diagnostic {
    if sample.len() < 2 {
        return Diagnostic::not_applicable("variance homogeneity needs at least 2 groups");
    }
    diagnostic(homogeneity_of_variance(&sample.samples(), test).map(Diagnostic::from))
}

pub(crate) fn normality(residuals: &[f64]) -> Diagnostic {
    diagnostic(normality_of_residuals(residuals).map(Diagnostic::from))
}

/// Select and run the test for `sample`, with its diagnostics.
///
/// With `repeated`, the groups are conditions and must form a balanced subjects x conditions
/// design; anything else fails before a test is run.
pub fn run_test(
    sample: &GroupedSample,
    repeated: bool,
    params: &TestParameters,
) -> Result<TestOutcome> {
    let kind = select_test(sample.len(), repeated)?;
    debug!(
        "Selected {} for {} group(s) (repeated measures: {})",
        kind,
        sample.len(),
        repeated
    );

    let design = if repeated {
        Some(RepeatedMeasures::from_grouped(sample)?)
    } else {
        None
    };

    let mut sphericity_check = None;
    let result = match (kind, &design) {
        (TestKind::OneSampleTTest, _) => {
            one_sample_t_test(&sample.groups[0].values, params.popmean)?
        }
        (TestKind::IndependentTTest, _) => independent_t_test(
            &sample.groups[0].values,
            &sample.groups[1].values,
            params.variance,
        )?,
        (TestKind::PairedTTest, Some(rm)) => {
            sphericity_check = Some(diagnostic(sphericity(&rm.data)));
            paired_t_test(&rm.condition(0), &rm.condition(1))?
        }
        (TestKind::OneWayAnova, _) => one_way_anova(&sample.samples())?,
        (TestKind::RepeatedMeasuresAnova, Some(rm)) => {
            let check = diagnostic(sphericity(&rm.data));
            let result = with_corrected_p_values(repeated_measures_anova(&rm.data)?, &check);
            sphericity_check = Some(check);
            result
        }
        (kind, _) => {
            return Err(StatsError::InsufficientData(format!(
                "{} cannot run on this design",
                kind
            )));
        }
    };

    Ok(TestOutcome {
        kind,
        result,
        diagnostics: Diagnostics {
            homogeneity_of_variance: homogeneity(sample, params.homogeneity_test),
            normality: normality(&sample.residuals()),
            sphericity: sphericity_check,
        },
    })
}

/// Attach Greenhouse-Geisser and Huynh-Feldt corrected p-values when Mauchly's test ran.
fn with_corrected_p_values(mut result: TestResult, check: &Diagnostic) -> TestResult {
    let Some(check) = check.check() else {
        return result;
    };
    for (epsilon_key, p_key) in [
        ("greenhouse_geisser", "greenhouse_geisser_p_value"),
        ("huynh_feldt", "huynh_feldt_p_value"),
    ] {
        if let Some(p) = check
            .details
            .get(epsilon_key)
            .and_then(|&eps| sphericity_corrected_p_value(&result, eps))
        {
            result.metadata.insert(p_key.to_string(), p);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::Table;

    fn sample(csv: &str, subject: Option<&str>) -> GroupedSample {
        let table = Table::from_reader(csv.as_bytes(), b',').unwrap();
        GroupedSample::from_dataset(&table.dataset("value", &["group"], subject).unwrap())
    }

    #[test]
    fn test_dispatch_table() {
        assert_eq!(select_test(1, false).unwrap(), TestKind::OneSampleTTest);
        assert_eq!(select_test(2, false).unwrap(), TestKind::IndependentTTest);
        assert_eq!(select_test(2, true).unwrap(), TestKind::PairedTTest);
        assert_eq!(select_test(3, false).unwrap(), TestKind::OneWayAnova);
        assert_eq!(select_test(3, true).unwrap(), TestKind::RepeatedMeasuresAnova);
        assert_eq!(select_test(5, false).unwrap(), TestKind::OneWayAnova);
        assert_eq!(select_test(5, true).unwrap(), TestKind::RepeatedMeasuresAnova);
        assert!(matches!(select_test(1, true), Err(StatsError::InsufficientData(_))));
        assert!(matches!(select_test(0, false), Err(StatsError::InsufficientData(_))));
    }

    #[test]
    fn test_paired_design_marks_sphericity_not_applicable() {
        let csv = "subject,group,value\n\
                   s1,pre,1\ns2,pre,2\ns3,pre,3\ns4,pre,4\n\
                   s1,post,2\ns2,post,4\ns3,post,3.5\ns4,post,6\n";
        let outcome = run_test(&sample(csv, Some("subject")), true, &TestParameters::default()).unwrap();
        assert_eq!(outcome.kind, TestKind::PairedTTest);
        let sphericity = outcome.diagnostics.sphericity.unwrap();
        assert!(!sphericity.is_applicable());
        // post - pre sorted as ("post", "pre")
        assert!(outcome.result.metadata["mean_difference"] > 0.0);
    }

    #[test]
    fn test_repeated_measures_anova_adds_corrected_p_values() {
        let csv = "subject,group,value\n\
                   s1,a,1\ns2,a,2\ns3,a,3\ns4,a,4\ns5,a,5\ns6,a,2\n\
                   s1,b,2\ns2,b,3\ns3,b,5\ns4,b,4\ns5,b,7\ns6,b,2\n\
                   s1,c,4\ns2,c,5\ns3,c,6\ns4,c,7\ns5,c,6\ns6,c,5\n";
        let outcome = run_test(&sample(csv, Some("subject")), true, &TestParameters::default()).unwrap();
        assert_eq!(outcome.kind, TestKind::RepeatedMeasuresAnova);
        assert!(outcome.diagnostics.sphericity.as_ref().unwrap().is_applicable());

        let meta = &outcome.result.metadata;
        let p = outcome.result.p_value;
        assert!(meta["greenhouse_geisser_p_value"] >= p);
        assert!(meta["huynh_feldt_p_value"] >= p);
        assert!(meta["huynh_feldt_p_value"] <= meta["greenhouse_geisser_p_value"]);
    }

    #[test]
    fn test_fewer_subjects_than_conditions_skips_sphericity() {
        let csv = "subject,group,value\n\
                   s1,a,1\ns2,a,2\n\
                   s1,b,2\ns2,b,5\n\
                   s1,c,4\ns2,c,5\n";
        let outcome = run_test(&sample(csv, Some("subject")), true, &TestParameters::default()).unwrap();
        assert_eq!(outcome.kind, TestKind::RepeatedMeasuresAnova);
        match outcome.diagnostics.sphericity.unwrap() {
            Diagnostic::NotApplicable { reason } => assert!(reason.contains("subjects")),
            other => panic!("expected not_applicable, got {:?}", other),
        }
        assert!(!outcome.result.metadata.contains_key("greenhouse_geisser_p_value"));
        assert!(!outcome.result.metadata.contains_key("huynh_feldt_p_value"));
    }

    #[test]
    fn test_unbalanced_design_runs_nothing() {
        let csv = "subject,group,value\ns1,a,1\ns2,a,2\ns1,b,2\n";
        let err = run_test(&sample(csv, Some("subject")), true, &TestParameters::default())
            .unwrap_err();
        assert!(matches!(err, StatsError::UnbalancedDesign(_)));
    }

    #[test]
    fn test_single_group_has_no_homogeneity_check() {
        let csv = "group,value\na,1.5\na,2.5\na,2.0\na,3.0\n";
        let params = TestParameters {
            popmean: 1.0,
            ..TestParameters::default()
        };
        let outcome = run_test(&sample(csv, None), false, &params).unwrap();
        assert_eq!(outcome.kind, TestKind::OneSampleTTest);
        assert!(!outcome.diagnostics.homogeneity_of_variance.is_applicable());
        assert!(outcome.diagnostics.normality.is_applicable());
        assert!(outcome.diagnostics.sphericity.is_none());
        assert_eq!(outcome.result.metadata["popmean"], 1.0);
    }
}
