// End-to-end analyses over CSV files written to scratch directories.

#[cfg(test)]
mod integration_tests {
    use chrono::{DateTime, TimeZone, Utc};
    use csv_stats::report::json::read_json_record;
    use csv_stats::testing::assumptions::Diagnostic;
    use csv_stats::testing::TTestType;
    use csv_stats::{
        anova1way, anova2way, read_pdf_record, ttest_dep, ttest_ind, AnalysisOptions,
        AnalysisReport, Anova1WayConfig, Anova2WayConfig, StatsError, TTestDepConfig,
        TTestIndConfig, TestKind, TwoWayAnovaReport,
    };
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const GROUPS: [&str; 5] = ["A", "B", "C", "D", "E"];

    fn write_csv(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 9, 30, 0).unwrap()
    }

    /// `n_groups` conditions measured on the same `n_subjects` subjects.
    fn long_csv(n_groups: usize, n_subjects: usize) -> String {
        let mut csv = String::from("subject,group,score\n");
        for (g, label) in GROUPS.iter().take(n_groups).enumerate() {
            for s in 0..n_subjects {
                let value = 10.0
                    + 1.5 * g as f64
                    + 0.8 * s as f64
                    + ((s * 7 + g * 3) % 5) as f64 * 0.6;
                csv.push_str(&format!("s{},{},{}\n", s + 1, label, value));
            }
        }
        csv
    }

    fn options(path: &Path, column: &str) -> AnalysisOptions {
        AnalysisOptions::new(path, "group", column).with_timestamp(timestamp())
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_three_group_anova_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let a = [9.8, 10.4, 8.9, 11.2, 10.1, 9.5, 10.9, 9.2, 10.6, 10.0];
        let b = [12.3, 11.7, 12.9, 11.1, 12.5, 13.2, 11.9, 12.1, 12.8, 11.4];
        let c = [10.9, 11.5, 10.2, 11.8, 11.1, 10.6, 12.0, 11.3, 10.8, 11.6];
        let mut csv = String::from("group,value\n");
        for (label, values) in [("A", &a), ("B", &b), ("C", &c)] {
            for v in values.iter() {
                csv.push_str(&format!("{},{}\n", label, v));
            }
        }
        let path = write_csv(&dir, "scores.csv", &csv);

        let reports = anova1way(&Anova1WayConfig::new(options(&path, "value"))).unwrap();
        assert_eq!(reports.len(), 1);
        let report = &reports[0];

        assert_eq!(report.test, TestKind::OneWayAnova);
        assert_eq!(report.result.degrees_of_freedom, Some(2.0));
        assert_eq!(report.result.error_degrees_of_freedom, Some(27.0));
        assert!(report.result.p_value < 0.001);

        let groups: Vec<&str> = report
            .summary_statistics
            .grouped
            .iter()
            .map(|g| g.group.as_str())
            .collect();
        assert_eq!(groups, ["A", "B", "C"]);
        assert!(report.summary_statistics.grouped.iter().all(|g| g.descriptives.count == 10));

        match &report.diagnostics.homogeneity_of_variance {
            Diagnostic::Computed(check) => {
                assert_eq!(check.test, "levene");
                assert_eq!(check.assumption_met, check.p_value > 0.05);
            }
            other => panic!("expected a computed homogeneity check, got {:?}", other),
        }
        assert!(report.diagnostics.normality.is_applicable());
        assert!(report.diagnostics.sphericity.is_none());

        // No filename, no file
        assert_eq!(files_in(dir.path()), ["scores.csv"]);
    }

    #[test]
    fn test_dispatch_by_group_count() {
        let dir = tempfile::tempdir().unwrap();
        let cases = [
            (1, TestKind::OneSampleTTest),
            (2, TestKind::IndependentTTest),
            (3, TestKind::OneWayAnova),
            (5, TestKind::OneWayAnova),
        ];
        for (n_groups, expected) in cases {
            let path = write_csv(&dir, &format!("between_{}.csv", n_groups), &long_csv(n_groups, 8));
            let via_anova = anova1way(&Anova1WayConfig::new(options(&path, "score"))).unwrap();
            assert_eq!(via_anova[0].test, expected, "{} groups", n_groups);

            let via_ttest = ttest_ind(&TTestIndConfig::new(options(&path, "score"))).unwrap();
            assert_eq!(via_ttest[0].test, expected, "{} groups", n_groups);
            assert_eq!(via_ttest[0].result, via_anova[0].result);
        }
    }

    #[test]
    fn test_dispatch_with_repeated_measures() {
        let dir = tempfile::tempdir().unwrap();
        let cases = [
            (2, TestKind::PairedTTest),
            (3, TestKind::RepeatedMeasuresAnova),
            (5, TestKind::RepeatedMeasuresAnova),
        ];
        for (n_groups, expected) in cases {
            let path = write_csv(&dir, &format!("within_{}.csv", n_groups), &long_csv(n_groups, 8));
            let config = Anova1WayConfig::new(options(&path, "score")).with_repeated_measures("subject");
            let reports = anova1way(&config).unwrap();
            let report = &reports[0];
            assert_eq!(report.test, expected, "{} conditions", n_groups);
            assert_eq!(report.columns.repeated_measures.as_deref(), Some("subject"));

            let sphericity = report.diagnostics.sphericity.as_ref().unwrap();
            assert_eq!(sphericity.is_applicable(), n_groups >= 3);

            let dep = ttest_dep(&TTestDepConfig::new(options(&path, "score"), "subject")).unwrap();
            assert_eq!(dep[0].test, expected);
        }

        let path = write_csv(&dir, "within_1.csv", &long_csv(1, 8));
        let err = ttest_dep(&TTestDepConfig::new(options(&path, "score"), "subject")).unwrap_err();
        assert!(matches!(err, StatsError::InsufficientData(_)));
    }

    #[test]
    fn test_sphericity_not_applicable_for_two_conditions() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "pairs.csv", &long_csv(2, 6));
        let reports = ttest_dep(&TTestDepConfig::new(options(&path, "score"), "subject")).unwrap();

        let json = serde_json::to_value(&reports[0]).unwrap();
        assert_eq!(json["diagnostics"]["sphericity"]["status"], "not_applicable");

        let path = write_csv(&dir, "triples.csv", &long_csv(3, 6));
        let reports = ttest_dep(&TTestDepConfig::new(options(&path, "score"), "subject")).unwrap();
        let json = serde_json::to_value(&reports[0]).unwrap();
        assert_eq!(json["diagnostics"]["sphericity"]["status"], "computed");
        assert_eq!(json["diagnostics"]["sphericity"]["test"], "mauchly");
        assert!(json["result"]["metadata"]["greenhouse_geisser_p_value"].is_number());
    }

    #[test]
    fn test_unbalanced_design_is_rejected_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let csv: String = long_csv(3, 5)
            .lines()
            .filter(|line| !line.starts_with("s3,B,"))
            .map(|line| format!("{}\n", line))
            .collect();
        assert_eq!(csv.lines().count(), 15, "fixture should drop exactly one row");
        let path = write_csv(&dir, "unbalanced.csv", &csv);
        let output = dir.path().join("out.pdf");

        let config = Anova1WayConfig::new(
            options(&path, "score").with_filename(output.to_string_lossy()),
        )
        .with_repeated_measures("subject");
        let err = anova1way(&config).unwrap_err();
        match err {
            StatsError::UnbalancedDesign(message) => {
                assert!(message.contains("s3") && message.contains("B"), "{}", message)
            }
            other => panic!("expected UnbalancedDesign, got {:?}", other),
        }
        assert!(!output.exists());
        assert_eq!(files_in(dir.path()), ["unbalanced.csv"]);
    }

    #[test]
    fn test_pdf_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "scores.csv", &long_csv(3, 8));
        let output = dir.path().join("report.pdf");
        let config = Anova1WayConfig::new(
            options(&path, "score")
                .with_filename(output.to_string_lossy())
                .with_render_plot(true),
        );

        let reports = anova1way(&config).unwrap();
        let direct = &reports[0];
        let parsed: AnalysisReport = read_pdf_record(&output).unwrap();

        assert!((parsed.result.statistic - direct.result.statistic).abs() <= 1e-9);
        assert!((parsed.result.p_value - direct.result.p_value).abs() <= 1e-9);
        assert_eq!(&parsed, direct);
        assert_eq!(files_in(dir.path()), ["report.pdf", "scores.csv"]);
    }

    #[test]
    fn test_wildcard_writes_one_report_per_column() {
        let dir = tempfile::tempdir().unwrap();
        let csv = "group,height,weight,age\n\
                   A,1.62,58,31\nA,1.70,65,45\nA,1.55,52,28\nA,1.68,61,39\n\
                   B,1.80,80,50\nB,1.77,74,41\nB,1.85,90,62\nB,1.79,77,36\n";
        let path = write_csv(&dir, "people.csv", csv);
        let template = dir.path().join("res_{column}.json");

        let config = TTestIndConfig::new(
            options(&path, "_").with_filename(template.to_string_lossy()),
        );
        let reports = ttest_ind(&config).unwrap();

        let columns: Vec<&str> = reports.iter().map(|r| r.columns.data.as_str()).collect();
        assert_eq!(columns, ["height", "weight", "age"]);
        assert!(reports.iter().all(|r| r.test == TestKind::IndependentTTest));
        assert_eq!(
            files_in(dir.path()),
            ["people.csv", "res_age.json", "res_height.json", "res_weight.json"]
        );

        for report in &reports {
            let file = dir.path().join(format!("res_{}.json", report.columns.data));
            let saved: AnalysisReport = read_json_record(&file).unwrap();
            assert_eq!(&saved, report);
        }
    }

    #[test]
    fn test_wildcard_requires_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "wide.csv", "group,x,y\nA,1,2\nA,2,3\nB,3,4\nB,5,6\n");
        let output = dir.path().join("fixed.pdf");

        let config = TTestIndConfig::new(options(&path, "_").with_filename(output.to_string_lossy()));
        let err = ttest_ind(&config).unwrap_err();
        assert!(matches!(err, StatsError::Render(_)));
        assert_eq!(files_in(dir.path()), ["wide.csv"]);

        // A single named column may use a fixed filename
        let config = TTestIndConfig::new(options(&path, "x").with_filename(output.to_string_lossy()));
        ttest_ind(&config).unwrap();
        assert!(output.exists());
    }

    #[test]
    fn test_unsupported_extension_fails_before_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "data.csv", &long_csv(2, 5));
        let config = TTestIndConfig::new(options(&path, "score").with_filename("report.txt"));
        assert!(matches!(ttest_ind(&config), Err(StatsError::Render(_))));
    }

    #[test]
    fn test_missing_and_unparseable_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "data.csv", "group,score,note\nA,1,x\nA,2,y\nB,3,z\nB,4,w\n");

        let err = anova1way(&Anova1WayConfig::new(options(&path, "weight"))).unwrap_err();
        assert!(matches!(err, StatsError::MissingColumn { ref column, .. } if column == "weight"));

        let config = Anova1WayConfig::new(options(&path, "score")).with_repeated_measures("subject");
        assert!(matches!(anova1way(&config), Err(StatsError::MissingColumn { .. })));

        let err = anova1way(&Anova1WayConfig::new(options(&path, "note"))).unwrap_err();
        assert!(matches!(err, StatsError::Parse { .. }));
    }

    #[test]
    fn test_identical_runs_write_identical_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "data.csv", &long_csv(3, 6));
        let run = |name: &str| {
            let output = dir.path().join(name);
            let config = Anova1WayConfig::new(options(&path, "score").with_filename(output.to_string_lossy()));
            anova1way(&config).unwrap();
            std::fs::read(output).unwrap()
        };
        assert_eq!(run("first.json"), run("second.json"));
    }

    #[test]
    fn test_popmean_and_welch_options() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "one.csv", &long_csv(1, 8));
        let config = TTestIndConfig::new(options(&path, "score")).with_popmean(13.0);
        let report = &ttest_ind(&config).unwrap()[0];
        assert_eq!(report.test, TestKind::OneSampleTTest);
        assert_eq!(report.result.metadata["popmean"], 13.0);
        assert!(!report.diagnostics.homogeneity_of_variance.is_applicable());

        let path = write_csv(&dir, "two.csv", &long_csv(2, 8));
        let student = &ttest_ind(&TTestIndConfig::new(options(&path, "score"))).unwrap()[0];
        let welch = &ttest_ind(
            &TTestIndConfig::new(options(&path, "score")).with_variance(TTestType::Welch),
        )
        .unwrap()[0];
        // Equal group sizes: same statistic, Welch only changes the degrees of freedom
        assert!((student.result.statistic - welch.result.statistic).abs() < 1e-9);
        assert_eq!(student.result.degrees_of_freedom, Some(14.0));
        assert!(welch.result.degrees_of_freedom.unwrap() <= 14.0 + 1e-9);
    }

    #[test]
    fn test_semicolon_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let csv = long_csv(3, 5).replace(',', ";");
        let path = write_csv(&dir, "data.csv", &csv);
        let config = Anova1WayConfig::new(options(&path, "score").with_delimiter(';'));
        assert_eq!(anova1way(&config).unwrap()[0].test, TestKind::OneWayAnova);
    }

    #[test]
    fn test_two_way_anova() {
        let dir = tempfile::tempdir().unwrap();
        let mut csv = String::from("dose,diet,growth\n");
        let cells = [
            ("low", "a", [4.1, 4.5, 3.9]),
            ("low", "b", [5.0, 5.4, 4.8]),
            ("mid", "a", [5.9, 6.3, 6.1]),
            ("mid", "b", [6.8, 7.4, 7.0]),
            ("high", "a", [7.7, 8.1, 7.5]),
            ("high", "b", [9.6, 10.1, 9.9]),
        ];
        for (dose, diet, values) in cells {
            for v in values {
                csv.push_str(&format!("{},{},{}\n", dose, diet, v));
            }
        }
        let path = write_csv(&dir, "growth.csv", &csv);
        let output = dir.path().join("two_way.pdf");
        let config = Anova2WayConfig::new(
            AnalysisOptions::new(&path, "dose", "growth")
                .with_timestamp(timestamp())
                .with_filename(output.to_string_lossy())
                .with_render_plot(true),
            "diet",
        );

        let reports = anova2way(&config).unwrap();
        let report = &reports[0];
        assert_eq!(report.test, TestKind::TwoWayAnova);
        assert_eq!(report.result.factor_a.term, "dose");
        assert_eq!(report.result.factor_b.term, "diet");
        assert_eq!(report.result.interaction.term, "dose:diet");

        assert_eq!(report.result.factor_a.result.degrees_of_freedom, Some(2.0));
        assert_eq!(report.result.factor_b.result.degrees_of_freedom, Some(1.0));
        assert_eq!(report.result.interaction.result.degrees_of_freedom, Some(2.0));
        assert_eq!(report.result.residual.df, 12.0);
        assert!(report.result.factor_a.result.p_value < 0.001);
        assert!(report.result.factor_b.result.p_value < 0.001);

        let summary = &report.summary_statistics;
        assert_eq!(summary.factor_a.len(), 3);
        assert_eq!(summary.factor_b.len(), 2);
        assert_eq!(summary.interaction.len(), 6);
        assert!(summary.interaction.iter().any(|g| g.group == "high_b"));
        assert!(report.diagnostics.sphericity.is_none());

        let parsed: TwoWayAnovaReport = read_pdf_record(&output).unwrap();
        assert_eq!(&parsed, report);
    }

    #[test]
    fn test_config_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "data.csv", &long_csv(3, 6));
        let json = format!(
            r#"{{"data_path": {:?}, "group_column": "group", "data_column": "score",
                "repeated_measures_column": "subject", "homogeneity_test": "bartlett"}}"#,
            path.to_string_lossy()
        );
        let config: Anova1WayConfig = serde_json::from_str(&json).unwrap();
        let report = &anova1way(&config).unwrap()[0];
        assert_eq!(report.test, TestKind::RepeatedMeasuresAnova);
        let check = report.diagnostics.homogeneity_of_variance.check().unwrap();
        assert_eq!(check.test, "bartlett");
    }
}
