use cvtrunc::analysis::{Analysis, RegionStatus, ReportFile};
use cvtrunc::config::Tolerances;
use cvtrunc::construction::{active_set_region, cross_validation_region, selection_region};
use cvtrunc::interval::Interval;
use cvtrunc::path::{PiecewiseQuadratic, Segment, SolutionPath};
use cvtrunc::projection::{LineParameterization, path_criterion};
use cvtrunc::quadratic::Quadratic;

use approx::assert_abs_diff_eq;
use ndarray::{Array1, array};
use std::fs;
use std::process::Command;
use tempfile::tempdir;

// Two samples, one feature (the intercept column). y = (1, 3), eta = (1, -1),
// so z_obs = -2, a = (2, 2), b = (0.5, -0.5).
//
// Full-data path: the feature is active outside (-1, 1).
// Candidate 0 keeps the feature (fit 2), candidate 1 drops it. Each candidate's
// criterion is the validation error on row 0, counted twice through two folds
// whose paths split at different breakpoints. Candidate 0 wins for z >= -2.
const ANALYSIS: &str = r#"
response = [1.0, 3.0]
design = [[1.0], [1.0]]

[tolerances]
merge_gap = 0.01

[[hypotheses]]
name = "intercept"
direction = [1.0, -1.0]

[hypotheses.path]
breakpoints = [-inf, -1.0, 1.0, inf]

[[hypotheses.path.segments]]
active_set = [0]
eta_fit = [0.0]
bias_fit = [2.0]

[[hypotheses.path.segments]]
active_set = []
eta_fit = []
bias_fit = []

[[hypotheses.path.segments]]
active_set = [0]
eta_fit = [0.0]
bias_fit = [2.0]

[[hypotheses.curves]]

[[hypotheses.curves.folds]]
validation_rows = [0]
[hypotheses.curves.folds.path]
breakpoints = [-inf, inf]
[[hypotheses.curves.folds.path.segments]]
active_set = [0]
eta_fit = [0.0]
bias_fit = [2.0]

[[hypotheses.curves.folds]]
validation_rows = [0]
[hypotheses.curves.folds.path]
breakpoints = [-inf, 0.0, inf]
[[hypotheses.curves.folds.path.segments]]
active_set = [0]
eta_fit = [0.0]
bias_fit = [2.0]
[[hypotheses.curves.folds.path.segments]]
active_set = [0]
eta_fit = [0.0]
bias_fit = [2.0]

[[hypotheses.curves]]

[[hypotheses.curves.folds]]
validation_rows = [0]
[hypotheses.curves.folds.path]
breakpoints = [-inf, inf]
[[hypotheses.curves.folds.path.segments]]
active_set = []
eta_fit = []
bias_fit = []

[[hypotheses.curves.folds]]
validation_rows = [0]
[hypotheses.curves.folds.path]
breakpoints = [-inf, 0.0, inf]
[[hypotheses.curves.folds.path.segments]]
active_set = []
eta_fit = []
bias_fit = []
[[hypotheses.curves.folds.path.segments]]
active_set = []
eta_fit = []
bias_fit = []

[[hypotheses]]
name = "explicit_curves"
direction = [1.0, -1.0]
target_active_set = [0]

[hypotheses.path]
breakpoints = [-inf, inf]

[[hypotheses.path.segments]]
active_set = [0]
eta_fit = [0.0]
bias_fit = [2.0]

[[hypotheses.curves]]
breakpoints = [-inf, inf]
[[hypotheses.curves.pieces]]
quadratic = 0.0
linear = 0.0
constant = 3.0

[[hypotheses.curves]]
breakpoints = [-inf, inf]
[[hypotheses.curves.pieces]]
quadratic = 0.0
linear = 0.0
constant = 2.0
"#;

fn check_intercept_report(report: &ReportFile) {
    let intercept = &report.reports[0];
    assert_eq!(intercept.name, "intercept");
    assert_eq!(intercept.observed_statistic, -2.0);
    assert_eq!(intercept.target_active_set, vec![0]);
    assert_eq!(intercept.status, RegionStatus::Region);
    assert!(intercept.contains_observed);
    assert_eq!(intercept.intervals.len(), 2);
    assert_abs_diff_eq!(intercept.intervals[0].lo, -2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(intercept.intervals[0].hi, -1.0, epsilon = 1e-9);
    assert_eq!(intercept.intervals[1], Interval::above(1.0));

    let dominated = &report.reports[1];
    assert_eq!(dominated.name, "explicit_curves");
    assert_eq!(dominated.status, RegionStatus::Empty);
    assert!(!dominated.contains_observed);
    assert!(dominated.intervals.is_empty());
}

#[test]
fn analysis_file_produces_expected_regions() {
    let analysis = Analysis::from_toml(ANALYSIS).expect("parse analysis");
    let report = analysis.evaluate().expect("evaluate analysis");
    assert_eq!(report.reports.len(), 2);
    check_intercept_report(&report);
}

#[test]
fn cli_writes_report_file() {
    let tmp = tempdir().expect("temporary directory");
    let analysis_path = tmp.path().join("analysis.toml");
    let report_path = tmp.path().join("report.toml");
    fs::write(&analysis_path, ANALYSIS).expect("write analysis");

    let exe = env!("CARGO_BIN_EXE_cvtrunc");
    let status = Command::new(exe)
        .args([
            "region",
            analysis_path.to_str().expect("path str"),
            "--output",
            report_path.to_str().expect("path str"),
        ])
        .status()
        .expect("run cvtrunc cli");
    assert!(status.success(), "CLI exited with status {status:?}");

    let text = fs::read_to_string(&report_path).expect("read report");
    let report: ReportFile = toml::from_str(&text).expect("parse report");
    check_intercept_report(&report);
}

#[test]
fn cli_reports_missing_file() {
    let tmp = tempdir().expect("temporary directory");
    let exe = env!("CARGO_BIN_EXE_cvtrunc");
    let output = Command::new(exe)
        .args([
            "region",
            tmp.path().join("absent.toml").to_str().expect("path str"),
        ])
        .output()
        .expect("run cvtrunc cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"), "stderr was: {stderr}");
}

#[test]
fn library_pipeline_matches_analysis_file() {
    let design = array![[1.0], [1.0]];
    let y = array![1.0, 3.0];
    let eta = array![1.0, -1.0];
    let line = LineParameterization::new(y.view(), eta.view()).unwrap();
    let tolerances = Tolerances::default();

    let keep = Segment::new(vec![0], array![0.0], array![2.0]);
    let dropped = Segment::new(vec![], Array1::zeros(0), Array1::zeros(0));
    let everywhere = vec![f64::NEG_INFINITY, f64::INFINITY];

    let validation_line = line.restricted(&[0]).unwrap();
    let validation_design = design.slice(ndarray::s![0..1, ..]).to_owned();
    let keep_curve = path_criterion(
        &validation_line,
        validation_design.view(),
        &SolutionPath::new(everywhere.clone(), vec![keep.clone()]).unwrap(),
        tolerances.zero,
    )
    .unwrap();
    let drop_curve = path_criterion(
        &validation_line,
        validation_design.view(),
        &SolutionPath::new(everywhere.clone(), vec![dropped.clone()]).unwrap(),
        tolerances.zero,
    )
    .unwrap();
    assert_eq!(keep_curve.pieces(), &[Quadratic::new(0.125, 0.0, 0.0)]);
    assert_eq!(drop_curve.pieces(), &[Quadratic::new(0.125, 1.0, 2.0)]);

    let cv = cross_validation_region(&[keep_curve, drop_curve], &tolerances).unwrap();
    assert_eq!(cv, vec![Interval::above(-2.0)]);

    let path = SolutionPath::new(
        vec![f64::NEG_INFINITY, -1.0, 1.0, f64::INFINITY],
        vec![keep.clone(), dropped, keep],
    )
    .unwrap();
    let active = active_set_region(&[0], &path, &tolerances);
    let region = selection_region(&active, &cv);
    assert_eq!(region.len(), 2);
    assert_eq!(region[0].lo, -2.0);
    assert_eq!(region[1], Interval::above(1.0));
}

#[test]
fn two_folds_with_trivial_dominance_cover_the_line() {
    let everywhere = vec![f64::NEG_INFINITY, f64::INFINITY];
    let curves = vec![
        PiecewiseQuadratic::new(everywhere.clone(), vec![Quadratic::new(1.0, 0.0, 0.0)]).unwrap(),
        PiecewiseQuadratic::new(everywhere, vec![Quadratic::new(1.0, 0.0, 0.5)]).unwrap(),
    ];
    let region = cross_validation_region(&curves, &Tolerances::default()).unwrap();
    assert_eq!(region, vec![Interval::FULL]);
}
