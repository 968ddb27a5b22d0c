//! Analysis files: the solver output for one data set and any number of
//! hypotheses, read from TOML, and the per-hypothesis region reports written back.

use crate::config::{ToleranceError, Tolerances};
use crate::construction::{
    ConstructionError, active_set_region, cross_validation_region, selection_region,
};
use crate::interval::{Interval, covers};
use crate::path::{PiecewiseQuadratic, Segment, SolutionPath};
use crate::projection::{LineParameterization, path_criterion};
use crate::quadratic::Quadratic;
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Failed to read or write '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse the analysis file: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("Failed to serialize the region report: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("Invalid tolerances: {0}")]
    Tolerance(#[from] ToleranceError),

    #[error("The analysis file contains no samples.")]
    EmptyResponse,

    #[error("Design row {row} has {found} columns, expected {expected}.")]
    RaggedDesign {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("The design matrix has {rows} rows but the response has {samples} entries.")]
    DesignRowMismatch { rows: usize, samples: usize },

    #[error(
        "Hypothesis '{hypothesis}', curve {curve}: give either explicit `pieces` or `folds`, not {found}."
    )]
    AmbiguousCurve {
        hypothesis: String,
        curve: usize,
        found: &'static str,
    },

    #[error("Hypothesis '{hypothesis}': {source}")]
    Construction {
        hypothesis: String,
        #[source]
        source: ConstructionError,
    },
}

// --- On-disk layout ---

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct AnalysisFile {
    response: Vec<f64>,
    design: Vec<Vec<f64>>,
    #[serde(default)]
    tolerances: Tolerances,
    #[serde(default)]
    hypotheses: Vec<HypothesisSpec>,
}

/// One tested coefficient: its direction, the path along that direction,
/// and optionally the cross-validation curves (selected candidate first).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HypothesisSpec {
    pub name: String,
    pub direction: Vec<f64>,
    /// Defaults to the active set of the segment holding the observed statistic.
    #[serde(default)]
    pub target_active_set: Option<Vec<usize>>,
    pub path: PathSpec,
    #[serde(default)]
    pub curves: Vec<CurveSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathSpec {
    pub breakpoints: Vec<f64>,
    pub segments: Vec<SegmentSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SegmentSpec {
    pub active_set: Vec<usize>,
    pub eta_fit: Vec<f64>,
    pub bias_fit: Vec<f64>,
}

/// A candidate's cross-validation criterion, either already reduced to
/// quadratic pieces or given as one fitted path per fold.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CurveSpec {
    pub breakpoints: Vec<f64>,
    pub pieces: Vec<Quadratic>,
    pub folds: Vec<FoldSpec>,
}

/// The path fitted on one fold's training rows, scored on its validation rows.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FoldSpec {
    pub validation_rows: Vec<usize>,
    pub path: PathSpec,
}

impl PathSpec {
    fn build(&self) -> Result<SolutionPath, ConstructionError> {
        let segments = self
            .segments
            .iter()
            .map(|s| {
                Segment::new(
                    s.active_set.clone(),
                    Array1::from_vec(s.eta_fit.clone()),
                    Array1::from_vec(s.bias_fit.clone()),
                )
            })
            .collect();
        Ok(SolutionPath::new(self.breakpoints.clone(), segments)?)
    }
}

// --- Reports ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionStatus {
    /// At least one interval reproduces the selection.
    Region,
    /// No conditioning region exists; the statistic cannot be conditioned on.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionReport {
    pub name: String,
    pub observed_statistic: f64,
    pub target_active_set: Vec<usize>,
    pub status: RegionStatus,
    pub contains_observed: bool,
    pub intervals: Vec<Interval>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFile {
    pub reports: Vec<RegionReport>,
}

impl ReportFile {
    pub fn to_toml(&self) -> Result<String, AnalysisError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), AnalysisError> {
        let text = self.to_toml()?;
        fs::write(path, text).map_err(|source| AnalysisError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

// --- Evaluation ---

/// A validated analysis: shared data plus the hypotheses to evaluate.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub response: Array1<f64>,
    pub design: Array2<f64>,
    pub tolerances: Tolerances,
    pub hypotheses: Vec<HypothesisSpec>,
}

impl Analysis {
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let text = fs::read_to_string(path).map_err(|source| AnalysisError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, AnalysisError> {
        let file: AnalysisFile = toml::from_str(text)?;
        file.tolerances.validate()?;

        let samples = file.response.len();
        if samples == 0 {
            return Err(AnalysisError::EmptyResponse);
        }
        if file.design.len() != samples {
            return Err(AnalysisError::DesignRowMismatch {
                rows: file.design.len(),
                samples,
            });
        }

        let columns = file.design[0].len();
        if let Some((row, values)) = file
            .design
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != columns)
        {
            return Err(AnalysisError::RaggedDesign {
                row,
                expected: columns,
                found: values.len(),
            });
        }
        let design = Array2::from_shape_fn((samples, columns), |(i, j)| file.design[i][j]);

        Ok(Self {
            response: Array1::from_vec(file.response),
            design,
            tolerances: file.tolerances,
            hypotheses: file.hypotheses,
        })
    }

    /// Evaluates every hypothesis. Hypotheses are independent and run in parallel.
    pub fn evaluate(&self) -> Result<ReportFile, AnalysisError> {
        log::info!(
            "Evaluating {} hypotheses on {} samples x {} features.",
            self.hypotheses.len(),
            self.design.nrows(),
            self.design.ncols()
        );
        let reports = self
            .hypotheses
            .par_iter()
            .map(|hypothesis| self.evaluate_hypothesis(hypothesis))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ReportFile { reports })
    }

    pub fn evaluate_hypothesis(
        &self,
        hypothesis: &HypothesisSpec,
    ) -> Result<RegionReport, AnalysisError> {
        let wrap = |source: ConstructionError| AnalysisError::Construction {
            hypothesis: hypothesis.name.clone(),
            source,
        };

        let direction = Array1::from_vec(hypothesis.direction.clone());
        let line = LineParameterization::new(self.response.view(), direction.view())
            .map_err(|e| wrap(e.into()))?;
        let observed = line.observed_statistic();

        let path = hypothesis.path.build().map_err(wrap)?;
        let target = match &hypothesis.target_active_set {
            Some(target) => target.clone(),
            None => path
                .active_set_at(observed)
                .ok_or(ConstructionError::ObservedOutsidePath(observed))
                .map_err(wrap)?
                .to_vec(),
        };

        let active = active_set_region(&target, &path, &self.tolerances);
        let intervals = if hypothesis.curves.is_empty() {
            active
        } else {
            let curves = hypothesis
                .curves
                .iter()
                .enumerate()
                .map(|(index, spec)| self.build_curve(&hypothesis.name, index, spec, &line))
                .collect::<Result<Vec<_>, _>>()?;
            let cv = cross_validation_region(&curves, &self.tolerances).map_err(wrap)?;
            selection_region(&active, &cv)
        };

        let status = if intervals.is_empty() {
            log::warn!(
                "Hypothesis '{}': no conditioning region reproduces the selection.",
                hypothesis.name
            );
            RegionStatus::Empty
        } else {
            RegionStatus::Region
        };
        let contains_observed = covers(&intervals, observed);
        log::info!(
            "Hypothesis '{}': z_obs = {observed:.6}, {} interval(s), observed inside: {contains_observed}.",
            hypothesis.name,
            intervals.len()
        );

        Ok(RegionReport {
            name: hypothesis.name.clone(),
            observed_statistic: observed,
            target_active_set: target,
            status,
            contains_observed,
            intervals,
        })
    }

    fn build_curve(
        &self,
        hypothesis: &str,
        index: usize,
        spec: &CurveSpec,
        line: &LineParameterization,
    ) -> Result<PiecewiseQuadratic, AnalysisError> {
        let wrap = |source: ConstructionError| AnalysisError::Construction {
            hypothesis: hypothesis.to_string(),
            source,
        };
        let ambiguous = |found: &'static str| AnalysisError::AmbiguousCurve {
            hypothesis: hypothesis.to_string(),
            curve: index,
            found,
        };

        match (spec.pieces.is_empty(), spec.folds.is_empty()) {
            (false, false) => Err(ambiguous("both")),
            (true, true) => Err(ambiguous("neither")),
            (false, true) => PiecewiseQuadratic::new(spec.breakpoints.clone(), spec.pieces.clone())
                .map_err(|e| wrap(e.into())),
            (true, false) => {
                if !spec.breakpoints.is_empty() {
                    return Err(ambiguous("fold paths with explicit breakpoints"));
                }
                let per_fold = spec
                    .folds
                    .iter()
                    .map(|fold| self.fold_curve(fold, line))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(wrap)?;
                PiecewiseQuadratic::sum(&per_fold).map_err(|e| wrap(e.into()))
            }
        }
    }

    /// Validation error of one fold's path as a function of `z`.
    fn fold_curve(
        &self,
        fold: &FoldSpec,
        line: &LineParameterization,
    ) -> Result<PiecewiseQuadratic, ConstructionError> {
        let path = fold.path.build()?;
        let validation_line = line.restricted(&fold.validation_rows)?;
        let validation_design = self.design.select(Axis(0), &fold.validation_rows);
        path_criterion(
            &validation_line,
            validation_design.view(),
            &path,
            self.tolerances.zero,
        )
    }
}
