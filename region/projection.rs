//! The one-dimensional data line `y(z) = a + b z` through the observed
//! response along a test direction, and the per-segment quadratic forms of the
//! residual criterion on that line.

use crate::numeric::squared_norm;
use crate::path::{PiecewiseQuadratic, Segment, SolutionPath};
use crate::quadratic::Quadratic;
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ProjectionError {
    #[error("The squared norm of the test direction is zero or overflows, so the data line y = a + b z is undefined.")]
    DegenerateDirection,

    #[error("The test direction has a non-finite entry {value} at position {index}.")]
    NonFiniteDirection { index: usize, value: f64 },

    #[error("The test direction has length {direction} but the response has length {response}.")]
    DirectionLengthMismatch { direction: usize, response: usize },

    #[error("The design matrix has {rows} rows but the data line has {samples} samples.")]
    DesignRowMismatch { rows: usize, samples: usize },

    #[error(
        "Segment {segment} references feature {feature}, but the design matrix has only {columns} columns."
    )]
    FeatureOutOfRange {
        segment: usize,
        feature: usize,
        columns: usize,
    },

    #[error("Row {row} is out of range for a data line with {samples} samples.")]
    RowOutOfRange { row: usize, samples: usize },

    #[error(
        "Segment {segment} anchored at z = {anchor} produced a non-finite quadratic {quadratic:?}."
    )]
    NonFiniteQuadratic {
        segment: usize,
        anchor: f64,
        quadratic: Quadratic,
    },
}

/// `a` and `b` of the line `y(z) = a + b z`, fixed for one hypothesis.
#[derive(Debug, Clone, PartialEq)]
pub struct LineParameterization {
    /// Response projected onto the orthogonal complement of the direction.
    pub a: Array1<f64>,
    /// `eta / ||eta||^2`.
    pub b: Array1<f64>,
    observed: f64,
}

impl LineParameterization {
    /// Builds the line through `response` along `direction`.
    ///
    /// `a = (I - eta eta^T / ||eta||^2) y` is formed without materialising the
    /// projector: `a = y - eta (eta^T y) / ||eta||^2`.
    pub fn new(
        response: ArrayView1<f64>,
        direction: ArrayView1<f64>,
    ) -> Result<Self, ProjectionError> {
        if direction.len() != response.len() {
            return Err(ProjectionError::DirectionLengthMismatch {
                direction: direction.len(),
                response: response.len(),
            });
        }

        if let Some((index, &value)) = direction.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(ProjectionError::NonFiniteDirection { index, value });
        }

        let sq_norm = squared_norm(direction);
        if !(sq_norm.is_finite() && sq_norm > 0.0) {
            return Err(ProjectionError::DegenerateDirection);
        }

        let observed = direction.dot(&response);
        let b = direction.mapv(|v| v / sq_norm);
        let a = &response - &(&b * observed);

        Ok(Self { a, b, observed })
    }

    /// The observed test statistic `eta^T y`; the line passes through `y` here.
    pub fn observed_statistic(&self) -> f64 {
        self.observed
    }

    pub fn samples(&self) -> usize {
        self.a.len()
    }

    /// `a + b z`
    pub fn point(&self, z: f64) -> Array1<f64> {
        &self.a + &(&self.b * z)
    }

    /// The same line seen only through the given sample rows.
    pub fn restricted(&self, rows: &[usize]) -> Result<Self, ProjectionError> {
        let samples = self.samples();
        if let Some(&row) = rows.iter().find(|&&row| row >= samples) {
            return Err(ProjectionError::RowOutOfRange { row, samples });
        }
        Ok(Self {
            a: self.a.select(Axis(0), rows),
            b: self.b.select(Axis(0), rows),
            observed: self.observed,
        })
    }
}

/// Residual criterion `||y(z) - X beta(z)||^2 / 2` of one segment as a
/// quadratic in `z`, with `beta(z) = bias_fit + eta_fit (z - anchor)` on the
/// segment's active columns.
pub fn segment_quadratic(
    line: &LineParameterization,
    design: ArrayView2<f64>,
    index: usize,
    anchor: f64,
    segment: &Segment,
    zero_tol: f64,
) -> Result<Quadratic, ProjectionError> {
    if design.nrows() != line.samples() {
        return Err(ProjectionError::DesignRowMismatch {
            rows: design.nrows(),
            samples: line.samples(),
        });
    }
    if let Some(&feature) = segment
        .active_set
        .iter()
        .find(|&&feature| feature >= design.ncols())
    {
        return Err(ProjectionError::FeatureOutOfRange {
            segment: index,
            feature,
            columns: design.ncols(),
        });
    }

    let active = design.select(Axis(1), &segment.active_set);

    // A constant fit needs no anchor, which keeps infinite end breakpoints usable.
    let shifted = if segment.eta_fit.iter().all(|&v| v == 0.0) {
        segment.bias_fit.clone()
    } else {
        &segment.bias_fit - &(&segment.eta_fit * anchor)
    };

    let offset = &line.a - &active.dot(&shifted);
    let slope = &line.b - &active.dot(&segment.eta_fit);

    let mut quadratic = 0.0;
    let mut linear = 0.0;
    let mut constant = 0.0;
    for (o, p) in offset.iter().zip(slope.iter()) {
        constant += o * o;
        linear += 2.0 * o * p;
        quadratic += p * p;
    }

    let form = Quadratic::new(quadratic / 2.0, linear / 2.0, constant / 2.0).snapped(zero_tol);
    if !form.is_finite() {
        return Err(ProjectionError::NonFiniteQuadratic {
            segment: index,
            anchor,
            quadratic: form,
        });
    }
    Ok(form)
}

/// One quadratic per segment of `path`, each anchored at its segment's left breakpoint.
pub fn segment_quadratics(
    line: &LineParameterization,
    design: ArrayView2<f64>,
    path: &SolutionPath,
    zero_tol: f64,
) -> Result<Vec<Quadratic>, ProjectionError> {
    path.segments()
        .iter()
        .enumerate()
        .map(|(k, segment)| {
            segment_quadratic(line, design, k, path.breakpoints()[k], segment, zero_tol)
        })
        .collect()
}

/// The residual criterion of `path` as a piecewise quadratic over the path's own breakpoints.
pub fn path_criterion(
    line: &LineParameterization,
    design: ArrayView2<f64>,
    path: &SolutionPath,
    zero_tol: f64,
) -> Result<PiecewiseQuadratic, crate::construction::ConstructionError> {
    let pieces = segment_quadratics(line, design, path, zero_tol)?;
    Ok(PiecewiseQuadratic::new(path.breakpoints().to_vec(), pieces)?)
}
