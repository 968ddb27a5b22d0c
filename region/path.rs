//! Piecewise descriptions of a solution path along the data line.
//!
//! A path is a strictly ascending breakpoint list together with one item per
//! segment: either the solver's fit on that segment ([`SolutionPath`]) or the
//! criterion already reduced to a quadratic ([`PiecewiseQuadratic`]).

use crate::quadratic::Quadratic;
use ndarray::Array1;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PathError {
    #[error("A path needs at least two breakpoints to define a segment, got {0}.")]
    TooFewBreakpoints(usize),

    #[error(
        "Breakpoints must be strictly ascending: position {index} holds {next} after {previous}."
    )]
    NotAscending {
        index: usize,
        previous: f64,
        next: f64,
    },

    #[error("{breakpoints} breakpoints describe {expected} segments, but {found} were supplied.")]
    SegmentCountMismatch {
        breakpoints: usize,
        expected: usize,
        found: usize,
    },

    #[error(
        "Segment {segment} has {active} active features but fits of length {eta_fit} (direction) and {bias_fit} (bias)."
    )]
    FitLengthMismatch {
        segment: usize,
        active: usize,
        eta_fit: usize,
        bias_fit: usize,
    },

    #[error("Piece {index} has a non-finite coefficient: {piece:?}.")]
    NonFinitePiece { index: usize, piece: Quadratic },

    #[error("Cannot combine an empty list of piecewise quadratics.")]
    NothingToSum,

    #[error("Piecewise quadratics to be summed share no common range.")]
    DisjointRanges,
}

/// The fit on one segment of the path: the active features and the linear
/// parameterisation of their coefficients, `bias_fit + eta_fit * (z - z_k)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub active_set: Vec<usize>,
    pub eta_fit: Array1<f64>,
    pub bias_fit: Array1<f64>,
}

impl Segment {
    pub fn new(active_set: Vec<usize>, eta_fit: Array1<f64>, bias_fit: Array1<f64>) -> Self {
        Self {
            active_set,
            eta_fit,
            bias_fit,
        }
    }

    /// Order-insensitive comparison of the active set against `target`.
    pub fn selects(&self, target: &[usize]) -> bool {
        same_features(&self.active_set, target)
    }
}

/// True when both index lists name the same features, ignoring order.
pub fn same_features(first: &[usize], second: &[usize]) -> bool {
    if first.len() != second.len() {
        return false;
    }
    let mut first = first.to_vec();
    let mut second = second.to_vec();
    first.sort_unstable();
    second.sort_unstable();
    first == second
}

fn validate_breakpoints(breakpoints: &[f64], segments: usize) -> Result<(), PathError> {
    if breakpoints.len() < 2 {
        return Err(PathError::TooFewBreakpoints(breakpoints.len()));
    }
    for (index, pair) in breakpoints.windows(2).enumerate() {
        // Written so that NaN also fails.
        if !(pair[0] < pair[1]) {
            return Err(PathError::NotAscending {
                index: index + 1,
                previous: pair[0],
                next: pair[1],
            });
        }
    }
    if segments != breakpoints.len() - 1 {
        return Err(PathError::SegmentCountMismatch {
            breakpoints: breakpoints.len(),
            expected: breakpoints.len() - 1,
            found: segments,
        });
    }
    Ok(())
}

/// Index of the first segment `k` with `breakpoints[k] <= z <= breakpoints[k + 1]`.
fn locate(breakpoints: &[f64], z: f64) -> Option<usize> {
    breakpoints
        .windows(2)
        .position(|pair| pair[0] <= z && z <= pair[1])
}

/// Breakpoints and per-segment fits, as produced by the path solver.
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionPath {
    breakpoints: Vec<f64>,
    segments: Vec<Segment>,
}

impl SolutionPath {
    pub fn new(breakpoints: Vec<f64>, segments: Vec<Segment>) -> Result<Self, PathError> {
        validate_breakpoints(&breakpoints, segments.len())?;
        for (index, segment) in segments.iter().enumerate() {
            let active = segment.active_set.len();
            if segment.eta_fit.len() != active || segment.bias_fit.len() != active {
                return Err(PathError::FitLengthMismatch {
                    segment: index,
                    active,
                    eta_fit: segment.eta_fit.len(),
                    bias_fit: segment.bias_fit.len(),
                });
            }
        }
        Ok(Self {
            breakpoints,
            segments,
        })
    }

    pub fn breakpoints(&self) -> &[f64] {
        &self.breakpoints
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment_index_at(&self, z: f64) -> Option<usize> {
        locate(&self.breakpoints, z)
    }

    /// Active set of the segment containing `z`; the left segment wins on a shared breakpoint.
    pub fn active_set_at(&self, z: f64) -> Option<&[usize]> {
        self.segment_index_at(z)
            .map(|k| self.segments[k].active_set.as_slice())
    }
}

/// A criterion curve: one quadratic per segment between ascending breakpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseQuadratic {
    breakpoints: Vec<f64>,
    pieces: Vec<Quadratic>,
}

impl PiecewiseQuadratic {
    pub fn new(breakpoints: Vec<f64>, pieces: Vec<Quadratic>) -> Result<Self, PathError> {
        validate_breakpoints(&breakpoints, pieces.len())?;
        if let Some((index, piece)) = pieces.iter().enumerate().find(|(_, q)| !q.is_finite()) {
            return Err(PathError::NonFinitePiece {
                index,
                piece: *piece,
            });
        }
        Ok(Self {
            breakpoints,
            pieces,
        })
    }

    pub fn breakpoints(&self) -> &[f64] {
        &self.breakpoints
    }

    pub fn pieces(&self) -> &[Quadratic] {
        &self.pieces
    }

    /// The piece whose closed range contains `z`; the first match wins.
    pub fn piece_at(&self, z: f64) -> Option<&Quadratic> {
        locate(&self.breakpoints, z).map(|k| &self.pieces[k])
    }

    /// Pointwise sum over the common range of all curves.
    ///
    /// Used to total per-fold validation errors into the cross-validation
    /// criterion of one candidate.
    pub fn sum(curves: &[PiecewiseQuadratic]) -> Result<PiecewiseQuadratic, PathError> {
        if curves.is_empty() {
            return Err(PathError::NothingToSum);
        }

        let lower = curves
            .iter()
            .map(|c| c.breakpoints[0])
            .fold(f64::NEG_INFINITY, f64::max);
        let upper = curves
            .iter()
            .map(|c| c.breakpoints[c.breakpoints.len() - 1])
            .fold(f64::INFINITY, f64::min);
        if !(lower < upper) {
            return Err(PathError::DisjointRanges);
        }

        let mut breakpoints: Vec<f64> = curves
            .iter()
            .flat_map(|c| c.breakpoints.iter().copied())
            .filter(|z| lower <= *z && *z <= upper)
            .collect();
        breakpoints.sort_by(f64::total_cmp);
        breakpoints.dedup();

        // One cursor per curve, pointing at the piece that spans the current window.
        // Every curve breakpoint inside the common range is on the merged grid and the
        // last breakpoint of each curve is at least `upper`, so a cursor never runs off.
        let mut cursors = vec![0usize; curves.len()];
        let mut pieces = Vec::with_capacity(breakpoints.len() - 1);
        for window in breakpoints.windows(2) {
            let lo = window[0];
            let mut total = Quadratic::ZERO;
            for (curve, k) in curves.iter().zip(cursors.iter_mut()) {
                while curve.breakpoints[*k + 1] <= lo {
                    *k += 1;
                }
                total = total + curve.pieces[*k];
            }
            pieces.push(total);
        }

        PiecewiseQuadratic::new(breakpoints, pieces)
    }
}
