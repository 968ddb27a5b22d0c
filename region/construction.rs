// ========================================================================================
//
//                       Region construction along the data line
//
// ========================================================================================
//
// Two independent views of the selection event are turned into interval lists here:
//
// 1.  The cross-validation view: the selected candidate's criterion curve must stay
//     pointwise minimal among all candidate curves.
//
// 2.  The path view: the fitted path on the full data must select the observed
//     active set.
//
// The final truncation region is their intersection.

use crate::config::Tolerances;
use crate::interval::{Interval, MergeRule, intersect_sets, merge};
use crate::path::{PathError, PiecewiseQuadratic, SolutionPath};
use crate::projection::ProjectionError;
use crate::selection::find_min_interval;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConstructionError {
    #[error("Invalid path description: {0}")]
    Path(#[from] PathError),

    #[error("Could not build the quadratic criterion: {0}")]
    Projection(#[from] ProjectionError),

    #[error("Cross-validation region needs at least one candidate curve.")]
    NoCurves,

    #[error(
        "Curve {curve} has no piece covering z = {z}; its breakpoints do not span the merged grid."
    )]
    UncoveredProbe { curve: usize, z: f64 },

    #[error("The observed statistic z = {0} falls outside every segment of the path.")]
    ObservedOutsidePath(f64),
}

/// Sorted union of every curve's breakpoints, duplicates removed.
fn merged_breakpoints(curves: &[PiecewiseQuadratic]) -> Vec<f64> {
    let mut grid: Vec<f64> = curves
        .iter()
        .flat_map(|curve| curve.breakpoints().iter().copied())
        .collect();
    grid.sort_by(f64::total_cmp);
    grid.dedup();
    grid
}

/// Region on which curve 0 stays pointwise minimal among all `curves`.
///
/// The merged breakpoint grid is walked window by window. In each window
/// `[z_{i-1}, z_i]` every curve contributes the piece covering `z_i`, the
/// min-interval finder runs on that bundle, and its answer is clipped to the
/// window. A curve with no piece at `z_i` is an inconsistent input and fails
/// with [`ConstructionError::UncoveredProbe`].
pub fn cross_validation_region(
    curves: &[PiecewiseQuadratic],
    tolerances: &Tolerances,
) -> Result<Vec<Interval>, ConstructionError> {
    if curves.is_empty() {
        return Err(ConstructionError::NoCurves);
    }

    let grid = merged_breakpoints(curves);
    log::debug!(
        "Walking {} windows over {} candidate curves.",
        grid.len().saturating_sub(1),
        curves.len()
    );

    let mut pieces: Vec<Interval> = Vec::new();
    let mut bundle = Vec::with_capacity(curves.len());
    for window in grid.windows(2) {
        let probe = Interval::new(window[0], window[1]);

        bundle.clear();
        for (curve_index, curve) in curves.iter().enumerate() {
            let piece = curve
                .piece_at(probe.hi)
                .ok_or(ConstructionError::UncoveredProbe {
                    curve: curve_index,
                    z: probe.hi,
                })?;
            bundle.push(*piece);
        }

        let Some(found) = find_min_interval(&bundle[0], &bundle[1..], tolerances.zero) else {
            log::trace!("Window {probe}: selected candidate is never minimal.");
            continue;
        };

        let before = pieces.len();
        pieces.extend(found.iter().filter_map(|interval| interval.intersect(&probe)));
        log::trace!(
            "Window {probe}: {} piece(s) kept out of {}.",
            pieces.len() - before,
            found.len()
        );
    }

    let region = merge(pieces, MergeRule::Touching);
    log::debug!("Cross-validation region has {} interval(s).", region.len());
    Ok(region)
}

/// Region on which `path` selects exactly the features in `target`.
///
/// Every segment whose active set equals `target` (ignoring order)
/// contributes `[z_k, z_{k+1} - boundary_margin]`; neighbours separated by
/// less than `merge_gap` are joined.
pub fn active_set_region(
    target: &[usize],
    path: &SolutionPath,
    tolerances: &Tolerances,
) -> Vec<Interval> {
    let breakpoints = path.breakpoints();
    let matching: Vec<Interval> = path
        .segments()
        .iter()
        .enumerate()
        .filter(|(_, segment)| segment.selects(target))
        .map(|(k, _)| {
            let lo = breakpoints[k];
            // Segments narrower than the margin keep their left endpoint.
            let hi = (breakpoints[k + 1] - tolerances.boundary_margin).max(lo);
            Interval::new(lo, hi)
        })
        .collect();

    let region = merge(matching, MergeRule::WithinGap(tolerances.merge_gap));
    log::debug!(
        "Active set {target:?} is selected on {} interval(s).",
        region.len()
    );
    region
}

/// The truncation region: where both the path and cross-validation reproduce
/// the observed selection.
pub fn selection_region(active: &[Interval], cross_validation: &[Interval]) -> Vec<Interval> {
    intersect_sets(active, cross_validation)
}
