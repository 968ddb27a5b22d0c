//! Small numeric helpers shared by the quadratic and interval code.

/// Magnitude below which a coefficient or discriminant is treated as exactly zero.
pub const ZERO_TOLERANCE: f64 = 1e-12;

/// Returns `0.0` when `value` lies in `[-tol, tol]`, otherwise `value` unchanged.
///
/// Degeneracy branches in the quadratic solver compare against exact zero, so
/// every coefficient that feeds them passes through here first.
#[inline]
pub fn snap_to_zero(value: f64, tol: f64) -> f64 {
    if (-tol..=tol).contains(&value) {
        0.0
    } else {
        value
    }
}

/// Squared Euclidean norm of a slice-like view.
#[inline]
pub fn squared_norm(values: ndarray::ArrayView1<f64>) -> f64 {
    values.dot(&values)
}
