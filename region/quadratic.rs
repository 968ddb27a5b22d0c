use crate::interval::Interval;
use crate::numeric::snap_to_zero;
use serde::{Deserialize, Serialize};
use std::ops::Add;

/// `q(z) = quadratic * z^2 + linear * z + constant`, the fit criterion of one
/// path segment as a function of the line parameter `z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadratic {
    pub quadratic: f64,
    pub linear: f64,
    pub constant: f64,
}

impl Quadratic {
    pub const ZERO: Quadratic = Quadratic {
        quadratic: 0.0,
        linear: 0.0,
        constant: 0.0,
    };

    pub fn new(quadratic: f64, linear: f64, constant: f64) -> Self {
        Self {
            quadratic,
            linear,
            constant,
        }
    }

    /// Same coefficients with every near-zero entry snapped to exactly zero.
    pub fn snapped(self, tol: f64) -> Self {
        Self {
            quadratic: snap_to_zero(self.quadratic, tol),
            linear: snap_to_zero(self.linear, tol),
            constant: snap_to_zero(self.constant, tol),
        }
    }

    pub fn evaluate(&self, z: f64) -> f64 {
        (self.quadratic * z + self.linear) * z + self.constant
    }

    pub fn is_finite(&self) -> bool {
        self.quadratic.is_finite() && self.linear.is_finite() && self.constant.is_finite()
    }

    fn minus(&self, other: &Quadratic) -> Quadratic {
        Quadratic {
            quadratic: self.quadratic - other.quadratic,
            linear: self.linear - other.linear,
            constant: self.constant - other.constant,
        }
    }
}

impl Add for Quadratic {
    type Output = Quadratic;

    fn add(self, other: Quadratic) -> Quadratic {
        Quadratic {
            quadratic: self.quadratic + other.quadratic,
            linear: self.linear + other.linear,
            constant: self.constant + other.constant,
        }
    }
}

/// Solution set of a single quadratic inequality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Solution {
    Empty,
    One(Interval),
    /// Two disjoint half-lines `(-inf, x1] ∪ [x2, inf)`.
    Two(Interval, Interval),
}

impl Solution {
    pub fn contains(&self, z: f64) -> bool {
        match self {
            Solution::Empty => false,
            Solution::One(interval) => interval.contains(z),
            Solution::Two(left, right) => left.contains(z) || right.contains(z),
        }
    }
}

/// Exact set `{z : first(z) <= second(z)}`.
///
/// Works on the difference `a z^2 + b z + c <= 0`. The coefficient
/// differences are compared to zero exactly; only the discriminant is snapped
/// with `zero_tol`, which is what separates the tangent case from the
/// one- and two-root cases.
pub fn solve_leq(first: &Quadratic, second: &Quadratic, zero_tol: f64) -> Solution {
    let diff = first.minus(second);
    let (a, b, c) = (diff.quadratic, diff.linear, diff.constant);

    if a == 0.0 {
        if b == 0.0 {
            return if c <= 0.0 {
                Solution::One(Interval::FULL)
            } else {
                Solution::Empty
            };
        }
        let root = -c / b;
        return if b < 0.0 {
            Solution::One(Interval::above(root))
        } else {
            Solution::One(Interval::below(root))
        };
    }

    let delta = snap_to_zero(b * b - 4.0 * a * c, zero_tol);
    if delta < 0.0 {
        return if a > 0.0 {
            Solution::Empty
        } else {
            Solution::One(Interval::FULL)
        };
    }

    if delta == 0.0 {
        let root = -b / (2.0 * a);
        return if a > 0.0 {
            Solution::One(Interval::below(root))
        } else {
            Solution::One(Interval::above(root))
        };
    }

    let sqrt_delta = delta.sqrt();
    let r1 = (-b - sqrt_delta) / (2.0 * a);
    let r2 = (-b + sqrt_delta) / (2.0 * a);
    let (x1, x2) = (r1.min(r2), r1.max(r2));

    if a > 0.0 {
        Solution::One(Interval::new(x1, x2))
    } else {
        Solution::Two(Interval::below(x1), Interval::above(x2))
    }
}
