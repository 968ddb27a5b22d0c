use serde::{Deserialize, Serialize};
use std::fmt;

/// A closed interval `[lo, hi]` on the extended real line.
///
/// Either bound may be infinite. Every constructor in this crate keeps `lo <= hi`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

impl Interval {
    /// The whole real line.
    pub const FULL: Interval = Interval {
        lo: f64::NEG_INFINITY,
        hi: f64::INFINITY,
    };

    pub fn new(lo: f64, hi: f64) -> Self {
        debug_assert!(lo <= hi, "interval bounds out of order: [{lo}, {hi}]");
        Self { lo, hi }
    }

    /// `(-inf, hi]`
    pub fn below(hi: f64) -> Self {
        Self::new(f64::NEG_INFINITY, hi)
    }

    /// `[lo, inf)`
    pub fn above(lo: f64) -> Self {
        Self::new(lo, f64::INFINITY)
    }

    pub fn contains(&self, z: f64) -> bool {
        self.lo <= z && z <= self.hi
    }

    /// Overlap of two closed intervals. Touching endpoints count as overlap and
    /// produce a degenerate single-point interval.
    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        let lo = self.lo.max(other.lo);
        let hi = self.hi.min(other.hi);
        if lo > hi {
            None
        } else {
            Some(Interval { lo, hi })
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open_lo = if self.lo.is_infinite() { '(' } else { '[' };
        let close_hi = if self.hi.is_infinite() { ')' } else { ']' };
        write!(f, "{open_lo}{}, {}{close_hi}", self.lo, self.hi)
    }
}

/// Decides when two neighbouring intervals of a sorted list collapse into one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MergeRule {
    /// Merge whenever `next.lo <= current.hi` (overlapping or touching).
    Touching,
    /// Merge whenever `next.lo - current.hi < gap`. Absorbs the round-off
    /// gaps left between intervals built from shared breakpoints.
    WithinGap(f64),
}

impl MergeRule {
    fn joins(&self, current: &Interval, next: &Interval) -> bool {
        match *self {
            MergeRule::Touching => next.lo <= current.hi,
            MergeRule::WithinGap(gap) => next.lo - current.hi < gap,
        }
    }
}

/// Sorts `intervals` ascending by lower bound and folds neighbours that the
/// rule joins, left to right. The result is sorted and, under
/// [`MergeRule::Touching`], pairwise disjoint with no shared endpoints.
pub fn merge(mut intervals: Vec<Interval>, rule: MergeRule) -> Vec<Interval> {
    intervals.sort_by(|x, y| x.lo.total_cmp(&y.lo).then(x.hi.total_cmp(&y.hi)));

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for next in intervals {
        if let Some(current) = merged.last_mut() {
            if rule.joins(current, &next) {
                current.hi = current.hi.max(next.hi);
                continue;
            }
        }
        merged.push(next);
    }
    merged
}

/// All pairwise overlaps between two interval lists, sorted and merged.
pub fn intersect_sets(first: &[Interval], second: &[Interval]) -> Vec<Interval> {
    let overlaps: Vec<Interval> = first
        .iter()
        .flat_map(|x| second.iter().filter_map(move |y| x.intersect(y)))
        .collect();
    merge(overlaps, MergeRule::Touching)
}

/// True when any interval of the list contains `z`.
pub fn covers(intervals: &[Interval], z: f64) -> bool {
    intervals.iter().any(|interval| interval.contains(z))
}
