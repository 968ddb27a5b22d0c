use crate::interval::{Interval, MergeRule, merge};
use crate::quadratic::{Quadratic, Solution, solve_leq};

/// Region where `reference` is no larger than every competitor.
///
/// Returns `None` when no such region exists. Any competitor that beats the
/// reference everywhere ends the search immediately. Single-interval
/// constraints are intersected into one running interval; each two-interval
/// constraint splits every surviving candidate into its left and right parts.
/// The survivors come back sorted and merged.
pub fn find_min_interval(
    reference: &Quadratic,
    competitors: &[Quadratic],
    zero_tol: f64,
) -> Option<Vec<Interval>> {
    let mut single: Vec<Interval> = Vec::with_capacity(competitors.len());
    let mut split: Vec<(Interval, Interval)> = Vec::new();

    for (index, competitor) in competitors.iter().enumerate() {
        match solve_leq(reference, competitor, zero_tol) {
            Solution::Empty => {
                log::trace!("Competitor {index} dominates the reference everywhere.");
                return None;
            }
            Solution::One(interval) => single.push(interval),
            Solution::Two(left, right) => split.push((left, right)),
        }
    }

    let mut running = Interval::FULL;
    for interval in &single {
        running = running.intersect(interval)?;
    }

    let mut candidates = vec![running];
    for (left, right) in &split {
        candidates = candidates
            .iter()
            .filter_map(|c| c.intersect(left))
            .chain(candidates.iter().filter_map(|c| c.intersect(right)))
            .collect();
        if candidates.is_empty() {
            return None;
        }
    }

    Some(merge(candidates, MergeRule::Touching))
}
