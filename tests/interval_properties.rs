use cvtrunc::config::Tolerances;
use cvtrunc::construction::active_set_region;
use cvtrunc::interval::{Interval, MergeRule, merge};
use cvtrunc::numeric::ZERO_TOLERANCE;
use cvtrunc::path::{Segment, SolutionPath};
use cvtrunc::quadratic::{Quadratic, Solution, solve_leq};
use cvtrunc::selection::find_min_interval;

use approx::assert_abs_diff_eq;
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn solve(first: Quadratic, second: Quadratic) -> Solution {
    solve_leq(&first, &second, ZERO_TOLERANCE)
}

#[test]
fn upward_difference_has_analytic_roots() {
    let Solution::One(interval) = solve(Quadratic::new(1.0, 0.0, -4.0), Quadratic::ZERO) else {
        panic!("expected one interval");
    };
    assert_abs_diff_eq!(interval.lo, -2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(interval.hi, 2.0, epsilon = 1e-12);
}

#[test]
fn linear_difference_has_analytic_root() {
    assert_eq!(
        solve(Quadratic::new(0.0, 2.0, -4.0), Quadratic::ZERO),
        Solution::One(Interval::below(2.0))
    );
}

#[test]
fn identical_quadratics_hold_everywhere() {
    let f = Quadratic::new(0.7, -1.3, 2.9);
    assert_eq!(solve(f, f), Solution::One(Interval::FULL));
}

#[test]
fn reference_never_minimal_among_three() {
    let reference = Quadratic::new(1.0, 0.0, 1.0);
    let competitors = [Quadratic::new(1.0, 0.0, 0.0), Quadratic::new(0.0, 0.0, -1.0)];
    assert!(find_min_interval(&reference, &competitors, ZERO_TOLERANCE).is_none());
}

#[test]
fn adjacent_active_set_segments_merge() {
    let segment = |active: Vec<usize>| {
        let len = active.len();
        Segment::new(active, Array1::zeros(len), Array1::zeros(len))
    };
    let path = SolutionPath::new(
        vec![0.0, 1.0, 2.0, 5.0],
        vec![segment(vec![1, 2]), segment(vec![1, 2]), segment(vec![3])],
    )
    .unwrap();
    let region = active_set_region(&[2, 1], &path, &Tolerances::default());
    assert_eq!(region, vec![Interval::new(0.0, 2.0 - 1e-10)]);
}

#[test]
fn merged_lists_are_sorted_disjoint_and_stable() {
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..500 {
        let count = rng.gen_range(1..16);
        let list: Vec<Interval> = (0..count)
            .map(|_| {
                let lo: f64 = rng.gen_range(-50.0..50.0);
                let width: f64 = rng.gen_range(0.0..10.0);
                Interval::new(lo, lo + width)
            })
            .collect();

        let merged = merge(list.clone(), MergeRule::Touching);
        for pair in merged.windows(2) {
            assert!(pair[0].hi < pair[1].lo, "{} touches {}", pair[0], pair[1]);
        }
        assert_eq!(merge(merged.clone(), MergeRule::Touching), merged);

        // Every input point stays covered.
        for interval in &list {
            assert!(
                merged
                    .iter()
                    .any(|m| m.lo <= interval.lo && interval.hi <= m.hi)
            );
        }
    }
}
