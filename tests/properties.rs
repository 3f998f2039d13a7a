use std::cell::Cell;

use hyperband::{Evaluation, Hyperband, SuccessiveHalving, SyntheticBenchmark, Trajectory};
use proptest::prelude::*;

fn counting_source() -> impl Fn() -> u32 {
    let next = Cell::new(0_u32);
    move || {
        let id = next.get();
        next.set(id + 1);
        id
    }
}

/// Deterministic pseudo-loss that depends on both configuration and budget.
fn hashed_loss(c: &u32, budget: f64) -> Result<Evaluation, String> {
    let mixed = c.wrapping_mul(2_654_435_761) >> 8;
    Ok(Evaluation::new(f64::from(mixed % 1000) / budget, budget))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_rung_count_tracks_log_ratio(
        min in 1.0f64..10.0,
        ratio in 1.0f64..200.0,
        eta in 2.0f64..4.0,
    ) {
        let max = min * ratio;
        let sh = SuccessiveHalving::new(1, min, max, eta).unwrap();
        let rungs = sh.rung_budgets().len();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let nominal = ((max / min).ln() / eta.ln()).floor() as usize + 1;
        prop_assert!(rungs + 1 >= nominal && rungs <= nominal + 1,
            "rungs = {rungs}, nominal = {nominal}");
    }

    #[test]
    fn prop_active_set_shrinks_and_never_empties(
        n in 1usize..60,
        min in 1.0f64..5.0,
        ratio in 1.0f64..50.0,
        eta in 1.5f64..4.0,
    ) {
        let sh = SuccessiveHalving::new(n, min, min * ratio, eta).unwrap();
        let state = sh.run(&hashed_loss, &counting_source()).unwrap();
        let sizes: Vec<usize> = state.rungs().iter().map(|r| r.evaluated.len()).collect();
        prop_assert_eq!(sizes[0], n);
        prop_assert!(sizes.windows(2).all(|w| w[1] <= w[0]));
        for rung in state.rungs() {
            prop_assert_eq!(rung.promoted.len(), sh.keep(rung.evaluated.len()));
            prop_assert!(!rung.promoted.is_empty());
        }
        prop_assert_eq!(state.active().len(), sh.keep(*sizes.last().unwrap()));
    }

    #[test]
    fn prop_no_budget_evaluated_twice(
        min in 1.0f64..5.0,
        ratio in 2.0f64..100.0,
        eta in 2.0f64..4.0,
    ) {
        let hb = Hyperband::new(min, min * ratio, eta).unwrap();
        let brackets = hb.run(&hashed_loss, &counting_source()).unwrap();
        for state in &brackets {
            for (_, _, record) in state.iter() {
                let budgets: Vec<f64> = record.budgets().collect();
                prop_assert!(budgets.windows(2).all(|w| w[1] > w[0]));
            }
        }
    }

    #[test]
    fn prop_trajectory_is_monotone(seed in any::<u64>(), eta in 2.0f64..4.0) {
        let hb = Hyperband::new(1.0, 40.0, eta).unwrap();
        let benchmark = SyntheticBenchmark::with_seed(seed);
        let brackets = hb.run(&benchmark, &SyntheticBenchmark::search_space(seed)).unwrap();
        let trajectory = Trajectory::aggregate(&brackets);
        for w in trajectory.points().windows(2) {
            prop_assert!(w[1].incumbent_loss <= w[0].incumbent_loss);
            prop_assert!(w[1].cumulative_cost >= w[0].cumulative_cost);
        }
    }

    #[test]
    fn prop_seeded_runs_are_deterministic(seed in any::<u64>()) {
        let run = || {
            let benchmark = SyntheticBenchmark::with_seed(seed);
            let hb = Hyperband::new(1.0, 27.0, 3.0).unwrap();
            let brackets = hb.run(&benchmark, &SyntheticBenchmark::search_space(seed)).unwrap();
            let configs: Vec<_> = brackets
                .iter()
                .flat_map(|b| b.iter().map(|(id, c, _)| (id, c.clone())))
                .collect();
            (configs, Trajectory::aggregate(&brackets))
        };
        prop_assert_eq!(run(), run());
    }
}
