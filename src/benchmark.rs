//! A seeded synthetic benchmark for tests and demos.
//!
//! Loss shrinks with budget and cost grows with it:
//!
//! - `loss = U(0.1, 3.0) / budget`
//! - `cost = U(0.001, 0.01) · budget`

use core::convert::Infallible;

use parking_lot::Mutex;

use crate::objective::{Evaluation, Evaluator};
use crate::rng_util;
use crate::space::{Hyperparameter, SearchSpace};
use crate::trajectory::Trajectory;

/// Values of the benchmark's two ordinal hyperparameters.
const LAYER_SIZES: [f64; 6] = [16.0, 32.0, 64.0, 128.0, 256.0, 512.0];

struct State {
    rng: fastrand::Rng,
    log: Vec<Evaluation>,
}

/// Stochastic evaluator that logs every call in order.
///
/// # Examples
///
/// ```
/// use hyperband::{Evaluator, SyntheticBenchmark};
///
/// let benchmark = SyntheticBenchmark::with_seed(0);
/// let eval = benchmark.evaluate(&(), 10.0).unwrap();
/// assert!((0.01..=0.3).contains(&eval.loss));
/// assert!((0.01..=0.1).contains(&eval.cost));
/// assert_eq!(benchmark.n_evaluations(), 1);
/// ```
pub struct SyntheticBenchmark {
    state: Mutex<State>,
}

impl SyntheticBenchmark {
    /// Creates a benchmark seeded from system entropy.
    #[must_use]
    pub fn new() -> Self {
        Self::from_rng(fastrand::Rng::new())
    }

    /// Creates a benchmark with a fixed seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(fastrand::Rng::with_seed(seed))
    }

    fn from_rng(rng: fastrand::Rng) -> Self {
        Self {
            state: Mutex::new(State {
                rng,
                log: Vec::new(),
            }),
        }
    }

    /// The benchmark's search space: ordinals `hyp_1` and `hyp_2` over
    /// `{16, 32, 64, 128, 256, 512}`, sampled with `seed`.
    #[must_use]
    pub fn search_space(seed: u64) -> SearchSpace {
        let sizes = || Hyperparameter::Ordinal {
            values: LAYER_SIZES.to_vec(),
        };
        SearchSpace::from_valid(
            seed,
            vec![("hyp_1".to_string(), sizes()), ("hyp_2".to_string(), sizes())],
        )
    }

    /// Number of evaluations so far.
    #[must_use]
    pub fn n_evaluations(&self) -> usize {
        self.state.lock().log.len()
    }

    /// Every evaluation so far, in call order.
    #[must_use]
    pub fn history(&self) -> Vec<Evaluation> {
        self.state.lock().log.clone()
    }

    /// Incumbent loss against cumulative cost over every call so far.
    #[must_use]
    pub fn results(&self) -> Trajectory {
        Trajectory::from_evaluations(self.state.lock().log.iter().copied())
    }
}

impl Default for SyntheticBenchmark {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Evaluator<C> for SyntheticBenchmark {
    type Error = Infallible;

    fn evaluate(&self, _config: &C, budget: f64) -> Result<Evaluation, Infallible> {
        let mut state = self.state.lock();
        let loss = rng_util::f64_range(&mut state.rng, 0.1, 3.0) / budget;
        let cost = rng_util::f64_range(&mut state.rng, 0.001, 0.01) * budget;
        let eval = Evaluation::new(loss, cost);
        state.log.push(eval);
        Ok(eval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::ConfigurationSource;

    #[test]
    fn loss_and_cost_scale_with_budget() {
        let benchmark = SyntheticBenchmark::with_seed(5);
        for budget in [1.0, 4.0, 50.0] {
            let eval = benchmark.evaluate(&(), budget).unwrap();
            assert!(eval.loss >= 0.1 / budget && eval.loss <= 3.0 / budget);
            assert!(eval.cost >= 0.001 * budget && eval.cost <= 0.01 * budget);
        }
        assert_eq!(benchmark.n_evaluations(), 3);
    }

    #[test]
    fn same_seed_same_history() {
        let a = SyntheticBenchmark::with_seed(9);
        let b = SyntheticBenchmark::with_seed(9);
        for budget in [2.0, 3.0, 5.0] {
            let _ = a.evaluate(&(), budget);
            let _ = b.evaluate(&(), budget);
        }
        assert_eq!(a.history(), b.history());
    }

    #[test]
    fn results_follow_call_order() {
        let benchmark = SyntheticBenchmark::with_seed(1);
        for budget in [1.0, 2.0, 4.0, 8.0] {
            let _ = benchmark.evaluate(&(), budget);
        }
        let history = benchmark.history();
        let results = benchmark.results();
        assert_eq!(results.len(), 4);
        assert_eq!(results, Trajectory::from_evaluations(history));
    }

    #[test]
    fn search_space_draws_layer_sizes() {
        let space = SyntheticBenchmark::search_space(0);
        assert_eq!(space.len(), 2);
        for _ in 0..50 {
            let config = space.sample();
            assert!(LAYER_SIZES.contains(&config.value("hyp_1").unwrap()));
            assert!(LAYER_SIZES.contains(&config.value("hyp_2").unwrap()));
        }
    }
}
