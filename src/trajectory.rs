//! Anytime trajectories: cumulative cost against the best loss seen so far.
//!
//! Every evaluation of a run is replayed in the order it was produced
//! (bracket, then rung, then evaluation order within the rung). Folding
//! that stream gives one [`TrajectoryPoint`] per evaluation.
//!
//! ```
//! use hyperband::{Hyperband, SyntheticBenchmark, Trajectory};
//!
//! let hb = Hyperband::new(1.0, 27.0, 3.0)?;
//! let benchmark = SyntheticBenchmark::with_seed(7);
//! let brackets = hb.run(&benchmark, &SyntheticBenchmark::search_space(7))?;
//!
//! let trajectory = Trajectory::aggregate(&brackets);
//! let losses = trajectory.incumbent_losses();
//! assert!(losses.windows(2).all(|w| w[1] <= w[0]));
//! # Ok::<(), hyperband::Error>(())
//! ```

use core::cmp::Ordering;

use crate::bracket::{BracketState, ConfigId};
use crate::objective::Evaluation;

/// One evaluator call, located within a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvaluationEvent {
    /// Position of the bracket in execution order.
    pub bracket: usize,
    /// Position of the rung within the bracket.
    pub rung: usize,
    /// The evaluated configuration, within its bracket.
    pub config: ConfigId,
    /// Budget of the call.
    pub budget: f64,
    /// Reported loss.
    pub loss: f64,
    /// Reported cost.
    pub cost: f64,
}

/// Replays every evaluation of `brackets` in production order.
pub fn events<C>(brackets: &[BracketState<C>]) -> impl Iterator<Item = EvaluationEvent> + '_ {
    brackets.iter().enumerate().flat_map(|(bracket, state)| {
        state
            .rungs()
            .iter()
            .enumerate()
            .flat_map(move |(rung, r)| {
                r.evaluated.iter().filter_map(move |&config| {
                    let eval = state.record(config)?.get(r.budget)?;
                    Some(EvaluationEvent {
                        bracket,
                        rung,
                        config,
                        budget: r.budget,
                        loss: eval.loss,
                        cost: eval.cost,
                    })
                })
            })
    })
}

/// The configuration with the lowest loss at the final rung of its
/// bracket, across all brackets. Ties go to the earlier bracket.
///
/// Returns the bracket position along with the bracket's
/// [`best`](BracketState::best) entry.
#[must_use]
pub fn best_overall<C>(
    brackets: &[BracketState<C>],
) -> Option<(usize, ConfigId, &C, &Evaluation)> {
    brackets
        .iter()
        .enumerate()
        .filter_map(|(i, state)| state.best().map(|(id, c, e)| (i, id, c, e)))
        .min_by(|a, b| a.3.loss.partial_cmp(&b.3.loss).unwrap_or(Ordering::Equal))
}

/// One sample of a [`Trajectory`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrajectoryPoint {
    /// Total cost spent up to and including this evaluation.
    pub cumulative_cost: f64,
    /// Lowest loss observed up to and including this evaluation.
    pub incumbent_loss: f64,
}

/// Running cumulative cost and incumbent loss over a sequence of
/// evaluations.
///
/// `incumbent_loss` never increases and `cumulative_cost` never decreases
/// along the sequence.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trajectory {
    points: Vec<TrajectoryPoint>,
}

impl Trajectory {
    /// Folds every evaluation of `brackets`, in production order.
    #[must_use]
    pub fn aggregate<C>(brackets: &[BracketState<C>]) -> Self {
        Self::from_evaluations(events(brackets).map(|e| Evaluation::new(e.loss, e.cost)))
    }

    /// Folds an arbitrary evaluation stream, in iteration order.
    #[must_use]
    pub fn from_evaluations<I>(evaluations: I) -> Self
    where
        I: IntoIterator<Item = Evaluation>,
    {
        let mut incumbent = f64::INFINITY;
        let mut spent = 0.0;
        let points = evaluations
            .into_iter()
            .map(|eval| {
                incumbent = incumbent.min(eval.loss);
                spent += eval.cost;
                TrajectoryPoint {
                    cumulative_cost: spent,
                    incumbent_loss: incumbent,
                }
            })
            .collect();
        Self { points }
    }

    /// The samples, one per evaluation.
    #[must_use]
    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    /// Iterates the samples in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &TrajectoryPoint> {
        self.points.iter()
    }

    /// Number of samples, one per evaluation.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if no evaluation was folded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Best loss of the whole sequence.
    #[must_use]
    pub fn final_incumbent(&self) -> Option<f64> {
        self.points.last().map(|p| p.incumbent_loss)
    }

    /// Cost of the whole sequence.
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.cumulative_cost)
    }

    /// The incumbent column, for plotting.
    #[must_use]
    pub fn incumbent_losses(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.incumbent_loss).collect()
    }

    /// The cumulative cost column, for plotting.
    #[must_use]
    pub fn cumulative_costs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.cumulative_cost).collect()
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a TrajectoryPoint;
    type IntoIter = core::slice::Iter<'a, TrajectoryPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
