//! Successive Halving: one bracket of budget-aware elimination.
//!
//! A round samples `n_models` configurations and evaluates all of them at
//! `min_budget`. It keeps the best `floor(n / η)` (never fewer than one),
//! multiplies the budget by η, and repeats until the budget exceeds
//! `max_budget`.
//!
//! For example, with `n_models = 40`, `min_budget = 10`, `max_budget = 100`,
//! `η = 2`:
//!
//! | Rung | Budget | Evaluated | Promoted |
//! |------|--------|-----------|----------|
//! | 0 | 10 | 40 | 20 |
//! | 1 | 20 | 20 | 10 |
//! | 2 | 40 | 10 | 5 |
//! | 3 | 80 | 5 | 2 |
//!
//! Each rung is a barrier: every active configuration is evaluated at the
//! current budget before any of them is ranked or promoted.
//!
//! # Budget growth
//!
//! The next budget is `round(b · η)`, rounding halves to even, so repeated
//! multiplication of a fractional starting budget lands on whole numbers
//! without drifting past `max_budget` (6.25 grows to 12, not 13). When
//! rounding would not increase the budget (tiny budgets, η close to 1) the
//! unrounded product is used so the rung sequence is always strictly
//! increasing.
//!
//! # Example
//!
//! ```
//! use hyperband::{Evaluation, SuccessiveHalving};
//!
//! let sh = SuccessiveHalving::new(40, 10.0, 100.0, 2.0)?;
//! assert_eq!(sh.rung_budgets(), vec![10.0, 20.0, 40.0, 80.0]);
//!
//! let next = std::cell::Cell::new(0_u32);
//! let source = || { next.set(next.get() + 1); next.get() };
//! let evaluator = |c: &u32, budget: f64| {
//!     Ok::<_, String>(Evaluation::new(f64::from(*c) / budget, budget))
//! };
//!
//! let bracket = sh.run(&evaluator, &source)?;
//! let sizes: Vec<usize> = bracket.rungs().iter().map(|r| r.evaluated.len()).collect();
//! assert_eq!(sizes, vec![40, 20, 10, 5]);
//! # Ok::<(), hyperband::Error>(())
//! ```

use core::cmp::Ordering;
use core::ops::ControlFlow;

use crate::bracket::{BracketState, ConfigId, Rung};
use crate::error::{Aborted, Error, Result, invalid};
use crate::objective::{ConfigurationSource, Evaluator};

/// Progress report passed to run callbacks after every completed rung.
#[derive(Clone, Debug, PartialEq)]
pub struct RungReport {
    /// Position of the bracket in the run (always 0 for a standalone
    /// Successive Halving round).
    pub bracket: usize,
    /// Position of the rung within the bracket.
    pub rung: usize,
    /// Budget of the rung.
    pub budget: f64,
    /// Configurations evaluated at this rung.
    pub n_evaluated: usize,
    /// Configurations promoted past this rung.
    pub n_promoted: usize,
    /// Lowest loss observed at this rung.
    pub best_loss: f64,
    /// `true` for the bracket's final rung.
    pub is_last: bool,
}

/// One Successive Halving round with fixed parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SuccessiveHalving {
    n_models: usize,
    min_budget: f64,
    max_budget: f64,
    eta: f64,
}

impl SuccessiveHalving {
    /// Creates a round that samples `n_models` configurations and runs
    /// them from `min_budget` up to `max_budget` with elimination factor
    /// `eta`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameters`] unless `n_models >= 1`,
    /// `0 < min_budget <= max_budget` and `eta > 1` (all finite).
    pub fn new(n_models: usize, min_budget: f64, max_budget: f64, eta: f64) -> Result<Self> {
        if n_models == 0 {
            return Err(invalid("n_models must be at least 1"));
        }
        if !(min_budget.is_finite() && min_budget > 0.0) {
            return Err(invalid(format!(
                "min_budget must be positive and finite, got {min_budget}"
            )));
        }
        if !max_budget.is_finite() || max_budget < min_budget {
            return Err(invalid(format!(
                "max_budget ({max_budget}) must be finite and >= min_budget ({min_budget})"
            )));
        }
        validate_eta(eta)?;
        Ok(Self {
            n_models,
            min_budget,
            max_budget,
            eta,
        })
    }

    /// Number of configurations sampled.
    #[must_use]
    pub fn n_models(&self) -> usize {
        self.n_models
    }

    /// Budget of the first rung.
    #[must_use]
    pub fn min_budget(&self) -> f64 {
        self.min_budget
    }

    /// Largest budget any rung may use.
    #[must_use]
    pub fn max_budget(&self) -> f64 {
        self.max_budget
    }

    /// Elimination factor η.
    #[must_use]
    pub fn eta(&self) -> f64 {
        self.eta
    }

    /// The budget of every rung, ascending.
    #[must_use]
    pub fn rung_budgets(&self) -> Vec<f64> {
        rung_budgets(self.min_budget, self.max_budget, self.eta)
    }

    /// Number of configurations promoted out of a rung of `n_active`:
    /// `floor(n_active / η)`, but never zero.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn keep(&self, n_active: usize) -> usize {
        ((n_active as f64 / self.eta).floor() as usize).max(1)
    }

    /// Runs the round to completion.
    ///
    /// # Errors
    ///
    /// Returns an [`Aborted`] carrying [`Error::EvaluationFailure`] for the
    /// first evaluation that fails or returns an invalid pair. The round
    /// stops there and the partially evaluated rung is never ranked; the
    /// bracket as it stood is kept in [`Aborted::failed`].
    pub fn run<C, S, E>(
        &self,
        evaluator: &E,
        source: &S,
    ) -> core::result::Result<BracketState<C>, Aborted<C>>
    where
        S: ConfigurationSource<Config = C> + ?Sized,
        E: Evaluator<C> + ?Sized,
    {
        self.run_with_callback(evaluator, source, |_| ControlFlow::Continue(()))
    }

    /// Runs the round, calling `callback` after every completed rung.
    ///
    /// Returning `ControlFlow::Break(())` stops the round before the next
    /// rung starts; the returned state then reports
    /// [`is_complete`](BracketState::is_complete) as `false`.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub fn run_with_callback<C, S, E, F>(
        &self,
        evaluator: &E,
        source: &S,
        mut callback: F,
    ) -> core::result::Result<BracketState<C>, Aborted<C>>
    where
        S: ConfigurationSource<Config = C> + ?Sized,
        E: Evaluator<C> + ?Sized,
        F: FnMut(&RungReport) -> ControlFlow<()>,
    {
        let budgets = self.rung_budgets();
        let mut state = BracketState::sample(source, self.n_models, budgets.len());
        match self.run_rungs(&mut state, &budgets, evaluator, 0, &mut callback) {
            Ok(_) => Ok(state),
            Err(error) => Err(Aborted {
                completed: Vec::new(),
                failed: Some(state),
                error,
            }),
        }
    }

    /// Drives the rung loop over a freshly sampled bracket.
    pub(crate) fn run_rungs<C, E, F>(
        &self,
        state: &mut BracketState<C>,
        budgets: &[f64],
        evaluator: &E,
        bracket: usize,
        callback: &mut F,
    ) -> Result<ControlFlow<()>>
    where
        E: Evaluator<C> + ?Sized,
        F: FnMut(&RungReport) -> ControlFlow<()>,
    {
        for (rung, &budget) in budgets.iter().enumerate() {
            let evaluated = state.active().to_vec();
            let mut ranked = Vec::with_capacity(evaluated.len());

            for &id in &evaluated {
                let candidate = state
                    .candidate(id)
                    .ok_or(Error::Internal("active configuration missing from bracket"))?;
                let eval = evaluator
                    .evaluate(&candidate.config, budget)
                    .map_err(|e| failure(bracket, id, budget, e.to_string()))?;
                eval.validate()
                    .map_err(|reason| failure(bracket, id, budget, reason))?;
                state.record_mut(id)?.insert(budget, eval)?;
                ranked.push((id, eval.loss));
            }

            ranked.sort_by(|a, b| {
                a.1.partial_cmp(&b.1)
                    .unwrap_or(Ordering::Equal)
                    .then(a.0.cmp(&b.0))
            });
            let promoted: Vec<ConfigId> = ranked
                .iter()
                .take(self.keep(evaluated.len()))
                .map(|&(id, _)| id)
                .collect();

            let report = RungReport {
                bracket,
                rung,
                budget,
                n_evaluated: evaluated.len(),
                n_promoted: promoted.len(),
                best_loss: ranked.first().map_or(f64::INFINITY, |&(_, loss)| loss),
                is_last: rung + 1 == budgets.len(),
            };
            trace_debug!(
                bracket = report.bracket,
                rung = report.rung,
                budget = report.budget,
                evaluated = report.n_evaluated,
                promoted = report.n_promoted,
                best_loss = report.best_loss,
                "rung complete"
            );

            state.push_rung(Rung {
                budget,
                evaluated,
                promoted,
            });

            if callback(&report).is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }
}

#[allow(unused_variables)]
fn failure(bracket: usize, config: ConfigId, budget: f64, reason: String) -> Error {
    trace_info!(
        bracket = bracket,
        config = %config,
        budget = budget,
        reason = %reason,
        "evaluation failed"
    );
    Error::EvaluationFailure {
        config,
        budget,
        reason,
    }
}

pub(crate) fn validate_eta(eta: f64) -> Result<()> {
    if eta.is_finite() && eta > 1.0 {
        Ok(())
    } else {
        Err(invalid(format!("eta must be finite and > 1, got {eta}")))
    }
}

/// Next rung budget after `budget`: `round(budget · η)` with ties to even,
/// or the unrounded product when rounding would not make progress.
pub(crate) fn next_budget(budget: f64, eta: f64) -> f64 {
    let grown = budget * eta;
    let rounded = grown.round_ties_even();
    if rounded > budget { rounded } else { grown }
}

/// Every rung budget from `min_budget` while it stays `<= max_budget`.
pub(crate) fn rung_budgets(min_budget: f64, max_budget: f64, eta: f64) -> Vec<f64> {
    let mut budgets = Vec::new();
    let mut budget = min_budget;
    while budget <= max_budget {
        budgets.push(budget);
        budget = next_budget(budget, eta);
    }
    budgets
}
