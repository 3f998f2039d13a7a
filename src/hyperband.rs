//! `Hyperband`: a geometric family of Successive Halving brackets.
//!
//! Successive Halving needs a starting budget, and the right one depends on
//! how early a configuration's loss becomes predictive. `Hyperband` hedges
//! by running every trade-off between "many configurations, tiny budget"
//! and "few configurations, full budget":
//!
//! - `s_max = floor(log(max_budget / min_budget) / log(η))`
//! - for `s = s_max, s_max - 1, ..., 0`:
//!   - `n = ceil((s_max + 1) / (s + 1) · η^s)` configurations
//!   - starting at `r = max_budget · η^(-s)`
//!
//! Brackets run in that order, most aggressive first. They share the
//! evaluator and the configuration source but nothing else: each bracket
//! samples its own configurations into a fresh [`BracketState`].
//!
//! With `min_budget = 2`, `max_budget = 100`, `η = 2`:
//!
//! | Bracket | `s` | Configurations | Starting budget |
//! |---------|-----|----------------|-----------------|
//! | 0 | 5 | 32 | 3.125 |
//! | 1 | 4 | 20 | 6.25 |
//! | 2 | 3 | 12 | 12.5 |
//! | 3 | 2 | 8 | 25 |
//! | 4 | 1 | 6 | 50 |
//! | 5 | 0 | 6 | 100 |
//!
//! # Example
//!
//! ```
//! use hyperband::{Hyperband, SyntheticBenchmark, Trajectory};
//!
//! let hb = Hyperband::builder()
//!     .min_budget(2.0)
//!     .max_budget(100.0)
//!     .eta(2.0)
//!     .build()?;
//!
//! let benchmark = SyntheticBenchmark::with_seed(0);
//! let space = SyntheticBenchmark::search_space(0);
//!
//! let brackets = hb.run(&benchmark, &space)?;
//! assert_eq!(brackets.len(), 6);
//!
//! let trajectory = Trajectory::aggregate(&brackets);
//! assert_eq!(trajectory.len(), hb.planned_evaluations());
//! # Ok::<(), hyperband::Error>(())
//! ```

use core::ops::ControlFlow;
use core::time::Duration;
use std::time::Instant;

use crate::bracket::BracketState;
use crate::error::{Aborted, Error, Result, invalid};
use crate::objective::{ConfigurationSource, Evaluator};
use crate::successive_halving::{RungReport, SuccessiveHalving, rung_budgets, validate_eta};

/// Slack for floating-point logarithms and powers that should land exactly
/// on an integer (`ln(1000) / ln(10)` is `2.9999999999999996`).
const ROUNDING_SLACK: f64 = 1e-9;

/// One bracket of a Hyperband schedule. Computed before any evaluation and
/// never modified.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BracketDescriptor {
    /// Position in execution order.
    pub index: usize,
    /// Aggressiveness: the bracket nominally has `s + 1` rungs.
    pub s: usize,
    /// Number of configurations sampled.
    pub n_configs: usize,
    /// Budget of the first rung.
    pub min_budget: f64,
    /// Upper bound on any rung's budget.
    pub max_budget: f64,
    /// Elimination factor shared by every bracket of the schedule.
    pub eta: f64,
}

impl BracketDescriptor {
    /// The planned rung budgets, ascending.
    #[must_use]
    pub fn rung_budgets(&self) -> Vec<f64> {
        rung_budgets(self.min_budget, self.max_budget, self.eta)
    }
}

/// Hyperband schedule over `[min_budget, max_budget]` with elimination
/// factor `eta`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hyperband {
    min_budget: f64,
    max_budget: f64,
    eta: f64,
}

impl Hyperband {
    /// Creates a schedule.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameters`] unless
    /// `0 < min_budget < max_budget` and `eta > 1` (all finite).
    pub fn new(min_budget: f64, max_budget: f64, eta: f64) -> Result<Self> {
        if !(min_budget.is_finite() && min_budget > 0.0) {
            return Err(invalid(format!(
                "min_budget must be positive and finite, got {min_budget}"
            )));
        }
        if !max_budget.is_finite() || max_budget <= min_budget {
            return Err(invalid(format!(
                "max_budget ({max_budget}) must be finite and > min_budget ({min_budget})"
            )));
        }
        validate_eta(eta)?;
        Ok(Self {
            min_budget,
            max_budget,
            eta,
        })
    }

    /// Creates a builder with defaults `min_budget = 1`, `max_budget = 81`,
    /// `eta = 3`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hyperband::Hyperband;
    ///
    /// let hb = Hyperband::builder().build().unwrap();
    /// assert_eq!(hb.s_max(), 4);
    /// ```
    #[must_use]
    pub fn builder() -> HyperbandBuilder {
        HyperbandBuilder::new()
    }

    /// Smallest budget of the most aggressive bracket.
    #[must_use]
    pub fn min_budget(&self) -> f64 {
        self.min_budget
    }

    /// Budget of every bracket's final rung.
    #[must_use]
    pub fn max_budget(&self) -> f64 {
        self.max_budget
    }

    /// Elimination factor η.
    #[must_use]
    pub fn eta(&self) -> f64 {
        self.eta
    }

    /// `s_max = floor(log(max_budget / min_budget) / log(eta))`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn s_max(&self) -> usize {
        let ratio = self.max_budget / self.min_budget;
        (ratio.ln() / self.eta.ln() + ROUNDING_SLACK).floor() as usize
    }

    /// The brackets of one run, in execution order (`s` descending).
    #[must_use]
    pub fn brackets(&self) -> Vec<BracketDescriptor> {
        let s_max = self.s_max();
        (0..=s_max)
            .rev()
            .enumerate()
            .map(|(index, s)| BracketDescriptor {
                index,
                s,
                n_configs: self.n_configs(s_max, s),
                min_budget: self.max_budget / self.eta_pow(s),
                max_budget: self.max_budget,
                eta: self.eta,
            })
            .collect()
    }

    /// The Successive Halving round that runs `bracket`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameters`] if the descriptor does not fit
    /// this schedule's budgets.
    pub fn successive_halving(&self, bracket: &BracketDescriptor) -> Result<SuccessiveHalving> {
        SuccessiveHalving::new(
            bracket.n_configs,
            bracket.min_budget,
            self.max_budget,
            self.eta,
        )
    }

    /// Number of evaluator calls a complete run makes.
    #[must_use]
    pub fn planned_evaluations(&self) -> usize {
        self.brackets()
            .iter()
            .filter_map(|d| self.successive_halving(d).ok())
            .map(|sh| {
                let mut active = sh.n_models();
                let mut total = 0;
                for _ in sh.rung_budgets() {
                    total += active;
                    active = sh.keep(active);
                }
                total
            })
            .sum()
    }

    /// Runs every bracket to completion.
    ///
    /// # Errors
    ///
    /// If a bracket fails, the remaining brackets are skipped and an
    /// [`Aborted`] is returned holding the brackets that completed, the
    /// failed bracket as it stood, and an [`Error::BracketFailed`] naming
    /// it.
    pub fn run<C, S, E>(
        &self,
        evaluator: &E,
        source: &S,
    ) -> core::result::Result<Vec<BracketState<C>>, Aborted<C>>
    where
        S: ConfigurationSource<Config = C> + ?Sized,
        E: Evaluator<C> + ?Sized,
    {
        self.run_with_callback(evaluator, source, |_| ControlFlow::Continue(()))
    }

    /// Runs the schedule, calling `callback` after every completed rung of
    /// every bracket.
    ///
    /// Returning `ControlFlow::Break(())` stops the run cooperatively: no
    /// evaluation is interrupted, the current bracket keeps the rungs it
    /// finished (and reports `is_complete() == false` if it was cut short),
    /// and no further bracket starts.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    ///
    /// # Examples
    ///
    /// ```
    /// use std::ops::ControlFlow;
    ///
    /// use hyperband::{Hyperband, SyntheticBenchmark};
    ///
    /// let hb = Hyperband::new(1.0, 27.0, 3.0).unwrap();
    /// let benchmark = SyntheticBenchmark::with_seed(1);
    /// let space = SyntheticBenchmark::search_space(1);
    ///
    /// // Stop once the first bracket is done.
    /// let brackets = hb
    ///     .run_with_callback(&benchmark, &space, |report| {
    ///         if report.is_last { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
    ///     })
    ///     .unwrap();
    /// assert_eq!(brackets.len(), 1);
    /// assert!(brackets[0].is_complete());
    /// ```
    pub fn run_with_callback<C, S, E, F>(
        &self,
        evaluator: &E,
        source: &S,
        mut callback: F,
    ) -> core::result::Result<Vec<BracketState<C>>, Aborted<C>>
    where
        S: ConfigurationSource<Config = C> + ?Sized,
        E: Evaluator<C> + ?Sized,
        F: FnMut(&RungReport) -> ControlFlow<()>,
    {
        let descriptors = self.brackets();
        let mut completed = Vec::with_capacity(descriptors.len());

        for bracket in &descriptors {
            let sh = match self.successive_halving(bracket) {
                Ok(sh) => sh,
                Err(error) => {
                    return Err(Aborted {
                        completed,
                        failed: None,
                        error,
                    });
                }
            };
            let budgets = sh.rung_budgets();
            trace_info!(
                bracket = bracket.index,
                s = bracket.s,
                n_configs = bracket.n_configs,
                min_budget = bracket.min_budget,
                rungs = budgets.len(),
                "starting bracket"
            );

            let mut state = BracketState::sample(source, bracket.n_configs, budgets.len());
            match sh.run_rungs(&mut state, &budgets, evaluator, bracket.index, &mut callback) {
                Ok(flow) => {
                    trace_info!(
                        bracket = bracket.index,
                        evaluations = state.n_evaluations(),
                        cost = state.total_cost(),
                        "bracket complete"
                    );
                    completed.push(state);
                    if flow.is_break() {
                        trace_info!(
                            completed_brackets = completed.len(),
                            "run stopped by callback"
                        );
                        break;
                    }
                }
                Err(err) => {
                    return Err(Aborted {
                        completed,
                        failed: Some(state),
                        error: Error::BracketFailed {
                            bracket: bracket.index,
                            s: bracket.s,
                            source: Box::new(err),
                        },
                    });
                }
            }
        }

        Ok(completed)
    }

    /// Runs the schedule until it completes or `duration` has elapsed.
    ///
    /// The deadline is checked after every rung, so the run can overshoot
    /// it by one rung's worth of evaluations.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub fn run_until<C, S, E>(
        &self,
        evaluator: &E,
        source: &S,
        duration: Duration,
    ) -> core::result::Result<Vec<BracketState<C>>, Aborted<C>>
    where
        S: ConfigurationSource<Config = C> + ?Sized,
        E: Evaluator<C> + ?Sized,
    {
        let deadline = Instant::now() + duration;
        self.run_with_callback(evaluator, source, |_| {
            if Instant::now() >= deadline {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
    }

    /// `n = ceil((s_max + 1) · η^s / (s + 1))`.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn n_configs(&self, s_max: usize, s: usize) -> usize {
        let n = (s_max + 1) as f64 * self.eta_pow(s) / (s + 1) as f64;
        ((n - ROUNDING_SLACK).ceil() as usize).max(1)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn eta_pow(&self, s: usize) -> f64 {
        self.eta.powi(s as i32)
    }
}

/// Builder for configuring a [`Hyperband`] schedule.
///
/// # Examples
///
/// ```
/// use hyperband::HyperbandBuilder;
///
/// let hb = HyperbandBuilder::new()
///     .min_budget(2.0)
///     .max_budget(100.0)
///     .eta(2.0)
///     .build()
///     .unwrap();
/// assert_eq!(hb.s_max(), 5);
/// ```
#[derive(Clone, Debug)]
pub struct HyperbandBuilder {
    min_budget: f64,
    max_budget: f64,
    eta: f64,
}

impl HyperbandBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_budget: 1.0,
            max_budget: 81.0,
            eta: 3.0,
        }
    }

    /// Sets the smallest budget any configuration receives.
    #[must_use]
    pub fn min_budget(mut self, budget: f64) -> Self {
        self.min_budget = budget;
        self
    }

    /// Sets the full budget.
    #[must_use]
    pub fn max_budget(mut self, budget: f64) -> Self {
        self.max_budget = budget;
        self
    }

    /// Sets the elimination factor.
    #[must_use]
    pub fn eta(mut self, eta: f64) -> Self {
        self.eta = eta;
        self
    }

    /// Builds the configured [`Hyperband`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameters`] under the same conditions as
    /// [`Hyperband::new`].
    pub fn build(self) -> Result<Hyperband> {
        Hyperband::new(self.min_budget, self.max_budget, self.eta)
    }
}

impl Default for HyperbandBuilder {
    fn default() -> Self {
        Self::new()
    }
}
