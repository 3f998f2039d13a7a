//! Per-bracket state: sampled configurations, their evaluation records,
//! the active set, and the rung history.
//!
//! Configurations live in an arena indexed by [`ConfigId`] (the sampling
//! position), so the active set is a list of ids rather than positions in a
//! re-sorted array. A [`BracketState`] is built fresh for every Successive
//! Halving round and only that round's rung loop mutates it.

use core::cmp::Ordering;

use crate::error::{Error, Result};
use crate::objective::{ConfigurationSource, Evaluation};

/// Identifier of a configuration within one bracket: its sampling position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfigId(usize);

impl ConfigId {
    /// Wraps a sampling position.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// The sampling position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl core::fmt::Display for ConfigId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Evaluations of one configuration, keyed by budget, in the order they
/// were recorded (strictly increasing budgets within a bracket).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvaluationRecord {
    evals: Vec<(f64, Evaluation)>,
}

impl EvaluationRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `eval` at `budget`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if `budget` is already present; a
    /// configuration is evaluated at most once per budget.
    pub fn insert(&mut self, budget: f64, eval: Evaluation) -> Result<()> {
        if self.get(budget).is_some() {
            return Err(Error::Internal(
                "configuration already evaluated at this budget",
            ));
        }
        self.evals.push((budget, eval));
        Ok(())
    }

    /// The evaluation at `budget`, if any.
    #[must_use]
    pub fn get(&self, budget: f64) -> Option<&Evaluation> {
        self.evals
            .iter()
            .find(|(b, _)| b.to_bits() == budget.to_bits())
            .map(|(_, e)| e)
    }

    /// The evaluation at the largest recorded budget.
    #[must_use]
    pub fn last(&self) -> Option<(f64, &Evaluation)> {
        self.evals.last().map(|(b, e)| (*b, e))
    }

    /// Iterates `(budget, evaluation)` pairs in recording order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &Evaluation)> {
        self.evals.iter().map(|(b, e)| (*b, e))
    }

    /// The budgets this configuration was evaluated at.
    pub fn budgets(&self) -> impl Iterator<Item = f64> + '_ {
        self.evals.iter().map(|(b, _)| *b)
    }

    /// Number of evaluations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.evals.len()
    }

    /// Returns `true` if the configuration was never evaluated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.evals.is_empty()
    }

    /// Sum of the costs of all evaluations.
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.evals.iter().map(|(_, e)| e.cost).sum()
    }
}

/// A sampled configuration together with its evaluation record.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Candidate<C> {
    /// The configuration as produced by the source.
    pub config: C,
    /// Everything measured for it so far.
    pub record: EvaluationRecord,
}

/// One budget level of a bracket.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rung {
    /// The budget every evaluated configuration received.
    pub budget: f64,
    /// Configurations evaluated at this rung, in evaluation order.
    pub evaluated: Vec<ConfigId>,
    /// Configurations promoted past this rung, best first.
    pub promoted: Vec<ConfigId>,
}

/// State of one Successive Halving bracket.
///
/// Every sampled configuration stays in the arena for the bracket's
/// lifetime; eliminated ones simply stop receiving evaluations.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BracketState<C> {
    candidates: Vec<Candidate<C>>,
    active: Vec<ConfigId>,
    rungs: Vec<Rung>,
    planned_rungs: usize,
}

impl<C> BracketState<C> {
    /// Samples `n` configurations from `source`; all of them start active.
    pub(crate) fn sample<S>(source: &S, n: usize, planned_rungs: usize) -> Self
    where
        S: ConfigurationSource<Config = C> + ?Sized,
    {
        let candidates: Vec<_> = (0..n)
            .map(|_| Candidate {
                config: source.sample(),
                record: EvaluationRecord::new(),
            })
            .collect();
        Self {
            active: (0..candidates.len()).map(ConfigId).collect(),
            candidates,
            rungs: Vec::with_capacity(planned_rungs),
            planned_rungs,
        }
    }

    pub(crate) fn candidate(&self, id: ConfigId) -> Option<&Candidate<C>> {
        self.candidates.get(id.0)
    }

    pub(crate) fn record_mut(&mut self, id: ConfigId) -> Result<&mut EvaluationRecord> {
        self.candidates
            .get_mut(id.0)
            .map(|c| &mut c.record)
            .ok_or(Error::Internal("configuration id out of range"))
    }

    /// Closes a rung: the promoted ids become the new active set.
    pub(crate) fn push_rung(&mut self, rung: Rung) {
        self.active.clone_from(&rung.promoted);
        self.rungs.push(rung);
    }

    /// Configuration `id`.
    #[must_use]
    pub fn config(&self, id: ConfigId) -> Option<&C> {
        self.candidates.get(id.0).map(|c| &c.config)
    }

    /// Evaluation record of configuration `id`.
    #[must_use]
    pub fn record(&self, id: ConfigId) -> Option<&EvaluationRecord> {
        self.candidates.get(id.0).map(|c| &c.record)
    }

    /// Iterates every sampled configuration in sampling order, active or
    /// not.
    pub fn iter(&self) -> impl Iterator<Item = (ConfigId, &C, &EvaluationRecord)> {
        self.candidates
            .iter()
            .enumerate()
            .map(|(i, c)| (ConfigId(i), &c.config, &c.record))
    }

    /// Consumes the state, returning the configurations and their records
    /// in sampling order.
    #[must_use]
    pub fn into_candidates(self) -> Vec<Candidate<C>> {
        self.candidates
    }

    /// Configurations still eligible for promotion, best first.
    #[must_use]
    pub fn active(&self) -> &[ConfigId] {
        &self.active
    }

    /// Completed rungs, in budget order.
    #[must_use]
    pub fn rungs(&self) -> &[Rung] {
        &self.rungs
    }

    /// Number of sampled configurations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Returns `true` if the bracket sampled no configurations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Returns `true` once every planned rung has been evaluated. A run
    /// stopped by its callback can leave a bracket incomplete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.rungs.len() == self.planned_rungs
    }

    /// Number of evaluator calls made in this bracket.
    #[must_use]
    pub fn n_evaluations(&self) -> usize {
        self.rungs.iter().map(|r| r.evaluated.len()).sum()
    }

    /// Total evaluation cost spent in this bracket.
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.candidates.iter().map(|c| c.record.total_cost()).sum()
    }

    /// The best configuration at the highest budget reached: the
    /// lowest-loss entry of the last completed rung.
    #[must_use]
    pub fn best(&self) -> Option<(ConfigId, &C, &Evaluation)> {
        let rung = self.rungs.last()?;
        rung.evaluated
            .iter()
            .filter_map(|&id| {
                let c = self.candidates.get(id.0)?;
                c.record.get(rung.budget).map(|e| (id, &c.config, e))
            })
            .min_by(|a, b| {
                a.2.loss
                    .partial_cmp(&b.2.loss)
                    .unwrap_or(Ordering::Equal)
                    .then(a.0.cmp(&b.0))
            })
    }
}
