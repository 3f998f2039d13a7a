//! Error types for the hyperband crate.
//!
//! All fallible operations in the crate return [`Result<T>`], which is an
//! alias for `core::result::Result<T, Error>`. The [`Error`] enum covers
//! schedule validation, search-space definition, and evaluation failures.
//! A run of [`Hyperband`](crate::Hyperband) that stops on an error returns
//! an [`Aborted`] value, which keeps the brackets that finished before the
//! failure.

use crate::bracket::{BracketState, ConfigId};

/// Errors returned by scheduler operations.
///
/// Parameter errors are raised eagerly, before the first evaluation.
/// Evaluation errors are never retried: they fail the enclosing bracket
/// immediately, because an incomplete rung cannot be ranked.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The elimination factor, budgets, or configuration count are out of
    /// range.
    #[error("invalid parameters: {reason}")]
    InvalidParameters {
        /// What was wrong with the parameters.
        reason: String,
    },

    /// The lower bound exceeds the upper bound of a
    /// [`Hyperparameter`](crate::space::Hyperparameter).
    #[error("invalid bounds: low ({low}) must be less than or equal to high ({high})")]
    InvalidBounds {
        /// The lower bound value.
        low: f64,
        /// The upper bound value.
        high: f64,
    },

    /// Log-scale is enabled but the lower bound is not positive.
    #[error("invalid log bounds: low must be positive for log scale")]
    InvalidLogBounds,

    /// An ordinal hyperparameter was defined without any values.
    #[error("ordinal values cannot be empty")]
    EmptyChoices,

    /// The same hyperparameter name was added to a search space twice.
    #[error("parameter conflict for '{name}': {reason}")]
    ParameterConflict {
        /// The name of the conflicting parameter.
        name: String,
        /// The reason for the conflict.
        reason: String,
    },

    /// The evaluator failed, or returned an unusable `(loss, cost)` pair,
    /// for one configuration at one budget.
    #[error("evaluation of configuration {config} at budget {budget} failed: {reason}")]
    EvaluationFailure {
        /// The configuration whose evaluation failed.
        config: ConfigId,
        /// The budget it was evaluated at.
        budget: f64,
        /// The evaluator's error message.
        reason: String,
    },

    /// A Hyperband bracket aborted. `bracket` is the bracket's position in
    /// the run (0 = first bracket executed) and `s` its aggressiveness.
    #[error("bracket {bracket} (s = {s}) aborted: {source}")]
    BracketFailed {
        /// Position of the failed bracket in execution order.
        bracket: usize,
        /// The bracket's `s` value.
        s: usize,
        /// The failure that aborted the bracket.
        #[source]
        source: Box<Error>,
    },

    /// An internal invariant was violated. This indicates a bug in the
    /// library rather than a user error.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

impl Error {
    /// The configuration named by an evaluation failure, looking through
    /// [`Error::BracketFailed`].
    pub(crate) fn failed_config_id(&self) -> Option<ConfigId> {
        match self {
            Self::EvaluationFailure { config, .. } => Some(*config),
            Self::BracketFailed { source, .. } => source.failed_config_id(),
            _ => None,
        }
    }
}

/// A convenience alias for `core::result::Result<T, Error>`.
pub type Result<T> = core::result::Result<T, Error>;

/// A scheduler run that stopped on an error.
///
/// Holds every bracket that completed before the failing one, in execution
/// order, and the failing bracket itself with the rungs it finished and the
/// records of its last, unranked rung. The configuration whose evaluation
/// failed is available from [`failed_config`](Self::failed_config).
/// Converts into [`Error`] with `?` for callers that do not need partial
/// output.
///
/// # Examples
///
/// ```
/// use hyperband::{Evaluation, Hyperband};
///
/// let hb = Hyperband::new(1.0, 9.0, 3.0).unwrap();
/// let next = std::cell::Cell::new(0_u32);
/// let source = || { next.set(next.get() + 1); next.get() };
/// let evaluator = |c: &u32, budget: f64| {
///     if budget < 9.0 {
///         Ok(Evaluation::new(f64::from(*c) / budget, budget))
///     } else {
///         Err("out of memory")
///     }
/// };
///
/// let aborted = hb.run(&evaluator, &source).unwrap_err();
/// assert!(aborted.completed().is_empty());
/// assert!(matches!(
///     aborted.error(),
///     hyperband::Error::BracketFailed { bracket: 0, .. }
/// ));
/// // Configuration 1 has the lowest loss, so only it is promoted to budget 9.
/// assert_eq!(aborted.failed_config(), Some(&1));
/// ```
pub struct Aborted<C> {
    pub(crate) completed: Vec<BracketState<C>>,
    pub(crate) failed: Option<BracketState<C>>,
    pub(crate) error: Error,
}

impl<C> Aborted<C> {
    /// Brackets that finished before the failure, in execution order.
    #[must_use]
    pub fn completed(&self) -> &[BracketState<C>] {
        &self.completed
    }

    /// The bracket that was running when the error occurred, if any had
    /// started.
    #[must_use]
    pub fn failed(&self) -> Option<&BracketState<C>> {
        self.failed.as_ref()
    }

    /// The configuration whose evaluation aborted the run.
    ///
    /// Returns `None` if the run stopped for another reason.
    #[must_use]
    pub fn failed_config(&self) -> Option<&C> {
        let id = self.error.failed_config_id()?;
        self.failed.as_ref()?.config(id)
    }

    /// The error that aborted the run.
    #[must_use]
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// Splits into the completed brackets and the error.
    #[must_use]
    pub fn into_parts(self) -> (Vec<BracketState<C>>, Error) {
        (self.completed, self.error)
    }
}

impl<C> core::fmt::Debug for Aborted<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Aborted")
            .field("completed_brackets", &self.completed.len())
            .field("has_failed_bracket", &self.failed.is_some())
            .field("error", &self.error)
            .finish()
    }
}

impl<C> core::fmt::Display for Aborted<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "run aborted after {} completed bracket(s): {}",
            self.completed.len(),
            self.error
        )
    }
}

impl<C> core::error::Error for Aborted<C> {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<C> From<Aborted<C>> for Error {
    fn from(aborted: Aborted<C>) -> Self {
        aborted.error
    }
}

pub(crate) fn invalid(reason: impl Into<String>) -> Error {
    Error::InvalidParameters {
        reason: reason.into(),
    }
}
