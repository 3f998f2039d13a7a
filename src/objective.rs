//! Collaborator traits consumed by the schedulers.
//!
//! The schedulers never look inside a configuration. They draw
//! configurations from a [`ConfigurationSource`] and hand them, together
//! with a budget, to an [`Evaluator`] that reports an [`Evaluation`].
//!
//! Both traits are implemented for plain closures, so ad-hoc problems need
//! no boilerplate:
//!
//! ```
//! use hyperband::{ConfigurationSource, Evaluation, Evaluator};
//!
//! let source = || 0.25_f64;
//! let evaluator = |x: &f64, budget: f64| {
//!     Ok::<_, String>(Evaluation::new(x / budget, 0.01 * budget))
//! };
//!
//! let config = source.sample();
//! let eval = evaluator.evaluate(&config, 5.0).unwrap();
//! assert!((eval.loss - 0.05).abs() < 1e-12);
//! ```

/// The outcome of evaluating one configuration at one budget.
///
/// `loss` is minimized. `cost` is the resource consumption attributable to
/// the call (wall-clock seconds, GPU hours, ...) and must be non-negative.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Evaluation {
    /// Validation loss; lower is better.
    pub loss: f64,
    /// Resource consumed by this evaluation.
    pub cost: f64,
}

impl Evaluation {
    /// Creates an evaluation from a loss and a cost.
    #[must_use]
    pub fn new(loss: f64, cost: f64) -> Self {
        Self { loss, cost }
    }

    /// Checks that the pair can be ranked and accumulated.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the loss is NaN or the cost
    /// is negative or not finite.
    pub fn validate(&self) -> core::result::Result<(), String> {
        if self.loss.is_nan() {
            return Err("loss is NaN".to_string());
        }
        if !self.cost.is_finite() || self.cost < 0.0 {
            return Err(format!(
                "cost must be finite and non-negative, got {}",
                self.cost
            ));
        }
        Ok(())
    }
}

impl From<(f64, f64)> for Evaluation {
    fn from((loss, cost): (f64, f64)) -> Self {
        Self { loss, cost }
    }
}

/// Draws candidate configurations.
///
/// Must be callable any number of times. Determinism is up to the
/// implementation's own seeding; see [`SearchSpace::with_seed`](crate::SearchSpace::with_seed).
pub trait ConfigurationSource {
    /// The configuration type produced.
    type Config;

    /// Samples one configuration.
    fn sample(&self) -> Self::Config;
}

impl<C, F> ConfigurationSource for F
where
    F: Fn() -> C,
{
    type Config = C;

    fn sample(&self) -> C {
        self()
    }
}

/// Turns a configuration and a budget into an [`Evaluation`].
///
/// The schedulers call `evaluate` at most once per `(configuration, budget)`
/// pair and never retry a failed call. Evaluations may block for as long as
/// they need; a caller that wants a timeout should enforce it here and
/// return an error.
pub trait Evaluator<C> {
    /// Error reported by a failed evaluation.
    type Error: core::fmt::Display;

    /// Evaluates `config` with the given `budget`.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if the evaluation could not be completed.
    fn evaluate(&self, config: &C, budget: f64) -> core::result::Result<Evaluation, Self::Error>;
}

impl<C, F, E> Evaluator<C> for F
where
    F: Fn(&C, f64) -> core::result::Result<Evaluation, E>,
    E: core::fmt::Display,
{
    type Error = E;

    fn evaluate(&self, config: &C, budget: f64) -> core::result::Result<Evaluation, E> {
        self(config, budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_nan_loss() {
        assert!(Evaluation::new(f64::NAN, 1.0).validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_cost() {
        assert!(Evaluation::new(1.0, -0.5).validate().is_err());
        assert!(Evaluation::new(1.0, f64::INFINITY).validate().is_err());
        assert!(Evaluation::new(1.0, f64::NAN).validate().is_err());
    }

    #[test]
    fn validate_accepts_infinite_loss_and_zero_cost() {
        assert!(Evaluation::new(f64::INFINITY, 0.0).validate().is_ok());
    }

    #[test]
    fn closures_implement_collaborator_traits() {
        let counter = core::cell::Cell::new(0_u32);
        let source = || {
            counter.set(counter.get() + 1);
            counter.get()
        };
        assert_eq!(source.sample(), 1);
        assert_eq!(source.sample(), 2);

        let evaluator = |c: &u32, budget: f64| -> Result<Evaluation, &'static str> {
            Ok((f64::from(*c) / budget, budget).into())
        };
        let eval = evaluator.evaluate(&4, 2.0).unwrap();
        assert_eq!(eval, Evaluation::new(2.0, 2.0));
    }
}
