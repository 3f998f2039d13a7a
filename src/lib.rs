#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Multi-fidelity hyperparameter optimization with Successive Halving and
//! `Hyperband`.
//!
//! Instead of training every candidate configuration to completion, these
//! schedulers evaluate many configurations on a small budget (epochs,
//! dataset fraction, ...), keep the best `1/η` of them, and repeat with an
//! η-times larger budget. `Hyperband` runs a family of such brackets that
//! trade breadth against depth, so no single starting budget has to be
//! guessed.
//!
//! # Getting Started
//!
//! ```
//! use hyperband::prelude::*;
//!
//! let hb = Hyperband::builder()
//!     .min_budget(1.0)
//!     .max_budget(27.0)
//!     .eta(3.0)
//!     .build()?;
//!
//! let space = SearchSpace::with_seed(0)
//!     .add("lr", Hyperparameter::Float { low: 1e-4, high: 1e-1, log_scale: true })?;
//!
//! // Loss improves with budget and is best near lr = 0.01.
//! let evaluator = |config: &Configuration, budget: f64| {
//!     let lr = config.value("lr").unwrap_or(f64::NAN);
//!     let loss = (lr.log10() + 2.0).powi(2) + 1.0 / budget;
//!     Ok::<_, String>(Evaluation::new(loss, budget))
//! };
//!
//! let brackets = hb.run(&evaluator, &space)?;
//! let (_, _, best, eval) = best_overall(&brackets).unwrap();
//! println!("best {best} with loss {:.4}", eval.loss);
//! # Ok::<(), Error>(())
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`SuccessiveHalving`] | One bracket: evaluate, rank, keep the top `1/η`, grow the budget. |
//! | [`Hyperband`] | Runs `s_max + 1` Successive Halving brackets, most aggressive first. |
//! | [`BracketState`] | Everything one bracket sampled and measured, addressed by [`ConfigId`]. |
//! | [`Trajectory`] | Cumulative cost against the best loss so far, across a whole run. |
//! | [`ConfigurationSource`] / [`Evaluator`] | What the schedulers consume; implemented for closures. |
//! | [`SearchSpace`] | A seedable configuration source over named hyperparameters. |
//! | [`SyntheticBenchmark`] | A seeded noise benchmark for tests and demos. |
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `serde` | `Serialize`/`Deserialize` on public value types | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) at bracket and rung boundaries | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

mod benchmark;
mod bracket;
mod error;
mod hyperband;
mod objective;
mod param;
mod rng_util;
mod space;
mod successive_halving;
pub mod trajectory;

pub use benchmark::SyntheticBenchmark;
pub use bracket::{BracketState, Candidate, ConfigId, EvaluationRecord, Rung};
pub use error::{Aborted, Error, Result};
pub use hyperband::{BracketDescriptor, Hyperband, HyperbandBuilder};
pub use objective::{ConfigurationSource, Evaluation, Evaluator};
pub use param::ParamValue;
pub use space::{Configuration, Hyperparameter, SearchSpace};
pub use successive_halving::{RungReport, SuccessiveHalving};
pub use trajectory::{Trajectory, TrajectoryPoint, best_overall};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use hyperband::prelude::*;
/// ```
pub mod prelude {
    pub use crate::benchmark::SyntheticBenchmark;
    pub use crate::bracket::{BracketState, ConfigId, EvaluationRecord, Rung};
    pub use crate::error::{Aborted, Error, Result};
    pub use crate::hyperband::{BracketDescriptor, Hyperband, HyperbandBuilder};
    pub use crate::objective::{ConfigurationSource, Evaluation, Evaluator};
    pub use crate::param::ParamValue;
    pub use crate::space::{Configuration, Hyperparameter, SearchSpace};
    pub use crate::successive_halving::{RungReport, SuccessiveHalving};
    pub use crate::trajectory::{Trajectory, TrajectoryPoint, best_overall};
}
