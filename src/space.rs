//! Search spaces: a seedable [`ConfigurationSource`] over named
//! hyperparameters.
//!
//! A [`SearchSpace`] holds an ordered list of named [`Hyperparameter`]s and
//! draws each one independently and uniformly (log-uniformly for
//! `log_scale` floats). The result is a [`Configuration`], an ordered
//! name → [`ParamValue`] list.
//!
//! # Example
//!
//! ```
//! use hyperband::{ConfigurationSource, Hyperparameter, SearchSpace};
//!
//! let space = SearchSpace::with_seed(42)
//!     .add("lr", Hyperparameter::Float { low: 1e-4, high: 1e-1, log_scale: true })?
//!     .add("layers", Hyperparameter::Int { low: 1, high: 4 })?
//!     .add("width", Hyperparameter::Ordinal { values: vec![16.0, 32.0, 64.0] })?;
//!
//! let config = space.sample();
//! assert_eq!(config.len(), 3);
//! assert!([16.0, 32.0, 64.0].contains(&config.value("width").unwrap()));
//! # Ok::<(), hyperband::Error>(())
//! ```

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::objective::ConfigurationSource;
use crate::param::ParamValue;
use crate::rng_util;

/// The domain of one hyperparameter.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Hyperparameter {
    /// A real value in `[low, high]`, optionally sampled on a log scale.
    Float {
        /// Lower bound.
        low: f64,
        /// Upper bound.
        high: f64,
        /// Sample `ln(x)` uniformly instead of `x`. Requires `low > 0`.
        log_scale: bool,
    },
    /// An integer in `[low, high]`.
    Int {
        /// Lower bound (inclusive).
        low: i64,
        /// Upper bound (inclusive).
        high: i64,
    },
    /// One of an ordered list of numeric values.
    Ordinal {
        /// The allowed values, in order.
        values: Vec<f64>,
    },
}

impl Hyperparameter {
    #[allow(clippy::cast_precision_loss)]
    fn validate(&self) -> Result<()> {
        match self {
            Self::Float {
                low,
                high,
                log_scale,
            } => {
                if !(low.is_finite() && high.is_finite()) || low > high {
                    return Err(Error::InvalidBounds {
                        low: *low,
                        high: *high,
                    });
                }
                if *log_scale && *low <= 0.0 {
                    return Err(Error::InvalidLogBounds);
                }
            }
            Self::Int { low, high } => {
                if low > high {
                    return Err(Error::InvalidBounds {
                        low: *low as f64,
                        high: *high as f64,
                    });
                }
            }
            Self::Ordinal { values } => {
                if values.is_empty() {
                    return Err(Error::EmptyChoices);
                }
            }
        }
        Ok(())
    }

    fn sample(&self, rng: &mut fastrand::Rng) -> ParamValue {
        match self {
            Self::Float {
                low,
                high,
                log_scale,
            } => {
                let v = if *log_scale {
                    rng_util::log_f64_range(rng, *low, *high)
                } else {
                    rng_util::f64_range(rng, *low, *high)
                };
                ParamValue::Float(v)
            }
            Self::Int { low, high } => ParamValue::Int(rng.i64(*low..=*high)),
            Self::Ordinal { values } => ParamValue::Ordinal(rng.usize(..values.len())),
        }
    }
}

/// A sampled configuration: hyperparameter names paired with their values,
/// in the order they were declared in the [`SearchSpace`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Configuration {
    entries: Vec<(String, ParamValue)>,
    #[cfg_attr(feature = "serde", serde(default))]
    ordinals: Vec<Option<Vec<f64>>>,
}

impl Configuration {
    /// Returns the raw value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Returns the numeric value of `name`, resolving ordinal indices to
    /// their values.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value(&self, name: &str) -> Option<f64> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        match self.entries[idx].1 {
            ParamValue::Float(v) => Some(v),
            ParamValue::Int(v) => Some(v as f64),
            ParamValue::Ordinal(i) => self
                .ordinals
                .get(idx)
                .and_then(Option::as_ref)
                .and_then(|values| values.get(i).copied()),
        }
    }

    /// Iterates `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of hyperparameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` for a configuration of an empty space.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl core::fmt::Display for Configuration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match (value, self.value(name)) {
                (ParamValue::Ordinal(_), Some(v)) => write!(f, "{name}: {v}")?,
                _ => write!(f, "{name}: {value}")?,
            }
        }
        write!(f, "}}")
    }
}

/// A configuration space that samples every hyperparameter independently.
///
/// The RNG lives behind a `parking_lot::Mutex`, so sampling only needs
/// `&self`. Two spaces built with the same seed and the same
/// hyperparameters produce identical sample sequences.
pub struct SearchSpace {
    params: Vec<(String, Hyperparameter)>,
    rng: Mutex<fastrand::Rng>,
}

impl SearchSpace {
    /// Creates an empty space seeded from system entropy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            params: Vec::new(),
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    /// Creates an empty space with a fixed seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            params: Vec::new(),
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }

    /// A seeded space over hyperparameters whose names and domains are
    /// known to be valid.
    pub(crate) fn from_valid(seed: u64, params: Vec<(String, Hyperparameter)>) -> Self {
        Self {
            params,
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }

    /// Adds a named hyperparameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParameterConflict`] if `name` is already present,
    /// or a bounds error if the domain is invalid.
    pub fn add(mut self, name: impl Into<String>, param: Hyperparameter) -> Result<Self> {
        let name = name.into();
        if self.params.iter().any(|(n, _)| *n == name) {
            return Err(Error::ParameterConflict {
                name,
                reason: "hyperparameter already defined".to_string(),
            });
        }
        param.validate()?;
        self.params.push((name, param));
        Ok(self)
    }

    /// Looks up a hyperparameter's domain.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Hyperparameter> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    /// Number of hyperparameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` if no hyperparameter has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationSource for SearchSpace {
    type Config = Configuration;

    fn sample(&self) -> Configuration {
        let mut rng = self.rng.lock();
        let entries = self
            .params
            .iter()
            .map(|(name, param)| (name.clone(), param.sample(&mut rng)))
            .collect();
        let ordinals = self
            .params
            .iter()
            .map(|(_, param)| match param {
                Hyperparameter::Ordinal { values } => Some(values.clone()),
                _ => None,
            })
            .collect();
        Configuration { entries, ordinals }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes() -> Hyperparameter {
        Hyperparameter::Ordinal {
            values: vec![16.0, 32.0, 64.0, 128.0],
        }
    }

    #[test]
    fn rejects_duplicate_names() {
        let result = SearchSpace::new()
            .add("a", sizes())
            .and_then(|s| s.add("a", sizes()));
        assert!(matches!(result, Err(Error::ParameterConflict { .. })));
    }

    #[test]
    fn rejects_invalid_domains() {
        let bad_float = Hyperparameter::Float {
            low: 2.0,
            high: 1.0,
            log_scale: false,
        };
        assert!(matches!(
            SearchSpace::new().add("x", bad_float),
            Err(Error::InvalidBounds { .. })
        ));

        let bad_log = Hyperparameter::Float {
            low: 0.0,
            high: 1.0,
            log_scale: true,
        };
        assert!(matches!(
            SearchSpace::new().add("x", bad_log),
            Err(Error::InvalidLogBounds)
        ));

        let bad_int = Hyperparameter::Int { low: 5, high: 1 };
        assert!(matches!(
            SearchSpace::new().add("n", bad_int),
            Err(Error::InvalidBounds { .. })
        ));

        let empty = Hyperparameter::Ordinal { values: vec![] };
        assert!(matches!(
            SearchSpace::new().add("o", empty),
            Err(Error::EmptyChoices)
        ));
    }

    #[test]
    fn samples_within_bounds() {
        let space = SearchSpace::with_seed(3)
            .add(
                "lr",
                Hyperparameter::Float {
                    low: 1e-3,
                    high: 1.0,
                    log_scale: true,
                },
            )
            .unwrap()
            .add("n", Hyperparameter::Int { low: -2, high: 2 })
            .unwrap()
            .add("w", sizes())
            .unwrap();

        for _ in 0..500 {
            let c = space.sample();
            let lr = c.value("lr").unwrap();
            assert!((1e-3..=1.0).contains(&lr));
            let n = c.value("n").unwrap();
            assert!((-2.0..=2.0).contains(&n));
            assert!(matches!(c.get("w"), Some(ParamValue::Ordinal(i)) if *i < 4));
            assert!([16.0, 32.0, 64.0, 128.0].contains(&c.value("w").unwrap()));
        }
    }

    #[test]
    fn seeded_spaces_are_reproducible() {
        let build = || SearchSpace::with_seed(11).add("w", sizes()).unwrap();
        let a = build();
        let b = build();
        for _ in 0..20 {
            assert_eq!(a.sample(), b.sample());
        }
    }

    #[test]
    fn display_resolves_ordinals() {
        let space = SearchSpace::with_seed(0)
            .add(
                "w",
                Hyperparameter::Ordinal {
                    values: vec![64.0],
                },
            )
            .unwrap();
        assert_eq!(space.sample().to_string(), "{w: 64}");
    }
}
