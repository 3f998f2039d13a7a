//! Raw hyperparameter value storage.
//!
//! [`ParamValue`] is the type-erased representation of a sampled
//! hyperparameter inside a [`Configuration`](crate::space::Configuration).
//! For ordinal hyperparameters it stores the position in the ordered value
//! list; use [`Configuration::value`](crate::space::Configuration::value) to
//! resolve it to the numeric value.

/// A type-erased sampled hyperparameter value.
///
/// # Display
///
/// `ParamValue` implements [`Display`](core::fmt::Display): floats and
/// integers print their numeric value, and ordinals print `ordinal(i)`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamValue {
    /// A floating-point value (from [`Hyperparameter::Float`](crate::space::Hyperparameter::Float)).
    Float(f64),
    /// An integer value (from [`Hyperparameter::Int`](crate::space::Hyperparameter::Int)).
    Int(i64),
    /// A zero-based index into an ordinal value list (from
    /// [`Hyperparameter::Ordinal`](crate::space::Hyperparameter::Ordinal)).
    Ordinal(usize),
}

impl core::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Ordinal(v) => write!(f, "ordinal({v})"),
        }
    }
}
