/// Generate a random `f64` in the range `[low, high)`.
#[inline]
pub(crate) fn f64_range(rng: &mut fastrand::Rng, low: f64, high: f64) -> f64 {
    low + rng.f64() * (high - low)
}

/// Generate a log-uniform `f64` in `[low, high)`. `low` must be positive.
#[inline]
pub(crate) fn log_f64_range(rng: &mut fastrand::Rng, low: f64, high: f64) -> f64 {
    f64_range(rng, low.ln(), high.ln()).exp().clamp(low, high)
}
