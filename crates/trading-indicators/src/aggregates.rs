//! Windowed aggregates over indicator series.

/// Sum of the trailing run of values sharing the sign of the last value.
///
/// Resets whenever the series crosses zero, so it measures the momentum
/// accumulated since the last crossover. Zero counts as positive.
pub fn cumsum_since_sign_change(values: &[f64]) -> Option<f64> {
    let last = *values.last()?;
    let positive = last >= 0.0;
    Some(
        values
            .iter()
            .rev()
            .take_while(|v| (**v >= 0.0) == positive)
            .sum(),
    )
}

/// Sum of the last `window` values, or `None` when fewer are available.
pub fn trailing_sum(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    Some(values[values.len() - window..].iter().sum())
}

/// Number of the last `window` values strictly above `threshold`.
pub fn count_above(values: &[f64], window: usize, threshold: f64) -> Option<usize> {
    if window == 0 || values.len() < window {
        return None;
    }
    Some(
        values[values.len() - window..]
            .iter()
            .filter(|v| **v > threshold)
            .count(),
    )
}
