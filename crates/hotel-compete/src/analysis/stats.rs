//! Small descriptive statistics helpers. Undefined results are `None`, never NaN.

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator); undefined below two observations.
pub(crate) fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub(crate) fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

/// Clamps a component into `[0, 100]`; an undefined input sits at the floor.
pub(crate) fn clamp_component(value: Option<f64>) -> f64 {
    value
        .filter(|value| value.is_finite())
        .map(|value| value.clamp(0.0, 100.0))
        .unwrap_or(0.0)
}
