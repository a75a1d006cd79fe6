//! Tempo factor decomposition.
//!
//! ffmpeg's `atempo` accepts factors in `[0.5, 2.0]`. Anything outside that
//! window is expressed as a chain of stages whose product is the requested
//! factor.

/// Largest factor one `atempo` stage accepts.
pub const MAX_STAGE: f64 = 2.0;
/// Smallest factor one `atempo` stage accepts.
pub const MIN_STAGE: f64 = 0.5;

const UNITY_EPSILON: f64 = 1e-6;

/// Split `factor` into stages that each fit one `atempo` filter.
///
/// A factor of 1.0 yields no stages. Non-finite or non-positive factors also
/// yield no stages; validation rejects those before building.
///
/// ```
/// use mediaforge_av::command::tempo::decompose;
///
/// assert_eq!(decompose(8.0), vec![2.0, 2.0, 2.0]);
/// assert_eq!(decompose(3.0), vec![2.0, 1.5]);
/// assert_eq!(decompose(0.25), vec![0.5, 0.5]);
/// ```
pub fn decompose(factor: f64) -> Vec<f64> {
    let mut stages = Vec::new();
    if !factor.is_finite() || factor <= 0.0 {
        return stages;
    }

    let mut remaining = factor;
    while remaining > MAX_STAGE + UNITY_EPSILON {
        stages.push(MAX_STAGE);
        remaining /= MAX_STAGE;
    }
    while remaining < MIN_STAGE - UNITY_EPSILON {
        stages.push(MIN_STAGE);
        remaining /= MIN_STAGE;
    }
    if (remaining - 1.0).abs() > UNITY_EPSILON {
        stages.push(round4(remaining));
    }
    stages
}

/// `atempo=<stage>` filters for `factor`.
pub fn atempo_filters(factor: f64) -> Vec<String> {
    decompose(factor)
        .into_iter()
        .map(|stage| format!("atempo={}", format_factor(stage)))
        .collect()
}

/// Shortest decimal rendering that keeps at least one fractional digit.
pub fn format_factor(value: f64) -> String {
    let fixed = format!("{:.4}", value);
    let trimmed = fixed.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{}0", trimmed)
    } else {
        trimmed.to_string()
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
