//! Stochastic oscillator — raw %K and its smoothed (%D-style) variant.
//!
//! %K = (close - lowestLow(days)) / (highestHigh(days) - lowestLow(days)) x 100.
//! A flat window (highest high == lowest low) returns the neutral 0.0
//! instead of dividing by zero.

use crate::domain::QuotationSeries;

/// Raw %K over the `days` most recent quotations at/before target.
/// Neutral 0.0 on insufficient history or a zero-range window.
pub fn stochastic(days: usize, target: usize, series: &QuotationSeries) -> f64 {
    let Some(window) = series.window_ending_at(days, target) else {
        return 0.0;
    };
    let highest = window.iter().map(|q| q.high).fold(f64::MIN, f64::max);
    let lowest = window.iter().map(|q| q.low).fold(f64::MAX, f64::min);
    if highest <= lowest {
        return 0.0;
    }
    let close = window.last().expect("window is non-empty").close;
    (close - lowest) / (highest - lowest) * 100.0
}

/// Slow stochastic: simple average of the last `smoothing_days` raw %K
/// values. Neutral 0.0 when any of those values lacks a full window.
pub fn slow_stochastic(
    days: usize,
    smoothing_days: usize,
    target: usize,
    series: &QuotationSeries,
) -> f64 {
    if smoothing_days == 0 || target >= series.len() {
        return 0.0;
    }
    if target + 1 < days + smoothing_days - 1 || target + 1 < smoothing_days {
        return 0.0;
    }
    let sum: f64 = (0..smoothing_days)
        .map(|back| stochastic(days, target - back, series))
        .sum();
    sum / smoothing_days as f64
}
