//! Sliding-window indicator calculators.
//!
//! All calculators are stateless pure functions over a `QuotationSeries`
//! and a target index. The shared windowing rule: a calculation over N
//! days uses exactly the N most recent quotations at/before the target
//! (inclusive). When fewer exist, calculators return the neutral 0.0
//! instead of failing — callers must know that convention conflates
//! "legitimately zero" with "not enough data".

pub mod atr;
pub mod bollinger;
pub mod moving_average;
pub mod performance;
pub mod stochastic;

/// Round half-up (away from zero at .5) to `decimals` places, matching the
/// fixed-point results the storage layer carries. `f64::round` rounds
/// half-away-from-zero, which is HALF_UP for both signs.
pub fn round_half_up(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Build a synthetic series from close prices for tests.
///
/// high = close + 1, low = close - 1, consecutive weekdays are skipped
/// over weekends so date arithmetic stays realistic.
#[cfg(test)]
pub(crate) fn make_series(closes: &[f64]) -> crate::domain::QuotationSeries {
    make_series_with_volume(&closes.iter().map(|&c| (c, 1_000)).collect::<Vec<_>>())
}

#[cfg(test)]
pub(crate) fn make_series_with_volume(data: &[(f64, u64)]) -> crate::domain::QuotationSeries {
    use crate::domain::{InstrumentId, Quotation, QuotationSeries};
    let mut date = chrono::NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let mut quotes = Vec::with_capacity(data.len());
    for &(close, volume) in data {
        quotes.push(Quotation::new(
            InstrumentId(1),
            date,
            close,
            close + 1.0,
            close - 1.0,
            close,
            volume,
        ));
        date = next_weekday(date);
    }
    QuotationSeries::new(quotes)
}

#[cfg(test)]
fn next_weekday(date: chrono::NaiveDate) -> chrono::NaiveDate {
    use chrono::Datelike;
    let mut next = date + chrono::Duration::days(1);
    while matches!(next.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun) {
        next += chrono::Duration::days(1);
    }
    next
}

#[cfg(test)]
pub(crate) fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub(crate) const DEFAULT_EPSILON: f64 = 1e-9;
