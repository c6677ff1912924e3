//! Simple and exponential moving averages over price and volume.
//!
//! SMA: mean of close over the `days` most recent quotations at/before
//! target. EMA: alpha = 2/(days+1), seeded with the SMA of the oldest
//! full window and recursed forward to target. Both return 0.0 when
//! fewer than `days` quotations exist at/before target.

use crate::domain::QuotationSeries;

/// Simple moving average of the close price.
pub fn sma(days: usize, target: usize, series: &QuotationSeries) -> f64 {
    match series.window_ending_at(days, target) {
        Some(window) => window.iter().map(|q| q.close).sum::<f64>() / days as f64,
        None => 0.0,
    }
}

/// Exponential moving average of the close price, seeded with the simple
/// average of the oldest `days` quotations and recursed to target.
pub fn ema(days: usize, target: usize, series: &QuotationSeries) -> f64 {
    if days == 0 || target >= series.len() || target + 1 < days {
        return 0.0;
    }
    let alpha = 2.0 / (days as f64 + 1.0);
    let quotes = series.quotes();

    let seed: f64 = quotes[..days].iter().map(|q| q.close).sum::<f64>() / days as f64;
    let mut value = seed;
    for q in &quotes[days..=target] {
        value = alpha * q.close + (1.0 - alpha) * value;
    }
    value
}

/// Simple moving average of volume.
pub fn sma_volume(days: usize, target: usize, series: &QuotationSeries) -> f64 {
    match series.window_ending_at(days, target) {
        Some(window) => window.iter().map(|q| q.volume as f64).sum::<f64>() / days as f64,
        None => 0.0,
    }
}

/// Average dollar volume (close x volume), the liquidity measure the scan
/// engine filters on.
pub fn avg_dollar_volume(days: usize, target: usize, series: &QuotationSeries) -> f64 {
    match series.window_ending_at(days, target) {
        Some(window) => window.iter().map(|q| q.dollar_volume()).sum::<f64>() / days as f64,
        None => 0.0,
    }
}
