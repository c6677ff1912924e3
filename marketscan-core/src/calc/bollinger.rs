//! Bollinger band width and the volatility-squeeze threshold.
//!
//! Band width = (upper - lower) / middle x 100, middle = SMA(days),
//! bands = middle +/- k x population stddev of the window closes. The
//! threshold picks a low-end percentile from the instrument's own
//! band-width history, which is how a squeeze is detected relative to
//! the instrument rather than an absolute level.

use crate::domain::QuotationSeries;

use super::{moving_average, round_half_up};

/// Population standard deviation (divide by N, not N-1), rounded half-up
/// to 4 decimals. Returns 0.0 for an empty slice.
pub fn standard_deviation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    round_half_up(variance.sqrt(), 4)
}

/// Bollinger band width in percent of the middle band. Neutral 0.0 on
/// insufficient history.
pub fn band_width(days: usize, k: f64, target: usize, series: &QuotationSeries) -> f64 {
    let Some(window) = series.window_ending_at(days, target) else {
        return 0.0;
    };
    let middle = moving_average::sma(days, target, series);
    if middle == 0.0 {
        return 0.0;
    }
    let closes: Vec<f64> = window.iter().map(|q| q.close).collect();
    let stddev = standard_deviation(&closes);
    let upper = middle + k * stddev;
    let lower = middle - k * stddev;
    (upper - lower) / middle * 100.0
}

/// The given low-end percentile of all historical daily band-width values
/// computed up to target. Uses however much history exists; 0.0 when no
/// band width is computable at all.
pub fn band_width_threshold(
    days: usize,
    k: f64,
    percentile: u32,
    target: usize,
    series: &QuotationSeries,
) -> f64 {
    if target >= series.len() {
        return 0.0;
    }
    let mut widths: Vec<f64> = (0..=target)
        .filter(|&i| i + 1 >= days)
        .map(|i| band_width(days, k, i, series))
        .collect();
    if widths.is_empty() {
        return 0.0;
    }
    widths.sort_by(|a, b| a.partial_cmp(b).expect("band widths are finite"));
    let n = widths.len();
    let position = ((n as f64 * percentile as f64 / 100.0).round() as usize).max(1);
    widths[position.min(n) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::{assert_approx, make_series, DEFAULT_EPSILON};

    #[test]
    fn standard_deviation_is_population_flavor() {
        // mean = 50, sum of squared deviations = 886, sqrt(886/6) = 12.1518...
        assert_eq!(standard_deviation(&[46.0, 69.0, 32.0, 60.0, 52.0, 41.0]), 12.1518);
    }

    #[test]
    fn standard_deviation_of_constant_series_is_zero() {
        assert_eq!(standard_deviation(&[7.0, 7.0, 7.0, 7.0]), 0.0);
        assert_eq!(standard_deviation(&[]), 0.0);
    }

    #[test]
    fn band_width_is_nonnegative_and_zero_for_flat_closes() {
        let s = make_series(&[100.0, 100.0, 100.0]);
        assert_eq!(band_width(3, 2.0, 2, &s), 0.0);

        let s = make_series(&[10.0, 12.0, 11.0, 14.0]);
        assert!(band_width(3, 2.0, 3, &s) > 0.0);
    }

    #[test]
    fn band_width_known_value() {
        // closes 10, 12, 14: mean = 12, population stddev = sqrt(8/3) = 1.6330
        // width = 2 * 2 * 1.6330 / 12 * 100
        let s = make_series(&[10.0, 12.0, 14.0]);
        assert_approx(band_width(3, 2.0, 2, &s), 4.0 * 1.6330 / 12.0 * 100.0, 1e-6);
    }

    #[test]
    fn band_width_neutral_zero_on_short_history() {
        let s = make_series(&[10.0, 12.0]);
        assert_eq!(band_width(3, 2.0, 1, &s), 0.0);
    }

    #[test]
    fn threshold_picks_low_end_percentile() {
        // 10 computable widths; the 25th percentile lands on the 3rd
        // smallest (round(10 * 0.25) = 3, one-based).
        let closes: Vec<f64> = vec![
            10.0, 10.5, 10.2, 11.0, 10.8, 11.5, 11.2, 12.0, 11.8, 12.5, 12.2, 13.0,
        ];
        let s = make_series(&closes);
        let target = closes.len() - 1;
        let threshold = band_width_threshold(3, 2.0, 25, target, &s);

        let mut widths: Vec<f64> = (2..=target).map(|i| band_width(3, 2.0, i, &s)).collect();
        widths.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(threshold, widths[2]);
    }

    #[test]
    fn threshold_uses_whatever_history_exists() {
        let s = make_series(&[10.0, 11.0, 12.0]);
        // Only one computable width; every percentile returns it.
        let only = band_width(3, 2.0, 2, &s);
        assert_eq!(band_width_threshold(3, 2.0, 25, 2, &s), only);
        assert_eq!(band_width_threshold(3, 2.0, 90, 2, &s), only);
    }

    #[test]
    fn threshold_neutral_zero_when_nothing_computable() {
        let s = make_series(&[10.0, 11.0]);
        assert_eq!(band_width_threshold(3, 2.0, 25, 1, &s), 0.0);
    }
}
