//! Average True Range and its percent form.
//!
//! True Range: max(high - low, |high - prevClose|, |low - prevClose|).
//! ATR uses Wilder smoothing (alpha = 1/days), seeded with the mean of
//! the oldest `days` true ranges. The first quotation has no previous
//! close, so an ATR over `days` needs `days` + 1 quotations; fewer
//! returns the neutral 0.0.

use crate::domain::QuotationSeries;

/// True range at `index`. The first quotation falls back to high - low.
pub fn true_range(index: usize, series: &QuotationSeries) -> f64 {
    let quotes = series.quotes();
    let q = &quotes[index];
    if index == 0 {
        return q.high - q.low;
    }
    let prev_close = quotes[index - 1].close;
    (q.high - q.low)
        .max((q.high - prev_close).abs())
        .max((q.low - prev_close).abs())
}

/// Wilder-smoothed ATR over `days`, evaluated at target.
pub fn atr(days: usize, target: usize, series: &QuotationSeries) -> f64 {
    if days == 0 || target >= series.len() || target < days {
        return 0.0;
    }
    // Proper true ranges start at index 1.
    let seed: f64 = (1..=days).map(|i| true_range(i, series)).sum::<f64>() / days as f64;
    let alpha = 1.0 / days as f64;
    let mut value = seed;
    for i in days + 1..=target {
        value = alpha * true_range(i, series) + (1.0 - alpha) * value;
    }
    value
}

/// ATR as a percent of the target close (ATRP).
pub fn atr_percent(days: usize, target: usize, series: &QuotationSeries) -> f64 {
    let Some(quotation) = series.get(target) else {
        return 0.0;
    };
    if quotation.close == 0.0 {
        return 0.0;
    }
    atr(days, target, series) / quotation.close * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::{assert_approx, DEFAULT_EPSILON};
    use crate::domain::{InstrumentId, Quotation, QuotationSeries};
    use chrono::NaiveDate;

    fn ohlc_series(data: &[(f64, f64, f64)]) -> QuotationSeries {
        // (high, low, close)
        let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        QuotationSeries::new(
            data.iter()
                .enumerate()
                .map(|(i, &(high, low, close))| {
                    let mut q = Quotation::new(
                        InstrumentId(1),
                        base + chrono::Duration::days(i as i64),
                        close,
                        high,
                        low,
                        close,
                        1_000,
                    );
                    q.open = low;
                    q
                })
                .collect(),
        )
    }

    #[test]
    fn true_range_covers_gaps() {
        let s = ohlc_series(&[
            (102.0, 97.0, 100.0),
            (115.0, 108.0, 112.0), // gap up: TR = max(7, 15, 8) = 15
        ]);
        assert_approx(true_range(0, &s), 5.0, DEFAULT_EPSILON);
        assert_approx(true_range(1, &s), 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_seeds_then_wilder_smooths() {
        let s = ohlc_series(&[
            (105.0, 95.0, 102.0),  // TR (unused by seed)
            (108.0, 100.0, 106.0), // TR = 8
            (107.0, 98.0, 99.0),   // TR = 9
            (103.0, 97.0, 101.0),  // TR = 6
            (106.0, 100.0, 105.0), // TR = 6
        ]);
        // Seed over TR[1..=3] = mean(8, 9, 6) = 23/3
        assert_approx(atr(3, 3, &s), 23.0 / 3.0, DEFAULT_EPSILON);
        // ATR[4] = (1/3)*6 + (2/3)*(23/3) = 64/9
        assert_approx(atr(3, 4, &s), 64.0 / 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_neutral_zero_without_enough_quotations() {
        let s = ohlc_series(&[(105.0, 95.0, 102.0), (108.0, 100.0, 106.0)]);
        assert_eq!(atr(3, 1, &s), 0.0);
    }

    #[test]
    fn atr_percent_scales_by_close() {
        let s = ohlc_series(&[
            (105.0, 95.0, 102.0),
            (108.0, 100.0, 106.0),
            (107.0, 98.0, 99.0),
            (103.0, 97.0, 100.0),
        ]);
        let atr_value = atr(3, 3, &s);
        assert_approx(atr_percent(3, 3, &s), atr_value, DEFAULT_EPSILON); // close = 100
    }
}
