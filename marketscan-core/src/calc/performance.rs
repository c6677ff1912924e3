//! Percent performance, the weighted momentum score, and up/down-day
//! averages.
//!
//! `performance` is the signed percent change between two closes, rounded
//! half-up to 2 decimals — the one place the storage layer's fixed
//! 2-decimal scale is visible in calculator output.

use chrono::Months;

use crate::domain::{Quotation, QuotationSeries};

use super::round_half_up;

/// Horizons of the weighted momentum score, in (months, weight) pairs.
/// The 3-month horizon is counted twice, a standard convention.
const MOMENTUM_HORIZONS: [(u32, f64); 4] = [(3, 2.0), (6, 1.0), (9, 1.0), (12, 1.0)];

/// Signed percent change of `a` versus `b`: (a.close - b.close) / b.close x 100.
pub fn performance(a: &Quotation, b: &Quotation) -> f64 {
    if b.close == 0.0 {
        return 0.0;
    }
    round_half_up((a.close - b.close) / b.close * 100.0, 2)
}

/// Performance of the target quotation versus the one `days` trading days
/// earlier. Neutral 0.0 when that quotation does not exist.
pub fn performance_for_days(days: usize, target: usize, series: &QuotationSeries) -> f64 {
    if target >= series.len() || target < days {
        return 0.0;
    }
    let a = &series.quotes()[target];
    let b = &series.quotes()[target - days];
    performance(a, b)
}

/// Multi-horizon weighted momentum score: the sum of `performance` over
/// the horizons in [`MOMENTUM_HORIZONS`], each measured against the most
/// recent quotation dated at least that many calendar months before
/// target. A horizon with no qualifying quotation is omitted from the
/// sum, so instruments with short history still score — at the cost of
/// cross-instrument comparability.
pub fn momentum_score(target: usize, series: &QuotationSeries) -> f64 {
    let Some(quotation) = series.get(target) else {
        return 0.0;
    };
    let mut score = 0.0;
    for (months, weight) in MOMENTUM_HORIZONS {
        let Some(cutoff) = quotation.date.checked_sub_months(Months::new(months)) else {
            continue;
        };
        if let Some(i) = series.index_at_or_before(cutoff) {
            score += weight * performance(quotation, &series.quotes()[i]);
        }
    }
    score
}

/// Mean day-over-day percent change restricted to up days whose offset
/// from target lies in `[min_days, max_days]` trading days. Neutral 0.0
/// when no qualifying day exists.
pub fn average_performance_up_days(
    target: usize,
    series: &QuotationSeries,
    min_days: usize,
    max_days: usize,
) -> f64 {
    average_daily_change(target, series, min_days, max_days, |change| change > 0.0)
}

/// Down-day counterpart of [`average_performance_up_days`]. The result is
/// negative when any qualifying day exists.
pub fn average_performance_down_days(
    target: usize,
    series: &QuotationSeries,
    min_days: usize,
    max_days: usize,
) -> f64 {
    average_daily_change(target, series, min_days, max_days, |change| change < 0.0)
}

fn average_daily_change(
    target: usize,
    series: &QuotationSeries,
    min_days: usize,
    max_days: usize,
    qualifies: impl Fn(f64) -> bool,
) -> f64 {
    if target >= series.len() || min_days > max_days {
        return 0.0;
    }
    let quotes = series.quotes();
    let mut sum = 0.0;
    let mut count = 0;
    for offset in min_days..=max_days {
        let Some(i) = target.checked_sub(offset) else { break };
        if i == 0 {
            break;
        }
        let change = performance(&quotes[i], &quotes[i - 1]);
        if qualifies(change) {
            sum += change;
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Total up-day volume over total down-day volume across the last `days`
/// trading days. Neutral 0.0 when either side is empty.
pub fn up_down_volume_ratio(days: usize, target: usize, series: &QuotationSeries) -> f64 {
    if target >= series.len() {
        return 0.0;
    }
    let quotes = series.quotes();
    let mut up = 0.0;
    let mut down = 0.0;
    for offset in 0..days {
        let Some(i) = target.checked_sub(offset) else { break };
        if i == 0 {
            break;
        }
        let q = &quotes[i];
        let prev = &quotes[i - 1];
        if q.close > prev.close {
            up += q.volume as f64;
        } else if q.close < prev.close {
            down += q.volume as f64;
        }
    }
    if up == 0.0 || down == 0.0 {
        return 0.0;
    }
    up / down
}

/// Percent distance of the target close below the highest high of the
/// trailing 52 weeks (252 trading days), using whatever history exists.
/// At a new high the distance is 0; below it the value is negative.
pub fn distance_to_52_week_high(target: usize, series: &QuotationSeries) -> f64 {
    let Some(quotation) = series.get(target) else {
        return 0.0;
    };
    let start = target.saturating_sub(251);
    let highest = series.quotes()[start..=target]
        .iter()
        .map(|q| q.high)
        .fold(f64::MIN, f64::max);
    if highest <= 0.0 {
        return 0.0;
    }
    round_half_up((quotation.close - highest) / highest * 100.0, 2)
}
