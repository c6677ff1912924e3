//! Indicator computation entry point.
//!
//! Given a sorted history and one target quotation, computes and attaches
//! all derived indicator fields. The full pass runs on the most recent
//! quotation; the historical pass is the lighter backfill used for
//! band-width history and moving-average trails.
//!
//! Per-instrument computation is data-independent and may be
//! parallelized (`compute_universe` does, via rayon). Relative-strength
//! ranking must run only after the whole universe has been computed.

use rayon::prelude::*;

use crate::calc::{atr, bollinger, moving_average, performance, stochastic};
use crate::domain::{IndicatorData, MovingAverageData, QuotationSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputePass {
    /// Every derived field — for the most recent quotation.
    Full,
    /// Moving averages and band width only — for historical backfill.
    Historical,
}

/// Compute and attach derived indicator fields to the quotation at
/// `target`. Out-of-range targets are ignored.
pub fn compute_indicators(series: &mut QuotationSeries, target: usize, pass: ComputePass) {
    if target >= series.len() {
        return;
    }

    let averages = MovingAverageData {
        sma_10: moving_average::sma(10, target, series),
        sma_20: moving_average::sma(20, target, series),
        sma_50: moving_average::sma(50, target, series),
        sma_150: moving_average::sma(150, target, series),
        sma_200: moving_average::sma(200, target, series),
        ema_21: moving_average::ema(21, target, series),
        sma_volume_30: moving_average::sma_volume(30, target, series),
        liquidity_20: moving_average::avg_dollar_volume(20, target, series),
    };

    let indicator = match pass {
        ComputePass::Historical => IndicatorData {
            bollinger_band_width_10: bollinger::band_width(10, 2.0, target, series),
            ..Default::default()
        },
        ComputePass::Full => IndicatorData {
            stochastic_14: stochastic::slow_stochastic(14, 3, target, series),
            bollinger_band_width_10: bollinger::band_width(10, 2.0, target, series),
            atrp_20: atr::atr_percent(20, target, series),
            performance_5: performance::performance_for_days(5, target, series),
            distance_to_52w_high: performance::distance_to_52_week_high(target, series),
            momentum_score: performance::momentum_score(target, series),
            ad_ratio: accumulation_distribution_ratio(target, series),
            up_down_volume_ratio: performance::up_down_volume_ratio(50, target, series),
        },
    };

    let quotation = series.get_mut(target).expect("target bounds checked above");
    quotation.moving_averages = Some(averages);
    quotation.indicator = Some(indicator);
}

/// Average up-day gain over the absolute average down-day loss across the
/// last 25 trading days. Neutral 0.0 when either side has no day.
fn accumulation_distribution_ratio(target: usize, series: &QuotationSeries) -> f64 {
    let up = performance::average_performance_up_days(target, series, 1, 25);
    let down = performance::average_performance_down_days(target, series, 1, 25);
    if up == 0.0 || down == 0.0 {
        return 0.0;
    }
    up / down.abs()
}

/// Full indicator pass over every series' most recent quotation, fanned
/// out per instrument. Ranking is the join point: call it only after
/// this returns.
pub fn compute_universe(universe: &mut [QuotationSeries]) {
    universe.par_iter_mut().for_each(|series| {
        if let Some(target) = series.len().checked_sub(1) {
            compute_indicators(series, target, ComputePass::Full);
        }
    });
}

/// Historical backfill: light pass over every quotation before the most
/// recent one.
pub fn backfill_history(series: &mut QuotationSeries) {
    for target in 0..series.len().saturating_sub(1) {
        compute_indicators(series, target, ComputePass::Historical);
    }
}
