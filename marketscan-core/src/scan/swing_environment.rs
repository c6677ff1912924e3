//! Swing-trading-environment — both short moving averages rising.
//!
//! A candidate survives when its 10-day and 20-day simple moving
//! averages are both higher than their values one trading day earlier.
//! Instruments with fewer than 21 quotations cannot supply yesterday's
//! 20-day average, so the comparison is unverifiable and they are
//! dropped.

use crate::calc::moving_average::sma;
use crate::error::ScanError;

use super::{Candidate, RefineContext, Refinement, TemplateRefiner};

const MIN_HISTORY: usize = 21;

pub struct SwingTradingEnvironment;

impl TemplateRefiner for SwingTradingEnvironment {
    fn name(&self) -> &str {
        "swing_trading_environment"
    }

    fn refine(
        &self,
        candidates: Vec<Candidate>,
        ctx: &RefineContext<'_>,
    ) -> Result<Refinement, ScanError> {
        let mut kept = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let series = ctx.full_history(&candidate)?;
            if series.len() < MIN_HISTORY {
                continue;
            }
            let target = series.len() - 1;
            let rising_10 = sma(10, target, &series) > sma(10, target - 1, &series);
            let rising_20 = sma(20, target, &series) > sma(20, target - 1, &series);
            if rising_10 && rising_20 {
                kept.push(candidate);
            }
        }
        Ok(Refinement::Refined(kept))
    }
}
