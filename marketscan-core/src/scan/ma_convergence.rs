//! MA-price-convergence — price and moving averages pulled together.
//!
//! The spread between the highest and lowest of {close, EMA(21),
//! SMA(50)}, as a percent of the lowest, must not exceed 2 x ATRP(20).
//! Candidates with a wider spread are dropped, as are candidates whose
//! inputs are the neutral zero.

use crate::error::ScanError;

use super::{Candidate, RefineContext, Refinement, TemplateRefiner};

pub struct MaPriceConvergence;

impl TemplateRefiner for MaPriceConvergence {
    fn name(&self) -> &str {
        "ma_price_convergence"
    }

    fn refine(
        &self,
        candidates: Vec<Candidate>,
        _ctx: &RefineContext<'_>,
    ) -> Result<Refinement, ScanError> {
        Ok(Refinement::Refined(
            candidates.into_iter().filter(is_converged).collect(),
        ))
    }
}

fn is_converged(candidate: &Candidate) -> bool {
    let Some(averages) = candidate.quotation.moving_averages else {
        return false;
    };
    let Some(indicator) = candidate.quotation.indicator else {
        return false;
    };
    let close = candidate.quotation.close;
    if close <= 0.0 || averages.ema_21 <= 0.0 || averages.sma_50 <= 0.0 || indicator.atrp_20 <= 0.0 {
        return false;
    }
    let highest = close.max(averages.ema_21).max(averages.sma_50);
    let lowest = close.min(averages.ema_21).min(averages.sma_50);
    let spread = (highest / lowest - 1.0) * 100.0;
    spread <= 2.0 * indicator.atrp_20
}
