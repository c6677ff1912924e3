//! Buyable-base — reject candidates too extended above their base.
//!
//! A candidate trading at or above EMA(21) x (1 + 1.5 x ATRP(20)/100)
//! is too far from a buyable entry and is dropped. Works entirely off
//! the candidate's computed data; candidates whose EMA or ATRP is the
//! neutral zero cannot be verified and are dropped as well.

use crate::error::ScanError;

use super::{Candidate, RefineContext, Refinement, TemplateRefiner};

const ATR_MULTIPLIER: f64 = 1.5;

pub struct BuyableBase;

impl TemplateRefiner for BuyableBase {
    fn name(&self) -> &str {
        "buyable_base"
    }

    fn refine(
        &self,
        candidates: Vec<Candidate>,
        _ctx: &RefineContext<'_>,
    ) -> Result<Refinement, ScanError> {
        Ok(Refinement::Refined(
            candidates.into_iter().filter(is_buyable).collect(),
        ))
    }
}

fn is_buyable(candidate: &Candidate) -> bool {
    let Some(averages) = candidate.quotation.moving_averages else {
        return false;
    };
    let Some(indicator) = candidate.quotation.indicator else {
        return false;
    };
    if averages.ema_21 <= 0.0 || indicator.atrp_20 <= 0.0 {
        return false;
    }
    let extension_limit = averages.ema_21 * (1.0 + ATR_MULTIPLIER * indicator.atrp_20 / 100.0);
    candidate.quotation.close < extension_limit
}
