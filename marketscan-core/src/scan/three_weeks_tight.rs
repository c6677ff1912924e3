//! Three-weeks-tight — three consecutive weekly closes inside a 1.5% band.
//!
//! History is resampled to weekly closes; a candidate survives when its
//! 3 most recent weekly closes all fall within +/-1.5% of the most
//! recent weekly close.

use crate::calc::round_half_up;
use crate::error::ScanError;

use super::{Candidate, RefineContext, Refinement, TemplateRefiner};

const BAND: f64 = 0.015;
const WEEKS: usize = 3;

pub struct ThreeWeeksTight;

impl TemplateRefiner for ThreeWeeksTight {
    fn name(&self) -> &str {
        "three_weeks_tight"
    }

    fn refine(
        &self,
        candidates: Vec<Candidate>,
        ctx: &RefineContext<'_>,
    ) -> Result<Refinement, ScanError> {
        let mut kept = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let series = ctx.full_history(&candidate)?;
            if is_tight(&series.weekly_closes()) {
                kept.push(candidate);
            }
        }
        Ok(Refinement::Refined(kept))
    }
}

fn is_tight(weekly_closes: &[f64]) -> bool {
    if weekly_closes.len() < WEEKS {
        return false;
    }
    let newest = weekly_closes[weekly_closes.len() - 1];
    // Prices carry two decimals; round the band edges to the same scale
    // so the inclusive bounds hold exactly at the boundary.
    let lower = round_half_up(newest * (1.0 - BAND), 2);
    let upper = round_half_up(newest * (1.0 + BAND), 2);
    weekly_closes[weekly_closes.len() - WEEKS..]
        .iter()
        .all(|&close| close >= lower && close <= upper)
}
