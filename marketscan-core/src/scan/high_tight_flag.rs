//! High-tight-flag — a near-vertical advance over roughly 14 weeks.
//!
//! Requires at least 14 x 5 + 1 trading days of history and a price
//! advance of at least 75% measured from the oldest to the newest
//! quotation in a 70-trading-day lookback window.

use crate::calc::performance::performance;
use crate::error::ScanError;

use super::{Candidate, RefineContext, Refinement, TemplateRefiner};

const MIN_HISTORY: usize = 14 * 5 + 1;
const LOOKBACK: usize = 70;
const MIN_ADVANCE: f64 = 75.0;

pub struct HighTightFlag;

impl TemplateRefiner for HighTightFlag {
    fn name(&self) -> &str {
        "high_tight_flag"
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
            let window = series
                .window_ending_at(LOOKBACK, target)
                .expect("history length checked above");
            let advance = performance(&window[LOOKBACK - 1], &window[0]);
            if advance >= MIN_ADVANCE {
                kept.push(candidate);
            }
        }
        Ok(Refinement::Refined(kept))
    }
}
