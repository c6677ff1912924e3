//! Rank-since-date — re-rank the candidate set by performance measured
//! from an arbitrary start date.
//!
//! For each candidate, the momentum score is recomputed as a single
//! performance from the first quotation at/after the start date to the
//! most recent one, and the percentile ranking then re-runs over the
//! whole candidate set. Candidates with no quotation at/after the date
//! are excluded from ranking but retained with rank 0.

use crate::calc::performance::performance;
use crate::error::ScanError;
use crate::rank::assign_percentiles;

use super::{Candidate, RefineContext, Refinement, TemplateRefiner};

pub struct RankSinceDate;

impl TemplateRefiner for RankSinceDate {
    fn name(&self) -> &str {
        "rank_since_date"
    }

    fn refine(
        &self,
        candidates: Vec<Candidate>,
        ctx: &RefineContext<'_>,
    ) -> Result<Refinement, ScanError> {
        let start = ctx
            .params
            .start_date
            .ok_or_else(|| ScanError::InvalidParams("rank_since_date requires a start date".into()))?;

        let mut scored: Vec<(Candidate, Option<f64>)> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let series = ctx.full_history(&candidate)?;
            let score = series.index_at_or_after(start).and_then(|i| {
                let base = &series.quotes()[i];
                series.latest().map(|latest| performance(latest, base))
            });
            scored.push((candidate, score));
        }

        // Ranks from the regular universe pass are superseded wholesale.
        for (candidate, _) in &mut scored {
            candidate
                .quotation
                .relative_strength
                .get_or_insert_with(Default::default)
                .rs_number = 0;
        }
        assign_percentiles(
            &mut scored,
            |(_, score)| *score,
            |(candidate, _), rank| {
                candidate
                    .quotation
                    .relative_strength
                    .get_or_insert_with(Default::default)
                    .rs_number = rank;
            },
        );

        Ok(Refinement::Refined(scored.into_iter().map(|(c, _)| c).collect()))
    }
}
