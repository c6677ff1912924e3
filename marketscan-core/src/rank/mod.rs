//! Percentile-based relative-strength ranking.
//!
//! One routine assigns 1-100 percentile ranks for one scalar metric over
//! one universe (all stocks, all sectors, all industry groups — callers
//! invoke per universe). A separate enrichment step copies composite
//! ranks onto member stocks.
//!
//! This step requires a complete, consistent snapshot of the universe:
//! run it only after every per-instrument indicator pass has finished,
//! and never in parallel.

use tracing::{debug, warn};

use crate::domain::InstrumentId;
use crate::scan::Candidate;

/// Assign percentile ranks for one metric.
///
/// Members whose metric is `None` are excluded from ranking (their
/// `assign` is never called), not scored. The remaining N members are
/// stable-sorted descending — ties retain the incoming order — and the
/// member at 1-based descending position p receives
/// round((N - p + 1) / N x 100). The top member always receives exactly
/// 100 and every rank lies in [1, 100]. Re-running over an unchanged
/// universe assigns the same ranks.
pub fn assign_percentiles<T>(
    items: &mut [T],
    metric: impl Fn(&T) -> Option<f64>,
    mut assign: impl FnMut(&mut T, i32),
) {
    let mut ranked: Vec<(usize, f64)> = items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| metric(item).map(|m| (i, m)))
        .collect();
    // Stable sort: equal metrics keep their incoming order.
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let n = ranked.len();
    for (i, (index, _)) in ranked.iter().enumerate() {
        let position = i + 1;
        let percentile = ((n - position + 1) as f64 / n as f64 * 100.0).round() as i32;
        assign(&mut items[*index], percentile);
    }
}

/// Rank one universe of candidates across every supported metric:
/// momentum score, distance to the 52-week high, and the up/down volume
/// ratio. Candidates without computed indicator data are excluded.
pub fn rank_universe(candidates: &mut [Candidate]) {
    debug!(universe = candidates.len(), "assigning percentile ranks");

    assign_percentiles(
        candidates,
        |c| c.quotation.indicator.as_ref().map(|d| d.momentum_score),
        |c, rank| c.quotation.relative_strength.get_or_insert_with(Default::default).rs_number = rank,
    );
    assign_percentiles(
        candidates,
        |c| c.quotation.indicator.as_ref().map(|d| d.distance_to_52w_high),
        |c, rank| {
            c.quotation.relative_strength.get_or_insert_with(Default::default).rs_distance_52w_high =
                rank
        },
    );
    assign_percentiles(
        candidates,
        |c| c.quotation.indicator.as_ref().map(|d| d.up_down_volume_ratio),
        |c, rank| {
            c.quotation.relative_strength.get_or_insert_with(Default::default).rs_up_down_volume =
                rank
        },
    );
}

/// Copy each sector's and industry group's RS number onto its member
/// stocks, but only when the composite quotation carries the exact same
/// calendar date as the stock quotation. Zero or multiple matching
/// composite quotations leave the stock untouched.
pub fn enrich_composite_ranks(
    stocks: &mut [Candidate],
    sectors: &[Candidate],
    industry_groups: &[Candidate],
) {
    for stock in stocks.iter_mut() {
        if let Some(sector_id) = stock.instrument.sector {
            if let Some(rank) = composite_rank(sector_id, stock, sectors) {
                stock
                    .quotation
                    .relative_strength
                    .get_or_insert_with(Default::default)
                    .rs_sector = rank;
            }
        }
        if let Some(group_id) = stock.instrument.industry_group {
            if let Some(rank) = composite_rank(group_id, stock, industry_groups) {
                stock
                    .quotation
                    .relative_strength
                    .get_or_insert_with(Default::default)
                    .rs_industry_group = rank;
            }
        }
    }
}

fn composite_rank(
    composite_id: InstrumentId,
    stock: &Candidate,
    composites: &[Candidate],
) -> Option<i32> {
    let mut matching = composites
        .iter()
        .filter(|c| c.instrument.id == composite_id && c.quotation.date == stock.quotation.date);
    let first = matching.next()?;
    if matching.next().is_some() {
        warn!(%composite_id, date = %stock.quotation.date, "ambiguous composite quotation, skipping enrichment");
        return None;
    }
    first.quotation.relative_strength.as_ref().map(|rs| rs.rs_number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        IndicatorData, Instrument, InstrumentId, InstrumentKind, Quotation, RelativeStrengthData,
    };
    use chrono::NaiveDate;

    fn candidate(id: u64, kind: InstrumentKind, momentum: Option<f64>) -> Candidate {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let mut quotation = Quotation::new(InstrumentId(id), date, 10.0, 11.0, 9.0, 10.0, 1_000);
        if let Some(momentum_score) = momentum {
            quotation.indicator = Some(IndicatorData { momentum_score, ..Default::default() });
        }
        Candidate {
            instrument: Instrument::listed(InstrumentId(id), kind, "SYM", "NYSE", "name"),
            quotation,
        }
    }

    fn rs_numbers(candidates: &[Candidate]) -> Vec<i32> {
        candidates
            .iter()
            .map(|c| c.quotation.relative_strength.map(|rs| rs.rs_number).unwrap_or(0))
            .collect()
    }

    #[test]
    fn percentiles_match_documented_example() {
        // Momentum scores {34.5, -5, 12.35} in input order rank {100, 33, 67}.
        let mut universe = vec![
            candidate(1, InstrumentKind::Stock, Some(34.5)),
            candidate(2, InstrumentKind::Stock, Some(-5.0)),
            candidate(3, InstrumentKind::Stock, Some(12.35)),
        ];
        rank_universe(&mut universe);
        assert_eq!(rs_numbers(&universe), vec![100, 33, 67]);
    }

    #[test]
    fn top_member_always_gets_one_hundred() {
        for n in 1..40usize {
            let mut universe: Vec<Candidate> = (0..n)
                .map(|i| candidate(i as u64, InstrumentKind::Stock, Some(i as f64)))
                .collect();
            rank_universe(&mut universe);
            let top = universe
                .iter()
                .max_by(|a, b| {
                    let ma = a.quotation.indicator.unwrap().momentum_score;
                    let mb = b.quotation.indicator.unwrap().momentum_score;
                    ma.partial_cmp(&mb).unwrap()
                })
                .unwrap();
            assert_eq!(top.quotation.relative_strength.unwrap().rs_number, 100);
        }
    }

    #[test]
    fn members_without_metric_are_excluded_not_scored() {
        let mut universe = vec![
            candidate(1, InstrumentKind::Stock, Some(5.0)),
            candidate(2, InstrumentKind::Stock, None),
            candidate(3, InstrumentKind::Stock, Some(1.0)),
        ];
        rank_universe(&mut universe);
        // Two ranked members: 100 and 50. The excluded one keeps no rank.
        assert_eq!(rs_numbers(&universe), vec![100, 0, 50]);
    }

    #[test]
    fn reranking_unchanged_universe_is_idempotent() {
        let mut universe = vec![
            candidate(1, InstrumentKind::Stock, Some(3.0)),
            candidate(2, InstrumentKind::Stock, Some(8.0)),
            candidate(3, InstrumentKind::Stock, Some(-2.0)),
            candidate(4, InstrumentKind::Stock, Some(0.5)),
        ];
        rank_universe(&mut universe);
        let first = rs_numbers(&universe);
        rank_universe(&mut universe);
        assert_eq!(first, rs_numbers(&universe));
    }

    #[test]
    fn ties_retain_incoming_order() {
        let mut universe = vec![
            candidate(1, InstrumentKind::Stock, Some(7.0)),
            candidate(2, InstrumentKind::Stock, Some(7.0)),
        ];
        rank_universe(&mut universe);
        // The earlier member wins the tie and takes the higher rank.
        assert_eq!(rs_numbers(&universe), vec![100, 50]);
    }

    #[test]
    fn composite_rank_copied_only_on_exact_same_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let mut sector = candidate(10, InstrumentKind::Sector, Some(1.0));
        sector.quotation.relative_strength =
            Some(RelativeStrengthData { rs_number: 88, ..Default::default() });

        let mut stock = candidate(1, InstrumentKind::Stock, Some(2.0));
        stock.instrument.sector = Some(InstrumentId(10));

        let mut stocks = vec![stock.clone()];
        enrich_composite_ranks(&mut stocks, &[sector.clone()], &[]);
        assert_eq!(stocks[0].quotation.relative_strength.unwrap().rs_sector, 88);
        assert_eq!(stocks[0].quotation.date, date);

        // Stale composite quotation: dates differ, enrichment skipped.
        sector.quotation.date = date.pred_opt().unwrap();
        let mut stocks = vec![stock.clone()];
        enrich_composite_ranks(&mut stocks, &[sector.clone()], &[]);
        assert_eq!(stocks[0].quotation.relative_strength.map(|rs| rs.rs_sector), None);

        // Ambiguous: two same-date composite quotations, enrichment skipped.
        sector.quotation.date = date;
        let mut stocks = vec![stock];
        enrich_composite_ranks(&mut stocks, &[sector.clone(), sector], &[]);
        assert_eq!(stocks[0].quotation.relative_strength.map(|rs| rs.rs_sector), None);
    }
}
