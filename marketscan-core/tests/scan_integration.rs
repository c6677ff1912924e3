//! End-to-end scan pipeline tests over the in-memory provider:
//! compute -> rank -> engine pipeline (liquidity, enrichment, template),
//! plus the all-or-nothing refinement failure policy.

use chrono::{Datelike, NaiveDate};

use marketscan_core::compute::compute_universe;
use marketscan_core::domain::{
    Instrument, InstrumentId, InstrumentKind, Quotation, QuotationSeries,
};
use marketscan_core::provider::{
    CandidateProvider, HistoryProvider, MemoryProvider, ProviderError,
};
use marketscan_core::rank::rank_universe;
use marketscan_core::scan::Candidate;
use marketscan_core::{ScanError, ScanParams, ScanTemplateEngine};

fn weekday_series(id: u64, closes: &[f64], volume: u64) -> QuotationSeries {
    let mut date = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let mut quotes = Vec::with_capacity(closes.len());
    for &close in closes {
        quotes.push(Quotation::new(
            InstrumentId(id),
            date,
            close,
            close + 1.0,
            close - 1.0,
            close,
            volume,
        ));
        date += chrono::Duration::days(1);
        while matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun) {
            date += chrono::Duration::days(1);
        }
    }
    QuotationSeries::new(quotes)
}

/// Provider with computed and ranked data for two stocks, one sector,
/// and one industry group, all sharing the same calendar.
fn scored_provider() -> MemoryProvider {
    let mut provider = MemoryProvider::new();

    let rising: Vec<f64> = (0..80).map(|i| 50.0 + i as f64 * 0.5).collect();
    let falling: Vec<f64> = (0..80).map(|i| 90.0 - i as f64 * 0.5).collect();
    let flat: Vec<f64> = vec![100.0; 80];

    let mut leader = Instrument::listed(InstrumentId(1), InstrumentKind::Stock, "LEAD", "NYSE", "Leader");
    leader.sector = Some(InstrumentId(10));
    leader.industry_group = Some(InstrumentId(20));
    let laggard = Instrument::listed(InstrumentId(2), InstrumentKind::Stock, "LAG", "NYSE", "Laggard");
    let sector = Instrument::listed(InstrumentId(10), InstrumentKind::Sector, "XSEC", "NYSE", "Sector");
    let group = Instrument::listed(InstrumentId(20), InstrumentKind::IndustryGroup, "XGRP", "NYSE", "Group");

    provider.insert(leader, weekday_series(1, &rising, 100_000));
    provider.insert(laggard, weekday_series(2, &falling, 100));
    provider.insert(sector, weekday_series(10, &rising, 0));
    provider.insert(group, weekday_series(20, &flat, 0));

    // Indicator pass over the whole universe, then ranking per universe,
    // written back so the candidate provider serves scored quotations.
    let mut all: Vec<QuotationSeries> = provider
        .instruments()
        .map(|i| i.id)
        .collect::<Vec<_>>()
        .into_iter()
        .map(|id| provider.history(id).unwrap())
        .collect();
    compute_universe(&mut all);
    for series in all {
        let id = series.instrument_id().unwrap();
        let latest = series.latest().unwrap().clone();
        provider.series_mut(id).unwrap().replace_latest(latest);
    }

    for kind in [InstrumentKind::Stock, InstrumentKind::Sector, InstrumentKind::IndustryGroup] {
        let mut candidates = provider.latest_candidates(kind).unwrap();
        rank_universe(&mut candidates);
        for candidate in candidates {
            provider
                .series_mut(candidate.instrument.id)
                .unwrap()
                .replace_latest(candidate.quotation);
        }
    }
    provider
}

fn params(template: &str) -> ScanParams {
    ScanParams {
        template: template.into(),
        kind: InstrumentKind::Stock,
        start_date: None,
        min_liquidity: None,
    }
}

#[test]
fn pass_through_template_keeps_prefiltered_candidates() {
    let provider = scored_provider();
    let engine = ScanTemplateEngine::new(&provider);
    let result = engine.evaluate(&params("some_unregistered_template")).unwrap();
    assert_eq!(result.len(), 2);
}

#[test]
fn liquidity_filter_runs_before_refinement() {
    let provider = scored_provider();
    let engine = ScanTemplateEngine::new(&provider);
    let mut p = params("some_unregistered_template");
    // The laggard trades ~100 shares around $75: far below the threshold.
    p.min_liquidity = Some(1_000_000.0);
    let result = engine.evaluate(&p).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].instrument.id, InstrumentId(1));
}

#[test]
fn stock_candidates_get_same_day_composite_ranks() {
    let provider = scored_provider();
    let engine = ScanTemplateEngine::new(&provider);
    let result = engine.evaluate(&params("some_unregistered_template")).unwrap();

    let leader = result.iter().find(|c| c.instrument.id == InstrumentId(1)).unwrap();
    let rs = leader.quotation.relative_strength.unwrap();
    // The only sector/group quotations share the stock's date, so both
    // composite ranks are copied; a one-member universe ranks 100.
    assert_eq!(rs.rs_sector, 100);
    assert_eq!(rs.rs_industry_group, 100);

    // The laggard has no hierarchy references: nothing copied.
    let laggard = result.iter().find(|c| c.instrument.id == InstrumentId(2)).unwrap();
    let rs = laggard.quotation.relative_strength.unwrap();
    assert_eq!(rs.rs_sector, 0);
    assert_eq!(rs.rs_industry_group, 0);
}

#[test]
fn universe_ranking_orders_leader_over_laggard() {
    let provider = scored_provider();
    let engine = ScanTemplateEngine::new(&provider);
    let result = engine.evaluate(&params("some_unregistered_template")).unwrap();

    let rs = |id: u64| {
        result
            .iter()
            .find(|c| c.instrument.id == InstrumentId(id))
            .unwrap()
            .quotation
            .relative_strength
            .unwrap()
            .rs_number
    };
    assert_eq!(rs(1), 100);
    assert_eq!(rs(2), 50);
}

#[test]
fn swing_template_end_to_end() {
    let provider = scored_provider();
    let engine = ScanTemplateEngine::new(&provider);
    let result = engine.evaluate(&params("swing_trading_environment")).unwrap();
    // Only the rising stock has both short averages rising.
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].instrument.id, InstrumentId(1));
}

#[test]
fn rank_since_date_reranks_the_candidate_set() {
    let provider = scored_provider();
    let engine = ScanTemplateEngine::new(&provider);
    let mut p = params("rank_since_date");
    p.start_date = Some(NaiveDate::from_ymd_opt(2023, 2, 1).unwrap());
    let result = engine.evaluate(&p).unwrap();
    assert_eq!(result.len(), 2);

    let rs = |id: u64| {
        result
            .iter()
            .find(|c| c.instrument.id == InstrumentId(id))
            .unwrap()
            .quotation
            .relative_strength
            .unwrap()
            .rs_number
    };
    assert_eq!(rs(1), 100);
    assert_eq!(rs(2), 50);
}

// ── Failure policy ───────────────────────────────────────────────────

/// Serves candidates but fails every history fetch.
struct BrokenHistory {
    inner: MemoryProvider,
}

impl HistoryProvider for BrokenHistory {
    fn history(&self, id: InstrumentId) -> Result<QuotationSeries, ProviderError> {
        Err(ProviderError::Storage(format!("connection lost fetching {id}")))
    }
}

impl CandidateProvider for BrokenHistory {
    fn latest_candidates(&self, kind: InstrumentKind) -> Result<Vec<Candidate>, ProviderError> {
        self.inner.latest_candidates(kind)
    }

    fn latest_for(&self, ids: &[InstrumentId]) -> Result<Vec<Candidate>, ProviderError> {
        self.inner.latest_for(ids)
    }
}

#[test]
fn history_failure_aborts_the_whole_template() {
    let provider = BrokenHistory { inner: scored_provider() };
    let engine = ScanTemplateEngine::new(&provider);
    let err = engine.evaluate(&params("three_weeks_tight")).unwrap_err();
    match err {
        ScanError::Refinement { instrument, .. } => assert_eq!(instrument, InstrumentId(1)),
        other => panic!("expected refinement failure, got {other}"),
    }
}

#[test]
fn history_failure_does_not_affect_pass_through_templates() {
    // Pass-through refiners never fetch history, so a broken history
    // provider is harmless for them.
    let provider = BrokenHistory { inner: scored_provider() };
    let engine = ScanTemplateEngine::new(&provider);
    let result = engine.evaluate(&params("some_unregistered_template")).unwrap();
    assert_eq!(result.len(), 2);
}
