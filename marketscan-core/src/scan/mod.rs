//! Scan-template engine.
//!
//! Stateless per invocation. Takes a pre-filtered candidate set (one
//! most-recent quotation per instrument) and runs a strictly ordered
//! pipeline: liquidity filter, composite-rank enrichment for stocks,
//! then the template-specific refinement looked up in the registry.
//!
//! Refiners are pure: they consume a candidate vector and produce a new
//! one, never mutating a shared collection in place. Templates without a
//! registered refiner pass the candidate set through unchanged.

pub mod buyable_base;
pub mod high_tight_flag;
pub mod ma_convergence;
pub mod rank_since_date;
pub mod swing_environment;
pub mod three_weeks_tight;

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{Instrument, InstrumentKind, Quotation, QuotationSeries};
use crate::error::ScanError;
use crate::provider::{CandidateProvider, HistoryProvider};
use crate::rank::enrich_composite_ranks;

pub use buyable_base::BuyableBase;
pub use high_tight_flag::HighTightFlag;
pub use ma_convergence::MaPriceConvergence;
pub use rank_since_date::RankSinceDate;
pub use swing_environment::SwingTradingEnvironment;
pub use three_weeks_tight::ThreeWeeksTight;

/// One scan candidate: an instrument joined with its most recent
/// quotation (computed data included).
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub instrument: Instrument,
    pub quotation: Quotation,
}

/// Parameters of one template evaluation.
#[derive(Debug, Clone)]
pub struct ScanParams {
    pub template: String,
    pub kind: InstrumentKind,
    pub start_date: Option<NaiveDate>,
    pub min_liquidity: Option<f64>,
}

/// What a refiner did with the candidate set. `Unchanged` is the
/// pass-through outcome for templates that need no refinement beyond the
/// external pre-filter; it is not a failure.
#[derive(Debug)]
pub enum Refinement {
    Unchanged(Vec<Candidate>),
    Refined(Vec<Candidate>),
}

impl Refinement {
    pub fn into_candidates(self) -> Vec<Candidate> {
        match self {
            Refinement::Unchanged(c) | Refinement::Refined(c) => c,
        }
    }
}

/// Everything a refiner may reach for besides the candidates themselves.
pub struct RefineContext<'a> {
    pub history: &'a dyn HistoryProvider,
    pub params: &'a ScanParams,
}

impl RefineContext<'_> {
    /// Fetch a candidate's full history; a failure here aborts the whole
    /// template evaluation (all-or-nothing policy).
    pub fn full_history(&self, candidate: &Candidate) -> Result<QuotationSeries, ScanError> {
        self.history
            .history(candidate.instrument.id)
            .map_err(|source| ScanError::Refinement { instrument: candidate.instrument.id, source })
    }
}

/// A named, template-specific refinement strategy.
pub trait TemplateRefiner: Send + Sync {
    fn name(&self) -> &str;

    fn refine(
        &self,
        candidates: Vec<Candidate>,
        ctx: &RefineContext<'_>,
    ) -> Result<Refinement, ScanError>;
}

/// Pass-through refiner for templates that need nothing beyond the
/// pre-filter.
pub struct PassThrough;

impl TemplateRefiner for PassThrough {
    fn name(&self) -> &str {
        "pass_through"
    }

    fn refine(
        &self,
        candidates: Vec<Candidate>,
        _ctx: &RefineContext<'_>,
    ) -> Result<Refinement, ScanError> {
        Ok(Refinement::Unchanged(candidates))
    }
}

/// Registry mapping template names to refinement strategies.
pub struct TemplateRegistry {
    refiners: HashMap<String, Box<dyn TemplateRefiner>>,
    pass_through: PassThrough,
}

impl TemplateRegistry {
    pub fn empty() -> Self {
        Self { refiners: HashMap::new(), pass_through: PassThrough }
    }

    /// All built-in templates.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("rank_since_date", Box::new(RankSinceDate));
        registry.register("three_weeks_tight", Box::new(ThreeWeeksTight));
        registry.register("high_tight_flag", Box::new(HighTightFlag));
        registry.register("swing_trading_environment", Box::new(SwingTradingEnvironment));
        registry.register("buyable_base", Box::new(BuyableBase));
        registry.register("ma_price_convergence", Box::new(MaPriceConvergence));
        registry
    }

    pub fn register(&mut self, name: &str, refiner: Box<dyn TemplateRefiner>) {
        self.refiners.insert(name.to_string(), refiner);
    }

    /// Look up a refiner; unknown template names resolve to pass-through.
    pub fn get(&self, name: &str) -> &dyn TemplateRefiner {
        self.refiners.get(name).map(Box::as_ref).unwrap_or(&self.pass_through)
    }
}

/// The engine: wires providers, registry, and the pipeline together.
pub struct ScanTemplateEngine<'a, P> {
    provider: &'a P,
    registry: TemplateRegistry,
}

impl<'a, P> ScanTemplateEngine<'a, P>
where
    P: HistoryProvider + CandidateProvider,
{
    pub fn new(provider: &'a P) -> Self {
        Self { provider, registry: TemplateRegistry::with_builtins() }
    }

    pub fn with_registry(provider: &'a P, registry: TemplateRegistry) -> Self {
        Self { provider, registry }
    }

    /// Evaluate one template: fetch the pre-filtered candidates, apply the
    /// liquidity filter, enrich stock candidates with same-day composite
    /// ranks, then run the template's refiner.
    pub fn evaluate(&self, params: &ScanParams) -> Result<Vec<Candidate>, ScanError> {
        let candidates = self.provider.latest_candidates(params.kind)?;
        debug!(template = %params.template, candidates = candidates.len(), "scan start");

        let mut candidates = apply_liquidity_filter(candidates, params.min_liquidity);
        debug!(after_liquidity = candidates.len(), "liquidity filter applied");

        if params.kind == InstrumentKind::Stock {
            let sectors = self.provider.latest_candidates(InstrumentKind::Sector)?;
            let groups = self.provider.latest_candidates(InstrumentKind::IndustryGroup)?;
            enrich_composite_ranks(&mut candidates, &sectors, &groups);
        }

        let ctx = RefineContext { history: self.provider, params };
        let refined = self
            .registry
            .get(&params.template)
            .refine(candidates, &ctx)?
            .into_candidates();
        debug!(surviving = refined.len(), "scan complete");
        Ok(refined)
    }
}

/// Drop candidates whose 20-day average dollar volume falls below the
/// threshold. Candidates without computed liquidity count as illiquid.
fn apply_liquidity_filter(candidates: Vec<Candidate>, min_liquidity: Option<f64>) -> Vec<Candidate> {
    let Some(threshold) = min_liquidity else {
        return candidates;
    };
    candidates
        .into_iter()
        .filter(|c| {
            c.quotation
                .moving_averages
                .map(|ma| ma.liquidity_20 >= threshold)
                .unwrap_or(false)
        })
        .collect()
}
