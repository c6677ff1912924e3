//! Provider traits the engine consumes from its collaborators.
//!
//! Storage and market-data retrieval live outside this crate; the engine
//! only sees these traits. `MemoryProvider` backs tests and the CLI.

use std::collections::HashMap;

use thiserror::Error;

use crate::domain::{Instrument, InstrumentId, InstrumentKind, QuotationSeries};
use crate::scan::Candidate;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("unknown instrument {0}")]
    UnknownInstrument(InstrumentId),

    #[error("no quotations stored for {0}")]
    EmptyHistory(InstrumentId),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Full chronological quotation history for one instrument.
pub trait HistoryProvider {
    fn history(&self, id: InstrumentId) -> Result<QuotationSeries, ProviderError>;
}

/// Most-recent quotation per instrument, pre-joined with instrument and
/// computed indicator data. This is the coarse pre-filter boundary: the
/// collaborator may already have narrowed the universe.
pub trait CandidateProvider {
    fn latest_candidates(&self, kind: InstrumentKind) -> Result<Vec<Candidate>, ProviderError>;

    fn latest_for(&self, ids: &[InstrumentId]) -> Result<Vec<Candidate>, ProviderError>;
}

/// In-memory implementation of both provider traits.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    instruments: HashMap<InstrumentId, Instrument>,
    histories: HashMap<InstrumentId, QuotationSeries>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, instrument: Instrument, series: QuotationSeries) {
        self.histories.insert(instrument.id, series);
        self.instruments.insert(instrument.id, instrument);
    }

    pub fn series_mut(&mut self, id: InstrumentId) -> Option<&mut QuotationSeries> {
        self.histories.get_mut(&id)
    }

    /// Mutable access to every stored series, for the indicator pass.
    pub fn all_series_mut(&mut self) -> impl Iterator<Item = &mut QuotationSeries> {
        self.histories.values_mut()
    }

    pub fn instruments(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.values()
    }

    fn candidate(&self, instrument: &Instrument) -> Option<Candidate> {
        let series = self.histories.get(&instrument.id)?;
        let latest = series.latest()?.clone();
        Some(Candidate { instrument: instrument.clone(), quotation: latest })
    }
}

impl HistoryProvider for MemoryProvider {
    fn history(&self, id: InstrumentId) -> Result<QuotationSeries, ProviderError> {
        let series = self
            .histories
            .get(&id)
            .ok_or(ProviderError::UnknownInstrument(id))?;
        if series.is_empty() {
            return Err(ProviderError::EmptyHistory(id));
        }
        Ok(series.clone())
    }
}

impl CandidateProvider for MemoryProvider {
    fn latest_candidates(&self, kind: InstrumentKind) -> Result<Vec<Candidate>, ProviderError> {
        let mut instruments: Vec<&Instrument> = self
            .instruments
            .values()
            .filter(|i| i.kind == kind)
            .collect();
        // Deterministic order regardless of map iteration.
        instruments.sort_by_key(|i| i.id);
        Ok(instruments.into_iter().filter_map(|i| self.candidate(i)).collect())
    }

    fn latest_for(&self, ids: &[InstrumentId]) -> Result<Vec<Candidate>, ProviderError> {
        ids.iter()
            .map(|id| {
                let instrument = self
                    .instruments
                    .get(id)
                    .ok_or(ProviderError::UnknownInstrument(*id))?;
                self.candidate(instrument)
                    .ok_or(ProviderError::EmptyHistory(*id))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Quotation;
    use chrono::NaiveDate;

    fn stock(id: u64, symbol: &str) -> Instrument {
        Instrument::listed(InstrumentId(id), InstrumentKind::Stock, symbol, "NYSE", symbol)
    }

    fn one_quote_series(id: u64, close: f64) -> QuotationSeries {
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        QuotationSeries::new(vec![Quotation::new(InstrumentId(id), d, close, close, close, close, 100)])
    }

    #[test]
    fn history_errors_on_unknown_instrument() {
        let provider = MemoryProvider::new();
        assert_eq!(
            provider.history(InstrumentId(7)),
            Err(ProviderError::UnknownInstrument(InstrumentId(7)))
        );
    }

    #[test]
    fn latest_candidates_filters_by_kind_and_sorts_by_id() {
        let mut provider = MemoryProvider::new();
        provider.insert(stock(2, "B"), one_quote_series(2, 20.0));
        provider.insert(stock(1, "A"), one_quote_series(1, 10.0));
        provider.insert(
            Instrument::listed(InstrumentId(3), InstrumentKind::Sector, "XLK", "NYSE", "Tech"),
            one_quote_series(3, 30.0),
        );

        let candidates = provider.latest_candidates(InstrumentKind::Stock).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].instrument.id, InstrumentId(1));
        assert_eq!(candidates[1].instrument.id, InstrumentId(2));
    }

    #[test]
    fn latest_for_reports_missing_ids() {
        let mut provider = MemoryProvider::new();
        provider.insert(stock(1, "A"), one_quote_series(1, 10.0));
        let err = provider.latest_for(&[InstrumentId(1), InstrumentId(9)]).unwrap_err();
        assert_eq!(err, ProviderError::UnknownInstrument(InstrumentId(9)));
    }
}
