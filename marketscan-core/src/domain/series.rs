//! QuotationSeries — a date-ascending view over one instrument's history.
//!
//! Materialized per calculation pass, never persisted. The constructor
//! sorts and deduplicates by date (last wins), upholding the
//! one-quotation-per-(instrument, date) invariant even over sloppy input.

use chrono::{Datelike, NaiveDate};

use super::ids::InstrumentId;
use super::quotation::Quotation;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuotationSeries {
    instrument_id: Option<InstrumentId>,
    quotes: Vec<Quotation>,
}

impl QuotationSeries {
    pub fn new(mut quotes: Vec<Quotation>) -> Self {
        quotes.sort_by_key(|q| q.date);
        quotes.dedup_by(|next, prev| {
            if next.date == prev.date {
                // Later entry wins.
                *prev = next.clone();
                true
            } else {
                false
            }
        });
        let instrument_id = quotes.first().map(|q| q.instrument_id);
        Self { instrument_id, quotes }
    }

    /// Synthetic ratio series: divides OHLC of `dividend` by `divisor` on
    /// every shared trading date. Volume carries no meaning for a ratio.
    pub fn ratio(id: InstrumentId, dividend: &QuotationSeries, divisor: &QuotationSeries) -> Self {
        let mut quotes = Vec::new();
        let mut j = 0;
        for a in &dividend.quotes {
            while j < divisor.quotes.len() && divisor.quotes[j].date < a.date {
                j += 1;
            }
            let Some(b) = divisor.quotes.get(j) else { break };
            if b.date != a.date {
                continue;
            }
            if b.open == 0.0 || b.high == 0.0 || b.low == 0.0 || b.close == 0.0 {
                continue;
            }
            quotes.push(Quotation::new(
                id,
                a.date,
                crate::calc::round_half_up(a.open / b.open, 2),
                crate::calc::round_half_up(a.high / b.high, 2),
                crate::calc::round_half_up(a.low / b.low, 2),
                crate::calc::round_half_up(a.close / b.close, 2),
                0,
            ));
        }
        Self { instrument_id: Some(id), quotes }
    }

    pub fn instrument_id(&self) -> Option<InstrumentId> {
        self.instrument_id
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Quotation> {
        self.quotes.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Quotation> {
        self.quotes.get_mut(index)
    }

    pub fn latest(&self) -> Option<&Quotation> {
        self.quotes.last()
    }

    /// Replace the most recent quotation (used to write back computed data).
    pub fn replace_latest(&mut self, quotation: Quotation) {
        if let Some(last) = self.quotes.last_mut() {
            *last = quotation;
        }
    }

    pub fn quotes(&self) -> &[Quotation] {
        &self.quotes
    }

    /// Index of the most recent quotation dated at or before `date`.
    pub fn index_at_or_before(&self, date: NaiveDate) -> Option<usize> {
        let n = self.quotes.partition_point(|q| q.date <= date);
        n.checked_sub(1)
    }

    /// Index of the first quotation dated at or after `date`.
    pub fn index_at_or_after(&self, date: NaiveDate) -> Option<usize> {
        let n = self.quotes.partition_point(|q| q.date < date);
        (n < self.quotes.len()).then_some(n)
    }

    /// Exactly the `days` most recent quotations at/before `target`
    /// (inclusive), or `None` when fewer exist. This is the windowing rule
    /// every sliding calculator shares.
    pub fn window_ending_at(&self, days: usize, target: usize) -> Option<&[Quotation]> {
        if days == 0 || target >= self.quotes.len() || target + 1 < days {
            return None;
        }
        Some(&self.quotes[target + 1 - days..=target])
    }

    /// Resample to the last close of each ISO week, ascending.
    pub fn weekly_closes(&self) -> Vec<f64> {
        let mut weekly = Vec::new();
        let mut current_week: Option<(i32, u32)> = None;
        for q in &self.quotes {
            let week = (q.date.iso_week().year(), q.date.iso_week().week());
            if current_week == Some(week) {
                *weekly.last_mut().expect("week open implies a close") = q.close;
            } else {
                current_week = Some(week);
                weekly.push(q.close);
            }
        }
        weekly
    }
}
