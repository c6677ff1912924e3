//! Instrument — a tradable symbol, composite, or synthetic ratio.
//!
//! Field requirements depend on the kind: validation is type-dependent,
//! not structural. A RATIO instrument has no symbol/exchange of its own
//! and instead references a dividend and divisor instrument.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::InstrumentId;

/// What kind of thing an instrument is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentKind {
    Stock,
    Etf,
    Sector,
    IndustryGroup,
    Ratio,
}

impl InstrumentKind {
    /// Parse the storage-layer spelling ("STOCK", "IND_GROUP", ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "STOCK" => Some(Self::Stock),
            "ETF" => Some(Self::Etf),
            "SECTOR" => Some(Self::Sector),
            "IND_GROUP" => Some(Self::IndustryGroup),
            "RATIO" => Some(Self::Ratio),
            _ => None,
        }
    }
}

/// Instrument metadata.
///
/// `sector` and `industry_group` are only meaningful on stocks and must
/// reference instruments of the matching kind. `dividend`/`divisor` are
/// the two legs of a RATIO instrument and are forbidden elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: InstrumentId,
    pub kind: InstrumentKind,
    pub symbol: Option<String>,
    pub exchange: Option<String>,
    pub name: String,
    pub sector: Option<InstrumentId>,
    pub industry_group: Option<InstrumentId>,
    pub dividend: Option<InstrumentId>,
    pub divisor: Option<InstrumentId>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstrumentError {
    #[error("{kind:?} instrument {id} requires a symbol")]
    MissingSymbol { id: InstrumentId, kind: InstrumentKind },

    #[error("{kind:?} instrument {id} requires an exchange")]
    MissingExchange { id: InstrumentId, kind: InstrumentKind },

    #[error("RATIO instrument {id} must not carry a symbol or exchange")]
    RatioWithSymbol { id: InstrumentId },

    #[error("RATIO instrument {id} requires both dividend and divisor references")]
    MissingRatioLeg { id: InstrumentId },

    #[error("{kind:?} instrument {id} must not carry dividend/divisor references")]
    RatioLegForbidden { id: InstrumentId, kind: InstrumentKind },

    #[error("{kind:?} instrument {id} must not carry sector/industry-group references")]
    HierarchyForbidden { id: InstrumentId, kind: InstrumentKind },

    #[error("instrument {id} references unknown instrument {reference}")]
    UnknownReference { id: InstrumentId, reference: InstrumentId },

    #[error("instrument {id} references {reference} as {expected:?}, but it is {actual:?}")]
    ReferenceKindMismatch {
        id: InstrumentId,
        reference: InstrumentId,
        expected: InstrumentKind,
        actual: InstrumentKind,
    },
}

impl Instrument {
    /// Plain stock/ETF/composite constructor. Hierarchy and ratio legs start empty.
    pub fn listed(id: InstrumentId, kind: InstrumentKind, symbol: &str, exchange: &str, name: &str) -> Self {
        Self {
            id,
            kind,
            symbol: Some(symbol.to_string()),
            exchange: Some(exchange.to_string()),
            name: name.to_string(),
            sector: None,
            industry_group: None,
            dividend: None,
            divisor: None,
        }
    }

    /// Synthetic ratio constructor.
    pub fn ratio(id: InstrumentId, name: &str, dividend: InstrumentId, divisor: InstrumentId) -> Self {
        Self {
            id,
            kind: InstrumentKind::Ratio,
            symbol: None,
            exchange: None,
            name: name.to_string(),
            sector: None,
            industry_group: None,
            dividend: Some(dividend),
            divisor: Some(divisor),
        }
    }

    /// Validate the kind-dependent field rules.
    ///
    /// `resolve` maps a referenced id to its kind; references that resolve to
    /// `None` are reported as unknown.
    pub fn validate(
        &self,
        resolve: impl Fn(InstrumentId) -> Option<InstrumentKind>,
    ) -> Result<(), InstrumentError> {
        match self.kind {
            InstrumentKind::Ratio => {
                if self.symbol.is_some() || self.exchange.is_some() {
                    return Err(InstrumentError::RatioWithSymbol { id: self.id });
                }
                if self.sector.is_some() || self.industry_group.is_some() {
                    return Err(InstrumentError::HierarchyForbidden { id: self.id, kind: self.kind });
                }
                let (dividend, divisor) = match (self.dividend, self.divisor) {
                    (Some(a), Some(b)) => (a, b),
                    _ => return Err(InstrumentError::MissingRatioLeg { id: self.id }),
                };
                // Legs may be any listed kind, but must exist.
                for leg in [dividend, divisor] {
                    if resolve(leg).is_none() {
                        return Err(InstrumentError::UnknownReference { id: self.id, reference: leg });
                    }
                }
            }
            kind => {
                if self.symbol.is_none() {
                    return Err(InstrumentError::MissingSymbol { id: self.id, kind });
                }
                if self.exchange.is_none() {
                    return Err(InstrumentError::MissingExchange { id: self.id, kind });
                }
                if self.dividend.is_some() || self.divisor.is_some() {
                    return Err(InstrumentError::RatioLegForbidden { id: self.id, kind });
                }
                if kind != InstrumentKind::Stock
                    && (self.sector.is_some() || self.industry_group.is_some())
                {
                    return Err(InstrumentError::HierarchyForbidden { id: self.id, kind });
                }
                if kind == InstrumentKind::Stock {
                    self.check_reference(self.sector, InstrumentKind::Sector, &resolve)?;
                    self.check_reference(self.industry_group, InstrumentKind::IndustryGroup, &resolve)?;
                }
            }
        }
        Ok(())
    }

    fn check_reference(
        &self,
        reference: Option<InstrumentId>,
        expected: InstrumentKind,
        resolve: &impl Fn(InstrumentId) -> Option<InstrumentKind>,
    ) -> Result<(), InstrumentError> {
        let Some(reference) = reference else {
            return Ok(());
        };
        match resolve(reference) {
            None => Err(InstrumentError::UnknownReference { id: self.id, reference }),
            Some(actual) if actual != expected => Err(InstrumentError::ReferenceKindMismatch {
                id: self.id,
                reference,
                expected,
                actual,
            }),
            Some(_) => Ok(()),
        }
    }
}
