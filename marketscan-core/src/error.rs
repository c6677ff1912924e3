//! Engine error taxonomy.
//!
//! Insufficient history is never an error (calculators return the
//! documented neutral zero) and a missing ranking metric is exclusion,
//! not failure. What remains: provider failures and bad scan
//! parameters.

use thiserror::Error;

use crate::domain::InstrumentId;
use crate::provider::ProviderError;

#[derive(Debug, Error)]
pub enum ScanError {
    /// Fetching a candidate's full history during template refinement
    /// failed. Aborts the whole template evaluation, never swallowed.
    #[error("refinement aborted: history fetch failed for {instrument}: {source}")]
    Refinement {
        instrument: InstrumentId,
        source: ProviderError,
    },

    /// Candidate retrieval failed before any refinement ran.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("invalid scan parameters: {0}")]
    InvalidParams(String),
}
