//! Typed identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for an instrument. Assigned by the storage collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstrumentId(pub u64);

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instrument#{}", self.0)
    }
}
