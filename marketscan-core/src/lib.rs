//! MarketScan Core — instrument screening and relative-strength ranking.
//!
//! The heart of the screener:
//! - Domain types (instruments, quotations, date-indexed series)
//! - Sliding-window indicator calculators (moving averages, Bollinger,
//!   stochastic, performance/momentum, ATR)
//! - The indicator-computation entry point (full and historical passes)
//! - Percentile-based relative-strength ranking with composite
//!   (sector / industry-group) enrichment
//! - The scan-template engine and its per-template refiners
//!
//! Storage, market-data retrieval, chart rendering, and transport live
//! outside this crate; the engine consumes them through the traits in
//! [`provider`].

pub mod calc;
pub mod compute;
pub mod domain;
pub mod error;
pub mod provider;
pub mod rank;
pub mod scan;

pub use compute::{compute_indicators, compute_universe, ComputePass};
pub use error::ScanError;
pub use scan::{Candidate, ScanParams, ScanTemplateEngine};
