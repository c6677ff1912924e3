//! Domain types for MarketScan.

pub mod ids;
pub mod instrument;
pub mod quotation;
pub mod series;

pub use ids::InstrumentId;
pub use instrument::{Instrument, InstrumentError, InstrumentKind};
pub use quotation::{IndicatorData, MovingAverageData, Quotation, RelativeStrengthData};
pub use series::QuotationSeries;
