//! Quotation — one instrument's OHLCV record for a single trading date.
//!
//! Prices are 2-decimal currency amounts; dates carry no intraday
//! component. The optional computed sub-records are always written by
//! the calculators, never authored by hand. Their numeric fields
//! default to the neutral 0.0 used when history is insufficient.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::InstrumentId;

/// OHLCV record, unique per (instrument, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quotation {
    pub instrument_id: InstrumentId,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moving_averages: Option<MovingAverageData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicator: Option<IndicatorData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_strength: Option<RelativeStrengthData>,
}

impl Quotation {
    pub fn new(
        instrument_id: InstrumentId,
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Self {
        Self {
            instrument_id,
            date,
            open,
            high,
            low,
            close,
            volume,
            moving_averages: None,
            indicator: None,
            relative_strength: None,
        }
    }

    /// Basic OHLC sanity: high is the top of the range, low the bottom,
    /// prices positive.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }

    pub fn dollar_volume(&self) -> f64 {
        self.close * self.volume as f64
    }
}

/// Moving-average attachment, recomputed per pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MovingAverageData {
    pub sma_10: f64,
    pub sma_20: f64,
    pub sma_50: f64,
    pub sma_150: f64,
    pub sma_200: f64,
    pub ema_21: f64,
    pub sma_volume_30: f64,
    /// 20-day average dollar volume.
    pub liquidity_20: f64,
}

/// Oscillator/momentum attachment, recomputed per pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorData {
    /// Slow stochastic %K, 14-day window with 3-day smoothing.
    pub stochastic_14: f64,
    /// Bollinger band width, 10-day window, k = 2.
    pub bollinger_band_width_10: f64,
    /// Average True Range percent, 20-day window.
    pub atrp_20: f64,
    /// 5-day percent performance.
    pub performance_5: f64,
    /// Percent distance of the close below the trailing 52-week high (<= 0).
    pub distance_to_52w_high: f64,
    /// Multi-horizon weighted momentum score.
    pub momentum_score: f64,
    /// Average up-day gain over average down-day loss, last 25 trading days.
    pub ad_ratio: f64,
    /// Total up-day volume over total down-day volume, last 50 trading days.
    pub up_down_volume_ratio: f64,
}

/// Percentile ranks against the peer universe. 0 = unranked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativeStrengthData {
    pub rs_number: i32,
    pub rs_distance_52w_high: i32,
    pub rs_up_down_volume: i32,
    pub rs_sector: i32,
    pub rs_industry_group: i32,
}
