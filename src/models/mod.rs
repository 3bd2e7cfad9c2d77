use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub mod atr;

/// One OHLCV bar. Immutable once parsed from the exchange response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bar open time, milliseconds since epoch
    pub open_time: i64,
    pub open:   f64,
    pub high:   f64,
    pub low:    f64,
    pub close:  f64,
    pub volume: f64,
}

impl Candle {
    /// Bar open time as a UTC datetime.
    pub fn open_time_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.open_time).single()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single trade alert produced by one polling cycle.
///
/// Never persisted and never mutated after creation; the `Display` impl is
/// the one-line report written to stdout.
#[derive(Debug, Clone, Serialize)]
pub struct Signal {
    /// Generation time (UTC), not the bar time
    pub timestamp:   DateTime<Utc>,
    pub pair:        String,
    pub side:        Side,
    pub entry_price: f64,
    pub stop_loss:   f64,
    pub take_profit: f64,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {} - Entry: {:.2}, SL: {:.2}, TP: {:.2}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.pair,
            self.side,
            self.entry_price,
            self.stop_loss,
            self.take_profit,
        )
    }
}
