/// risk.rs — Bracket price computation
///
/// Every emitted signal carries a stop-loss and take-profit exactly
/// `band` away from entry (1% by default), on opposite sides of it.
/// Which side each lands on is controlled by `BracketMode`.
use std::fmt;
use std::str::FromStr;

use crate::models::Side;

/// Orientation of the stop/take band around the entry price.
///
/// `Inverted` (the default) places the stop on the FAVOURABLE side of
/// entry — for a BUY the stop sits above entry and the take-profit below
/// it, the mirror for SELL. `Conventional` is standard long/short
/// bracketing: stop adverse, take-profit favourable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketMode {
    Inverted,
    Conventional,
}

impl FromStr for BracketMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inverted" => Ok(BracketMode::Inverted),
            "conventional" => Ok(BracketMode::Conventional),
            other => Err(format!("unknown bracket mode '{other}' (expected 'inverted' or 'conventional')")),
        }
    }
}

impl fmt::Display for BracketMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketMode::Inverted => f.write_str("inverted"),
            BracketMode::Conventional => f.write_str("conventional"),
        }
    }
}

/// Round to 2-decimal price precision.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Compute (stop_loss, take_profit) for a signal, rounded to 2 decimals.
pub fn bracket_prices(side: Side, entry: f64, band: f64, mode: BracketMode) -> (f64, f64) {
    let above = entry * (1.0 + band);
    let below = entry * (1.0 - band);
    let (stop, take) = match (mode, side) {
        (BracketMode::Inverted, Side::Buy) => (above, below),
        (BracketMode::Inverted, Side::Sell) => (below, above),
        (BracketMode::Conventional, Side::Buy) => (below, above),
        (BracketMode::Conventional, Side::Sell) => (above, below),
    };
    (round2(stop), round2(take))
}
