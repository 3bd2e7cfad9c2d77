/// strategy.rs — Volatility-Breakout Signal Rule
///
/// ─────────────────────────────────────────────────────────────────────────
/// RULE
/// ─────────────────────────────────────────────────────────────────────────
///
/// Over one fetched candle window:
///
///   latest_ATR = ATR at the most recent bar
///   mean_ATR   = mean of ATR over every bar where it is defined
///
///   Qualify:   latest_ATR > multiplier · mean_ATR
///   Direction: close_last > mean(close)  →  BUY,  else SELL
///
/// The direction test compares the last close against the mean of the
/// same window it is drawn from — a self-referential momentum proxy,
/// not a validated edge. It sits behind the `SignalStrategy` trait so a
/// better rule can be substituted without touching the pipeline.
/// ─────────────────────────────────────────────────────────────────────────
use crate::models::atr::compute_atr;
use crate::models::{Candle, Side};

/// A strategy decision for one pair within one polling cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub side:        Side,
    pub entry_price: f64,
}

/// Pure per-window signal rule.
pub trait SignalStrategy: Send + Sync {
    /// Unique strategy identifier, used in logs.
    fn id(&self) -> &'static str;

    /// Evaluate one fetched candle window.
    ///
    /// Returns `None` when the window does not qualify — including when
    /// it is too short for the indicator to be defined at all.
    fn evaluate(&self, candles: &[Candle]) -> Option<Decision>;
}

#[derive(Debug, Clone)]
pub struct AtrBreakout {
    pub period:     usize,
    pub multiplier: f64,
}

impl AtrBreakout {
    pub fn new(period: usize, multiplier: f64) -> Self {
        Self { period, multiplier }
    }
}

impl SignalStrategy for AtrBreakout {
    fn id(&self) -> &'static str {
        "atr-breakout"
    }

    fn evaluate(&self, candles: &[Candle]) -> Option<Decision> {
        let series = compute_atr(candles, self.period);
        let latest = series.latest()?;
        let mean = series.mean()?;
        if latest <= self.multiplier * mean {
            return None;
        }

        let last = candles.last()?;
        let mean_close =
            candles.iter().map(|c| c.close).sum::<f64>() / candles.len() as f64;
        let side = if last.close > mean_close {
            Side::Buy
        } else {
            Side::Sell
        };

        Some(Decision {
            side,
            entry_price: last.close,
        })
    }
}
