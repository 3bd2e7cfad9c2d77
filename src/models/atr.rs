/// models/atr.rs — Average True Range (ATR) Volatility Measure
///
/// ─────────────────────────────────────────────────────────────────────────
/// MATHEMATICAL SPECIFICATION
/// ─────────────────────────────────────────────────────────────────────────
///
/// True Range: Wilder (1978)
///
///   TR_t = max(high_t − low_t,
///              |high_t − close_{t-1}|,
///              |low_t  − close_{t-1}|)
///
///   TR_0 = high_0 − low_0      (no previous close; boundary policy,
///                               not an error case)
///
/// ATR (simple-moving-average variant, not Wilder smoothing):
///
///   ATR_t = (1/n) · Σ_{k=t−n+1..t} TR_k
///
///   undefined for t < n−1 (fewer than n TR samples available)
///
/// Properties:
///   TR_t ≥ 0 whenever high_t ≥ low_t, hence ATR_t ≥ 0.
/// ─────────────────────────────────────────────────────────────────────────
use crate::models::Candle;

/// TR and ATR sequences aligned 1:1 with the input candle slice.
#[derive(Debug, Clone, PartialEq)]
pub struct AtrSeries {
    pub tr:  Vec<f64>,
    pub atr: Vec<Option<f64>>,
}

impl AtrSeries {
    /// ATR at the most recent bar, if defined.
    pub fn latest(&self) -> Option<f64> {
        self.atr.last().copied().flatten()
    }

    /// Arithmetic mean over all defined ATR values.
    pub fn mean(&self) -> Option<f64> {
        let mut sum = 0.0;
        let mut count = 0usize;
        for v in self.atr.iter().flatten() {
            sum += v;
            count += 1;
        }
        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }
}

/// True Range of a candle given the previous close.
pub fn true_range(prev_close: f64, candle: &Candle) -> f64 {
    let hl = candle.high - candle.low;
    let hc = (candle.high - prev_close).abs();
    let lc = (candle.low - prev_close).abs();
    hl.max(hc).max(lc)
}

/// Compute TR and rolling-mean ATR over a candle series.
///
/// Pure function of its input: no state is retained between calls.
pub fn compute_atr(candles: &[Candle], period: usize) -> AtrSeries {
    let n = candles.len();
    let mut tr = Vec::with_capacity(n);
    for (i, candle) in candles.iter().enumerate() {
        let value = if i == 0 {
            candle.high - candle.low
        } else {
            true_range(candles[i - 1].close, candle)
        };
        tr.push(value);
    }

    let mut atr = vec![None; n];
    if period == 0 || n < period {
        return AtrSeries { tr, atr };
    }

    // Rolling window sum: O(n) instead of O(n·period)
    let mut window_sum: f64 = tr[..period].iter().sum();
    atr[period - 1] = Some(window_sum / period as f64);
    for i in period..n {
        window_sum += tr[i] - tr[i - period];
        atr[i] = Some(window_sum / period as f64);
    }

    AtrSeries { tr, atr }
}
