/// engine.rs — Per-Cycle Signal Generation
///
/// One polling cycle walks the configured pair list in order, strictly
/// sequentially: fetch → indicator → strategy → brackets. Each pair is
/// isolated — a failed fetch is logged and skipped, and never affects
/// the other pairs or the loop itself. No state survives between
/// cycles; every cycle recomputes from freshly fetched data, so the
/// same pair can signal on every cycle while conditions persist.
use chrono::Utc;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::data::{FetchError, MarketData};
use crate::models::Signal;
use crate::risk::{bracket_prices, round2};
use crate::strategy::SignalStrategy;

pub struct SignalEngine<D, S> {
    cfg:      AppConfig,
    data:     D,
    strategy: S,
}

impl<D: MarketData, S: SignalStrategy> SignalEngine<D, S> {
    pub fn new(cfg: AppConfig, data: D, strategy: S) -> Self {
        Self { cfg, data, strategy }
    }

    /// Run one polling cycle over the configured pair list.
    ///
    /// Emission order follows the pair list order.
    pub async fn run_cycle(&self) -> Vec<Signal> {
        let mut signals = Vec::new();
        for pair in &self.cfg.trading_pairs {
            match self.evaluate_pair(pair).await {
                Ok(Some(signal)) => signals.push(signal),
                Ok(None) => debug!("{pair}: no signal this cycle"),
                Err(e) => warn!("{pair}: candle fetch failed — skipping this cycle ({e})"),
            }
        }
        signals
    }

    async fn evaluate_pair(&self, pair: &str) -> Result<Option<Signal>, FetchError> {
        let candles = self
            .data
            .fetch_candles(pair, self.cfg.granularity_mins, self.cfg.candle_window)
            .await?;

        let Some(decision) = self.strategy.evaluate(&candles) else {
            return Ok(None);
        };

        let (stop_loss, take_profit) = bracket_prices(
            decision.side,
            decision.entry_price,
            self.cfg.bracket_band,
            self.cfg.bracket_mode,
        );

        Ok(Some(Signal {
            timestamp:   Utc::now(),
            pair:        pair.to_owned(),
            side:        decision.side,
            entry_price: round2(decision.entry_price),
            stop_loss,
            take_profit,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::models::{Candle, Side};
    use crate::risk::BracketMode;
    use crate::strategy::AtrBreakout;

    /// Canned candle source: symbols map to fixed series, anything
    /// missing from the map fails the way a dead endpoint would.
    struct MockMarketData {
        series: HashMap<String, Vec<Candle>>,
    }

    impl MarketData for MockMarketData {
        async fn fetch_candles(
            &self,
            symbol: &str,
            _granularity_mins: u32,
            _limit: u32,
        ) -> Result<Vec<Candle>, FetchError> {
            self.series
                .get(symbol)
                .cloned()
                .ok_or_else(|| FetchError::Exchange {
                    code: "500000".into(),
                    msg:  "simulated outage".into(),
                })
        }
    }

    fn flat_candle(price: f64) -> Candle {
        Candle {
            open_time: 0,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 1.0,
        }
    }

    /// 19 flat bars at 100 plus one spike bar closing at 105 — enough
    /// for the last ATR to clear 2.5× its window mean.
    fn spike_series() -> Vec<Candle> {
        let mut candles: Vec<Candle> = (0..19).map(|_| flat_candle(100.0)).collect();
        candles.push(Candle {
            open_time: 0,
            open: 100.0,
            high: 105.0,
            low: 100.0,
            close: 105.0,
            volume: 1.0,
        });
        candles
    }

    fn test_config(pairs: &[&str]) -> AppConfig {
        AppConfig {
            api_key: String::new(),
            api_secret: String::new(),
            api_passphrase: String::new(),
            rest_url: "http://unused".into(),
            trading_pairs: pairs.iter().map(|p| (*p).to_owned()).collect(),
            granularity_mins: 1,
            candle_window: 50,
            atr_period: 14,
            atr_multiplier: 2.5,
            bracket_band: 0.01,
            bracket_mode: BracketMode::Inverted,
            poll_secs: 60,
        }
    }

    fn engine_for(
        pairs: &[&str],
        series: HashMap<String, Vec<Candle>>,
    ) -> SignalEngine<MockMarketData, AtrBreakout> {
        let cfg = test_config(pairs);
        SignalEngine::new(cfg, MockMarketData { series }, AtrBreakout::new(14, 2.5))
    }

    #[tokio::test]
    async fn spike_emits_buy_with_inverted_brackets() {
        let series = HashMap::from([("XBTUSDTM".to_owned(), spike_series())]);
        let engine = engine_for(&["XBTUSDTM"], series);

        let signals = engine.run_cycle().await;
        assert_eq!(signals.len(), 1);
        let signal = &signals[0];
        assert_eq!(signal.pair, "XBTUSDTM");
        assert_eq!(signal.side, Side::Buy);
        assert_eq!(signal.entry_price, 105.00);
        assert_eq!(signal.stop_loss, 106.05);
        assert_eq!(signal.take_profit, 103.95);
    }

    #[tokio::test]
    async fn failed_pair_does_not_affect_the_others() {
        // ETHUSDTM is missing from the mock → fetch error; the other
        // three pairs still run, in list order
        let series = HashMap::from([
            ("XBTUSDTM".to_owned(), spike_series()),
            ("LTCUSDTM".to_owned(), vec![flat_candle(100.0); 50]),
            ("DOGEUSDTM".to_owned(), spike_series()),
        ]);
        let engine = engine_for(&["XBTUSDTM", "ETHUSDTM", "LTCUSDTM", "DOGEUSDTM"], series);

        let signals = engine.run_cycle().await;
        let pairs: Vec<&str> = signals.iter().map(|s| s.pair.as_str()).collect();
        assert_eq!(pairs, vec!["XBTUSDTM", "DOGEUSDTM"]);
    }

    #[tokio::test]
    async fn quiet_market_emits_nothing() {
        let series = HashMap::from([("XBTUSDTM".to_owned(), vec![flat_candle(100.0); 50])]);
        let engine = engine_for(&["XBTUSDTM"], series);
        assert!(engine.run_cycle().await.is_empty());
    }

    #[tokio::test]
    async fn short_series_yields_no_signal_and_no_panic() {
        let series = HashMap::from([("XBTUSDTM".to_owned(), vec![flat_candle(100.0); 5])]);
        let engine = engine_for(&["XBTUSDTM"], series);
        assert!(engine.run_cycle().await.is_empty());
    }

    #[tokio::test]
    async fn empty_series_yields_no_signal() {
        let series = HashMap::from([("XBTUSDTM".to_owned(), Vec::new())]);
        let engine = engine_for(&["XBTUSDTM"], series);
        assert!(engine.run_cycle().await.is_empty());
    }

    #[tokio::test]
    async fn conventional_mode_flips_brackets() {
        let series = HashMap::from([("XBTUSDTM".to_owned(), spike_series())]);
        let mut cfg = test_config(&["XBTUSDTM"]);
        cfg.bracket_mode = BracketMode::Conventional;
        let engine =
            SignalEngine::new(cfg, MockMarketData { series }, AtrBreakout::new(14, 2.5));

        let signals = engine.run_cycle().await;
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].stop_loss, 103.95);
        assert_eq!(signals[0].take_profit, 106.05);
    }
}
