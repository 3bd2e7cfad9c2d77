/// main.rs — Volatility Breakout Scanner Entry Point
///
/// FLOW:
///   1. Load config from .env (KUCOIN_API_KEY, KUCOIN_API_SECRET, ...)
///   2. Sync the signing clock against the exchange server
///   3. Each interval tick, scan every configured pair: fetch klines,
///      compute ATR, apply the breakout rule
///   4. Emit one line per qualifying signal to stdout
///   5. Ctrl-C stops the loop between cycles
///
/// NOTE: No orders are placed anywhere — this process only watches and
///       reports.
use anyhow::Result;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use atr_engine::config::AppConfig;
use atr_engine::data::{Credentials, KucoinDataClient};
use atr_engine::engine::SignalEngine;
use atr_engine::strategy::{AtrBreakout, SignalStrategy};

#[tokio::main]
async fn main() -> Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════╗");
    info!("║   ATR ENGINE  —  VOLATILITY BREAKOUT SCAN   ║");
    info!("║   monitoring only — no orders are placed    ║");
    info!("╚══════════════════════════════════════════════╝");

    // ── Config ───────────────────────────────────────────────────────────
    let cfg = AppConfig::from_env()?;
    info!(
        "Scan:  pairs={:?} granularity={}m window={} poll={}s",
        cfg.trading_pairs, cfg.granularity_mins, cfg.candle_window, cfg.poll_secs
    );
    info!(
        "Rule:  ATR period={} multiplier={:.1} band={:.2}% brackets={}",
        cfg.atr_period,
        cfg.atr_multiplier,
        cfg.bracket_band * 100.0,
        cfg.bracket_mode
    );

    // ── Market data client ───────────────────────────────────────────────
    let credentials =
        Credentials::from_parts(&cfg.api_key, &cfg.api_secret, &cfg.api_passphrase);
    if credentials.is_none() {
        info!("No API credentials configured — using unsigned (public) requests");
    }
    let mut data_client = KucoinDataClient::new(&cfg.rest_url, credentials);
    if let Err(e) = data_client.sync_time().await {
        warn!("Server time sync failed ({e}) — falling back to the local clock");
    }

    // ── Engine ───────────────────────────────────────────────────────────
    let strategy = AtrBreakout::new(cfg.atr_period, cfg.atr_multiplier);
    info!("Strategy: {}", strategy.id());
    let poll_secs = cfg.poll_secs;
    let engine = SignalEngine::new(cfg, data_client, strategy);

    // ── Scan loop ────────────────────────────────────────────────────────
    let mut ticker = interval(Duration::from_secs(poll_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Entering scan loop — polling every {poll_secs}s...");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let signals = engine.run_cycle().await;
                for signal in &signals {
                    println!("{signal}");
                }
                info!("Cycle complete — {} signal(s)", signals.len());
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received — shutting down");
                break;
            }
        }
    }

    Ok(())
}
