/// config.rs — Centralised configuration loaded from .env
///
/// All parameters consumed by the scanner are defined here.
/// Loading happens once at startup; every module borrows &AppConfig.
use anyhow::Result;
use std::env;

use crate::risk::BracketMode;

/// Strategy reference defaults
pub const DEFAULT_ATR_PERIOD: usize = 14;
pub const DEFAULT_ATR_MULTIPLIER: f64 = 2.5;
pub const DEFAULT_CANDLE_WINDOW: u32 = 50;
/// Stop/take offset as a fraction of entry (0.01 = 1%)
pub const DEFAULT_BRACKET_BAND: f64 = 0.01;

#[derive(Debug, Clone)]
pub struct AppConfig {
    // ── KuCoin credentials ───────────────────────────────────────────
    // All three empty → unsigned requests (kline endpoint is public)
    pub api_key:        String,
    pub api_secret:     String,
    pub api_passphrase: String,

    // ── REST endpoint ────────────────────────────────────────────────
    pub rest_url: String,

    // ── Scan universe ────────────────────────────────────────────────
    pub trading_pairs: Vec<String>,

    // ── Candle request ───────────────────────────────────────────────
    /// Bar size in minutes (KuCoin Futures granularity)
    pub granularity_mins: u32,
    /// Number of candles fetched per pair per cycle
    pub candle_window: u32,

    // ── Breakout rule ────────────────────────────────────────────────
    pub atr_period:     usize,
    pub atr_multiplier: f64,

    // ── Brackets ─────────────────────────────────────────────────────
    pub bracket_band: f64,
    pub bracket_mode: BracketMode,

    // ── Polling ──────────────────────────────────────────────────────
    pub poll_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables (after dotenv).
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // ignore missing .env

        let api_key        = env::var("KUCOIN_API_KEY").unwrap_or_default();
        let api_secret     = env::var("KUCOIN_API_SECRET").unwrap_or_default();
        let api_passphrase = env::var("KUCOIN_API_PASSPHRASE").unwrap_or_default();

        let rest_url = env::var("KUCOIN_FUTURES_REST_URL")
            .unwrap_or_else(|_| "https://api-futures.kucoin.com".into());

        let trading_pairs: Vec<String> = env::var("TRADING_PAIRS")
            .unwrap_or_else(|_| "XBTUSDTM,ETHUSDTM,LTCUSDTM,DOGEUSDTM".into())
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();

        let bracket_mode: BracketMode = env::var("BRACKET_MODE")
            .unwrap_or_else(|_| "inverted".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("Config key BRACKET_MODE: {e}"))?;

        Ok(Self {
            api_key,
            api_secret,
            api_passphrase,
            rest_url,
            trading_pairs,

            granularity_mins: parse_env("KLINE_GRANULARITY", 1u32)?,
            candle_window:    parse_env("CANDLE_WINDOW", DEFAULT_CANDLE_WINDOW)?,

            atr_period:     parse_env("ATR_PERIOD", DEFAULT_ATR_PERIOD)?,
            atr_multiplier: parse_env("ATR_MULTIPLIER", DEFAULT_ATR_MULTIPLIER)?,

            bracket_band: parse_env("BRACKET_BAND", DEFAULT_BRACKET_BAND)?,
            bracket_mode,

            poll_secs: parse_env("POLL_SECS", 60u64)?,
        })
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr + Copy,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(v) => v
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Config key {key}: {e}")),
        Err(_) => Ok(default),
    }
}
