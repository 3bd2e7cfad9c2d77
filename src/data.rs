/// data.rs — Market Data via KuCoin Futures REST API
///
/// Implements the kline (candle) query against KuCoin Futures.
/// Requests are signed when credentials are configured; the kline
/// endpoint itself is public, so unsigned access also works.
///
/// KUCOIN SIGNED REQUEST FLOW:
///   1. Build request path with query string
///   2. Concatenate timestamp + method + path (server-synced clock)
///   3. Sign with HMAC-SHA256 using the API secret, base64-encode
///   4. Send KC-API-* headers (v2 scheme: the passphrase header is
///      itself HMAC-signed, not sent in plaintext)
use std::future::Future;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

use crate::models::Candle;
use crate::time_sync::TimeSync;

type HmacSha256 = Hmac<Sha256>;

/// Errors surfaced by a single candle fetch. The engine treats every
/// variant as "skip this pair this cycle" — none is fatal to the loop.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    Status(StatusCode),
    #[error("exchange rejected request: code {code} ({msg})")]
    Exchange { code: String, msg: String },
    #[error("malformed kline row at index {0}")]
    MalformedRow(usize),
}

/// Candle source abstraction. The engine is generic over this so tests
/// can substitute canned series for the network.
pub trait MarketData {
    /// Fetch up to `limit` of the most recent candles for one symbol,
    /// ordered oldest-to-newest.
    fn fetch_candles(
        &self,
        symbol: &str,
        granularity_mins: u32,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<Candle>, FetchError>> + Send;
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key:    String,
    pub api_secret: String,
    pub passphrase: String,
}

impl Credentials {
    /// `None` unless all three parts are present — credentials come from
    /// the environment, never from source.
    pub fn from_parts(api_key: &str, api_secret: &str, passphrase: &str) -> Option<Self> {
        if api_key.is_empty() || api_secret.is_empty() || passphrase.is_empty() {
            return None;
        }
        Some(Self {
            api_key:    api_key.to_owned(),
            api_secret: api_secret.to_owned(),
            passphrase: passphrase.to_owned(),
        })
    }
}

// ── Response types ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct KlineEnvelope {
    code: String,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Vec<Vec<Value>>,
}

// ── KuCoin Futures client ─────────────────────────────────────────────────

pub struct KucoinDataClient {
    client:      Client,
    base_url:    String,
    credentials: Option<Credentials>,
    time_sync:   TimeSync,
}

impl KucoinDataClient {
    pub fn new(base_url: &str, credentials: Option<Credentials>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("HTTP client build failed");
        Self {
            client,
            base_url: base_url.to_owned(),
            credentials,
            time_sync: TimeSync::new(),
        }
    }

    /// Sync the signing clock with the KuCoin server.
    pub async fn sync_time(&mut self) -> anyhow::Result<()> {
        self.time_sync.sync(&self.base_url).await
    }

    /// Sign a payload with HMAC-SHA256, base64-encoded.
    fn sign(secret: &str, payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC key error");
        mac.update(payload.as_bytes());
        BASE64.encode(mac.finalize().into_bytes())
    }
}

impl MarketData for KucoinDataClient {
    async fn fetch_candles(
        &self,
        symbol: &str,
        granularity_mins: u32,
        limit: u32,
    ) -> Result<Vec<Candle>, FetchError> {
        let to = self.time_sync.timestamp_ms();
        let from = to - i64::from(granularity_mins) * 60_000 * i64::from(limit);
        let path = format!(
            "/api/v1/kline/query?symbol={symbol}&granularity={granularity_mins}&from={from}&to={to}"
        );
        let url = format!("{}{}", self.base_url, path);

        let mut request = self.client.get(&url);
        if let Some(creds) = &self.credentials {
            let ts = self.time_sync.timestamp_ms().to_string();
            let signature = Self::sign(&creds.api_secret, &format!("{ts}GET{path}"));
            let passphrase = Self::sign(&creds.api_secret, &creds.passphrase);
            request = request
                .header("KC-API-KEY", &creds.api_key)
                .header("KC-API-SIGN", signature)
                .header("KC-API-TIMESTAMP", ts)
                .header("KC-API-PASSPHRASE", passphrase)
                .header("KC-API-KEY-VERSION", "2");
        }

        let response = request.send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status));
        }

        let envelope: KlineEnvelope = response.json().await?;
        if envelope.code != "200000" {
            return Err(FetchError::Exchange {
                code: envelope.code,
                msg:  envelope.msg.unwrap_or_default(),
            });
        }

        let mut candles = envelope
            .data
            .iter()
            .enumerate()
            .map(|(i, row)| parse_row(i, row))
            .collect::<Result<Vec<_>, _>>()?;

        // Oldest-to-newest, capped at the requested window
        candles.sort_by_key(|c| c.open_time);
        if candles.len() > limit as usize {
            candles.drain(..candles.len() - limit as usize);
        }

        debug!("Fetched {} candles for {}", candles.len(), symbol);
        Ok(candles)
    }
}

/// Rows arrive as `[time, open, high, low, close, volume]`. Numeric
/// fields show up as JSON numbers or as numeric strings depending on
/// endpoint version, so both are accepted.
fn parse_row(index: usize, row: &[Value]) -> Result<Candle, FetchError> {
    if row.len() < 6 {
        return Err(FetchError::MalformedRow(index));
    }
    let field = |i: usize| num_field(&row[i]).ok_or(FetchError::MalformedRow(index));
    Ok(Candle {
        open_time: field(0)? as i64,
        open:      field(1)?,
        high:      field(2)?,
        low:       field(3)?,
        close:     field(4)?,
        volume:    field(5)?,
    })
}

fn num_field(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_numeric_row() {
        let row = vec![
            json!(1700000000000i64),
            json!(100.5),
            json!(101.0),
            json!(99.5),
            json!(100.0),
            json!(42.0),
        ];
        let candle = parse_row(0, &row).unwrap();
        assert_eq!(candle.open_time, 1700000000000);
        assert_eq!(candle.high, 101.0);
        assert_eq!(candle.volume, 42.0);
    }

    #[test]
    fn parse_string_price_row() {
        let row = vec![
            json!(1700000000000i64),
            json!("100.5"),
            json!("101.0"),
            json!("99.5"),
            json!("100.0"),
            json!("42.0"),
        ];
        let candle = parse_row(3, &row).unwrap();
        assert_eq!(candle.open, 100.5);
        assert_eq!(candle.close, 100.0);
    }

    #[test]
    fn short_row_is_malformed() {
        let row = vec![json!(1700000000000i64), json!(100.5)];
        assert!(matches!(parse_row(7, &row), Err(FetchError::MalformedRow(7))));
    }

    #[test]
    fn non_numeric_field_is_malformed() {
        let row = vec![
            json!(1700000000000i64),
            json!("not a price"),
            json!(101.0),
            json!(99.5),
            json!(100.0),
            json!(42.0),
        ];
        assert!(matches!(parse_row(0, &row), Err(FetchError::MalformedRow(0))));
    }

    #[test]
    fn envelope_with_error_code() {
        let raw = r#"{"code":"400100","msg":"Invalid symbol"}"#;
        let envelope: KlineEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.code, "400100");
        assert_eq!(envelope.msg.as_deref(), Some("Invalid symbol"));
        assert!(envelope.data.is_empty());
    }

    #[test]
    fn envelope_with_rows() {
        let raw = r#"{"code":"200000","data":[[1700000000000,100,101,99,100.5,12]]}"#;
        let envelope: KlineEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.data.len(), 1);
        let candle = parse_row(0, &envelope.data[0]).unwrap();
        assert_eq!(candle.close, 100.5);
    }

    #[test]
    fn signature_is_base64_and_deterministic() {
        let a = KucoinDataClient::sign("secret", "1700000000000GET/api/v1/kline/query");
        let b = KucoinDataClient::sign("secret", "1700000000000GET/api/v1/kline/query");
        let c = KucoinDataClient::sign("secret", "1700000000001GET/api/v1/kline/query");
        assert_eq!(a, b);
        assert_ne!(a, c);
        // HMAC-SHA256 digest is 32 bytes → 44 base64 chars
        assert_eq!(a.len(), 44);
    }
}
