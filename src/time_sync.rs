use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

#[derive(Deserialize)]
struct ServerTimeEnvelope {
    code: String,
    /// Server time, milliseconds since epoch (absent on error responses)
    #[serde(default)]
    data: i64,
}

/// Local-to-exchange clock offset, estimated once at startup.
///
/// Signed KuCoin requests embed a timestamp that must be within the
/// server's tolerance window; a skewed local clock would get every
/// request rejected.
pub struct TimeSync {
    client:    Client,
    offset_ms: i64,
}

impl TimeSync {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            offset_ms: 0,
        }
    }

    /// Sync with the KuCoin server clock.
    pub async fn sync(&mut self, base_url: &str) -> Result<()> {
        let url = format!("{}/api/v1/timestamp", base_url);

        // Measure round-trip time
        let local_before = now_ms();

        let response: ServerTimeEnvelope = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .context("Failed to parse server time response")?;

        let local_after = now_ms();

        if response.code != "200000" {
            anyhow::bail!("Server time request rejected: code {}", response.code);
        }

        // Offset = server_time − estimated local time at mid round-trip
        let round_trip = local_after - local_before;
        let estimated_local = local_before + round_trip / 2;
        self.offset_ms = response.data - estimated_local;

        info!("Time sync: offset {}ms", self.offset_ms);
        Ok(())
    }

    /// Get server-synced timestamp in milliseconds.
    pub fn timestamp_ms(&self) -> i64 {
        now_ms() + self.offset_ms
    }
}

impl Default for TimeSync {
    fn default() -> Self {
        Self::new()
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_millis() as i64
}
