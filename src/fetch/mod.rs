//! Retrieval of the raw sensor payload over HTTP or from disk.

mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use tracing::debug;

pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("sensor API returned status {}: {}", status, body);
    }

    let bytes = resp.bytes().await?.to_vec();
    debug!(bytes = bytes.len(), "Sensor payload received");
    Ok(bytes)
}

/// Loads the payload from a local file path or fetches it over HTTP.
///
/// When `api_key` is set, HTTP requests carry it as a bearer token.
#[tracing::instrument(skip(api_key))]
pub async fn load_source(source: &str, api_key: Option<&str>) -> Result<Vec<u8>> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let client = BasicClient::new()?;
        match api_key {
            Some(key) => fetch_bytes(&auth::ApiKey::bearer(client, key.to_string()), source).await,
            None => fetch_bytes(&client, source).await,
        }
    } else {
        std::fs::read(source).with_context(|| format!("failed to read {source}"))
    }
}
