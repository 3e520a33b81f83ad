use crate::fetch::client::HttpClient;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that injects an API key as an HTTP header.
///
/// `header_name` is the header field to set and `key` is the raw value
/// written into it.
pub struct ApiKey<C> {
    pub inner: C,
    pub header_name: String,
    pub key: String,
}

impl<C> ApiKey<C> {
    /// Uses `Authorization: Bearer <key>`.
    pub fn bearer(inner: C, key: String) -> Self {
        Self {
            inner,
            header_name: "Authorization".to_string(),
            key: format!("Bearer {key}"),
        }
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> anyhow::Result<reqwest::Response> {
        let header_name = HeaderName::from_bytes(self.header_name.as_bytes())
            .with_context(|| format!("invalid header name '{}'", self.header_name))?;
        let value = HeaderValue::from_str(&self.key).context("API key is not a valid header value")?;
        req.headers_mut().insert(header_name, value);
        self.inner.execute(req).await
    }
}
