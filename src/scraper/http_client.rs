use crate::config::ScraperConfig;
use crate::error::{ExplorerError, Result};
use std::time::Duration;
use tracing::debug;

/// Blocking-per-interaction page fetcher. One attempt per request; any
/// failure goes straight back to the caller.
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .build()
            .map_err(|source| ExplorerError::Network {
                url: config.base_url.clone(),
                source,
            })?;

        Ok(Self { inner })
    }

    /// Fetch a URL as text.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);

        let network = |source| ExplorerError::Network {
            url: url.to_string(),
            source,
        };

        let resp = self.inner.get(url).send().await.map_err(network)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ExplorerError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let text = resp.text().await.map_err(network)?;
        debug!("GET {} → {} bytes", url, text.len());
        Ok(text)
    }
}
