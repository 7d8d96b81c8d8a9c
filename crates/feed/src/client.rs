use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Proxy};

use crate::models::ParsedFeed;
use crate::parser::parse_feed;
use crate::{FeedError, Result};

/// Something that can fetch and parse a feed by URL.
///
/// The orchestration layer depends on this trait rather than on
/// [`FeedClient`] directly so tests can substitute a stub.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ParsedFeed>;
}

/// HTTP feed fetcher with an optional proxy and direct-connection fallback.
///
/// When a proxy is configured, each fetch is attempted through it first; if
/// that attempt fails for any reason, the request is retried once over a
/// direct connection before the error is surfaced. Every request carries a
/// total timeout so a slow origin cannot stall a scan indefinitely.
pub struct FeedClient {
    direct: Client,
    proxied: Option<Client>,
}

impl FeedClient {
    /// Build a client with the given per-request timeout and optional proxy URL.
    pub fn new(timeout: Duration, proxy_url: Option<&str>) -> Result<Self> {
        let direct = Client::builder().timeout(timeout).no_proxy().build()?;

        let proxied = match proxy_url {
            Some(url) if !url.is_empty() => {
                let client = Client::builder()
                    .timeout(timeout)
                    .proxy(Proxy::all(url)?)
                    .build()?;
                tracing::info!("Feed client initialized with proxy");
                Some(client)
            }
            _ => None,
        };

        Ok(Self { direct, proxied })
    }

    async fn fetch_with(&self, client: &Client, url: &str) -> Result<ParsedFeed> {
        tracing::debug!("Fetching feed from: {}", url);

        let response = client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status));
        }

        let bytes = response.bytes().await?;
        let parsed = parse_feed(&bytes)?;

        tracing::debug!("Parsed {} entries from {}", parsed.entries.len(), url);
        Ok(parsed)
    }
}

#[async_trait]
impl FeedFetcher for FeedClient {
    async fn fetch(&self, url: &str) -> Result<ParsedFeed> {
        if let Some(proxied) = &self.proxied {
            match self.fetch_with(proxied, url).await {
                Ok(parsed) => return Ok(parsed),
                Err(e) => {
                    tracing::warn!("Proxied fetch of {} failed ({}), retrying direct", url, e);
                }
            }
        }

        self.fetch_with(&self.direct, url).await
    }
}
