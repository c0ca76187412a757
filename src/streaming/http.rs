//! HTTP transport for the paginated inspection API and the static documents.

use crate::{
    core::config::{BoundaryConfig, StreamConfig},
    data::{aggregates::RegionAggregates, boundary::BoundarySet},
    streaming::loader::{Page, PageFetcher},
    Error, Result,
};
use async_trait::async_trait;
use log::debug;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Shared client for one-off document fetches. Building it once keeps the
/// connection pool and TLS setup across requests.
pub(crate) static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(concat!("inspectmap/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
});

/// Paginated response body, `{count, next, results}`
#[derive(Debug, Deserialize)]
struct PageBody {
    #[serde(default)]
    count: Option<u64>,
    #[serde(default)]
    next: Option<String>,
    #[serde(alias = "inspection_locations")]
    results: Vec<serde_json::Value>,
}

/// Fetches pages by following each response's absolute `next` URL.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
    endpoint: String,
}

impl HttpPageFetcher {
    pub fn new(config: &StreamConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.as_str());
        if config.request_timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.request_timeout_ms));
        }
        Ok(Self {
            client: builder.build()?,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, token: Option<&str>) -> Result<Page> {
        let url = token.unwrap_or(self.endpoint.as_str());
        debug!("GET {url}");
        let body: PageBody = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(Page {
            records: body.results,
            next: body.next,
            total_count: body.count,
        })
    }
}

async fn fetch_text(url: &str) -> Result<String> {
    let text = HTTP_CLIENT
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(text)
}

/// Downloads and parses the boundary geometry document.
/// Transport failures are reported as `BoundaryLoad` since they are fatal to
/// the map in the same way a malformed document is.
pub async fn fetch_boundaries(url: &str, config: &BoundaryConfig) -> Result<BoundarySet> {
    let text = fetch_text(url)
        .await
        .map_err(|e| Error::BoundaryLoad(format!("could not fetch {url}: {e}")))?;
    BoundarySet::from_json_str(&text, config)
}

/// Downloads the pre-aggregated per-region totals.
pub async fn fetch_aggregates(url: &str) -> Result<RegionAggregates> {
    let text = fetch_text(url).await?;
    RegionAggregates::from_json_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_body_shapes() {
        let body: PageBody = serde_json::from_str(
            r#"{ "count": 3, "next": "http://host/api/?page=2", "results": [{}, {}] }"#,
        )
        .unwrap();
        assert_eq!(body.count, Some(3));
        assert_eq!(body.results.len(), 2);

        let last: PageBody =
            serde_json::from_str(r#"{ "inspection_locations": [], "next": null }"#).unwrap();
        assert!(last.next.is_none());
        assert!(last.count.is_none());
    }

    #[test]
    fn test_fetcher_uses_configured_endpoint() {
        let fetcher = HttpPageFetcher::new(&StreamConfig::default()).unwrap();
        assert_eq!(fetcher.endpoint(), "http://localhost:8000/api/inspections/");
    }
}
