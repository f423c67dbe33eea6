//! HTTP client for the three remote endpoints: the performance index, the
//! per-performance detail page, and the seat-availability endpoint.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::parser::availability::SeatTypeRaw;

/// One entry of the remote performance index.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntryRaw {
    pub id: u32,
    /// Proprietary embedded-timestamp string, `/Date(<epoch-millis>)/`.
    pub start_time: String,
}

pub struct TicketApi {
    client: reqwest::Client,
    index_url: String,
    detail_url: String,
    availability_url: String,
}

impl TicketApi {
    pub fn new(cfg: &Config) -> Result<TicketApi> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("stardream-weekly/0.1")
            .build()?;
        Ok(TicketApi {
            client,
            index_url: cfg.index_url.clone(),
            detail_url: cfg.detail_url.clone(),
            availability_url: cfg.availability_url.clone(),
        })
    }

    /// Fetch the full upcoming-performance index.
    pub async fn fetch_index(&self) -> Result<Vec<IndexEntryRaw>> {
        debug!("GET {}", self.index_url);
        let entries = self
            .client
            .get(&self.index_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(entries)
    }

    /// Fetch the raw HTML of one performance's detail page.
    pub async fn fetch_detail(&self, id: u32) -> Result<String> {
        let url = format!("{}?id={id}", self.detail_url);
        debug!("GET {url}");
        let html = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(html)
    }

    /// Fetch the seat-type records for one performance.
    pub async fn fetch_availability(&self, id: u32) -> Result<Vec<SeatTypeRaw>> {
        let url = format!("{}?performanceId={id}", self.availability_url);
        debug!("GET {url}");
        let seats = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(seats)
    }
}
