//! The external extraction contract and its HTTP adapter.
//!
//! The extraction service owns all browser/DOM mechanics; this side only
//! asks it for the raw candidate listings of one (location, business type)
//! query. Failures are returned to the caller untouched — the orchestrator
//! treats them as job-fatal, so there is no retry policy here.

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Client;

use leadscout_core::RawListing;

use crate::error::ExtractError;

/// External collaborator that turns a location query into raw listings.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Scrapes one location for one business type.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] on any transport, status, or decode failure.
    async fn scrape(
        &self,
        location: &str,
        business_type: &str,
    ) -> Result<Vec<RawListing>, ExtractError>;
}

/// HTTP adapter for a remote extraction service.
///
/// Expects `GET {base}/listings?location=..&business_type=..` to answer with
/// a JSON array of raw listings.
pub struct HttpExtractor {
    client: Client,
    base_url: String,
}

impl HttpExtractor {
    /// Creates an extractor client with configured timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn listings_url(&self, location: &str, business_type: &str) -> String {
        format!(
            "{}/listings?location={}&business_type={}",
            self.base_url,
            utf8_percent_encode(location, NON_ALPHANUMERIC),
            utf8_percent_encode(business_type, NON_ALPHANUMERIC),
        )
    }
}

#[async_trait]
impl Extractor for HttpExtractor {
    async fn scrape(
        &self,
        location: &str,
        business_type: &str,
    ) -> Result<Vec<RawListing>, ExtractError> {
        let url = self.listings_url(location, business_type);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<Vec<RawListing>>(&body).map_err(|e| ExtractError::Deserialize {
            context: format!("listings for \"{location}\""),
            source: e,
        })
    }
}
