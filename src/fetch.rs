//! Page fetcher: one GET per call, no retries
//!
//! Returns the raw body alongside the URL it was requested from. Parsing
//! happens synchronously on the caller's side so that `scraper::Html`
//! (which is not `Send`) never lives across an await point.

use crate::error::FetchError;
use scraper::Html;
use url::Url;

/// Shared HTTP client for the documentation site
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL the page was requested from; relative links resolve against it
    pub url: Url,
    pub body: String,
}

impl FetchedPage {
    /// Parse the body into a document tree
    pub fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

impl Fetcher {
    pub fn new(user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    /// GET `url`, failing on transport errors and non-2xx statuses
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let response = self
            .client
            .get(parsed.clone())
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;

        tracing::debug!(url, bytes = body.len(), "fetched page");

        Ok(FetchedPage { url: parsed, body })
    }
}
