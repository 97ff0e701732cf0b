//! Scrape configuration
//!
//! The documentation site location is injected here rather than read from
//! globals, so tests can point the scraper at a mock server.

use crate::extract::TablePolicy;
use url::Url;

/// Documentation root of the service authorization reference
pub const DEFAULT_BASE_URL: &str =
    "https://docs.aws.amazon.com/service-authorization/latest/reference/";

/// Index page listing every IAM-capable service
pub const DEFAULT_SERVICES_PAGE: &str = "reference_policies_actions-resources-contextkeys.html";

/// Environment variable overriding [`DEFAULT_BASE_URL`]
pub const BASE_URL_ENV: &str = "IAM_DOCS_BASE_URL";

pub const DEFAULT_WORKERS: usize = 10;

/// Identifier prefix of the actions table on pages without a table container
pub const DEFAULT_TABLE_ID_PREFIX: &str = "w";

/// Configuration for a catalog scrape
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub base_url: Url,
    pub services_page: String,
    /// Size of the worker pool (at least 1)
    pub workers: usize,
    /// Only scrape the first N services from the index
    pub limit: Option<usize>,
    pub policy: TablePolicy,
    pub table_id_prefix: String,
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            services_page: DEFAULT_SERVICES_PAGE.to_string(),
            workers: DEFAULT_WORKERS,
            limit: None,
            policy: TablePolicy::Detailed,
            table_id_prefix: DEFAULT_TABLE_ID_PREFIX.to_string(),
            user_agent: format!("iam-actions/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ScrapeConfig {
    /// Default configuration with the base URL taken from
    /// `IAM_DOCS_BASE_URL` when set.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(BASE_URL_ENV) {
            config.base_url = parse_base_url(&raw)?;
        }
        Ok(config)
    }

    /// Absolute URL of the services index page
    pub fn index_url(&self) -> Result<Url, url::ParseError> {
        self.base_url.join(&self.services_page)
    }
}

/// Parse a base URL, forcing a trailing slash so relative joins stay
/// inside the documentation directory.
pub fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    let trimmed = raw.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    Url::parse(&normalized).map_err(|e| anyhow::anyhow!("Invalid {}: {} ({})", BASE_URL_ENV, raw, e))
}
