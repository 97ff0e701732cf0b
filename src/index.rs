//! Services index: the listing page linking every service's reference page

use crate::config::ScrapeConfig;
use crate::error::FetchError;
use crate::fetch::Fetcher;
use scraper::{Html, Selector};
use url::Url;

/// Links live in the "highlights" list of the index page
const SERVICE_LINKS: &str = "div.highlights li a";

/// A service as listed on the index page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceLink {
    /// Link text, used as display name when the service page has none
    pub name: String,
    pub url: String,
}

/// Fetch the index page and list the services it links to
pub async fn discover_services(
    fetcher: &Fetcher,
    config: &ScrapeConfig,
) -> Result<Vec<ServiceLink>, FetchError> {
    let index_url = config
        .index_url()
        .map_err(|source| FetchError::InvalidUrl {
            url: format!("{}{}", config.base_url, config.services_page),
            source,
        })?;

    let page = fetcher.fetch(index_url.as_str()).await?;
    let doc = page.document();
    Ok(links_from_document(&doc, &page.url))
}

/// Extract `(link text, absolute URL)` pairs in document order.
///
/// A page without the links container yields an empty list. Links are not
/// deduplicated.
pub fn parse_index(html: &str, page_url: &Url) -> Vec<ServiceLink> {
    links_from_document(&Html::parse_document(html), page_url)
}

fn links_from_document(doc: &Html, page_url: &Url) -> Vec<ServiceLink> {
    let Ok(links) = Selector::parse(SERVICE_LINKS) else {
        return Vec::new();
    };

    doc.select(&links)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let url = page_url.join(href).ok()?;
            Some(ServiceLink {
                name: a.text().collect::<String>().trim().to_string(),
                url: url.into(),
            })
        })
        .collect()
}
