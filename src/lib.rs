//! iam-actions: IAM action catalog scraper
//!
//! Pipeline:
//! - index: list services from the reference index page
//! - extract: turn each service page into its action table
//! - scrape: fan out over services with a bounded worker pool
//! - writer: persist the key-sorted catalog
//! - lookup: resolve qualified action names and wildcards over a catalog

pub mod catalog;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod index;
pub mod lookup;
pub mod scrape;
pub mod writer;

pub use catalog::{ActionRecord, Catalog, LinkRef, ServiceCatalog};
pub use config::ScrapeConfig;
pub use error::FetchError;
pub use extract::{parse_service_page, ServicePage, TablePolicy};
pub use lookup::ActionIndex;
pub use scrape::{scrape_catalog, ScrapeReport};
pub use writer::{read_catalog, write_catalog};
