//! Catalog scrape: index discovery, bounded fan-out over service pages,
//! and the command entry point.
//!
//! Progress goes to stderr through `tracing`; stdout gets one compact JSON
//! summary line.

use crate::catalog::{service_key, Catalog, ServiceCatalog};
use crate::config::ScrapeConfig;
use crate::extract::{extract_service, ServicePage};
use crate::fetch::Fetcher;
use crate::index::{discover_services, ServiceLink};
use crate::lookup::ActionIndex;
use crate::writer::{output_path, write_catalog, DEFAULT_OUTPUT_FILE, OUTPUT_DIR};
use anyhow::{Context, Result};
use clap::Args;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Args, Debug)]
pub struct ScrapeArgs {
    /// Output file name, written inside ./snippets/
    #[arg(long = "output", value_name = "FILE", default_value = DEFAULT_OUTPUT_FILE)]
    pub output_file: PathBuf,

    /// Test mode: only scrape the first N services
    #[arg(long = "test", value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub limit: Option<u32>,

    /// Number of concurrent workers
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: u16,
}

/// Outcome of scraping one service
#[derive(Debug)]
pub enum ServiceOutcome {
    Catalogued { key: String, catalog: ServiceCatalog },
    /// Page fetched (or failed to) without yielding any action
    NoActions,
}

/// Aggregated result of a scrape
#[derive(Debug, Default)]
pub struct ScrapeReport {
    pub catalog: Catalog,
    /// Services that produced no actions, including failed fetches
    pub skipped: usize,
    /// Tasks that panicked
    pub failed: usize,
}

/// Summary printed to stdout once the catalog is saved
#[derive(Debug, Serialize)]
pub struct ScrapeOutput {
    pub file: String,
    pub services: usize,
    pub actions: usize,
    pub prefixes: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Run the scrape command
pub async fn run_scrape(args: ScrapeArgs) -> Result<()> {
    let mut config = ScrapeConfig::from_env()?;
    config.workers = usize::from(args.workers);
    config.limit = args.limit.map(|n| n as usize);

    let path = output_path(Path::new(OUTPUT_DIR), &args.output_file);

    let report = scrape_catalog(&config).await?;

    tracing::info!(path = %path.display(), "saving actions");
    if let Err(e) = write_catalog(&report.catalog, &path) {
        tracing::error!(error = %format!("{:#}", e), "error writing catalog");
        return Err(e);
    }
    let index = ActionIndex::from_catalog(&report.catalog);
    tracing::info!(
        services = report.catalog.len(),
        actions = index.len(),
        prefixes = index.prefix_count(),
        skipped = report.skipped,
        failed = report.failed,
        "file saved successfully"
    );

    let output = ScrapeOutput {
        file: path.display().to_string(),
        services: report.catalog.len(),
        actions: index.len(),
        prefixes: index.prefix_count(),
        skipped: report.skipped,
        failed: report.failed,
    };
    println!("{}", serde_json::to_string(&output)?);

    Ok(())
}

/// Discover all services and scrape them into one catalog.
///
/// Only a failure to fetch the index page is an error; individual services
/// that fail are logged and left out.
pub async fn scrape_catalog(config: &ScrapeConfig) -> Result<ScrapeReport> {
    let fetcher = Fetcher::new(&config.user_agent)?;

    let mut services = discover_services(&fetcher, config)
        .await
        .context("Failed to fetch services index")?;
    tracing::info!(count = services.len(), "discovered services");

    // A zero limit means "no limit", never an empty catalog
    if let Some(limit) = config.limit.filter(|&n| n > 0) {
        services.truncate(limit);
    }

    Ok(scrape_services(&fetcher, config, services).await)
}

/// Scrape `services` with at most `config.workers` in flight.
///
/// Results are collected one at a time here as tasks finish; completion
/// order does not matter since the catalog is keyed and sorted.
pub async fn scrape_services(
    fetcher: &Fetcher,
    config: &ScrapeConfig,
    services: Vec<ServiceLink>,
) -> ScrapeReport {
    let fetcher = fetcher.clone();
    let config = config.clone();
    fan_out(services, config.workers, move |link| {
        let fetcher = fetcher.clone();
        let config = config.clone();
        async move { scrape_service(&fetcher, &config, &link).await }
    })
    .await
}

/// Run `step` for every service on its own task, `workers` at a time,
/// folding outcomes into a report as they complete. A task that panics is
/// logged and counted without affecting the others.
pub(crate) async fn fan_out<F, Fut>(
    services: Vec<ServiceLink>,
    workers: usize,
    step: F,
) -> ScrapeReport
where
    F: Fn(ServiceLink) -> Fut,
    Fut: Future<Output = ServiceOutcome> + Send + 'static,
{
    let mut results = stream::iter(services)
        .map(|link| {
            let name = link.name.clone();
            let handle = tokio::spawn(step(link));
            async move { (name, handle.await) }
        })
        .buffer_unordered(workers.max(1));

    let mut report = ScrapeReport::default();
    while let Some((name, joined)) = results.next().await {
        match joined {
            Ok(ServiceOutcome::Catalogued { key, catalog }) => {
                report.catalog.insert(key, catalog);
            }
            Ok(ServiceOutcome::NoActions) => {
                report.skipped += 1;
            }
            Err(e) => {
                tracing::error!(service = %name, error = %e, "service task failed");
                report.failed += 1;
            }
        }
    }

    report
}

/// Scrape one service page into a catalog entry
pub async fn scrape_service(
    fetcher: &Fetcher,
    config: &ScrapeConfig,
    link: &ServiceLink,
) -> ServiceOutcome {
    let key = Url::parse(&link.url)
        .map(|url| service_key(&url))
        .unwrap_or_else(|_| link.name.clone());

    tracing::info!(service = %link.name, key = %key, "scraping service");

    let page = match extract_service(
        fetcher,
        &link.url,
        config.policy,
        &config.table_id_prefix,
    )
    .await
    {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!(
                url = e.url().unwrap_or(&link.url),
                error = %e,
                "error scraping service page"
            );
            tracing::info!(service = %link.name, "no valid actions found");
            return ServiceOutcome::NoActions;
        }
    };

    match into_service_catalog(page, &link.name) {
        Some(catalog) => ServiceOutcome::Catalogued { key, catalog },
        None => {
            tracing::info!(service = %link.name, "no valid actions found");
            ServiceOutcome::NoActions
        }
    }
}

/// Build the catalog entry, or `None` when the page has no actions.
/// The index link text stands in for a missing page heading.
fn into_service_catalog(page: ServicePage, fallback_name: &str) -> Option<ServiceCatalog> {
    if page.actions.is_empty() {
        return None;
    }

    Some(ServiceCatalog {
        service_name: page
            .service_name
            .unwrap_or_else(|| fallback_name.to_string()),
        service_prefix: page.prefix,
        actions: page.actions,
        reference_url: page.url.into(),
    })
}
