//! iam-actions CLI
//!
//! Scrapes the IAM service authorization reference into
//! `snippets/iam-actions.json`.

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iam_actions::scrape::{run_scrape, ScrapeArgs};

#[derive(Parser)]
#[command(name = "iam-actions")]
#[command(version)]
#[command(about = "Scrape IAM actions from the AWS service authorization reference")]
#[command(long_about = "Scrape IAM actions from the AWS service authorization reference.\n\nWrites a key-sorted JSON catalog of every service's actions, resource types\nand condition keys to ./snippets/<FILE>.\n\nSet IAM_DOCS_BASE_URL to scrape a mirror of the documentation.")]
struct Cli {
    #[command(flatten)]
    args: ScrapeArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false),
        )
        .init();

    let cli = Cli::parse();
    run_scrape(cli.args).await
}
