//! Command-line interface for bakery-publish.
//!
//! - `publish` pushes a jurisdiction's baked result files to its results repository.
//! - `list` shows which files a publish run would pick up, without touching the remote.
//!
//! [`run`] is the async entrypoint shared by `main` and the integration tests.

use crate::contract::Publisher;
use crate::github::GitHubHost;
use crate::hooks::PublishHooks;
use crate::load_config::{load_config, require_credentials};
use crate::locate::{FileLocator, FileQuery};
use crate::publish::RemotePublisher;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// CLI for bakery-publish: publish baked election results to GitHub.
#[derive(Parser)]
#[clap(
    name = "bakery-publish",
    version,
    about = "Publish baked election result files to per-jurisdiction GitHub repositories"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish result files for a jurisdiction and merge them into the public branch
    Publish {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        #[clap(flatten)]
        filters: Filters,
    },
    /// List the result files a publish run would pick up
    List {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        #[clap(flatten)]
        filters: Filters,
        /// Search this directory instead of <country_dir>/bakery
        #[clap(long)]
        search_dir: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct Filters {
    /// Jurisdiction code, e.g. ny
    #[clap(long, short = 'j')]
    pub jurisdiction: String,
    /// Prefix of a YYYYMMDD date, e.g. 2014 or 201411
    #[clap(long)]
    pub date: Option<String>,
    /// Select raw result files instead of cleaned ones
    #[clap(long)]
    pub raw: bool,
}

impl Filters {
    fn into_query(self) -> FileQuery {
        FileQuery {
            jurisdiction: self.jurisdiction,
            date_filter: self.date,
            raw: self.raw,
            search_dir: None,
        }
    }
}

fn logging_hooks() -> PublishHooks {
    PublishHooks::new()
        .on_pre_publish(|event| {
            tracing::info!(publisher = event.publisher, file = %event.filename.display(), "pre_publish");
            Ok(())
        })
        .on_post_publish(|event| {
            tracing::info!(publisher = event.publisher, file = %event.filename.display(), "post_publish");
            Ok(())
        })
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::List {
            config,
            filters,
            search_dir,
        } => {
            let config = load_config(config)?;
            let locator = FileLocator::new(&config.country_dir);
            let mut query = filters.into_query();
            query.search_dir = search_dir;

            let filenames = locator.get_filenames(&query);
            tracing::info!(command = "list", count = filenames.len(), "Listed result files");
            for filename in filenames {
                println!("{}", filename.display());
            }
            Ok(())
        }
        Commands::Publish { config, filters } => {
            let config = load_config(config)?;
            let credentials = require_credentials(&config)?;
            let host = GitHubHost::new(&config.remote.api_url)
                .context("Failed to construct GitHub client")?;
            let publisher = RemotePublisher::new(
                host,
                credentials,
                FileLocator::new(&config.country_dir),
                config.remote.clone(),
            );

            let query = filters.into_query();
            tracing::info!(command = "publish", jurisdiction = %query.jurisdiction, "Starting publish");
            match publisher.publish(&query, &logging_hooks()).await {
                Ok(report) => {
                    tracing::info!(command = "publish", ?report, "Publish complete");
                    println!("Published {} file(s) to {}", report.files.len(), report.repository);
                    for file in &report.files {
                        println!("  {:?} {}", file.action, file.remote_path);
                    }
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "publish", error = %e, "Publish failed");
                    Err(anyhow::Error::new(e))
                }
            }
        }
    }
}
