//! ptgen CLI
//!
//! Local entry point. For AWS Lambda, use `ptgen-lambda`.

use std::collections::HashMap;
use std::path::PathBuf;
#[cfg(feature = "server")]
use std::sync::Arc;

use clap::{Parser, Subcommand};
use futures::{StreamExt, stream};
use ptgen::{
    dispatch::Dispatcher,
    error::{AppError, Result},
    models::{Config, SearchOutcome},
};
use serde_json::Value;

/// ptgen - tracker description generator
#[derive(Parser, Debug)]
#[command(
    name = "ptgen",
    version,
    about = "Generate tracker-ready descriptions from catalog pages"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "storage/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate descriptions for item URLs
    Gen {
        /// Item URLs on any supported site
        urls: Vec<String>,

        /// Site name, used with --sid instead of a URL
        #[arg(long, requires = "sid")]
        site: Option<String>,

        /// Site-local item id
        #[arg(long, requires = "site")]
        sid: Option<String>,

        /// Print the full JSON body instead of the description
        #[arg(long)]
        json: bool,

        /// Generations running at once
        #[arg(long, default_value_t = 4)]
        concurrency: usize,
    },

    /// Search a source by keyword
    Search {
        query: String,

        /// douban, imdb or bangumi
        #[arg(long, default_value = "douban")]
        source: String,

        /// Print the full JSON body
        #[arg(long)]
        json: bool,
    },

    /// List supported sites
    Sites,

    /// Validate the configuration file
    Validate,

    /// Serve /api/gen over HTTP
    #[cfg(feature = "server")]
    Serve {
        /// Listen address, overrides server.bind
        #[arg(long)]
        bind: Option<String>,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config).with_env_overrides();
    log::debug!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Gen {
            urls,
            site,
            sid,
            json,
            concurrency,
        } => {
            let mut requests: Vec<HashMap<String, String>> =
                urls.iter().map(|url| params(&[("url", url.as_str())])).collect();
            if let (Some(site), Some(sid)) = (&site, &sid) {
                requests.push(params(&[("site", site.as_str()), ("sid", sid.as_str())]));
            }
            if requests.is_empty() {
                return Err(AppError::validation("give at least one URL or --site/--sid"));
            }

            let dispatcher = Dispatcher::from_config(&config).await?;
            let dispatcher = &dispatcher;
            let bodies: Vec<Value> = stream::iter(&requests)
                .map(|request| async move { dispatcher.handle(request).await.body })
                .buffered(concurrency.max(1))
                .collect()
                .await;

            let mut failed = 0;
            for (request, body) in requests.iter().zip(bodies) {
                if json {
                    println!("{}", serde_json::to_string_pretty(&body)?);
                    continue;
                }
                match body.get("format").and_then(Value::as_str) {
                    Some(text) => println!("{text}"),
                    None => {
                        failed += 1;
                        let error = body.get("error").and_then(Value::as_str).unwrap_or("");
                        log::error!("{request:?}: {error}");
                    }
                }
            }
            if failed > 0 {
                log::warn!("{failed} of {} generations failed", requests.len());
            }
        }

        Command::Search {
            query,
            source,
            json,
        } => {
            let dispatcher = Dispatcher::from_config(&config).await?;
            let body = dispatcher
                .handle(&params(&[("search", query.as_str()), ("source", source.as_str())]))
                .await
                .body;

            if json {
                println!("{}", serde_json::to_string_pretty(&body)?);
                return Ok(());
            }
            match serde_json::from_value::<SearchOutcome>(body.clone()) {
                Ok(SearchOutcome::Found { data, .. }) => {
                    for result in data {
                        println!(
                            "{}\t{}\t{}\t{}\t{}",
                            result.year, result.subtype, result.title, result.subtitle, result.link
                        );
                    }
                }
                Ok(SearchOutcome::Failed { error, .. }) => log::error!("{error}"),
                Err(_) => {
                    let error = body.get("error").and_then(Value::as_str).unwrap_or("");
                    log::error!("{error}");
                }
            }
        }

        Command::Sites => {
            let dispatcher = Dispatcher::from_config(&config).await?;
            for source in dispatcher.registry().sources() {
                let search = if source.searcher.is_some() {
                    "search"
                } else {
                    "-"
                };
                println!(
                    "{:<10} {:<7} {}",
                    source.site.as_str(),
                    search,
                    source.site.item_link("<id>")
                );
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }

        #[cfg(feature = "server")]
        Command::Serve { bind } => {
            config.validate()?;
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let dispatcher = Arc::new(Dispatcher::from_config(&config).await?);
            ptgen::server::serve(dispatcher, &bind).await?;
        }
    }

    Ok(())
}
