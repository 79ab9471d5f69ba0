use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use playlist_sync::{
    config::Config,
    ingestor::{SourceListStore, StateStore, SyncOrchestrator, SyncScheduler},
    observability::SyncMetrics,
    proxy::FeedService,
    services::OpenAiCompletionClient,
    utils::{StandardHttpClient, url::UrlUtils},
};

#[derive(Parser)]
#[command(name = "playlist-sync")]
#[command(version)]
#[command(about = "Merge remote M3U playlists into one classified, enriched feed")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path (defaults to $PLAYLIST_SYNC_CONFIG or config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run one sync and write the resulting feed
    Sync {
        /// Source playlist URL; repeat for several. Defaults to the saved list
        #[arg(long = "source", value_name = "URL")]
        sources: Vec<String>,

        /// Write the M3U feed here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Also write the XMLTV guide here
        #[arg(short, long, value_name = "FILE")]
        guide: Option<PathBuf>,
    },
    /// Manage the saved source list
    Sources {
        #[command(subcommand)]
        action: SourcesAction,
    },
    /// Resync the saved source list periodically until interrupted
    Watch {
        /// Resync period, e.g. "30m" (defaults to sync.interval)
        #[arg(short, long, value_parser = humantime::parse_duration)]
        interval: Option<Duration>,

        /// Rewrite the M3U feed here after every sync
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Rewrite the XMLTV guide here after every sync
        #[arg(short, long, value_name = "FILE")]
        guide: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum SourcesAction {
    /// Print the saved sources
    List,
    /// Append a source URL
    Add { url: String },
    /// Remove a source URL
    Remove { url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format);

    let config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load()?,
    };
    let source_list = SourceListStore::new(config.sync.sources_file.clone());

    match cli.command {
        Command::Sources { action } => manage_sources(&source_list, action).await,
        Command::Sync {
            sources,
            output,
            guide,
        } => {
            let sources = if sources.is_empty() {
                source_list.load().await?
            } else {
                sources
            };

            let orchestrator = build_orchestrator(&config)?;
            orchestrator.sync(&sources).await?;

            let feed = FeedService::new(orchestrator.state().clone());
            publish(&feed, output.as_deref(), guide.as_deref()).await
        }
        Command::Watch {
            interval,
            output,
            guide,
        } => {
            let period = interval
                .or(config.sync.interval)
                .context("no resync interval: pass --interval or set sync.interval")?;

            let orchestrator = Arc::new(build_orchestrator(&config)?);
            let feed = FeedService::new(orchestrator.state().clone());
            let scheduler = SyncScheduler::new(orchestrator, source_list, period);

            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Failed to listen for shutdown signal: {}", e);
                    std::future::pending::<()>().await;
                }
            };

            let feed = &feed;
            let (output, guide) = (output.as_deref(), guide.as_deref());
            scheduler
                .run_until(shutdown, move |_| async move {
                    if output.is_none() && guide.is_none() {
                        return;
                    }
                    if let Err(e) = publish(feed, output, guide).await {
                        error!("Failed to write outputs: {:#}", e);
                    }
                })
                .await;
            Ok(())
        }
    }
}

fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("playlist_sync={log_level}").into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

fn build_orchestrator(config: &Config) -> Result<SyncOrchestrator> {
    let http_client = Arc::new(StandardHttpClient::new()?);

    let api_key = config.classifier.resolved_api_key();
    if api_key.is_none() {
        warn!("No classifier API key configured; every entry will be excluded if the endpoint requires one");
    }
    let completion = Arc::new(OpenAiCompletionClient::new(
        config.classifier.endpoint.clone(),
        config.classifier.model.clone(),
        api_key,
        config.classifier.timeout,
    )?);

    let metrics = SyncMetrics::init("playlist-sync");
    Ok(
        SyncOrchestrator::from_config(config, http_client, completion, StateStore::new())
            .with_metrics(metrics),
    )
}

async fn manage_sources(store: &SourceListStore, action: SourcesAction) -> Result<()> {
    match action {
        SourcesAction::List => {
            for url in store.load().await? {
                println!("{}", UrlUtils::obfuscate_credentials(&url));
            }
        }
        SourcesAction::Add { url } => {
            if store.add(&url).await? {
                info!("Added source {}", UrlUtils::obfuscate_credentials(&url));
            } else {
                info!("Source already listed");
            }
        }
        SourcesAction::Remove { url } => {
            if store.remove(&url).await? {
                info!("Removed source {}", UrlUtils::obfuscate_credentials(&url));
            } else {
                warn!("Source not listed");
            }
        }
    }
    Ok(())
}

/// Write the published snapshot; fails with "nothing available" when the
/// last sync committed no entries
async fn publish(feed: &FeedService, output: Option<&Path>, guide: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            feed.write_feed(path)
                .await
                .with_context(|| format!("Failed to write feed to {}", path.display()))?;
        }
        None => print!("{}", feed.current_feed().await?),
    }

    if let Some(path) = guide {
        feed.write_guide(path)
            .await
            .with_context(|| format!("Failed to write guide to {}", path.display()))?;
    }

    Ok(())
}
