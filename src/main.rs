//! TubeLytics - concurrent YouTube search analytics
//!
//! Reads JSON client commands from stdin and answers every search with one
//! merged response enriched by sentiment, readability and word statistics.
//! The three analyses run concurrently for each search.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad arguments, config, I/O, or a one-shot search
//!       that produced no response)

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod provider;
mod session;
mod sink;

use analysis::{Analyze, Analyzers};
use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE};
use provider::{VideoProvider, YouTubeClient};
use session::{ClientCommand, Inbound, SessionRegistry};
use sink::Envelope;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration first; [general] verbose feeds the log level
    let (mut config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    init_logging(config.log_level(&args))?;

    info!("TubeLytics v{}", env!("CARGO_PKG_VERSION"));
    source.log();

    if let Err(e) = run(args, config).await {
        error!("{:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .tubelytics.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set your API key, keyword lists and timeouts.");
    Ok(())
}

/// Initialize logging based on verbosity settings. Logs go to stderr so
/// stdout carries only responses.
fn init_logging(level: tracing::Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Build the shared services and serve either one query or stdin.
async fn run(args: Args, config: Config) -> Result<()> {
    let provider: Arc<dyn VideoProvider> = Arc::new(
        YouTubeClient::new(&config.youtube).context("Failed to create YouTube client")?,
    );
    let analyzers: Arc<dyn Analyze> =
        Arc::new(Analyzers::from_config(&config.analysis).context("Failed to load analyses")?);

    match args.query {
        Some(ref query) => run_once(query, &config, provider, analyzers).await,
        None => serve(&config, provider, analyzers).await,
    }
}

/// Run a single search and print its response.
async fn run_once(
    query: &str,
    config: &Config,
    provider: Arc<dyn VideoProvider>,
    analyzers: Arc<dyn Analyze>,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut registry = SessionRegistry::new(provider, analyzers, tx, config.analysis.timeout());

    registry.route(
        &config.session.default_session,
        ClientCommand::Search {
            query: query.to_string(),
        },
    );
    registry.shutdown().await;

    let envelope = rx
        .recv()
        .await
        .with_context(|| format!("Search for '{}' produced no response", query))?;

    let output = if config.general.pretty {
        serde_json::to_string_pretty(&envelope.payload)
    } else {
        serde_json::to_string(&envelope.payload)
    }
    .context("Failed to encode response")?;

    println!("{}", output);
    Ok(())
}

/// Serve JSON-line commands from stdin until EOF.
async fn serve(
    config: &Config,
    provider: Arc<dyn VideoProvider>,
    analyzers: Arc<dyn Analyze>,
) -> Result<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_envelopes(rx));

    let mut registry = SessionRegistry::new(provider, analyzers, tx, config.analysis.timeout());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    info!("Reading commands from stdin");
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<Inbound>(line) {
            Ok(inbound) => {
                let session = inbound
                    .session
                    .as_deref()
                    .unwrap_or(&config.session.default_session);
                debug!("Routing {:?} to session '{}'", inbound.command, session);
                registry.route(session, inbound.command);
            }
            Err(e) => warn!("Ignoring invalid command: {}", e),
        }
    }

    info!("Input closed");
    registry.shutdown().await;
    writer.await.context("Output writer panicked")?
}

/// Print every envelope as one JSON line until all sessions are gone.
async fn write_envelopes(mut rx: mpsc::UnboundedReceiver<Envelope>) -> Result<()> {
    let mut stdout = tokio::io::stdout();

    while let Some(envelope) = rx.recv().await {
        let mut line = match serde_json::to_string(&envelope) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to encode payload for '{}': {}", envelope.session, e);
                continue;
            }
        };
        line.push('\n');

        stdout
            .write_all(line.as_bytes())
            .await
            .context("Failed to write to stdout")?;
        stdout.flush().await.context("Failed to flush stdout")?;
    }

    Ok(())
}

/// Where the configuration came from. Reported once logging is up.
enum ConfigSource {
    File(PathBuf),
    Defaults,
    Fallback(anyhow::Error),
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
            ConfigSource::Defaults => debug!("No config file found, using defaults"),
            ConfigSource::Fallback(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::File(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::File(PathBuf::from(CONFIG_FILE)))),
        Ok(None) => Ok((Config::default(), ConfigSource::Defaults)),
        Err(e) => Ok((Config::default(), ConfigSource::Fallback(e))),
    }
}
