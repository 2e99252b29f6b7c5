//! cinelist - browse paginated movie listings from the command line.

/// Application configuration (TOML).
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use cinelist_api::catalog::{CatalogApi, CatalogClient, Category, Movie};
use cinelist_loader::{CategoryLoader, HomeFeed, LoadMoreTrigger, LoaderSnapshot};
use clap::{Parser, Subcommand};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{AppConfig, resolve_config_path};

/// Environment variable holding the catalog API key.
const API_KEY_ENV: &str = "CINELIST_API_KEY";

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// List movies of one category, page by page.
    List(ListArgs),
    /// Show details of one movie.
    Detail(DetailArgs),
    /// Load the home feed (now playing, upcoming, top rated).
    Home,
    /// Write a default config file.
    Init(InitArgs),
}

/// Arguments for the `list` subcommand.
#[derive(clap::Args)]
struct ListArgs {
    /// Category: `now_playing`, `popular`, `top_rated` or `upcoming`.
    #[arg(long, required = true)]
    category: Category,
    /// Number of pages to load.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pages: u32,
}

/// Arguments for the `detail` subcommand.
#[derive(clap::Args)]
struct DetailArgs {
    /// Movie ID (e.g. 550).
    #[arg(long, required = true)]
    id: u64,
}

/// Arguments for the `init` subcommand.
#[derive(clap::Args)]
struct InitArgs {
    /// Overwrite an existing config file.
    #[arg(long)]
    force: bool,
}

/// Loads the config file for `dir`.
///
/// # Errors
///
/// Returns an error if the path cannot be resolved or the file is invalid.
fn load_config(dir: Option<&PathBuf>) -> Result<AppConfig> {
    let path = resolve_config_path(dir)?;
    AppConfig::load(&path)
}

/// Builds a `CatalogClient` from the config and `CINELIST_API_KEY`.
///
/// # Errors
///
/// Returns an error if no API key is configured, the base URL is invalid,
/// or the client fails to build.
#[instrument(skip_all)]
fn build_catalog_client(config: &AppConfig) -> Result<CatalogClient> {
    let Some(api_key) = config.api_key(std::env::var(API_KEY_ENV).ok()) else {
        bail!("{API_KEY_ENV} environment variable or api.api_key in config is required");
    };

    CatalogClient::builder()
        .base_url(config.api.base_url()?)
        .api_key(api_key)
        .language(&config.api.language)
        .timeout(config.api.timeout())
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .context("failed to build catalog client")
}

/// Logs one movie as a tab-separated row.
fn log_movie_row(movie: &Movie) {
    tracing::info!(
        "{}\t{}\t{}\t{:.1}",
        movie.id,
        movie.title,
        if movie.release_date.is_empty() {
            "-"
        } else {
            movie.release_date.as_str()
        },
        movie.vote_average,
    );
}

/// Fails with the loader's terminal error message, if any.
///
/// # Errors
///
/// Returns an error if the snapshot carries a terminal error.
fn ensure_loaded(snapshot: &LoaderSnapshot) -> Result<()> {
    if snapshot.has_error {
        bail!(
            "{} failed: {}",
            snapshot.category.display_name(),
            snapshot.error_message.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

/// Runs the `list` subcommand.
///
/// Loads page 1, then keeps requesting the next page whenever the last row
/// is reached, until `--pages` pages are loaded or the catalog runs out.
///
/// # Errors
///
/// Returns an error if the client fails to build or a page fails terminally.
#[instrument(skip_all, fields(category = %args.category))]
async fn run_list(args: &ListArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let client = build_catalog_client(&config)?;
    let loader = CategoryLoader::spawn(Arc::new(client), args.category, config.retry.policy());
    let mut trigger = LoadMoreTrigger::new();

    loader.load_initial().await?;
    let mut snapshot = loader.wait_until_settled().await?;
    ensure_loaded(&snapshot)?;

    while snapshot.current_page < args.pages {
        let Some(last) = snapshot.items.last() else {
            break;
        };
        if !trigger.on_item_visible(last.id, &snapshot.items) || !loader.load_more().await? {
            break;
        }
        snapshot = loader.wait_until_settled().await?;
        ensure_loaded(&snapshot)?;
    }

    tracing::info!(
        "{}: {} movies (page {}/{})",
        args.category.display_name(),
        snapshot.items.len(),
        snapshot.current_page,
        snapshot.total_pages,
    );
    tracing::info!("ID\tTitle\tReleaseDate\tRating");
    for movie in &snapshot.items {
        log_movie_row(movie);
    }

    Ok(())
}

/// Runs the `detail` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the API request fails.
#[instrument(skip_all, fields(id = args.id))]
async fn run_detail(args: &DetailArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let client = build_catalog_client(&config)?;

    let movie = client
        .fetch_detail(args.id)
        .await
        .context("catalog detail request failed")?;

    tracing::info!("ID: {}", movie.id);
    tracing::info!("Title: {}", movie.title);
    tracing::info!("Release Date: {}", movie.release_date);
    tracing::info!(
        "Rating: {:.1} ({} votes)",
        movie.vote_average,
        movie.vote_count
    );
    tracing::info!("Poster: {}", movie.poster_url().as_deref().unwrap_or("-"));
    tracing::info!(
        "Backdrop: {}",
        movie.backdrop_url().as_deref().unwrap_or("-")
    );
    tracing::info!("Overview: {}", movie.overview);

    Ok(())
}

/// Runs the `home` subcommand.
///
/// Each category is reported independently; the command fails only when
/// every category failed.
///
/// # Errors
///
/// Returns an error if the client fails to build or all categories fail.
#[instrument(skip_all)]
async fn run_home(dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let client = build_catalog_client(&config)?;
    let feed = HomeFeed::spawn(Arc::new(client), config.retry.policy());

    feed.load_all().await?;
    let snapshots = feed.wait_until_settled().await?;

    for snapshot in &snapshots {
        let name = snapshot.category.display_name();
        if let Some(message) = snapshot.error_message.as_deref() {
            tracing::warn!("{name}: {message}");
            continue;
        }
        tracing::info!(
            "{name}: {} movies (page {}/{})",
            snapshot.items.len(),
            snapshot.current_page,
            snapshot.total_pages,
        );
        for movie in snapshot.items.iter().take(5) {
            log_movie_row(movie);
        }
    }

    if snapshots.iter().all(|s| s.has_error) {
        bail!("all home categories failed to load");
    }
    Ok(())
}

/// Runs the `init` subcommand.
///
/// # Errors
///
/// Returns an error if the file exists (without `--force`) or cannot be written.
fn run_init(args: &InitArgs, dir: Option<&PathBuf>) -> Result<()> {
    let path = resolve_config_path(dir)?;
    if path.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    AppConfig::default().save(&path)?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    match cli.command {
        Commands::List(args) => run_list(&args, cli.dir.as_ref()).await,
        Commands::Detail(args) => run_detail(&args, cli.dir.as_ref()).await,
        Commands::Home => run_home(cli.dir.as_ref()).await,
        Commands::Init(args) => run_init(&args, cli.dir.as_ref()),
    }
}
