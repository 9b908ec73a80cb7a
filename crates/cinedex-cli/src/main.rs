//! cinedex - terminal movie search and rating client for TMDB.

/// Application configuration (TOML).
mod config;
/// Guest session lifecycle.
mod session;
/// Terminal UI components.
mod tui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use url::Url;

use crate::config::{AppConfig, resolve_config_path};
use crate::session::{get_or_create_session, stored_session};
use cinedex_api::tmdb::{GenreMap, LocalTmdbApi, SearchMovieParams, TmdbClient, host_allowed};

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
    /// Search for movies on TMDB.
    Search(SearchArgs),
    /// List the movie genre table.
    Genres(GenresArgs),
    /// Rate a movie under the guest session.
    Rate(RateArgs),
    /// List movies rated under the guest session.
    Rated(RatedArgs),
    /// Manage the guest session.
    Session(SessionCommand),
    /// Browse movies interactively (TUI).
    Browse,
}

/// Arguments for the `search` subcommand.
#[derive(clap::Args)]
struct SearchArgs {
    /// Search query (e.g. "matrix").
    #[arg(long, required = true)]
    query: String,
    /// Result page.
    #[arg(long, default_value_t = 1)]
    page: u32,
    /// Response language (default: "en-US").
    #[arg(long, default_value = "en-US")]
    language: String,
    /// Filter by year.
    #[arg(long)]
    year: Option<u32>,
}

/// Arguments for the `genres` subcommand.
#[derive(clap::Args)]
struct GenresArgs {
    /// Response language (default: "en-US").
    #[arg(long, default_value = "en-US")]
    language: String,
}

/// Arguments for the `rate` subcommand.
#[derive(clap::Args)]
struct RateArgs {
    /// TMDB movie ID.
    #[arg(long, required = true)]
    id: u64,
    /// Rating value (0.5..=10.0 in steps of 0.5).
    #[arg(long, required = true)]
    value: f64,
}

/// Arguments for the `rated` subcommand.
#[derive(clap::Args)]
struct RatedArgs {
    /// Result page.
    #[arg(long, default_value_t = 1)]
    page: u32,
}

/// Arguments for the `session` subcommand.
#[derive(clap::Args)]
struct SessionCommand {
    /// Session subcommand to run.
    #[command(subcommand)]
    command: SessionSubcommands,
}

/// Available session subcommands.
#[derive(Subcommand)]
enum SessionSubcommands {
    /// Create (or reuse) the guest session and persist it.
    Init,
    /// Show the persisted guest session.
    Show,
}

/// Builds a `TmdbClient` from the `TMDB_API_TOKEN` environment variable.
///
/// # Errors
///
/// Returns an error if `TMDB_API_TOKEN` is not set or the client fails to build.
#[instrument(skip_all)]
fn build_tmdb_client() -> Result<TmdbClient> {
    let api_token = std::env::var("TMDB_API_TOKEN")
        .context("TMDB_API_TOKEN environment variable is required")?;

    TmdbClient::builder()
        .api_token(api_token)
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .context("failed to build TMDB client")
}

/// Fetches the genre table, falling back to an empty map on failure.
///
/// Genre lookup failure is never fatal; cards fall back to the
/// unknown-genre label.
async fn load_genres(client: &TmdbClient, language: &str) -> GenreMap {
    match client.movie_genres(language).await {
        Ok(response) => GenreMap::from(response),
        Err(err) => {
            tracing::warn!("failed to load genres: {err:#}");
            GenreMap::default()
        }
    }
}

/// Parses and allowlist-checks the poster image base URL from config.
fn resolve_poster_base(config: &AppConfig) -> Result<Url> {
    let url = Url::parse(&config.images.base_url)
        .with_context(|| format!("invalid images.base_url: {}", config.images.base_url))?;
    if !host_allowed(&url, &config.images.allowed_hosts) {
        bail!(
            "images.base_url host is not on the allowlist: {}",
            config.images.base_url
        );
    }
    Ok(url)
}

/// Runs the `search` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the search request fails.
#[instrument(skip_all)]
async fn run_search(args: &SearchArgs) -> Result<()> {
    let client = build_tmdb_client()?;

    let mut params = SearchMovieParams::new(&args.query)
        .language(&args.language)
        .page(args.page);
    if let Some(year) = args.year {
        params = params.year(year);
    }

    let response = client
        .search_movie(&params)
        .await
        .context("TMDB search/movie request failed")?;
    let genres = load_genres(&client, &args.language).await;

    tracing::info!(
        "Page {}/{} ({} results)",
        response.page,
        response.total_pages,
        response.total_results
    );
    tracing::info!("ID\tVote\tReleaseDate\tTitle\t\tGenres");
    for movie in &response.results {
        tracing::info!(
            "{}\t{:.1}\t{}\t{}\t{}",
            movie.id,
            movie.vote_average,
            movie.release_date.as_deref().unwrap_or("-"),
            movie.title,
            genres.labels(&movie.genre_ids).join(", "),
        );
    }

    Ok(())
}

/// Runs the `genres` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the request fails.
#[instrument(skip_all)]
async fn run_genres(args: &GenresArgs) -> Result<()> {
    let client = build_tmdb_client()?;

    let response = client
        .movie_genres(&args.language)
        .await
        .context("TMDB genre/movie/list request failed")?;

    tracing::info!("ID\tName");
    for genre in &response.genres {
        tracing::info!("{}\t{}", genre.id, genre.name);
    }
    tracing::info!("Total: {} genres", response.genres.len());

    Ok(())
}

/// Runs the `rate` subcommand.
///
/// # Errors
///
/// Returns an error if no guest session can be obtained or the rating
/// request fails.
#[instrument(skip_all)]
async fn run_rate(args: &RateArgs, dir: Option<&PathBuf>) -> Result<()> {
    let client = build_tmdb_client()?;
    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;

    let Some(session_id) = get_or_create_session(&client, &config_path).await? else {
        bail!("guest session unavailable; rating is disabled");
    };

    let response = client
        .rate_movie(args.id, &session_id, args.value)
        .await
        .context("TMDB rating request failed")?;

    tracing::info!(
        "Rated movie {} with {:.1}: {}",
        args.id,
        args.value,
        response.status_message
    );

    Ok(())
}

/// Runs the `rated` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the request fails
/// (a 404 for a session with no ratings is not an error).
#[instrument(skip_all)]
async fn run_rated(args: &RatedArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
    let Some(session_id) = stored_session(&config_path)? else {
        tracing::info!("No guest session. Run `cinedex session init` first.");
        return Ok(());
    };

    let client = build_tmdb_client()?;
    let response = client
        .rated_movies(&session_id, args.page)
        .await
        .context("TMDB rated movies request failed")?;

    if response.results.is_empty() {
        tracing::info!("You haven't rated any movies yet.");
        return Ok(());
    }

    tracing::info!("ID\tRating\tVote\tTitle");
    for movie in &response.results {
        tracing::info!(
            "{}\t{}\t{:.1}\t{}",
            movie.id,
            movie
                .rating
                .map_or_else(|| String::from("-"), |r| format!("{r:.1}")),
            movie.vote_average,
            movie.title,
        );
    }
    tracing::info!("Total: {} rated movies", response.total_results);

    Ok(())
}

/// Runs the `session init` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the config cannot be
/// written.
#[instrument(skip_all)]
async fn run_session_init(dir: Option<&PathBuf>) -> Result<()> {
    let client = build_tmdb_client()?;
    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;

    match get_or_create_session(&client, &config_path).await? {
        Some(session_id) => tracing::info!("Guest session: {session_id}"),
        None => tracing::warn!("Guest session unavailable; rating is disabled."),
    }

    Ok(())
}

/// Runs the `session show` subcommand.
///
/// # Errors
///
/// Returns an error if the config cannot be read.
#[instrument(skip_all)]
fn run_session_show(dir: Option<&PathBuf>) -> Result<()> {
    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;

    match stored_session(&config_path)? {
        Some(session_id) => tracing::info!("Guest session: {session_id}"),
        None => tracing::info!("No guest session. Run `cinedex session init` to create one."),
    }

    Ok(())
}

/// Runs the `browse` subcommand.
///
/// Session and genre failures are tolerated: the browser starts with
/// rating disabled or unknown-genre labels instead of refusing to run.
///
/// # Errors
///
/// Returns an error if the client fails to build, the config is invalid,
/// or the TUI fails.
#[instrument(skip_all)]
async fn run_browse(dir: Option<&PathBuf>) -> Result<()> {
    let client = Arc::new(build_tmdb_client()?);
    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
    let config = AppConfig::load(&config_path).context("failed to load config")?;
    let poster_base = resolve_poster_base(&config)?;

    let session = get_or_create_session(client.as_ref(), &config_path).await?;
    let genres = load_genres(client.as_ref(), "en-US").await;

    tui::run_browser(client, genres, session, poster_base).await
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Search(args) => run_search(&args).await,
        Commands::Genres(args) => run_genres(&args).await,
        Commands::Rate(args) => run_rate(&args, cli.dir.as_ref()).await,
        Commands::Rated(args) => run_rated(&args, cli.dir.as_ref()).await,
        Commands::Session(session) => match session.command {
            SessionSubcommands::Init => run_session_init(cli.dir.as_ref()).await,
            SessionSubcommands::Show => run_session_show(cli.dir.as_ref()),
        },
        Commands::Browse => run_browse(cli.dir.as_ref()).await,
    }
}
