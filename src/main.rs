//! playstats - listening-history statistics with catalog genre lookups
//!
//! Runs either as the genre resolver service or as a one-shot report over a
//! history CSV export.

mod api;
mod config;
mod core;
mod db;
mod models;
mod plugins;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{Paths, UserConfig, DEFAULT_PORT, DEFAULT_TOP_N};
use crate::core::aggregator::summarize;
use crate::core::GenreResolver;
use crate::db::DbEngine;
use crate::plugins::RemoteGenreService;

/// playstats - listening statistics and artist genres
#[derive(Parser, Debug)]
#[command(name = "playstats")]
#[command(version)]
#[command(about = "Listening-history statistics with artist genre lookups")]
struct Args {
    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Enable debug mode
    #[arg(long)]
    debug: bool,

    /// Path to config directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print statistics for a history CSV instead of serving
    #[arg(long, value_name = "FILE")]
    stats: Option<PathBuf>,

    /// Resolve genres through a running service instead of the catalog
    #[arg(long, value_name = "URL", requires = "stats")]
    genre_service: Option<String>,

    /// Print the report as JSON
    #[arg(long, requires = "stats")]
    json: bool,

    /// Entries per top list
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    top: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };

    // sqlx logs every statement at info
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("{},sqlx=warn", log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let paths = Paths::init(args.config.clone())?;
    info!("Config directory: {:?}", paths.config_dir());

    let config = UserConfig::load()?;

    match args.stats.as_deref() {
        Some(file) => run_report(&args, file, &config).await,
        None => start_server(args.host, args.port, &config).await,
    }
}

async fn open_resolver(config: &UserConfig) -> Result<GenreResolver> {
    let db_path = Paths::get()?.genre_db_path();
    info!("Genre cache: {:?}", db_path);
    let engine = DbEngine::open(&db_path).await?;
    GenreResolver::from_config(config, engine)
}

async fn run_report(args: &Args, file: &Path, config: &UserConfig) -> Result<()> {
    let input = std::fs::File::open(file)
        .with_context(|| format!("Failed to open history file {}", file.display()))?;
    let input = std::io::BufReader::new(input);

    let summary = match &args.genre_service {
        Some(url) => {
            info!("Using genre service at {}", url);
            let remote = RemoteGenreService::new(url, config.request_timeout())?;
            summarize(input, &remote, config.max_concurrent_lookups, args.top).await
        }
        None => {
            let resolver = open_resolver(config).await?;
            let summary = summarize(input, &resolver, resolver.max_concurrent(), args.top).await;
            resolver.cache().close().await;
            summary
        }
    }
    .with_context(|| format!("Failed to read history file {}", file.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary);
    }

    Ok(())
}

async fn start_server(host: String, port: u16, config: &UserConfig) -> Result<()> {
    use actix_cors::Cors;
    use actix_web::{middleware, web, App, HttpServer};

    let resolver = web::Data::new(open_resolver(config).await?);
    match resolver.cache().count().await {
        Ok(count) => info!("{} artists in genre cache", count),
        Err(e) => tracing::warn!("Could not count cached artists: {}", e),
    }

    let addr = format!("{}:{}", host, port);
    info!("Server listening on http://{}", addr);

    let upload_limit = config.max_upload_bytes;
    let app_resolver = resolver.clone();
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(app_resolver.clone())
            .configure(|cfg| api::configure(cfg, upload_limit))
    })
    .bind(addr)?
    .run()
    .await?;

    resolver.cache().close().await;
    Ok(())
}
