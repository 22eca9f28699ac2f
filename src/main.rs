use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;

use crate::config::load_config;
use karaoke_recommender::models::RecommendationRequest;
use karaoke_recommender::{
    CatalogHolder, EngineConfig, ErrorResponse, KaraokeError, RecommendationEngine, SongCatalog,
};

#[derive(Parser)]
#[command(name = "karaoke-recommender")]
#[command(about = "Recommend karaoke songs and singers for a group")]
#[command(version)]
struct Args {
    /// Path to the song catalog CSV (overrides KARAOKE_CATALOG_PATH)
    #[arg(short = 'c', long = "catalog")]
    catalog: Option<PathBuf>,

    /// Path to the request JSON file, or '-' to read stdin
    #[arg(short = 'r', long = "request", default_value = "-")]
    request: String,

    /// Build a setlist with this many songs instead of a single recommendation
    #[arg(short = 's', long = "setlist")]
    setlist: Option<usize>,

    /// Fixed RNG seed for reproducible results (overrides KARAOKE_SEED)
    #[arg(long = "seed")]
    seed: Option<u64>,

    /// Path to an engine configuration JSON file (overrides KARAOKE_ENGINE_CONFIG)
    #[arg(short = 'e', long = "engine-config")]
    engine_config: Option<PathBuf>,

    /// Enable debug mode - pretty-print output and show catalog diagnostics
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Quiet mode - reduce log verbosity
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

fn init_tracing(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_request(source: &str) -> Result<RecommendationRequest> {
    let content = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read request file '{source}'"))?
    };
    serde_json::from_str(&content).context("Request is not valid JSON")
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}

/// Print the boundary error record and turn it into the process error
fn report(err: KaraokeError, pretty: bool) -> anyhow::Error {
    if let Err(print_err) = print_json(&ErrorResponse::from(&err), pretty) {
        tracing::error!("Failed to print error response: {print_err}");
    }
    if !err.is_user_error() {
        tracing::error!("Internal failure: {err:?}");
    }
    anyhow::Error::new(err)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.quiet);

    // Load configuration from .env, command-line flags take precedence
    let env_config = load_config()?;
    let catalog_path = args.catalog.unwrap_or(env_config.catalog_path);

    let mut engine_config = match args.engine_config.or(env_config.engine_config_path) {
        Some(path) => EngineConfig::load_from_file(&path)
            .map_err(|e| report(e, args.debug))
            .with_context(|| format!("Failed to load engine config '{}'", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = args.seed.or(env_config.seed) {
        engine_config.seed = Some(seed);
    }

    let catalog = SongCatalog::from_csv_path(&catalog_path)
        .map_err(|e| report(e, args.debug))
        .with_context(|| format!("Failed to load catalog '{}'", catalog_path.display()))?;

    if args.debug {
        eprintln!("Catalog: {} songs", catalog.len());
        eprintln!("Decades: {}", catalog.decades().join(", "));
        for (tag, count) in catalog.tag_counts() {
            eprintln!("   mood '{tag}': {count}");
        }
    }

    let holder = CatalogHolder::new(catalog);
    let engine = RecommendationEngine::new(holder.current(), engine_config)
        .map_err(|e| report(e, args.debug))?;

    let request = read_request(&args.request)?;

    match args.setlist {
        Some(num_songs) => {
            let setlist = engine
                .create_setlist(&request, Some(num_songs))
                .map_err(|e| report(e, args.debug))?;

            if args.debug {
                let metadata = &setlist.metadata;
                eprintln!(
                    "Setlist: {} songs | Avg score: {:.1}",
                    metadata.total_songs, metadata.average_score
                );
                for (decade, count) in &metadata.decade_distribution {
                    eprintln!("   {decade}: {count}");
                }
                for (singer, count) in &metadata.songs_per_singer {
                    eprintln!("   {singer} sings {count}");
                }
            }
            print_json(&setlist.entries, args.debug)?;
        }
        None => {
            let response = engine
                .recommend(&request)
                .map_err(|e| report(e, args.debug))?;
            print_json(&response, args.debug)?;
        }
    }

    Ok(())
}
