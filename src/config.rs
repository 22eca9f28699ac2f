use anyhow::{Context, Result};
use std::path::PathBuf;

const DEFAULT_CATALOG_PATH: &str = "data/songs.csv";

/// Configuration loaded from environment variables
#[derive(Debug)]
pub struct Config {
    pub catalog_path: PathBuf,
    pub seed: Option<u64>,
    pub engine_config_path: Option<PathBuf>,
}

/// Load configuration from `.env` and environment
pub fn load_config() -> Result<Config> {
    // Load `.env` file if present
    dotenv::dotenv().ok();

    let catalog_path = std::env::var("KARAOKE_CATALOG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CATALOG_PATH));

    let seed = match std::env::var("KARAOKE_SEED") {
        Ok(raw) => Some(
            raw.trim()
                .parse::<u64>()
                .with_context(|| format!("KARAOKE_SEED must be an unsigned integer, got '{raw}'"))?,
        ),
        Err(_) => None,
    };

    let engine_config_path = std::env::var("KARAOKE_ENGINE_CONFIG")
        .ok()
        .map(PathBuf::from);

    Ok(Config {
        catalog_path,
        seed,
        engine_config_path,
    })
}
