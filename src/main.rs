//! Astra - a starboard Discord bot.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `database` - SQLite guild store (sqlx)
//! - `cache` - In-memory guild configuration cache
//! - `bot` - Lifecycle coordination and prefix resolution
//! - `gateway` - Discord gateway adapter (serenity)

mod bot;
mod cache;
mod config;
mod database;
mod gateway;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use bot::AstraBot;
use config::Config;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // Initialize logging with sensible defaults
    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("astra=info,serenity=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Astra bot...");

    let config = Config::from_env();
    info!("Configuration loaded successfully");

    let bot = Arc::new(AstraBot::new(&config.database_url));

    gateway::run(bot, &config).await
}
