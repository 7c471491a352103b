//! quill - single-author blog engine
//!
//! Serves the blog over HTTP: create/edit workflows behind a password
//! gate, public listing and full-text search, Markdown detail views with
//! embedded-media expansion.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;

use quill_core::SiteConfig;
use quill_server::db;
use quill_server::{run_server, AppState, ServerConfig};

mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "quill",
    author,
    version,
    about = "Single-author blog engine with drafts, full-text search, and Markdown rendering"
)]
struct Cli {
    /// Address to bind to
    #[arg(long, short = 'b', default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// SQLite database location
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://quill.db")]
    database_url: String,

    /// Password gating all write workflows
    #[arg(long, env = "QUILL_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: String,

    /// Secret for session cookie signing
    #[arg(long, env = "QUILL_SECRET_KEY", hide_env_values = true)]
    secret_key: String,

    /// Maximum pixel width for rendered embeds
    #[arg(long, env = "QUILL_SITE_WIDTH", default_value_t = 800)]
    site_width: u32,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap resolves env-backed arguments.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    tracing_setup::init(cli.debug)?;

    let pool = db::create_pool(&cli.database_url)
        .await
        .context("Failed to create database pool")?;
    db::migrations::run(&pool)
        .await
        .context("Failed to run migrations")?;

    let site = SiteConfig::new(cli.admin_password, cli.secret_key, cli.site_width);
    let state = AppState::new(pool, site);

    tracing::info!("Starting quill on {}", cli.bind);
    run_server(state, ServerConfig { bind_addr: cli.bind })
        .await
        .context("Server error")?;

    Ok(())
}
