//! # SplitBhai: Shared-Expense Ledger Backend
//!
//! ## Architecture Overview
//!
//! ```text
//!  ┌──────────────┐   POST /api/expenses          ┌──────────────────────┐
//!  │  Host UI     │ ─────────────────────────────▶│   ExpenseStore       │
//!  │              │   GET  /api/balances          │        │             │
//!  │              │ ◀─────────────────────────────│   [Balance Engine]   │
//!  │              │                               │                      │
//!  │              │   POST /api/balances/remind   │   ReminderStore      │
//!  │              │ ─────────────────────────────▶│        ▲             │
//!  └──────────────┘                               │   [Scheduler loop]   │──▶ NotificationGateway
//!         ▲                                       └──────────────────────┘          │
//!         │            WS /ws/notifications                                         │
//!         └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Environment variables are listed in [`config`].

use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod engine;
mod error;
mod events;
mod extract;
mod models;
mod notify;
mod routes;
mod state;
mod store;

use config::Config;
use state::build_state;
use store::{FileStore, KeyValueStore, MemoryStore};

// ─── Entry Point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env (optional, real env vars win) ───────────────────────────
    dotenvy::dotenv().ok();

    // ── 2. Initialise structured logging ─────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env()
            .add_directive("splitbhai=debug".parse()?)
            .add_directive("tower_http=info".parse()?))
        .init();

    info!(
        r#"

  ╔═══════════════════════════════════════════════╗
  ║        SPLITBHAI · Shared Expense Ledger      ║
  ║        Rust + Axum  ·  Settle & Remind        ║
  ╚═══════════════════════════════════════════════╝"#
    );

    // ── 3. Configuration ─────────────────────────────────────────────────────
    let config = Config::from_env()?;
    info!(
        data_dir   = %config.data_dir.display(),
        permission = ?config.notification_permission,
        provider   = %config.ai_provider,
        extraction = config.ai_api_key.is_some(),
        "📋 Config loaded"
    );

    // ── 4. Persistence (fall back to memory, never refuse to start) ──────────
    let backend: std::sync::Arc<dyn KeyValueStore> = match FileStore::open(&config.data_dir) {
        Ok(fs) => {
            info!(dir = %fs.dir().display(), "💾 File store ready");
            std::sync::Arc::new(fs)
        }
        Err(e) => {
            warn!(error = %e, "⚠️ Storage unavailable, running in memory only");
            std::sync::Arc::new(MemoryStore::new())
        }
    };

    // ── 5. Build shared state + start the reminder loop ──────────────────────
    let bind_addr = config.bind_addr;
    let interval = config.scheduler_interval;
    let state = build_state(config, backend);
    let scheduler = engine::runner::spawn(state.scheduler.clone(), interval);

    // ── 6. Build CORS layer (host UI is served from elsewhere) ───────────────
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // ── 7. Build the Axum router ─────────────────────────────────────────────
    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    info!(addr = ?bind_addr, "🚀 SplitBhai server starting");

    // ── 8. Serve until Ctrl+C, then let the scheduler finish its tick ────────
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await;
    info!("👋 Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("🛑 Shutdown signal received");
}
