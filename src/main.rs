//! ==============================================================================
//! main.rs - sensor dashboard host entry point
//! ==============================================================================
//!
//! purpose:
//!     shows the most recent row of the `sensor_readings` table as four
//!     cards (temperature pie, humidity, soil moisture, gas) and keeps it
//!     current as new rows are inserted.
//!
//! responsibilities:
//!     - load configuration (config.rs)
//!     - fetch the latest row once at startup (store.rs)
//!     - hold an insert subscription for the life of the process
//!     - serve the dashboard page, the json api and the insert webhook
//!     - release the subscription on ctrl-c before the server stops
//!
//! architecture:
//!
//!     ┌─────────────────────────────────────────────────────────────┐
//!     │                    rust host (this file)                     │
//!     │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//!     │  │ initial     │  │ web server  │  │ insert subscription │  │
//!     │  │ fetch       │  │ (port 3000) │  │ (push + poll)       │  │
//!     │  └──────┬──────┘  └──────┬──────┘  └──────────┬──────────┘  │
//!     │         │                │ reads              │ writes      │
//!     │         └────────────────┼────────────────────┘             │
//!     │                    ┌─────┴─────┐                            │
//!     │                    │ dashboard │ <- state.rs                │
//!     │                    └─────┬─────┘                            │
//!     │                          │ display models                   │
//!     │                    ┌─────┴─────┐                            │
//!     │                    │ renderers │ <- render.rs               │
//!     │                    └───────────┘                            │
//!     └─────────────────────────────────────────────────────────────┘
//!                                │ https
//!                    ┌───────────┴───────────┐
//!                    │ supabase rest api     │
//!                    │ + insert webhook      │
//!                    └───────────────────────┘
//!
//! ==============================================================================

mod chart;
mod classify;
mod config;
mod display;
mod domain;
mod error;
mod render;
mod state;
mod store;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use crate::config::DashboardConfig;
use crate::render::ConsoleRenderer;
use crate::state::{Dashboard, DashboardView};
use crate::store::{InsertEvent, RestStore, SnapshotStore};

/// page reload period when polling is off
const DEFAULT_REFRESH_SECONDS: u64 = 5;

// ==============================================================================
// shared web state
// ==============================================================================

#[derive(Clone)]
struct WebState {
    dashboard: Dashboard,
    store: RestStore,
    refresh_seconds: u64,
}

// ==============================================================================
// main entry point
// ==============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // startup banner
    println!("===========================================================");
    println!("  Sensor Readings Dashboard");
    println!("===========================================================");

    // step 1: load configuration
    let mut config = DashboardConfig::load_or_default();
    config.apply_env();
    config.validate()?;
    config.print_summary();

    // step 2: logging
    init_tracing(&config.logging.level);

    // step 3: store + dashboard state
    let store = RestStore::new(&config.store)?;
    let renderer = Arc::new(ConsoleRenderer::new(config.logging.show_sensor_data));
    let dashboard = Dashboard::new(&config, renderer);

    // step 4: web server in background, it shows the spinner until step 6 is done
    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let web = WebState {
        dashboard: dashboard.clone(),
        store: store.clone(),
        refresh_seconds: match config.store.poll_interval_seconds {
            0 => DEFAULT_REFRESH_SECONDS,
            secs => secs,
        },
    };
    tracing::info!("dashboard live at http://{}", config.server.bind);
    let server = tokio::spawn(run_server(listener, web, shutdown_rx));

    // step 5: subscribe before the initial fetch so no insert is missed
    let live = dashboard.clone();
    let subscription = store.subscribe_inserts(move |reading| {
        let live = live.clone();
        async move {
            live.apply_insert(reading).await;
        }
    });

    // step 6: initial fetch, reported once and never retried
    if let Err(e) = dashboard.load_initial(&store).await {
        tracing::warn!("showing zero values until the next insert arrives ({})", e);
    }

    // step 7: run until ctrl-c, then release the subscription first
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    tracing::info!("shutting down");
    subscription.cancel();
    let _ = shutdown_tx.send(());
    server.await??;

    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

// ==============================================================================
// web server
// ==============================================================================

fn router(web: WebState) -> Router {
    Router::new()
        .route("/", get(dashboard_handler))
        .route("/api", get(api_handler))
        .route("/api/readings", post(insert_handler))
        .layer(CorsLayer::permissive())
        .with_state(web)
}

async fn run_server(
    listener: tokio::net::TcpListener,
    web: WebState,
    shutdown: oneshot::Receiver<()>,
) -> Result<()> {
    axum::serve(listener, router(web))
        .with_graceful_shutdown(async move {
            let _ = shutdown.await;
        })
        .await
        .context("web server error")?;
    Ok(())
}

async fn dashboard_handler(State(web): State<WebState>) -> Html<String> {
    let view = web.dashboard.view().await;
    Html(render::render_page(&view, web.refresh_seconds))
}

/// json api endpoint for programmatic access
/// returns the current reading and its four cards
async fn api_handler(State(web): State<WebState>) -> Json<DashboardView> {
    Json(web.dashboard.view().await)
}

/// insert webhook
/// POST /api/readings with a database webhook body
async fn insert_handler(
    State(web): State<WebState>,
    Json(event): Json<InsertEvent>,
) -> (StatusCode, Json<serde_json::Value>) {
    accept_insert(&web.store, event)
}

fn accept_insert(store: &RestStore, event: InsertEvent) -> (StatusCode, Json<serde_json::Value>) {
    let kind = event.kind.clone();
    let table = event.table.clone();

    match event.into_insert(store.table()) {
        Some(reading) => {
            let subscribers = store.publish(reading);
            tracing::debug!(subscribers, "insert pushed by webhook");
            (
                StatusCode::ACCEPTED,
                Json(serde_json::json!({"status": "accepted", "subscribers": subscribers})),
            )
        }
        None => {
            tracing::debug!(%kind, %table, "ignoring webhook event");
            (StatusCode::OK, Json(serde_json::json!({"status": "ignored"})))
        }
    }
}
