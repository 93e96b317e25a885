//! Application initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod telemetry;

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use kontera_core::Config;

use crate::state::AppState;

/// Initialize database, services, and routes.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router)> {
    let pool = database::setup_database(&config).await?;
    let state = services::build_state(config, pool);
    let router = routes::build_router(state.clone());
    Ok((state, router))
}
