//! Route table and middleware stack

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

use kontera_core::AppError;

use crate::api_doc::ApiDoc;
use crate::error::HttpAppError;
use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.cors_origins());
    // Multipart framing and base64 inflate payloads well past the per-file
    // limit, so the body bound is a multiple of it.
    let body_limit = RequestBodyLimitLayer::new(state.config.max_file_size_bytes() * 8);

    let mut router = Router::new()
        .route(
            "/api/v0/reception/email",
            post(handlers::reception_email::receive_email_document),
        )
        .route(
            "/api/v0/reception/documents",
            post(handlers::reception_upload::upload_documents)
                .get(handlers::documents::list_documents),
        )
        .route(
            "/api/v0/reception/documents/{id}",
            get(handlers::documents::get_document),
        )
        .route(
            "/api/v0/extractions/{id}",
            get(handlers::extractions::get_extraction),
        )
        .route(
            "/api/v0/extractions/{id}/voucher",
            post(handlers::vouchers::create_voucher_from_extraction),
        )
        .route("/api/v0/vouchers/{id}", get(handlers::vouchers::get_voucher))
        .route("/healthz", get(health));

    // API docs stay off production deployments.
    if !state.is_production {
        router = router
            .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(body_limit),
        )
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Liveness plus a database round-trip.
async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, HttpAppError> {
    sqlx::query_scalar::<sqlx::Postgres, i32>("SELECT 1")
        .fetch_one(&state.db.pool)
        .await
        .map_err(AppError::from)?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}
