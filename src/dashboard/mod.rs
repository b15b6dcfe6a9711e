//! # Dashboard: Admin HTTP Server
//!
//! Runs an Axum HTTP server exposing the bulk-edit workflow as a JSON API
//! and, optionally, a static front end. The workflow is stateless on the
//! server: the edit form is rebuilt per request and the previewed change
//! set round-trips through the client as an opaque payload.
//!
//! ## Route modules
//!
//! - [`routes_groups`]: group CRUD
//! - [`routes_bulk`]: edit form, preview, apply, CSV export
//! - [`routes_history`]: change log views
//! - [`routes_health`]: probes and Prometheus scrape

pub(crate) mod middleware_auth;
mod routes_bulk;
mod routes_groups;
mod routes_health;
mod routes_history;

use crate::{db, prom_metrics};
use anyhow::Result;
use axum::extract::Request;
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::routing::get;
use axum::Router;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Instrument};

pub struct AppState {
    pub db: db::Database,
    pub prom_metrics: prom_metrics::Metrics,
}

impl AppState {
    pub fn with_db(db: db::Database) -> Arc<Self> {
        Arc::new(AppState {
            db,
            prom_metrics: prom_metrics::Metrics::new(),
        })
    }
}

/// Records request latency, propagates or assigns `x-request-id`, and runs
/// the handler inside a `request` span.
async fn metrics_middleware(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> axum::response::Response {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let method = req.method().to_string();
    let raw_path = req.uri().path().to_string();
    let norm_path = normalize_path(&raw_path);
    let start = std::time::Instant::now();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %raw_path,
    );
    let mut response = next.run(req).instrument(span).await;

    state
        .prom_metrics
        .http_request_duration
        .get_or_create(&prom_metrics::HttpLabel {
            method,
            path: norm_path,
        })
        .observe(start.elapsed().as_secs_f64());

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Collapse numeric path segments (group and product ids) into `:id`.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|seg| {
            if !seg.is_empty() && seg.chars().all(|c| c.is_ascii_digit()) {
                ":id"
            } else {
                seg
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub fn build_router(state: Arc<AppState>, static_dir: Option<&Path>) -> Router {
    let mut app = Router::new()
        .route(
            "/api/groups",
            get(routes_groups::handler_api_groups).post(routes_groups::handler_api_group_create),
        )
        .route(
            "/api/groups/{id}",
            get(routes_groups::handler_api_group)
                .put(routes_groups::handler_api_group_update)
                .delete(routes_groups::handler_api_group_delete),
        )
        .route(
            "/api/groups/{id}/edit",
            get(routes_bulk::handler_api_group_edit),
        )
        .route(
            "/api/groups/{id}/preview",
            axum::routing::post(routes_bulk::handler_api_group_preview),
        )
        .route(
            "/api/groups/{id}/apply",
            axum::routing::post(routes_bulk::handler_api_group_apply),
        )
        .route(
            "/api/groups/{id}/export",
            get(routes_bulk::handler_api_group_export),
        )
        .route(
            "/api/groups/{id}/history",
            get(routes_history::handler_api_group_history),
        )
        .route(
            "/api/products/{id}/history",
            get(routes_history::handler_api_product_history),
        )
        .route("/api/history", get(routes_history::handler_api_history))
        .route("/healthz", get(routes_health::handler_healthz))
        .route("/readyz", get(routes_health::handler_readyz))
        .route("/metrics", get(routes_health::handler_metrics));

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true));
    }

    app.layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    )
    .layer(CatchPanicLayer::new())
    .layer(axum::middleware::from_fn_with_state(
        state.clone(),
        metrics_middleware,
    ))
    .layer(TraceLayer::new_for_http())
    .layer(RequestBodyLimitLayer::new(1024 * 1024))
    .layer(TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(30),
    ))
    .with_state(state)
}

pub async fn run(port: u16, database: db::Database, static_dir: Option<&Path>) -> Result<()> {
    let state = AppState::with_db(database);
    let app = build_router(state, static_dir);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!(port, "bulk edit server running");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("received SIGINT, shutting down"),
                    _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                ctrl_c.await.ok();
                info!("received SIGINT, shutting down");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("received SIGINT, shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_preserves_static_routes() {
        assert_eq!(normalize_path("/api/groups"), "/api/groups");
        assert_eq!(normalize_path("/api/history"), "/api/history");
        assert_eq!(normalize_path("/metrics"), "/metrics");
    }

    #[test]
    fn normalize_path_collapses_ids() {
        assert_eq!(normalize_path("/api/groups/42/preview"), "/api/groups/:id/preview");
        assert_eq!(normalize_path("/api/products/7/history"), "/api/products/:id/history");
    }

    #[test]
    fn normalize_path_handles_empty_and_root() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "");
    }
}
