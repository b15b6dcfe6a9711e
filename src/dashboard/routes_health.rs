//! # Health & Observability Endpoints
//!
//! | Endpoint | Purpose |
//! |----------|---------|
//! | `GET /healthz` | Liveness: process is serving HTTP |
//! | `GET /readyz` | Readiness: database reachable, plus the active configuration table |
//! | `GET /metrics` | Prometheus scrape |

use super::AppState;
use crate::schema::ConfigSchema;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

const READY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(2);

pub async fn handler_healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Body of `/readyz`. `module` and `config_table` name the variant every
/// bulk edit on this instance will write to.
#[derive(Debug, Serialize)]
struct Readiness {
    status: &'static str,
    module: &'static str,
    config_table: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

fn readiness(schema: &dyn ConfigSchema, failure: Option<&'static str>) -> (StatusCode, Readiness) {
    let status = match failure {
        None => StatusCode::OK,
        Some(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    (
        status,
        Readiness {
            status: if failure.is_none() { "ok" } else { "unavailable" },
            module: schema.module().as_str(),
            config_table: schema.table().trim_matches('"'),
            reason: failure,
        },
    )
}

/// 503 while the database is unreachable so the proxy stops routing here.
pub async fn handler_readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let failure = match tokio::time::timeout(READY_TIMEOUT, state.db.health_check()).await {
        Ok(Ok(())) => None,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "readiness check failed");
            Some("database unreachable")
        }
        Err(_) => Some("database timeout"),
    };
    let (status, body) = readiness(state.db.schema(), failure);
    (status, Json(body))
}

pub async fn handler_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            "content-type",
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        state.prom_metrics.encode(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ModuleType;

    #[test]
    fn ready_body_names_the_active_table() {
        let (status, body) = readiness(ModuleType::Addon.schema(), None);
        assert_eq!(status, StatusCode::OK);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["module"], "addon");
        assert_eq!(json["config_table"], "ProxmoxAddon_ProductConfiguration");
        assert!(json.get("reason").is_none());
    }

    #[test]
    fn unreachable_database_is_503_with_reason() {
        let (status, body) = readiness(ModuleType::Cloud.schema(), Some("database timeout"));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["module"], "cloud");
        assert_eq!(json["config_table"], "ProxmoxVeVpsCloud_ProductConfiguration");
        assert_eq!(json["reason"], "database timeout");
    }
}
