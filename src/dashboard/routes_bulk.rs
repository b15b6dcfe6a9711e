//! Bulk edit workflow: edit form, preview, apply and CSV export.
//!
//! Preview returns the change set as `changes_data`; apply accepts only
//! that payload, never the raw form, so the writes match what was shown.

use super::middleware_auth::Actor;
use super::routes_groups::group_products;
use super::AppState;
use crate::apply::apply_changes;
use crate::error::{BulkError, BulkResult};
use crate::export::export_group;
use crate::preview::{compute_preview, editable_settings, ChangeSet};
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

#[derive(Deserialize)]
pub(super) struct PreviewRequest {
    #[serde(default)]
    settings: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
pub(super) struct ApplyRequest {
    #[serde(default)]
    changes_data: String,
}

/// Form values arrive as JSON; anything that is not a string is taken as
/// its JSON text, `null` as empty.
fn form_value(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub(super) async fn handler_api_group_edit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> BulkResult<impl IntoResponse> {
    let group = state.db.require_group(id).await?;
    let template = group
        .template_product_id()
        .ok_or_else(|| BulkError::not_found("Group has no products."))?;
    if !state.db.product_exists(template).await? {
        return Err(BulkError::not_found(format!(
            "Template product {} not found.",
            template
        )));
    }
    let products = group_products(&state, &group).await?;
    let settings = editable_settings(&state.db, state.db.schema(), template).await?;

    Ok(Json(serde_json::json!({
        "group": group,
        "template_product_id": template,
        "products": products,
        "settings": settings,
    })))
}

pub(super) async fn handler_api_group_preview(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<PreviewRequest>,
) -> BulkResult<impl IntoResponse> {
    let group = state.db.require_group(id).await?;
    let changes = ChangeSet::from_form(
        req.settings.into_iter().map(|(k, v)| (k, form_value(v))),
        state.db.schema(),
    )?;
    let names: HashMap<i64, String> = group_products(&state, &group)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();
    let items = compute_preview(&state.db, &group.product_id_list(), &names, &changes).await?;

    info!(
        group_id = id,
        settings = changes.len(),
        items = items.len(),
        "bulk preview computed"
    );
    Ok(Json(serde_json::json!({
        "group": group,
        "items": items,
        "change_count": items.len(),
        "changes_data": changes.to_payload(),
    })))
}

pub(super) async fn handler_api_group_apply(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Actor(actor): Actor,
    Json(req): Json<ApplyRequest>,
) -> BulkResult<impl IntoResponse> {
    let group = state.db.require_group(id).await?;
    let changes = ChangeSet::from_payload(&req.changes_data, state.db.schema())?;

    let report = apply_changes(
        &state.db,
        &state.db,
        &actor,
        Some(group.id),
        &group.product_id_list(),
        &changes,
    )
    .await;
    state
        .prom_metrics
        .record_apply(report.success_count, report.error_count);
    Ok(Json(report))
}

pub(super) async fn handler_api_group_export(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> BulkResult<impl IntoResponse> {
    let group = state.db.require_group(id).await?;
    let export = export_group(&state.db, &group).await?;
    info!(group_id = id, filename = %export.filename, "group exported");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.filename),
            ),
            (header::PRAGMA, "no-cache".to_string()),
            (header::EXPIRES, "0".to_string()),
        ],
        export.body,
    ))
}
