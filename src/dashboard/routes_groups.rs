//! Product group CRUD endpoints.

use super::AppState;
use crate::db::{validate_group_form, GroupRow, ProductRef};
use crate::error::{BulkError, BulkResult};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

#[derive(Deserialize)]
pub(super) struct GroupForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    product_ids: String,
}

#[derive(Serialize)]
struct GroupSummary {
    #[serde(flatten)]
    group: GroupRow,
    product_count: usize,
}

/// Group members in group order, labelled `Unknown` when the catalog
/// has no such product.
pub(super) async fn group_products(
    state: &AppState,
    group: &GroupRow,
) -> BulkResult<Vec<ProductRef>> {
    let ids = group.product_id_list();
    let names: HashMap<i64, String> = state
        .db
        .product_names(&ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();
    Ok(ids
        .into_iter()
        .map(|id| ProductRef {
            id,
            name: names
                .get(&id)
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string()),
        })
        .collect())
}

pub(super) async fn handler_api_groups(
    State(state): State<Arc<AppState>>,
) -> BulkResult<impl IntoResponse> {
    let groups: Vec<GroupSummary> = state
        .db
        .list_groups()
        .await?
        .into_iter()
        .map(|group| GroupSummary {
            product_count: group.product_id_list().len(),
            group,
        })
        .collect();
    Ok(Json(serde_json::json!({ "groups": groups })))
}

pub(super) async fn handler_api_group(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> BulkResult<impl IntoResponse> {
    let group = state.db.require_group(id).await?;
    let products = group_products(&state, &group).await?;
    Ok(Json(serde_json::json!({
        "group": group,
        "products": products,
    })))
}

pub(super) async fn handler_api_group_create(
    State(state): State<Arc<AppState>>,
    Json(form): Json<GroupForm>,
) -> BulkResult<impl IntoResponse> {
    validate_group_form(&form.name, &form.product_ids)?;
    let id = state
        .db
        .create_group(form.name.trim(), &form.product_ids)
        .await?;
    info!(group_id = id, name = %form.name.trim(), "group created");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": id, "message": "Group created successfully!" })),
    ))
}

pub(super) async fn handler_api_group_update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(form): Json<GroupForm>,
) -> BulkResult<impl IntoResponse> {
    validate_group_form(&form.name, &form.product_ids)?;
    if !state
        .db
        .update_group(id, form.name.trim(), &form.product_ids)
        .await?
    {
        return Err(BulkError::not_found("Group not found."));
    }
    info!(group_id = id, "group updated");
    Ok(Json(
        serde_json::json!({ "id": id, "message": "Group updated successfully!" }),
    ))
}

pub(super) async fn handler_api_group_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> BulkResult<impl IntoResponse> {
    if !state.db.delete_group(id).await? {
        return Err(BulkError::not_found("Group not found."));
    }
    info!(group_id = id, "group deleted");
    Ok(Json(
        serde_json::json!({ "id": id, "message": "Group deleted successfully!" }),
    ))
}
