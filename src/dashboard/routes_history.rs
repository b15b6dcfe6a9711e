//! Change log views: paginated global history plus per-group and
//! per-product trails.

use super::AppState;
use crate::codec;
use crate::db::change_log::{page_window, total_pages, HISTORY_PAGE_SIZE};
use crate::db::ChangeLogRow;
use crate::error::BulkResult;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_TRAIL_LIMIT: i64 = 50;
const MAX_TRAIL_LIMIT: i64 = 500;

#[derive(Deserialize)]
pub(super) struct PageQuery {
    page: Option<i64>,
}

#[derive(Deserialize)]
pub(super) struct LimitQuery {
    limit: Option<i64>,
}

impl LimitQuery {
    fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_TRAIL_LIMIT)
            .clamp(1, MAX_TRAIL_LIMIT)
    }
}

/// A log row with display labels for deleted admins and groups.
#[derive(Serialize)]
struct HistoryEntry {
    #[serde(flatten)]
    row: ChangeLogRow,
    admin: String,
    group: String,
    old_value_display: String,
    new_value_display: String,
}

impl From<ChangeLogRow> for HistoryEntry {
    fn from(row: ChangeLogRow) -> Self {
        HistoryEntry {
            admin: row.admin_label().to_string(),
            group: row.group_label().to_string(),
            old_value_display: codec::display(row.old_value.as_deref().unwrap_or("")),
            new_value_display: codec::display(row.new_value.as_deref().unwrap_or("")),
            row,
        }
    }
}

fn entries(rows: Vec<ChangeLogRow>) -> Vec<HistoryEntry> {
    rows.into_iter().map(HistoryEntry::from).collect()
}

pub(super) async fn handler_api_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> BulkResult<impl IntoResponse> {
    let page = query.page.unwrap_or(1).max(1);
    let (limit, offset) = page_window(page);
    let rows = state.db.change_history(limit, offset).await?;
    let total = state.db.total_change_count().await?;

    Ok(Json(serde_json::json!({
        "entries": entries(rows),
        "page": page,
        "page_size": HISTORY_PAGE_SIZE,
        "total": total,
        "total_pages": total_pages(total),
    })))
}

pub(super) async fn handler_api_group_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<LimitQuery>,
) -> BulkResult<impl IntoResponse> {
    let rows = state.db.group_changes(id, query.limit()).await?;
    Ok(Json(serde_json::json!({
        "group_id": id,
        "entries": entries(rows),
    })))
}

pub(super) async fn handler_api_product_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<LimitQuery>,
) -> BulkResult<impl IntoResponse> {
    let rows = state.db.product_changes(id, query.limit()).await?;
    Ok(Json(serde_json::json!({
        "product_id": id,
        "entries": entries(rows),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trail_limit_is_clamped() {
        assert_eq!(LimitQuery { limit: None }.limit(), 50);
        assert_eq!(LimitQuery { limit: Some(0) }.limit(), 1);
        assert_eq!(LimitQuery { limit: Some(10_000) }.limit(), 500);
    }

    #[test]
    fn entry_labels_and_display_values() {
        let entry = HistoryEntry::from(ChangeLogRow {
            id: 1,
            admin_id: 2,
            group_id: None,
            product_id: 3,
            setting_name: "tags".into(),
            old_value: None,
            new_value: Some(r#""a\/b""#.into()),
            created_at: chrono::Utc::now(),
            admin_username: Some("root".into()),
            group_name: None,
        });
        assert_eq!(entry.admin, "root");
        assert_eq!(entry.group, "N/A");
        assert_eq!(entry.old_value_display, "");
        assert_eq!(entry.new_value_display, "a/b");
    }
}
