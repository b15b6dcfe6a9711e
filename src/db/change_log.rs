//! Change log operations.
//!
//! Every applied write appends one row. Rows are never updated or deleted
//! here. Reads left-join the admin and group tables so entries survive the
//! deletion of either.

use super::{ChangeLogRow, Database};
use crate::store::{ActorContext, ChangeRecorder, NewChange};
use anyhow::Result;
use async_trait::async_trait;

/// Page size of the history view.
pub const HISTORY_PAGE_SIZE: i64 = 50;

const SELECT_JOINED: &str = "SELECT log.id, log.admin_id::BIGINT AS admin_id,
            log.group_id::BIGINT AS group_id, log.product_id::BIGINT AS product_id,
            log.setting_name, log.old_value, log.new_value, log.created_at,
            admin.username AS admin_username, grp.name AS group_name
     FROM mod_proxmox_bulk_change_log AS log
     LEFT JOIN tbladmins AS admin ON log.admin_id = admin.id
     LEFT JOIN mod_proxmox_bulk_groups AS grp ON log.group_id = grp.id";

/// `(limit, offset)` for a 1-based history page. Pages below 1 are page 1;
/// the offset saturates instead of overflowing for absurd page numbers.
pub fn page_window(page: i64) -> (i64, i64) {
    let page = page.max(1);
    (HISTORY_PAGE_SIZE, (page - 1).saturating_mul(HISTORY_PAGE_SIZE))
}

pub fn total_pages(total: i64) -> i64 {
    (total + HISTORY_PAGE_SIZE - 1) / HISTORY_PAGE_SIZE
}

impl Database {
    /// Append one entry attributed to `actor`, returning the new id.
    pub async fn log_change(&self, actor: &ActorContext, change: NewChange<'_>) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO mod_proxmox_bulk_change_log
                (admin_id, group_id, product_id, setting_name, old_value, new_value, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, NOW())
             RETURNING id",
        )
        .bind(actor.admin_id)
        .bind(change.group_id)
        .bind(change.product_id)
        .bind(change.setting_name)
        .bind(change.old_value)
        .bind(change.new_value)
        .fetch_one(self.pool())
        .await?;
        Ok(id)
    }

    /// Newest entries first.
    pub async fn change_history(&self, limit: i64, offset: i64) -> Result<Vec<ChangeLogRow>> {
        let sql = format!(
            "{} ORDER BY log.created_at DESC, log.id DESC LIMIT $1 OFFSET $2",
            SELECT_JOINED
        );
        let rows = sqlx::query_as::<_, ChangeLogRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    pub async fn total_change_count(&self) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM mod_proxmox_bulk_change_log")
                .fetch_one(self.pool())
                .await?;
        Ok(count)
    }

    pub async fn group_changes(&self, group_id: i64, limit: i64) -> Result<Vec<ChangeLogRow>> {
        let sql = format!(
            "{} WHERE log.group_id = $1 ORDER BY log.created_at DESC, log.id DESC LIMIT $2",
            SELECT_JOINED
        );
        let rows = sqlx::query_as::<_, ChangeLogRow>(&sql)
            .bind(group_id)
            .bind(limit)
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    pub async fn product_changes(&self, product_id: i64, limit: i64) -> Result<Vec<ChangeLogRow>> {
        let sql = format!(
            "{} WHERE log.product_id = $1 ORDER BY log.created_at DESC, log.id DESC LIMIT $2",
            SELECT_JOINED
        );
        let rows = sqlx::query_as::<_, ChangeLogRow>(&sql)
            .bind(product_id)
            .bind(limit)
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl ChangeRecorder for Database {
    async fn record_change(&self, actor: &ActorContext, change: NewChange<'_>) -> Result<i64> {
        self.log_change(actor, change).await
    }
}
