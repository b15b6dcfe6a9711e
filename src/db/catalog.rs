//! Read-only lookups against the hosting platform's own tables.

use super::{Database, ProductRef};
use anyhow::Result;

impl Database {
    /// Names of the given products, ordered by id. Unknown ids are absent.
    pub async fn product_names(&self, product_ids: &[i64]) -> Result<Vec<ProductRef>> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, ProductRef>(
            "SELECT id::BIGINT AS id, name FROM tblproducts WHERE id = ANY($1) ORDER BY id",
        )
        .bind(product_ids)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    pub async fn product_exists(&self, product_id: i64) -> Result<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM tblproducts WHERE id = $1)")
                .bind(product_id)
                .fetch_one(self.pool())
                .await?;
        Ok(exists)
    }

    /// Some enabled admin, used only when the request carries no identity.
    pub async fn fallback_admin_id(&self) -> Result<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>(
            "SELECT id::BIGINT FROM tbladmins WHERE disabled = 0 ORDER BY id LIMIT 1",
        )
        .fetch_optional(self.pool())
        .await?;
        Ok(id)
    }

    /// The addon's configured `proxmox_module` value, if readable.
    ///
    /// Errors (including a missing table) are treated as "not configured".
    pub async fn stored_module_type(&self) -> Option<String> {
        sqlx::query_scalar::<_, Option<String>>(
            "SELECT value FROM tbladdonmodules
             WHERE module = 'proxmox_bulk_vm_setting' AND setting = 'proxmox_module'
             LIMIT 1",
        )
        .fetch_optional(self.pool())
        .await
        .ok()
        .flatten()
        .flatten()
        .filter(|v| !v.is_empty())
    }
}
