//! Product configuration reads and upserts.
//!
//! Every statement is built from the active [`ConfigSchema`]: its table name
//! and, for the `cloud` variant, the `type = 'product'` scope on reads and
//! the extra column on inserts.

use super::Database;
use crate::codec;
use crate::schema::ConfigSchema;
use crate::store::{SettingRow, SettingsStore};
use anyhow::Result;
use async_trait::async_trait;

#[derive(sqlx::FromRow)]
struct RawSettingRow {
    product_id: i64,
    kind: Option<String>,
    setting: String,
    value: String,
}

impl From<RawSettingRow> for SettingRow {
    fn from(row: RawSettingRow) -> Self {
        let decoded_value = codec::decode(&row.value);
        SettingRow {
            product_id: row.product_id,
            kind: row.kind,
            setting: row.setting,
            value: row.value,
            decoded_value,
        }
    }
}

fn select_columns(schema: &dyn ConfigSchema) -> String {
    let kind = match schema.discriminator() {
        Some((column, _)) => format!("\"{}\"::TEXT", column),
        None => "NULL::TEXT".to_string(),
    };
    format!(
        "product_id::BIGINT AS product_id, {} AS kind, setting, COALESCE(value, '') AS value",
        kind
    )
}

impl Database {
    /// Settings of several products, ordered by product then setting name.
    pub async fn get_multiple_product_settings(&self, product_ids: &[i64]) -> Result<Vec<SettingRow>> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }
        let schema = self.schema();
        let sql = format!(
            "SELECT {} FROM {} WHERE product_id = ANY($1){} ORDER BY product_id ASC, setting ASC",
            select_columns(schema),
            schema.table(),
            schema.scope_clause(),
        );
        let rows = sqlx::query_as::<_, RawSettingRow>(&sql)
            .bind(product_ids)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(SettingRow::from).collect())
    }

    async fn setting_exists(&self, product_id: i64, setting: &str) -> Result<bool> {
        let schema = self.schema();
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE product_id = $1 AND setting = $2{})",
            schema.table(),
            schema.scope_clause(),
        );
        let exists = sqlx::query_scalar::<_, bool>(&sql)
            .bind(product_id)
            .bind(setting)
            .fetch_one(self.pool())
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl SettingsStore for Database {
    async fn get_settings(&self, product_id: i64) -> Result<Vec<SettingRow>> {
        let schema = self.schema();
        let sql = format!(
            "SELECT {} FROM {} WHERE product_id = $1{} ORDER BY setting ASC",
            select_columns(schema),
            schema.table(),
            schema.scope_clause(),
        );
        let rows = sqlx::query_as::<_, RawSettingRow>(&sql)
            .bind(product_id)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(SettingRow::from).collect())
    }

    async fn get_setting_value(&self, product_id: i64, setting: &str) -> Result<String> {
        let schema = self.schema();
        let sql = format!(
            "SELECT value FROM {} WHERE product_id = $1 AND setting = $2{} LIMIT 1",
            schema.table(),
            schema.scope_clause(),
        );
        let value = sqlx::query_scalar::<_, Option<String>>(&sql)
            .bind(product_id)
            .bind(setting)
            .fetch_optional(self.pool())
            .await?;
        Ok(value.flatten().unwrap_or_default())
    }

    async fn update_setting(
        &self,
        product_id: i64,
        setting: &str,
        value: &str,
        already_encoded: bool,
    ) -> Result<bool> {
        let encoded = if already_encoded {
            value.to_string()
        } else {
            codec::encode(value)
        };
        let schema = self.schema();

        if self.setting_exists(product_id, setting).await? {
            let sql = format!(
                "UPDATE {} SET value = $3 WHERE product_id = $1 AND setting = $2{}",
                schema.table(),
                schema.scope_clause(),
            );
            let result = sqlx::query(&sql)
                .bind(product_id)
                .bind(setting)
                .bind(&encoded)
                .execute(self.pool())
                .await?;
            return Ok(result.rows_affected() > 0);
        }

        let sql = match schema.discriminator() {
            Some((column, fixed)) => format!(
                "INSERT INTO {} (product_id, setting, value, \"{}\") VALUES ($1, $2, $3, '{}')",
                schema.table(),
                column,
                fixed,
            ),
            None => format!(
                "INSERT INTO {} (product_id, setting, value) VALUES ($1, $2, $3)",
                schema.table(),
            ),
        };
        let result = sqlx::query(&sql)
            .bind(product_id)
            .bind(setting)
            .bind(&encoded)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ModuleType;

    #[test]
    fn cloud_select_exposes_type_column() {
        let cols = select_columns(ModuleType::Cloud.schema());
        assert!(cols.contains("\"type\"::TEXT AS kind"));
    }

    #[test]
    fn addon_select_has_null_kind() {
        let cols = select_columns(ModuleType::Addon.schema());
        assert!(cols.contains("NULL::TEXT AS kind"));
        assert!(!cols.contains("\"type\""));
    }
}
