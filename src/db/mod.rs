//! # Database: PostgreSQL Storage Layer
//!
//! Async access to the addon's own tables and to the hosting platform's
//! tables via a shared `sqlx::PgPool`.
//!
//! ## Schema
//!
//! Owned by this crate (see `migrations/`):
//!
//! - `mod_proxmox_bulk_groups`: named, comma-joined product id lists
//! - `mod_proxmox_bulk_change_log`: append-only audit trail of applied writes
//!
//! Read from the platform (never altered):
//!
//! - product configuration table, one of two variants ([`crate::schema`])
//! - `tblproducts` (id, name), `tbladmins` (id, username, disabled)
//! - `tbladdonmodules` (module, setting, value)
//!
//! ## Module Structure
//!
//! - [`groups`]: group CRUD and product-id normalization
//! - [`change_log`]: audit append, paginated and filtered history
//! - [`settings`]: product configuration read/upsert ([`SettingsStore`])
//! - [`catalog`]: product names, admin identity, stored module type

mod catalog;
pub mod change_log;
pub mod groups;
mod settings;

use crate::schema::{ConfigSchema, ModuleType};
use anyhow::Result;
use serde::Serialize;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::info;

pub use groups::{normalize_product_ids, parse_product_ids, validate_group_form};

// ── Group types ─────────────────────────────────────────────────

/// A named set of products edited together.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct GroupRow {
    pub id: i64,
    pub name: String,
    /// Normalized comma-joined product ids; the first one is the template.
    pub product_ids: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl GroupRow {
    pub fn product_id_list(&self) -> Vec<i64> {
        parse_product_ids(&self.product_ids)
    }

    /// The product whose current values seed the edit form.
    pub fn template_product_id(&self) -> Option<i64> {
        self.product_id_list().first().copied()
    }
}

// ── Change log types ────────────────────────────────────────────

/// A change-log entry joined with admin username and group name.
///
/// Both joined columns are `None` when the referenced row no longer exists.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct ChangeLogRow {
    pub id: i64,
    pub admin_id: i64,
    pub group_id: Option<i64>,
    pub product_id: i64,
    pub setting_name: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub admin_username: Option<String>,
    pub group_name: Option<String>,
}

impl ChangeLogRow {
    pub fn admin_label(&self) -> &str {
        self.admin_username.as_deref().unwrap_or("Unknown")
    }

    pub fn group_label(&self) -> &str {
        self.group_name.as_deref().unwrap_or("N/A")
    }
}

// ── Catalog types ───────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ProductRef {
    pub id: i64,
    pub name: String,
}

// ── Database struct and connection ──────────────────────────────

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    schema: &'static dyn ConfigSchema,
}

impl Database {
    /// Connect to PostgreSQL using the provided database URL.
    ///
    /// Manually parses the URL to preserve the full username; sqlx's built-in
    /// parser strips dotted suffixes some poolers require.
    /// The configuration table variant defaults to `cloud`; see [`Database::open`].
    pub async fn connect(database_url: &str) -> Result<Self> {
        let url = url::Url::parse(database_url)?;
        let username = urlencoding::decode(url.username())?.into_owned();
        let password = url
            .password()
            .map(|p| urlencoding::decode(p).map(|s| s.into_owned()))
            .transpose()?;
        let mut opts = PgConnectOptions::new()
            .host(url.host_str().unwrap_or("localhost"))
            .port(url.port().unwrap_or(5432))
            .database(url.path().trim_start_matches('/'))
            .username(&username);
        if let Some(ref pw) = password {
            opts = opts.password(pw);
        }
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;
        Ok(Database {
            pool,
            schema: ModuleType::default().schema(),
        })
    }

    /// Connect and settle the configuration table variant once.
    ///
    /// An explicit module wins; otherwise the addon's stored `proxmox_module`
    /// setting is used, falling back to `cloud`.
    pub async fn open(database_url: &str, module: Option<ModuleType>) -> Result<Self> {
        let db = Self::connect(database_url).await?;
        let module = match module {
            Some(m) => m,
            None => db
                .stored_module_type()
                .await
                .map(|v| ModuleType::from_stored(&v))
                .unwrap_or_default(),
        };
        info!(module = %module, table = module.schema().table(), "configuration table selected");
        Ok(db.with_module(module))
    }

    pub fn with_module(mut self, module: ModuleType) -> Self {
        self.schema = module.schema();
        self
    }

    pub fn schema(&self) -> &'static dyn ConfigSchema {
        self.schema
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Health check: execute `SELECT 1` to verify database connectivity.
    ///
    /// Used by the `/readyz` readiness probe.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn group(ids: &str) -> GroupRow {
        GroupRow {
            id: 1,
            name: "web".into(),
            product_ids: ids.into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn template_is_first_product() {
        assert_eq!(group("7,3,9").template_product_id(), Some(7));
        assert_eq!(group("7,3,9").product_id_list(), vec![7, 3, 9]);
        assert_eq!(group("").template_product_id(), None);
    }

    #[test]
    fn orphaned_log_rows_show_placeholders() {
        let row = ChangeLogRow {
            id: 1,
            admin_id: 4,
            group_id: Some(99),
            product_id: 3,
            setting_name: "onboot".into(),
            old_value: Some("\"on\"".into()),
            new_value: Some("\"off\"".into()),
            created_at: Utc::now(),
            admin_username: None,
            group_name: None,
        };
        assert_eq!(row.group_label(), "N/A");
        assert_eq!(row.admin_label(), "Unknown");
    }
}
