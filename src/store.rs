//! Storage seams used by the preview and apply logic.
//!
//! [`crate::db::Database`] implements both traits against PostgreSQL. Keeping
//! the logic behind `&dyn SettingsStore` / `&dyn ChangeRecorder` lets the
//! diff and fan-out rules run against in-memory stores in unit tests.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

/// One row of the external product configuration table, normalized across
/// schema variants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SettingRow {
    pub product_id: i64,
    /// Discriminator value (`product`); `None` for tables without one.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub setting: String,
    /// Raw JSON-encoded value exactly as stored.
    pub value: String,
    pub decoded_value: String,
}

/// Where the acting admin identity came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorSource {
    Session,
    Fallback,
}

/// The admin on whose behalf audit entries are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ActorContext {
    pub admin_id: i64,
    pub source: ActorSource,
}

impl ActorContext {
    pub fn session(admin_id: i64) -> Self {
        ActorContext {
            admin_id,
            source: ActorSource::Session,
        }
    }

    /// Best-effort identity when no session is available. Admin id 0 when
    /// not even a fallback admin exists.
    pub fn fallback(admin_id: Option<i64>) -> Self {
        ActorContext {
            admin_id: admin_id.unwrap_or(0),
            source: ActorSource::Fallback,
        }
    }
}

/// A change-log entry about to be appended.
#[derive(Clone, Copy, Debug)]
pub struct NewChange<'a> {
    pub group_id: Option<i64>,
    pub product_id: i64,
    pub setting_name: &'a str,
    pub old_value: &'a str,
    pub new_value: &'a str,
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// All settings of a product, ordered by setting name.
    async fn get_settings(&self, product_id: i64) -> Result<Vec<SettingRow>>;

    /// Raw stored value, or an empty string when the row does not exist.
    async fn get_setting_value(&self, product_id: i64, setting: &str) -> Result<String>;

    /// Upsert one setting. `value` is encoded first unless `already_encoded`.
    async fn update_setting(
        &self,
        product_id: i64,
        setting: &str,
        value: &str,
        already_encoded: bool,
    ) -> Result<bool>;
}

#[async_trait]
pub trait ChangeRecorder: Send + Sync {
    async fn record_change(&self, actor: &ActorContext, change: NewChange<'_>) -> Result<i64>;
}
