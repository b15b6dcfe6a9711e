//! # Preview: Diff Engine
//!
//! Turns a submitted edit form into a [`ChangeSet`] of already-encoded values
//! and compares it against every product of a group. Only settings whose
//! stored bytes differ from the new encoding show up in the preview.
//!
//! The change set travels from preview to apply as an opaque payload
//! (base64 of a JSON object `{setting: encoded_value}`), so apply writes
//! exactly what the administrator saw.

use crate::codec;
use crate::error::{BulkError, BulkResult};
use crate::fields::{dropdown_options, field_kind, DropdownOption, FieldKind};
use crate::schema::ConfigSchema;
use crate::store::SettingsStore;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use std::collections::HashMap;

/// A template setting offered on the edit form.
#[derive(Clone, Debug, Serialize)]
pub struct EditableSetting {
    pub setting: String,
    pub value: String,
    pub decoded_value: String,
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<&'static [DropdownOption]>,
}

/// Settings of the template product that may be bulk-edited, in name order.
pub async fn editable_settings(
    store: &dyn SettingsStore,
    schema: &dyn ConfigSchema,
    template_product_id: i64,
) -> BulkResult<Vec<EditableSetting>> {
    let rows = store.get_settings(template_product_id).await?;
    Ok(rows
        .into_iter()
        .filter(|row| !schema.is_forbidden(&row.setting))
        .map(|row| EditableSetting {
            kind: field_kind(&row.setting),
            options: dropdown_options(&row.setting),
            setting: row.setting,
            value: row.value,
            decoded_value: row.decoded_value,
        })
        .collect())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PendingChange {
    pub setting_name: String,
    pub new_value_encoded: String,
}

/// Ordered, duplicate-free set of pending writes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<PendingChange>,
}

impl ChangeSet {
    /// Build from selected `(setting, display value)` pairs, encoding each
    /// value. A repeated setting keeps its position and takes the last value.
    pub fn from_form<I, K, V>(values: I, schema: &dyn ConfigSchema) -> BulkResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut set = ChangeSet::default();
        for (name, value) in values {
            set.insert(name.into(), codec::encode(value.as_ref()), schema)?;
        }
        if set.is_empty() {
            return Err(BulkError::validation("No settings selected for update."));
        }
        Ok(set)
    }

    /// Decode a payload produced by [`ChangeSet::to_payload`].
    ///
    /// Plain JSON is accepted too. Forbidden settings are rejected here so
    /// a tampered payload cannot reach the store.
    pub fn from_payload(payload: &str, schema: &dyn ConfigSchema) -> BulkResult<Self> {
        let payload = payload.trim();
        if payload.is_empty() {
            return Err(BulkError::validation("No changes to apply."));
        }
        let json = match STANDARD.decode(payload) {
            Ok(bytes) => String::from_utf8(bytes)
                .map_err(|_| BulkError::validation("Invalid changes data."))?,
            Err(_) => payload.to_string(),
        };
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&json)
            .map_err(|_| BulkError::validation("Invalid changes data."))?;

        let mut set = ChangeSet::default();
        for (name, value) in map {
            let serde_json::Value::String(encoded) = value else {
                return Err(BulkError::validation(format!(
                    "Invalid value for setting {}.",
                    name
                )));
            };
            set.insert(name, encoded, schema)?;
        }
        if set.is_empty() {
            return Err(BulkError::validation("No changes to apply."));
        }
        Ok(set)
    }

    pub fn to_payload(&self) -> String {
        let map: serde_json::Map<String, serde_json::Value> = self
            .changes
            .iter()
            .map(|c| {
                (
                    c.setting_name.clone(),
                    serde_json::Value::String(c.new_value_encoded.clone()),
                )
            })
            .collect();
        STANDARD.encode(serde_json::Value::Object(map).to_string())
    }

    fn insert(&mut self, name: String, encoded: String, schema: &dyn ConfigSchema) -> BulkResult<()> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(BulkError::validation("Setting name must not be empty."));
        }
        if schema.is_forbidden(&name) {
            return Err(BulkError::validation(format!(
                "Setting {} cannot be bulk-edited.",
                name
            )));
        }
        match self.changes.iter_mut().find(|c| c.setting_name == name) {
            Some(existing) => existing.new_value_encoded = encoded,
            None => self.changes.push(PendingChange {
                setting_name: name,
                new_value_encoded: encoded,
            }),
        }
        Ok(())
    }

    pub fn changes(&self) -> &[PendingChange] {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// One (product, setting) pair whose value would change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PreviewItem {
    pub product_id: i64,
    pub product_name: String,
    pub setting_name: String,
    pub old_value_decoded: String,
    pub new_value_decoded: String,
    pub old_value_encoded: String,
    pub new_value_encoded: String,
}

/// Compare `changes` against the current values of every product.
///
/// Products are visited in the order given; a missing row counts as `""`.
/// Names come from `names`, falling back to `Unknown`.
pub async fn compute_preview(
    store: &dyn SettingsStore,
    product_ids: &[i64],
    names: &HashMap<i64, String>,
    changes: &ChangeSet,
) -> BulkResult<Vec<PreviewItem>> {
    let mut items = Vec::new();
    for &product_id in product_ids {
        let current: HashMap<String, String> = store
            .get_settings(product_id)
            .await?
            .into_iter()
            .map(|row| (row.setting, row.value))
            .collect();
        let product_name = names
            .get(&product_id)
            .cloned()
            .unwrap_or_else(|| "Unknown".to_string());

        for change in changes.changes() {
            let old = current
                .get(&change.setting_name)
                .map(String::as_str)
                .unwrap_or("");
            if old == change.new_value_encoded {
                continue;
            }
            items.push(PreviewItem {
                product_id,
                product_name: product_name.clone(),
                setting_name: change.setting_name.clone(),
                old_value_decoded: codec::display(old),
                new_value_decoded: codec::display(&change.new_value_encoded),
                old_value_encoded: old.to_string(),
                new_value_encoded: change.new_value_encoded.clone(),
            });
        }
    }
    Ok(items)
}
