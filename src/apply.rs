//! # Apply: Bulk Write Orchestrator
//!
//! Fans a previewed [`ChangeSet`] out over every product of a group. Each
//! (product, setting) pair is read, written and logged on its own; a failure
//! is recorded in the [`ApplyReport`] and the loop moves on. Nothing is
//! rolled back, so a partially applied group is a normal outcome.

use crate::preview::{ChangeSet, PendingChange};
use crate::store::{ActorContext, ChangeRecorder, NewChange, SettingsStore};
use anyhow::{bail, Result};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub success_count: usize,
    pub error_count: usize,
    /// `Product {id}, Setting {name}: {message}` per failed pair.
    pub errors: Vec<String>,
    pub product_count: usize,
}

impl ApplyReport {
    pub fn is_complete(&self) -> bool {
        self.error_count == 0
    }
}

/// Write every pending change to every product, logging each success.
pub async fn apply_changes(
    store: &dyn SettingsStore,
    recorder: &dyn ChangeRecorder,
    actor: &ActorContext,
    group_id: Option<i64>,
    product_ids: &[i64],
    changes: &ChangeSet,
) -> ApplyReport {
    let mut report = ApplyReport {
        product_count: product_ids.len(),
        ..ApplyReport::default()
    };

    for &product_id in product_ids {
        for change in changes.changes() {
            match apply_one(store, recorder, actor, group_id, product_id, change).await {
                Ok(()) => report.success_count += 1,
                Err(e) => {
                    warn!(
                        product_id,
                        setting = %change.setting_name,
                        error = %e,
                        "bulk write failed"
                    );
                    report.error_count += 1;
                    report.errors.push(format!(
                        "Product {}, Setting {}: {}",
                        product_id, change.setting_name, e
                    ));
                }
            }
        }
    }

    info!(
        group_id,
        admin_id = actor.admin_id,
        products = report.product_count,
        success = report.success_count,
        errors = report.error_count,
        "bulk apply finished"
    );
    report
}

async fn apply_one(
    store: &dyn SettingsStore,
    recorder: &dyn ChangeRecorder,
    actor: &ActorContext,
    group_id: Option<i64>,
    product_id: i64,
    change: &PendingChange,
) -> Result<()> {
    let old_value = store
        .get_setting_value(product_id, &change.setting_name)
        .await?;
    let written = store
        .update_setting(
            product_id,
            &change.setting_name,
            &change.new_value_encoded,
            true,
        )
        .await?;
    if !written {
        bail!("no row was written");
    }
    recorder
        .record_change(
            actor,
            NewChange {
                group_id,
                product_id,
                setting_name: &change.setting_name,
                old_value: &old_value,
                new_value: &change.new_value_encoded,
            },
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ModuleType;
    use crate::store::memory::{MemoryRecorder, MemoryStore};

    fn changes(pairs: &[(&str, &str)]) -> ChangeSet {
        ChangeSet::from_form(pairs.iter().copied(), ModuleType::Cloud.schema()).unwrap()
    }

    #[tokio::test]
    async fn one_failing_pair_does_not_stop_the_rest() {
        let store = MemoryStore::new()
            .with(1, "onboot", "\"on\"")
            .with(2, "onboot", "\"on\"")
            .with(3, "onboot", "\"on\"")
            .failing_for(2, "tags");
        let recorder = MemoryRecorder::default();
        let set = changes(&[("onboot", "off"), ("tags", "web")]);

        let report = apply_changes(
            &store,
            &recorder,
            &ActorContext::session(4),
            Some(9),
            &[1, 2, 3],
            &set,
        )
        .await;

        assert_eq!(report.success_count, 5);
        assert_eq!(report.error_count, 1);
        assert_eq!(report.product_count, 3);
        assert!(!report.is_complete());
        assert!(report.errors[0].starts_with("Product 2, Setting tags: "));

        assert_eq!(store.raw(3, "tags").unwrap(), "\"web\"");
        assert_eq!(store.raw(2, "onboot").unwrap(), "\"off\"");
        assert!(store.raw(2, "tags").is_none());
        assert_eq!(recorder.entries.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn log_entries_carry_old_and_new_encodings() {
        let store = MemoryStore::new().with(7, "onboot", "\"on\"");
        let recorder = MemoryRecorder::default();
        let set = changes(&[("onboot", "off")]);

        let report = apply_changes(
            &store,
            &recorder,
            &ActorContext::fallback(None),
            Some(1),
            &[7],
            &set,
        )
        .await;
        assert!(report.is_complete());

        let entries = recorder.entries.lock().unwrap();
        assert_eq!(entries[0].admin_id, 0);
        assert_eq!(entries[0].group_id, Some(1));
        assert_eq!(entries[0].old_value, "\"on\"");
        assert_eq!(entries[0].new_value, "\"off\"");
    }

    #[tokio::test]
    async fn values_are_written_without_reencoding() {
        let store = MemoryStore::new();
        let recorder = MemoryRecorder::default();
        let set = changes(&[("tags", "a/b")]);

        apply_changes(&store, &recorder, &ActorContext::session(1), None, &[1], &set).await;
        assert_eq!(store.raw(1, "tags").unwrap(), r#""a\/b""#);
        assert_eq!(store.writes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reapplying_same_value_still_writes() {
        let store = MemoryStore::new().with(1, "onboot", "\"off\"");
        let recorder = MemoryRecorder::default();
        let set = changes(&[("onboot", "off")]);

        let report =
            apply_changes(&store, &recorder, &ActorContext::session(1), None, &[1], &set).await;
        assert_eq!(report.success_count, 1);
        assert_eq!(store.writes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unwritten_row_counts_as_error_and_is_not_logged() {
        let store = MemoryStore::new()
            .with(1, "onboot", "\"on\"")
            .with(2, "onboot", "\"on\"")
            .unwritten_for(1, "onboot");
        let recorder = MemoryRecorder::default();
        let set = changes(&[("onboot", "off")]);

        let report = apply_changes(
            &store,
            &recorder,
            &ActorContext::session(3),
            Some(5),
            &[1, 2],
            &set,
        )
        .await;

        assert_eq!(report.success_count, 1);
        assert_eq!(report.error_count, 1);
        assert_eq!(
            report.errors,
            vec!["Product 1, Setting onboot: no row was written".to_string()]
        );
        assert_eq!(store.raw(1, "onboot").unwrap(), "\"on\"");
        assert_eq!(store.raw(2, "onboot").unwrap(), "\"off\"");

        let entries = recorder.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].product_id, 2);
    }

    #[tokio::test]
    async fn failed_log_append_is_reported_after_the_write() {
        let store = MemoryStore::new()
            .with(1, "onboot", "\"on\"")
            .with(2, "onboot", "\"on\"");
        let recorder = MemoryRecorder::failing();
        let set = changes(&[("onboot", "off")]);

        let report = apply_changes(
            &store,
            &recorder,
            &ActorContext::session(3),
            None,
            &[1, 2],
            &set,
        )
        .await;

        assert_eq!(report.success_count, 0);
        assert_eq!(report.error_count, 2);
        assert_eq!(report.product_count, 2);
        assert_eq!(
            report.errors,
            vec![
                "Product 1, Setting onboot: change log unavailable".to_string(),
                "Product 2, Setting onboot: change log unavailable".to_string(),
            ]
        );
        // Nothing is rolled back: the value stays written without a log entry.
        assert_eq!(store.raw(1, "onboot").unwrap(), "\"off\"");
        assert_eq!(store.raw(2, "onboot").unwrap(), "\"off\"");
        assert_eq!(store.writes.lock().unwrap().len(), 2);
        assert!(recorder.entries.lock().unwrap().is_empty());
    }
}
