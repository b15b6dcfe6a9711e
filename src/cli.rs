//! # CLI Execution Functions
//!
//! Shell counterparts of the read-only admin views. Tables go to stderr,
//! exported CSV goes to a file.

use anyhow::Result;
use bulkvm::db::change_log::{page_window, total_pages};
use bulkvm::db::Database;
use bulkvm::{codec, export};
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;
use tracing::info;

pub fn run_groups(rt: &Runtime, database: &Database) -> Result<()> {
    let groups = rt.block_on(database.list_groups())?;
    if groups.is_empty() {
        eprintln!("No groups found");
        return Ok(());
    }
    eprintln!("{:<6} {:<30} {:<9} {}", "ID", "NAME", "PRODUCTS", "PRODUCT IDS");
    eprintln!("{}", "-".repeat(70));
    for g in &groups {
        eprintln!(
            "{:<6} {:<30} {:<9} {}",
            g.id,
            g.name,
            g.product_id_list().len(),
            g.product_ids
        );
    }
    Ok(())
}

pub fn run_history(rt: &Runtime, database: &Database, page: i64) -> Result<()> {
    let page = page.max(1);
    let (limit, offset) = page_window(page);
    let rows = rt.block_on(database.change_history(limit, offset))?;
    let total = rt.block_on(database.total_change_count())?;

    eprintln!(
        "Change log page {} of {} ({} entries)",
        page,
        total_pages(total).max(1),
        total
    );
    eprintln!(
        "{:<20} {:<14} {:<18} {:<8} {:<24} {:<20} {}",
        "WHEN", "ADMIN", "GROUP", "PRODUCT", "SETTING", "OLD", "NEW"
    );
    eprintln!("{}", "-".repeat(120));
    for row in &rows {
        eprintln!(
            "{:<20} {:<14} {:<18} {:<8} {:<24} {:<20} {}",
            row.created_at.format("%Y-%m-%d %H:%M:%S"),
            row.admin_label(),
            row.group_label(),
            row.product_id,
            row.setting_name,
            codec::display(row.old_value.as_deref().unwrap_or("")),
            codec::display(row.new_value.as_deref().unwrap_or("")),
        );
    }
    Ok(())
}

pub fn run_export(
    rt: &Runtime,
    database: &Database,
    group_id: i64,
    output: Option<&Path>,
) -> Result<()> {
    let group = rt.block_on(database.require_group(group_id))?;
    let csv = rt.block_on(export::export_group(database, &group))?;
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&csv.filename));
    std::fs::write(&path, csv.body.as_bytes())?;
    info!(group_id, path = %path.display(), "group exported");
    eprintln!("Exported group '{}' to {}", group.name, path.display());
    Ok(())
}
