//! CSV snapshot of a group's current configuration.
//!
//! The document opens with a UTF-8 BOM so spreadsheet tools pick the right
//! encoding. Quoting matches what PHP's `fputcsv` produces, keeping exports
//! byte-compatible with files admins already have.

use crate::db::{Database, GroupRow};
use crate::store::SettingRow;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

const BOM: &str = "\u{feff}";
const HEADER: [&str; 5] = ["Product ID", "Product Name", "Type", "Setting", "Value"];

pub struct CsvExport {
    pub filename: String,
    pub body: String,
}

fn needs_quotes(field: &str) -> bool {
    field
        .chars()
        .any(|c| matches!(c, ',' | '"' | '\\' | '\n' | '\r' | '\t' | ' '))
}

fn push_field(out: &mut String, field: &str) {
    if needs_quotes(field) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

fn push_record<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, field);
    }
    out.push('\n');
}

/// Render settings rows (already in export order) as a CSV document.
pub fn render_csv(rows: &[SettingRow], names: &HashMap<i64, String>) -> String {
    let mut out = String::from(BOM);
    push_record(&mut out, HEADER);
    for row in rows {
        let id = row.product_id.to_string();
        let name = names.get(&row.product_id).map(String::as_str).unwrap_or("Unknown");
        push_record(
            &mut out,
            [
                id.as_str(),
                name,
                row.kind.as_deref().unwrap_or(""),
                row.setting.as_str(),
                row.decoded_value.as_str(),
            ],
        );
    }
    out
}

/// Keep `[A-Za-z0-9_-]`, map everything else to `_`, squeeze and trim `_`.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            c
        } else {
            '_'
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches('_').to_string()
}

pub fn export_filename(group_name: &str, now: DateTime<Utc>) -> String {
    format!(
        "proxmox_bulk_export_{}_{}.csv",
        sanitize_filename(group_name),
        now.format("%Y-%m-%d_%H%M%S")
    )
}

/// Build the export for every product of `group`.
pub async fn export_group(db: &Database, group: &GroupRow) -> Result<CsvExport> {
    let product_ids = group.product_id_list();
    let rows = db.get_multiple_product_settings(&product_ids).await?;
    let names: HashMap<i64, String> = db
        .product_names(&product_ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();
    Ok(CsvExport {
        filename: export_filename(&group.name, Utc::now()),
        body: render_csv(&rows, &names),
    })
}
