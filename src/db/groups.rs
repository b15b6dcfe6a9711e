//! Product group operations.
//!
//! A group stores its members as comma-joined text. Input is normalized on
//! every write: entries are trimmed, anything that is not a positive integer
//! is dropped, order and duplicates are kept. The first surviving id is the
//! group's template product.

use super::{Database, GroupRow};
use crate::error::{BulkError, BulkResult};

/// Normalize free-form product id input (`" 3, 1,1, abc,2 "` → `"3,1,1,2"`).
///
/// Fails when nothing valid remains.
pub fn normalize_product_ids(text: &str) -> BulkResult<String> {
    let ids = parse_product_ids(text);
    if ids.is_empty() {
        return Err(BulkError::validation("No valid product IDs provided"));
    }
    Ok(ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(","))
}

/// Positive integer ids in input order; invalid entries are skipped.
pub fn parse_product_ids(text: &str) -> Vec<i64> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|s| s.parse::<i64>().ok())
        .filter(|&id| id > 0)
        .collect()
}

/// Form-level checks run before a group is saved. Stricter than
/// [`normalize_product_ids`]: a single malformed entry rejects the form.
pub fn validate_group_form(name: &str, product_ids: &str) -> BulkResult<()> {
    if name.trim().is_empty() || product_ids.trim().is_empty() {
        return Err(BulkError::validation(
            "Group name and product IDs are required.",
        ));
    }
    let all_valid = product_ids.split(',').map(str::trim).all(|s| {
        !s.is_empty()
            && s.bytes().all(|b| b.is_ascii_digit())
            && s.parse::<i64>().map(|id| id > 0).unwrap_or(false)
    });
    if !all_valid {
        return Err(BulkError::validation(
            "Invalid product ID format. Use comma-separated numbers only.",
        ));
    }
    Ok(())
}

impl Database {
    /// All groups, ordered by name.
    pub async fn list_groups(&self) -> BulkResult<Vec<GroupRow>> {
        let rows = sqlx::query_as::<_, GroupRow>(
            "SELECT id, name, product_ids, created_at, updated_at
             FROM mod_proxmox_bulk_groups ORDER BY name ASC, id ASC",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    pub async fn get_group(&self, id: i64) -> BulkResult<Option<GroupRow>> {
        let row = sqlx::query_as::<_, GroupRow>(
            "SELECT id, name, product_ids, created_at, updated_at
             FROM mod_proxmox_bulk_groups WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    /// Like [`Database::get_group`] but unknown ids are a `NotFound` error.
    pub async fn require_group(&self, id: i64) -> BulkResult<GroupRow> {
        self.get_group(id)
            .await?
            .ok_or_else(|| BulkError::not_found("Group not found."))
    }

    /// Create a group and return its id.
    pub async fn create_group(&self, name: &str, product_ids: &str) -> BulkResult<i64> {
        let product_ids = normalize_product_ids(product_ids)?;
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO mod_proxmox_bulk_groups (name, product_ids, created_at, updated_at)
             VALUES ($1, $2, NOW(), NOW())
             RETURNING id",
        )
        .bind(name)
        .bind(&product_ids)
        .fetch_one(self.pool())
        .await?;
        Ok(id)
    }

    /// Update a group's name and members. Returns false for an unknown id.
    pub async fn update_group(&self, id: i64, name: &str, product_ids: &str) -> BulkResult<bool> {
        let product_ids = normalize_product_ids(product_ids)?;
        let result = sqlx::query(
            "UPDATE mod_proxmox_bulk_groups
             SET name = $2, product_ids = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(name)
        .bind(&product_ids)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a group. Change-log rows keep their dangling `group_id`.
    pub async fn delete_group(&self, id: i64) -> BulkResult<bool> {
        let result = sqlx::query("DELETE FROM mod_proxmox_bulk_groups WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_drops_garbage_and_keeps_order() {
        assert_eq!(normalize_product_ids(" 3, 1,1, abc,2 ").unwrap(), "3,1,1,2");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize_product_ids("10, 4 ,x,4").unwrap();
        assert_eq!(normalize_product_ids(&once).unwrap(), once);
    }

    #[test]
    fn normalize_rejects_non_positive_and_non_integers() {
        assert_eq!(normalize_product_ids("0,-1,1.5,1e3,+2,5").unwrap(), "5");
    }

    #[test]
    fn normalize_strips_leading_zeros() {
        assert_eq!(normalize_product_ids("007, 08").unwrap(), "7,8");
    }

    #[test]
    fn normalize_empty_is_validation_error() {
        for input in ["", " , ,", "abc", "0"] {
            let err = normalize_product_ids(input).unwrap_err();
            assert!(matches!(err, BulkError::Validation(_)), "input {:?}", input);
            assert_eq!(err.to_string(), "No valid product IDs provided");
        }
    }

    #[test]
    fn parse_skips_overflowing_ids() {
        assert_eq!(parse_product_ids("99999999999999999999,2"), vec![2]);
    }

    #[test]
    fn form_requires_name_and_ids() {
        assert!(validate_group_form("", "1,2").is_err());
        assert!(validate_group_form("web", "  ").is_err());
        assert!(validate_group_form("web", "1, 2,3").is_ok());
    }

    #[test]
    fn form_rejects_any_malformed_entry() {
        let err = validate_group_form("web", "1,abc,2").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid product ID format. Use comma-separated numbers only."
        );
        assert!(validate_group_form("web", "1,,2").is_err());
        assert!(validate_group_form("web", "1,0").is_err());
    }
}
