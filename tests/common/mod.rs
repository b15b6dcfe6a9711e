//! Shared test helpers for integration tests.

#![allow(dead_code)]

use bulkvm::schema::ModuleType;
use tokio::sync::OnceCell;

/// Returns the test database URL from the `TEST_DATABASE_URL` environment variable.
/// Panics if the variable is not set.
pub fn test_db_url() -> String {
    std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set for integration tests")
}

/// Returns true if the test database URL is configured.
pub fn has_test_db() -> bool {
    std::env::var("TEST_DATABASE_URL").is_ok()
}

static SCHEMA_INIT: OnceCell<()> = OnceCell::const_new();

/// Create the platform stand-in tables and apply our migrations, once per
/// test binary.
pub async fn ensure_schema() {
    SCHEMA_INIT
        .get_or_init(|| async {
            let pool = sqlx::PgPool::connect(&test_db_url()).await.unwrap();
            run_sql_files(&pool).await;
            pool.close().await;
        })
        .await;
}

/// Connect to a clean test database using the `cloud` configuration table.
pub async fn setup_test_db() -> bulkvm::db::Database {
    setup_test_db_with(ModuleType::Cloud).await
}

pub async fn setup_test_db_with(module: ModuleType) -> bulkvm::db::Database {
    ensure_schema().await;
    let db = bulkvm::db::Database::open(&test_db_url(), Some(module))
        .await
        .expect("Failed to connect to test database");
    reset_tables(db.pool()).await;
    db
}

/// Build an Axum test app router connected to a clean test database.
pub async fn build_test_app() -> axum::Router {
    build_test_app_with_db().await.0
}

/// Like [`build_test_app`], also returning a handle for seeding and checks.
pub async fn build_test_app_with_db() -> (axum::Router, bulkvm::db::Database) {
    let db = setup_test_db().await;
    let state = bulkvm::dashboard::AppState::with_db(db.clone());
    (bulkvm::dashboard::build_router(state, None), db)
}

/// Truncate everything and re-seed admins and products.
///
/// Admins: 1 `root`, 2 `ops` (enabled), 3 `retired` (disabled).
/// Products: 101 `VPS Small`, 102 `VPS Medium`, 103 `VPS Large`.
pub async fn reset_tables(pool: &sqlx::PgPool) {
    sqlx::raw_sql(
        r#"TRUNCATE TABLE mod_proxmox_bulk_groups, mod_proxmox_bulk_change_log,
                          tblproducts, tbladmins, tbladdonmodules,
                          "ProxmoxVeVpsCloud_ProductConfiguration",
                          "ProxmoxAddon_ProductConfiguration"
           RESTART IDENTITY"#,
    )
    .execute(pool)
    .await
    .unwrap();

    sqlx::raw_sql(
        "INSERT INTO tbladmins (id, username, disabled) VALUES
           (1, 'root', 0), (2, 'ops', 0), (3, 'retired', 1);
         INSERT INTO tblproducts (id, name) VALUES
           (101, 'VPS Small'), (102, 'VPS Medium'), (103, 'VPS Large');",
    )
    .execute(pool)
    .await
    .unwrap();
}

/// Seed one raw (already encoded) cloud configuration row.
pub async fn seed_cloud_setting(pool: &sqlx::PgPool, product_id: i32, setting: &str, raw: &str) {
    sqlx::query(
        r#"INSERT INTO "ProxmoxVeVpsCloud_ProductConfiguration" (product_id, "type", setting, value)
           VALUES ($1, 'product', $2, $3)"#,
    )
    .bind(product_id)
    .bind(setting)
    .bind(raw)
    .execute(pool)
    .await
    .unwrap();
}

async fn run_sql_files(pool: &sqlx::PgPool) {
    let files = [
        "tests/fixtures/platform_tables.sql",
        "migrations/001_bulk_tables.sql",
    ];

    for file in &files {
        let path = std::path::Path::new(file);
        if !path.exists() {
            panic!("SQL file not found: {}", file);
        }
        let sql = std::fs::read_to_string(path).unwrap();
        sqlx::raw_sql(&sql).execute(pool).await.unwrap_or_else(|e| {
            panic!("{} failed: {}", file, e);
        });
    }
}
