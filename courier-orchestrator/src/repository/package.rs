//! Package Repository
//!
//! Package metadata only; bodies live in blob storage.

use courier_core::domain::package::Package;
use sqlx::SqlitePool;

/// Insert or replace the metadata of a package version
pub async fn upsert(pool: &SqlitePool, package: &Package) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO packages (id, file_name, content_type, version, uploaded_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            content_type = excluded.content_type,
            uploaded_at = excluded.uploaded_at
        "#,
    )
    .bind(&package.id)
    .bind(&package.file_name)
    .bind(&package.content_type)
    .bind(&package.version)
    .bind(package.uploaded_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Find one version of a package
pub async fn find(
    pool: &SqlitePool,
    file_name: &str,
    version: &str,
) -> Result<Option<Package>, sqlx::Error> {
    let row = sqlx::query_as::<_, PackageRow>(
        r#"
        SELECT id, file_name, content_type, version, uploaded_at
        FROM packages
        WHERE id = ?
        "#,
    )
    .bind(Package::package_id(file_name, version))
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// Find every stored version of a package
pub async fn find_versions(pool: &SqlitePool, file_name: &str) -> Result<Vec<Package>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PackageRow>(
        r#"
        SELECT id, file_name, content_type, version, uploaded_at
        FROM packages
        WHERE file_name = ?
        ORDER BY version
        "#,
    )
    .bind(file_name)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// List all package metadata
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Package>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PackageRow>(
        r#"
        SELECT id, file_name, content_type, version, uploaded_at
        FROM packages
        ORDER BY file_name ASC, uploaded_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct PackageRow {
    id: String,
    file_name: String,
    content_type: String,
    version: String,
    uploaded_at: chrono::DateTime<chrono::Utc>,
}

impl From<PackageRow> for Package {
    fn from(row: PackageRow) -> Self {
        Package {
            id: row.id,
            file_name: row.file_name,
            content_type: row.content_type,
            version: row.version,
            uploaded_at: row.uploaded_at,
            body: None,
        }
    }
}
