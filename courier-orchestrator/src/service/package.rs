//! Package Service
//!
//! Package uploads split into metadata (execution store) and body (blob
//! storage). Lookups without a version resolve to the greatest version.

use courier_core::domain::package::Package;
use sqlx::SqlitePool;
use std::cmp::Ordering;

use crate::repository::package_repository;
use crate::storage::{FileSystemStorage, StorageError};

/// Service error type
#[derive(Debug)]
pub enum PackageError {
    NotFound(String),
    ValidationError(String),
    StorageError(StorageError),
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for PackageError {
    fn from(err: sqlx::Error) -> Self {
        PackageError::DatabaseError(err)
    }
}

impl From<StorageError> for PackageError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidName(name) => {
                PackageError::ValidationError(format!("Invalid package name: {}", name))
            }
            other => PackageError::StorageError(other),
        }
    }
}

/// Store a package version, replacing an earlier upload of the same version
pub async fn upload_package(
    pool: &SqlitePool,
    storage: &FileSystemStorage,
    file_name: &str,
    version: &str,
    content_type: &str,
    body: &[u8],
) -> Result<String, PackageError> {
    if version.trim().is_empty() {
        return Err(PackageError::ValidationError("Version is required".to_string()));
    }

    storage.save(file_name, version, body).await?;

    let package = Package {
        id: Package::package_id(file_name, version),
        file_name: file_name.to_string(),
        content_type: content_type.to_string(),
        version: version.to_string(),
        uploaded_at: chrono::Utc::now(),
        body: None,
    };
    package_repository::upsert(pool, &package).await?;

    tracing::info!("Package uploaded: {} ({} bytes)", package.id, body.len());
    Ok(package.id)
}

/// Fetch a package with its body; latest version when `version` is `None`
pub async fn get_package(
    pool: &SqlitePool,
    storage: &FileSystemStorage,
    file_name: &str,
    version: Option<&str>,
) -> Result<Package, PackageError> {
    let package = match version {
        Some(version) => package_repository::find(pool, file_name, version).await?,
        None => latest(package_repository::find_versions(pool, file_name).await?),
    };

    let mut package = package.ok_or_else(|| {
        PackageError::NotFound(match version {
            Some(version) => Package::package_id(file_name, version),
            None => file_name.to_string(),
        })
    })?;

    let body = storage
        .read(&package.file_name, &package.version)
        .await?
        .ok_or_else(|| PackageError::NotFound(format!("Body of {}", package.id)))?;
    package.body = Some(body);

    tracing::debug!("Package {} served", package.id);
    Ok(package)
}

/// List package metadata
pub async fn list_packages(pool: &SqlitePool) -> Result<Vec<Package>, PackageError> {
    let packages = package_repository::list_all(pool).await?;
    Ok(packages)
}

/// Picks the greatest version
fn latest(packages: Vec<Package>) -> Option<Package> {
    packages
        .into_iter()
        .max_by(|a, b| compare_versions(&a.version, &b.version))
}

/// Total order over version strings
///
/// Semver versions compare as semver and rank above every other version;
/// the rest compare lexically.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (semver::Version::parse(a), semver::Version::parse(b)) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions("1.10.0", "1.9.0"), Ordering::Greater);
        assert_eq!(compare_versions("1.0.0", "1.0.0-rc.1"), Ordering::Greater);
        assert_eq!(compare_versions("b", "a"), Ordering::Greater);
        assert_eq!(compare_versions("2", "10"), Ordering::Greater);
        assert_eq!(compare_versions("0.0.1", "9.9"), Ordering::Greater);
        assert_eq!(compare_versions("9.9", "0.0.1"), Ordering::Less);
    }

    fn package(version: &str) -> Package {
        Package {
            id: Package::package_id("app.zip", version),
            file_name: "app.zip".to_string(),
            content_type: "application/zip".to_string(),
            version: version.to_string(),
            uploaded_at: chrono::Utc::now(),
            body: None,
        }
    }

    #[test]
    fn test_latest_is_independent_of_order() {
        let versions = ["1.10.0", "1.9.0", "1.2", "latest", "1.0.0-rc.1"];

        // Every rotation plus the reversed list
        let mut orders: Vec<Vec<&str>> = (0..versions.len())
            .map(|shift| {
                let mut order = versions.to_vec();
                order.rotate_left(shift);
                order
            })
            .collect();
        orders.push(versions.iter().rev().copied().collect());

        for order in orders {
            let picked = latest(order.iter().map(|v| package(v)).collect()).unwrap();
            assert_eq!(picked.version, "1.10.0", "order {:?}", order);
        }
    }

    #[test]
    fn test_latest_without_semver_is_lexical() {
        for order in [["2", "10", "1"], ["10", "1", "2"], ["1", "2", "10"]] {
            let picked = latest(order.iter().map(|v| package(v)).collect()).unwrap();
            assert_eq!(picked.version, "2");
        }
    }

    #[tokio::test]
    async fn test_latest_version_wins() {
        let dir = tempfile::tempdir().unwrap();
        let pool = test_pool().await;
        let storage = FileSystemStorage::new(dir.path());

        for version in ["1.2.0", "1.10.0", "1.9.3"] {
            upload_package(&pool, &storage, "app.zip", version, "application/zip", version.as_bytes())
                .await
                .unwrap();
        }

        let latest = get_package(&pool, &storage, "app.zip", None).await.unwrap();
        assert_eq!(latest.version, "1.10.0");
        assert_eq!(latest.body.as_deref(), Some("1.10.0".as_bytes()));

        let pinned = get_package(&pool, &storage, "app.zip", Some("1.2.0"))
            .await
            .unwrap();
        assert_eq!(pinned.id, "app.zip:1.2.0");
    }

    #[tokio::test]
    async fn test_reupload_replaces_version() {
        let dir = tempfile::tempdir().unwrap();
        let pool = test_pool().await;
        let storage = FileSystemStorage::new(dir.path());

        upload_package(&pool, &storage, "app.zip", "1", "application/zip", b"old")
            .await
            .unwrap();
        upload_package(&pool, &storage, "app.zip", "1", "application/zip", b"new")
            .await
            .unwrap();

        assert_eq!(list_packages(&pool).await.unwrap().len(), 1);
        let package = get_package(&pool, &storage, "app.zip", Some("1")).await.unwrap();
        assert_eq!(package.body, Some(b"new".to_vec()));
    }

    #[tokio::test]
    async fn test_missing_package() {
        let dir = tempfile::tempdir().unwrap();
        let pool = test_pool().await;
        let storage = FileSystemStorage::new(dir.path());

        assert!(matches!(
            get_package(&pool, &storage, "nope.zip", None).await,
            Err(PackageError::NotFound(_))
        ));
    }
}
