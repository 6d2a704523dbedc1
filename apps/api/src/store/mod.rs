//! Profile store — keyed lookup of stored candidate records.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::models::profile::Profile;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid profile identifier")]
    InvalidId,

    #[error("failed to read profile record: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed profile record: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Returns the profile for `id`, or None if no such record exists.
    async fn load(&self, id: &str) -> Result<Option<Profile>, StoreError>;
}

/// Directory-backed store reading `<dir>/<id>.json`.
pub struct FsProfileStore {
    dir: PathBuf,
}

impl FsProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ProfileStore for FsProfileStore {
    async fn load(&self, id: &str) -> Result<Option<Profile>, StoreError> {
        // Identifiers map directly to file names; keep them boring.
        if id.is_empty()
            || !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(StoreError::InvalidId);
        }

        let path = self.dir.join(format!("{id}.json"));
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("profile {id:?} not found at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Some(serde_json::from_str(&raw)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE_JSON: &str = r#"{
        "name": "Jordan Smith",
        "email": "jordan@example.com",
        "experience": [
            {"company": "Acme", "title": "Engineer", "start_date": "01/2015", "end_date": "Present"}
        ]
    }"#;

    #[tokio::test]
    async fn test_loads_existing_profile() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("jordan.json"), PROFILE_JSON).unwrap();

        let store = FsProfileStore::new(dir.path());
        let profile = store.load("jordan").await.unwrap().unwrap();
        assert_eq!(profile.name, "Jordan Smith");
        assert_eq!(profile.experience.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_profile_is_none_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsProfileStore::new(dir.path());
        assert!(store.load("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_path_traversal_identifier_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsProfileStore::new(dir.path());
        let err = store.load("../etc/passwd").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidId));
    }

    #[tokio::test]
    async fn test_malformed_record_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "not json").unwrap();

        let store = FsProfileStore::new(dir.path());
        let err = store.load("broken").await.unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
    }
}
