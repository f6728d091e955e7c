use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::warn;

use crate::error::{AuthError, Result};
use crate::store::SessionStore;

/// File-backed session store: one file per key under a configured directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Keys contain namespace separators (`auth:user`); map them to safe
    /// filenames before touching the filesystem.
    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        self.dir.join(name)
    }

    async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AuthError::Storage(format!("create {}: {}", self.dir.display(), e)))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                // An unreadable entry reads as absent; the caller falls back
                // to a network fetch rather than failing the whole flow.
                warn!(key = %key, error = %e, "Session store read failed");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_dir().await?;
        let path = self.path_for(key);
        write_atomic(&path, value)
            .await
            .map_err(|e| AuthError::Storage(format!("write {}: {}", path.display(), e)))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Storage(format!(
                "remove {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

/// Write via a sibling temp file and rename so a crash mid-write never
/// leaves a truncated value behind.
async fn write_atomic(path: &Path, value: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, value).await?;
    tokio::fs::rename(&tmp, path).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());

        store.set("auth:user", r#"{"a":1}"#).await.unwrap();
        assert_eq!(
            store.get("auth:user").await.unwrap().as_deref(),
            Some(r#"{"a":1}"#)
        );

        store.set("auth:user", "replaced").await.unwrap();
        assert_eq!(
            store.get("auth:user").await.unwrap().as_deref(),
            Some("replaced")
        );
    }

    #[tokio::test]
    async fn absent_key_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        assert!(store.get("auth:user").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());

        store.set("auth:id_token", "tok").await.unwrap();
        store.remove("auth:id_token").await.unwrap();
        store.remove("auth:id_token").await.unwrap();
        assert!(store.get("auth:id_token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn keys_do_not_collide_with_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());

        store.set("auth:user", "u").await.unwrap();
        store.set("auth/user", "v").await.unwrap();
        // Both sanitize to the same filename; last write wins, no traversal
        assert_eq!(store.get("auth:user").await.unwrap().as_deref(), Some("v"));
    }
}
