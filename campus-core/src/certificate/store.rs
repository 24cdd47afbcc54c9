//! Object storage for uploaded files

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::{Error, Result};

/// Minimal key/value object store
///
/// Keys are `/`-separated relative paths such as `certificates/12/toefl`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Check whether an object exists
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Read an object
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Create or overwrite an object
    async fn put(&self, key: &str, data: &[u8]) -> Result<()>;

    /// Delete an object; returns whether it existed
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Keys directly under a prefix, sorted
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Object store backed by a local directory
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Create a store rooted at `root` (created lazily on first write)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a key to a path under the root, refusing anything that escapes it
    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        if key.is_empty() {
            return Err(Error::Storage("Object key must not be empty".to_string()));
        }
        for component in relative.components() {
            match component {
                Component::Normal(_) => {}
                _ => {
                    return Err(Error::Storage(format!("Invalid object key: {}", key)));
                }
            }
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&path).await? && path.is_file())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("Object {}", key)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write beside the target then rename so readers never see a partial object
        let mut tmp = path.clone().into_os_string();
        tmp.push(".partial");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(key, bytes = data.len(), "Object stored");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let dir = self.path_for(prefix)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(".partial") {
                    continue;
                }
                keys.push(format!("{}/{}", prefix.trim_end_matches('/'), name));
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_get_overwrite() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path());

        assert!(!store.exists("a/b").await.unwrap());
        store.put("a/b", b"first").await.unwrap();
        assert!(store.exists("a/b").await.unwrap());
        assert_eq!(store.get("a/b").await.unwrap(), b"first");

        store.put("a/b", b"second").await.unwrap();
        assert_eq!(store.get("a/b").await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_get_missing() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path());
        assert!(matches!(store.get("nope").await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path());

        store.put("x", b"1").await.unwrap();
        assert!(store.delete("x").await.unwrap());
        assert!(!store.delete("x").await.unwrap());
        assert!(!store.exists("x").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_is_sorted_and_skips_dirs() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path());

        store.put("p/zeta", b"z").await.unwrap();
        store.put("p/alpha", b"a").await.unwrap();
        store.put("p/nested/deep", b"d").await.unwrap();

        assert_eq!(
            store.list("p").await.unwrap(),
            vec!["p/alpha".to_string(), "p/zeta".to_string()]
        );
        assert!(store.list("empty").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keys_cannot_escape_root() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path().join("root"));

        for key in ["../outside", "/etc/passwd", "a/../../b", ""] {
            assert!(
                matches!(store.put(key, b"x").await, Err(Error::Storage(_))),
                "key {:?} should be refused",
                key
            );
        }
    }
}
