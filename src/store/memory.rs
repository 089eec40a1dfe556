// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! In-memory repository store. */

use {
    crate::{
        error::{Result, SyncError},
        store::RepositoryStore,
    },
    async_trait::async_trait,
    std::{collections::HashMap, sync::Mutex},
};

/// A repository store holding all objects in memory.
///
/// Useful for tests and for dry-running a publish without touching a real
/// repository.
#[derive(Debug, Default)]
pub struct MemoryStore {
    paths: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Obtain the stored object paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths = self
            .paths
            .lock()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        paths.sort();

        paths
    }

    /// Whether an object exists at `path`.
    pub fn contains_path(&self, path: &str) -> bool {
        self.paths.lock().expect("lock poisoned").contains_key(path)
    }
}

#[async_trait]
impl RepositoryStore for MemoryStore {
    async fn get_path(&self, path: &str) -> Result<Vec<u8>> {
        self.paths
            .lock()
            .expect("lock poisoned")
            .get(path)
            .cloned()
            .ok_or_else(|| SyncError::StorePathNotFound(path.to_string()))
    }

    async fn put_path(&self, path: &str, data: &[u8]) -> Result<()> {
        self.paths
            .lock()
            .expect("lock poisoned")
            .insert(path.to_string(), data.to_vec());

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn put_get_overwrite() -> Result<()> {
        let store = MemoryStore::default();

        assert!(!store.contains_path("a/b"));
        assert!(matches!(
            store.get_path("a/b").await,
            Err(SyncError::StorePathNotFound(_))
        ));

        store.put_path("a/b", b"one").await?;
        assert_eq!(store.get_path("a/b").await?, b"one");

        store.put_path("a/b", b"two").await?;
        assert_eq!(store.get_path("a/b").await?, b"two");

        assert_eq!(store.paths(), vec!["a/b".to_string()]);

        Ok(())
    }
}
