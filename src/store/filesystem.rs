// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Filesystem backed repository store. */

use {
    crate::{
        error::{Result, SyncError},
        store::RepositoryStore,
    },
    async_trait::async_trait,
    std::path::{Path, PathBuf},
};

/// A repository store rooted at a local directory.
///
/// Useful for repositories served from a mounted share or staged locally
/// before an out-of-band sync.
#[derive(Clone, Debug)]
pub struct FilesystemStore {
    root_dir: PathBuf,
}

impl FilesystemStore {
    /// Construct a new instance, bound to the root directory specified.
    ///
    /// No validation of the passed path is performed. The directory does not
    /// need to exist until the first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            root_dir: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl RepositoryStore for FilesystemStore {
    async fn get_path(&self, path: &str) -> Result<Vec<u8>> {
        let file_path = self.root_dir.join(path);

        std::fs::read(&file_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SyncError::StorePathNotFound(path.to_string())
            } else {
                SyncError::StoreIoPath(path.to_string(), e)
            }
        })
    }

    async fn put_path(&self, path: &str, data: &[u8]) -> Result<()> {
        let dest_path = self.root_dir.join(path);

        if let Some(parent) = dest_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SyncError::StoreIoPath(path.to_string(), e))?;
        }

        std::fs::write(&dest_path, data).map_err(|e| SyncError::StoreIoPath(path.to_string(), e))
    }
}
