// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Remote object store abstraction.

All durable repository state lives in a remote object store reached through
the two-method [RepositoryStore] trait. Any protocol works behind it;
concrete backends are injected, not subclassed. An absent object is a
distinct, recoverable condition ([crate::error::SyncError::StorePathNotFound])
because the synchronizer treats "no index yet" and "no manifest yet" as
"create new".
*/

use {crate::error::Result, async_trait::async_trait};

pub mod filesystem;
#[cfg(feature = "http")]
pub mod http;
pub mod memory;

/// Transport-agnostic access to the objects of one repository.
///
/// Paths are relative to the repository root, e.g.
/// `dists/stable/Release` or `pool/main/f/foo/foo_1.0_amd64.deb`.
#[async_trait]
pub trait RepositoryStore: Sync {
    /// Fetch the full content of the object at `path`.
    ///
    /// Fails with [crate::error::SyncError::StorePathNotFound] if no object
    /// exists at the path and [crate::error::SyncError::StoreIoPath] for
    /// transfer failures.
    async fn get_path(&self, path: &str) -> Result<Vec<u8>>;

    /// Store `data` as the object at `path`, replacing any existing object.
    async fn put_path(&self, path: &str, data: &[u8]) -> Result<()>;
}
