// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! HTTP backed repository store.

Objects are fetched with `GET` and stored with `PUT` relative to a base URL.
This matches simple WebDAV-style artifact hosts; anything fancier belongs in
its own [crate::store::RepositoryStore] implementation.
*/

use {
    crate::{
        error::{Result, SyncError},
        store::RepositoryStore,
    },
    async_trait::async_trait,
    reqwest::{Client, IntoUrl, StatusCode, Url},
    std::io::ErrorKind,
};

fn transfer_error(path: &str, what: impl std::fmt::Debug) -> SyncError {
    SyncError::StoreIoPath(
        path.to_string(),
        std::io::Error::new(ErrorKind::Other, format!("{:?}", what)),
    )
}

/// A repository store served over HTTP.
#[derive(Clone, Debug)]
pub struct HttpStore {
    client: Client,
    base_url: Url,
}

impl HttpStore {
    /// Construct an instance bound to a base URL.
    ///
    /// The URL is normalized to end with `/` so object paths join onto it as
    /// children rather than siblings.
    pub fn new(url: impl IntoUrl) -> Result<Self> {
        let mut base_url = url.into_url().map_err(|e| transfer_error("", e))?;

        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    fn object_url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }
}

#[async_trait]
impl RepositoryStore for HttpStore {
    async fn get_path(&self, path: &str) -> Result<Vec<u8>> {
        let res = self
            .client
            .get(self.object_url(path)?)
            .send()
            .await
            .map_err(|e| transfer_error(path, e))?;

        if res.status() == StatusCode::NOT_FOUND {
            return Err(SyncError::StorePathNotFound(path.to_string()));
        }

        let res = res.error_for_status().map_err(|e| transfer_error(path, e))?;

        Ok(res
            .bytes()
            .await
            .map_err(|e| transfer_error(path, e))?
            .to_vec())
    }

    async fn put_path(&self, path: &str, data: &[u8]) -> Result<()> {
        let res = self
            .client
            .put(self.object_url(path)?)
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| transfer_error(path, e))?;

        res.error_for_status().map_err(|e| transfer_error(path, e))?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn base_url_normalization() -> Result<()> {
        let store = HttpStore::new("https://apt.example.com/repo")?;
        assert_eq!(
            store.object_url("dists/stable/Release")?.as_str(),
            "https://apt.example.com/repo/dists/stable/Release"
        );

        let store = HttpStore::new("https://apt.example.com/repo/")?;
        assert_eq!(
            store.object_url("pool/main/f/foo/foo_1.0_amd64.deb")?.as_str(),
            "https://apt.example.com/repo/pool/main/f/foo/foo_1.0_amd64.deb"
        );

        Ok(())
    }
}
