// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Repository publishing.

[PackagePublisher] drives one publish run end to end: load the suite's
`Release` manifest (or seed a fresh one), ingest each `.deb` into the
per-architecture `Packages` indexes, upload pool files and rewritten
indexes, and write back a manifest whose checksum sections describe every
index artifact the repository now carries.

A run is strictly sequential and not transactional: uploads are individually
durable, and a failed run is recovered by re-running after fixing the cause,
which is safe because index and manifest updates are idempotent upserts.
Concurrent runs against the same suite must be serialized externally.
*/

use {
    crate::{
        architecture::Architecture,
        deb::extract_package_record,
        error::{Result, SyncError},
        io::{digest_reader, gzip_compress, gzip_decompress},
        package_record::PackageRecord,
        packages_index::PackagesIndex,
        release::{ManifestEntry, ReleaseManifest},
        signer::{ManifestSigner, SignatureMode},
        store::RepositoryStore,
    },
    std::{collections::BTreeMap, io::Cursor, path::PathBuf},
};

/// Describes the target suite of a publish run.
#[derive(Clone, Debug)]
pub struct PublishConfig {
    /// The suite/codename indexes are published under (`dists/<codename>/`).
    pub codename: String,
    /// The repository component packages are filed under.
    pub component: String,
}

/// Represents a publishing event.
pub enum PublishEvent {
    /// No package files were supplied; the run is a no-op.
    NothingToPublish,

    /// The manifest at the given path does not exist and will be created.
    ManifestAbsent(String),

    /// A `.deb` was written to its pool path.
    PoolArtifactWritten(String, u64),

    /// The index at the given path does not exist and will be created.
    IndexAbsent(String),

    /// An index artifact that was written.
    IndexWritten(String, u64),

    /// The manifest was written.
    ManifestWritten(String, u64),

    /// A signature companion document was written.
    SignatureWritten(String),
}

impl std::fmt::Display for PublishEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NothingToPublish => {
                write!(f, "no package files to publish")
            }
            Self::ManifestAbsent(path) => {
                write!(f, "{} does not exist; creating", path)
            }
            Self::PoolArtifactWritten(path, size) => {
                write!(f, "wrote {} bytes to {}", size, path)
            }
            Self::IndexAbsent(path) => {
                write!(f, "{} does not exist; creating", path)
            }
            Self::IndexWritten(path, size) => {
                write!(f, "wrote {} bytes to {}", size, path)
            }
            Self::ManifestWritten(path, size) => {
                write!(f, "wrote {} bytes to {}", size, path)
            }
            Self::SignatureWritten(path) => {
                write!(f, "wrote signature to {}", path)
            }
        }
    }
}

/// Publishes binary packages into a repository and keeps its metadata
/// consistent.
pub struct PackagePublisher<'a> {
    store: &'a dyn RepositoryStore,
    signer: Option<&'a dyn ManifestSigner>,
    codename: String,
    component: String,
}

impl<'a> PackagePublisher<'a> {
    /// Construct a publisher against a store for the configured suite.
    pub fn new(store: &'a dyn RepositoryStore, config: PublishConfig) -> Self {
        Self {
            store,
            signer: None,
            codename: config.codename,
            component: config.component,
        }
    }

    /// Register a signer. The manifest is published unsigned otherwise.
    pub fn set_signer(&mut self, signer: &'a dyn ManifestSigner) {
        self.signer = Some(signer);
    }

    fn packages_base_path(&self, architecture: Architecture) -> String {
        format!("{}/binary-{}/Packages", self.component, architecture)
    }

    fn packages_path(&self, architecture: Architecture) -> String {
        format!(
            "dists/{}/{}",
            self.codename,
            self.packages_base_path(architecture)
        )
    }

    fn release_path(&self) -> String {
        format!("dists/{}/Release", self.codename)
    }

    fn inrelease_path(&self) -> String {
        format!("dists/{}/InRelease", self.codename)
    }

    /// Publish a set of `.deb` files.
    ///
    /// Fails on the first error. Already-completed uploads are left in
    /// place; re-running after fixing the cause converges the repository.
    pub async fn publish<F>(&self, package_files: &[PathBuf], progress_cb: &Option<F>) -> Result<()>
    where
        F: Fn(PublishEvent),
    {
        if package_files.is_empty() {
            if let Some(cb) = progress_cb {
                cb(PublishEvent::NothingToPublish);
            }

            return Ok(());
        }

        let mut manifest = self.load_manifest(progress_cb).await?;

        // Ingest every package file and upload it to the pool. Records are
        // grouped by the architecture index they will land in, with the
        // wildcard expanding to every concrete architecture.
        let mut records_per_arch: BTreeMap<Architecture, Vec<PackageRecord<'static>>> =
            BTreeMap::new();

        for file in package_files {
            let display = file.display().to_string();

            let data = std::fs::read(file)?;

            let mut record = extract_package_record(Cursor::new(&data[..]))
                .map_err(|e| e.for_package(&display))?;

            let architecture = record.architecture().map_err(|e| e.for_package(&display))?;
            let pool_path = record
                .pool_path(&self.component)
                .map_err(|e| e.for_package(&display))?;

            let (size, digests) = digest_reader(&mut Cursor::new(&data[..]))?;
            record.append_file_info(pool_path.clone(), size, &digests);

            self.store.put_path(&pool_path, &data).await?;
            if let Some(cb) = progress_cb {
                cb(PublishEvent::PoolArtifactWritten(pool_path, size));
            }

            for target in architecture.expand() {
                records_per_arch
                    .entry(target)
                    .or_default()
                    .push(record.clone());
            }
        }

        // Rewrite the index of every touched architecture and collect the
        // manifest entries describing the uploaded artifacts.
        let mut new_entries = vec![];

        for (architecture, records) in records_per_arch {
            let mut index = self.load_index(architecture, progress_cb).await?;

            for record in records {
                index.upsert(record)?;
            }

            let plain = index.to_vec()?;
            let compressed = gzip_compress(&plain)?;

            let base_path = self.packages_base_path(architecture);
            let remote_path = self.packages_path(architecture);

            let (size, digests) = digest_reader(&mut Cursor::new(&plain[..]))?;
            self.store.put_path(&remote_path, &plain).await?;
            if let Some(cb) = progress_cb {
                cb(PublishEvent::IndexWritten(remote_path.clone(), size));
            }
            new_entries.push(ManifestEntry::new(&base_path, size, &digests));

            let (size, digests) = digest_reader(&mut Cursor::new(&compressed[..]))?;
            let remote_path = format!("{}.gz", remote_path);
            self.store.put_path(&remote_path, &compressed).await?;
            if let Some(cb) = progress_cb {
                cb(PublishEvent::IndexWritten(remote_path, size));
            }
            new_entries.push(ManifestEntry::new(format!("{}.gz", base_path), size, &digests));
        }

        // Carry forward entries for artifacts untouched by this run and
        // overwrite the ones just republished.
        let mut files = manifest.files().clone();
        for entry in new_entries {
            files.insert(entry.path().to_string(), entry);
        }
        manifest.set_files(files);

        let release_data = manifest.save()?;
        let release_path = self.release_path();
        self.store.put_path(&release_path, &release_data).await?;
        if let Some(cb) = progress_cb {
            cb(PublishEvent::ManifestWritten(
                release_path,
                release_data.len() as u64,
            ));
        }

        if let Some(signer) = self.signer {
            let signature = signer.sign(&release_data, SignatureMode::Detached)?;
            let signature_path = format!("{}.gpg", self.release_path());
            self.store.put_path(&signature_path, &signature).await?;
            if let Some(cb) = progress_cb {
                cb(PublishEvent::SignatureWritten(signature_path));
            }

            let inrelease = signer.sign(&release_data, SignatureMode::Cleartext)?;
            let inrelease_path = self.inrelease_path();
            self.store.put_path(&inrelease_path, &inrelease).await?;
            if let Some(cb) = progress_cb {
                cb(PublishEvent::SignatureWritten(inrelease_path));
            }
        }

        Ok(())
    }

    async fn load_manifest<F>(&self, progress_cb: &Option<F>) -> Result<ReleaseManifest<'static>>
    where
        F: Fn(PublishEvent),
    {
        let path = self.release_path();

        match self.store.get_path(&path).await {
            Ok(data) => ReleaseManifest::from_reader(Cursor::new(data)),
            Err(SyncError::StorePathNotFound(_)) => {
                if let Some(cb) = progress_cb {
                    cb(PublishEvent::ManifestAbsent(path));
                }

                Ok(ReleaseManifest::new(&self.codename, &self.component))
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch an architecture's index, gunzipping the stored form.
    ///
    /// An absent index means the architecture has never been published and
    /// starts empty. Anything else that prevents parsing is fatal.
    async fn load_index<F>(
        &self,
        architecture: Architecture,
        progress_cb: &Option<F>,
    ) -> Result<PackagesIndex<'static>>
    where
        F: Fn(PublishEvent),
    {
        let path = format!("{}.gz", self.packages_path(architecture));

        match self.store.get_path(&path).await {
            Ok(data) => {
                let plain = gzip_decompress(&data)?;

                PackagesIndex::from_reader(architecture, Cursor::new(plain))
            }
            Err(SyncError::StorePathNotFound(_)) => {
                if let Some(cb) = progress_cb {
                    cb(PublishEvent::IndexAbsent(path));
                }

                Ok(PackagesIndex::new(architecture))
            }
            Err(e) => Err(e),
        }
    }
}
