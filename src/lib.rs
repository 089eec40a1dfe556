// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! APT repository publishing and metadata synchronization.

This crate publishes Debian binary packages into a remote APT repository and
keeps the repository's index metadata consistent as packages are added over
time: the per-architecture `Packages` lists and the top-level `Release`
manifest whose checksum sections must exactly describe every index artifact,
old and new.

# Goals

## Determinism and Reproducibility

Given the same inputs, a publish run should produce byte-for-byte identical
index artifacts: stanza field order is preserved exactly as parsed, index
stanzas keep a stable order across upserts, and manifest checksum sections
are emitted in a fixed order with entries sorted by path. Only the `Date`
field changes between otherwise identical runs.

## Convergence over transactions

Remote stores offer no transactions, so a run is a sequence of individually
durable uploads. Index and manifest updates are idempotent upserts: re-running
a failed publish converges the repository to the desired state.

# A Tour of Functionality

The [control] module defines control-stanza primitives.
[control::ControlParagraph] is an ordered series of [control::ControlField]
and [control::ControlParagraphReader] streams stanzas out of index text.

[package_record::PackageRecord] is the control stanza of one binary package,
with accessors for the identity fields (`Package`, `Version`,
`Architecture`) and the publish-time enrichment (`Filename`, `Size` and the
checksum fields). [deb::extract_package_record] pulls that stanza out of a
`.deb` archive. [architecture::Architecture] enumerates the supported
machine architectures, including the `all` wildcard that expands into every
concrete index.

[packages_index::PackagesIndex] is the per-architecture package list with
replace-by-package-name upsert semantics.
[release::ReleaseManifest] is the suite manifest: repository metadata fields
plus the unified set of [release::ManifestEntry] describing every published
index artifact. [io] holds the single-pass multi-digest engine feeding both.

Repository I/O goes through the [store::RepositoryStore] capability, with
filesystem, in-memory, and (behind the default-on `http` feature) HTTP
backends provided. Signing goes through the [signer::ManifestSigner]
capability; no concrete cryptographic toolchain is linked.

[publish::PackagePublisher] drives the end-to-end run: read the manifest,
ingest packages into indexes, upload pool files and rewritten indexes, and
write back the updated, optionally signed manifest.
*/

pub mod architecture;
pub mod control;
pub mod deb;
pub mod error;
pub mod io;
pub mod package_record;
pub mod packages_index;
pub mod publish;
pub mod release;
pub mod signer;
pub mod store;
