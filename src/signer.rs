// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Manifest signing capability.

Clients only trust a repository whose `Release` manifest carries a valid
signature, published as a detached `Release.gpg` next to the manifest and as
a cleartext-signed `InRelease` combining both. Signature production is
delegated to an injected [ManifestSigner]; this crate never depends on a
concrete cryptographic toolchain.
*/

use crate::error::Result;

/// The two signature renditions a published manifest carries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SignatureMode {
    /// A detached signature over the manifest bytes (`Release.gpg`).
    Detached,
    /// A cleartext-signed document embedding the manifest (`InRelease`).
    Cleartext,
}

/// Produces signatures over serialized manifest bytes.
///
/// Implementations wrap whatever signing backend the deployment uses (a gpg
/// invocation, an in-process PGP implementation, a signing service). Errors
/// should surface as [crate::error::SyncError::Signing].
pub trait ManifestSigner {
    /// Sign `data`, returning the signature artifact for `mode`.
    fn sign(&self, data: &[u8], mode: SignatureMode) -> Result<Vec<u8>>;
}
