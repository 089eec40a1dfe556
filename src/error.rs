// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Error handling. */

use thiserror::Error;

/// Primary crate error type.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    #[error("hex parsing error: {0:?}")]
    Hex(#[from] hex::FromHexError),

    #[error("integer parsing error: {0:?}")]
    ParseInt(#[from] std::num::ParseIntError),

    #[error("date parsing error: {0:?}")]
    DateParse(#[from] mailparse::MailParseError),

    #[cfg(feature = "http")]
    #[error("URL error: {0:?}")]
    Url(#[from] url::ParseError),

    #[error("control file parse error: {0}")]
    ControlParseError(String),

    #[error("control file lacks a paragraph")]
    ControlFileNoParagraph,

    #[error("control file not found in package archive")]
    ControlFileNotFound,

    #[error("required control field missing: {0}")]
    ControlRequiredFieldMissing(&'static str),

    #[error("unknown compression in deb archive member: {0}")]
    DebUnknownCompression(String),

    #[error("invalid package file {path}: {source}")]
    PackageInvalid {
        path: String,
        #[source]
        source: Box<SyncError>,
    },

    #[error("unknown architecture: {0}")]
    UnknownArchitecture(String),

    #[error("expected 1 paragraph in release file; got {0}")]
    ReleaseControlParagraphMismatch(usize),

    #[error("digest missing from index entry")]
    ReleaseMissingDigest,

    #[error("size missing from index entry")]
    ReleaseMissingSize,

    #[error("path missing from index entry")]
    ReleaseMissingPath,

    #[error("index entry path unexpectedly has spaces: {0}")]
    ReleasePathWithSpaces(String),

    #[error("checksum sections disagree on size for {0}: {1} != {2}")]
    ReleaseEntrySizeMismatch(String, u64, u64),

    #[error("remote path does not exist: {0}")]
    StorePathNotFound(String),

    #[error("store I/O error on path {0}: {1:?}")]
    StoreIoPath(String, std::io::Error),

    #[error("signing error: {0}")]
    Signing(String),
}

impl SyncError {
    /// Attach the offending package file path to an extraction error.
    pub fn for_package(self, path: impl ToString) -> Self {
        Self::PackageInvalid {
            path: path.to_string(),
            source: Box::new(self),
        }
    }
}

/// Result wrapper for this crate.
pub type Result<T> = std::result::Result<T, SyncError>;
