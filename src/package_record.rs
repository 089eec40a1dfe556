// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Binary package metadata records.

A [PackageRecord] is the control stanza describing one binary package, as
extracted from a `.deb` or parsed from a `Packages` index. It is a thin
wrapper around [ControlParagraph] adding accessors for the identity fields
and the repository-side enrichment performed at publish time.
*/

use {
    crate::{
        architecture::Architecture,
        control::ControlParagraph,
        error::{Result, SyncError},
        io::MultiContentDigest,
    },
    std::ops::{Deref, DerefMut},
};

/// A binary package control stanza.
///
/// Identity fields (`Package`, `Version`, `Architecture`) are mandatory and
/// have accessors that error when absent. Everything else is reachable
/// through the inner [ControlParagraph] via [Deref].
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PackageRecord<'a> {
    paragraph: ControlParagraph<'a>,
}

impl<'a> Deref for PackageRecord<'a> {
    type Target = ControlParagraph<'a>;

    fn deref(&self) -> &Self::Target {
        &self.paragraph
    }
}

impl<'a> DerefMut for PackageRecord<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.paragraph
    }
}

impl<'a> From<ControlParagraph<'a>> for PackageRecord<'a> {
    fn from(paragraph: ControlParagraph<'a>) -> Self {
        Self { paragraph }
    }
}

impl<'a> From<PackageRecord<'a>> for ControlParagraph<'a> {
    fn from(record: PackageRecord<'a>) -> Self {
        record.paragraph
    }
}

impl<'a> PackageRecord<'a> {
    /// The `Package` field value.
    pub fn package(&self) -> Result<&str> {
        self.required_field_str("Package")
    }

    /// The `Version` field as its original string.
    pub fn version_str(&self) -> Result<&str> {
        self.required_field_str("Version")
    }

    /// The `Architecture` field, resolved to an [Architecture].
    pub fn architecture(&self) -> Result<Architecture> {
        Architecture::resolve(self.required_field_str("Architecture")?)
    }

    /// Compute the pool path this package's `.deb` occupies in the repository.
    ///
    /// The layout is `pool/<component>/<first letter>/<name>/<name>_<version>_<arch>.deb`.
    /// A single pool file serves every index the package is listed in.
    pub fn pool_path(&self, component: &str) -> Result<String> {
        let package = self.package()?;
        let letter = package
            .chars()
            .next()
            .ok_or(SyncError::ControlRequiredFieldMissing("Package"))?;

        Ok(format!(
            "pool/{}/{}/{}/{}_{}_{}.deb",
            component,
            letter,
            package,
            package,
            self.version_str()?,
            self.architecture()?
        ))
    }

    /// Append the repository-side fields describing the stored `.deb`.
    ///
    /// Adds `Filename`, `Size`, `MD5sum`, `SHA1`, and `SHA256` at the end of
    /// the stanza, leaving every extracted field untouched. Checksum field
    /// names follow the `Packages` index convention, which differs in case
    /// from the `Release` section names.
    pub fn append_file_info(&mut self, filename: String, size: u64, digests: &MultiContentDigest) {
        self.paragraph
            .append_field_from_string("Filename".into(), filename.into());
        self.paragraph
            .append_field_from_string("Size".into(), size.to_string().into());
        self.paragraph
            .append_field_from_string("MD5sum".into(), digests.md5.digest_hex().into());
        self.paragraph
            .append_field_from_string("SHA1".into(), digests.sha1.digest_hex().into());
        self.paragraph
            .append_field_from_string("SHA256".into(), digests.sha256.digest_hex().into());
    }
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::{control::ControlParagraphReader, io::digest_reader},
        indoc::indoc,
    };

    fn record_from(source: &str) -> PackageRecord<'static> {
        let paragraph = ControlParagraphReader::new(std::io::Cursor::new(source))
            .next()
            .unwrap()
            .unwrap();

        PackageRecord::from(paragraph)
    }

    #[test]
    fn identity_fields() -> Result<()> {
        let record = record_from(indoc! {"
            Package: foo
            Version: 1.0-1
            Architecture: amd64
        "});

        assert_eq!(record.package()?, "foo");
        assert_eq!(record.version_str()?, "1.0-1");
        assert_eq!(record.architecture()?, Architecture::Amd64);

        let incomplete = record_from("Package: foo\n");
        assert!(matches!(
            incomplete.version_str(),
            Err(SyncError::ControlRequiredFieldMissing("Version"))
        ));

        Ok(())
    }

    #[test]
    fn pool_paths() -> Result<()> {
        let record = record_from(indoc! {"
            Package: foo
            Version: 1.0
            Architecture: amd64
        "});
        assert_eq!(record.pool_path("main")?, "pool/main/f/foo/foo_1.0_amd64.deb");

        let record = record_from(indoc! {"
            Package: zstd-tools
            Version: 1.4.8+dfsg-2.1
            Architecture: all
        "});
        assert_eq!(
            record.pool_path("contrib")?,
            "pool/contrib/z/zstd-tools/zstd-tools_1.4.8+dfsg-2.1_all.deb"
        );

        Ok(())
    }

    #[test]
    fn enrichment_appends_without_reordering() -> Result<()> {
        let source = indoc! {"
            Package: foo
            Version: 1.0
            Architecture: amd64
            Maintainer: Someone <someone@example.com>
            Description: An example
             spanning two lines
        "};
        let mut record = record_from(source);

        let (size, digests) = digest_reader(&mut std::io::Cursor::new(b"hello world"))?;
        record.append_file_info("pool/main/f/foo/foo_1.0_amd64.deb".to_string(), size, &digests);

        let expected = indoc! {"
            Package: foo
            Version: 1.0
            Architecture: amd64
            Maintainer: Someone <someone@example.com>
            Description: An example
             spanning two lines
            Filename: pool/main/f/foo/foo_1.0_amd64.deb
            Size: 11
            MD5sum: 5eb63bbbe01eeed093cb22bb8f5acdc3
            SHA1: 2aae6c35c94fcfb415dbe95f408b9ce91ee846ed
            SHA256: b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9
        "};
        assert_eq!(record.to_string(), expected);

        Ok(())
    }
}
