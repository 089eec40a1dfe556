// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! `Release` manifest primitives.

The `Release` file is the top-level description of a suite: repository
metadata fields plus checksum sections (`MD5Sum:`, `SHA1:`, `SHA256:`)
listing the size and digests of every index artifact the suite publishes.
[ReleaseManifest] represents a parsed or freshly seeded manifest and
serializes back to the signable text form.
*/

use {
    crate::{
        control::{ControlParagraph, ControlParagraphReader},
        error::{Result, SyncError},
        io::{ContentDigest, MultiContentDigest},
    },
    chrono::{DateTime, TimeZone, Utc},
    std::{
        collections::BTreeMap,
        io::BufRead,
        str::FromStr,
    },
};

/// Formatter string for dates in release files.
pub const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Checksum type / digest mechanism used in a release file.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ChecksumType {
    /// MD5.
    Md5,

    /// SHA-1.
    Sha1,

    /// SHA-256.
    Sha256,
}

impl ChecksumType {
    /// Emit variants in the order their sections appear in `Release` files.
    pub fn emission_order() -> impl Iterator<Item = ChecksumType> {
        [Self::Md5, Self::Sha1, Self::Sha256].into_iter()
    }

    /// Name of the control field in `Release` files holding this variant type.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Md5 => "MD5Sum",
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
        }
    }
}

/// Describes one index artifact listed in a `Release` manifest.
///
/// Combines the lines for a single path across every checksum section into
/// one record: the repository-relative path, the artifact size, and a digest
/// per declared checksum flavor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ManifestEntry {
    path: String,
    size: u64,
    digests: BTreeMap<ChecksumType, ContentDigest>,
}

impl ManifestEntry {
    /// Construct an entry carrying every digest flavor, as freshly published
    /// artifacts do.
    pub fn new(path: impl ToString, size: u64, digests: &MultiContentDigest) -> Self {
        Self {
            path: path.to_string(),
            size,
            digests: ChecksumType::emission_order()
                .map(|checksum| (checksum, digests.digest_from_checksum(checksum).clone()))
                .collect(),
        }
    }

    /// The repository-relative path of this artifact.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The artifact size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The digest of this artifact for a checksum flavor, if declared.
    pub fn digest(&self, checksum: ChecksumType) -> Option<&ContentDigest> {
        self.digests.get(&checksum)
    }
}

/// A repository `Release` manifest.
///
/// Header fields are kept as a control paragraph so fields this tool does
/// not interpret survive a load/save cycle. The checksum sections are
/// normalized into a path-keyed set of [ManifestEntry].
#[derive(Clone, Debug)]
pub struct ReleaseManifest<'a> {
    header: ControlParagraph<'a>,
    files: BTreeMap<String, ManifestEntry>,
}

impl<'a> ReleaseManifest<'a> {
    /// Seed a fresh manifest for a repository that has none yet.
    ///
    /// `Origin` and `Label` default to the codename and the architecture
    /// list starts at `amd64`; subsequent publishes carry whatever indexes
    /// actually exist.
    pub fn new(codename: &str, component: &str) -> Self {
        let mut header = ControlParagraph::default();

        header.append_field_from_string("Origin".into(), codename.to_string().into());
        header.append_field_from_string("Label".into(), codename.to_string().into());
        header.append_field_from_string("Codename".into(), codename.to_string().into());
        header.append_field_from_string("Components".into(), component.to_string().into());
        header.append_field_from_string("Architectures".into(), "amd64".to_string().into());

        Self {
            header,
            files: BTreeMap::default(),
        }
    }

    /// Construct an instance by parsing manifest text from a reader.
    ///
    /// The source must be a control file with exactly 1 paragraph. Checksum
    /// sections are folded into the unified file set; a path whose size
    /// differs between two sections is rejected.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<ReleaseManifest<'static>> {
        let paragraphs = ControlParagraphReader::new(reader).collect::<Result<Vec<_>>>()?;

        if paragraphs.len() != 1 {
            return Err(SyncError::ReleaseControlParagraphMismatch(paragraphs.len()));
        }

        let mut header = paragraphs.into_iter().next().ok_or(
            // Length validated above.
            SyncError::ReleaseControlParagraphMismatch(0),
        )?;

        let mut files = BTreeMap::<String, ManifestEntry>::default();

        for checksum in ChecksumType::emission_order() {
            let field = match header.take_field(checksum.field_name()) {
                Some(field) => field,
                None => continue,
            };

            for line in field.iter_lines() {
                // Lines are of form: <digest> <size> <path>
                let mut parts = line.split_ascii_whitespace();

                let digest = parts.next().ok_or(SyncError::ReleaseMissingDigest)?;
                let size = parts.next().ok_or(SyncError::ReleaseMissingSize)?;
                let path = parts.next().ok_or(SyncError::ReleaseMissingPath)?;

                if parts.next().is_some() {
                    return Err(SyncError::ReleasePathWithSpaces(line.to_string()));
                }

                let digest = ContentDigest::from_hex_digest(checksum, digest)?;
                let size = u64::from_str(size)?;

                match files.get_mut(path) {
                    Some(entry) => {
                        if entry.size != size {
                            return Err(SyncError::ReleaseEntrySizeMismatch(
                                path.to_string(),
                                entry.size,
                                size,
                            ));
                        }

                        entry.digests.insert(checksum, digest);
                    }
                    None => {
                        files.insert(
                            path.to_string(),
                            ManifestEntry {
                                path: path.to_string(),
                                size,
                                digests: BTreeMap::from_iter([(checksum, digest)]),
                            },
                        );
                    }
                }
            }
        }

        Ok(ReleaseManifest { header, files })
    }

    /// Origin of the repository.
    pub fn origin(&self) -> Option<&str> {
        self.header.field_str("Origin")
    }

    /// Label for the repository.
    pub fn label(&self) -> Option<&str> {
        self.header.field_str("Label")
    }

    /// Suite of this repository.
    pub fn suite(&self) -> Option<&str> {
        self.header.field_str("Suite")
    }

    /// Codename of this repository.
    pub fn codename(&self) -> Option<&str> {
        self.header.field_str("Codename")
    }

    /// Names of components within this repository.
    pub fn components(&self) -> Option<impl Iterator<Item = &str>> {
        self.header
            .field_str("Components")
            .map(|v| v.split_ascii_whitespace())
    }

    /// Machine architectures this repository publishes indexes for.
    pub fn architectures(&self) -> Option<impl Iterator<Item = &str>> {
        self.header
            .field_str("Architectures")
            .map(|v| v.split_ascii_whitespace())
    }

    /// Time the manifest was last written, as its raw string value.
    pub fn date_str(&self) -> Option<&str> {
        self.header.field_str("Date")
    }

    /// Time the manifest was last written, normalized to UTC.
    pub fn date(&self) -> Option<Result<DateTime<Utc>>> {
        self.date_str().map(|s| {
            let timestamp = mailparse::dateparse(s)?;

            Utc.timestamp_opt(timestamp, 0).single().ok_or_else(|| {
                SyncError::ControlParseError(format!("date out of range: {}", s))
            })
        })
    }

    /// The index artifacts this manifest describes, keyed by path.
    pub fn files(&self) -> &BTreeMap<String, ManifestEntry> {
        &self.files
    }

    /// Replace the file set wholesale.
    ///
    /// Callers are responsible for carrying forward entries for artifacts
    /// untouched by the current run before calling this.
    pub fn set_files(&mut self, files: BTreeMap<String, ManifestEntry>) {
        self.files = files;
    }

    /// Serialize the manifest, stamping the current time into `Date`.
    pub fn save(&self) -> Result<Vec<u8>> {
        self.save_with_date(Utc::now())
    }

    /// Serialize the manifest with an explicit `Date` value.
    ///
    /// The `Date` field is always recomputed; a value loaded from a previous
    /// manifest is never carried over. Checksum sections are emitted in
    /// fixed order with entries sorted by path.
    pub fn save_with_date(&self, date: DateTime<Utc>) -> Result<Vec<u8>> {
        let mut para = self.header.clone();

        para.set_field_from_string(
            "Date".into(),
            format!("{}", date.format(DATE_FORMAT)).into(),
        );

        for checksum in ChecksumType::emission_order() {
            let entries = self
                .files
                .values()
                .filter_map(|entry| {
                    entry
                        .digest(checksum)
                        .map(|digest| (entry.path.as_str(), entry.size, digest.digest_hex()))
                })
                .collect::<Vec<_>>();

            if entries.is_empty() {
                continue;
            }

            let size_width = entries
                .iter()
                .map(|(_, size, _)| size.to_string().len())
                .max()
                .unwrap_or_default();

            let value = entries
                .iter()
                .map(|(path, size, digest)| {
                    format!(" {} {:>size_width$} {}", digest, size, path)
                })
                .collect::<Vec<_>>()
                .join("\n");

            para.append_field_from_string(
                checksum.field_name().into(),
                format!("\n{}", value).into(),
            );
        }

        let mut data = vec![];
        para.write(&mut data)?;

        Ok(data)
    }
}

#[cfg(test)]
mod test {
    use {super::*, indoc::indoc};

    const MANIFEST: &str = indoc! {"
        Origin: stable
        Label: stable
        Codename: stable
        Components: main
        Architectures: amd64
        Date: Sat, 09 Oct 2021 09:34:56 +0000
        MD5Sum:
         5eb63bbbe01eeed093cb22bb8f5acdc3 11 main/binary-amd64/Packages
         6f5902ac237024bdd0c176cb93063dc4 12 main/binary-amd64/Packages.gz
        SHA1:
         2aae6c35c94fcfb415dbe95f408b9ce91ee846ed 11 main/binary-amd64/Packages
         22596363b3de40b06f981fb85d82312e8c0ed511 12 main/binary-amd64/Packages.gz
        SHA256:
         b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9 11 main/binary-amd64/Packages
         a948904f2f0f479b8f8197694b30184b0d2ed1c1cd2a1ec0fb85d299a192a447 12 main/binary-amd64/Packages.gz
    "};

    #[test]
    fn parse_combines_checksum_sections() -> Result<()> {
        let manifest = ReleaseManifest::from_reader(std::io::Cursor::new(MANIFEST))?;

        assert_eq!(manifest.origin(), Some("stable"));
        assert_eq!(manifest.label(), Some("stable"));
        assert_eq!(manifest.codename(), Some("stable"));
        assert_eq!(
            manifest.components().unwrap().collect::<Vec<_>>(),
            vec!["main"]
        );
        assert_eq!(
            manifest.architectures().unwrap().collect::<Vec<_>>(),
            vec!["amd64"]
        );
        assert_eq!(
            manifest.date_str(),
            Some("Sat, 09 Oct 2021 09:34:56 +0000")
        );
        assert_eq!(
            manifest.date().unwrap()?,
            Utc.with_ymd_and_hms(2021, 10, 9, 9, 34, 56).unwrap()
        );

        assert_eq!(manifest.files().len(), 2);

        let entry = &manifest.files()["main/binary-amd64/Packages"];
        assert_eq!(entry.path(), "main/binary-amd64/Packages");
        assert_eq!(entry.size(), 11);
        assert_eq!(
            entry.digest(ChecksumType::Md5).unwrap().digest_hex(),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
        assert_eq!(
            entry.digest(ChecksumType::Sha256).unwrap().digest_hex(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );

        Ok(())
    }

    #[test]
    fn size_disagreement_is_rejected() {
        let source = indoc! {"
            Origin: stable
            MD5Sum:
             5eb63bbbe01eeed093cb22bb8f5acdc3 11 main/binary-amd64/Packages
            SHA256:
             b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9 12 main/binary-amd64/Packages
        "};

        assert!(matches!(
            ReleaseManifest::from_reader(std::io::Cursor::new(source)),
            Err(SyncError::ReleaseEntrySizeMismatch(path, 11, 12))
                if path == "main/binary-amd64/Packages"
        ));
    }

    #[test]
    fn missing_line_components_are_rejected() {
        let source = indoc! {"
            Origin: stable
            MD5Sum:
             5eb63bbbe01eeed093cb22bb8f5acdc3 11
        "};

        assert!(matches!(
            ReleaseManifest::from_reader(std::io::Cursor::new(source)),
            Err(SyncError::ReleaseMissingPath)
        ));
    }

    #[test]
    fn save_round_trip() -> Result<()> {
        let manifest = ReleaseManifest::from_reader(std::io::Cursor::new(MANIFEST))?;

        let date = Utc.with_ymd_and_hms(2022, 1, 2, 3, 4, 5).unwrap();
        let saved = manifest.save_with_date(date)?;

        let reparsed = ReleaseManifest::from_reader(std::io::Cursor::new(&saved))?;

        assert_eq!(reparsed.origin(), manifest.origin());
        assert_eq!(reparsed.codename(), manifest.codename());
        assert_eq!(reparsed.files(), manifest.files());

        // The Date field is always the save-time value, not the loaded one.
        assert_eq!(reparsed.date_str(), Some("Sun, 02 Jan 2022 03:04:05 +0000"));

        Ok(())
    }

    #[test]
    fn save_orders_sections_and_paths() -> Result<()> {
        let mut manifest = ReleaseManifest::new("stable", "main");

        let digests_b = MultiContentDigest {
            md5: ContentDigest::from_hex_digest(
                ChecksumType::Md5,
                "6f5902ac237024bdd0c176cb93063dc4",
            )?,
            sha1: ContentDigest::from_hex_digest(
                ChecksumType::Sha1,
                "22596363b3de40b06f981fb85d82312e8c0ed511",
            )?,
            sha256: ContentDigest::from_hex_digest(
                ChecksumType::Sha256,
                "a948904f2f0f479b8f8197694b30184b0d2ed1c1cd2a1ec0fb85d299a192a447",
            )?,
        };
        let digests_a = MultiContentDigest {
            md5: ContentDigest::from_hex_digest(
                ChecksumType::Md5,
                "5eb63bbbe01eeed093cb22bb8f5acdc3",
            )?,
            sha1: ContentDigest::from_hex_digest(
                ChecksumType::Sha1,
                "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed",
            )?,
            sha256: ContentDigest::from_hex_digest(
                ChecksumType::Sha256,
                "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9",
            )?,
        };

        let mut files = BTreeMap::new();
        // Insert out of path order; serialization must sort.
        files.insert(
            "main/binary-amd64/Packages.gz".to_string(),
            ManifestEntry::new("main/binary-amd64/Packages.gz", 1234, &digests_b),
        );
        files.insert(
            "main/binary-amd64/Packages".to_string(),
            ManifestEntry::new("main/binary-amd64/Packages", 11, &digests_a),
        );
        manifest.set_files(files);

        let date = Utc.with_ymd_and_hms(2021, 10, 9, 9, 34, 56).unwrap();
        let text = String::from_utf8(manifest.save_with_date(date)?).unwrap();

        let expected = format!(
            "Origin: stable\n\
             Label: stable\n\
             Codename: stable\n\
             Components: main\n\
             Architectures: amd64\n\
             Date: Sat, 09 Oct 2021 09:34:56 +0000\n\
             MD5Sum: \n \
             5eb63bbbe01eeed093cb22bb8f5acdc3   11 main/binary-amd64/Packages\n \
             6f5902ac237024bdd0c176cb93063dc4 1234 main/binary-amd64/Packages.gz\n\
             SHA1: \n \
             2aae6c35c94fcfb415dbe95f408b9ce91ee846ed   11 main/binary-amd64/Packages\n \
             22596363b3de40b06f981fb85d82312e8c0ed511 1234 main/binary-amd64/Packages.gz\n\
             SHA256: \n \
             b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9   11 main/binary-amd64/Packages\n \
             a948904f2f0f479b8f8197694b30184b0d2ed1c1cd2a1ec0fb85d299a192a447 1234 main/binary-amd64/Packages.gz\n"
        );
        assert_eq!(text, expected);

        Ok(())
    }

    #[test]
    fn seeded_manifest_has_no_files() {
        let manifest = ReleaseManifest::new("focal", "contrib");

        assert_eq!(manifest.origin(), Some("focal"));
        assert_eq!(manifest.label(), Some("focal"));
        assert_eq!(manifest.codename(), Some("focal"));
        assert_eq!(
            manifest.components().unwrap().collect::<Vec<_>>(),
            vec!["contrib"]
        );
        assert_eq!(
            manifest.architectures().unwrap().collect::<Vec<_>>(),
            vec!["amd64"]
        );
        assert!(manifest.files().is_empty());
        assert!(manifest.date_str().is_none());
    }

    #[test]
    fn partial_digest_coverage_survives_round_trip() -> Result<()> {
        // A foreign manifest may omit a checksum flavor entirely.
        let source = indoc! {"
            Origin: stable
            MD5Sum:
             5eb63bbbe01eeed093cb22bb8f5acdc3 11 main/binary-amd64/Packages
            SHA256:
             b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9 11 main/binary-amd64/Packages
        "};

        let manifest = ReleaseManifest::from_reader(std::io::Cursor::new(source))?;
        let entry = &manifest.files()["main/binary-amd64/Packages"];

        assert!(entry.digest(ChecksumType::Md5).is_some());
        assert!(entry.digest(ChecksumType::Sha1).is_none());
        assert!(entry.digest(ChecksumType::Sha256).is_some());

        let saved = String::from_utf8(
            manifest.save_with_date(Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap())?,
        )
        .unwrap();

        // No SHA1 section is fabricated for an entry that never declared one.
        assert!(!saved.contains("\nSHA1: "));
        assert!(saved.contains("\nMD5Sum: "));
        assert!(saved.contains("\nSHA256: "));

        Ok(())
    }
}
