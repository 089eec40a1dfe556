// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! `.deb` package reading.

A `.deb` binary package is an `ar` archive with 3 entries:

1. `debian-binary` holding the version of the binary package format.
2. `control.tar[.<ext>]` holding package metadata.
3. `data.tar[.<ext>]` holding file content.

The synchronizer only needs the `control` file of the `control.tar` member:
it becomes the package's stanza in the per-architecture `Packages` index.
*/

use {
    crate::{
        control::ControlParagraphReader,
        error::{Result, SyncError},
        package_record::PackageRecord,
    },
    std::io::{Cursor, Read},
};

fn reader_from_extension(extension: &str, data: Cursor<Vec<u8>>) -> Result<Box<dyn Read>> {
    match extension {
        ".gz" => Ok(Box::new(libflate::gzip::Decoder::new(data)?)),
        ".xz" => Ok(Box::new(xz2::read::XzDecoder::new(data))),
        _ => Err(SyncError::DebUnknownCompression(extension.to_string())),
    }
}

/// Extract the control stanza embedded in a `.deb` package.
///
/// Scans the outer `ar` archive for the member whose name begins with
/// `control.tar`, decompresses it according to its name suffix, and parses
/// the `control` entry (an optional leading `./` is accepted) of the nested
/// tar archive into a [PackageRecord].
///
/// Both `ar` archive dialects seen in the wild parse transparently.
pub fn extract_package_record(reader: impl Read) -> Result<PackageRecord<'static>> {
    let mut archive = ar::Archive::new(reader);

    while let Some(entry) = archive.next_entry() {
        let mut entry = entry?;

        // Member names should be ASCII, so converting to strings is
        // reasonably safe.
        let filename = String::from_utf8_lossy(entry.header().identifier()).to_string();

        let mut data = vec![];
        entry.read_to_end(&mut data)?;

        if let Some(tail) = filename.strip_prefix("control.tar") {
            let control_tar = reader_from_extension(tail, Cursor::new(data))?;

            return resolve_control_record(control_tar);
        }
    }

    Err(SyncError::ControlFileNotFound)
}

fn resolve_control_record(reader: Box<dyn Read>) -> Result<PackageRecord<'static>> {
    let mut archive = tar::Archive::new(reader);

    for entry in archive.entries()? {
        let mut entry = entry?;

        let path_bytes = entry.path_bytes().to_vec();
        let path = String::from_utf8_lossy(&path_bytes);

        if path.trim_start_matches("./") != "control" {
            continue;
        }

        let mut content = String::new();
        entry.read_to_string(&mut content)?;

        let paragraph = ControlParagraphReader::new(Cursor::new(content.into_bytes()))
            .next()
            .ok_or(SyncError::ControlFileNoParagraph)??;

        return Ok(PackageRecord::from(paragraph));
    }

    Err(SyncError::ControlFileNotFound)
}

#[cfg(test)]
pub(crate) mod testdeb {
    use {crate::io::gzip_compress, std::io::Write};

    fn control_tar(control: &str, entry_name: &str) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());

        let data = control.as_bytes();
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(0);
        builder.append_data(&mut header, entry_name, data).unwrap();

        builder.into_inner().unwrap()
    }

    /// Assemble a `.deb` in memory with the given control member name
    /// (e.g. `control.tar.gz`) and control entry name (`control` or
    /// `./control`).
    pub(crate) fn build_deb(control: &str, member_name: &str, entry_name: &str) -> Vec<u8> {
        let tar_data = control_tar(control, entry_name);

        let member = if member_name.ends_with(".gz") {
            gzip_compress(&tar_data).unwrap()
        } else if member_name.ends_with(".xz") {
            let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
            encoder.write_all(&tar_data).unwrap();
            encoder.finish().unwrap()
        } else {
            tar_data
        };

        let mut builder = ar::Builder::new(Vec::new());

        let version: &[u8] = b"2.0\n";
        let mut header = ar::Header::new(b"debian-binary".to_vec(), version.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(0);
        header.set_uid(0);
        header.set_gid(0);
        builder.append(&header, version).unwrap();

        let mut header = ar::Header::new(member_name.as_bytes().to_vec(), member.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(0);
        header.set_uid(0);
        header.set_gid(0);
        builder.append(&header, &member[..]).unwrap();

        builder.into_inner().unwrap()
    }

    /// A `.deb`-shaped archive with no `control.tar` member at all.
    pub(crate) fn build_deb_without_control() -> Vec<u8> {
        let mut builder = ar::Builder::new(Vec::new());

        let version: &[u8] = b"2.0\n";
        let mut header = ar::Header::new(b"debian-binary".to_vec(), version.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(0);
        header.set_uid(0);
        header.set_gid(0);
        builder.append(&header, version).unwrap();

        builder.into_inner().unwrap()
    }
}
