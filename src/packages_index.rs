// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Per-architecture `Packages` indexes.

A `Packages` index lists the control stanza of every binary package
currently published for one architecture of a suite/component. The index
holds a single record per package name: publishing a new version of a
package replaces its previous stanza.
*/

use {
    crate::{
        architecture::Architecture,
        control::ControlParagraphReader,
        error::Result,
        package_record::PackageRecord,
    },
    std::io::{BufRead, Write},
};

/// The set of package records published for one architecture.
#[derive(Clone, Debug)]
pub struct PackagesIndex<'a> {
    architecture: Architecture,
    records: Vec<PackageRecord<'a>>,
}

impl<'a> PackagesIndex<'a> {
    /// Construct an empty index for an architecture.
    pub fn new(architecture: Architecture) -> Self {
        Self {
            architecture,
            records: vec![],
        }
    }

    /// Construct an instance by parsing index text from a reader.
    ///
    /// The input is a series of control stanzas separated by blank lines.
    /// Callers are responsible for mapping an *absent* remote index to
    /// [Self::new]; parse failures here are real errors.
    pub fn from_reader<R: BufRead>(architecture: Architecture, reader: R) -> Result<Self> {
        let records = ControlParagraphReader::new(reader)
            .map(|p| p.map(PackageRecord::from))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            architecture,
            records,
        })
    }

    /// The architecture this index describes.
    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    /// Number of package records in this index.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over records, in index order.
    pub fn iter_records(&self) -> impl Iterator<Item = &PackageRecord<'a>> {
        self.records.iter()
    }

    /// Obtain the record for a given package name, if present.
    pub fn record(&self, package: &str) -> Option<&PackageRecord<'a>> {
        self.records
            .iter()
            .find(|r| matches!(r.package(), Ok(p) if p == package))
    }

    /// Insert a record, replacing any existing record of the same package.
    ///
    /// A replaced record keeps its position in the index; a new package is
    /// appended at the end. The record's `Package` field must be present.
    pub fn upsert(&mut self, record: PackageRecord<'a>) -> Result<()> {
        let package = record.package()?.to_string();

        let existing = self
            .records
            .iter()
            .position(|r| matches!(r.package(), Ok(p) if p == package));

        match existing {
            Some(idx) => self.records[idx] = record,
            None => self.records.push(record),
        }

        Ok(())
    }

    /// Serialize the index to a writer.
    ///
    /// Each stanza is followed by a single blank line.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for record in &self.records {
            record.write(writer)?;
            writer.write_all(b"\n")?;
        }

        Ok(())
    }

    /// Serialize the index to bytes.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        let mut data = vec![];
        self.write_to(&mut data)?;

        Ok(data)
    }
}
