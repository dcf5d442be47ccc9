//! Bundle container: header codec, record directory and the two-pass
//! serializer
//!
//! Loading reads the version-gated header, then walks the record directory
//! dispatching each slot to its typed payload reader. A record that fails
//! to read is replaced by a fault marker and reported; loading continues
//! with the next slot, so one corrupt record never takes down the bundle.
//!
//! Serialization is the reverse, done in two passes over a seekable
//! in-memory buffer: headers are written with placeholder sizes, record
//! slots are reserved, metadata tables and then payloads are emitted, and
//! the reserved slots and header size fields are back-patched as the real
//! offsets become known.

use crate::error::BundleError;
use crate::io::{
    align4, patch_u16, patch_u32, read_bytes, read_u8, read_u16, read_u32, write_bytes, write_u8,
    write_u16, write_u32, SliceReader, VecWriter,
};
use crate::metadata;
use crate::record::Record;
use crate::version::Version;
use crate::{fourcc, BUNDLE_MAGIC, MAX_BUNDLE_DEPTH, RECORD_HEADER_SIZE};

/// One record that failed to read, reported without aborting the load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadFault {
    /// Index of the failed record in [`Bundle::records`]
    pub index: usize,
    /// Why it failed
    pub cause: BundleError,
}

/// A versioned container of tagged records.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    /// Container format version; also the default version new records
    /// inherit at dispatch time
    pub version: Version,
    /// Records in file order, fault markers included
    pub records: Vec<Record>,
    /// Per-record failures isolated during the last parse
    pub faults: Vec<LoadFault>,
}

impl Bundle {
    /// Create an empty bundle at the given format version.
    pub fn new(major: u8, minor: u8) -> Self {
        Self {
            version: Version::new(major, minor),
            records: Vec::new(),
            faults: Vec::new(),
        }
    }

    /// Parse a bundle from a byte slice.
    ///
    /// Fails only on container-level damage: bad magic, a header or record
    /// directory that does not fit the stream, or nested bundles deeper
    /// than [`MAX_BUNDLE_DEPTH`]. Anything that goes wrong inside a single
    /// record is isolated into [`Bundle::faults`] instead.
    pub fn parse(bytes: &[u8]) -> Result<Self, BundleError> {
        Self::parse_at_depth(bytes, 0)
    }

    pub(crate) fn parse_at_depth(bytes: &[u8], depth: usize) -> Result<Self, BundleError> {
        if depth > MAX_BUNDLE_DEPTH {
            return Err(BundleError::RecursionLimit);
        }

        let mut cursor = SliceReader::new(bytes);

        let magic = read_u32(&mut cursor)?;
        if magic != BUNDLE_MAGIC {
            return Err(BundleError::InvalidMagic(magic));
        }
        let version = Version::new(read_u8(&mut cursor)?, read_u8(&mut cursor)?);

        let count = if version.at_least(1, 1) {
            read_u16(&mut cursor)?; // padding
            read_u32(&mut cursor)?; // header size, recomputed on write
            read_u32(&mut cursor)?; // total size, recomputed on write
            read_u32(&mut cursor)? as usize
        } else {
            let count = read_u16(&mut cursor)? as usize;
            read_bytes(&mut cursor, 8)?; // size fields, opaque to legacy readers
            count
        };

        let table_start = cursor.position();
        let table_len = count as u64 * RECORD_HEADER_SIZE as u64;
        if table_start + table_len > bytes.len() as u64 {
            return Err(BundleError::TruncatedRecordTable {
                count: count as u32,
            });
        }

        let mut records = Vec::with_capacity(count);
        let mut faults = Vec::new();
        for index in 0..count {
            let slot = table_start + (index * RECORD_HEADER_SIZE) as u64;
            // Records start out at the bundle's version; the slot's own
            // version fields take over inside the read.
            match Record::read(&mut cursor, slot, depth) {
                Ok(record) => records.push(record),
                // The recursion bound is a container-level failure; it must
                // not be downgraded to a per-record fault.
                Err(BundleError::RecursionLimit) => return Err(BundleError::RecursionLimit),
                Err(cause) => {
                    log::warn!(
                        "record {index} unreadable ({cause}); substituting fault marker"
                    );
                    records.push(Record::fault(version));
                    faults.push(LoadFault { index, cause });
                }
            }
        }

        log::debug!(
            "parsed bundle v{version}: {} records, {} faults",
            records.len(),
            faults.len()
        );

        Ok(Self {
            version,
            records,
            faults,
        })
    }

    /// Serialize the bundle to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, BundleError> {
        let mut writer = VecWriter::new(Vec::new());
        self.write_into(&mut writer)?;
        Ok(writer.into_inner())
    }

    /// Serialize at the writer's current position, which becomes the
    /// bundle base every patched offset is relative to. Nested bundles go
    /// through this same path anchored at their record's payload start.
    pub(crate) fn write_into(&self, writer: &mut VecWriter) -> Result<(), BundleError> {
        let base = writer.position();

        write_u32(writer, BUNDLE_MAGIC);
        write_u8(writer, self.version.major);
        write_u8(writer, self.version.minor);

        if self.version.at_least(1, 1) {
            write_u16(writer, 0); // padding
            write_u32(writer, 0); // header size, patched below
            write_u32(writer, 0); // total size, patched below
            write_u32(writer, self.records.len() as u32);
        } else {
            write_u16(writer, self.records.len() as u16);
            write_u32(writer, 0); // header size, patched below
            write_u32(writer, 0); // total size, patched below
        }

        // Reserve the record directory; every slot is back-patched later.
        let table_start = writer.position();
        write_bytes(writer, &vec![0u8; self.records.len() * RECORD_HEADER_SIZE]);

        // Pass one: metadata tables. Each record's slot learns its entry
        // count and table offset as soon as the table lands.
        for (index, record) in self.records.iter().enumerate() {
            let slot = table_start + (index * RECORD_HEADER_SIZE) as u64;
            let table_offset = writer.position() - base;
            metadata::write_directory(writer, &record.metadata)?;
            patch_u16(writer, slot + 6, record.metadata.len() as u16);
            patch_u32(writer, slot + 8, table_offset as u32);
        }

        align4(writer);
        let header_size = writer.position() - base;

        // Pass two: payloads, aligned to four bytes, with the remaining
        // slot fields patched in.
        for (index, record) in self.records.iter().enumerate() {
            let slot = table_start + (index * RECORD_HEADER_SIZE) as u64;
            let payload_start = writer.position();
            record.payload.write(writer, record.tag, record.version)?;
            let payload_len = (writer.position() - payload_start) as u32;
            align4(writer);

            patch_u32(writer, slot, record.tag);
            patch_u16(
                writer,
                slot + 4,
                u16::from(record.version.major) | u16::from(record.version.minor) << 8,
            );
            patch_u32(writer, slot + 12, (payload_start - base) as u32);
            // Compressed and uncompressed sizes are bookkeeping only and
            // always written equal.
            patch_u32(writer, slot + 16, payload_len);
            patch_u32(writer, slot + 20, payload_len);
        }

        let total_size = writer.position() - base;
        patch_u32(writer, base + 8, header_size as u32);
        patch_u32(writer, base + 12, total_size as u32);

        Ok(())
    }

    /// Number of records, fault markers included.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// True when the bundle holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Find the first record with the given tag.
    pub fn find_record(&self, tag: u32) -> Option<&Record> {
        self.records.iter().find(|record| record.tag == tag)
    }

    /// Mutable variant of [`Bundle::find_record`].
    pub fn find_record_mut(&mut self, tag: u32) -> Option<&mut Record> {
        self.records.iter_mut().find(|record| record.tag == tag)
    }

    /// Find the `n`-th record with the given tag (zero-based).
    pub fn nth_record(&self, tag: u32, n: usize) -> Option<&Record> {
        self.records_with_tag(tag).nth(n)
    }

    /// All records with the given tag, in file order.
    pub fn records_with_tag(&self, tag: u32) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(move |record| record.tag == tag)
    }

    /// Find the first record with the given tag and name, matching the
    /// record's "Name" metadata.
    pub fn find_record_named(&self, tag: u32, name: &str) -> Option<&Record> {
        self.records_with_tag(tag)
            .find(|record| record.name() == Some(name))
    }
}

impl std::fmt::Display for Bundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bundle v{} ({} records", self.version, self.records.len())?;
        for record in &self.records {
            write!(f, " {}", fourcc(record.tag))?;
        }
        write!(f, ")")
    }
}
