//! Records: the typed, tagged sections of a bundle
//!
//! A record's 24-byte directory slot carries its tag, its own format
//! version, the location of its metadata table and the location and size of
//! its payload. All offsets are relative to the bundle base. The payload
//! byte length is the uncompressed size unless that is zero, in which case
//! the compressed size applies; the two are written equal because the
//! engine never compresses.

use glam::Vec3;

use crate::error::BundleError;
use crate::io::{read_bytes, read_u8, read_u16, read_u32, SliceReader};
use crate::metadata::{self, MetadataEntry, MetadataView};
use crate::payload::Payload;
use crate::version::Version;
use crate::FAULT_TAG;

/// One typed, tagged section of a bundle.
#[derive(Debug, Clone)]
pub struct Record {
    /// Record tag (see [`crate::tags`])
    pub tag: u32,
    /// The record's own format version; starts as the bundle's version and
    /// becomes independent once read from the record header
    pub version: Version,
    /// Metadata annotations owned by this record
    pub metadata: Vec<MetadataEntry>,
    /// Raw payload bytes as captured from the stream; empty for records
    /// assembled programmatically
    pub raw: Vec<u8>,
    /// Typed payload
    pub payload: Payload,
}

/// Equality is over decoded content. The `raw` capture is a parse-time
/// artifact (empty on programmatically assembled records) and does not
/// participate.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
            && self.version == other.version
            && self.metadata == other.metadata
            && self.payload == other.payload
    }
}

impl Record {
    /// Create a record with a typed payload and no metadata.
    pub fn new(tag: u32, version: Version, payload: Payload) -> Self {
        Self {
            tag,
            version,
            metadata: Vec::new(),
            raw: Vec::new(),
            payload,
        }
    }

    /// Create an opaque passthrough record from raw bytes.
    pub fn opaque(tag: u32, version: Version, bytes: Vec<u8>) -> Self {
        Self {
            tag,
            version,
            metadata: Vec::new(),
            raw: bytes.clone(),
            payload: Payload::Opaque(bytes),
        }
    }

    /// The zero-payload marker substituted for a record that failed to
    /// read.
    pub(crate) fn fault(version: Version) -> Self {
        Self {
            tag: FAULT_TAG,
            version,
            metadata: Vec::new(),
            raw: Vec::new(),
            payload: Payload::Opaque(Vec::new()),
        }
    }

    /// True for fault markers left behind by per-record isolation.
    pub fn is_fault(&self) -> bool {
        self.tag == FAULT_TAG
    }

    /// Find the first metadata entry with the given tag.
    pub fn find_metadata(&self, tag: u32) -> Option<&MetadataEntry> {
        self.metadata.iter().find(|entry| entry.tag == tag)
    }

    /// Mutable variant of [`Record::find_metadata`].
    pub fn find_metadata_mut(&mut self, tag: u32) -> Option<&mut MetadataEntry> {
        self.metadata.iter_mut().find(|entry| entry.tag == tag)
    }

    /// Display name from the "Name" metadata entry, when present.
    pub fn name(&self) -> Option<&str> {
        self.metadata.iter().find_map(|entry| match &entry.view {
            MetadataView::Name(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Stable identifier from the "Id  " metadata entry, when present.
    pub fn identifier(&self) -> Option<u32> {
        self.metadata.iter().find_map(|entry| match entry.view {
            MetadataView::Identifier(id) => Some(id),
            _ => None,
        })
    }

    /// Axis-aligned bounds from the "BBox" metadata entry, when present.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        self.metadata.iter().find_map(|entry| match entry.view {
            MetadataView::Bounds { min, max } => Some((min, max)),
            _ => None,
        })
    }

    /// Read one record anchored at its directory slot.
    ///
    /// `depth` is the nesting depth of the owning bundle; payloads that are
    /// themselves bundles parse one level deeper.
    pub(crate) fn read(
        cursor: &mut SliceReader<'_>,
        slot: u64,
        depth: usize,
    ) -> Result<Self, BundleError> {
        cursor.set_position(slot);

        let tag = read_u32(cursor)?;
        let version = Version::new(read_u8(cursor)?, read_u8(cursor)?);
        let metadata_count = read_u16(cursor)? as usize;
        let metadata_offset = u64::from(read_u32(cursor)?);
        let payload_offset = u64::from(read_u32(cursor)?);
        let compressed_size = read_u32(cursor)?;
        let uncompressed_size = read_u32(cursor)?;

        let metadata = metadata::read_directory(cursor, metadata_offset, metadata_count)?;

        let size = if uncompressed_size > 0 {
            uncompressed_size
        } else {
            compressed_size
        } as usize;

        cursor.set_position(payload_offset);
        let raw = read_bytes(cursor, size)?;
        let payload = Payload::read(tag, version, &raw, depth)?;

        Ok(Self {
            tag,
            version,
            metadata,
            raw,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{metadata_tags, tags};

    #[test]
    fn test_metadata_accessors() {
        let mut record = Record::new(
            tags::MODEL,
            Version::new(1, 2),
            Payload::Model(crate::payload::Model::default()),
        );
        record.metadata.push(MetadataEntry::name("chassis"));
        record.metadata.push(MetadataEntry::identifier(99));
        record
            .metadata
            .push(MetadataEntry::bounds(Vec3::NEG_ONE, Vec3::ONE));

        assert_eq!(record.name(), Some("chassis"));
        assert_eq!(record.identifier(), Some(99));
        assert_eq!(record.bounds(), Some((Vec3::NEG_ONE, Vec3::ONE)));
        assert!(record.find_metadata(metadata_tags::NAME).is_some());
        assert!(record.find_metadata(metadata_tags::BLEND).is_none());
    }

    #[test]
    fn test_fault_marker() {
        let fault = Record::fault(Version::new(1, 1));
        assert!(fault.is_fault());
        assert_eq!(fault.payload, Payload::Opaque(Vec::new()));

        let normal = Record::opaque(0x1234_5678, Version::new(1, 1), vec![1]);
        assert!(!normal.is_fault());
    }
}
