//! Per-record metadata directory
//!
//! Each record owns a table of small typed annotations. An entry's 8-byte
//! directory slot packs the payload size and a 4-bit sub-version into one
//! u16 (`size << 4 | sub_version`), and locates the payload with an offset
//! relative to the slot's own address. Payload bytes are always captured
//! raw first; a typed view is decoded on top when the tag/sub-version pair
//! is understood, and entries without a decoder pass through byte-for-byte.

use std::io::SeekFrom;
use std::io::Seek;

use glam::Vec3;

use crate::error::BundleError;
use crate::io::{
    read_array, read_bool, read_bytes, read_f32, read_u8, read_u16, read_u32, write_bool,
    write_bytes, write_f32, write_u16, write_u32, write_vec3, read_vec3, SliceReader, VecWriter,
};
use crate::{metadata_tags, METADATA_HEADER_SIZE, MAX_METADATA_PAYLOAD};

/// One metadata annotation attached to a record.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEntry {
    /// Entry tag (see [`crate::metadata_tags`])
    pub tag: u32,
    /// 4-bit layout sub-version from the packed flags
    pub sub_version: u8,
    /// Raw payload bytes as captured from the stream (or as first encoded)
    pub raw: Vec<u8>,
    /// Decoded typed view of `raw`
    pub view: MetadataView,
}

/// Typed views over metadata payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataView {
    /// "Name" - display name, the whole payload as UTF-8
    Name(String),
    /// "Id  " - stable identifier
    Identifier(u32),
    /// "BBox" - axis-aligned bounds
    Bounds {
        /// Minimum corner
        min: Vec3,
        /// Maximum corner
        max: Vec3,
    },
    /// "ACMR" - average cache miss ratio of the indexed geometry
    CacheMissRatio(f32),
    /// "ATST" - atlas flags (first from sub-version 1, second from 2)
    Atlas {
        /// Primary atlas flag
        streamed: bool,
        /// Secondary atlas flag
        padded: bool,
    },
    /// "BLEN" - blend flags (sub-version 1 only)
    Blend {
        /// First blend flag
        source: bool,
        /// Second blend flag
        destination: bool,
    },
    /// "VDCL" - vertex declaration hash pairs (sub-version >= 2)
    VertexDecl(Vec<VdclEntry>),
    /// "TRef" - texture reference identifiers (sub-version 1)
    TextureRefs(Vec<u32>),
    /// "TXCH" - platform texture content header; decoded for the PC layout
    /// (sub-version 0), raw bytes always re-emitted on write
    TextureHeader(Option<TextureHeaderInfo>),
    /// Passthrough for tags or sub-versions without a decoder
    Opaque,
}

/// One "VDCL" hash pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VdclEntry {
    /// Declaration name hash
    pub name_hash: u32,
    /// Associated value
    pub value: u32,
}

/// Decoded fixed portion of the PC texture content header.
///
/// The trailing slice table uses pointer fixups into the payload and is
/// left in the raw bytes; this view is read-only and never re-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureHeaderInfo {
    /// Metadata fixup offset
    pub meta_fixup_offset: u32,
    /// Blob data fixup offset
    pub blob_fixup_offset: u32,
    /// 16-byte stable texture id
    pub id: [u8; 16],
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Depth in texels
    pub depth: u32,
    /// Slice count (14 bits of the packed word)
    pub num_slices: u16,
    /// Platform selector (2 bits of the packed word)
    pub platform: u8,
    /// Mip level count
    pub num_mips: u8,
    /// Cube map flag
    pub cube_map: bool,
    /// Premultiplied alpha flag
    pub premultiplied_alpha: bool,
    /// Transcoding enumerator
    pub transcoding: i32,
    /// Source color profile enumerator
    pub encoded_color_profile: i32,
    /// Target color profile enumerator
    pub target_color_profile: i32,
    /// Texture domain enumerator
    pub domain: i32,
}

impl MetadataEntry {
    /// Build a "Name" entry.
    pub fn name(name: impl Into<String>) -> Self {
        Self::from_view(metadata_tags::NAME, 0, MetadataView::Name(name.into()))
    }

    /// Build an "Id  " entry.
    pub fn identifier(id: u32) -> Self {
        Self::from_view(metadata_tags::IDENTIFIER, 0, MetadataView::Identifier(id))
    }

    /// Build a "BBox" entry.
    pub fn bounds(min: Vec3, max: Vec3) -> Self {
        Self::from_view(metadata_tags::BOUNDS, 0, MetadataView::Bounds { min, max })
    }

    /// Build an "ACMR" entry.
    pub fn cache_miss_ratio(ratio: f32) -> Self {
        Self::from_view(
            metadata_tags::CACHE_MISS_RATIO,
            0,
            MetadataView::CacheMissRatio(ratio),
        )
    }

    /// Build a passthrough entry from raw bytes.
    pub fn opaque(tag: u32, sub_version: u8, raw: Vec<u8>) -> Self {
        Self {
            tag,
            sub_version: sub_version & 0xF,
            raw,
            view: MetadataView::Opaque,
        }
    }

    /// Build an entry from a typed view, capturing its encoding as `raw`.
    pub fn from_view(tag: u32, sub_version: u8, view: MetadataView) -> Self {
        let mut entry = Self {
            tag,
            sub_version: sub_version & 0xF,
            raw: Vec::new(),
            view,
        };
        entry.raw = entry.encode_payload();
        entry
    }

    /// Encode the typed view back into payload bytes.
    ///
    /// `Opaque` and `TextureHeader` views re-emit the captured raw bytes;
    /// every other view is re-encoded from its decoded fields so edits
    /// propagate.
    pub(crate) fn encode_payload(&self) -> Vec<u8> {
        let mut w = VecWriter::new(Vec::new());
        match &self.view {
            MetadataView::Name(name) => write_bytes(&mut w, name.as_bytes()),
            MetadataView::Identifier(id) => write_u32(&mut w, *id),
            MetadataView::Bounds { min, max } => {
                write_vec3(&mut w, *min);
                write_vec3(&mut w, *max);
            }
            MetadataView::CacheMissRatio(ratio) => write_f32(&mut w, *ratio),
            MetadataView::Atlas { streamed, padded } => {
                if self.sub_version >= 1 {
                    write_bool(&mut w, *streamed);
                }
                if self.sub_version >= 2 {
                    write_bool(&mut w, *padded);
                }
            }
            MetadataView::Blend {
                source,
                destination,
            } => {
                if self.sub_version == 1 {
                    write_bool(&mut w, *source);
                    write_bool(&mut w, *destination);
                }
            }
            MetadataView::VertexDecl(entries) => {
                if self.sub_version >= 2 {
                    if self.sub_version >= 3 {
                        write_u32(&mut w, entries.len() as u32);
                    }
                    for entry in entries {
                        write_u32(&mut w, entry.name_hash);
                        write_u32(&mut w, entry.value);
                    }
                }
            }
            MetadataView::TextureRefs(refs) => {
                write_u32(&mut w, refs.len() as u32);
                for r in refs {
                    write_u32(&mut w, *r);
                }
            }
            MetadataView::TextureHeader(_) | MetadataView::Opaque => {
                return self.raw.clone();
            }
        }
        w.into_inner()
    }

    fn decode_view(tag: u32, sub_version: u8, raw: &[u8]) -> Result<MetadataView, BundleError> {
        let mut c = SliceReader::new(raw);
        let view = match tag {
            metadata_tags::NAME => MetadataView::Name(
                String::from_utf8(raw.to_vec()).map_err(|_| BundleError::InvalidString)?,
            ),
            metadata_tags::IDENTIFIER => MetadataView::Identifier(read_u32(&mut c)?),
            metadata_tags::BOUNDS => MetadataView::Bounds {
                min: read_vec3(&mut c)?,
                max: read_vec3(&mut c)?,
            },
            metadata_tags::CACHE_MISS_RATIO => MetadataView::CacheMissRatio(read_f32(&mut c)?),
            metadata_tags::ATLAS => MetadataView::Atlas {
                streamed: sub_version >= 1 && read_bool(&mut c)?,
                padded: sub_version >= 2 && read_bool(&mut c)?,
            },
            metadata_tags::BLEND => {
                if sub_version == 1 {
                    MetadataView::Blend {
                        source: read_bool(&mut c)?,
                        destination: read_bool(&mut c)?,
                    }
                } else {
                    MetadataView::Blend {
                        source: false,
                        destination: false,
                    }
                }
            }
            metadata_tags::VERTEX_DECL if sub_version >= 2 => {
                let count = if sub_version >= 3 {
                    read_u32(&mut c)? as usize
                } else {
                    1
                };
                let mut entries = Vec::with_capacity(count.min(raw.len() / 8));
                for _ in 0..count {
                    entries.push(VdclEntry {
                        name_hash: read_u32(&mut c)?,
                        value: read_u32(&mut c)?,
                    });
                }
                MetadataView::VertexDecl(entries)
            }
            metadata_tags::TEXTURE_REFS if sub_version == 1 => {
                let count = read_u32(&mut c)? as usize;
                let mut refs = Vec::with_capacity(count.min(raw.len() / 4));
                for _ in 0..count {
                    refs.push(read_u32(&mut c)?);
                }
                MetadataView::TextureRefs(refs)
            }
            metadata_tags::TEXTURE_HEADER => {
                let info = if sub_version == 0 && !raw.is_empty() {
                    Some(TextureHeaderInfo::decode(&mut c)?)
                } else {
                    None
                };
                MetadataView::TextureHeader(info)
            }
            _ => MetadataView::Opaque,
        };
        Ok(view)
    }
}

impl TextureHeaderInfo {
    fn decode(c: &mut SliceReader<'_>) -> Result<Self, BundleError> {
        let meta_fixup_offset = read_u32(c)?;
        let blob_fixup_offset = read_u32(c)?;
        let id: [u8; 16] = read_array(c)?;
        let width = read_u32(c)?;
        let height = read_u32(c)?;
        let depth = read_u32(c)?;

        let packed = read_u16(c)?;
        let num_slices = packed & 0x3FFF;
        let platform = (packed >> 14) as u8;

        let num_mips = read_u8(c)?;
        let flags = read_u8(c)?;

        Ok(Self {
            meta_fixup_offset,
            blob_fixup_offset,
            id,
            width,
            height,
            depth,
            num_slices,
            platform,
            num_mips,
            cube_map: flags & 1 != 0,
            premultiplied_alpha: flags & 2 != 0,
            transcoding: read_u32(c)? as i32,
            encoded_color_profile: read_u32(c)? as i32,
            target_color_profile: read_u32(c)? as i32,
            domain: read_u32(c)? as i32,
        })
    }
}

/// Read `count` entries of a metadata table.
///
/// `table_offset` is relative to the bundle base (the start of the parsed
/// slice); each payload is located from its own slot address via the
/// entry's relative offset.
pub(crate) fn read_directory(
    cursor: &mut SliceReader<'_>,
    table_offset: u64,
    count: usize,
) -> Result<Vec<MetadataEntry>, BundleError> {
    let mut entries = Vec::with_capacity(count.min(crate::io::remaining(cursor)));
    for index in 0..count {
        let slot = table_offset + (index * METADATA_HEADER_SIZE) as u64;
        cursor.set_position(slot);

        let tag = read_u32(cursor)?;
        let flags = read_u16(cursor)?;
        let relative_offset = read_u16(cursor)?;

        let size = (flags >> 4) as usize;
        let sub_version = (flags & 0xF) as u8;

        cursor.set_position(slot + u64::from(relative_offset));
        let raw = read_bytes(cursor, size)?;
        let view = MetadataEntry::decode_view(tag, sub_version, &raw)?;

        entries.push(MetadataEntry {
            tag,
            sub_version,
            raw,
            view,
        });
    }
    Ok(entries)
}

/// Write a metadata table: `count` 8-byte slots followed by the payloads,
/// each slot back-patched with the packed size/sub-version and the offset
/// from the slot to its payload.
///
/// Leaves the writer positioned after the last payload byte.
pub(crate) fn write_directory(
    writer: &mut VecWriter,
    entries: &[MetadataEntry],
) -> Result<(), BundleError> {
    let headers_start = writer.position();
    let mut data_pos = headers_start + (entries.len() * METADATA_HEADER_SIZE) as u64;

    for (index, entry) in entries.iter().enumerate() {
        let slot = headers_start + (index * METADATA_HEADER_SIZE) as u64;
        let payload = entry.encode_payload();

        if payload.len() > MAX_METADATA_PAYLOAD {
            return Err(BundleError::MetadataOverflow {
                tag: entry.tag,
                size: payload.len(),
            });
        }
        let relative_offset = u16::try_from(data_pos - slot).map_err(|_| {
            BundleError::MetadataOffsetOverflow {
                tag: entry.tag,
                offset: data_pos - slot,
            }
        })?;

        writer.seek(SeekFrom::Start(data_pos)).unwrap();
        write_bytes(writer, &payload);
        data_pos = writer.position();

        writer.seek(SeekFrom::Start(slot)).unwrap();
        write_u32(writer, entry.tag);
        write_u16(
            writer,
            ((payload.len() as u16) << 4) | u16::from(entry.sub_version & 0xF),
        );
        write_u16(writer, relative_offset);
    }

    writer.seek(SeekFrom::Start(data_pos)).unwrap();
    Ok(())
}
