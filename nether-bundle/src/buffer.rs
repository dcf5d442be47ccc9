//! Fixed-stride buffer row section
//!
//! Vertex, index, morph and skinning records embed the same sub-codec: a
//! small header followed by `count` rows of exactly `stride` bytes with no
//! padding between rows. The element format and elements-per-row hint only
//! exist from format version 1.0 on; older sections default to a single
//! element of unknown format.

use crate::error::BundleError;
use crate::io::{
    read_bytes, read_u8, read_u16, read_u32, write_bytes, write_u8, write_u16, write_u32,
    SliceReader, VecWriter,
};
use crate::version::Version;

/// GPU element format enumerator carried by buffer sections and vertex
/// layouts.
///
/// The full enumerator space is platform-defined; unknown values are kept
/// verbatim so foreign sections round-trip. Named constants cover the
/// values the asset pipeline emits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ElementFormat(pub u32);

impl ElementFormat {
    /// No declared format (pre-1.0 sections)
    pub const UNKNOWN: Self = Self(0);
    /// Four 16-bit signed normalized components
    pub const R16G16B16A16_SNORM: Self = Self(13);
    /// 10/10/10/2 unsigned normalized
    pub const R10G10B10A2_UNORM: Self = Self(24);
    /// Four 8-bit unsigned normalized components
    pub const R8G8B8A8_UNORM: Self = Self(28);
    /// Two 16-bit unsigned normalized components
    pub const R16G16_UNORM: Self = Self(35);
    /// One 32-bit index
    pub const R32_UINT: Self = Self(42);
    /// One 16-bit index
    pub const R16_UINT: Self = Self(57);
}

/// A fixed-stride array of raw element rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferSection {
    /// Bytes per row
    pub stride: u16,
    /// Elements packed into one row (1 when the format predates the field)
    pub elements_per_row: u8,
    /// Element format enumerator
    pub format: ElementFormat,
    /// Row data, each entry exactly `stride` bytes
    pub rows: Vec<Vec<u8>>,
}

impl BufferSection {
    /// Create a section from rows of `stride` bytes.
    pub fn new(stride: u16, format: ElementFormat, rows: Vec<Vec<u8>>) -> Self {
        Self {
            stride,
            elements_per_row: 1,
            format,
            rows,
        }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Total payload size in bytes, always `count * stride`.
    pub fn total_size(&self) -> usize {
        self.rows.len() * self.stride as usize
    }

    /// Decode every row as one POD value, e.g. `u16` or `u32` index rows.
    ///
    /// Returns `None` when the stride does not match the element size.
    pub fn typed_rows<T: bytemuck::AnyBitPattern>(&self) -> Option<Vec<T>> {
        if self.stride as usize != size_of::<T>() {
            return None;
        }
        Some(
            self.rows
                .iter()
                .map(|row| bytemuck::pod_read_unaligned(row))
                .collect(),
        )
    }

    pub(crate) fn read(
        cursor: &mut SliceReader<'_>,
        version: Version,
    ) -> Result<Self, BundleError> {
        let count = read_u32(cursor)? as usize;
        let stored_size = read_u32(cursor)? as usize;
        let stride = read_u16(cursor)?;

        let (elements_per_row, format) = if version.at_least(1, 0) {
            let elements = read_u8(cursor)?;
            read_u8(cursor)?; // padding
            (elements, ElementFormat(read_u32(cursor)?))
        } else {
            read_u16(cursor)?; // padding
            (1, ElementFormat::UNKNOWN)
        };

        // The stored size is redundant bookkeeping; a mismatch is a producer
        // bug and the row geometry wins.
        let expected = count
            .checked_mul(stride as usize)
            .ok_or(BundleError::UnexpectedEof)?;
        if stored_size != expected {
            log::debug!(
                "buffer section stored size {stored_size} != {count} rows x stride {stride}"
            );
        }

        let mut rows = Vec::with_capacity(count.min(crate::io::remaining(cursor)));
        for _ in 0..count {
            rows.push(read_bytes(cursor, stride as usize)?);
        }

        Ok(Self {
            stride,
            elements_per_row,
            format,
            rows,
        })
    }

    pub(crate) fn write(
        &self,
        writer: &mut VecWriter,
        version: Version,
    ) -> Result<(), BundleError> {
        write_u32(writer, self.rows.len() as u32);
        // Recomputed, never copied from a possibly stale stored value
        write_u32(writer, self.total_size() as u32);
        write_u16(writer, self.stride);

        if version.at_least(1, 0) {
            write_u8(writer, self.elements_per_row);
            write_u8(writer, 0);
            write_u32(writer, self.format.0);
        } else {
            write_u16(writer, 0);
        }

        for (index, row) in self.rows.iter().enumerate() {
            if row.len() != self.stride as usize {
                return Err(BundleError::RowLengthMismatch {
                    index,
                    expected: self.stride,
                    actual: row.len(),
                });
            }
            write_bytes(writer, row);
        }

        Ok(())
    }
}
