//! Bundle parsing and writing error types

use crate::{fourcc, MAX_BUNDLE_DEPTH, MAX_METADATA_PAYLOAD};

/// Errors that can occur when parsing or writing bundles.
///
/// Container-level failures (`InvalidMagic`, `UnexpectedEof` before the
/// record directory is established, `RecursionLimit`) abort a parse.
/// Record-level failures are caught by the record loop and reported through
/// [`crate::LoadFault`] instead. Size overflows are always fatal on write.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BundleError {
    /// Magic tag at the start of the stream did not match
    #[error("invalid bundle magic 0x{0:08X} (expected 0x47727562)")]
    InvalidMagic(u32),

    /// Structural read ran past the end of the stream
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// Record directory extends past the end of the stream
    #[error("record directory for {count} records does not fit in stream")]
    TruncatedRecordTable {
        /// Declared record count
        count: u32,
    },

    /// Nested bundles exceeded the recursion bound
    #[error("nested bundle depth exceeds {MAX_BUNDLE_DEPTH}")]
    RecursionLimit,

    /// Metadata entry payload does not fit the 12-bit size field
    #[error("metadata entry '{}' payload is {size} bytes (max {MAX_METADATA_PAYLOAD})", fourcc(*.tag))]
    MetadataOverflow {
        /// Entry tag
        tag: u32,
        /// Payload size that overflowed
        size: usize,
    },

    /// Metadata payload landed too far from its directory slot
    #[error("metadata entry '{}' payload offset {offset} does not fit 16 bits", fourcc(*.tag))]
    MetadataOffsetOverflow {
        /// Entry tag
        tag: u32,
        /// Offset that overflowed
        offset: u64,
    },

    /// Buffer row does not match the section stride
    #[error("buffer row {index} is {actual} bytes, expected stride {expected}")]
    RowLengthMismatch {
        /// Row index within the section
        index: usize,
        /// Section stride
        expected: u16,
        /// Actual row length
        actual: usize,
    },

    /// Shader parameter type code with no known value layout
    #[error("unsupported shader parameter type {0}")]
    UnsupportedParameterType(u8),

    /// String field was not valid UTF-8 or had a malformed length prefix
    #[error("malformed string field")]
    InvalidString,
}
