//! Nether-Bundle: tagged-record game asset container format for Nethercore
//!
//! This crate provides a pure Rust parser and writer for the versioned,
//! self-describing "bundle" container used to ship model, material and
//! texture assets. A bundle is an ordered sequence of typed, tagged records;
//! each record carries its own format version, a directory of small typed
//! metadata annotations, and a payload that may itself be a nested bundle.
//!
//! # Key Features
//!
//! - **Pure Rust**: No external C/C++ dependencies
//! - **Version-gated layouts**: One comparator drives every historical
//!   field-presence cutover, identically on read and write
//! - **Lossless passthrough**: Unknown record and metadata tags round-trip
//!   byte-for-byte through an opaque fallback variant
//! - **Fault isolation**: One corrupt record never aborts a whole bundle;
//!   the failing index is replaced with a fault marker and reported
//! - **Writer**: Two-pass offset back-patching serializer over an in-memory
//!   seekable buffer
//!
//! # Usage
//!
//! ```ignore
//! use nether_bundle::{tags, Bundle};
//!
//! let data = std::fs::read("car.modelbin").unwrap();
//! let bundle = Bundle::parse(&data).unwrap();
//!
//! println!("Bundle v{}", bundle.version);
//! for record in &bundle.records {
//!     println!("  {} v{}", nether_bundle::fourcc(record.tag), record.version);
//! }
//!
//! if let Some(model) = bundle.find_record(tags::MODEL) {
//!     println!("model record: {:?}", model.name());
//! }
//!
//! let rebuilt = bundle.to_bytes().unwrap();
//! ```
//!
//! # Container Layout
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ Header: magic "Grub" + version (+ sizes + record count)    │
//! ├────────────────────────────────────────────────────────────┤
//! │ Record directory: count x 24-byte headers (back-patched)   │
//! ├────────────────────────────────────────────────────────────┤
//! │ Per-record metadata tables (8-byte slots + payloads)       │
//! ├──────────────────────────── aligned, = header size ────────┤
//! │ Record payloads, 4-byte aligned                            │
//! └────────────────────────────────────────────────────────────┘
//! ```

mod buffer;
mod bundle;
mod error;
mod io;
mod metadata;
mod payload;
mod record;
mod version;

pub use buffer::{BufferSection, ElementFormat};
pub use bundle::{Bundle, LoadFault};
pub use error::BundleError;
pub use metadata::{MetadataEntry, MetadataView, TextureHeaderInfo, VdclEntry};
pub use payload::{
    Bone, LayoutElement, LightScenario, LightScenarioSet, ManufacturerColorEntry,
    ManufacturerColorGroup, ManufacturerColors, MappingEntry, MaterialLibraryRef,
    MaterialResource, Mesh, Model, MorphNames, Payload, PlatformHash, RenderTarget, Sampler,
    ShaderParameter, ShaderParameterMapping, ShaderParameterTable, ShaderStageEntry, ShaderValue,
    Skeleton, TextureRef, VersionInfo, VertexBufferUsage, VertexLayout,
};
pub use record::Record;
pub use version::Version;

// =============================================================================
// Constants
// =============================================================================

/// Magic tag at the start of every bundle ("Grub")
pub const BUNDLE_MAGIC: u32 = 0x4772_7562;

/// Fixed size of one record directory slot
pub const RECORD_HEADER_SIZE: usize = 0x18;

/// Fixed size of one metadata directory slot
pub const METADATA_HEADER_SIZE: usize = 0x08;

/// Largest metadata payload the 12-bit size field can carry
pub const MAX_METADATA_PAYLOAD: usize = 0xFFF;

/// Deepest nesting of bundles-inside-records a parse will follow
pub const MAX_BUNDLE_DEPTH: usize = 16;

/// Tag of the marker record substituted for an unreadable record
pub const FAULT_TAG: u32 = 0xBAD0_0000;

/// Record tags understood by the typed variant registry.
///
/// Tags not listed here parse as [`Payload::Opaque`] and re-emit their raw
/// bytes verbatim.
pub mod tags {
    /// "Mesh" - draw-call description
    pub const MESH: u32 = 0x4D65_7368;
    /// "IndB" - index buffer rows
    pub const INDEX_BUFFER: u32 = 0x496E_6442;
    /// "VerB" - vertex buffer rows
    pub const VERTEX_BUFFER: u32 = 0x5665_7242;
    /// "MBuf" - morph target buffer rows
    pub const MORPH_BUFFER: u32 = 0x4D42_7566;
    /// "Skin" - skinning buffer rows
    pub const SKIN_BUFFER: u32 = 0x536B_696E;
    /// "VLay" - vertex input layout
    pub const VERTEX_LAYOUT: u32 = 0x564C_6179;
    /// "ILay" - instanced vertex input layout
    pub const INSTANCED_VERTEX_LAYOUT: u32 = 0x494C_6179;
    /// "Skel" - bone hierarchy
    pub const SKELETON: u32 = 0x536B_656C;
    /// "Mrph" - morph target name table
    pub const MORPH_NAMES: u32 = 0x4D72_7068;
    /// "Modl" - model summary counts
    pub const MODEL: u32 = 0x4D6F_646C;
    /// "MatI" - material instance (nested bundle)
    pub const MATERIAL_INSTANCE: u32 = 0x4D61_7449;
    /// "MATI" - material resource path
    pub const MATERIAL_RESOURCE: u32 = 0x4D41_5449;
    /// "MATL" - material library reference
    pub const MATERIAL_LIBRARY: u32 = 0x4D41_544C;
    /// "MTPR" - material shader parameter table
    pub const SHADER_PARAMS: u32 = 0x4D54_5052;
    /// "DFPR" - default shader parameter table
    pub const DEFAULT_SHADER_PARAMS: u32 = 0x4446_5052;
    /// "MNCL" - manufacturer color table
    pub const MANUFACTURER_COLORS: u32 = 0x4D4E_434C;
    /// "LSCE" - light scenario set
    pub const LIGHT_SCENARIO: u32 = 0x4C53_4345;
    /// "DBLS" - debug light scenario set
    pub const DEBUG_LIGHT_SCENARIO: u32 = 0x4442_4C53;
    /// "CBMP" - constant buffer name mapping
    pub const CONSTANT_BUFFER_MAP: u32 = 0x4342_4D50;
    /// "TXMP" - texture name mapping
    pub const TEXTURE_MAP: u32 = 0x5458_4D50;
    /// "SPMP" - sampler name mapping
    pub const SAMPLER_MAP: u32 = 0x5350_4D50;
    /// "TRGT" - render target description
    pub const RENDER_TARGET: u32 = 0x5452_4754;
    /// "TXCB" - texture content bytes
    pub const TEXTURE_CONTENT: u32 = 0x5458_4342;
    /// "STex" - packed texture (nested bundle)
    pub const PACKED_TEXTURE: u32 = 0x5354_6578;
    /// "PCLB" - particle system data
    pub const PARTICLE_DATA: u32 = 0x5043_4C42;
    /// "VERS" - tool revision stamp
    pub const VERSION_INFO: u32 = 0x5645_5253;
    /// "VARS" - variable table
    pub const VARIABLES: u32 = 0x5641_5253;
}

/// Metadata entry tags understood by the typed view decoders.
pub mod metadata_tags {
    /// "Name" - display name
    pub const NAME: u32 = 0x4E61_6D65;
    /// "Id  " - stable identifier
    pub const IDENTIFIER: u32 = 0x4964_2020;
    /// "BBox" - axis-aligned bounds
    pub const BOUNDS: u32 = 0x4242_6F78;
    /// "TXCH" - platform texture content header
    pub const TEXTURE_HEADER: u32 = 0x5458_4348;
    /// "TRef" - texture reference list
    pub const TEXTURE_REFS: u32 = 0x5452_6566;
    /// "ACMR" - average cache miss ratio
    pub const CACHE_MISS_RATIO: u32 = 0x4143_4D52;
    /// "ATST" - atlas flags
    pub const ATLAS: u32 = 0x4154_5354;
    /// "BLEN" - blend flags
    pub const BLEND: u32 = 0x424C_454E;
    /// "VDCL" - vertex declaration hashes
    pub const VERTEX_DECL: u32 = 0x5644_434C;
}

/// Render a tag as its four ASCII characters, or as hex when any byte is
/// not printable (e.g. the fault marker).
pub fn fourcc(tag: u32) -> String {
    let bytes = tag.to_be_bytes();
    if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        bytes.iter().map(|&b| b as char).collect()
    } else {
        format!("{tag:08X}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourcc_printable() {
        assert_eq!(fourcc(tags::MESH), "Mesh");
        assert_eq!(fourcc(tags::SKELETON), "Skel");
        assert_eq!(fourcc(metadata_tags::IDENTIFIER), "Id  ");
    }

    #[test]
    fn test_fourcc_falls_back_to_hex() {
        assert_eq!(fourcc(FAULT_TAG), "BAD00000");
        assert_eq!(fourcc(0xDEAD_BEEF), "DEADBEEF");
    }

    #[test]
    fn test_header_sizes() {
        assert_eq!(RECORD_HEADER_SIZE, 24);
        assert_eq!(METADATA_HEADER_SIZE, 8);
    }
}
