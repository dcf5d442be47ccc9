//! Typed record payloads
//!
//! The variant registry is this module's closed `match` from record tag to
//! payload codec. Tags without a typed codec fall through to
//! [`Payload::Opaque`], which stores and re-emits the raw bytes verbatim so
//! not-yet-understood record types survive a round-trip untouched.

mod colors;
mod lighting;
mod material;
mod mesh;
mod misc;
mod model;
mod morph;
mod shader;
mod skeleton;
mod vertex_layout;

pub use colors::{ManufacturerColorEntry, ManufacturerColorGroup, ManufacturerColors};
pub use lighting::{LightScenario, LightScenarioSet, PlatformHash, RenderTarget, ShaderStageEntry};
pub use material::{MaterialLibraryRef, MaterialResource};
pub use mesh::{Mesh, VertexBufferUsage};
pub use misc::VersionInfo;
pub use model::Model;
pub use morph::MorphNames;
pub use shader::{
    MappingEntry, Sampler, ShaderParameter, ShaderParameterMapping, ShaderParameterTable,
    ShaderValue, TextureRef,
};
pub use skeleton::{Bone, Skeleton};
pub use vertex_layout::{LayoutElement, VertexLayout};

use crate::buffer::BufferSection;
use crate::bundle::Bundle;
use crate::error::BundleError;
use crate::io::{write_bytes, SliceReader, VecWriter};
use crate::tags;
use crate::version::Version;

/// A record's typed payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// "Mesh" draw-call description
    Mesh(Mesh),
    /// "Modl" model summary counts
    Model(Model),
    /// "Skel" bone hierarchy
    Skeleton(Skeleton),
    /// "Mrph" morph target name table
    MorphNames(MorphNames),
    /// "VerB" vertex rows
    VertexBuffer(BufferSection),
    /// "IndB" index rows
    IndexBuffer(BufferSection),
    /// "MBuf" morph delta rows
    MorphBuffer(BufferSection),
    /// "Skin" skinning rows
    SkinBuffer(BufferSection),
    /// "VLay" / "ILay" vertex input layout
    VertexLayout(VertexLayout),
    /// "MatI" material instance, a full nested bundle
    MaterialInstance(Bundle),
    /// "STex" packed texture, a full nested bundle
    PackedTexture(Bundle),
    /// "MATI" material resource path
    MaterialResource(MaterialResource),
    /// "MATL" material library reference
    MaterialLibraryRef(MaterialLibraryRef),
    /// "MTPR" / "DFPR" shader parameter table
    ShaderParameters(ShaderParameterTable),
    /// "CBMP" / "TXMP" / "SPMP" shader resource name mapping
    ParameterMapping(ShaderParameterMapping),
    /// "MNCL" manufacturer color table
    ManufacturerColors(ManufacturerColors),
    /// "LSCE" / "DBLS" light scenario set
    LightScenarios(LightScenarioSet),
    /// "TRGT" render target description
    RenderTarget(RenderTarget),
    /// "TXCB" texture content bytes, kept verbatim
    TextureContent(Vec<u8>),
    /// "PCLB" particle system bytes, kept verbatim
    ParticleData(Vec<u8>),
    /// "VERS" tool revision stamp
    VersionInfo(VersionInfo),
    /// "VARS" variable table bytes, kept verbatim
    Variables(Vec<u8>),
    /// Passthrough for unknown tags and for fault markers
    Opaque(Vec<u8>),
}

impl Payload {
    /// Decode the payload for `tag` from its payload slice.
    ///
    /// `depth` is the nesting depth of the bundle the record belongs to;
    /// nested bundles parse one level deeper.
    pub(crate) fn read(
        tag: u32,
        version: Version,
        bytes: &[u8],
        depth: usize,
    ) -> Result<Self, BundleError> {
        let mut c = SliceReader::new(bytes);
        let payload = match tag {
            tags::MESH => Self::Mesh(Mesh::read(&mut c, version)?),
            tags::MODEL => Self::Model(Model::read(&mut c, version)?),
            tags::SKELETON => Self::Skeleton(Skeleton::read(&mut c, version)?),
            tags::MORPH_NAMES => Self::MorphNames(MorphNames::read(&mut c)?),
            tags::VERTEX_BUFFER => Self::VertexBuffer(BufferSection::read(&mut c, version)?),
            tags::INDEX_BUFFER => Self::IndexBuffer(BufferSection::read(&mut c, version)?),
            tags::MORPH_BUFFER => Self::MorphBuffer(BufferSection::read(&mut c, version)?),
            tags::SKIN_BUFFER => Self::SkinBuffer(BufferSection::read(&mut c, version)?),
            tags::VERTEX_LAYOUT | tags::INSTANCED_VERTEX_LAYOUT => {
                Self::VertexLayout(VertexLayout::read(&mut c, version)?)
            }
            tags::MATERIAL_INSTANCE => {
                Self::MaterialInstance(Bundle::parse_at_depth(bytes, depth + 1)?)
            }
            tags::PACKED_TEXTURE => {
                Self::PackedTexture(Bundle::parse_at_depth(bytes, depth + 1)?)
            }
            tags::MATERIAL_RESOURCE => {
                Self::MaterialResource(MaterialResource::read(&mut c)?)
            }
            tags::MATERIAL_LIBRARY => {
                Self::MaterialLibraryRef(MaterialLibraryRef::read(&mut c, version)?)
            }
            tags::SHADER_PARAMS | tags::DEFAULT_SHADER_PARAMS => {
                Self::ShaderParameters(ShaderParameterTable::read(&mut c, version, tag)?)
            }
            tags::CONSTANT_BUFFER_MAP | tags::TEXTURE_MAP | tags::SAMPLER_MAP => {
                Self::ParameterMapping(ShaderParameterMapping::read(&mut c, version)?)
            }
            tags::MANUFACTURER_COLORS => {
                Self::ManufacturerColors(ManufacturerColors::read(&mut c, version)?)
            }
            tags::LIGHT_SCENARIO | tags::DEBUG_LIGHT_SCENARIO => {
                Self::LightScenarios(LightScenarioSet::read(&mut c, version)?)
            }
            tags::RENDER_TARGET => Self::RenderTarget(RenderTarget::read(&mut c, version)?),
            tags::TEXTURE_CONTENT => Self::TextureContent(bytes.to_vec()),
            tags::PARTICLE_DATA => Self::ParticleData(bytes.to_vec()),
            tags::VERSION_INFO => Self::VersionInfo(VersionInfo::read(&mut c)?),
            tags::VARIABLES => Self::Variables(bytes.to_vec()),
            _ => Self::Opaque(bytes.to_vec()),
        };
        Ok(payload)
    }

    /// Serialize the payload at the writer's current position.
    ///
    /// `tag` participates because one parameter-table trailer is keyed on
    /// the concrete tag, not just the version.
    pub(crate) fn write(
        &self,
        writer: &mut VecWriter,
        tag: u32,
        version: Version,
    ) -> Result<(), BundleError> {
        match self {
            Self::Mesh(mesh) => mesh.write(writer, version),
            Self::Model(model) => model.write(writer, version),
            Self::Skeleton(skeleton) => skeleton.write(writer, version),
            Self::MorphNames(names) => names.write(writer),
            Self::VertexBuffer(section)
            | Self::IndexBuffer(section)
            | Self::MorphBuffer(section)
            | Self::SkinBuffer(section) => section.write(writer, version),
            Self::VertexLayout(layout) => layout.write(writer, version),
            Self::MaterialInstance(bundle) | Self::PackedTexture(bundle) => {
                bundle.write_into(writer)
            }
            Self::MaterialResource(resource) => resource.write(writer),
            Self::MaterialLibraryRef(library) => library.write(writer, version),
            Self::ShaderParameters(table) => table.write(writer, version, tag),
            Self::ParameterMapping(mapping) => mapping.write(writer, version),
            Self::ManufacturerColors(colors) => colors.write(writer, version),
            Self::LightScenarios(scenarios) => scenarios.write(writer, version),
            Self::RenderTarget(target) => target.write(writer, version),
            Self::VersionInfo(info) => info.write(writer),
            Self::TextureContent(bytes)
            | Self::ParticleData(bytes)
            | Self::Variables(bytes)
            | Self::Opaque(bytes) => {
                write_bytes(writer, bytes);
                Ok(())
            }
        }
    }
}
