//! Shader parameter payloads
//!
//! Two related records: the parameter table (material or default values)
//! and the name mappings that bind shader resource slots. Parameters carry
//! their OWN version pair, independent of the record version, because
//! tables mix entries produced by different exporter generations.

use glam::{Vec2, Vec4};

use crate::error::BundleError;
use crate::io::{
    read_array, read_bool, read_bytes, read_f32, read_i32, read_string_7bit, read_string_u32,
    read_u8, read_u16, read_u32, read_vec2, read_vec4, write_bool, write_bytes, write_f32,
    write_i32, write_string_7bit, write_string_u32, write_u8, write_u16, write_u32, write_vec2,
    write_vec4, SliceReader, VecWriter,
};
use crate::version::Version;
use crate::tags;

/// A texture binding value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureRef {
    /// Texture asset path
    pub path: String,
    /// Hash of the path (parameter version 2.0+)
    pub path_hash: u32,
}

/// A sampler state value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sampler {
    /// U addressing mode
    pub address_u: i32,
    /// V addressing mode
    pub address_v: i32,
    /// Filter mode (parameter version 1.1+)
    pub filter: i32,
}

/// A shader parameter value, discriminated by the wire type code.
#[derive(Debug, Clone, PartialEq)]
pub enum ShaderValue {
    /// Generic four-component vector (code 0)
    Vector(Vec4),
    /// RGBA color (code 1)
    Color(Vec4),
    /// Scalar (code 2)
    Float(f32),
    /// Flag stored as a 32-bit integer (code 3)
    Bool(bool),
    /// Integer (code 4)
    Int(i32),
    /// Channel swizzle (code 5)
    Swizzle(Vec4),
    /// Texture binding (code 6)
    Texture(TextureRef),
    /// Sampler state (code 7)
    Sampler(Sampler),
    /// Function range endpoints (code 9)
    FunctionRange(Vec4),
    /// Two-component vector (code 11)
    Vector2(Vec2),
}

impl ShaderValue {
    fn type_code(&self) -> u8 {
        match self {
            Self::Vector(_) => 0,
            Self::Color(_) => 1,
            Self::Float(_) => 2,
            Self::Bool(_) => 3,
            Self::Int(_) => 4,
            Self::Swizzle(_) => 5,
            Self::Texture(_) => 6,
            Self::Sampler(_) => 7,
            Self::FunctionRange(_) => 9,
            Self::Vector2(_) => 11,
        }
    }
}

/// One named shader parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderParameter {
    /// Layout version of this parameter, independent of the record version
    pub version: Version,
    /// Hash of the parameter name
    pub name_hash: u32,
    /// Optional extension word (parameter version 3.1+)
    pub modifier: Option<u32>,
    /// Stable parameter id (parameter version 3.0+)
    pub guid: [u8; 16],
    /// Typed value
    pub value: ShaderValue,
}

impl ShaderParameter {
    /// Shorthand for a parameter at layout version `major.minor`.
    pub fn new(version: Version, name_hash: u32, value: ShaderValue) -> Self {
        Self {
            version,
            name_hash,
            modifier: None,
            guid: [0; 16],
            value,
        }
    }

    fn read(c: &mut SliceReader<'_>) -> Result<Self, BundleError> {
        let version = Version::new(read_u8(c)?, read_u8(c)?);
        let name_hash = read_u32(c)?;

        let modifier = if version.at_least(3, 1) && read_bool(c)? {
            Some(read_u32(c)?)
        } else {
            None
        };

        let type_code = read_u8(c)?;

        let guid: [u8; 16] = if version.at_least(3, 0) {
            read_array(c)?
        } else {
            [0; 16]
        };

        let value = match type_code {
            0 => ShaderValue::Vector(read_vec4(c)?),
            1 => ShaderValue::Color(read_vec4(c)?),
            2 => ShaderValue::Float(read_f32(c)?),
            3 => ShaderValue::Bool(read_i32(c)? != 0),
            4 => ShaderValue::Int(read_i32(c)?),
            5 => ShaderValue::Swizzle(read_vec4(c)?),
            6 => ShaderValue::Texture(TextureRef {
                path: read_string_u32(c)?,
                path_hash: if version.at_least(2, 0) {
                    read_u32(c)?
                } else {
                    0
                },
            }),
            7 => ShaderValue::Sampler(Sampler {
                address_u: read_i32(c)?,
                address_v: read_i32(c)?,
                filter: if version.at_least(1, 1) {
                    read_i32(c)?
                } else {
                    0
                },
            }),
            9 => ShaderValue::FunctionRange(read_vec4(c)?),
            11 => {
                let v2 = read_vec2(c)?;
                if !version.at_least(2, 0) {
                    read_bytes(c, 8)?; // legacy padding
                }
                ShaderValue::Vector2(v2)
            }
            other => return Err(BundleError::UnsupportedParameterType(other)),
        };

        Ok(Self {
            version,
            name_hash,
            modifier,
            guid,
            value,
        })
    }

    fn write(&self, w: &mut VecWriter) -> Result<(), BundleError> {
        write_u8(w, self.version.major);
        write_u8(w, self.version.minor);
        write_u32(w, self.name_hash);

        if self.version.at_least(3, 1) {
            match self.modifier {
                Some(word) => {
                    write_bool(w, true);
                    write_u32(w, word);
                }
                None => write_bool(w, false),
            }
        }

        write_u8(w, self.value.type_code());

        if self.version.at_least(3, 0) {
            write_bytes(w, &self.guid);
        }

        match &self.value {
            ShaderValue::Vector(v)
            | ShaderValue::Color(v)
            | ShaderValue::Swizzle(v)
            | ShaderValue::FunctionRange(v) => write_vec4(w, *v),
            ShaderValue::Float(f) => write_f32(w, *f),
            ShaderValue::Bool(b) => write_i32(w, i32::from(*b)),
            ShaderValue::Int(i) => write_i32(w, *i),
            ShaderValue::Texture(texture) => {
                write_string_u32(w, &texture.path);
                if self.version.at_least(2, 0) {
                    write_u32(w, texture.path_hash);
                }
            }
            ShaderValue::Sampler(sampler) => {
                write_i32(w, sampler.address_u);
                write_i32(w, sampler.address_v);
                if self.version.at_least(1, 1) {
                    write_i32(w, sampler.filter);
                }
            }
            ShaderValue::Vector2(v) => {
                write_vec2(w, *v);
                if !self.version.at_least(2, 0) {
                    write_bytes(w, &[0u8; 8]);
                }
            }
        }

        Ok(())
    }
}

/// Material or default shader parameter table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderParameterTable {
    /// Parameters in declaration order
    pub parameters: Vec<ShaderParameter>,
    /// Trailing words carried by 2.0+ material tables (not default tables)
    pub trailer: Option<[u32; 3]>,
}

impl ShaderParameterTable {
    fn has_trailer(v: Version, tag: u32) -> bool {
        v.at_least(2, 0) && tag == tags::SHADER_PARAMS
    }

    pub(crate) fn read(
        c: &mut SliceReader<'_>,
        v: Version,
        tag: u32,
    ) -> Result<Self, BundleError> {
        let count = if v.at_least(2, 1) {
            read_u16(c)? as usize
        } else {
            read_u8(c)? as usize
        };

        let mut parameters = Vec::with_capacity(count.min(crate::io::remaining(c) / 7));
        for _ in 0..count {
            parameters.push(ShaderParameter::read(c)?);
        }

        let trailer = if Self::has_trailer(v, tag) {
            Some([read_u32(c)?, read_u32(c)?, read_u32(c)?])
        } else {
            None
        };

        Ok(Self {
            parameters,
            trailer,
        })
    }

    pub(crate) fn write(
        &self,
        w: &mut VecWriter,
        v: Version,
        tag: u32,
    ) -> Result<(), BundleError> {
        if v.at_least(2, 1) {
            write_u16(w, self.parameters.len() as u16);
        } else {
            write_u8(w, self.parameters.len() as u8);
        }

        for parameter in &self.parameters {
            parameter.write(w)?;
        }

        if Self::has_trailer(v, tag) {
            for word in self.trailer.unwrap_or_default() {
                write_u32(w, word);
            }
        }

        Ok(())
    }
}

/// One slot binding of a shader resource name mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    /// Resource name (record versions before 2.0)
    pub name: String,
    /// Hash of the resource name (record version 2.0+)
    pub name_hash: u32,
    /// Bound slot index
    pub slot: u16,
    /// Stable mapping id (record version 3.0+)
    pub guid: [u8; 16],
}

/// Shader resource name mapping (constant buffers, textures or samplers,
/// depending on the record tag).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderParameterMapping {
    /// Slot bindings in declaration order
    pub entries: Vec<MappingEntry>,
}

impl ShaderParameterMapping {
    pub(crate) fn read(c: &mut SliceReader<'_>, v: Version) -> Result<Self, BundleError> {
        let count = if v.at_least(3, 1) {
            read_u16(c)? as usize
        } else {
            read_u8(c)? as usize
        };

        let mut entries = Vec::with_capacity(count.min(crate::io::remaining(c) / 2));
        for _ in 0..count {
            let entry = if v.at_least(2, 0) {
                MappingEntry {
                    name: String::new(),
                    name_hash: read_u32(c)?,
                    slot: read_u16(c)?,
                    guid: if v.at_least(3, 0) {
                        read_array(c)?
                    } else {
                        [0; 16]
                    },
                }
            } else {
                MappingEntry {
                    name: read_string_7bit(c)?,
                    name_hash: 0,
                    slot: u16::from(read_u8(c)?),
                    guid: [0; 16],
                }
            };
            entries.push(entry);
        }

        Ok(Self { entries })
    }

    pub(crate) fn write(&self, w: &mut VecWriter, v: Version) -> Result<(), BundleError> {
        if v.at_least(3, 1) {
            write_u16(w, self.entries.len() as u16);
        } else {
            write_u8(w, self.entries.len() as u8);
        }

        for entry in &self.entries {
            if v.at_least(2, 0) {
                write_u32(w, entry.name_hash);
                write_u16(w, entry.slot);
                if v.at_least(3, 0) {
                    write_bytes(w, &entry.guid);
                }
            } else {
                write_string_7bit(w, &entry.name);
                write_u8(w, entry.slot as u8);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_roundtrip(table: &ShaderParameterTable, v: Version, tag: u32) -> ShaderParameterTable {
        let mut w = VecWriter::new(Vec::new());
        table.write(&mut w, v, tag).unwrap();
        let bytes = w.into_inner();
        let mut c = SliceReader::new(&bytes);
        let back = ShaderParameterTable::read(&mut c, v, tag).unwrap();
        assert_eq!(crate::io::remaining(&c), 0);
        back
    }

    #[test]
    fn test_value_kinds_roundtrip() {
        let table = ShaderParameterTable {
            parameters: vec![
                ShaderParameter::new(
                    Version::new(1, 0),
                    0xAAA1,
                    ShaderValue::Color(Vec4::new(1.0, 0.5, 0.25, 1.0)),
                ),
                ShaderParameter::new(Version::new(1, 0), 0xAAA2, ShaderValue::Float(0.8)),
                ShaderParameter::new(Version::new(1, 0), 0xAAA3, ShaderValue::Bool(true)),
                ShaderParameter::new(Version::new(1, 0), 0xAAA4, ShaderValue::Int(-4)),
                ShaderParameter::new(
                    Version::new(2, 0),
                    0xAAA5,
                    ShaderValue::Texture(TextureRef {
                        path: "paint_albedo".to_string(),
                        path_hash: 0xDEAD,
                    }),
                ),
                ShaderParameter::new(
                    Version::new(1, 1),
                    0xAAA6,
                    ShaderValue::Sampler(Sampler {
                        address_u: 1,
                        address_v: 2,
                        filter: 3,
                    }),
                ),
                ShaderParameter::new(
                    Version::new(2, 0),
                    0xAAA7,
                    ShaderValue::Vector2(Vec2::new(4.0, 8.0)),
                ),
            ],
            trailer: None,
        };
        let back = table_roundtrip(&table, Version::new(1, 0), tags::DEFAULT_SHADER_PARAMS);
        assert_eq!(back, table);
    }

    #[test]
    fn test_parameter_version_drives_its_own_fields() {
        // Legacy sampler: no filter word on the wire
        let legacy = ShaderParameterTable {
            parameters: vec![ShaderParameter::new(
                Version::new(1, 0),
                1,
                ShaderValue::Sampler(Sampler {
                    address_u: 1,
                    address_v: 2,
                    filter: 99,
                }),
            )],
            trailer: None,
        };
        let back = table_roundtrip(&legacy, Version::new(1, 0), tags::DEFAULT_SHADER_PARAMS);
        let ShaderValue::Sampler(sampler) = &back.parameters[0].value else {
            panic!("expected sampler");
        };
        assert_eq!(sampler.filter, 0, "filter is gated behind parameter 1.1");

        // 2.0 sampler: the same comparator admits the filter word
        let modern = ShaderParameterTable {
            parameters: vec![ShaderParameter::new(
                Version::new(2, 0),
                1,
                ShaderValue::Sampler(Sampler {
                    address_u: 1,
                    address_v: 2,
                    filter: 99,
                }),
            )],
            trailer: None,
        };
        let back = table_roundtrip(&modern, Version::new(1, 0), tags::DEFAULT_SHADER_PARAMS);
        let ShaderValue::Sampler(sampler) = &back.parameters[0].value else {
            panic!("expected sampler");
        };
        assert_eq!(sampler.filter, 99);
    }

    #[test]
    fn test_guid_and_modifier_from_3_x() {
        let table = ShaderParameterTable {
            parameters: vec![ShaderParameter {
                version: Version::new(3, 1),
                name_hash: 0xBEEF,
                modifier: Some(77),
                guid: [0xAB; 16],
                value: ShaderValue::Vector(Vec4::ONE),
            }],
            trailer: None,
        };
        let back = table_roundtrip(&table, Version::new(1, 0), tags::DEFAULT_SHADER_PARAMS);
        assert_eq!(back, table);
    }

    #[test]
    fn test_trailer_only_on_material_tables() {
        let table = ShaderParameterTable {
            parameters: vec![],
            trailer: Some([7, 8, 9]),
        };

        let back = table_roundtrip(&table, Version::new(2, 1), tags::SHADER_PARAMS);
        assert_eq!(back.trailer, Some([7, 8, 9]));

        // Default tables never carry the trailer, whatever the version
        let mut w = VecWriter::new(Vec::new());
        table
            .write(&mut w, Version::new(2, 1), tags::DEFAULT_SHADER_PARAMS)
            .unwrap();
        assert_eq!(w.into_inner().len(), 2); // just the u16 count
    }

    #[test]
    fn test_wide_count_from_2_1() {
        let table = ShaderParameterTable {
            parameters: vec![],
            trailer: None,
        };
        let mut w = VecWriter::new(Vec::new());
        table
            .write(&mut w, Version::new(2, 0), tags::DEFAULT_SHADER_PARAMS)
            .unwrap();
        assert_eq!(w.into_inner().len(), 1, "2.0 still writes a byte count");
    }

    #[test]
    fn test_unsupported_type_code() {
        let mut w = VecWriter::new(Vec::new());
        write_u8(&mut w, 1); // count
        write_u8(&mut w, 1); // param major
        write_u8(&mut w, 0); // param minor
        write_u32(&mut w, 0); // name hash
        write_u8(&mut w, 8); // color gradient: no value layout
        let bytes = w.into_inner();

        let mut c = SliceReader::new(&bytes);
        assert_eq!(
            ShaderParameterTable::read(&mut c, Version::new(1, 0), tags::SHADER_PARAMS),
            Err(BundleError::UnsupportedParameterType(8))
        );
    }

    fn mapping_roundtrip(
        mapping: &ShaderParameterMapping,
        v: Version,
    ) -> ShaderParameterMapping {
        let mut w = VecWriter::new(Vec::new());
        mapping.write(&mut w, v).unwrap();
        let bytes = w.into_inner();
        let mut c = SliceReader::new(&bytes);
        let back = ShaderParameterMapping::read(&mut c, v).unwrap();
        assert_eq!(crate::io::remaining(&c), 0);
        back
    }

    #[test]
    fn test_mapping_named_before_2_0() {
        let mapping = ShaderParameterMapping {
            entries: vec![MappingEntry {
                name: "DiffuseSampler".to_string(),
                name_hash: 0,
                slot: 3,
                guid: [0; 16],
            }],
        };
        assert_eq!(mapping_roundtrip(&mapping, Version::new(1, 0)), mapping);
    }

    #[test]
    fn test_mapping_hashed_and_guid() {
        let mapping = ShaderParameterMapping {
            entries: vec![MappingEntry {
                name: String::new(),
                name_hash: 0xC0FFEE,
                slot: 5,
                guid: [0x11; 16],
            }],
        };
        // 2.0: hash + u16 slot, no guid yet
        let back = mapping_roundtrip(&mapping, Version::new(2, 0));
        assert_eq!(back.entries[0].name_hash, 0xC0FFEE);
        assert_eq!(back.entries[0].guid, [0; 16]);

        // 3.1: wide count, hash, slot and guid
        assert_eq!(mapping_roundtrip(&mapping, Version::new(3, 1)), mapping);
    }
}
