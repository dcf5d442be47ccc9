//! Manufacturer color table payload

use glam::Vec3;

use crate::error::BundleError;
use crate::io::{
    read_string_7bit, read_u8, read_u16, read_u32, read_vec3, write_string_7bit, write_u8,
    write_u16, write_u32, write_vec3, SliceReader, VecWriter,
};
use crate::version::Version;

/// One selectable paint option.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManufacturerColorEntry {
    /// Bitmask of the material slots the paint applies to; narrowed to 16
    /// bits on the wire before 1.1
    pub material_mask: u32,
    /// Linear RGB preview swatch
    pub preview_color: Vec3,
    /// Paint material path
    pub path: String,
}

/// A group of paint options, usually one group per body region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManufacturerColorGroup {
    /// Options within the group
    pub entries: Vec<ManufacturerColorEntry>,
}

/// Factory paint options for a vehicle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManufacturerColors {
    /// Option groups
    pub groups: Vec<ManufacturerColorGroup>,
}

impl ManufacturerColors {
    pub(crate) fn read(c: &mut SliceReader<'_>, v: Version) -> Result<Self, BundleError> {
        let group_count = read_u8(c)? as usize;
        let mut groups = Vec::with_capacity(group_count);
        for _ in 0..group_count {
            let entry_count = read_u8(c)? as usize;
            let mut entries = Vec::with_capacity(entry_count);
            for _ in 0..entry_count {
                entries.push(ManufacturerColorEntry {
                    material_mask: if v.at_least(1, 1) {
                        read_u32(c)?
                    } else {
                        u32::from(read_u16(c)?)
                    },
                    preview_color: read_vec3(c)?,
                    path: read_string_7bit(c)?,
                });
            }
            groups.push(ManufacturerColorGroup { entries });
        }
        Ok(Self { groups })
    }

    pub(crate) fn write(&self, w: &mut VecWriter, v: Version) -> Result<(), BundleError> {
        write_u8(w, self.groups.len() as u8);
        for group in &self.groups {
            write_u8(w, group.entries.len() as u8);
            for entry in &group.entries {
                if v.at_least(1, 1) {
                    write_u32(w, entry.material_mask);
                } else {
                    write_u16(w, entry.material_mask as u16);
                }
                write_vec3(w, entry.preview_color);
                write_string_7bit(w, &entry.path);
            }
        }
        Ok(())
    }
}
