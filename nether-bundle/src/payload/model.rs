//! Model record payload

use crate::error::BundleError;
use crate::io::{
    read_bool, read_i8, read_u8, read_u16, write_bool, write_i8, write_u8, write_u16, SliceReader,
    VecWriter,
};
use crate::version::Version;

/// Summary counts and LOD policy for a whole model.
///
/// The counts mirror how many records of each kind the bundle carries; the
/// engine does not re-derive them, so builders must keep them consistent
/// with the record list they emit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    /// Number of mesh records
    pub mesh_count: u16,
    /// Number of buffer records
    pub buffer_count: u16,
    /// Number of vertex layout records
    pub vertex_layout_count: u16,
    /// Number of material records
    pub material_count: u16,
    /// Model carries LOD variants
    pub has_lod: bool,
    /// Lowest LOD present
    pub min_lod: i8,
    /// Highest LOD present
    pub max_lod: i8,
    /// LOD membership bits
    pub lod_flags: u16,
    /// Buffer decompression policy (from 1.2)
    pub decompress_flags: u8,
    /// Reserved byte carried by 1.3 files
    pub reserved_v1_3: u8,
}

impl Model {
    pub(crate) fn read(c: &mut SliceReader<'_>, v: Version) -> Result<Self, BundleError> {
        let mut model = Self {
            mesh_count: read_u16(c)?,
            buffer_count: read_u16(c)?,
            vertex_layout_count: read_u16(c)?,
            material_count: read_u16(c)?,
            has_lod: read_bool(c)?,
            min_lod: read_i8(c)?,
            max_lod: read_i8(c)?,
            ..Self::default()
        };
        read_u8(c)?; // padding
        model.lod_flags = read_u16(c)?;

        if v.at_least(1, 2) {
            model.decompress_flags = read_u8(c)?;
            read_u8(c)?;
        }
        if v.at_least(1, 3) {
            model.reserved_v1_3 = read_u8(c)?;
            read_u8(c)?;
        }

        Ok(model)
    }

    pub(crate) fn write(&self, w: &mut VecWriter, v: Version) -> Result<(), BundleError> {
        write_u16(w, self.mesh_count);
        write_u16(w, self.buffer_count);
        write_u16(w, self.vertex_layout_count);
        write_u16(w, self.material_count);
        write_bool(w, self.has_lod);
        write_i8(w, self.min_lod);
        write_i8(w, self.max_lod);
        write_u8(w, 0);
        write_u16(w, self.lod_flags);

        if v.at_least(1, 2) {
            write_u8(w, self.decompress_flags);
            write_u8(w, 0);
        }
        if v.at_least(1, 3) {
            write_u8(w, self.reserved_v1_3);
            write_u8(w, 0);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_model() -> Model {
        Model {
            mesh_count: 5,
            buffer_count: 8,
            vertex_layout_count: 2,
            material_count: 3,
            has_lod: true,
            min_lod: 0,
            max_lod: 4,
            lod_flags: 0b11111,
            decompress_flags: 1,
            reserved_v1_3: 7,
        }
    }

    #[test]
    fn test_roundtrip_gated() {
        for (minor, expected_len) in [(0u8, 14usize), (2, 16), (3, 18)] {
            let v = Version::new(1, minor);
            let model = sample_model();

            let mut w = VecWriter::new(Vec::new());
            model.write(&mut w, v).unwrap();
            let bytes = w.into_inner();
            assert_eq!(bytes.len(), expected_len);

            let mut c = SliceReader::new(&bytes);
            let back = Model::read(&mut c, v).unwrap();
            assert_eq!(back.mesh_count, 5);
            assert_eq!(back.decompress_flags == 1, v.at_least(1, 2));
            assert_eq!(back.reserved_v1_3 == 7, v.at_least(1, 3));
        }
    }

    #[test]
    fn test_full_roundtrip() {
        let model = sample_model();
        let mut w = VecWriter::new(Vec::new());
        model.write(&mut w, Version::new(1, 3)).unwrap();
        let bytes = w.into_inner();
        let mut c = SliceReader::new(&bytes);
        assert_eq!(Model::read(&mut c, Version::new(1, 3)).unwrap(), model);
    }
}
