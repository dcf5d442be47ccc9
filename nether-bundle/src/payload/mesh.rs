//! Mesh record payload
//!
//! The most revision-churned record in the format: eight documented version
//! cutovers between 1.0 and 1.9, each adding fields in place. Every gate
//! below appears once on the read path and once, with the same threshold,
//! on the write path.

use glam::Vec4;

use crate::error::BundleError;
use crate::io::{
    read_bool, read_f32, read_i16, read_i32, read_u8, read_u16, read_u32, read_vec4, write_bool,
    write_f32, write_i16, write_i32, write_u8, write_u16, write_u32, write_vec4, SliceReader,
    VecWriter,
};
use crate::version::Version;

/// One vertex buffer binding used by a mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VertexBufferUsage {
    /// Record index of the vertex buffer within the bundle
    pub index: i32,
    /// GPU input slot
    pub input_slot: u32,
    /// Stride in bytes
    pub stride: u32,
    /// Byte offset into the buffer
    pub offset: u32,
}

/// Draw-call description for one piece of model geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Material record indices; before 1.9 only the first slot is stored
    pub material_ids: [i16; 4],
    /// Bone this mesh is rigidly attached to, -1 when skinned
    pub rigid_bone_index: i16,
    /// LOD membership bits
    pub lod_flags: u16,
    /// First LOD threshold
    pub lod_level1: u8,
    /// Second LOD threshold
    pub lod_level2: u8,
    /// Render bucket bits, see the `is_*` accessors
    pub bucket_flags: u16,
    /// Draw order within the bucket
    pub bucket_order: u8,
    /// Skinning elements per vertex (from 1.2)
    pub skinning_element_count: u8,
    /// Morph weights per vertex (from 1.2)
    pub morph_weight_count: u8,
    /// Mesh participates in morph-based damage (from 1.3)
    pub morph_damage: bool,
    /// Index buffer uses 32-bit indices
    pub indices_32bit: bool,
    /// Primitive topology enumerator
    pub topology: u16,
    /// Record index of the index buffer
    pub index_buffer_index: i32,
    /// Element offset into the index buffer
    pub index_buffer_offset: i32,
    /// Element offset of the first drawn index
    pub index_buffer_draw_offset: i32,
    /// Base vertex added to each index
    pub indexed_vertex_offset: i32,
    /// Number of indices drawn
    pub index_count: i32,
    /// Number of primitives drawn
    pub prim_count: i32,
    /// Average cache miss ratio of the index stream (from 1.6)
    pub cache_miss_ratio: f32,
    /// Distinct vertices referenced by the index stream (from 1.6)
    pub referenced_vertex_count: u32,
    /// Record index of the vertex layout
    pub vertex_layout_index: i32,
    /// Vertex buffer bindings
    pub vertex_buffers: Vec<VertexBufferUsage>,
    /// Record index of the morph delta buffer (from 1.4)
    pub morph_buffer_index: i32,
    /// Record index of the skinning buffer (from 1.4)
    pub skin_buffer_index: i32,
    /// Record indices of constant buffers
    pub constant_buffer_indices: Vec<i32>,
    /// Index of the source mesh this one was generated from (from 1.1)
    pub source_mesh_index: u32,
    /// Texture coordinate channel transforms (from 1.5)
    pub texcoord_transforms: [Vec4; 5],
    /// Quantized position decode scale (from 1.8)
    pub position_scale: Vec4,
    /// Quantized position decode offset (from 1.8)
    pub position_translate: Vec4,
}

impl Mesh {
    /// Opaque-bucket bit.
    pub fn is_opaque(&self) -> bool {
        self.bucket_flags & 1 != 0
    }

    /// Decal-bucket bit.
    pub fn is_decal(&self) -> bool {
        self.bucket_flags & 2 != 0
    }

    /// Transparent-bucket bit.
    pub fn is_transparent(&self) -> bool {
        self.bucket_flags & 4 != 0
    }

    /// Mesh casts shadows.
    pub fn casts_shadow(&self) -> bool {
        self.bucket_flags & 8 != 0
    }

    /// Mesh is excluded from shadow passes.
    pub fn shadow_excluded(&self) -> bool {
        self.bucket_flags & 16 != 0
    }

    /// Alpha-to-coverage bit.
    pub fn alpha_to_coverage(&self) -> bool {
        self.bucket_flags & 32 != 0
    }

    pub(crate) fn read(c: &mut SliceReader<'_>, v: Version) -> Result<Self, BundleError> {
        let mut mesh = Self::default();

        if v.at_least(1, 9) {
            for id in &mut mesh.material_ids {
                *id = read_i16(c)?;
            }
        } else {
            mesh.material_ids[0] = read_i16(c)?;
        }

        mesh.rigid_bone_index = read_i16(c)?;
        mesh.lod_flags = read_u16(c)?;
        mesh.lod_level1 = read_u8(c)?;
        mesh.lod_level2 = read_u8(c)?;
        mesh.bucket_flags = read_u16(c)?;
        mesh.bucket_order = read_u8(c)?;

        if v.at_least(1, 2) {
            mesh.skinning_element_count = read_u8(c)?;
            mesh.morph_weight_count = read_u8(c)?;
        }
        if v.at_least(1, 3) {
            mesh.morph_damage = read_bool(c)?;
        }

        mesh.indices_32bit = read_bool(c)?;
        mesh.topology = read_u16(c)?;
        mesh.index_buffer_index = read_i32(c)?;
        mesh.index_buffer_offset = read_i32(c)?;
        mesh.index_buffer_draw_offset = read_i32(c)?;
        mesh.indexed_vertex_offset = read_i32(c)?;
        mesh.index_count = read_i32(c)?;
        mesh.prim_count = read_i32(c)?;

        if v.at_least(1, 6) {
            mesh.cache_miss_ratio = read_f32(c)?;
            mesh.referenced_vertex_count = read_u32(c)?;
        }

        mesh.vertex_layout_index = read_i32(c)?;

        let vb_count = read_i32(c)?.max(0) as usize;
        mesh.vertex_buffers.reserve(vb_count.min(crate::io::remaining(c) / 16));
        for _ in 0..vb_count {
            mesh.vertex_buffers.push(VertexBufferUsage {
                index: read_i32(c)?,
                input_slot: read_u32(c)?,
                stride: read_u32(c)?,
                offset: read_u32(c)?,
            });
        }

        if v.at_least(1, 4) {
            mesh.morph_buffer_index = read_i32(c)?;
            mesh.skin_buffer_index = read_i32(c)?;
        }

        let cb_count = read_i32(c)?.max(0) as usize;
        mesh.constant_buffer_indices
            .reserve(cb_count.min(crate::io::remaining(c) / 4));
        for _ in 0..cb_count {
            mesh.constant_buffer_indices.push(read_i32(c)?);
        }

        if v.at_least(1, 1) {
            mesh.source_mesh_index = read_u32(c)?;
        }
        if v.at_least(1, 5) {
            for t in &mut mesh.texcoord_transforms {
                *t = read_vec4(c)?;
            }
        }
        if v.at_least(1, 8) {
            mesh.position_scale = read_vec4(c)?;
            mesh.position_translate = read_vec4(c)?;
        }

        Ok(mesh)
    }

    pub(crate) fn write(&self, w: &mut VecWriter, v: Version) -> Result<(), BundleError> {
        if v.at_least(1, 9) {
            for id in &self.material_ids {
                write_i16(w, *id);
            }
        } else {
            write_i16(w, self.material_ids[0]);
        }

        write_i16(w, self.rigid_bone_index);
        write_u16(w, self.lod_flags);
        write_u8(w, self.lod_level1);
        write_u8(w, self.lod_level2);
        write_u16(w, self.bucket_flags);
        write_u8(w, self.bucket_order);

        if v.at_least(1, 2) {
            write_u8(w, self.skinning_element_count);
            write_u8(w, self.morph_weight_count);
        }
        if v.at_least(1, 3) {
            write_bool(w, self.morph_damage);
        }

        write_bool(w, self.indices_32bit);
        write_u16(w, self.topology);
        write_i32(w, self.index_buffer_index);
        write_i32(w, self.index_buffer_offset);
        write_i32(w, self.index_buffer_draw_offset);
        write_i32(w, self.indexed_vertex_offset);
        write_i32(w, self.index_count);
        write_i32(w, self.prim_count);

        if v.at_least(1, 6) {
            write_f32(w, self.cache_miss_ratio);
            write_u32(w, self.referenced_vertex_count);
        }

        write_i32(w, self.vertex_layout_index);

        write_i32(w, self.vertex_buffers.len() as i32);
        for vb in &self.vertex_buffers {
            write_i32(w, vb.index);
            write_u32(w, vb.input_slot);
            write_u32(w, vb.stride);
            write_u32(w, vb.offset);
        }

        if v.at_least(1, 4) {
            write_i32(w, self.morph_buffer_index);
            write_i32(w, self.skin_buffer_index);
        }

        write_i32(w, self.constant_buffer_indices.len() as i32);
        for cb in &self.constant_buffer_indices {
            write_i32(w, *cb);
        }

        if v.at_least(1, 1) {
            write_u32(w, self.source_mesh_index);
        }
        if v.at_least(1, 5) {
            for t in &self.texcoord_transforms {
                write_vec4(w, *t);
            }
        }
        if v.at_least(1, 8) {
            write_vec4(w, self.position_scale);
            write_vec4(w, self.position_translate);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_mesh() -> Mesh {
        Mesh {
            material_ids: [3, 1, -1, -1],
            rigid_bone_index: 12,
            lod_flags: 0b111,
            lod_level1: 1,
            lod_level2: 2,
            bucket_flags: 0b101001,
            bucket_order: 4,
            skinning_element_count: 2,
            morph_weight_count: 1,
            morph_damage: true,
            indices_32bit: true,
            topology: 4,
            index_buffer_index: 9,
            index_buffer_offset: 0,
            index_buffer_draw_offset: 128,
            indexed_vertex_offset: 64,
            index_count: 3000,
            prim_count: 1000,
            cache_miss_ratio: 0.71,
            referenced_vertex_count: 900,
            vertex_layout_index: 10,
            vertex_buffers: vec![
                VertexBufferUsage {
                    index: 12,
                    input_slot: 0,
                    stride: 8,
                    offset: 0,
                },
                VertexBufferUsage {
                    index: 13,
                    input_slot: 1,
                    stride: 12,
                    offset: 0,
                },
            ],
            morph_buffer_index: -1,
            skin_buffer_index: -1,
            constant_buffer_indices: vec![2, 5],
            source_mesh_index: 1,
            texcoord_transforms: [Vec4::new(1.0, 1.0, 0.0, 0.0); 5],
            position_scale: Vec4::new(2.0, 2.0, 2.0, 1.0),
            position_translate: Vec4::new(-1.0, 0.0, -1.0, 0.0),
        }
    }

    fn roundtrip(mesh: &Mesh, v: Version) -> Mesh {
        let mut w = VecWriter::new(Vec::new());
        mesh.write(&mut w, v).unwrap();
        let bytes = w.into_inner();
        let mut c = SliceReader::new(&bytes);
        let back = Mesh::read(&mut c, v).unwrap();
        assert_eq!(crate::io::remaining(&c), 0, "trailing bytes at v{v}");
        back
    }

    #[test]
    fn test_roundtrip_full_version() {
        let mesh = sample_mesh();
        assert_eq!(roundtrip(&mesh, Version::new(1, 9)), mesh);
    }

    #[test]
    fn test_roundtrip_every_cutover() {
        // Fields beyond a version gate are dropped on write, so the
        // round-trip result is the sample with those fields defaulted.
        for minor in [0u8, 1, 2, 3, 4, 5, 6, 8, 9] {
            let v = Version::new(1, minor);
            let mesh = sample_mesh();
            let back = roundtrip(&mesh, v);

            if v.at_least(1, 9) {
                assert_eq!(back.material_ids, mesh.material_ids);
            } else {
                assert_eq!(back.material_ids, [3, 0, 0, 0]);
            }
            assert_eq!(back.skinning_element_count == 2, v.at_least(1, 2));
            assert_eq!(back.morph_damage, v.at_least(1, 3));
            assert_eq!(back.morph_buffer_index == -1, v.at_least(1, 4));
            assert_eq!(
                back.texcoord_transforms[0] == Vec4::new(1.0, 1.0, 0.0, 0.0),
                v.at_least(1, 5)
            );
            assert_eq!(back.cache_miss_ratio == 0.71, v.at_least(1, 6));
            assert_eq!(back.position_scale == mesh.position_scale, v.at_least(1, 8));
            assert_eq!(back.source_mesh_index == 1, v.at_least(1, 1));

            // Ungated fields survive every revision
            assert_eq!(back.vertex_buffers, mesh.vertex_buffers);
            assert_eq!(back.constant_buffer_indices, mesh.constant_buffer_indices);
            assert_eq!(back.index_count, mesh.index_count);
        }
    }

    #[test]
    fn test_payload_size_per_version() {
        let mesh = Mesh::default();
        let sizes: Vec<(u8, usize)> = [0u8, 1, 2, 3, 4, 5, 6, 8, 9]
            .iter()
            .map(|&minor| {
                let mut w = VecWriter::new(Vec::new());
                mesh.write(&mut w, Version::new(1, minor)).unwrap();
                (minor, w.into_inner().len())
            })
            .collect();

        assert_eq!(sizes[0], (0, 50));
        assert_eq!(sizes[1], (1, 54)); // + source mesh index
        assert_eq!(sizes[2], (2, 56)); // + skinning/morph counts
        assert_eq!(sizes[3], (3, 57)); // + morph damage flag
        assert_eq!(sizes[4], (4, 65)); // + morph/skin buffer indices
        assert_eq!(sizes[5], (5, 145)); // + five texcoord transforms
        assert_eq!(sizes[6], (6, 153)); // + acmr + referenced count
        assert_eq!(sizes[7], (8, 185)); // + position scale/translate
        assert_eq!(sizes[8], (9, 191)); // + three more material ids
    }

    #[test]
    fn test_bucket_flag_accessors() {
        let mesh = Mesh {
            bucket_flags: 0b101001,
            ..Mesh::default()
        };
        assert!(mesh.is_opaque());
        assert!(!mesh.is_decal());
        assert!(!mesh.is_transparent());
        assert!(mesh.casts_shadow());
        assert!(!mesh.shadow_excluded());
        assert!(mesh.alpha_to_coverage());
    }
}
