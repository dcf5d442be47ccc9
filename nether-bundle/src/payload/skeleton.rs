//! Skeleton record payload

use glam::Mat4;

use crate::error::BundleError;
use crate::io::{
    read_bytes, read_i16, read_mat4, read_string_u32, read_u16, read_u32, write_bytes, write_i16,
    write_mat4, write_string_u32, write_u16, write_u32, SliceReader, VecWriter,
};
use crate::version::Version;

/// One bone of a skeleton hierarchy.
///
/// The hierarchy is stored flat; parent/child/sibling links are indices
/// into the bone list, -1 meaning none.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    /// Bone name
    pub name: String,
    /// Index of the parent bone, -1 at the root
    pub parent: i16,
    /// Index of the first child bone
    pub first_child: i16,
    /// Index of the next sibling bone
    pub next_sibling: i16,
    /// Local bind transform
    pub transform: Mat4,
}

impl Bone {
    /// A root bone with an identity transform and no links.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: -1,
            first_child: -1,
            next_sibling: -1,
            transform: Mat4::IDENTITY,
        }
    }
}

/// Bone hierarchy for a skinned model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    /// Flat bone list
    pub bones: Vec<Bone>,
    /// Trailing extra block carried by 1.0+ files, preserved verbatim
    pub extra: Vec<u8>,
}

impl Skeleton {
    pub(crate) fn read(c: &mut SliceReader<'_>, v: Version) -> Result<Self, BundleError> {
        let count = read_u16(c)? as usize;
        let mut bones = Vec::with_capacity(count.min(crate::io::remaining(c) / 70));
        for _ in 0..count {
            bones.push(Bone {
                name: read_string_u32(c)?,
                parent: read_i16(c)?,
                first_child: read_i16(c)?,
                next_sibling: read_i16(c)?,
                transform: read_mat4(c)?,
            });
        }

        let extra = if v.at_least(1, 0) {
            let len = read_u32(c)? as usize;
            read_bytes(c, len)?
        } else {
            Vec::new()
        };

        Ok(Self { bones, extra })
    }

    pub(crate) fn write(&self, w: &mut VecWriter, v: Version) -> Result<(), BundleError> {
        write_u16(w, self.bones.len() as u16);
        for bone in &self.bones {
            write_string_u32(w, &bone.name);
            write_i16(w, bone.parent);
            write_i16(w, bone.first_child);
            write_i16(w, bone.next_sibling);
            write_mat4(w, bone.transform);
        }

        if v.at_least(1, 0) {
            write_u32(w, self.extra.len() as u32);
            write_bytes(w, &self.extra);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_hierarchy() {
        let skeleton = Skeleton {
            bones: vec![
                Bone::root("<root>"),
                Bone {
                    name: "hub_front_left".to_string(),
                    parent: 0,
                    first_child: -1,
                    next_sibling: 2,
                    transform: Mat4::from_translation(glam::Vec3::new(0.8, 0.3, 1.2)),
                },
                Bone {
                    name: "hub_front_right".to_string(),
                    parent: 0,
                    first_child: -1,
                    next_sibling: -1,
                    transform: Mat4::from_translation(glam::Vec3::new(-0.8, 0.3, 1.2)),
                },
            ],
            extra: vec![1, 2, 3, 4],
        };

        let v = Version::new(1, 0);
        let mut w = VecWriter::new(Vec::new());
        skeleton.write(&mut w, v).unwrap();
        let bytes = w.into_inner();

        let mut c = SliceReader::new(&bytes);
        let back = Skeleton::read(&mut c, v).unwrap();
        assert_eq!(back, skeleton);
        assert_eq!(crate::io::remaining(&c), 0);
    }

    #[test]
    fn test_pre_1_0_has_no_extra_block() {
        let skeleton = Skeleton {
            bones: vec![Bone::root("<root>")],
            extra: vec![0xFF; 8],
        };

        let v = Version::new(0, 9);
        let mut w = VecWriter::new(Vec::new());
        skeleton.write(&mut w, v).unwrap();
        let bytes = w.into_inner();
        // count + (len-prefixed name + 3 links + matrix), no extra block
        assert_eq!(bytes.len(), 2 + (4 + 6) + 6 + 64);

        let mut c = SliceReader::new(&bytes);
        let back = Skeleton::read(&mut c, v).unwrap();
        assert!(back.extra.is_empty());
    }
}
