//! Vertex input layout payload

use crate::buffer::ElementFormat;
use crate::error::BundleError;
use crate::io::{
    read_i16, read_i32, read_string_u32, read_u16, read_u32, write_i16, write_i32,
    write_string_u32, write_u16, write_u32, SliceReader, VecWriter,
};
use crate::version::Version;

/// One element of a vertex input layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutElement {
    /// Index into the layout's semantic name table
    pub name_index: i16,
    /// Semantic index (TEXCOORD0 vs TEXCOORD1)
    pub semantic_index: i16,
    /// GPU input slot
    pub input_slot: i16,
    /// Per-vertex or per-instance classification
    pub input_slot_class: i16,
    /// Element format as consumed by shaders
    pub format: ElementFormat,
    /// Byte offset within the vertex
    pub aligned_byte_offset: i32,
    /// Instancing step rate
    pub instance_step_rate: i32,
}

/// Vertex input layout shared by meshes; also used for the instanced
/// variant tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexLayout {
    /// Semantic name table ("POSITION", "TEXCOORD", ...)
    pub semantic_names: Vec<String>,
    /// Input elements
    pub elements: Vec<LayoutElement>,
    /// Storage format per element (from 1.0); the shader-visible `format`
    /// may widen what is actually packed in the buffer
    pub packed_formats: Vec<ElementFormat>,
    /// Layout flags (from 1.1)
    pub flags: u32,
}

impl VertexLayout {
    pub(crate) fn read(c: &mut SliceReader<'_>, v: Version) -> Result<Self, BundleError> {
        let name_count = read_u16(c)? as usize;
        let mut semantic_names = Vec::with_capacity(name_count.min(crate::io::remaining(c) / 4));
        for _ in 0..name_count {
            semantic_names.push(read_string_u32(c)?);
        }

        let element_count = read_u16(c)? as usize;
        let mut elements = Vec::with_capacity(element_count.min(crate::io::remaining(c) / 20));
        for _ in 0..element_count {
            elements.push(LayoutElement {
                name_index: read_i16(c)?,
                semantic_index: read_i16(c)?,
                input_slot: read_i16(c)?,
                input_slot_class: read_i16(c)?,
                format: ElementFormat(read_u32(c)?),
                aligned_byte_offset: read_i32(c)?,
                instance_step_rate: read_i32(c)?,
            });
        }

        let mut packed_formats = Vec::new();
        if v.at_least(1, 0) {
            packed_formats.reserve(element_count);
            for _ in 0..element_count {
                packed_formats.push(ElementFormat(read_u32(c)?));
            }
        }

        let flags = if v.at_least(1, 1) { read_u32(c)? } else { 0 };

        Ok(Self {
            semantic_names,
            elements,
            packed_formats,
            flags,
        })
    }

    pub(crate) fn write(&self, w: &mut VecWriter, v: Version) -> Result<(), BundleError> {
        write_u16(w, self.semantic_names.len() as u16);
        for name in &self.semantic_names {
            write_string_u32(w, name);
        }

        write_u16(w, self.elements.len() as u16);
        for element in &self.elements {
            write_i16(w, element.name_index);
            write_i16(w, element.semantic_index);
            write_i16(w, element.input_slot);
            write_i16(w, element.input_slot_class);
            write_u32(w, element.format.0);
            write_i32(w, element.aligned_byte_offset);
            write_i32(w, element.instance_step_rate);
        }

        if v.at_least(1, 0) {
            // The reader takes the packed format count from the element
            // table, so exactly one format per element goes out.
            for index in 0..self.elements.len() {
                let format = self
                    .packed_formats
                    .get(index)
                    .copied()
                    .unwrap_or(ElementFormat::UNKNOWN);
                write_u32(w, format.0);
            }
        }

        if v.at_least(1, 1) {
            write_u32(w, self.flags);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_layout() -> VertexLayout {
        VertexLayout {
            semantic_names: vec![
                "POSITION".to_string(),
                "NORMAL".to_string(),
                "TEXCOORD".to_string(),
            ],
            elements: vec![
                LayoutElement {
                    name_index: 0,
                    format: ElementFormat::R16G16B16A16_SNORM,
                    aligned_byte_offset: 0,
                    ..LayoutElement::default()
                },
                LayoutElement {
                    name_index: 1,
                    format: ElementFormat::R10G10B10A2_UNORM,
                    aligned_byte_offset: 8,
                    ..LayoutElement::default()
                },
                LayoutElement {
                    name_index: 2,
                    semantic_index: 1,
                    format: ElementFormat::R16G16_UNORM,
                    aligned_byte_offset: 12,
                    ..LayoutElement::default()
                },
            ],
            packed_formats: vec![
                ElementFormat::R16G16B16A16_SNORM,
                ElementFormat::R10G10B10A2_UNORM,
                ElementFormat::R16G16_UNORM,
            ],
            flags: 3,
        }
    }

    fn roundtrip(layout: &VertexLayout, v: Version) -> VertexLayout {
        let mut w = VecWriter::new(Vec::new());
        layout.write(&mut w, v).unwrap();
        let bytes = w.into_inner();
        let mut c = SliceReader::new(&bytes);
        let back = VertexLayout::read(&mut c, v).unwrap();
        assert_eq!(crate::io::remaining(&c), 0);
        back
    }

    #[test]
    fn test_roundtrip_v1_1() {
        let layout = sample_layout();
        assert_eq!(roundtrip(&layout, Version::new(1, 1)), layout);
    }

    #[test]
    fn test_flags_gated_out_before_1_1() {
        let layout = sample_layout();
        let back = roundtrip(&layout, Version::new(1, 0));
        assert_eq!(back.flags, 0);
        assert_eq!(back.packed_formats, layout.packed_formats);
    }

    #[test]
    fn test_missing_packed_formats_are_padded() {
        let mut layout = sample_layout();
        layout.packed_formats.truncate(1);
        let back = roundtrip(&layout, Version::new(1, 1));
        assert_eq!(back.packed_formats.len(), 3);
        assert_eq!(back.packed_formats[0], ElementFormat::R16G16B16A16_SNORM);
        assert_eq!(back.packed_formats[2], ElementFormat::UNKNOWN);
    }
}
