//! Morph target name table payload

use crate::error::BundleError;
use crate::io::{read_i16, read_string_u32, write_i16, write_string_u32, SliceReader, VecWriter};

/// Names of the morph targets referenced by morph buffers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MorphNames {
    /// Target names in buffer order
    pub names: Vec<String>,
}

impl MorphNames {
    pub(crate) fn read(c: &mut SliceReader<'_>) -> Result<Self, BundleError> {
        let count = read_i16(c)?.max(0) as usize;
        let mut names = Vec::with_capacity(count.min(crate::io::remaining(c) / 4));
        for _ in 0..count {
            names.push(read_string_u32(c)?);
        }
        Ok(Self { names })
    }

    pub(crate) fn write(&self, w: &mut VecWriter) -> Result<(), BundleError> {
        write_i16(w, self.names.len() as i16);
        for name in &self.names {
            write_string_u32(w, name);
        }
        Ok(())
    }
}
