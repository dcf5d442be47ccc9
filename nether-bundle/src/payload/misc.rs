//! Small single-purpose payloads

use crate::error::BundleError;
use crate::io::{read_string_7bit, read_u32, write_string_7bit, write_u32, SliceReader, VecWriter};

/// Tool revision stamp left in exported bundles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionInfo {
    /// Exporter revision number
    pub revision: u32,
    /// Source asset path
    pub path: String,
}

impl VersionInfo {
    pub(crate) fn read(c: &mut SliceReader<'_>) -> Result<Self, BundleError> {
        Ok(Self {
            revision: read_u32(c)?,
            path: read_string_7bit(c)?,
        })
    }

    pub(crate) fn write(&self, w: &mut VecWriter) -> Result<(), BundleError> {
        write_u32(w, self.revision);
        write_string_7bit(w, &self.path);
        Ok(())
    }
}
