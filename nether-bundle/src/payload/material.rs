//! Material reference payloads
//!
//! Material instances themselves are nested bundles (see
//! [`crate::Payload::MaterialInstance`]); the payloads here are the thin
//! path records that point at shared material assets.

use crate::error::BundleError;
use crate::io::{read_string_7bit, write_string_7bit, SliceReader, VecWriter};
use crate::version::Version;

/// Path of a shared material resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialResource {
    /// Resource path within the asset library
    pub path: String,
}

impl MaterialResource {
    pub(crate) fn read(c: &mut SliceReader<'_>) -> Result<Self, BundleError> {
        Ok(Self {
            path: read_string_7bit(c)?,
        })
    }

    pub(crate) fn write(&self, w: &mut VecWriter) -> Result<(), BundleError> {
        write_string_7bit(w, &self.path);
        Ok(())
    }
}

/// Reference into a material library, growing one path per revision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialLibraryRef {
    /// Primary library path
    pub path: String,
    /// Secondary path (from 1.1)
    pub secondary_path: String,
    /// Tertiary path (from 1.2)
    pub tertiary_path: String,
}

impl MaterialLibraryRef {
    pub(crate) fn read(c: &mut SliceReader<'_>, v: Version) -> Result<Self, BundleError> {
        let mut library = Self {
            path: read_string_7bit(c)?,
            ..Self::default()
        };
        if v.at_least(1, 1) {
            library.secondary_path = read_string_7bit(c)?;
        }
        if v.at_least(1, 2) {
            library.tertiary_path = read_string_7bit(c)?;
        }
        Ok(library)
    }

    pub(crate) fn write(&self, w: &mut VecWriter, v: Version) -> Result<(), BundleError> {
        write_string_7bit(w, &self.path);
        if v.at_least(1, 1) {
            write_string_7bit(w, &self.secondary_path);
        }
        if v.at_least(1, 2) {
            write_string_7bit(w, &self.tertiary_path);
        }
        Ok(())
    }
}
