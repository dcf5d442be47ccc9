//! Two-part format version with the threshold comparators that gate
//! version-dependent fields.
//!
//! Every gated field in the format uses the same pair of predicates,
//! [`Version::at_least`] and [`Version::at_most`], with identical thresholds
//! on the read and the write side. Breaking that symmetry corrupts data on
//! round-trip without raising an error, so per-field ad hoc comparisons are
//! deliberately not provided.

use core::fmt;

/// A major/minor format version carried by bundles and records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// Major format revision
    pub major: u8,
    /// Minor format revision
    pub minor: u8,
}

impl Version {
    /// Create a version from a major/minor pair.
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// True when this version is `major.minor` or newer.
    pub const fn at_least(self, major: u8, minor: u8) -> bool {
        self.major > major || (self.major == major && self.minor >= minor)
    }

    /// True when this version is `major.minor` or older.
    pub const fn at_most(self, major: u8, minor: u8) -> bool {
        self.major < major || (self.major == major && self.minor <= minor)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
