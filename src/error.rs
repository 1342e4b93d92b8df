use thiserror::Error;

use crate::history::Version;

/// The type of errors returned by the versioned containers.
///
/// All failures are synchronous and local to the failing call: a container whose operation
/// returns an error has not ticked its clock and has not written any history entry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    /// Raised when a read targets a version beyond the owning container's current clock.
    #[error("version {requested} exceeds the current version {current}")]
    VersionNotFound { requested: Version, current: Version },

    /// Raised when an array index is not covered by the logical length it was checked against.
    #[error("index {index} is out of bounds for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Raised when removal is attempted on an array with logical length zero.
    #[error("cannot remove the last element of an empty array")]
    EmptyCollection,
}

/// The result type for use with the versioned containers.
pub type Result<T> = core::result::Result<T, VersionError>;
