#![no_std]

#[macro_use]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod array;
pub mod history;
pub mod map;
pub mod node;

mod error;

// RE-EXPORTS
// ================================================================================================

pub use array::VersionedArray;
pub use error::{Result, VersionError};
pub use history::{Entry, Version, VersionHistory};
pub use map::VersionedMap;
pub use node::{NodeId, VersionedNode};
