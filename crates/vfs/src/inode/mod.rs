//! Inode numbering for the mounted tree.
//!
//! The filesystem operations are path based; the kernel speaks inode numbers.
//! [`INodeManager`] hands out a stable number for every path the kernel has
//! looked up and maps it back on later calls.

mod manager;
mod types;

pub use manager::INodeManager;
pub use types::{INodeId, ROOT_INODE};
