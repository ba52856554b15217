//! Core inode types.

/// Unique identifier for an inode.
pub type INodeId = u64;

/// Root directory inode ID (always 1 per FUSE convention).
pub const ROOT_INODE: INodeId = 1;
