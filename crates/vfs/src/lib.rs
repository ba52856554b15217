//! Read-only virtual filesystem over a remote scenery tree.
//!
//! A server publishes a directory tree over HTTP. Every directory carries a
//! `.dirindex` listing that names its subdirectories and files (with sizes).
//! This crate presents that tree as a read-only filesystem: listings are
//! fetched lazily and cached for the life of the mount, and files are
//! downloaded whole when opened.
//!
//! # Architecture
//!
//! ```text
//! Layer 4: FUSE Interface (TerraVfs, fuser::Filesystem impl, feature "fuse")
//! Layer 3: Filesystem Operations (TerraFs: list, getattr, open, read, release)
//! Layer 2: PathResolver, OpenFileTable
//! Layer 1: ListingCache (coalesced, at-most-once fetch per directory)
//! Layer 0: RemoteTree over terrafs_storage::HttpClient
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use terrafs_storage::{ReqwestHttpClient, TransportSettings};
//! use terrafs_vfs::{AccessMode, TerraFs, VfsOptions};
//!
//! let client = Arc::new(ReqwestHttpClient::new(TransportSettings::default())?);
//! let fs = TerraFs::new(client, VfsOptions::default().with_static_root(true));
//!
//! let entries = fs.list_directory("/Terrain").await?;
//! let fh = fs.open("/Terrain/e000n40/e000n40.stg", AccessMode::ReadOnly).await?;
//! let data = fs.read("/Terrain/e000n40/e000n40.stg", fh, 4096, 0, AccessMode::ReadOnly).await?;
//! fs.release("/Terrain/e000n40/e000n40.stg", fh)?;
//! ```

pub mod content;
pub mod error;
pub mod handles;
pub mod inode;
pub mod ops;
pub mod options;
pub mod resolver;

#[cfg(feature = "fuse")]
pub mod fuse;

pub use content::{ListingCache, ListingCacheStats, RemoteTree};
pub use error::VfsError;
pub use handles::{HandleId, OpenFileInfo, OpenFileTable};
pub use inode::{INodeId, INodeManager, ROOT_INODE};
pub use ops::{AccessMode, DirEntry, FileAttributes, NodeKind, TerraFs};
pub use options::{KernelCacheOptions, VfsOptions, DEFAULT_BASE_URL, STATIC_ROOT_DIRS};
pub use resolver::{split_path, PathResolver};

#[cfg(feature = "fuse")]
pub use fuse::{mount, spawn_mount, TerraVfs, VfsStats, VfsStatsCollector};
