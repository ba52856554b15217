//! Path-based filesystem operations.
//!
//! [`TerraFs`] is what a filesystem driver calls into. It composes the
//! listing cache, the path resolver, and the open-file table, and turns every
//! failure into one of the operation-level outcomes in [`VfsError`].

use std::sync::Arc;

use terrafs_model::{Entry, EntryKind};
use terrafs_storage::HttpClient;

use crate::content::{ListingCache, ListingCacheStats, RemoteTree};
use crate::handles::{HandleId, OpenFileInfo, OpenFileTable};
use crate::options::{VfsOptions, STATIC_ROOT_DIRS};
use crate::resolver::PathResolver;
use crate::VfsError;

/// Directory file type bits.
pub const S_IFDIR: u32 = 0o040000;

/// Regular file type bits.
pub const S_IFREG: u32 = 0o100000;

/// Permissions of every directory (r-xr-xr-x).
pub const DIR_PERMS: u16 = 0o555;

/// Permissions of every file (r--r--r--).
pub const FILE_PERMS: u16 = 0o444;

/// Root path of the mount.
pub const ROOT_PATH: &str = "/";

/// Kind of a node as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

/// Attributes of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileAttributes {
    /// File or directory.
    pub kind: NodeKind,
    /// Permission bits.
    pub perm: u16,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Link count.
    pub nlink: u32,
}

impl FileAttributes {
    /// Attributes of a read-only directory.
    pub fn directory() -> Self {
        Self {
            kind: NodeKind::Directory,
            perm: DIR_PERMS,
            size: 0,
            nlink: 1,
        }
    }

    /// Attributes of a read-only regular file.
    ///
    /// # Arguments
    /// * `size` - File size in bytes
    pub fn file(size: u64) -> Self {
        Self {
            kind: NodeKind::File,
            perm: FILE_PERMS,
            size,
            nlink: 1,
        }
    }

    /// Full POSIX mode (type bits and permissions).
    pub fn mode(&self) -> u32 {
        let type_bits: u32 = match self.kind {
            NodeKind::File => S_IFREG,
            NodeKind::Directory => S_IFDIR,
        };
        type_bits | u32::from(self.perm)
    }

    /// Check if these are directory attributes.
    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}

impl From<&Entry> for FileAttributes {
    fn from(entry: &Entry) -> Self {
        match entry.kind {
            EntryKind::File { size } => FileAttributes::file(size),
            EntryKind::Directory => FileAttributes::directory(),
        }
    }
}

/// One record of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name.
    pub name: String,
    /// Entry attributes.
    pub attr: FileAttributes,
}

impl DirEntry {
    /// Full POSIX mode of the entry.
    pub fn mode(&self) -> u32 {
        self.attr.mode()
    }

    /// Size of the entry in bytes.
    pub fn size(&self) -> u64 {
        self.attr.size
    }
}

/// Access intent decoded from open flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// `O_RDONLY`.
    ReadOnly,
    /// `O_WRONLY`.
    WriteOnly,
    /// `O_RDWR`.
    ReadWrite,
}

impl AccessMode {
    /// Decode the `O_ACCMODE` bits of POSIX open flags.
    ///
    /// # Arguments
    /// * `flags` - Open flags as passed by the kernel
    pub fn from_flags(flags: i32) -> Self {
        match flags & libc::O_ACCMODE {
            libc::O_RDONLY => AccessMode::ReadOnly,
            libc::O_WRONLY => AccessMode::WriteOnly,
            _ => AccessMode::ReadWrite,
        }
    }

    /// Check if this is read-only access.
    pub fn is_read_only(&self) -> bool {
        *self == AccessMode::ReadOnly
    }
}

/// Read-only filesystem over a remote `.dirindex` tree.
pub struct TerraFs {
    /// Configuration.
    options: VfsOptions,
    /// Path resolver (owns the listing cache).
    resolver: PathResolver,
    /// Open files.
    handles: OpenFileTable,
}

impl TerraFs {
    /// Create a filesystem over a transport client.
    ///
    /// # Arguments
    /// * `client` - Transport used for listings and content
    /// * `options` - Base URL and static-root configuration
    pub fn new(client: Arc<dyn HttpClient>, options: VfsOptions) -> Self {
        let tree: Arc<RemoteTree> = Arc::new(RemoteTree::new(client, options.base_url.clone()));
        let listings: Arc<ListingCache> = Arc::new(ListingCache::new(tree));

        Self {
            options,
            resolver: PathResolver::new(listings),
            handles: OpenFileTable::new(),
        }
    }

    /// Get the configuration.
    pub fn options(&self) -> &VfsOptions {
        &self.options
    }

    /// Get the listing cache.
    pub fn listings(&self) -> &Arc<ListingCache> {
        self.resolver.listings()
    }

    /// Get listing cache statistics.
    pub fn listing_stats(&self) -> ListingCacheStats {
        self.resolver.listings().stats()
    }

    /// Describe all open files.
    pub fn open_files(&self) -> Vec<OpenFileInfo> {
        self.handles.list()
    }

    /// List the entries of a directory.
    ///
    /// # Arguments
    /// * `path` - Absolute virtual directory path
    ///
    /// # Returns
    /// Entries in listing order, or `NotFound` if the directory has no listing.
    pub async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>, VfsError> {
        tracing::trace!("list_directory: {}", path);

        if self.options.static_root && path == ROOT_PATH {
            return Ok(STATIC_ROOT_DIRS
                .iter()
                .map(|name| DirEntry {
                    name: (*name).to_string(),
                    attr: FileAttributes::directory(),
                })
                .collect());
        }

        let dir_url: String = self.listings().tree().directory_url(path);
        let entries: Option<Vec<DirEntry>> = self
            .listings()
            .with_listing(&dir_url, |listing| {
                listing.map(|l| {
                    l.iter()
                        .map(|e| DirEntry {
                            name: e.name.clone(),
                            attr: FileAttributes::from(e),
                        })
                        .collect()
                })
            })
            .await;

        entries.ok_or_else(|| VfsError::NotFound(path.to_string()))
    }

    /// Get the attributes of a path.
    ///
    /// # Arguments
    /// * `path` - Absolute virtual path
    ///
    /// # Returns
    /// Directory or file attributes, or `NotFound`.
    pub async fn get_attributes(&self, path: &str) -> Result<FileAttributes, VfsError> {
        tracing::trace!("get_attributes: {}", path);

        if path == ROOT_PATH || self.options.is_static_root_dir(path) {
            return Ok(FileAttributes::directory());
        }

        let entry: Entry = self.resolve(path).await?;
        Ok(FileAttributes::from(&entry))
    }

    /// Open a file for reading, buffering its whole content.
    ///
    /// # Arguments
    /// * `path` - Absolute virtual path
    /// * `mode` - Requested access
    ///
    /// # Returns
    /// The new handle ID. Write intent is `PermissionDenied`; a missing entry or
    /// failed content fetch is `NotFound`.
    pub async fn open(&self, path: &str, mode: AccessMode) -> Result<HandleId, VfsError> {
        tracing::trace!("open: {} ({:?})", path, mode);
        Self::check_access(path, mode)?;

        let entry: Entry = self.resolve(path).await?;
        if entry.is_directory() {
            return Err(VfsError::IsADirectory(path.to_string()));
        }

        let content: Vec<u8> = match self.listings().tree().fetch_file(path).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Content fetch failed for {}: {}", path, e);
                return Err(VfsError::NotFound(path.to_string()));
            }
        };

        let fh: HandleId = self.handles.insert(path, content);
        tracing::debug!("Opened {} as handle {}", path, fh);
        Ok(fh)
    }

    /// Read from an open file.
    ///
    /// # Arguments
    /// * `path` - Absolute virtual path the file was opened at
    /// * `fh` - Handle returned by [`Self::open`]
    /// * `size` - Maximum number of bytes to return
    /// * `offset` - Start offset in bytes
    /// * `mode` - Access the file is held with
    ///
    /// # Returns
    /// Up to `size` bytes; empty at or past the end of the file.
    pub async fn read(
        &self,
        path: &str,
        fh: HandleId,
        size: usize,
        offset: u64,
        mode: AccessMode,
    ) -> Result<Vec<u8>, VfsError> {
        tracing::trace!("read: {} fh={} size={} offset={}", path, fh, size, offset);
        Self::check_access(path, mode)?;
        self.resolve(path).await?;

        self.handles
            .read(fh, offset, size)
            .ok_or(VfsError::UnknownHandle(fh))
    }

    /// Release an open file, freeing its buffer.
    ///
    /// # Arguments
    /// * `path` - Absolute virtual path the file was opened at
    /// * `fh` - Handle returned by [`Self::open`]
    pub fn release(&self, path: &str, fh: HandleId) -> Result<(), VfsError> {
        tracing::trace!("release: {} fh={}", path, fh);
        if self.handles.remove(fh) {
            tracing::debug!("Released handle {} for {}", fh, path);
            Ok(())
        } else {
            Err(VfsError::UnknownHandle(fh))
        }
    }

    /// Resolve a path to its entry or fail with `NotFound`.
    async fn resolve(&self, path: &str) -> Result<Entry, VfsError> {
        self.resolver
            .resolve_entry(path)
            .await
            .ok_or_else(|| VfsError::NotFound(path.to_string()))
    }

    /// Reject any access but read-only.
    fn check_access(path: &str, mode: AccessMode) -> Result<(), VfsError> {
        if mode.is_read_only() {
            Ok(())
        } else {
            Err(VfsError::PermissionDenied(path.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrafs_storage::MemoryHttpClient;

    const BASE: &str = "http://scenery.test";

    fn fs_with(client: Arc<MemoryHttpClient>, static_root: bool) -> TerraFs {
        let options: VfsOptions = VfsOptions::default()
            .with_base_url(BASE)
            .with_static_root(static_root);
        TerraFs::new(client, options)
    }

    #[test]
    fn test_attribute_modes() {
        assert_eq!(FileAttributes::directory().mode(), 0o040555);
        assert_eq!(FileAttributes::file(3).mode(), 0o100444);
        assert_eq!(FileAttributes::file(3).size, 3);
        assert_eq!(FileAttributes::directory().nlink, 1);
    }

    #[test]
    fn test_access_mode_from_flags() {
        assert_eq!(AccessMode::from_flags(libc::O_RDONLY), AccessMode::ReadOnly);
        assert_eq!(AccessMode::from_flags(libc::O_WRONLY), AccessMode::WriteOnly);
        assert_eq!(AccessMode::from_flags(libc::O_RDWR), AccessMode::ReadWrite);
        assert_eq!(
            AccessMode::from_flags(libc::O_RDONLY | libc::O_NONBLOCK),
            AccessMode::ReadOnly
        );
    }

    #[tokio::test]
    async fn test_root_attributes_without_network() {
        let client: Arc<MemoryHttpClient> = Arc::new(MemoryHttpClient::new());
        let fs: TerraFs = fs_with(client.clone(), false);

        let attr: FileAttributes = fs.get_attributes("/").await.unwrap();
        assert!(attr.is_directory());
        assert_eq!(attr.perm, DIR_PERMS);
        assert_eq!(client.total_requests(), 0);
    }

    #[tokio::test]
    async fn test_open_directory_is_rejected() {
        let client: Arc<MemoryHttpClient> = Arc::new(MemoryHttpClient::new());
        client.insert_ok(format!("{}/.dirindex", BASE), "d:Terrain\n");
        let fs: TerraFs = fs_with(client.clone(), false);

        let result: Result<HandleId, VfsError> = fs.open("/Terrain", AccessMode::ReadOnly).await;
        assert!(matches!(result, Err(VfsError::IsADirectory(_))));
        assert_eq!(client.request_count(&format!("{}/Terrain", BASE)), 0);
    }

    #[tokio::test]
    async fn test_write_intent_denied_without_network() {
        let client: Arc<MemoryHttpClient> = Arc::new(MemoryHttpClient::new());
        let fs: TerraFs = fs_with(client.clone(), false);

        let write = fs.open("/a.txt", AccessMode::WriteOnly).await;
        let rdwr = fs.open("/a.txt", AccessMode::ReadWrite).await;
        let read = fs.read("/a.txt", 1, 10, 0, AccessMode::ReadWrite).await;

        assert!(matches!(write, Err(VfsError::PermissionDenied(_))));
        assert!(matches!(rdwr, Err(VfsError::PermissionDenied(_))));
        assert!(matches!(read, Err(VfsError::PermissionDenied(_))));
        assert_eq!(client.total_requests(), 0);
    }

    #[tokio::test]
    async fn test_release_twice_reports_unknown_handle() {
        let client: Arc<MemoryHttpClient> = Arc::new(MemoryHttpClient::new());
        client.insert_ok(format!("{}/.dirindex", BASE), "f:a.txt:x:2\n");
        client.insert_ok(format!("{}/a.txt", BASE), "hi");
        let fs: TerraFs = fs_with(client, false);

        let fh: HandleId = fs.open("/a.txt", AccessMode::ReadOnly).await.unwrap();
        assert_eq!(fs.open_files().len(), 1);
        fs.release("/a.txt", fh).unwrap();
        assert!(matches!(
            fs.release("/a.txt", fh),
            Err(VfsError::UnknownHandle(id)) if id == fh
        ));
        assert!(fs.open_files().is_empty());
    }
}
