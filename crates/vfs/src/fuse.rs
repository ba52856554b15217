//! FUSE filesystem implementation.
//!
//! ```text
//! kernel (ino, name) ──► TerraVfs ──► INodeManager (ino ↔ path)
//!                           │
//!                           └── runtime.block_on ──► TerraFs (path based)
//! ```

#[cfg(feature = "fuse")]
mod impl_fuse {
    use std::ffi::OsStr;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::{Duration, Instant, SystemTime};

    use fuser::{
        FileAttr, FileType, Filesystem, MountOption, ReplyAttr, ReplyData, ReplyDirectory,
        ReplyEmpty, ReplyEntry, ReplyOpen, Request,
    };
    use tokio::runtime::Handle;

    use crate::content::ListingCacheStats;
    use crate::handles::OpenFileInfo;
    use crate::inode::{INodeId, INodeManager};
    use crate::ops::{AccessMode, DirEntry, FileAttributes, NodeKind, TerraFs};
    use crate::VfsError;

    /// Statistics snapshot from the VFS.
    #[derive(Debug, Clone)]
    pub struct VfsStats {
        /// Number of inodes handed to the kernel.
        pub inode_count: usize,
        /// Number of currently open file handles.
        pub open_files: usize,
        /// List of currently open files with details.
        pub open_file_list: Vec<OpenFileInfo>,
        /// Listing cache statistics.
        pub listing_stats: ListingCacheStats,
        /// Time since VFS was created.
        pub uptime_secs: u64,
    }

    /// Shared state for stats collection.
    pub struct VfsStatsCollector {
        fs: Arc<TerraFs>,
        inodes: Arc<INodeManager>,
        start_time: Instant,
    }

    impl VfsStatsCollector {
        /// Collect current VFS statistics.
        pub fn collect(&self) -> VfsStats {
            let open_file_list: Vec<OpenFileInfo> = self.fs.open_files();

            VfsStats {
                inode_count: self.inodes.inode_count(),
                open_files: open_file_list.len(),
                open_file_list,
                listing_stats: self.fs.listing_stats(),
                uptime_secs: self.start_time.elapsed().as_secs(),
            }
        }
    }

    /// Read-only FUSE filesystem over a remote scenery tree.
    pub struct TerraVfs {
        /// Path-based operations.
        fs: Arc<TerraFs>,
        /// Inode numbering.
        inodes: Arc<INodeManager>,
        /// Tokio runtime handle.
        runtime: Handle,
        /// Owner reported for every node.
        uid: u32,
        /// Group reported for every node.
        gid: u32,
        /// Timestamp reported for every node.
        mount_time: SystemTime,
        /// VFS creation time.
        start_time: Instant,
    }

    impl TerraVfs {
        /// Create a new FUSE adapter.
        ///
        /// Must be called from within a tokio runtime.
        ///
        /// # Arguments
        /// * `fs` - Filesystem operations to serve
        pub fn new(fs: Arc<TerraFs>) -> Result<Self, VfsError> {
            let runtime = Handle::try_current()
                .map_err(|e| VfsError::MountFailed(format!("No tokio runtime: {}", e)))?;

            Ok(Self {
                fs,
                inodes: Arc::new(INodeManager::new()),
                runtime,
                uid: unsafe { libc::getuid() },
                gid: unsafe { libc::getgid() },
                mount_time: SystemTime::now(),
                start_time: Instant::now(),
            })
        }

        /// Get a stats collector that can be used from another thread.
        pub fn stats_collector(&self) -> VfsStatsCollector {
            VfsStatsCollector {
                fs: self.fs.clone(),
                inodes: self.inodes.clone(),
                start_time: self.start_time,
            }
        }

        /// Get current VFS statistics.
        pub fn stats(&self) -> VfsStats {
            self.stats_collector().collect()
        }

        /// Convert attributes to FUSE file attributes.
        fn to_file_attr(&self, ino: INodeId, attr: &FileAttributes) -> FileAttr {
            FileAttr {
                ino,
                size: attr.size,
                blocks: attr.size.div_ceil(512),
                atime: self.mount_time,
                mtime: self.mount_time,
                ctime: self.mount_time,
                crtime: self.mount_time,
                kind: file_type(attr.kind),
                perm: attr.perm,
                nlink: attr.nlink,
                uid: self.uid,
                gid: self.gid,
                rdev: 0,
                blksize: 512,
                flags: 0,
            }
        }

        /// Get TTL for FUSE attributes.
        fn attr_ttl(&self) -> Duration {
            self.fs.options().kernel_cache.attr_ttl()
        }

        /// Get TTL for FUSE entries.
        fn entry_ttl(&self) -> Duration {
            self.fs.options().kernel_cache.entry_ttl()
        }
    }

    fn file_type(kind: NodeKind) -> FileType {
        match kind {
            NodeKind::File => FileType::RegularFile,
            NodeKind::Directory => FileType::Directory,
        }
    }

    impl Filesystem for TerraVfs {
        fn lookup(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
            let name_str: &str = match name.to_str() {
                Some(n) => n,
                None => {
                    reply.error(libc::ENOENT);
                    return;
                }
            };

            let path: String = match self.inodes.child_path(parent, name_str) {
                Some(p) => p,
                None => {
                    reply.error(libc::ENOENT);
                    return;
                }
            };

            let fs: Arc<TerraFs> = self.fs.clone();
            match self.runtime.block_on(fs.get_attributes(&path)) {
                Ok(attr) => {
                    let ino: INodeId = self.inodes.get_or_insert(&path);
                    reply.entry(&self.entry_ttl(), &self.to_file_attr(ino, &attr), 0);
                }
                Err(e) => reply.error(e.errno()),
            }
        }

        fn getattr(&mut self, _req: &Request, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
            let path: String = match self.inodes.path(ino) {
                Some(p) => p,
                None => {
                    reply.error(libc::ENOENT);
                    return;
                }
            };

            let fs: Arc<TerraFs> = self.fs.clone();
            match self.runtime.block_on(fs.get_attributes(&path)) {
                Ok(attr) => reply.attr(&self.attr_ttl(), &self.to_file_attr(ino, &attr)),
                Err(e) => reply.error(e.errno()),
            }
        }

        fn readdir(
            &mut self,
            _req: &Request,
            ino: u64,
            _fh: u64,
            offset: i64,
            mut reply: ReplyDirectory,
        ) {
            let path: String = match self.inodes.path(ino) {
                Some(p) => p,
                None => {
                    reply.error(libc::ENOENT);
                    return;
                }
            };

            let fs: Arc<TerraFs> = self.fs.clone();
            let children: Vec<DirEntry> = match self.runtime.block_on(fs.list_directory(&path)) {
                Ok(c) => c,
                Err(e) => {
                    reply.error(e.errno());
                    return;
                }
            };

            let mut entries: Vec<(u64, FileType, String)> = vec![
                (ino, FileType::Directory, ".".to_string()),
                (self.inodes.parent_of(&path), FileType::Directory, "..".to_string()),
            ];
            for child in children {
                let child_path: String = match self.inodes.child_path(ino, &child.name) {
                    Some(p) => p,
                    None => continue,
                };
                let cid: INodeId = self.inodes.get_or_insert(&child_path);
                entries.push((cid, file_type(child.attr.kind), child.name));
            }

            for (i, (e_ino, kind, name)) in entries.iter().enumerate().skip(offset.max(0) as usize) {
                if reply.add(*e_ino, (i + 1) as i64, *kind, name) {
                    break;
                }
            }
            reply.ok();
        }

        fn open(&mut self, _req: &Request, ino: u64, flags: i32, reply: ReplyOpen) {
            let path: String = match self.inodes.path(ino) {
                Some(p) => p,
                None => {
                    reply.error(libc::ENOENT);
                    return;
                }
            };

            let fs: Arc<TerraFs> = self.fs.clone();
            match self.runtime.block_on(fs.open(&path, AccessMode::from_flags(flags))) {
                Ok(fh) => reply.opened(fh, 0),
                Err(e) => reply.error(e.errno()),
            }
        }

        fn read(
            &mut self,
            _req: &Request,
            ino: u64,
            fh: u64,
            offset: i64,
            size: u32,
            flags: i32,
            _lock: Option<u64>,
            reply: ReplyData,
        ) {
            let path: String = match self.inodes.path(ino) {
                Some(p) => p,
                None => {
                    reply.error(libc::ENOENT);
                    return;
                }
            };

            let fs: Arc<TerraFs> = self.fs.clone();
            let mode: AccessMode = AccessMode::from_flags(flags);
            let offset: u64 = offset.max(0) as u64;
            match self
                .runtime
                .block_on(fs.read(&path, fh, size as usize, offset, mode))
            {
                Ok(data) => reply.data(&data),
                Err(e) => reply.error(e.errno()),
            }
        }

        fn release(
            &mut self,
            _req: &Request,
            ino: u64,
            fh: u64,
            _flags: i32,
            _lock: Option<u64>,
            _flush: bool,
            reply: ReplyEmpty,
        ) {
            let path: String = self.inodes.path(ino).unwrap_or_default();
            match self.fs.release(&path, fh) {
                Ok(()) => reply.ok(),
                Err(e) => reply.error(e.errno()),
            }
        }
    }

    /// Mount options for a read-only scenery mount.
    fn mount_options(allow_other: bool) -> Vec<MountOption> {
        let mut options: Vec<MountOption> = vec![
            MountOption::RO,
            MountOption::FSName("terrafs".into()),
            MountOption::AutoUnmount,
        ];
        if allow_other {
            options.push(MountOption::AllowOther);
        }
        options
    }

    /// Mount a read-only VFS, blocking until it is unmounted.
    ///
    /// # Arguments
    /// * `vfs` - The VFS to mount
    /// * `mountpoint` - Path to mount at
    /// * `allow_other` - Let other users access the mount
    pub fn mount(vfs: TerraVfs, mountpoint: &Path, allow_other: bool) -> Result<(), VfsError> {
        fuser::mount2(vfs, mountpoint, &mount_options(allow_other))
            .map_err(|e| VfsError::MountFailed(e.to_string()))
    }

    /// Spawn a read-only VFS mount in the background.
    ///
    /// # Arguments
    /// * `vfs` - The VFS to mount
    /// * `mountpoint` - Path to mount at
    /// * `allow_other` - Let other users access the mount
    ///
    /// # Returns
    /// Background session handle; dropping it unmounts.
    pub fn spawn_mount(
        vfs: TerraVfs,
        mountpoint: &Path,
        allow_other: bool,
    ) -> Result<fuser::BackgroundSession, VfsError> {
        fuser::spawn_mount2(vfs, mountpoint, &mount_options(allow_other))
            .map_err(|e| VfsError::MountFailed(e.to_string()))
    }

}

#[cfg(feature = "fuse")]
pub use impl_fuse::{mount, spawn_mount, TerraVfs, VfsStats, VfsStatsCollector};
