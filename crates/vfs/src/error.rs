//! Error types for the VFS crate.

use std::fmt;

use terrafs_model::ListingError;
use terrafs_storage::TransportError;

/// Errors that can occur during VFS operations.
#[derive(Debug)]
pub enum VfsError {
    /// Path does not resolve to an entry, or its content could not be fetched.
    NotFound(String),

    /// Open or read requested with write intent.
    PermissionDenied(String),

    /// Open requested on a directory entry.
    IsADirectory(String),

    /// No open file with this handle.
    UnknownHandle(u64),

    /// Malformed listing content.
    DataFormat(ListingError),

    /// No HTTP response could be obtained.
    Transport(TransportError),

    /// Mount operation failed.
    MountFailed(String),

    /// IO error.
    Io(std::io::Error),
}

impl VfsError {
    /// Map to the errno value reported to the kernel.
    pub fn errno(&self) -> i32 {
        match self {
            VfsError::NotFound(_) => libc::ENOENT,
            VfsError::PermissionDenied(_) => libc::EACCES,
            VfsError::IsADirectory(_) => libc::EISDIR,
            VfsError::UnknownHandle(_) => libc::EBADF,
            VfsError::DataFormat(_)
            | VfsError::Transport(_)
            | VfsError::MountFailed(_)
            | VfsError::Io(_) => libc::EIO,
        }
    }

    /// Check if this is a not-found outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, VfsError::NotFound(_))
    }
}

impl fmt::Display for VfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VfsError::NotFound(path) => write!(f, "No such file or directory: {}", path),
            VfsError::PermissionDenied(path) => write!(f, "Permission denied: {}", path),
            VfsError::IsADirectory(path) => write!(f, "Is a directory: {}", path),
            VfsError::UnknownHandle(fh) => write!(f, "Unknown file handle: {}", fh),
            VfsError::DataFormat(e) => write!(f, "Malformed listing: {}", e),
            VfsError::Transport(e) => write!(f, "Transport error: {}", e),
            VfsError::MountFailed(msg) => write!(f, "Mount failed: {}", msg),
            VfsError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for VfsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VfsError::DataFormat(e) => Some(e),
            VfsError::Transport(e) => Some(e),
            VfsError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for VfsError {
    fn from(e: std::io::Error) -> Self {
        VfsError::Io(e)
    }
}

impl From<ListingError> for VfsError {
    fn from(e: ListingError) -> Self {
        VfsError::DataFormat(e)
    }
}

impl From<TransportError> for VfsError {
    fn from(e: TransportError) -> Self {
        VfsError::Transport(e)
    }
}
