//! Open-file table.
//!
//! Each successful open stores the file's full content under a fresh handle
//! ID. Reads are served from that buffer; release drops it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// Identifier of an open file handle.
pub type HandleId = u64;

/// Information about an open file handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenFileInfo {
    /// File handle ID.
    pub handle_id: HandleId,
    /// Virtual path the file was opened at.
    pub path: String,
    /// Buffered size in bytes.
    pub size: u64,
}

/// One open file with its buffered content.
struct OpenHandle {
    path: String,
    content: Vec<u8>,
}

/// Table of open files keyed by handle ID.
///
/// Handle IDs start at 1 and are never reused.
pub struct OpenFileTable {
    /// Open handles.
    handles: RwLock<HashMap<HandleId, OpenHandle>>,
    /// Next handle ID.
    next_handle: AtomicU64,
}

impl Default for OpenFileTable {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenFileTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            handles: RwLock::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Register an open file.
    ///
    /// # Arguments
    /// * `path` - Virtual path of the file
    /// * `content` - Full file content, now owned by the handle
    ///
    /// # Returns
    /// The new handle ID.
    pub fn insert(&self, path: impl Into<String>, content: Vec<u8>) -> HandleId {
        let fh: HandleId = self.next_handle.fetch_add(1, Ordering::SeqCst);
        self.handles.write().insert(
            fh,
            OpenHandle {
                path: path.into(),
                content,
            },
        );
        fh
    }

    /// Read from an open file's buffer.
    ///
    /// # Arguments
    /// * `fh` - Handle ID
    /// * `offset` - Start offset in bytes
    /// * `size` - Maximum number of bytes to return
    ///
    /// # Returns
    /// Up to `size` bytes from `offset`, empty at or past the end, or None if
    /// the handle is unknown.
    pub fn read(&self, fh: HandleId, offset: u64, size: usize) -> Option<Vec<u8>> {
        let handles = self.handles.read();
        let content: &[u8] = &handles.get(&fh)?.content;

        let len: u64 = content.len() as u64;
        if offset >= len {
            return Some(Vec::new());
        }
        let start: usize = offset as usize;
        let end: usize = start + size.min(content.len() - start);
        Some(content[start..end].to_vec())
    }

    /// Remove an open file, freeing its buffer.
    ///
    /// # Arguments
    /// * `fh` - Handle ID
    ///
    /// # Returns
    /// True if the handle was open.
    pub fn remove(&self, fh: HandleId) -> bool {
        self.handles.write().remove(&fh).is_some()
    }

    /// Check whether a handle is open.
    pub fn contains(&self, fh: HandleId) -> bool {
        self.handles.read().contains_key(&fh)
    }

    /// Number of open handles.
    pub fn len(&self) -> usize {
        self.handles.read().len()
    }

    /// Check if no handles are open.
    pub fn is_empty(&self) -> bool {
        self.handles.read().is_empty()
    }

    /// Describe all open handles.
    pub fn list(&self) -> Vec<OpenFileInfo> {
        let handles = self.handles.read();
        let mut infos: Vec<OpenFileInfo> = handles
            .iter()
            .map(|(&handle_id, h)| OpenFileInfo {
                handle_id,
                path: h.path.clone(),
                size: h.content.len() as u64,
            })
            .collect();
        infos.sort_by_key(|i| i.handle_id);
        infos
    }
}
