//! INode manager mapping virtual paths to inode numbers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::types::{INodeId, ROOT_INODE};
use crate::ops::ROOT_PATH;
use crate::resolver::split_path;

/// Bidirectional path/inode index.
struct INodeIndex {
    /// Inode ID to path.
    paths: HashMap<INodeId, String>,
    /// Path to inode ID.
    ids: HashMap<String, INodeId>,
}

/// Allocates inode numbers for virtual paths.
///
/// Numbers are allocated on first sight and never reused, so a path keeps its
/// inode for the lifetime of the mount.
pub struct INodeManager {
    /// Next inode ID to allocate.
    next_id: AtomicU64,
    /// Path index.
    index: RwLock<INodeIndex>,
}

impl Default for INodeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl INodeManager {
    /// Create a manager holding only the root.
    pub fn new() -> Self {
        let mut index: INodeIndex = INodeIndex {
            paths: HashMap::new(),
            ids: HashMap::new(),
        };
        index.paths.insert(ROOT_INODE, ROOT_PATH.to_string());
        index.ids.insert(ROOT_PATH.to_string(), ROOT_INODE);

        Self {
            next_id: AtomicU64::new(ROOT_INODE + 1),
            index: RwLock::new(index),
        }
    }

    /// Get the inode for a path, allocating one if needed.
    ///
    /// # Arguments
    /// * `path` - Absolute virtual path
    ///
    /// # Returns
    /// The inode ID of the path.
    pub fn get_or_insert(&self, path: &str) -> INodeId {
        if let Some(&id) = self.index.read().ids.get(path) {
            return id;
        }

        let mut index = self.index.write();
        // Another thread may have inserted between the two locks
        if let Some(&id) = index.ids.get(path) {
            return id;
        }
        let id: INodeId = self.next_id.fetch_add(1, Ordering::SeqCst);
        index.paths.insert(id, path.to_string());
        index.ids.insert(path.to_string(), id);
        id
    }

    /// Get the path of an inode.
    ///
    /// # Arguments
    /// * `id` - Inode ID
    ///
    /// # Returns
    /// The virtual path if the inode is known.
    pub fn path(&self, id: INodeId) -> Option<String> {
        self.index.read().paths.get(&id).cloned()
    }

    /// Build the path of a named child of a directory inode.
    ///
    /// # Arguments
    /// * `parent` - Directory inode ID
    /// * `name` - Child name
    ///
    /// # Returns
    /// The child's virtual path, or None if the parent is unknown.
    pub fn child_path(&self, parent: INodeId, name: &str) -> Option<String> {
        let parent_path: String = self.path(parent)?;
        if parent_path == ROOT_PATH {
            Some(format!("/{}", name))
        } else {
            Some(format!("{}/{}", parent_path, name))
        }
    }

    /// Get the inode of a path's parent directory.
    ///
    /// The root is its own parent.
    pub fn parent_of(&self, path: &str) -> INodeId {
        match split_path(path) {
            Some((parent, _)) if !parent.is_empty() => self.get_or_insert(parent),
            _ => ROOT_INODE,
        }
    }

    /// Number of known inodes.
    pub fn inode_count(&self) -> usize {
        self.index.read().paths.len()
    }
}
