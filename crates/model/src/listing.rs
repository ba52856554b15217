//! Listing and entry types.

/// Kind of a listing entry, fixed when the listing is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file with its declared size in bytes.
    File { size: u64 },
    /// Subdirectory.
    Directory,
}

impl EntryKind {
    /// Get the record tag used in `.dirindex` text.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File { .. } => "f",
            EntryKind::Directory => "d",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One named item inside a listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    /// Entry name (never empty).
    pub name: String,
    /// File or directory.
    pub kind: EntryKind,
}

impl Entry {
    /// Create a file entry.
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File { size },
        }
    }

    /// Create a directory entry.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
        }
    }

    /// Check if this entry is a directory.
    pub fn is_directory(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }

    /// Declared size in bytes (0 for directories).
    pub fn size(&self) -> u64 {
        match self.kind {
            EntryKind::File { size } => size,
            EntryKind::Directory => 0,
        }
    }
}

/// Parsed content of one remote `.dirindex` resource.
///
/// Entries keep the order they had in the source text. Lookup is by name and
/// the first entry with a matching name wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Format version from the `version:` record, if present.
    pub version: Option<u32>,
    /// Path declared by the `path:` record. Informational only.
    pub declared_path: Option<String>,
    /// Entries in source order.
    pub entries: Vec<Entry>,
}

impl Listing {
    /// Find the first entry with the given name.
    ///
    /// # Arguments
    /// * `name` - Entry name to look up
    ///
    /// # Returns
    /// The first matching entry, or None.
    pub fn find(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Iterate over entries in source order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the listing has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of file entries.
    pub fn file_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_directory()).count()
    }

    /// Number of directory entries.
    pub fn directory_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_directory()).count()
    }

    /// Sum of the declared sizes of all file entries.
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(Entry::size).sum()
    }
}

impl<'a> IntoIterator for &'a Listing {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
