//! Attribute projection.
//!
//! Maps a catalog entry onto the metadata a filesystem needs to answer
//! `stat`. The projection is recomputed on every call and is never cached
//! apart from the entry it derives from.

use crate::catalog::CatalogEntry;
use crate::node::HasAttributes;

/// Permission bits for every entry: `-r--r--r--`
pub const FILE_MODE: u16 = 0o444;

/// Filesystem metadata for one catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeView {
    /// Permission bits (no file type bits)
    pub mode: u16,
    /// Hard-link count
    pub nlink: u32,
    /// Size in bytes
    pub size: u64,
    /// Modification time, whole seconds since the Unix epoch
    pub mtime: i64,
    /// Access time, not tracked
    pub atime: i64,
    /// Change time, not tracked
    pub ctime: i64,
}

/// Project `entry` onto its attribute view.
///
/// Pure: no I/O and the same entry always yields the same view.
pub fn attributes_of(entry: &CatalogEntry) -> AttributeView {
    AttributeView {
        mode: FILE_MODE,
        nlink: 1,
        size: entry.size(),
        mtime: entry.last_modified().timestamp(),
        atime: 0,
        ctime: 0,
    }
}

impl HasAttributes for CatalogEntry {
    fn attributes(&self) -> AttributeView {
        attributes_of(self)
    }
}
