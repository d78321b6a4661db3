//! Inode numbering for a frozen catalog.
//!
//! FUSE identifies nodes by inode number, the catalog by name. Because the
//! catalog never changes after it is built, numbering can be derived from
//! insertion position instead of being tracked in a mutable table: the root
//! is inode 1 and the entry at position `p` is inode `p + 2`.

use common::prelude::{Catalog, CatalogEntry};

/// Inode of the synthetic root directory
pub const ROOT_INO: u64 = 1;

/// Inode of the first catalog entry
const FIRST_ENTRY_INO: u64 = 2;

/// Read-only view mapping inodes to catalog entries
#[derive(Debug, Clone, Copy)]
pub struct InodeTable<'a> {
    catalog: &'a Catalog,
}

impl<'a> InodeTable<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Get the inode for an entry name
    pub fn get_inode(&self, name: &str) -> Option<u64> {
        self.catalog
            .position(name)
            .map(|pos| pos as u64 + FIRST_ENTRY_INO)
    }

    /// Get the entry behind an inode (never the root)
    pub fn get_entry(&self, ino: u64) -> Option<&'a CatalogEntry> {
        let pos = ino.checked_sub(FIRST_ENTRY_INO)?;
        let pos = usize::try_from(pos).ok()?;
        self.catalog.entry_at(pos)
    }

    /// All entries with their inodes, in catalog order
    pub fn iter(&self) -> impl Iterator<Item = (u64, &'a CatalogEntry)> + 'a {
        self.catalog
            .iter()
            .enumerate()
            .map(|(pos, entry)| (pos as u64 + FIRST_ENTRY_INO, entry))
    }
}
