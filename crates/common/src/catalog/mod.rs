//! The catalog: a synthetic root directory whose direct children are one
//! entry per object key.
//!
//! Keys are used verbatim as entry names. A key such as `logs/2023/01.log`
//! is a single entry, not three nested nodes. The catalog is built once from
//! a listing and never changes afterwards, so it can be shared across threads
//! and read without synchronization.

mod builder;

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::listing::ListedObject;
use crate::node::HasChildren;

pub use builder::{CatalogBuilder, CatalogError, ListingPolicy};

/// One object in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    name: String,
    size: u64,
    last_modified: DateTime<Utc>,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, size: u64, last_modified: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            size,
            last_modified,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }
}

impl From<ListedObject> for CatalogEntry {
    fn from(object: ListedObject) -> Self {
        Self::new(object.key, object.size, object.last_modified)
    }
}

/// Frozen, insertion-ordered mapping from entry name to entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    positions: HashMap<String, usize>,
}

impl Catalog {
    /// A catalog with no entries, as exposed when a bucket is empty or
    /// could not be listed.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog from listed objects, in listing order.
    ///
    /// Repeated keys keep the position of their first appearance but take the
    /// value of the last one.
    pub fn from_objects(objects: impl IntoIterator<Item = ListedObject>) -> Self {
        let mut catalog = Self::empty();
        for object in objects {
            catalog.insert(CatalogEntry::from(object));
        }
        catalog
    }

    fn insert(&mut self, entry: CatalogEntry) {
        match self.positions.get(entry.name()) {
            Some(&pos) => {
                tracing::warn!(
                    key = entry.name(),
                    previous_size = self.entries[pos].size(),
                    size = entry.size(),
                    "listing repeated a key, keeping the later object"
                );
                self.entries[pos] = entry;
            }
            None => {
                self.positions
                    .insert(entry.name().to_string(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.position(name).map(|pos| &self.entries[pos])
    }

    /// Insertion position of `name`, stable for the life of the catalog.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Entry at insertion position `pos`.
    pub fn entry_at(&self, pos: usize) -> Option<&CatalogEntry> {
        self.entries.get(pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }
}

impl HasChildren for Catalog {
    type Child = CatalogEntry;

    fn child(&self, name: &str) -> Option<&CatalogEntry> {
        self.get(name)
    }

    fn children(&self) -> Box<dyn Iterator<Item = (&str, &CatalogEntry)> + '_> {
        Box::new(self.entries.iter().map(|entry| (entry.name(), entry)))
    }

    fn child_count(&self) -> usize {
        self.len()
    }
}
