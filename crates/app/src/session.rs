//! Mount session coordinator.
//!
//! Owns the catalog for the life of a mount. The session starts out
//! unmounted; the bridge's attach notification builds the catalog exactly
//! once and moves it to mounted, where it stays until the process exits.
//! Every query after that is a read of the frozen catalog.

use common::prelude::{
    AttributeView, BucketRef, Catalog, CatalogBuilder, CatalogError, HasAttributes, HasChildren,
};
use tokio::runtime::Handle;

use crate::inode_table::{InodeTable, ROOT_INO};

/// Permission bits for the root directory: `dr-xr-xr-x`
pub const ROOT_MODE: u16 = 0o555;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The bridge asked about an inode this session never handed out
    #[error("unknown inode {0}")]
    UnknownInode(u64),
    #[error("inode {0} is not a directory")]
    NotADirectory(u64),
    #[error("failed to build catalog: {0}")]
    Catalog(#[from] CatalogError),
}

/// Lifecycle of a mount session; one one-way edge
#[derive(Debug)]
enum State {
    Unmounted,
    Mounted(Catalog),
}

/// What a node is, for the bridge's benefit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File,
}

/// Attributes of a node in the mounted tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeAttr {
    Root { mode: u16, nlink: u32 },
    Entry(AttributeView),
}

impl NodeAttr {
    fn root() -> Self {
        Self::Root {
            mode: ROOT_MODE,
            nlink: 2,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Root { .. } => NodeKind::Directory,
            Self::Entry(_) => NodeKind::File,
        }
    }
}

/// One row of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub ino: u64,
    pub kind: NodeKind,
    pub name: String,
}

pub struct MountSession {
    rt: Handle,
    bucket: BucketRef,
    builder: CatalogBuilder,
    state: State,
}

impl std::fmt::Debug for MountSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountSession")
            .field("bucket", &self.bucket)
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

impl MountSession {
    pub fn new(rt: Handle, bucket: BucketRef, builder: CatalogBuilder) -> Self {
        Self {
            rt,
            bucket,
            builder,
            state: State::Unmounted,
        }
    }

    pub fn bucket(&self) -> &BucketRef {
        &self.bucket
    }

    pub fn is_mounted(&self) -> bool {
        matches!(self.state, State::Mounted(_))
    }

    /// Handle the bridge's attach notification.
    ///
    /// Blocks on the one-time catalog build. Attaching an already mounted
    /// session does nothing: the catalog is never rebuilt.
    pub fn attach(&mut self) -> Result<(), SessionError> {
        let rt = self.rt.clone();
        rt.block_on(self.attach_async())
    }

    /// Build the catalog from async code, ahead of the bridge's attach.
    pub async fn attach_async(&mut self) -> Result<(), SessionError> {
        if self.is_mounted() {
            tracing::warn!("session for bucket {} is already mounted", self.bucket);
            return Ok(());
        }

        let catalog = self.builder.build(&self.bucket).await?;

        tracing::info!(
            "mounted bucket {} with {} entries",
            self.bucket,
            catalog.len()
        );
        self.state = State::Mounted(catalog);
        Ok(())
    }

    /// The catalog, if the session has been attached
    pub fn catalog(&self) -> Option<&Catalog> {
        match &self.state {
            State::Mounted(catalog) => Some(catalog),
            State::Unmounted => None,
        }
    }

    /// Look up `name` under `parent`.
    ///
    /// `Ok(None)` is an ordinary miss. Before attach the tree is empty.
    pub fn lookup(&self, parent: u64, name: &str) -> Result<Option<(u64, NodeAttr)>, SessionError> {
        if parent != ROOT_INO {
            self.entry_attr(parent)?;
            return Err(SessionError::NotADirectory(parent));
        }

        let Some(catalog) = self.catalog() else {
            return Ok(None);
        };

        let inodes = InodeTable::new(catalog);
        Ok(inodes.get_inode(name).and_then(|ino| {
            catalog
                .child(name)
                .map(|entry| (ino, NodeAttr::Entry(entry.attributes())))
        }))
    }

    /// Attributes for `ino`
    pub fn getattr(&self, ino: u64) -> Result<NodeAttr, SessionError> {
        if ino == ROOT_INO {
            return Ok(NodeAttr::root());
        }
        self.entry_attr(ino).map(NodeAttr::Entry)
    }

    fn entry_attr(&self, ino: u64) -> Result<AttributeView, SessionError> {
        self.catalog()
            .and_then(|catalog| InodeTable::new(catalog).get_entry(ino))
            .map(|entry| entry.attributes())
            .ok_or(SessionError::UnknownInode(ino))
    }

    /// Directory listing for `ino`, including `.` and `..`
    pub fn readdir(&self, ino: u64) -> Result<Vec<DirEntry>, SessionError> {
        if ino != ROOT_INO {
            self.entry_attr(ino)?;
            return Err(SessionError::NotADirectory(ino));
        }

        let mut entries = vec![
            DirEntry {
                ino: ROOT_INO,
                kind: NodeKind::Directory,
                name: ".".to_string(),
            },
            DirEntry {
                ino: ROOT_INO,
                kind: NodeKind::Directory,
                name: "..".to_string(),
            },
        ];

        if let Some(catalog) = self.catalog() {
            entries.extend(InodeTable::new(catalog).iter().map(|(ino, entry)| DirEntry {
                ino,
                kind: NodeKind::File,
                name: entry.name().to_string(),
            }));
        }

        Ok(entries)
    }
}
