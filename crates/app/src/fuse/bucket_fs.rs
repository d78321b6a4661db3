//! FUSE filesystem implementation for s3fs
//!
//! Implements the fuser::Filesystem trait on top of a [`MountSession`].

use std::ffi::OsStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use fuser::{
    FileAttr, FileType, Filesystem, KernelConfig, ReplyAttr, ReplyDirectory, ReplyEntry,
    ReplyOpen, Request,
};

use crate::session::{DirEntry, MountSession, NodeAttr, NodeKind, SessionError};

/// FUSE filesystem serving a bucket catalog
pub struct BucketFs {
    session: MountSession,
    /// TTL handed to the kernel for entries and attributes
    ttl: Duration,
    uid: u32,
    gid: u32,
}

impl BucketFs {
    pub fn new(session: MountSession, ttl: Duration) -> Self {
        Self {
            session,
            ttl,
            uid: unsafe { libc::getuid() },
            gid: unsafe { libc::getgid() },
        }
    }

    pub fn session(&self) -> &MountSession {
        &self.session
    }

    /// Build a FileAttr for a node of the mounted tree
    fn make_attr(&self, ino: u64, attr: &NodeAttr) -> FileAttr {
        let (kind, perm, nlink, size, mtime, atime, ctime) = match attr {
            NodeAttr::Root { mode, nlink } => (FileType::Directory, *mode, *nlink, 0, 0, 0, 0),
            NodeAttr::Entry(view) => (
                FileType::RegularFile,
                view.mode,
                view.nlink,
                view.size,
                view.mtime,
                view.atime,
                view.ctime,
            ),
        };

        FileAttr {
            ino,
            size,
            blocks: 0,
            atime: epoch_time(atime),
            mtime: epoch_time(mtime),
            ctime: epoch_time(ctime),
            crtime: UNIX_EPOCH,
            kind,
            perm,
            nlink,
            uid: self.uid,
            gid: self.gid,
            rdev: 0,
            blksize: 0,
            flags: 0,
        }
    }

    /// Map a session failure onto an errno, logging contract violations
    fn errno(op: &str, err: &SessionError) -> libc::c_int {
        match err {
            SessionError::UnknownInode(ino) => {
                tracing::error!("{} for inode {} the catalog never issued", op, ino);
                libc::ENOENT
            }
            SessionError::NotADirectory(_) => libc::ENOTDIR,
            SessionError::Catalog(e) => {
                tracing::error!("{} failed: {}", op, e);
                libc::EIO
            }
        }
    }
}

/// Seconds since the epoch as a SystemTime; objects may predate 1970
fn epoch_time(secs: i64) -> SystemTime {
    if secs >= 0 {
        UNIX_EPOCH + Duration::from_secs(secs as u64)
    } else {
        UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs())
    }
}

/// Entries still to send after the kernel's `offset` cookie, each paired
/// with the cookie that resumes after it
fn resume_from(entries: &[DirEntry], offset: i64) -> impl Iterator<Item = (i64, &DirEntry)> {
    let skip = usize::try_from(offset).unwrap_or(0);
    entries
        .iter()
        .enumerate()
        .skip(skip)
        .map(|(i, entry)| ((i + 1) as i64, entry))
}

fn file_type(kind: NodeKind) -> FileType {
    match kind {
        NodeKind::Directory => FileType::Directory,
        NodeKind::File => FileType::RegularFile,
    }
}

impl Filesystem for BucketFs {
    /// Attach: build the catalog before the kernel sends any request,
    /// unless the caller already built it
    fn init(&mut self, _req: &Request<'_>, _config: &mut KernelConfig) -> Result<(), libc::c_int> {
        if self.session.is_mounted() {
            return Ok(());
        }
        match self.session.attach() {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!("failed to attach bucket {}: {}", self.session.bucket(), e);
                Err(libc::EIO)
            }
        }
    }

    fn destroy(&mut self) {
        tracing::info!("unmounted bucket {}", self.session.bucket());
    }

    /// Look up a directory entry by name
    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let name_str = match name.to_str() {
            Some(s) => s,
            None => return reply.error(libc::ENOENT),
        };

        match self.session.lookup(parent, name_str) {
            Ok(Some((ino, attr))) => reply.entry(&self.ttl, &self.make_attr(ino, &attr), 0),
            Ok(None) => reply.error(libc::ENOENT),
            Err(e) => reply.error(Self::errno("lookup", &e)),
        }
    }

    /// Get file attributes
    fn getattr(&mut self, _req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        match self.session.getattr(ino) {
            Ok(attr) => reply.attr(&self.ttl, &self.make_attr(ino, &attr)),
            Err(e) => reply.error(Self::errno("getattr", &e)),
        }
    }

    /// Read directory contents
    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let entries = match self.session.readdir(ino) {
            Ok(entries) => entries,
            Err(e) => return reply.error(Self::errno("readdir", &e)),
        };

        for (next, entry) in resume_from(&entries, offset) {
            if reply.add(entry.ino, next, file_type(entry.kind), &entry.name) {
                break;
            }
        }

        reply.ok()
    }

    /// Contents are not served; listing only
    fn open(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
        match self.session.getattr(ino) {
            Ok(_) => reply.error(libc::ENOTSUP),
            Err(e) => reply.error(Self::errno("open", &e)),
        }
    }
}
