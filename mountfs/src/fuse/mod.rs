//! FUSE adapter and request handling
//!
//! Main components:
//! - `adapter`: [`FilesystemHandle`] and [`RootNode`], the root resolution
//!   boundary between the VFS and the kernel.
//! - `statfs`: the synthetic capacity report.
//! - `mount`: starting an rfuse3 session for a handle.
//! - Implementation of rfuse3's `Filesystem` trait for `FilesystemHandle`:
//!   `getattr` on the root inode and `statfs`. Every other operation belongs
//!   to sibling components and keeps rfuse3's ENOSYS default.
pub mod adapter;
pub mod mount;
pub mod statfs;

use std::num::NonZeroU32;

use futures_util::stream::Empty;
use rfuse3::Result as FuseResult;
use rfuse3::raw::Filesystem;
use rfuse3::raw::Request;
use rfuse3::raw::reply::{DirectoryEntry, DirectoryEntryPlus, ReplyAttr, ReplyInit, ReplyStatFs};
use tracing::{info, warn};

pub use adapter::{ATTR_TTL, FilesystemHandle, FsRoot, Node, ROOT_INODE, RootNode};
pub use statfs::{CapacityReport, report_capacity};

use crate::error::Status;
use crate::vfs::{Remote, Vfs};

const MAX_WRITE: NonZeroU32 = match NonZeroU32::new(1024 * 1024) {
    Some(n) => n,
    None => NonZeroU32::MIN,
};

/// Hand a status to the kernel, logging errors that had no sentinel meaning.
fn surface(op: &'static str, status: Status) -> rfuse3::Errno {
    if let Status::Untranslated(err) = &status {
        warn!(op, error = %err, "untranslated vfs error");
    }
    status.into_errno()
}

impl<V: Vfs> Filesystem for FilesystemHandle<V> {
    type DirEntryStream<'a>
        = Empty<FuseResult<DirectoryEntry>>
    where
        Self: 'a;

    type DirEntryPlusStream<'a>
        = Empty<FuseResult<DirectoryEntryPlus>>
    where
        Self: 'a;

    async fn init(&self, _req: Request) -> FuseResult<ReplyInit> {
        info!(source = %self.remote().source(), "fuse session initialized");
        Ok(ReplyInit {
            max_write: MAX_WRITE,
        })
    }

    async fn destroy(&self, _req: Request) {
        info!(source = %self.remote().source(), "fuse session destroyed");
    }

    // This layer only ever hands out the root inode.
    async fn getattr(
        &self,
        req: Request,
        ino: u64,
        _fh: Option<u64>,
        _flags: u32,
    ) -> FuseResult<ReplyAttr> {
        if ino != ROOT_INODE {
            return Err(libc::ENOENT.into());
        }
        let root = self
            .resolve_root()
            .await
            .map_err(|status| surface("getattr", status))?;
        Ok(ReplyAttr {
            ttl: ATTR_TTL,
            attr: root.attr(&req),
        })
    }

    async fn statfs(&self, _req: Request, _ino: u64) -> FuseResult<ReplyStatFs> {
        Ok(self.report_capacity().into())
    }
}
