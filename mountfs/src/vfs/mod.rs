//! VFS collaborator interface
//!
//! The adapter never owns filesystem semantics. It talks to a [`Vfs`] through
//! the narrow surface below:
//! - `root()`: obtain the root directory object.
//! - `remote()`: the backing store the VFS fronts, held for identity only.
//!
//! All VFS operations fail with [`VfsError`](crate::error::VfsError), whose
//! sentinels are translated by [`crate::error::translate`].
//!
//! Submodules:
//! - `local`: a VFS fronting a directory on the host.
pub mod local;

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;

use crate::error::VfsError;

/// Attributes of a directory as reported by the VFS.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirAttr {
    pub size: u64,
    /// Permission bits only (no file type bits).
    pub perm: u16,
    pub mtime: SystemTime,
}

impl Default for DirAttr {
    fn default() -> Self {
        Self {
            size: 0,
            perm: 0o755,
            mtime: SystemTime::UNIX_EPOCH,
        }
    }
}

/// A directory object handed out by the VFS.
pub trait Directory: Send + Sync {
    /// Path relative to the VFS root; empty for the root itself.
    fn path(&self) -> &Path;
    fn attr(&self) -> DirAttr;
}

/// The storage or remote a VFS fronts.
pub trait Remote: Send + Sync {
    /// Backend kind, e.g. `local`.
    fn name(&self) -> &str;
    /// Location inside the backend the VFS is rooted at.
    fn root(&self) -> &str;

    /// `name:root`, the conventional source string of a mount.
    fn source(&self) -> String {
        format!("{}:{}", self.name(), self.root())
    }
}

/// Virtual filesystem consumed by the FUSE adapter.
///
/// Implementations own caching, directory contents and handle tracking, and
/// must be safe to call concurrently.
#[async_trait]
pub trait Vfs: Send + Sync + 'static {
    type Dir: Directory + Clone + PartialEq + fmt::Debug + 'static;
    type Remote: Remote + 'static;

    /// Look up the root directory. Called on every root resolution; caching,
    /// if any, is up to the implementation.
    async fn root(&self) -> Result<Self::Dir, VfsError>;

    fn remote(&self) -> Arc<Self::Remote>;
}
