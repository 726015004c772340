//! The filesystem object handed to the FUSE session and its root node.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rfuse3::raw::Request;
use rfuse3::raw::reply::FileAttr;
use rfuse3::{FileType, Inode, Timestamp};
use tracing::debug;

use super::statfs::{CapacityReport, report_capacity};
use crate::error::{Status, translate};
use crate::vfs::{Directory, Remote, Vfs};

/// Inode number the kernel uses for the mount root.
pub const ROOT_INODE: Inode = 1;

/// How long the kernel may cache attributes handed out here.
pub const ATTR_TTL: Duration = Duration::from_secs(1);

const ATTR_BLOCK_SIZE: u32 = 4096;

/// Something the kernel can address by inode.
pub trait Node: Send + Sync {
    fn inode(&self) -> Inode;
    fn attr(&self, req: &Request) -> FileAttr;
}

/// Capabilities a mounted filesystem root must answer.
#[async_trait]
pub trait FsRoot: Send + Sync {
    type Root: Node;

    /// Resolve the traversal starting point.
    async fn root(&self) -> Result<Self::Root, Status>;

    /// Aggregate capacity figures for `statfs`.
    fn capacity(&self) -> CapacityReport;
}

/// Top level filesystem presented to the kernel: one per mount.
///
/// Holds no mutable state; all concurrency discipline lives in the VFS.
pub struct FilesystemHandle<V: Vfs> {
    vfs: Arc<V>,
    // Kept alive for the lifetime of the mount, never mutated here.
    remote: Arc<V::Remote>,
}

impl<V: Vfs> FilesystemHandle<V> {
    pub fn new(vfs: Arc<V>) -> Self {
        let remote = vfs.remote();
        Self { vfs, remote }
    }

    pub fn vfs(&self) -> &Arc<V> {
        &self.vfs
    }

    pub fn remote(&self) -> &Arc<V::Remote> {
        &self.remote
    }

    /// Fetch the VFS root and wrap it for the kernel.
    ///
    /// Nothing is cached: every call asks the VFS again.
    pub async fn resolve_root(&self) -> Result<RootNode<V::Dir>, Status> {
        match translate(self.vfs.root().await) {
            Ok(dir) => {
                debug!(source = %self.remote.source(), ?dir, "root resolved");
                Ok(RootNode::new(dir))
            }
            Err(status) => {
                debug!(source = %self.remote.source(), err = %status, "root lookup failed");
                Err(status)
            }
        }
    }

    pub fn report_capacity(&self) -> CapacityReport {
        let report = report_capacity();
        debug!(?report, "statfs");
        report
    }
}

#[async_trait]
impl<V: Vfs> FsRoot for FilesystemHandle<V> {
    type Root = RootNode<V::Dir>;

    async fn root(&self) -> Result<Self::Root, Status> {
        self.resolve_root().await
    }

    fn capacity(&self) -> CapacityReport {
        self.report_capacity()
    }
}

/// Kernel-facing wrapper around the VFS root directory.
#[derive(Clone, Debug, PartialEq)]
pub struct RootNode<D> {
    dir: D,
}

impl<D: Directory> RootNode<D> {
    pub fn new(dir: D) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &D {
        &self.dir
    }

    pub fn into_inner(self) -> D {
        self.dir
    }
}

impl<D: Directory> Node for RootNode<D> {
    fn inode(&self) -> Inode {
        ROOT_INODE
    }

    fn attr(&self, req: &Request) -> FileAttr {
        let a = self.dir.attr();
        let mtime = Timestamp::from(a.mtime);
        FileAttr {
            ino: ROOT_INODE,
            size: a.size,
            blocks: a.size.div_ceil(512),
            atime: mtime,
            mtime,
            ctime: mtime,
            #[cfg(target_os = "macos")]
            crtime: mtime,
            kind: FileType::Directory,
            perm: a.perm,
            nlink: 1,
            uid: req.uid,
            gid: req.gid,
            rdev: 0,
            #[cfg(target_os = "macos")]
            flags: 0,
            blksize: ATTR_BLOCK_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::error::{Sentinel, VfsError};
    use crate::test_utils::{FakeDir, FakeVfs};

    #[tokio::test]
    async fn test_resolve_root_wraps_vfs_root() {
        let vfs = Arc::new(FakeVfs::healthy());
        let fs = FilesystemHandle::new(Arc::clone(&vfs));

        let first = fs.resolve_root().await.expect("root");
        let second = fs.resolve_root().await.expect("root again");
        let current = vfs.root().await.unwrap();
        assert_eq!(first.dir(), &current);
        assert_eq!(second.dir(), &current);
        assert_eq!(first, second);
        // two resolutions plus the direct lookup above
        assert_eq!(vfs.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_resolve_root_is_not_cached() {
        let vfs = Arc::new(FakeVfs::healthy());
        let fs = FilesystemHandle::new(Arc::clone(&vfs));

        let before = fs.resolve_root().await.unwrap();
        vfs.set_root(FakeDir::with_perm(0o700));
        let after = fs.resolve_root().await.unwrap();
        assert_ne!(before, after);
        assert_eq!(after.dir().attr().perm, 0o700);
    }

    #[tokio::test]
    async fn test_resolve_root_permission_denied() {
        let vfs = Arc::new(FakeVfs::failing(|| Sentinel::PermissionDenied.into()));
        let fs = FilesystemHandle::new(vfs);
        let status = fs.resolve_root().await.unwrap_err();
        assert!(matches!(status, Status::Errno(code) if code == libc::EPERM));
    }

    #[tokio::test]
    async fn test_resolve_root_directory_not_empty() {
        let vfs = Arc::new(FakeVfs::failing(|| {
            VfsError::from(Sentinel::DirectoryNotEmpty).context("load root")
        }));
        let fs = FilesystemHandle::new(vfs);
        let status = fs.resolve_root().await.unwrap_err();
        assert_eq!(status.raw_errno(), libc::ENOTEMPTY);
        assert!(!status.is_untranslated());
    }

    #[tokio::test]
    async fn test_resolve_root_unknown_error_passes_through() {
        let vfs = Arc::new(FakeVfs::failing(|| VfsError::other("backend unreachable")));
        let fs = FilesystemHandle::new(vfs);
        match fs.resolve_root().await.unwrap_err() {
            Status::Untranslated(err) => assert_eq!(err.to_string(), "backend unreachable"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fs_root_trait() {
        let fs = FilesystemHandle::new(Arc::new(FakeVfs::healthy()));
        let node = FsRoot::root(&fs).await.unwrap();
        assert_eq!(node.inode(), ROOT_INODE);
        assert_eq!(fs.capacity(), fs.capacity());
        assert_eq!(fs.capacity(), CapacityReport::NOMINAL);
    }

    #[tokio::test]
    async fn test_root_attr() {
        let fs = FilesystemHandle::new(Arc::new(FakeVfs::healthy()));
        let node = fs.resolve_root().await.unwrap();
        let req = Request::default();
        let attr = node.attr(&req);
        assert_eq!(attr.ino, ROOT_INODE);
        assert_eq!(attr.kind, FileType::Directory);
        assert_eq!(attr.perm, 0o755);
        assert_eq!(attr.uid, req.uid);
    }

    #[tokio::test]
    async fn test_concurrent_resolution() {
        let vfs = Arc::new(FakeVfs::healthy());
        let fs = Arc::new(FilesystemHandle::new(Arc::clone(&vfs)));
        let mut tasks = Vec::new();
        for _ in 0..32 {
            let fs = Arc::clone(&fs);
            tasks.push(tokio::spawn(async move {
                let node = fs.resolve_root().await.unwrap();
                (node, fs.report_capacity())
            }));
        }
        for task in tasks {
            let (node, report) = task.await.unwrap();
            assert_eq!(node.dir(), &FakeDir::default());
            assert_eq!(report, CapacityReport::NOMINAL);
        }
        assert_eq!(vfs.calls.load(Ordering::SeqCst), 32);
    }
}
