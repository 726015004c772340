//! A VFS fronting a directory on the host filesystem.
//!
//! Only root lookup lives here; host `io::Error`s with a sentinel meaning are
//! mapped onto sentinels, everything else is passed through as `VfsError::Io`.

use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use tracing::trace;

use super::{DirAttr, Directory, Remote, Vfs};
use crate::error::{Sentinel, VfsError};

/// Host directory backing a [`LocalVfs`].
#[derive(Debug)]
pub struct LocalRemote {
    root: PathBuf,
    display: String,
}

impl LocalRemote {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        let display = root.display().to_string();
        Self { root, display }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }
}

impl Remote for LocalRemote {
    fn name(&self) -> &str {
        "local"
    }

    fn root(&self) -> &str {
        &self.display
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LocalDir {
    rel: PathBuf,
    attr: DirAttr,
}

impl Directory for LocalDir {
    fn path(&self) -> &Path {
        &self.rel
    }

    fn attr(&self) -> DirAttr {
        self.attr
    }
}

pub struct LocalVfs {
    remote: Arc<LocalRemote>,
}

impl LocalVfs {
    pub fn new(remote: Arc<LocalRemote>) -> Self {
        Self { remote }
    }

    pub fn open<P: AsRef<Path>>(root: P) -> Self {
        Self::new(Arc::new(LocalRemote::new(root)))
    }
}

#[async_trait]
impl Vfs for LocalVfs {
    type Dir = LocalDir;
    type Remote = LocalRemote;

    async fn root(&self) -> Result<LocalDir, VfsError> {
        let path = self.remote.path();
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| host_error(e).context(format!("stat {}", path.display())))?;
        if !meta.is_dir() {
            let err = io::Error::from_raw_os_error(libc::ENOTDIR);
            return Err(VfsError::Io(err).context(format!("stat {}", path.display())));
        }
        let attr = DirAttr {
            size: meta.len(),
            perm: (meta.permissions().mode() & 0o7777) as u16,
            mtime: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        };
        trace!(root = %path.display(), ?attr, "resolved local root");
        Ok(LocalDir {
            rel: PathBuf::new(),
            attr,
        })
    }

    fn remote(&self) -> Arc<LocalRemote> {
        Arc::clone(&self.remote)
    }
}

/// Map a host error onto the VFS vocabulary.
pub fn host_error(err: io::Error) -> VfsError {
    let sentinel = match err.kind() {
        io::ErrorKind::NotFound => Some(Sentinel::NotFound),
        io::ErrorKind::AlreadyExists => Some(Sentinel::AlreadyExists),
        io::ErrorKind::PermissionDenied => Some(Sentinel::PermissionDenied),
        _ => match err.raw_os_error() {
            Some(libc::EROFS) => Some(Sentinel::ReadOnlyFilesystem),
            Some(libc::ENOTEMPTY) => Some(Sentinel::DirectoryNotEmpty),
            Some(libc::ESPIPE) => Some(Sentinel::InvalidSeek),
            Some(libc::EBADF) => Some(Sentinel::BadFileDescriptor),
            Some(libc::ENOSYS) => Some(Sentinel::NotImplemented),
            _ => None,
        },
    };
    match sentinel {
        Some(s) => s.into(),
        None => VfsError::Io(err),
    }
}
