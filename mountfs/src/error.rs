//! Error vocabulary of the VFS and its translation to kernel status codes.
//!
//! The VFS reports expected conditions as one of a closed set of [`Sentinel`]s.
//! Every outcome crossing into the FUSE layer goes through [`translate`]: a
//! sentinel becomes its fixed errno, anything else is handed back untouched as
//! [`Status::Untranslated`] so diagnostics keep the original error.

use std::error::Error as StdError;
use std::io;

use libc::c_int;
use thiserror::Error;

/// Expected outcomes a VFS operation may fail with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Sentinel {
    #[error("file does not exist")]
    NotFound,
    #[error("file already exists")]
    AlreadyExists,
    #[error("permission denied")]
    PermissionDenied,
    #[error("file already closed")]
    Closed,
    #[error("directory not empty")]
    DirectoryNotEmpty,
    #[error("illegal seek")]
    InvalidSeek,
    #[error("bad file descriptor")]
    BadFileDescriptor,
    #[error("read only file system")]
    ReadOnlyFilesystem,
    #[error("function not implemented")]
    NotImplemented,
}

impl Sentinel {
    pub const ALL: [Sentinel; 9] = [
        Sentinel::NotFound,
        Sentinel::AlreadyExists,
        Sentinel::PermissionDenied,
        Sentinel::Closed,
        Sentinel::DirectoryNotEmpty,
        Sentinel::InvalidSeek,
        Sentinel::BadFileDescriptor,
        Sentinel::ReadOnlyFilesystem,
        Sentinel::NotImplemented,
    ];

    /// The kernel errno this sentinel is reported as.
    pub const fn errno(self) -> c_int {
        match self {
            Sentinel::NotFound => libc::ENOENT,
            Sentinel::AlreadyExists => libc::EEXIST,
            Sentinel::PermissionDenied => libc::EPERM,
            // A closed handle looks like a stale descriptor to the caller.
            Sentinel::Closed | Sentinel::BadFileDescriptor => libc::EBADF,
            Sentinel::DirectoryNotEmpty => libc::ENOTEMPTY,
            Sentinel::InvalidSeek => libc::ESPIPE,
            Sentinel::ReadOnlyFilesystem => libc::EROFS,
            Sentinel::NotImplemented => libc::ENOSYS,
        }
    }
}

/// Error returned by VFS operations.
#[derive(Debug, Error)]
pub enum VfsError {
    #[error(transparent)]
    Sentinel(#[from] Sentinel),

    /// An error annotated with the call site that observed it.
    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<VfsError>,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Other(Box<dyn StdError + Send + Sync>),
}

impl VfsError {
    pub fn other<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        VfsError::Other(err.into())
    }

    /// Wrap this error with call-site context. The cause is preserved.
    pub fn context(self, context: impl Into<String>) -> Self {
        VfsError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost sentinel carried by this error, if any.
    ///
    /// Context layers are peeled recursively, and boxed or io-wrapped errors
    /// are searched through their `source()` chain.
    pub fn sentinel(&self) -> Option<Sentinel> {
        match self {
            VfsError::Sentinel(s) => Some(*s),
            VfsError::Context { source, .. } => source.sentinel(),
            VfsError::Io(err) => {
                let inner: &(dyn StdError + 'static) = err.get_ref()?;
                sentinel_in_chain(inner)
            }
            VfsError::Other(err) => sentinel_in_chain(err.as_ref()),
        }
    }

    /// Raw OS error code carried by an untranslated error, if there is one.
    pub fn raw_os_error(&self) -> Option<c_int> {
        match self {
            VfsError::Sentinel(_) => None,
            VfsError::Context { source, .. } => source.raw_os_error(),
            VfsError::Io(err) => err.raw_os_error(),
            VfsError::Other(err) => {
                let root: &(dyn StdError + 'static) = err.as_ref();
                let mut next = Some(root);
                while let Some(e) = next {
                    if let Some(vfs_err) = e.downcast_ref::<VfsError>() {
                        return vfs_err.raw_os_error();
                    }
                    if let Some(code) = e
                        .downcast_ref::<io::Error>()
                        .and_then(io::Error::raw_os_error)
                    {
                        return Some(code);
                    }
                    next = e.source();
                }
                None
            }
        }
    }
}

fn sentinel_in_chain(err: &(dyn StdError + 'static)) -> Option<Sentinel> {
    let mut next = Some(err);
    while let Some(e) = next {
        if let Some(vfs_err) = e.downcast_ref::<VfsError>() {
            return vfs_err.sentinel();
        }
        if let Some(s) = e.downcast_ref::<Sentinel>() {
            return Some(*s);
        }
        if let Some(inner) = e.downcast_ref::<io::Error>().and_then(io::Error::get_ref) {
            let inner: &(dyn StdError + 'static) = inner;
            next = Some(inner);
            continue;
        }
        next = e.source();
    }
    None
}

/// Attach call-site context to a `Result<T, VfsError>`.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T, VfsError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<VfsError>,
{
    fn context(self, context: impl Into<String>) -> Result<T, VfsError> {
        self.map_err(|e| VfsError::context(e.into(), context))
    }
}

/// Status of a failed call as seen by the kernel protocol layer.
#[derive(Debug, Error)]
pub enum Status {
    /// A sentinel mapped onto its kernel errno.
    #[error("errno {0}")]
    Errno(c_int),
    /// An error outside the sentinel set, passed through unchanged.
    #[error(transparent)]
    Untranslated(VfsError),
}

impl Status {
    /// The errno the kernel will see for this status.
    ///
    /// Untranslated errors keep the OS code they carry. Zero means success on
    /// the wire, so an error without a positive code is reported as EIO.
    pub fn raw_errno(&self) -> c_int {
        match self {
            Status::Errno(code) => *code,
            Status::Untranslated(err) => match err.raw_os_error() {
                Some(code) if code > 0 => code,
                _ => libc::EIO,
            },
        }
    }

    pub fn into_errno(self) -> rfuse3::Errno {
        self.raw_errno().into()
    }

    pub fn is_untranslated(&self) -> bool {
        matches!(self, Status::Untranslated(_))
    }
}

impl From<Status> for rfuse3::Errno {
    fn from(status: Status) -> Self {
        status.into_errno()
    }
}

/// Translate a VFS error into the status reported to the kernel.
pub fn translate_error(err: VfsError) -> Status {
    match err.sentinel() {
        Some(sentinel) => Status::Errno(sentinel.errno()),
        None => Status::Untranslated(err),
    }
}

/// Translate the outcome of a VFS call. Success stays `Ok`, the kernel's
/// "no error".
pub fn translate<T>(outcome: Result<T, VfsError>) -> Result<T, Status> {
    outcome.map_err(translate_error)
}
