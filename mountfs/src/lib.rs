//! mountfs: expose a virtual filesystem to the kernel through FUSE.
//!
//! The crate is the adaptation boundary between a [`vfs::Vfs`] and the kernel
//! protocol spoken by `rfuse3`: it resolves the root node, answers `statfs`,
//! and translates VFS errors into kernel status codes.

pub mod config;
pub mod error;
pub mod fuse;
pub mod vfs;

pub use error::{Sentinel, Status, VfsError, translate, translate_error};
pub use fuse::adapter::{FilesystemHandle, FsRoot, Node, ROOT_INODE, RootNode};
pub use fuse::statfs::{CapacityReport, report_capacity};

// Test utilities (only compiled during tests)
#[cfg(test)]
pub(crate) mod test_utils {
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::error::VfsError;
    use crate::vfs::{DirAttr, Directory, Remote, Vfs};

    type Outcome = Box<dyn Fn() -> Result<FakeDir, VfsError> + Send + Sync>;

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct FakeDir {
        path: PathBuf,
        attr: DirAttr,
    }

    impl FakeDir {
        pub fn with_perm(perm: u16) -> Self {
            Self {
                path: PathBuf::new(),
                attr: DirAttr {
                    perm,
                    ..DirAttr::default()
                },
            }
        }
    }

    impl Directory for FakeDir {
        fn path(&self) -> &Path {
            &self.path
        }

        fn attr(&self) -> DirAttr {
            self.attr
        }
    }

    pub struct FakeRemote;

    impl Remote for FakeRemote {
        fn name(&self) -> &str {
            "memory"
        }

        fn root(&self) -> &str {
            "test"
        }
    }

    /// VFS whose root lookup returns a scripted outcome and counts calls.
    pub struct FakeVfs {
        outcome: Mutex<Outcome>,
        pub calls: AtomicUsize,
    }

    impl FakeVfs {
        pub fn healthy() -> Self {
            Self::with_outcome(Box::new(|| Ok(FakeDir::default())))
        }

        pub fn failing(err: fn() -> VfsError) -> Self {
            Self::with_outcome(Box::new(move || Err(err())))
        }

        fn with_outcome(outcome: Outcome) -> Self {
            Self {
                outcome: Mutex::new(outcome),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn set_root(&self, dir: FakeDir) {
            *self.outcome.lock().unwrap() = Box::new(move || Ok(dir.clone()));
        }
    }

    #[async_trait]
    impl Vfs for FakeVfs {
        type Dir = FakeDir;
        type Remote = FakeRemote;

        async fn root(&self) -> Result<FakeDir, VfsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let outcome = self.outcome.lock().unwrap();
            outcome()
        }

        fn remote(&self) -> Arc<FakeRemote> {
            Arc::new(FakeRemote)
        }
    }
}
