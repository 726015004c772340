//! Mounting a [`FilesystemHandle`] on a host directory.
//!
//! [`mount_options`] turns a [`MountConfig`] into rfuse3 options, naming the
//! mount after the remote's `name:root` unless the config overrides it.
//! [`mount`] starts the session, through fusermount3 when the config asks for
//! an unprivileged mount.

use std::path::Path;

use rfuse3::MountOptions;
use tracing::info;

use super::adapter::FilesystemHandle;
use crate::config::MountConfig;
use crate::vfs::{Remote, Vfs};

/// Build rfuse3 mount options from the configuration.
///
/// `fs_name` falls back to the remote's `name:root` source string.
pub fn mount_options(config: &MountConfig, fs_name: &str) -> MountOptions {
    let mut mo = MountOptions::default();
    mo.fs_name(config.fs_name_or(fs_name))
        .allow_other(config.allow_other)
        .read_only(config.read_only);
    if let Some(uid) = config.uid {
        mo.uid(uid);
    }
    if let Some(gid) = config.gid {
        mo.gid(gid);
    }
    mo
}

/// Mount a filesystem handle at `mount_point`, which must be an empty
/// directory. The returned handle unmounts on `unmount()`.
#[cfg(target_os = "linux")]
pub async fn mount<V: Vfs>(
    fs: FilesystemHandle<V>,
    mount_point: impl AsRef<Path>,
    config: &MountConfig,
) -> std::io::Result<rfuse3::raw::MountHandle> {
    let source = fs.remote().source();
    let opts = mount_options(config, &source);
    let session = rfuse3::raw::Session::new(opts);
    let mount_point = mount_point.as_ref();
    info!(
        %source,
        mount_point = %mount_point.display(),
        unprivileged = config.unprivileged,
        "mounting"
    );
    if config.unprivileged {
        session.mount_with_unprivileged(fs, mount_point).await
    } else {
        session.mount(fs, mount_point).await
    }
}

#[cfg(not(target_os = "linux"))]
pub async fn mount<V: Vfs>(
    fs: FilesystemHandle<V>,
    _mount_point: impl AsRef<Path>,
    _config: &MountConfig,
) -> std::io::Result<rfuse3::raw::MountHandle> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        format!("cannot mount {}: mountfs mounts need Linux", fs.remote().source()),
    ))
}

#[cfg(all(test, target_os = "linux"))]
mod mount_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::vfs::local::LocalVfs;

    // Real mount smoke test, opt-in through MOUNTFS_FUSE_TEST=1.
    #[tokio::test]
    async fn smoke_mount_root_and_statfs() {
        if std::env::var("MOUNTFS_FUSE_TEST").ok().as_deref() != Some("1") {
            eprintln!("skip fuse mount test: set MOUNTFS_FUSE_TEST=1 to enable");
            return;
        }

        let backing = tempfile::tempdir().expect("tmp backing");
        let mnt = tempfile::tempdir().expect("tmp mount");
        let fs = FilesystemHandle::new(Arc::new(LocalVfs::open(backing.path())));

        let handle = match mount(fs, mnt.path(), &MountConfig::default()).await {
            Ok(h) => h,
            Err(e) => {
                eprintln!("skip fuse test: mount failed: {e}");
                return;
            }
        };

        // give the kernel time to finish INIT
        tokio::time::sleep(Duration::from_millis(1000)).await;

        let meta = std::fs::metadata(mnt.path()).expect("stat mount root");
        assert!(meta.is_dir());

        let st = statvfs_blocks(mnt.path());
        assert_eq!(st.0, 4096);
        assert_eq!(st.1, (1u64 << 50) / 4096);

        if let Err(e) = handle.unmount().await {
            eprintln!("unmount error: {e}");
        }
    }

    fn statvfs_blocks(path: &Path) -> (u64, u64) {
        use std::ffi::CString;
        use std::os::unix::ffi::OsStrExt;

        let c_path = CString::new(path.as_os_str().as_bytes()).unwrap();
        let mut buf: libc::statvfs = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut buf) };
        assert_eq!(rc, 0, "statvfs failed");
        (buf.f_bsize as u64, buf.f_blocks as u64)
    }
}
