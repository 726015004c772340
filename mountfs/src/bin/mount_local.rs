// Mount a host directory through the mountfs adapter.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mountfs::config::MountConfig;
use mountfs::fuse::mount::mount;
use mountfs::vfs::local::LocalVfs;
use mountfs::FilesystemHandle;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Mount a local directory via FUSE")]
struct Args {
    /// Directory exposed through the VFS
    #[arg(long)]
    source: PathBuf,
    /// Empty directory to mount on (created if missing)
    #[arg(long)]
    mountpoint: PathBuf,
    /// JSON mount config; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Mount read-only
    #[arg(long)]
    read_only: bool,
    /// Call mount(2) directly instead of fusermount3
    #[arg(long)]
    privileged: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => MountConfig::from_file(path)?,
        None => MountConfig::default(),
    };
    config.read_only |= args.read_only;
    if args.privileged {
        config.unprivileged = false;
    }

    std::fs::create_dir_all(&args.mountpoint).with_context(|| {
        format!("Failed to create mount point {}", args.mountpoint.display())
    })?;

    let fs = FilesystemHandle::new(Arc::new(LocalVfs::open(&args.source)));
    let mut mount_handle = mount(fs, &args.mountpoint, &config)
        .await
        .with_context(|| format!("Failed to mount at {}", args.mountpoint.display()))?;
    tracing::info!("mounted, press Ctrl+C to unmount");

    let handle = &mut mount_handle;
    tokio::select! {
        res = handle => res.context("FUSE session ended with error")?,
        _ = signal::ctrl_c() => {
            mount_handle.unmount().await.context("Failed to unmount")?;
        }
    }
    Ok(())
}
