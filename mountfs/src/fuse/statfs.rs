//! Aggregate capacity reported to `statfs`.
//!
//! Backends behind the VFS (object stores, remotes) cannot report free space
//! cheaply, so the figures are synthetic: a fixed 1 PiB volume that is always
//! empty.

use rfuse3::raw::reply::ReplyStatFs;

const BLOCK_SIZE: u32 = 4096;
const TOTAL_BYTES: u64 = 1 << 50;
const TOTAL_BLOCKS: u64 = TOTAL_BYTES / BLOCK_SIZE as u64;
const FILE_SLOTS: u64 = 1_000_000_000;
const NAME_MAX: u32 = 255;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CapacityReport {
    pub block_size: u32,
    pub blocks: u64,
    pub free_blocks: u64,
    /// Free blocks available to unprivileged users.
    pub available_blocks: u64,
    pub files: u64,
    pub free_files: u64,
    pub name_len: u32,
    pub fragment_size: u32,
}

impl CapacityReport {
    pub const NOMINAL: CapacityReport = CapacityReport {
        block_size: BLOCK_SIZE,
        blocks: TOTAL_BLOCKS,
        free_blocks: TOTAL_BLOCKS,
        available_blocks: TOTAL_BLOCKS,
        files: FILE_SLOTS,
        free_files: FILE_SLOTS,
        name_len: NAME_MAX,
        fragment_size: BLOCK_SIZE,
    };

    pub fn total_bytes(&self) -> u64 {
        self.blocks * self.block_size as u64
    }
}

/// The capacity record answered to every `statfs`.
pub const fn report_capacity() -> CapacityReport {
    CapacityReport::NOMINAL
}

impl From<CapacityReport> for ReplyStatFs {
    fn from(r: CapacityReport) -> Self {
        ReplyStatFs {
            blocks: r.blocks,
            bfree: r.free_blocks,
            bavail: r.available_blocks,
            files: r.files,
            ffree: r.free_files,
            bsize: r.block_size,
            namelen: r.name_len,
            frsize: r.fragment_size,
        }
    }
}
