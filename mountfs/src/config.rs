use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Options controlling how a filesystem is mounted.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MountConfig {
    /// Source name shown in the mount table; defaults to the remote's `name:root`.
    pub fs_name: Option<String>,
    pub allow_other: bool,
    pub read_only: bool,
    /// Mount through fusermount3 instead of calling mount(2) directly.
    pub unprivileged: bool,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            fs_name: None,
            // Keep defaults conservative: no allow_other, unprivileged mount.
            allow_other: false,
            read_only: false,
            unprivileged: true,
            uid: None,
            gid: None,
        }
    }
}

impl MountConfig {
    /// Load a JSON config file. Missing keys take their default.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read mount config {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("Failed to parse mount config {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Name shown in the mount table: the configured `fs_name`, else `source`.
    pub fn fs_name_or<'a>(&'a self, source: &'a str) -> &'a str {
        self.fs_name.as_deref().unwrap_or(source)
    }
}
