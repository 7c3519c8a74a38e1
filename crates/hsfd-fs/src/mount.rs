use std::fs;
use std::path::{Component, Path, PathBuf};

use sysinfo::Disks;
use tracing::{info, warn};

use crate::{Error, Result};

#[derive(Clone, Copy, Debug)]
pub struct MountOptions {
    format_if_mount_failed: bool,
}

impl Default for MountOptions {
    fn default() -> Self { Self::new() }
}

impl MountOptions {
    pub fn new() -> Self {
        Self {
            format_if_mount_failed: true,
        }
    }

    /// Create the root when it is missing instead of failing the mount.
    pub fn format_if_mount_failed(mut self, format: bool) -> Self {
        self.format_if_mount_failed = format;
        self
    }
}

/// Capacity figures reported after a successful mount.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StorageInfo {
    /// Size of the filesystem holding the root, when it can be determined.
    pub total: Option<u64>,
    /// Bytes in use on that filesystem.
    pub used:  Option<u64>,
    /// Bytes held by regular files under the root itself.
    pub root_bytes: u64,
}

/// An already-mounted directory that destination paths are rooted in.
#[derive(Clone, Debug)]
pub struct StorageRoot {
    base: PathBuf,
}

impl StorageRoot {
    /// Validate `base` as a usable storage root.
    pub fn mount(base: impl Into<PathBuf>, options: MountOptions) -> Result<Self> {
        let base = base.into();

        match fs::metadata(&base) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(Error::NotADirectory { path: base }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if !options.format_if_mount_failed {
                    return Err(Error::NotMounted { path: base });
                }
                warn!(path = %base.display(), "storage root missing, formatting");
                fs::create_dir_all(&base).map_err(|source| Error::Mount {
                    path: base.clone(),
                    source,
                })?;
            }
            Err(source) => return Err(Error::Mount { path: base, source }),
        }

        let root = Self { base };
        let info = root.info();
        info!(
            path = %root.base.display(),
            total = ?info.total,
            used = ?info.used,
            root_bytes = info.root_bytes,
            "storage mounted"
        );
        Ok(root)
    }

    pub fn path(&self) -> &Path { &self.base }

    /// Join a plain relative file name onto the root.
    ///
    /// Absolute names and names with `..` or prefix components are rejected.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> { resolve_under(&self.base, name) }

    /// Report capacity of the filesystem holding the root and usage under it.
    pub fn info(&self) -> StorageInfo {
        let canonical = fs::canonicalize(&self.base).unwrap_or_else(|_| self.base.clone());
        let disks = Disks::new_with_refreshed_list();
        let disk = disks
            .list()
            .iter()
            .filter(|disk| canonical.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len());

        StorageInfo {
            total: disk.map(|d| d.total_space()),
            used: disk.map(|d| d.total_space().saturating_sub(d.available_space())),
            root_bytes: dir_size(&self.base),
        }
    }
}

/// Join `name` onto `base`, rejecting any name that would land outside it.
///
/// Used for the destination whether or not the root mounted.
pub fn resolve_under(base: &Path, name: &str) -> Result<PathBuf> {
    let relative = Path::new(name);
    let plain = !name.is_empty()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        && relative.components().any(|c| matches!(c, Component::Normal(_)));
    if !plain {
        return Err(Error::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(base.join(relative))
}

fn dir_size(path: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(path) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| match entry.file_type() {
            Ok(ft) if ft.is_dir() => dir_size(&entry.path()),
            Ok(ft) if ft.is_file() => entry.metadata().map(|m| m.len()).unwrap_or(0),
            _ => 0,
        })
        .sum()
}
