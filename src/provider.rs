use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::traits::{FileStat, Provider};

/// Provider backed by the real filesystem through `std::fs`.
///
/// Listings come back in the order the operating system returns them, which
/// is not sorted. Sort the walk's output if you need a stable order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProvider;

impl Provider for FsProvider {
    fn list_entries(&self, dir: &Path) -> io::Result<Vec<OsString>> {
        fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.file_name()))
            .collect()
    }

    fn lstat(&self, path: &Path) -> io::Result<FileStat> {
        let ft = fs::symlink_metadata(path)?.file_type();
        Ok(FileStat {
            is_dir:     ft.is_dir(),
            is_file:    ft.is_file(),
            is_symlink: ft.is_symlink(),
        })
    }

    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let meta = fs::metadata(path)?;
        Ok(FileStat {
            is_dir:     meta.is_dir(),
            is_file:    meta.is_file(),
            is_symlink: false,
        })
    }

    fn real_path(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }
}
