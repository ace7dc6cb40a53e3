use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use crate::entry::Entry;

/// Error type returned by caller-supplied hooks and filters.
///
/// Hooks are trusted caller code: any error they return aborts the walk and
/// reaches the caller as [`WalkError::Hook`](crate::WalkError::Hook).
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The answer to `lstat`/`stat` for one path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileStat {
    pub is_dir: bool,
    pub is_file: bool,
    /// Always `false` for the symlink-following [`Provider::stat`].
    pub is_symlink: bool,
}

/// The filesystem the walker reads from.
///
/// The walker never touches the disk itself; every listing and stat goes
/// through a provider. [`FsProvider`](crate::FsProvider) is the real thing,
/// [`MemoryProvider`](crate::MemoryProvider) an in-memory tree.
///
/// # Error Handling
///
/// Return `io::ErrorKind::NotFound` when a path does not exist. Below a walk
/// root the walker treats that as "skip this node"; other errors on a
/// descendant skip it too, while any error on a root fails the walk.
///
/// # Thread Safety
///
/// `Send + Sync` are required — a built [`Walker`](crate::Walker) can be
/// shared across threads and run from each of them.
pub trait Provider: Send + Sync {
    /// Base names of a directory's children, in the order the walk visits them.
    fn list_entries(&self, dir: &Path) -> io::Result<Vec<OsString>>;

    /// Stat `path` without following a final symlink.
    fn lstat(&self, path: &Path) -> io::Result<FileStat>;

    /// Stat `path`, following symlinks. `NotFound` on a symlink means it dangles.
    fn stat(&self, path: &Path) -> io::Result<FileStat>;

    /// Canonical absolute form of `path` with every symlink resolved.
    fn real_path(&self, path: &Path) -> io::Result<PathBuf>;
}

/// Decides whether an entry appears in the output.
///
/// Rejection only affects output: a rejected directory is still descended
/// into if the recursion policy allows it.
///
/// # Example
///
/// ```rust
/// use treewalk::{Entry, Filter, HookError};
///
/// struct Markdown;
///
/// impl Filter for Markdown {
///     fn is_match(&self, entry: &Entry) -> Result<bool, HookError> {
///         Ok(entry.is_file() && entry.extension() == Some("md"))
///     }
/// }
/// ```
pub trait Filter: Send + Sync {
    fn is_match(&self, entry: &Entry) -> Result<bool, HookError>;
}

/// Steering values a [`Hook`] may change.
///
/// The walker fills this in with its own defaults before calling the hook and
/// reads it back afterwards; whatever the hook leaves in place is what the
/// walk does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Include the entry in the output. Defaults to `true`.
    pub keep: bool,

    /// Descend into the entry. Defaults to what the depth budget and the
    /// symlink policy allow; always `false` for files. Setting it on a
    /// directory overrides both, but never the symlink loop guard.
    pub recurse: bool,

    /// Replacement base name.
    pub name: Option<String>,

    /// Replacement output path.
    pub path: Option<String>,
}

/// Per-entry callback run before the inclusion and recursion decisions.
///
/// Registered through `.on_file()` / `.on_directory()` with a closure, or
/// `.with_file_hook()` / `.with_directory_hook()` with a type implementing
/// this trait.
pub trait Hook: Send + Sync {
    fn visit(&self, entry: &Entry, decision: &mut Decision) -> Result<(), HookError>;
}

impl<P: Provider + ?Sized> Provider for std::sync::Arc<P> {
    fn list_entries(&self, dir: &Path) -> io::Result<Vec<OsString>> {
        (**self).list_entries(dir)
    }

    fn lstat(&self, path: &Path) -> io::Result<FileStat> {
        (**self).lstat(path)
    }

    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        (**self).stat(path)
    }

    fn real_path(&self, path: &Path) -> io::Result<PathBuf> {
        (**self).real_path(path)
    }
}
