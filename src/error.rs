use std::path::PathBuf;
use thiserror::Error;

use crate::traits::HookError;

#[derive(Error, Debug)]
pub enum WalkError {
    // Config
    #[error("no root paths given")]
    NoRoots,

    #[error("invalid depth {0}: must be at least 1")]
    InvalidDepth(usize),

    #[error("invalid ignore pattern: {0}")]
    InvalidPattern(String),

    // Roots
    #[error("cannot inspect root {}", path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("cannot read directory {}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Traversal
    #[error("path vanished during walk: {}", .0.display())]
    NotFound(PathBuf),

    #[error("dangling symlink: {}", .0.display())]
    Dangling(PathBuf),

    #[error("symlink loop: {}", .0.display())]
    SymlinkLoop(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("IO error at {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Caller code
    #[error("hook failed")]
    Hook(#[source] HookError),
}

impl WalkError {
    /// The path this error occurred at, if applicable.
    /// Callers use this to present "Skipped: <path>" without pattern matching on variants.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::NotADirectory(p)
            | Self::NotFound(p)
            | Self::Dangling(p)
            | Self::SymlinkLoop(p)
            | Self::PermissionDenied(p)
            | Self::Root { path: p, .. }
            | Self::ReadDir { path: p, .. }
            | Self::Io { path: p, .. } => Some(p),
            _ => None,
        }
    }

    /// Whether the walk continues after this error.
    ///
    /// Recoverable errors are the ones found below a root: unreadable
    /// directories, entries that vanished mid-walk, dangling links and
    /// symlink loops. They are absorbed, and collected into
    /// [`Results::errors`](crate::Results::errors) when `.collect_errors(true)` is set.
    ///
    /// Everything else (bad config, a broken root, a failing hook) ends the
    /// walk and is returned as `Err`.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::Dangling(_)
                | Self::SymlinkLoop(_)
                | Self::PermissionDenied(_)
                | Self::ReadDir { .. }
                | Self::Io { .. }
        )
    }

    /// Map a provider failure below a root to a recoverable error.
    pub(crate) fn from_io(path: PathBuf, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source: err },
        }
    }
}
