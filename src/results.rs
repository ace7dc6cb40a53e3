use std::time::Duration;

use crate::entry::Entry;
use crate::error::WalkError;

/// The output of a completed walk.
///
/// Exactly one of `paths` and `entries` is populated for a given walk:
/// `entries` when `.objects(true)` was set on the builder, `paths` otherwise.
/// Both are in emission order (depth-first, pre-order, children in listing
/// order).
#[derive(Debug)]
pub struct Results {
    /// Output paths of emitted entries.
    pub paths: Vec<String>,

    /// Emitted entries. Only populated if `.objects(true)` was set.
    pub entries: Vec<Entry>,

    /// Scan statistics.
    pub stats: ScanStats,

    /// Non-fatal errors absorbed during the walk (unreadable directories,
    /// vanished entries, dangling links, symlink loops).
    /// Only populated if `.collect_errors(true)` was set on the builder.
    pub errors: Vec<WalkError>,
}

impl Results {
    /// Number of emitted values, whichever form they took.
    pub fn len(&self) -> usize {
        self.paths.len() + self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Statistics for a completed walk.
#[derive(Debug, Clone, Copy)]
pub struct ScanStats {
    /// Files classified (emitted or not), including special files.
    pub files: usize,

    /// Directories classified.
    pub dirs: usize,

    /// Live symlinks classified.
    pub symlinks: usize,

    /// Wall-clock time from walk start to completion.
    pub duration: Duration,

    /// Total entries classified per second. Clamped to 0 on zero-duration runs.
    pub entries_per_sec: usize,
}

impl ScanStats {
    pub(crate) fn compute(files: usize, dirs: usize, symlinks: usize, duration: Duration) -> Self {
        let total = files + dirs + symlinks;
        let eps = if duration.as_secs_f64() > 0.0 {
            (total as f64 / duration.as_secs_f64()) as usize
        } else {
            0
        };
        Self {
            files,
            dirs,
            symlinks,
            duration,
            entries_per_sec: eps,
        }
    }
}
