use std::path::{Path, PathBuf};

/// A single filesystem node discovered during a walk.
///
/// Entries are created fresh by the classifier for every child name a
/// directory listing yields, handed to the matching hook and filter, and then
/// either emitted or discarded. Nothing keeps an entry alive past the walk
/// that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The entry's base name.
    pub name: String,

    /// Output path in the walk's current mode: `/`-joined and relative to the
    /// root (or `base`), or the resolved real path when `realpath` is set.
    pub path: String,

    /// Absolute path used for provider calls.
    pub absolute_path: PathBuf,

    /// Canonical location of the entry. Only populated when `realpath` is set.
    pub real_path: Option<PathBuf>,

    /// What kind of node this is, as reported by `lstat`.
    pub kind: EntryKind,

    /// How deep in the walk this entry was found. Children of a root = 1,
    /// the root itself = 0.
    pub depth: usize,
}

/// The kind of a classified entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A regular file.
    File,

    /// A directory.
    Dir,

    /// A symbolic link whose target exists. Dangling links never become entries.
    Symlink(LinkTarget),

    /// Anything else (device files, pipes, sockets, etc.).
    Other,
}

/// What a live symlink points at, determined by a symlink-following `stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkTarget {
    File,
    Dir,
}

impl Entry {
    /// `true` for regular files and symlinks to files.
    pub fn is_file(&self) -> bool {
        matches!(
            self.kind,
            EntryKind::File | EntryKind::Symlink(LinkTarget::File)
        )
    }

    /// `true` for directories and symlinks to directories.
    pub fn is_directory(&self) -> bool {
        self.kind.is_dir_like()
    }

    pub fn is_symlink(&self) -> bool {
        matches!(self.kind, EntryKind::Symlink(_))
    }

    /// The base name without its final extension.
    pub fn stem(&self) -> Option<&str> {
        Path::new(&self.name).file_stem().and_then(|s| s.to_str())
    }

    /// The final extension of the base name, without the leading dot.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.name).extension().and_then(|s| s.to_str())
    }
}

impl EntryKind {
    pub(crate) fn is_dir_like(self) -> bool {
        matches!(self, EntryKind::Dir | EntryKind::Symlink(LinkTarget::Dir))
    }
}
