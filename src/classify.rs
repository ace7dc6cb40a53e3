//! Entry classification through `lstat`, with a follow-up `stat` for symlinks.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::entry::{EntryKind, LinkTarget};
use crate::error::WalkError;
use crate::traits::Provider;

/// A child that survived classification.
pub(crate) struct Classified {
    pub name:  String,
    pub abs:   PathBuf,
    pub kind:  EntryKind,
}

/// Classify `name` inside `parent`.
///
/// The kind comes from `lstat` so symlinks are seen as symlinks. A live
/// symlink gets a second, following `stat` to learn what it points at.
///
/// `Err` means the child must be skipped: it vanished after the listing
/// (`NotFound`), it is a dangling link (`Dangling`), or the provider failed on
/// it. None of these are fatal to the walk.
pub(crate) fn classify(
    provider: &dyn Provider,
    parent: &Path,
    name: &OsStr,
) -> Result<Classified, WalkError> {
    let abs = parent.join(name);

    let stat = provider
        .lstat(&abs)
        .map_err(|e| WalkError::from_io(abs.clone(), e))?;

    let kind = if stat.is_symlink {
        match provider.stat(&abs) {
            Ok(target) if target.is_dir => EntryKind::Symlink(LinkTarget::Dir),
            Ok(_) => EntryKind::Symlink(LinkTarget::File),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                trace!(path = %abs.display(), "dropping dangling symlink");
                return Err(WalkError::Dangling(abs));
            }
            Err(e) => return Err(WalkError::from_io(abs, e)),
        }
    } else if stat.is_dir {
        EntryKind::Dir
    } else if stat.is_file {
        EntryKind::File
    } else {
        EntryKind::Other
    };

    Ok(Classified {
        name: name.to_string_lossy().into_owned(),
        abs,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryProvider;

    fn fixture() -> MemoryProvider {
        let fs = MemoryProvider::new();
        fs.create_file("/r/file.txt").unwrap();
        fs.create_dir_all("/r/dir").unwrap();
        fs.symlink("file.txt", "/r/to-file").unwrap();
        fs.symlink("/r/dir", "/r/to-dir").unwrap();
        fs.symlink("/r/gone", "/r/dangling").unwrap();
        fs
    }

    fn kind_of(fs: &MemoryProvider, name: &str) -> Result<EntryKind, WalkError> {
        classify(fs, Path::new("/r"), OsStr::new(name)).map(|c| c.kind)
    }

    #[test]
    fn plain_kinds() {
        let fs = fixture();
        assert_eq!(kind_of(&fs, "file.txt").unwrap(), EntryKind::File);
        assert_eq!(kind_of(&fs, "dir").unwrap(), EntryKind::Dir);
    }

    #[test]
    fn symlinks_classified_by_target() {
        let fs = fixture();
        assert_eq!(
            kind_of(&fs, "to-file").unwrap(),
            EntryKind::Symlink(LinkTarget::File)
        );
        assert_eq!(
            kind_of(&fs, "to-dir").unwrap(),
            EntryKind::Symlink(LinkTarget::Dir)
        );
    }

    #[test]
    fn dangling_symlink_is_dropped() {
        let fs = fixture();
        assert!(matches!(kind_of(&fs, "dangling"), Err(WalkError::Dangling(_))));
    }

    #[test]
    fn vanished_entry_is_not_found() {
        let fs = fixture();
        assert!(matches!(kind_of(&fs, "missing"), Err(WalkError::NotFound(_))));
    }
}
