//! Output path computation: `/`-joined relative paths, real paths, and the
//! first-wins bookkeeping behind `unique`.

use std::collections::HashSet;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::traits::Provider;

/// Computes output paths for the entries below one root.
pub(crate) struct PathResolver {
    /// Prefix from `base` to the root, `/`-joined. Empty when base == root.
    prefix: String,
    /// Canonical base, present only in realpath mode.
    real_base: Option<PathBuf>,
}

impl PathResolver {
    /// `root` and `base` must both be absolute.
    pub(crate) fn new(
        provider: &dyn Provider,
        root: &Path,
        base: &Path,
        realpath: bool,
    ) -> Self {
        let prefix = relative_to(base, root)
            .unwrap_or_else(|| root.to_string_lossy().into_owned());

        // A base that cannot be canonicalized is compared as given.
        let real_base = realpath.then(|| {
            provider
                .real_path(base)
                .unwrap_or_else(|_| base.to_path_buf())
        });

        Self { prefix, real_base }
    }

    /// Output path for an entry reached through `route` (its `/`-joined path
    /// below the root) at absolute location `abs`.
    ///
    /// In realpath mode the path is canonicalized through the provider and
    /// also returned, so the caller can deduplicate on it. A failure there
    /// means the target vanished and the entry should be dropped.
    pub(crate) fn output(
        &self,
        provider: &dyn Provider,
        route: &str,
        abs: &Path,
    ) -> io::Result<(String, Option<PathBuf>)> {
        let Some(real_base) = &self.real_base else {
            return Ok((self.display_route(route), None));
        };

        let real = provider.real_path(abs)?;
        let path = if real.starts_with(real_base) {
            relative_to(real_base, &real).unwrap_or_default()
        } else {
            real.to_string_lossy().into_owned()
        };
        Ok((dot_if_empty(path), Some(real)))
    }

    /// Output path for the route alone, without consulting the provider.
    pub(crate) fn display_route(&self, route: &str) -> String {
        dot_if_empty(join(&self.prefix, route))
    }
}

/// Real paths already emitted and directories already descended into.
///
/// Only consulted when `unique` is set. Lives for one walk call and spans
/// all of its roots.
#[derive(Default)]
pub(crate) struct Seen {
    emitted:  HashSet<PathBuf>,
    explored: HashSet<PathBuf>,
}

impl Seen {
    /// Record `real` as emitted. `false` if an earlier entry already was.
    pub(crate) fn first_emit(&mut self, real: &Path) -> bool {
        self.emitted.insert(real.to_path_buf())
    }

    /// `false` if another route already descended into `real`.
    pub(crate) fn first_explore(&self, real: &Path) -> bool {
        !self.explored.contains(real)
    }

    pub(crate) fn mark_explored(&mut self, real: PathBuf) {
        self.explored.insert(real);
    }
}

/// Join two `/`-separated path fragments, either of which may be empty.
pub(crate) fn join(prefix: &str, name: &str) -> String {
    match (prefix.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (_, true) => prefix.to_string(),
        _ => format!("{prefix}/{name}"),
    }
}

/// Lexical path from `base` to `path`, `/`-joined, using `..` to climb out of
/// `base` when needed. `None` when the two share no root (e.g. different
/// Windows drives).
pub(crate) fn relative_to(base: &Path, path: &Path) -> Option<String> {
    let base: Vec<Component<'_>> = base.components().filter(|c| *c != Component::CurDir).collect();
    let path: Vec<Component<'_>> = path.components().filter(|c| *c != Component::CurDir).collect();

    let common = base
        .iter()
        .zip(path.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let rooted = |c: &[Component<'_>]| {
        matches!(c.first(), Some(Component::RootDir | Component::Prefix(_)))
    };
    if common == 0 && (rooted(&base) || rooted(&path)) {
        return None;
    }

    let ups = base.len() - common;
    let segments: Vec<String> = std::iter::repeat("..".to_string())
        .take(ups)
        .chain(
            path[common..]
                .iter()
                .map(|c| c.as_os_str().to_string_lossy().into_owned()),
        )
        .collect();

    Some(segments.join("/"))
}

fn dot_if_empty(path: String) -> String {
    if path.is_empty() {
        ".".to_string()
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_skips_empty_sides() {
        assert_eq!(join("", "a"), "a");
        assert_eq!(join("a", ""), "a");
        assert_eq!(join("a/b", "c"), "a/b/c");
    }

    #[test]
    fn relative_to_descendant() {
        let rel = relative_to(Path::new("/t"), Path::new("/t/fixtures/a.md"));
        assert_eq!(rel.as_deref(), Some("fixtures/a.md"));
    }

    #[test]
    fn relative_to_self_is_empty() {
        assert_eq!(relative_to(Path::new("/t/x"), Path::new("/t/x")).as_deref(), Some(""));
    }

    #[test]
    fn relative_to_sibling_climbs() {
        let rel = relative_to(Path::new("/t/a/b"), Path::new("/t/c"));
        assert_eq!(rel.as_deref(), Some("../../c"));
    }

    #[test]
    fn unique_sets_are_first_wins() {
        let mut seen = Seen::default();
        assert!(seen.first_emit(Path::new("/r/a")));
        assert!(!seen.first_emit(Path::new("/r/a")));

        assert!(seen.first_explore(Path::new("/r/d")));
        seen.mark_explored(PathBuf::from("/r/d"));
        assert!(!seen.first_explore(Path::new("/r/d")));
    }
}
