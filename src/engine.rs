use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ignore::gitignore::Gitignore;
use tracing::{debug, trace};

use crate::classify::{classify, Classified};
use crate::entry::{Entry, EntryKind, LinkTarget};
use crate::error::WalkError;
use crate::resolve::{join, PathResolver, Seen};
use crate::results::{Results, ScanStats};
use crate::traits::{Decision, Filter, Hook, Provider};

// ---------------------------------------------------------------------------
// WalkConfig
// ---------------------------------------------------------------------------

/// Validated, immutable walk options.
///
/// Produced once by [`WalkBuilder::build()`](crate::WalkBuilder::build); all
/// defaults are derived there (`recursive` over `depth`, `follow` implying
/// `symlinks`, `unique` implying `realpath`) and never re-derived mid-walk.
pub struct WalkConfig {
    /// Absolute root paths, in the order given.
    pub(crate) roots:          Vec<PathBuf>,
    /// `None` = unbounded.
    pub(crate) max_depth:      Option<usize>,
    pub(crate) objects:        bool,
    pub(crate) nodir:          bool,
    pub(crate) symlinks:       bool,
    pub(crate) follow:         bool,
    pub(crate) realpath:       bool,
    pub(crate) unique:         bool,
    /// Absolute base for relative output; `None` = each root.
    pub(crate) base:           Option<PathBuf>,
    /// Base names excluded verbatim.
    pub(crate) ignore_names:   HashSet<String>,
    /// Glob patterns among the ignore list.
    pub(crate) ignore_globs:   Option<Gitignore>,
    pub(crate) filter:         Option<Arc<dyn Filter>>,
    pub(crate) on_file:        Option<Arc<dyn Hook>>,
    pub(crate) on_directory:   Option<Arc<dyn Hook>>,
    pub(crate) include_root:   bool,
    pub(crate) limit:          Option<usize>,
    pub(crate) collect_errors: bool,
}

impl WalkConfig {
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Effective maximum depth. `None` when walking recursively.
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    pub fn follows_symlinks(&self) -> bool {
        self.follow
    }

    pub fn resolves_realpaths(&self) -> bool {
        self.realpath
    }

    /// Canonical paths are tracked per directory when something may descend
    /// through a symlink, or when output already needs them.
    fn tracks_real_paths(&self) -> bool {
        self.follow || self.realpath || self.on_directory.is_some()
    }
}

// ---------------------------------------------------------------------------
// Walker
// ---------------------------------------------------------------------------

/// A configured walk, ready to run.
///
/// Running does not consume the walker: every call to [`run()`](Walker::run)
/// walks the whole requested scope afresh, so an unchanged tree yields the
/// same output each time.
pub struct Walker {
    pub(crate) config:   WalkConfig,
    pub(crate) provider: Arc<dyn Provider>,
}

/// One directory whose children are being visited.
struct Frame {
    abs:   PathBuf,
    /// `/`-joined path from the root along the route that reached it.
    route: String,
    depth: usize,
    /// Canonical location, when real paths are tracked.
    real:  Option<PathBuf>,
    names: std::vec::IntoIter<OsString>,
}

/// Everything one `run()` accumulates.
struct Accumulator {
    paths:   Vec<String>,
    entries: Vec<Entry>,
    emitted: usize,
    errors:  Vec<WalkError>,
    seen:    Seen,
    files:   usize,
    dirs:    usize,
    links:   usize,
}

impl Walker {
    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// Walk every root in order and collect the output.
    ///
    /// # Errors
    ///
    /// Fails when a root cannot be inspected or listed, when a root is not a
    /// directory (unless `include_root` is set), or when a hook or filter
    /// returns an error. Failures below a root are absorbed; with
    /// `.collect_errors(true)` they are reported in [`Results::errors`].
    pub fn run(&self) -> Result<Results, WalkError> {
        let start = Instant::now();
        let mut acc = Accumulator::new();

        for root in &self.config.roots {
            if self.limit_reached(&acc) {
                break;
            }
            self.walk_root(root, &mut acc)?;
        }

        Ok(acc.finish(start.elapsed()))
    }

    fn walk_root(&self, root: &Path, acc: &mut Accumulator) -> Result<(), WalkError> {
        let provider = &*self.provider;
        let cfg = &self.config;
        debug!(root = %root.display(), "walking root");

        let root_err = |source: std::io::Error| WalkError::Root {
            path: root.to_path_buf(),
            source,
        };

        let lstat = provider.lstat(root).map_err(root_err)?;
        let kind = if lstat.is_symlink {
            let target = provider.stat(root).map_err(root_err)?;
            EntryKind::Symlink(if target.is_dir { LinkTarget::Dir } else { LinkTarget::File })
        } else if lstat.is_dir {
            EntryKind::Dir
        } else if lstat.is_file {
            EntryKind::File
        } else {
            EntryKind::Other
        };
        acc.count(kind);

        if !kind.is_dir_like() && !cfg.include_root {
            return Err(WalkError::NotADirectory(root.to_path_buf()));
        }

        let base = cfg.base.as_deref().unwrap_or(root);
        let resolver = PathResolver::new(provider, root, base, cfg.realpath);

        let mut descend = kind.is_dir_like();
        let mut root_real = None;

        if cfg.include_root {
            let (path, real) = resolver.output(provider, "", root).map_err(root_err)?;
            let name = root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| root.to_string_lossy().into_owned());
            let ignored = self.is_ignored(&name, kind);
            let entry = Entry {
                name,
                path,
                absolute_path: root.to_path_buf(),
                real_path: real.clone(),
                kind,
                depth: 0,
            };
            let recurse = self.decide(entry, descend, ignored, acc)?;
            descend = descend && recurse;
            root_real = real;
        }

        if !descend || self.limit_reached(acc) {
            return Ok(());
        }

        if root_real.is_none() && (cfg.tracks_real_paths() || cfg.unique) {
            root_real = Some(provider.real_path(root).map_err(root_err)?);
        }
        if cfg.unique {
            if let Some(real) = &root_real {
                if !acc.seen.first_explore(real) {
                    trace!(root = %root.display(), "root already explored");
                    return Ok(());
                }
                acc.seen.mark_explored(real.clone());
            }
        }

        let names = provider
            .list_entries(root)
            .map_err(|source| WalkError::ReadDir {
                path: root.to_path_buf(),
                source,
            })?;

        let mut stack = vec![Frame {
            abs:   root.to_path_buf(),
            route: String::new(),
            depth: 0,
            real:  root_real,
            names: names.into_iter(),
        }];

        while let Some(frame) = stack.last_mut() {
            let Some(name) = frame.names.next() else {
                stack.pop();
                continue;
            };
            let depth = frame.depth + 1;
            let route = join(&frame.route, &name.to_string_lossy());

            let child = match classify(provider, &frame.abs, &name) {
                Ok(child) => child,
                Err(e) => {
                    trace!(error = %e, "skipping entry");
                    acc.absorb(e, cfg.collect_errors);
                    continue;
                }
            };
            acc.count(child.kind);

            if depth == 1 && !cfg.symlinks && matches!(child.kind, EntryKind::Symlink(_)) {
                trace!(path = %child.abs.display(), "skipping first-level symlink");
                continue;
            }

            if let Some(next) = self.visit(child, route, depth, &resolver, &stack, acc)? {
                stack.push(next);
            }

            if self.limit_reached(acc) {
                debug!(limit = ?cfg.limit, "limit reached, stopping walk");
                break;
            }
        }

        Ok(())
    }

    /// Resolve, hook, emit and (maybe) prepare a descent for one child.
    fn visit(
        &self,
        child: Classified,
        route: String,
        depth: usize,
        resolver: &PathResolver,
        ancestors: &[Frame],
        acc: &mut Accumulator,
    ) -> Result<Option<Frame>, WalkError> {
        let provider = &*self.provider;
        let cfg = &self.config;
        let Classified { name, abs, kind } = child;

        let (path, real) = match resolver.output(provider, &route, &abs) {
            Ok(resolved) => resolved,
            Err(e) => {
                trace!(path = %abs.display(), "real path vanished");
                acc.absorb(WalkError::from_io(abs, e), cfg.collect_errors);
                return Ok(None);
            }
        };

        let budget = cfg.max_depth.map_or(true, |max| depth < max);
        let default_recurse = match kind {
            EntryKind::Dir => budget,
            EntryKind::Symlink(LinkTarget::Dir) => budget && cfg.follow,
            _ => false,
        };

        let ignored = self.is_ignored(&name, kind);
        let entry = Entry {
            name,
            path,
            absolute_path: abs.clone(),
            real_path: real.clone(),
            kind,
            depth,
        };

        let recurse = self.decide(entry, default_recurse, ignored, acc)?;
        if !recurse || !kind.is_dir_like() {
            return Ok(None);
        }

        self.descend(abs, route, depth, real, ancestors, acc)
    }

    /// Run the hook, apply the output rules, and emit. Returns the final
    /// recursion verdict.
    fn decide(
        &self,
        mut entry: Entry,
        default_recurse: bool,
        ignored: bool,
        acc: &mut Accumulator,
    ) -> Result<bool, WalkError> {
        let cfg = &self.config;
        let dir_like = entry.kind.is_dir_like();

        let mut decision = Decision {
            keep:    true,
            recurse: default_recurse,
            name:    None,
            path:    None,
        };

        let hook = if dir_like { &cfg.on_directory } else { &cfg.on_file };
        if let Some(hook) = hook {
            hook.visit(&entry, &mut decision).map_err(WalkError::Hook)?;
            if let Some(name) = decision.name.take() {
                entry.name = name;
            }
            if let Some(path) = decision.path.take() {
                entry.path = path;
            }
        }

        let mut emit = decision.keep && !ignored && !(cfg.nodir && dir_like);
        if emit {
            if let Some(filter) = &cfg.filter {
                emit = filter.is_match(&entry).map_err(WalkError::Hook)?;
            }
        }
        if emit && cfg.unique {
            if let Some(real) = &entry.real_path {
                emit = acc.seen.first_emit(real);
            }
        }

        trace!(
            path = %entry.path,
            emit,
            recurse = decision.recurse,
            "entry decided"
        );

        if emit {
            acc.emit(entry, cfg.objects);
        }

        Ok(dir_like && decision.recurse)
    }

    /// Open a directory for descent, unless that would loop, repeat a
    /// `unique` exploration, or the listing fails.
    fn descend(
        &self,
        abs: PathBuf,
        route: String,
        depth: usize,
        real: Option<PathBuf>,
        ancestors: &[Frame],
        acc: &mut Accumulator,
    ) -> Result<Option<Frame>, WalkError> {
        let provider = &*self.provider;
        let cfg = &self.config;

        let real = match real {
            Some(real) => Some(real),
            None if cfg.tracks_real_paths() => match provider.real_path(&abs) {
                Ok(real) => Some(real),
                Err(e) => {
                    acc.absorb(WalkError::from_io(abs, e), cfg.collect_errors);
                    return Ok(None);
                }
            },
            None => None,
        };

        if let Some(real) = &real {
            if ancestors.iter().any(|f| f.real.as_ref() == Some(real)) {
                debug!(path = %abs.display(), "symlink loop, not descending");
                acc.absorb(WalkError::SymlinkLoop(abs), cfg.collect_errors);
                return Ok(None);
            }
            if cfg.unique {
                if !acc.seen.first_explore(real) {
                    trace!(path = %abs.display(), "already explored through another route");
                    return Ok(None);
                }
                acc.seen.mark_explored(real.clone());
            }
        }

        let names = match provider.list_entries(&abs) {
            Ok(names) => names,
            Err(source) => {
                debug!(path = %abs.display(), error = %source, "cannot list directory");
                acc.absorb(WalkError::ReadDir { path: abs, source }, cfg.collect_errors);
                return Ok(None);
            }
        };

        trace!(path = %abs.display(), children = names.len(), "entering directory");
        Ok(Some(Frame {
            abs,
            route,
            depth,
            real,
            names: names.into_iter(),
        }))
    }

    fn is_ignored(&self, name: &str, kind: EntryKind) -> bool {
        let cfg = &self.config;
        cfg.ignore_names.contains(name)
            || cfg
                .ignore_globs
                .as_ref()
                .is_some_and(|gi| gi.matched(name, kind.is_dir_like()).is_ignore())
    }

    fn limit_reached(&self, acc: &Accumulator) -> bool {
        self.config.limit.is_some_and(|lim| acc.emitted >= lim)
    }
}

impl Accumulator {
    fn new() -> Self {
        Self {
            paths:   Vec::new(),
            entries: Vec::new(),
            emitted: 0,
            errors:  Vec::new(),
            seen:    Seen::default(),
            files:   0,
            dirs:    0,
            links:   0,
        }
    }

    fn count(&mut self, kind: EntryKind) {
        match kind {
            EntryKind::Dir => self.dirs += 1,
            EntryKind::Symlink(_) => self.links += 1,
            EntryKind::File | EntryKind::Other => self.files += 1,
        }
    }

    fn emit(&mut self, entry: Entry, objects: bool) {
        self.emitted += 1;
        if objects {
            self.entries.push(entry);
        } else {
            self.paths.push(entry.path);
        }
    }

    fn absorb(&mut self, err: WalkError, collect: bool) {
        if collect {
            self.errors.push(err);
        }
    }

    fn finish(self, duration: Duration) -> Results {
        Results {
            paths:   self.paths,
            entries: self.entries,
            stats:   ScanStats::compute(self.files, self.dirs, self.links, duration),
            errors:  self.errors,
        }
    }
}
