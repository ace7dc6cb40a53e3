use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::gitignore::GitignoreBuilder;

use crate::engine::{WalkConfig, Walker};
use crate::entry::Entry;
use crate::error::WalkError;
use crate::provider::FsProvider;
use crate::results::Results;
use crate::traits::{Decision, Filter, Hook, HookError, Provider};

// ---------------------------------------------------------------------------
// WalkBuilder
// ---------------------------------------------------------------------------

/// Entry point for configuring and executing a walk.
///
/// Created via [`treewalk::walk()`](crate::walk). Configure with chained
/// builder methods, then call [`build()`](WalkBuilder::build) for a reusable
/// [`Walker`] or [`run()`](WalkBuilder::run) to walk once.
///
/// # Example
///
/// ```rust,no_run
/// let results = treewalk::walk()
///     .root("docs")
///     .recursive(true)
///     .ignore(["node_modules", ".DS_Store"])
///     .filter(|e| e.is_file() && e.extension() == Some("md"))
///     .run()?;
/// # Ok::<(), treewalk::WalkError>(())
/// ```
pub struct WalkBuilder {
    roots:          Vec<PathBuf>,
    provider:       Option<Arc<dyn Provider>>,
    depth:          Option<usize>,
    recursive:      bool,
    objects:        bool,
    nodir:          bool,
    symlinks:       bool,
    follow:         bool,
    realpath:       bool,
    unique:         bool,
    relative:       bool,
    base:           Option<PathBuf>,
    ignore:         Vec<String>,
    filter:         Option<Arc<dyn Filter>>,
    on_file:        Option<Arc<dyn Hook>>,
    on_directory:   Option<Arc<dyn Hook>>,
    include_root:   bool,
    limit:          Option<usize>,
    collect_errors: bool,
}

impl Default for WalkBuilder {
    fn default() -> Self {
        Self {
            roots:          Vec::new(),
            provider:       None,
            depth:          None,
            recursive:      false,
            objects:        false,
            nodir:          false,
            symlinks:       true,
            follow:         false,
            realpath:       false,
            unique:         false,
            relative:       false,
            base:           None,
            ignore:         Vec::new(),
            filter:         None,
            on_file:        None,
            on_directory:   None,
            include_root:   false,
            limit:          None,
            collect_errors: false,
        }
    }
}

impl WalkBuilder {
    // ── Roots & provider ──────────────────────────────────────────────────

    /// Add a root directory. Roots are walked in the order they are added.
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.roots.push(path.into());
        self
    }

    /// Add several root directories.
    pub fn roots<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.roots.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Read from `provider` instead of the real filesystem.
    ///
    /// Relative roots and bases are made absolute against the process's
    /// current directory, so non-disk providers should be given absolute paths.
    pub fn provider(mut self, provider: impl Provider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    // ── Depth ─────────────────────────────────────────────────────────────

    /// Maximum depth. `1` (the default) lists a root's children only.
    /// Ignored when [`recursive`](WalkBuilder::recursive) is set.
    pub fn depth(mut self, n: usize) -> Self {
        self.depth = Some(n);
        self
    }

    /// Walk to unbounded depth. Takes precedence over [`depth`](WalkBuilder::depth).
    pub fn recursive(mut self, yes: bool) -> Self {
        self.recursive = yes;
        self
    }

    // ── Output ────────────────────────────────────────────────────────────

    /// Emit [`Entry`] values into [`Results::entries`] instead of path strings.
    pub fn objects(mut self, yes: bool) -> Self {
        self.objects = yes;
        self
    }

    /// Leave directories (and symlinks to directories) out of the output.
    /// They are still descended into.
    pub fn nodir(mut self, yes: bool) -> Self {
        self.nodir = yes;
        self
    }

    /// Emit paths relative to [`base`](WalkBuilder::base) rather than the root.
    pub fn relative(mut self, yes: bool) -> Self {
        self.relative = yes;
        self
    }

    /// Directory that `relative` output is computed against. Defaults to each root.
    pub fn base(mut self, path: impl Into<PathBuf>) -> Self {
        self.base = Some(path.into());
        self
    }

    /// Also emit each root's own entry, ahead of its children.
    pub fn include_root(mut self, yes: bool) -> Self {
        self.include_root = yes;
        self
    }

    /// Stop after `n` values have been emitted.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Collect non-fatal errors into [`Results::errors`].
    ///
    /// Disabled by default. When enabled, absorbed failures below a root
    /// (unreadable directories, vanished entries, dangling links, symlink
    /// loops) are stored rather than silently skipped.
    pub fn collect_errors(mut self, yes: bool) -> Self {
        self.collect_errors = yes;
        self
    }

    // ── Symlinks & real paths ─────────────────────────────────────────────

    /// Include symlinks sitting directly under a root. Enabled by default;
    /// when disabled they are neither emitted nor descended into.
    pub fn symlinks(mut self, yes: bool) -> Self {
        self.symlinks = yes;
        self
    }

    /// Descend into symlinked directories at any depth. Implies `symlinks`.
    ///
    /// A link back to a directory already on the current route is listed
    /// but not descended into.
    pub fn follow(mut self, yes: bool) -> Self {
        self.follow = yes;
        self
    }

    /// Emit canonical paths with every symlink resolved. Entries whose real
    /// path cannot be resolved are dropped.
    pub fn realpath(mut self, yes: bool) -> Self {
        self.realpath = yes;
        self
    }

    /// Emit each real path at most once, first route wins. Implies `realpath`.
    pub fn unique(mut self, yes: bool) -> Self {
        self.unique = yes;
        self
    }

    // ── Filters & hooks ───────────────────────────────────────────────────

    /// Never emit entries whose base name matches one of `patterns`.
    ///
    /// Every pattern excludes the base name it spells out literally, even
    /// when it contains `#`, `!`, `[` or `\`. Patterns containing `*` or `?`
    /// additionally match as gitignore-style globs, so `*.log` matches by
    /// extension. Matching directories are still descended into.
    pub fn ignore<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Shorthand for a plain predicate filter.
    ///
    /// Equivalent to `.with_filter()` with a [`Filter`] that never fails.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Entry) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(PredicateFilter(predicate)));
        self
    }

    /// Set a custom filter. Errors it returns abort the walk.
    pub fn with_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Call `hook` for every file-like entry before it is emitted.
    pub fn on_file<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Entry, &mut Decision) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.on_file = Some(Arc::new(FnHook(hook)));
        self
    }

    /// Call `hook` for every directory-like entry before it is emitted and
    /// before the walk decides whether to descend into it.
    pub fn on_directory<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Entry, &mut Decision) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.on_directory = Some(Arc::new(FnHook(hook)));
        self
    }

    /// Set a custom file hook. The trait-object form of [`on_file`](WalkBuilder::on_file).
    pub fn with_file_hook(mut self, hook: impl Hook + 'static) -> Self {
        self.on_file = Some(Arc::new(hook));
        self
    }

    /// Set a custom directory hook. The trait-object form of
    /// [`on_directory`](WalkBuilder::on_directory).
    pub fn with_directory_hook(mut self, hook: impl Hook + 'static) -> Self {
        self.on_directory = Some(Arc::new(hook));
        self
    }

    // ── Execute ───────────────────────────────────────────────────────────

    /// Validate the options and produce a reusable [`Walker`].
    ///
    /// # Errors
    ///
    /// Returns `Err` when no root was given, `depth` is 0, an ignore pattern
    /// does not parse, or the current directory is needed and unavailable.
    pub fn build(self) -> Result<Walker, WalkError> {
        if self.roots.is_empty() {
            return Err(WalkError::NoRoots);
        }

        let max_depth = if self.recursive {
            None
        } else {
            match self.depth {
                Some(0) => return Err(WalkError::InvalidDepth(0)),
                Some(n) => Some(n),
                None => Some(1),
            }
        };

        let roots = self
            .roots
            .iter()
            .map(|r| absolutize(r))
            .collect::<Result<Vec<_>, _>>()?;

        let base = match (self.relative, &self.base) {
            (true, Some(base)) => Some(absolutize(base)?),
            _ => None,
        };

        let ignore_names: HashSet<String> = self.ignore.iter().cloned().collect();

        let globs: Vec<&String> = self.ignore.iter().filter(|p| is_glob(p)).collect();
        let ignore_globs = if globs.is_empty() {
            None
        } else {
            let mut gi = GitignoreBuilder::new("");
            for pattern in globs {
                // A leading `#` or `!` would turn the line into a comment or a negation.
                let line = if pattern.starts_with(['#', '!']) {
                    format!("\\{pattern}")
                } else {
                    pattern.clone()
                };
                gi.add_line(None, &line)
                    .map_err(|e| WalkError::InvalidPattern(format!("{pattern}: {e}")))?;
            }
            let gi = gi
                .build()
                .map_err(|e| WalkError::InvalidPattern(e.to_string()))?;
            Some(gi)
        };

        let provider: Arc<dyn Provider> = match self.provider {
            Some(p) => p,
            None    => Arc::new(FsProvider),
        };

        let config = WalkConfig {
            roots,
            max_depth,
            objects:        self.objects,
            nodir:          self.nodir,
            symlinks:       self.symlinks || self.follow,
            follow:         self.follow,
            realpath:       self.realpath || self.unique,
            unique:         self.unique,
            base,
            ignore_names,
            ignore_globs,
            filter:         self.filter,
            on_file:        self.on_file,
            on_directory:   self.on_directory,
            include_root:   self.include_root,
            limit:          self.limit,
            collect_errors: self.collect_errors,
        };

        Ok(Walker { config, provider })
    }

    /// Build and run in one step.
    ///
    /// # Errors
    ///
    /// Everything [`build()`](WalkBuilder::build) and [`Walker::run()`] can return.
    pub fn run(self) -> Result<Results, WalkError> {
        self.build()?.run()
    }
}

// ---------------------------------------------------------------------------
// Closure adapters
// ---------------------------------------------------------------------------

/// Wraps a plain predicate as an infallible [`Filter`].
struct PredicateFilter<F>(F);

impl<F> Filter for PredicateFilter<F>
where
    F: Fn(&Entry) -> bool + Send + Sync,
{
    fn is_match(&self, entry: &Entry) -> Result<bool, HookError> {
        Ok((self.0)(entry))
    }
}

/// Wraps a closure as a [`Hook`].
struct FnHook<F>(F);

impl<F> Hook for FnHook<F>
where
    F: Fn(&Entry, &mut Decision) -> Result<(), HookError> + Send + Sync,
{
    fn visit(&self, entry: &Entry, decision: &mut Decision) -> Result<(), HookError> {
        (self.0)(entry, decision)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Whether an ignore pattern needs glob matching on top of the literal name.
fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?'])
}

fn absolutize(path: &Path) -> Result<PathBuf, WalkError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|source| WalkError::Root {
            path: path.to_path_buf(),
            source,
        })
}
