//! # treewalk
//!
//! Policy-driven directory tree walker.
//!
//! treewalk enumerates the files and directories under one or more roots,
//! depth-first and pre-order, and returns either `/`-joined path strings or
//! rich [`Entry`] values. What gets walked and what gets emitted is decided by
//! a small set of policies:
//!
//! - **depth** — `depth(n)` bounds the walk, `recursive(true)` removes the bound.
//! - **symlinks** — symlinks are classified by `lstat`, dangling ones are
//!   invisible. Symlinks right under a root are listed by default; symlinked
//!   directories are only descended into with `follow(true)`, which guards
//!   against loops.
//! - **real paths** — `realpath(true)` emits canonical paths, `unique(true)`
//!   emits each of them once.
//! - **hooks** — `on_file`/`on_directory` callbacks can veto inclusion, prune
//!   or force descent, and rename entries while the walk is in progress.
//!
//! All filesystem access goes through a [`Provider`]; [`FsProvider`] reads the
//! real disk and [`MemoryProvider`] an in-memory tree.
//!
//! # Quick Start
//!
//! ```rust
//! use treewalk::MemoryProvider;
//!
//! let fs = MemoryProvider::new();
//! for path in ["/r/c.md", "/r/a/a/a/a.md", "/r/a/a/a/c.txt", "/r/a/a/a/b.md", "/r/a/b.txt"] {
//!     fs.create_file(path).unwrap();
//! }
//!
//! let results = treewalk::walk()
//!     .provider(fs)
//!     .root("/r")
//!     .recursive(true)
//!     .filter(|e| e.is_file() && e.extension() == Some("md"))
//!     .run()
//!     .unwrap();
//!
//! assert_eq!(results.paths, ["c.md", "a/a/a/a.md", "a/a/a/b.md"]);
//! ```
//!
//! # Hooks
//!
//! Hooks receive the entry and a [`Decision`] pre-filled with the walker's
//! defaults. Whatever the hook leaves in the decision is what happens:
//!
//! ```rust
//! use treewalk::MemoryProvider;
//!
//! let fs = MemoryProvider::new();
//! for path in ["/r/a/a/a.txt", "/r/a/b/c/d.txt", "/r/a/b/b/b.txt"] {
//!     fs.create_file(path).unwrap();
//! }
//!
//! let results = treewalk::walk()
//!     .provider(fs)
//!     .root("/r")
//!     .recursive(true)
//!     .on_directory(|dir, decision| {
//!         decision.recurse = dir.name != "b";
//!         decision.keep = false;
//!         Ok(())
//!     })
//!     .run()
//!     .unwrap();
//!
//! assert_eq!(results.paths, ["a/a/a.txt"]);
//! ```

#![forbid(unsafe_code)]

mod builder;
mod classify;
mod engine;
mod entry;
mod error;
mod memory;
mod provider;
mod resolve;
mod results;
mod traits;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use builder::WalkBuilder;
pub use engine::{WalkConfig, Walker};
pub use entry::{Entry, EntryKind, LinkTarget};
pub use error::WalkError;
pub use memory::MemoryProvider;
pub use provider::FsProvider;
pub use results::{Results, ScanStats};
pub use traits::{Decision, FileStat, Filter, Hook, HookError, Provider};

// ── Entry point ───────────────────────────────────────────────────────────────

/// Create a new [`WalkBuilder`] to configure and run a walk.
///
/// # Example
///
/// ```rust
/// use treewalk::MemoryProvider;
///
/// let fs = MemoryProvider::new();
/// fs.create_file("/r/a/a/a").unwrap();
/// fs.create_file("/r/a/a/b").unwrap();
///
/// let results = treewalk::walk()
///     .provider(fs)
///     .root("/r")
///     .depth(2)
///     .run()
///     .unwrap();
///
/// assert_eq!(results.paths, ["a", "a/a"]);
/// ```
pub fn walk() -> WalkBuilder {
    WalkBuilder::default()
}
