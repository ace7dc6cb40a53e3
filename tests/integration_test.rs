use std::fs;
use std::path::Path;

use treewalk::{walk, EntryKind, WalkError};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Create a temporary directory holding the given files.
fn setup_test_dir(files: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for file in files {
        let path = dir.path().join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "temp").unwrap();
    }
    dir
}

/// Filesystem listings are unordered, so compare sorted.
fn sorted(mut paths: Vec<String>) -> Vec<String> {
    paths.sort();
    paths
}

fn strings(paths: &[&str]) -> Vec<String> {
    sorted(paths.iter().map(|p| p.to_string()).collect())
}

/// Everything below `root`, as `/`-joined relative paths, via walkdir.
fn walkdir_paths(root: &Path) -> Vec<String> {
    let paths = walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|e| {
            let e = e.unwrap();
            e.path()
                .strip_prefix(root)
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect();
    sorted(paths)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn reads_one_level_by_default() {
    let dir = setup_test_dir(&["a/a/a", "a/a/b", "a/a/c"]);
    let results = walk().root(dir.path()).run().unwrap();
    assert_eq!(results.paths, ["a"]);
}

#[test]
fn depth_two() {
    let dir = setup_test_dir(&["a/a/a", "a/a/b", "a/a/c"]);
    let results = walk().root(dir.path()).depth(2).run().unwrap();
    assert_eq!(sorted(results.paths), strings(&["a", "a/a"]));
}

#[test]
fn recursive_matches_walkdir() {
    let dir = setup_test_dir(&["a/b/c/d/e", "a/a/b/c/d", "x.txt", "a/y.txt"]);
    let results = walk().root(dir.path()).recursive(true).run().unwrap();
    assert_eq!(sorted(results.paths), walkdir_paths(dir.path()));
}

#[test]
fn recursive_scenario() {
    let dir = setup_test_dir(&["a/b/c/d/e", "a/a/b/c/d"]);
    let results = walk().root(dir.path()).recursive(true).run().unwrap();
    assert_eq!(
        sorted(results.paths),
        strings(&[
            "a", "a/a", "a/a/b", "a/a/b/c", "a/a/b/c/d", "a/b", "a/b/c", "a/b/c/d", "a/b/c/d/e",
        ])
    );
}

#[test]
fn filter_markdown_recursively() {
    let dir = setup_test_dir(&["c.md", "a/a/a/a.md", "a/a/a/c.txt", "a/a/a/b.md", "a/b.txt"]);
    let results = walk()
        .root(dir.path())
        .recursive(true)
        .filter(|e| e.is_file() && e.extension() == Some("md"))
        .run()
        .unwrap();
    assert_eq!(
        sorted(results.paths),
        strings(&["c.md", "a/a/a/a.md", "a/a/a/b.md"])
    );
}

#[test]
fn directories_come_before_their_children() {
    let dir = setup_test_dir(&["a/b/c", "d/e"]);
    let paths = walk().root(dir.path()).recursive(true).run().unwrap().paths;
    for (i, path) in paths.iter().enumerate() {
        if let Some((parent, _)) = path.rsplit_once('/') {
            let parent_at = paths.iter().position(|p| p == parent).unwrap();
            assert!(parent_at < i, "{parent} emitted after {path}");
        }
    }
}

#[test]
fn objects_on_disk() {
    let dir = setup_test_dir(&["sub/file.rs"]);
    let results = walk()
        .root(dir.path())
        .recursive(true)
        .objects(true)
        .run()
        .unwrap();

    let file = results.entries.iter().find(|e| e.name == "file.rs").unwrap();
    assert_eq!(file.kind, EntryKind::File);
    assert_eq!(file.depth, 2);
    assert_eq!(file.path, "sub/file.rs");
    assert_eq!(file.absolute_path, dir.path().join("sub").join("file.rs"));
}

#[test]
fn relative_to_parent_base() {
    let dir = setup_test_dir(&["fixtures/foo.js", "fixtures/bar.js"]);
    let results = walk()
        .root(dir.path().join("fixtures"))
        .relative(true)
        .base(dir.path())
        .run()
        .unwrap();
    assert_eq!(
        sorted(results.paths),
        strings(&["fixtures/bar.js", "fixtures/foo.js"])
    );
}

#[test]
fn missing_root_is_fatal() {
    let dir = setup_test_dir(&[]);
    let err = walk().root(dir.path().join("missing")).run().unwrap_err();
    assert!(matches!(err, WalkError::Root { .. }));
    assert!(err.path().unwrap().ends_with("missing"));
}

#[test]
fn stats_are_populated() {
    let dir = setup_test_dir(&["a/b.txt", "c.txt"]);
    let results = walk().root(dir.path()).recursive(true).run().unwrap();
    assert_eq!(results.stats.files, 2);
    assert_eq!(results.stats.dirs, 2);
}

#[cfg(unix)]
mod symlinks {
    use std::os::unix::fs::symlink;

    use super::*;

    /// `nested/a/a/{a,b,c}` files, `nested/b/a/*` file links to them, and
    /// `symlinks` pointing at `nested`.
    fn nested_fixture() -> tempfile::TempDir {
        let paths = ["nested/a/a/a", "nested/a/a/b", "nested/a/a/c"];
        let links = ["nested/b/a/a", "nested/b/a/b", "nested/b/a/c"];
        let dir = setup_test_dir(&paths);
        let root = dir.path();
        for (path, link) in paths.iter().zip(links) {
            let link = root.join(link);
            fs::create_dir_all(link.parent().unwrap()).unwrap();
            symlink(root.join(path), link).unwrap();
        }
        symlink(root.join("nested"), root.join("symlinks")).unwrap();
        dir
    }

    #[test]
    fn first_level_symlinks_by_default() {
        let dir = nested_fixture();
        let paths = walk().root(dir.path()).recursive(true).run().unwrap().paths;
        assert!(paths.contains(&"nested/a/a/a".to_string()));
        assert!(paths.contains(&"symlinks".to_string()));
        assert!(!paths.iter().any(|p| p.starts_with("symlinks/")));
    }

    #[test]
    fn follow_on_disk() {
        let dir = nested_fixture();
        let paths = walk()
            .root(dir.path())
            .recursive(true)
            .follow(true)
            .run()
            .unwrap()
            .paths;
        for p in ["symlinks/a", "symlinks/b", "symlinks/a/a", "symlinks/a/a/a"] {
            assert!(paths.iter().any(|x| x == p), "missing {p}");
        }
    }

    #[test]
    fn disabled_symlinks_on_disk() {
        let dir = nested_fixture();
        let paths = walk()
            .root(dir.path())
            .recursive(true)
            .symlinks(false)
            .run()
            .unwrap()
            .paths;
        assert!(paths.contains(&"nested/a/a/a".to_string()));
        assert!(!paths.iter().any(|p| p.starts_with("symlinks")));
    }

    #[test]
    fn dangling_links_are_invisible() {
        let dir = setup_test_dir(&["foo.js", "bar.js", "tempfile.js"]);
        let root = dir.path();
        symlink(root.join("tempfile.js"), root.join("link.js")).unwrap();
        fs::remove_file(root.join("tempfile.js")).unwrap();
        fs::create_dir_all(root.join("tempdir/a/b/c")).unwrap();
        symlink(root.join("tempdir/a/b/c"), root.join("link")).unwrap();
        fs::remove_dir_all(root.join("tempdir")).unwrap();

        for follow in [false, true] {
            let paths = walk()
                .root(root)
                .symlinks(true)
                .follow(follow)
                .run()
                .unwrap()
                .paths;
            assert_eq!(sorted(paths), strings(&["bar.js", "foo.js"]));
        }
    }

    #[test]
    fn realpath_and_unique_on_disk() {
        let paths = ["a/a/a", "a/a/b", "a/a/c"];
        let links = ["b/a/a", "b/a/b", "b/a/c"];
        let dir = setup_test_dir(&paths);
        let root = dir.path();
        for (path, link) in paths.iter().zip(links) {
            let link = root.join(link);
            fs::create_dir_all(link.parent().unwrap()).unwrap();
            symlink(root.join(path), link).unwrap();
        }

        let all = walk().root(root).recursive(true).realpath(true).run().unwrap();
        let mut expected = vec!["a", "b", "a/a", "b/a"];
        expected.extend(paths);
        expected.extend(paths);
        assert_eq!(sorted(all.paths), strings(&expected));

        let once = walk()
            .root(root)
            .recursive(true)
            .realpath(true)
            .unique(true)
            .run()
            .unwrap();
        let mut expected = vec!["a", "b", "a/a", "b/a"];
        expected.extend(paths);
        assert_eq!(sorted(once.paths), strings(&expected));
    }

    #[test]
    fn follow_terminates_on_loops() {
        let dir = setup_test_dir(&["d/f"]);
        let root = dir.path();
        symlink(root, root.join("d/up")).unwrap();

        let results = walk()
            .root(root)
            .recursive(true)
            .follow(true)
            .collect_errors(true)
            .run()
            .unwrap();
        assert_eq!(sorted(results.paths), strings(&["d", "d/f", "d/up"]));
        assert!(matches!(results.errors.as_slice(), [WalkError::SymlinkLoop(_)]));
    }
}
