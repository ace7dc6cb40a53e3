use std::collections::HashMap;
use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use crate::traits::{FileStat, Provider};

/// Maximum number of symlinks followed while resolving one path.
const MAX_LINK_HOPS: usize = 40;

#[derive(Debug, Clone)]
enum Node {
    File,
    Dir {
        children: Vec<OsString>,
        readable: bool,
    },
    Symlink(PathBuf),
}

/// An in-memory filesystem with directories, files and symlinks.
///
/// Listings are returned in insertion order, which makes walks over a
/// `MemoryProvider` fully deterministic. Paths are absolute and `/`-rooted;
/// relative paths passed to the mutators are taken relative to `/`.
///
/// The tree can be changed while a walker holds it, so vanishing entries
/// and dangling links are easy to set up.
///
/// # Example
///
/// ```rust
/// use treewalk::MemoryProvider;
///
/// let fs = MemoryProvider::new();
/// fs.create_file("/docs/a.md").unwrap();
/// fs.symlink("/docs", "/link").unwrap();
///
/// let paths = treewalk::walk()
///     .provider(fs)
///     .root("/")
///     .recursive(true)
///     .run()
///     .unwrap()
///     .paths;
///
/// assert_eq!(paths, ["docs", "docs/a.md", "link"]);
/// ```
#[derive(Debug)]
pub struct MemoryProvider {
    nodes: RwLock<HashMap<PathBuf, Node>>,
}

impl Default for MemoryProvider {
    fn default() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            PathBuf::from("/"),
            Node::Dir {
                children: Vec::new(),
                readable: true,
            },
        );
        Self {
            nodes: RwLock::new(nodes),
        }
    }
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory and any missing parents.
    pub fn create_dir_all(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = normalize(path.as_ref());
        let mut nodes = self.write()?;
        ensure_dir(&mut nodes, &path)
    }

    /// Create an empty file, creating missing parent directories.
    pub fn create_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        self.insert(path.as_ref(), Node::File)
    }

    /// Create a symlink at `link` pointing at `target`.
    ///
    /// Relative targets are resolved against the link's parent directory, as
    /// on a real filesystem. The target does not need to exist.
    pub fn symlink(&self, target: impl AsRef<Path>, link: impl AsRef<Path>) -> io::Result<()> {
        self.insert(link.as_ref(), Node::Symlink(target.as_ref().to_path_buf()))
    }

    /// Remove a node and everything below it. Links pointing at it dangle.
    pub fn remove(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = normalize(path.as_ref());
        let mut nodes = self.write()?;
        if nodes.remove(&path).is_none() {
            return Err(not_found(&path));
        }
        nodes.retain(|key, _| !key.starts_with(&path));
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            if let Some(Node::Dir { children, .. }) = nodes.get_mut(parent) {
                children.retain(|child| child != name);
            }
        }
        Ok(())
    }

    /// Make listing a directory fail with `PermissionDenied`.
    pub fn set_readable(&self, path: impl AsRef<Path>, yes: bool) -> io::Result<()> {
        let path = normalize(path.as_ref());
        let mut nodes = self.write()?;
        match nodes.get_mut(&path) {
            Some(Node::Dir { readable, .. }) => {
                *readable = yes;
                Ok(())
            }
            Some(_) => Err(not_a_directory(&path)),
            None => Err(not_found(&path)),
        }
    }

    fn insert(&self, path: &Path, node: Node) -> io::Result<()> {
        let path = normalize(path);
        let (parent, name) = match (path.parent(), path.file_name()) {
            (Some(parent), Some(name)) => (parent.to_path_buf(), name.to_os_string()),
            _ => return Err(io::Error::new(io::ErrorKind::AlreadyExists, "cannot replace /")),
        };

        let mut nodes = self.write()?;
        if nodes.contains_key(&path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", path.display()),
            ));
        }
        ensure_dir(&mut nodes, &parent)?;
        if let Some(Node::Dir { children, .. }) = nodes.get_mut(&parent) {
            children.push(name);
        }
        nodes.insert(path, node);
        Ok(())
    }

    /// Walk `path` component by component, following symlinks on the way.
    /// The final component is followed only when `follow_last` is set.
    /// Returns the physical key of the node the path names.
    fn resolve(
        &self,
        nodes: &HashMap<PathBuf, Node>,
        path: &Path,
        follow_last: bool,
        hops: &mut usize,
    ) -> io::Result<PathBuf> {
        let components: Vec<Component<'_>> = path.components().collect();
        let last = components.len().saturating_sub(1);
        let mut current = PathBuf::from("/");

        for (i, component) in components.iter().enumerate() {
            let name = match component {
                Component::Normal(name) => name,
                Component::ParentDir => {
                    current.pop();
                    continue;
                }
                _ => continue,
            };

            let next = current.join(name);
            match nodes.get(&next) {
                None => return Err(not_found(&next)),
                Some(Node::Symlink(target)) if i < last || follow_last => {
                    *hops += 1;
                    if *hops > MAX_LINK_HOPS {
                        return Err(io::Error::new(
                            io::ErrorKind::Other,
                            format!("too many levels of symbolic links: {}", next.display()),
                        ));
                    }
                    // `join` replaces `current` outright when the target is absolute.
                    let target = current.join(target);
                    current = self.resolve(nodes, &target, true, hops)?;
                }
                Some(Node::File) if i < last => return Err(not_a_directory(&next)),
                Some(_) => current = next,
            }
        }

        Ok(current)
    }

    fn lookup(&self, path: &Path, follow_last: bool) -> io::Result<(PathBuf, Node)> {
        let nodes = self.read()?;
        let key = self.resolve(&nodes, &absolute(path), follow_last, &mut 0)?;
        match nodes.get(&key) {
            Some(node) => Ok((key, node.clone())),
            None => Err(not_found(&key)),
        }
    }

    fn read(&self) -> io::Result<std::sync::RwLockReadGuard<'_, HashMap<PathBuf, Node>>> {
        self.nodes
            .read()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory provider lock poisoned"))
    }

    fn write(&self) -> io::Result<std::sync::RwLockWriteGuard<'_, HashMap<PathBuf, Node>>> {
        self.nodes
            .write()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory provider lock poisoned"))
    }
}

impl Provider for MemoryProvider {
    fn list_entries(&self, dir: &Path) -> io::Result<Vec<OsString>> {
        match self.lookup(dir, true)? {
            (_, Node::Dir { children, readable: true }) => Ok(children),
            (key, Node::Dir { .. }) => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is not readable", key.display()),
            )),
            (key, _) => Err(not_a_directory(&key)),
        }
    }

    fn lstat(&self, path: &Path) -> io::Result<FileStat> {
        self.lookup(path, false).map(|(_, node)| stat_of(&node))
    }

    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        self.lookup(path, true).map(|(_, node)| stat_of(&node))
    }

    fn real_path(&self, path: &Path) -> io::Result<PathBuf> {
        self.lookup(path, true).map(|(key, _)| key)
    }
}

fn stat_of(node: &Node) -> FileStat {
    FileStat {
        is_dir:     matches!(node, Node::Dir { .. }),
        is_file:    matches!(node, Node::File),
        is_symlink: matches!(node, Node::Symlink(_)),
    }
}

/// Create `path` and its missing ancestors as directories.
fn ensure_dir(nodes: &mut HashMap<PathBuf, Node>, path: &Path) -> io::Result<()> {
    let mut current = PathBuf::from("/");
    for component in path.components() {
        let Component::Normal(name) = component else {
            continue;
        };
        let next = current.join(name);
        match nodes.get(&next) {
            Some(Node::Dir { .. }) => {}
            Some(_) => return Err(not_a_directory(&next)),
            None => {
                if let Some(Node::Dir { children, .. }) = nodes.get_mut(&current) {
                    children.push(name.to_os_string());
                }
                nodes.insert(
                    next.clone(),
                    Node::Dir {
                        children: Vec::new(),
                        readable: true,
                    },
                );
            }
        }
        current = next;
    }
    Ok(())
}

/// Lexically normalize to an absolute `/`-rooted path.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::from("/");
    for component in path.components() {
        match component {
            Component::Normal(name) => out.push(name),
            Component::ParentDir => {
                out.pop();
            }
            _ => {}
        }
    }
    out
}

fn absolute(path: &Path) -> PathBuf {
    if path.has_root() {
        path.to_path_buf()
    } else {
        Path::new("/").join(path)
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

fn not_a_directory(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::Other,
        format!("{} is not a directory", path.display()),
    )
}
