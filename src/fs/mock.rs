// src/fs/mock.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, bail, Result};

use super::FileSystem;

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir,
}

type Tree = BTreeMap<PathBuf, Node>;

/// In-memory filesystem for tests.
///
/// A flat map from path to node; a directory's children are the entries
/// whose parent is that directory. Cloning shares the storage, so a test
/// can keep one handle for assertions while the resolved config owns
/// another.
#[derive(Debug, Clone)]
pub struct MockFileSystem {
    tree: Arc<Mutex<Tree>>,
}

impl Default for MockFileSystem {
    fn default() -> Self {
        let mut tree = Tree::new();
        tree.insert(PathBuf::from("/"), Node::Dir);
        tree.insert(PathBuf::from("."), Node::Dir);
        Self {
            tree: Arc::new(Mutex::new(tree)),
        }
    }
}

impl MockFileSystem {
    /// An empty tree containing only `/` and `.`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, creating missing parent directories.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        let mut tree = self.lock();
        if let Some(parent) = path.parent() {
            mkdirs(&mut tree, parent);
        }
        tree.insert(path.to_path_buf(), Node::File(content.into()));
    }

    /// Add an (empty) directory and its parents.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        mkdirs(&mut self.lock(), path.as_ref());
    }

    /// Raw bytes stored at `path`, if it is a file.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.lock().get(path.as_ref()) {
            Some(Node::File(bytes)) => Some(bytes.clone()),
            _ => None,
        }
    }

    /// Every file path currently stored, sorted.
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.lock()
            .iter()
            .filter(|(_, node)| matches!(node, Node::File(_)))
            .map(|(path, _)| path.clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Tree> {
        self.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn mkdirs(tree: &mut Tree, path: &Path) {
    for ancestor in path.ancestors() {
        if ancestor.as_os_str().is_empty() {
            continue;
        }
        tree.entry(ancestor.to_path_buf()).or_insert(Node::Dir);
    }
}

/// Parent directory key, with `.` standing in for a bare relative name.
fn parent_key(path: &Path) -> Option<&Path> {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Some(Path::new(".")),
        other => other,
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        match self.lock().get(path) {
            Some(Node::File(bytes)) => String::from_utf8(bytes.clone())
                .map_err(|err| anyhow!("{} is not UTF-8: {err}", path.display())),
            Some(Node::Dir) => bail!("{} is a directory", path.display()),
            None => bail!("{} does not exist", path.display()),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut tree = self.lock();
        let parent = parent_key(path).ok_or_else(|| anyhow!("{} has no parent", path.display()))?;
        if !matches!(tree.get(parent), Some(Node::Dir)) {
            bail!("parent of {} does not exist", path.display());
        }
        if matches!(tree.get(path), Some(Node::Dir)) {
            bail!("{} is a directory", path.display());
        }
        tree.insert(path.to_path_buf(), Node::File(contents.to_vec()));
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        let bytes = self
            .contents(from)
            .ok_or_else(|| anyhow!("{} does not exist", from.display()))?;
        self.write(to, &bytes)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut tree = self.lock();
        if let Some(file) = path
            .ancestors()
            .find(|a| matches!(tree.get(*a), Some(Node::File(_))))
        {
            bail!("{} is a file", file.display());
        }
        mkdirs(&mut tree, path);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let mut tree = self.lock();
        match tree.get(path) {
            Some(Node::File(_)) => {
                tree.remove(path);
                Ok(())
            }
            Some(Node::Dir) => bail!("{} is a directory", path.display()),
            None => bail!("{} does not exist", path.display()),
        }
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let mut tree = self.lock();
        if !matches!(tree.get(path), Some(Node::Dir)) {
            bail!("{} is not a directory", path.display());
        }
        tree.retain(|p, _| !p.starts_with(path));
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(Node::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(Node::Dir))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        // No symlinks in memory.
        Ok(path.to_path_buf())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let tree = self.lock();
        if !matches!(tree.get(path), Some(Node::Dir)) {
            bail!("{} is not a directory", path.display());
        }
        Ok(tree
            .keys()
            .filter(|p| p.as_path() != path && parent_key(p) == Some(path))
            .cloned()
            .collect())
    }
}
