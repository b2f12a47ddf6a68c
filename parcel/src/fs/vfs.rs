use std::path::{Component, Path, PathBuf};

use tracing::instrument;

use super::{display_path, relative, File, FileSystem, OpenFlags, Visit, WalkFn};
use crate::{Buffer, Error, Node};

/// A [FileSystem] over an in-memory [Node] tree, usually composed from one
/// or more bundles (see [crate::Composer]).
///
/// Files can be opened with write flags, but writes only ever reach the
/// returned handle, never the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualFileSystem {
    root: Node,
    overwrites: usize,
}

impl Default for VirtualFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualFileSystem {
    /// Creates a file system holding only an empty root directory.
    pub fn new() -> Self {
        Self::with_root(Node::root())
    }

    /// Creates a file system over an existing tree. `root` must be a
    /// directory.
    pub fn with_root(root: Node) -> Self {
        debug_assert!(root.is_dir(), "root node must be a directory");
        Self {
            root,
            overwrites: 0,
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    /// Number of entries in the tree, the root included.
    pub fn count(&self) -> usize {
        self.root.count()
    }

    /// How many entries were replaced by later bundles while composing.
    pub fn overwrites(&self) -> usize {
        self.overwrites
    }

    pub(crate) fn record_overwrites(&mut self, n: usize) {
        self.overwrites += n;
    }

    /// Looks up the node at `path`, following it component by component
    /// from the root.
    pub fn lookup(&self, path: &Path) -> Result<&Node, Error> {
        let mut node = &self.root;
        let mut seen = PathBuf::new();

        for component in relative(path)?.components() {
            let Component::Normal(name) = component else {
                continue;
            };
            if !node.is_dir() {
                return Err(Error::NotADirectory(seen));
            }
            seen.push(name);

            node = name
                .to_str()
                .and_then(|name| node.child(name))
                .ok_or_else(|| Error::NotFound(seen.clone()))?;
        }

        Ok(node)
    }
}

fn walk_node(node: &Node, path: &Path, visit: &mut WalkFn) -> Result<(), Error> {
    let next = visit(&display_path(path), Ok(&node.info()))?;

    if node.is_dir() && next == Visit::Continue {
        for child in node.children() {
            walk_node(child, &path.join(child.name()), visit)?;
        }
    }

    Ok(())
}

impl FileSystem for VirtualFileSystem {
    /// Pre-order, depth-first traversal in the order children were attached.
    #[instrument(skip(self, visit), err)]
    fn walk(&self, root: &Path, visit: &mut WalkFn) -> Result<(), Error> {
        let node = self.lookup(root)?;
        walk_node(node, Path::new(""), visit)
    }

    #[instrument(skip(self), err)]
    fn open_file(
        &self,
        name: &Path,
        flags: OpenFlags,
        _mode: u32,
    ) -> Result<Box<dyn File>, Error> {
        let node = self.lookup(name)?;

        let Some(content) = node.content() else {
            return Err(Error::IsADirectory(name.to_owned()));
        };

        if flags.contains(OpenFlags::TRUNCATE) {
            return Ok(Box::new(Buffer::new()));
        }

        Ok(Box::new(Buffer::with_content(content)))
    }
}
