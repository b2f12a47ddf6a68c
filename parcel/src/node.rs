//! The in-memory tree a [crate::VirtualFileSystem] is made of.
use std::time::SystemTime;

use bytes::Bytes;

use crate::fs::{FileInfo, ROOT_PATH};

/// Mode reported for every virtual entry. Nodes carry no permission bits,
/// and writes to them never persist, so everything is read-only.
pub const DEFAULT_MODE: u32 = 0o444;

/// A single file or directory of the virtual tree.
///
/// Directories own their children, in the order they were attached. Names
/// are unique among siblings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeKind {
    Directory(Vec<Node>),
    File(Bytes),
}

impl Node {
    /// Creates an empty directory node.
    pub fn directory(name: impl Into<String>) -> Self {
        Node {
            name: name.into(),
            kind: NodeKind::Directory(vec![]),
        }
    }

    /// Creates a file node holding `content`.
    pub fn file(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Node {
            name: name.into(),
            kind: NodeKind::File(content.into()),
        }
    }

    /// The root of every tree, a directory named `.`.
    pub fn root() -> Self {
        Self::directory(ROOT_PATH)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory(_))
    }

    /// File content, [None] for directories.
    pub fn content(&self) -> Option<&Bytes> {
        match &self.kind {
            NodeKind::File(content) => Some(content),
            NodeKind::Directory(_) => None,
        }
    }

    /// Content length for files, zero for directories.
    pub fn size(&self) -> u64 {
        self.content().map(|c| c.len() as u64).unwrap_or_default()
    }

    /// Children in attachment order. Files have none.
    pub fn children(&self) -> impl Iterator<Item = &Node> + '_ {
        let children = match &self.kind {
            NodeKind::Directory(children) => children.as_slice(),
            NodeKind::File(_) => &[][..],
        };
        children.iter()
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children().find(|n| n.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        match &mut self.kind {
            NodeKind::Directory(children) => children.iter_mut().find(|n| n.name == name),
            NodeKind::File(_) => None,
        }
    }

    /// Attaches `node` to this directory.
    ///
    /// A sibling with the same name is replaced in place, keeping its
    /// position, and returned. Adding to a file node hands `node` back
    /// unchanged as the error.
    pub fn add(&mut self, node: Node) -> Result<Option<Node>, Node> {
        let NodeKind::Directory(children) = &mut self.kind else {
            return Err(node);
        };

        match children.iter_mut().find(|n| n.name == node.name) {
            Some(existing) => Ok(Some(std::mem::replace(existing, node))),
            None => {
                children.push(node);
                Ok(None)
            }
        }
    }

    /// Removes all children and returns them, leaving an empty directory.
    pub(crate) fn take_children(&mut self) -> Vec<Node> {
        match &mut self.kind {
            NodeKind::Directory(children) => std::mem::take(children),
            NodeKind::File(_) => vec![],
        }
    }

    /// Number of entries in this subtree, the node itself included.
    pub fn count(&self) -> usize {
        1 + self.children().map(Node::count).sum::<usize>()
    }

    pub fn info(&self) -> FileInfo {
        FileInfo {
            name: self.name.clone(),
            size: self.size(),
            mode: DEFAULT_MODE,
            modified: SystemTime::UNIX_EPOCH,
            is_dir: self.is_dir(),
            is_symlink: false,
        }
    }
}
