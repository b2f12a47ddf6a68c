//! The [FileSystem] and [File] capabilities, shared by the host file system
//! ([RealFileSystem]) and the bundle-backed one ([VirtualFileSystem]).
use std::io::{Read, Seek, Write};
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use path_clean::PathClean;

use crate::Error;

mod real;
mod vfs;

pub use real::RealFileSystem;
pub use vfs::VirtualFileSystem;

/// The path handed to walk callbacks for the walked root itself.
pub const ROOT_PATH: &str = ".";

/// Describes an entry visited during [FileSystem::walk].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    /// Length in bytes for regular files, zero for directories.
    pub size: u64,
    pub mode: u32,
    pub modified: SystemTime,
    pub is_dir: bool,
    /// Set for symbolic links, which walks report without following.
    /// `size`, `mode` and `modified` then describe the link itself.
    pub is_symlink: bool,
}

/// What a walk callback wants to happen next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visit {
    #[default]
    Continue,
    /// Don't descend into the directory that was just visited. Has no
    /// effect when returned for a file.
    SkipDir,
}

/// Callback invoked for every entry of a walk.
///
/// It receives the path relative to the walked root (`"."` for the root
/// itself) and either the entry's [FileInfo] or the error encountered while
/// reaching it. Returning an error aborts the walk, and the walk returns that
/// very error.
pub type WalkFn<'a> = dyn FnMut(&Path, Result<&FileInfo, Error>) -> Result<Visit, Error> + 'a;

bitflags::bitflags! {
    /// Flags for [FileSystem::open_file]. The empty set opens read-only.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenFlags: u32 {
        const WRITE = 1 << 0;
        const READ_WRITE = 1 << 1;
        const APPEND = 1 << 2;
        const CREATE = 1 << 3;
        const EXCLUSIVE = 1 << 4;
        const TRUNCATE = 1 << 5;
    }
}

impl OpenFlags {
    pub const READ_ONLY: Self = Self::empty();

    /// Whether any of the flags asks for write access.
    pub fn is_write(&self) -> bool {
        self.intersects(Self::WRITE | Self::READ_WRITE | Self::APPEND | Self::CREATE)
    }
}

/// A handle returned by [FileSystem::open_file].
pub trait File: Read + Write + Seek {
    /// Releases the handle. Any error from flushing is returned.
    fn close(self: Box<Self>) -> std::io::Result<()>;
}

impl File for std::fs::File {
    fn close(mut self: Box<Self>) -> std::io::Result<()> {
        self.flush()
    }
}

/// Primitives to work with a file tree, either on disk or embedded.
pub trait FileSystem {
    /// Walks the file tree rooted at `root`, calling `visit` for each file or
    /// directory in the tree, including `root` itself. Directories are
    /// visited before their contents and the order is stable across calls.
    fn walk(&self, root: &Path, visit: &mut WalkFn) -> Result<(), Error>;

    /// Opens the named file. `mode` is only used when a file gets created.
    fn open_file(&self, name: &Path, flags: OpenFlags, mode: u32)
        -> Result<Box<dyn File>, Error>;
}

/// Turns a caller supplied path into a relative one without `.` and `..`
/// components. `/`, `.` and the empty path all map to the empty path.
/// Paths escaping the root are rejected.
pub(crate) fn relative(path: &Path) -> Result<PathBuf, Error> {
    let mut out = PathBuf::new();
    for component in path.clean().components() {
        match component {
            Component::Normal(c) => out.push(c),
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir | Component::Prefix(_) => {
                return Err(Error::InvalidPath(path.to_owned()))
            }
        }
    }
    Ok(out)
}

/// The inverse of [relative] for callback paths: the empty path is reported
/// as [ROOT_PATH].
pub(crate) fn display_path(rel: &Path) -> PathBuf {
    if rel.as_os_str().is_empty() {
        PathBuf::from(ROOT_PATH)
    } else {
        rel.to_owned()
    }
}
