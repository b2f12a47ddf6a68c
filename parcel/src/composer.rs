use std::collections::HashSet;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, instrument, warn};

use crate::fs::ROOT_PATH;
use crate::wire::{self, Entry};
use crate::{Bundle, Error, Node, VirtualFileSystem};

/// Turns bundles back into a tree.
pub trait Composer {
    /// Adds the contents of `bundle`. Directories present in more than one
    /// bundle are merged, anything else that already exists is replaced by
    /// the bundle's entry.
    ///
    /// On error nothing has been changed.
    fn compose(&mut self, bundle: &Bundle) -> Result<(), Error>;
}

impl Composer for VirtualFileSystem {
    #[instrument(skip_all, fields(bundle.name = %bundle.name, bundle.length = bundle.length), err)]
    fn compose(&mut self, bundle: &Bundle) -> Result<(), Error> {
        let staged = unpack(bundle)?;

        let overwrites = merge(self.root_mut(), staged, Path::new(""));
        if overwrites > 0 {
            warn!(overwrites, "bundle replaced existing entries");
        }
        self.record_overwrites(overwrites);

        debug!(entries = self.count(), "composed bundle");
        Ok(())
    }
}

/// Decompresses and decodes `bundle` into a fresh tree.
pub fn unpack(bundle: &Bundle) -> Result<Node, Error> {
    let raw = zstd::decode_all(bundle.body.as_ref()).map_err(|e| Error::corrupt(&bundle.name, e))?;
    let entries = wire::decode(Bytes::from(raw)).map_err(|e| Error::corrupt(&bundle.name, e))?;

    if entries.len() as u64 != bundle.length {
        return Err(Error::corrupt(
            &bundle.name,
            format!(
                "declared {} entries, found {}",
                bundle.length,
                entries.len()
            ),
        ));
    }

    let mut root = Node::root();
    let mut seen = HashSet::new();
    for entry in entries {
        let path = match &entry {
            Entry::Directory { path } | Entry::File { path, .. } => path,
        };
        if !seen.insert(path.clone()) {
            return Err(Error::corrupt(
                &bundle.name,
                format!("duplicate entry {path:?}"),
            ));
        }

        insert(&mut root, entry).map_err(|reason| Error::corrupt(&bundle.name, reason))?;
    }

    Ok(root)
}

/// Splits a bundle path into its components. The root is the empty list.
fn components(path: &str) -> Result<Vec<&str>, String> {
    if path == ROOT_PATH {
        return Ok(vec![]);
    }

    let parts: Vec<&str> = path.split('/').collect();
    if parts.iter().any(|p| p.is_empty() || *p == "." || *p == "..") {
        return Err(format!("invalid entry path {path:?}"));
    }
    Ok(parts)
}

/// Walks down `names` from `root`, creating directories that don't exist
/// yet.
fn ensure_dir<'a>(root: &'a mut Node, names: &[&str], path: &str) -> Result<&'a mut Node, String> {
    let mut node = root;
    for name in names {
        if node.child(name).is_none() {
            node.add(Node::directory(*name))
                .map_err(|_| format!("{path:?} is below a file"))?;
        }

        node = match node.child_mut(name) {
            Some(child) if child.is_dir() => child,
            _ => return Err(format!("{path:?} is below a file")),
        };
    }
    Ok(node)
}

fn insert(root: &mut Node, entry: Entry) -> Result<(), String> {
    match entry {
        Entry::Directory { path } => {
            ensure_dir(root, &components(&path)?, &path)?;
        }
        Entry::File { path, content } => {
            let names = components(&path)?;
            let Some((name, parents)) = names.split_last() else {
                return Err("root entry must be a directory".to_owned());
            };
            let parent = ensure_dir(root, parents, &path)?;

            match parent.add(Node::file(*name, content)) {
                Ok(None) => {}
                Ok(Some(_)) => return Err(format!("duplicate entry {path:?}")),
                Err(_) => return Err(format!("{path:?} is below a file")),
            }
        }
    }

    Ok(())
}

/// Moves the children of `src` into `dst`, returning how many existing
/// entries were replaced.
fn merge(dst: &mut Node, mut src: Node, path: &Path) -> usize {
    let mut overwrites = 0;

    for child in src.take_children() {
        let child_path: PathBuf = path.join(child.name());

        if child.is_dir() {
            if let Some(existing) = dst.child_mut(child.name()) {
                if existing.is_dir() {
                    overwrites += merge(existing, child, &child_path);
                    continue;
                }
            }
        }

        if let Ok(Some(replaced)) = dst.add(child) {
            warn!(
                path = %child_path.display(),
                was_dir = replaced.is_dir(),
                "overwriting entry from an earlier bundle"
            );
            overwrites += 1;
        }
    }

    overwrites
}
