use std::fs::{Metadata, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{instrument, warn};
use walkdir::WalkDir;

use super::{display_path, relative, File, FileInfo, FileSystem, OpenFlags, Visit, WalkFn};
use crate::Error;

/// Mode used for files created through [RealFileSystem::open_file] when the
/// caller passes zero.
const DEFAULT_CREATE_MODE: u32 = 0o666;

/// A [FileSystem] backed by a directory on the host.
///
/// All paths are interpreted relative to `root`; paths escaping it via `..`
/// are rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealFileSystem {
    root: PathBuf,
}

impl RealFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileSystem for RealFileSystem {
    /// Walks the host directory using `walkdir`, sorted by file name and
    /// without following symlinks.
    #[instrument(skip(self, visit), fields(fs.root = %self.root.display()), err)]
    fn walk(&self, root: &Path, visit: &mut WalkFn) -> Result<(), Error> {
        let start = self.root.join(relative(root)?);

        let mut iter = WalkDir::new(&start)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = iter.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(|p| display_path(p.strip_prefix(&start).unwrap_or(p)))
                        .unwrap_or_else(|| display_path(Path::new("")));
                    warn!(path = %path.display(), err = %e, "unable to walk entry");
                    visit(&path, Err(walk_error(e)))?;
                    continue;
                }
            };

            let path = display_path(entry.path().strip_prefix(&start).unwrap_or(entry.path()));
            let is_dir = entry.file_type().is_dir();

            let next = match entry.metadata() {
                Ok(metadata) => {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    visit(&path, Ok(&file_info(name, &metadata)))?
                }
                Err(e) => visit(&path, Err(walk_error(e)))?,
            };

            if is_dir && next == Visit::SkipDir {
                iter.skip_current_dir();
            }
        }

        Ok(())
    }

    /// Opens `name` below the root. When writing, missing parent directories
    /// are created first.
    #[instrument(skip(self), fields(fs.root = %self.root.display()), err)]
    fn open_file(
        &self,
        name: &Path,
        flags: OpenFlags,
        mode: u32,
    ) -> Result<Box<dyn File>, Error> {
        let path = self.root.join(relative(name)?);

        if flags.is_write() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| Error::io("mkdir", parent, e))?;
            }
        }

        let file = open_options(flags, mode)
            .open(&path)
            .map_err(|e| Error::io("open", &path, e))?;

        let metadata = file
            .metadata()
            .map_err(|e| Error::io("stat", &path, e))?;
        if metadata.is_dir() {
            return Err(Error::IsADirectory(path));
        }

        Ok(Box::new(file))
    }
}

fn open_options(flags: OpenFlags, mode: u32) -> OpenOptions {
    let append = flags.contains(OpenFlags::APPEND);
    let write = flags.intersects(OpenFlags::WRITE | OpenFlags::READ_WRITE)
        || (!append && flags.intersects(OpenFlags::CREATE | OpenFlags::TRUNCATE));
    let read = flags.contains(OpenFlags::READ_WRITE) || !(write || append);
    let create = flags.contains(OpenFlags::CREATE);
    let exclusive = flags.contains(OpenFlags::EXCLUSIVE);

    let mut options = OpenOptions::new();
    options
        .read(read)
        .write(write)
        .append(append)
        .truncate(flags.contains(OpenFlags::TRUNCATE))
        .create(create && !exclusive)
        .create_new(create && exclusive);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(if mode == 0 { DEFAULT_CREATE_MODE } else { mode });
    }
    #[cfg(not(unix))]
    let _ = mode;

    options
}

fn file_info(name: String, metadata: &Metadata) -> FileInfo {
    #[cfg(unix)]
    let mode = {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode()
    };
    #[cfg(not(unix))]
    let mode = if metadata.permissions().readonly() {
        0o444
    } else {
        DEFAULT_CREATE_MODE
    };

    FileInfo {
        name,
        size: if metadata.is_dir() { 0 } else { metadata.len() },
        mode,
        modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        is_dir: metadata.is_dir(),
        is_symlink: metadata.is_symlink(),
    }
}

/// Converts a walkdir error, keeping the underlying OS error where there is
/// one.
fn walk_error(err: walkdir::Error) -> Error {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    let msg = err.to_string();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other(msg));
    Error::io("lstat", path, source)
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::path::{Path, PathBuf};

    use tempfile::TempDir;

    use super::RealFileSystem;
    use crate::fs::{FileInfo, FileSystem, OpenFlags, Visit};
    use crate::Error;

    fn sample() -> (TempDir, RealFileSystem) {
        let tmpdir = TempDir::new().unwrap();
        std::fs::write(tmpdir.path().join("sample.txt"), "test").unwrap();
        let fs = RealFileSystem::new(tmpdir.path());
        (tmpdir, fs)
    }

    fn collect(fs: &RealFileSystem, root: &str) -> Vec<(PathBuf, bool)> {
        let mut seen = vec![];
        fs.walk(Path::new(root), &mut |path, info| {
            seen.push((path.to_owned(), info?.is_dir));
            Ok(Visit::Continue)
        })
        .expect("walk must succeed");
        seen
    }

    #[test]
    fn open_file() {
        let (_tmpdir, fs) = sample();

        let mut file = fs
            .open_file(Path::new("sample.txt"), OpenFlags::READ_ONLY, 0)
            .expect("must open");
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();

        assert_eq!("test", content);
        file.close().expect("must close");
    }

    #[test]
    fn open_missing_file() {
        let (_tmpdir, fs) = sample();

        let err = fs
            .open_file(Path::new("report.txt"), OpenFlags::READ_ONLY, 0)
            .err()
            .expect("must fail");

        assert_eq!(std::io::ErrorKind::NotFound, err.kind());
        assert!(
            err.to_string().contains("No such file or directory"),
            "unexpected message: {err}"
        );
    }

    #[test]
    fn open_directory() {
        let (tmpdir, fs) = sample();
        std::fs::create_dir(tmpdir.path().join("sub")).unwrap();

        let err = fs
            .open_file(Path::new("sub"), OpenFlags::READ_ONLY, 0)
            .err()
            .expect("must fail");
        assert_eq!(std::io::ErrorKind::IsADirectory, err.kind());
    }

    #[test]
    fn open_for_write_creates_parents() {
        let (tmpdir, fs) = sample();

        let mut file = fs
            .open_file(
                Path::new("nested/dir/out.txt"),
                OpenFlags::CREATE | OpenFlags::WRITE,
                0o600,
            )
            .expect("must open");
        file.write_all(b"written").unwrap();
        file.close().unwrap();

        assert_eq!(
            "written",
            std::fs::read_to_string(tmpdir.path().join("nested/dir/out.txt")).unwrap()
        );
    }

    #[cfg(unix)]
    #[test]
    fn open_for_write_permission_denied() {
        use std::os::unix::fs::PermissionsExt;

        let tmpdir = TempDir::new().unwrap();
        let locked = tmpdir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o500)).unwrap();

        // root ignores directory permissions, nothing to check then.
        if std::fs::create_dir(locked.join("probe")).is_ok() {
            return;
        }

        let fs = RealFileSystem::new(locked.join("hello"));
        let err = fs
            .open_file(
                Path::new("report.txt"),
                OpenFlags::CREATE | OpenFlags::WRITE,
                0,
            )
            .err()
            .expect("must fail");

        assert_eq!(std::io::ErrorKind::PermissionDenied, err.kind());
        let msg = err.to_string();
        assert!(msg.starts_with("mkdir "), "unexpected message: {msg}");
        assert!(msg.contains("Permission denied"), "unexpected message: {msg}");

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o700)).unwrap();
    }

    /// Unlike permissions, a regular file in the way stops `mkdir` for
    /// every user.
    #[cfg(unix)]
    #[test]
    fn open_for_write_below_file() {
        let (tmpdir, _) = sample();
        let fs = RealFileSystem::new(tmpdir.path().join("sample.txt/hello"));

        let err = fs
            .open_file(
                Path::new("report.txt"),
                OpenFlags::CREATE | OpenFlags::WRITE,
                0,
            )
            .err()
            .expect("must fail");

        let msg = err.to_string();
        assert!(msg.starts_with("mkdir "), "unexpected message: {msg}");
        assert!(msg.contains("sample.txt/hello"), "unexpected message: {msg}");
        assert!(msg.contains("Not a directory"), "unexpected message: {msg}");
        assert!(matches!(err, Error::Io { op: "mkdir", .. }));
    }

    #[test]
    fn open_escaping_root() {
        let (_tmpdir, fs) = sample();
        assert!(matches!(
            fs.open_file(Path::new("../etc/passwd"), OpenFlags::READ_ONLY, 0),
            Err(Error::InvalidPath(_))
        ));
    }

    #[test]
    fn walk() {
        let (_tmpdir, fs) = sample();

        for root in [".", "/", ""] {
            assert_eq!(
                vec![
                    (PathBuf::from("."), true),
                    (PathBuf::from("sample.txt"), false)
                ],
                collect(&fs, root)
            );
        }
    }

    #[test]
    fn walk_is_sorted_and_directories_first() {
        let tmpdir = TempDir::new().unwrap();
        std::fs::create_dir_all(tmpdir.path().join("b/inner")).unwrap();
        std::fs::write(tmpdir.path().join("b/inner/z.txt"), "z").unwrap();
        std::fs::write(tmpdir.path().join("c.txt"), "c").unwrap();
        std::fs::write(tmpdir.path().join("a.txt"), "a").unwrap();
        let fs = RealFileSystem::new(tmpdir.path());

        let paths: Vec<_> = collect(&fs, ".").into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            vec![
                PathBuf::from("."),
                PathBuf::from("a.txt"),
                PathBuf::from("b"),
                PathBuf::from("b/inner"),
                PathBuf::from("b/inner/z.txt"),
                PathBuf::from("c.txt"),
            ],
            paths
        );

        // paths are relative to the walked root
        let paths: Vec<_> = collect(&fs, "b").into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            vec![
                PathBuf::from("."),
                PathBuf::from("inner"),
                PathBuf::from("inner/z.txt"),
            ],
            paths
        );
    }

    #[test]
    fn walk_skip_dir() {
        let tmpdir = TempDir::new().unwrap();
        std::fs::create_dir(tmpdir.path().join("skipped")).unwrap();
        std::fs::write(tmpdir.path().join("skipped/hidden.txt"), "h").unwrap();
        std::fs::write(tmpdir.path().join("top.txt"), "t").unwrap();
        let fs = RealFileSystem::new(tmpdir.path());

        let mut seen = vec![];
        fs.walk(Path::new("."), &mut |path, info| {
            seen.push(path.to_owned());
            let info = info?;
            Ok(if info.is_dir && path != Path::new(".") {
                Visit::SkipDir
            } else {
                Visit::Continue
            })
        })
        .unwrap();

        assert_eq!(
            vec![
                PathBuf::from("."),
                PathBuf::from("skipped"),
                PathBuf::from("top.txt")
            ],
            seen
        );
    }

    #[test]
    fn walk_file_info() {
        let (_tmpdir, fs) = sample();

        let mut infos: Vec<FileInfo> = vec![];
        fs.walk(Path::new("."), &mut |_, info| {
            infos.push(info?.clone());
            Ok(Visit::Continue)
        })
        .unwrap();

        let file = &infos[1];
        assert_eq!("sample.txt", file.name);
        assert_eq!(4, file.size);
        assert!(!file.is_dir);
        assert!(!file.is_symlink);
    }

    #[cfg(unix)]
    #[test]
    fn walk_reports_symlinks_unfollowed() {
        let (tmpdir, fs) = sample();
        std::fs::create_dir(tmpdir.path().join("dir")).unwrap();
        std::fs::write(tmpdir.path().join("dir/inner.txt"), "inner").unwrap();
        std::os::unix::fs::symlink("dir", tmpdir.path().join("link")).unwrap();

        let mut seen = vec![];
        fs.walk(Path::new("."), &mut |path, info| {
            let info = info?;
            seen.push((path.to_owned(), info.is_dir, info.is_symlink));
            Ok(Visit::Continue)
        })
        .unwrap();

        assert!(seen.contains(&(PathBuf::from("link"), false, true)));
        assert!(!seen.iter().any(|(p, _, _)| p == Path::new("link/inner.txt")));
    }

    /// An error returned by the callback comes back unchanged, even when the
    /// walked root doesn't exist.
    #[test]
    fn walk_failure() {
        let (_tmpdir, fs) = sample();

        let mut calls = 0;
        let err = fs
            .walk(Path::new("/wrong"), &mut |_, info| {
                calls += 1;
                assert!(info.is_err(), "root must not exist");
                Err(Error::visit("Oh no!"))
            })
            .expect_err("must fail");

        assert_eq!(1, calls);
        assert!(matches!(err, Error::Visit(_)));
        assert_eq!("Oh no!", err.to_string());
    }

    #[test]
    fn walk_missing_root_is_reported_once() {
        let (_tmpdir, fs) = sample();

        let mut errors = vec![];
        fs.walk(Path::new("missing"), &mut |_, info| {
            if let Err(e) = info {
                errors.push(e.kind());
            }
            Ok(Visit::Continue)
        })
        .expect("callback swallowed the error");

        assert_eq!(vec![std::io::ErrorKind::NotFound], errors);
    }
}
