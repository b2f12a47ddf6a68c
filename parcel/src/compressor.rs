use std::io::Read;
use std::path::{Component, Path};

use tracing::{debug, info, instrument, warn};

use crate::fs::{FileSystem, OpenFlags, Visit, ROOT_PATH};
use crate::wire;
use crate::{Bundle, Error};

/// zstd level used unless configured otherwise.
pub const DEFAULT_LEVEL: i32 = zstd::DEFAULT_COMPRESSION_LEVEL;

/// Turns a whole file tree into a [Bundle].
pub trait Compressor {
    fn compress(&self, fs: &dyn FileSystem) -> Result<Bundle, Error>;
}

/// Options for [BundleCompressor].
#[derive(Debug, Clone)]
pub struct CompressorConfig {
    name: String,
    recursive: bool,
    ignore: Vec<glob::Pattern>,
    level: i32,
}

impl CompressorConfig {
    /// A config producing bundles called `name`, walking the whole tree.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            recursive: true,
            ignore: vec![],
            level: DEFAULT_LEVEL,
        }
    }

    /// When disabled, only the files directly inside the root are bundled.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Skips entries whose name (or path relative to the root) matches
    /// `pattern`. Matching directories are skipped entirely.
    pub fn ignore(mut self, pattern: glob::Pattern) -> Self {
        self.ignore.push(pattern);
        self
    }

    pub fn level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn is_ignored(&self, name: &str, path: &str) -> bool {
        self.ignore
            .iter()
            .any(|p| p.matches(name) || p.matches(path))
    }
}

/// The [Compressor] used for embedding: records every entry, then
/// compresses the encoded tree with zstd in one go.
///
/// The complete tree is held in memory while compressing.
#[derive(Debug, Clone)]
pub struct BundleCompressor {
    config: CompressorConfig,
}

impl BundleCompressor {
    pub fn new(config: CompressorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompressorConfig {
        &self.config
    }

    /// Like [Compressor::compress], calling `on_file` with the path of every
    /// file right before it is read.
    #[instrument(skip_all, fields(bundle.name = %self.config.name, indicatif.pb_show = 1), err)]
    pub fn compress_with(
        &self,
        fs: &dyn FileSystem,
        on_file: &mut dyn FnMut(&Path),
    ) -> Result<Bundle, Error> {
        let mut writer = wire::Writer::new();

        fs.walk(Path::new(ROOT_PATH), &mut |path, info| {
            let info = info?;
            let is_root = path == Path::new(ROOT_PATH);
            let skip = if info.is_dir {
                Visit::SkipDir
            } else {
                Visit::Continue
            };

            let wire_path = match wire_path(path) {
                Ok(wire_path) => wire_path,
                Err(Error::InvalidPath(_)) if !is_root => {
                    warn!(path = %path.display(), "skipping entry whose name is not UTF-8");
                    return Ok(skip);
                }
                Err(e) => return Err(e),
            };

            // Links are neither bundled nor resolved.
            if info.is_symlink {
                warn!(path = %wire_path, "skipping symbolic link");
                return Ok(Visit::Continue);
            }

            if !is_root && self.config.is_ignored(&info.name, &wire_path) {
                debug!(path = %wire_path, "ignoring");
                return Ok(skip);
            }

            if info.is_dir {
                if !is_root && !self.config.recursive {
                    return Ok(Visit::SkipDir);
                }
                debug!(path = %wire_path, "adding directory");
                writer.directory(&wire_path);
                return Ok(Visit::Continue);
            }

            info!("Compressing '{}'", wire_path);
            on_file(path);

            let content = read_file(fs, path)?;
            writer.file(&wire_path, &content);
            Ok(Visit::Continue)
        })?;

        let length = writer.entries();
        let raw = writer.finish();
        let body = zstd::encode_all(raw.as_slice(), self.config.level).map_err(Error::Compression)?;

        debug!(
            entries = length,
            raw = raw.len(),
            compressed = body.len(),
            "compressed bundle"
        );

        Ok(Bundle::new(self.config.name.clone(), length, body))
    }
}

impl Compressor for BundleCompressor {
    fn compress(&self, fs: &dyn FileSystem) -> Result<Bundle, Error> {
        self.compress_with(fs, &mut |_| {})
    }
}

/// Reads the whole file in one pass.
fn read_file(fs: &dyn FileSystem, path: &Path) -> Result<Vec<u8>, Error> {
    let mut file = fs.open_file(path, OpenFlags::READ_ONLY, 0)?;
    let mut content = vec![];
    file.read_to_end(&mut content)
        .map_err(|e| Error::io("read", path, e))?;
    file.close().map_err(|e| Error::io("close", path, e))?;
    Ok(content)
}

/// Converts a walk path into the `/`-separated form stored in bundles.
fn wire_path(path: &Path) -> Result<String, Error> {
    let mut parts = vec![];
    for component in path.components() {
        match component {
            Component::Normal(c) => parts.push(
                c.to_str()
                    .ok_or_else(|| Error::InvalidPath(path.to_owned()))?,
            ),
            Component::CurDir => {}
            _ => return Err(Error::InvalidPath(path.to_owned())),
        }
    }

    if parts.is_empty() {
        return Ok(ROOT_PATH.to_owned());
    }
    Ok(parts.join("/"))
}
