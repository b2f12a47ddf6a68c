use std::io::Write;
use std::path::{Path, PathBuf};

use parcel::{BundleCompressor, CompressorConfig, RealFileSystem};
use tracing::{info, instrument};

pub mod args;
mod errors;
mod resource;

pub use args::Args;
pub use errors::Error;
pub use resource::Resource;

/// Name of the generated module file inside the bundle directory.
pub const RESOURCE_FILE: &str = "resource.rs";

/// Bundles `args.dir` and writes the resource module into
/// `args.bundle_dir`, announcing every compressed file on `out` unless
/// `args.quiet` is set.
///
/// Returns the path of the written module, or `None` if there were no files
/// to bundle, in which case nothing is written.
#[instrument(skip_all, fields(dir = %args.dir.display()), err)]
pub fn run(args: &Args, out: &mut dyn Write) -> Result<Option<PathBuf>, Error> {
    let source = canonical(&args.dir)?;

    let mut config = CompressorConfig::new(base_name(&source)?)
        .recursive(args.recursive)
        .level(args.level);
    for pattern in &args.ignore {
        config = config.ignore(pattern.clone());
    }

    let mut files = 0;
    let mut written = Ok(());
    let bundle = BundleCompressor::new(config).compress_with(
        &RealFileSystem::new(&source),
        &mut |path| {
            files += 1;
            if !args.quiet && written.is_ok() {
                written = writeln!(out, "Compressing '{}'", path.display());
            }
        },
    )?;
    written.map_err(Error::Output)?;

    if files == 0 {
        info!("no files to bundle");
        return Ok(None);
    }

    std::fs::create_dir_all(&args.bundle_dir)
        .map_err(|e| Error::io("create", &args.bundle_dir, e))?;
    let module = base_name(&canonical(&args.bundle_dir)?)?;

    let target = args.bundle_dir.join(RESOURCE_FILE);
    let code = Resource::new(&bundle, &module)
        .include_docs(args.include_docs)
        .to_string();
    std::fs::write(&target, code).map_err(|e| Error::io("write", &target, e))?;

    info!(path = %target.display(), files, "wrote resource");
    Ok(Some(target))
}

fn canonical(path: &Path) -> Result<PathBuf, Error> {
    path.canonicalize()
        .map_err(|e| Error::io("resolve", path, e))
}

fn base_name(path: &Path) -> Result<String, Error> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
        .ok_or_else(|| Error::Unnamed(path.to_owned()))
}
