use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracing::Level;

/// Embeds a directory tree into a Rust program.
///
/// Compresses the contents of `--dir` into a bundle and writes a
/// `resource.rs` module into `--bundle-dir`, whose `register` function adds
/// the bundle to a `parcel::Registry` at program start.
#[derive(Parser, Clone, Debug)]
pub struct Args {
    /// A global log level to use when printing logs.
    /// It's also possible to set `RUST_LOG` according to
    /// `tracing_subscriber::filter::EnvFilter`, which will always have
    /// priority.
    #[arg(long, default_value_t=Level::WARN)]
    pub log_level: Level,

    /// Directory whose contents get bundled
    #[clap(long, short = 'd', default_value = ".")]
    pub dir: PathBuf,

    /// Directory the generated `resource.rs` is written to. Its name is
    /// used as the module name.
    #[clap(long, short = 'b', default_value = ".")]
    pub bundle_dir: PathBuf,

    /// Descend into subdirectories. Without it, only the files directly
    /// inside `--dir` are bundled.
    #[clap(long, short = 'r')]
    pub recursive: bool,

    /// Glob of files and directories to leave out, matched against the
    /// entry name and its path below `--dir`. May be given more than once.
    #[clap(long, short = 'i')]
    pub ignore: Vec<glob::Pattern>,

    /// Emit documentation comments into the generated module.
    #[clap(long, default_value_t = true, action = ArgAction::Set)]
    pub include_docs: bool,

    /// Don't print the files being compressed.
    #[clap(long, short = 'q')]
    pub quiet: bool,

    /// zstd compression level
    #[clap(long, env = "PARCEL_COMPRESSION_LEVEL", default_value_t = parcel::compressor::DEFAULT_LEVEL)]
    pub level: i32,
}
