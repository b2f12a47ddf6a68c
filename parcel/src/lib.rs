//! Bundles directory trees into compressed blobs that can be embedded into
//! a binary, and serves them back as a [VirtualFileSystem].
//!
//! ```no_run
//! use parcel::{BundleCompressor, Compressor, CompressorConfig, RealFileSystem, Registry};
//!
//! let bundle = BundleCompressor::new(CompressorConfig::new("assets"))
//!     .compress(&RealFileSystem::new("./assets"))?;
//!
//! let mut registry = Registry::new();
//! registry.add_resource(bundle)?;
//! let fs = registry.file_system();
//! # Ok::<(), parcel::Error>(())
//! ```
mod buffer;
mod bundle;
mod errors;
mod node;
mod registry;
mod wire;

pub mod composer;
pub mod compressor;
pub mod fs;

pub use buffer::Buffer;
pub use bundle::Bundle;
pub use composer::Composer;
pub use compressor::{BundleCompressor, Compressor, CompressorConfig};
pub use errors::Error;
pub use fs::{File, FileInfo, FileSystem, OpenFlags, RealFileSystem, VirtualFileSystem, Visit};
pub use node::{Node, DEFAULT_MODE};
pub use registry::Registry;
