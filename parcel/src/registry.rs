use tracing::{info, instrument};

use crate::{Bundle, Composer, Error, VirtualFileSystem};

/// Collects the bundles embedded into a program.
///
/// Starts out empty, receives one [Registry::add_resource] call per
/// embedded bundle at program start (that's what the code generated by
/// `parcel-cli` does), and is only read from afterwards.
#[derive(Debug, Default)]
pub struct Registry {
    fs: VirtualFileSystem,
    names: Vec<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Composes `bundle` into the registry's file system.
    #[instrument(skip_all, fields(bundle.name = %bundle.name), err)]
    pub fn add_resource(&mut self, bundle: Bundle) -> Result<(), Error> {
        self.fs.compose(&bundle)?;
        info!(entries = bundle.length, "registered bundle");
        self.names.push(bundle.name);
        Ok(())
    }

    /// Names of the registered bundles, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }

    pub fn file_system(&self) -> &VirtualFileSystem {
        &self.fs
    }

    pub fn into_file_system(self) -> VirtualFileSystem {
        self.fs
    }
}
