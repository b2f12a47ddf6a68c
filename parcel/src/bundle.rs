use bytes::Bytes;

/// A compressed directory tree, as produced by a [crate::Compressor] and
/// consumed by a [crate::Composer].
///
/// The body format is private to those two. `length` is the number of
/// entries (directories and files, the root included) encoded in the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub name: String,
    pub length: u64,
    pub body: Bytes,
}

impl Bundle {
    pub fn new(name: impl Into<String>, length: u64, body: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            length,
            body: body.into(),
        }
    }
}
