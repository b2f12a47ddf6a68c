//! Uncompressed body encoding shared by the compressor and the composer.
//!
//! A body is [TOK_MAGIC] followed by entries in walk order, terminated by
//! [TAG_END]. Each entry is a one byte tag, the `/`-separated path relative
//! to the bundled root (`.` for the root itself) and, for files, the
//! content. Paths and contents are prefixed with their length as a little
//! endian u64.
use bytes::{Buf, BufMut, Bytes};

pub const TOK_MAGIC: [u8; 16] = *b"parcel-bundle-1\0";

pub const TAG_END: u8 = 0;
pub const TAG_DIR: u8 = 1;
pub const TAG_FILE: u8 = 2;

pub const MAX_PATH_LEN: usize = 4096;

/// A single decoded entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Directory { path: String },
    File { path: String, content: Bytes },
}

/// Appends entries to an in-memory body.
pub struct Writer {
    buf: Vec<u8>,
    entries: u64,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    pub fn new() -> Self {
        let mut buf = Vec::new();
        buf.put_slice(&TOK_MAGIC);
        Self { buf, entries: 0 }
    }

    fn path(&mut self, path: &str) {
        debug_assert!(path.len() <= MAX_PATH_LEN, "path.len() > {MAX_PATH_LEN}");
        debug_assert!(!path.is_empty(), "empty path");

        self.buf.put_u64_le(path.len() as u64);
        self.buf.put_slice(path.as_bytes());
    }

    pub fn directory(&mut self, path: &str) {
        self.buf.put_u8(TAG_DIR);
        self.path(path);
        self.entries += 1;
    }

    pub fn file(&mut self, path: &str, content: &[u8]) {
        self.buf.put_u8(TAG_FILE);
        self.path(path);
        self.buf.put_u64_le(content.len() as u64);
        self.buf.put_slice(content);
        self.entries += 1;
    }

    /// Number of entries written so far.
    pub fn entries(&self) -> u64 {
        self.entries
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.buf.put_u8(TAG_END);
        self.buf
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("missing bundle header")]
    MissingMagic,

    #[error("unexpected end of data")]
    UnexpectedEof,

    #[error("unknown entry tag {0}")]
    UnknownTag(u8),

    #[error("path length {0} exceeds maximum")]
    PathTooLong(u64),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("{0} trailing bytes after end of entries")]
    TrailingData(usize),
}

/// Decodes a complete body into its entries.
pub fn decode(mut data: Bytes) -> Result<Vec<Entry>, DecodeError> {
    if data.remaining() < TOK_MAGIC.len() || data[..TOK_MAGIC.len()] != TOK_MAGIC {
        return Err(DecodeError::MissingMagic);
    }
    data.advance(TOK_MAGIC.len());

    let mut entries = vec![];
    loop {
        if !data.has_remaining() {
            return Err(DecodeError::UnexpectedEof);
        }

        let entry = match data.get_u8() {
            TAG_END => break,
            TAG_DIR => Entry::Directory {
                path: read_path(&mut data)?,
            },
            TAG_FILE => {
                let path = read_path(&mut data)?;
                let len = read_len(&mut data)?;
                Entry::File {
                    path,
                    content: data.split_to(len),
                }
            }
            tag => return Err(DecodeError::UnknownTag(tag)),
        };
        entries.push(entry);
    }

    if data.has_remaining() {
        return Err(DecodeError::TrailingData(data.remaining()));
    }

    Ok(entries)
}

/// Reads a length prefix and makes sure that many bytes follow.
fn read_len(data: &mut Bytes) -> Result<usize, DecodeError> {
    if data.remaining() < 8 {
        return Err(DecodeError::UnexpectedEof);
    }
    let len = data.get_u64_le();
    match usize::try_from(len) {
        Ok(len) if len <= data.remaining() => Ok(len),
        _ => Err(DecodeError::UnexpectedEof),
    }
}

fn read_path(data: &mut Bytes) -> Result<String, DecodeError> {
    if data.remaining() >= 8 {
        let len = u64::from_le_bytes(data[..8].try_into().expect("checked length"));
        if len > MAX_PATH_LEN as u64 {
            return Err(DecodeError::PathTooLong(len));
        }
    }

    let len = read_len(data)?;
    let raw = data.split_to(len);
    let path = std::str::from_utf8(&raw)
        .map_err(|_| DecodeError::InvalidPath(String::from_utf8_lossy(&raw).into_owned()))?;

    if path.is_empty() || path.contains('\0') {
        return Err(DecodeError::InvalidPath(path.to_owned()));
    }

    Ok(path.to_owned())
}
