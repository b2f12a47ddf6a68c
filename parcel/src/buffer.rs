use std::io::{self, Read, Seek, SeekFrom, Write};

use bytes::{Buf, BytesMut};

use crate::fs::File;

/// An in-memory [File] backing the handles handed out by
/// [crate::VirtualFileSystem].
///
/// Reads consume bytes from the front, writes append to the end. Closing is
/// a noop.
///
/// Seeking is intentionally not supported: [Seek::seek] always reports
/// position zero and leaves the cursor where it is. Callers needing random
/// access have to read sequentially from the start.
#[derive(Debug, Default, Clone)]
pub struct Buffer {
    inner: BytesMut,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a buffer whose unread portion is `data`.
    pub fn with_content(data: &[u8]) -> Self {
        Self {
            inner: BytesMut::from(data),
        }
    }

    /// Number of bytes not read yet.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the unread portion of the buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }
}

impl Read for Buffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.inner.len());
        self.inner.copy_to_slice(&mut buf[..n]);
        Ok(n)
    }
}

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for Buffer {
    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Ok(0)
    }
}

impl File for Buffer {
    fn close(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}
