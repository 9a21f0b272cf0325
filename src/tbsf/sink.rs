use std::io;

use bytes::{BufMut, BytesMut};

use super::EncodeError;

/// Destination for encoded records.
///
/// Fixed-size records and recovery markers arrive in a single call.
/// Strings and blobs arrive as header, payload and, for strings, the NUL.
pub trait ByteSink {
    /// Append `bytes` to the output.
    ///
    /// # Errors
    /// Returns [`EncodeError::Io`] when the output cannot take the bytes.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), EncodeError>;
}

impl ByteSink for Vec<u8> {
    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

impl ByteSink for BytesMut {
    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.put_slice(bytes);
        Ok(())
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        (**self).write_bytes(bytes)
    }
}

/// Adapter writing records into any [`io::Write`], such as a file.
///
/// No buffering is added; wrap the writer in an [`io::BufWriter`] when the
/// target is slow to take small writes.
#[derive(Debug)]
pub struct IoSink<W> {
    inner: W,
}

impl<W: io::Write> IoSink<W> {
    /// Wrap `inner`.
    pub const fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Flush the wrapped writer.
    ///
    /// # Errors
    /// Returns the error reported by the wrapped writer.
    pub fn flush(&mut self) -> Result<(), EncodeError> {
        self.inner.flush().map_err(EncodeError::from)
    }

    /// Borrow the wrapped writer.
    pub const fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap the wrapped writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> ByteSink for IoSink<W> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.inner.write_all(bytes).map_err(EncodeError::from)
    }
}
