use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::codec::{FrameConfig, HEADER_SIZE};
use crate::error::{FrameError, Result};

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads internally: callers always get complete frames.
/// Exactly one frame's worth of bytes is consumed per call.
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Fill `buf` completely, looping over short reads.
    ///
    /// Returns the number of bytes obtained. A count below `buf.len()` means
    /// the stream reached end-of-input; nothing is read past that point.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut got = 0usize;
        while got < buf.len() {
            match self.inner.read(&mut buf[got..]) {
                Ok(0) => break,
                Ok(n) => got += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(got)
    }

    /// Read the next complete frame payload (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when the length prefix
    /// cannot be fully read, and `Err(FrameError::Truncated)` when the stream
    /// ends inside a payload.
    pub fn read_frame(&mut self) -> Result<Bytes> {
        let mut header = [0u8; HEADER_SIZE];
        if self.read_exact(&mut header)? < HEADER_SIZE {
            return Err(FrameError::ConnectionClosed);
        }

        let len = usize::from(u16::from_be_bytes(header));
        let max = self.config.payload_limit();
        if len > max {
            return Err(FrameError::PayloadTooLarge { size: len, max });
        }

        let mut payload = BytesMut::zeroed(len);
        let got = self.read_exact(&mut payload)?;
        if got < len {
            return Err(FrameError::Truncated {
                expected: len,
                received: got,
            });
        }

        trace!(len, "frame read");
        Ok(payload.freeze())
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
