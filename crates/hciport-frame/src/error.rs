/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before a complete length prefix was received.
    #[error("connection closed")]
    ConnectionClosed,

    /// The stream ended inside a payload.
    #[error("connection closed mid-frame ({received} of {expected} payload bytes)")]
    Truncated { expected: usize, received: usize },
}

impl FrameError {
    /// True when the peer closed the stream, cleanly or mid-frame.
    pub fn is_end_of_input(&self) -> bool {
        matches!(
            self,
            FrameError::ConnectionClosed | FrameError::Truncated { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
