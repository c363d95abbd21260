//! Two-byte length-prefixed framing for the control channel.
//!
//! Every message in either direction is framed as:
//! - a 2-byte big-endian payload length
//! - the payload (at most 65535 bytes)
//!
//! Readers never consume bytes past the end of the current frame, so the
//! descriptor's readiness state always reflects whether another frame is
//! pending.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{encode_frame, FrameConfig, HEADER_SIZE, MAX_PAYLOAD};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
