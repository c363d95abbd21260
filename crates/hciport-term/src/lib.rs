//! The codec boundary between frames and structured messages.
//!
//! Payloads use the external term format (version 131). Only the shapes the
//! port exchanges are modelled as structured [`Term`] values; anything else
//! that is well formed (references, pids, floats, maps, ...) is carried as
//! raw encoded bytes. The correlation id of a request is always kept raw
//! and echoed back byte-for-byte.

pub mod decode;
pub mod encode;
pub mod error;
pub mod message;
pub mod tag;
pub mod term;

pub use decode::{decode, Decoder};
pub use encode::{encode, encode_term};
pub use error::{Result, TermError};
pub use message::{
    decode_request, encode_event, encode_reply, Correlation, Request, RequestError, EVENT_TAG,
};
pub use term::Term;
