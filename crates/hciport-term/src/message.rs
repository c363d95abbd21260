use bytes::{BufMut, Bytes, BytesMut};

use crate::decode::Decoder;
use crate::encode::encode_term;
use crate::error::TermError;
use crate::tag::{SMALL_TUPLE_EXT, VERSION};
use crate::term::Term;

/// Tag atom of unsolicited hardware event messages.
pub const EVENT_TAG: &str = "event";

/// Opaque correlation token: the encoded bytes of whatever term the caller
/// sent, never interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correlation(Bytes);

impl Correlation {
    /// Wrap already-encoded term bytes (no version byte).
    pub fn from_raw(raw: Bytes) -> Self {
        Self(raw)
    }

    /// Encode `term` as a correlation token.
    pub fn from_term(term: &Term) -> Self {
        let mut dst = BytesMut::new();
        encode_term(term, &mut dst);
        Self(dst.freeze())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A decoded request envelope: `{Correlation, Body}`.
///
/// The body is left as a generic term; interpreting it as an operation call
/// belongs to the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub correlation: Correlation,
    pub body: Term,
}

/// Why a request payload could not be decoded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RequestError {
    /// No correlation could be recovered; the request cannot be answered.
    #[error("undecodable request envelope: {0}")]
    Envelope(#[source] TermError),

    /// The correlation was recovered but the body was not.
    #[error("undecodable request body: {source}")]
    Body {
        correlation: Correlation,
        #[source]
        source: TermError,
    },
}

/// Decode one request payload.
pub fn decode_request(payload: &Bytes) -> Result<Request, RequestError> {
    let mut decoder = Decoder::new(payload.clone());
    decoder.version().map_err(RequestError::Envelope)?;
    let arity = decoder.tuple_header().map_err(RequestError::Envelope)?;
    if arity != 2 {
        return Err(RequestError::Envelope(TermError::Shape(
            "request must be a 2-tuple",
        )));
    }
    let correlation = Correlation(decoder.raw_term().map_err(RequestError::Envelope)?);

    let body = decoder.term().and_then(|body| {
        decoder.finish()?;
        Ok(body)
    });
    match body {
        Ok(body) => Ok(Request { correlation, body }),
        Err(source) => Err(RequestError::Body {
            correlation,
            source,
        }),
    }
}

/// Encode `{Correlation, Result}`.
pub fn encode_reply(correlation: &Correlation, result: &Term) -> Bytes {
    let mut dst = BytesMut::new();
    dst.put_u8(VERSION);
    dst.put_u8(SMALL_TUPLE_EXT);
    dst.put_u8(2);
    dst.put_slice(correlation.as_bytes());
    encode_term(result, &mut dst);
    dst.freeze()
}

/// Encode `{event, <<Payload>>}`.
pub fn encode_event(payload: &[u8]) -> Bytes {
    let mut dst = BytesMut::with_capacity(payload.len() + 16);
    dst.put_u8(VERSION);
    dst.put_u8(SMALL_TUPLE_EXT);
    dst.put_u8(2);
    encode_term(&Term::atom(EVENT_TAG), &mut dst);
    encode_term(&Term::Binary(Bytes::copy_from_slice(payload)), &mut dst);
    dst.freeze()
}
