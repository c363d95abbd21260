/// Errors that can occur while decoding external term format payloads.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum TermError {
    /// The payload does not start with the expected format version byte.
    #[error("unsupported term format version {0} (expected 131)")]
    Version(u8),

    /// The payload ended in the middle of a term.
    #[error("term data truncated at byte {0}")]
    Truncated(usize),

    /// A tag byte that this decoder does not know how to skip.
    #[error("unknown term tag {tag} at byte {offset}")]
    UnknownTag { tag: u8, offset: usize },

    /// Atom text is not valid for its declared encoding.
    #[error("invalid atom text at byte {0}")]
    InvalidAtom(usize),

    /// Nesting deeper than the decoder will follow.
    #[error("term nesting exceeds {0} levels")]
    TooDeep(usize),

    /// Bytes remained after the top-level term.
    #[error("{0} trailing bytes after term")]
    Trailing(usize),

    /// The payload is valid but not shaped like a request envelope.
    #[error("malformed request: {0}")]
    Shape(&'static str),
}

pub type Result<T> = std::result::Result<T, TermError>;
