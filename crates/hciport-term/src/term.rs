use std::fmt;

use bytes::Bytes;

/// Longest atom the runtime accepts, in bytes of text.
pub const MAX_ATOM_LEN: usize = 255;

/// A decoded (or to-be-encoded) value.
#[derive(Clone, PartialEq, Eq)]
pub enum Term {
    Integer(i64),
    Atom(String),
    Binary(Bytes),
    Tuple(Vec<Term>),
    /// A proper list; `[]` is an empty list.
    List(Vec<Term>),
    /// A well-formed term kept in its encoded form, without the version byte.
    Raw(Bytes),
}

impl Term {
    pub fn atom(name: impl Into<String>) -> Self {
        Term::Atom(name.into())
    }

    pub fn ok() -> Self {
        Term::atom("ok")
    }

    pub fn nil() -> Self {
        Term::atom("nil")
    }

    pub fn boolean(value: bool) -> Self {
        Term::atom(if value { "true" } else { "false" })
    }

    /// An atom naming a failure reason, cut to the runtime's atom limit.
    pub fn reason(text: &str) -> Self {
        let mut end = text.len().min(MAX_ATOM_LEN);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        Term::atom(&text[..end])
    }

    /// `{error, Reason}`.
    pub fn error(reason: &str) -> Self {
        Term::Tuple(vec![Term::atom("error"), Term::reason(reason)])
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Term::Atom(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Term::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.as_atom()? {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        self.as_atom() == Some("nil")
    }

    /// Raw bytes of a binary.
    pub fn as_binary(&self) -> Option<&Bytes> {
        match self {
            Term::Binary(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Term]> {
        match self {
            Term::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Term]> {
        match self {
            Term::Tuple(items) => Some(items),
            _ => None,
        }
    }
}

impl From<i64> for Term {
    fn from(value: i64) -> Self {
        Term::Integer(value)
    }
}

impl From<bool> for Term {
    fn from(value: bool) -> Self {
        Term::boolean(value)
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Integer(value) => write!(f, "{value}"),
            Term::Atom(name) => write!(f, "{name}"),
            Term::Binary(data) => write!(f, "<<{} bytes>>", data.len()),
            Term::Tuple(items) => {
                f.write_str("{")?;
                write_items(f, items)?;
                f.write_str("}")
            }
            Term::List(items) => {
                f.write_str("[")?;
                write_items(f, items)?;
                f.write_str("]")
            }
            Term::Raw(data) => write!(f, "#raw<{} bytes>", data.len()),
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Term]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item:?}")?;
    }
    Ok(())
}
