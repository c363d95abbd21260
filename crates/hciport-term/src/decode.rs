use bytes::Bytes;

use crate::error::{Result, TermError};
use crate::tag::*;
use crate::term::Term;

/// Deepest nesting followed before giving up.
pub const MAX_DEPTH: usize = 64;

/// Decode a complete payload (version byte plus exactly one term).
pub fn decode(payload: &Bytes) -> Result<Term> {
    let mut decoder = Decoder::new(payload.clone());
    decoder.version()?;
    let term = decoder.term()?;
    decoder.finish()?;
    Ok(term)
}

/// Cursor over an encoded payload.
pub struct Decoder {
    buf: Bytes,
    pos: usize,
}

impl Decoder {
    pub fn new(buf: Bytes) -> Self {
        Self { buf, pos: 0 }
    }

    /// Consume and check the leading format version byte.
    pub fn version(&mut self) -> Result<()> {
        match self.u8()? {
            VERSION => Ok(()),
            other => Err(TermError::Version(other)),
        }
    }

    /// Fail unless every byte has been consumed.
    pub fn finish(&self) -> Result<()> {
        match self.buf.len() - self.pos {
            0 => Ok(()),
            n => Err(TermError::Trailing(n)),
        }
    }

    /// Peek at the next tag without consuming it.
    pub fn peek_tag(&self) -> Result<u8> {
        self.buf
            .get(self.pos)
            .copied()
            .ok_or(TermError::Truncated(self.pos))
    }

    /// Consume a tuple header and return its arity.
    pub fn tuple_header(&mut self) -> Result<usize> {
        match self.u8()? {
            SMALL_TUPLE_EXT => Ok(usize::from(self.u8()?)),
            LARGE_TUPLE_EXT => self.u32_len(),
            _ => Err(TermError::Shape("expected a tuple")),
        }
    }

    /// Decode the next term.
    pub fn term(&mut self) -> Result<Term> {
        self.term_at(0)
    }

    /// Skip the next term and return its encoded bytes untouched.
    pub fn raw_term(&mut self) -> Result<Bytes> {
        let start = self.pos;
        self.skip(0)?;
        Ok(self.buf.slice(start..self.pos))
    }

    fn term_at(&mut self, depth: usize) -> Result<Term> {
        if depth > MAX_DEPTH {
            return Err(TermError::TooDeep(MAX_DEPTH));
        }

        let start = self.pos;
        let tag = self.u8()?;
        let term = match tag {
            SMALL_INTEGER_EXT => Term::Integer(i64::from(self.u8()?)),
            INTEGER_EXT => Term::Integer(i64::from(self.u32()? as i32)),
            SMALL_BIG_EXT => {
                let n = usize::from(self.u8()?);
                self.big(start, n)?
            }
            LARGE_BIG_EXT => {
                let n = self.u32_len()?;
                self.big(start, n)?
            }
            ATOM_EXT | ATOM_UTF8_EXT => {
                let n = usize::from(self.u16()?);
                Term::Atom(self.atom_text(tag, n)?)
            }
            SMALL_ATOM_EXT | SMALL_ATOM_UTF8_EXT => {
                let n = usize::from(self.u8()?);
                Term::Atom(self.atom_text(tag, n)?)
            }
            BINARY_EXT => {
                let n = self.u32_len()?;
                Term::Binary(self.take(n)?)
            }
            SMALL_TUPLE_EXT => {
                let arity = usize::from(self.u8()?);
                Term::Tuple(self.items(arity, depth)?)
            }
            LARGE_TUPLE_EXT => {
                let arity = self.u32_len()?;
                Term::Tuple(self.items(arity, depth)?)
            }
            NIL_EXT => Term::List(Vec::new()),
            STRING_EXT => {
                let n = usize::from(self.u16()?);
                let chars = self.take(n)?;
                Term::List(chars.iter().map(|c| Term::Integer(i64::from(*c))).collect())
            }
            LIST_EXT => {
                let len = self.u32_len()?;
                let items = self.items(len, depth)?;
                if self.peek_tag()? == NIL_EXT {
                    self.pos += 1;
                    Term::List(items)
                } else {
                    self.skip(depth + 1)?;
                    Term::Raw(self.buf.slice(start..self.pos))
                }
            }
            _ => {
                self.pos = start;
                self.skip(depth)?;
                Term::Raw(self.buf.slice(start..self.pos))
            }
        };
        Ok(term)
    }

    fn items(&mut self, count: usize, depth: usize) -> Result<Vec<Term>> {
        let mut items = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            items.push(self.term_at(depth + 1)?);
        }
        Ok(items)
    }

    fn big(&mut self, start: usize, n: usize) -> Result<Term> {
        let sign = self.u8()?;
        let digits = self.take(n)?;
        let significant = digits.iter().rposition(|d| *d != 0).map_or(0, |i| i + 1);
        if significant > 8 {
            return Ok(Term::Raw(self.buf.slice(start..self.pos)));
        }

        let magnitude = digits[..significant]
            .iter()
            .rev()
            .fold(0u64, |acc, d| (acc << 8) | u64::from(*d));
        let value = if sign == 0 {
            i64::try_from(magnitude).ok()
        } else if magnitude == 1 << 63 {
            Some(i64::MIN)
        } else {
            i64::try_from(magnitude).ok().map(|v| -v)
        };
        Ok(match value {
            Some(v) => Term::Integer(v),
            None => Term::Raw(self.buf.slice(start..self.pos)),
        })
    }

    fn atom_text(&mut self, tag: u8, n: usize) -> Result<String> {
        let offset = self.pos;
        let raw = self.take(n)?;
        match tag {
            ATOM_UTF8_EXT | SMALL_ATOM_UTF8_EXT => std::str::from_utf8(&raw)
                .map(str::to_owned)
                .map_err(|_| TermError::InvalidAtom(offset)),
            _ => Ok(raw.iter().map(|b| char::from(*b)).collect()),
        }
    }

    /// Advance past one term without building it.
    fn skip(&mut self, depth: usize) -> Result<()> {
        if depth > MAX_DEPTH {
            return Err(TermError::TooDeep(MAX_DEPTH));
        }

        let offset = self.pos;
        let tag = self.u8()?;
        match tag {
            SMALL_INTEGER_EXT => self.advance(1),
            INTEGER_EXT => self.advance(4),
            NEW_FLOAT_EXT => self.advance(8),
            FLOAT_EXT => self.advance(31),
            NIL_EXT => Ok(()),
            ATOM_EXT | ATOM_UTF8_EXT | STRING_EXT => {
                let n = usize::from(self.u16()?);
                self.advance(n)
            }
            SMALL_ATOM_EXT | SMALL_ATOM_UTF8_EXT => {
                let n = usize::from(self.u8()?);
                self.advance(n)
            }
            BINARY_EXT => {
                let n = self.u32_len()?;
                self.advance(n)
            }
            BIT_BINARY_EXT => {
                let n = self.u32_len()?;
                self.advance(1 + n)
            }
            SMALL_BIG_EXT => {
                let n = usize::from(self.u8()?);
                self.advance(1 + n)
            }
            LARGE_BIG_EXT => {
                let n = self.u32_len()?;
                self.advance(1 + n)
            }
            SMALL_TUPLE_EXT => {
                let arity = usize::from(self.u8()?);
                self.skip_n(arity, depth)
            }
            LARGE_TUPLE_EXT => {
                let arity = self.u32_len()?;
                self.skip_n(arity, depth)
            }
            LIST_EXT => {
                let len = self.u32_len()?;
                self.skip_n(len.saturating_add(1), depth)
            }
            MAP_EXT => {
                let arity = self.u32_len()?;
                self.skip_n(arity.saturating_mul(2), depth)
            }
            EXPORT_EXT => self.skip_n(3, depth),
            PID_EXT => {
                self.skip(depth + 1)?;
                self.advance(9)
            }
            NEW_PID_EXT => {
                self.skip(depth + 1)?;
                self.advance(12)
            }
            REFERENCE_EXT | PORT_EXT => {
                self.skip(depth + 1)?;
                self.advance(5)
            }
            NEW_PORT_EXT => {
                self.skip(depth + 1)?;
                self.advance(8)
            }
            V4_PORT_EXT => {
                self.skip(depth + 1)?;
                self.advance(12)
            }
            NEW_REFERENCE_EXT => {
                let words = usize::from(self.u16()?);
                self.skip(depth + 1)?;
                self.advance(1 + 4 * words)
            }
            NEWER_REFERENCE_EXT => {
                let words = usize::from(self.u16()?);
                self.skip(depth + 1)?;
                self.advance(4 + 4 * words)
            }
            NEW_FUN_EXT => {
                // The size field counts itself.
                let size = self.u32_len()?;
                self.advance(size.saturating_sub(4))
            }
            tag => Err(TermError::UnknownTag { tag, offset }),
        }
    }

    fn skip_n(&mut self, count: usize, depth: usize) -> Result<()> {
        for _ in 0..count {
            self.skip(depth + 1)?;
        }
        Ok(())
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn advance(&mut self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(TermError::Truncated(self.buf.len()));
        }
        self.pos += n;
        Ok(())
    }

    fn take(&mut self, n: usize) -> Result<Bytes> {
        let start = self.pos;
        self.advance(n)?;
        Ok(self.buf.slice(start..self.pos))
    }

    fn u8(&mut self) -> Result<u8> {
        let byte = self.peek_tag()?;
        self.pos += 1;
        Ok(byte)
    }

    fn u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn u32_len(&mut self) -> Result<usize> {
        Ok(self.u32()? as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(bytes: &[u8]) -> Bytes {
        let mut v = vec![VERSION];
        v.extend_from_slice(bytes);
        Bytes::from(v)
    }

    #[test]
    fn small_and_large_integers() {
        assert_eq!(decode(&payload(&[97, 41])).unwrap(), Term::Integer(41));
        assert_eq!(
            decode(&payload(&[98, 0xFF, 0xFF, 0xFF, 0xFE])).unwrap(),
            Term::Integer(-2)
        );
        assert_eq!(
            decode(&payload(&[98, 0x00, 0x01, 0x00, 0x00])).unwrap(),
            Term::Integer(65536)
        );
    }

    #[test]
    fn small_big_fits_i64() {
        // 2^40, positive and negative
        let pos = decode(&payload(&[110, 6, 0, 0, 0, 0, 0, 0, 1])).unwrap();
        assert_eq!(pos, Term::Integer(1 << 40));
        let neg = decode(&payload(&[110, 6, 1, 0, 0, 0, 0, 0, 1])).unwrap();
        assert_eq!(neg, Term::Integer(-(1 << 40)));
    }

    #[test]
    fn big_beyond_i64_is_raw() {
        let bytes = [110, 9, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9];
        let term = decode(&payload(&bytes)).unwrap();
        assert_eq!(term, Term::Raw(Bytes::copy_from_slice(&bytes)));
    }

    #[test]
    fn i64_min_decodes() {
        let bytes = [110, 8, 1, 0, 0, 0, 0, 0, 0, 0, 0x80];
        assert_eq!(decode(&payload(&bytes)).unwrap(), Term::Integer(i64::MIN));
    }

    #[test]
    fn all_atom_encodings() {
        let expected = Term::atom("foo");
        assert_eq!(decode(&payload(&[100, 0, 3, b'f', b'o', b'o'])).unwrap(), expected);
        assert_eq!(decode(&payload(&[115, 3, b'f', b'o', b'o'])).unwrap(), expected);
        assert_eq!(decode(&payload(&[118, 0, 3, b'f', b'o', b'o'])).unwrap(), expected);
        assert_eq!(decode(&payload(&[119, 3, b'f', b'o', b'o'])).unwrap(), expected);
    }

    #[test]
    fn latin1_atom_maps_bytes_to_chars() {
        assert_eq!(
            decode(&payload(&[115, 2, b'a', 0xE9])).unwrap(),
            Term::atom("aé")
        );
    }

    #[test]
    fn invalid_utf8_atom_rejected() {
        let err = decode(&payload(&[119, 1, 0xFF])).unwrap_err();
        assert_eq!(err, TermError::InvalidAtom(3));
    }

    #[test]
    fn string_ext_is_a_list_of_integers() {
        assert_eq!(
            decode(&payload(&[107, 0, 1, 41])).unwrap(),
            Term::List(vec![Term::Integer(41)])
        );
    }

    #[test]
    fn proper_list_and_nil() {
        assert_eq!(decode(&payload(&[106])).unwrap(), Term::List(vec![]));
        let list = decode(&payload(&[108, 0, 0, 0, 2, 97, 1, 97, 2, 106])).unwrap();
        assert_eq!(list, Term::List(vec![Term::Integer(1), Term::Integer(2)]));
    }

    #[test]
    fn improper_list_is_raw() {
        let bytes = [108, 0, 0, 0, 1, 97, 1, 97, 2];
        assert_eq!(
            decode(&payload(&bytes)).unwrap(),
            Term::Raw(Bytes::copy_from_slice(&bytes))
        );
    }

    #[test]
    fn binary_and_tuple() {
        let term = decode(&payload(&[104, 2, 109, 0, 0, 0, 2, 0xAA, 0xBB, 97, 3])).unwrap();
        assert_eq!(
            term,
            Term::Tuple(vec![
                Term::Binary(Bytes::from_static(&[0xAA, 0xBB])),
                Term::Integer(3)
            ])
        );
    }

    #[test]
    fn reference_is_kept_raw_in_full() {
        // #Ref<...> as NEWER_REFERENCE_EXT with node 'nonode@nohost'.
        let mut bytes = vec![90, 0, 3, 119, 13];
        bytes.extend_from_slice(b"nonode@nohost");
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes.extend_from_slice(&[0, 0, 1, 2, 0, 0, 3, 4, 0, 0, 5, 6]);

        let mut decoder = Decoder::new(payload(&bytes));
        decoder.version().unwrap();
        let raw = decoder.raw_term().unwrap();
        assert_eq!(raw.as_ref(), bytes.as_slice());
        decoder.finish().unwrap();
    }

    #[test]
    fn skips_pids_floats_and_maps() {
        let mut bytes = vec![104, 3];
        // NEW_PID_EXT
        bytes.extend_from_slice(&[88, 119, 1, b'n']);
        bytes.extend_from_slice(&[0; 12]);
        // NEW_FLOAT_EXT
        bytes.extend_from_slice(&[70, 0x40, 0x09, 0x21, 0xFB, 0x54, 0x44, 0x2D, 0x18]);
        // #{a => 1}
        bytes.extend_from_slice(&[116, 0, 0, 0, 1, 119, 1, b'a', 97, 1]);

        let Term::Tuple(items) = decode(&payload(&bytes)).unwrap() else {
            panic!("expected tuple");
        };
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|t| matches!(t, Term::Raw(_))));
    }

    #[test]
    fn truncated_payload() {
        assert!(matches!(
            decode(&payload(&[109, 0, 0, 0, 9, 1])).unwrap_err(),
            TermError::Truncated(_)
        ));
        assert!(matches!(
            decode(&payload(&[])).unwrap_err(),
            TermError::Truncated(_)
        ));
    }

    #[test]
    fn wrong_version_and_trailing_bytes() {
        assert_eq!(
            decode(&Bytes::from_static(&[130, 106])).unwrap_err(),
            TermError::Version(130)
        );
        assert_eq!(
            decode(&payload(&[106, 106])).unwrap_err(),
            TermError::Trailing(1)
        );
    }

    #[test]
    fn unknown_tag_reported_with_offset() {
        assert_eq!(
            decode(&payload(&[104, 1, 1])).unwrap_err(),
            TermError::UnknownTag { tag: 1, offset: 3 }
        );
    }

    #[test]
    fn nesting_limit_enforced() {
        let mut bytes = Vec::new();
        for _ in 0..(MAX_DEPTH + 2) {
            bytes.extend_from_slice(&[104, 1]);
        }
        bytes.push(106);
        assert_eq!(
            decode(&payload(&bytes)).unwrap_err(),
            TermError::TooDeep(MAX_DEPTH)
        );
    }

    #[test]
    fn huge_declared_list_length_does_not_preallocate() {
        let err = decode(&payload(&[108, 0xFF, 0xFF, 0xFF, 0xFF])).unwrap_err();
        assert!(matches!(err, TermError::Truncated(_)));
    }
}
