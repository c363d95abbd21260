use bytes::{BufMut, Bytes, BytesMut};

use crate::tag::*;
use crate::term::Term;

/// Encode a complete payload: version byte plus `term`.
pub fn encode(term: &Term) -> Bytes {
    let mut dst = BytesMut::new();
    dst.put_u8(VERSION);
    encode_term(term, &mut dst);
    dst.freeze()
}

/// Append the encoding of `term` (no version byte) to `dst`.
pub fn encode_term(term: &Term, dst: &mut BytesMut) {
    match term {
        Term::Integer(value) => encode_integer(*value, dst),
        Term::Atom(name) => {
            if name.len() <= usize::from(u8::MAX) {
                dst.put_u8(SMALL_ATOM_UTF8_EXT);
                dst.put_u8(name.len() as u8);
            } else {
                dst.put_u8(ATOM_UTF8_EXT);
                dst.put_u16(name.len().min(usize::from(u16::MAX)) as u16);
            }
            dst.put_slice(&name.as_bytes()[..name.len().min(usize::from(u16::MAX))]);
        }
        Term::Binary(data) => {
            dst.put_u8(BINARY_EXT);
            dst.put_u32(data.len() as u32);
            dst.put_slice(data);
        }
        Term::Tuple(items) => {
            if items.len() <= usize::from(u8::MAX) {
                dst.put_u8(SMALL_TUPLE_EXT);
                dst.put_u8(items.len() as u8);
            } else {
                dst.put_u8(LARGE_TUPLE_EXT);
                dst.put_u32(items.len() as u32);
            }
            for item in items {
                encode_term(item, dst);
            }
        }
        Term::List(items) => {
            if !items.is_empty() {
                dst.put_u8(LIST_EXT);
                dst.put_u32(items.len() as u32);
                for item in items {
                    encode_term(item, dst);
                }
            }
            dst.put_u8(NIL_EXT);
        }
        Term::Raw(data) => dst.put_slice(data),
    }
}

fn encode_integer(value: i64, dst: &mut BytesMut) {
    if (0..=i64::from(u8::MAX)).contains(&value) {
        dst.put_u8(SMALL_INTEGER_EXT);
        dst.put_u8(value as u8);
    } else if let Ok(small) = i32::try_from(value) {
        dst.put_u8(INTEGER_EXT);
        dst.put_i32(small);
    } else {
        let magnitude = value.unsigned_abs();
        let digits = magnitude.to_le_bytes();
        let n = 8 - (magnitude.leading_zeros() / 8) as usize;
        dst.put_u8(SMALL_BIG_EXT);
        dst.put_u8(n as u8);
        dst.put_u8(u8::from(value < 0));
        dst.put_slice(&digits[..n]);
    }
}
