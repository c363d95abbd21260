use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: a 2-byte big-endian payload length.
pub const HEADER_SIZE: usize = 2;

/// Largest payload the header can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// Encode a payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬─────────────────┐
/// │ Length       │ Payload         │
/// │ (2B BE)      │ (Length bytes)  │
/// └──────────────┴─────────────────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u16(payload.len() as u16);
    dst.put_slice(payload);
    Ok(())
}

/// Configuration for frame readers and writers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default and ceiling: 65535.
    pub max_payload_size: usize,
}

impl FrameConfig {
    /// The effective limit, never above what the header can express.
    pub fn payload_limit(&self) -> usize {
        self.max_payload_size.min(MAX_PAYLOAD)
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_PAYLOAD,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::Bytes;

    use super::*;
    use crate::reader::FrameReader;

    fn read_all(wire: &[u8]) -> Vec<Bytes> {
        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
        let mut frames = Vec::new();
        while let Ok(frame) = reader.read_frame() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn test_encode_then_read_back() {
        let mut buf = BytesMut::new();
        let payload = b"\x83h\x02a\x07d\x00\x05false";

        encode_frame(payload, &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE + payload.len());
        assert_eq!(&buf[..2], &[0x00, payload.len() as u8]);

        let frames = read_all(&buf);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref(), payload);
    }

    #[test]
    fn test_length_is_big_endian() {
        let payload = vec![0u8; 0x0102];
        let mut buf = BytesMut::new();
        encode_frame(&payload, &mut buf).unwrap();
        assert_eq!(&buf[..2], &[0x01, 0x02]);
    }

    #[test]
    fn test_max_payload_accepted_and_one_more_rejected() {
        let mut buf = BytesMut::new();
        encode_frame(&vec![7u8; MAX_PAYLOAD], &mut buf).unwrap();
        assert_eq!(&buf[..2], &[0xFF, 0xFF]);
        assert_eq!(buf.len(), HEADER_SIZE + MAX_PAYLOAD);
        buf.clear();

        let err = encode_frame(&vec![7u8; MAX_PAYLOAD + 1], &mut buf).unwrap_err();
        assert!(matches!(
            err,
            FrameError::PayloadTooLarge {
                size,
                max: MAX_PAYLOAD
            } if size == MAX_PAYLOAD + 1
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_multiple_frames_back_to_back() {
        let mut buf = BytesMut::new();
        encode_frame(b"first", &mut buf).unwrap();
        encode_frame(b"second", &mut buf).unwrap();

        let frames = read_all(&buf);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_ref(), b"first");
        assert_eq!(frames[1].as_ref(), b"second");
    }

    #[test]
    fn test_empty_payload() {
        let mut buf = BytesMut::new();
        encode_frame(b"", &mut buf).unwrap();
        assert_eq!(buf.as_ref(), &[0, 0]);

        let frames = read_all(&buf);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_empty());
    }

    #[test]
    fn test_config_limit_is_clamped() {
        let cfg = FrameConfig {
            max_payload_size: usize::MAX,
        };
        assert_eq!(cfg.payload_limit(), MAX_PAYLOAD);
        assert_eq!(FrameConfig::default().payload_limit(), MAX_PAYLOAD);
    }
}
