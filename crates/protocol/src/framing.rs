//! Frame codec for the control stream.
//!
//! # Frame Format
//!
//! Each frame consists of:
//! - 1 byte: opcode
//! - 2 bytes: payload length (big-endian)
//! - N bytes: payload, interpretation depends on the opcode
//!
//! # Streaming
//!
//! The control stream is chunked arbitrarily by the transport: a frame may
//! arrive split across several reads, and one read may carry several frames.
//! [`try_decode`] is a pure function over whatever has been buffered so far;
//! callers append incoming bytes to an accumulation buffer, drain complete
//! frames in a loop, and keep the unconsumed tail for the next read. The
//! decoded frame sequence is identical regardless of how the stream was
//! chunked.

use crate::error::ProtocolError;

/// Frame header size: 1 (opcode) + 2 (payload length) = 3 bytes.
pub const HEADER_LEN: usize = 3;

/// Maximum payload size representable in the 16-bit length field.
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

/// A single decoded control frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Operation selector. See [`crate::command::Opcode`] for known values.
    pub opcode: u8,
    /// The payload data.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Create a new frame with the given opcode and payload.
    pub fn new(opcode: u8, payload: Vec<u8>) -> Self {
        Self { opcode, payload }
    }
}

/// Encode a frame into bytes.
///
/// Fails only when the payload does not fit in the 16-bit length field.
pub fn encode(frame: &Frame) -> Result<Vec<u8>, ProtocolError> {
    if frame.payload.len() > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::PayloadTooLarge {
            size: frame.payload.len(),
            max: MAX_PAYLOAD_LEN,
        });
    }

    let mut output = Vec::with_capacity(HEADER_LEN + frame.payload.len());
    output.push(frame.opcode);
    output.extend_from_slice(&(frame.payload.len() as u16).to_be_bytes());
    output.extend_from_slice(&frame.payload);
    Ok(output)
}

/// Try to decode one frame from the front of `data`.
///
/// Returns `None` when the buffer holds less than a full frame (header
/// missing, or fewer than the declared payload bytes). That is not an
/// error: the caller waits for more input. On success returns the frame
/// and the number of bytes consumed, always `HEADER_LEN + payload length`.
pub fn try_decode(data: &[u8]) -> Option<(Frame, usize)> {
    if data.len() < HEADER_LEN {
        return None;
    }

    let opcode = data[0];
    let payload_len = u16::from_be_bytes([data[1], data[2]]) as usize;

    let total = HEADER_LEN + payload_len;
    if data.len() < total {
        return None;
    }

    let frame = Frame {
        opcode,
        payload: data[HEADER_LEN..total].to_vec(),
    };
    Some((frame, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Decode every complete frame from `data`, returning the frames and
    /// the leftover byte count.
    fn drain(data: &[u8]) -> (Vec<Frame>, usize) {
        let mut frames = Vec::new();
        let mut offset = 0;
        while let Some((frame, consumed)) = try_decode(&data[offset..]) {
            frames.push(frame);
            offset += consumed;
        }
        (frames, data.len() - offset)
    }

    #[test]
    fn test_encode_layout() {
        let frame = Frame::new(1, b"hello".to_vec());
        let encoded = encode(&frame).unwrap();

        assert_eq!(encoded[0], 1);
        assert_eq!(u16::from_be_bytes([encoded[1], encoded[2]]), 5);
        assert_eq!(&encoded[3..], b"hello");
    }

    #[test]
    fn test_encode_empty_payload() {
        let frame = Frame::new(9, vec![]);
        let encoded = encode(&frame).unwrap();
        assert_eq!(encoded, vec![9, 0, 0]);
    }

    #[test]
    fn test_encode_payload_too_large() {
        let frame = Frame::new(1, vec![0u8; MAX_PAYLOAD_LEN + 1]);
        let result = encode(&frame);
        assert!(matches!(
            result,
            Err(ProtocolError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn test_encode_max_payload() {
        let frame = Frame::new(1, vec![0u8; MAX_PAYLOAD_LEN]);
        let encoded = encode(&frame).unwrap();
        assert_eq!(encoded.len(), HEADER_LEN + MAX_PAYLOAD_LEN);
    }

    #[test]
    fn test_decode_roundtrip() {
        let original = Frame::new(3, vec![0, 24, 0, 80]);
        let encoded = encode(&original).unwrap();

        let (decoded, consumed) = try_decode(&encoded).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(consumed, encoded.len());
    }

    #[test]
    fn test_consumed_is_header_plus_payload() {
        let frame = Frame::new(1, vec![7; 42]);
        let mut data = encode(&frame).unwrap();
        data.extend_from_slice(b"trailing");

        let (_, consumed) = try_decode(&data).unwrap();
        assert_eq!(consumed, HEADER_LEN + 42);
        assert_eq!(&data[consumed..], b"trailing");
    }

    #[test]
    fn test_partial_header_is_not_a_frame() {
        assert!(try_decode(&[]).is_none());
        assert!(try_decode(&[1]).is_none());
        assert!(try_decode(&[1, 0]).is_none());
    }

    #[test]
    fn test_partial_payload_is_not_a_frame() {
        let encoded = encode(&Frame::new(1, b"hello".to_vec())).unwrap();
        for i in 0..encoded.len() {
            assert!(
                try_decode(&encoded[..i]).is_none(),
                "prefix of {} bytes decoded as a frame",
                i
            );
        }
    }

    #[test]
    fn test_header_only_frame_with_declared_length() {
        // Header claims 10 payload bytes, none have arrived yet.
        let data = [2u8, 0, 10];
        assert!(try_decode(&data).is_none());
    }

    #[test]
    fn test_multiple_frames_in_buffer() {
        let f1 = Frame::new(1, b"abc".to_vec());
        let f2 = Frame::new(2, vec![0, 15]);
        let f3 = Frame::new(3, vec![0, 24, 0, 80]);

        let mut data = Vec::new();
        for f in [&f1, &f2, &f3] {
            data.extend_from_slice(&encode(f).unwrap());
        }

        let (frames, leftover) = drain(&data);
        assert_eq!(frames, vec![f1, f2, f3]);
        assert_eq!(leftover, 0);
    }

    #[test]
    fn test_chunk_invariance() {
        let f1 = Frame::new(1, b"hello world".to_vec());
        let f2 = Frame::new(9, vec![0xDE, 0xAD]);
        let f3 = Frame::new(2, vec![0, 9]);

        let mut stream = Vec::new();
        for f in [&f1, &f2, &f3] {
            stream.extend_from_slice(&encode(f).unwrap());
        }

        let (expected, _) = drain(&stream);

        // Feed the stream in every possible two-chunk split and verify the
        // decoded sequence is identical to the single-read result.
        for split in 0..=stream.len() {
            let mut buf = Vec::new();
            let mut frames = Vec::new();
            for chunk in [&stream[..split], &stream[split..]] {
                buf.extend_from_slice(chunk);
                while let Some((frame, consumed)) = try_decode(&buf) {
                    frames.push(frame);
                    buf.drain(..consumed);
                }
            }
            assert_eq!(frames, expected, "split at {}", split);
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn test_byte_at_a_time_decoding() {
        let frame = Frame::new(1, b"hi".to_vec());
        let stream = encode(&frame).unwrap();

        let mut buf = Vec::new();
        let mut decoded = Vec::new();
        for byte in &stream {
            buf.push(*byte);
            while let Some((f, consumed)) = try_decode(&buf) {
                decoded.push(f);
                buf.drain(..consumed);
            }
        }

        assert_eq!(decoded, vec![frame]);
    }

    #[test]
    fn test_unknown_opcode_still_decodes() {
        // The framing layer does not interpret opcodes; an unknown one is
        // extracted like any other so the stream stays in sync.
        let data = encode(&Frame::new(200, b"junk".to_vec())).unwrap();
        let (frame, consumed) = try_decode(&data).unwrap();
        assert_eq!(frame.opcode, 200);
        assert_eq!(frame.payload, b"junk");
        assert_eq!(consumed, data.len());
    }
}
