//! Binary frame layout and the stateless encode/decode pair.
//!
//! Wire layout, all integers little-endian:
//!
//! ```text
//! offset 0   u32  size        (= total frame length - 4)
//! offset 4   u8   id marker   (1 = continuation, 2 = terminal)
//! offset 5   u8   reserved    (always 0)
//! offset 6   u16  sequence id
//! offset 8   u32  type        (0 response, 1 push event, 2 exec/auth-response, 3 auth)
//! offset 12  ..   body        (UTF-8 text)
//! end - 2    u16  terminator  (zero bytes)
//! ```

use std::fmt::Debug;

use bytes::{BufMut, BytesMut};

use crate::error::RconError;
use crate::message::{PacketId, PacketType};

/// Largest frame the server accepts.
pub const MAX_PACKET_SIZE: usize = 4096;

/// Bytes of a frame that are not body: size + marker + reserved +
/// sequence + type + terminator.
pub const PACKET_OVERHEAD: usize = 14;

/// Offset at which the body starts.
pub const BODY_OFFSET: usize = 12;

/// Smallest legal value of the size field (an empty body).
pub const MIN_SIZE_FIELD: usize = PACKET_OVERHEAD - 4;

/// Total length of the server's spurious filler frame. Its size field
/// claims an empty body, but 21 bytes follow on the wire.
pub const FILLER_WINDOW: usize = 21;

/// Body carried by the filler frame when decoded over the full 21-byte
/// window.
pub const FILLER_BODY: &str = "\x00\x00\x00\x01\x00\x00\x00";

/// One decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw id marker byte. Usually one of [`PacketId`], but the auth
    /// failure sentinel (`0xFF`) and garbage values must survive decode
    /// so the correlator can classify them.
    pub id: u8,
    /// Sequence id correlating a response to its request.
    pub sequence: u16,
    /// Raw type code. See [`PacketType`].
    pub packet_type: u32,
    /// Body text, excluding the trailing terminator.
    pub body: String,
}

impl Frame {
    pub fn new(packet_type: PacketType, id: PacketId, sequence: u16, body: impl Into<String>) -> Self {
        Self {
            id: id as u8,
            sequence,
            packet_type: packet_type as u32,
            body: body.into(),
        }
    }

    /// The auth login packet. A single terminal frame, never fragmented.
    pub fn auth(sequence: u16, password: &str) -> Self {
        Self::new(PacketType::Auth, PacketId::End, sequence, password)
    }

    /// The leading half of a command: the command text itself.
    pub fn command(sequence: u16, command: &str) -> Self {
        Self::new(PacketType::ExecCommand, PacketId::Mid, sequence, command)
    }

    /// The trailing half of a command: an empty terminal frame that
    /// forces the server to terminate its reply.
    pub fn command_end(sequence: u16) -> Self {
        Self::new(PacketType::ExecCommand, PacketId::End, sequence, "")
    }

    /// Total encoded length of this frame.
    pub fn encoded_len(&self) -> usize {
        self.body.len() + PACKET_OVERHEAD
    }

    /// Encode into the fixed little-endian layout.
    ///
    /// Fails with [`RconError::PacketTooLarge`] when the frame would
    /// exceed [`MAX_PACKET_SIZE`].
    pub fn to_bytes(&self) -> Result<Vec<u8>, RconError> {
        let total = self.encoded_len();
        if total > MAX_PACKET_SIZE {
            return Err(RconError::PacketTooLarge {
                size: total,
                max: MAX_PACKET_SIZE,
            });
        }

        let mut buf = BytesMut::with_capacity(total);
        buf.put_u32_le((total - 4) as u32);
        buf.put_u8(self.id);
        buf.put_u8(0);
        buf.put_u16_le(self.sequence);
        buf.put_u32_le(self.packet_type);
        buf.put_slice(self.body.as_bytes());
        buf.put_u16_le(0);
        Ok(buf.to_vec())
    }

    /// Decode one frame from exactly the bytes that make it up.
    ///
    /// The body is taken as everything between [`BODY_OFFSET`] and the
    /// 2-byte terminator; the size field is deliberately not checked
    /// against the slice length, because the filler frame lies about
    /// its own size and is decoded over a fixed 21-byte window.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RconError> {
        if bytes.len() < PACKET_OVERHEAD {
            return Err(RconError::InvalidPacketLength {
                expected: PACKET_OVERHEAD,
                actual: bytes.len(),
            });
        }

        let id = bytes[4];
        let sequence = u16::from_le_bytes([bytes[6], bytes[7]]);
        let packet_type = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        let body = String::from_utf8_lossy(&bytes[BODY_OFFSET..bytes.len() - 2]).into_owned();

        Ok(Self {
            id,
            sequence,
            packet_type,
            body,
        })
    }

    /// Reads the size field of a frame whose first four bytes are
    /// available, without decoding the rest.
    pub fn peek_size(bytes: &[u8]) -> Option<usize> {
        if bytes.len() < 4 {
            return None;
        }
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let frame = Frame::command(42, "ListPlayers");
        let bytes = frame.to_bytes().unwrap();
        let decoded = Frame::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn encode_layout_offsets() {
        let frame = Frame::new(PacketType::Auth, PacketId::End, 0x0102, "pw");
        let bytes = frame.to_bytes().unwrap();

        assert_eq!(bytes.len(), 16);
        // size field = total - 4
        assert_eq!(&bytes[0..4], &12u32.to_le_bytes());
        assert_eq!(bytes[4], PacketId::End as u8);
        assert_eq!(bytes[5], 0);
        assert_eq!(&bytes[6..8], &0x0102u16.to_le_bytes());
        assert_eq!(&bytes[8..12], &(PacketType::Auth as u32).to_le_bytes());
        assert_eq!(&bytes[12..14], b"pw");
        assert_eq!(&bytes[14..16], &[0, 0]);
    }

    #[test]
    fn empty_body_frame() {
        let frame = Frame::command_end(7);
        let bytes = frame.to_bytes().unwrap();
        assert_eq!(bytes.len(), PACKET_OVERHEAD);
        assert_eq!(Frame::peek_size(&bytes), Some(MIN_SIZE_FIELD));

        let decoded = Frame::from_bytes(&bytes).unwrap();
        assert!(decoded.body.is_empty());
        assert_eq!(decoded.sequence, 7);
    }

    #[test]
    fn oversized_frame_rejected() {
        let frame = Frame::command(1, &"a".repeat(MAX_PACKET_SIZE));
        assert!(matches!(
            frame.to_bytes(),
            Err(RconError::PacketTooLarge { .. })
        ));
    }

    #[test]
    fn max_size_frame_accepted() {
        let frame = Frame::command(1, &"a".repeat(MAX_PACKET_SIZE - PACKET_OVERHEAD));
        let bytes = frame.to_bytes().unwrap();
        assert_eq!(bytes.len(), MAX_PACKET_SIZE);
    }

    #[test]
    fn decode_too_short_rejected() {
        assert!(matches!(
            Frame::from_bytes(&[0u8; 13]),
            Err(RconError::InvalidPacketLength { .. })
        ));
    }

    #[test]
    fn decode_filler_window() {
        // 21-byte filler: size field claims an empty body.
        let mut bytes = vec![];
        bytes.extend_from_slice(&10u32.to_le_bytes());
        bytes.push(0);
        bytes.push(0);
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0]);
        bytes.extend_from_slice(&[0, 0]);
        assert_eq!(bytes.len(), FILLER_WINDOW);

        let decoded = Frame::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.body, FILLER_BODY);
    }

    #[test]
    fn peek_size_needs_four_bytes() {
        assert_eq!(Frame::peek_size(&[1, 0, 0]), None);
        assert_eq!(Frame::peek_size(&[16, 0, 0, 0, 9]), Some(16));
    }
}
