//! Outbound codec for framed TCP writes.
//!
//! Only the encoder half lives here. Inbound framing cannot be a plain
//! `tokio_util::codec::Decoder`: whether a buffered frame may be
//! consumed depends on the correlator's outstanding requests and on the
//! filler-frame quirk, so the read path goes through
//! [`FrameAssembler`](assembler::FrameAssembler) instead.

pub mod assembler;

pub use assembler::FrameAssembler;

use crate::Frame;

/// Stateless encoder; pair with `tokio_util::codec::FramedWrite`.
pub struct RconCodec;

impl tokio_util::codec::Encoder<Frame> for RconCodec {
    type Error = crate::RconError;

    fn encode(&mut self, item: Frame, dst: &mut bytes::BytesMut) -> Result<(), Self::Error> {
        let packet = item.to_bytes()?;
        dst.extend_from_slice(&packet);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use tokio_util::codec::Encoder;

    #[test]
    fn encoder_writes_wire_bytes() {
        let mut codec = RconCodec;
        let mut dst = BytesMut::new();
        let frame = Frame::command(3, "ShowCurrentMap");

        codec.encode(frame.clone(), &mut dst).unwrap();
        assert_eq!(dst.to_vec(), frame.to_bytes().unwrap());
    }

    #[test]
    fn encoder_rejects_oversized() {
        let mut codec = RconCodec;
        let mut dst = BytesMut::new();
        let frame = Frame::command(1, &"x".repeat(8192));

        assert!(codec.encode(frame, &mut dst).is_err());
        assert!(dst.is_empty());
    }
}
