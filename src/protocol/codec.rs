use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::frame::{Frame, FRAME_SIZE};
use crate::core::Error;

/// Frame codec for the byte-stream side of the bus
///
/// The wire carries back-to-back fixed-size frames. The codec withholds
/// output until a full frame has accumulated, so the link core never sees a
/// partial buffer.
#[derive(Clone, Default)]
pub struct FrameCodec;

impl FrameCodec {
    /// Creates a new frame codec
    pub fn new() -> Self {
        FrameCodec
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < FRAME_SIZE {
            // Need more data to read a full frame
            return Ok(None);
        }

        let mut raw = [0u8; FRAME_SIZE];
        raw.copy_from_slice(&src[..FRAME_SIZE]);
        src.advance(FRAME_SIZE);

        Ok(Some(Frame::decode(&raw)))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.put_slice(&item.encode());
        Ok(())
    }
}
