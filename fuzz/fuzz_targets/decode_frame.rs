//! Feed arbitrary bytes to the frame decoder in arbitrary chunks.

#![no_main]

use bytes::BytesMut;
use kv_codec::FrameCodec;
use libfuzzer_sys::fuzz_target;
use tokio_util::codec::Decoder;

fuzz_target!(|input: (u16, &[u8])| {
    let (chunk, data) = input;
    let chunk = usize::from(chunk.max(1));
    let mut codec = FrameCodec::new().with_max_frame_size(64 * 1024);
    let mut buf = BytesMut::new();

    for piece in data.chunks(chunk) {
        buf.extend_from_slice(piece);
        loop {
            match codec.decode(&mut buf) {
                Ok(Some(frame)) => {
                    assert!(frame.len() >= mcbp_protocol::HEADER_LEN);
                }
                Ok(None) => break,
                Err(_) => return,
            }
        }
    }
});
