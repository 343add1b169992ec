//! Round trips over an in-memory duplex transport.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use bytes::{BufMut, Bytes, BytesMut};
use futures_util::{SinkExt, StreamExt};
use kv_codec::{CodecError, FrameCodec, FrameStream};
use mcbp_protocol::ops::{Hello, ObserveSeqno};
use mcbp_protocol::{MutationToken, OpaqueGenerator, Operation, ResponseStatus};
use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

fn response(opcode: u8, opaque: u32, value: &[u8]) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_u8(0x81);
    buf.put_u8(opcode);
    buf.put_u16(0);
    buf.put_u8(0);
    buf.put_u8(0);
    buf.put_u16(0);
    buf.put_u32(value.len() as u32);
    buf.put_u32(opaque);
    buf.put_u64(0);
    buf.put_slice(value);
    buf.freeze()
}

#[tokio::test]
async fn hello_round_trip() {
    let (client, mut server) = duplex(1024);
    let opaques = OpaqueGenerator::new();

    let mut hello = Hello::new(Hello::build_key(1, "test"), vec![0x04, 0x07]);
    hello.common_mut().opaque = opaques.next();

    let server_task = tokio::spawn(async move {
        let mut header = [0u8; 24];
        server.read_exact(&mut header).await.unwrap();
        let body_len = u32::from_be_bytes([header[8], header[9], header[10], header[11]]) as usize;
        let mut body = vec![0u8; body_len];
        server.read_exact(&mut body).await.unwrap();
        let opaque = u32::from_be_bytes([header[12], header[13], header[14], header[15]]);

        let reply = response(0x1f, opaque, &[0x00, 0x04]);
        // Write in two pieces to exercise reassembly.
        server.write_all(&reply[..10]).await.unwrap();
        server.flush().await.unwrap();
        server.write_all(&reply[10..]).await.unwrap();
        header[1]
    });

    let mut stream = FrameStream::new(client);
    stream.round_trip(&mut hello).await.unwrap();

    assert_eq!(server_task.await.unwrap(), 0x1f);
    assert!(hello.success());
    assert_eq!(hello.common().attempts, 1);
    assert_eq!(hello.value(), vec![0x04]);
}

#[tokio::test]
async fn opaque_mismatch_is_rejected() {
    let (client, mut server) = duplex(1024);
    let mut op = ObserveSeqno::new(MutationToken::new(7, 1, 1));
    op.common_mut().opaque = 10;

    tokio::spawn(async move {
        let mut request = [0u8; 32];
        server.read_exact(&mut request).await.unwrap();
        server.write_all(&response(0x91, 11, &[])).await.unwrap();
    });

    let mut stream = FrameStream::new(client);
    let err = stream.round_trip(&mut op).await.unwrap_err();
    assert!(matches!(
        err,
        CodecError::OpaqueMismatch {
            expected: 10,
            actual: 11
        }
    ));
    assert!(op.common().response().is_none());
}

#[tokio::test]
async fn closed_connection_is_reported() {
    let (client, server) = duplex(1024);
    drop(server);

    let mut op = ObserveSeqno::new(MutationToken::new(7, 1, 1));
    let mut stream = FrameStream::new(client);
    let err = stream.round_trip(&mut op).await.unwrap_err();
    assert!(matches!(err, CodecError::Io(_) | CodecError::ConnectionClosed));
}

#[tokio::test]
async fn server_error_status_reaches_operation() {
    let (client, mut server) = duplex(1024);
    let mut op = ObserveSeqno::new(MutationToken::new(7, 1, 1));

    tokio::spawn(async move {
        let mut request = [0u8; 32];
        server.read_exact(&mut request).await.unwrap();
        let mut reply = BytesMut::from(&response(0x91, 0, &[])[..]);
        reply[7] = 0x07;
        server.write_all(&reply).await.unwrap();
    });

    let mut stream = FrameStream::new(client);
    stream.round_trip(&mut op).await.unwrap();
    assert_eq!(
        op.common().status(),
        ResponseStatus::VBucketBelongsToAnotherServer
    );
}

#[tokio::test]
async fn stream_yields_frames_in_order() {
    let (client, mut server) = duplex(1024);
    let mut stream = FrameStream::with_codec(client, FrameCodec::new().with_max_frame_size(1024));

    let mut both = BytesMut::new();
    both.extend_from_slice(&response(0x00, 1, b"one"));
    both.extend_from_slice(&response(0x00, 2, b"two"));
    server.write_all(&both).await.unwrap();

    let first = stream.next().await.unwrap().unwrap();
    let second = stream.next().await.unwrap().unwrap();
    assert_eq!(first.opaque(), 1);
    assert_eq!(second.opaque(), 2);
    assert_eq!(&second.raw[24..], b"two");

    stream.send(Bytes::from_static(b"ping")).await.unwrap();
    let mut echoed = [0u8; 4];
    server.read_exact(&mut echoed).await.unwrap();
    assert_eq!(&echoed, b"ping");
}

#[tokio::test]
async fn scripted_transport_round_trip() {
    let mut op = ObserveSeqno::new(MutationToken::new(7, 0x0102, 1));
    op.common_mut().opaque = 5;
    let request = op.write().unwrap();

    let mut value = BytesMut::new();
    value.put_u8(0);
    value.put_u16(7);
    value.put_u64(0x0102);
    value.put_u64(40);
    value.put_u64(42);
    let reply = response(0x91, 5, &value);

    let transport = tokio_test::io::Builder::new()
        .write(&request)
        .read(&reply)
        .build();
    let mut stream = FrameStream::new(transport);
    stream.round_trip(&mut op).await.unwrap();

    assert!(op.success());
    let state = op.value();
    assert_eq!(state.last_persisted_seqno, 40);
    assert_eq!(state.current_seqno, 42);
}
