//! Wire-level tests against hand-built frames.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use bytes::{BufMut, Bytes, BytesMut};
use mcbp_protocol::ops::{Counter, Hello, Observe, ObserveSeqno, SubDocLookup, SubDocMutation};
use mcbp_protocol::{MutationToken, OpCode, Operation, ResponseStatus};
use proptest::prelude::*;

fn response(opcode: OpCode, extras: &[u8], value: &[u8], declared: Option<u32>) -> Bytes {
    let body_len = declared.unwrap_or((extras.len() + value.len()) as u32);
    let mut buf = BytesMut::new();
    buf.put_u8(0x81);
    buf.put_u8(opcode as u8);
    buf.put_u16(0);
    buf.put_u8(extras.len() as u8);
    buf.put_u8(0);
    buf.put_u16(0);
    buf.put_u32(body_len);
    buf.put_u32(0xDEAD_BEEF);
    buf.put_u64(0);
    buf.put_slice(extras);
    buf.put_slice(value);
    buf.freeze()
}

#[test]
fn observe_seqno_request_is_byte_exact() {
    let mut op = ObserveSeqno::new(MutationToken::new(7, 0x1122_3344_5566_7788, 0));
    op.common_mut().opaque = 0x0102_0304;

    let frame = op.write().unwrap();

    #[rustfmt::skip]
    let expected: [u8; 32] = [
        0x80, 0x91, 0x00, 0x00,             // magic, opcode, key length
        0x00, 0x00, 0x00, 0x07,             // extras length, datatype, vbucket
        0x00, 0x00, 0x00, 0x08,             // total body length
        0x01, 0x02, 0x03, 0x04,             // opaque
        0x00, 0x00, 0x00, 0x00,             // cas
        0x00, 0x00, 0x00, 0x00,
        0x11, 0x22, 0x33, 0x44,             // vbucket uuid
        0x55, 0x66, 0x77, 0x88,
    ];
    assert_eq!(&frame[..], &expected[..]);
}

#[test]
fn observe_seqno_hard_failover_response() {
    let mut value = BytesMut::new();
    value.put_u8(1);
    value.put_u16(7);
    value.put_u64(0x1122_3344_5566_7788);
    value.put_u64(1000);
    value.put_u64(1010);
    value.put_u64(0x99AA_BBCC_DDEE_FF00);
    value.put_u64(990);
    assert_eq!(value.len(), 43);

    let mut op = ObserveSeqno::new(MutationToken::new(7, 0x1122_3344_5566_7788, 1005));
    op.read(response(OpCode::ObserveSeqno, &[], &value, None));
    assert!(op.success());

    let parsed = op.value();
    assert!(parsed.is_hard_failover);
    assert_eq!(parsed.vbucket_id, 7);
    assert_eq!(parsed.vbucket_uuid, 0x1122_3344_5566_7788);
    assert_eq!(parsed.last_persisted_seqno, 1000);
    assert_eq!(parsed.current_seqno, 1010);
    assert_eq!(parsed.old_vbucket_uuid, 0x99AA_BBCC_DDEE_FF00);
    assert_eq!(parsed.last_seqno_received, 990);
    assert_eq!(op.common().status(), ResponseStatus::Success);
}

#[test]
fn hello_odd_body_truncates_to_whole_slots() {
    for n in 1..=6usize {
        let mut value = Vec::new();
        for code in 0..n as u16 {
            value.extend_from_slice(&(code + 1).to_be_bytes());
        }
        value.pop();
        assert_eq!(value.len(), 2 * n - 1);

        let mut hello = Hello::new("client", vec![1, 2, 3]);
        hello.read(response(OpCode::Hello, &[], &value, None));
        let features = hello.value();
        assert_eq!(features.len(), n - 1);
        assert_eq!(features, (1..n as u16).collect::<Vec<_>>());
        assert!(hello.success());
    }
}

#[test]
fn hello_frame_shorter_than_declared() {
    let mut hello = Hello::new("client", vec![4, 7]);
    hello.read(response(OpCode::Hello, &[], &[0x00, 0x04, 0x00], Some(4)));
    assert_eq!(hello.value(), vec![4]);
    assert!(hello.success());
}

#[test]
fn truncated_observe_is_client_failure() {
    let mut op = Observe::new("doc", 3);
    op.read(response(OpCode::Observe, &[], &[0x00, 0x03, 0x00, 0x03, b'd'], None));
    let state = op.value();
    assert!(state.key.is_empty());
    assert_eq!(op.common().status(), ResponseStatus::ClientFailure);
    assert!(op.common().fault().is_some());
}

#[test]
fn truncated_counter_is_client_failure() {
    let mut op = Counter::increment("hits");
    op.read(response(OpCode::Increment, &[], &[0, 0, 1], None));
    assert_eq!(op.value(), 0);
    assert_eq!(op.common().status(), ResponseStatus::ClientFailure);
}

#[test]
fn declared_length_beyond_frame_is_client_failure() {
    let mut op = SubDocLookup::get("doc", "path");
    op.read(response(OpCode::SubGet, &[], b"abc", Some(10)));
    assert!(op.value().is_empty());
    assert_eq!(op.common().status(), ResponseStatus::ClientFailure);
}

#[test]
fn retry_copy_preserves_identity() {
    let mut op = SubDocMutation::upsert("doc", "p", "1").with_vbucket(2);
    op.common_mut().opaque = 44;
    op.common_mut().attempts = 1;
    op.read(response(OpCode::SubDictUpsert, &[], &[], None));

    let copy = op.clone_for_retry();
    assert_eq!(copy.common().opaque, 44);
    assert_eq!(copy.common().attempts, 1);
    assert_eq!(copy.common().vbucket_id, Some(2));
    assert_eq!(copy.common().created_at, op.common().created_at);
    assert!(copy.common().response().is_none());
    assert_eq!(copy.write().unwrap(), op.write().unwrap());
}

proptest! {
    #[test]
    fn parsing_arbitrary_bytes_never_panics(raw in proptest::collection::vec(any::<u8>(), 0..128)) {
        let frame = Bytes::from(raw);

        let mut seqno = ObserveSeqno::new(MutationToken::new(1, 2, 3));
        seqno.read(frame.clone());
        let _ = seqno.value();

        let mut hello = Hello::new("k", vec![1]);
        hello.read(frame.clone());
        let _ = hello.value();

        let mut observe = Observe::new("k", 1);
        observe.read(frame.clone());
        let _ = observe.value();

        let mut counter = Counter::increment("k").with_vbucket(1);
        counter.read(frame.clone());
        let _ = counter.value();

        let mut mutation = SubDocMutation::upsert("k", "p", "1").with_vbucket(1);
        mutation.read(frame.clone());
        let _ = mutation.value();

        let mut lookup = SubDocLookup::get("k", "p");
        lookup.read(frame);
        let _ = lookup.value();
    }

    #[test]
    fn arbitrary_body_after_valid_header_never_panics(
        extras_len in 0u8..32,
        key_len in 0u16..32,
        body_len in 0u32..256,
        tail in proptest::collection::vec(any::<u8>(), 0..128),
    ) {
        let mut buf = BytesMut::new();
        buf.put_u8(0x81);
        buf.put_u8(0x91);
        buf.put_u16(key_len);
        buf.put_u8(extras_len);
        buf.put_u8(0);
        buf.put_u16(0);
        buf.put_u32(body_len);
        buf.put_u32(0);
        buf.put_u64(0);
        buf.put_slice(&tail);
        let frame = buf.freeze();

        let mut seqno = ObserveSeqno::new(MutationToken::new(1, 2, 3));
        seqno.read(frame.clone());
        let _ = seqno.value();

        let mut observe = Observe::new("k", 1);
        observe.read(frame.clone());
        let _ = observe.value();

        let mut counter = Counter::decrement("k").with_vbucket(1);
        counter.read(frame);
        let _ = counter.value();
    }
}
