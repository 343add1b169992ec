//! Parse arbitrary response frames with every operation kind.

#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use mcbp_protocol::ops::{Counter, Hello, Observe, ObserveSeqno, SubDocLookup, SubDocMutation};
use mcbp_protocol::{MutationToken, Operation};

fn exercise<O: Operation>(mut op: O, frame: &Bytes) {
    op.read(frame.clone());
    let _ = op.success();
    let _ = op.value();
}

fuzz_target!(|data: &[u8]| {
    let frame = Bytes::copy_from_slice(data);
    exercise(ObserveSeqno::new(MutationToken::new(3, 0xfeed, 1)), &frame);
    exercise(Hello::new(Hello::build_key(1, "fuzz"), vec![0x04]), &frame);
    exercise(Observe::new("key", 3), &frame);
    exercise(SubDocLookup::get("key", "a.b"), &frame);
    exercise(SubDocMutation::upsert("key", "a.b", Bytes::from_static(b"1")), &frame);
    exercise(Counter::increment("key"), &frame);
});
