//! Concrete operations.

pub mod counter;
pub mod hello;
pub mod observe;
pub mod observe_seqno;
pub mod subdoc;

pub use counter::Counter;
pub use hello::{Hello, ServerFeature};
pub use observe::{KeyState, Observe, ObserveState};
pub use observe_seqno::{ObserveSeqno, ObserveSeqnoResponse};
pub use subdoc::{DocFlags, PathFlags, SubDocLookup, SubDocMutation};
