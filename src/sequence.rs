//! Sequence-affinity checking.
//!
//! The registry, bridge, rewrite buffer and session are built on one logical
//! sequence and are not safe for concurrent mutation. Each embeds a
//! `SequenceChecker` that records the constructing thread; every subsequent
//! call is verified against it in debug builds. A cross-sequence call is a
//! construction-order bug in the embedding host, not a recoverable failure.

use std::thread::{self, ThreadId};

#[derive(Debug, Clone)]
pub(crate) struct SequenceChecker {
    owner: ThreadId,
}

impl SequenceChecker {
    pub fn new() -> Self {
        SequenceChecker { owner: thread::current().id() }
    }

    #[track_caller]
    pub fn check(&self) {
        debug_assert_eq!(
            thread::current().id(),
            self.owner,
            "called off the owning sequence; the embedding host must construct and drive this object on one thread"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_thread_use_is_accepted() {
        let checker = SequenceChecker::new();
        checker.check();
        checker.check();
    }

    #[cfg(debug_assertions)]
    #[test]
    fn cross_thread_use_is_rejected_in_debug_builds() {
        let checker = SequenceChecker::new();
        let joined = thread::spawn(move || checker.check()).join();
        assert!(joined.is_err());
    }
}
