//! Cooperative cancellation (ambient)
//!
//! The simulator is synchronous and single-threaded; cancellation is a
//! polled flag checked between simulation steps rather than anything
//! async. `CancellationToken` is cheaply cloned and shared between the
//! caller (which may flip it from another thread, e.g. a UI cancel
//! button) and the roster/duty simulators (which only ever read it).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
