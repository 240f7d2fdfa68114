//! Progress and cancellation hooks for the growth loop
//!
//! The engine signals one unit per resolved sample and polls
//! [`Progress::is_cancelled`] once per iteration. Implementations must not
//! block.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Receiver of per-sample progress signals
pub trait Progress {
    /// One more sample is resolved
    fn on_unit_complete(&mut self);

    /// Polled before each extraction; `true` stops the run early
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Discards every signal
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn on_unit_complete(&mut self) {}
}

/// Counts signals; clones share the same counter
#[derive(Debug, Clone, Default)]
pub struct CountingProgress {
    count: Arc<AtomicU64>,
}

impl CountingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl Progress for CountingProgress {
    fn on_unit_complete(&mut self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }
}

/// Closures receive the running total of completed units
pub struct FnProgress<F: FnMut(u64)> {
    callback: F,
    completed: u64,
}

impl<F: FnMut(u64)> FnProgress<F> {
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            completed: 0,
        }
    }
}

impl<F: FnMut(u64)> Progress for FnProgress<F> {
    fn on_unit_complete(&mut self) {
        self.completed += 1;
        (self.callback)(self.completed);
    }
}

impl<P: Progress + ?Sized> Progress for &mut P {
    fn on_unit_complete(&mut self) {
        (**self).on_unit_complete();
    }

    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

impl<P: Progress + ?Sized> Progress for Box<P> {
    fn on_unit_complete(&mut self) {
        (**self).on_unit_complete();
    }

    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

/// Shared cancellation trigger
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Adds a [`CancelFlag`] to any progress sink
pub struct Cancellable<P> {
    inner: P,
    flag: CancelFlag,
}

impl<P: Progress> Cancellable<P> {
    pub fn new(inner: P, flag: CancelFlag) -> Self {
        Self { inner, flag }
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: Progress> Progress for Cancellable<P> {
    fn on_unit_complete(&mut self) {
        self.inner.on_unit_complete();
    }

    fn is_cancelled(&self) -> bool {
        self.flag.is_set() || self.inner.is_cancelled()
    }
}
