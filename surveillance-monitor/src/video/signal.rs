//! Frame notification channel
//!
//! A `FrameSignal` fans a produced frame out to every connected callback.
//! Connecting returns a `Subscription` handle; the callback stays connected
//! until the handle is released (explicitly or on drop). Releasing twice is
//! a no-op.
//!
//! Signals live on the UI thread only. Sessions hand frames over from their
//! capture threads through a channel and emit them from `Session::poll`.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::Frame;

/// Callback invoked with each emitted frame
pub type FrameCallback = Box<dyn FnMut(&Frame)>;

type SharedCallback = Rc<RefCell<FrameCallback>>;

#[derive(Default)]
struct SignalInner {
    next_id: u64,
    callbacks: Vec<(u64, SharedCallback)>,
}

/// Single-threaded frame notification channel
#[derive(Default)]
pub struct FrameSignal {
    inner: Rc<RefCell<SignalInner>>,
}

impl FrameSignal {
    /// Create a signal with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a callback, returning the handle that keeps it connected
    pub fn connect(&self, callback: impl FnMut(&Frame) + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner
            .callbacks
            .push((id, Rc::new(RefCell::new(Box::new(callback)))));

        Subscription {
            signal: Rc::downgrade(&self.inner),
            id,
            released: false,
        }
    }

    /// Deliver a frame to every connected callback, returning how many ran
    ///
    /// The callback list is snapshotted first so a callback may release its
    /// own (or another) subscription while the frame is being delivered. A
    /// callback released that way is not invoked for the current frame.
    pub fn emit(&self, frame: &Frame) -> usize {
        let snapshot: Vec<(u64, SharedCallback)> = self
            .inner
            .borrow()
            .callbacks
            .iter()
            .map(|(id, cb)| (*id, Rc::clone(cb)))
            .collect();

        let mut delivered = 0;
        for (id, callback) in snapshot {
            if !self.is_connected(id) {
                continue;
            }
            // Skip callbacks already running further up the stack
            if let Ok(mut cb) = callback.try_borrow_mut() {
                (&mut **cb)(frame);
                delivered += 1;
            }
        }
        delivered
    }

    fn is_connected(&self, id: u64) -> bool {
        self.inner.borrow().callbacks.iter().any(|(cid, _)| *cid == id)
    }

    /// Number of connected callbacks
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().callbacks.len()
    }
}

impl std::fmt::Debug for FrameSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSignal")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Handle for one connected callback
///
/// Must be released exactly once; the `released` flag turns every later
/// release (including the one on drop) into a no-op.
#[must_use = "dropping a Subscription disconnects its callback"]
pub struct Subscription {
    signal: Weak<RefCell<SignalInner>>,
    id: u64,
    released: bool,
}

impl Subscription {
    /// Disconnect the callback
    ///
    /// Returns `true` only for the call that actually disconnected it.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;

        // Signal already gone together with its session
        let Some(inner) = self.signal.upgrade() else {
            return false;
        };

        // The callback is dropped outside the borrow so its captures may
        // release their own subscriptions
        let removed = {
            let mut inner = inner.borrow_mut();
            inner
                .callbacks
                .iter()
                .position(|(id, _)| *id == self.id)
                .map(|pos| inner.callbacks.remove(pos))
        };
        removed.is_some()
    }

    /// Whether `release` has been called
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("released", &self.released)
            .finish()
    }
}
