//! Frame types and frame notification channels
//!
//! Frames are produced by a session's capture loop and delivered to
//! subscribers on the UI thread through a `FrameSignal`.

mod frame;
mod signal;

pub use frame::Frame;
pub use signal::{FrameCallback, FrameSignal, Subscription};
