//! Surveillance Monitor Library
//!
//! Lifecycle management for an eight-tile grid of fisheye camera monitors:
//! slot registry, per-session setup workflow with live previews, and the
//! manager that commits, replaces and tears down sessions.

pub mod monitor;
pub mod plugin;
pub mod session;
pub mod settings;
pub mod telemetry;
pub mod video;

#[cfg(test)]
mod testing;

pub use monitor::{
    FrameRenderer, MonitorAction, MonitorError, MonitorManager, MonitorOutcome, MonitorUi,
    SetupEvent, SetupWorkflow, SlotIndex, SlotRegistry, MAX_MONITOR_INDEX,
};
pub use plugin::{PluginDefinition, SurveillancePlugin};
pub use session::{MediaSource, ProjectionMode, Session, SessionFactory, SessionId, SourceType};
pub use settings::MonitorPreferences;
pub use video::{Frame, FrameSignal, Subscription};
