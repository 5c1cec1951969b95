//! Monitor grid: slot registry, setup workflow and the manager tying them
//! to sessions and widgets

mod manager;
mod registry;
mod setup;
mod ui;

pub use manager::{MonitorAction, MonitorError, MonitorManager, MonitorOutcome};
pub use registry::{SlotIndex, SlotOccupant, SlotRegistry, MAX_MONITOR_INDEX};
pub use setup::{
    PreviewConfig, SetupError, SetupEvent, SetupOutcome, SetupState, SetupWorkflow,
};
pub use ui::{FrameRenderer, MonitorUi, PreviewTargets, SlotWidgets, WidgetId};
