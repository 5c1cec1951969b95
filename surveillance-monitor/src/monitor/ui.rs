//! UI binding for the monitor grid
//!
//! The widget toolkit is an external collaborator. The grid talks to it
//! through two traits: `FrameRenderer` paints frames into widgets, and
//! `MonitorUi` supplies widget handles, media source selection and the
//! modal setup dialog.

use std::fmt;

use super::registry::SlotIndex;
use super::setup::SetupWorkflow;
use crate::session::MediaSource;
use crate::video::Frame;

/// Opaque handle to a toolkit widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(pub u64);

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "widget#{}", self.0)
    }
}

/// Widgets belonging to one monitor tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotWidgets {
    /// Label showing the projected feed
    pub display: WidgetId,
    /// Button that reopens the setup dialog for this tile
    pub setup_button: WidgetId,
    /// Button that removes the monitor from this tile
    pub delete_button: WidgetId,
}

/// Preview labels inside the setup dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewTargets {
    /// Fisheye preview (also receives pointer input)
    pub raw: WidgetId,
    /// Projected preview
    pub result: WidgetId,
}

/// Paints frames into widgets
pub trait FrameRenderer {
    /// Show `frame` in `widget`, scaled to `width`
    fn render(&self, widget: WidgetId, frame: &Frame, width: u32, scale_content: bool);

    /// Blank the widget
    fn clear(&self, widget: WidgetId);
}

/// Toolkit side of the monitor grid
pub trait MonitorUi {
    /// Widgets for tile `index`; `None` if the layout lacks that tile
    fn slot_widgets(&self, index: SlotIndex) -> Option<SlotWidgets>;

    /// Preview labels of the setup dialog
    fn preview_targets(&self) -> PreviewTargets;

    /// Ask the user for a media source, pre-selecting the last one used;
    /// `None` means the picker was cancelled
    fn select_media_source(&mut self, last_used: Option<&MediaSource>) -> Option<MediaSource>;

    /// Enable or disable a tile's setup and delete buttons
    fn set_slot_controls(&mut self, widgets: SlotWidgets, enabled: bool) {
        tracing::debug!(
            setup = %widgets.setup_button,
            delete = %widgets.delete_button,
            enabled,
            "Slot controls updated"
        );
    }

    /// Run the setup dialog modally, feeding its events into `workflow`
    ///
    /// Returning before an exit event is treated as the dialog being closed.
    fn run_setup(&mut self, workflow: &mut SetupWorkflow<'_>);

    /// Open the camera parameter (calibration) form
    fn open_parameter_form(&mut self) {
        tracing::debug!("Camera parameter form not available in this UI");
    }
}
