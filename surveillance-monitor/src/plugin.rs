//! Plugin descriptor
//!
//! The host application lists plugins by their metadata and asks the
//! selected one to build its controller.

use std::rc::Rc;

use crate::monitor::{FrameRenderer, MonitorError, MonitorManager, MonitorUi};
use crate::session::SessionFactory;
use crate::settings::MonitorPreferences;

/// Metadata every plugin exposes to the host
pub trait PluginDefinition {
    /// Unique identifier (e.g., "surveillance")
    fn plugin_id(&self) -> &'static str;

    /// Human-readable name shown in the plugin list
    fn display_name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Icon file, relative to the plugin directory
    fn icon(&self) -> &'static str;
}

/// The surveillance monitor plugin
#[derive(Debug, Default, Clone, Copy)]
pub struct SurveillancePlugin;

impl SurveillancePlugin {
    /// Build the monitor grid controller for the host's UI binding
    pub fn create_controller<F: SessionFactory, U: MonitorUi>(
        &self,
        factory: F,
        ui: U,
        renderer: Rc<dyn FrameRenderer>,
        prefs: MonitorPreferences,
    ) -> Result<MonitorManager<F, U>, MonitorError> {
        tracing::info!(plugin = self.plugin_id(), "Creating controller");
        MonitorManager::new(factory, ui, renderer, prefs)
    }
}

impl PluginDefinition for SurveillancePlugin {
    fn plugin_id(&self) -> &'static str {
        "surveillance"
    }

    fn display_name(&self) -> &'static str {
        "Surveillance"
    }

    fn description(&self) -> &'static str {
        "This is our plugin application for the surveillance camera project"
    }

    fn icon(&self) -> &'static str {
        "icon.png"
    }
}
