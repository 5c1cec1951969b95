//! Surveillance Monitor - Headless Demo
//!
//! Drives the monitor grid with synthetic camera sessions and a scripted
//! UI binding: fills every tile, streams for a moment, reconfigures one tile
//! and shuts down.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use surveillance_monitor::monitor::{PreviewTargets, SlotWidgets, WidgetId};
use surveillance_monitor::session::{PreviewPoint, SyntheticSessionFactory};
use surveillance_monitor::telemetry::{init_logging, LogConfig};
use surveillance_monitor::{
    Frame, FrameRenderer, MediaSource, MonitorAction, MonitorOutcome, MonitorPreferences,
    MonitorUi, PluginDefinition, ProjectionMode, SetupEvent, SetupWorkflow, SlotIndex, SourceType,
    SurveillancePlugin,
};

const STREAM_DURATION: Duration = Duration::from_secs(2);
const PUMP_INTERVAL: Duration = Duration::from_millis(15);
const RECONFIGURED_SLOT: SlotIndex = 3;

/// Renderer that scales frames the way a tile would and counts them
#[derive(Default)]
struct LogRenderer {
    rendered: RefCell<HashMap<WidgetId, u64>>,
}

impl LogRenderer {
    fn total(&self) -> u64 {
        self.rendered.borrow().values().sum()
    }
}

impl FrameRenderer for LogRenderer {
    fn render(&self, widget: WidgetId, frame: &Frame, width: u32, scale_content: bool) {
        let shown = if scale_content {
            frame.downscale(width, frame.scaled_height(width))
        } else {
            frame.fit_width(width)
        };
        tracing::trace!(%widget, frame = frame.frame_number, w = shown.width, h = shown.height, "render");
        *self.rendered.borrow_mut().entry(widget).or_default() += 1;
    }

    fn clear(&self, widget: WidgetId) {
        tracing::debug!(%widget, "clear");
    }
}

/// Scripted stand-in for the widget toolkit
struct HeadlessUi {
    picks: u32,
}

impl MonitorUi for HeadlessUi {
    fn slot_widgets(&self, index: SlotIndex) -> Option<SlotWidgets> {
        let base = index as u64 * 10;
        Some(SlotWidgets {
            display: WidgetId(base),
            setup_button: WidgetId(base + 1),
            delete_button: WidgetId(base + 2),
        })
    }

    fn preview_targets(&self) -> PreviewTargets {
        PreviewTargets {
            raw: WidgetId(1),
            result: WidgetId(2),
        }
    }

    fn select_media_source(&mut self, last_used: Option<&MediaSource>) -> Option<MediaSource> {
        if let Some(last) = last_used {
            tracing::debug!(last = %last.display_name(), "Picker opened");
        }
        self.picks += 1;
        Some(MediaSource::new(
            SourceType::Camera,
            "entaniya",
            format!("synthetic://{}", self.picks),
            "default",
        ))
    }

    fn run_setup(&mut self, workflow: &mut SetupWorkflow<'_>) {
        let anchor = PreviewPoint {
            x: 200.0,
            y: 140.0,
            preview_width: 320,
            preview_height: 240,
        };
        let script = [
            SetupEvent::PointerPressed(anchor),
            SetupEvent::SelectMode(ProjectionMode::Mode2),
            SetupEvent::SelectMode(ProjectionMode::Mode1),
            SetupEvent::PointerLeft,
            SetupEvent::Accept,
        ];

        for event in script {
            thread::sleep(PUMP_INTERVAL);
            workflow.pump();
            if let Err(e) = workflow.handle(event) {
                tracing::error!("Setup event {:?} failed: {}", event, e);
                return;
            }
        }
        if let Some(angles) = workflow.last_anchor() {
            tracing::info!(alpha = angles.alpha, beta = angles.beta, "Anchor placed");
        }
    }
}

fn main() {
    let log_config = LogConfig::from_env();
    // Keep the guard alive for the program duration
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    let plugin = SurveillancePlugin;
    tracing::info!("{} v{}", plugin.display_name(), env!("CARGO_PKG_VERSION"));

    let preferences = MonitorPreferences::load();
    let factory = SyntheticSessionFactory {
        frame_rate: preferences.synthetic_fps,
        ..SyntheticSessionFactory::default()
    };
    let renderer = Rc::new(LogRenderer::default());
    let dyn_renderer: Rc<dyn FrameRenderer> = renderer.clone();

    let mut controller = match plugin.create_controller(factory, HeadlessUi { picks: 0 }, dyn_renderer, preferences) {
        Ok(controller) => controller,
        Err(e) => {
            tracing::error!("Failed to create controller: {}", e);
            return;
        }
    };

    loop {
        match controller.handle(MonitorAction::Add) {
            Ok(MonitorOutcome::GridFull) => break,
            Ok(outcome) => tracing::debug!(?outcome, "Add"),
            Err(e) => {
                tracing::error!("Add failed: {}", e);
                break;
            }
        }
    }
    tracing::info!(slots = ?controller.used_slots(), "Grid filled");

    let started = Instant::now();
    while started.elapsed() < STREAM_DURATION {
        controller.pump_frames();
        thread::sleep(PUMP_INTERVAL);
    }

    match controller.handle(MonitorAction::Setup(RECONFIGURED_SLOT)) {
        Ok(outcome) => tracing::info!(?outcome, "Reconfigure"),
        Err(e) => tracing::error!("Reconfigure failed: {}", e),
    }
    controller.pump_frames();

    if let Err(e) = controller.prefs().save() {
        tracing::warn!("Failed to save preferences: {}", e);
    }

    controller.shutdown();
    tracing::info!(frames = renderer.total(), "Shutdown complete");
}
