//! Test doubles shared by the unit tests

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use crate::monitor::{
    FrameRenderer, MonitorUi, PreviewTargets, SetupEvent, SetupWorkflow, SlotIndex, SlotWidgets,
    WidgetId,
};
use crate::session::{
    AnchorAngles, MediaSource, PreviewPoint, ProjectionMode, Session, SessionError, SessionFactory,
    SessionId, SourceType,
};
use crate::video::{Frame, FrameSignal};

pub const PREVIEW_TARGETS: PreviewTargets = PreviewTargets {
    raw: WidgetId(1),
    result: WidgetId(2),
};

pub fn frame(n: u64) -> Frame {
    Frame::solid(8, 6, [40, 80, 120, 255], n)
}

pub fn camera(locator: &str) -> MediaSource {
    MediaSource::new(SourceType::Camera, "entaniya", locator, "default")
}

/// What a test can observe about a session after handing it off
#[derive(Default)]
pub struct SessionProbe {
    close_calls: Cell<u32>,
    modes: RefCell<Vec<ProjectionMode>>,
    streaming: Cell<bool>,
}

impl SessionProbe {
    pub fn close_calls(&self) -> u32 {
        self.close_calls.get()
    }

    pub fn modes_applied(&self) -> Vec<ProjectionMode> {
        self.modes.borrow().clone()
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.get()
    }
}

pub struct MockSession {
    id: SessionId,
    source: MediaSource,
    mode: ProjectionMode,
    closed: bool,
    pending: VecDeque<Frame>,
    fail_projection: bool,
    fail_stream: bool,
    raw: FrameSignal,
    result: FrameSignal,
    probe: Rc<SessionProbe>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::with_source(camera("0"))
    }

    pub fn with_source(source: MediaSource) -> Self {
        Self {
            id: SessionId::next(),
            source,
            mode: ProjectionMode::Mode1,
            closed: false,
            pending: VecDeque::new(),
            fail_projection: false,
            fail_stream: false,
            raw: FrameSignal::new(),
            result: FrameSignal::new(),
            probe: Rc::new(SessionProbe::default()),
        }
    }

    pub fn probe(&self) -> Rc<SessionProbe> {
        Rc::clone(&self.probe)
    }
}

impl Session for MockSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn source(&self) -> &MediaSource {
        &self.source
    }

    fn projection_mode(&self) -> ProjectionMode {
        self.mode
    }

    fn set_projection_mode(&mut self, mode: ProjectionMode) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::Closed(self.id));
        }
        if self.fail_projection {
            return Err(SessionError::Projection {
                mode,
                reason: "calibration missing".to_string(),
            });
        }
        self.mode = mode;
        self.probe.modes.borrow_mut().push(mode);
        Ok(())
    }

    fn set_anchor_overlay(&mut self, _enabled: bool) {}

    fn move_anchor(&mut self, point: PreviewPoint) -> Option<AnchorAngles> {
        let (u, v) = point.normalized();
        Some(AnchorAngles {
            alpha: u as f64,
            beta: v as f64,
        })
    }

    fn clear_anchor_hover(&mut self) {}

    fn raw_frames(&self) -> &FrameSignal {
        &self.raw
    }

    fn result_frames(&self) -> &FrameSignal {
        &self.result
    }

    fn start_result_stream(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::Closed(self.id));
        }
        if self.fail_stream {
            return Err(SessionError::OpenFailed {
                locator: self.source.locator.clone(),
                reason: "stream stalled".to_string(),
            });
        }
        self.probe.streaming.set(true);
        // One frame ready for the next poll
        self.pending.push_back(frame(0));
        Ok(())
    }

    fn poll(&mut self) -> usize {
        let mut handled = 0;
        while let Some(f) = self.pending.pop_front() {
            self.raw.emit(&f);
            self.result.emit(&f);
            handled += 1;
        }
        handled
    }

    fn close(&mut self) {
        self.probe.close_calls.set(self.probe.close_calls.get() + 1);
        self.closed = true;
        self.probe.streaming.set(false);
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Sessions handed out by `MockFactory`
#[derive(Default)]
pub struct FactoryLog {
    sessions: RefCell<Vec<(SessionId, Rc<SessionProbe>)>>,
    fail_next: Cell<bool>,
    fail_projection_next: Cell<bool>,
    fail_stream_next: Cell<bool>,
}

impl FactoryLog {
    pub fn created(&self) -> usize {
        self.sessions.borrow().len()
    }

    pub fn probe(&self, id: SessionId) -> Rc<SessionProbe> {
        self.sessions
            .borrow()
            .iter()
            .find(|(sid, _)| *sid == id)
            .map(|(_, p)| Rc::clone(p))
            .expect("unknown session id")
    }

    pub fn last(&self) -> (SessionId, Rc<SessionProbe>) {
        let sessions = self.sessions.borrow();
        let (id, probe) = sessions.last().expect("no session created");
        (*id, Rc::clone(probe))
    }

    pub fn fail_next(&self) {
        self.fail_next.set(true);
    }

    /// The next session rejects every projection mode
    pub fn fail_next_projection(&self) {
        self.fail_projection_next.set(true);
    }

    /// The next session fails to start its result stream
    pub fn fail_next_stream(&self) {
        self.fail_stream_next.set(true);
    }
}

#[derive(Default)]
pub struct MockFactory {
    pub log: Rc<FactoryLog>,
}

impl SessionFactory for MockFactory {
    fn create(&mut self, source: &MediaSource) -> Result<Box<dyn Session>, SessionError> {
        if self.log.fail_next.replace(false) {
            return Err(SessionError::OpenFailed {
                locator: source.locator.clone(),
                reason: "device busy".to_string(),
            });
        }
        let mut session = MockSession::with_source(source.clone());
        session.fail_projection = self.log.fail_projection_next.replace(false);
        session.fail_stream = self.log.fail_stream_next.replace(false);
        self.log
            .sessions
            .borrow_mut()
            .push((session.id(), session.probe()));
        Ok(Box::new(session))
    }
}

/// Counts what was painted where
#[derive(Default)]
pub struct RecordingRenderer {
    renders: RefCell<Vec<WidgetId>>,
    clears: RefCell<Vec<WidgetId>>,
}

impl RecordingRenderer {
    pub fn renders_to(&self, widget: WidgetId) -> usize {
        self.renders.borrow().iter().filter(|w| **w == widget).count()
    }

    pub fn clears_of(&self, widget: WidgetId) -> usize {
        self.clears.borrow().iter().filter(|w| **w == widget).count()
    }
}

impl FrameRenderer for RecordingRenderer {
    fn render(&self, widget: WidgetId, _frame: &Frame, _width: u32, _scale_content: bool) {
        self.renders.borrow_mut().push(widget);
    }

    fn clear(&self, widget: WidgetId) {
        self.clears.borrow_mut().push(widget);
    }
}

/// Scripted answers for the picker and the setup dialog
#[derive(Default)]
pub struct UiScript {
    sources: RefCell<VecDeque<Option<MediaSource>>>,
    dialogs: RefCell<VecDeque<Vec<SetupEvent>>>,
    missing_tiles: RefCell<HashSet<SlotIndex>>,
    setup_runs: Cell<u32>,
    parameter_forms: Cell<u32>,
    /// Locator pre-selected in each picker run
    preselected: RefCell<Vec<Option<String>>>,
    /// Last enabled state of each control button
    controls: RefCell<HashMap<WidgetId, bool>>,
    /// Raw preview subscriber counts seen after each dialog event
    raw_subscribers_seen: RefCell<Vec<usize>>,
}

impl UiScript {
    pub fn pick(&self, source: Option<MediaSource>) {
        self.sources.borrow_mut().push_back(source);
    }

    pub fn dialog(&self, events: Vec<SetupEvent>) {
        self.dialogs.borrow_mut().push_back(events);
    }

    pub fn remove_tile(&self, index: SlotIndex) {
        self.missing_tiles.borrow_mut().insert(index);
    }

    pub fn setup_runs(&self) -> u32 {
        self.setup_runs.get()
    }

    pub fn parameter_forms(&self) -> u32 {
        self.parameter_forms.get()
    }

    pub fn preselected(&self) -> Vec<Option<String>> {
        self.preselected.borrow().clone()
    }

    /// Enabled state of tile `index`'s buttons; `None` until first bound
    pub fn controls_enabled(&self, index: SlotIndex) -> Option<bool> {
        let controls = self.controls.borrow();
        let setup = controls.get(&WidgetId(200 + index as u64)).copied();
        let delete = controls.get(&WidgetId(300 + index as u64)).copied();
        assert_eq!(setup, delete, "setup and delete buttons out of step");
        setup
    }

    pub fn raw_subscribers_seen(&self) -> Vec<usize> {
        self.raw_subscribers_seen.borrow().clone()
    }
}

/// `MonitorUi` driven by a `UiScript`
///
/// Unscripted pickers return a fresh camera; unscripted dialogs accept.
#[derive(Default)]
pub struct ScriptedUi {
    pub script: Rc<UiScript>,
    picks: u32,
}

impl MonitorUi for ScriptedUi {
    fn slot_widgets(&self, index: SlotIndex) -> Option<SlotWidgets> {
        if self.script.missing_tiles.borrow().contains(&index) {
            return None;
        }
        let i = index as u64;
        Some(SlotWidgets {
            display: WidgetId(100 + i),
            setup_button: WidgetId(200 + i),
            delete_button: WidgetId(300 + i),
        })
    }

    fn preview_targets(&self) -> PreviewTargets {
        PREVIEW_TARGETS
    }

    fn select_media_source(&mut self, last_used: Option<&MediaSource>) -> Option<MediaSource> {
        self.picks += 1;
        self.script
            .preselected
            .borrow_mut()
            .push(last_used.map(|s| s.locator.clone()));
        let scripted = self.script.sources.borrow_mut().pop_front();
        scripted.unwrap_or_else(|| Some(camera(&self.picks.to_string())))
    }

    fn run_setup(&mut self, workflow: &mut SetupWorkflow<'_>) {
        self.script.setup_runs.set(self.script.setup_runs.get() + 1);
        let events = self
            .script
            .dialogs
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| vec![SetupEvent::Accept]);

        for event in events {
            workflow.pump();
            workflow.handle(event).expect("setup event failed");
            self.script
                .raw_subscribers_seen
                .borrow_mut()
                .push(workflow.session().raw_frames().subscriber_count());
        }
    }

    fn set_slot_controls(&mut self, widgets: SlotWidgets, enabled: bool) {
        let mut controls = self.script.controls.borrow_mut();
        controls.insert(widgets.setup_button, enabled);
        controls.insert(widgets.delete_button, enabled);
    }

    fn open_parameter_form(&mut self) {
        self.script.parameter_forms.set(self.script.parameter_forms.get() + 1);
    }
}
