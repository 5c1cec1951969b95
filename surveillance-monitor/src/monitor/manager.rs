//! Monitor manager
//!
//! Orchestrates the eight-tile grid: picking a media source, building a
//! session, running the setup workflow and committing, replacing or tearing
//! down the session held by each slot.
//!
//! The manager is the sole owner of every committed session. A session is
//! closed exactly once, when it leaves the grid (or when a candidate is
//! rejected during setup).

use std::rc::Rc;

use super::registry::{SlotIndex, SlotRegistry, MAX_MONITOR_INDEX};
use super::setup::{SetupError, SetupOutcome, SetupWorkflow};
use super::ui::{FrameRenderer, MonitorUi, SlotWidgets};
use crate::session::{MediaSource, Session, SessionError, SessionFactory, SessionId};
use crate::settings::MonitorPreferences;
use crate::video::Subscription;

/// Result of a grid operation that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// A new session was committed to the slot
    Committed(SlotIndex),
    /// The slot's session was replaced by a reconfigured one
    Replaced(SlotIndex),
    /// The slot's session was torn down
    Deleted(SlotIndex),
    /// The user cancelled the source picker or the setup dialog
    Cancelled,
    /// Every slot is occupied; the request was dropped
    GridFull,
    /// Nothing to do (empty or unbound slot, unknown session)
    NoOp,
}

/// Actions raised by the grid's widgets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorAction {
    /// "Add" toolbar button
    Add,
    /// A tile's setup button
    Setup(SlotIndex),
    /// A tile's delete button
    Delete(SlotIndex),
    /// "Parameters" toolbar button
    OpenParameters,
    /// "Fisheye" toolbar button
    Fisheye,
    /// "Recorded" toolbar button
    Recorded,
    /// "Captured" toolbar button
    Captured,
}

/// Monitor manager errors
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("monitor layout has no widgets for slot {0}")]
    MissingSlotWidgets(SlotIndex),

    #[error("slot {0} is outside the monitor grid")]
    InvalidSlot(SlotIndex),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Setup(#[from] SetupError),
}

/// Per-tile state built once at startup
struct MonitorTile {
    widgets: SlotWidgets,
    /// Source the setup button re-opens; `None` while the button is unbound
    bound_source: Option<MediaSource>,
    /// The tile display's subscription to the session's result frames
    feed: Option<Subscription>,
}

/// Owner of the monitor grid
pub struct MonitorManager<F: SessionFactory, U: MonitorUi> {
    factory: F,
    ui: U,
    renderer: Rc<dyn FrameRenderer>,
    prefs: MonitorPreferences,
    tiles: Vec<MonitorTile>,
    registry: SlotRegistry<Box<dyn Session>>,
}

impl<F: SessionFactory, U: MonitorUi> MonitorManager<F, U> {
    /// Build the manager, resolving every tile's widgets up front
    pub fn new(
        factory: F,
        ui: U,
        renderer: Rc<dyn FrameRenderer>,
        prefs: MonitorPreferences,
    ) -> Result<Self, MonitorError> {
        let tiles = (1..=MAX_MONITOR_INDEX)
            .map(|index| {
                ui.slot_widgets(index)
                    .map(|widgets| MonitorTile {
                        widgets,
                        bound_source: None,
                        feed: None,
                    })
                    .ok_or(MonitorError::MissingSlotWidgets(index))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            factory,
            ui,
            renderer,
            prefs,
            tiles,
            registry: SlotRegistry::new(),
        })
    }

    /// Fill the first empty slot with a new monitor
    pub fn add(&mut self) -> Result<MonitorOutcome, MonitorError> {
        let Some(&index) = self.registry.get_empty_slots().first() else {
            tracing::info!("Monitor grid full, add ignored");
            return Ok(MonitorOutcome::GridFull);
        };

        let Some(source) = self.ui.select_media_source(self.prefs.last_source.as_ref()) else {
            tracing::debug!("Media source selection cancelled");
            return Ok(MonitorOutcome::Cancelled);
        };

        let mut session = self.factory.create(&source)?;
        if !self.setup_candidate(session.as_mut())? {
            tracing::info!(slot = index, "Setup rejected, discarding new monitor");
            return Ok(MonitorOutcome::Cancelled);
        }

        let feed = self.start_display_feed(index, session.as_mut())?;
        self.install(index, session, feed, source);
        Ok(MonitorOutcome::Committed(index))
    }

    /// Replace the session in `index` with a freshly configured one
    ///
    /// The previous session keeps running until the candidate is accepted
    /// and streaming. A rejected setup or a candidate that fails to start
    /// only discards the candidate.
    pub fn reconfigure(
        &mut self,
        index: SlotIndex,
        source: MediaSource,
    ) -> Result<MonitorOutcome, MonitorError> {
        if self.registry.get_slot_by_index(index).is_none() {
            tracing::debug!(slot = index, "Reconfigure on empty slot ignored");
            return Ok(MonitorOutcome::NoOp);
        }

        let mut candidate = self.factory.create(&source)?;
        if !self.setup_candidate(candidate.as_mut())? {
            tracing::info!(slot = index, "Setup rejected, keeping current monitor");
            return Ok(MonitorOutcome::Cancelled);
        }

        let feed = self.start_display_feed(index, candidate.as_mut())?;

        // Tile is not blanked; the candidate's first frame replaces the old one
        self.remove_slot(index, false);
        self.install(index, candidate, feed, source);
        Ok(MonitorOutcome::Replaced(index))
    }

    /// The tile's setup button: reconfigure with the source it was bound to
    pub fn on_setup_clicked(&mut self, index: SlotIndex) -> Result<MonitorOutcome, MonitorError> {
        let bound = self
            .tiles
            .get(index.wrapping_sub(1))
            .and_then(|tile| tile.bound_source.clone());

        match bound {
            Some(source) => self.reconfigure(index, source),
            None => Ok(MonitorOutcome::NoOp),
        }
    }

    /// Tear down the monitor in `index`; a no-op for empty slots
    pub fn delete(&mut self, index: SlotIndex) -> MonitorOutcome {
        if self.remove_slot(index, true) {
            MonitorOutcome::Deleted(index)
        } else {
            MonitorOutcome::NoOp
        }
    }

    /// Tear down the monitor holding `id`; a no-op if it is not in the grid
    pub fn delete_session(&mut self, id: SessionId) -> MonitorOutcome {
        match self.registry.get_index_of_slot(id) {
            Some(index) => self.delete(index),
            None => MonitorOutcome::NoOp,
        }
    }

    /// Dispatch a widget action
    pub fn handle(&mut self, action: MonitorAction) -> Result<MonitorOutcome, MonitorError> {
        match action {
            MonitorAction::Add => self.add(),
            MonitorAction::Setup(index) => self.on_setup_clicked(index),
            MonitorAction::Delete(index) => Ok(self.delete(index)),
            MonitorAction::OpenParameters => {
                self.ui.open_parameter_form();
                Ok(MonitorOutcome::NoOp)
            }
            MonitorAction::Fisheye | MonitorAction::Recorded | MonitorAction::Captured => {
                tracing::info!(?action, "Toolbar action has no handler");
                Ok(MonitorOutcome::NoOp)
            }
        }
    }

    /// Deliver pending frames of every committed session
    pub fn pump_frames(&mut self) -> usize {
        self.registry.iter_mut().map(|(_, session)| session.poll()).sum()
    }

    /// Tear down every monitor
    pub fn shutdown(&mut self) {
        for index in self.registry.get_used_slots() {
            self.delete(index);
        }
    }

    /// Ascending indices of occupied slots
    pub fn used_slots(&self) -> Vec<SlotIndex> {
        self.registry.get_used_slots()
    }

    /// Ascending indices of empty slots
    pub fn empty_slots(&self) -> Vec<SlotIndex> {
        self.registry.get_empty_slots()
    }

    /// Session committed to `index`
    pub fn session(&self, index: SlotIndex) -> Option<&dyn Session> {
        self.registry.get_slot_by_index(index).map(|s| &**s)
    }

    /// Slot holding session `id`
    pub fn slot_of(&self, id: SessionId) -> Option<SlotIndex> {
        self.registry.get_index_of_slot(id)
    }

    /// Whether the tile's setup button is bound to a source
    pub fn is_setup_bound(&self, index: SlotIndex) -> bool {
        self.tiles
            .get(index.wrapping_sub(1))
            .is_some_and(|tile| tile.bound_source.is_some())
    }

    pub fn prefs(&self) -> &MonitorPreferences {
        &self.prefs
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    /// Run the setup workflow on a candidate; the candidate is closed
    /// unless it was accepted
    fn setup_candidate(&mut self, candidate: &mut dyn Session) -> Result<bool, MonitorError> {
        let accepted = self.run_setup(&mut *candidate);
        if !matches!(accepted, Ok(true)) {
            close_session(candidate);
        }
        Ok(accepted?)
    }

    fn run_setup(&mut self, session: &mut dyn Session) -> Result<bool, SetupError> {
        let mut workflow = SetupWorkflow::begin(
            session,
            Rc::clone(&self.renderer),
            self.ui.preview_targets(),
            self.prefs.preview_config(),
        )?;
        self.ui.run_setup(&mut workflow);
        Ok(workflow.outcome() == SetupOutcome::Accepted)
    }

    /// Connect tile `index`'s display to an accepted candidate and start its
    /// result stream. On failure the candidate is closed and nothing in the
    /// grid changes.
    fn start_display_feed(
        &self,
        index: SlotIndex,
        session: &mut dyn Session,
    ) -> Result<Subscription, MonitorError> {
        let Some(tile) = self.tiles.get(index.wrapping_sub(1)) else {
            close_session(session);
            return Err(MonitorError::InvalidSlot(index));
        };

        let renderer = Rc::clone(&self.renderer);
        let display = tile.widgets.display;
        let width = self.prefs.tile_width;
        let scale_content = self.prefs.scale_content;
        let mut feed = session
            .result_frames()
            .connect(move |frame| renderer.render(display, frame, width, scale_content));

        if let Err(e) = session.start_result_stream() {
            tracing::warn!(slot = index, session = %session.id(), "Result stream failed to start: {}", e);
            feed.release();
            close_session(session);
            return Err(e.into());
        }
        Ok(feed)
    }

    /// Hand a streaming session to the registry and bind the tile's controls
    fn install(
        &mut self,
        index: SlotIndex,
        session: Box<dyn Session>,
        feed: Subscription,
        source: MediaSource,
    ) {
        if let Some(tile) = self.tiles.get_mut(index.wrapping_sub(1)) {
            tile.feed = Some(feed);
            tile.bound_source = Some(source.clone());
            self.ui.set_slot_controls(tile.widgets, true);
        }
        self.prefs.last_source = Some(source);

        tracing::info!(slot = index, session = %session.id(), "Monitor committed");
        if let Some(mut displaced) = self.registry.set_slot(index, session) {
            tracing::warn!(slot = index, session = %displaced.id(), "Slot was still occupied");
            close_session(displaced.as_mut());
        }
    }

    /// Release the tile's feed, unbind its setup button and close the
    /// session. `blank_tile` also clears the display and disables the tile's
    /// controls. Returns false for empty slots.
    fn remove_slot(&mut self, index: SlotIndex, blank_tile: bool) -> bool {
        let Some(mut session) = self.registry.clear_slot(index) else {
            return false;
        };

        if let Some(tile) = self.tiles.get_mut(index - 1) {
            if let Some(mut feed) = tile.feed.take() {
                feed.release();
            }
            tile.bound_source = None;
            if blank_tile {
                self.renderer.clear(tile.widgets.display);
                self.ui.set_slot_controls(tile.widgets, false);
            }
        }

        tracing::info!(slot = index, session = %session.id(), "Monitor removed");
        close_session(session.as_mut());
        true
    }
}

impl<F: SessionFactory, U: MonitorUi> Drop for MonitorManager<F, U> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Close a session unless it already is
fn close_session(session: &mut dyn Session) {
    if !session.is_closed() {
        session.close();
    }
}
