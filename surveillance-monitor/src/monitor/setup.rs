//! Setup workflow
//!
//! Modal configuration of a not-yet-committed session: pick an anypoint
//! projection mode, drag the anchor on the fisheye preview and watch the
//! projected preview update live.
//!
//! ```text
//! Idle ──begin──▶ Configuring(Mode1) ◀──toggle──▶ Configuring(Mode2)
//!                        │                               │
//!                        ├── Accept ─────────▶ Accepted ◀┤
//!                        └── Cancel/Escape/Close ─▶ Cancelled
//! ```
//!
//! Exactly one pair of preview subscriptions exists while configuring. Every
//! exit path releases that pair once; later exit events (a window close
//! arriving after Escape, say) are ignored.

use std::rc::Rc;

use super::ui::{FrameRenderer, PreviewTargets};
use crate::session::{AnchorAngles, PreviewPoint, ProjectionMode, Session, SessionError, SessionId};
use crate::video::Subscription;

/// Workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupState {
    Idle,
    Configuring(ProjectionMode),
    Accepted,
    Cancelled,
}

impl SetupState {
    /// Whether the workflow has exited
    pub fn is_finished(&self) -> bool {
        matches!(self, SetupState::Accepted | SetupState::Cancelled)
    }
}

/// Input delivered by the setup dialog
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SetupEvent {
    /// Mode radio button clicked
    SelectMode(ProjectionMode),
    /// Pointer pressed on the fisheye preview
    PointerPressed(PreviewPoint),
    /// Pointer dragged over the fisheye preview
    PointerMoved(PreviewPoint),
    /// Pointer left the fisheye preview
    PointerLeft,
    /// OK button
    Accept,
    /// Cancel button
    Cancel,
    /// Escape key
    Escape,
    /// Window manager closed the dialog
    WindowClosed,
}

/// Result of a finished workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOutcome {
    Accepted,
    Cancelled,
}

/// Setup workflow errors
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("{0} is closed and cannot be configured")]
    SessionClosed(SessionId),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Preview display settings for the setup dialog
#[derive(Debug, Clone, Copy)]
pub struct PreviewConfig {
    pub width: u32,
    pub scale_content: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            width: 320,
            scale_content: false,
        }
    }
}

/// The raw + result preview subscriptions
struct PreviewFeeds {
    raw: Subscription,
    result: Subscription,
}

/// One run of the setup dialog against one session
pub struct SetupWorkflow<'a> {
    session: &'a mut dyn Session,
    renderer: Rc<dyn FrameRenderer>,
    targets: PreviewTargets,
    preview: PreviewConfig,
    state: SetupState,
    feeds: Option<PreviewFeeds>,
    /// Set once the exit path has released the previews
    previews_released: bool,
    last_anchor: Option<AnchorAngles>,
}

impl<'a> SetupWorkflow<'a> {
    /// Enter the workflow in mode 1 with both previews subscribed
    pub fn begin(
        session: &'a mut dyn Session,
        renderer: Rc<dyn FrameRenderer>,
        targets: PreviewTargets,
        preview: PreviewConfig,
    ) -> Result<Self, SetupError> {
        if session.is_closed() {
            return Err(SetupError::SessionClosed(session.id()));
        }

        let mut workflow = Self {
            session,
            renderer,
            targets,
            preview,
            state: SetupState::Idle,
            feeds: None,
            previews_released: false,
            last_anchor: None,
        };

        workflow.session.set_anchor_overlay(true);
        workflow.configure(ProjectionMode::Mode1)?;

        tracing::debug!(session = %workflow.session.id(), "Setup workflow started");
        Ok(workflow)
    }

    /// Current state
    pub fn state(&self) -> SetupState {
        self.state
    }

    /// Active projection mode while configuring
    pub fn mode(&self) -> Option<ProjectionMode> {
        match self.state {
            SetupState::Configuring(mode) => Some(mode),
            _ => None,
        }
    }

    /// Whether the workflow has exited
    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// Whether the exit path has released the previews
    pub fn previews_released(&self) -> bool {
        self.previews_released
    }

    /// Last anchor angles reported by the session
    pub fn last_anchor(&self) -> Option<AnchorAngles> {
        self.last_anchor
    }

    /// The session being configured
    pub fn session(&self) -> &dyn Session {
        &*self.session
    }

    /// Deliver pending frames to the previews; call from the dialog's loop
    pub fn pump(&mut self) -> usize {
        self.session.poll()
    }

    /// Apply one dialog event
    pub fn handle(&mut self, event: SetupEvent) -> Result<SetupState, SetupError> {
        if self.state.is_finished() {
            tracing::trace!(?event, state = ?self.state, "Setup event ignored after exit");
            return Ok(self.state);
        }

        match event {
            SetupEvent::SelectMode(mode) => self.configure(mode)?,
            SetupEvent::PointerPressed(point) | SetupEvent::PointerMoved(point) => {
                if let Some(angles) = self.session.move_anchor(point) {
                    tracing::debug!(alpha = angles.alpha, beta = angles.beta, "Anchor moved");
                    self.last_anchor = Some(angles);
                }
            }
            SetupEvent::PointerLeft => self.session.clear_anchor_hover(),
            SetupEvent::Accept => self.exit(SetupOutcome::Accepted),
            SetupEvent::Cancel | SetupEvent::Escape | SetupEvent::WindowClosed => {
                self.exit(SetupOutcome::Cancelled)
            }
        }

        Ok(self.state)
    }

    /// Final outcome; a dialog that returned without exiting counts as closed
    pub fn outcome(&mut self) -> SetupOutcome {
        if !self.state.is_finished() {
            self.exit(SetupOutcome::Cancelled);
        }
        match self.state {
            SetupState::Accepted => SetupOutcome::Accepted,
            _ => SetupOutcome::Cancelled,
        }
    }

    /// Rebuild projection maps for `mode` and swap in a fresh preview pair
    fn configure(&mut self, mode: ProjectionMode) -> Result<(), SetupError> {
        self.session.set_projection_mode(mode)?;

        // Old pair goes before the new one is connected
        if let Some(mut old) = self.feeds.take() {
            old.raw.release();
            old.result.release();
        }
        self.feeds = Some(self.subscribe_previews());
        self.state = SetupState::Configuring(mode);

        tracing::info!(session = %self.session.id(), %mode, "Anypoint mode selected");
        Ok(())
    }

    fn subscribe_previews(&self) -> PreviewFeeds {
        let PreviewConfig { width, scale_content } = self.preview;

        let renderer = Rc::clone(&self.renderer);
        let raw_widget = self.targets.raw;
        let raw = self
            .session
            .raw_frames()
            .connect(move |frame| renderer.render(raw_widget, frame, width, scale_content));

        let renderer = Rc::clone(&self.renderer);
        let result_widget = self.targets.result;
        let result = self
            .session
            .result_frames()
            .connect(move |frame| renderer.render(result_widget, frame, width, scale_content));

        PreviewFeeds { raw, result }
    }

    fn exit(&mut self, outcome: SetupOutcome) {
        self.release_previews();
        self.session.set_anchor_overlay(false);
        self.state = match outcome {
            SetupOutcome::Accepted => SetupState::Accepted,
            SetupOutcome::Cancelled => SetupState::Cancelled,
        };
        tracing::debug!(session = %self.session.id(), ?outcome, "Setup workflow finished");
    }

    /// Release the preview pair; only the first call does anything
    fn release_previews(&mut self) -> bool {
        if self.previews_released {
            return false;
        }
        self.previews_released = true;

        if let Some(mut feeds) = self.feeds.take() {
            feeds.raw.release();
            feeds.result.release();
        }
        true
    }
}

impl Drop for SetupWorkflow<'_> {
    fn drop(&mut self) {
        self.release_previews();
    }
}
