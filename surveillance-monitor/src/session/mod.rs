//! Processing sessions
//!
//! A session is a live capture + projection pipeline bound to one media
//! source. The dewarping engine behind it is an external collaborator; this
//! module only defines the boundary the monitor grid needs:
//!
//! - `SessionFactory` builds a session from a `MediaSource`
//! - `Session` exposes projection control, two frame signals (raw fisheye
//!   and projected result) and teardown
//!
//! `synthetic` provides a test-pattern implementation with a real
//! background capture thread.

pub mod synthetic;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::video::FrameSignal;

pub use synthetic::{SyntheticSession, SyntheticSessionFactory};

/// Unique identity of a session, used for slot lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

impl SessionId {
    /// Allocate a fresh, process-unique id
    pub fn next() -> Self {
        SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Kind of media a session reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SourceType {
    /// Local or USB camera
    #[default]
    Camera,
    /// Recorded video file
    VideoFile,
    /// Still image
    ImageFile,
    /// Network stream (RTSP/HTTP)
    Stream,
}

impl SourceType {
    /// Get display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            SourceType::Camera => "Camera",
            SourceType::VideoFile => "Video File",
            SourceType::ImageFile => "Image File",
            SourceType::Stream => "Stream",
        }
    }
}

/// A media source selection, as returned by the source picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSource {
    /// Kind of source
    #[serde(rename = "sourceType")]
    pub source_type: SourceType,
    /// Camera model the calibration belongs to
    #[serde(rename = "cameraType")]
    pub camera_type: String,
    /// Device index, file path or stream URL
    #[serde(rename = "locator")]
    pub locator: String,
    /// Name of the calibration parameter set
    #[serde(rename = "calibration")]
    pub calibration: String,
}

impl MediaSource {
    pub fn new(
        source_type: SourceType,
        camera_type: impl Into<String>,
        locator: impl Into<String>,
        calibration: impl Into<String>,
    ) -> Self {
        Self {
            source_type,
            camera_type: camera_type.into(),
            locator: locator.into(),
            calibration: calibration.into(),
        }
    }

    /// Short label for logs and tile captions
    pub fn display_name(&self) -> String {
        format!("{}: {}", self.source_type.display_name(), self.locator)
    }
}

/// Anypoint projection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProjectionMode {
    /// Anchor expressed as (alpha, beta) around the optical axis
    #[default]
    #[serde(rename = "mode_1")]
    Mode1,
    /// Anchor expressed as (pitch, yaw)
    #[serde(rename = "mode_2")]
    Mode2,
}

impl ProjectionMode {
    /// Identifier used in configuration and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectionMode::Mode1 => "mode_1",
            ProjectionMode::Mode2 => "mode_2",
        }
    }
}

impl fmt::Display for ProjectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pointer position on the raw preview, in preview pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewPoint {
    pub x: f32,
    pub y: f32,
    /// Size of the preview the position was measured in
    pub preview_width: u32,
    pub preview_height: u32,
}

impl PreviewPoint {
    /// Position normalized to `[0, 1]` on both axes
    pub fn normalized(&self) -> (f32, f32) {
        let u = self.x / self.preview_width.max(1) as f32;
        let v = self.y / self.preview_height.max(1) as f32;
        (u.clamp(0.0, 1.0), v.clamp(0.0, 1.0))
    }
}

/// Projection anchor reported by a session after the anchor moves
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorAngles {
    pub alpha: f64,
    pub beta: f64,
}

/// Session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to open media source {locator}: {reason}")]
    OpenFailed { locator: String, reason: String },

    #[error("failed to build {mode} projection maps: {reason}")]
    Projection { mode: ProjectionMode, reason: String },

    #[error("{0} is closed")]
    Closed(SessionId),

    #[error("failed to spawn capture thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// A live capture + projection pipeline
///
/// Sessions are driven from the UI thread. Any background capture must hand
/// frames over through `poll`, which emits them on the frame signals.
pub trait Session {
    /// Identity used by the slot registry
    fn id(&self) -> SessionId;

    /// The media source this session was built from
    fn source(&self) -> &MediaSource;

    /// Currently active projection mode
    fn projection_mode(&self) -> ProjectionMode;

    /// Recompute projection maps for `mode`
    fn set_projection_mode(&mut self, mode: ProjectionMode) -> Result<(), SessionError>;

    /// Draw the anchor polygon on raw frames
    fn set_anchor_overlay(&mut self, enabled: bool);

    /// Move the projection anchor to a point on the raw preview
    fn move_anchor(&mut self, point: PreviewPoint) -> Option<AnchorAngles>;

    /// The pointer left the raw preview
    fn clear_anchor_hover(&mut self);

    /// Fisheye frames as captured
    fn raw_frames(&self) -> &FrameSignal;

    /// Projected (rectilinear) frames
    fn result_frames(&self) -> &FrameSignal;

    /// Begin continuous result production
    fn start_result_stream(&mut self) -> Result<(), SessionError>;

    /// Emit frames produced since the last call; returns how many were handled
    fn poll(&mut self) -> usize;

    /// Stop capture and release the capture handle. Safe to call repeatedly.
    fn close(&mut self);

    /// Whether `close` has run
    fn is_closed(&self) -> bool;
}

/// Builds sessions from media source selections
pub trait SessionFactory {
    fn create(&mut self, source: &MediaSource) -> Result<Box<dyn Session>, SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique() {
        let a = SessionId::next();
        let b = SessionId::next();
        assert_ne!(a, b);
        assert!(b.as_u64() > a.as_u64());
    }

    #[test]
    fn test_preview_point_normalized_clamps() {
        let point = PreviewPoint {
            x: 400.0,
            y: -5.0,
            preview_width: 320,
            preview_height: 240,
        };
        assert_eq!(point.normalized(), (1.0, 0.0));
    }

    #[test]
    fn test_projection_mode_names() {
        assert_eq!(ProjectionMode::default(), ProjectionMode::Mode1);
        assert_eq!(ProjectionMode::Mode2.to_string(), "mode_2");
    }
}
