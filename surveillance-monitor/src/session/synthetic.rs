//! Synthetic test-pattern session
//!
//! Generates a moving fisheye-like test pattern on a background capture
//! thread and hands frames to the UI thread over a bounded channel. The
//! "projection" is a crop around the anchor (mirrored in mode 2), which is
//! enough to exercise the grid without the real dewarping engine.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use rand::Rng;

use super::{
    AnchorAngles, MediaSource, PreviewPoint, ProjectionMode, Session, SessionError, SessionId,
};
use crate::video::{Frame, FrameSignal};

/// Frames buffered between the capture thread and `poll`
const CHANNEL_CAPACITY: usize = 2;

/// Field of view of the simulated lens, in degrees
const LENS_FOV_DEG: f64 = 220.0;

/// Builds `SyntheticSession`s
#[derive(Debug, Clone)]
pub struct SyntheticSessionFactory {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
}

impl Default for SyntheticSessionFactory {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            frame_rate: 30,
        }
    }
}

impl super::SessionFactory for SyntheticSessionFactory {
    fn create(&mut self, source: &MediaSource) -> Result<Box<dyn Session>, SessionError> {
        let session = SyntheticSession::open(source.clone(), self.width, self.height, self.frame_rate)?;
        Ok(Box::new(session))
    }
}

/// Background capture thread state
struct CaptureLoop {
    running: Arc<AtomicBool>,
    frame_count: Arc<AtomicU64>,
    thread_handle: Option<JoinHandle<()>>,
    receiver: Receiver<Frame>,
}

impl CaptureLoop {
    fn spawn(width: u32, height: u32, frame_rate: u32) -> Result<Self, SessionError> {
        let (sender, receiver) = crossbeam_channel::bounded(CHANNEL_CAPACITY);
        let running = Arc::new(AtomicBool::new(true));
        let frame_count = Arc::new(AtomicU64::new(0));

        let running_clone = running.clone();
        let frame_count_clone = frame_count.clone();
        let interval = Duration::from_secs_f64(1.0 / frame_rate.max(1) as f64);

        let thread_handle = std::thread::Builder::new()
            .name("synthetic-capture".to_string())
            .spawn(move || {
                Self::run(width, height, interval, sender, running_clone, frame_count_clone);
            })?;

        Ok(Self {
            running,
            frame_count,
            thread_handle: Some(thread_handle),
            receiver,
        })
    }

    fn run(
        width: u32,
        height: u32,
        interval: Duration,
        sender: Sender<Frame>,
        running: Arc<AtomicBool>,
        frame_count: Arc<AtomicU64>,
    ) {
        tracing::debug!(width, height, "Synthetic capture thread started");
        let mut rng = rand::rng();

        while running.load(Ordering::Acquire) {
            let frame_number = frame_count.fetch_add(1, Ordering::Relaxed);
            let frame = test_pattern(width, height, frame_number, &mut rng);

            match sender.try_send(frame) {
                // UI thread is behind; drop the frame
                Ok(()) | Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Disconnected(_)) => break,
            }

            std::thread::sleep(interval);
        }

        tracing::debug!("Synthetic capture thread stopped");
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Radial gradient with a rotating sweep and sensor noise
fn test_pattern(width: u32, height: u32, frame_number: u64, rng: &mut impl Rng) -> Frame {
    let mut data = vec![0u8; Frame::expected_size(width, height)];
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let radius = cx.min(cy);
    let sweep = (frame_number % 360) as f32;

    for y in 0..height {
        for x in 0..width {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let r = (dx * dx + dy * dy).sqrt() / radius;
            let idx = ((y * width + x) * 4) as usize;

            // Outside the fisheye circle stays black
            if r > 1.0 {
                data[idx + 3] = 255;
                continue;
            }

            let angle = dy.atan2(dx).to_degrees() + 180.0;
            let in_sweep = ((angle - sweep).rem_euclid(360.0)) < 20.0;
            let noise: u8 = rng.random_range(0..8);

            data[idx] = ((1.0 - r) * 200.0) as u8 + noise;
            data[idx + 1] = if in_sweep { 220 } else { (r * 120.0) as u8 };
            data[idx + 2] = ((angle / 360.0) * 255.0) as u8;
            data[idx + 3] = 255;
        }
    }

    Frame::new(data, width, height, frame_number)
}

/// Test-pattern session with a real capture thread
pub struct SyntheticSession {
    id: SessionId,
    source: MediaSource,
    mode: ProjectionMode,
    maps_ready: bool,
    streaming: bool,
    overlay: bool,
    /// Anchor as normalized raw-frame coordinates
    anchor: (f32, f32),
    hovering: bool,
    capture: Option<CaptureLoop>,
    raw_frames: FrameSignal,
    result_frames: FrameSignal,
}

impl SyntheticSession {
    /// Start capturing from `source`
    pub fn open(
        source: MediaSource,
        width: u32,
        height: u32,
        frame_rate: u32,
    ) -> Result<Self, SessionError> {
        if source.locator.trim().is_empty() {
            return Err(SessionError::OpenFailed {
                locator: source.locator.clone(),
                reason: "empty media locator".to_string(),
            });
        }

        let width = width.max(1);
        let height = height.max(1);
        let capture = CaptureLoop::spawn(width, height, frame_rate)?;
        let id = SessionId::next();

        tracing::info!(
            session = %id,
            source = %source.display_name(),
            calibration = %source.calibration,
            "Synthetic session opened ({}x{} @ {}fps)",
            width,
            height,
            frame_rate
        );

        Ok(Self {
            id,
            source,
            mode: ProjectionMode::default(),
            maps_ready: false,
            streaming: false,
            overlay: false,
            anchor: (0.5, 0.5),
            hovering: false,
            capture: Some(capture),
            raw_frames: FrameSignal::new(),
            result_frames: FrameSignal::new(),
        })
    }

    /// Crop a window around the anchor, mirrored in mode 2
    fn project(&self, frame: &Frame) -> Frame {
        let crop_w = (frame.width / 2).max(1);
        let crop_h = (frame.height / 2).max(1);
        let max_x = frame.width.saturating_sub(crop_w);
        let max_y = frame.height.saturating_sub(crop_h);
        let left = ((self.anchor.0 * frame.width as f32) as u32)
            .saturating_sub(crop_w / 2)
            .min(max_x);
        let top = ((self.anchor.1 * frame.height as f32) as u32)
            .saturating_sub(crop_h / 2)
            .min(max_y);

        let mut data = vec![0u8; Frame::expected_size(crop_w, crop_h)];
        for y in 0..crop_h {
            for x in 0..crop_w {
                let src_x = match self.mode {
                    ProjectionMode::Mode1 => left + x,
                    ProjectionMode::Mode2 => left + (crop_w - 1 - x),
                };
                let src = (((top + y) * frame.width + src_x) * 4) as usize;
                let dst = ((y * crop_w + x) * 4) as usize;
                data[dst..dst + 4].copy_from_slice(&frame.data[src..src + 4]);
            }
        }

        Frame {
            data,
            width: crop_w,
            height: crop_h,
            frame_number: frame.frame_number,
            timestamp: frame.timestamp,
        }
    }

    /// Mark the anchor on a copy of the raw frame
    fn with_overlay(&self, frame: &Frame) -> Frame {
        let mut marked = frame.clone();
        let ax = (self.anchor.0 * frame.width as f32) as i64;
        let ay = (self.anchor.1 * frame.height as f32) as i64;
        let colour = if self.hovering { [255, 255, 0, 255] } else { [255, 0, 0, 255] };

        for d in -4i64..=4 {
            for (x, y) in [(ax + d, ay), (ax, ay + d)] {
                if x < 0 || y < 0 || x >= frame.width as i64 || y >= frame.height as i64 {
                    continue;
                }
                let idx = ((y as u32 * frame.width + x as u32) * 4) as usize;
                marked.data[idx..idx + 4].copy_from_slice(&colour);
            }
        }
        marked
    }

    fn anchor_angles(&self) -> AnchorAngles {
        let du = (self.anchor.0 - 0.5) as f64;
        let dv = (self.anchor.1 - 0.5) as f64;
        match self.mode {
            ProjectionMode::Mode1 => AnchorAngles {
                alpha: (du * du + dv * dv).sqrt() * 2.0 * (LENS_FOV_DEG / 2.0),
                beta: dv.atan2(du).to_degrees(),
            },
            ProjectionMode::Mode2 => AnchorAngles {
                alpha: dv * LENS_FOV_DEG,
                beta: du * LENS_FOV_DEG,
            },
        }
    }
}

impl Session for SyntheticSession {
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
        if self.is_closed() {
            return Err(SessionError::Closed(self.id));
        }
        self.mode = mode;
        self.anchor = (0.5, 0.5);
        self.maps_ready = true;
        tracing::debug!(session = %self.id, %mode, "Projection maps rebuilt");
        Ok(())
    }

    fn set_anchor_overlay(&mut self, enabled: bool) {
        self.overlay = enabled;
    }

    fn move_anchor(&mut self, point: PreviewPoint) -> Option<AnchorAngles> {
        if self.is_closed() {
            return None;
        }
        self.anchor = point.normalized();
        self.hovering = true;
        Some(self.anchor_angles())
    }

    fn clear_anchor_hover(&mut self) {
        self.hovering = false;
    }

    fn raw_frames(&self) -> &FrameSignal {
        &self.raw_frames
    }

    fn result_frames(&self) -> &FrameSignal {
        &self.result_frames
    }

    fn start_result_stream(&mut self) -> Result<(), SessionError> {
        if self.is_closed() {
            return Err(SessionError::Closed(self.id));
        }
        if !self.maps_ready {
            self.set_projection_mode(self.mode)?;
        }
        self.streaming = true;
        Ok(())
    }

    fn poll(&mut self) -> usize {
        let Some(capture) = &self.capture else {
            return 0;
        };
        let frames: Vec<Frame> = capture.receiver.try_iter().collect();

        for frame in &frames {
            if self.overlay {
                self.raw_frames.emit(&self.with_overlay(frame));
            } else {
                self.raw_frames.emit(frame);
            }
            if self.maps_ready || self.streaming {
                self.result_frames.emit(&self.project(frame));
            }
        }
        frames.len()
    }

    fn close(&mut self) {
        let Some(mut capture) = self.capture.take() else {
            return;
        };
        capture.stop();
        self.streaming = false;
        tracing::info!(session = %self.id, frames = capture.frame_count.load(Ordering::Relaxed), "Synthetic session closed");
    }

    fn is_closed(&self) -> bool {
        self.capture.is_none()
    }
}

impl Drop for SyntheticSession {
    fn drop(&mut self) {
        self.close();
    }
}
