use std::cell::OnceCell;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use image::RgbaImage;

use crate::capture::CaptureFrame;
use crate::config::{CropFallback, RecorderConfig};
use crate::crop::crop_frame;
use crate::frames::FrameSequence;
use crate::geometry::{CropRect, Rect};
use crate::mapper::{CaptureScale, map_selection};
use crate::screen::DisplayDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Stopped,
}

/// Notification emitted for every state transition and notable frame event.
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderEvent {
    Started {
        display_id: u32,
    },
    /// The first frame of the session fixed the capture scale and crop rect.
    GeometryResolved {
        scale: CaptureScale,
        crop: CropRect,
    },
    /// Frame `index` could not be cropped and was filled per the fallback policy.
    CropFellBack {
        index: usize,
        fallback: CropFallback,
    },
    Stopped {
        frames: usize,
        elapsed: Duration,
    },
    Reset,
}

/// What happened to a frame handed to `Recorder::push_frame`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Cropped,
    FellBack,
    /// The recorder was not recording; the frame was discarded.
    Ignored,
}

#[derive(Debug, thiserror::Error)]
pub enum RecordingError {
    #[error("A recording session is already running")]
    AlreadyRecording,

    #[error("No recording session is running")]
    NotRecording,

    #[error("Recorder state lock poisoned")]
    Poisoned,
}

/// Geometry fixed by the first frame of a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionGeometry {
    pub scale: CaptureScale,
    pub crop: CropRect,
}

impl SessionGeometry {
    fn resolve(frame: &CaptureFrame, selection: Rect, display: &DisplayDescriptor) -> Self {
        let scale =
            CaptureScale::from_frame(frame.pixel_width(), frame.pixel_height(), display.frame);
        let crop = map_selection(selection, display.frame, scale);
        SessionGeometry { scale, crop }
    }
}

struct Session {
    selection: Rect,
    display: DisplayDescriptor,
    started_at: Instant,
    /// Set once, from the first frame of the session.
    geometry: OnceCell<SessionGeometry>,
}

struct Inner {
    state: RecorderState,
    session: Option<Session>,
    sequence: FrameSequence,
    subscribers: Vec<Sender<RecorderEvent>>,
}

/// Frame accumulator for one recording session at a time.
///
/// The capture thread calls `push_frame` while the control side calls
/// `start`/`stop`; a single lock covers state, cached geometry and the frame
/// sequence, held for one crop-and-append at most.
pub struct Recorder {
    config: RecorderConfig,
    inner: Mutex<Inner>,
}

impl Recorder {
    pub fn new(config: RecorderConfig) -> Self {
        let sequence = FrameSequence::new(config.fps);
        Recorder {
            config,
            inner: Mutex::new(Inner {
                state: RecorderState::Idle,
                session: None,
                sequence,
                subscribers: Vec::new(),
            }),
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&self) -> Result<Receiver<RecorderEvent>, RecordingError> {
        let (tx, rx) = mpsc::channel();
        self.lock()?.subscribers.push(tx);
        Ok(rx)
    }

    pub fn state(&self) -> Result<RecorderState, RecordingError> {
        Ok(self.lock()?.state)
    }

    /// Begin a new session. Clears frames from any previous session.
    ///
    /// `selection` must already be validated and `display` chosen for it.
    pub fn start(
        &self,
        selection: Rect,
        display: DisplayDescriptor,
    ) -> Result<RecorderEvent, RecordingError> {
        let mut inner = self.lock()?;
        if inner.state == RecorderState::Recording {
            return Err(RecordingError::AlreadyRecording);
        }

        let display_id = display.id;
        inner.sequence = FrameSequence::new(self.config.fps);
        inner.session = Some(Session {
            selection,
            display,
            started_at: Instant::now(),
            geometry: OnceCell::new(),
        });
        inner.state = RecorderState::Recording;

        log::info!(
            "Recording started: selection {} on display {} at {} fps",
            selection,
            display_id,
            self.config.fps
        );

        let event = RecorderEvent::Started { display_id };
        inner.emit(&event);
        Ok(event)
    }

    /// Crop and append one frame. Frames arriving outside a session are ignored.
    ///
    /// A frame that cannot be cropped is never dropped; the configured
    /// `CropFallback` fills its slot instead.
    pub fn push_frame(&self, frame: CaptureFrame) -> Result<FrameOutcome, RecordingError> {
        let mut guard = self.lock()?;
        let Inner {
            state,
            session,
            sequence,
            subscribers,
        } = &mut *guard;

        if *state != RecorderState::Recording {
            log::debug!("Frame arrived while {:?}, ignoring", state);
            return Ok(FrameOutcome::Ignored);
        }
        let Some(session) = session.as_ref() else {
            return Ok(FrameOutcome::Ignored);
        };

        let mut events = Vec::new();
        let geometry = match session.geometry.get() {
            Some(g) => *g,
            None => {
                let g = *session.geometry.get_or_init(|| {
                    SessionGeometry::resolve(&frame, session.selection, &session.display)
                });
                log::info!(
                    "Capture scale {:.3}x{:.3}, crop rect {}",
                    g.scale.x,
                    g.scale.y,
                    g.crop
                );
                if g.scale != CaptureScale::nominal(session.display.backing_scale) {
                    log::info!(
                        "Frames arrive at a different scale than the display reports ({:.1})",
                        session.display.backing_scale
                    );
                }
                events.push(RecorderEvent::GeometryResolved {
                    scale: g.scale,
                    crop: g.crop,
                });
                g
            }
        };

        let index = sequence.len();
        let outcome = match crop_frame(&frame.image, geometry.crop) {
            Ok(cropped) => {
                sequence.push(cropped);
                FrameOutcome::Cropped
            }
            Err(e) => {
                let fallback = self.config.crop_fallback;
                log::debug!("Frame {}: {}; falling back to {}", index, e, fallback);
                let filler = fallback_frame(fallback, frame.image, geometry.crop, sequence);
                sequence.push(filler);
                events.push(RecorderEvent::CropFellBack { index, fallback });
                FrameOutcome::FellBack
            }
        };

        for event in &events {
            emit_to(subscribers, event);
        }
        Ok(outcome)
    }

    /// End the session. No further frames are accepted.
    pub fn stop(&self) -> Result<RecorderEvent, RecordingError> {
        let mut inner = self.lock()?;
        if inner.state != RecorderState::Recording {
            return Err(RecordingError::NotRecording);
        }

        let elapsed = inner
            .session
            .as_ref()
            .map_or(Duration::ZERO, |s| s.started_at.elapsed());
        inner.state = RecorderState::Stopped;

        let frames = inner.sequence.len();
        log::info!(
            "Recording stopped: {} frames in {:.2}s",
            frames,
            elapsed.as_secs_f64()
        );

        let event = RecorderEvent::Stopped { frames, elapsed };
        inner.emit(&event);
        Ok(event)
    }

    /// Discard the current or last session and return to idle.
    pub fn reset(&self) -> Result<RecorderEvent, RecordingError> {
        let mut inner = self.lock()?;
        inner.state = RecorderState::Idle;
        inner.session = None;
        inner.sequence = FrameSequence::new(self.config.fps);

        log::info!("Recorder reset");
        let event = RecorderEvent::Reset;
        inner.emit(&event);
        Ok(event)
    }

    pub fn frame_count(&self) -> Result<usize, RecordingError> {
        Ok(self.lock()?.sequence.len())
    }

    /// Geometry of the current session, once its first frame has arrived.
    pub fn geometry(&self) -> Result<Option<SessionGeometry>, RecordingError> {
        let inner = self.lock()?;
        Ok(inner
            .session
            .as_ref()
            .and_then(|s| s.geometry.get().copied()))
    }

    /// Copy of the frames recorded so far.
    pub fn sequence(&self) -> Result<FrameSequence, RecordingError> {
        Ok(self.lock()?.sequence.clone())
    }

    /// Move the recorded frames out of a stopped session, leaving it empty.
    pub fn take_sequence(&self) -> Result<FrameSequence, RecordingError> {
        let mut inner = self.lock()?;
        if inner.state == RecorderState::Recording {
            return Err(RecordingError::AlreadyRecording);
        }
        let fps = self.config.fps;
        Ok(std::mem::replace(&mut inner.sequence, FrameSequence::new(fps)))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, RecordingError> {
        self.inner.lock().map_err(|_| RecordingError::Poisoned)
    }
}

impl Inner {
    fn emit(&mut self, event: &RecorderEvent) {
        emit_to(&mut self.subscribers, event);
    }
}

/// Send to every subscriber, dropping the ones that hung up.
fn emit_to(subscribers: &mut Vec<Sender<RecorderEvent>>, event: &RecorderEvent) {
    subscribers.retain(|tx| tx.send(event.clone()).is_ok());
}

fn fallback_frame(
    fallback: CropFallback,
    full: RgbaImage,
    crop: CropRect,
    sequence: &FrameSequence,
) -> RgbaImage {
    match fallback {
        CropFallback::Uncropped => full,
        CropFallback::RepeatPrevious => match sequence.last() {
            Some(previous) => previous.clone(),
            // A blank filler is never larger than the frame it replaces.
            None if !crop.is_empty()
                && crop.width <= full.width()
                && crop.height <= full.height() =>
            {
                RgbaImage::new(crop.width, crop.height)
            }
            None => full,
        },
    }
}
