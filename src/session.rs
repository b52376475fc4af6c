//! Background capture loop feeding a `Recorder`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::capture::{CaptureError, CaptureSource};
use crate::geometry::Rect;
use crate::recording::{FrameOutcome, Recorder, RecorderEvent, RecordingError};
use crate::screen::DisplayDescriptor;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Recording(#[from] RecordingError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("Failed to spawn capture thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Capture thread panicked")]
    ThreadPanicked,
}

/// Counters reported by the capture thread when it exits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureReport {
    /// Frames handed to the recorder.
    pub delivered: u64,
    /// Ticks on which the source failed to produce a frame.
    pub failed_ticks: u64,
    /// Set when the source failed before delivering a single frame.
    pub fatal: Option<CaptureError>,
}

/// A running capture: one thread ticking at the recorder's frame rate.
///
/// Each tick captures one frame and pushes it into the recorder before the
/// next tick is scheduled, so a slow crop delays later frames rather than
/// queueing them.
pub struct CaptureDriver {
    recorder: Arc<Recorder>,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<CaptureReport>>,
}

impl CaptureDriver {
    /// Start a recorder session and the thread that feeds it.
    pub fn start<S>(
        source: S,
        recorder: Arc<Recorder>,
        selection: Rect,
        display: DisplayDescriptor,
    ) -> Result<Self, SessionError>
    where
        S: CaptureSource + 'static,
    {
        let display_id = display.id;
        recorder.start(selection, display)?;

        let fps = recorder.config().fps.max(1);
        let interval = Duration::from_secs_f64(1.0 / f64::from(fps));
        let shutdown = Arc::new(AtomicBool::new(false));

        let thread_recorder = Arc::clone(&recorder);
        let thread_shutdown = Arc::clone(&shutdown);
        let spawned = thread::Builder::new()
            .name(format!("capture-display-{}", display_id))
            .spawn(move || capture_loop(source, thread_recorder, interval, thread_shutdown));

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                recorder.reset()?;
                return Err(SessionError::Spawn(e));
            }
        };

        Ok(CaptureDriver {
            recorder,
            shutdown,
            handle: Some(handle),
        })
    }

    /// Whether the capture thread is still running.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the session, then the thread.
    ///
    /// The recorder stops accepting frames before the thread is told to exit,
    /// so nothing captured after this call lands in the sequence. A source
    /// that never produced a frame is reported here as a capture error.
    pub fn stop(mut self) -> Result<(RecorderEvent, CaptureReport), SessionError> {
        let stopped = self.recorder.stop();
        let report = self.join()?;

        if let Some(err) = report.fatal.clone() {
            return Err(SessionError::Capture(err));
        }
        Ok((stopped?, report))
    }

    fn join(&mut self) -> Result<CaptureReport, SessionError> {
        self.shutdown.store(true, Ordering::SeqCst);
        let Some(handle) = self.handle.take() else {
            return Ok(CaptureReport::default());
        };
        handle.thread().unpark();
        handle.join().map_err(|_| SessionError::ThreadPanicked)
    }
}

impl Drop for CaptureDriver {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.recorder.stop();
            if let Err(e) = self.join() {
                log::error!("Capture driver shutdown failed: {}", e);
            }
        }
    }
}

fn capture_loop<S: CaptureSource>(
    mut source: S,
    recorder: Arc<Recorder>,
    interval: Duration,
    shutdown: Arc<AtomicBool>,
) -> CaptureReport {
    let mut report = CaptureReport::default();
    let start_time = Instant::now();
    // Fixed schedule: tick k fires at start + k * interval regardless of how
    // long earlier ticks took.
    let mut deadline = start_time;

    loop {
        if !park_until(deadline, &shutdown) {
            break;
        }

        match source.capture() {
            Ok(frame) => match recorder.push_frame(frame) {
                // Stopped between capture and push.
                Ok(FrameOutcome::Ignored) => break,
                Ok(_) => report.delivered += 1,
                Err(e) => {
                    log::error!("Recorder rejected frame: {}", e);
                    break;
                }
            },
            Err(e) if report.delivered == 0 => {
                log::error!("Capture failed before the first frame: {}", e);
                if let Err(reset_err) = recorder.reset() {
                    log::error!("Recorder reset failed: {}", reset_err);
                }
                report.fatal = Some(e);
                break;
            }
            Err(e) => {
                report.failed_ticks += 1;
                if report.failed_ticks <= 3 {
                    log::warn!("Capture error on tick {}: {}", report.delivered, e);
                }
            }
        }

        deadline += interval;
    }

    log::info!(
        "Capture thread finished: {} frames, {} failed ticks in {:.2}s",
        report.delivered,
        report.failed_ticks,
        start_time.elapsed().as_secs_f64()
    );
    report
}

/// Sleep until `deadline`. Returns false if shutdown was requested first.
fn park_until(deadline: Instant, shutdown: &AtomicBool) -> bool {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::park_timeout(deadline - now);
    }
}
