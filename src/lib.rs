//! clipgif: record a screen region and export it as an animated GIF.
//!
//! Pipeline:
//! - a selection in global points is validated (`selection`) and assigned a
//!   display (`screen`)
//! - `session::CaptureDriver` ticks a `capture::CaptureSource` at the
//!   configured frame rate and feeds `recording::Recorder`
//! - the recorder maps the selection to a pixel crop rect from the first
//!   frame (`mapper`) and crops every frame (`crop`)
//! - the stopped session's `frames::FrameSequence` is trimmed and exported
//!   through `editor` and `encoder`

pub mod capture;
pub mod config;
pub mod crop;
pub mod editor;
pub mod encoder;
pub mod frames;
pub mod geometry;
pub mod mapper;
pub mod recording;
pub mod screen;
pub mod selection;
pub mod session;

pub use capture::{CaptureError, CaptureFrame, CaptureSource};
pub use config::{CropFallback, RecorderConfig};
pub use frames::FrameSequence;
pub use geometry::{CropRect, Rect};
pub use mapper::{CaptureScale, map_selection};
pub use recording::{Recorder, RecorderEvent, RecorderState};
pub use screen::DisplayDescriptor;
pub use session::CaptureDriver;
