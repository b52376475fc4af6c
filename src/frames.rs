use std::time::Duration;

use image::RgbaImage;

/// Ordered, append-only list of recorded images at a uniform frame rate.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSequence {
    frames: Vec<RgbaImage>,
    fps: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrimError {
    #[error("Cannot trim an empty sequence")]
    Empty,

    #[error("Trim start {start} is after trim end {end}")]
    Reversed { start: usize, end: usize },

    #[error("Trim index {index} is outside 0..={last}")]
    OutOfRange { index: usize, last: usize },
}

impl FrameSequence {
    pub fn new(fps: u32) -> Self {
        FrameSequence {
            frames: Vec::new(),
            fps,
        }
    }

    pub fn from_frames(frames: Vec<RgbaImage>, fps: u32) -> Self {
        FrameSequence { frames, fps }
    }

    pub fn push(&mut self, frame: RgbaImage) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn frames(&self) -> &[RgbaImage] {
        &self.frames
    }

    pub fn last(&self) -> Option<&RgbaImage> {
        self.frames.last()
    }

    pub fn into_frames(self) -> Vec<RgbaImage> {
        self.frames
    }

    /// Uniform per-frame delay, `1 / fps`.
    pub fn frame_delay(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }

    /// Playback length at the sequence's frame rate.
    pub fn duration(&self) -> Duration {
        self.frame_delay() * self.frames.len() as u32
    }

    /// Copy the frames in the inclusive range `[start, end]`.
    ///
    /// Out-of-range or reversed bounds are an error, never clamped.
    pub fn trim(&self, start: usize, end: usize) -> Result<FrameSequence, TrimError> {
        if self.frames.is_empty() {
            return Err(TrimError::Empty);
        }
        let last = self.frames.len() - 1;
        if start > end {
            return Err(TrimError::Reversed { start, end });
        }
        if end > last {
            return Err(TrimError::OutOfRange { index: end, last });
        }

        Ok(FrameSequence {
            frames: self.frames[start..=end].to_vec(),
            fps: self.fps,
        })
    }
}
