use std::time::Duration;

use crate::frames::{FrameSequence, TrimError};

/// Post-recording preview and trim state over a stopped session's frames.
///
/// Trim handles are user input and get clamped here; the range handed to
/// `FrameSequence::trim` is therefore always valid.
pub struct EditorState {
    sequence: FrameSequence,
    pub current_frame: usize,
    pub is_playing: bool,
    trim_start: usize,
    trim_end: usize,
}

impl EditorState {
    pub fn new(sequence: FrameSequence) -> Result<Self, TrimError> {
        if sequence.is_empty() {
            return Err(TrimError::Empty);
        }
        let trim_end = sequence.len() - 1;
        Ok(EditorState {
            sequence,
            current_frame: 0,
            is_playing: false,
            trim_start: 0,
            trim_end,
        })
    }

    pub fn sequence(&self) -> &FrameSequence {
        &self.sequence
    }

    pub fn total_frames(&self) -> usize {
        self.sequence.len()
    }

    pub fn play(&mut self) {
        self.is_playing = true;
    }

    pub fn pause(&mut self) {
        self.is_playing = false;
    }

    /// Inclusive trim range.
    pub fn trim_range(&self) -> (usize, usize) {
        (self.trim_start, self.trim_end)
    }

    pub fn trimmed_len(&self) -> usize {
        self.trim_end - self.trim_start + 1
    }

    /// Move the start handle, never past the end handle.
    pub fn set_trim_start(&mut self, frame: usize) {
        self.trim_start = frame.min(self.trim_end);
        self.current_frame = self.current_frame.max(self.trim_start);
    }

    /// Move the end handle, never before the start handle or past the last frame.
    pub fn set_trim_end(&mut self, frame: usize) {
        let last = self.sequence.len() - 1;
        self.trim_end = frame.clamp(self.trim_start, last);
        self.current_frame = self.current_frame.min(self.trim_end);
    }

    pub fn reset_trim(&mut self) {
        self.trim_start = 0;
        self.trim_end = self.sequence.len() - 1;
    }

    /// Jump to a frame inside the trim range.
    pub fn seek(&mut self, frame: usize) {
        self.current_frame = frame.clamp(self.trim_start, self.trim_end);
    }

    /// Advance the preview one frame. Wraps to the start while playing.
    pub fn step_forward(&mut self) {
        if self.current_frame < self.trim_end {
            self.current_frame += 1;
        } else if self.is_playing {
            self.current_frame = self.trim_start;
        }
    }

    /// Step the preview back one frame. Wraps to the end while playing.
    pub fn step_back(&mut self) {
        if self.current_frame > self.trim_start {
            self.current_frame -= 1;
        } else if self.is_playing {
            self.current_frame = self.trim_end;
        }
    }

    /// Playback length of the trimmed range.
    pub fn duration(&self) -> Duration {
        self.sequence.frame_delay() * self.trimmed_len() as u32
    }

    pub fn trimmed(&self) -> Result<FrameSequence, TrimError> {
        self.sequence.trim(self.trim_start, self.trim_end)
    }
}
