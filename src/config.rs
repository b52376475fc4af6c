use std::fmt;
use std::str::FromStr;

use crate::selection::MIN_SELECTION_SIZE;

pub const MIN_FPS: u32 = 3;
pub const MAX_FPS: u32 = 30;
pub const DEFAULT_FPS: u32 = 10;

/// What to append when a frame cannot be cropped to the session's crop rect.
///
/// Either way the frame slot is filled, so frame count and timing survive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropFallback {
    /// Append the full, uncropped frame.
    #[default]
    Uncropped,
    /// Append a copy of the previous cropped frame (or a blank frame of crop
    /// size when nothing has been appended yet).
    RepeatPrevious,
}

impl FromStr for CropFallback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uncropped" => Ok(CropFallback::Uncropped),
            "repeat-previous" => Ok(CropFallback::RepeatPrevious),
            other => Err(format!(
                "unknown crop fallback {:?} (expected uncropped or repeat-previous)",
                other
            )),
        }
    }
}

impl fmt::Display for CropFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CropFallback::Uncropped => f.write_str("uncropped"),
            CropFallback::RepeatPrevious => f.write_str("repeat-previous"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecorderConfig {
    pub fps: u32,
    pub crop_fallback: CropFallback,
    pub min_selection: f64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            crop_fallback: CropFallback::default(),
            min_selection: MIN_SELECTION_SIZE,
        }
    }
}

impl RecorderConfig {
    pub fn with_fps(fps: u32) -> Self {
        Self {
            fps,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_FPS..=MAX_FPS).contains(&self.fps) {
            return Err(ConfigError::FpsOutOfRange(self.fps));
        }
        if !self.min_selection.is_finite() || self.min_selection <= 0.0 {
            return Err(ConfigError::InvalidMinSelection(self.min_selection));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Frame rate {0} is outside {min}..={max}", min = MIN_FPS, max = MAX_FPS)]
    FpsOutOfRange(u32),

    #[error("Minimum selection size must be a positive number, got {0}")]
    InvalidMinSelection(f64),
}

/// Inclusive frame range parsed from `start..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimRange {
    pub start: usize,
    pub end: usize,
}

impl FromStr for TrimRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once("..=")
            .ok_or_else(|| format!("trim range must look like start..=end, got {:?}", s))?;
        let start = start
            .trim()
            .parse()
            .map_err(|e| format!("invalid trim start {:?}: {}", start, e))?;
        let end = end
            .trim()
            .parse()
            .map_err(|e| format!("invalid trim end {:?}: {}", end, e))?;
        Ok(TrimRange { start, end })
    }
}
