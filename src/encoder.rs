use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::frames::FrameSequence;

/// NeuQuant sampling factor: 1 is best quality, 30 is fastest.
const QUANTIZE_SPEED: i32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("No frames to encode")]
    NoFrames,

    #[error("Failed to create output file {path:?}: {source}")]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Frame {width}x{height} exceeds the GIF size limit")]
    FrameTooLarge { width: u32, height: u32 },

    #[error("Failed to encode frame {index}: {source}")]
    Encode {
        index: u64,
        #[source]
        source: gif::EncodingError,
    },

    #[error("Failed to finalize {path:?}: {source}")]
    Finalize {
        path: PathBuf,
        #[source]
        source: gif::EncodingError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodeSummary {
    pub path: PathBuf,
    pub frames: u64,
    pub width: u32,
    pub height: u32,
    pub bytes: u64,
}

/// Sink for an ordered run of frames at a uniform delay.
pub trait AnimationEncoder {
    fn append_frame(&mut self, frame: &RgbaImage) -> Result<(), EncodeError>;

    fn finish(self) -> Result<EncodeSummary, EncodeError>;
}

/// Streams frames into an infinitely looping GIF file.
///
/// The canvas takes the size of the first frame. Frames of any other size
/// (uncropped fallbacks) are scaled to the canvas.
pub struct GifFileEncoder {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    encoder: Option<gif::Encoder<BufWriter<File>>>,
    canvas: (u16, u16),
    delay_cs: u16,
    frame_count: u64,
}

impl GifFileEncoder {
    pub fn create(path: &Path, fps: u32) -> Result<Self, EncodeError> {
        let file = File::create(path).map_err(|source| EncodeError::CreateOutput {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(GifFileEncoder {
            path: path.to_path_buf(),
            writer: Some(BufWriter::new(file)),
            encoder: None,
            canvas: (0, 0),
            delay_cs: delay_centiseconds(fps),
            frame_count: 0,
        })
    }

    fn start(&mut self, width: u16, height: u16) -> Result<(), EncodeError> {
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        let index = self.frame_count;
        let mut encoder = gif::Encoder::new(writer, width, height, &[])
            .map_err(|source| EncodeError::Encode { index, source })?;
        encoder
            .set_repeat(gif::Repeat::Infinite)
            .map_err(|source| EncodeError::Encode { index, source })?;

        log::info!(
            "GifFileEncoder: started {:?} ({}x{}, {}cs per frame)",
            self.path,
            width,
            height,
            self.delay_cs
        );
        self.canvas = (width, height);
        self.encoder = Some(encoder);
        Ok(())
    }
}

impl AnimationEncoder for GifFileEncoder {
    fn append_frame(&mut self, frame: &RgbaImage) -> Result<(), EncodeError> {
        if self.encoder.is_none() {
            let (width, height) = gif_dimensions(frame)?;
            self.start(width, height)?;
        }

        let (cw, ch) = self.canvas;
        let mut pixels = if frame.dimensions() == (u32::from(cw), u32::from(ch)) {
            frame.as_raw().clone()
        } else {
            log::debug!(
                "GifFileEncoder: scaling {}x{} frame to {}x{} canvas",
                frame.width(),
                frame.height(),
                cw,
                ch
            );
            imageops::resize(frame, u32::from(cw), u32::from(ch), FilterType::Triangle).into_raw()
        };

        let mut gif_frame = gif::Frame::from_rgba_speed(cw, ch, &mut pixels, QUANTIZE_SPEED);
        gif_frame.delay = self.delay_cs;

        let index = self.frame_count;
        if let Some(encoder) = self.encoder.as_mut() {
            encoder
                .write_frame(&gif_frame)
                .map_err(|source| EncodeError::Encode { index, source })?;
        }
        self.frame_count += 1;
        Ok(())
    }

    fn finish(mut self) -> Result<EncodeSummary, EncodeError> {
        let Some(encoder) = self.encoder.take() else {
            // Nothing was written; don't leave an empty file behind.
            drop(self.writer.take());
            let _ = std::fs::remove_file(&self.path);
            return Err(EncodeError::NoFrames);
        };

        let finalize = |source: gif::EncodingError| EncodeError::Finalize {
            path: self.path.clone(),
            source,
        };
        let mut writer = encoder.into_inner().map_err(finalize)?;
        writer.flush().map_err(|e| finalize(e.into()))?;
        drop(writer);

        let bytes = std::fs::metadata(&self.path)
            .map(|m| m.len())
            .map_err(|e| finalize(e.into()))?;

        log::info!(
            "GifFileEncoder: finished writing {:?} ({} frames, {} bytes)",
            self.path,
            self.frame_count,
            bytes
        );

        Ok(EncodeSummary {
            path: self.path.clone(),
            frames: self.frame_count,
            width: u32::from(self.canvas.0),
            height: u32::from(self.canvas.1),
            bytes,
        })
    }
}

/// Encode a whole sequence into a looping GIF at `path`.
pub fn encode_sequence(sequence: &FrameSequence, path: &Path) -> Result<EncodeSummary, EncodeError> {
    if sequence.is_empty() {
        return Err(EncodeError::NoFrames);
    }
    let encoder = GifFileEncoder::create(path, sequence.fps())?;
    encode_with(encoder, sequence)
}

/// Feed every frame of `sequence` to `encoder` in order, then finish it.
pub fn encode_with<E: AnimationEncoder>(
    mut encoder: E,
    sequence: &FrameSequence,
) -> Result<EncodeSummary, EncodeError> {
    if sequence.is_empty() {
        return Err(EncodeError::NoFrames);
    }
    for frame in sequence.frames() {
        encoder.append_frame(frame)?;
    }
    encoder.finish()
}

/// GIF frame delay for `fps`, in hundredths of a second.
pub fn delay_centiseconds(fps: u32) -> u16 {
    let cs = (100.0 / f64::from(fps.max(1))).round();
    cs.clamp(1.0, f64::from(u16::MAX)) as u16
}

fn gif_dimensions(frame: &RgbaImage) -> Result<(u16, u16), EncodeError> {
    let (width, height) = frame.dimensions();
    match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(EncodeError::FrameTooLarge { width, height }),
    }
}
