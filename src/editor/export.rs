use std::path::Path;

use super::model::EditorState;
use crate::encoder::{EncodeError, EncodeSummary, encode_sequence};
use crate::frames::{FrameSequence, TrimError};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Trim(#[from] TrimError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Export the inclusive frame range `[start, end]` of `sequence` as a GIF.
pub fn export_trimmed(
    sequence: &FrameSequence,
    start: usize,
    end: usize,
    output_path: &Path,
) -> Result<EncodeSummary, ExportError> {
    let trimmed = sequence.trim(start, end)?;
    let summary = encode_sequence(&trimmed, output_path)?;
    log::info!(
        "Export complete: frames {}..={} ({} of {}) -> {:?}, {} bytes",
        start,
        end,
        summary.frames,
        sequence.len(),
        output_path,
        summary.bytes
    );
    Ok(summary)
}

/// Export whatever the editor's trim handles currently select.
pub fn export_from_editor(
    editor: &EditorState,
    output_path: &Path,
) -> Result<EncodeSummary, ExportError> {
    let (start, end) = editor.trim_range();
    export_trimmed(editor.sequence(), start, end, output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn sequence(count: u8) -> FrameSequence {
        let frames = (0..count)
            .map(|i| RgbaImage::from_pixel(16, 16, Rgba([i * 10, 0, 0, 255])))
            .collect();
        FrameSequence::from_frames(frames, 10)
    }

    #[test]
    fn exports_trimmed_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trimmed.gif");
        let summary = export_trimmed(&sequence(8), 2, 5, &path).unwrap();
        assert_eq!(summary.frames, 4);
        assert!(path.exists());
    }

    #[test]
    fn invalid_range_is_rejected_before_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never.gif");
        let result = export_trimmed(&sequence(8), 5, 2, &path);
        assert!(matches!(result, Err(ExportError::Trim(TrimError::Reversed { .. }))));
        assert!(!path.exists());
    }

    #[test]
    fn exports_editor_selection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editor.gif");
        let mut editor = EditorState::new(sequence(6)).unwrap();
        editor.set_trim_start(1);
        editor.set_trim_end(3);
        let summary = export_from_editor(&editor, &path).unwrap();
        assert_eq!(summary.frames, 3);
    }
}
