//! Post-recording preview, trim and export.

pub mod export;
pub mod model;

pub use export::{ExportError, export_from_editor, export_trimmed};
pub use model::EditorState;
