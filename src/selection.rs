use crate::geometry::{Point, Rect, Size};

/// Selections smaller than this (in points, either axis) are rejected.
pub const MIN_SELECTION_SIZE: f64 = 3.0;

#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("Selection {0} has non-finite coordinates")]
    NotFinite(Rect),

    #[error("Selection {width}x{height} is smaller than the minimum {min}x{min} points")]
    TooSmall { width: f64, height: f64, min: f64 },

    #[error("No display available for selection")]
    NoDisplay,
}

/// Flip a rect dragged right-to-left or top-to-bottom so its size is positive.
pub fn normalize_rect(r: Rect) -> Rect {
    Rect {
        origin: Point::new(
            if r.size.width < 0.0 { r.origin.x + r.size.width } else { r.origin.x },
            if r.size.height < 0.0 { r.origin.y + r.size.height } else { r.origin.y },
        ),
        size: Size::new(r.size.width.abs(), r.size.height.abs()),
    }
}

/// Normalize a raw selection and reject it if it is degenerate.
///
/// This is the precondition gate in front of the coordinate mapper: nothing
/// downstream re-checks selection size.
pub fn validate_selection(raw: Rect, min_size: f64) -> Result<Rect, SelectionError> {
    if !raw.is_finite() {
        return Err(SelectionError::NotFinite(raw));
    }

    let rect = normalize_rect(raw);
    if rect.size.width < min_size || rect.size.height < min_size {
        return Err(SelectionError::TooSmall {
            width: rect.size.width,
            height: rect.size.height,
            min: min_size,
        });
    }

    Ok(rect)
}
