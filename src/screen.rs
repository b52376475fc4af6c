use crate::geometry::Rect;
use crate::selection::SelectionError;

/// One physical display, with its frame in global point space
/// (bottom-left origin, same space as selections).
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayDescriptor {
    pub id: u32,
    pub frame: Rect,
    /// Nominal points-to-pixels ratio reported by the display (1, 2 or 3).
    /// Capture geometry never relies on it; see `CaptureScale::from_frame`.
    pub backing_scale: f64,
    pub is_primary: bool,
}

/// Pick the display a selection belongs to.
///
/// The display whose frame contains the selection's midpoint wins. A midpoint
/// that falls in a gap between displays goes to the primary display, or the
/// first display when none is flagged primary.
pub fn display_for_selection(
    displays: &[DisplayDescriptor],
    selection: Rect,
) -> Result<&DisplayDescriptor, SelectionError> {
    let mid = selection.mid_point();

    if let Some(display) = displays.iter().find(|d| d.frame.contains(mid)) {
        return Ok(display);
    }

    let fallback = displays
        .iter()
        .find(|d| d.is_primary)
        .or_else(|| displays.first())
        .ok_or(SelectionError::NoDisplay)?;

    log::warn!(
        "Selection midpoint ({}, {}) is not on any display, falling back to display {}",
        mid.x,
        mid.y,
        fallback.id
    );
    Ok(fallback)
}

/// Enumerate active displays with frames converted to bottom-left global points.
#[cfg(target_os = "macos")]
pub fn active_displays() -> Result<Vec<DisplayDescriptor>, crate::capture::CaptureError> {
    use objc2_core_graphics::{
        CGDirectDisplayID, CGDisplayBounds, CGDisplayCopyDisplayMode, CGDisplayMode, CGError,
        CGGetActiveDisplayList, CGMainDisplayID,
    };

    use crate::capture::CaptureError;

    const MAX_DISPLAYS: usize = 16;

    let mut ids: [CGDirectDisplayID; MAX_DISPLAYS] = [0; MAX_DISPLAYS];
    let mut count: u32 = 0;
    let result =
        unsafe { CGGetActiveDisplayList(MAX_DISPLAYS as u32, ids.as_mut_ptr(), &mut count) };
    if result != CGError(0) {
        return Err(CaptureError::CaptureFailed(format!(
            "CGGetActiveDisplayList failed: {:?}",
            result
        )));
    }

    // CG bounds have a top-left origin at the primary display.
    // Convert: appkit_y = primary_height - (cg_y + height)
    let main_id = CGMainDisplayID();
    let main_bounds = CGDisplayBounds(main_id);

    let displays: Vec<DisplayDescriptor> = ids[..count as usize]
        .iter()
        .map(|&id| {
            let bounds = CGDisplayBounds(id);
            let frame = Rect::new(
                bounds.origin.x,
                main_bounds.size.height - (bounds.origin.y + bounds.size.height),
                bounds.size.width,
                bounds.size.height,
            );
            let backing_scale = CGDisplayCopyDisplayMode(id)
                .map(|mode| CGDisplayMode::pixel_width(Some(&mode)) as f64 / bounds.size.width)
                .filter(|s| s.is_finite() && *s > 0.0)
                .unwrap_or(1.0);

            DisplayDescriptor {
                id,
                frame,
                backing_scale,
                is_primary: id == main_id,
            }
        })
        .collect();

    log::info!("Found {} display(s)", displays.len());
    for d in &displays {
        log::info!(
            "  Display {} at {} (scale {:.2}, primary: {})",
            d.id,
            d.frame,
            d.backing_scale,
            d.is_primary
        );
    }

    Ok(displays)
}

#[cfg(not(target_os = "macos"))]
pub fn active_displays() -> Result<Vec<DisplayDescriptor>, crate::capture::CaptureError> {
    Err(crate::capture::CaptureError::Unsupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display(id: u32, frame: Rect, is_primary: bool) -> DisplayDescriptor {
        DisplayDescriptor {
            id,
            frame,
            backing_scale: 2.0,
            is_primary,
        }
    }

    fn two_displays() -> Vec<DisplayDescriptor> {
        vec![
            display(1, Rect::new(0.0, 0.0, 1920.0, 1080.0), true),
            display(2, Rect::new(1920.0, 0.0, 2560.0, 1440.0), false),
        ]
    }

    #[test]
    fn picks_display_containing_selection() {
        let displays = two_displays();
        let d = display_for_selection(&displays, Rect::new(2000.0, 100.0, 300.0, 200.0)).unwrap();
        assert_eq!(d.id, 2);
    }

    #[test]
    fn spanning_selection_uses_midpoint() {
        let displays = two_displays();
        // Midpoint x = 1800 + 400/2 = 2000, on the second display.
        let d = display_for_selection(&displays, Rect::new(1800.0, 100.0, 400.0, 200.0)).unwrap();
        assert_eq!(d.id, 2);
        // Midpoint x = 1700 + 400/2 = 1900, on the first display.
        let d = display_for_selection(&displays, Rect::new(1700.0, 100.0, 400.0, 200.0)).unwrap();
        assert_eq!(d.id, 1);
    }

    #[test]
    fn midpoint_on_shared_edge_goes_right() {
        let displays = two_displays();
        let d = display_for_selection(&displays, Rect::new(1820.0, 100.0, 200.0, 200.0)).unwrap();
        assert_eq!(d.id, 2);
    }

    #[test]
    fn gap_falls_back_to_primary() {
        let displays = vec![
            display(7, Rect::new(3000.0, 0.0, 1920.0, 1080.0), false),
            display(3, Rect::new(0.0, 0.0, 1920.0, 1080.0), true),
        ];
        let d = display_for_selection(&displays, Rect::new(2200.0, 100.0, 200.0, 200.0)).unwrap();
        assert_eq!(d.id, 3);
    }

    #[test]
    fn gap_without_primary_falls_back_to_first() {
        let displays = vec![
            display(7, Rect::new(3000.0, 0.0, 1920.0, 1080.0), false),
            display(3, Rect::new(0.0, 0.0, 1920.0, 1080.0), false),
        ];
        let d = display_for_selection(&displays, Rect::new(2200.0, 100.0, 200.0, 200.0)).unwrap();
        assert_eq!(d.id, 7);
    }

    #[test]
    fn no_displays_is_an_error() {
        let err = display_for_selection(&[], Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(matches!(err, Err(SelectionError::NoDisplay)));
    }
}
