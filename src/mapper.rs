//! Selection-to-pixel coordinate mapping.
//!
//! Selections live in global point space with a bottom-left origin. Captured
//! frames are pixel buffers with a top-left origin whose density is whatever
//! the capture service delivered, which is not necessarily the display's
//! backing scale.

use crate::geometry::{CropRect, Rect};

/// Ratio of captured pixels to display points, per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureScale {
    pub x: f64,
    pub y: f64,
}

impl CaptureScale {
    pub fn new(x: f64, y: f64) -> Self {
        CaptureScale { x, y }
    }

    /// Observed scale of a captured frame of the given display.
    pub fn from_frame(pixel_width: u32, pixel_height: u32, display_frame: Rect) -> Self {
        CaptureScale {
            x: f64::from(pixel_width) / display_frame.size.width,
            y: f64::from(pixel_height) / display_frame.size.height,
        }
    }

    /// The display's reported backing scale on both axes.
    pub fn nominal(backing_scale: f64) -> Self {
        CaptureScale {
            x: backing_scale,
            y: backing_scale,
        }
    }
}

/// Map a selection to the crop rectangle of a frame captured from
/// `display_frame` at `scale`.
///
/// Callers must pass a validated, non-degenerate selection and a display
/// frame with positive size.
pub fn map_selection(selection: Rect, display_frame: Rect, scale: CaptureScale) -> CropRect {
    let local_x = selection.origin.x - display_frame.origin.x;
    let local_y = selection.origin.y - display_frame.origin.y;

    // Distance from the display's top edge to the selection's top edge.
    let top = display_frame.size.height - (local_y + selection.size.height);

    CropRect {
        x: (local_x * scale.x).round() as i64,
        y: (top * scale.y).round() as i64,
        width: (selection.size.width * scale.x).round().max(0.0) as u32,
        height: (selection.size.height * scale.y).round().max(0.0) as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_HD: Rect = Rect {
        origin: crate::geometry::Point { x: 0.0, y: 0.0 },
        size: crate::geometry::Size {
            width: 1920.0,
            height: 1080.0,
        },
    };

    #[test]
    fn maps_retina_selection() {
        let crop = map_selection(
            Rect::new(100.0, 200.0, 400.0, 300.0),
            FULL_HD,
            CaptureScale::new(2.0, 2.0),
        );
        assert_eq!(crop, CropRect::new(200, 1160, 800, 600));
    }

    #[test]
    fn size_is_rounded_scaled_size() {
        let selections = [
            Rect::new(10.0, 20.0, 3.0, 3.0),
            Rect::new(0.5, 0.5, 123.4, 56.7),
            Rect::new(333.3, 111.1, 640.25, 479.75),
            Rect::new(1000.0, 800.0, 920.0, 280.0),
        ];
        for sx in [1.0, 2.0, 3.0] {
            for sy in [1.0, 2.0, 3.0] {
                for sel in selections {
                    let crop = map_selection(sel, FULL_HD, CaptureScale::new(sx, sy));
                    assert_eq!(crop.width, (sel.size.width * sx).round() as u32);
                    assert_eq!(crop.height, (sel.size.height * sy).round() as u32);
                }
            }
        }
    }

    #[test]
    fn top_edge_maps_to_row_zero() {
        for scale in [1.0, 2.0, 3.0] {
            let crop = map_selection(
                Rect::new(50.0, 780.0, 200.0, 300.0),
                FULL_HD,
                CaptureScale::nominal(scale),
            );
            assert_eq!(crop.y, 0);
        }
    }

    #[test]
    fn bottom_edge_maps_to_last_rows() {
        let crop = map_selection(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            FULL_HD,
            CaptureScale::new(2.0, 2.0),
        );
        assert_eq!(crop.y + i64::from(crop.height), 2160);
    }

    #[test]
    fn mapping_is_pure() {
        let sel = Rect::new(12.3, 45.6, 78.9, 101.1);
        let scale = CaptureScale::new(1.7, 2.3);
        assert_eq!(
            map_selection(sel, FULL_HD, scale),
            map_selection(sel, FULL_HD, scale)
        );
    }

    #[test]
    fn subtracts_display_origin() {
        // Secondary display to the right of and below the primary.
        let display = Rect::new(1920.0, -1440.0, 2560.0, 1440.0);
        let crop = map_selection(
            Rect::new(2020.0, -1340.0, 500.0, 400.0),
            display,
            CaptureScale::new(1.0, 1.0),
        );
        // local = (100, 100), top = 1440 - 500 = 940
        assert_eq!(crop, CropRect::new(100, 940, 500, 400));
    }

    #[test]
    fn observed_scale_differs_from_nominal() {
        // A 2x display delivered at 1.5x.
        let scale = CaptureScale::from_frame(2880, 1620, FULL_HD);
        assert_eq!(scale, CaptureScale::new(1.5, 1.5));

        let crop = map_selection(Rect::new(100.0, 200.0, 400.0, 300.0), FULL_HD, scale);
        assert_eq!(crop, CropRect::new(150, 870, 600, 450));
    }

    #[test]
    fn selection_off_display_has_negative_origin() {
        let crop = map_selection(
            Rect::new(-50.0, 100.0, 200.0, 100.0),
            FULL_HD,
            CaptureScale::new(2.0, 2.0),
        );
        assert_eq!(crop.x, -100);
        assert!(!crop.fits_within(3840, 2160));
    }
}
