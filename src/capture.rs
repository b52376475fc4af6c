use image::RgbaImage;

/// One raw full-display pixel buffer as delivered by the capture service.
///
/// Its pixel size is whatever the service produced; it need not equal the
/// display's point size times its backing scale.
#[derive(Debug, Clone)]
pub struct CaptureFrame {
    pub image: RgbaImage,
}

impl CaptureFrame {
    pub fn new(image: RgbaImage) -> Self {
        CaptureFrame { image }
    }

    pub fn pixel_width(&self) -> u32 {
        self.image.width()
    }

    pub fn pixel_height(&self) -> u32 {
        self.image.height()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CaptureError {
    #[error("Screen recording permission not granted")]
    PermissionDenied,

    #[error("Display {0} not found")]
    DisplayNotFound(u32),

    #[error("Screen capture failed: {0}")]
    CaptureFailed(String),

    #[error("Screen capture is not supported on this platform")]
    Unsupported,
}

/// Anything that can produce full-display frames on demand.
///
/// Sources are driven from the capture thread, one call per tick.
pub trait CaptureSource: Send {
    fn capture(&mut self) -> Result<CaptureFrame, CaptureError>;
}

impl<S: CaptureSource + ?Sized> CaptureSource for Box<S> {
    fn capture(&mut self) -> Result<CaptureFrame, CaptureError> {
        (**self).capture()
    }
}

/// Capture source for a display, as chosen by `screen::display_for_selection`.
#[cfg(target_os = "macos")]
pub fn display_source(display_id: u32) -> Result<Box<dyn CaptureSource>, CaptureError> {
    if !macos::has_screen_recording_permission() {
        return Err(CaptureError::PermissionDenied);
    }
    Ok(Box::new(macos::DisplayCapture::new(display_id)))
}

#[cfg(not(target_os = "macos"))]
pub fn display_source(_display_id: u32) -> Result<Box<dyn CaptureSource>, CaptureError> {
    Err(CaptureError::Unsupported)
}

#[cfg(target_os = "macos")]
pub use macos::DisplayCapture;

#[cfg(target_os = "macos")]
mod macos {
    use image::RgbaImage;
    use objc2_core_foundation::{CGFloat, CGPoint, CGRect, CGSize};
    #[allow(deprecated)]
    use objc2_core_graphics::CGWindowListCreateImage;
    use objc2_core_graphics::{
        CGBitmapContextCreate, CGColorSpace, CGContext, CGDisplayBounds, CGImage,
        CGImageAlphaInfo, CGWindowID, CGWindowImageOption, CGWindowListOption,
    };

    use super::{CaptureError, CaptureFrame, CaptureSource};

    /// Captures one display through CoreGraphics at its best resolution.
    pub struct DisplayCapture {
        display_id: u32,
    }

    impl DisplayCapture {
        pub fn new(display_id: u32) -> Self {
            DisplayCapture { display_id }
        }
    }

    impl CaptureSource for DisplayCapture {
        #[allow(deprecated)] // CGWindowListCreateImage deprecated in favor of ScreenCaptureKit
        fn capture(&mut self) -> Result<CaptureFrame, CaptureError> {
            let bounds = CGDisplayBounds(self.display_id);
            if bounds.size.width <= 0.0 || bounds.size.height <= 0.0 {
                return Err(CaptureError::DisplayNotFound(self.display_id));
            }

            let image = CGWindowListCreateImage(
                bounds,
                CGWindowListOption::OptionOnScreenOnly,
                0 as CGWindowID,
                CGWindowImageOption::BestResolution,
            )
            .ok_or_else(|| {
                CaptureError::CaptureFailed(format!(
                    "CGWindowListCreateImage returned nothing for display {}",
                    self.display_id
                ))
            })?;

            let width = CGImage::width(Some(&image));
            let height = CGImage::height(Some(&image));
            let rgba = cgimage_to_rgba(&image)?;
            let buffer = RgbaImage::from_raw(width as u32, height as u32, rgba)
                .ok_or_else(|| CaptureError::CaptureFailed("pixel buffer size mismatch".into()))?;

            log::debug!(
                "Display {}: captured {}x{} pixels (bounds {}x{} points)",
                self.display_id,
                width,
                height,
                bounds.size.width,
                bounds.size.height
            );

            Ok(CaptureFrame::new(buffer))
        }
    }

    /// Check if we have screen recording permission by attempting a minimal capture.
    #[allow(deprecated)]
    pub fn has_screen_recording_permission() -> bool {
        let bounds = CGRect::new(CGPoint::ZERO, CGSize::new(1.0, 1.0));
        let image = CGWindowListCreateImage(
            bounds,
            CGWindowListOption::OptionOnScreenOnly,
            0 as CGWindowID,
            CGWindowImageOption::NominalResolution,
        );
        image.is_some()
    }

    /// Render a CGImage into a tightly packed RGBA buffer.
    fn cgimage_to_rgba(image: &CGImage) -> Result<Vec<u8>, CaptureError> {
        let width = CGImage::width(Some(image));
        let height = CGImage::height(Some(image));
        let bytes_per_row = width * 4;

        let color_space = CGColorSpace::new_device_rgb()
            .ok_or_else(|| CaptureError::CaptureFailed("Failed to create color space".into()))?;

        let bitmap_info = CGImageAlphaInfo::PremultipliedLast.0;
        let mut buffer = vec![0u8; bytes_per_row * height];
        let ctx = unsafe {
            CGBitmapContextCreate(
                buffer.as_mut_ptr() as *mut _,
                width,
                height,
                8,
                bytes_per_row,
                Some(&color_space),
                bitmap_info,
            )
        }
        .ok_or_else(|| CaptureError::CaptureFailed("Failed to create bitmap context".into()))?;

        let draw_rect = CGRect::new(
            CGPoint::ZERO,
            CGSize::new(width as CGFloat, height as CGFloat),
        );
        CGContext::draw_image(Some(&ctx), draw_rect, Some(image));
        drop(ctx);

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Solid(u32, u32);

    impl CaptureSource for Solid {
        fn capture(&mut self) -> Result<CaptureFrame, CaptureError> {
            Ok(CaptureFrame::new(RgbaImage::new(self.0, self.1)))
        }
    }

    #[test]
    fn boxed_source_delegates() {
        let mut source: Box<dyn CaptureSource> = Box::new(Solid(64, 48));
        let frame = source.capture().unwrap();
        assert_eq!((frame.pixel_width(), frame.pixel_height()), (64, 48));
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn display_source_unsupported_off_macos() {
        assert!(matches!(display_source(1), Err(CaptureError::Unsupported)));
    }
}
