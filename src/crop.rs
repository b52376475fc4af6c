//! Pure frame cropping. Pixel data in, pixel data out.

use image::RgbaImage;

use crate::geometry::CropRect;

/// Crop `image` to `rect`, failing instead of clamping when the rect does
/// not lie inside the image.
pub fn crop_frame(image: &RgbaImage, rect: CropRect) -> Result<RgbaImage, CropError> {
    if rect.is_empty() {
        return Err(CropError::ZeroDimension);
    }

    let (img_width, img_height) = image.dimensions();
    if !rect.fits_within(img_width, img_height) {
        return Err(CropError::OutOfBounds {
            requested: rect,
            image_size: (img_width, img_height),
        });
    }

    // fits_within guarantees a non-negative origin.
    let cropped =
        image::imageops::crop_imm(image, rect.x as u32, rect.y as u32, rect.width, rect.height);
    Ok(cropped.to_image())
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CropError {
    #[error("Crop rectangle has zero width or height")]
    ZeroDimension,

    #[error(
        "Crop rectangle {requested} exceeds image bounds ({}x{})",
        image_size.0, image_size.1
    )]
    OutOfBounds {
        requested: CropRect,
        image_size: (u32, u32),
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 0, 255]))
    }

    #[test]
    fn crop_valid_region() {
        let img = gradient(100, 100);
        let cropped = crop_frame(&img, CropRect::new(10, 20, 50, 30)).unwrap();
        assert_eq!(cropped.dimensions(), (50, 30));
        assert_eq!(cropped.get_pixel(0, 0), &Rgba([10, 20, 0, 255]));
        assert_eq!(cropped.get_pixel(49, 29), &Rgba([59, 49, 0, 255]));
    }

    #[test]
    fn crop_whole_image() {
        let img = gradient(40, 30);
        let cropped = crop_frame(&img, CropRect::new(0, 0, 40, 30)).unwrap();
        assert_eq!(cropped, img);
    }

    #[test]
    fn crop_zero_dimension_fails() {
        let img = gradient(100, 100);
        let result = crop_frame(&img, CropRect::new(0, 0, 0, 50));
        assert_eq!(result, Err(CropError::ZeroDimension));
    }

    #[test]
    fn crop_out_of_bounds_fails() {
        let img = gradient(100, 100);
        let result = crop_frame(&img, CropRect::new(80, 80, 30, 30));
        assert!(matches!(result, Err(CropError::OutOfBounds { .. })));
    }

    #[test]
    fn crop_negative_origin_fails() {
        let img = gradient(100, 100);
        let result = crop_frame(&img, CropRect::new(-1, 0, 10, 10));
        assert!(matches!(result, Err(CropError::OutOfBounds { .. })));
    }
}
