//! Conversion from images decoded by the `image` crate.

use std::path::Path;

use ::image::DynamicImage;

use super::{Image, ImageError};
use crate::pixel::{PixelFormat, PixelType};

impl Image {
    /// Convert a decoded image, keeping its channel layout and depth where possible.
    ///
    /// Layouts without a direct equivalent are converted to 8-bit RGBA.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        let (width, height) = (image.width(), image.height());
        let (format, pixel_type, data) = match image {
            DynamicImage::ImageLuma8(buf) => {
                (PixelFormat::Red, PixelType::UnsignedByte, buf.into_raw())
            }
            DynamicImage::ImageLumaA8(buf) => {
                (PixelFormat::Rg, PixelType::UnsignedByte, buf.into_raw())
            }
            DynamicImage::ImageRgb8(buf) => {
                (PixelFormat::Rgb, PixelType::UnsignedByte, buf.into_raw())
            }
            DynamicImage::ImageRgba8(buf) => {
                (PixelFormat::Rgba, PixelType::UnsignedByte, buf.into_raw())
            }
            DynamicImage::ImageRgb16(buf) => (
                PixelFormat::Rgb,
                PixelType::UnsignedShort,
                bytemuck::cast_slice(&buf.into_raw()).to_vec(),
            ),
            DynamicImage::ImageRgba16(buf) => (
                PixelFormat::Rgba,
                PixelType::UnsignedShort,
                bytemuck::cast_slice(&buf.into_raw()).to_vec(),
            ),
            DynamicImage::ImageRgb32F(buf) => (
                PixelFormat::Rgb,
                PixelType::Float,
                bytemuck::cast_slice(&buf.into_raw()).to_vec(),
            ),
            DynamicImage::ImageRgba32F(buf) => (
                PixelFormat::Rgba,
                PixelType::Float,
                bytemuck::cast_slice(&buf.into_raw()).to_vec(),
            ),
            other => (
                PixelFormat::Rgba,
                PixelType::UnsignedByte,
                other.to_rgba8().into_raw(),
            ),
        };

        Self {
            width,
            height,
            format,
            pixel_type,
            data,
        }
    }

    /// Load and decode an image file.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Decode`] if the file cannot be read or decoded, and
    /// [`ImageError::ZeroSize`] for empty images.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let decoded = ::image::open(path).map_err(|e| ImageError::Decode(e.to_string()))?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(ImageError::ZeroSize {
                width: decoded.width(),
                height: decoded.height(),
            });
        }
        log::debug!(
            "Decoded {} ({}x{})",
            path.display(),
            decoded.width(),
            decoded.height()
        );
        Ok(Self::from_dynamic(decoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{GrayImage, Rgb32FImage, RgbaImage};

    #[test]
    fn test_from_rgba8() {
        let buf = RgbaImage::from_pixel(3, 2, ::image::Rgba([1, 2, 3, 4]));
        let image = Image::from_dynamic(DynamicImage::ImageRgba8(buf));
        assert_eq!(image.width(), 3);
        assert_eq!(image.height(), 2);
        assert_eq!(image.format(), PixelFormat::Rgba);
        assert_eq!(image.pixel(2, 1), Some(&[1u8, 2, 3, 4][..]));
    }

    #[test]
    fn test_from_luma8() {
        let buf = GrayImage::from_pixel(4, 4, ::image::Luma([9]));
        let image = Image::from_dynamic(DynamicImage::ImageLuma8(buf));
        assert_eq!(image.format(), PixelFormat::Red);
        assert_eq!(image.data().len(), 16);
    }

    #[test]
    fn test_from_float() {
        let buf = Rgb32FImage::from_pixel(2, 2, ::image::Rgb([1.0, 0.5, 0.25]));
        let image = Image::from_dynamic(DynamicImage::ImageRgb32F(buf));
        assert_eq!(image.pixel_type(), PixelType::Float);
        assert_eq!(image.data().len(), 2 * 2 * 12);
    }

    #[test]
    fn test_open_missing_file() {
        let err = Image::open("/nonexistent/glint-test.png").unwrap_err();
        assert!(matches!(err, ImageError::Decode(_)));
    }
}
