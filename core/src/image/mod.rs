//! Decoded CPU-side images.
//!
//! An [`Image`] is a tightly packed pixel buffer with known dimensions and
//! layout. Texture uploads read width, height, format and raw bytes from it.

#[cfg(feature = "image")]
mod decode;

use crate::pixel::{self, PixelFormat, PixelType};

/// Errors produced when building or decoding an [`Image`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    /// Width or height is zero.
    #[error("image dimensions cannot be zero ({width}x{height})")]
    ZeroSize {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// Byte length does not match the dimensions and layout.
    #[error("image data is {actual} bytes, expected {expected}")]
    SizeMismatch {
        /// Bytes required by the dimensions and layout.
        expected: usize,
        /// Bytes provided.
        actual: usize,
    },
    /// The source file could not be read or decoded.
    #[error("failed to decode image: {0}")]
    Decode(String),
}

/// A decoded pixel buffer.
///
/// Rows are stored top to bottom and tightly packed (no row padding).
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    format: PixelFormat,
    pixel_type: PixelType,
    data: Vec<u8>,
}

impl Image {
    /// Create an image from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is zero or `data` does not hold exactly
    /// `width * height` pixels of the given layout.
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        pixel_type: PixelType,
        data: Vec<u8>,
    ) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::ZeroSize { width, height });
        }
        let expected = pixel::region_size(width, height, format, pixel_type);
        if data.len() != expected {
            return Err(ImageError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            pixel_type,
            data,
        })
    }

    /// Create an image from typed pixel values (e.g. `f32` or `u16` channels).
    ///
    /// # Errors
    ///
    /// Same conditions as [`Image::new`].
    pub fn from_pixels<T: bytemuck::Pod>(
        width: u32,
        height: u32,
        format: PixelFormat,
        pixel_type: PixelType,
        pixels: &[T],
    ) -> Result<Self, ImageError> {
        let bytes: &[u8] = bytemuck::cast_slice(pixels);
        Self::new(width, height, format, pixel_type, bytes.to_vec())
    }

    /// Create a zero-filled image.
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is zero.
    pub fn zeroed(
        width: u32,
        height: u32,
        format: PixelFormat,
        pixel_type: PixelType,
    ) -> Result<Self, ImageError> {
        let size = pixel::region_size(width, height, format, pixel_type);
        Self::new(width, height, format, pixel_type, vec![0; size])
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Channel layout.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Channel storage type.
    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    /// Bytes per pixel.
    pub fn bytes_per_pixel(&self) -> u32 {
        pixel::bytes_per_pixel(self.format, self.pixel_type)
    }

    /// Bytes per row.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.bytes_per_pixel() as usize
    }

    /// Raw pixel bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw pixel bytes.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the image and return its bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Bytes of the pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.bytes_per_pixel() as usize;
        let start = y as usize * self.row_bytes() + x as usize * bpp;
        self.data.get(start..start + bpp)
    }

    /// Reverse the row order in place.
    ///
    /// OpenGL expects the first row to be the bottom of the image.
    pub fn flip_vertically(&mut self) {
        let row = self.row_bytes();
        let rows = self.height as usize;
        for y in 0..rows / 2 {
            let (top, bottom) = self.data.split_at_mut((rows - 1 - y) * row);
            top[y * row..(y + 1) * row].swap_with_slice(&mut bottom[..row]);
        }
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("pixel_type", &self.pixel_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}
