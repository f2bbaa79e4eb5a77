//! Texture types and descriptors.

// Re-export CPU-side pixel layouts from core.
pub use glint_core::pixel::{PixelFormat, PixelType};

/// Internal storage format of a texture on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum TextureFormat {
    /// 8-bit red channel, unsigned normalized.
    R8,
    /// 8-bit RG channels, unsigned normalized.
    Rg8,
    /// 8-bit RGB channels, unsigned normalized.
    Rgb8,
    /// 8-bit RGBA channels, unsigned normalized.
    #[default]
    Rgba8,
    /// 8-bit RGBA channels, sRGB color with linear alpha.
    Srgb8Alpha8,
    /// 16-bit red channel, float.
    R16Float,
    /// 16-bit RG channels, float.
    Rg16Float,
    /// 16-bit RGBA channels, float.
    Rgba16Float,
    /// 32-bit red channel, float.
    R32Float,
    /// 32-bit RGBA channels, float.
    Rgba32Float,
    /// 16-bit depth.
    Depth16,
    /// 24-bit depth.
    Depth24,
    /// 32-bit depth, float.
    Depth32Float,
    /// 24-bit depth with 8-bit stencil.
    Depth24Stencil8,
}

impl TextureFormat {
    /// Returns true if this is a depth or depth/stencil format.
    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            Self::Depth16 | Self::Depth24 | Self::Depth32Float | Self::Depth24Stencil8
        )
    }

    /// Returns true if this format has a stencil component.
    pub fn has_stencil(&self) -> bool {
        matches!(self, Self::Depth24Stencil8)
    }

    /// Returns true if the color channels are stored as floats.
    pub fn is_float(&self) -> bool {
        matches!(
            self,
            Self::R16Float
                | Self::Rg16Float
                | Self::Rgba16Float
                | Self::R32Float
                | Self::Rgba32Float
        )
    }

    /// The pixel layout used when no explicit layout is given.
    pub fn default_layout(&self) -> (PixelFormat, PixelType) {
        match self {
            Self::R8 => (PixelFormat::Red, PixelType::UnsignedByte),
            Self::Rg8 => (PixelFormat::Rg, PixelType::UnsignedByte),
            Self::Rgb8 => (PixelFormat::Rgb, PixelType::UnsignedByte),
            Self::Rgba8 | Self::Srgb8Alpha8 => (PixelFormat::Rgba, PixelType::UnsignedByte),
            Self::R16Float => (PixelFormat::Red, PixelType::HalfFloat),
            Self::Rg16Float => (PixelFormat::Rg, PixelType::HalfFloat),
            Self::Rgba16Float => (PixelFormat::Rgba, PixelType::HalfFloat),
            Self::R32Float => (PixelFormat::Red, PixelType::Float),
            Self::Rgba32Float => (PixelFormat::Rgba, PixelType::Float),
            Self::Depth16 => (PixelFormat::DepthComponent, PixelType::UnsignedShort),
            Self::Depth24 => (PixelFormat::DepthComponent, PixelType::UnsignedInt),
            Self::Depth32Float => (PixelFormat::DepthComponent, PixelType::Float),
            Self::Depth24Stencil8 => (PixelFormat::DepthStencil, PixelType::UnsignedInt24_8),
        }
    }

    /// Returns true if client data in `format`/`ty` can be uploaded into this format.
    ///
    /// Follows the OpenGL ES 3.0 table of valid internal format combinations,
    /// plus BGRA uploads into RGBA8 storage.
    pub fn accepts(&self, format: PixelFormat, ty: PixelType) -> bool {
        use PixelFormat as F;
        use PixelType as T;
        match self {
            Self::R8 => format == F::Red && ty == T::UnsignedByte,
            Self::Rg8 => format == F::Rg && ty == T::UnsignedByte,
            Self::Rgb8 => format == F::Rgb && ty == T::UnsignedByte,
            Self::Rgba8 => matches!(format, F::Rgba | F::Bgra) && ty == T::UnsignedByte,
            Self::Srgb8Alpha8 => format == F::Rgba && ty == T::UnsignedByte,
            Self::R16Float => format == F::Red && matches!(ty, T::HalfFloat | T::Float),
            Self::Rg16Float => format == F::Rg && matches!(ty, T::HalfFloat | T::Float),
            Self::Rgba16Float => format == F::Rgba && matches!(ty, T::HalfFloat | T::Float),
            Self::R32Float => format == F::Red && ty == T::Float,
            Self::Rgba32Float => format == F::Rgba && ty == T::Float,
            Self::Depth16 => {
                format == F::DepthComponent && matches!(ty, T::UnsignedShort | T::UnsignedInt)
            }
            Self::Depth24 => format == F::DepthComponent && ty == T::UnsignedInt,
            Self::Depth32Float => format == F::DepthComponent && ty == T::Float,
            Self::Depth24Stencil8 => format == F::DepthStencil && ty == T::UnsignedInt24_8,
        }
    }
}

/// A texture sampling unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct TextureUnit(pub u32);

impl TextureUnit {
    /// Create a unit from its index.
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// The unit index.
    pub const fn index(&self) -> u32 {
        self.0
    }
}

impl From<u32> for TextureUnit {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

/// Descriptor for creating a 2D texture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureDescriptor {
    /// Debug label for the texture.
    pub label: Option<String>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Internal storage format.
    pub internal_format: TextureFormat,
    /// Client pixel format used for uploads.
    pub format: PixelFormat,
    /// Client pixel type used for uploads.
    pub pixel_type: PixelType,
}

impl TextureDescriptor {
    /// Create an RGBA8 texture descriptor with an RGBA / unsigned byte layout.
    pub fn new_2d(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the internal format and its default pixel layout.
    pub fn with_format(mut self, internal_format: TextureFormat) -> Self {
        let (format, pixel_type) = internal_format.default_layout();
        self.internal_format = internal_format;
        self.format = format;
        self.pixel_type = pixel_type;
        self
    }

    /// Set the client pixel layout.
    pub fn with_layout(mut self, format: PixelFormat, pixel_type: PixelType) -> Self {
        self.format = format;
        self.pixel_type = pixel_type;
        self
    }

    /// Number of levels in a full mip chain for this size.
    pub fn mip_level_count(&self) -> u32 {
        let largest = self.width.max(self.height);
        if largest == 0 {
            0
        } else {
            u32::BITS - largest.leading_zeros()
        }
    }

    /// Size of a mip level, or `None` past the end of the chain.
    pub fn level_size(&self, level: u32) -> Option<(u32, u32)> {
        if level >= self.mip_level_count() {
            return None;
        }
        Some(((self.width >> level).max(1), (self.height >> level).max(1)))
    }
}

impl Default for TextureDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            width: 0,
            height: 0,
            internal_format: TextureFormat::Rgba8,
            format: PixelFormat::Rgba,
            pixel_type: PixelType::UnsignedByte,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_descriptor_is_rgba8() {
        let desc = TextureDescriptor::new_2d(64, 32);
        assert_eq!(desc.internal_format, TextureFormat::Rgba8);
        assert_eq!(desc.format, PixelFormat::Rgba);
        assert_eq!(desc.pixel_type, PixelType::UnsignedByte);
    }

    #[test]
    fn test_with_format_sets_layout() {
        let desc = TextureDescriptor::new_2d(8, 8).with_format(TextureFormat::Depth24Stencil8);
        assert_eq!(desc.format, PixelFormat::DepthStencil);
        assert_eq!(desc.pixel_type, PixelType::UnsignedInt24_8);
    }

    #[rstest]
    #[case(1, 1, 1)]
    #[case(64, 64, 7)]
    #[case(256, 128, 9)]
    #[case(300, 1, 9)]
    fn test_mip_level_count(#[case] width: u32, #[case] height: u32, #[case] levels: u32) {
        assert_eq!(TextureDescriptor::new_2d(width, height).mip_level_count(), levels);
    }

    #[test]
    fn test_level_size_clamps_to_one() {
        let desc = TextureDescriptor::new_2d(256, 128);
        assert_eq!(desc.level_size(0), Some((256, 128)));
        assert_eq!(desc.level_size(1), Some((128, 64)));
        assert_eq!(desc.level_size(8), Some((1, 1)));
        assert_eq!(desc.level_size(9), None);
    }

    #[rstest]
    #[case(TextureFormat::Rgba8, PixelFormat::Rgba, PixelType::UnsignedByte, true)]
    #[case(TextureFormat::Rgba8, PixelFormat::Bgra, PixelType::UnsignedByte, true)]
    #[case(TextureFormat::Rgba8, PixelFormat::Rgba, PixelType::Float, false)]
    #[case(TextureFormat::Rgb8, PixelFormat::Rgba, PixelType::UnsignedByte, false)]
    #[case(TextureFormat::Rgba16Float, PixelFormat::Rgba, PixelType::Float, true)]
    #[case(TextureFormat::Rgba32Float, PixelFormat::Rgba, PixelType::HalfFloat, false)]
    #[case(TextureFormat::Depth24, PixelFormat::DepthComponent, PixelType::UnsignedInt, true)]
    #[case(
        TextureFormat::Depth24Stencil8,
        PixelFormat::DepthComponent,
        PixelType::UnsignedInt,
        false
    )]
    fn test_format_combinations(
        #[case] internal: TextureFormat,
        #[case] format: PixelFormat,
        #[case] ty: PixelType,
        #[case] accepted: bool,
    ) {
        assert_eq!(internal.accepts(format, ty), accepted);
    }
}
