//! Client-side pixel layouts.
//!
//! A pixel in host memory is described by a [`PixelFormat`] (which channels)
//! and a [`PixelType`] (how each channel is stored).

/// Channel layout of pixel data in host memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// Single red channel.
    Red,
    /// Red and green channels.
    Rg,
    /// Red, green and blue channels.
    Rgb,
    /// Red, green, blue and alpha channels.
    #[default]
    Rgba,
    /// Blue, green, red and alpha channels.
    Bgra,
    /// Depth values.
    DepthComponent,
    /// Packed depth and stencil values.
    DepthStencil,
}

impl PixelFormat {
    /// Number of channels per pixel.
    pub fn components(&self) -> u32 {
        match self {
            Self::Red | Self::DepthComponent => 1,
            Self::Rg | Self::DepthStencil => 2,
            Self::Rgb => 3,
            Self::Rgba | Self::Bgra => 4,
        }
    }

    /// Returns true for depth and depth/stencil layouts.
    pub fn is_depth(&self) -> bool {
        matches!(self, Self::DepthComponent | Self::DepthStencil)
    }
}

/// Storage type of each channel in host memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelType {
    /// Unsigned 8-bit.
    #[default]
    UnsignedByte,
    /// Signed 8-bit.
    Byte,
    /// Unsigned 16-bit.
    UnsignedShort,
    /// Signed 16-bit.
    Short,
    /// Unsigned 32-bit.
    UnsignedInt,
    /// Signed 32-bit.
    Int,
    /// 16-bit float.
    HalfFloat,
    /// 32-bit float.
    Float,
    /// Packed 24-bit depth and 8-bit stencil in one 32-bit word.
    UnsignedInt24_8,
}

impl PixelType {
    /// Size in bytes of one channel, or of the whole pixel for packed types.
    pub fn size(&self) -> u32 {
        match self {
            Self::UnsignedByte | Self::Byte => 1,
            Self::UnsignedShort | Self::Short | Self::HalfFloat => 2,
            Self::UnsignedInt | Self::Int | Self::Float | Self::UnsignedInt24_8 => 4,
        }
    }

    /// Returns true if one value holds every channel of a pixel.
    pub fn is_packed(&self) -> bool {
        matches!(self, Self::UnsignedInt24_8)
    }
}

/// Bytes per pixel for a format/type pair, tightly packed.
pub fn bytes_per_pixel(format: PixelFormat, ty: PixelType) -> u32 {
    if ty.is_packed() {
        ty.size()
    } else {
        format.components() * ty.size()
    }
}

/// Bytes for a tightly packed `width` x `height` region.
pub fn region_size(width: u32, height: u32, format: PixelFormat, ty: PixelType) -> usize {
    width as usize * height as usize * bytes_per_pixel(format, ty) as usize
}
