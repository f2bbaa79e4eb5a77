//! Type conversions between Glint types and OpenGL enums.

use crate::types::{
    AddressMode, AttachmentPoint, BlitMask, FilterMode, FramebufferStatus, FramebufferTarget,
    PixelFormat, PixelType, TextureFilter, TextureFormat, TextureParameter,
};

// Desktop and ES 2.0 only; absent from the ES 3.0 headers.
const FRAMEBUFFER_INCOMPLETE_DIMENSIONS: u32 = 0x8CD9;

/// Convert a TextureFormat to a sized internal format.
///
/// OpenGL ES 2.0 has no sized formats; `unsized_formats` selects the base
/// format instead.
pub fn convert_internal_format(format: TextureFormat, unsized_formats: bool) -> i32 {
    if unsized_formats {
        let base = match format {
            TextureFormat::R8 | TextureFormat::R16Float | TextureFormat::R32Float => glow::RED,
            TextureFormat::Rg8 | TextureFormat::Rg16Float => glow::RG,
            TextureFormat::Rgb8 => glow::RGB,
            TextureFormat::Depth16 | TextureFormat::Depth24 | TextureFormat::Depth32Float => {
                glow::DEPTH_COMPONENT
            }
            TextureFormat::Depth24Stencil8 => glow::DEPTH_STENCIL,
            _ => glow::RGBA,
        };
        return base as i32;
    }

    let sized = match format {
        TextureFormat::R8 => glow::R8,
        TextureFormat::Rg8 => glow::RG8,
        TextureFormat::Rgb8 => glow::RGB8,
        TextureFormat::Rgba8 => glow::RGBA8,
        TextureFormat::Srgb8Alpha8 => glow::SRGB8_ALPHA8,
        TextureFormat::R16Float => glow::R16F,
        TextureFormat::Rg16Float => glow::RG16F,
        TextureFormat::Rgba16Float => glow::RGBA16F,
        TextureFormat::R32Float => glow::R32F,
        TextureFormat::Rgba32Float => glow::RGBA32F,
        TextureFormat::Depth16 => glow::DEPTH_COMPONENT16,
        TextureFormat::Depth24 => glow::DEPTH_COMPONENT24,
        TextureFormat::Depth32Float => glow::DEPTH_COMPONENT32F,
        TextureFormat::Depth24Stencil8 => glow::DEPTH24_STENCIL8,
    };
    sized as i32
}

/// Convert a PixelFormat to a client format enum.
pub fn convert_pixel_format(format: PixelFormat) -> u32 {
    match format {
        PixelFormat::Red => glow::RED,
        PixelFormat::Rg => glow::RG,
        PixelFormat::Rgb => glow::RGB,
        PixelFormat::Rgba => glow::RGBA,
        PixelFormat::Bgra => glow::BGRA,
        PixelFormat::DepthComponent => glow::DEPTH_COMPONENT,
        PixelFormat::DepthStencil => glow::DEPTH_STENCIL,
    }
}

/// Convert a PixelType to a client type enum.
pub fn convert_pixel_type(ty: PixelType) -> u32 {
    match ty {
        PixelType::UnsignedByte => glow::UNSIGNED_BYTE,
        PixelType::Byte => glow::BYTE,
        PixelType::UnsignedShort => glow::UNSIGNED_SHORT,
        PixelType::Short => glow::SHORT,
        PixelType::UnsignedInt => glow::UNSIGNED_INT,
        PixelType::Int => glow::INT,
        PixelType::HalfFloat => glow::HALF_FLOAT,
        PixelType::Float => glow::FLOAT,
        PixelType::UnsignedInt24_8 => glow::UNSIGNED_INT_24_8,
    }
}

/// Convert a TextureFilter to a filter enum.
pub fn convert_texture_filter(filter: TextureFilter) -> u32 {
    match filter {
        TextureFilter::Nearest => glow::NEAREST,
        TextureFilter::Linear => glow::LINEAR,
        TextureFilter::NearestMipmapNearest => glow::NEAREST_MIPMAP_NEAREST,
        TextureFilter::LinearMipmapNearest => glow::LINEAR_MIPMAP_NEAREST,
        TextureFilter::NearestMipmapLinear => glow::NEAREST_MIPMAP_LINEAR,
        TextureFilter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
    }
}

/// Convert a FilterMode to a blit filter enum.
pub fn convert_filter_mode(filter: FilterMode) -> u32 {
    match filter {
        FilterMode::Nearest => glow::NEAREST,
        FilterMode::Linear => glow::LINEAR,
    }
}

/// Convert an AddressMode to a wrap enum.
pub fn convert_address_mode(mode: AddressMode) -> u32 {
    match mode {
        AddressMode::ClampToEdge => glow::CLAMP_TO_EDGE,
        AddressMode::Repeat => glow::REPEAT,
        AddressMode::MirrorRepeat => glow::MIRRORED_REPEAT,
    }
}

/// Convert a TextureParameter to its (name, value) pair.
pub fn convert_texture_parameter(parameter: TextureParameter) -> (u32, i32) {
    let (name, value) = match parameter {
        TextureParameter::MagFilter(filter) => {
            (glow::TEXTURE_MAG_FILTER, convert_texture_filter(filter))
        }
        TextureParameter::MinFilter(filter) => {
            (glow::TEXTURE_MIN_FILTER, convert_texture_filter(filter))
        }
        TextureParameter::WrapS(mode) => (glow::TEXTURE_WRAP_S, convert_address_mode(mode)),
        TextureParameter::WrapT(mode) => (glow::TEXTURE_WRAP_T, convert_address_mode(mode)),
    };
    (name, value as i32)
}

/// Convert a FramebufferTarget to a framebuffer target enum.
pub fn convert_framebuffer_target(target: FramebufferTarget) -> u32 {
    match target {
        FramebufferTarget::Draw => glow::DRAW_FRAMEBUFFER,
        FramebufferTarget::Read => glow::READ_FRAMEBUFFER,
        FramebufferTarget::Both => glow::FRAMEBUFFER,
    }
}

/// Convert an AttachmentPoint to an attachment enum.
pub fn convert_attachment_point(point: AttachmentPoint) -> u32 {
    match point {
        AttachmentPoint::Color(index) => glow::COLOR_ATTACHMENT0 + index,
        AttachmentPoint::Depth => glow::DEPTH_ATTACHMENT,
        AttachmentPoint::Stencil => glow::STENCIL_ATTACHMENT,
        AttachmentPoint::DepthStencil => glow::DEPTH_STENCIL_ATTACHMENT,
    }
}

/// Convert a BlitMask to buffer bits.
pub fn convert_blit_mask(mask: BlitMask) -> u32 {
    let mut result = 0;

    if mask.contains(BlitMask::COLOR) {
        result |= glow::COLOR_BUFFER_BIT;
    }
    if mask.contains(BlitMask::DEPTH) {
        result |= glow::DEPTH_BUFFER_BIT;
    }
    if mask.contains(BlitMask::STENCIL) {
        result |= glow::STENCIL_BUFFER_BIT;
    }

    result
}

/// Convert a framebuffer status enum.
pub fn convert_framebuffer_status(status: u32) -> FramebufferStatus {
    match status {
        glow::FRAMEBUFFER_COMPLETE => FramebufferStatus::Complete,
        glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => FramebufferStatus::IncompleteAttachment,
        glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => FramebufferStatus::MissingAttachment,
        FRAMEBUFFER_INCOMPLETE_DIMENSIONS => FramebufferStatus::IncompleteDimensions,
        glow::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => FramebufferStatus::IncompleteMultisample,
        glow::FRAMEBUFFER_UNSUPPORTED => FramebufferStatus::Unsupported,
        glow::FRAMEBUFFER_UNDEFINED => FramebufferStatus::Undefined,
        other => FramebufferStatus::Unknown(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsized_formats_use_base_format() {
        assert_eq!(
            convert_internal_format(TextureFormat::Rgba8, true),
            glow::RGBA as i32
        );
        assert_eq!(
            convert_internal_format(TextureFormat::Rgba8, false),
            glow::RGBA8 as i32
        );
    }

    #[test]
    fn test_color_attachment_index() {
        assert_eq!(
            convert_attachment_point(AttachmentPoint::Color(3)),
            glow::COLOR_ATTACHMENT3
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            convert_framebuffer_status(glow::FRAMEBUFFER_COMPLETE),
            FramebufferStatus::Complete
        );
        assert_eq!(
            convert_framebuffer_status(0x8CD9),
            FramebufferStatus::IncompleteDimensions
        );
        assert_eq!(convert_framebuffer_status(1), FramebufferStatus::Unknown(1));
    }

    #[test]
    fn test_blit_mask_bits() {
        assert_eq!(
            convert_blit_mask(BlitMask::COLOR | BlitMask::DEPTH),
            glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT
        );
    }
}
