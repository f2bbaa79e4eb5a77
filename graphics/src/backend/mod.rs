//! GPU backend abstraction layer.
//!
//! This module provides a trait-based abstraction over the native device,
//! allowing the object layer to work with different implementations.
//!
//! # Available Backends
//!
//! - `dummy` (always available): software simulation for testing and development
//! - `gl-backend`: OpenGL / OpenGL ES using glow
//!
//! # Architecture
//!
//! Each backend implements the [`GpuBackend`] trait, which mirrors the
//! native device model:
//! - Handle allocation and deallocation
//! - Binding of textures to units and framebuffers to targets
//! - Operations on whatever is currently bound (uploads, parameters, attachments)
//! - Capability queries
//!
//! Backends do not cache binding state; [`GraphicsContext`] does.
//!
//! [`GraphicsContext`]: crate::GraphicsContext

#[cfg(all(feature = "gl-backend", not(target_arch = "wasm32")))]
pub mod gl;

pub mod dummy;

use std::num::NonZeroU32;

use crate::error::Result;
use crate::types::{
    AttachmentPoint, BlitMask, FilterMode, FramebufferStatus, FramebufferTarget, PixelFormat,
    PixelType, Rect, TextureFormat, TextureParameter, TextureUnit,
};

/// Native texture handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub NonZeroU32);

/// Native framebuffer handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FramebufferId(pub NonZeroU32);

/// Native program handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub NonZeroU32);

/// Capabilities of a graphics device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceCapabilities {
    /// Maximum texture width or height.
    pub max_texture_size: u32,
    /// Number of texture sampling units.
    pub max_texture_units: u32,
    /// Number of color attachment points per framebuffer.
    pub max_color_attachments: u32,
    /// Whether draw and read framebuffers are separate slots.
    pub separate_read_draw: bool,
    /// Whether the device can blit between framebuffers natively.
    pub framebuffer_blit: bool,
    /// Whether framebuffer contents can be invalidated.
    pub invalidate_framebuffer: bool,
    /// Whether depth formats can back textures.
    pub depth_textures: bool,
    /// Whether float formats can back textures.
    pub float_textures: bool,
}

impl DeviceCapabilities {
    /// Returns true if the device can store textures of `format`.
    pub fn supports_format(&self, format: TextureFormat) -> bool {
        if format.is_depth() {
            self.depth_textures
        } else if format.is_float() {
            self.float_textures
        } else {
            true
        }
    }

    /// Returns true if the device exposes the attachment point.
    pub fn supports_attachment(&self, point: AttachmentPoint) -> bool {
        match point {
            AttachmentPoint::Color(index) => index < self.max_color_attachments,
            AttachmentPoint::Depth | AttachmentPoint::Stencil | AttachmentPoint::DepthStencil => {
                self.depth_textures
            }
        }
    }

    /// Capabilities of a desktop OpenGL 3.3 class device.
    pub fn desktop() -> Self {
        Self::default()
    }

    /// Capabilities of an OpenGL ES 2.0 class device: one color attachment,
    /// a combined draw/read target and no native blit.
    pub fn gles2() -> Self {
        Self {
            max_texture_size: 4096,
            max_texture_units: 8,
            max_color_attachments: 1,
            separate_read_draw: false,
            framebuffer_blit: false,
            invalidate_framebuffer: false,
            depth_textures: true,
            float_textures: false,
        }
    }
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            max_texture_size: 16384,
            max_texture_units: 32,
            max_color_attachments: 8,
            separate_read_draw: true,
            framebuffer_blit: true,
            invalidate_framebuffer: true,
            depth_textures: true,
            float_textures: true,
        }
    }
}

/// Storage and contents of one texture level.
#[derive(Debug, Clone, Copy)]
pub struct TextureImage<'a> {
    /// Mip level.
    pub level: u32,
    /// Internal storage format.
    pub internal_format: TextureFormat,
    /// Level width.
    pub width: u32,
    /// Level height.
    pub height: u32,
    /// Client pixel format of `data`.
    pub format: PixelFormat,
    /// Client pixel type of `data`.
    pub pixel_type: PixelType,
    /// Pixel data, or `None` to reserve storage without initializing it.
    pub data: Option<&'a [u8]>,
}

/// Update of a region of an already specified texture level.
#[derive(Debug, Clone, Copy)]
pub struct TextureRegion<'a> {
    /// Mip level.
    pub level: u32,
    /// Region inside the level.
    pub rect: Rect,
    /// Client pixel format of `data`.
    pub format: PixelFormat,
    /// Client pixel type of `data`.
    pub pixel_type: PixelType,
    /// Tightly packed pixel data.
    pub data: &'a [u8],
}

/// Native device primitives.
///
/// Texture operations act on the texture bound to the active unit and
/// framebuffer operations act on the framebuffer bound to the given target,
/// exactly like the native API. Callers are responsible for binding first.
pub trait GpuBackend: 'static {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    /// Query the device capabilities.
    fn capabilities(&self) -> DeviceCapabilities;

    /// Make the device session current on the calling thread.
    fn make_current(&self) -> Result<()>;

    /// Enable or disable polling of the native error flag after each call.
    fn set_error_checks(&self, _enabled: bool) {}

    /// Allocate a texture handle.
    fn create_texture(&self) -> Result<TextureId>;

    /// Release a texture handle. Bindings of the texture revert to none.
    fn delete_texture(&self, texture: TextureId);

    /// Select the active texture unit.
    fn active_texture(&self, unit: TextureUnit);

    /// Bind a texture (or none) to the active unit.
    fn bind_texture(&self, texture: Option<TextureId>);

    /// Specify a full level of the bound texture.
    fn tex_image_2d(&self, image: &TextureImage<'_>) -> Result<()>;

    /// Update a region of a level of the bound texture.
    fn tex_sub_image_2d(&self, region: &TextureRegion<'_>) -> Result<()>;

    /// Set a sampling parameter of the bound texture.
    fn set_texture_parameter(&self, parameter: TextureParameter) -> Result<()>;

    /// Generate the mip chain of the bound texture from level 0.
    fn generate_mipmaps(&self) -> Result<()>;

    /// Copy a region of the read framebuffer into the bound texture at the origin.
    fn copy_tex_sub_image_2d(&self, level: u32, source: Rect) -> Result<()>;

    /// Allocate a framebuffer handle.
    fn create_framebuffer(&self) -> Result<FramebufferId>;

    /// Release a framebuffer handle. Bindings of it revert to the default framebuffer.
    fn delete_framebuffer(&self, framebuffer: FramebufferId);

    /// Bind a framebuffer, or the default framebuffer, to a target.
    fn bind_framebuffer(&self, target: FramebufferTarget, framebuffer: Option<FramebufferId>);

    /// Attach level 0 of a texture (or nothing) to the framebuffer bound at `target`.
    fn framebuffer_texture_2d(
        &self,
        target: FramebufferTarget,
        point: AttachmentPoint,
        texture: Option<TextureId>,
    ) -> Result<()>;

    /// Completeness of the framebuffer bound at `target`.
    fn check_framebuffer_status(&self, target: FramebufferTarget) -> FramebufferStatus;

    /// Copy from the read framebuffer to the draw framebuffer.
    fn blit_framebuffer(
        &self,
        source: Rect,
        destination: Rect,
        mask: BlitMask,
        filter: FilterMode,
    ) -> Result<()>;

    /// Hint that the contents of `points` on the framebuffer at `target` may be dropped.
    fn invalidate_framebuffer(
        &self,
        target: FramebufferTarget,
        points: &[AttachmentPoint],
    ) -> Result<()>;

    /// Build the program used by the quad blit path.
    fn create_quad_program(&self) -> Result<ProgramId>;

    /// Release a program built by [`GpuBackend::create_quad_program`].
    fn delete_program(&self, program: ProgramId);

    /// Draw the texture bound on `unit` as a quad covering `viewport` of the
    /// draw framebuffer.
    fn draw_texture_quad(&self, program: ProgramId, unit: TextureUnit, viewport: Rect)
        -> Result<()>;
}

/// Check if a native GPU backend is compiled in.
pub fn has_gpu_backend() -> bool {
    cfg!(all(feature = "gl-backend", not(target_arch = "wasm32")))
}
