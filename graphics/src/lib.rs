//! # Glint Graphics
//!
//! Strongly typed lifecycle and binding management for GPU objects on an
//! OpenGL / OpenGL ES device.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`GraphicsContext`] - owns the device session and its binding state
//! - [`Texture2D`] - 2D texture with mip levels and sampling state
//! - [`Framebuffer`] - render target built from shared texture attachments
//! - [`GpuObject`], [`Bindable`], [`Changeable`] - capability traits
//! - [`GpuBackend`] - native device primitives, with an OpenGL backend and a
//!   [`DummyBackend`] for testing
//!
//! ## Example
//!
//! ```
//! use glint_graphics::{
//!     AttachmentPoint, Bindable, FramebufferTarget, GraphicsContext, TextureDescriptor,
//! };
//!
//! let context = GraphicsContext::dummy().unwrap();
//! let color = context.create_texture(&TextureDescriptor::new_2d(256, 128).with_label("color"));
//!
//! let mut target = context.create_framebuffer();
//! target.attach(AttachmentPoint::COLOR0, color).unwrap();
//! target.bind(FramebufferTarget::Draw).unwrap();
//! // Render...
//! target.unbind(FramebufferTarget::Draw).unwrap();
//! ```

pub mod backend;
pub mod context;
pub mod error;
pub mod object;
pub mod resources;
pub mod types;

// Re-export main types for convenience
pub use backend::dummy::{DummyBackend, DummyCall, DummyLevel};
#[cfg(all(feature = "gl-backend", not(target_arch = "wasm32")))]
pub use backend::gl::GlBackend;
pub use backend::{
    DeviceCapabilities, FramebufferId, GpuBackend, ProgramId, TextureId, TextureImage,
    TextureRegion,
};
pub use context::{AttachmentValidation, BlitStrategy, ContextParameters, GraphicsContext};
pub use error::{FramebufferError, GraphicsError, Result};
pub use object::{Bindable, Changeable, GpuObject};
pub use resources::{Attachment, Framebuffer, QuadBlitter, Texture2D};
pub use types::{
    AddressMode, AttachmentPoint, BlitMask, FilterMode, FramebufferStatus, FramebufferTarget,
    PixelFormat, PixelType, Rect, SamplerState, TextureDescriptor, TextureFilter, TextureFormat,
    TextureParameter, TextureUnit,
};

// Re-export the CPU-side image type consumed by texture uploads.
pub use glint_core::Image;

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
///
/// This logs the library version and the compiled-in backends.
pub fn init() {
    log::info!(
        "Glint Graphics v{} initialized (native backend: {})",
        VERSION,
        backend::has_gpu_backend()
    );
}
