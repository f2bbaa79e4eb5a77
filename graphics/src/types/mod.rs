//! Core types for the graphics system.

mod framebuffer;
mod sampler;
mod texture;

pub use framebuffer::{AttachmentPoint, BlitMask, FramebufferStatus, FramebufferTarget, Rect};
pub use sampler::{AddressMode, FilterMode, SamplerState, TextureFilter, TextureParameter};
pub use texture::{PixelFormat, PixelType, TextureDescriptor, TextureFormat, TextureUnit};
