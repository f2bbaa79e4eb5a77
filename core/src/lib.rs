//! # Glint Core
//!
//! CPU-side data shared with the GPU object layer:
//! - [`image::Image`] - decoded pixel buffer handed to texture uploads
//! - [`pixel`] - client pixel layouts ([`PixelFormat`], [`PixelType`])
//! - [`sampler`] - filtering and wrapping modes

pub mod image;
pub mod pixel;
pub mod sampler;

pub use image::{Image, ImageError};
pub use pixel::{PixelFormat, PixelType};
pub use sampler::{AddressMode, FilterMode, SamplerState, TextureFilter};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
