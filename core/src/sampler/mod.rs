//! CPU-side sampler types.
//!
//! Provides [`SamplerState`] for describing how a texture is sampled,
//! along with [`FilterMode`], [`TextureFilter`] and [`AddressMode`]
//! enums shared between CPU and GPU code.

mod types;

pub use types::{AddressMode, FilterMode, SamplerState, TextureFilter};
