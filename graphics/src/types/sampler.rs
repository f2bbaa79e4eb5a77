//! Sampler types.

// Re-export CPU-side types from core.
pub use glint_core::sampler::{AddressMode, FilterMode, SamplerState, TextureFilter};

/// A single sampling parameter applied to the texture bound on the active unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureParameter {
    /// Magnification filter.
    MagFilter(TextureFilter),
    /// Minification filter.
    MinFilter(TextureFilter),
    /// Wrapping along S.
    WrapS(AddressMode),
    /// Wrapping along T.
    WrapT(AddressMode),
}

impl TextureParameter {
    /// Apply this parameter to a recorded sampler state.
    pub fn apply_to(self, state: &mut SamplerState) {
        match self {
            Self::MagFilter(filter) => state.mag_filter = filter,
            Self::MinFilter(filter) => state.min_filter = filter,
            Self::WrapS(mode) => state.wrap_s = mode,
            Self::WrapT(mode) => state.wrap_t = mode,
        }
    }

    /// Parameters that reproduce a full sampler state.
    pub fn all_of(state: &SamplerState) -> [Self; 4] {
        [
            Self::MagFilter(state.mag_filter),
            Self::MinFilter(state.min_filter),
            Self::WrapS(state.wrap_s),
            Self::WrapT(state.wrap_t),
        ]
    }
}
