//! CPU-side sampler types and filter/address mode definitions.

/// Filtering used for magnification and for scaled framebuffer blits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest neighbor filtering.
    Nearest,
    /// Linear filtering.
    #[default]
    Linear,
}

/// Texture filter, optionally sampling between mip levels.
///
/// Only [`TextureFilter::Nearest`] and [`TextureFilter::Linear`] are valid
/// magnification filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFilter {
    /// Nearest texel of the base level.
    Nearest,
    /// Linear blend of the base level.
    #[default]
    Linear,
    /// Nearest texel of the nearest mip level.
    NearestMipmapNearest,
    /// Linear blend inside the nearest mip level.
    LinearMipmapNearest,
    /// Nearest texel, blended between two mip levels.
    NearestMipmapLinear,
    /// Trilinear filtering.
    LinearMipmapLinear,
}

impl TextureFilter {
    /// Returns true if the filter reads from more than the base level.
    pub fn uses_mipmaps(&self) -> bool {
        !matches!(self, Self::Nearest | Self::Linear)
    }
}

impl From<FilterMode> for TextureFilter {
    fn from(mode: FilterMode) -> Self {
        match mode {
            FilterMode::Nearest => Self::Nearest,
            FilterMode::Linear => Self::Linear,
        }
    }
}

/// Texture address mode (wrapping behavior).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    /// Clamp to edge.
    #[default]
    ClampToEdge,
    /// Repeat.
    Repeat,
    /// Mirrored repeat.
    MirrorRepeat,
}

/// Sampling configuration recorded for a 2D texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerState {
    /// Magnification filter.
    pub mag_filter: TextureFilter,
    /// Minification filter.
    pub min_filter: TextureFilter,
    /// Wrapping along S (horizontal).
    pub wrap_s: AddressMode,
    /// Wrapping along T (vertical).
    pub wrap_t: AddressMode,
}

impl SamplerState {
    /// Linear filtering, clamped to edge.
    pub fn linear() -> Self {
        Self::default()
    }

    /// Nearest filtering, clamped to edge.
    pub fn nearest() -> Self {
        Self {
            mag_filter: TextureFilter::Nearest,
            min_filter: TextureFilter::Nearest,
            ..Default::default()
        }
    }

    /// Set both wrap modes.
    pub fn with_wrap(mut self, mode: AddressMode) -> Self {
        self.wrap_s = mode;
        self.wrap_t = mode;
        self
    }
}

impl Default for SamplerState {
    fn default() -> Self {
        Self {
            mag_filter: TextureFilter::Linear,
            min_filter: TextureFilter::Linear,
            wrap_s: AddressMode::ClampToEdge,
            wrap_t: AddressMode::ClampToEdge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mipmap_filters() {
        assert!(!TextureFilter::Linear.uses_mipmaps());
        assert!(!TextureFilter::Nearest.uses_mipmaps());
        assert!(TextureFilter::LinearMipmapLinear.uses_mipmaps());
        assert!(TextureFilter::NearestMipmapNearest.uses_mipmaps());
    }

    #[test]
    fn test_default_sampler_is_linear_clamp() {
        let state = SamplerState::default();
        assert_eq!(state.mag_filter, TextureFilter::Linear);
        assert_eq!(state.min_filter, TextureFilter::Linear);
        assert_eq!(state.wrap_s, AddressMode::ClampToEdge);
        assert_eq!(state.wrap_t, AddressMode::ClampToEdge);
    }

    #[test]
    fn test_with_wrap() {
        let state = SamplerState::nearest().with_wrap(AddressMode::Repeat);
        assert_eq!(state.wrap_s, AddressMode::Repeat);
        assert_eq!(state.wrap_t, AddressMode::Repeat);
        assert_eq!(state.mag_filter, TextureFilter::Nearest);
    }
}
