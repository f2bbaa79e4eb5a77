//! Textured-quad blitter used where the device has no usable native blit.

use crate::backend::{GpuBackend, ProgramId};
use crate::context::GraphicsContext;
use crate::error::{GraphicsError, Result};
use crate::object::GpuObject;
use crate::types::{FilterMode, Rect, TextureFilter, TextureParameter};

use super::Texture2D;

/// The program that draws a texture over a viewport.
///
/// Owned by the [`GraphicsContext`], built on the first emulated blit.
#[derive(Debug)]
pub struct QuadBlitter {
    program: ProgramId,
}

impl QuadBlitter {
    pub(crate) fn new(backend: &dyn GpuBackend) -> Result<Self> {
        let program = backend.create_quad_program()?;
        Ok(Self { program })
    }

    /// The native program.
    pub fn program(&self) -> ProgramId {
        self.program
    }

    pub(crate) fn release(self, backend: &dyn GpuBackend) {
        backend.delete_program(self.program);
    }

    /// Draw `texture` into `viewport` of the bound draw framebuffer.
    ///
    /// The texture is sampled with `filter` for the draw; its recorded
    /// sampler state and the unit binding are restored afterwards.
    pub(crate) fn draw(
        &self,
        context: &GraphicsContext,
        texture: &Texture2D,
        filter: FilterMode,
        viewport: Rect,
    ) -> Result<()> {
        let id = texture
            .id()
            .ok_or_else(|| GraphicsError::InvalidObject(texture.debug_name()))?;
        let sampler = texture.sampler();
        let filter = TextureFilter::from(filter);
        let unit = context.active_unit();

        context.with_texture(id, |backend| {
            backend.set_texture_parameter(TextureParameter::MagFilter(filter))?;
            backend.set_texture_parameter(TextureParameter::MinFilter(filter))?;
            let drawn = backend.draw_texture_quad(self.program, unit, viewport);
            backend.set_texture_parameter(TextureParameter::MagFilter(sampler.mag_filter))?;
            backend.set_texture_parameter(TextureParameter::MinFilter(sampler.min_filter))?;
            drawn
        })
    }
}
