//! 2D texture resource.

use std::cell::Cell;
use std::rc::Rc;

use glint_core::{pixel, Image};

use crate::backend::{TextureId, TextureImage, TextureRegion};
use crate::context::GraphicsContext;
use crate::error::{GraphicsError, Result};
use crate::object::{Bindable, Changeable, GpuObject};
use crate::types::{
    AddressMode, PixelFormat, PixelType, Rect, SamplerState, TextureDescriptor, TextureFilter,
    TextureFormat, TextureParameter, TextureUnit,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UnitBinding {
    unit: TextureUnit,
    displaced: Option<TextureId>,
}

/// A 2D texture on the device.
///
/// Textures are created by [`GraphicsContext::create_texture`] and shared
/// with `Rc`. A texture whose allocation failed stays alive as an invalid
/// object: [`GpuObject::is_valid`] returns false and every operation fails
/// with [`GraphicsError::InvalidObject`].
///
/// # Example
///
/// ```
/// use glint_graphics::{Bindable, GraphicsContext, TextureDescriptor, TextureUnit};
///
/// let context = GraphicsContext::dummy().unwrap();
/// let texture = context.create_texture(&TextureDescriptor::new_2d(64, 64));
/// texture.set_pixels(None, 0, None).unwrap();
/// texture.bind(TextureUnit(0)).unwrap();
/// ```
pub struct Texture2D {
    id: Option<TextureId>,
    descriptor: TextureDescriptor,
    error: Option<GraphicsError>,
    sampler: Cell<SamplerState>,
    binding: Cell<Option<UnitBinding>>,
    auto_mipmaps: Cell<bool>,
    dirty: Cell<bool>,
    // Bit N set once level N has storage.
    specified_levels: Cell<u32>,
    context: Rc<GraphicsContext>,
}

impl Texture2D {
    /// Allocate a texture with level 0 reserved and default sampling.
    pub fn new(context: &Rc<GraphicsContext>, descriptor: &TextureDescriptor) -> Self {
        let context = Rc::clone(context);
        let (id, error) = match Self::allocate(&context, descriptor) {
            Ok(id) => {
                log::debug!(
                    "Texture2D: created {:?} ({:?}), {}x{} {:?}",
                    descriptor.label,
                    id,
                    descriptor.width,
                    descriptor.height,
                    descriptor.internal_format
                );
                (Some(id), None)
            }
            Err(error) => {
                log::warn!("Texture2D: failed to create {:?}: {}", descriptor.label, error);
                (None, Some(error))
            }
        };

        Self {
            specified_levels: Cell::new(if id.is_some() { 1 } else { 0 }),
            id,
            descriptor: descriptor.clone(),
            error,
            sampler: Cell::new(SamplerState::default()),
            binding: Cell::new(None),
            auto_mipmaps: Cell::new(false),
            dirty: Cell::new(false),
            context,
        }
    }

    fn allocate(context: &GraphicsContext, descriptor: &TextureDescriptor) -> Result<TextureId> {
        context.ensure_usable()?;

        if descriptor.width == 0 || descriptor.height == 0 {
            return Err(GraphicsError::InvalidParameter(
                "texture dimensions cannot be zero".to_string(),
            ));
        }

        let max_dim = context.capabilities().max_texture_size;
        if descriptor.width > max_dim || descriptor.height > max_dim {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture dimension exceeds maximum {max_dim}"
            )));
        }

        let internal_format = descriptor.internal_format;
        if !context.capabilities().supports_format(internal_format)
            || !internal_format.accepts(descriptor.format, descriptor.pixel_type)
        {
            return Err(GraphicsError::UnsupportedFormat {
                internal_format,
                format: descriptor.format,
                pixel_type: descriptor.pixel_type,
            });
        }

        let id = context.backend().create_texture()?;
        context.register_texture(id);

        let result = context.with_texture(id, |backend| {
            backend.tex_image_2d(&TextureImage {
                level: 0,
                internal_format,
                width: descriptor.width,
                height: descriptor.height,
                format: descriptor.format,
                pixel_type: descriptor.pixel_type,
                data: None,
            })?;
            for parameter in TextureParameter::all_of(&SamplerState::default()) {
                backend.set_texture_parameter(parameter)?;
            }
            Ok(())
        });

        if let Err(error) = result {
            context.release_texture(id);
            return Err(error);
        }
        Ok(id)
    }

    /// The native handle, `None` for an invalid texture.
    pub fn id(&self) -> Option<TextureId> {
        self.id
    }

    /// The descriptor the texture was created from.
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    /// Width of level 0.
    pub fn width(&self) -> u32 {
        self.descriptor.width
    }

    /// Height of level 0.
    pub fn height(&self) -> u32 {
        self.descriptor.height
    }

    /// Internal storage format.
    pub fn internal_format(&self) -> TextureFormat {
        self.descriptor.internal_format
    }

    /// Client pixel format used by [`Texture2D::set_pixels`].
    pub fn format(&self) -> PixelFormat {
        self.descriptor.format
    }

    /// Client pixel type used by [`Texture2D::set_pixels`].
    pub fn pixel_type(&self) -> PixelType {
        self.descriptor.pixel_type
    }

    /// The texture label, if set.
    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }

    /// Size of a mip level, or `None` past the end of the chain.
    pub fn level_size(&self, level: u32) -> Option<(u32, u32)> {
        self.descriptor.level_size(level)
    }

    /// Number of levels in the full mip chain.
    pub fn mip_level_count(&self) -> u32 {
        self.descriptor.mip_level_count()
    }

    /// Returns true once a level has storage on the device.
    pub fn is_level_specified(&self, level: u32) -> bool {
        level < u32::BITS && self.specified_levels.get() & (1 << level) != 0
    }

    /// Sampling state last applied to the device.
    pub fn sampler(&self) -> SamplerState {
        self.sampler.get()
    }

    /// Whether the mip chain is regenerated after level 0 uploads.
    pub fn auto_mipmaps(&self) -> bool {
        self.auto_mipmaps.get()
    }

    /// The unit the texture occupies, if it is still bound there.
    pub fn bound_unit(&self) -> Option<TextureUnit> {
        self.binding
            .get()
            .map(|binding| binding.unit)
            .filter(|unit| self.is_bound(*unit))
    }

    /// Toggle mip chain generation. Takes effect on the next level 0 upload
    /// or [`Changeable::apply_changes`].
    pub fn set_auto_mipmaps(&self, enable: bool) {
        if self.auto_mipmaps.replace(enable) != enable {
            self.mark_changed();
        }
    }

    /// Set magnification and minification filters.
    ///
    /// The texture must occupy its unit (see [`Bindable::bind`]).
    pub fn set_mag_min_filter(&self, mag: TextureFilter, min: TextureFilter) -> Result<()> {
        self.ensure_valid()?;
        if mag.uses_mipmaps() {
            return Err(GraphicsError::InvalidParameter(format!(
                "{mag:?} is not a magnification filter"
            )));
        }
        self.apply_parameters(&[
            TextureParameter::MagFilter(mag),
            TextureParameter::MinFilter(min),
        ])
    }

    /// Set wrapping along S and T.
    ///
    /// The texture must occupy its unit (see [`Bindable::bind`]).
    pub fn set_wrap_st(&self, s: AddressMode, t: AddressMode) -> Result<()> {
        self.ensure_valid()?;
        self.apply_parameters(&[TextureParameter::WrapS(s), TextureParameter::WrapT(t)])
    }

    fn apply_parameters(&self, parameters: &[TextureParameter]) -> Result<()> {
        let unit = self
            .bound_unit()
            .ok_or_else(|| GraphicsError::NotBound(self.debug_name()))?;
        self.context.make_texture_active(unit)?;

        let mut state = self.sampler.get();
        let result = parameters.iter().try_for_each(|parameter| {
            self.context.backend().set_texture_parameter(*parameter)?;
            parameter.apply_to(&mut state);
            Ok(())
        });
        self.sampler.set(state);
        result
    }

    /// Upload an image into a mip level.
    ///
    /// The image may be smaller than the level; it then updates the lower left
    /// region of an already specified level.
    pub fn set_pixels_from_image(&self, image: &Image, level: u32) -> Result<()> {
        self.ensure_valid()?;
        let (level_width, level_height) = self.checked_level_size(level)?;
        if image.width() > level_width || image.height() > level_height {
            return Err(GraphicsError::InvalidParameter(format!(
                "image {}x{} exceeds level {level} size {level_width}x{level_height}",
                image.width(),
                image.height()
            )));
        }
        if !self.internal_format().accepts(image.format(), image.pixel_type()) {
            return Err(GraphicsError::UnsupportedFormat {
                internal_format: self.internal_format(),
                format: image.format(),
                pixel_type: image.pixel_type(),
            });
        }
        self.upload(
            level,
            (image.width(), image.height()),
            image.format(),
            image.pixel_type(),
            Some(image.data()),
        )
    }

    /// Upload raw pixels in the texture's client layout into a mip level.
    ///
    /// `region` of `None` covers the whole level. `data` of `None` reserves
    /// storage without initializing it. A full-level upload (re)specifies the
    /// level; a smaller region updates a level that is already specified.
    pub fn set_pixels(
        &self,
        data: Option<&[u8]>,
        level: u32,
        region: Option<(u32, u32)>,
    ) -> Result<()> {
        self.ensure_valid()?;
        let (level_width, level_height) = self.checked_level_size(level)?;
        let (width, height) = region.unwrap_or((level_width, level_height));
        if width == 0 || height == 0 || width > level_width || height > level_height {
            return Err(GraphicsError::InvalidParameter(format!(
                "region {width}x{height} does not fit level {level} size {level_width}x{level_height}"
            )));
        }
        if let Some(data) = data {
            let required = pixel::region_size(width, height, self.format(), self.pixel_type());
            if data.len() < required {
                return Err(GraphicsError::InvalidParameter(format!(
                    "pixel buffer holds {} bytes, {required} required",
                    data.len()
                )));
            }
        }
        self.upload(level, (width, height), self.format(), self.pixel_type(), data)
    }

    fn checked_level_size(&self, level: u32) -> Result<(u32, u32)> {
        self.level_size(level).ok_or_else(|| {
            GraphicsError::InvalidParameter(format!(
                "mip level {level} is past the chain of {} levels",
                self.mip_level_count()
            ))
        })
    }

    fn upload(
        &self,
        level: u32,
        (width, height): (u32, u32),
        format: PixelFormat,
        pixel_type: PixelType,
        data: Option<&[u8]>,
    ) -> Result<()> {
        let id = self.native_id()?;
        let full_level = self.level_size(level) == Some((width, height));
        if !full_level && data.is_some() && !self.is_level_specified(level) {
            return Err(GraphicsError::InvalidParameter(format!(
                "level {level} must be specified before a partial update"
            )));
        }
        let regenerate = self.auto_mipmaps.get() && level == 0;

        self.context.with_texture(id, |backend| {
            if let (Some(data), false) = (data, full_level) {
                backend.tex_sub_image_2d(&TextureRegion {
                    level,
                    rect: Rect::from_size(width, height),
                    format,
                    pixel_type,
                    data,
                })?;
            } else if full_level || !self.is_level_specified(level) {
                // Reserving storage always covers the whole level.
                let (level_width, level_height) = self.level_size(level).unwrap_or((width, height));
                backend.tex_image_2d(&TextureImage {
                    level,
                    internal_format: self.internal_format(),
                    width: level_width,
                    height: level_height,
                    format,
                    pixel_type,
                    data,
                })?;
                self.specified_levels
                    .set(self.specified_levels.get() | (1 << level));
            }
            if regenerate {
                backend.generate_mipmaps()?;
                self.specified_levels.set(self.full_chain_mask());
                self.dirty.set(false);
            }
            Ok(())
        })?;

        log::trace!(
            "Texture2D {:?}: uploaded level {level} ({width}x{height}, initialized={})",
            self.id,
            data.is_some()
        );
        Ok(())
    }

    fn full_chain_mask(&self) -> u32 {
        let count = self.mip_level_count();
        if count >= u32::BITS {
            u32::MAX
        } else {
            (1 << count) - 1
        }
    }

    fn native_id(&self) -> Result<TextureId> {
        self.id
            .ok_or_else(|| GraphicsError::InvalidObject(self.debug_name()))
    }

    /// Release the unit the texture occupies, if any.
    pub fn unbind_current(&self) -> Result<()> {
        match self.binding.get() {
            Some(binding) if self.is_bound(binding.unit) => self.unbind(binding.unit),
            _ => {
                self.binding.set(None);
                Ok(())
            }
        }
    }
}

impl GpuObject for Texture2D {
    fn context(&self) -> &Rc<GraphicsContext> {
        &self.context
    }

    fn is_valid(&self) -> bool {
        self.id.is_some()
    }

    fn creation_error(&self) -> Option<&GraphicsError> {
        self.error.as_ref()
    }

    fn debug_name(&self) -> String {
        match (&self.descriptor.label, self.id) {
            (Some(label), _) => format!("texture '{label}'"),
            (None, Some(id)) => format!("texture {}", id.0),
            (None, None) => "texture".to_string(),
        }
    }
}

impl Bindable for Texture2D {
    type Slot = TextureUnit;

    fn bind(&self, unit: TextureUnit) -> Result<()> {
        self.ensure_valid()?;
        self.context.validate_unit(unit)?;
        if self.is_bound(unit) {
            return Ok(());
        }
        // A texture occupies one unit at a time: vacate the previous one first.
        if let Some(previous) = self.binding.get() {
            if self.is_bound(previous.unit) {
                self.unbind(previous.unit)?;
            }
        }
        let displaced = self.context.bind_texture_unit(unit, self.id)?;
        self.binding.set(Some(UnitBinding { unit, displaced }));
        Ok(())
    }

    fn unbind(&self, unit: TextureUnit) -> Result<()> {
        if !self.is_bound(unit) {
            return Ok(());
        }
        let displaced = self.binding.get().and_then(|binding| binding.displaced);
        self.context.bind_texture_unit(unit, displaced)?;
        self.binding.set(None);
        Ok(())
    }

    fn is_bound(&self, unit: TextureUnit) -> bool {
        self.id.is_some()
            && self.binding.get().is_some_and(|binding| binding.unit == unit)
            && self.context.texture_binding(unit) == self.id
    }
}

impl Changeable for Texture2D {
    fn mark_changed(&self) {
        self.dirty.set(true);
    }

    fn has_changes(&self) -> bool {
        self.dirty.get()
    }

    fn apply_changes(&self) -> Result<()> {
        self.ensure_valid()?;
        if !self.dirty.get() {
            return Ok(());
        }
        if self.auto_mipmaps.get() && self.is_level_specified(0) {
            let id = self.native_id()?;
            self.context
                .with_texture(id, |backend| backend.generate_mipmaps())?;
            self.specified_levels.set(self.full_chain_mask());
        }
        self.dirty.set(false);
        Ok(())
    }
}

impl Drop for Texture2D {
    fn drop(&mut self) {
        if let Some(id) = self.id {
            log::debug!("Texture2D: dropping {:?} ({:?})", self.descriptor.label, id);
            self.context.release_texture(id);
        }
    }
}

impl std::fmt::Debug for Texture2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture2D")
            .field("id", &self.id)
            .field("label", &self.descriptor.label)
            .field("width", &self.descriptor.width)
            .field("height", &self.descriptor.height)
            .field("internal_format", &self.descriptor.internal_format)
            .field("error", &self.error)
            .finish()
    }
}

// Ensure Texture2D stays on the thread that owns its context
static_assertions::assert_not_impl_any!(Texture2D: Send, Sync);
