//! Dummy GPU backend for testing and development.
//!
//! This backend doesn't talk to a GPU but simulates the native device model:
//! handle allocation, per-unit and per-target bindings, level storage,
//! completeness rules and a sticky error flag. Color blits and quad draws
//! copy texels so results can be checked without hardware.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::num::NonZeroU32;

use glint_core::pixel;

use crate::error::{
    GraphicsError, Result, INVALID_ENUM, INVALID_FRAMEBUFFER_OPERATION, INVALID_OPERATION,
    INVALID_VALUE, OUT_OF_MEMORY,
};
use crate::types::{
    AttachmentPoint, BlitMask, FilterMode, FramebufferStatus, FramebufferTarget, PixelFormat,
    PixelType, Rect, SamplerState, TextureFormat, TextureParameter, TextureUnit,
};

use super::{
    DeviceCapabilities, FramebufferId, GpuBackend, ProgramId, TextureId, TextureImage,
    TextureRegion,
};

/// A native call recorded by the dummy backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DummyCall {
    CreateTexture(TextureId),
    DeleteTexture(TextureId),
    ActiveTexture(TextureUnit),
    BindTexture(Option<TextureId>),
    TexImage {
        level: u32,
        width: u32,
        height: u32,
        initialized: bool,
    },
    TexSubImage {
        level: u32,
        rect: Rect,
    },
    TexParameter(TextureParameter),
    GenerateMipmaps,
    CopyTexSubImage {
        level: u32,
        source: Rect,
    },
    CreateFramebuffer(FramebufferId),
    DeleteFramebuffer(FramebufferId),
    BindFramebuffer(FramebufferTarget, Option<FramebufferId>),
    FramebufferTexture {
        target: FramebufferTarget,
        point: AttachmentPoint,
        texture: Option<TextureId>,
    },
    CheckStatus(FramebufferTarget),
    Blit {
        source: Rect,
        destination: Rect,
        mask: BlitMask,
        filter: FilterMode,
    },
    Invalidate(Vec<AttachmentPoint>),
    CreateProgram(ProgramId),
    DeleteProgram(ProgramId),
    DrawQuad {
        unit: TextureUnit,
        viewport: Rect,
    },
}

/// Simulated storage of one texture level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DummyLevel {
    /// Level width.
    pub width: u32,
    /// Level height.
    pub height: u32,
    /// Layout of `data`.
    pub format: PixelFormat,
    /// Layout of `data`.
    pub pixel_type: PixelType,
    /// Texel bytes, `None` while the contents are undefined.
    pub data: Option<Vec<u8>>,
}

impl DummyLevel {
    fn bytes_per_pixel(&self) -> usize {
        pixel::bytes_per_pixel(self.format, self.pixel_type) as usize
    }

    fn zero_fill(&mut self) -> &mut Vec<u8> {
        let size = pixel::region_size(self.width, self.height, self.format, self.pixel_type);
        self.data.get_or_insert_with(|| vec![0; size])
    }
}

#[derive(Debug, Clone, Default)]
struct DummyTexture {
    internal_format: Option<TextureFormat>,
    levels: BTreeMap<u32, DummyLevel>,
    sampler: SamplerState,
}

#[derive(Debug, Clone, Default)]
struct DummyFramebuffer {
    attachments: BTreeMap<AttachmentPoint, TextureId>,
}

#[derive(Debug, Default)]
struct DummyState {
    next_handle: u32,
    textures: HashMap<TextureId, DummyTexture>,
    framebuffers: HashMap<FramebufferId, DummyFramebuffer>,
    programs: HashSet<ProgramId>,
    active_unit: u32,
    units: Vec<Option<TextureId>>,
    draw_framebuffer: Option<FramebufferId>,
    read_framebuffer: Option<FramebufferId>,
    error: Option<u32>,
    calls: Vec<DummyCall>,
    fail_allocations: bool,
    fail_uploads: bool,
}

impl DummyState {
    fn next_handle(&mut self) -> NonZeroU32 {
        self.next_handle += 1;
        NonZeroU32::MIN.saturating_add(self.next_handle - 1)
    }

    fn set_error(&mut self, code: u32) {
        // The first error sticks until it is read, like the native flag.
        if self.error.is_none() {
            self.error = Some(code);
        }
    }

    fn bound_texture(&self) -> Result<TextureId> {
        self.units
            .get(self.active_unit as usize)
            .copied()
            .flatten()
            .ok_or_else(|| GraphicsError::device(INVALID_OPERATION, "no texture bound"))
    }

    fn framebuffer_at(&self, target: FramebufferTarget) -> Option<FramebufferId> {
        match target {
            FramebufferTarget::Draw | FramebufferTarget::Both => self.draw_framebuffer,
            FramebufferTarget::Read => self.read_framebuffer,
        }
    }

    fn status(&self, framebuffer: Option<FramebufferId>) -> FramebufferStatus {
        let Some(id) = framebuffer else {
            return FramebufferStatus::Complete;
        };
        let Some(fb) = self.framebuffers.get(&id) else {
            return FramebufferStatus::Undefined;
        };
        if fb.attachments.is_empty() {
            return FramebufferStatus::MissingAttachment;
        }

        let mut size = None;
        for (point, texture) in &fb.attachments {
            let Some(tex) = self.textures.get(texture) else {
                return FramebufferStatus::IncompleteAttachment;
            };
            let (Some(format), Some(level)) = (tex.internal_format, tex.levels.get(&0)) else {
                return FramebufferStatus::IncompleteAttachment;
            };
            if !point.accepts(format) {
                return FramebufferStatus::IncompleteAttachment;
            }
            match size {
                None => size = Some((level.width, level.height)),
                Some(existing) if existing != (level.width, level.height) => {
                    return FramebufferStatus::IncompleteDimensions;
                }
                Some(_) => {}
            }
        }
        FramebufferStatus::Complete
    }

    fn color_target(&self, framebuffer: Option<FramebufferId>) -> Option<TextureId> {
        framebuffer
            .and_then(|id| self.framebuffers.get(&id))
            .and_then(|fb| fb.attachments.get(&AttachmentPoint::COLOR0))
            .copied()
    }

    /// Nearest-neighbour copy between level 0 of two textures.
    fn copy_texels(
        &mut self,
        source: TextureId,
        source_rect: Rect,
        destination: TextureId,
        destination_rect: Rect,
    ) {
        let Some(src) = self
            .textures
            .get(&source)
            .and_then(|t| t.levels.get(&0))
            .cloned()
        else {
            return;
        };
        let Some(dst) = self
            .textures
            .get_mut(&destination)
            .and_then(|t| t.levels.get_mut(&0))
        else {
            return;
        };
        let Some(src_data) = src.data.as_ref() else {
            log::trace!("DummyBackend: copy from undefined contents");
            dst.data = None;
            return;
        };
        let bpp = src.bytes_per_pixel();
        if bpp != dst.bytes_per_pixel() || source_rect.is_empty() {
            return;
        }

        let (dst_width, dst_height) = (dst.width as i64, dst.height as i64);
        let dst_data = dst.zero_fill();
        for dy in 0..destination_rect.height as i64 {
            for dx in 0..destination_rect.width as i64 {
                let tx = destination_rect.x as i64 + dx;
                let ty = destination_rect.y as i64 + dy;
                let sx = source_rect.x as i64 + dx * source_rect.width as i64
                    / destination_rect.width as i64;
                let sy = source_rect.y as i64 + dy * source_rect.height as i64
                    / destination_rect.height as i64;
                if tx < 0 || ty < 0 || tx >= dst_width || ty >= dst_height {
                    continue;
                }
                if sx < 0 || sy < 0 || sx >= src.width as i64 || sy >= src.height as i64 {
                    continue;
                }
                let from = ((sy * src.width as i64 + sx) as usize) * bpp;
                let to = ((ty * dst_width + tx) as usize) * bpp;
                dst_data[to..to + bpp].copy_from_slice(&src_data[from..from + bpp]);
            }
        }
    }
}

/// Dummy GPU backend.
///
/// The backend uses interior mutability so it can be shared between a test and
/// the [`GraphicsContext`](crate::GraphicsContext) that drives it.
#[derive(Debug)]
pub struct DummyBackend {
    capabilities: DeviceCapabilities,
    state: RefCell<DummyState>,
}

impl DummyBackend {
    /// Create a new dummy backend with desktop-class capabilities.
    pub fn new() -> Self {
        Self::with_capabilities(DeviceCapabilities::default())
    }

    /// Create a dummy backend that reports the given capabilities.
    pub fn with_capabilities(capabilities: DeviceCapabilities) -> Self {
        Self {
            capabilities,
            state: RefCell::new(DummyState {
                units: vec![None; capabilities.max_texture_units as usize],
                ..Default::default()
            }),
        }
    }

    /// Make every following handle allocation fail.
    pub fn set_fail_allocations(&self, fail: bool) {
        self.state.borrow_mut().fail_allocations = fail;
    }

    /// Make every following level upload fail with `OUT_OF_MEMORY`.
    pub fn set_fail_uploads(&self, fail: bool) {
        self.state.borrow_mut().fail_uploads = fail;
    }

    /// Calls recorded since creation or the last [`DummyBackend::clear_calls`].
    pub fn calls(&self) -> Vec<DummyCall> {
        self.state.borrow().calls.clone()
    }

    /// Forget the recorded calls.
    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Read and clear the sticky error flag.
    pub fn take_error(&self) -> Option<u32> {
        self.state.borrow_mut().error.take()
    }

    /// The active texture unit.
    pub fn active_unit(&self) -> TextureUnit {
        TextureUnit(self.state.borrow().active_unit)
    }

    /// The texture bound on a unit.
    pub fn texture_binding(&self, unit: TextureUnit) -> Option<TextureId> {
        self.state
            .borrow()
            .units
            .get(unit.index() as usize)
            .copied()
            .flatten()
    }

    /// The framebuffer bound on a target (`Both` reports the draw slot).
    pub fn framebuffer_binding(&self, target: FramebufferTarget) -> Option<FramebufferId> {
        self.state.borrow().framebuffer_at(target)
    }

    /// Number of live texture handles.
    pub fn texture_count(&self) -> usize {
        self.state.borrow().textures.len()
    }

    /// Number of live framebuffer handles.
    pub fn framebuffer_count(&self) -> usize {
        self.state.borrow().framebuffers.len()
    }

    /// Number of live programs.
    pub fn program_count(&self) -> usize {
        self.state.borrow().programs.len()
    }

    /// Storage of a texture level.
    pub fn texture_level(&self, texture: TextureId, level: u32) -> Option<DummyLevel> {
        self.state
            .borrow()
            .textures
            .get(&texture)
            .and_then(|t| t.levels.get(&level))
            .cloned()
    }

    /// Sampling parameters of a texture.
    pub fn texture_sampler(&self, texture: TextureId) -> Option<SamplerState> {
        self.state
            .borrow()
            .textures
            .get(&texture)
            .map(|t| t.sampler)
    }

    /// The texture attached at a point of a framebuffer.
    pub fn attachment(
        &self,
        framebuffer: FramebufferId,
        point: AttachmentPoint,
    ) -> Option<TextureId> {
        self.state
            .borrow()
            .framebuffers
            .get(&framebuffer)
            .and_then(|fb| fb.attachments.get(&point))
            .copied()
    }

    fn record(&self, call: DummyCall) {
        log::trace!("DummyBackend: {:?}", call);
        self.state.borrow_mut().calls.push(call);
    }
}

impl Default for DummyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy"
    }

    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    fn make_current(&self) -> Result<()> {
        Ok(())
    }

    fn create_texture(&self) -> Result<TextureId> {
        let mut state = self.state.borrow_mut();
        if state.fail_allocations {
            return Err(GraphicsError::ResourceCreationFailed(
                "dummy texture allocation failed".to_string(),
            ));
        }
        let id = TextureId(state.next_handle());
        state.textures.insert(id, DummyTexture::default());
        drop(state);
        self.record(DummyCall::CreateTexture(id));
        Ok(id)
    }

    fn delete_texture(&self, texture: TextureId) {
        self.record(DummyCall::DeleteTexture(texture));
        let mut state = self.state.borrow_mut();
        if state.textures.remove(&texture).is_none() {
            state.set_error(INVALID_VALUE);
            return;
        }
        for unit in state.units.iter_mut() {
            if *unit == Some(texture) {
                *unit = None;
            }
        }
        for fb in state.framebuffers.values_mut() {
            fb.attachments.retain(|_, attached| *attached != texture);
        }
    }

    fn active_texture(&self, unit: TextureUnit) {
        self.record(DummyCall::ActiveTexture(unit));
        let mut state = self.state.borrow_mut();
        if unit.index() >= self.capabilities.max_texture_units {
            state.set_error(INVALID_ENUM);
            return;
        }
        state.active_unit = unit.index();
    }

    fn bind_texture(&self, texture: Option<TextureId>) {
        self.record(DummyCall::BindTexture(texture));
        let mut state = self.state.borrow_mut();
        if let Some(id) = texture {
            if !state.textures.contains_key(&id) {
                state.set_error(INVALID_OPERATION);
                return;
            }
        }
        let unit = state.active_unit as usize;
        state.units[unit] = texture;
    }

    fn tex_image_2d(&self, image: &TextureImage<'_>) -> Result<()> {
        self.record(DummyCall::TexImage {
            level: image.level,
            width: image.width,
            height: image.height,
            initialized: image.data.is_some(),
        });
        let mut state = self.state.borrow_mut();
        if state.fail_uploads {
            return Err(GraphicsError::device(OUT_OF_MEMORY, "tex_image_2d"));
        }
        let id = state.bound_texture()?;
        let max = self.capabilities.max_texture_size;
        if image.width == 0 || image.height == 0 || image.width > max || image.height > max {
            return Err(GraphicsError::device(INVALID_VALUE, "tex_image_2d size"));
        }
        if !self.capabilities.supports_format(image.internal_format)
            || !image.internal_format.accepts(image.format, image.pixel_type)
        {
            return Err(GraphicsError::device(INVALID_OPERATION, "tex_image_2d format"));
        }
        let size = pixel::region_size(image.width, image.height, image.format, image.pixel_type);
        if image.data.is_some_and(|data| data.len() < size) {
            return Err(GraphicsError::device(INVALID_OPERATION, "tex_image_2d data"));
        }

        let texture = state
            .textures
            .get_mut(&id)
            .ok_or_else(|| GraphicsError::device(INVALID_OPERATION, "tex_image_2d"))?;
        if image.level == 0 {
            texture.internal_format = Some(image.internal_format);
        }
        texture.levels.insert(
            image.level,
            DummyLevel {
                width: image.width,
                height: image.height,
                format: image.format,
                pixel_type: image.pixel_type,
                data: image.data.map(|data| data[..size].to_vec()),
            },
        );
        Ok(())
    }

    fn tex_sub_image_2d(&self, region: &TextureRegion<'_>) -> Result<()> {
        self.record(DummyCall::TexSubImage {
            level: region.level,
            rect: region.rect,
        });
        let mut state = self.state.borrow_mut();
        if state.fail_uploads {
            return Err(GraphicsError::device(OUT_OF_MEMORY, "tex_sub_image_2d"));
        }
        let id = state.bound_texture()?;
        let texture = state
            .textures
            .get_mut(&id)
            .ok_or_else(|| GraphicsError::device(INVALID_OPERATION, "tex_sub_image_2d"))?;
        let internal_format = texture.internal_format;
        let level = texture
            .levels
            .get_mut(&region.level)
            .ok_or_else(|| GraphicsError::device(INVALID_OPERATION, "level not specified"))?;

        let rect = region.rect;
        if rect.x < 0
            || rect.y < 0
            || rect.right() > level.width as i32
            || rect.top() > level.height as i32
        {
            return Err(GraphicsError::device(INVALID_VALUE, "tex_sub_image_2d region"));
        }
        if !internal_format.is_some_and(|f| f.accepts(region.format, region.pixel_type)) {
            return Err(GraphicsError::device(INVALID_OPERATION, "tex_sub_image_2d format"));
        }
        let bpp = pixel::bytes_per_pixel(region.format, region.pixel_type) as usize;
        if region.data.len() < rect.width as usize * rect.height as usize * bpp {
            return Err(GraphicsError::device(INVALID_OPERATION, "tex_sub_image_2d data"));
        }
        if bpp != level.bytes_per_pixel() {
            log::trace!("DummyBackend: layout conversion not simulated");
            return Ok(());
        }

        let level_width = level.width as usize;
        let data = level.zero_fill();
        let row = rect.width as usize * bpp;
        for y in 0..rect.height as usize {
            let to = ((rect.y as usize + y) * level_width + rect.x as usize) * bpp;
            data[to..to + row].copy_from_slice(&region.data[y * row..(y + 1) * row]);
        }
        Ok(())
    }

    fn set_texture_parameter(&self, parameter: TextureParameter) -> Result<()> {
        self.record(DummyCall::TexParameter(parameter));
        let mut state = self.state.borrow_mut();
        if let TextureParameter::MagFilter(filter) = parameter {
            if filter.uses_mipmaps() {
                return Err(GraphicsError::device(INVALID_ENUM, "mag filter"));
            }
        }
        let id = state.bound_texture()?;
        if let Some(texture) = state.textures.get_mut(&id) {
            parameter.apply_to(&mut texture.sampler);
        }
        Ok(())
    }

    fn generate_mipmaps(&self) -> Result<()> {
        self.record(DummyCall::GenerateMipmaps);
        let mut state = self.state.borrow_mut();
        let id = state.bound_texture()?;
        let texture = state
            .textures
            .get_mut(&id)
            .ok_or_else(|| GraphicsError::device(INVALID_OPERATION, "generate_mipmaps"))?;
        if texture.internal_format.is_some_and(|f| f.is_depth()) {
            return Err(GraphicsError::device(INVALID_OPERATION, "depth mipmaps"));
        }
        let base = texture
            .levels
            .get(&0)
            .cloned()
            .ok_or_else(|| GraphicsError::device(INVALID_OPERATION, "level 0 not specified"))?;

        let (mut width, mut height, mut level) = (base.width, base.height, 0);
        while width > 1 || height > 1 {
            width = (width / 2).max(1);
            height = (height / 2).max(1);
            level += 1;
            texture.levels.insert(
                level,
                DummyLevel {
                    width,
                    height,
                    data: None,
                    ..base.clone()
                },
            );
        }
        Ok(())
    }

    fn copy_tex_sub_image_2d(&self, level: u32, source: Rect) -> Result<()> {
        self.record(DummyCall::CopyTexSubImage { level, source });
        let mut state = self.state.borrow_mut();
        let id = state.bound_texture()?;
        let read = state.read_framebuffer;
        if !state.status(read).is_complete() {
            return Err(GraphicsError::device(
                INVALID_FRAMEBUFFER_OPERATION,
                "copy_tex_sub_image_2d",
            ));
        }
        let fits = state
            .textures
            .get(&id)
            .and_then(|t| t.levels.get(&level))
            .is_some_and(|l| source.width <= l.width && source.height <= l.height);
        if !fits {
            return Err(GraphicsError::device(INVALID_VALUE, "copy_tex_sub_image_2d"));
        }
        if let Some(src) = state.color_target(read) {
            let destination = Rect::from_size(source.width, source.height);
            state.copy_texels(src, source, id, destination);
        }
        Ok(())
    }

    fn create_framebuffer(&self) -> Result<FramebufferId> {
        let mut state = self.state.borrow_mut();
        if state.fail_allocations {
            return Err(GraphicsError::ResourceCreationFailed(
                "dummy framebuffer allocation failed".to_string(),
            ));
        }
        let id = FramebufferId(state.next_handle());
        state.framebuffers.insert(id, DummyFramebuffer::default());
        drop(state);
        self.record(DummyCall::CreateFramebuffer(id));
        Ok(id)
    }

    fn delete_framebuffer(&self, framebuffer: FramebufferId) {
        self.record(DummyCall::DeleteFramebuffer(framebuffer));
        let mut state = self.state.borrow_mut();
        if state.framebuffers.remove(&framebuffer).is_none() {
            state.set_error(INVALID_VALUE);
            return;
        }
        if state.draw_framebuffer == Some(framebuffer) {
            state.draw_framebuffer = None;
        }
        if state.read_framebuffer == Some(framebuffer) {
            state.read_framebuffer = None;
        }
    }

    fn bind_framebuffer(&self, target: FramebufferTarget, framebuffer: Option<FramebufferId>) {
        self.record(DummyCall::BindFramebuffer(target, framebuffer));
        let mut state = self.state.borrow_mut();
        if !self.capabilities.separate_read_draw && target != FramebufferTarget::Both {
            state.set_error(INVALID_ENUM);
            return;
        }
        if let Some(id) = framebuffer {
            if !state.framebuffers.contains_key(&id) {
                state.set_error(INVALID_OPERATION);
                return;
            }
        }
        if target.includes_draw() {
            state.draw_framebuffer = framebuffer;
        }
        if target.includes_read() {
            state.read_framebuffer = framebuffer;
        }
    }

    fn framebuffer_texture_2d(
        &self,
        target: FramebufferTarget,
        point: AttachmentPoint,
        texture: Option<TextureId>,
    ) -> Result<()> {
        self.record(DummyCall::FramebufferTexture {
            target,
            point,
            texture,
        });
        let mut state = self.state.borrow_mut();
        if !self.capabilities.supports_attachment(point) {
            return Err(GraphicsError::device(INVALID_ENUM, "attachment point"));
        }
        let id = state
            .framebuffer_at(target)
            .ok_or_else(|| GraphicsError::device(INVALID_OPERATION, "default framebuffer"))?;
        if let Some(tex) = texture {
            if !state.textures.contains_key(&tex) {
                return Err(GraphicsError::device(INVALID_OPERATION, "unknown texture"));
            }
        }
        let fb = state
            .framebuffers
            .get_mut(&id)
            .ok_or_else(|| GraphicsError::device(INVALID_OPERATION, "unknown framebuffer"))?;
        match texture {
            Some(tex) => {
                fb.attachments.insert(point, tex);
            }
            None => {
                fb.attachments.remove(&point);
            }
        }
        Ok(())
    }

    fn check_framebuffer_status(&self, target: FramebufferTarget) -> FramebufferStatus {
        self.record(DummyCall::CheckStatus(target));
        let state = self.state.borrow();
        state.status(state.framebuffer_at(target))
    }

    fn blit_framebuffer(
        &self,
        source: Rect,
        destination: Rect,
        mask: BlitMask,
        filter: FilterMode,
    ) -> Result<()> {
        self.record(DummyCall::Blit {
            source,
            destination,
            mask,
            filter,
        });
        let mut state = self.state.borrow_mut();
        if !self.capabilities.framebuffer_blit {
            return Err(GraphicsError::device(INVALID_OPERATION, "blit unsupported"));
        }
        if mask.intersects(BlitMask::DEPTH | BlitMask::STENCIL) && filter != FilterMode::Nearest {
            return Err(GraphicsError::device(INVALID_OPERATION, "depth blit filter"));
        }
        let (read, draw) = (state.read_framebuffer, state.draw_framebuffer);
        if !state.status(read).is_complete() || !state.status(draw).is_complete() {
            return Err(GraphicsError::device(INVALID_FRAMEBUFFER_OPERATION, "blit"));
        }
        if mask.contains(BlitMask::COLOR) {
            if let (Some(src), Some(dst)) = (state.color_target(read), state.color_target(draw)) {
                state.copy_texels(src, source, dst, destination);
            }
        }
        Ok(())
    }

    fn invalidate_framebuffer(
        &self,
        target: FramebufferTarget,
        points: &[AttachmentPoint],
    ) -> Result<()> {
        self.record(DummyCall::Invalidate(points.to_vec()));
        let mut state = self.state.borrow_mut();
        if !self.capabilities.invalidate_framebuffer {
            return Err(GraphicsError::device(INVALID_OPERATION, "invalidate unsupported"));
        }
        let Some(id) = state.framebuffer_at(target) else {
            return Ok(());
        };
        let attached: Vec<TextureId> = state
            .framebuffers
            .get(&id)
            .map(|fb| {
                points
                    .iter()
                    .filter_map(|point| fb.attachments.get(point).copied())
                    .collect()
            })
            .unwrap_or_default();
        for texture in attached {
            if let Some(level) = state
                .textures
                .get_mut(&texture)
                .and_then(|t| t.levels.get_mut(&0))
            {
                level.data = None;
            }
        }
        Ok(())
    }

    fn create_quad_program(&self) -> Result<ProgramId> {
        let mut state = self.state.borrow_mut();
        if state.fail_allocations {
            return Err(GraphicsError::ResourceCreationFailed(
                "dummy program allocation failed".to_string(),
            ));
        }
        let id = ProgramId(state.next_handle());
        state.programs.insert(id);
        drop(state);
        self.record(DummyCall::CreateProgram(id));
        Ok(id)
    }

    fn delete_program(&self, program: ProgramId) {
        self.record(DummyCall::DeleteProgram(program));
        let mut state = self.state.borrow_mut();
        if !state.programs.remove(&program) {
            state.set_error(INVALID_VALUE);
        }
    }

    fn draw_texture_quad(
        &self,
        program: ProgramId,
        unit: TextureUnit,
        viewport: Rect,
    ) -> Result<()> {
        self.record(DummyCall::DrawQuad { unit, viewport });
        let mut state = self.state.borrow_mut();
        if !state.programs.contains(&program) {
            return Err(GraphicsError::device(INVALID_OPERATION, "unknown program"));
        }
        let texture = state
            .units
            .get(unit.index() as usize)
            .copied()
            .flatten()
            .ok_or_else(|| GraphicsError::device(INVALID_OPERATION, "no texture on unit"))?;
        let draw = state.draw_framebuffer;
        if !state.status(draw).is_complete() {
            return Err(GraphicsError::device(INVALID_FRAMEBUFFER_OPERATION, "draw"));
        }
        let source = state
            .textures
            .get(&texture)
            .and_then(|t| t.levels.get(&0))
            .map(|l| Rect::from_size(l.width, l.height))
            .unwrap_or_default();
        if let Some(dst) = state.color_target(draw) {
            state.copy_texels(texture, source, dst, viewport);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound_rgba_texture(backend: &DummyBackend, width: u32, height: u32) -> TextureId {
        let id = backend.create_texture().unwrap();
        backend.bind_texture(Some(id));
        backend
            .tex_image_2d(&TextureImage {
                level: 0,
                internal_format: TextureFormat::Rgba8,
                width,
                height,
                format: PixelFormat::Rgba,
                pixel_type: PixelType::UnsignedByte,
                data: None,
            })
            .unwrap();
        id
    }

    #[test]
    fn test_handles_are_unique() {
        let backend = DummyBackend::new();
        let a = backend.create_texture().unwrap();
        let b = backend.create_texture().unwrap();
        let fb = backend.create_framebuffer().unwrap();
        assert_ne!(a, b);
        assert_ne!(a.0, fb.0);
        assert_eq!(backend.texture_count(), 2);
        assert_eq!(backend.framebuffer_count(), 1);
    }

    #[test]
    fn test_upload_requires_bound_texture() {
        let backend = DummyBackend::new();
        let result = backend.tex_image_2d(&TextureImage {
            level: 0,
            internal_format: TextureFormat::Rgba8,
            width: 4,
            height: 4,
            format: PixelFormat::Rgba,
            pixel_type: PixelType::UnsignedByte,
            data: None,
        });
        assert!(matches!(
            result,
            Err(GraphicsError::Device {
                code: INVALID_OPERATION,
                ..
            })
        ));
    }

    #[test]
    fn test_sub_image_writes_texels() {
        let backend = DummyBackend::new();
        let id = bound_rgba_texture(&backend, 2, 2);
        backend
            .tex_sub_image_2d(&TextureRegion {
                level: 0,
                rect: Rect::new(1, 1, 1, 1),
                format: PixelFormat::Rgba,
                pixel_type: PixelType::UnsignedByte,
                data: &[9, 8, 7, 6],
            })
            .unwrap();
        let level = backend.texture_level(id, 0).unwrap();
        let data = level.data.unwrap();
        assert_eq!(&data[12..16], &[9, 8, 7, 6]);
        assert_eq!(&data[0..4], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_delete_clears_bindings() {
        let backend = DummyBackend::new();
        let id = bound_rgba_texture(&backend, 4, 4);
        assert_eq!(backend.texture_binding(TextureUnit(0)), Some(id));
        backend.delete_texture(id);
        assert_eq!(backend.texture_binding(TextureUnit(0)), None);
        assert_eq!(backend.take_error(), None);
    }

    #[test]
    fn test_combined_target_rejects_separate_binding() {
        let backend = DummyBackend::with_capabilities(DeviceCapabilities::gles2());
        let fb = backend.create_framebuffer().unwrap();
        backend.bind_framebuffer(FramebufferTarget::Draw, Some(fb));
        assert_eq!(backend.take_error(), Some(INVALID_ENUM));
        assert_eq!(backend.framebuffer_binding(FramebufferTarget::Draw), None);
    }

    #[test]
    fn test_status_rules() {
        let backend = DummyBackend::new();
        let fb = backend.create_framebuffer().unwrap();
        backend.bind_framebuffer(FramebufferTarget::Both, Some(fb));
        assert_eq!(
            backend.check_framebuffer_status(FramebufferTarget::Draw),
            FramebufferStatus::MissingAttachment
        );

        let a = bound_rgba_texture(&backend, 4, 4);
        let b = bound_rgba_texture(&backend, 8, 8);
        backend
            .framebuffer_texture_2d(FramebufferTarget::Draw, AttachmentPoint::COLOR0, Some(a))
            .unwrap();
        assert!(backend
            .check_framebuffer_status(FramebufferTarget::Draw)
            .is_complete());

        backend
            .framebuffer_texture_2d(FramebufferTarget::Draw, AttachmentPoint::Color(1), Some(b))
            .unwrap();
        assert_eq!(
            backend.check_framebuffer_status(FramebufferTarget::Draw),
            FramebufferStatus::IncompleteDimensions
        );
    }

    #[test]
    fn test_generate_mipmaps_fills_chain() {
        let backend = DummyBackend::new();
        let id = bound_rgba_texture(&backend, 8, 2);
        backend.generate_mipmaps().unwrap();
        assert_eq!(backend.texture_level(id, 1).map(|l| (l.width, l.height)), Some((4, 1)));
        assert_eq!(backend.texture_level(id, 3).map(|l| (l.width, l.height)), Some((1, 1)));
        assert!(backend.texture_level(id, 4).is_none());
    }
}
