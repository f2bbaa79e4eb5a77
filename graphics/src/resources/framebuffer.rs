//! Framebuffer resource.
//!
//! A [`Framebuffer`] groups textures at attachment points into a render
//! target. Attached textures are shared: the framebuffer keeps one `Rc` per
//! attachment and never deletes them.

use std::cell::Cell;
use std::rc::Rc;

use crate::backend::FramebufferId;
use crate::context::{AttachmentValidation, BlitStrategy, FramebufferBindings, GraphicsContext};
use crate::error::{FramebufferError, GraphicsError, Result};
use crate::object::{Bindable, Changeable, GpuObject};
use crate::types::{
    AttachmentPoint, BlitMask, FilterMode, FramebufferStatus, FramebufferTarget, Rect,
};

use super::Texture2D;

/// A texture attached at a point of a framebuffer.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Attachment point.
    pub point: AttachmentPoint,
    /// The attached texture.
    pub texture: Rc<Texture2D>,
}

/// Per-slot record of what the framebuffer displaced when it was bound.
#[derive(Debug, Clone, Copy, Default)]
struct SlotRecord {
    draw: Option<Option<FramebufferId>>,
    read: Option<Option<FramebufferId>>,
}

/// A render target made of texture attachments.
///
/// # Example
///
/// ```
/// use glint_graphics::{AttachmentPoint, GraphicsContext, TextureDescriptor};
///
/// let context = GraphicsContext::dummy().unwrap();
/// let color = context.create_texture(&TextureDescriptor::new_2d(256, 128));
/// let mut framebuffer = context.create_framebuffer();
/// framebuffer.attach(AttachmentPoint::COLOR0, color).unwrap();
/// assert_eq!((framebuffer.width(), framebuffer.height()), (256, 128));
/// ```
pub struct Framebuffer {
    id: Option<FramebufferId>,
    label: Option<String>,
    error: Option<GraphicsError>,
    attachments: Vec<Attachment>,
    discards: Vec<AttachmentPoint>,
    dirty: Cell<bool>,
    slots: Cell<SlotRecord>,
    context: Rc<GraphicsContext>,
}

impl Framebuffer {
    /// Allocate a framebuffer with no attachments.
    pub fn new(context: &Rc<GraphicsContext>) -> Self {
        let context = Rc::clone(context);
        let result = context
            .ensure_usable()
            .and_then(|()| context.backend().create_framebuffer());
        let (id, error) = match result {
            Ok(id) => {
                context.register_framebuffer(id);
                log::debug!("Framebuffer: created {:?}", id);
                (Some(id), None)
            }
            Err(error) => {
                log::warn!("Framebuffer: failed to create: {}", error);
                (None, Some(error))
            }
        };

        Self {
            id,
            label: None,
            error,
            attachments: Vec::new(),
            discards: Vec::new(),
            dirty: Cell::new(false),
            slots: Cell::new(SlotRecord::default()),
            context,
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The native handle, `None` for an invalid framebuffer.
    pub fn id(&self) -> Option<FramebufferId> {
        self.id
    }

    /// The framebuffer label, if set.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// All attachments in attach order.
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// The attachment at a point.
    pub fn attachment(&self, point: AttachmentPoint) -> Result<&Attachment> {
        self.attachments
            .iter()
            .find(|attachment| attachment.point == point)
            .ok_or_else(|| FramebufferError::AttachmentNotFound(point).into())
    }

    /// Width of the color 0 attachment, or the first attachment, or 0.
    pub fn width(&self) -> u32 {
        self.size().0
    }

    /// Height of the color 0 attachment, or the first attachment, or 0.
    pub fn height(&self) -> u32 {
        self.size().1
    }

    fn size(&self) -> (u32, u32) {
        self.attachment(AttachmentPoint::COLOR0)
            .ok()
            .or_else(|| self.attachments.first())
            .map(|attachment| (attachment.texture.width(), attachment.texture.height()))
            .unwrap_or((0, 0))
    }

    /// Attach a texture, replacing any texture at the same point.
    ///
    /// Completeness is checked when the framebuffer is next bound, unless the
    /// context uses [`AttachmentValidation::Eager`]. A failed attach leaves
    /// the attachments unchanged.
    pub fn attach(&mut self, point: AttachmentPoint, texture: Rc<Texture2D>) -> Result<()> {
        self.ensure_valid()?;
        texture.ensure_valid()?;
        if !Rc::ptr_eq(texture.context(), &self.context) {
            return Err(GraphicsError::ContextMismatch);
        }
        if !self.context.capabilities().supports_attachment(point) {
            return Err(FramebufferError::UnsupportedAttachment(point).into());
        }
        if self.context.parameters().attachment_validation == AttachmentValidation::Eager {
            self.validate_attachment(point, &texture)?;
        }

        self.attach_native(point, Some(texture.as_ref()))?;
        match self.attachments.iter_mut().find(|a| a.point == point) {
            Some(existing) => existing.texture = texture,
            None => self.attachments.push(Attachment { point, texture }),
        }
        self.mark_changed();
        log::trace!("Framebuffer {:?}: attached {:?}", self.id, point);
        Ok(())
    }

    /// Remove the attachment at a point and return its texture.
    pub fn detach(&mut self, point: AttachmentPoint) -> Result<Rc<Texture2D>> {
        self.ensure_valid()?;
        let index = self
            .attachments
            .iter()
            .position(|attachment| attachment.point == point)
            .ok_or(FramebufferError::AttachmentNotFound(point))?;
        self.attach_native(point, None)?;
        let attachment = self.attachments.remove(index);
        self.mark_changed();
        log::trace!("Framebuffer {:?}: detached {:?}", self.id, point);
        Ok(attachment.texture)
    }

    fn validate_attachment(&self, point: AttachmentPoint, texture: &Texture2D) -> Result<()> {
        let format = texture.internal_format();
        if !point.accepts(format) {
            return Err(FramebufferError::FormatMismatch { point, format }.into());
        }
        let actual = (texture.width(), texture.height());
        let other = self
            .attachments
            .iter()
            .find(|attachment| attachment.point != point);
        if let Some(other) = other {
            let expected = (other.texture.width(), other.texture.height());
            if expected != actual {
                return Err(FramebufferError::DimensionMismatch {
                    point,
                    expected,
                    actual,
                }
                .into());
            }
        }
        Ok(())
    }

    fn attach_native(&self, point: AttachmentPoint, texture: Option<&Texture2D>) -> Result<()> {
        let target = self.context.resolve_target(FramebufferTarget::Draw);
        self.with_bound(target, || {
            self.context.backend().framebuffer_texture_2d(
                target,
                point,
                texture.and_then(Texture2D::id),
            )
        })
    }

    /// Run `f` with this framebuffer bound on `target`, then restore the slots.
    fn with_bound<R>(&self, target: FramebufferTarget, f: impl FnOnce() -> Result<R>) -> Result<R> {
        let saved = self.context.framebuffer_bindings();
        self.context.bind_framebuffer(target, self.id)?;
        let result = f();
        let restored = self.context.restore_framebuffers(saved);
        let value = result?;
        restored?;
        Ok(value)
    }

    /// Ask the device whether the attachments form a complete framebuffer.
    pub fn status(&self) -> Result<FramebufferStatus> {
        self.ensure_valid()?;
        let target = self.context.resolve_target(FramebufferTarget::Draw);
        self.with_bound(target, || {
            Ok(self.context.backend().check_framebuffer_status(target))
        })
    }

    /// Mark or unmark an attachment point for discarding.
    pub fn set_discard(&mut self, point: AttachmentPoint, enable: bool) {
        let marked = self.discards.contains(&point);
        if enable && !marked {
            self.discards.push(point);
        } else if !enable && marked {
            self.discards.retain(|p| *p != point);
        }
    }

    /// Points marked for discarding.
    pub fn discards(&self) -> &[AttachmentPoint] {
        &self.discards
    }

    /// Hint the device that the marked attachments may be dropped.
    ///
    /// Returns whether the hint was issued: `false` when nothing is marked or
    /// the device cannot invalidate framebuffer contents.
    pub fn discard(&self) -> Result<bool> {
        self.ensure_valid()?;
        if self.discards.is_empty() || !self.context.capabilities().invalidate_framebuffer {
            return Ok(false);
        }
        let target = self.context.resolve_target(FramebufferTarget::Draw);
        self.with_bound(target, || {
            self.context
                .backend()
                .invalidate_framebuffer(target, &self.discards)
        })?;
        Ok(true)
    }

    /// Copy this framebuffer into another one, scaling to its size.
    pub fn blit_to(&self, target: &Framebuffer, mask: BlitMask, filter: FilterMode) -> Result<()> {
        self.ensure_valid()?;
        target.ensure_valid()?;
        if !Rc::ptr_eq(&target.context, &self.context) {
            return Err(GraphicsError::ContextMismatch);
        }
        let source = Rect::from_size(self.width(), self.height());
        let destination = Rect::from_size(target.width(), target.height());
        match self.context.blit_strategy() {
            BlitStrategy::Native => {
                self.blit_native(self.id, target.id, source, destination, mask, filter)
            }
            BlitStrategy::QuadEmulation => {
                if target.id == self.id {
                    return Err(GraphicsError::InvalidParameter(
                        "cannot draw a framebuffer into itself".to_string(),
                    ));
                }
                self.blit_quad(target.id, destination, mask, filter)
            }
        }
    }

    /// Copy this framebuffer into the lower left `width`x`height` region of
    /// the default framebuffer.
    pub fn blit_to_screen(
        &self,
        width: u32,
        height: u32,
        mask: BlitMask,
        filter: FilterMode,
    ) -> Result<()> {
        self.ensure_valid()?;
        let source = Rect::from_size(self.width(), self.height());
        let destination = Rect::from_size(width, height);
        match self.context.blit_strategy() {
            BlitStrategy::Native => {
                self.blit_native(self.id, None, source, destination, mask, filter)
            }
            BlitStrategy::QuadEmulation => self.blit_quad(None, destination, mask, filter),
        }
    }

    /// Copy the lower left `width`x`height` region of the default framebuffer
    /// into this one.
    ///
    /// Under quad emulation the region is copied unscaled into the color 0
    /// texture and `filter` is ignored.
    pub fn blit_from_screen(
        &self,
        width: u32,
        height: u32,
        mask: BlitMask,
        filter: FilterMode,
    ) -> Result<()> {
        self.ensure_valid()?;
        let source = Rect::from_size(width, height);
        let destination = Rect::from_size(self.width(), self.height());
        match self.context.blit_strategy() {
            BlitStrategy::Native => {
                self.blit_native(None, self.id, source, destination, mask, filter)
            }
            BlitStrategy::QuadEmulation => {
                Self::check_quad_mask(mask)?;
                let texture = &self.attachment(AttachmentPoint::COLOR0)?.texture;
                let region =
                    Rect::from_size(width.min(texture.width()), height.min(texture.height()));
                let texture_id = texture
                    .id()
                    .ok_or_else(|| GraphicsError::InvalidObject(texture.debug_name()))?;

                let saved = self.context.framebuffer_bindings();
                self.context.bind_framebuffer(FramebufferTarget::Read, None)?;
                let result = self.context.with_texture(texture_id, |backend| {
                    backend.copy_tex_sub_image_2d(0, region)
                });
                self.context.restore_framebuffers(saved)?;
                result
            }
        }
    }

    fn blit_native(
        &self,
        read: Option<FramebufferId>,
        draw: Option<FramebufferId>,
        source: Rect,
        destination: Rect,
        mask: BlitMask,
        filter: FilterMode,
    ) -> Result<()> {
        if mask.is_empty() {
            return Err(GraphicsError::InvalidParameter("empty blit mask".to_string()));
        }
        if mask.intersects(BlitMask::DEPTH | BlitMask::STENCIL) && filter != FilterMode::Nearest {
            return Err(GraphicsError::InvalidParameter(
                "depth and stencil blits require nearest filtering".to_string(),
            ));
        }

        let saved = self.context.framebuffer_bindings();
        let result = (|| {
            self.context.bind_framebuffer(FramebufferTarget::Read, read)?;
            self.context.bind_framebuffer(FramebufferTarget::Draw, draw)?;
            for target in [FramebufferTarget::Read, FramebufferTarget::Draw] {
                let status = self.context.backend().check_framebuffer_status(target);
                if !status.is_complete() {
                    return Err(FramebufferError::Incomplete(status).into());
                }
            }
            self.context
                .backend()
                .blit_framebuffer(source, destination, mask, filter)
        })();
        let restored = self.context.restore_framebuffers(saved);
        result?;
        restored?;
        log::trace!(
            "Framebuffer: blit {:?} {:?} -> {:?} {:?}",
            read,
            source,
            draw,
            destination
        );
        Ok(())
    }

    fn check_quad_mask(mask: BlitMask) -> Result<()> {
        if mask != BlitMask::COLOR {
            return Err(GraphicsError::FeatureNotSupported(
                "quad blits copy the color buffer only".to_string(),
            ));
        }
        Ok(())
    }

    fn blit_quad(
        &self,
        draw: Option<FramebufferId>,
        viewport: Rect,
        mask: BlitMask,
        filter: FilterMode,
    ) -> Result<()> {
        Self::check_quad_mask(mask)?;
        let texture = &self.attachment(AttachmentPoint::COLOR0)?.texture;
        let blitter = self.context.blitter()?;

        let saved = self.context.framebuffer_bindings();
        let result = (|| {
            self.context.bind_framebuffer(FramebufferTarget::Draw, draw)?;
            let status = self
                .context
                .backend()
                .check_framebuffer_status(self.context.resolve_target(FramebufferTarget::Draw));
            if !status.is_complete() {
                return Err(FramebufferError::Incomplete(status).into());
            }
            blitter.draw(&self.context, texture, filter, viewport)
        })();
        let restored = self.context.restore_framebuffers(saved);
        result?;
        restored
    }

    fn check_completeness(&self, target: FramebufferTarget) -> Result<()> {
        let status = self.context.backend().check_framebuffer_status(target);
        if !status.is_complete() {
            log::warn!("Framebuffer {:?} is incomplete: {:?}", self.id, status);
            return Err(FramebufferError::Incomplete(status).into());
        }
        self.dirty.set(false);
        Ok(())
    }
}

impl GpuObject for Framebuffer {
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
        match (&self.label, self.id) {
            (Some(label), _) => format!("framebuffer '{label}'"),
            (None, Some(id)) => format!("framebuffer {}", id.0),
            (None, None) => "framebuffer".to_string(),
        }
    }
}

impl Bindable for Framebuffer {
    type Slot = FramebufferTarget;

    fn bind(&self, target: FramebufferTarget) -> Result<()> {
        self.ensure_valid()?;
        let target = self.context.resolve_target(target);
        if self.is_bound(target) {
            // Edits made while bound are validated on the next bind.
            if self.dirty.get() {
                self.check_completeness(target)?;
            }
            return Ok(());
        }

        let saved = self.context.framebuffer_bindings();
        self.context.bind_framebuffer(target, self.id)?;
        if self.dirty.get() {
            if let Err(error) = self.check_completeness(target) {
                self.context.restore_framebuffers(saved)?;
                return Err(error);
            }
        }

        // A slot this framebuffer already occupied keeps its original record.
        let mut slots = self.slots.get();
        if target.includes_draw() && (saved.draw != self.id || slots.draw.is_none()) {
            slots.draw = Some(saved.draw.filter(|id| Some(*id) != self.id));
        }
        if target.includes_read() && (saved.read != self.id || slots.read.is_none()) {
            slots.read = Some(saved.read.filter(|id| Some(*id) != self.id));
        }
        self.slots.set(slots);
        Ok(())
    }

    fn unbind(&self, target: FramebufferTarget) -> Result<()> {
        let target = self.context.resolve_target(target);
        let current: FramebufferBindings = self.context.framebuffer_bindings();
        let mut slots = self.slots.get();

        let draw = if target.includes_draw() && self.id.is_some() && current.draw == self.id {
            slots.draw.take()
        } else {
            None
        };
        let read = if target.includes_read() && self.id.is_some() && current.read == self.id {
            slots.read.take()
        } else {
            None
        };

        match (draw, read) {
            (Some(draw), Some(read)) if draw == read => {
                self.context.bind_framebuffer(FramebufferTarget::Both, draw)?;
            }
            (draw, read) => {
                if let Some(draw) = draw {
                    self.context.bind_framebuffer(FramebufferTarget::Draw, draw)?;
                }
                if let Some(read) = read {
                    self.context.bind_framebuffer(FramebufferTarget::Read, read)?;
                }
            }
        }
        self.slots.set(slots);
        Ok(())
    }

    fn is_bound(&self, target: FramebufferTarget) -> bool {
        if self.id.is_none() {
            return false;
        }
        let target = self.context.resolve_target(target);
        let current = self.context.framebuffer_bindings();
        let slots = self.slots.get();
        (!target.includes_draw() || (slots.draw.is_some() && current.draw == self.id))
            && (!target.includes_read() || (slots.read.is_some() && current.read == self.id))
    }
}

impl Changeable for Framebuffer {
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
        let target = self.context.resolve_target(FramebufferTarget::Draw);
        self.with_bound(target, || self.check_completeness(target))
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        if let Some(id) = self.id {
            log::debug!("Framebuffer: dropping {:?} ({:?})", self.label, id);
            self.context.release_framebuffer(id);
        }
    }
}

impl std::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framebuffer")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("attachments", &self.attachments.len())
            .field("error", &self.error)
            .finish()
    }
}

// Ensure Framebuffer stays on the thread that owns its context
static_assertions::assert_not_impl_any!(Framebuffer: Send, Sync);
