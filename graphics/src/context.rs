//! Graphics context.
//!
//! The [`GraphicsContext`] owns the native backend and everything that is
//! global to one device session: the texture unit and framebuffer bindings,
//! the registry of live native handles and the lazily built quad blitter.
//! GPU objects hold an `Rc` to the context that created them.

use std::cell::{Cell, OnceCell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use crate::backend::dummy::DummyBackend;
use crate::backend::{DeviceCapabilities, FramebufferId, GpuBackend, TextureId};
use crate::error::{GraphicsError, Result};
use crate::resources::{Framebuffer, QuadBlitter, Texture2D};
use crate::types::{FramebufferTarget, TextureDescriptor, TextureUnit};

/// When framebuffer attachments are checked against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttachmentValidation {
    /// Leave consistency to the device; it surfaces as completeness on bind.
    #[default]
    Lazy,
    /// Reject mismatched sizes and formats when attaching.
    Eager,
}

/// How framebuffer blits are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlitStrategy {
    /// Native framebuffer blit.
    Native,
    /// Draw the source color attachment as a textured quad.
    QuadEmulation,
}

/// Parameters for creating a [`GraphicsContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextParameters {
    /// Debug label of the context.
    pub label: Option<String>,
    /// Attachment validation policy.
    pub attachment_validation: AttachmentValidation,
    /// Forced blit strategy. `None` picks from features and capabilities.
    pub blit_strategy: Option<BlitStrategy>,
    /// Poll the native error flag after device calls.
    pub check_errors: bool,
}

impl ContextParameters {
    /// Create default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the attachment validation policy.
    pub fn with_attachment_validation(mut self, validation: AttachmentValidation) -> Self {
        self.attachment_validation = validation;
        self
    }

    /// Force a blit strategy.
    pub fn with_blit_strategy(mut self, strategy: BlitStrategy) -> Self {
        self.blit_strategy = Some(strategy);
        self
    }

    /// Enable or disable native error polling.
    pub fn with_error_checks(mut self, enabled: bool) -> Self {
        self.check_errors = enabled;
        self
    }
}

impl Default for ContextParameters {
    fn default() -> Self {
        Self {
            label: None,
            attachment_validation: AttachmentValidation::default(),
            blit_strategy: None,
            check_errors: cfg!(debug_assertions),
        }
    }
}

/// Framebuffers bound to the draw and read slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct FramebufferBindings {
    pub draw: Option<FramebufferId>,
    pub read: Option<FramebufferId>,
}

impl FramebufferBindings {
    pub fn get(&self, target: FramebufferTarget) -> Option<FramebufferId> {
        match target {
            FramebufferTarget::Draw | FramebufferTarget::Both => self.draw,
            FramebufferTarget::Read => self.read,
        }
    }

    fn set(&mut self, target: FramebufferTarget, framebuffer: Option<FramebufferId>) {
        if target.includes_draw() {
            self.draw = framebuffer;
        }
        if target.includes_read() {
            self.read = framebuffer;
        }
    }
}

#[derive(Debug)]
struct BindingState {
    active_unit: TextureUnit,
    units: Vec<Option<TextureId>>,
    framebuffers: FramebufferBindings,
}

/// A device session and its binding state.
///
/// The context is single-threaded: it and every object created from it are
/// `!Send` and `!Sync`. Independent contexts never share binding state.
///
/// # Example
///
/// ```
/// use glint_graphics::{GpuObject, GraphicsContext, TextureDescriptor};
///
/// let context = GraphicsContext::dummy().unwrap();
/// let texture = context.create_texture(&TextureDescriptor::new_2d(64, 64));
/// assert!(texture.is_valid());
/// ```
pub struct GraphicsContext {
    backend: Rc<dyn GpuBackend>,
    parameters: ContextParameters,
    capabilities: DeviceCapabilities,
    bindings: RefCell<BindingState>,
    live_textures: RefCell<HashSet<TextureId>>,
    live_framebuffers: RefCell<HashSet<FramebufferId>>,
    blitter: OnceCell<QuadBlitter>,
    lost: Cell<bool>,
}

impl GraphicsContext {
    /// Create a context over a backend and make it current.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot make its session current.
    pub fn new(backend: Rc<dyn GpuBackend>, parameters: ContextParameters) -> Result<Rc<Self>> {
        backend.make_current()?;
        backend.set_error_checks(parameters.check_errors);
        let capabilities = backend.capabilities();

        let context = Self {
            bindings: RefCell::new(BindingState {
                active_unit: TextureUnit::default(),
                units: vec![None; capabilities.max_texture_units as usize],
                framebuffers: FramebufferBindings::default(),
            }),
            backend,
            parameters,
            capabilities,
            live_textures: RefCell::new(HashSet::new()),
            live_framebuffers: RefCell::new(HashSet::new()),
            blitter: OnceCell::new(),
            lost: Cell::new(false),
        };

        log::info!(
            "GraphicsContext {:?} created on {} backend, blit strategy {:?}",
            context.parameters.label,
            context.backend.name(),
            context.blit_strategy()
        );
        log::debug!("Device capabilities: {:?}", context.capabilities);

        Ok(Rc::new(context))
    }

    /// Create a context over a fresh [`DummyBackend`].
    pub fn dummy() -> Result<Rc<Self>> {
        Self::new(Rc::new(DummyBackend::new()), ContextParameters::default())
    }

    /// The native backend.
    pub fn backend(&self) -> &dyn GpuBackend {
        self.backend.as_ref()
    }

    /// The parameters the context was created with.
    pub fn parameters(&self) -> &ContextParameters {
        &self.parameters
    }

    /// Capabilities reported by the device at creation.
    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// The debug label, if set.
    pub fn label(&self) -> Option<&str> {
        self.parameters.label.as_deref()
    }

    /// The blit strategy in effect.
    ///
    /// Quad emulation is used when forced by the parameters, when built with
    /// the `gles2` feature, or when the device lacks a native blit or separate
    /// draw and read targets.
    pub fn blit_strategy(&self) -> BlitStrategy {
        if let Some(strategy) = self.parameters.blit_strategy {
            return strategy;
        }
        if cfg!(feature = "gles2")
            || !self.capabilities.framebuffer_blit
            || !self.capabilities.separate_read_draw
        {
            BlitStrategy::QuadEmulation
        } else {
            BlitStrategy::Native
        }
    }

    /// Make the device session current again.
    pub fn make_current(&self) -> Result<()> {
        self.ensure_usable()?;
        self.backend.make_current()
    }

    /// Mark the device session as lost.
    ///
    /// Every native handle is considered gone: objects stay alive but report
    /// [`GraphicsError::ContextLost`] and skip native deletion on drop.
    pub fn mark_lost(&self) {
        if self.lost.replace(true) {
            return;
        }
        log::warn!("GraphicsContext {:?} lost", self.parameters.label);
        let mut bindings = self.bindings.borrow_mut();
        bindings.units.iter_mut().for_each(|unit| *unit = None);
        bindings.framebuffers = FramebufferBindings::default();
        self.live_textures.borrow_mut().clear();
        self.live_framebuffers.borrow_mut().clear();
    }

    /// Returns true once the session was lost.
    pub fn is_lost(&self) -> bool {
        self.lost.get()
    }

    /// Create a 2D texture. Check [`Texture2D::is_valid`] for the outcome.
    pub fn create_texture(self: &Rc<Self>, descriptor: &TextureDescriptor) -> Rc<Texture2D> {
        Rc::new(Texture2D::new(self, descriptor))
    }

    /// Create a framebuffer. Check [`Framebuffer::is_valid`] for the outcome.
    pub fn create_framebuffer(self: &Rc<Self>) -> Framebuffer {
        Framebuffer::new(self)
    }

    /// The active texture unit.
    pub fn active_unit(&self) -> TextureUnit {
        self.bindings.borrow().active_unit
    }

    /// The texture bound on a unit.
    pub fn texture_binding(&self, unit: TextureUnit) -> Option<TextureId> {
        self.bindings
            .borrow()
            .units
            .get(unit.index() as usize)
            .copied()
            .flatten()
    }

    /// The framebuffer bound on a target, `None` for the default framebuffer.
    pub fn framebuffer_binding(&self, target: FramebufferTarget) -> Option<FramebufferId> {
        self.bindings.borrow().framebuffers.get(target)
    }

    /// Number of live texture handles.
    pub fn live_texture_count(&self) -> usize {
        self.live_textures.borrow().len()
    }

    /// Number of live framebuffer handles.
    pub fn live_framebuffer_count(&self) -> usize {
        self.live_framebuffers.borrow().len()
    }

    pub(crate) fn ensure_usable(&self) -> Result<()> {
        if self.lost.get() {
            Err(GraphicsError::ContextLost)
        } else {
            Ok(())
        }
    }

    pub(crate) fn separate_targets(&self) -> bool {
        self.capabilities.separate_read_draw
    }

    /// The target the device actually addresses for `target`.
    pub(crate) fn resolve_target(&self, target: FramebufferTarget) -> FramebufferTarget {
        if self.separate_targets() {
            target
        } else {
            FramebufferTarget::Both
        }
    }

    pub(crate) fn validate_unit(&self, unit: TextureUnit) -> Result<()> {
        if unit.index() >= self.capabilities.max_texture_units {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture unit {} exceeds maximum {}",
                unit.index(),
                self.capabilities.max_texture_units
            )));
        }
        Ok(())
    }

    pub(crate) fn register_texture(&self, id: TextureId) {
        self.live_textures.borrow_mut().insert(id);
    }

    pub(crate) fn register_framebuffer(&self, id: FramebufferId) {
        self.live_framebuffers.borrow_mut().insert(id);
    }

    pub(crate) fn is_live_texture(&self, id: TextureId) -> bool {
        self.live_textures.borrow().contains(&id)
    }

    pub(crate) fn is_live_framebuffer(&self, id: FramebufferId) -> bool {
        self.live_framebuffers.borrow().contains(&id)
    }

    /// Release a texture handle and clear every unit it occupies.
    pub(crate) fn release_texture(&self, id: TextureId) {
        if !self.live_textures.borrow_mut().remove(&id) {
            return;
        }
        for unit in self.bindings.borrow_mut().units.iter_mut() {
            if *unit == Some(id) {
                *unit = None;
            }
        }
        self.backend.delete_texture(id);
    }

    /// Release a framebuffer handle; slots it occupies revert to the default framebuffer.
    pub(crate) fn release_framebuffer(&self, id: FramebufferId) {
        if !self.live_framebuffers.borrow_mut().remove(&id) {
            return;
        }
        let mut bindings = self.bindings.borrow_mut();
        if bindings.framebuffers.draw == Some(id) {
            bindings.framebuffers.draw = None;
        }
        if bindings.framebuffers.read == Some(id) {
            bindings.framebuffers.read = None;
        }
        drop(bindings);
        self.backend.delete_framebuffer(id);
    }

    /// Bind a texture (or none) on a unit, returning the previous occupant.
    ///
    /// Handles that are no longer live bind as none. Issues no device call
    /// when the unit already holds the texture.
    pub(crate) fn bind_texture_unit(
        &self,
        unit: TextureUnit,
        texture: Option<TextureId>,
    ) -> Result<Option<TextureId>> {
        self.ensure_usable()?;
        self.validate_unit(unit)?;
        let texture = texture.filter(|id| self.is_live_texture(*id));

        let mut bindings = self.bindings.borrow_mut();
        let index = unit.index() as usize;
        let previous = bindings.units[index];
        if previous == texture {
            return Ok(previous);
        }
        if bindings.active_unit != unit {
            self.backend.active_texture(unit);
            bindings.active_unit = unit;
        }
        self.backend.bind_texture(texture);
        bindings.units[index] = texture;
        log::trace!("Texture unit {}: {:?} -> {:?}", unit.index(), previous, texture);
        Ok(previous)
    }

    /// Run `f` with `texture` bound on the active unit, then restore the unit.
    pub(crate) fn with_texture<R>(
        &self,
        texture: TextureId,
        f: impl FnOnce(&dyn GpuBackend) -> Result<R>,
    ) -> Result<R> {
        let unit = self.active_unit();
        let previous = self.bind_texture_unit(unit, Some(texture))?;
        let result = f(self.backend());
        let restored = self.bind_texture_unit(unit, previous);
        let value = result?;
        restored?;
        Ok(value)
    }

    /// Select `unit` as the active unit without changing its binding.
    pub(crate) fn make_texture_active(&self, unit: TextureUnit) -> Result<()> {
        self.validate_unit(unit)?;
        let mut bindings = self.bindings.borrow_mut();
        if bindings.active_unit != unit {
            self.backend.active_texture(unit);
            bindings.active_unit = unit;
        }
        Ok(())
    }

    /// Bind a framebuffer (or the default one) to a target.
    ///
    /// On devices with combined targets every target addresses both slots.
    pub(crate) fn bind_framebuffer(
        &self,
        target: FramebufferTarget,
        framebuffer: Option<FramebufferId>,
    ) -> Result<()> {
        self.ensure_usable()?;
        let target = self.resolve_target(target);
        let framebuffer = framebuffer.filter(|id| self.is_live_framebuffer(*id));

        let mut bindings = self.bindings.borrow_mut();
        let current = bindings.framebuffers;
        let unchanged = (!target.includes_draw() || current.draw == framebuffer)
            && (!target.includes_read() || current.read == framebuffer);
        if unchanged {
            return Ok(());
        }
        self.backend.bind_framebuffer(target, framebuffer);
        bindings.framebuffers.set(target, framebuffer);
        log::trace!("Framebuffer {:?}: {:?} -> {:?}", target, current, framebuffer);
        Ok(())
    }

    /// Snapshot of the framebuffer slots.
    pub(crate) fn framebuffer_bindings(&self) -> FramebufferBindings {
        self.bindings.borrow().framebuffers
    }

    /// Restore a snapshot taken with [`GraphicsContext::framebuffer_bindings`].
    pub(crate) fn restore_framebuffers(&self, saved: FramebufferBindings) -> Result<()> {
        if !self.separate_targets() || saved.draw == saved.read {
            return self.bind_framebuffer(FramebufferTarget::Both, saved.draw);
        }
        self.bind_framebuffer(FramebufferTarget::Draw, saved.draw)?;
        self.bind_framebuffer(FramebufferTarget::Read, saved.read)
    }

    /// The quad blitter, built on first use.
    pub(crate) fn blitter(&self) -> Result<&QuadBlitter> {
        self.ensure_usable()?;
        if self.blitter.get().is_none() {
            let blitter = QuadBlitter::new(self.backend())?;
            log::debug!("Created quad blitter for {:?}", self.parameters.label);
            let _ = self.blitter.set(blitter);
        }
        self.blitter.get().ok_or_else(|| {
            GraphicsError::ResourceCreationFailed("quad blitter unavailable".to_string())
        })
    }
}

impl Drop for GraphicsContext {
    fn drop(&mut self) {
        if let Some(blitter) = self.blitter.take() {
            if !self.lost.get() {
                blitter.release(self.backend.as_ref());
            }
        }
        log::debug!("GraphicsContext {:?} dropped", self.parameters.label);
    }
}

impl std::fmt::Debug for GraphicsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsContext")
            .field("label", &self.parameters.label)
            .field("backend", &self.backend.name())
            .field("lost", &self.lost.get())
            .finish()
    }
}

// Ensure the context is confined to one thread
static_assertions::assert_not_impl_any!(GraphicsContext: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_context() -> (Rc<DummyBackend>, Rc<GraphicsContext>) {
        let backend = Rc::new(DummyBackend::new());
        let context = GraphicsContext::new(backend.clone(), ContextParameters::default()).unwrap();
        (backend, context)
    }

    #[test]
    fn test_default_parameters() {
        let params = ContextParameters::default();
        assert_eq!(params.attachment_validation, AttachmentValidation::Lazy);
        assert_eq!(params.blit_strategy, None);
        assert_eq!(params.check_errors, cfg!(debug_assertions));
    }

    #[test]
    fn test_blit_strategy_follows_capabilities() {
        let backend = Rc::new(DummyBackend::with_capabilities(DeviceCapabilities::gles2()));
        let context = GraphicsContext::new(backend, ContextParameters::default()).unwrap();
        assert_eq!(context.blit_strategy(), BlitStrategy::QuadEmulation);

        let context = GraphicsContext::new(
            Rc::new(DummyBackend::new()),
            ContextParameters::new().with_blit_strategy(BlitStrategy::QuadEmulation),
        )
        .unwrap();
        assert_eq!(context.blit_strategy(), BlitStrategy::QuadEmulation);
    }

    #[test]
    fn test_bind_same_texture_twice_issues_one_call() {
        let (backend, context) = dummy_context();
        let id = backend.create_texture().unwrap();
        context.register_texture(id);
        backend.clear_calls();

        context.bind_texture_unit(TextureUnit(0), Some(id)).unwrap();
        context.bind_texture_unit(TextureUnit(0), Some(id)).unwrap();
        assert_eq!(backend.calls().len(), 1);
        assert_eq!(backend.texture_binding(TextureUnit(0)), Some(id));
    }

    #[test]
    fn test_dead_handles_bind_as_none() {
        let (backend, context) = dummy_context();
        let id = backend.create_texture().unwrap();
        context.bind_texture_unit(TextureUnit(0), Some(id)).unwrap();
        assert_eq!(context.texture_binding(TextureUnit(0)), None);
    }

    #[test]
    fn test_unit_out_of_range() {
        let (_backend, context) = dummy_context();
        let result = context.bind_texture_unit(TextureUnit(32), None);
        assert!(matches!(result, Err(GraphicsError::InvalidParameter(_))));
    }

    #[test]
    fn test_combined_targets_collapse() {
        let backend = Rc::new(DummyBackend::with_capabilities(DeviceCapabilities::gles2()));
        let context = GraphicsContext::new(backend.clone(), ContextParameters::default()).unwrap();
        let id = backend.create_framebuffer().unwrap();
        context.register_framebuffer(id);

        context.bind_framebuffer(FramebufferTarget::Draw, Some(id)).unwrap();
        assert_eq!(context.framebuffer_binding(FramebufferTarget::Read), Some(id));
        assert_eq!(backend.take_error(), None);
    }

    #[test]
    fn test_lost_context_rejects_binding() {
        let (_backend, context) = dummy_context();
        context.mark_lost();
        assert!(context.is_lost());
        assert_eq!(
            context.bind_texture_unit(TextureUnit(0), None),
            Err(GraphicsError::ContextLost)
        );
    }
}
