//! Capability traits shared by GPU objects.
//!
//! - [`GpuObject`] - owns a native handle tied to a [`GraphicsContext`]
//! - [`Bindable`] - can occupy a binding slot of the context
//! - [`Changeable`] - tracks edits that must be applied before use
//!
//! The traits are independent; concrete types implement the ones they need.

use std::rc::Rc;

use crate::context::GraphicsContext;
use crate::error::{GraphicsError, Result};

/// An object backed by a native handle of one context.
pub trait GpuObject {
    /// The context the object was created from.
    fn context(&self) -> &Rc<GraphicsContext>;

    /// Returns true if the native handle was allocated.
    fn is_valid(&self) -> bool;

    /// The error that prevented allocation, if any.
    fn creation_error(&self) -> Option<&GraphicsError>;

    /// Debug name used in errors and logs.
    fn debug_name(&self) -> String;

    /// Fail unless the object can be used with the device.
    ///
    /// Checks run without touching the device.
    fn ensure_valid(&self) -> Result<()> {
        if !self.is_valid() {
            let reason = self
                .creation_error()
                .map(ToString::to_string)
                .unwrap_or_else(|| "no native handle".to_string());
            return Err(GraphicsError::InvalidObject(format!(
                "{}: {}",
                self.debug_name(),
                reason
            )));
        }
        self.context().ensure_usable()
    }
}

/// An object that can occupy a binding slot.
///
/// Binding twice to the same slot is a no-op. Unbinding restores whatever the
/// object displaced, if that object is still alive, and does nothing when the
/// object does not occupy the slot.
pub trait Bindable {
    /// Slot type, a texture unit or a framebuffer target.
    type Slot: Copy;

    /// Bind the object to a slot.
    fn bind(&self, slot: Self::Slot) -> Result<()>;

    /// Release a slot occupied by the object.
    fn unbind(&self, slot: Self::Slot) -> Result<()>;

    /// Returns true if the object currently occupies the slot.
    fn is_bound(&self, slot: Self::Slot) -> bool;
}

/// An object with pending edits.
pub trait Changeable {
    /// Flag pending edits.
    fn mark_changed(&self);

    /// Returns true while edits are pending.
    fn has_changes(&self) -> bool;

    /// Push pending edits to the device.
    fn apply_changes(&self) -> Result<()>;
}
