//! GPU resources.
//!
//! This module contains the GPU object types created from a [`GraphicsContext`]:
//! - [`Texture2D`] - 2D texture with mip levels and sampling state
//! - [`Framebuffer`] - render target built from texture attachments
//! - [`QuadBlitter`] - program behind emulated framebuffer blits
//!
//! Objects are single-threaded and hold an [`Rc`] to their context, keeping
//! it alive for as long as any native handle exists.
//!
//! [`GraphicsContext`]: crate::GraphicsContext
//! [`Rc`]: std::rc::Rc

mod blit;
mod framebuffer;
mod texture;

pub use blit::QuadBlitter;
pub use framebuffer::{Attachment, Framebuffer};
pub use texture::Texture2D;
