//! Render target types.

use bitflags::bitflags;

use super::TextureFormat;

/// Named slot on a framebuffer that a texture can back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttachmentPoint {
    /// Color attachment with the given index.
    Color(u32),
    /// Depth attachment.
    Depth,
    /// Stencil attachment.
    Stencil,
    /// Combined depth/stencil attachment.
    DepthStencil,
}

impl AttachmentPoint {
    /// The first color attachment.
    pub const COLOR0: Self = Self::Color(0);

    /// Returns true for color attachment points.
    pub fn is_color(&self) -> bool {
        matches!(self, Self::Color(_))
    }

    /// Returns true if a texture of `format` can back this point.
    pub fn accepts(&self, format: TextureFormat) -> bool {
        match self {
            Self::Color(_) => !format.is_depth(),
            Self::Depth => format.is_depth(),
            Self::Stencil | Self::DepthStencil => format.has_stencil(),
        }
    }
}

/// Framebuffer binding slot.
///
/// On devices with a combined draw/read target every variant addresses the
/// same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FramebufferTarget {
    /// Destination of draw calls and blits.
    Draw,
    /// Source of reads and blits.
    Read,
    /// Both slots at once.
    #[default]
    Both,
}

impl FramebufferTarget {
    /// Returns true if the target covers the draw slot.
    pub fn includes_draw(&self) -> bool {
        matches!(self, Self::Draw | Self::Both)
    }

    /// Returns true if the target covers the read slot.
    pub fn includes_read(&self) -> bool {
        matches!(self, Self::Read | Self::Both)
    }
}

bitflags! {
    /// Buffers copied by a framebuffer blit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BlitMask: u32 {
        /// Color buffer.
        const COLOR = 1 << 0;
        /// Depth buffer.
        const DEPTH = 1 << 1;
        /// Stencil buffer.
        const STENCIL = 1 << 2;
    }
}

impl Default for BlitMask {
    fn default() -> Self {
        Self::COLOR
    }
}

/// Completeness of a framebuffer as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferStatus {
    /// The framebuffer can be rendered to.
    Complete,
    /// An attachment is not renderable or has no storage.
    IncompleteAttachment,
    /// Nothing is attached.
    MissingAttachment,
    /// Attachments differ in size.
    IncompleteDimensions,
    /// Attachments differ in sample count.
    IncompleteMultisample,
    /// The combination of formats is not supported.
    Unsupported,
    /// The default framebuffer does not exist.
    Undefined,
    /// A status code this crate does not know.
    Unknown(u32),
}

impl FramebufferStatus {
    /// Returns true if the framebuffer can be used.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Axis-aligned pixel rectangle with its origin at the lower left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Bottom edge.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Create a rectangle.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle at the origin.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    /// Exclusive top edge.
    pub fn top(&self) -> i32 {
        self.y + self.height as i32
    }

    /// Returns true if the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
