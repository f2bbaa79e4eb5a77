//! Graphics error types.

use crate::types::{AttachmentPoint, FramebufferStatus, PixelFormat, PixelType, TextureFormat};

/// Native error code: an enum argument was out of range.
pub const INVALID_ENUM: u32 = 0x0500;
/// Native error code: a numeric argument was out of range.
pub const INVALID_VALUE: u32 = 0x0501;
/// Native error code: the operation is not allowed in the current state.
pub const INVALID_OPERATION: u32 = 0x0502;
/// Native error code: not enough memory left to execute the command.
pub const OUT_OF_MEMORY: u32 = 0x0505;
/// Native error code: the bound framebuffer is not complete.
pub const INVALID_FRAMEBUFFER_OPERATION: u32 = 0x0506;

/// Name of a native error code.
pub fn error_code_name(code: u32) -> &'static str {
    match code {
        0 => "NO_ERROR",
        INVALID_ENUM => "INVALID_ENUM",
        INVALID_VALUE => "INVALID_VALUE",
        INVALID_OPERATION => "INVALID_OPERATION",
        0x0503 => "STACK_OVERFLOW",
        0x0504 => "STACK_UNDERFLOW",
        OUT_OF_MEMORY => "OUT_OF_MEMORY",
        INVALID_FRAMEBUFFER_OPERATION => "INVALID_FRAMEBUFFER_OPERATION",
        0x0507 => "CONTEXT_LOST",
        _ => "UNKNOWN_ERROR",
    }
}

/// Errors that can occur in the graphics system.
///
/// Every variant except [`GraphicsError::Framebuffer`] and
/// [`GraphicsError::Device`] describes a resource allocation or configuration
/// failure (see [`GraphicsError::is_resource_error`]).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphicsError {
    /// Failed to create a resource.
    #[error("resource creation failed: {0}")]
    ResourceCreationFailed(String),
    /// The object has no usable native handle.
    #[error("invalid object: {0}")]
    InvalidObject(String),
    /// An invalid parameter was provided.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// The device does not accept this storage format and pixel layout.
    #[error("unsupported texture format {internal_format:?} with {format:?}/{pixel_type:?}")]
    UnsupportedFormat {
        /// Requested internal storage format.
        internal_format: TextureFormat,
        /// Client pixel format.
        format: PixelFormat,
        /// Client pixel type.
        pixel_type: PixelType,
    },
    /// The object must be bound before this call.
    #[error("{0} is not bound")]
    NotBound(String),
    /// A requested feature is not supported.
    #[error("feature not supported: {0}")]
    FeatureNotSupported(String),
    /// Two objects from different contexts were combined.
    #[error("object belongs to a different graphics context")]
    ContextMismatch,
    /// The graphics context was lost; native handles are gone.
    #[error("graphics context lost")]
    ContextLost,
    /// Render target failure.
    #[error(transparent)]
    Framebuffer(#[from] FramebufferError),
    /// A native call reported an error code.
    #[error("device error {name} (0x{code:04X}): {message}")]
    Device {
        /// Native error code.
        code: u32,
        /// Name of the native error code.
        name: &'static str,
        /// The call that failed.
        message: String,
    },
}

impl GraphicsError {
    /// Build a [`GraphicsError::Device`] from a native error code.
    pub fn device(code: u32, message: impl Into<String>) -> Self {
        Self::Device {
            code,
            name: error_code_name(code),
            message: message.into(),
        }
    }

    /// Returns true for allocation and configuration failures of a resource.
    pub fn is_resource_error(&self) -> bool {
        !matches!(self, Self::Framebuffer(_) | Self::Device { .. })
    }
}

/// Errors specific to render targets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FramebufferError {
    /// Nothing is attached at the point.
    #[error("no texture attached at {0:?}")]
    AttachmentNotFound(AttachmentPoint),
    /// The device does not support the attachment point.
    #[error("attachment point {0:?} is not supported by the device")]
    UnsupportedAttachment(AttachmentPoint),
    /// The device rejected the attachment set.
    #[error("framebuffer is incomplete: {0:?}")]
    Incomplete(FramebufferStatus),
    /// An attachment does not match the size of the others.
    #[error("attachment at {point:?} is {actual:?}, expected {expected:?}")]
    DimensionMismatch {
        /// The rejected attachment point.
        point: AttachmentPoint,
        /// Size of the existing attachments.
        expected: (u32, u32),
        /// Size of the rejected texture.
        actual: (u32, u32),
    },
    /// The texture's storage format cannot back the attachment point.
    #[error("texture format {format:?} cannot be attached at {point:?}")]
    FormatMismatch {
        /// The rejected attachment point.
        point: AttachmentPoint,
        /// Storage format of the rejected texture.
        format: TextureFormat,
    },
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, GraphicsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphicsError::ContextLost;
        assert_eq!(err.to_string(), "graphics context lost");

        let err = GraphicsError::InvalidParameter("texture dimensions cannot be zero".to_string());
        assert_eq!(
            err.to_string(),
            "invalid parameter: texture dimensions cannot be zero"
        );
    }

    #[test]
    fn test_device_error_names_code() {
        let err = GraphicsError::device(INVALID_OPERATION, "tex_image_2d");
        assert_eq!(
            err.to_string(),
            "device error INVALID_OPERATION (0x0502): tex_image_2d"
        );
        assert!(!err.is_resource_error());
    }

    #[test]
    fn test_framebuffer_error_is_transparent() {
        let err: GraphicsError =
            FramebufferError::AttachmentNotFound(AttachmentPoint::Depth).into();
        assert_eq!(err.to_string(), "no texture attached at Depth");
        assert!(!err.is_resource_error());
        assert!(GraphicsError::ContextMismatch.is_resource_error());
    }
}
