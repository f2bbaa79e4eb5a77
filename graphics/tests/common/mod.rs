//! Common utilities for integration tests.
//!
//! Every test runs against the [`DummyBackend`], configured to look like the
//! device class under test.

use std::rc::Rc;

use glint_graphics::{
    AttachmentPoint, ContextParameters, DeviceCapabilities, DummyBackend, Framebuffer, GpuObject,
    GraphicsContext, Texture2D, TextureDescriptor,
};

/// Install a test logger once per process.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Device Enumeration
// ============================================================================

/// Device classes the tests are parameterized over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    /// Desktop OpenGL 3.3 class device.
    Desktop,
    /// OpenGL ES 2.0 class device.
    Gles2,
}

impl Device {
    /// Capabilities reported for this device class.
    pub fn capabilities(self) -> DeviceCapabilities {
        match self {
            Device::Desktop => DeviceCapabilities::desktop(),
            Device::Gles2 => DeviceCapabilities::gles2(),
        }
    }
}

// ============================================================================
// Test Context
// ============================================================================

/// Dummy backend plus a context over it.
pub struct TestContext {
    /// The backend, for inspecting simulated device state.
    pub backend: Rc<DummyBackend>,
    /// The context under test.
    pub context: Rc<GraphicsContext>,
}

impl TestContext {
    /// Create a context for a device class with default parameters.
    pub fn new(device: Device) -> Self {
        Self::with_parameters(device, ContextParameters::default())
    }

    /// Create a context for a device class with explicit parameters.
    pub fn with_parameters(device: Device, parameters: ContextParameters) -> Self {
        init_logging();
        let backend = Rc::new(DummyBackend::with_capabilities(device.capabilities()));
        let context = GraphicsContext::new(backend.clone(), parameters)
            .expect("Failed to create graphics context");
        Self { backend, context }
    }

    /// Create an RGBA8 texture.
    pub fn create_texture(&self, width: u32, height: u32) -> Rc<Texture2D> {
        let texture = self
            .context
            .create_texture(&TextureDescriptor::new_2d(width, height));
        assert!(texture.is_valid(), "Failed to create texture");
        texture
    }

    /// Create a framebuffer with an RGBA8 color 0 attachment.
    pub fn create_target(&self, width: u32, height: u32) -> Framebuffer {
        let mut framebuffer = self.context.create_framebuffer();
        framebuffer
            .attach(AttachmentPoint::COLOR0, self.create_texture(width, height))
            .expect("Failed to attach color texture");
        framebuffer
    }

    /// Fill level 0 of a framebuffer's color 0 texture with a test pattern.
    pub fn fill_target(&self, framebuffer: &Framebuffer) -> Vec<u8> {
        let texture = &framebuffer
            .attachment(AttachmentPoint::COLOR0)
            .expect("Missing color attachment")
            .texture;
        let pattern = generate_test_pattern(texture.width(), texture.height());
        texture
            .set_pixels(Some(&pattern), 0, None)
            .expect("Failed to upload pattern");
        pattern
    }

    /// Read back level 0 of a framebuffer's color 0 texture.
    pub fn read_target(&self, framebuffer: &Framebuffer) -> Option<Vec<u8>> {
        let texture = &framebuffer.attachment(AttachmentPoint::COLOR0).ok()?.texture;
        self.backend.texture_level(texture.id()?, 0)?.data
    }
}

// ============================================================================
// Pixel Helpers
// ============================================================================

/// RGBA8 pattern where each texel encodes its coordinates.
pub fn generate_test_pattern(width: u32, height: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&[x as u8, y as u8, 0x80, 0xFF]);
        }
    }
    data
}

/// The RGBA8 texel at `(x, y)` of a tightly packed buffer.
pub fn get_pixel(data: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let offset = ((y * width + x) * 4) as usize;
    [
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ]
}
