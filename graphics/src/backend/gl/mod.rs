//! OpenGL / OpenGL ES backend implementation using glow.
//!
//! The backend wraps a `glow::Context` created by the windowing layer. It
//! issues exactly the calls the object layer asks for; binding state is
//! cached by [`GraphicsContext`](crate::GraphicsContext), not here.

mod conversion;
mod shaders;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use glow::HasContext;

use crate::error::{GraphicsError, Result, INVALID_OPERATION};
use crate::types::{
    AttachmentPoint, BlitMask, FilterMode, FramebufferStatus, FramebufferTarget, Rect,
    TextureParameter, TextureUnit,
};

use self::conversion::*;
use self::shaders::{ShaderDialect, POSITION_LOCATION, QUAD_VERTICES, SAMPLER_UNIFORM, UV_LOCATION};
use super::{
    DeviceCapabilities, FramebufferId, GpuBackend, ProgramId, TextureId, TextureImage,
    TextureRegion,
};

/// Callback that makes the native context current on the calling thread.
pub type MakeCurrentFn = Box<dyn Fn() -> std::result::Result<(), String>>;

/// Vertex state owned by a quad program.
struct QuadGeometry {
    buffer: glow::NativeBuffer,
    vertex_array: Option<glow::NativeVertexArray>,
}

/// OpenGL backend.
pub struct GlBackend {
    gl: glow::Context,
    capabilities: DeviceCapabilities,
    dialect: ShaderDialect,
    unsized_formats: bool,
    make_current: Option<MakeCurrentFn>,
    check_errors: Cell<bool>,
    quads: RefCell<HashMap<ProgramId, QuadGeometry>>,
}

impl GlBackend {
    /// Wrap a glow context. The context must be current.
    pub fn new(gl: glow::Context) -> Self {
        let (is_embedded, major, minor) = {
            let version = gl.version();
            log::info!(
                "OpenGL backend: {} {}.{} ({})",
                if version.is_embedded { "ES" } else { "GL" },
                version.major,
                version.minor,
                version.vendor_info
            );
            (version.is_embedded, version.major, version.minor)
        };
        let gles2 = is_embedded && major < 3;
        let capabilities = Self::query_capabilities(&gl, is_embedded, major, minor);
        let dialect = ShaderDialect::for_version(is_embedded, major, minor);

        Self {
            gl,
            capabilities,
            dialect,
            unsized_formats: gles2,
            make_current: None,
            check_errors: Cell::new(cfg!(debug_assertions)),
            quads: RefCell::new(HashMap::new()),
        }
    }

    /// Set the callback used by [`GpuBackend::make_current`].
    pub fn with_make_current(mut self, make_current: MakeCurrentFn) -> Self {
        self.make_current = Some(make_current);
        self
    }

    /// The wrapped glow context.
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    fn query_capabilities(
        gl: &glow::Context,
        es: bool,
        major: u32,
        minor: u32,
    ) -> DeviceCapabilities {
        let extensions = gl.supported_extensions();
        let has = |name: &str| extensions.contains(name);
        let gles2 = es && major < 3;
        let core3 = !es && major >= 3;

        let separate = !gles2 && (es || core3 || has("GL_ARB_framebuffer_object"));
        let invalidate = (es && major >= 3)
            || (!es && (major, minor) >= (4, 3))
            || has("GL_ARB_invalidate_subdata");

        // SAFETY: Plain state queries on the current context
        let (max_texture_size, max_units, max_color) = unsafe {
            (
                gl.get_parameter_i32(glow::MAX_TEXTURE_SIZE),
                gl.get_parameter_i32(glow::MAX_COMBINED_TEXTURE_IMAGE_UNITS),
                if gles2 {
                    1
                } else {
                    gl.get_parameter_i32(glow::MAX_COLOR_ATTACHMENTS)
                },
            )
        };

        DeviceCapabilities {
            max_texture_size: max_texture_size.max(1) as u32,
            max_texture_units: max_units.max(1) as u32,
            max_color_attachments: max_color.max(1) as u32,
            separate_read_draw: separate,
            framebuffer_blit: separate,
            invalidate_framebuffer: invalidate,
            depth_textures: !gles2 || has("GL_OES_depth_texture"),
            float_textures: !gles2,
        }
    }

    /// Drain the native error flag and report the first error of `call`.
    fn check(&self, call: &str) -> Result<()> {
        if !self.check_errors.get() {
            return Ok(());
        }
        let mut first = None;
        // The flag can hold several codes; bound the loop for lost contexts.
        for _ in 0..8 {
            // SAFETY: glGetError has no preconditions
            let code = unsafe { self.gl.get_error() };
            if code == glow::NO_ERROR {
                break;
            }
            first.get_or_insert(code);
        }
        match first {
            Some(code) => {
                let error = GraphicsError::device(code, call);
                log::error!("OpenGL: {}", error);
                Err(error)
            }
            None => Ok(()),
        }
    }

    /// Like [`GlBackend::check`] for calls that cannot report failure.
    fn poll(&self, call: &str) {
        let _ = self.check(call);
    }

    fn texture(id: TextureId) -> glow::NativeTexture {
        glow::NativeTexture(id.0)
    }

    fn framebuffer(id: FramebufferId) -> glow::NativeFramebuffer {
        glow::NativeFramebuffer(id.0)
    }

    fn program(id: ProgramId) -> glow::NativeProgram {
        glow::NativeProgram(id.0)
    }

    fn compile_shader(&self, kind: u32, source: &str) -> Result<glow::NativeShader> {
        // SAFETY: The context is current; the shader is deleted on failure
        unsafe {
            let shader = self
                .gl
                .create_shader(kind)
                .map_err(GraphicsError::ResourceCreationFailed)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(GraphicsError::ResourceCreationFailed(format!(
                    "quad shader compilation failed: {log}"
                )));
            }
            Ok(shader)
        }
    }

    fn link_quad_program(&self) -> Result<glow::NativeProgram> {
        let vertex = self.compile_shader(glow::VERTEX_SHADER, self.dialect.vertex_source())?;
        let fragment =
            match self.compile_shader(glow::FRAGMENT_SHADER, self.dialect.fragment_source()) {
                Ok(shader) => shader,
                Err(error) => {
                    // SAFETY: `vertex` was created above and is not attached
                    unsafe { self.gl.delete_shader(vertex) };
                    return Err(error);
                }
            };

        // SAFETY: Shaders are valid; they are detached and deleted before returning
        unsafe {
            let program = match self.gl.create_program() {
                Ok(program) => program,
                Err(message) => {
                    self.gl.delete_shader(vertex);
                    self.gl.delete_shader(fragment);
                    return Err(GraphicsError::ResourceCreationFailed(message));
                }
            };
            self.gl.attach_shader(program, vertex);
            self.gl.attach_shader(program, fragment);
            self.gl.bind_attrib_location(program, POSITION_LOCATION, "a_position");
            self.gl.bind_attrib_location(program, UV_LOCATION, "a_uv");
            self.gl.link_program(program);
            let linked = self.gl.get_program_link_status(program);

            self.gl.detach_shader(program, vertex);
            self.gl.detach_shader(program, fragment);
            self.gl.delete_shader(vertex);
            self.gl.delete_shader(fragment);

            if !linked {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(GraphicsError::ResourceCreationFailed(format!(
                    "quad program link failed: {log}"
                )));
            }
            Ok(program)
        }
    }

    fn create_quad_geometry(&self) -> Result<QuadGeometry> {
        // SAFETY: Buffer and vertex array are fresh objects of the current context
        unsafe {
            let previous_buffer = self.gl.get_parameter_buffer(glow::ARRAY_BUFFER_BINDING);
            let buffer = self
                .gl
                .create_buffer()
                .map_err(GraphicsError::ResourceCreationFailed)?;
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            self.gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&QUAD_VERTICES),
                glow::STATIC_DRAW,
            );

            let vertex_array = if self.dialect.uses_vertex_arrays() {
                let previous_array = self.gl.get_parameter_vertex_array(glow::VERTEX_ARRAY_BINDING);
                let vertex_array = match self.gl.create_vertex_array() {
                    Ok(vertex_array) => vertex_array,
                    Err(message) => {
                        self.gl.bind_buffer(glow::ARRAY_BUFFER, previous_buffer);
                        self.gl.delete_buffer(buffer);
                        return Err(GraphicsError::ResourceCreationFailed(message));
                    }
                };
                self.gl.bind_vertex_array(Some(vertex_array));
                self.set_quad_attributes();
                self.gl.bind_vertex_array(previous_array);
                Some(vertex_array)
            } else {
                None
            };

            self.gl.bind_buffer(glow::ARRAY_BUFFER, previous_buffer);
            Ok(QuadGeometry {
                buffer,
                vertex_array,
            })
        }
    }

    /// Point the quad attributes at the bound array buffer.
    unsafe fn set_quad_attributes(&self) {
        let stride = (4 * std::mem::size_of::<f32>()) as i32;
        self.gl.enable_vertex_attrib_array(POSITION_LOCATION);
        self.gl
            .vertex_attrib_pointer_f32(POSITION_LOCATION, 2, glow::FLOAT, false, stride, 0);
        self.gl.enable_vertex_attrib_array(UV_LOCATION);
        self.gl.vertex_attrib_pointer_f32(
            UV_LOCATION,
            2,
            glow::FLOAT,
            false,
            stride,
            (2 * std::mem::size_of::<f32>()) as i32,
        );
    }
}

impl GpuBackend for GlBackend {
    fn name(&self) -> &'static str {
        "OpenGL"
    }

    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    fn make_current(&self) -> Result<()> {
        match &self.make_current {
            Some(make_current) => make_current().map_err(|message| {
                GraphicsError::device(INVALID_OPERATION, format!("make current: {message}"))
            }),
            None => Ok(()),
        }
    }

    fn set_error_checks(&self, enabled: bool) {
        self.check_errors.set(enabled);
    }

    fn create_texture(&self) -> Result<TextureId> {
        // SAFETY: Allocating a name has no preconditions
        let texture = unsafe { self.gl.create_texture() }
            .map_err(GraphicsError::ResourceCreationFailed)?;
        Ok(TextureId(texture.0))
    }

    fn delete_texture(&self, texture: TextureId) {
        // SAFETY: The object layer deletes each handle exactly once
        unsafe { self.gl.delete_texture(Self::texture(texture)) };
        self.poll("delete_texture");
    }

    fn active_texture(&self, unit: TextureUnit) {
        // SAFETY: The unit is validated against the device limit by the caller
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit.index()) };
        self.poll("active_texture");
    }

    fn bind_texture(&self, texture: Option<TextureId>) {
        // SAFETY: Only live handles are bound
        unsafe {
            self.gl
                .bind_texture(glow::TEXTURE_2D, texture.map(Self::texture))
        };
        self.poll("bind_texture");
    }

    fn tex_image_2d(&self, image: &TextureImage<'_>) -> Result<()> {
        // SAFETY: `data` holds at least width * height pixels, checked by the caller
        unsafe {
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                image.level as i32,
                convert_internal_format(image.internal_format, self.unsized_formats),
                image.width as i32,
                image.height as i32,
                0,
                convert_pixel_format(image.format),
                convert_pixel_type(image.pixel_type),
                glow::PixelUnpackData::Slice(image.data),
            );
        }
        self.check("tex_image_2d")
    }

    fn tex_sub_image_2d(&self, region: &TextureRegion<'_>) -> Result<()> {
        // SAFETY: `data` covers the region, checked by the caller
        unsafe {
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_sub_image_2d(
                glow::TEXTURE_2D,
                region.level as i32,
                region.rect.x,
                region.rect.y,
                region.rect.width as i32,
                region.rect.height as i32,
                convert_pixel_format(region.format),
                convert_pixel_type(region.pixel_type),
                glow::PixelUnpackData::Slice(Some(region.data)),
            );
        }
        self.check("tex_sub_image_2d")
    }

    fn set_texture_parameter(&self, parameter: TextureParameter) -> Result<()> {
        let (name, value) = convert_texture_parameter(parameter);
        // SAFETY: Parameter enums come from the conversion table
        unsafe { self.gl.tex_parameter_i32(glow::TEXTURE_2D, name, value) };
        self.check("tex_parameter")
    }

    fn generate_mipmaps(&self) -> Result<()> {
        // SAFETY: Operates on the bound texture
        unsafe { self.gl.generate_mipmap(glow::TEXTURE_2D) };
        self.check("generate_mipmap")
    }

    fn copy_tex_sub_image_2d(&self, level: u32, source: Rect) -> Result<()> {
        // SAFETY: Operates on the bound texture and read framebuffer
        unsafe {
            self.gl.copy_tex_sub_image_2d(
                glow::TEXTURE_2D,
                level as i32,
                0,
                0,
                source.x,
                source.y,
                source.width as i32,
                source.height as i32,
            )
        };
        self.check("copy_tex_sub_image_2d")
    }

    fn create_framebuffer(&self) -> Result<FramebufferId> {
        // SAFETY: Allocating a name has no preconditions
        let framebuffer = unsafe { self.gl.create_framebuffer() }
            .map_err(GraphicsError::ResourceCreationFailed)?;
        Ok(FramebufferId(framebuffer.0))
    }

    fn delete_framebuffer(&self, framebuffer: FramebufferId) {
        // SAFETY: The object layer deletes each handle exactly once
        unsafe { self.gl.delete_framebuffer(Self::framebuffer(framebuffer)) };
        self.poll("delete_framebuffer");
    }

    fn bind_framebuffer(&self, target: FramebufferTarget, framebuffer: Option<FramebufferId>) {
        // SAFETY: Only live handles are bound
        unsafe {
            self.gl.bind_framebuffer(
                convert_framebuffer_target(target),
                framebuffer.map(Self::framebuffer),
            )
        };
        self.poll("bind_framebuffer");
    }

    fn framebuffer_texture_2d(
        &self,
        target: FramebufferTarget,
        point: AttachmentPoint,
        texture: Option<TextureId>,
    ) -> Result<()> {
        // SAFETY: Operates on the framebuffer bound at `target`
        unsafe {
            self.gl.framebuffer_texture_2d(
                convert_framebuffer_target(target),
                convert_attachment_point(point),
                glow::TEXTURE_2D,
                texture.map(Self::texture),
                0,
            )
        };
        self.check("framebuffer_texture_2d")
    }

    fn check_framebuffer_status(&self, target: FramebufferTarget) -> FramebufferStatus {
        // SAFETY: Plain state query
        let status =
            unsafe { self.gl.check_framebuffer_status(convert_framebuffer_target(target)) };
        convert_framebuffer_status(status)
    }

    fn blit_framebuffer(
        &self,
        source: Rect,
        destination: Rect,
        mask: BlitMask,
        filter: FilterMode,
    ) -> Result<()> {
        // SAFETY: Read and draw framebuffers were bound and checked by the caller
        unsafe {
            self.gl.blit_framebuffer(
                source.x,
                source.y,
                source.right(),
                source.top(),
                destination.x,
                destination.y,
                destination.right(),
                destination.top(),
                convert_blit_mask(mask),
                convert_filter_mode(filter),
            )
        };
        self.check("blit_framebuffer")
    }

    fn invalidate_framebuffer(
        &self,
        target: FramebufferTarget,
        points: &[AttachmentPoint],
    ) -> Result<()> {
        let attachments: Vec<u32> = points.iter().copied().map(convert_attachment_point).collect();
        // SAFETY: Operates on the framebuffer bound at `target`
        unsafe {
            self.gl
                .invalidate_framebuffer(convert_framebuffer_target(target), &attachments)
        };
        self.check("invalidate_framebuffer")
    }

    fn create_quad_program(&self) -> Result<ProgramId> {
        let program = self.link_quad_program()?;
        let geometry = match self.create_quad_geometry() {
            Ok(geometry) => geometry,
            Err(error) => {
                // SAFETY: The program was linked above and is unused
                unsafe { self.gl.delete_program(program) };
                return Err(error);
            }
        };
        let id = ProgramId(program.0);
        self.quads.borrow_mut().insert(id, geometry);
        log::debug!("OpenGL: built quad program {:?} ({:?})", id, self.dialect);
        Ok(id)
    }

    fn delete_program(&self, program: ProgramId) {
        let geometry = self.quads.borrow_mut().remove(&program);
        // SAFETY: The program and its geometry are owned by this backend
        unsafe {
            if let Some(geometry) = geometry {
                if let Some(vertex_array) = geometry.vertex_array {
                    self.gl.delete_vertex_array(vertex_array);
                }
                self.gl.delete_buffer(geometry.buffer);
            }
            self.gl.delete_program(Self::program(program));
        }
        self.poll("delete_program");
    }

    fn draw_texture_quad(
        &self,
        program: ProgramId,
        unit: TextureUnit,
        viewport: Rect,
    ) -> Result<()> {
        let quads = self.quads.borrow();
        let geometry = quads.get(&program).ok_or_else(|| {
            GraphicsError::InvalidObject(format!("unknown quad program {:?}", program))
        })?;
        let native = Self::program(program);

        // SAFETY: Every piece of state touched here is saved and restored
        unsafe {
            let mut saved_viewport = [0i32; 4];
            self.gl
                .get_parameter_i32_slice(glow::VIEWPORT, &mut saved_viewport);
            let saved_program = self.gl.get_parameter_program(glow::CURRENT_PROGRAM);
            let capabilities = [glow::BLEND, glow::DEPTH_TEST, glow::SCISSOR_TEST, glow::CULL_FACE];
            let enabled: Vec<bool> = capabilities
                .iter()
                .map(|capability| self.gl.is_enabled(*capability))
                .collect();
            for capability in capabilities {
                self.gl.disable(capability);
            }

            self.gl.viewport(
                viewport.x,
                viewport.y,
                viewport.width as i32,
                viewport.height as i32,
            );
            self.gl.use_program(Some(native));
            let location = self.gl.get_uniform_location(native, SAMPLER_UNIFORM);
            self.gl.uniform_1_i32(location.as_ref(), unit.index() as i32);

            let saved_buffer = self.gl.get_parameter_buffer(glow::ARRAY_BUFFER_BINDING);
            match geometry.vertex_array {
                Some(vertex_array) => {
                    let saved_array =
                        self.gl.get_parameter_vertex_array(glow::VERTEX_ARRAY_BINDING);
                    self.gl.bind_vertex_array(Some(vertex_array));
                    self.gl.draw_arrays(glow::TRIANGLE_STRIP, 0, 4);
                    self.gl.bind_vertex_array(saved_array);
                }
                None => {
                    self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(geometry.buffer));
                    self.set_quad_attributes();
                    self.gl.draw_arrays(glow::TRIANGLE_STRIP, 0, 4);
                    self.gl.disable_vertex_attrib_array(POSITION_LOCATION);
                    self.gl.disable_vertex_attrib_array(UV_LOCATION);
                }
            }
            self.gl.bind_buffer(glow::ARRAY_BUFFER, saved_buffer);

            self.gl.use_program(saved_program);
            for (capability, was_enabled) in capabilities.into_iter().zip(enabled) {
                if was_enabled {
                    self.gl.enable(capability);
                }
            }
            self.gl.viewport(
                saved_viewport[0],
                saved_viewport[1],
                saved_viewport[2],
                saved_viewport[3],
            );
        }
        self.check("draw_texture_quad")
    }
}

impl Drop for GlBackend {
    fn drop(&mut self) {
        let programs: Vec<ProgramId> = self.quads.borrow().keys().copied().collect();
        for program in programs {
            self.delete_program(program);
        }
    }
}
