//! Shader sources for the textured-quad blit.
//!
//! The quad is drawn as a triangle strip of four `(x, y, u, v)` vertices in
//! clip space. Sources are picked per shading language version.

/// Vertex attribute location of the clip-space position.
pub const POSITION_LOCATION: u32 = 0;
/// Vertex attribute location of the texture coordinate.
pub const UV_LOCATION: u32 = 1;
/// Name of the sampler uniform.
pub const SAMPLER_UNIFORM: &str = "u_texture";

/// Full-viewport quad as interleaved `x, y, u, v`.
pub const QUAD_VERTICES: [f32; 16] = [
    -1.0, -1.0, 0.0, 0.0, //
    1.0, -1.0, 1.0, 0.0, //
    -1.0, 1.0, 0.0, 1.0, //
    1.0, 1.0, 1.0, 1.0,
];

/// Shading language flavour of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderDialect {
    /// OpenGL ES 3.0 (`#version 300 es`).
    Es300,
    /// OpenGL ES 2.0 (`#version 100`).
    Es100,
    /// Desktop OpenGL 3.3 core (`#version 330 core`).
    Core330,
    /// Legacy desktop OpenGL (`#version 120`).
    Legacy120,
}

impl ShaderDialect {
    /// Pick the dialect for a context version.
    pub fn for_version(is_embedded: bool, major: u32, minor: u32) -> Self {
        match (is_embedded, major) {
            (true, 3..) => Self::Es300,
            (true, _) => Self::Es100,
            (false, 4..) => Self::Core330,
            (false, 3) if minor >= 3 => Self::Core330,
            (false, _) => Self::Legacy120,
        }
    }

    /// Returns true if vertex array objects are required.
    pub fn uses_vertex_arrays(&self) -> bool {
        matches!(self, Self::Es300 | Self::Core330)
    }

    /// Vertex shader source.
    pub fn vertex_source(&self) -> &'static str {
        match self {
            Self::Es300 => {
                "#version 300 es
layout(location = 0) in vec2 a_position;
layout(location = 1) in vec2 a_uv;
out vec2 v_uv;
void main() {
    v_uv = a_uv;
    gl_Position = vec4(a_position, 0.0, 1.0);
}
"
            }
            Self::Core330 => {
                "#version 330 core
layout(location = 0) in vec2 a_position;
layout(location = 1) in vec2 a_uv;
out vec2 v_uv;
void main() {
    v_uv = a_uv;
    gl_Position = vec4(a_position, 0.0, 1.0);
}
"
            }
            Self::Es100 => {
                "#version 100
attribute vec2 a_position;
attribute vec2 a_uv;
varying vec2 v_uv;
void main() {
    v_uv = a_uv;
    gl_Position = vec4(a_position, 0.0, 1.0);
}
"
            }
            Self::Legacy120 => {
                "#version 120
attribute vec2 a_position;
attribute vec2 a_uv;
varying vec2 v_uv;
void main() {
    v_uv = a_uv;
    gl_Position = vec4(a_position, 0.0, 1.0);
}
"
            }
        }
    }

    /// Fragment shader source.
    pub fn fragment_source(&self) -> &'static str {
        match self {
            Self::Es300 => {
                "#version 300 es
precision mediump float;
uniform sampler2D u_texture;
in vec2 v_uv;
out vec4 frag_color;
void main() {
    frag_color = texture(u_texture, v_uv);
}
"
            }
            Self::Core330 => {
                "#version 330 core
uniform sampler2D u_texture;
in vec2 v_uv;
out vec4 frag_color;
void main() {
    frag_color = texture(u_texture, v_uv);
}
"
            }
            Self::Es100 => {
                "#version 100
precision mediump float;
uniform sampler2D u_texture;
varying vec2 v_uv;
void main() {
    gl_FragColor = texture2D(u_texture, v_uv);
}
"
            }
            Self::Legacy120 => {
                "#version 120
uniform sampler2D u_texture;
varying vec2 v_uv;
void main() {
    gl_FragColor = texture2D(u_texture, v_uv);
}
"
            }
        }
    }
}
