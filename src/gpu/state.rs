use bitflags::bitflags;
use gl::types::*;
use crate::Color;

/// Depth comparison function.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CompareFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

impl CompareFunc {
    fn gl(self) -> GLenum {
        match self {
            Self::Never => gl::NEVER,
            Self::Less => gl::LESS,
            Self::Equal => gl::EQUAL,
            Self::LessEqual => gl::LEQUAL,
            Self::Greater => gl::GREATER,
            Self::NotEqual => gl::NOTEQUAL,
            Self::GreaterEqual => gl::GEQUAL,
            Self::Always => gl::ALWAYS,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    SrcColor,
    DstColor,
}

impl BlendFactor {
    fn gl(self) -> GLenum {
        match self {
            Self::Zero => gl::ZERO,
            Self::One => gl::ONE,
            Self::SrcAlpha => gl::SRC_ALPHA,
            Self::OneMinusSrcAlpha => gl::ONE_MINUS_SRC_ALPHA,
            Self::DstAlpha => gl::DST_ALPHA,
            Self::OneMinusDstAlpha => gl::ONE_MINUS_DST_ALPHA,
            Self::SrcColor => gl::SRC_COLOR,
            Self::DstColor => gl::DST_COLOR,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CullFace {
    Front,
    Back,
}

impl CullFace {
    fn gl(self) -> GLenum {
        match self {
            Self::Front => gl::FRONT,
            Self::Back => gl::BACK,
        }
    }
}

/// Front-face winding order.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Winding {
    Ccw,
    Cw,
}

impl Winding {
    fn gl(self) -> GLenum {
        match self {
            Self::Ccw => gl::CCW,
            Self::Cw => gl::CW,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PolygonMode {
    Fill,
    Line,
    Point,
}

impl PolygonMode {
    fn gl(self) -> GLenum {
        match self {
            Self::Fill => gl::FILL,
            Self::Line => gl::LINE,
            Self::Point => gl::POINT,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub fn with_size(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width: width as i32, height: height as i32 }
    }
}

bitflags! {
    /// Which attachment planes a clear touches.
    #[derive(Copy, Clone, Eq, PartialEq, Debug)]
    pub struct ClearMask: u32 {
        const COLOR     = gl::COLOR_BUFFER_BIT;
        const DEPTH     = gl::DEPTH_BUFFER_BIT;
        const STENCIL   = gl::STENCIL_BUFFER_BIT;
    }
}

/// One indexed buffer-range binding (uniform or shader-storage).
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
struct RangeBinding {
    buffer: GLuint,
    offset: GLintptr,
    size: GLsizeiptr,
}

/// Texture units tracked by the mirror.
pub const MAX_TEXTURE_UNITS: usize = 16;

/// Indexed buffer binding points tracked by the mirror.
pub const MAX_BUFFER_BINDINGS: usize = 16;

/**
 * Mirror of the last-known GL pipeline state.
 *
 * Every setter compares the incoming value against the cached one and issues
 * the underlying call only on change; redundant state changes dominate CPU
 * cost in naive renderers. There is exactly one of these per context, owned
 * by [`GraphicsState`](crate::GraphicsState), and it is only valid while that
 * context is current.
 */
#[derive(Debug)]
pub struct GlState {
    depth_test: bool,
    depth_func: CompareFunc,
    depth_write: bool,
    blend: bool,
    blend_factors: (BlendFactor, BlendFactor),
    cull: bool,
    cull_face: CullFace,
    winding: Winding,
    polygon_mode: PolygonMode,
    polygon_offset: bool,
    polygon_offset_values: (f32, f32),
    clear_color: Color,
    viewport: Viewport,
    program: GLuint,
    vao: GLuint,
    fbo: GLuint,
    textures: [GLuint; MAX_TEXTURE_UNITS],
    uniform_ranges: [RangeBinding; MAX_BUFFER_BINDINGS],
    storage_ranges: [RangeBinding; MAX_BUFFER_BINDINGS],
}

/// Panics if the driver raised an error; the mirror would no longer reflect
/// reality, so continuing is never sound. Compiled out of release builds.
#[inline]
pub(crate) fn check_gl(call: &str) {
    #[cfg(debug_assertions)]
    {
        let err = unsafe { gl::GetError() };
        if err != gl::NO_ERROR {
            panic!("GL error {err:#06x} after {call}");
        }
    }
    #[cfg(not(debug_assertions))]
    let _ = call;
}

impl GlState {

    /// Forces the entire pipeline to known defaults.
    /// The GL context must be current and function pointers loaded.
    pub fn new() -> Self {
        let state = Self {
            depth_test: false,
            depth_func: CompareFunc::Less,
            depth_write: true,
            blend: false,
            blend_factors: (BlendFactor::One, BlendFactor::Zero),
            cull: false,
            cull_face: CullFace::Back,
            winding: Winding::Ccw,
            polygon_mode: PolygonMode::Fill,
            polygon_offset: false,
            polygon_offset_values: (0.0, 0.0),
            clear_color: Color::BLACK,
            viewport: Viewport::default(),
            program: 0,
            vao: 0,
            fbo: 0,
            textures: [0; MAX_TEXTURE_UNITS],
            uniform_ranges: [RangeBinding::default(); MAX_BUFFER_BINDINGS],
            storage_ranges: [RangeBinding::default(); MAX_BUFFER_BINDINGS],
        };
        unsafe {
            gl::Disable(gl::DEPTH_TEST);
            gl::DepthFunc(gl::LESS);
            gl::DepthMask(gl::TRUE);
            gl::Disable(gl::BLEND);
            gl::BlendFunc(gl::ONE, gl::ZERO);
            gl::Disable(gl::CULL_FACE);
            gl::CullFace(gl::BACK);
            gl::FrontFace(gl::CCW);
            gl::PolygonMode(gl::FRONT_AND_BACK, gl::FILL);
            gl::Disable(gl::POLYGON_OFFSET_FILL);
            gl::PolygonOffset(0.0, 0.0);
            gl::ClearColor(0.0, 0.0, 0.0, 1.0);
            gl::UseProgram(0);
            gl::BindVertexArray(0);
            gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
            // Projections emit 0..1 clip-space depth; make the rasterizer
            // clip and store that range directly.
            gl::ClipControl(gl::LOWER_LEFT, gl::ZERO_TO_ONE);
        }
        check_gl("state defaults");
        state
    }

    pub fn set_depth_test(&mut self, enabled: bool) {
        if self.depth_test != enabled {
            self.depth_test = enabled;
            unsafe {
                if enabled { gl::Enable(gl::DEPTH_TEST) } else { gl::Disable(gl::DEPTH_TEST) }
            }
            check_gl("set_depth_test");
        }
    }

    pub fn set_depth_test_function(&mut self, func: CompareFunc) {
        if self.depth_func != func {
            self.depth_func = func;
            unsafe { gl::DepthFunc(func.gl()) }
            check_gl("set_depth_test_function");
        }
    }

    pub fn set_depth_write(&mut self, enabled: bool) {
        if self.depth_write != enabled {
            self.depth_write = enabled;
            unsafe { gl::DepthMask(enabled as GLboolean) }
            check_gl("set_depth_write");
        }
    }

    pub fn set_blend(&mut self, enabled: bool) {
        if self.blend != enabled {
            self.blend = enabled;
            unsafe {
                if enabled { gl::Enable(gl::BLEND) } else { gl::Disable(gl::BLEND) }
            }
            check_gl("set_blend");
        }
    }

    pub fn set_blend_factors(&mut self, src: BlendFactor, dst: BlendFactor) {
        if self.blend_factors != (src, dst) {
            self.blend_factors = (src, dst);
            unsafe { gl::BlendFunc(src.gl(), dst.gl()) }
            check_gl("set_blend_factors");
        }
    }

    pub fn set_cull(&mut self, enabled: bool) {
        if self.cull != enabled {
            self.cull = enabled;
            unsafe {
                if enabled { gl::Enable(gl::CULL_FACE) } else { gl::Disable(gl::CULL_FACE) }
            }
            check_gl("set_cull");
        }
    }

    pub fn set_cull_face(&mut self, face: CullFace) {
        if self.cull_face != face {
            self.cull_face = face;
            unsafe { gl::CullFace(face.gl()) }
            check_gl("set_cull_face");
        }
    }

    pub fn set_winding(&mut self, winding: Winding) {
        if self.winding != winding {
            self.winding = winding;
            unsafe { gl::FrontFace(winding.gl()) }
            check_gl("set_winding");
        }
    }

    pub fn set_polygon_mode(&mut self, mode: PolygonMode) {
        if self.polygon_mode != mode {
            self.polygon_mode = mode;
            unsafe { gl::PolygonMode(gl::FRONT_AND_BACK, mode.gl()) }
            check_gl("set_polygon_mode");
        }
    }

    pub fn set_polygon_offset(&mut self, enabled: bool) {
        if self.polygon_offset != enabled {
            self.polygon_offset = enabled;
            unsafe {
                if enabled {
                    gl::Enable(gl::POLYGON_OFFSET_FILL)
                } else {
                    gl::Disable(gl::POLYGON_OFFSET_FILL)
                }
            }
            check_gl("set_polygon_offset");
        }
    }

    pub fn set_polygon_offset_values(&mut self, factor: f32, units: f32) {
        if self.polygon_offset_values != (factor, units) {
            self.polygon_offset_values = (factor, units);
            unsafe { gl::PolygonOffset(factor, units) }
            check_gl("set_polygon_offset_values");
        }
    }

    pub fn set_clear_color(&mut self, color: Color) {
        if self.clear_color != color {
            self.clear_color = color;
            unsafe { gl::ClearColor(color.r, color.g, color.b, color.a) }
            check_gl("set_clear_color");
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        if self.viewport != viewport {
            self.viewport = viewport;
            unsafe { gl::Viewport(viewport.x, viewport.y, viewport.width, viewport.height) }
            check_gl("set_viewport");
        }
    }

    pub(crate) fn use_program(&mut self, program: GLuint) {
        if self.program != program {
            self.program = program;
            unsafe { gl::UseProgram(program) }
            check_gl("use_program");
        }
    }

    pub(crate) fn bind_vao(&mut self, vao: GLuint) {
        if self.vao != vao {
            self.vao = vao;
            unsafe { gl::BindVertexArray(vao) }
            check_gl("bind_vao");
        }
    }

    pub(crate) fn bind_fbo(&mut self, fbo: GLuint) {
        if self.fbo != fbo {
            self.fbo = fbo;
            unsafe { gl::BindFramebuffer(gl::FRAMEBUFFER, fbo) }
            check_gl("bind_fbo");
        }
    }

    pub(crate) fn bind_texture_unit(&mut self, unit: u32, texture: GLuint) {
        let slot = unit as usize;
        assert!(slot < MAX_TEXTURE_UNITS, "texture unit {unit} out of range");
        if self.textures[slot] != texture {
            self.textures[slot] = texture;
            unsafe { gl::BindTextureUnit(unit, texture) }
            check_gl("bind_texture_unit");
        }
    }

    pub(crate) fn bind_uniform_buffer_range(
        &mut self,
        index: u32,
        buffer: GLuint,
        offset: isize,
        size: isize,
    ) {
        let binding = RangeBinding { buffer, offset, size };
        let slot = index as usize;
        assert!(slot < MAX_BUFFER_BINDINGS, "uniform binding {index} out of range");
        if self.uniform_ranges[slot] != binding {
            self.uniform_ranges[slot] = binding;
            unsafe { gl::BindBufferRange(gl::UNIFORM_BUFFER, index, buffer, offset, size) }
            check_gl("bind_uniform_buffer_range");
        }
    }

    pub(crate) fn bind_shader_storage_buffer_range(
        &mut self,
        index: u32,
        buffer: GLuint,
        offset: isize,
        size: isize,
    ) {
        let binding = RangeBinding { buffer, offset, size };
        let slot = index as usize;
        assert!(slot < MAX_BUFFER_BINDINGS, "storage binding {index} out of range");
        if self.storage_ranges[slot] != binding {
            self.storage_ranges[slot] = binding;
            unsafe { gl::BindBufferRange(gl::SHADER_STORAGE_BUFFER, index, buffer, offset, size) }
            check_gl("bind_shader_storage_buffer_range");
        }
    }

    /// Clears the currently bound framebuffer.
    pub fn clear(&mut self, mask: ClearMask) {
        unsafe { gl::Clear(mask.bits()) }
        check_gl("clear");
    }

    /// A deleted object's cached bindings must be forgotten, otherwise a new
    /// object reusing the same name would be skipped as redundant.
    pub(crate) fn forget_buffer(&mut self, buffer: GLuint) {
        for range in self.uniform_ranges.iter_mut().chain(self.storage_ranges.iter_mut()) {
            if range.buffer == buffer {
                *range = RangeBinding::default();
            }
        }
    }

    pub(crate) fn forget_texture(&mut self, texture: GLuint) {
        for bound in self.textures.iter_mut() {
            if *bound == texture {
                *bound = 0;
            }
        }
    }

    pub(crate) fn forget_program(&mut self, program: GLuint) {
        if self.program == program {
            self.program = 0;
        }
    }

    pub(crate) fn forget_vao(&mut self, vao: GLuint) {
        if self.vao == vao {
            self.vao = 0;
        }
    }

    pub(crate) fn forget_fbo(&mut self, fbo: GLuint) {
        if self.fbo == fbo {
            self.fbo = 0;
        }
    }
}
