use std::ffi::CString;
use std::fmt;
use std::fs;
use std::path::Path;
use fxhash::FxHashMap;
use gl::types::*;
use glam::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};
use derive_more::From;
use crate::{RenderError, RenderResult};
use super::state::check_gl;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Geometry,
    Compute,
}

impl ShaderStage {
    fn gl(self) -> GLenum {
        match self {
            Self::Vertex => gl::VERTEX_SHADER,
            Self::Fragment => gl::FRAGMENT_SHADER,
            Self::Geometry => gl::GEOMETRY_SHADER,
            Self::Compute => gl::COMPUTE_SHADER,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
            Self::Geometry => "geometry",
            Self::Compute => "compute",
        }
    }
}

/// Declared GLSL type of a uniform or block variable.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum GlslType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    IVec2,
    IVec3,
    IVec4,
    UInt,
    Bool,
    Mat2,
    Mat3,
    Mat4,
    Sampler2D,
    Sampler2DShadow,
    SamplerCube,
    Unknown(u32),
}

impl GlslType {
    pub fn from_gl(raw: GLenum) -> Self {
        match raw {
            gl::FLOAT => Self::Float,
            gl::FLOAT_VEC2 => Self::Vec2,
            gl::FLOAT_VEC3 => Self::Vec3,
            gl::FLOAT_VEC4 => Self::Vec4,
            gl::INT => Self::Int,
            gl::INT_VEC2 => Self::IVec2,
            gl::INT_VEC3 => Self::IVec3,
            gl::INT_VEC4 => Self::IVec4,
            gl::UNSIGNED_INT => Self::UInt,
            gl::BOOL => Self::Bool,
            gl::FLOAT_MAT2 => Self::Mat2,
            gl::FLOAT_MAT3 => Self::Mat3,
            gl::FLOAT_MAT4 => Self::Mat4,
            gl::SAMPLER_2D => Self::Sampler2D,
            gl::SAMPLER_2D_SHADOW => Self::Sampler2DShadow,
            gl::SAMPLER_CUBE => Self::SamplerCube,
            other => Self::Unknown(other),
        }
    }

    pub fn is_sampler(self) -> bool {
        matches!(self, Self::Sampler2D | Self::Sampler2DShadow | Self::SamplerCube)
    }
}

impl fmt::Display for GlslType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Float => "float",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Int => "int",
            Self::IVec2 => "ivec2",
            Self::IVec3 => "ivec3",
            Self::IVec4 => "ivec4",
            Self::UInt => "uint",
            Self::Bool => "bool",
            Self::Mat2 => "mat2",
            Self::Mat3 => "mat3",
            Self::Mat4 => "mat4",
            Self::Sampler2D => "sampler2D",
            Self::Sampler2DShadow => "sampler2DShadow",
            Self::SamplerCube => "samplerCube",
            Self::Unknown(raw) => return write!(f, "unknown({raw:#06x})"),
        };
        f.write_str(name)
    }
}

/// A runtime value for a loose uniform.
#[derive(Copy, Clone, PartialEq, From, Debug)]
pub enum UniformValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Int(i32),
    UInt(u32),
    Bool(bool),
    Mat2(Mat2),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl UniformValue {

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Float(_) => "f32",
            Self::Vec2(_) => "Vec2",
            Self::Vec3(_) => "Vec3",
            Self::Vec4(_) => "Vec4",
            Self::Int(_) => "i32",
            Self::UInt(_) => "u32",
            Self::Bool(_) => "bool",
            Self::Mat2(_) => "Mat2",
            Self::Mat3(_) => "Mat3",
            Self::Mat4(_) => "Mat4",
        }
    }

    /// Whether this value may be uploaded to a uniform of the declared type.
    /// Samplers are integer unit indices at the API level.
    pub fn matches(&self, declared: GlslType) -> bool {
        match (self, declared) {
            (Self::Float(_), GlslType::Float) => true,
            (Self::Vec2(_), GlslType::Vec2) => true,
            (Self::Vec3(_), GlslType::Vec3) => true,
            (Self::Vec4(_), GlslType::Vec4) => true,
            (Self::Int(_), GlslType::Int | GlslType::Bool) => true,
            (Self::Int(_), ty) if ty.is_sampler() => true,
            (Self::UInt(_), GlslType::UInt) => true,
            (Self::Bool(_), GlslType::Bool | GlslType::Int) => true,
            (Self::Mat2(_), GlslType::Mat2) => true,
            (Self::Mat3(_), GlslType::Mat3) => true,
            (Self::Mat4(_), GlslType::Mat4) => true,
            _ => false,
        }
    }
}

/// An active uniform living outside any interface block.
#[derive(Clone, Debug)]
pub struct LooseUniform {
    pub name: String,
    pub ty: GlslType,
    pub array_len: i32,
    pub location: GLint,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BlockFlavor {
    Uniform,
    Storage,
}

impl BlockFlavor {
    pub fn name(self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::Storage => "shader-storage",
        }
    }
}

/// One named variable inside an interface block, with its full memory layout.
#[derive(Clone, PartialEq, Debug)]
pub struct BlockVariable {
    pub name: String,
    pub ty: GlslType,
    pub offset: i32,
    pub array_len: i32,
    pub array_stride: i32,
    pub matrix_stride: i32,
    pub row_major: bool,
    /// Shader-storage only: length of the top-level array (0 = unbounded).
    pub top_level_len: i32,
    /// Shader-storage only: stride of the top-level array.
    pub top_level_stride: i32,
}

impl BlockVariable {
    /// Layout equality: everything except the storage-only top-level fields.
    pub fn layout_eq(&self, other: &BlockVariable) -> bool {
        self.name == other.name
            && self.ty == other.ty
            && self.offset == other.offset
            && self.array_stride == other.array_stride
            && self.matrix_stride == other.matrix_stride
            && self.row_major == other.row_major
    }
}

/// A uniform or shader-storage block as introspected from a linked program.
#[derive(Clone, Debug)]
pub struct InterfaceBlock {
    pub name: String,
    pub flavor: BlockFlavor,
    pub byte_size: usize,
    pub variables: Vec<BlockVariable>,
    pub(crate) resource_index: u32,
    pub(crate) binding: Option<u32>,
}

impl InterfaceBlock {
    /// Two blocks are layout-identical iff names match and variable lists are
    /// equal element-wise.
    pub fn layout_matches(&self, other: &InterfaceBlock) -> bool {
        self.name == other.name
            && self.variables.len() == other.variables.len()
            && self
                .variables
                .iter()
                .zip(&other.variables)
                .all(|(a, b)| a.layout_eq(b))
    }
}

/// Stage sources as resolved from disk.
#[derive(Clone, Default, Debug)]
pub struct ShaderSources {
    pub vertex: Option<String>,
    pub fragment: Option<String>,
    pub geometry: Option<String>,
    pub compute: Option<String>,
}

impl ShaderSources {

    /// Resolves `<dir>/<name>.comp`, or `<dir>/<name>.vert` + `.frag`
    /// with an optional `.geom`.
    pub fn load(dir: &Path, name: &str) -> RenderResult<Self> {
        let comp = dir.join(format!("{name}.comp"));
        if comp.exists() {
            return Ok(Self {
                compute: Some(fs::read_to_string(comp)?),
                ..Default::default()
            });
        }
        let vert = dir.join(format!("{name}.vert"));
        let frag = dir.join(format!("{name}.frag"));
        if !vert.exists() {
            return Err(RenderError::MissingStage { name: name.into(), stage: "vertex" });
        }
        if !frag.exists() {
            return Err(RenderError::MissingStage { name: name.into(), stage: "fragment" });
        }
        let geom = dir.join(format!("{name}.geom"));
        Ok(Self {
            vertex: Some(fs::read_to_string(vert)?),
            fragment: Some(fs::read_to_string(frag)?),
            geometry: if geom.exists() { Some(fs::read_to_string(geom)?) } else { None },
            compute: None,
        })
    }
}

/**
 * A linked shader program and its introspected interface.
 *
 * After construction the uniform and block tables are read-only; binding
 * points are the only mutable piece of state. The program handle is released
 * on drop.
 */
#[derive(Debug)]
pub struct Program {
    name: String,
    handle: GLuint,
    is_compute: bool,
    uniforms: FxHashMap<String, LooseUniform>,
    uniform_blocks: FxHashMap<String, InterfaceBlock>,
    storage_blocks: FxHashMap<String, InterfaceBlock>,
}

impl Program {

    /// Loads and links the program `<shader_dir>/<name>.*`.
    pub fn load(shader_dir: &Path, name: &str) -> RenderResult<Self> {
        let sources = ShaderSources::load(shader_dir, name)?;
        Self::from_sources(name, &sources)
    }

    pub fn from_sources(name: &str, sources: &ShaderSources) -> RenderResult<Self> {
        let is_compute = sources.compute.is_some();
        let mut stages = Vec::new();
        let mut compile = |stage: ShaderStage, source: &Option<String>| -> RenderResult<()> {
            if let Some(source) = source {
                stages.push(compile_stage(name, stage, source)?);
            }
            Ok(())
        };
        compile(ShaderStage::Vertex, &sources.vertex)?;
        compile(ShaderStage::Fragment, &sources.fragment)?;
        compile(ShaderStage::Geometry, &sources.geometry)?;
        compile(ShaderStage::Compute, &sources.compute)?;

        let handle = unsafe { gl::CreateProgram() };
        for stage in &stages {
            unsafe { gl::AttachShader(handle, *stage) }
        }
        unsafe { gl::LinkProgram(handle) }
        let mut status = 0;
        unsafe { gl::GetProgramiv(handle, gl::LINK_STATUS, &mut status) }
        for stage in &stages {
            unsafe {
                gl::DetachShader(handle, *stage);
                gl::DeleteShader(*stage);
            }
        }
        if status == 0 {
            let log = program_info_log(handle);
            unsafe { gl::DeleteProgram(handle) }
            return Err(RenderError::ShaderLink { name: name.into(), log });
        }
        check_gl("link program");

        let uniforms = introspect_loose_uniforms(handle);
        let uniform_blocks = introspect_blocks(handle, BlockFlavor::Uniform);
        let storage_blocks = introspect_blocks(handle, BlockFlavor::Storage);
        log::debug!(
            "Linked program '{name}': {} uniforms, {} uniform blocks, {} storage blocks",
            uniforms.len(),
            uniform_blocks.len(),
            storage_blocks.len(),
        );

        Ok(Self {
            name: name.into(),
            handle,
            is_compute,
            uniforms,
            uniform_blocks,
            storage_blocks,
        })
    }

    /// Uploads a loose uniform after checking name and declared type.
    pub fn set_uniform(&self, name: &str, value: UniformValue) -> RenderResult<()> {
        let uniform = self.uniforms.get(name).ok_or_else(|| RenderError::UnknownUniform {
            program: self.name.clone(),
            name: name.into(),
        })?;
        if !value.matches(uniform.ty) {
            return Err(RenderError::TypeMismatch {
                name: name.into(),
                declared: uniform.ty.to_string(),
                provided: value.kind(),
            });
        }
        let loc = uniform.location;
        unsafe {
            match value {
                UniformValue::Float(v) => gl::ProgramUniform1f(self.handle, loc, v),
                UniformValue::Vec2(v) => {
                    gl::ProgramUniform2fv(self.handle, loc, 1, v.to_array().as_ptr())
                }
                UniformValue::Vec3(v) => {
                    gl::ProgramUniform3fv(self.handle, loc, 1, v.to_array().as_ptr())
                }
                UniformValue::Vec4(v) => {
                    gl::ProgramUniform4fv(self.handle, loc, 1, v.to_array().as_ptr())
                }
                UniformValue::Int(v) => gl::ProgramUniform1i(self.handle, loc, v),
                UniformValue::UInt(v) => gl::ProgramUniform1ui(self.handle, loc, v),
                UniformValue::Bool(v) => gl::ProgramUniform1i(self.handle, loc, v as i32),
                UniformValue::Mat2(m) => gl::ProgramUniformMatrix2fv(
                    self.handle, loc, 1, gl::FALSE, m.to_cols_array().as_ptr(),
                ),
                UniformValue::Mat3(m) => gl::ProgramUniformMatrix3fv(
                    self.handle, loc, 1, gl::FALSE, m.to_cols_array().as_ptr(),
                ),
                UniformValue::Mat4(m) => gl::ProgramUniformMatrix4fv(
                    self.handle, loc, 1, gl::FALSE, m.to_cols_array().as_ptr(),
                ),
            }
        }
        check_gl("ProgramUniform");
        Ok(())
    }

    /// Points a 2D sampler uniform at a texture unit. The caller binds the
    /// actual texture to that unit through the state mirror.
    pub fn bind_sampler_2d(&self, name: &str, unit: u32) -> RenderResult<()> {
        let uniform = self.uniforms.get(name).ok_or_else(|| RenderError::UnknownUniform {
            program: self.name.clone(),
            name: name.into(),
        })?;
        if !uniform.ty.is_sampler() {
            return Err(RenderError::TypeMismatch {
                name: name.into(),
                declared: uniform.ty.to_string(),
                provided: "texture unit",
            });
        }
        unsafe { gl::ProgramUniform1i(self.handle, uniform.location, unit as i32) }
        check_gl("bind_sampler_2d");
        Ok(())
    }

    pub fn bind_uniform_block(&mut self, name: &str, point: u32) -> RenderResult<()> {
        let handle = self.handle;
        let block = Self::block_mut(&mut self.uniform_blocks, &self.name, name)?;
        if block.binding != Some(point) {
            unsafe { gl::UniformBlockBinding(handle, block.resource_index, point) }
            check_gl("UniformBlockBinding");
            block.binding = Some(point);
        }
        Ok(())
    }

    pub fn bind_shader_storage_block(&mut self, name: &str, point: u32) -> RenderResult<()> {
        let handle = self.handle;
        let block = Self::block_mut(&mut self.storage_blocks, &self.name, name)?;
        if block.binding != Some(point) {
            unsafe { gl::ShaderStorageBlockBinding(handle, block.resource_index, point) }
            check_gl("ShaderStorageBlockBinding");
            block.binding = Some(point);
        }
        Ok(())
    }

    fn block_mut<'a>(
        blocks: &'a mut FxHashMap<String, InterfaceBlock>,
        program: &str,
        name: &str,
    ) -> RenderResult<&'a mut InterfaceBlock> {
        blocks.get_mut(name).ok_or_else(|| RenderError::UnknownUniform {
            program: program.into(),
            name: name.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_compute(&self) -> bool {
        self.is_compute
    }

    pub fn uniform(&self, name: &str) -> Option<&LooseUniform> {
        self.uniforms.get(name)
    }

    pub fn uniform_block(&self, name: &str) -> Option<&InterfaceBlock> {
        self.uniform_blocks.get(name)
    }

    pub fn storage_block(&self, name: &str) -> Option<&InterfaceBlock> {
        self.storage_blocks.get(name)
    }

    pub(crate) fn raw(&self) -> GLuint {
        self.handle
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        if self.handle != 0 {
            unsafe { gl::DeleteProgram(self.handle) }
            self.handle = 0;
        }
    }
}

fn compile_stage(name: &str, stage: ShaderStage, source: &str) -> RenderResult<GLuint> {
    let c_source = CString::new(source).map_err(|_| RenderError::ShaderCompile {
        name: name.into(),
        stage: stage.name(),
        log: "source contains an interior NUL byte".into(),
    })?;
    unsafe {
        let shader = gl::CreateShader(stage.gl());
        gl::ShaderSource(shader, 1, &c_source.as_ptr(), std::ptr::null());
        gl::CompileShader(shader);
        let mut status = 0;
        gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status);
        if status == 0 {
            let log = shader_info_log(shader);
            gl::DeleteShader(shader);
            let excerpt: String = source.lines().take(8).collect::<Vec<_>>().join("\n");
            log::error!("{} stage of '{name}' failed to compile:\n{log}\n--- source ---\n{excerpt}", stage.name());
            return Err(RenderError::ShaderCompile {
                name: name.into(),
                stage: stage.name(),
                log,
            });
        }
        Ok(shader)
    }
}

fn shader_info_log(shader: GLuint) -> String {
    let mut len = 0;
    unsafe { gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len) }
    let mut buf = vec![0u8; len.max(1) as usize];
    let mut written = 0;
    unsafe {
        gl::GetShaderInfoLog(shader, buf.len() as GLsizei, &mut written, buf.as_mut_ptr() as *mut GLchar)
    }
    String::from_utf8_lossy(&buf[..written.max(0) as usize]).into_owned()
}

fn program_info_log(program: GLuint) -> String {
    let mut len = 0;
    unsafe { gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len) }
    let mut buf = vec![0u8; len.max(1) as usize];
    let mut written = 0;
    unsafe {
        gl::GetProgramInfoLog(program, buf.len() as GLsizei, &mut written, buf.as_mut_ptr() as *mut GLchar)
    }
    String::from_utf8_lossy(&buf[..written.max(0) as usize]).into_owned()
}

fn interface_count(program: GLuint, interface: GLenum) -> u32 {
    let mut count = 0;
    unsafe { gl::GetProgramInterfaceiv(program, interface, gl::ACTIVE_RESOURCES, &mut count) }
    count.max(0) as u32
}

fn resource_props(program: GLuint, interface: GLenum, index: u32, props: &[GLenum]) -> Vec<GLint> {
    let mut out = vec![0; props.len()];
    let mut written = 0;
    unsafe {
        gl::GetProgramResourceiv(
            program,
            interface,
            index,
            props.len() as GLsizei,
            props.as_ptr(),
            out.len() as GLsizei,
            &mut written,
            out.as_mut_ptr(),
        );
    }
    out
}

fn resource_name(program: GLuint, interface: GLenum, index: u32) -> String {
    let len = resource_props(program, interface, index, &[gl::NAME_LENGTH])[0];
    let mut buf = vec![0u8; len.max(1) as usize];
    let mut written = 0;
    unsafe {
        gl::GetProgramResourceName(
            program,
            interface,
            index,
            buf.len() as GLsizei,
            &mut written,
            buf.as_mut_ptr() as *mut GLchar,
        );
    }
    let mut name = String::from_utf8_lossy(&buf[..written.max(0) as usize]).into_owned();
    // Arrays introspect as "name[0]".
    if let Some(stripped) = name.strip_suffix("[0]") {
        name = stripped.to_owned();
    }
    name
}

/// Every active uniform whose block index is -1.
fn introspect_loose_uniforms(program: GLuint) -> FxHashMap<String, LooseUniform> {
    let mut uniforms = FxHashMap::default();
    for index in 0..interface_count(program, gl::UNIFORM) {
        let props = resource_props(
            program,
            gl::UNIFORM,
            index,
            &[gl::BLOCK_INDEX, gl::TYPE, gl::ARRAY_SIZE, gl::LOCATION],
        );
        if props[0] != -1 {
            continue;
        }
        let name = resource_name(program, gl::UNIFORM, index);
        if name.starts_with("gl_") {
            continue;
        }
        uniforms.insert(name.clone(), LooseUniform {
            name,
            ty: GlslType::from_gl(props[1] as GLenum),
            array_len: props[2],
            location: props[3],
        });
    }
    uniforms
}

fn introspect_blocks(program: GLuint, flavor: BlockFlavor) -> FxHashMap<String, InterfaceBlock> {
    let (block_interface, var_interface) = match flavor {
        BlockFlavor::Uniform => (gl::UNIFORM_BLOCK, gl::UNIFORM),
        BlockFlavor::Storage => (gl::SHADER_STORAGE_BLOCK, gl::BUFFER_VARIABLE),
    };
    let mut blocks = FxHashMap::default();
    for index in 0..interface_count(program, block_interface) {
        let props = resource_props(program, block_interface, index, &[gl::BUFFER_DATA_SIZE]);
        let name = resource_name(program, block_interface, index);
        let variables = introspect_block_variables(program, var_interface, index, flavor);
        blocks.insert(name.clone(), InterfaceBlock {
            name,
            flavor,
            byte_size: props[0].max(0) as usize,
            variables,
            resource_index: index,
            binding: None,
        });
    }
    blocks
}

fn introspect_block_variables(
    program: GLuint,
    var_interface: GLenum,
    block_index: u32,
    flavor: BlockFlavor,
) -> Vec<BlockVariable> {
    let mut variables = Vec::new();
    for index in 0..interface_count(program, var_interface) {
        let mut props = vec![
            gl::BLOCK_INDEX,
            gl::TYPE,
            gl::OFFSET,
            gl::ARRAY_SIZE,
            gl::ARRAY_STRIDE,
            gl::MATRIX_STRIDE,
            gl::IS_ROW_MAJOR,
        ];
        if flavor == BlockFlavor::Storage {
            props.push(gl::TOP_LEVEL_ARRAY_SIZE);
            props.push(gl::TOP_LEVEL_ARRAY_STRIDE);
        }
        let values = resource_props(program, var_interface, index, &props);
        if values[0] != block_index as GLint {
            continue;
        }
        let (top_level_len, top_level_stride) = if flavor == BlockFlavor::Storage {
            (values[7], values[8])
        } else {
            (0, 0)
        };
        variables.push(BlockVariable {
            name: resource_name(program, var_interface, index),
            ty: GlslType::from_gl(values[1] as GLenum),
            offset: values[2],
            array_len: values[3],
            array_stride: values[4],
            matrix_stride: values[5],
            row_major: values[6] != 0,
            top_level_len,
            top_level_stride,
        });
    }
    // Deterministic order for layout comparison.
    variables.sort_by_key(|v| v.offset);
    variables
}

#[cfg(test)]
mod test {

    use glam::{Mat4, Vec3};
    use super::{BlockFlavor, BlockVariable, GlslType, InterfaceBlock, UniformValue};

    fn var(name: &str, ty: GlslType, offset: i32) -> BlockVariable {
        BlockVariable {
            name: name.into(),
            ty,
            offset,
            array_len: 1,
            array_stride: 0,
            matrix_stride: 0,
            row_major: false,
            top_level_len: 0,
            top_level_stride: 0,
        }
    }

    fn block(name: &str, vars: Vec<BlockVariable>) -> InterfaceBlock {
        InterfaceBlock {
            name: name.into(),
            flavor: BlockFlavor::Uniform,
            byte_size: 64,
            variables: vars,
            resource_index: 0,
            binding: None,
        }
    }

    #[test]
    fn value_type_checks() {
        assert!(UniformValue::from(1.0f32).matches(GlslType::Float));
        assert!(UniformValue::from(Vec3::ONE).matches(GlslType::Vec3));
        assert!(UniformValue::from(Mat4::IDENTITY).matches(GlslType::Mat4));
        assert!(UniformValue::from(3i32).matches(GlslType::Sampler2D));
        assert!(!UniformValue::from(Vec3::ONE).matches(GlslType::Vec4));
        assert!(!UniformValue::from(1.0f32).matches(GlslType::Int));
    }

    #[test]
    fn identical_layouts_match() {
        let a = block("Foo", vec![var("x", GlslType::Vec4, 0), var("y", GlslType::Mat4, 16)]);
        let b = block("Foo", vec![var("x", GlslType::Vec4, 0), var("y", GlslType::Mat4, 16)]);
        assert!(a.layout_matches(&b));
    }

    #[test]
    fn stripped_variable_is_a_mismatch() {
        let a = block("Foo", vec![var("x", GlslType::Vec4, 0), var("y", GlslType::Mat4, 16)]);
        let b = block("Foo", vec![var("x", GlslType::Vec4, 0)]);
        assert!(!a.layout_matches(&b));
    }

    #[test]
    fn reordered_offsets_are_a_mismatch() {
        let a = block("Foo", vec![var("x", GlslType::Vec4, 0), var("y", GlslType::Vec4, 16)]);
        let b = block("Foo", vec![var("y", GlslType::Vec4, 0), var("x", GlslType::Vec4, 16)]);
        assert!(!a.layout_matches(&b));
    }
}
