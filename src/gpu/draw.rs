use gl::types::*;
use smallvec::SmallVec;
use crate::{RenderError, RenderResult};
use super::buffer::Buffer;
use super::context::{DrawLimits, GraphicsState, NAME_CAP};
use super::framebuffer::Framebuffer;
use super::shader::{Program, UniformValue};
use super::state::{
    check_gl, BlendFactor, CompareFunc, CullFace, PolygonMode, Viewport, Winding,
};
use super::texture::Texture;
use super::vao::Vao;

/// Fixed-function state written for one draw.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct PipelineState {
    pub depth_write: bool,
    pub depth_test: Option<CompareFunc>,
    pub polygon_offset: Option<(f32, f32)>,
    pub blend: Option<(BlendFactor, BlendFactor)>,
    pub cull: Option<(CullFace, Winding)>,
    pub polygon_mode: PolygonMode,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            depth_write: true,
            depth_test: Some(CompareFunc::Less),
            polygon_offset: None,
            blend: None,
            cull: Some((CullFace::Back, Winding::Ccw)),
            polygon_mode: PolygonMode::Fill,
        }
    }
}

/// Where a submission lands: an offscreen framebuffer, or the default
/// framebuffer with a caller-supplied viewport.
pub enum RenderTarget<'a> {
    Framebuffer(&'a mut Framebuffer),
    Default { viewport: Viewport },
}

#[derive(Clone, Debug)]
struct BufferBinding {
    name: String,
    buffer: GLuint,
    offset: isize,
    size: isize,
}

/**
 * Value record for one draw: uniform sets, sampler bindings, buffer-block
 * bindings and pipeline state, resolved into a single submission against a
 * program + vertex source + target surface.
 *
 * Lists are bounded ([`DrawLimits`]); identifiers are capped at
 * [`NAME_CAP`] bytes and may appear at most once per list.
 */
#[derive(Clone, Debug, Default)]
pub struct DrawCall {
    uniforms: SmallVec<[(String, UniformValue); 8]>,
    textures: SmallVec<[(String, GLuint); 8]>,
    storage_blocks: SmallVec<[BufferBinding; 8]>,
    uniform_blocks: SmallVec<[BufferBinding; 8]>,
    pub pipeline: PipelineState,
    limits: DrawLimits,
}

impl DrawCall {

    pub fn new(limits: DrawLimits) -> Self {
        Self { limits, ..Default::default() }
    }

    pub fn with_pipeline(mut self, pipeline: PipelineState) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn set_uniform(
        &mut self,
        name: &str,
        value: impl Into<UniformValue>,
    ) -> RenderResult<&mut Self> {
        check_name(name)?;
        if self.uniforms.iter().any(|(n, _)| n == name) {
            return Err(RenderError::DuplicateBinding(name.into()));
        }
        if self.uniforms.len() >= self.limits.max_uniforms {
            return Err(RenderError::DrawCallFull {
                list: "uniform",
                capacity: self.limits.max_uniforms,
            });
        }
        self.uniforms.push((name.into(), value.into()));
        Ok(self)
    }

    pub fn set_texture(&mut self, name: &str, texture: &Texture) -> RenderResult<&mut Self> {
        check_name(name)?;
        if self.textures.iter().any(|(n, _)| n == name) {
            return Err(RenderError::DuplicateBinding(name.into()));
        }
        if self.textures.len() >= self.limits.max_textures {
            return Err(RenderError::DrawCallFull {
                list: "texture",
                capacity: self.limits.max_textures,
            });
        }
        self.textures.push((name.into(), texture.raw()));
        Ok(self)
    }

    pub fn set_storage_block(
        &mut self,
        name: &str,
        buffer: &Buffer,
        offset: usize,
        size: usize,
    ) -> RenderResult<&mut Self> {
        check_name(name)?;
        if self.storage_blocks.iter().any(|b| b.name == name) {
            return Err(RenderError::DuplicateBinding(name.into()));
        }
        if self.storage_blocks.len() >= self.limits.max_storage_blocks {
            return Err(RenderError::DrawCallFull {
                list: "storage block",
                capacity: self.limits.max_storage_blocks,
            });
        }
        self.storage_blocks.push(BufferBinding {
            name: name.into(),
            buffer: buffer.raw(),
            offset: offset as isize,
            size: size as isize,
        });
        Ok(self)
    }

    pub fn set_uniform_block(
        &mut self,
        name: &str,
        buffer: &Buffer,
        offset: usize,
        size: usize,
    ) -> RenderResult<&mut Self> {
        check_name(name)?;
        if self.uniform_blocks.iter().any(|b| b.name == name) {
            return Err(RenderError::DuplicateBinding(name.into()));
        }
        if self.uniform_blocks.len() >= self.limits.max_uniform_blocks {
            return Err(RenderError::DrawCallFull {
                list: "uniform block",
                capacity: self.limits.max_uniform_blocks,
            });
        }
        self.uniform_blocks.push(BufferBinding {
            name: name.into(),
            buffer: buffer.raw(),
            offset: offset as isize,
            size: size as isize,
        });
        Ok(self)
    }

    /// Submits one non-instanced draw.
    pub fn submit(
        &self,
        gpu: &mut GraphicsState,
        program: &mut Program,
        vao: &Vao,
        target: &mut RenderTarget,
    ) -> RenderResult<()> {
        self.submit_inner(gpu, program, vao, target, None)
    }

    /// Submits an instanced draw of `instances` copies.
    pub fn submit_instanced(
        &self,
        gpu: &mut GraphicsState,
        program: &mut Program,
        vao: &Vao,
        target: &mut RenderTarget,
        instances: u32,
    ) -> RenderResult<()> {
        self.submit_inner(gpu, program, vao, target, Some(instances))
    }

    fn submit_inner(
        &self,
        gpu: &mut GraphicsState,
        program: &mut Program,
        vao: &Vao,
        target: &mut RenderTarget,
        instances: Option<u32>,
    ) -> RenderResult<()> {
        if program.is_compute() {
            return Err(RenderError::NotRaster(program.name().into()));
        }
        if vao.draw_count() <= 0 {
            return Err(RenderError::EmptyDraw);
        }

        // 1. Target surface and viewport.
        match target {
            RenderTarget::Framebuffer(fbo) => {
                fbo.ensure_complete()?;
                gpu.state.bind_fbo(fbo.raw());
                gpu.state.set_viewport(fbo.viewport());
            }
            RenderTarget::Default { viewport } => {
                gpu.state.bind_fbo(0);
                gpu.state.set_viewport(*viewport);
            }
        }

        // 2. Pipeline state, 3. program + vertex source.
        self.apply_pipeline(gpu);
        gpu.state.use_program(program.raw());
        gpu.state.bind_vao(vao.raw());

        // 4-7. Uniforms, samplers, buffer blocks.
        self.apply_bindings(gpu, program)?;

        // 8. Dispatch.
        let mode = vao.primitive().gl();
        let count = vao.draw_count();
        unsafe {
            match (vao.indexed(), instances) {
                (true, None) => {
                    gl::DrawElements(mode, count, gl::UNSIGNED_INT, std::ptr::null())
                }
                (true, Some(n)) => gl::DrawElementsInstanced(
                    mode,
                    count,
                    gl::UNSIGNED_INT,
                    std::ptr::null(),
                    n as GLsizei,
                ),
                (false, None) => gl::DrawArrays(mode, 0, count),
                (false, Some(n)) => gl::DrawArraysInstanced(mode, 0, count, n as GLsizei),
            }
        }
        check_gl("draw");
        Ok(())
    }

    /// Runs the record as a compute dispatch; the target surface, VAO and
    /// pipeline state do not apply.
    pub fn dispatch(
        &self,
        gpu: &mut GraphicsState,
        program: &mut Program,
        groups: (u32, u32, u32),
    ) -> RenderResult<()> {
        if !program.is_compute() {
            return Err(RenderError::NotCompute(program.name().into()));
        }
        gpu.state.use_program(program.raw());
        self.apply_bindings(gpu, program)?;
        unsafe { gl::DispatchCompute(groups.0, groups.1, groups.2) }
        check_gl("DispatchCompute");
        Ok(())
    }

    fn apply_pipeline(&self, gpu: &mut GraphicsState) {
        let p = &self.pipeline;
        let state = &mut gpu.state;
        state.set_depth_write(p.depth_write);
        match p.depth_test {
            Some(func) => {
                state.set_depth_test(true);
                state.set_depth_test_function(func);
            }
            None => state.set_depth_test(false),
        }
        match p.polygon_offset {
            Some((factor, units)) => {
                state.set_polygon_offset(true);
                state.set_polygon_offset_values(factor, units);
            }
            None => state.set_polygon_offset(false),
        }
        match p.blend {
            Some((src, dst)) => {
                state.set_blend(true);
                state.set_blend_factors(src, dst);
            }
            None => state.set_blend(false),
        }
        match p.cull {
            Some((face, winding)) => {
                state.set_cull(true);
                state.set_cull_face(face);
                state.set_winding(winding);
            }
            None => state.set_cull(false),
        }
        state.set_polygon_mode(p.polygon_mode);
    }

    fn apply_bindings(&self, gpu: &mut GraphicsState, program: &mut Program) -> RenderResult<()> {
        for (name, value) in &self.uniforms {
            program.set_uniform(name, *value)?;
        }
        for (unit, (name, texture)) in self.textures.iter().enumerate() {
            program.bind_sampler_2d(name, unit as u32)?;
            gpu.state.bind_texture_unit(unit as u32, *texture);
        }
        for (point, binding) in self.storage_blocks.iter().enumerate() {
            let point = point as u32;
            program.bind_shader_storage_block(&binding.name, point)?;
            gpu.state.bind_shader_storage_buffer_range(
                point,
                binding.buffer,
                binding.offset,
                binding.size,
            );
        }
        for (point, binding) in self.uniform_blocks.iter().enumerate() {
            let point = point as u32;
            program.bind_uniform_block(&binding.name, point)?;
            gpu.state.bind_uniform_buffer_range(
                point,
                binding.buffer,
                binding.offset,
                binding.size,
            );
        }
        Ok(())
    }
}

fn check_name(name: &str) -> RenderResult<()> {
    if name.len() > NAME_CAP {
        return Err(RenderError::NameTooLong(name.into()));
    }
    Ok(())
}

#[cfg(test)]
mod test {

    use crate::{DrawLimits, RenderError};
    use super::DrawCall;

    #[test]
    fn capacity_exceeded() {
        let mut call = DrawCall::new(DrawLimits::default());
        for i in 0..8 {
            call.set_uniform(&format!("u_{i}"), i as f32).unwrap();
        }
        let err = call.set_uniform("u_overflow", 1.0f32).unwrap_err();
        assert!(matches!(err, RenderError::DrawCallFull { capacity: 8, .. }));
    }

    #[test]
    fn duplicate_identifier_rejected() {
        let mut call = DrawCall::new(DrawLimits::default());
        call.set_uniform("u_model", 1.0f32).unwrap();
        let err = call.set_uniform("u_model", 2.0f32).unwrap_err();
        assert!(matches!(err, RenderError::DuplicateBinding(name) if name == "u_model"));
    }

    #[test]
    fn over_long_identifier_rejected() {
        let mut call = DrawCall::new(DrawLimits::default());
        let name = "u_".repeat(64);
        let err = call.set_uniform(&name, 0.5f32).unwrap_err();
        assert!(matches!(err, RenderError::NameTooLong(_)));
    }

    #[test]
    fn reduced_limits_apply() {
        let limits = DrawLimits { max_uniforms: 2, ..Default::default() };
        let mut call = DrawCall::new(limits);
        call.set_uniform("a", 0.0f32).unwrap();
        call.set_uniform("b", 0.0f32).unwrap();
        assert!(call.set_uniform("c", 0.0f32).is_err());
    }
}
