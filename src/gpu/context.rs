use std::ffi::CStr;
use crate::{RenderError, RenderResult};
use super::blocks::BlockRegistry;
use super::draw::DrawCall;
use super::shader::BlockFlavor;
use super::state::GlState;

/// Hard inline capacity of the draw-call binding lists.
pub const MAX_DRAW_BINDINGS: usize = 8;

/// Byte cap on draw-call identifiers.
pub const NAME_CAP: usize = 64;

/// Per-draw list capacities. Runtime-configurable up to
/// [`MAX_DRAW_BINDINGS`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct DrawLimits {
    pub max_uniforms: usize,
    pub max_textures: usize,
    pub max_storage_blocks: usize,
    pub max_uniform_blocks: usize,
}

impl Default for DrawLimits {
    fn default() -> Self {
        Self {
            max_uniforms: MAX_DRAW_BINDINGS,
            max_textures: MAX_DRAW_BINDINGS,
            max_storage_blocks: MAX_DRAW_BINDINGS,
            max_uniform_blocks: MAX_DRAW_BINDINGS,
        }
    }
}

impl DrawLimits {
    pub(crate) fn validate(&self) -> RenderResult<()> {
        let caps = [
            self.max_uniforms,
            self.max_textures,
            self.max_storage_blocks,
            self.max_uniform_blocks,
        ];
        if caps.iter().any(|&cap| cap == 0 || cap > MAX_DRAW_BINDINGS) {
            return Err(RenderError::InvalidConfig(format!(
                "draw limits must be in 1..={MAX_DRAW_BINDINGS}, got {self:?}"
            )));
        }
        Ok(())
    }
}

/**
 * Stores the GL primitives needed to do any and all graphics operations:
 * the pipeline state mirror and the two interface-block binding registries.
 *
 * Constructed once, after the GL context is current and function pointers
 * are loaded, and passed by reference everywhere — there is no hidden
 * global state. Drop it before the context goes away.
 */
#[derive(Debug)]
pub struct GraphicsState {
    pub state: GlState,
    pub uniform_blocks: BlockRegistry,
    pub storage_blocks: BlockRegistry,
    limits: DrawLimits,
}

impl GraphicsState {

    pub fn new(limits: DrawLimits) -> RenderResult<Self> {
        limits.validate()?;
        let state = GlState::new();
        log::info!(
            "GL context: {} / {}",
            driver_string(gl::RENDERER),
            driver_string(gl::VERSION),
        );
        Ok(Self {
            state,
            uniform_blocks: BlockRegistry::new(BlockFlavor::Uniform),
            storage_blocks: BlockRegistry::new(BlockFlavor::Storage),
            limits,
        })
    }

    /// A fresh draw-call record configured with this context's limits.
    pub fn draw_call(&self) -> DrawCall {
        DrawCall::new(self.limits)
    }

    pub fn limits(&self) -> DrawLimits {
        self.limits
    }

    /// Makes shader-storage writes from prior dispatches visible to
    /// subsequent draws.
    pub fn storage_barrier(&mut self) {
        unsafe { gl::MemoryBarrier(gl::SHADER_STORAGE_BARRIER_BIT) }
        super::state::check_gl("MemoryBarrier");
    }
}

fn driver_string(name: gl::types::GLenum) -> String {
    unsafe {
        let ptr = gl::GetString(name);
        if ptr.is_null() {
            return "<unknown>".into();
        }
        CStr::from_ptr(ptr as *const _).to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod test {

    use super::{DrawLimits, MAX_DRAW_BINDINGS};

    #[test]
    fn default_limits_are_valid() {
        assert!(DrawLimits::default().validate().is_ok());
    }

    #[test]
    fn oversized_limits_rejected() {
        let limits = DrawLimits { max_textures: MAX_DRAW_BINDINGS + 1, ..Default::default() };
        assert!(limits.validate().is_err());
        let limits = DrawLimits { max_uniforms: 0, ..Default::default() };
        assert!(limits.validate().is_err());
    }
}
