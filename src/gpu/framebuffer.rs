use gl::types::*;
use crate::{Color, RenderError, RenderResult};
use super::state::{check_gl, ClearMask, GlState, Viewport};
use super::texture::{Texture, TextureFilter, TextureFormat, TextureWrap};

/// Which attachments a framebuffer carries and how their textures sample.
#[derive(Copy, Clone, Debug)]
pub struct FramebufferSpec {
    pub color: Option<TextureFormat>,
    pub depth: Option<TextureFormat>,
    pub stencil: Option<TextureFormat>,
    pub depth_stencil: Option<TextureFormat>,
    pub filter: TextureFilter,
    pub wrap: TextureWrap,
    pub border: Option<[f32; 4]>,
}

impl Default for FramebufferSpec {
    fn default() -> Self {
        Self {
            color: Some(TextureFormat::Rgba8),
            depth: Some(TextureFormat::Depth24),
            stencil: None,
            depth_stencil: None,
            filter: TextureFilter::Linear,
            wrap: TextureWrap::ClampToEdge,
            border: None,
        }
    }
}

impl FramebufferSpec {

    /// Depth-only target for shadow mapping: nearest filtering,
    /// clamp-to-border with border depth 1.0 (everything outside is lit).
    pub fn shadow_depth() -> Self {
        Self {
            color: None,
            depth: Some(TextureFormat::Depth32F),
            stencil: None,
            depth_stencil: None,
            filter: TextureFilter::Nearest,
            wrap: TextureWrap::ClampToBorder,
            border: Some([1.0, 1.0, 1.0, 1.0]),
        }
    }
}

/**
 * Owner of a framebuffer object and its attachment textures.
 * Resizing releases every attachment and recreates it at the new resolution.
 */
#[derive(Debug)]
pub struct Framebuffer {
    handle: GLuint,
    width: u32,
    height: u32,
    spec: FramebufferSpec,
    pub clear_color: Color,
    color: Option<Texture>,
    depth: Option<Texture>,
    stencil: Option<Texture>,
    depth_stencil: Option<Texture>,
    completeness_checked: bool,
}

impl Framebuffer {

    pub fn new(width: u32, height: u32, spec: FramebufferSpec) -> RenderResult<Self> {
        let mut handle = 0;
        unsafe { gl::CreateFramebuffers(1, &mut handle) }
        check_gl("CreateFramebuffers");
        let mut fbo = Self {
            handle,
            width,
            height,
            spec,
            clear_color: Color::BLACK,
            color: None,
            depth: None,
            stencil: None,
            depth_stencil: None,
            completeness_checked: false,
        };
        fbo.create_attachments()?;
        Ok(fbo)
    }

    fn create_attachments(&mut self) -> RenderResult<()> {
        let spec = self.spec;
        let make = |format: TextureFormat| -> RenderResult<Texture> {
            let tex = Texture::new(
                self.width,
                self.height,
                format,
                spec.filter,
                spec.wrap,
                None,
                false,
            )?;
            if let Some(border) = spec.border {
                tex.set_border_color(border);
            }
            Ok(tex)
        };
        if let Some(format) = spec.color {
            let tex = make(format)?;
            unsafe { gl::NamedFramebufferTexture(self.handle, gl::COLOR_ATTACHMENT0, tex.raw(), 0) }
            self.color = Some(tex);
        } else {
            unsafe {
                gl::NamedFramebufferDrawBuffer(self.handle, gl::NONE);
                gl::NamedFramebufferReadBuffer(self.handle, gl::NONE);
            }
        }
        if let Some(format) = spec.depth {
            let tex = make(format)?;
            unsafe { gl::NamedFramebufferTexture(self.handle, gl::DEPTH_ATTACHMENT, tex.raw(), 0) }
            self.depth = Some(tex);
        }
        if let Some(format) = spec.stencil {
            let tex = make(format)?;
            unsafe { gl::NamedFramebufferTexture(self.handle, gl::STENCIL_ATTACHMENT, tex.raw(), 0) }
            self.stencil = Some(tex);
        }
        if let Some(format) = spec.depth_stencil {
            let tex = make(format)?;
            unsafe {
                gl::NamedFramebufferTexture(self.handle, gl::DEPTH_STENCIL_ATTACHMENT, tex.raw(), 0)
            }
            self.depth_stencil = Some(tex);
        }
        check_gl("framebuffer attachments");
        Ok(())
    }

    /// Clears exactly the bits implied by the attachment set.
    pub fn clear(&mut self, state: &mut GlState) {
        let mut mask = ClearMask::empty();
        if self.color.is_some() {
            mask |= ClearMask::COLOR;
        }
        if self.depth.is_some() || self.depth_stencil.is_some() {
            mask |= ClearMask::DEPTH;
        }
        if self.stencil.is_some() || self.depth_stencil.is_some() {
            mask |= ClearMask::STENCIL;
        }
        state.bind_fbo(self.handle);
        state.set_clear_color(self.clear_color);
        // Depth writes must be on for the depth clear to land.
        state.set_depth_write(true);
        state.clear(mask);
    }

    /// Releases every attachment and recreates the set at `(width, height)`.
    pub fn resize(&mut self, width: u32, height: u32, state: &mut GlState) -> RenderResult<()> {
        for tex in [&self.color, &self.depth, &self.stencil, &self.depth_stencil]
            .into_iter()
            .flatten()
        {
            state.forget_texture(tex.raw());
        }
        self.color = None;
        self.depth = None;
        self.stencil = None;
        self.depth_stencil = None;
        self.width = width;
        self.height = height;
        self.completeness_checked = false;
        self.create_attachments()
    }

    pub fn is_complete(&self) -> bool {
        let status = unsafe { gl::CheckNamedFramebufferStatus(self.handle, gl::FRAMEBUFFER) };
        status == gl::FRAMEBUFFER_COMPLETE
    }

    /// Completeness check run on the first submit targeting this framebuffer.
    pub(crate) fn ensure_complete(&mut self) -> RenderResult<()> {
        if self.completeness_checked {
            return Ok(());
        }
        let status = unsafe { gl::CheckNamedFramebufferStatus(self.handle, gl::FRAMEBUFFER) };
        if status != gl::FRAMEBUFFER_COMPLETE {
            return Err(RenderError::FramebufferIncomplete { status });
        }
        self.completeness_checked = true;
        Ok(())
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::with_size(self.width, self.height)
    }

    pub fn color_texture(&self) -> Option<&Texture> {
        self.color.as_ref()
    }

    pub fn depth_texture(&self) -> Option<&Texture> {
        self.depth.as_ref().or(self.depth_stencil.as_ref())
    }

    pub(crate) fn raw(&self) -> GLuint {
        self.handle
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        if self.handle != 0 {
            unsafe { gl::DeleteFramebuffers(1, &self.handle) }
            self.handle = 0;
        }
    }
}
