use gl::types::*;
use crate::{RenderError, RenderResult};
use super::state::check_gl;

/// Pixel payload handed over by the external image loader.
#[derive(Clone, Debug)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub bytes: Vec<u8>,
}

impl ImageData {
    fn gl_format(&self) -> RenderResult<GLenum> {
        match self.channels {
            1 => Ok(gl::RED),
            3 => Ok(gl::RGB),
            4 => Ok(gl::RGBA),
            n => Err(RenderError::InvalidConfig(format!("{n}-channel image data"))),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TextureFormat {
    R8,
    Rgb8,
    Rgba8,
    Rgba16F,
    Depth24,
    Depth32F,
    Depth24Stencil8,
    Stencil8,
}

impl TextureFormat {
    fn gl(self) -> GLenum {
        match self {
            Self::R8 => gl::R8,
            Self::Rgb8 => gl::RGB8,
            Self::Rgba8 => gl::RGBA8,
            Self::Rgba16F => gl::RGBA16F,
            Self::Depth24 => gl::DEPTH_COMPONENT24,
            Self::Depth32F => gl::DEPTH_COMPONENT32F,
            Self::Depth24Stencil8 => gl::DEPTH24_STENCIL8,
            Self::Stencil8 => gl::STENCIL_INDEX8,
        }
    }

    pub fn is_depth(self) -> bool {
        matches!(self, Self::Depth24 | Self::Depth32F | Self::Depth24Stencil8)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TextureFilter {
    Nearest,
    Linear,
    LinearMipmapLinear,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TextureWrap {
    Repeat,
    ClampToEdge,
    ClampToBorder,
}

impl TextureWrap {
    fn gl(self) -> GLint {
        match self {
            Self::Repeat => gl::REPEAT as GLint,
            Self::ClampToEdge => gl::CLAMP_TO_EDGE as GLint,
            Self::ClampToBorder => gl::CLAMP_TO_BORDER as GLint,
        }
    }
}

/**
 * Immutable-storage 2D texture. Storage size is set once at creation;
 * later calls only rewrite pixel data.
 */
#[derive(Debug)]
pub struct Texture {
    handle: GLuint,
    width: u32,
    height: u32,
    format: TextureFormat,
}

impl Texture {

    /// Allocates immutable storage, optionally filled from `data`.
    pub fn new(
        width: u32,
        height: u32,
        format: TextureFormat,
        filter: TextureFilter,
        wrap: TextureWrap,
        data: Option<&ImageData>,
        generate_mipmaps: bool,
    ) -> RenderResult<Self> {
        let mut handle = 0;
        let levels = if generate_mipmaps {
            (width.max(height) as f32).log2().floor() as GLsizei + 1
        } else {
            1
        };
        unsafe {
            gl::CreateTextures(gl::TEXTURE_2D, 1, &mut handle);
            gl::TextureStorage2D(handle, levels, format.gl(), width as GLsizei, height as GLsizei);
        }
        check_gl("TextureStorage2D");

        let (min, mag): (GLenum, GLenum) = match filter {
            TextureFilter::Nearest => (gl::NEAREST, gl::NEAREST),
            TextureFilter::Linear => (gl::LINEAR, gl::LINEAR),
            TextureFilter::LinearMipmapLinear => (gl::LINEAR_MIPMAP_LINEAR, gl::LINEAR),
        };
        unsafe {
            gl::TextureParameteri(handle, gl::TEXTURE_MIN_FILTER, min as GLint);
            gl::TextureParameteri(handle, gl::TEXTURE_MAG_FILTER, mag as GLint);
            gl::TextureParameteri(handle, gl::TEXTURE_WRAP_S, wrap.gl());
            gl::TextureParameteri(handle, gl::TEXTURE_WRAP_T, wrap.gl());
        }
        check_gl("texture parameters");

        let texture = Self { handle, width, height, format };
        if let Some(data) = data {
            texture.write_sub(0, 0, data)?;
            if generate_mipmaps {
                unsafe { gl::GenerateTextureMipmap(handle) }
                check_gl("GenerateTextureMipmap");
            }
        }
        Ok(texture)
    }

    /// Single white pixel, the fallback for unset material slots.
    pub fn white() -> RenderResult<Self> {
        let data = ImageData { width: 1, height: 1, channels: 4, bytes: vec![255; 4] };
        Self::new(
            1, 1,
            TextureFormat::Rgba8,
            TextureFilter::Nearest,
            TextureWrap::Repeat,
            Some(&data),
            false,
        )
    }

    /// Rewrites a sub-rectangle of pixel data.
    pub fn write_sub(&self, x: u32, y: u32, data: &ImageData) -> RenderResult<()> {
        let format = data.gl_format()?;
        unsafe {
            // Tightly packed rows regardless of channel count.
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
            gl::TextureSubImage2D(
                self.handle,
                0,
                x as GLint,
                y as GLint,
                data.width as GLsizei,
                data.height as GLsizei,
                format,
                gl::UNSIGNED_BYTE,
                data.bytes.as_ptr() as *const GLvoid,
            );
        }
        check_gl("TextureSubImage2D");
        Ok(())
    }

    /// Border color returned by `ClampToBorder` sampling.
    pub fn set_border_color(&self, color: [f32; 4]) {
        unsafe { gl::TextureParameterfv(self.handle, gl::TEXTURE_BORDER_COLOR, color.as_ptr()) }
        check_gl("TextureParameterfv");
    }

    /// Configures depth-comparison sampling (`sampler2DShadow`).
    pub fn set_compare_ref(&self) {
        unsafe {
            gl::TextureParameteri(
                self.handle,
                gl::TEXTURE_COMPARE_MODE,
                gl::COMPARE_REF_TO_TEXTURE as GLint,
            );
            gl::TextureParameteri(self.handle, gl::TEXTURE_COMPARE_FUNC, gl::LEQUAL as GLint);
        }
        check_gl("texture compare parameters");
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub(crate) fn raw(&self) -> GLuint {
        self.handle
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        if self.handle != 0 {
            unsafe { gl::DeleteTextures(1, &self.handle) }
            self.handle = 0;
        }
    }
}
