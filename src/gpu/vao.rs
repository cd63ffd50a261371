use gl::types::*;
use smallvec::SmallVec;
use crate::{RenderError, RenderResult};
use super::buffer::Buffer;
use super::state::check_gl;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Primitive {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl Default for Primitive {
    fn default() -> Self {
        Primitive::Triangles
    }
}

impl Primitive {
    pub(crate) fn gl(self) -> GLenum {
        match self {
            Self::Points => gl::POINTS,
            Self::Lines => gl::LINES,
            Self::LineStrip => gl::LINE_STRIP,
            Self::Triangles => gl::TRIANGLES,
            Self::TriangleStrip => gl::TRIANGLE_STRIP,
            Self::TriangleFan => gl::TRIANGLE_FAN,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ComponentType {
    F32,
    I32,
    U32,
    I16,
    U16,
    I8,
    U8,
}

impl ComponentType {
    fn gl(self) -> GLenum {
        match self {
            Self::F32 => gl::FLOAT,
            Self::I32 => gl::INT,
            Self::U32 => gl::UNSIGNED_INT,
            Self::I16 => gl::SHORT,
            Self::U16 => gl::UNSIGNED_SHORT,
            Self::I8 => gl::BYTE,
            Self::U8 => gl::UNSIGNED_BYTE,
        }
    }
}

/// How one shader attribute reads from an attached vertex buffer.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct VertexAttrib {
    pub location: u32,
    pub components: i32,
    pub component_type: ComponentType,
    pub relative_offset: u32,
    pub binding: u32,
    pub normalized: bool,
}

/**
 * Vertex array descriptor: which buffers feed which attribute slots, plus an
 * optional element buffer. References the buffers it binds without owning
 * them. Once [`set_vertex_attrib_pointers`](Vao::set_vertex_attrib_pointers)
 * runs, the layout is fixed.
 */
#[derive(Debug)]
pub struct Vao {
    handle: GLuint,
    primitive: Primitive,
    indexed: bool,
    draw_count: i32,
    layout_fixed: bool,
    // vertex count derivable per binding point, for non-indexed draws
    binding_counts: SmallVec<[(u32, i32); 4]>,
}

impl Vao {

    pub fn new() -> Self {
        let mut handle = 0;
        unsafe { gl::CreateVertexArrays(1, &mut handle) }
        check_gl("CreateVertexArrays");
        Self {
            handle,
            primitive: Primitive::Triangles,
            indexed: false,
            draw_count: 0,
            layout_fixed: false,
            binding_counts: SmallVec::new(),
        }
    }

    /// Associates `binding` with a range of `buf`, starting `vertex_offset`
    /// records in, with the given per-vertex stride.
    pub fn attach_vertex_buffer(
        &mut self,
        buf: &Buffer,
        vertex_offset: usize,
        binding: u32,
        stride: usize,
    ) {
        let byte_offset = vertex_offset * stride;
        unsafe {
            gl::VertexArrayVertexBuffer(
                self.handle,
                binding,
                buf.raw(),
                byte_offset as GLintptr,
                stride as GLsizei,
            );
        }
        check_gl("VertexArrayVertexBuffer");
        let count = derivable_vertices(buf.size(), byte_offset, stride);
        match self.binding_counts.iter_mut().find(|(b, _)| *b == binding) {
            Some(entry) => entry.1 = count as i32,
            None => self.binding_counts.push((binding, count as i32)),
        }
        if !self.indexed {
            self.refresh_vertex_count();
        }
    }

    /// Attaches an element buffer and marks the descriptor indexed.
    pub fn attach_element_buffer(&mut self, buf: &Buffer, element_count: usize) {
        unsafe { gl::VertexArrayElementBuffer(self.handle, buf.raw()) }
        check_gl("VertexArrayElementBuffer");
        self.indexed = true;
        self.draw_count = element_count as i32;
    }

    /// Enables and formats every attribute, and fixes the draw primitive.
    /// The layout can only be set once.
    pub fn set_vertex_attrib_pointers(
        &mut self,
        primitive: Primitive,
        attrs: &[VertexAttrib],
    ) -> RenderResult<()> {
        if self.layout_fixed {
            return Err(RenderError::VaoLayoutFixed);
        }
        for attr in attrs {
            unsafe {
                gl::EnableVertexArrayAttrib(self.handle, attr.location);
                gl::VertexArrayAttribFormat(
                    self.handle,
                    attr.location,
                    attr.components,
                    attr.component_type.gl(),
                    attr.normalized as GLboolean,
                    attr.relative_offset,
                );
                gl::VertexArrayAttribBinding(self.handle, attr.location, attr.binding);
            }
            check_gl("vertex attrib format");
        }
        self.primitive = primitive;
        self.layout_fixed = true;
        if !self.indexed {
            self.refresh_vertex_count();
        }
        Ok(())
    }

    /// Overrides the cached draw count. Streaming users (debug overlay)
    /// rewrite the attached buffer each frame and only draw a prefix of it.
    pub fn set_draw_count(&mut self, count: usize) {
        self.draw_count = count as i32;
    }

    fn refresh_vertex_count(&mut self) {
        self.draw_count = self
            .binding_counts
            .iter()
            .map(|(_, count)| *count)
            .min()
            .unwrap_or(0);
    }

    pub fn primitive(&self) -> Primitive {
        self.primitive
    }

    pub fn indexed(&self) -> bool {
        self.indexed
    }

    pub fn draw_count(&self) -> i32 {
        self.draw_count
    }

    pub(crate) fn raw(&self) -> GLuint {
        self.handle
    }
}

/// Vertices derivable from a buffer range. Zero when the offset runs past
/// the end of the buffer or the stride is zero.
fn derivable_vertices(buffer_size: usize, byte_offset: usize, stride: usize) -> usize {
    if stride == 0 {
        return 0;
    }
    buffer_size.saturating_sub(byte_offset) / stride
}

impl Drop for Vao {
    fn drop(&mut self) {
        if self.handle != 0 {
            unsafe { gl::DeleteVertexArrays(1, &self.handle) }
            self.handle = 0;
        }
    }
}

#[cfg(test)]
mod test {

    use super::derivable_vertices;

    #[test]
    fn vertex_count_from_buffer_range() {
        assert_eq!(derivable_vertices(96, 0, 32), 3);
        assert_eq!(derivable_vertices(96, 32, 32), 2);
    }

    #[test]
    fn offset_past_the_end_derives_zero() {
        assert_eq!(derivable_vertices(96, 128, 32), 0);
        assert_eq!(derivable_vertices(96, 0, 0), 0);
    }
}
