use std::mem::size_of;
use std::ptr;
use bitflags::bitflags;
use bytemuck::Pod;
use gl::types::*;
use crate::{RenderError, RenderResult};
use super::state::check_gl;

bitflags! {
    /// Storage flags passed at buffer creation.
    /// Without `DYNAMIC_STORAGE` the byte contents are frozen after `upload`.
    #[derive(Copy, Clone, Eq, PartialEq, Default, Debug)]
    pub struct BufferFlags: u32 {
        const DYNAMIC_STORAGE   = gl::DYNAMIC_STORAGE_BIT;
        const MAP_READ          = gl::MAP_READ_BIT;
        const MAP_WRITE         = gl::MAP_WRITE_BIT;
        const MAP_PERSISTENT    = gl::MAP_PERSISTENT_BIT;
        const MAP_COHERENT      = gl::MAP_COHERENT_BIT;
        const CLIENT_STORAGE    = gl::CLIENT_STORAGE_BIT;
    }
}

/**
 * Owner of one GPU buffer allocation.
 *
 * Created empty; storage is established exactly once per handle, either by
 * [`upload`](Buffer::upload) or, for dynamic buffers, [`resize`](Buffer::resize).
 * Move-only; the allocation is released on drop.
 */
#[derive(Debug)]
pub struct Buffer {
    handle: GLuint,
    size: usize,
    stride: usize,
    flags: BufferFlags,
    storage_set: bool,
}

impl Buffer {

    /// Allocates a zero-byte buffer handle.
    pub fn new(flags: BufferFlags) -> Self {
        let mut handle = 0;
        unsafe { gl::CreateBuffers(1, &mut handle) }
        check_gl("CreateBuffers");
        Self { handle, size: 0, stride: 0, flags, storage_set: false }
    }

    /// Establishes immutable storage holding `data`.
    /// Fails with [`RenderError::BufferImmutable`] if storage was already set.
    pub fn upload<T: Pod>(&mut self, data: &[T]) -> RenderResult<()> {
        if self.storage_set {
            return Err(RenderError::BufferImmutable);
        }
        let bytes: &[u8] = bytemuck::cast_slice(data);
        unsafe {
            gl::NamedBufferStorage(
                self.handle,
                bytes.len() as GLsizeiptr,
                bytes.as_ptr() as *const GLvoid,
                self.flags.bits(),
            );
        }
        check_gl("NamedBufferStorage");
        self.size = bytes.len();
        self.stride = size_of::<T>();
        self.storage_set = true;
        Ok(())
    }

    /// Reallocates storage at a new size. Previous contents are *not*
    /// preserved. Only dynamic-storage buffers may be resized.
    pub fn resize(&mut self, bytes: usize) -> RenderResult<()> {
        if !self.flags.contains(BufferFlags::DYNAMIC_STORAGE) {
            return Err(RenderError::BufferImmutable);
        }
        unsafe {
            // Storage is immutable per handle, so resizing swaps the name out.
            if self.storage_set {
                gl::DeleteBuffers(1, &self.handle);
                gl::CreateBuffers(1, &mut self.handle);
            }
            gl::NamedBufferStorage(
                self.handle,
                bytes as GLsizeiptr,
                ptr::null(),
                self.flags.bits(),
            );
        }
        check_gl("resize NamedBufferStorage");
        self.size = bytes;
        self.storage_set = true;
        Ok(())
    }

    /// Copies `data` into the byte range starting at `offset`.
    pub fn write_sub<T: Pod>(&mut self, offset: usize, data: &[T]) -> RenderResult<()> {
        if !self.flags.contains(BufferFlags::DYNAMIC_STORAGE) {
            return Err(RenderError::BufferImmutable);
        }
        let bytes: &[u8] = bytemuck::cast_slice(data);
        if offset + bytes.len() > self.size {
            return Err(RenderError::BufferRange {
                offset,
                len: bytes.len(),
                size: self.size,
            });
        }
        unsafe {
            gl::NamedBufferSubData(
                self.handle,
                offset as GLintptr,
                bytes.len() as GLsizeiptr,
                bytes.as_ptr() as *const GLvoid,
            );
        }
        check_gl("NamedBufferSubData");
        Ok(())
    }

    /// Reads back `count` records of `T` starting at byte `offset`.
    pub fn read_sub<T: Pod>(&self, offset: usize, count: usize) -> RenderResult<Vec<T>> {
        let len = count * size_of::<T>();
        if offset + len > self.size {
            return Err(RenderError::BufferRange { offset, len, size: self.size });
        }
        let mut out = vec![T::zeroed(); count];
        unsafe {
            gl::GetNamedBufferSubData(
                self.handle,
                offset as GLintptr,
                len as GLsizeiptr,
                out.as_mut_ptr() as *mut GLvoid,
            );
        }
        check_gl("GetNamedBufferSubData");
        Ok(out)
    }

    /// GPU-side copy from `src` into this buffer.
    pub fn copy_sub(
        &mut self,
        src: &Buffer,
        src_offset: usize,
        dst_offset: usize,
        bytes: usize,
    ) -> RenderResult<()> {
        if src_offset + bytes > src.size {
            return Err(RenderError::BufferRange { offset: src_offset, len: bytes, size: src.size });
        }
        if dst_offset + bytes > self.size {
            return Err(RenderError::BufferRange { offset: dst_offset, len: bytes, size: self.size });
        }
        unsafe {
            gl::CopyNamedBufferSubData(
                src.handle,
                self.handle,
                src_offset as GLintptr,
                dst_offset as GLintptr,
                bytes as GLsizeiptr,
            );
        }
        check_gl("CopyNamedBufferSubData");
        Ok(())
    }

    /// Byte size of the established storage (0 before `upload`/`resize`).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Per-record stride of the last typed upload (0 if untyped).
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn flags(&self) -> BufferFlags {
        self.flags
    }

    pub(crate) fn raw(&self) -> GLuint {
        self.handle
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if self.handle != 0 {
            unsafe { gl::DeleteBuffers(1, &self.handle) }
            self.handle = 0;
        }
    }
}
