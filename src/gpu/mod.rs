//! GPU resource and draw-state engine: RAII handles for buffers, vertex
//! arrays, textures, framebuffers and programs; link-time interface
//! introspection; shared block backings; and a typed draw-call record that
//! resolves everything into one submission.
//!
//! Raw GL calls never leave this module. The caller owns context creation
//! (glutin/SDL), runs `gl::load_with`, then constructs [`GraphicsState`].

mod blocks;
mod buffer;
mod context;
mod draw;
mod framebuffer;
mod shader;
mod state;
mod texture;
mod vao;

pub use blocks::*;
pub use buffer::*;
pub use context::*;
pub use draw::*;
pub use framebuffer::*;
pub use shader::*;
pub use state::*;
pub use texture::*;
pub use vao::*;
