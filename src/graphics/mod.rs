//! Scene rendering: mesh construction, cameras, lights and materials, and
//! the frame passes (shadow, Phong, particles, debug overlay) driven by
//! [`Renderer`].

mod camera;
mod color;
mod debug;
mod mesh;
mod particles;
mod phong;
mod renderer;
mod scene;
mod shadow;

pub use camera::*;
pub use color::*;
pub use debug::*;
pub use mesh::*;
pub use particles::*;
pub use phong::*;
pub use renderer::*;
pub use scene::*;
pub use shadow::*;
