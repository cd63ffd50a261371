/*!
 * Interactive 3D scene renderer and collision engine.
 *
 * The [`gpu`] layer wraps raw GL in RAII handles, a redundancy-skipping
 * state mirror and a typed draw-call record; [`graphics`] builds meshes and
 * runs the frame passes (shadow, Phong, particles, debug overlay) over a
 * caller-implemented [`Scene`]; [`collision`] does convex intersection
 * (GJK/EPA) and ray queries.
 *
 * Window and GL-context creation stay with the caller: make a context
 * current, run `gl::load_with`, then construct a [`Renderer`].
 */

mod error;
mod math;
mod gpu;
mod graphics;
mod collision;

pub use error::*;
pub use math::*;
pub use gpu::*;
pub use graphics::*;
pub use collision::*;
