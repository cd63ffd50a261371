use std::path::Path;
use glam::{Mat4, Vec3};
use crate::{
    CompareFunc, CullFace, DirectionalLight, Framebuffer, FramebufferSpec, GraphicsState, Mesh,
    PipelineState, Program, RenderResult, RenderTarget, Scene, Texture, Transform, Winding, AABB,
};

/**
 * Depth-only pass for the first directional light. Fits an orthographic
 * frustum around the scene bounds in light space, renders every caster into
 * a depth texture, and hands the light's clip-from-world matrix to the
 * lit pass.
 */
pub struct ShadowMapper {
    program: Program,
    target: Framebuffer,
    light_clip_from_world: Mat4,
}

impl ShadowMapper {

    pub fn new(shader_dir: &Path, resolution: u32) -> RenderResult<Self> {
        let program = Program::load(shader_dir, "shadow")?;
        let target = Framebuffer::new(resolution, resolution, FramebufferSpec::shadow_depth())?;
        if let Some(depth) = target.depth_texture() {
            // The lit pass samples through a sampler2DShadow.
            depth.set_compare_ref();
        }
        Ok(Self {
            program,
            target,
            light_clip_from_world: Mat4::IDENTITY,
        })
    }

    /// Renders the shadow map for `light`. Skips cleanly when the scene is
    /// degenerate (empty bounds).
    pub fn render(
        &mut self,
        gpu: &mut GraphicsState,
        scene: &dyn Scene,
        light: &DirectionalLight,
    ) -> RenderResult<()> {
        self.target.clear(&mut gpu.state);
        self.light_clip_from_world = fit_directional(light.direction, &scene.bounding_box());

        let pipeline = PipelineState {
            // Front-face culling trades acne for peter-panning, which the
            // sampling bias then hides.
            cull: Some((CullFace::Front, Winding::Ccw)),
            depth_test: Some(CompareFunc::Less),
            polygon_offset: Some((1.1, 4.0)),
            ..Default::default()
        };

        let mut result = Ok(());
        scene.for_each_visible(&mut |transform: &Transform, mesh: &Mesh, _material| {
            if result.is_err() {
                return;
            }
            result = (|| {
                let mut call = gpu.draw_call().with_pipeline(pipeline);
                call.set_uniform("u_light_clip_from_world", self.light_clip_from_world)?
                    .set_uniform("u_model", Mat4::from(*transform))?;
                let mut target = RenderTarget::Framebuffer(&mut self.target);
                call.submit(gpu, &mut self.program, &mesh.vao, &mut target)
            })();
        });
        result
    }

    /// Resets the depth map to its clear value (1.0, everything lit).
    /// Run this when no light casts, so the lit pass never samples stale or
    /// undefined depth.
    pub fn clear(&mut self, gpu: &mut GraphicsState) {
        self.target.clear(&mut gpu.state);
    }

    /// Light clip-from-world of the most recent pass.
    pub fn light_clip_from_world(&self) -> Mat4 {
        self.light_clip_from_world
    }

    pub fn depth_texture(&self) -> &Texture {
        // The spec used to build the target always carries a depth format.
        self.target
            .depth_texture()
            .unwrap_or_else(|| unreachable!("shadow target built without depth"))
    }
}

/// Orthographic clip-from-world fitted around `bounds` as seen from a light
/// shining along `direction`.
pub(crate) fn fit_directional(direction: Vec3, bounds: &AABB) -> Mat4 {
    let direction = direction.normalize_or_zero();
    if direction == Vec3::ZERO {
        return Mat4::IDENTITY;
    }
    let up = if direction.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y };
    let view = Mat4::look_to_rh(bounds.center, direction, up);

    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(f32::MIN);
    for corner in bounds.corners() {
        let p = view.transform_point3(corner);
        min = min.min(p);
        max = max.max(p);
    }
    // The light looks down -Z in view space, so depth runs [-max.z, -min.z].
    let projection = Mat4::orthographic_rh(min.x, max.x, min.y, max.y, -max.z, -min.z);
    projection * view
}

#[cfg(test)]
mod test {

    use glam::Vec3;
    use crate::AABB;
    use super::fit_directional;

    #[test]
    fn fitted_frustum_covers_every_corner() {
        let bounds = AABB { center: Vec3::new(2.0, 1.0, -3.0), extents: Vec3::new(4.0, 2.0, 5.0) };
        let clip = fit_directional(Vec3::new(-1.0, -2.0, -0.5), &bounds);
        for corner in bounds.corners() {
            let p = clip * corner.extend(1.0);
            let ndc = p.truncate() / p.w;
            assert!(ndc.x.abs() <= 1.0 + 1e-4, "x out of clip: {ndc}");
            assert!(ndc.y.abs() <= 1.0 + 1e-4, "y out of clip: {ndc}");
            assert!(ndc.z >= -1e-4 && ndc.z <= 1.0 + 1e-4, "z out of clip: {ndc}");
        }
    }

    #[test]
    fn degenerate_direction_falls_back_to_identity() {
        let bounds = AABB::UNIT;
        assert_eq!(fit_directional(Vec3::ZERO, &bounds), glam::Mat4::IDENTITY);
    }
}
