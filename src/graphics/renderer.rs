use std::path::PathBuf;
use glam::Mat4;
use crate::{
    Camera, ClearMask, Color, DrawLimits, GraphicsState, ParticleEmitter, RenderError,
    RenderResult, RenderTarget, Texture, ViewProps,
};
use super::debug::DebugRenderer;
use super::particles::ParticleRenderer;
use super::phong::PhongRenderer;
use super::shadow::ShadowMapper;

#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Directory holding `phong`, `shadow`, `particle`, `particle_update`
    /// and `debug` shader sources.
    pub shader_dir: PathBuf,
    /// Side length of the square shadow map. Must be a power of two.
    pub shadow_map_resolution: u32,
    /// Capacity of the lights storage block, per light kind.
    pub max_lights_per_kind: usize,
    pub clear_color: Color,
    pub limits: DrawLimits,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            shader_dir: PathBuf::from("shaders"),
            shadow_map_resolution: 2048,
            max_lights_per_kind: 16,
            clear_color: Color::BLACK,
            limits: DrawLimits::default(),
        }
    }
}

impl RendererConfig {
    fn validate(&self) -> RenderResult<()> {
        if self.shadow_map_resolution == 0 || !self.shadow_map_resolution.is_power_of_two() {
            return Err(RenderError::InvalidConfig(format!(
                "shadow map resolution must be a power of two, got {}",
                self.shadow_map_resolution,
            )));
        }
        if self.max_lights_per_kind == 0 {
            return Err(RenderError::InvalidConfig(
                "max lights per kind must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/**
 * Frame orchestrator. Owns the graphics context state and every pass, and
 * runs them in order: shadow, lit geometry, particle update + draw, debug
 * overlay.
 *
 * Construct after the GL context is current and `gl::load_with` has run;
 * drop before the context goes away.
 */
pub struct Renderer {
    gpu: GraphicsState,
    phong: PhongRenderer,
    shadow: ShadowMapper,
    particles: ParticleRenderer,
    pub debug: DebugRenderer,
    fallback: Texture,
    clear_color: Color,
}

impl Renderer {

    pub fn new(config: RendererConfig) -> RenderResult<Self> {
        config.validate()?;
        let gpu = GraphicsState::new(config.limits)?;
        let dir = &config.shader_dir;
        Ok(Self {
            gpu,
            phong: PhongRenderer::new(dir, config.max_lights_per_kind)?,
            shadow: ShadowMapper::new(dir, config.shadow_map_resolution)?,
            particles: ParticleRenderer::new(dir)?,
            debug: DebugRenderer::new(dir)?,
            fallback: Texture::white()?,
            clear_color: config.clear_color,
        })
    }

    pub fn gpu(&mut self) -> &mut GraphicsState {
        &mut self.gpu
    }

    /// Renders one frame of `scene` from `camera` into `target`.
    pub fn render_frame(
        &mut self,
        scene: &mut dyn crate::Scene,
        camera: &Camera,
        dt: f32,
        target: &mut RenderTarget,
    ) -> RenderResult<()> {
        // Shadow pass first; the lit pass samples its output.
        let light_clip_from_world = match PhongRenderer::first_directional(scene) {
            Some(light) => {
                self.shadow.render(&mut self.gpu, scene, &light)?;
                self.shadow.light_clip_from_world()
            }
            None => {
                self.shadow.clear(&mut self.gpu);
                Mat4::IDENTITY
            }
        };

        let view = camera.view();
        let projection = camera.projection.matrix();
        let view_props = ViewProps {
            view,
            projection,
            clip_from_world: projection * view,
            light_clip_from_world,
            view_position: camera.position.extend(1.0),
        };

        self.clear_target(target);
        self.phong.render(
            &mut self.gpu,
            scene,
            camera,
            &view_props,
            self.shadow.depth_texture(),
            &self.fallback,
            target,
        )?;

        self.run_particles(scene, dt, target)?;
        self.debug.render(&mut self.gpu, target)
    }

    fn clear_target(&mut self, target: &mut RenderTarget) {
        let c = self.clear_color;
        match target {
            RenderTarget::Framebuffer(fbo) => fbo.clear(&mut self.gpu.state),
            RenderTarget::Default { viewport } => {
                self.gpu.state.bind_fbo(0);
                self.gpu.state.set_viewport(*viewport);
                self.gpu.state.set_clear_color(c);
                self.gpu.state.set_depth_write(true);
                self.gpu.state.clear(ClearMask::COLOR | ClearMask::DEPTH);
            }
        }
    }

    fn run_particles(
        &mut self,
        scene: &mut dyn crate::Scene,
        dt: f32,
        target: &mut RenderTarget,
    ) -> RenderResult<()> {
        let gpu = &mut self.gpu;
        let particles = &mut self.particles;
        let fallback = &self.fallback;
        let mut result = Ok(());
        scene.for_each_emitter(&mut |emitter: &mut ParticleEmitter| {
            if result.is_err() {
                return;
            }
            result = particles
                .update(gpu, emitter, dt)
                .and_then(|_| particles.draw(gpu, emitter, fallback, target));
        });
        result
    }
}
