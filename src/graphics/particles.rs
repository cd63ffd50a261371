use std::mem::size_of;
use std::path::Path;
use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use crate::{
    BlendFactor, Buffer, BufferFlags, Color, CompareFunc, GlState, GraphicsState, Mesh, MeshData,
    MeshVariant, PipelineState, Primitive, Program, RenderError, RenderResult, RenderTarget,
    Texture,
};
use super::phong::bind_view_block;

/// One particle as the compute and draw shaders see it. 32-byte std430
/// stride.
#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable, Debug)]
pub struct Particle {
    /// xyz world position; w = lifetime remaining in seconds.
    pub position_lifetime: [f32; 4],
    /// xyz velocity; w unused.
    pub velocity: [f32; 4],
}

pub const PARTICLE_STRIDE: usize = size_of::<Particle>();

/// Smallest buffer allocation, in particles.
const INITIAL_CAPACITY: u32 = 64;

/// Threads per compute workgroup; must match the update shader's local size.
const WORKGROUP_SIZE: u32 = 64;

#[derive(Clone, Debug)]
pub struct EmitterConfig {
    pub emit_position: Vec3,
    pub velocity_min: Vec3,
    pub velocity_max: Vec3,
    pub lifetime_min: f32,
    pub lifetime_max: f32,
    /// Seconds between spawn bursts.
    pub spawn_period: f32,
    /// Particles per burst.
    pub spawn_count: u32,
    pub max_particles: u32,
    pub colors: Option<(Color, Color)>,
    pub sizes: Option<(f32, f32)>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            emit_position: Vec3::ZERO,
            velocity_min: Vec3::new(-1.0, 1.0, -1.0),
            velocity_max: Vec3::new(1.0, 3.0, 1.0),
            lifetime_min: 1.0,
            lifetime_max: 2.0,
            spawn_period: 0.5,
            spawn_count: 8,
            max_particles: 1024,
            colors: None,
            sizes: None,
        }
    }
}

/// A contiguous tail of freshly spawned particles, in particle indices.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
struct SpawnBatch {
    first: u32,
    count: u32,
}

/**
 * CPU half of one particle system: spawn cadence, alive accounting and the
 * shader-storage backing. Simulation runs on the GPU; the CPU only appends
 * new particles and never reads them back.
 *
 * The alive count is monotone up to `max_particles`. Expired particles keep
 * their slot and are masked by the draw shader.
 */
pub struct ParticleEmitter {
    pub emit_position: Vec3,
    pub texture: Option<Texture>,
    colors: Option<(Color, Color)>,
    sizes: Option<(f32, f32)>,
    velocity_min: Vec3,
    velocity_max: Vec3,
    lifetime_min: f32,
    lifetime_max: f32,
    spawn_period: f32,
    time_to_next_spawn: f32,
    spawn_count: u32,
    max_particles: u32,
    alive: u32,
    /// GPU backing, created on first spawn so spawn accounting needs no
    /// context.
    buffer: Option<Buffer>,
    rng: SmallRng,
}

impl ParticleEmitter {

    pub fn new(config: EmitterConfig) -> RenderResult<Self> {
        if config.velocity_min.cmpgt(config.velocity_max).any() {
            return Err(RenderError::InvalidConfig(format!(
                "emit velocity min {} exceeds max {}",
                config.velocity_min, config.velocity_max,
            )));
        }
        if config.lifetime_min > config.lifetime_max || config.lifetime_min < 0.0 {
            return Err(RenderError::InvalidConfig(format!(
                "bad lifetime range [{}, {}]",
                config.lifetime_min, config.lifetime_max,
            )));
        }
        if config.spawn_period <= 0.0 {
            return Err(RenderError::InvalidConfig(format!(
                "spawn period must be positive, got {}",
                config.spawn_period,
            )));
        }
        Ok(Self {
            emit_position: config.emit_position,
            texture: None,
            colors: config.colors,
            sizes: config.sizes,
            velocity_min: config.velocity_min,
            velocity_max: config.velocity_max,
            lifetime_min: config.lifetime_min,
            lifetime_max: config.lifetime_max,
            spawn_period: config.spawn_period,
            time_to_next_spawn: config.spawn_period,
            spawn_count: config.spawn_count,
            max_particles: config.max_particles,
            alive: 0,
            buffer: None,
            rng: SmallRng::from_entropy(),
        })
    }

    pub fn alive(&self) -> u32 {
        self.alive
    }

    pub fn buffer(&self) -> Option<&Buffer> {
        self.buffer.as_ref()
    }

    /// Advances the spawn timer and commits this frame's burst to the alive
    /// count. The returned batch says which tail slots to fill.
    fn tick_spawner(&mut self, dt: f32) -> SpawnBatch {
        self.time_to_next_spawn -= dt;
        if self.time_to_next_spawn > 0.0 {
            return SpawnBatch { first: self.alive, count: 0 };
        }
        self.time_to_next_spawn = self.spawn_period;
        let count = self.spawn_count.min(self.max_particles - self.alive);
        let first = self.alive;
        self.alive += count;
        SpawnBatch { first, count }
    }

    fn make_particles(&mut self, count: u32) -> Vec<Particle> {
        let (min, max) = (self.velocity_min, self.velocity_max);
        let mut component = |lo: f32, hi: f32| {
            if lo < hi { self.rng.gen_range(lo..=hi) } else { lo }
        };
        (0..count)
            .map(|_| {
                let velocity = Vec3::new(
                    component(min.x, max.x),
                    component(min.y, max.y),
                    component(min.z, max.z),
                );
                let lifetime = component(self.lifetime_min, self.lifetime_max);
                Particle {
                    position_lifetime: self.emit_position.extend(lifetime).into(),
                    velocity: velocity.extend(0.0).into(),
                }
            })
            .collect()
    }

    /// Allocates the backing on first use; thereafter grows it to the next
    /// power of two that fits `particles` records, copying the live range
    /// into the new allocation.
    fn ensure_capacity(&mut self, particles: u32, state: &mut GlState) -> RenderResult<()> {
        let required = particles as usize * PARTICLE_STRIDE;
        if let Some(buffer) = &self.buffer {
            if required <= buffer.size() {
                return Ok(());
            }
        }
        let mut grown = Buffer::new(BufferFlags::DYNAMIC_STORAGE);
        grown.resize(next_capacity(required))?;
        if let Some(old) = &self.buffer {
            let live = self.alive as usize * PARTICLE_STRIDE;
            if live > 0 {
                grown.copy_sub(old, 0, 0, live.min(old.size()))?;
            }
        }
        if let Some(old) = self.buffer.replace(grown) {
            state.forget_buffer(old.raw());
        }
        Ok(())
    }
}

/// Next power of two at or above `required` bytes, never below the initial
/// allocation.
fn next_capacity(required: usize) -> usize {
    required
        .next_power_of_two()
        .max(INITIAL_CAPACITY as usize * PARTICLE_STRIDE)
}

/**
 * GPU half: a compute pass integrating every live particle, then an
 * additive-blended instanced quad per emitter.
 */
pub struct ParticleRenderer {
    update_program: Program,
    draw_program: Program,
    quad: Mesh,
}

impl ParticleRenderer {

    pub fn new(shader_dir: &Path) -> RenderResult<Self> {
        let update_program = Program::load(shader_dir, "particle_update")?;
        let draw_program = Program::load(shader_dir, "particle")?;
        let mut data = MeshData::new(Primitive::Triangles, MeshVariant::UV);
        data.add_quad(
            [
                Vec3::new(-0.5, -0.5, 0.0),
                Vec3::new(0.5, -0.5, 0.0),
                Vec3::new(0.5, 0.5, 0.0),
                Vec3::new(-0.5, 0.5, 0.0),
            ],
            Color::WHITE,
        );
        Ok(Self {
            update_program,
            draw_program,
            quad: data.upload()?,
        })
    }

    /// Spawns this frame's burst, then integrates every live particle on the
    /// GPU. Ends with a storage barrier so the draw sees the update.
    pub fn update(
        &mut self,
        gpu: &mut GraphicsState,
        emitter: &mut ParticleEmitter,
        dt: f32,
    ) -> RenderResult<()> {
        let batch = emitter.tick_spawner(dt);
        if batch.count > 0 {
            emitter.ensure_capacity(batch.first + batch.count, &mut gpu.state)?;
            let fresh = emitter.make_particles(batch.count);
            if let Some(buffer) = emitter.buffer.as_mut() {
                buffer.write_sub(batch.first as usize * PARTICLE_STRIDE, &fresh)?;
            }
        }
        let Some(buffer) = &emitter.buffer else {
            return Ok(());
        };
        if emitter.alive == 0 {
            return Ok(());
        }

        let mut call = gpu.draw_call();
        call.set_uniform("u_dt", dt)?
            .set_uniform("u_alive", emitter.alive)?
            .set_storage_block(
                "ParticlesBlock",
                buffer,
                0,
                emitter.alive as usize * PARTICLE_STRIDE,
            )?;
        let groups = emitter.alive.div_ceil(WORKGROUP_SIZE);
        call.dispatch(gpu, &mut self.update_program, (groups, 1, 1))?;
        gpu.storage_barrier();
        Ok(())
    }

    pub fn draw(
        &mut self,
        gpu: &mut GraphicsState,
        emitter: &ParticleEmitter,
        fallback: &Texture,
        target: &mut RenderTarget,
    ) -> RenderResult<()> {
        let Some(buffer) = emitter.buffer() else {
            return Ok(());
        };
        if emitter.alive == 0 {
            return Ok(());
        }
        bind_view_block(gpu, &mut self.draw_program)?;

        let (start_color, end_color) = emitter.colors.unwrap_or((Color::WHITE, Color::WHITE));
        let (start_size, end_size) = emitter.sizes.unwrap_or((0.1, 0.1));
        let pipeline = PipelineState {
            depth_write: false,
            depth_test: Some(CompareFunc::Less),
            blend: Some((BlendFactor::SrcAlpha, BlendFactor::One)),
            cull: None,
            ..Default::default()
        };
        let mut call = gpu.draw_call().with_pipeline(pipeline);
        call.set_uniform("u_start_color", color_vec(start_color))?
            .set_uniform("u_end_color", color_vec(end_color))?
            .set_uniform("u_start_size", start_size)?
            .set_uniform("u_end_size", end_size)?
            .set_uniform("u_lifetime_max", emitter.lifetime_max)?
            .set_texture("u_diffuse", emitter.texture.as_ref().unwrap_or(fallback))?
            .set_storage_block(
                "ParticlesBlock",
                buffer,
                0,
                emitter.alive as usize * PARTICLE_STRIDE,
            )?;
        call.submit_instanced(gpu, &mut self.draw_program, &self.quad.vao, target, emitter.alive)
    }
}

fn color_vec(color: Color) -> Vec4 {
    Vec4::new(color.r, color.g, color.b, color.a)
}

#[cfg(test)]
mod test {

    use glam::Vec3;
    use super::{next_capacity, EmitterConfig, ParticleEmitter, PARTICLE_STRIDE};

    fn emitter(spawn_period: f32, spawn_count: u32, max: u32) -> ParticleEmitter {
        ParticleEmitter::new(EmitterConfig {
            spawn_period,
            spawn_count,
            max_particles: max,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn spawn_cadence() {
        // 0.4s period, 4 per burst: the first burst fires on the tick that
        // crosses the period, then one burst per period.
        let mut e = emitter(0.4, 4, 1024);
        let mut spawned = 0;
        for _ in 0..10 {
            spawned += e.tick_spawner(0.1).count;
        }
        // Bursts at t = 0.4 and t = 0.8.
        assert_eq!(spawned, 8);
        assert_eq!(e.alive(), 8);
    }

    #[test]
    fn spawn_accounting_needs_no_gpu_backing() {
        let mut e = emitter(0.1, 4, 64);
        assert!(e.buffer().is_none());
        let batch = e.tick_spawner(0.1);
        assert_eq!(batch.count, 4);
        assert_eq!(e.alive(), 4);
        assert!(e.buffer().is_none());
    }

    #[test]
    fn spawn_clamps_at_max() {
        let mut e = emitter(0.1, 4, 6);
        for _ in 0..10 {
            e.tick_spawner(0.1);
        }
        assert_eq!(e.alive(), 6);
    }

    #[test]
    fn burst_larger_than_remaining_is_truncated() {
        let mut e = emitter(0.1, 100, 10);
        let batch = e.tick_spawner(0.1);
        assert_eq!(batch.first, 0);
        assert_eq!(batch.count, 10);
    }

    #[test]
    fn capacity_doubles_from_64_to_128_particles() {
        let for_64 = next_capacity(64 * PARTICLE_STRIDE);
        let for_65 = next_capacity(65 * PARTICLE_STRIDE);
        assert_eq!(for_64, 64 * PARTICLE_STRIDE);
        assert_eq!(for_65, 128 * PARTICLE_STRIDE);
    }

    #[test]
    fn inverted_velocity_range_rejected() {
        let config = EmitterConfig {
            velocity_min: Vec3::new(1.0, 0.0, 0.0),
            velocity_max: Vec3::new(-1.0, 1.0, 1.0),
            ..Default::default()
        };
        assert!(ParticleEmitter::new(config).is_err());
    }

    #[test]
    fn particles_spawn_at_emit_position() {
        let mut e = emitter(0.1, 4, 64);
        e.emit_position = Vec3::new(1.0, 2.0, 3.0);
        let fresh = e.make_particles(4);
        for p in &fresh {
            assert_eq!(&p.position_lifetime[0..3], &[1.0, 2.0, 3.0]);
            assert!(p.position_lifetime[3] >= 1.0 && p.position_lifetime[3] <= 2.0);
        }
    }
}
