use std::mem::size_of;
use std::path::Path;
use bytemuck::{bytes_of, Pod, Zeroable};
use glam::{Mat4, Vec4};
use crate::{
    Buffer, BufferFlags, Camera, GraphicsState, Light, Material, Mesh, Program, RenderResult,
    RenderTarget, Scene, Texture, Transform,
};

/// Per-frame view properties, shared by every raster program through one
/// uniform-block backing. std140: four mat4 then one vec4.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable, Debug)]
pub struct ViewProps {
    pub view: Mat4,
    pub projection: Mat4,
    pub clip_from_world: Mat4,
    pub light_clip_from_world: Mat4,
    pub view_position: Vec4,
}

pub(crate) const VIEW_BLOCK: &str = "ViewProps";
pub(crate) const LIGHTS_BLOCK: &str = "LightsBlock";

/// One light as the shaders see it, std430. The three kinds share the
/// record; `counts` in the block header says which prefix is which.
#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable, Debug)]
struct GpuLight {
    /// xyz world position; w unused.
    position: [f32; 4],
    /// xyz direction; w = ambient (directional) or inner cutoff (spot).
    direction: [f32; 4],
    /// rgb color; w = intensity.
    color: [f32; 4],
    /// xyz attenuation terms; w = outer cutoff (spot).
    params: [f32; 4],
}

const GPU_LIGHT_STRIDE: usize = size_of::<GpuLight>();

/**
 * Forward Phong pass: packs the scene's lights into a shader-storage block,
 * then draws every visible mesh with its material and the shadow map bound.
 */
pub struct PhongRenderer {
    program: Program,
    lights: Buffer,
    max_lights: usize,
    scratch: Vec<GpuLight>,
}

impl PhongRenderer {

    pub fn new(shader_dir: &Path, max_lights: usize) -> RenderResult<Self> {
        let program = Program::load(shader_dir, "phong")?;
        let mut lights = Buffer::new(BufferFlags::DYNAMIC_STORAGE);
        lights.resize(lights_capacity(max_lights))?;
        Ok(Self {
            program,
            lights,
            max_lights,
            scratch: Vec::new(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        gpu: &mut GraphicsState,
        scene: &dyn Scene,
        camera: &Camera,
        view: &ViewProps,
        shadow_map: &Texture,
        fallback: &Texture,
        target: &mut RenderTarget,
    ) -> RenderResult<()> {
        if let Some(point) = bind_view_block(gpu, &mut self.program)? {
            gpu.uniform_blocks.write(point, 0, bytes_of(view))?;
        }
        let used = self.upload_lights(scene)?;
        let frustum = camera.frustum();

        let mut result = Ok(());
        scene.for_each_visible(&mut |transform: &Transform, mesh: &Mesh, material: &Material| {
            if result.is_err() {
                return;
            }
            let model = Mat4::from(*transform);
            if !frustum.contains_aabb(mesh.local_bounds.transform(model)) {
                return;
            }
            result = self.draw_one(gpu, model, mesh, material, shadow_map, fallback, used, target);
        });
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_one(
        &mut self,
        gpu: &mut GraphicsState,
        model: Mat4,
        mesh: &Mesh,
        material: &Material,
        shadow_map: &Texture,
        fallback: &Texture,
        lights_size: usize,
        target: &mut RenderTarget,
    ) -> RenderResult<()> {
        let base = material.base_color;
        let mut call = gpu.draw_call();
        call.set_uniform("u_model", model)?
            .set_uniform("u_base_color", Vec4::new(base.r, base.g, base.b, base.a))?
            .set_uniform("u_shininess", material.shininess.max(1.0))?
            .set_uniform("u_use_normal_map", material.normal.is_some() as i32)?
            .set_texture("u_diffuse", material.diffuse.unwrap_or(fallback))?
            .set_texture("u_specular", material.specular.unwrap_or(fallback))?
            .set_texture("u_normal", material.normal.unwrap_or(fallback))?
            .set_texture("u_shadow_map", shadow_map)?
            .set_storage_block(LIGHTS_BLOCK, &self.lights, 0, lights_size)?;
        call.submit(gpu, &mut self.program, &mesh.vao, target)
    }

    /// Packs lights in kind order (directional, point, spot), each kind
    /// clamped to `max_lights`, and uploads header + records. Returns the
    /// number of bytes in use.
    fn upload_lights(&mut self, scene: &dyn Scene) -> RenderResult<usize> {
        let mut counts = [0u32; 4];
        self.scratch.clear();
        let max = self.max_lights;
        let scratch = &mut self.scratch;

        let mut pack_kind = |want: usize, f: &mut dyn FnMut(&mut Vec<GpuLight>)| {
            let before = scratch.len();
            f(scratch);
            scratch.truncate(before + want);
            (scratch.len() - before) as u32
        };
        counts[0] = pack_kind(max, &mut |out| {
            scene.for_each_light(&mut |light| {
                if let Light::Directional(l) = light {
                    out.push(GpuLight {
                        direction: l.direction.normalize_or_zero().extend(l.ambient).into(),
                        color: [l.color.r, l.color.g, l.color.b, l.intensity],
                        ..Default::default()
                    });
                }
            });
        });
        counts[1] = pack_kind(max, &mut |out| {
            scene.for_each_light(&mut |light| {
                if let Light::Point(l) = light {
                    out.push(GpuLight {
                        position: l.position.extend(1.0).into(),
                        color: [l.color.r, l.color.g, l.color.b, l.intensity],
                        params: l.attenuation.extend(0.0).into(),
                        ..Default::default()
                    });
                }
            });
        });
        counts[2] = pack_kind(max, &mut |out| {
            scene.for_each_light(&mut |light| {
                if let Light::Spot(l) = light {
                    out.push(GpuLight {
                        position: l.position.extend(1.0).into(),
                        direction: l.direction.normalize_or_zero().extend(l.cutoff_inner).into(),
                        color: [l.color.r, l.color.g, l.color.b, l.intensity],
                        params: [0.0, 0.0, 0.0, l.cutoff_outer],
                    });
                }
            });
        });

        self.lights.write_sub(0, &[counts])?;
        if !self.scratch.is_empty() {
            self.lights.write_sub(size_of::<[u32; 4]>(), &self.scratch)?;
        }
        Ok(size_of::<[u32; 4]>() + self.scratch.len() * GPU_LIGHT_STRIDE)
    }

    /// First directional light, if the scene has one. The shadow pass keys
    /// off the same light the Phong shader treats as the shadow caster.
    pub fn first_directional(scene: &dyn Scene) -> Option<crate::DirectionalLight> {
        let mut found = None;
        scene.for_each_light(&mut |light| {
            if found.is_none() {
                if let Light::Directional(l) = light {
                    found = Some(*l);
                }
            }
        });
        found
    }
}

/// Resolves the program's `ViewProps` block to its registry binding point.
/// Every program that declares the block layout-identically shares one
/// backing, so writing it once per frame covers all passes.
pub(crate) fn bind_view_block(
    gpu: &mut GraphicsState,
    program: &mut Program,
) -> RenderResult<Option<u32>> {
    let Some(block) = program.uniform_block(VIEW_BLOCK).cloned() else {
        return Ok(None);
    };
    let point = gpu.uniform_blocks.binding_for(&block, &mut gpu.state)?;
    program.bind_uniform_block(VIEW_BLOCK, point)?;
    Ok(Some(point))
}

fn lights_capacity(max_lights: usize) -> usize {
    size_of::<[u32; 4]>() + 3 * max_lights * GPU_LIGHT_STRIDE
}

#[cfg(test)]
mod test {

    use std::mem::size_of;
    use crate::{
        Collider, DirectionalLight, Light, Material, Mesh, ParticleEmitter, PointLight, Scene,
        Transform, AABB,
    };
    use super::{lights_capacity, GpuLight, PhongRenderer, ViewProps};

    struct LightsOnly(Vec<Light>);

    impl Scene for LightsOnly {
        fn for_each_light(&self, f: &mut dyn FnMut(&Light)) {
            for light in &self.0 {
                f(light);
            }
        }
        fn for_each_visible(&self, _f: &mut dyn FnMut(&Transform, &Mesh, &Material)) {}
        fn bounding_box(&self) -> AABB {
            AABB::UNIT
        }
        fn for_each_emitter(&mut self, _f: &mut dyn FnMut(&mut ParticleEmitter)) {}
        fn for_each_collider(&mut self, _f: &mut dyn FnMut(&mut Collider)) {}
    }

    #[test]
    fn shadow_caster_is_the_first_directional_light() {
        let scene = LightsOnly(vec![Light::Point(PointLight::default())]);
        assert!(PhongRenderer::first_directional(&scene).is_none());

        let scene = LightsOnly(vec![
            Light::Point(PointLight::default()),
            Light::Directional(DirectionalLight::default()),
        ]);
        assert!(PhongRenderer::first_directional(&scene).is_some());
    }

    #[test]
    fn gpu_light_stride_is_64() {
        assert_eq!(size_of::<GpuLight>(), 64);
    }

    #[test]
    fn view_props_matches_std140() {
        // Four column-major mat4 at 64-byte strides, then one vec4.
        assert_eq!(size_of::<ViewProps>(), 4 * 64 + 16);
    }

    #[test]
    fn lights_block_capacity() {
        assert_eq!(lights_capacity(16), 16 + 3 * 16 * 64);
    }
}
