use glam::Vec3;
use crate::{Collider, Color, Mesh, ParticleEmitter, Texture, Transform, AABB};

/**
 * What the renderer consumes each frame. The renderer never stores entities
 * itself; the application walks its own world and hands out lights, visible
 * meshes, emitters and colliders through these callbacks.
 */
pub trait Scene {

    fn for_each_light(&self, f: &mut dyn FnMut(&Light));

    fn for_each_visible(&self, f: &mut dyn FnMut(&Transform, &Mesh, &Material));

    /// Bounds of everything that can cast a shadow. Used to fit the
    /// directional shadow frustum.
    fn bounding_box(&self) -> AABB;

    fn for_each_emitter(&mut self, f: &mut dyn FnMut(&mut ParticleEmitter));

    fn for_each_collider(&mut self, f: &mut dyn FnMut(&mut Collider));
}

#[derive(Copy, Clone, Debug)]
pub enum Light {
    Directional(DirectionalLight),
    Point(PointLight),
    Spot(SpotLight),
}

#[derive(Copy, Clone, Debug)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: Color,
    pub intensity: f32,
    pub ambient: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(0.0, -1.0, 0.0),
            color: Color::WHITE,
            intensity: 1.0,
            ambient: 0.1,
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Color,
    pub intensity: f32,
    /// Constant, linear, quadratic attenuation terms.
    pub attenuation: Vec3,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            color: Color::WHITE,
            intensity: 1.0,
            attenuation: Vec3::new(1.0, 0.09, 0.032),
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct SpotLight {
    pub position: Vec3,
    pub direction: Vec3,
    pub color: Color,
    pub intensity: f32,
    /// Cosines of the inner and outer cone angles.
    pub cutoff_inner: f32,
    pub cutoff_outer: f32,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            direction: Vec3::new(0.0, -1.0, 0.0),
            color: Color::WHITE,
            intensity: 1.0,
            cutoff_inner: 0.95,
            cutoff_outer: 0.90,
        }
    }
}

/**
 * Surface description for one visible mesh. Textures are borrowed from the
 * scene; any slot left empty falls back to the renderer's 1×1 white texture.
 */
#[derive(Copy, Clone, Default, Debug)]
pub struct Material<'a> {
    pub diffuse: Option<&'a Texture>,
    pub specular: Option<&'a Texture>,
    pub normal: Option<&'a Texture>,
    pub base_color: Color,
    pub shininess: f32,
}

impl<'a> Material<'a> {
    pub fn colored(base_color: Color, shininess: f32) -> Self {
        Self { base_color, shininess, ..Default::default() }
    }
}
