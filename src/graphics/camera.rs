use glam::{Mat4, Quat, Vec3};
use crate::Frustum;

/**
 * Viewpoint for a frame: world-space pose plus a projection.
 *
 * The convention is right-handed throughout: +X right, +Y up, the camera
 * looking down -Z, with counter-clockwise front faces.
 */
#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Quat,
    pub projection: Projection,
}

impl Camera {

    pub fn new(position: Vec3, rotation: Quat, projection: Projection) -> Self {
        Self { position, rotation, projection }
    }

    /// Points the camera from its current position towards `target`.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let view = Mat4::look_at_rh(self.position, target, up);
        self.rotation = Quat::from_mat4(&view.inverse());
    }

    /// World → view.
    pub fn view(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    /// World → clip.
    pub fn clip_from_world(&self) -> Mat4 {
        self.projection.matrix() * self.view()
    }

    /// World-space view frustum, for culling.
    pub fn frustum(&self) -> Frustum {
        Frustum::from(self.clip_from_world())
    }
}

/**
 * Either an orthographic or perspective camera projection.
 */
#[derive(Copy, Clone, Debug)]
pub enum Projection {
    Orthographic(OrthographicProjection),
    Perspective(PerspectiveProjection),
}

impl Projection {
    pub fn matrix(&self) -> Mat4 {
        match self {
            Self::Orthographic(ortho) => Mat4::orthographic_rh(
                ortho.left,
                ortho.right,
                ortho.bottom,
                ortho.top,
                ortho.near,
                ortho.far,
            ),
            Self::Perspective(persp) => Mat4::perspective_rh(
                persp.fov,
                persp.aspect_ratio,
                persp.near,
                persp.far,
            ),
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct OrthographicProjection {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

#[derive(Copy, Clone, Debug)]
pub struct PerspectiveProjection {
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveProjection {
    fn default() -> Self {
        Self {
            fov: std::f32::consts::FRAC_PI_3,
            aspect_ratio: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[cfg(test)]
mod test {

    use glam::{Quat, Vec3, Vec4};
    use super::{Camera, PerspectiveProjection, Projection};

    #[test]
    fn camera_looks_down_negative_z() {
        let camera = Camera::new(
            Vec3::new(0.0, 0.0, 5.0),
            Quat::IDENTITY,
            Projection::Perspective(PerspectiveProjection::default()),
        );
        // A point in front of the camera lands in view space at -Z.
        let p = camera.view() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(p.z < 0.0);
    }

    #[test]
    fn look_at_centers_the_target() {
        let mut camera = Camera::new(
            Vec3::new(3.0, 4.0, 5.0),
            Quat::IDENTITY,
            Projection::Perspective(PerspectiveProjection::default()),
        );
        let target = Vec3::new(-1.0, 0.5, 2.0);
        camera.look_at(target, Vec3::Y);
        let clip = camera.clip_from_world() * target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-3);
        assert!(ndc.y.abs() < 1e-3);
    }

    #[test]
    fn projection_depth_spans_zero_to_one() {
        // Matches the zero-to-one clip control the state mirror installs.
        let proj = Projection::Perspective(PerspectiveProjection::default()).matrix();
        let near = proj * Vec4::new(0.0, 0.0, -0.1, 1.0);
        assert!((near.z / near.w).abs() < 1e-6);
        let far = proj * Vec4::new(0.0, 0.0, -1000.0, 1.0);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn frustum_contains_point_in_front() {
        let camera = Camera::new(
            Vec3::new(0.0, 0.0, 5.0),
            Quat::IDENTITY,
            Projection::Perspective(PerspectiveProjection::default()),
        );
        let frustum = camera.frustum();
        assert!(frustum.contains_point(Vec3::ZERO));
        assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, 50.0)));
    }
}
