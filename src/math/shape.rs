use glam::{Mat4, Vec3, Vec4, Vec4Swizzles};
use derive_more::From;

/**
 * A simple sphere representation.
 */
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {

    pub const UNIT: Self = Sphere {
        center: Vec3::ZERO,
        radius: 1.0,
    };

    pub fn transform(self, mat: Mat4) -> Self {
        let right = mat.col(0).xyz();
        let up = mat.col(1).xyz();
        let back = mat.col(2).xyz();
        let max_scale = max_len(right, up, back);
        Self {
            center: mat.transform_point3(self.center),
            radius: self.radius * max_scale,
        }
    }
}

impl Default for Sphere {
    fn default() -> Self { Self::UNIT }
}

fn max_len(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    a.length_squared()
        .max(b.length_squared())
        .max(c.length_squared())
        .sqrt()
}

/**
 * Axis-aligned bounding box, stored as center and half extents.
 */
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct AABB {
    pub center: Vec3,
    pub extents: Vec3,
}

impl Default for AABB {
    fn default() -> Self { Self::UNIT }
}

impl AABB {

    pub const UNIT: Self = AABB {
        center: Vec3::ZERO,
        extents: Vec3::splat(0.5),
    };

    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            center: (min + max) * 0.5,
            extents: (max - min) * 0.5,
        }
    }

    /// Smallest box containing every point. Zero-sized at the origin if empty.
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for p in points {
            min = min.min(*p);
            max = max.max(*p);
        }
        if points.is_empty() {
            return Self { center: Vec3::ZERO, extents: Vec3::ZERO };
        }
        Self::from_min_max(min, max)
    }

    pub fn min(self) -> Vec3 {
        self.center - self.extents
    }

    pub fn max(self) -> Vec3 {
        self.center + self.extents
    }

    pub fn union(self, other: AABB) -> Self {
        Self::from_min_max(self.min().min(other.min()), self.max().max(other.max()))
    }

    pub fn overlaps(self, other: AABB) -> bool {
        let d = (self.center - other.center).abs();
        let e = self.extents + other.extents;
        d.x <= e.x && d.y <= e.y && d.z <= e.z
    }

    /// The eight corners, min corner first.
    pub fn corners(self) -> [Vec3; 8] {
        let min = self.min();
        let max = self.max();
        [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(min.x, max.y, max.z),
            Vec3::new(max.x, max.y, max.z),
        ]
    }

    pub fn transform(self, mat: Mat4) -> Self {
        let right = mat.col(0).xyz() * self.extents.x;
        let up = mat.col(1).xyz() * self.extents.y;
        let forward = -mat.col(2).xyz() * self.extents.z;
        let scale_x =
            Vec3::X.dot(right).abs() +
            Vec3::X.dot(up).abs() +
            Vec3::X.dot(forward).abs();
        let scale_y =
            Vec3::Y.dot(right).abs() +
            Vec3::Y.dot(up).abs() +
            Vec3::Y.dot(forward).abs();
        let scale_z =
            Vec3::Z.dot(right).abs() +
            Vec3::Z.dot(up).abs() +
            Vec3::Z.dot(forward).abs();
        Self {
            center: mat.transform_point3(self.center),
            extents: Vec3::new(scale_x, scale_y, scale_z),
        }
    }
}

#[derive(Copy, Clone, PartialEq, From, Debug)]
pub enum Volume {
    Sphere(Sphere),
    AABB(AABB),
}

impl Volume {

    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Self::Sphere(Sphere { center, radius })
    }

    pub fn aabb(center: Vec3, extents: Vec3) -> Self {
        Self::AABB(AABB { center, extents })
    }

    pub fn transform(self, mat: Mat4) -> Self {
        match self {
            Volume::Sphere(sphere) => Self::Sphere(sphere.transform(mat)),
            Volume::AABB(aabb) => Self::AABB(aabb.transform(mat)),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {

    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    pub fn from_vec4(vec: Vec4) -> Self {
        let abc = Vec3::new(vec.x, vec.y, vec.z);
        let mag = abc.length();
        Plane {
            normal: abc / mag,
            distance: -vec.w / mag,
        }
    }

    pub fn signed_distance(self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.distance
    }

    /// Point on the plane closest to the origin.
    pub fn closest_to_origin(self) -> Vec3 {
        self.normal * self.distance
    }

    pub fn projection_interval(self, aabb: AABB) -> f32 {
        aabb.extents.x * self.normal.x.abs() +
        aabb.extents.y * self.normal.y.abs() +
        aabb.extents.z * self.normal.z.abs()
    }
}

/**
 * 3D frustum, consisting of 6 planes.
 * Useful for culling objects offscreen during rendering.
 *
 * Resources:
 * https://www.gamedevs.org/uploads/fast-extraction-viewing-frustum-planes-from-world-view-projection-matrix.pdf
 * https://gdbooks.gitbooks.io/3dcollisions/content/Chapter6/frustum.html
 */
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Frustum {
    pub left: Plane,
    pub right: Plane,
    pub bottom: Plane,
    pub top: Plane,
    pub near: Plane,
    pub far: Plane,
}

impl Frustum {

    pub fn planes(&self) -> [Plane; 6] {
        [self.left, self.right, self.bottom, self.top, self.near, self.far]
    }

    /// Checks if point is inside frustum.
    /// False if point sits precisely on the plane.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes().iter().all(|p| p.signed_distance(point) > 0.0)
    }

    /// Checks if sphere is completely, or partially inside the frustum.
    /// False if outside of sphere sits precisely on the plane.
    pub fn contains_sphere(&self, sphere: Sphere) -> bool {
        let (point, radius) = (sphere.center, sphere.radius);
        self.planes().iter().all(|p| p.signed_distance(point) > -radius)
    }

    /// Checks if aabb is completely, or partially inside the frustum.
    /// False if outside of aabb sits precisely on the plane.
    pub fn contains_aabb(&self, aabb: AABB) -> bool {
        self.planes()
            .iter()
            .all(|p| -p.projection_interval(aabb) < p.signed_distance(aabb.center))
    }

    /// Checks if volume is completely, or partially inside the frustum.
    /// False if edge of volume sits precisely on the plane.
    pub fn contains_volume(&self, volume: Volume) -> bool {
        match volume {
            Volume::Sphere(sphere) => self.contains_sphere(sphere),
            Volume::AABB(aabb) => self.contains_aabb(aabb),
        }
    }
}

impl From<Mat4> for Frustum {
    fn from(proj_view: Mat4) -> Self {
        let row1 = proj_view.row(0);
        let row2 = proj_view.row(1);
        let row3 = proj_view.row(2);
        let row4 = proj_view.row(3);
        Self {
            left: Plane::from_vec4(row4 + row1),
            right: Plane::from_vec4(row4 - row1),
            bottom: Plane::from_vec4(row4 + row2),
            top: Plane::from_vec4(row4 - row2),
            near: Plane::from_vec4(row3),
            far: Plane::from_vec4(row4 - row3),
        }
    }
}

#[cfg(test)]
mod test {

    use glam::{Mat4, Vec3};
    use super::{Frustum, AABB};

    #[test]
    fn signed_dist() {
        let proj = Mat4::orthographic_rh(-1.0, 1.0, -1.0, 1.0, 0.0, 1.0);
        let frustum = Frustum::from(proj);

        let center = Vec3::new(0.0, 0.0, -0.5);

        assert_eq!(1.0, frustum.left.signed_distance(center));
        assert_eq!(1.0, frustum.right.signed_distance(center));
        assert_eq!(1.0, frustum.bottom.signed_distance(center));
        assert_eq!(1.0, frustum.top.signed_distance(center));
        assert_eq!(0.5, frustum.near.signed_distance(center));
        assert_eq!(0.5, frustum.far.signed_distance(center));
    }

    #[test]
    fn aabb_min_max_round_trip() {
        let aabb = AABB::from_min_max(Vec3::new(-1.0, 0.0, 2.0), Vec3::new(3.0, 4.0, 6.0));
        assert_eq!(aabb.min(), Vec3::new(-1.0, 0.0, 2.0));
        assert_eq!(aabb.max(), Vec3::new(3.0, 4.0, 6.0));
        assert_eq!(aabb.center, Vec3::new(1.0, 2.0, 4.0));
    }

    #[test]
    fn aabb_overlap() {
        let a = AABB::UNIT;
        let b = AABB { center: Vec3::new(0.9, 0.0, 0.0), extents: Vec3::splat(0.5) };
        let c = AABB { center: Vec3::new(1.8, 0.0, 0.0), extents: Vec3::splat(0.5) };
        assert!(a.overlaps(b));
        assert!(!a.overlaps(c));
        assert!(b.overlaps(c));
    }

    #[test]
    fn aabb_union_contains_both() {
        let a = AABB::UNIT;
        let b = AABB { center: Vec3::new(5.0, 0.0, 0.0), extents: Vec3::splat(1.0) };
        let u = a.union(b);
        assert_eq!(u.min(), Vec3::new(-0.5, -1.0, -1.0));
        assert_eq!(u.max(), Vec3::new(6.0, 1.0, 1.0));
    }
}
