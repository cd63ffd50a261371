use glam::Vec3;
use crate::AABB;
use super::Collider;

#[derive(Copy, Clone, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {

    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction: direction.normalize_or_zero() }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// One collider pierced by a ray, with the entry parameter.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct RayHit {
    pub index: usize,
    pub t: f32,
}

/// Slab test. Returns the entry parameter, clamped to 0 when the origin is
/// inside the box; `None` on a miss or when the box is entirely behind.
pub fn intersect_aabb(ray: &Ray, aabb: AABB) -> Option<f32> {
    let mut t_min = f32::MIN;
    let mut t_max = f32::MAX;
    let (min, max) = (aabb.min(), aabb.max());

    for axis in 0..3 {
        let origin = ray.origin[axis];
        let direction = ray.direction[axis];
        if direction.abs() < f32::EPSILON {
            if origin < min[axis] || origin > max[axis] {
                return None;
            }
            continue;
        }
        let inverse = 1.0 / direction;
        let mut t0 = (min[axis] - origin) * inverse;
        let mut t1 = (max[axis] - origin) * inverse;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }
    if t_max < 0.0 {
        return None;
    }
    Some(t_min.max(0.0))
}

/// Tests the ray against every collider's world bounds; hits come back
/// sorted nearest first.
pub fn raycast(colliders: &[Collider], ray: &Ray) -> Vec<RayHit> {
    let mut hits: Vec<RayHit> = colliders
        .iter()
        .enumerate()
        .filter_map(|(index, collider)| {
            intersect_aabb(ray, collider.world_aabb).map(|t| RayHit { index, t })
        })
        .collect();
    hits.sort_by(|a, b| a.t.total_cmp(&b.t));
    hits
}

#[cfg(test)]
mod test {

    use glam::{Quat, Vec3};
    use crate::{Collider, AABB};
    use super::{intersect_aabb, raycast, Ray};

    #[test]
    fn hits_unit_box_head_on() {
        let ray = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::X);
        let t = intersect_aabb(&ray, AABB::UNIT).unwrap();
        assert!((t - 4.5).abs() < 1e-5);
    }

    #[test]
    fn misses_offset_box() {
        let ray = Ray::new(Vec3::new(-5.0, 2.0, 0.0), Vec3::X);
        assert!(intersect_aabb(&ray, AABB::UNIT).is_none());
    }

    #[test]
    fn box_behind_origin_is_ignored() {
        let ray = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::X);
        assert!(intersect_aabb(&ray, AABB::UNIT).is_none());
    }

    #[test]
    fn origin_inside_reports_zero() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(intersect_aabb(&ray, AABB::UNIT), Some(0.0));
    }

    #[test]
    fn axis_parallel_ray_outside_slab_misses() {
        let ray = Ray::new(Vec3::new(0.0, 2.0, 0.0), Vec3::X);
        assert!(intersect_aabb(&ray, AABB::UNIT).is_none());
    }

    #[test]
    fn hits_sorted_by_distance() {
        let cubes = [4.0, 1.0, 7.0].map(|x| {
            Collider::cuboid(Vec3::splat(0.5), Vec3::new(x, 0.0, 0.0), Quat::IDENTITY)
        });
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let hits = raycast(&cubes, &ray);
        assert_eq!(hits.len(), 3);
        let order: Vec<usize> = hits.iter().map(|h| h.index).collect();
        assert_eq!(order, vec![1, 0, 2]);
        assert!(hits.windows(2).all(|w| w[0].t <= w[1].t));
    }
}
