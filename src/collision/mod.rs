//! Convex collision: GJK intersection, EPA penetration and ray queries over
//! world-space bounds. Broad phase is AABB overlap; narrow phase runs on the
//! colliders' convex point sets.

mod epa;
mod gjk;
mod ray;
mod simplex;

pub use epa::*;
pub use gjk::intersect;
pub use ray::*;
pub use simplex::*;

use std::sync::Arc;
use glam::{Mat4, Quat, Vec3};
use crate::{RenderResult, Scene, AABB};

/**
 * A convex point set with a rigid world pose. The point set is shared (many
 * colliders, one shape); the pose, cached world bounds and collided flag are
 * per instance.
 */
#[derive(Clone, Debug)]
pub struct Collider {
    /// Convex hull corners in local space.
    pub points: Arc<[Vec3]>,
    pub translation: Vec3,
    pub rotation: Quat,
    /// World bounds of the posed point set; refresh after moving.
    pub world_aabb: AABB,
    /// Set by [`detect`] when any narrow-phase test involving this collider
    /// reports intersection.
    pub collided: bool,
}

impl Collider {

    pub fn new(translation: Vec3, rotation: Quat, points: impl Into<Arc<[Vec3]>>) -> Self {
        let mut collider = Self {
            points: points.into(),
            translation,
            rotation,
            world_aabb: AABB { center: translation, extents: Vec3::ZERO },
            collided: false,
        };
        collider.update_world_aabb();
        collider
    }

    /// Box collider from half extents.
    pub fn cuboid(half_extents: Vec3, translation: Vec3, rotation: Quat) -> Self {
        let h = half_extents;
        let points: Vec<Vec3> = (0..8)
            .map(|i| {
                Vec3::new(
                    if i & 1 == 0 { -h.x } else { h.x },
                    if i & 2 == 0 { -h.y } else { h.y },
                    if i & 4 == 0 { -h.z } else { h.z },
                )
            })
            .collect();
        Self::new(translation, rotation, points)
    }

    pub fn update_world_aabb(&mut self) {
        if self.points.is_empty() {
            self.world_aabb = AABB { center: self.translation, extents: Vec3::ZERO };
            return;
        }
        let matrix = Mat4::from_rotation_translation(self.rotation, self.translation);
        let local = AABB::from_points(&self.points);
        self.world_aabb = local.transform(matrix);
    }

    /// Extremal point of the posed set in world direction `direction`.
    /// Linear scan over the hull corners.
    pub(crate) fn farthest_world(&self, direction: Vec3) -> Vec3 {
        let local_dir = self.rotation.inverse() * direction;
        let mut best = self.points[0];
        let mut best_dot = best.dot(local_dir);
        for point in self.points.iter().skip(1) {
            let dot = point.dot(local_dir);
            if dot > best_dot {
                best = *point;
                best_dot = dot;
            }
        }
        self.rotation * best + self.translation
    }

    pub(crate) fn to_local(&self, world: Vec3) -> Vec3 {
        self.rotation.inverse() * (world - self.translation)
    }
}

/// One resolved collision between colliders `a` and `b` (slice indices).
#[derive(Copy, Clone, Debug)]
pub struct ContactPair {
    pub a: usize,
    pub b: usize,
    pub contact: Contact,
}

/**
 * Full pipeline over a set of colliders: refresh world bounds, AABB broad
 * phase, then GJK + EPA per candidate pair. Collided flags are rewritten on
 * every call.
 */
pub fn detect(colliders: &mut [Collider]) -> RenderResult<Vec<ContactPair>> {
    for collider in colliders.iter_mut() {
        collider.update_world_aabb();
        collider.collided = false;
    }

    let mut contacts = Vec::new();
    for i in 0..colliders.len() {
        for j in (i + 1)..colliders.len() {
            if !colliders[i].world_aabb.overlaps(colliders[j].world_aabb) {
                continue;
            }
            let Some(simplex) = intersect(&colliders[i], &colliders[j])? else {
                continue;
            };
            let contact = penetration(&colliders[i], &colliders[j], &simplex)?;
            colliders[i].collided = true;
            colliders[j].collided = true;
            contacts.push(ContactPair { a: i, b: j, contact });
        }
    }
    Ok(contacts)
}

/// Runs [`detect`] over a scene's colliders, writing the collided flags
/// back through the scene interface.
pub fn detect_scene(scene: &mut dyn Scene) -> RenderResult<Vec<ContactPair>> {
    let mut snapshot: Vec<Collider> = Vec::new();
    scene.for_each_collider(&mut |collider| snapshot.push(collider.clone()));
    let contacts = detect(&mut snapshot)?;
    let mut index = 0;
    scene.for_each_collider(&mut |collider| {
        if let Some(updated) = snapshot.get(index) {
            collider.world_aabb = updated.world_aabb;
            collider.collided = updated.collided;
        }
        index += 1;
    });
    Ok(contacts)
}

#[cfg(test)]
mod test {

    use glam::{Quat, Vec3};
    use super::{detect, Collider};

    fn cube_at(x: f32) -> Collider {
        Collider::cuboid(Vec3::splat(0.5), Vec3::new(x, 0.0, 0.0), Quat::IDENTITY)
    }

    #[test]
    fn flags_follow_pairwise_results() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut colliders = vec![cube_at(0.0), cube_at(0.6), cube_at(5.0)];
        let contacts = detect(&mut colliders).unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!((contacts[0].a, contacts[0].b), (0, 1));
        assert!(colliders[0].collided);
        assert!(colliders[1].collided);
        assert!(!colliders[2].collided);
    }

    #[test]
    fn flags_reset_between_runs() {
        let mut colliders = vec![cube_at(0.0), cube_at(0.6)];
        detect(&mut colliders).unwrap();
        assert!(colliders[0].collided);

        colliders[1].translation.x = 5.0;
        detect(&mut colliders).unwrap();
        assert!(!colliders[0].collided);
        assert!(!colliders[1].collided);
    }

    #[test]
    fn world_aabb_accounts_for_rotation() {
        let mut collider = Collider::cuboid(
            Vec3::new(1.0, 0.1, 0.1),
            Vec3::ZERO,
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        );
        collider.update_world_aabb();
        // A long X box rotated 90° about Z becomes long in Y.
        assert!(collider.world_aabb.extents.y > 0.9);
        assert!(collider.world_aabb.extents.x < 0.2);
    }
}
