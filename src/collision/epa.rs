use glam::Vec3;
use crate::{RenderError, RenderResult};
use super::gjk::support;
use super::simplex::{Simplex, SupportPoint};
use super::Collider;

/// Acceptance tolerance on the support distance; also added to the reported
/// depth so resolution pushes shapes fully apart.
const EPSILON: f32 = 1e-3;

const MAX_ITERATIONS: usize = 64;

/// One resolved penetration between two bodies.
#[derive(Copy, Clone, Debug)]
pub struct Contact {
    /// Unit normal in world space, pointing from body A into body B.
    pub normal: Vec3,
    /// Penetration depth along the normal, always positive.
    pub depth: f32,
    /// Contact position in body A's local frame.
    pub local_a: Vec3,
    /// Contact position in body B's local frame.
    pub local_b: Vec3,
}

/// Expanding polytope over the Minkowski difference.
struct Polytope {
    vertices: Vec<SupportPoint>,
    faces: Vec<[usize; 3]>,
    /// Outward normal and distance-to-origin per face.
    normals: Vec<(Vec3, f32)>,
}

impl Polytope {

    fn from_simplex(simplex: &Simplex) -> RenderResult<Self> {
        if simplex.len() != 4 {
            return Err(RenderError::GjkDegenerate("penetration needs a tetrahedron"));
        }
        let mut polytope = Self {
            vertices: simplex.points().to_vec(),
            faces: Vec::new(),
            normals: Vec::new(),
        };
        for face in [[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]] {
            polytope.push_face(face)?;
        }
        Ok(polytope)
    }

    /// Appends a face, rewinding it so the stored order matches the outward
    /// normal. Consistent winding is what makes silhouette twins cancel.
    fn push_face(&mut self, mut face: [usize; 3]) -> RenderResult<()> {
        let (a, b, c) = (
            self.vertices[face[0]].w,
            self.vertices[face[1]].w,
            self.vertices[face[2]].w,
        );
        let normal = (b - a).cross(c - a);
        if normal.length_squared() < f32::EPSILON {
            return Err(RenderError::GjkDegenerate("flat polytope face"));
        }
        let mut normal = normal.normalize();
        let mut distance = normal.dot(a);
        if distance < 0.0 {
            face.swap(1, 2);
            normal = -normal;
            distance = -distance;
        }
        self.faces.push(face);
        self.normals.push((normal, distance));
        Ok(())
    }

    fn min_face(&self) -> usize {
        let mut best = 0;
        for (i, (_, distance)) in self.normals.iter().enumerate() {
            if *distance < self.normals[best].1 {
                best = i;
            }
        }
        best
    }

    /// Removes every face visible from `point`, collecting the silhouette:
    /// edges that belonged to exactly one removed face.
    fn carve(&mut self, point: Vec3) -> Vec<(usize, usize)> {
        let mut silhouette: Vec<(usize, usize)> = Vec::new();
        let mut i = 0;
        while i < self.faces.len() {
            let (normal, _) = self.normals[i];
            let face = self.faces[i];
            if normal.dot(point - self.vertices[face[0]].w) > 0.0 {
                for (from, to) in [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])] {
                    // A reversed twin means the edge is interior to the
                    // removed region; both copies cancel.
                    if let Some(pos) = silhouette.iter().position(|&(f, t)| f == to && t == from) {
                        silhouette.swap_remove(pos);
                    } else {
                        silhouette.push((from, to));
                    }
                }
                self.faces.swap_remove(i);
                self.normals.swap_remove(i);
            } else {
                i += 1;
            }
        }
        silhouette
    }

    fn extend(&mut self, point: SupportPoint, silhouette: &[(usize, usize)]) -> RenderResult<()> {
        let new_index = self.vertices.len();
        self.vertices.push(point);
        for &(from, to) in silhouette {
            self.push_face([from, to, new_index])?;
        }
        Ok(())
    }
}

/**
 * EPA: expands the GJK tetrahedron toward the Minkowski boundary until the
 * nearest face stops moving, then reads the penetration normal and depth off
 * that face and maps the contact back into each body's local frame.
 */
pub fn penetration(a: &Collider, b: &Collider, simplex: &Simplex) -> RenderResult<Contact> {
    let mut polytope = Polytope::from_simplex(simplex)?;

    let mut min = polytope.min_face();
    for _ in 0..MAX_ITERATIONS {
        let (normal, distance) = polytope.normals[min];
        let point = support(a, b, normal);
        if (point.w.dot(normal) - distance).abs() <= EPSILON {
            break;
        }
        let silhouette = polytope.carve(point.w);
        if silhouette.is_empty() {
            break;
        }
        polytope.extend(point, &silhouette)?;
        min = polytope.min_face();
    }

    let (normal, distance) = polytope.normals[min];
    let face = polytope.faces[min];
    let (p0, p1, p2) = (
        polytope.vertices[face[0]],
        polytope.vertices[face[1]],
        polytope.vertices[face[2]],
    );

    // Closest point to the origin on the face, in barycentric terms; the
    // same weights locate the witness points on each body.
    let projected = normal * distance;
    let (u, v, w) = barycentric(projected, p0.w, p1.w, p2.w);
    let world_a = p0.on_a * u + p1.on_a * v + p2.on_a * w;
    let world_b = p0.on_b * u + p1.on_b * v + p2.on_b * w;

    Ok(Contact {
        normal,
        depth: distance + EPSILON,
        local_a: a.to_local(world_a),
        local_b: b.to_local(world_b),
    })
}

fn barycentric(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> (f32, f32, f32) {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;
    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);
    let denominator = d00 * d11 - d01 * d01;
    if denominator.abs() < f32::EPSILON {
        return (1.0, 0.0, 0.0);
    }
    let v = (d11 * d20 - d01 * d21) / denominator;
    let w = (d00 * d21 - d01 * d20) / denominator;
    (1.0 - v - w, v, w)
}

#[cfg(test)]
mod test {

    use glam::{Quat, Vec3};
    use crate::collision::gjk;
    use crate::Collider;
    use super::penetration;

    fn cube_at(translation: Vec3) -> Collider {
        Collider::cuboid(Vec3::splat(0.5), translation, Quat::IDENTITY)
    }

    #[test]
    fn x_overlap_depth_and_normal() {
        // Unit cubes, centers 0.7 apart on X: 0.3 of interpenetration.
        let a = cube_at(Vec3::ZERO);
        let b = cube_at(Vec3::new(0.7, 0.0, 0.0));
        let simplex = gjk::intersect(&a, &b).unwrap().unwrap();
        let contact = penetration(&a, &b, &simplex).unwrap();

        assert!((contact.depth - 0.3).abs() < 0.01, "depth {}", contact.depth);
        assert!(contact.normal.x.abs() > 0.99, "normal {}", contact.normal);
        assert!(contact.normal.y.abs() < 1e-3);
        assert!(contact.normal.z.abs() < 1e-3);
    }

    #[test]
    fn witness_points_lie_on_each_body(){
        let a = cube_at(Vec3::ZERO);
        let b = cube_at(Vec3::new(0.0, 0.8, 0.0));
        let simplex = gjk::intersect(&a, &b).unwrap().unwrap();
        let contact = penetration(&a, &b, &simplex).unwrap();

        // Local positions stay within the half extents (small tolerance for
        // the expansion epsilon).
        for local in [contact.local_a, contact.local_b] {
            assert!(local.abs().max_element() <= 0.5 + 1e-2, "local {local}");
        }
    }

    #[test]
    fn deeper_overlap_reports_larger_depth() {
        let a = cube_at(Vec3::ZERO);
        let shallow = cube_at(Vec3::new(0.9, 0.0, 0.0));
        let deep = cube_at(Vec3::new(0.6, 0.0, 0.0));

        let s1 = gjk::intersect(&a, &shallow).unwrap().unwrap();
        let s2 = gjk::intersect(&a, &deep).unwrap().unwrap();
        let c1 = penetration(&a, &shallow, &s1).unwrap();
        let c2 = penetration(&a, &deep, &s2).unwrap();
        assert!(c2.depth > c1.depth);
    }
}
