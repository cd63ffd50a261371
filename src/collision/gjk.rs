use glam::Vec3;
use crate::{RenderError, RenderResult};
use super::simplex::{Simplex, SupportPoint};
use super::Collider;

const MAX_ITERATIONS: usize = 64;

/// Squared-length cutoff below which a search direction is degenerate.
const DEGENERATE_EPSILON: f32 = 1e-10;

/// Support of the Minkowski difference `A - B` in world direction `d`.
pub(crate) fn support(a: &Collider, b: &Collider, d: Vec3) -> SupportPoint {
    let on_a = a.farthest_world(d);
    let on_b = b.farthest_world(-d);
    SupportPoint { w: on_a - on_b, on_a, on_b }
}

/**
 * GJK intersection test between two convex point sets.
 *
 * Returns the enclosing tetrahedron on intersection (the input to EPA), or
 * `None` when the shapes are separated. Shapes that merely touch — the
 * origin on the Minkowski boundary — count as separated.
 */
pub fn intersect(a: &Collider, b: &Collider) -> RenderResult<Option<Simplex>> {
    if a.points.is_empty() || b.points.is_empty() {
        return Err(RenderError::GjkDegenerate("empty point set"));
    }

    let first = support(a, b, Vec3::X);
    let mut simplex = Simplex::new(first);
    let mut direction = -first.w;

    for _ in 0..MAX_ITERATIONS {
        let point = support(a, b, direction);
        if point.w.dot(direction) <= 0.0 {
            return Ok(None);
        }
        simplex.push_front(point);
        if next_simplex(&mut simplex, &mut direction) {
            return Ok(Some(simplex));
        }
    }
    // No convergence; report separation rather than loop forever.
    Ok(None)
}

/// Runs the update rule for the current simplex size. True when the origin
/// is enclosed.
fn next_simplex(simplex: &mut Simplex, direction: &mut Vec3) -> bool {
    match simplex.len() {
        2 => segment(simplex, direction),
        3 => triangle(simplex, direction),
        4 => tetrahedron(simplex, direction),
        _ => false,
    }
}

fn segment(simplex: &mut Simplex, direction: &mut Vec3) -> bool {
    let (a, b) = (simplex[0], simplex[1]);
    let ab = b.w - a.w;
    let ao = -a.w;
    if ab.dot(ao) > 0.0 {
        let perpendicular = ab.cross(ao).cross(ab);
        // The origin on the line through the segment makes the doubled cross
        // product vanish; any direction perpendicular to the segment works.
        *direction = if perpendicular.length_squared() > DEGENERATE_EPSILON {
            perpendicular
        } else {
            ab.any_orthogonal_vector()
        };
    } else {
        simplex.assign(&[a]);
        *direction = ao;
    }
    false
}

fn triangle(simplex: &mut Simplex, direction: &mut Vec3) -> bool {
    let (a, b, c) = (simplex[0], simplex[1], simplex[2]);
    let ab = b.w - a.w;
    let ac = c.w - a.w;
    let ao = -a.w;
    let normal = ab.cross(ac);

    // Collinear vertices span no plane; retry as the newest edge.
    if normal.length_squared() <= DEGENERATE_EPSILON {
        simplex.assign(&[a, b]);
        return segment(simplex, direction);
    }

    if normal.cross(ac).dot(ao) > 0.0 {
        if ac.dot(ao) > 0.0 {
            simplex.assign(&[a, c]);
            *direction = ac.cross(ao).cross(ac);
        } else {
            simplex.assign(&[a, b]);
            return segment(simplex, direction);
        }
    } else if ab.cross(normal).dot(ao) > 0.0 {
        simplex.assign(&[a, b]);
        return segment(simplex, direction);
    } else if normal.dot(ao) > 0.0 {
        *direction = normal;
    } else {
        // Origin below the triangle: flip winding so the normal faces it.
        simplex.assign(&[a, c, b]);
        *direction = -normal;
    }
    false
}

fn tetrahedron(simplex: &mut Simplex, direction: &mut Vec3) -> bool {
    let (a, b, c, d) = (simplex[0], simplex[1], simplex[2], simplex[3]);
    let ab = b.w - a.w;
    let ac = c.w - a.w;
    let ad = d.w - a.w;
    let ao = -a.w;

    let abc = ab.cross(ac);
    let acd = ac.cross(ad);
    let adb = ad.cross(ab);

    if abc.dot(ao) > 0.0 {
        simplex.assign(&[a, b, c]);
        return triangle(simplex, direction);
    }
    if acd.dot(ao) > 0.0 {
        simplex.assign(&[a, c, d]);
        return triangle(simplex, direction);
    }
    if adb.dot(ao) > 0.0 {
        simplex.assign(&[a, d, b]);
        return triangle(simplex, direction);
    }
    true
}

#[cfg(test)]
mod test {

    use glam::{Quat, Vec3};
    use crate::Collider;
    use super::intersect;

    fn cube_at(translation: Vec3) -> Collider {
        Collider::cuboid(Vec3::splat(0.5), translation, Quat::IDENTITY)
    }

    #[test]
    fn overlapping_cubes_intersect() {
        let a = cube_at(Vec3::ZERO);
        let b = cube_at(Vec3::new(0.5, 0.0, 0.0));
        let simplex = intersect(&a, &b).unwrap();
        assert!(simplex.is_some());
        assert_eq!(simplex.unwrap().len(), 4);
    }

    #[test]
    fn symmetric_overlap_with_collinear_supports() {
        // Axis-aligned overlap puts the first two supports and the origin on
        // one line; the segment rule must still pick a usable direction.
        let a = cube_at(Vec3::ZERO);
        let b = cube_at(Vec3::new(0.7, 0.0, 0.0));
        assert!(intersect(&a, &b).unwrap().is_some());
    }

    #[test]
    fn coincident_cubes_intersect() {
        let a = cube_at(Vec3::ZERO);
        let b = cube_at(Vec3::ZERO);
        assert!(intersect(&a, &b).unwrap().is_some());
    }

    #[test]
    fn separated_cubes_do_not_intersect() {
        let a = cube_at(Vec3::ZERO);
        let b = cube_at(Vec3::new(2.0, 0.0, 0.0));
        assert!(intersect(&a, &b).unwrap().is_none());
    }

    #[test]
    fn edge_touching_cubes_do_not_intersect() {
        // Faces flush at x = 0.5: the origin sits exactly on the Minkowski
        // boundary, which counts as separated.
        let a = cube_at(Vec3::ZERO);
        let b = cube_at(Vec3::new(1.0, 0.0, 0.0));
        assert!(intersect(&a, &b).unwrap().is_none());
    }

    #[test]
    fn rotated_cube_still_detected() {
        let a = cube_at(Vec3::ZERO);
        let b = Collider::cuboid(
            Vec3::splat(0.5),
            Vec3::new(0.9, 0.0, 0.0),
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_4),
        );
        // Rotated 45° about Z, the corner reaches x ≈ 0.9 - 0.707 < 0.5.
        assert!(intersect(&a, &b).unwrap().is_some());
    }

    #[test]
    fn empty_point_set_is_degenerate() {
        let a = Collider::new(Vec3::ZERO, Quat::IDENTITY, vec![]);
        let b = cube_at(Vec3::ZERO);
        assert!(intersect(&a, &b).is_err());
    }
}
