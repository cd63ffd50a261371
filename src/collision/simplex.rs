use std::ops::Index;
use glam::Vec3;

/// One support-function sample: the Minkowski-difference point plus the
/// world-space witness points on each body that produced it.
#[derive(Copy, Clone, PartialEq, Default, Debug)]
pub struct SupportPoint {
    pub w: Vec3,
    pub on_a: Vec3,
    pub on_b: Vec3,
}

/**
 * GJK working set: 1 to 4 support points forming a point, segment, triangle
 * or tetrahedron. The most recently added point is always at index 0.
 */
#[derive(Copy, Clone, Debug)]
pub struct Simplex {
    points: [SupportPoint; 4],
    len: usize,
}

impl Simplex {

    pub fn new(first: SupportPoint) -> Self {
        let mut points = [SupportPoint::default(); 4];
        points[0] = first;
        Self { points, len: 1 }
    }

    /// Inserts at index 0, shifting the rest back. A fifth point pushes the
    /// oldest one out.
    pub fn push_front(&mut self, point: SupportPoint) {
        self.points.copy_within(0..3, 1);
        self.points[0] = point;
        self.len = (self.len + 1).min(4);
    }

    /// Replaces the contents, preserving the given order.
    pub fn assign(&mut self, points: &[SupportPoint]) {
        debug_assert!((1..=4).contains(&points.len()));
        self.points[..points.len()].copy_from_slice(points);
        self.len = points.len();
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn points(&self) -> &[SupportPoint] {
        &self.points[..self.len]
    }
}

impl Index<usize> for Simplex {
    type Output = SupportPoint;
    fn index(&self, index: usize) -> &SupportPoint {
        debug_assert!(index < self.len);
        &self.points[index]
    }
}

#[cfg(test)]
mod test {

    use glam::Vec3;
    use super::{Simplex, SupportPoint};

    fn p(x: f32) -> SupportPoint {
        SupportPoint { w: Vec3::new(x, 0.0, 0.0), ..Default::default() }
    }

    #[test]
    fn push_front_keeps_newest_at_zero() {
        let mut s = Simplex::new(p(1.0));
        s.push_front(p(2.0));
        s.push_front(p(3.0));
        assert_eq!(s.len(), 3);
        assert_eq!(s[0].w.x, 3.0);
        assert_eq!(s[1].w.x, 2.0);
        assert_eq!(s[2].w.x, 1.0);
    }

    #[test]
    fn fifth_point_evicts_the_oldest() {
        let mut s = Simplex::new(p(1.0));
        for x in [2.0, 3.0, 4.0, 5.0] {
            s.push_front(p(x));
        }
        assert_eq!(s.len(), 4);
        assert_eq!(s[0].w.x, 5.0);
        assert_eq!(s[3].w.x, 2.0);
    }

    #[test]
    fn assign_reduces() {
        let mut s = Simplex::new(p(1.0));
        s.push_front(p(2.0));
        s.push_front(p(3.0));
        let reduced = [s[0], s[2]];
        s.assign(&reduced);
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].w.x, 3.0);
        assert_eq!(s[1].w.x, 1.0);
    }
}
