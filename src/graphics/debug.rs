use std::path::Path;
use glam::Vec3;
use crate::{
    Buffer, BufferFlags, Color, CompareFunc, Frustum, GraphicsState, MeshData, MeshVariant,
    PipelineState, Plane, Primitive, Program, RenderResult, RenderTarget, Sphere, Vao, AABB,
};
use super::phong::bind_view_block;

/// Length stand-in for unbounded shapes (rays, planes).
pub const FAR_SCALER: f32 = 1000.0;

/// One overlay shape. Unbounded shapes are drawn at [`FAR_SCALER`] scale.
#[derive(Copy, Clone, Debug)]
pub enum DebugShape {
    Line { start: Vec3, end: Vec3 },
    Ray { origin: Vec3, direction: Vec3 },
    Triangle { a: Vec3, b: Vec3, c: Vec3 },
    Quad { corners: [Vec3; 4] },
    Cuboid(AABB),
    Sphere(Sphere),
    Cylinder { base: Vec3, top: Vec3, radius: f32 },
    Plane(Plane),
    Frustum(Frustum),
}

/// Streaming vertex source: geometry rebuilt every frame, buffers grown as
/// needed and re-attached on growth.
struct StreamingBatch {
    data: MeshData,
    vao: Vao,
    vertices: Buffer,
    indices: Buffer,
    layout_set: bool,
    scratch: Vec<u8>,
}

impl StreamingBatch {

    fn new(primitive: Primitive) -> Self {
        Self {
            data: MeshData::new(primitive, MeshVariant::COLOR),
            vao: Vao::new(),
            vertices: Buffer::new(BufferFlags::DYNAMIC_STORAGE),
            indices: Buffer::new(BufferFlags::DYNAMIC_STORAGE),
            layout_set: false,
            scratch: Vec::new(),
        }
    }

    /// Uploads this frame's geometry and points the VAO at it.
    fn upload(&mut self) -> RenderResult<bool> {
        if self.data.positions.is_empty() {
            return Ok(false);
        }
        let layout = self.data.variant().layout();
        self.scratch.clear();
        self.data.pack_vertices(&mut self.scratch);

        if self.scratch.len() > self.vertices.size() {
            self.vertices.resize(self.scratch.len().next_power_of_two())?;
        }
        self.vertices.write_sub(0, &self.scratch)?;
        self.vao.attach_vertex_buffer(&self.vertices, 0, 0, layout.stride);

        let index_bytes = self.data.indices.len() * std::mem::size_of::<u32>();
        if index_bytes > self.indices.size() {
            self.indices.resize(index_bytes.next_power_of_two())?;
        }
        self.indices.write_sub(0, &self.data.indices)?;
        self.vao.attach_element_buffer(&self.indices, self.data.indices.len());

        if !self.layout_set {
            self.vao
                .set_vertex_attrib_pointers(self.data.primitive, &layout.attributes)?;
            self.layout_set = true;
        }
        Ok(true)
    }
}

/**
 * Immediate-mode overlay: queue shapes with [`add`](DebugRenderer::add)
 * during the frame, then [`render`](DebugRenderer::render) flushes them in
 * two draws (lines, triangles) and clears the queue.
 */
pub struct DebugRenderer {
    program: Program,
    lines: StreamingBatch,
    triangles: StreamingBatch,
}

impl DebugRenderer {

    pub fn new(shader_dir: &Path) -> RenderResult<Self> {
        Ok(Self {
            program: Program::load(shader_dir, "debug")?,
            lines: StreamingBatch::new(Primitive::Lines),
            triangles: StreamingBatch::new(Primitive::Triangles),
        })
    }

    pub fn add(&mut self, shape: DebugShape, color: Color) {
        match shape {
            DebugShape::Line { start, end } => self.lines.data.add_line(start, end, color),
            DebugShape::Ray { origin, direction } => {
                let end = origin + direction.normalize_or_zero() * FAR_SCALER;
                self.lines.data.add_line(origin, end, color);
            }
            DebugShape::Triangle { a, b, c } => self.triangles.data.add_triangle(a, b, c, color),
            DebugShape::Quad { corners } => self.triangles.data.add_quad(corners, color),
            DebugShape::Cuboid(aabb) => {
                self.triangles.data.add_cuboid(aabb.center, aabb.extents, color)
            }
            DebugShape::Sphere(sphere) => {
                self.triangles.data.add_icosphere(sphere.center, sphere.radius, 2, color)
            }
            DebugShape::Cylinder { base, top, radius } => {
                self.triangles.data.add_cylinder(base, top, radius, 16, color)
            }
            DebugShape::Plane(plane) => add_plane(&mut self.triangles.data, plane, color),
            DebugShape::Frustum(frustum) => self.add_frustum(frustum, color),
        }
    }

    /// Wireframe frustum from its eight corners, or one quad per plane when
    /// any defining triple is parallel.
    fn add_frustum(&mut self, frustum: Frustum, color: Color) {
        match frustum_corners(&frustum) {
            Some(c) => {
                // Near ring, far ring, connecting edges.
                let rings = [
                    [c[0], c[1], c[3], c[2]],
                    [c[4], c[5], c[7], c[6]],
                ];
                for ring in rings {
                    for i in 0..4 {
                        self.lines.data.add_line(ring[i], ring[(i + 1) % 4], color);
                    }
                }
                for i in 0..4 {
                    self.lines.data.add_line(c[i], c[i + 4], color);
                }
            }
            None => {
                for plane in frustum.planes() {
                    add_plane(&mut self.triangles.data, plane, color);
                }
            }
        }
    }

    /// Flushes queued shapes: one line draw, one triangle draw, then resets.
    pub fn render(&mut self, gpu: &mut GraphicsState, target: &mut RenderTarget) -> RenderResult<()> {
        bind_view_block(gpu, &mut self.program)?;
        let pipeline = PipelineState {
            depth_test: Some(CompareFunc::Less),
            cull: None,
            ..Default::default()
        };
        for batch in [&mut self.lines, &mut self.triangles] {
            if batch.upload()? {
                let call = gpu.draw_call().with_pipeline(pipeline);
                call.submit(gpu, &mut self.program, &batch.vao, target)?;
            }
        }
        self.clear();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.data.clear();
        self.triangles.data.clear();
    }
}

fn add_plane(tris: &mut MeshData, plane: Plane, color: Color) {
    let center = plane.closest_to_origin();
    let helper = if plane.normal.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y };
    let u = plane.normal.cross(helper).normalize_or_zero() * (FAR_SCALER * 0.5);
    let v = plane.normal.cross(u).normalize_or_zero() * (FAR_SCALER * 0.5);
    tris.add_quad(
        [center - u - v, center + u - v, center + u + v, center - u + v],
        color,
    );
}

/// Intersection point of three planes (`n·p = d` each), or `None` when any
/// pair is near parallel.
fn intersect_planes(p1: Plane, p2: Plane, p3: Plane) -> Option<Vec3> {
    let denominator = p1.normal.dot(p2.normal.cross(p3.normal));
    if denominator.abs() < 1e-6 {
        return None;
    }
    let numerator = p2.normal.cross(p3.normal) * p1.distance
        + p3.normal.cross(p1.normal) * p2.distance
        + p1.normal.cross(p2.normal) * p3.distance;
    Some(numerator / denominator)
}

/// Eight corners ordered near(bl, br, tl, tr) then far(bl, br, tl, tr).
fn frustum_corners(frustum: &Frustum) -> Option<[Vec3; 8]> {
    let f = frustum;
    Some([
        intersect_planes(f.near, f.bottom, f.left)?,
        intersect_planes(f.near, f.bottom, f.right)?,
        intersect_planes(f.near, f.top, f.left)?,
        intersect_planes(f.near, f.top, f.right)?,
        intersect_planes(f.far, f.bottom, f.left)?,
        intersect_planes(f.far, f.bottom, f.right)?,
        intersect_planes(f.far, f.top, f.left)?,
        intersect_planes(f.far, f.top, f.right)?,
    ])
}

#[cfg(test)]
mod test {

    use glam::{Mat4, Vec3};
    use crate::Frustum;
    use super::{frustum_corners, intersect_planes};
    use crate::Plane;

    #[test]
    fn axis_planes_intersect_at_point() {
        let p = intersect_planes(
            Plane::new(Vec3::X, 2.0),
            Plane::new(Vec3::Y, -1.0),
            Plane::new(Vec3::Z, 3.0),
        )
        .unwrap();
        assert_eq!(p, Vec3::new(2.0, -1.0, 3.0));
    }

    #[test]
    fn parallel_planes_have_no_intersection() {
        let a = Plane::new(Vec3::X, 0.0);
        let b = Plane::new(Vec3::X, 1.0);
        let c = Plane::new(Vec3::Y, 0.0);
        assert!(intersect_planes(a, b, c).is_none());
    }

    #[test]
    fn orthographic_frustum_corners_recovered() {
        let clip = Mat4::orthographic_rh(-2.0, 2.0, -1.0, 1.0, 0.1, 10.0);
        let corners = frustum_corners(&Frustum::from(clip)).unwrap();
        // Ortho RH: near plane at z = -0.1, far at z = -10.
        let near_bl = corners[0];
        assert!((near_bl - Vec3::new(-2.0, -1.0, -0.1)).length() < 1e-3);
        let far_tr = corners[7];
        assert!((far_tr - Vec3::new(2.0, 1.0, -10.0)).length() < 1e-3);
    }
}
