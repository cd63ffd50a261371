use std::mem::size_of;
use std::f32::consts::PI;
use bytemuck::bytes_of;
use glam::{Vec2, Vec3};
use bitflags::bitflags;
use crate::{
    Buffer, BufferFlags, Color, ComponentType, Primitive, RenderResult, Vao, VertexAttrib, AABB,
};

bitflags! {
    /// Which vertex attributes a mesh carries, beyond position.
    /// Determines the interleaved layout and the shader attribute set.
    #[derive(Copy, Clone, Eq, PartialEq, Default, Debug)]
    pub struct MeshVariant: u8 {
        const NONE      = 0b00000000;
        const COLOR     = 0b00000001;
        const NORMAL    = 0b00000010;
        const UV        = 0b00000100;
    }
}

/// Interleaved attribute layout for a [`MeshVariant`].
#[derive(Default, Debug)]
pub struct MeshLayout {
    pub stride: usize,
    pub attributes: Vec<VertexAttrib>,
}

impl MeshVariant {

    pub const POSITION_LOCATION: u32    = 0;
    pub const COLOR_LOCATION: u32       = 1;
    pub const NORMAL_LOCATION: u32      = 2;
    pub const UV_LOCATION: u32          = 3;

    pub fn layout(self) -> MeshLayout {
        let mut layout = MeshLayout::default();
        let mut offset = 0u32;
        let mut push = |location: u32, components: i32, bytes: usize, offset: &mut u32| {
            layout.attributes.push(VertexAttrib {
                location,
                components,
                component_type: ComponentType::F32,
                relative_offset: *offset,
                binding: 0,
                normalized: false,
            });
            *offset += bytes as u32;
        };
        push(Self::POSITION_LOCATION, 3, size_of::<Vec3>(), &mut offset);
        if self.contains(Self::COLOR) {
            push(Self::COLOR_LOCATION, 4, size_of::<Color>(), &mut offset);
        }
        if self.contains(Self::NORMAL) {
            push(Self::NORMAL_LOCATION, 3, size_of::<Vec3>(), &mut offset);
        }
        if self.contains(Self::UV) {
            push(Self::UV_LOCATION, 2, size_of::<Vec2>(), &mut offset);
        }
        layout.stride = offset as usize;
        layout
    }
}

/**
 * CPU-side mesh accumulator: positions plus optional color/normal/uv
 * channels, with indices. Primitive-shape helpers append tessellated
 * geometry; [`upload`](MeshData::upload) emits a ready-to-draw [`Mesh`].
 */
#[derive(Clone, Default, Debug)]
pub struct MeshData {
    pub primitive: Primitive,
    pub positions:  Vec<Vec3>,
    pub colors:     Option<Vec<Color>>,
    pub normals:    Option<Vec<Vec3>>,
    pub uvs:        Option<Vec<Vec2>>,
    pub indices:    Vec<u32>,
}

impl MeshData {

    pub fn new(primitive: Primitive, variant: MeshVariant) -> Self {
        Self {
            primitive,
            positions: Vec::new(),
            colors: variant.contains(MeshVariant::COLOR).then(Vec::new),
            normals: variant.contains(MeshVariant::NORMAL).then(Vec::new),
            uvs: variant.contains(MeshVariant::UV).then(Vec::new),
            indices: Vec::new(),
        }
    }

    pub fn variant(&self) -> MeshVariant {
        let mut variant = MeshVariant::NONE;
        if self.colors.is_some() {
            variant |= MeshVariant::COLOR;
        }
        if self.normals.is_some() {
            variant |= MeshVariant::NORMAL;
        }
        if self.uvs.is_some() {
            variant |= MeshVariant::UV;
        }
        variant
    }

    fn push_vertex(&mut self, position: Vec3, normal: Vec3, uv: Vec2, color: Color) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        if let Some(colors) = &mut self.colors {
            colors.push(color);
        }
        if let Some(normals) = &mut self.normals {
            normals.push(normal);
        }
        if let Some(uvs) = &mut self.uvs {
            uvs.push(uv);
        }
        index
    }

    /// A line segment; only meaningful for `Primitive::Lines` data.
    pub fn add_line(&mut self, a: Vec3, b: Vec3, color: Color) {
        let dir = (b - a).normalize_or_zero();
        let i = self.push_vertex(a, dir, Vec2::ZERO, color);
        self.push_vertex(b, dir, Vec2::ONE, color);
        self.indices.push(i);
        self.indices.push(i + 1);
    }

    pub fn add_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3, color: Color) {
        let normal = (b - a).cross(c - a).normalize_or_zero();
        let i0 = self.push_vertex(a, normal, Vec2::new(0.0, 0.0), color);
        let i1 = self.push_vertex(b, normal, Vec2::new(1.0, 0.0), color);
        let i2 = self.push_vertex(c, normal, Vec2::new(0.5, 1.0), color);
        self.indices.extend([i0, i1, i2]);
    }

    /// Quad from four corners in counter-clockwise order.
    pub fn add_quad(&mut self, corners: [Vec3; 4], color: Color) {
        let [a, b, c, d] = corners;
        let normal = (b - a).cross(d - a).normalize_or_zero();
        let i0 = self.push_vertex(a, normal, Vec2::new(0.0, 0.0), color);
        let i1 = self.push_vertex(b, normal, Vec2::new(1.0, 0.0), color);
        let i2 = self.push_vertex(c, normal, Vec2::new(1.0, 1.0), color);
        let i3 = self.push_vertex(d, normal, Vec2::new(0.0, 1.0), color);
        self.indices.extend([i0, i1, i2, i2, i3, i0]);
    }

    pub fn add_cuboid(&mut self, center: Vec3, half_extents: Vec3, color: Color) {
        let half = half_extents;

        // 8 points on a cube
        let lbf = center + Vec3::new(-half.x, -half.y, -half.z);
        let rbf = center + Vec3::new( half.x, -half.y, -half.z);
        let ltf = center + Vec3::new(-half.x,  half.y, -half.z);
        let rtf = center + Vec3::new( half.x,  half.y, -half.z);
        let lbn = center + Vec3::new(-half.x, -half.y,  half.z);
        let rbn = center + Vec3::new( half.x, -half.y,  half.z);
        let ltn = center + Vec3::new(-half.x,  half.y,  half.z);
        let rtn = center + Vec3::new( half.x,  half.y,  half.z);

        self.add_quad([lbf, lbn, ltn, ltf], color); // LEFT
        self.add_quad([rbn, rbf, rtf, rtn], color); // RIGHT
        self.add_quad([lbf, rbf, rbn, lbn], color); // BOTTOM
        self.add_quad([ltn, rtn, rtf, ltf], color); // TOP
        self.add_quad([lbn, rbn, rtn, ltn], color); // NEAR
        self.add_quad([rbf, lbf, ltf, rtf], color); // FAR
    }

    /// Open cone from a base disc to an apex.
    pub fn add_cone(&mut self, base: Vec3, top: Vec3, radius: f32, segments: u32, color: Color) {
        let (u, v) = circle_basis(top - base);
        let segments = segments.max(3);
        for s in 0..segments {
            let a0 = 2.0 * PI * s as f32 / segments as f32;
            let a1 = 2.0 * PI * (s + 1) as f32 / segments as f32;
            let p0 = base + (u * a0.cos() + v * a0.sin()) * radius;
            let p1 = base + (u * a1.cos() + v * a1.sin()) * radius;
            self.add_triangle(p0, p1, top, color);
            self.add_triangle(p1, p0, base, color);
        }
    }

    pub fn add_cylinder(&mut self, base: Vec3, top: Vec3, radius: f32, segments: u32, color: Color) {
        let (u, v) = circle_basis(top - base);
        let segments = segments.max(3);
        for s in 0..segments {
            let a0 = 2.0 * PI * s as f32 / segments as f32;
            let a1 = 2.0 * PI * (s + 1) as f32 / segments as f32;
            let r0 = u * a0.cos() + v * a0.sin();
            let r1 = u * a1.cos() + v * a1.sin();
            let b0 = base + r0 * radius;
            let b1 = base + r1 * radius;
            let t0 = top + r0 * radius;
            let t1 = top + r1 * radius;
            self.add_quad([b0, b1, t1, t0], color);
            self.add_triangle(b1, b0, base, color);
            self.add_triangle(t0, t1, top, color);
        }
    }

    /// Icosahedron subdivided `subdivisions` times, every vertex re-projected
    /// onto the sphere. Shared vertices are not deduplicated.
    pub fn add_icosphere(&mut self, center: Vec3, radius: f32, subdivisions: u32, color: Color) {
        let t = (1.0 + 5.0f32.sqrt()) / 2.0;
        let mut vertices: Vec<Vec3> = [
            Vec3::new(-1.0,  t, 0.0), Vec3::new(1.0,  t, 0.0),
            Vec3::new(-1.0, -t, 0.0), Vec3::new(1.0, -t, 0.0),
            Vec3::new(0.0, -1.0,  t), Vec3::new(0.0, 1.0,  t),
            Vec3::new(0.0, -1.0, -t), Vec3::new(0.0, 1.0, -t),
            Vec3::new( t, 0.0, -1.0), Vec3::new( t, 0.0, 1.0),
            Vec3::new(-t, 0.0, -1.0), Vec3::new(-t, 0.0, 1.0),
        ]
        .iter()
        .map(|v| v.normalize())
        .collect();
        let mut faces: Vec<[u32; 3]> = vec![
            [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
            [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
            [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
            [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
        ];

        for _ in 0..subdivisions {
            let mut next = Vec::with_capacity(faces.len() * 4);
            for [a, b, c] in faces {
                let midpoint = |i: u32, j: u32, vertices: &mut Vec<Vec3>| -> u32 {
                    let m = ((vertices[i as usize] + vertices[j as usize]) * 0.5).normalize();
                    vertices.push(m);
                    vertices.len() as u32 - 1
                };
                let ab = midpoint(a, b, &mut vertices);
                let bc = midpoint(b, c, &mut vertices);
                let ca = midpoint(c, a, &mut vertices);
                next.extend([[a, ab, ca], [b, bc, ab], [c, ca, bc], [ab, bc, ca]]);
            }
            faces = next;
        }

        let base = self.positions.len() as u32;
        for unit in &vertices {
            let uv = Vec2::new(
                0.5 + unit.z.atan2(unit.x) / (2.0 * PI),
                0.5 - unit.y.asin() / PI,
            );
            self.push_vertex(center + *unit * radius, *unit, uv, color);
        }
        for [a, b, c] in &faces {
            self.indices.extend([base + a, base + b, base + c]);
        }
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.indices.clear();
        if let Some(colors) = &mut self.colors {
            colors.clear();
        }
        if let Some(normals) = &mut self.normals {
            normals.clear();
        }
        if let Some(uvs) = &mut self.uvs {
            uvs.clear();
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /**
     * Interleaves vertex data into a single packed byte array.
     */
    pub fn pack_vertices(&self, vertex_data: &mut Vec<u8>) {
        self.check_vertices();
        for i in 0..self.positions.len() {
            vertex_data.extend_from_slice(bytes_of(&self.positions[i]));
            if let Some(colors) = &self.colors {
                vertex_data.extend_from_slice(bytes_of(&colors[i]));
            }
            if let Some(normals) = &self.normals {
                vertex_data.extend_from_slice(bytes_of(&normals[i]));
            }
            if let Some(uvs) = &self.uvs {
                vertex_data.extend_from_slice(bytes_of(&uvs[i]));
            }
        }
    }

    /// Emits a drawable mesh: VAO + vertex buffer, plus an element buffer
    /// when indices were recorded.
    pub fn upload(&self) -> RenderResult<Mesh> {
        let layout = self.variant().layout();
        let mut bytes = Vec::with_capacity(self.positions.len() * layout.stride);
        self.pack_vertices(&mut bytes);

        let mut vertex_buffer = Buffer::new(BufferFlags::empty());
        vertex_buffer.upload(&bytes)?;

        let mut vao = Vao::new();
        vao.attach_vertex_buffer(&vertex_buffer, 0, 0, layout.stride);
        let index_buffer = if self.indices.is_empty() {
            None
        } else {
            let mut buf = Buffer::new(BufferFlags::empty());
            buf.upload(&self.indices)?;
            vao.attach_element_buffer(&buf, self.indices.len());
            Some(buf)
        };
        vao.set_vertex_attrib_pointers(self.primitive, &layout.attributes)?;

        Ok(Mesh {
            vao,
            vertex_buffer,
            index_buffer,
            local_bounds: AABB::from_points(&self.positions),
        })
    }

    // Checks that vertex buffers all have the same length.
    fn check_vertices(&self) {
        let num_vertices = self.positions.len();
        if let Some(colors) = &self.colors {
            assert_eq!(colors.len(), num_vertices, "color channel length mismatch");
        }
        if let Some(normals) = &self.normals {
            assert_eq!(normals.len(), num_vertices, "normal channel length mismatch");
        }
        if let Some(uvs) = &self.uvs {
            assert_eq!(uvs.len(), num_vertices, "uv channel length mismatch");
        }
    }
}

/// Orthonormal basis perpendicular to `axis`, for sweeping circles.
fn circle_basis(axis: Vec3) -> (Vec3, Vec3) {
    let axis = axis.normalize_or_zero();
    let helper = if axis.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y };
    let u = axis.cross(helper).normalize_or_zero();
    let v = axis.cross(u);
    (u, v)
}

/**
 * A ready-to-draw mesh: vertex array plus the buffers it references.
 */
#[derive(Debug)]
pub struct Mesh {
    pub vao: Vao,
    pub vertex_buffer: Buffer,
    pub index_buffer: Option<Buffer>,
    pub local_bounds: AABB,
}

#[cfg(test)]
mod test {

    use glam::Vec3;
    use crate::{Color, Primitive};
    use super::{MeshData, MeshVariant};

    #[test]
    fn cuboid_has_24_vertices_36_indices() {
        let mut data = MeshData::new(Primitive::Triangles, MeshVariant::NORMAL | MeshVariant::UV);
        data.add_cuboid(Vec3::ZERO, Vec3::splat(0.5), Color::WHITE);
        assert_eq!(data.positions.len(), 24);
        assert_eq!(data.indices.len(), 36);
        let normals = data.normals.as_ref().unwrap();
        assert_eq!(normals.len(), 24);
        for n in normals {
            assert!((n.length() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn icosphere_subdivision_counts() {
        let mut data = MeshData::new(Primitive::Triangles, MeshVariant::NORMAL);
        data.add_icosphere(Vec3::ZERO, 1.0, 0, Color::WHITE);
        assert_eq!(data.positions.len(), 12);
        assert_eq!(data.indices.len(), 60);

        let mut data = MeshData::new(Primitive::Triangles, MeshVariant::NORMAL);
        data.add_icosphere(Vec3::ZERO, 1.0, 1, Color::WHITE);
        assert_eq!(data.indices.len(), 240); // 80 faces
        for p in &data.positions {
            assert!((p.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn icosphere_respects_center_and_radius() {
        let center = Vec3::new(1.0, 2.0, 3.0);
        let mut data = MeshData::new(Primitive::Triangles, MeshVariant::NONE);
        data.add_icosphere(center, 2.0, 2, Color::WHITE);
        for p in &data.positions {
            assert!(((*p - center).length() - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn packed_stride_matches_layout() {
        let mut data = MeshData::new(Primitive::Triangles, MeshVariant::NORMAL | MeshVariant::UV);
        data.add_triangle(Vec3::ZERO, Vec3::X, Vec3::Y, Color::WHITE);
        let layout = data.variant().layout();
        assert_eq!(layout.stride, 12 + 12 + 8);
        let mut bytes = Vec::new();
        data.pack_vertices(&mut bytes);
        assert_eq!(bytes.len(), 3 * layout.stride);
    }

    #[test]
    fn cylinder_counts() {
        let mut data = MeshData::new(Primitive::Triangles, MeshVariant::NORMAL);
        data.add_cylinder(Vec3::ZERO, Vec3::Y, 0.5, 8, Color::WHITE);
        // Per segment: one quad (4 verts, 6 indices) + two cap triangles.
        assert_eq!(data.positions.len(), 8 * (4 + 3 + 3));
        assert_eq!(data.indices.len(), 8 * (6 + 3 + 3));
    }
}
