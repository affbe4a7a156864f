use glam::{Mat3, Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// A mesh vertex: position, shading normal and texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    /// Linear interpolation of every attribute.
    pub fn lerp(&self, other: &Vertex, t: f32) -> Vertex {
        Vertex {
            position: self.position.lerp(other.position, t),
            normal: self.normal.lerp(other.normal, t),
            uv: self.uv.lerp(other.uv, t),
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Component-wise comparison within `eps`.
    pub fn approx_eq(&self, other: &Aabb, eps: f32) -> bool {
        self.min.abs_diff_eq(other.min, eps) && self.max.abs_diff_eq(other.max, eps)
    }
}

/// An indexed triangle mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Axis-aligned box centered on the origin with the given edge lengths.
    ///
    /// Each face carries its own four vertices so normals stay flat, and its
    /// own `0..1` UV square so a repeating texture tiles once per face.
    pub fn cuboid(size: Vec3) -> Self {
        let h = size * 0.5;
        let faces: [(Vec3, [Vec3; 4]); 6] = [
            // +Z
            (
                Vec3::Z,
                [
                    Vec3::new(-h.x, -h.y, h.z),
                    Vec3::new(h.x, -h.y, h.z),
                    Vec3::new(h.x, h.y, h.z),
                    Vec3::new(-h.x, h.y, h.z),
                ],
            ),
            // -Z
            (
                Vec3::NEG_Z,
                [
                    Vec3::new(h.x, -h.y, -h.z),
                    Vec3::new(-h.x, -h.y, -h.z),
                    Vec3::new(-h.x, h.y, -h.z),
                    Vec3::new(h.x, h.y, -h.z),
                ],
            ),
            // +X
            (
                Vec3::X,
                [
                    Vec3::new(h.x, -h.y, h.z),
                    Vec3::new(h.x, -h.y, -h.z),
                    Vec3::new(h.x, h.y, -h.z),
                    Vec3::new(h.x, h.y, h.z),
                ],
            ),
            // -X
            (
                Vec3::NEG_X,
                [
                    Vec3::new(-h.x, -h.y, -h.z),
                    Vec3::new(-h.x, -h.y, h.z),
                    Vec3::new(-h.x, h.y, h.z),
                    Vec3::new(-h.x, h.y, -h.z),
                ],
            ),
            // +Y
            (
                Vec3::Y,
                [
                    Vec3::new(-h.x, h.y, h.z),
                    Vec3::new(h.x, h.y, h.z),
                    Vec3::new(h.x, h.y, -h.z),
                    Vec3::new(-h.x, h.y, -h.z),
                ],
            ),
            // -Y
            (
                Vec3::NEG_Y,
                [
                    Vec3::new(-h.x, -h.y, -h.z),
                    Vec3::new(h.x, -h.y, -h.z),
                    Vec3::new(h.x, -h.y, h.z),
                    Vec3::new(-h.x, -h.y, h.z),
                ],
            ),
        ];
        let uvs = [
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 0.0),
        ];

        let mut mesh = Mesh {
            vertices: Vec::with_capacity(24),
            indices: Vec::with_capacity(36),
        };
        for (normal, corners) in faces {
            let base = mesh.vertices.len() as u32;
            for (corner, uv) in corners.iter().zip(uvs) {
                mesh.vertices.push(Vertex::new(*corner, normal, uv));
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        mesh
    }

    /// The unit cube every beam and pane is scaled from.
    pub fn unit_cube() -> Self {
        Self::cuboid(Vec3::ONE)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate triangles as vertex triples.
    pub fn triangles(&self) -> impl Iterator<Item = [&Vertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                &self.vertices[tri[0] as usize],
                &self.vertices[tri[1] as usize],
                &self.vertices[tri[2] as usize],
            ]
        })
    }

    /// A copy of this mesh with `matrix` applied to positions and normals.
    ///
    /// Reflections (negative determinant) reverse triangle winding so faces
    /// keep pointing outward.
    pub fn transformed(&self, matrix: Mat4) -> Mesh {
        let normal_matrix = Mat3::from_mat4(matrix).inverse().transpose();
        let vertices = self
            .vertices
            .iter()
            .map(|v| Vertex {
                position: matrix.transform_point3(v.position),
                normal: (normal_matrix * v.normal).normalize_or_zero(),
                uv: v.uv,
            })
            .collect();
        let mut indices = self.indices.clone();
        if matrix.determinant() < 0.0 {
            for tri in indices.chunks_exact_mut(3) {
                tri.swap(1, 2);
            }
        }
        Mesh { vertices, indices }
    }

    /// Bounding box of all referenced vertices, or None for an empty mesh.
    pub fn aabb(&self) -> Option<Aabb> {
        let mut iter = self.indices.iter().map(|i| self.vertices[*i as usize].position);
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Aabb { min, max })
    }

    /// Total triangle area.
    pub fn surface_area(&self) -> f32 {
        self.triangles()
            .map(|[a, b, c]| (b.position - a.position).cross(c.position - a.position).length() * 0.5)
            .sum()
    }

    /// Enclosed volume by the divergence theorem. Only meaningful for closed,
    /// consistently wound meshes.
    pub fn volume(&self) -> f32 {
        self.triangles()
            .map(|[a, b, c]| a.position.dot(b.position.cross(c.position)) / 6.0)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn unit_cube_counts() {
        let cube = Mesh::unit_cube();
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
    }

    #[test]
    fn cuboid_measures() {
        let m = Mesh::cuboid(Vec3::new(2.0, 1.0, 0.5));
        assert!((m.volume() - 1.0).abs() < 1e-5);
        assert!((m.surface_area() - 7.0).abs() < 1e-5);
        let bb = m.aabb().unwrap();
        assert!(bb.size().abs_diff_eq(Vec3::new(2.0, 1.0, 0.5), 1e-6));
        assert!(bb.center().abs_diff_eq(Vec3::ZERO, 1e-6));
    }

    #[test]
    fn cube_faces_point_outward() {
        let cube = Mesh::unit_cube();
        for [a, b, c] in cube.triangles() {
            let n = (b.position - a.position).cross(c.position - a.position).normalize();
            assert!(n.abs_diff_eq(a.normal, 1e-6));
            let centroid = (a.position + b.position + c.position) / 3.0;
            assert!(centroid.dot(n) > 0.0);
        }
    }

    #[test]
    fn transformed_moves_bounds() {
        let m = Mesh::unit_cube().transformed(Mat4::from_scale_rotation_translation(
            Vec3::new(2.0, 1.0, 1.0),
            Quat::IDENTITY,
            Vec3::new(1.0, 0.0, 0.0),
        ));
        let bb = m.aabb().unwrap();
        assert!(bb.min.abs_diff_eq(Vec3::new(0.0, -0.5, -0.5), 1e-6));
        assert!(bb.max.abs_diff_eq(Vec3::new(2.0, 0.5, 0.5), 1e-6));
    }

    #[test]
    fn mirrored_transform_keeps_positive_volume() {
        let m = Mesh::unit_cube().transformed(Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0)));
        assert!((m.volume() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_mesh_has_no_bounds() {
        assert!(Mesh::new().aabb().is_none());
        assert!(Mesh::new().is_empty());
    }
}
