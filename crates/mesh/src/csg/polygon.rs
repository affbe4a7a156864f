use crate::Vertex;
use glam::Vec3;

/// Distance under which a point counts as lying on a plane.
const EPSILON: f32 = 1e-5;

const COPLANAR: u8 = 0;
const FRONT: u8 = 1;
const BACK: u8 = 2;
const SPANNING: u8 = 3;

/// An oriented plane `normal · p = w`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Plane {
    pub normal: Vec3,
    pub w: f32,
}

impl Plane {
    /// Plane through three points, counter-clockwise winding facing the normal.
    /// None for collinear points.
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Option<Plane> {
        let normal = (b - a).cross(c - a).try_normalize()?;
        Some(Plane {
            normal,
            w: normal.dot(a),
        })
    }

    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    fn side_of(&self, p: Vec3) -> u8 {
        let t = self.normal.dot(p) - self.w;
        if t < -EPSILON {
            BACK
        } else if t > EPSILON {
            FRONT
        } else {
            COPLANAR
        }
    }

    /// Classify `polygon` against this plane, cutting it in two if it spans.
    pub fn split(&self, polygon: Polygon) -> Split {
        let sides: Vec<u8> = polygon
            .vertices
            .iter()
            .map(|v| self.side_of(v.position))
            .collect();
        let kind = sides.iter().fold(COPLANAR, |acc, s| acc | s);

        match kind {
            COPLANAR => {
                if self.normal.dot(polygon.plane.normal) > 0.0 {
                    Split::CoplanarFront(polygon)
                } else {
                    Split::CoplanarBack(polygon)
                }
            }
            FRONT => Split::Front(polygon),
            BACK => Split::Back(polygon),
            _ => {
                let n = polygon.vertices.len();
                let mut front = Vec::with_capacity(n + 1);
                let mut back = Vec::with_capacity(n + 1);
                for i in 0..n {
                    let j = (i + 1) % n;
                    let (si, sj) = (sides[i], sides[j]);
                    let (vi, vj) = (&polygon.vertices[i], &polygon.vertices[j]);
                    if si != BACK {
                        front.push(*vi);
                    }
                    if si != FRONT {
                        back.push(*vi);
                    }
                    if si | sj == SPANNING {
                        let t = (self.w - self.normal.dot(vi.position))
                            / self.normal.dot(vj.position - vi.position);
                        let v = vi.lerp(vj, t);
                        front.push(v);
                        back.push(v);
                    }
                }
                // Both halves lie in the parent's plane; inherit it rather than
                // recomputing from possibly collinear leading vertices.
                let plane = polygon.plane;
                Split::Spanning {
                    front: (front.len() >= 3).then_some(Polygon {
                        vertices: front,
                        plane,
                    }),
                    back: (back.len() >= 3).then_some(Polygon {
                        vertices: back,
                        plane,
                    }),
                }
            }
        }
    }
}

/// Result of classifying one polygon against a plane.
pub(crate) enum Split {
    CoplanarFront(Polygon),
    CoplanarBack(Polygon),
    Front(Polygon),
    Back(Polygon),
    Spanning {
        front: Option<Polygon>,
        back: Option<Polygon>,
    },
}

/// A convex planar polygon.
#[derive(Debug, Clone)]
pub(crate) struct Polygon {
    pub vertices: Vec<Vertex>,
    pub plane: Plane,
}

impl Polygon {
    /// None if the vertices do not span a plane.
    pub fn new(vertices: Vec<Vertex>) -> Option<Polygon> {
        if vertices.len() < 3 {
            return None;
        }
        let plane = Plane::from_points(
            vertices[0].position,
            vertices[1].position,
            vertices[2].position,
        )?;
        Some(Polygon { vertices, plane })
    }

    /// Reverse winding, vertex normals and plane.
    pub fn flip(&mut self) {
        self.vertices.reverse();
        for v in &mut self.vertices {
            v.normal = -v.normal;
        }
        self.plane.flip();
    }
}
