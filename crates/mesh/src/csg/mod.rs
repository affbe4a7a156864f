//! Constructive solid geometry on closed triangle meshes.
//!
//! Implemented with solid BSP trees, following Evan Wallace's csg.js:
//! each operand becomes a tree, the trees clip each other's polygons, and
//! the surviving polygons are collected into a new mesh.
//!
//! Cost grows with the product of the operand polygon counts, so callers on
//! an interactive path should keep operands small (boxes) and avoid running
//! an operation on every intermediate input value.

mod bsp;
mod polygon;

use crate::{Mesh, Vertex};
use bsp::Node;
use polygon::Polygon;

/// `a − b`: the volume of `a` not inside `b`.
pub fn subtract(a: &Mesh, b: &Mesh) -> Mesh {
    let _span = tracing::debug_span!(
        "csg_subtract",
        a_tris = a.triangle_count(),
        b_tris = b.triangle_count()
    )
    .entered();

    let polys_a = to_polygons(a);
    if polys_a.is_empty() {
        return Mesh::new();
    }
    let polys_b = to_polygons(b);
    if polys_b.is_empty() {
        return a.clone();
    }

    let mut a = Node::new(polys_a);
    let mut b = Node::new(polys_b);
    a.invert();
    a.clip_to(&b);
    b.clip_to(&a);
    b.invert();
    b.clip_to(&a);
    b.invert();
    a.build(b.all_polygons());
    a.invert();
    from_polygons(a.all_polygons())
}

/// `a ∪ b`: the volume inside either operand.
pub fn union(a: &Mesh, b: &Mesh) -> Mesh {
    let _span = tracing::debug_span!("csg_union").entered();

    let polys_a = to_polygons(a);
    let polys_b = to_polygons(b);
    if polys_a.is_empty() {
        return b.clone();
    }
    if polys_b.is_empty() {
        return a.clone();
    }

    let mut a = Node::new(polys_a);
    let mut b = Node::new(polys_b);
    a.clip_to(&b);
    b.clip_to(&a);
    b.invert();
    b.clip_to(&a);
    b.invert();
    a.build(b.all_polygons());
    from_polygons(a.all_polygons())
}

/// `a ∩ b`: the volume inside both operands.
pub fn intersect(a: &Mesh, b: &Mesh) -> Mesh {
    let _span = tracing::debug_span!("csg_intersect").entered();

    let polys_a = to_polygons(a);
    let polys_b = to_polygons(b);
    if polys_a.is_empty() || polys_b.is_empty() {
        return Mesh::new();
    }

    let mut a = Node::new(polys_a);
    let mut b = Node::new(polys_b);
    a.invert();
    b.clip_to(&a);
    b.invert();
    a.clip_to(&b);
    b.clip_to(&a);
    a.build(b.all_polygons());
    a.invert();
    from_polygons(a.all_polygons())
}

fn to_polygons(mesh: &Mesh) -> Vec<Polygon> {
    mesh.triangles()
        .filter_map(|[a, b, c]| Polygon::new(vec![*a, *b, *c]))
        .collect()
}

/// Fan-triangulate convex polygons into an indexed mesh.
fn from_polygons(polygons: Vec<Polygon>) -> Mesh {
    let mut vertices: Vec<Vertex> = Vec::new();
    let mut indices = Vec::new();
    for polygon in polygons {
        let base = vertices.len() as u32;
        let n = polygon.vertices.len() as u32;
        vertices.extend(polygon.vertices);
        for i in 1..n - 1 {
            indices.extend_from_slice(&[base, base + i, base + i + 1]);
        }
    }
    Mesh { vertices, indices }
}
