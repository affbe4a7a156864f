//! Mesh geometry: indexed triangle meshes, the box primitive every panel is
//! scaled from, and constructive solid geometry on closed meshes.
//!
//! # Invariants
//! - Meshes are plain CPU data; GPU upload happens in the render backend.
//! - CSG operations are pure: inputs are borrowed, a new mesh is returned.

pub mod csg;
mod mesh;

pub use mesh::{Aabb, Mesh, Vertex};
