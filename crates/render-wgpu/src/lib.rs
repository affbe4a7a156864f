//! wgpu render backend.
//!
//! Draws the grid floor, every opaque mesh instance, then the transparent
//! instances blended back to front. Mesh geometry is uploaded once per
//! [`MeshHandle`](fenestra_common::MeshHandle) and freed when the store
//! reports the handle released.
//!
//! # Invariants
//! - Renderer never mutates scene state.
//! - Camera motion is not part of the scene; orbiting does not touch it.
//! - GPU buffers exist only for handles still present in the mesh store.

mod camera;
mod gpu;
mod shaders;

pub use camera::OrbitCamera;
pub use gpu::WgpuRenderer;
