//! Rendering adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - A renderer never mutates the scene, meshes or materials.
//! - Render state derives from a [`RenderScene`] and a [`RenderView`] only.
//! - Transparent items are drawn after every opaque item, farthest first.
//!
//! The text renderer here doubles as the CLI output and as the test surface
//! for the trait; the GPU backend lives in `fenestra-render-wgpu`.

mod draw_list;
mod renderer;

pub use draw_list::{DrawItem, DrawList};
pub use renderer::{
    DebugTextRenderer, Lighting, RenderScene, RenderView, Renderer, ShadowSettings,
};
