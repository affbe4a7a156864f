//! Developer tooling: read-only scene inspection for the debug panel and CLI.
//!
//! # Invariants
//! - Tools never mutate the scene, meshes or materials.

mod inspector;

pub use inspector::{NodeInfo, OutlineEntry, SceneInspector, SceneSummary};
