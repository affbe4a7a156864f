//! Scene composition: one double casement window set into a wall.
//!
//! [`SceneComposer`] owns the [`Stage`](fenestra_assembly::Stage) and the two
//! assemblies, turns GUI [`Control`](fenestra_input::Control)s into assembly
//! operations and runs the per-frame bookkeeping in [`SceneComposer::tick`].
//!
//! # Invariants
//! - The wall is always twice the frame's span, with a hole the frame's size.
//! - The floor sits at the wall's bottom edge.
//! - Frame resizes are immediate; the wall's CSG recut is debounced.
//! - A failed handle load is logged and leaves the handle hidden.

mod composer;
mod config;

pub use composer::SceneComposer;
pub use config::ComposerConfig;
