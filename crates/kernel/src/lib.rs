//! Scene kernel: the authoritative scene graph every assembly writes into.
//!
//! # Invariants
//! - Nodes are only mutated through explicit operations, each of which is logged.
//! - A node is drawn only if its root is attached and no ancestor is hidden.
//! - Iteration order is deterministic (BTreeMap keyed by `NodeId`).

pub mod scene;

pub use scene::{Drawable, NodeKind, Renderable, Scene, SceneError, SceneEvent, SceneNode};
