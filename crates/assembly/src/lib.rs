//! Parametric window assemblies built from scaled unit cubes.
//!
//! An assembly ([`WindowDoor`], [`WindowFrame`], [`WindowWall`]) owns a
//! group node in the scene and a fixed set of [`Panel`]s under it. Resizing
//! rewrites panel transforms in place; nodes are never recreated.
//!
//! # Invariants
//! - Thickness and depth constants are fixed per assembly type. Only spans scale.
//! - Child spans come from [`inner_span`] and nowhere else.
//! - A resize either succeeds completely or returns an error having touched nothing.
//! - Metal panels reference one shared material; recoloring it recolors every
//!   panel that holds the handle.

mod door;
mod frame;
mod handle;
mod panel;
mod wall;

pub use door::{DoorMaterials, WindowDoor, grip_angle};
pub use fenestra_common::{ResizeError, Span, inner_span};
pub use frame::WindowFrame;
pub use handle::{Handle, HandleLoad};
pub use panel::Panel;
pub use wall::{WallMaterials, WindowWall};

use fenestra_assets::{AssetError, MaterialRegistry, MeshStore};
use fenestra_kernel::{Scene, SceneError};
use fenestra_stream::ModelLoadError;

/// Errors from assembly operations.
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error(transparent)]
    Resize(#[from] ResizeError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("handle model: {0}")]
    Load(#[from] ModelLoadError),
    #[error("rotation angle must be finite, got {0}")]
    NonFiniteAngle(f32),
}

/// Everything an assembly writes into: the scene graph, geometry and materials.
#[derive(Debug, Default)]
pub struct Stage {
    pub scene: Scene,
    pub meshes: MeshStore,
    pub materials: MaterialRegistry,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }
}
