//! Geometry and material resources shared by every assembly in a scene.
//!
//! Scene nodes never own geometry or materials directly. They hold
//! [`MeshHandle`](fenestra_common::MeshHandle)s into a [`MeshStore`] and
//! [`MaterialHandle`](fenestra_common::MaterialHandle)s into a
//! [`MaterialRegistry`], so a recolor or a geometry swap is a single write
//! that every referencing node observes.
//!
//! # Invariants
//! - Handles are never reused within one store or registry.
//! - A mesh removed with [`MeshStore::release`] is reported exactly once by
//!   [`MeshStore::drain_released`], so GPU backends can free its buffers.

mod import;
mod material;
mod store;

pub use import::{
    BASE_MESH_NAME, GRIP_MESH_NAME, HandleModel, HandlePart, import_handle_model,
    import_handle_model_slice,
};
pub use material::{Material, MaterialRegistry, Pattern};
pub use store::MeshStore;

use fenestra_common::{MaterialHandle, MeshHandle};
use std::path::PathBuf;

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("mesh {0:?} not found")]
    MeshNotFound(MeshHandle),
    #[error("material {0:?} not found")]
    MaterialNotFound(MaterialHandle),
    #[error("glTF document has {found} usable meshes, need a base and a grip")]
    MissingMesh { found: usize },
}
