use crate::AssetError;
use fenestra_common::MeshHandle;
use fenestra_mesh::Mesh;
use std::collections::BTreeMap;

/// Owns every triangle mesh in the scene, addressed by [`MeshHandle`].
#[derive(Debug, Clone, Default)]
pub struct MeshStore {
    meshes: BTreeMap<MeshHandle, Mesh>,
    next_id: u64,
    unit_cube: Option<MeshHandle>,
    released: Vec<MeshHandle>,
}

impl MeshStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a mesh and return a fresh handle for it.
    pub fn insert(&mut self, mesh: Mesh) -> MeshHandle {
        self.next_id += 1;
        let handle = MeshHandle(self.next_id);
        tracing::trace!(?handle, triangles = mesh.triangle_count(), "mesh stored");
        self.meshes.insert(handle, mesh);
        handle
    }

    pub fn get(&self, handle: MeshHandle) -> Option<&Mesh> {
        self.meshes.get(&handle)
    }

    /// Remove a mesh and queue its handle for [`drain_released`](Self::drain_released).
    pub fn release(&mut self, handle: MeshHandle) -> Result<Mesh, AssetError> {
        let mesh = self
            .meshes
            .remove(&handle)
            .ok_or(AssetError::MeshNotFound(handle))?;
        if self.unit_cube == Some(handle) {
            self.unit_cube = None;
        }
        self.released.push(handle);
        tracing::trace!(?handle, "mesh released");
        Ok(mesh)
    }

    /// Handles released since the last call.
    pub fn drain_released(&mut self) -> Vec<MeshHandle> {
        std::mem::take(&mut self.released)
    }

    /// The shared unit cube every beam and pane is scaled from.
    /// Created on first use.
    pub fn unit_cube(&mut self) -> MeshHandle {
        if let Some(handle) = self.unit_cube {
            return handle;
        }
        let handle = self.insert(Mesh::unit_cube());
        self.unit_cube = Some(handle);
        handle
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MeshHandle, &Mesh)> + '_ {
        self.meshes.iter().map(|(h, m)| (*h, m))
    }

    /// Total triangles across all stored meshes.
    pub fn triangle_count(&self) -> usize {
        self.meshes.values().map(Mesh::triangle_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn insert_and_get() {
        let mut store = MeshStore::new();
        let h = store.insert(Mesh::cuboid(Vec3::new(2.0, 1.0, 1.0)));
        assert_eq!(store.get(h).unwrap().triangle_count(), 12);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unit_cube_is_shared() {
        let mut store = MeshStore::new();
        let a = store.unit_cube();
        let b = store.unit_cube();
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn release_is_reported_once() {
        let mut store = MeshStore::new();
        let h = store.insert(Mesh::unit_cube());
        store.release(h).unwrap();
        assert!(store.get(h).is_none());
        assert_eq!(store.drain_released(), vec![h]);
        assert!(store.drain_released().is_empty());
        assert!(matches!(store.release(h), Err(AssetError::MeshNotFound(_))));
    }

    #[test]
    fn handles_are_not_reused() {
        let mut store = MeshStore::new();
        let a = store.insert(Mesh::unit_cube());
        store.release(a).unwrap();
        let b = store.insert(Mesh::unit_cube());
        assert_ne!(a, b);
    }

    #[test]
    fn releasing_the_unit_cube_recreates_it() {
        let mut store = MeshStore::new();
        let a = store.unit_cube();
        store.release(a).unwrap();
        let b = store.unit_cube();
        assert_ne!(a, b);
        assert!(store.get(b).is_some());
    }
}
