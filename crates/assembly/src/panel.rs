use crate::{AssemblyError, Stage};
use fenestra_common::{MaterialHandle, NodeId, Transform};
use fenestra_kernel::{Renderable, Scene, SceneError};
use glam::{Quat, Vec3};

/// One rectangular prism of an assembly: a unit-cube mesh node scaled to
/// `size` and placed at `offset` inside its parent group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Panel {
    node: NodeId,
    pub size: Vec3,
    pub offset: Vec3,
}

impl Panel {
    pub(crate) fn spawn(
        stage: &mut Stage,
        name: &str,
        parent: NodeId,
        material: MaterialHandle,
    ) -> Result<Self, AssemblyError> {
        let mesh = stage.meshes.unit_cube();
        let node = stage
            .scene
            .spawn_mesh(name, Some(parent), Renderable { mesh, material })?;
        Ok(Self {
            node,
            size: Vec3::ONE,
            offset: Vec3::ZERO,
        })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn transform(&self) -> Transform {
        Transform {
            position: self.offset,
            rotation: Quat::IDENTITY,
            scale: self.size,
        }
    }

    /// Parent-local bounds `(min, max)`.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let half = self.size * 0.5;
        (self.offset - half, self.offset + half)
    }

    pub(crate) fn place(&mut self, scene: &mut Scene, size: Vec3, offset: Vec3) -> Result<(), SceneError> {
        self.size = size;
        self.offset = offset;
        scene.set_transform(self.node, self.transform())
    }
}
