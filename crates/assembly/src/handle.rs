use crate::{AssemblyError, Stage};
use fenestra_assets::HandleModel;
use fenestra_common::{MaterialHandle, MeshHandle, NodeId, Transform};
use fenestra_kernel::{Renderable, Scene};
use fenestra_stream::{LoadStatus, LoadTask};
use glam::{Quat, Vec3};
use std::time::Instant;

/// What one poll of a handle load did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleLoad {
    /// No load in flight.
    Idle,
    Pending,
    /// The model arrived and the handle is now shown.
    Attached,
    /// The load was cancelled before it finished; the handle stays hidden.
    Cancelled,
}

/// A two-part door handle: a fixed base and a grip that turns about its own
/// Z axis. Both parts exist from construction but stay hidden until a model
/// has been attached.
#[derive(Debug)]
pub struct Handle {
    group: NodeId,
    base: NodeId,
    grip: NodeId,
    material: MaterialHandle,
    grip_rest: Transform,
    grip_turn: Quat,
    meshes: Option<(MeshHandle, MeshHandle)>,
    task: Option<LoadTask<HandleModel>>,
}

impl Handle {
    pub(crate) fn spawn(
        stage: &mut Stage,
        parent: NodeId,
        material: MaterialHandle,
    ) -> Result<Self, AssemblyError> {
        let group = stage.scene.spawn_group("handle", Some(parent))?;
        stage.scene.set_visible(group, false)?;
        let placeholder = Renderable {
            mesh: stage.meshes.unit_cube(),
            material,
        };
        let base = stage.scene.spawn_mesh("handle_base", Some(group), placeholder)?;
        let grip = stage.scene.spawn_mesh("handle_grip", Some(group), placeholder)?;
        Ok(Self {
            group,
            base,
            grip,
            material,
            grip_rest: Transform::default(),
            grip_turn: Quat::IDENTITY,
            meshes: None,
            task: None,
        })
    }

    pub fn group(&self) -> NodeId {
        self.group
    }

    pub fn base(&self) -> NodeId {
        self.base
    }

    pub fn grip(&self) -> NodeId {
        self.grip
    }

    pub fn is_loaded(&self) -> bool {
        self.meshes.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.task.is_some()
    }

    pub fn is_visible(&self, scene: &Scene) -> bool {
        scene.get(self.group).is_some_and(|node| node.visible)
    }

    pub(crate) fn place(&self, scene: &mut Scene, offset: Vec3) -> Result<(), AssemblyError> {
        scene.set_transform(self.group, Transform::from_position(offset))?;
        Ok(())
    }

    /// Turn the grip away from its rest pose.
    pub(crate) fn turn_grip(&mut self, scene: &mut Scene, turn: Quat) -> Result<(), AssemblyError> {
        self.grip_turn = turn;
        let transform = Transform {
            rotation: self.grip_rest.rotation * turn,
            ..self.grip_rest
        };
        scene.set_transform(self.grip, transform)?;
        Ok(())
    }

    /// Start a load, cancelling any earlier one.
    pub(crate) fn start_load(&mut self, task: LoadTask<HandleModel>) {
        if let Some(mut previous) = self.task.replace(task) {
            previous.cancel();
        }
    }

    pub(crate) fn cancel_load(&mut self) {
        if let Some(task) = &mut self.task {
            task.cancel();
        }
    }

    pub(crate) fn poll(&mut self, stage: &mut Stage, now: Instant) -> Result<HandleLoad, AssemblyError> {
        let Some(task) = &mut self.task else {
            return Ok(HandleLoad::Idle);
        };
        match task.poll(now) {
            LoadStatus::Pending => Ok(HandleLoad::Pending),
            LoadStatus::Ready(model) => {
                self.task = None;
                self.attach_model(stage, &model)?;
                Ok(HandleLoad::Attached)
            }
            LoadStatus::Failed(err) => {
                self.task = None;
                Err(err.into())
            }
            LoadStatus::Cancelled | LoadStatus::Finished => {
                self.task = None;
                Ok(HandleLoad::Cancelled)
            }
        }
    }

    /// Swap the placeholders for the model's meshes and show the handle.
    /// Meshes from an earlier model are released.
    pub(crate) fn attach_model(&mut self, stage: &mut Stage, model: &HandleModel) -> Result<(), AssemblyError> {
        let base_mesh = stage.meshes.insert(model.base.mesh.clone());
        let grip_mesh = stage.meshes.insert(model.grip.mesh.clone());
        if let Some((old_base, old_grip)) = self.meshes.replace((base_mesh, grip_mesh)) {
            stage.meshes.release(old_base)?;
            stage.meshes.release(old_grip)?;
        }

        let scene = &mut stage.scene;
        scene.set_renderable(self.base, Renderable { mesh: base_mesh, material: self.material })?;
        scene.set_renderable(self.grip, Renderable { mesh: grip_mesh, material: self.material })?;
        scene.set_transform(self.base, model.base.transform)?;
        self.grip_rest = model.grip.transform;
        self.turn_grip(scene, self.grip_turn)?;
        scene.set_visible(self.group, true)?;
        tracing::info!(handle = %self.group.short(), "handle model attached");
        Ok(())
    }
}
