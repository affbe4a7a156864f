use crate::handle::{Handle, HandleLoad};
use crate::panel::Panel;
use crate::{AssemblyError, Stage};
use fenestra_assets::HandleModel;
use fenestra_common::{Color, MaterialHandle, NodeId, Span, Transform};
use fenestra_stream::LoadTask;
use glam::{Quat, Vec3};
use std::f32::consts::FRAC_PI_2;
use std::time::Instant;

/// Materials a door leaf draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorMaterials {
    pub metal: MaterialHandle,
    pub glass: MaterialHandle,
}

/// Grip turn for a leaf opened by `angle`: ten times faster than the leaf,
/// stopping at a quarter turn.
pub fn grip_angle(angle: f32) -> f32 {
    (-angle * WindowDoor::GRIP_COUPLING).max(-FRAC_PI_2)
}

/// One casement leaf: four beams around a glass pane, with an optional handle.
///
/// The hinge sits on the leaf's local origin and the leaf extends towards +X,
/// or towards −X when mirrored.
#[derive(Debug)]
pub struct WindowDoor {
    root: NodeId,
    parent: Option<NodeId>,
    span: Span,
    mirrored: bool,
    position: Vec3,
    angle: f32,
    materials: DoorMaterials,
    top: Panel,
    bottom: Panel,
    free_edge: Panel,
    hinge: Panel,
    pane: Panel,
    handle: Option<Handle>,
}

impl WindowDoor {
    pub const FRAME_THICKNESS: f32 = 0.05;
    pub const FRAME_DEPTH: f32 = 0.05;
    pub const GLASS_DEPTH: f32 = 0.02;
    pub const GRIP_COUPLING: f32 = 10.0;

    /// Build a leaf under `parent`, or as an attached scene root when `parent` is None.
    pub fn new(
        stage: &mut Stage,
        parent: Option<NodeId>,
        span: Span,
        mirrored: bool,
        materials: DoorMaterials,
        with_handle: bool,
    ) -> Result<Self, AssemblyError> {
        span.check(Self::FRAME_THICKNESS)?;

        let name = if mirrored { "leaf_mirrored" } else { "leaf" };
        let root = stage.scene.spawn_group(name, parent)?;
        if parent.is_none() {
            stage.scene.attach(root)?;
        }
        let top = Panel::spawn(stage, "top", root, materials.metal)?;
        let bottom = Panel::spawn(stage, "bottom", root, materials.metal)?;
        let free_edge = Panel::spawn(stage, "free_edge", root, materials.metal)?;
        let hinge = Panel::spawn(stage, "hinge", root, materials.metal)?;
        let pane = Panel::spawn(stage, "pane", root, materials.glass)?;
        let handle = if with_handle {
            Some(Handle::spawn(stage, root, materials.metal)?)
        } else {
            None
        };

        let mut door = Self {
            root,
            parent,
            span,
            mirrored,
            position: Vec3::ZERO,
            angle: 0.0,
            materials,
            top,
            bottom,
            free_edge,
            hinge,
            pane,
            handle,
        };
        door.layout(stage)?;
        Ok(door)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn width(&self) -> f32 {
        self.span.width
    }

    pub fn height(&self) -> f32 {
        self.span.height
    }

    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> f32 {
        self.angle
    }

    /// Current grip turn, before the mirror sign is applied.
    pub fn grip_angle(&self) -> f32 {
        grip_angle(self.angle)
    }

    pub fn materials(&self) -> DoorMaterials {
        self.materials
    }

    pub fn handle(&self) -> Option<&Handle> {
        self.handle.as_ref()
    }

    pub fn handle_visible(&self, stage: &Stage) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|h| h.is_visible(&stage.scene))
    }

    /// Named panels in a fixed order: top, bottom, free edge, hinge, pane.
    pub fn panels(&self) -> [(&'static str, &Panel); 5] {
        [
            ("top", &self.top),
            ("bottom", &self.bottom),
            ("free_edge", &self.free_edge),
            ("hinge", &self.hinge),
            ("pane", &self.pane),
        ]
    }

    /// Resize the leaf. Nothing changes if the span is degenerate.
    pub fn set_size(&mut self, stage: &mut Stage, span: Span) -> Result<(), AssemblyError> {
        span.check(Self::FRAME_THICKNESS)?;
        self.span = span;
        tracing::debug!(leaf = %self.root.short(), width = span.width, height = span.height, "leaf resized");
        self.layout(stage)
    }

    pub fn set_position(&mut self, stage: &mut Stage, position: Vec3) -> Result<(), AssemblyError> {
        self.position = position;
        self.write_root(stage)
    }

    /// Swing the leaf about its hinge and turn the grip with it.
    pub fn set_rotation(&mut self, stage: &mut Stage, angle: f32) -> Result<(), AssemblyError> {
        if !angle.is_finite() {
            return Err(AssemblyError::NonFiniteAngle(angle));
        }
        self.angle = angle;
        self.write_root(stage)?;
        let turn = Quat::from_rotation_z(grip_angle(angle) * self.sign());
        if let Some(handle) = &mut self.handle {
            handle.turn_grip(&mut stage.scene, turn)?;
        }
        Ok(())
    }

    /// Recolor the shared metal material. Every panel using it follows.
    pub fn set_material_color(&self, stage: &mut Stage, color: Color) -> Result<(), AssemblyError> {
        stage.materials.set_color(self.materials.metal, color)?;
        Ok(())
    }

    /// Take the leaf out of the rendered scene and cancel a pending handle load.
    pub fn remove(&mut self, stage: &mut Stage) -> Result<(), AssemblyError> {
        if let Some(handle) = &mut self.handle {
            handle.cancel_load();
        }
        match self.parent {
            None => {
                stage.scene.detach(self.root);
            }
            Some(_) => stage.scene.set_visible(self.root, false)?,
        }
        Ok(())
    }

    /// Put a removed leaf back.
    pub fn add(&mut self, stage: &mut Stage) -> Result<(), AssemblyError> {
        match self.parent {
            None => stage.scene.attach(self.root)?,
            Some(_) => stage.scene.set_visible(self.root, true)?,
        }
        Ok(())
    }

    /// Hand the leaf a handle load to poll. Without a handle the task is dropped,
    /// which cancels it.
    pub fn start_handle_load(&mut self, task: LoadTask<HandleModel>) {
        match &mut self.handle {
            Some(handle) => handle.start_load(task),
            None => tracing::debug!(leaf = %self.root.short(), "leaf has no handle, load dropped"),
        }
    }

    /// Check the handle load; shows the handle once the model has arrived.
    pub fn poll_handle(&mut self, stage: &mut Stage, now: Instant) -> Result<HandleLoad, AssemblyError> {
        match &mut self.handle {
            Some(handle) => handle.poll(stage, now),
            None => Ok(HandleLoad::Idle),
        }
    }

    /// Attach an already loaded handle model.
    pub fn attach_handle_model(&mut self, stage: &mut Stage, model: &HandleModel) -> Result<(), AssemblyError> {
        match &mut self.handle {
            Some(handle) => handle.attach_model(stage, model),
            None => Ok(()),
        }
    }

    fn sign(&self) -> f32 {
        if self.mirrored { -1.0 } else { 1.0 }
    }

    fn write_root(&self, stage: &mut Stage) -> Result<(), AssemblyError> {
        let transform = Transform {
            position: self.position,
            rotation: Quat::from_rotation_y(self.angle * self.sign()),
            scale: Vec3::ONE,
        };
        stage.scene.set_transform(self.root, transform)?;
        Ok(())
    }

    fn layout(&mut self, stage: &mut Stage) -> Result<(), AssemblyError> {
        let Span { width: w, height: h } = self.span;
        let t = Self::FRAME_THICKNESS;
        let d = Self::FRAME_DEPTH;
        let s = self.sign();
        let scene = &mut stage.scene;

        self.top
            .place(scene, Vec3::new(w, t, d), Vec3::new(s * w / 2.0, h / 2.0 - t / 2.0, 0.0))?;
        self.bottom
            .place(scene, Vec3::new(w, t, d), Vec3::new(s * w / 2.0, -h / 2.0 + t / 2.0, 0.0))?;
        self.free_edge
            .place(scene, Vec3::new(t, h - 2.0 * t, d), Vec3::new(s * (w - t / 2.0), 0.0, 0.0))?;
        self.hinge
            .place(scene, Vec3::new(t, h - 2.0 * t, d), Vec3::new(s * t / 2.0, 0.0, 0.0))?;
        self.pane.place(
            scene,
            Vec3::new(w - 2.0 * t, h - 2.0 * t, Self::GLASS_DEPTH),
            Vec3::new(s * w / 2.0, 0.0, 0.0),
        )?;
        if let Some(handle) = &self.handle {
            handle.place(scene, Vec3::new(s * (w - t / 2.0), 0.0, d / 2.0))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fenestra_assets::{HandlePart, Material};
    use fenestra_mesh::Mesh;
    use fenestra_stream::{LoadTask, ModelLoadError};
    use std::f32::consts::PI;
    use std::time::Duration;

    fn stage_and_materials() -> (Stage, DoorMaterials) {
        let mut stage = Stage::new();
        let materials = DoorMaterials {
            metal: stage.materials.register(Material::metal(Color::WHITE)),
            glass: stage.materials.register(Material::glass()),
        };
        (stage, materials)
    }

    fn model() -> HandleModel {
        HandleModel {
            base: HandlePart {
                mesh: Mesh::cuboid(Vec3::new(0.03, 0.1, 0.012)),
                transform: Transform::default(),
            },
            grip: HandlePart {
                mesh: Mesh::cuboid(Vec3::new(0.016, 0.11, 0.016)),
                transform: Transform::from_position(Vec3::new(0.0, 0.0, 0.014)),
            },
        }
    }

    #[test]
    fn layout_matches_span() {
        let (mut stage, mats) = stage_and_materials();
        let door = WindowDoor::new(&mut stage, None, Span::new(0.45, 0.9), false, mats, false).unwrap();
        let t = WindowDoor::FRAME_THICKNESS;
        assert!(door.top.size.abs_diff_eq(Vec3::new(0.45, t, 0.05), 1e-6));
        assert!(door.pane.size.abs_diff_eq(Vec3::new(0.45 - 2.0 * t, 0.9 - 2.0 * t, 0.02), 1e-6));
        // beams sit flush with the outer span
        let (min, _) = door.hinge.bounds();
        let (_, max) = door.free_edge.bounds();
        assert!(min.x.abs() < 1e-6);
        assert!((max.x - 0.45).abs() < 1e-6);
        let (_, top_max) = door.top.bounds();
        assert!((top_max.y - 0.45).abs() < 1e-6);
    }

    #[test]
    fn degenerate_resize_changes_nothing() {
        let (mut stage, mats) = stage_and_materials();
        let mut door = WindowDoor::new(&mut stage, None, Span::new(0.5, 0.5), false, mats, false).unwrap();
        let before: Vec<Panel> = door.panels().iter().map(|(_, p)| **p).collect();
        stage.scene.drain_events();

        let err = door.set_size(&mut stage, Span::new(0.1, 0.5)).unwrap_err();
        assert!(matches!(err, AssemblyError::Resize(fenestra_common::ResizeError::DegenerateSpan { .. })));
        let after: Vec<Panel> = door.panels().iter().map(|(_, p)| **p).collect();
        assert_eq!(before, after);
        assert_eq!(door.span(), Span::new(0.5, 0.5));
        assert!(stage.scene.events().is_empty());
    }

    #[test]
    fn mirrored_leaf_is_a_mirror_image() {
        let (mut stage, mats) = stage_and_materials();
        let span = Span::new(0.6, 1.2);
        let left = WindowDoor::new(&mut stage, None, span, false, mats, true).unwrap();
        let right = WindowDoor::new(&mut stage, None, span, true, mats, true).unwrap();
        for ((name, a), (_, b)) in left.panels().iter().zip(right.panels().iter()) {
            assert_eq!(a.size, b.size, "{name}");
            assert_eq!(a.offset.x, -b.offset.x, "{name}");
            assert_eq!(a.offset.y, b.offset.y, "{name}");
            assert_eq!(a.offset.z, b.offset.z, "{name}");
        }
        let lh = stage.scene.transform(left.handle().unwrap().group()).unwrap();
        let rh = stage.scene.transform(right.handle().unwrap().group()).unwrap();
        assert_eq!(lh.position.x, -rh.position.x);
        assert_eq!(lh.position.z, rh.position.z);
    }

    #[test]
    fn mirrored_leaf_swings_the_other_way() {
        let (mut stage, mats) = stage_and_materials();
        let span = Span::new(0.6, 1.2);
        let mut left = WindowDoor::new(&mut stage, None, span, false, mats, false).unwrap();
        let mut right = WindowDoor::new(&mut stage, None, span, true, mats, false).unwrap();
        left.set_rotation(&mut stage, 0.5).unwrap();
        right.set_rotation(&mut stage, 0.5).unwrap();
        let l = stage.scene.transform(left.root()).unwrap().rotation;
        let r = stage.scene.transform(right.root()).unwrap().rotation;
        assert!(l.abs_diff_eq(Quat::from_rotation_y(0.5), 1e-6));
        assert!(r.abs_diff_eq(Quat::from_rotation_y(-0.5), 1e-6));
    }

    #[test]
    fn zero_rotation_restores_construction_pose() {
        let (mut stage, mats) = stage_and_materials();
        let mut door = WindowDoor::new(&mut stage, None, Span::new(0.5, 1.0), false, mats, true).unwrap();
        door.attach_handle_model(&mut stage, &model()).unwrap();
        let grip = door.handle().unwrap().grip();
        let root_before = stage.scene.transform(door.root()).unwrap();
        let grip_before = stage.scene.transform(grip).unwrap();

        door.set_rotation(&mut stage, 1.1).unwrap();
        assert_ne!(stage.scene.transform(grip).unwrap(), grip_before);
        door.set_rotation(&mut stage, 0.0).unwrap();

        assert_eq!(stage.scene.transform(door.root()).unwrap(), root_before);
        assert_eq!(stage.scene.transform(grip).unwrap(), grip_before);
    }

    #[test]
    fn non_finite_rotation_is_rejected() {
        let (mut stage, mats) = stage_and_materials();
        let mut door = WindowDoor::new(&mut stage, None, Span::new(0.5, 1.0), false, mats, true).unwrap();
        door.set_rotation(&mut stage, 0.4).unwrap();
        let root_before = stage.scene.transform(door.root()).unwrap();

        for angle in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let err = door.set_rotation(&mut stage, angle).unwrap_err();
            assert!(matches!(err, AssemblyError::NonFiniteAngle(_)));
        }
        assert_eq!(door.rotation(), 0.4);
        assert_eq!(stage.scene.transform(door.root()).unwrap(), root_before);
    }

    #[test]
    fn grip_clamps_at_quarter_turn() {
        assert_eq!(grip_angle(0.0), 0.0);
        assert!((grip_angle(0.1) + 1.0).abs() < 1e-6);
        assert!((grip_angle(PI / 20.0) + FRAC_PI_2).abs() < 1e-6);
        for angle in [PI / 20.0 + 1e-3, 0.5, 1.0, FRAC_PI_2] {
            assert_eq!(grip_angle(angle), -FRAC_PI_2);
        }
    }

    #[test]
    fn grip_node_follows_clamp() {
        let (mut stage, mats) = stage_and_materials();
        let mut door = WindowDoor::new(&mut stage, None, Span::new(0.5, 1.0), false, mats, true).unwrap();
        door.attach_handle_model(&mut stage, &model()).unwrap();
        door.set_rotation(&mut stage, 1.0).unwrap();
        assert_eq!(door.grip_angle(), -FRAC_PI_2);
        let grip = stage.scene.transform(door.handle().unwrap().grip()).unwrap();
        assert!(grip.rotation.abs_diff_eq(Quat::from_rotation_z(-FRAC_PI_2), 1e-6));
        assert!(grip.position.abs_diff_eq(Vec3::new(0.0, 0.0, 0.014), 1e-6));
    }

    #[test]
    fn handle_hidden_until_loaded() {
        let (mut stage, mats) = stage_and_materials();
        let mut door = WindowDoor::new(&mut stage, None, Span::new(0.5, 1.0), false, mats, true).unwrap();
        let t0 = Instant::now();
        let (task, completer) = LoadTask::pending("handle", Duration::from_secs(1), t0);
        door.start_handle_load(task);
        assert!(!door.handle_visible(&stage));
        assert_eq!(door.poll_handle(&mut stage, t0).unwrap(), HandleLoad::Pending);

        assert!(completer.complete(Ok(model())));
        assert_eq!(door.poll_handle(&mut stage, t0).unwrap(), HandleLoad::Attached);
        assert!(door.handle_visible(&stage));
        assert!(door.handle().unwrap().is_loaded());
        assert_eq!(door.poll_handle(&mut stage, t0).unwrap(), HandleLoad::Idle);
    }

    #[test]
    fn timed_out_load_leaves_handle_hidden() {
        let (mut stage, mats) = stage_and_materials();
        let mut door = WindowDoor::new(&mut stage, None, Span::new(0.5, 1.0), false, mats, true).unwrap();
        let t0 = Instant::now();
        let (task, completer) = LoadTask::pending("handle", Duration::from_millis(50), t0);
        door.start_handle_load(task);

        let err = door
            .poll_handle(&mut stage, t0 + Duration::from_millis(60))
            .unwrap_err();
        assert!(matches!(err, AssemblyError::Load(ModelLoadError::Timeout(_))));
        assert!(!door.handle_visible(&stage));
        assert!(!completer.complete(Ok(model())));
        assert_eq!(door.poll_handle(&mut stage, t0).unwrap(), HandleLoad::Idle);
        assert!(!door.handle_visible(&stage));
    }

    #[test]
    fn removing_door_cancels_pending_load() {
        let (mut stage, mats) = stage_and_materials();
        let mut door = WindowDoor::new(&mut stage, None, Span::new(0.5, 1.0), false, mats, true).unwrap();
        let t0 = Instant::now();
        let (task, completer) = LoadTask::pending("handle", Duration::from_secs(1), t0);
        door.start_handle_load(task);

        door.remove(&mut stage).unwrap();
        assert!(!stage.scene.is_attached(door.root()));
        assert!(!completer.complete(Ok(model())));
        assert_eq!(door.poll_handle(&mut stage, t0).unwrap(), HandleLoad::Cancelled);
        assert!(!door.handle_visible(&stage));
        assert!(!door.handle().unwrap().is_loaded());
    }

    #[test]
    fn recolor_goes_through_registry() {
        let (mut stage, mats) = stage_and_materials();
        let door = WindowDoor::new(&mut stage, None, Span::new(0.5, 1.0), false, mats, false).unwrap();
        let red = Color::rgb(1.0, 0.0, 0.0);
        door.set_material_color(&mut stage, red).unwrap();
        assert_eq!(stage.materials.get(mats.metal).unwrap().base_color, red);
        assert_eq!(stage.materials.get(mats.glass).unwrap().base_color, Color::WHITE);
    }

    #[test]
    fn reattaching_model_releases_old_meshes() {
        let (mut stage, mats) = stage_and_materials();
        let mut door = WindowDoor::new(&mut stage, None, Span::new(0.5, 1.0), false, mats, true).unwrap();
        door.attach_handle_model(&mut stage, &model()).unwrap();
        let count = stage.meshes.len();
        door.attach_handle_model(&mut stage, &model()).unwrap();
        assert_eq!(stage.meshes.len(), count);
        assert_eq!(stage.meshes.drain_released().len(), 2);
    }
}
