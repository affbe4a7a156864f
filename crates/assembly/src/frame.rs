use crate::door::{DoorMaterials, WindowDoor};
use crate::handle::HandleLoad;
use crate::panel::Panel;
use crate::{AssemblyError, Stage};
use fenestra_assets::HandleModel;
use fenestra_common::{Color, NodeId, Span, Transform, inner_span};
use fenestra_stream::LoadTask;
use glam::Vec3;
use std::time::Instant;

/// A double casement window: outer frame, sill and two mirrored leaves.
///
/// The leaves are children of the frame's group, hinged on the frame's
/// left and right inner edges.
#[derive(Debug)]
pub struct WindowFrame {
    root: NodeId,
    span: Span,
    position: Vec3,
    materials: DoorMaterials,
    top: Panel,
    bottom: Panel,
    left: Panel,
    right: Panel,
    sill: Panel,
    left_leaf: WindowDoor,
    right_leaf: WindowDoor,
}

impl WindowFrame {
    pub const FRAME_THICKNESS: f32 = 0.05;
    pub const FRAME_DEPTH: f32 = 0.1;
    pub const SILL_HEIGHT: f32 = 0.01;
    pub const SILL_DEPTH: f32 = 0.2;

    pub fn new(
        stage: &mut Stage,
        span: Span,
        materials: DoorMaterials,
        with_handles: bool,
    ) -> Result<Self, AssemblyError> {
        let leaf = Self::leaf_span(span)?;

        let root = stage.scene.spawn_group("window_frame", None)?;
        stage.scene.attach(root)?;
        let top = Panel::spawn(stage, "top", root, materials.metal)?;
        let bottom = Panel::spawn(stage, "bottom", root, materials.metal)?;
        let left = Panel::spawn(stage, "left", root, materials.metal)?;
        let right = Panel::spawn(stage, "right", root, materials.metal)?;
        let sill = Panel::spawn(stage, "sill", root, materials.metal)?;
        let left_leaf = WindowDoor::new(stage, Some(root), leaf, false, materials, with_handles)?;
        let right_leaf = WindowDoor::new(stage, Some(root), leaf, true, materials, with_handles)?;

        let mut frame = Self {
            root,
            span,
            position: Vec3::ZERO,
            materials,
            top,
            bottom,
            left,
            right,
            sill,
            left_leaf,
            right_leaf,
        };
        frame.layout(stage, leaf)?;
        tracing::info!(width = span.width, height = span.height, "window frame created");
        Ok(frame)
    }

    /// Span of each leaf inside a frame of `outer`: half the inner width, full
    /// inner height. Fails if either the frame or a leaf would be degenerate.
    pub fn leaf_span(outer: Span) -> Result<Span, AssemblyError> {
        let leaf = inner_span(outer, Self::FRAME_THICKNESS)?.halved();
        leaf.check(WindowDoor::FRAME_THICKNESS)?;
        Ok(leaf)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn materials(&self) -> DoorMaterials {
        self.materials
    }

    pub fn left_leaf(&self) -> &WindowDoor {
        &self.left_leaf
    }

    pub fn right_leaf(&self) -> &WindowDoor {
        &self.right_leaf
    }

    pub fn leaves_mut(&mut self) -> [&mut WindowDoor; 2] {
        [&mut self.left_leaf, &mut self.right_leaf]
    }

    /// Named panels in a fixed order: top, bottom, left, right, sill.
    pub fn panels(&self) -> [(&'static str, &Panel); 5] {
        [
            ("top", &self.top),
            ("bottom", &self.bottom),
            ("left", &self.left),
            ("right", &self.right),
            ("sill", &self.sill),
        ]
    }

    /// Resize the frame and both leaves. The whole cascade is validated first,
    /// so a degenerate span leaves frame and leaves untouched.
    pub fn set_size(&mut self, stage: &mut Stage, span: Span) -> Result<(), AssemblyError> {
        let leaf = Self::leaf_span(span)?;
        self.span = span;
        tracing::debug!(width = span.width, height = span.height, "window frame resized");
        self.layout(stage, leaf)
    }

    pub fn set_position(&mut self, stage: &mut Stage, position: Vec3) -> Result<(), AssemblyError> {
        self.position = position;
        stage
            .scene
            .set_transform(self.root, Transform::from_position(position))?;
        Ok(())
    }

    /// Open both leaves by `angle`; each swings according to its mirror flag.
    pub fn set_rotation(&mut self, stage: &mut Stage, angle: f32) -> Result<(), AssemblyError> {
        if !angle.is_finite() {
            return Err(AssemblyError::NonFiniteAngle(angle));
        }
        for leaf in self.leaves_mut() {
            leaf.set_rotation(stage, angle)?;
        }
        Ok(())
    }

    /// Recolor the metal shared by the frame and both leaves.
    pub fn set_material_color(&self, stage: &mut Stage, color: Color) -> Result<(), AssemblyError> {
        stage.materials.set_color(self.materials.metal, color)?;
        Ok(())
    }

    /// Detach the frame and cancel pending handle loads on both leaves.
    pub fn remove(&mut self, stage: &mut Stage) -> Result<(), AssemblyError> {
        for leaf in self.leaves_mut() {
            leaf.remove(stage)?;
        }
        stage.scene.detach(self.root);
        Ok(())
    }

    pub fn add(&mut self, stage: &mut Stage) -> Result<(), AssemblyError> {
        stage.scene.attach(self.root)?;
        for leaf in self.leaves_mut() {
            leaf.add(stage)?;
        }
        Ok(())
    }

    /// Start one handle load per leaf. `spawn` builds the task for a leaf
    /// given its label.
    pub fn start_handle_loads<F>(&mut self, mut spawn: F) -> Result<(), AssemblyError>
    where
        F: FnMut(&str) -> Result<LoadTask<HandleModel>, AssemblyError>,
    {
        let left = spawn("left_handle")?;
        let right = spawn("right_handle")?;
        self.left_leaf.start_handle_load(left);
        self.right_leaf.start_handle_load(right);
        Ok(())
    }

    /// Poll both leaves' handle loads. A failure on one leaf does not stop the other.
    pub fn poll_handles(
        &mut self,
        stage: &mut Stage,
        now: Instant,
    ) -> [Result<HandleLoad, AssemblyError>; 2] {
        [
            self.left_leaf.poll_handle(stage, now),
            self.right_leaf.poll_handle(stage, now),
        ]
    }

    fn layout(&mut self, stage: &mut Stage, leaf: Span) -> Result<(), AssemblyError> {
        let Span { width: w, height: h } = self.span;
        let t = Self::FRAME_THICKNESS;
        let d = Self::FRAME_DEPTH;
        {
            let scene = &mut stage.scene;
            self.top
                .place(scene, Vec3::new(w, t, d), Vec3::new(0.0, h / 2.0 - t / 2.0, 0.0))?;
            self.bottom
                .place(scene, Vec3::new(w, t, d), Vec3::new(0.0, -h / 2.0 + t / 2.0, 0.0))?;
            self.left
                .place(scene, Vec3::new(t, h - 2.0 * t, d), Vec3::new(-w / 2.0 + t / 2.0, 0.0, 0.0))?;
            self.right
                .place(scene, Vec3::new(t, h - 2.0 * t, d), Vec3::new(w / 2.0 - t / 2.0, 0.0, 0.0))?;
            self.sill.place(
                scene,
                Vec3::new(w, Self::SILL_HEIGHT, Self::SILL_DEPTH),
                Vec3::new(0.0, -h / 2.0 - Self::SILL_HEIGHT / 2.0, 0.0),
            )?;
        }

        self.left_leaf.set_size(stage, leaf)?;
        self.right_leaf.set_size(stage, leaf)?;
        self.left_leaf
            .set_position(stage, Vec3::new(-leaf.width, 0.0, 0.0))?;
        self.right_leaf
            .set_position(stage, Vec3::new(leaf.width, 0.0, 0.0))?;
        Ok(())
    }
}
