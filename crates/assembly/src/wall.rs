use crate::panel::Panel;
use crate::{AssemblyError, Stage};
use fenestra_common::{MaterialHandle, MeshHandle, NodeId, ResizeError, Span, Transform};
use fenestra_kernel::Renderable;
use fenestra_mesh::{Mesh, csg};
use glam::{Vec2, Vec3};

/// Materials a wall draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallMaterials {
    pub wall: MaterialHandle,
    pub cutter: MaterialHandle,
}

/// A solid wall panel with a rectangular opening cut out by CSG.
///
/// The cut geometry is baked in wall-local space and drawn with an identity
/// transform. The cutting box stays in the scene as a hidden panel.
#[derive(Debug)]
pub struct WindowWall {
    root: NodeId,
    wall: NodeId,
    hole: Panel,
    span: Span,
    hole_span: Span,
    position: Vec3,
    materials: WallMaterials,
    geometry: MeshHandle,
}

impl WindowWall {
    pub const WALL_DEPTH: f32 = 0.15;
    /// Extra opening height so the cut clears the window sill.
    pub const HOLE_OVERCUT: f32 = 0.01;
    pub const HOLE_DROP: f32 = 0.005;
    /// The cutter is this much deeper than the wall so no faces are coplanar.
    pub const CUT_CLEARANCE: f32 = 0.01;

    pub fn new(
        stage: &mut Stage,
        span: Span,
        hole: Span,
        materials: WallMaterials,
    ) -> Result<Self, AssemblyError> {
        Self::validate(span, hole)?;

        let root = stage.scene.spawn_group("window_wall", None)?;
        stage.scene.attach(root)?;
        let mut hole_panel = Panel::spawn(stage, "hole", root, materials.cutter)?;
        stage.scene.set_visible(hole_panel.node(), false)?;
        let geometry = Self::cut(stage, &mut hole_panel, span, hole)?;
        let wall = stage.scene.spawn_mesh(
            "wall",
            Some(root),
            Renderable {
                mesh: geometry,
                material: materials.wall,
            },
        )?;
        stage
            .materials
            .set_uv_repeat(materials.wall, Vec2::new(span.width, span.height))?;

        Ok(Self {
            root,
            wall,
            hole: hole_panel,
            span,
            hole_span: hole,
            position: Vec3::ZERO,
            materials,
            geometry,
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn wall_node(&self) -> NodeId {
        self.wall
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn hole_span(&self) -> Span {
        self.hole_span
    }

    pub fn hole(&self) -> &Panel {
        &self.hole
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn geometry(&self) -> MeshHandle {
        self.geometry
    }

    /// Check a wall/opening pair without building anything.
    pub fn validate(span: Span, hole: Span) -> Result<(), ResizeError> {
        span.check(0.0)?;
        hole.check(0.0)?;
        let cut_height = hole.height + Self::HOLE_OVERCUT;
        let fits_x = hole.width < span.width;
        // the dropped cutter reaches hole/2 + overcut below the center
        let fits_y = cut_height / 2.0 + Self::HOLE_DROP < span.height / 2.0;
        if !(fits_x && fits_y) {
            return Err(ResizeError::HoleExceedsWall {
                width: span.width,
                height: span.height,
                hole_width: hole.width,
                hole_height: hole.height,
            });
        }
        Ok(())
    }

    /// Resize wall and opening and recut. The superseded geometry is released.
    pub fn set_size(&mut self, stage: &mut Stage, span: Span, hole: Span) -> Result<(), AssemblyError> {
        Self::validate(span, hole)?;
        self.span = span;
        self.hole_span = hole;
        self.rebuild(stage)
    }

    pub fn set_position(&mut self, stage: &mut Stage, position: Vec3) -> Result<(), AssemblyError> {
        self.position = position;
        stage
            .scene
            .set_transform(self.root, Transform::from_position(position))?;
        Ok(())
    }

    pub fn remove(&mut self, stage: &mut Stage) {
        stage.scene.detach(self.root);
    }

    pub fn add(&mut self, stage: &mut Stage) -> Result<(), AssemblyError> {
        stage.scene.attach(self.root)?;
        Ok(())
    }

    fn rebuild(&mut self, stage: &mut Stage) -> Result<(), AssemblyError> {
        let geometry = Self::cut(stage, &mut self.hole, self.span, self.hole_span)?;
        stage.scene.set_renderable(
            self.wall,
            Renderable {
                mesh: geometry,
                material: self.materials.wall,
            },
        )?;
        let previous = std::mem::replace(&mut self.geometry, geometry);
        stage.meshes.release(previous)?;
        stage
            .materials
            .set_uv_repeat(self.materials.wall, Vec2::new(self.span.width, self.span.height))?;
        Ok(())
    }

    /// Place the cutter for `hole` and store `span` minus the cutter.
    fn cut(
        stage: &mut Stage,
        cutter: &mut Panel,
        span: Span,
        hole: Span,
    ) -> Result<MeshHandle, AssemblyError> {
        let _span = tracing::debug_span!("wall_cut", width = span.width, height = span.height).entered();
        cutter.place(
            &mut stage.scene,
            Vec3::new(
                hole.width,
                hole.height + Self::HOLE_OVERCUT,
                Self::WALL_DEPTH + Self::CUT_CLEARANCE,
            ),
            Vec3::new(0.0, -Self::HOLE_DROP, 0.0),
        )?;

        let solid = Mesh::cuboid(Vec3::new(span.width, span.height, Self::WALL_DEPTH));
        let cutter = Mesh::unit_cube().transformed(cutter.transform().matrix());
        let cut = csg::subtract(&solid, &cutter);
        tracing::debug!(triangles = cut.triangle_count(), "wall recut");
        Ok(stage.meshes.insert(cut))
    }
}
