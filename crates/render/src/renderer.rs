use crate::draw_list::DrawList;
use fenestra_assets::{MaterialRegistry, MeshStore};
use fenestra_kernel::Scene;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.5, 2.0),
            target: Vec3::ZERO,
            fov_degrees: 50.0,
        }
    }
}

/// Orthographic shadow frustum of the directional light, and the floor that catches it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowSettings {
    /// Half the side of the square the light's frustum covers.
    pub extent: f32,
    /// Near plane, measured along the light's view direction. May be negative
    /// so casters behind the light position still land in the map.
    pub near: f32,
    pub far: f32,
    /// Depth offset against shadow acne, in shadow-map depth units.
    pub bias: f32,
    /// How dark a fully shadowed floor gets.
    pub floor_opacity: f32,
}

impl ShadowSettings {
    /// Side of the square shadow map, in texels.
    pub const MAP_SIZE: u32 = 2048;
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            extent: 3.5,
            near: -1.0,
            far: 10.0,
            bias: 0.002,
            floor_opacity: 0.1,
        }
    }
}

/// Ambient fill plus one shadow-casting directional light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lighting {
    pub ambient: f32,
    pub directional: f32,
    /// Where the directional light sits; it shines toward the origin.
    pub light_position: Vec3,
    #[serde(default)]
    pub shadow: ShadowSettings,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: 0.5,
            directional: 1.5,
            light_position: Vec3::new(-0.75, 1.0, 1.25),
            shadow: ShadowSettings::default(),
        }
    }
}

impl Lighting {
    /// Unit vector pointing from a lit surface toward the light.
    pub fn direction(&self) -> Vec3 {
        self.light_position.try_normalize().unwrap_or(Vec3::Y)
    }

    /// World to shadow-map clip space: an orthographic box looking from the
    /// light toward the origin.
    pub fn light_view_projection(&self) -> Mat4 {
        let dir = self.direction();
        let up = if dir.cross(Vec3::Y).length_squared() < 1e-6 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let eye = dir * self.light_position.length().max(1e-3);
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, up);
        let s = self.shadow;
        let projection =
            Mat4::orthographic_rh(-s.extent, s.extent, -s.extent, s.extent, s.near, s.far);
        projection * view
    }
}

/// Everything a renderer reads for one frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderScene<'a> {
    pub scene: &'a Scene,
    pub meshes: &'a MeshStore,
    pub materials: &'a MaterialRegistry,
    pub lighting: Lighting,
    pub floor_y: f32,
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads scene state and a view configuration, then produces
/// output. It never mutates the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene and view.
    fn render(&self, input: &RenderScene<'_>, view: &RenderView) -> Self::Output;
}

/// Human-readable dump of what would be drawn.
///
/// Used for CLI output, logging and testing the render interface.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, input: &RenderScene<'_>, view: &RenderView) -> String {
        let list = DrawList::build(input, view.eye);
        let mut out = String::new();

        // Writing into a String cannot fail.
        let _ = writeln!(out, "=== Scene (frame={}) ===", input.scene.frame());
        let _ = writeln!(
            out,
            "Nodes: {}  Drawn: {} opaque, {} transparent  Meshes: {} ({} tris)",
            input.scene.node_count(),
            list.opaque.len(),
            list.transparent.len(),
            input.meshes.len(),
            input.meshes.triangle_count(),
        );
        let _ = writeln!(
            out,
            "Camera: eye=({:.2}, {:.2}, {:.2}) target=({:.2}, {:.2}, {:.2}) fov={:.0}",
            view.eye.x, view.eye.y, view.eye.z, view.target.x, view.target.y, view.target.z,
            view.fov_degrees
        );
        let l = input.lighting;
        let _ = writeln!(
            out,
            "Light: ambient={:.2} directional={:.2} from ({:.2}, {:.2}, {:.2})  floor y={:.2}",
            l.ambient, l.directional, l.light_position.x, l.light_position.y, l.light_position.z,
            input.floor_y
        );
        let _ = writeln!(
            out,
            "Shadow: map={}x{} extent={:.2} casters={}",
            ShadowSettings::MAP_SIZE,
            ShadowSettings::MAP_SIZE,
            l.shadow.extent,
            list.shadow_casters().count(),
        );

        for item in list.opaque.iter().chain(&list.transparent) {
            let name = input
                .scene
                .get(item.node)
                .map(|n| n.name.as_str())
                .unwrap_or("?");
            let (scale, _, position) = item.world.to_scale_rotation_translation();
            let (material, color) = input
                .materials
                .get(item.material)
                .map(|m| (m.name.as_str(), m.base_color.to_hex()))
                .unwrap_or(("?", String::new()));
            let _ = writeln!(
                out,
                "  [{}] {:<14} mesh=#{:<3} {:<6} {} pos=({:.3}, {:.3}, {:.3}) size=({:.3}, {:.3}, {:.3})",
                item.node.short(),
                name,
                item.mesh.0,
                material,
                color,
                position.x,
                position.y,
                position.z,
                scale.x,
                scale.y,
                scale.z,
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fenestra_assets::Material;
    use fenestra_common::{Color, Transform};
    use fenestra_kernel::{NodeKind, Renderable};

    fn sample() -> (Scene, MeshStore, MaterialRegistry) {
        let mut scene = Scene::new();
        let mut meshes = MeshStore::new();
        let mut materials = MaterialRegistry::new();
        let cube = meshes.unit_cube();
        let metal = materials.register(Material::metal(Color::WHITE));
        let glass = materials.register(Material::glass());
        let root = scene.spawn_group("root", None).unwrap();
        scene
            .spawn(
                "beam",
                Some(root),
                NodeKind::Mesh(Renderable { mesh: cube, material: metal }),
                Transform::from_position(Vec3::new(1.0, 2.0, 3.0)),
            )
            .unwrap();
        scene
            .spawn_mesh("pane", Some(root), Renderable { mesh: cube, material: glass })
            .unwrap();
        scene.attach(root).unwrap();
        (scene, meshes, materials)
    }

    #[test]
    fn debug_renderer_empty_scene() {
        let scene = Scene::new();
        let meshes = MeshStore::new();
        let materials = MaterialRegistry::new();
        let input = RenderScene {
            scene: &scene,
            meshes: &meshes,
            materials: &materials,
            lighting: Lighting::default(),
            floor_y: -1.0,
        };
        let output = DebugTextRenderer::new().render(&input, &RenderView::default());

        assert!(output.contains("frame=0"));
        assert!(output.contains("Nodes: 0"));
        assert!(output.contains("floor y=-1.00"));
        assert!(output.contains("Shadow: map=2048x2048 extent=3.50 casters=0"));
    }

    #[test]
    fn debug_renderer_lists_drawn_nodes() {
        let (scene, meshes, materials) = sample();
        let input = RenderScene {
            scene: &scene,
            meshes: &meshes,
            materials: &materials,
            lighting: Lighting::default(),
            floor_y: -1.0,
        };
        let output = DebugTextRenderer::new().render(&input, &RenderView::default());

        assert!(output.contains("1 opaque, 1 transparent"));
        assert!(output.contains("beam"));
        assert!(output.contains("pos=(1.000, 2.000, 3.000)"));
        assert!(output.contains("#FFFFFF"));
        // Transparent panes come after opaque geometry.
        let beam = output.find("beam").unwrap();
        let pane = output.find("pane").unwrap();
        assert!(beam < pane);
    }

    #[test]
    fn render_view_default_looks_at_origin() {
        let view = RenderView::default();
        assert_eq!(view.fov_degrees, 50.0);
        assert_eq!(view.target, Vec3::ZERO);
        assert_eq!(view.eye, Vec3::new(0.0, 0.5, 2.0));
    }

    #[test]
    fn shadow_frustum_frames_the_origin() {
        let lighting = Lighting::default();
        let m = lighting.light_view_projection();
        let origin = m.project_point3(Vec3::ZERO);
        assert!(origin.x.abs() < 1e-5 && origin.y.abs() < 1e-5);
        assert!(origin.z > 0.0 && origin.z < 1.0);

        // Corners of a 4 x 4 wall stay inside the map.
        for corner in [Vec3::new(-2.0, -2.0, 0.0), Vec3::new(2.0, 2.0, 0.0)] {
            let p = m.project_point3(corner);
            assert!(p.x.abs() <= 1.0 && p.y.abs() <= 1.0, "{corner:?} -> {p:?}");
            assert!((0.0..=1.0).contains(&p.z));
        }
    }

    #[test]
    fn shadow_defaults() {
        let s = ShadowSettings::default();
        assert_eq!(ShadowSettings::MAP_SIZE, 2048);
        assert_eq!((s.extent, s.near, s.far), (3.5, -1.0, 10.0));
        assert_eq!(s.floor_opacity, 0.1);
    }

    #[test]
    fn lighting_without_shadow_field_deserializes() {
        let json = r#"{"ambient":0.5,"directional":1.5,"light_position":[-0.75,1.0,1.25]}"#;
        let lighting: Lighting = serde_json::from_str(json).unwrap();
        assert_eq!(lighting, Lighting::default());
    }

    #[test]
    fn lighting_direction_is_normalized() {
        let dir = Lighting::default().direction();
        assert!((dir.length() - 1.0).abs() < 1e-6);
        assert!(dir.x < 0.0 && dir.y > 0.0 && dir.z > 0.0);
    }
}
