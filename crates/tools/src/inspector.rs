use fenestra_assets::{MaterialRegistry, MeshStore};
use fenestra_common::NodeId;
use fenestra_kernel::{NodeKind, Scene};
use serde::Serialize;

/// Scene inspector for developer tooling.
///
/// Read-only queries against the scene for the debug panel and `--json` output.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of the scene and its resources.
    pub fn summary(scene: &Scene, meshes: &MeshStore, materials: &MaterialRegistry) -> SceneSummary {
        SceneSummary {
            frame: scene.frame(),
            node_count: scene.node_count(),
            root_count: scene.attached_roots().count(),
            drawn_count: scene.drawables().len(),
            mesh_count: meshes.len(),
            triangle_count: meshes.triangle_count(),
            material_count: materials.len(),
            pending_events: scene.events().len(),
        }
    }

    pub fn inspect_node(scene: &Scene, id: NodeId) -> Option<NodeInfo> {
        let node = scene.get(id)?;
        let t = node.transform;
        let world = scene.world_matrix(id)?;
        let (mesh, material) = match node.kind {
            NodeKind::Mesh(r) => (Some(r.mesh.0), Some(r.material.0)),
            NodeKind::Group => (None, None),
        };
        Some(NodeInfo {
            id,
            name: node.name.clone(),
            visible: scene.is_visible(id),
            position: t.position.to_array(),
            rotation: t.rotation.to_array(),
            scale: t.scale.to_array(),
            world_position: world.w_axis.truncate().to_array(),
            mesh,
            material,
        })
    }

    /// Depth-first outline of every attached root, children in insertion order.
    pub fn outline(scene: &Scene) -> Vec<OutlineEntry> {
        let mut out = Vec::new();
        let mut stack: Vec<(NodeId, usize)> =
            scene.attached_roots().map(|id| (id, 0)).collect();
        stack.reverse();
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = scene.get(id) else {
                continue;
            };
            out.push(OutlineEntry {
                id,
                depth,
                name: node.name.clone(),
                visible: node.visible,
            });
            for child in node.children.iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
        out
    }
}

/// Summary of scene state for the inspector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneSummary {
    pub frame: u64,
    pub node_count: usize,
    pub root_count: usize,
    pub drawn_count: usize,
    pub mesh_count: usize,
    pub triangle_count: usize,
    pub material_count: usize,
    pub pending_events: usize,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: frame={} nodes={} roots={} drawn={} meshes={} ({} tris) materials={}",
            self.frame,
            self.node_count,
            self.root_count,
            self.drawn_count,
            self.mesh_count,
            self.triangle_count,
            self.material_count,
        )
    }
}

/// Detailed info about a single node.
#[derive(Debug, Clone, Serialize)]
pub struct NodeInfo {
    pub id: NodeId,
    pub name: String,
    /// Effective visibility, ancestors included.
    pub visible: bool,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    pub world_position: [f32; 3],
    pub mesh: Option<u64>,
    pub material: Option<u64>,
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} pos=({:.3}, {:.3}, {:.3}) scale=({:.3}, {:.3}, {:.3}){}",
            self.id.short(),
            self.name,
            self.position[0],
            self.position[1],
            self.position[2],
            self.scale[0],
            self.scale[1],
            self.scale[2],
            if self.visible { "" } else { " hidden" },
        )
    }
}

/// One line of the scene outline.
#[derive(Debug, Clone, Serialize)]
pub struct OutlineEntry {
    pub id: NodeId,
    pub depth: usize,
    pub name: String,
    pub visible: bool,
}
