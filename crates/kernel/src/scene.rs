use fenestra_common::{MaterialHandle, MeshHandle, NodeId, Transform};
use glam::Mat4;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Renderable payload: references mesh and material resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Renderable {
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
}

/// What a node contributes to the frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Pure transform node; only its children draw.
    Group,
    /// A mesh drawn with a material.
    Mesh(Renderable),
}

/// An event record produced by every mutation to the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneEvent {
    /// Node was created under the given parent (None for roots).
    Spawned { id: NodeId, parent: Option<NodeId> },
    /// Root node joined the rendered scene.
    Attached { id: NodeId },
    /// Root node left the rendered scene. The node itself still exists.
    Detached { id: NodeId },
    /// Node transform was updated.
    TransformUpdated {
        id: NodeId,
        old: Transform,
        new: Transform,
    },
    /// Node visibility flag changed.
    VisibilityChanged { id: NodeId, visible: bool },
    /// Node now draws a different mesh or material.
    RenderableChanged { id: NodeId, renderable: Renderable },
    /// One render frame elapsed.
    FrameAdvanced { frame: u64 },
}

/// Errors from scene operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("node {0:?} not found")]
    NodeNotFound(NodeId),
    #[error("node {0:?} has a parent and cannot be attached as a root")]
    NotARoot(NodeId),
    #[error("node {0:?} is a group and has no renderable")]
    NotAMesh(NodeId),
}

/// Per-node data stored in the scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub transform: Transform,
    pub visible: bool,
    pub kind: NodeKind,
}

/// A mesh node resolved to world space, ready for a renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drawable {
    pub node: NodeId,
    pub renderable: Renderable,
    pub world: Mat4,
}

/// The scene graph.
///
/// Nodes form a forest. Only trees whose root has been attached are part of
/// the rendered scene; detaching a root keeps the whole tree alive so it can
/// be re-attached later.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: BTreeMap<NodeId, SceneNode>,
    attached: BTreeSet<NodeId>,
    frame: u64,
    /// Append-only log of all mutations.
    event_log: Vec<SceneEvent>,
}

impl Scene {
    /// Create an empty scene at frame 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current render frame.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Number of nodes, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[SceneEvent] {
        &self.event_log
    }

    /// Read-only access to all nodes (BTreeMap for deterministic iteration).
    pub fn nodes(&self) -> &BTreeMap<NodeId, SceneNode> {
        &self.nodes
    }

    /// Roots currently part of the rendered scene.
    pub fn attached_roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.attached.iter().copied()
    }

    /// Create a group node.
    pub fn spawn_group(
        &mut self,
        name: impl Into<String>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, SceneError> {
        self.spawn(name, parent, NodeKind::Group, Transform::default())
    }

    /// Create a mesh node.
    pub fn spawn_mesh(
        &mut self,
        name: impl Into<String>,
        parent: Option<NodeId>,
        renderable: Renderable,
    ) -> Result<NodeId, SceneError> {
        self.spawn(name, parent, NodeKind::Mesh(renderable), Transform::default())
    }

    /// Create a node under `parent` (or as a detached root). Returns its id.
    pub fn spawn(
        &mut self,
        name: impl Into<String>,
        parent: Option<NodeId>,
        kind: NodeKind,
        transform: Transform,
    ) -> Result<NodeId, SceneError> {
        let id = NodeId::new();
        if let Some(parent_id) = parent {
            self.nodes
                .get_mut(&parent_id)
                .ok_or(SceneError::NodeNotFound(parent_id))?
                .children
                .push(id);
        }
        self.nodes.insert(
            id,
            SceneNode {
                name: name.into(),
                parent,
                children: Vec::new(),
                transform,
                visible: true,
                kind,
            },
        );
        self.event_log.push(SceneEvent::Spawned { id, parent });
        Ok(id)
    }

    /// Add a root node to the rendered scene. Attaching twice is a no-op.
    pub fn attach(&mut self, id: NodeId) -> Result<(), SceneError> {
        let node = self.nodes.get(&id).ok_or(SceneError::NodeNotFound(id))?;
        if node.parent.is_some() {
            return Err(SceneError::NotARoot(id));
        }
        if self.attached.insert(id) {
            tracing::trace!(node = %id.short(), "attached");
            self.event_log.push(SceneEvent::Attached { id });
        }
        Ok(())
    }

    /// Remove a root node from the rendered scene. Returns whether it was attached.
    pub fn detach(&mut self, id: NodeId) -> bool {
        let removed = self.attached.remove(&id);
        if removed {
            tracing::trace!(node = %id.short(), "detached");
            self.event_log.push(SceneEvent::Detached { id });
        }
        removed
    }

    /// Whether the tree containing `id` is part of the rendered scene.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            match self.nodes.get(&current) {
                Some(node) => match node.parent {
                    Some(parent) => current = parent,
                    None => return self.attached.contains(&current),
                },
                None => return false,
            }
        }
    }

    /// Get a reference to node data.
    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    /// Local transform of a node.
    pub fn transform(&self, id: NodeId) -> Option<Transform> {
        self.nodes.get(&id).map(|n| n.transform)
    }

    /// Update a node's local transform and log the change.
    pub fn set_transform(&mut self, id: NodeId, new: Transform) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::NodeNotFound(id))?;
        let old = node.transform;
        if old == new {
            return Ok(());
        }
        node.transform = new;
        self.event_log
            .push(SceneEvent::TransformUpdated { id, old, new });
        Ok(())
    }

    /// Show or hide a node and its whole subtree.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::NodeNotFound(id))?;
        if node.visible != visible {
            node.visible = visible;
            self.event_log
                .push(SceneEvent::VisibilityChanged { id, visible });
        }
        Ok(())
    }

    /// Swap the mesh or material drawn by a mesh node.
    pub fn set_renderable(&mut self, id: NodeId, renderable: Renderable) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::NodeNotFound(id))?;
        match &mut node.kind {
            NodeKind::Mesh(current) => {
                *current = renderable;
                self.event_log
                    .push(SceneEvent::RenderableChanged { id, renderable });
                Ok(())
            }
            NodeKind::Group => Err(SceneError::NotAMesh(id)),
        }
    }

    /// Renderable of a mesh node.
    pub fn renderable(&self, id: NodeId) -> Option<Renderable> {
        match self.nodes.get(&id)?.kind {
            NodeKind::Mesh(r) => Some(r),
            NodeKind::Group => None,
        }
    }

    /// Local-to-world matrix of a node, composed through all ancestors.
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let mut node = self.nodes.get(&id)?;
        let mut matrix = node.transform.matrix();
        while let Some(parent) = node.parent {
            node = self.nodes.get(&parent)?;
            matrix = node.transform.matrix() * matrix;
        }
        Some(matrix)
    }

    /// Whether the node and every ancestor are visible.
    pub fn is_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            match self.nodes.get(&cur) {
                Some(node) if node.visible => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// All mesh nodes that would be drawn this frame, in deterministic order.
    pub fn drawables(&self) -> Vec<Drawable> {
        let mut out = Vec::new();
        let mut stack: Vec<(NodeId, Mat4)> = self
            .attached
            .iter()
            .rev()
            .map(|id| (*id, Mat4::IDENTITY))
            .collect();

        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            let world = parent_world * node.transform.matrix();
            if let NodeKind::Mesh(renderable) = node.kind {
                out.push(Drawable {
                    node: id,
                    renderable,
                    world,
                });
            }
            for child in node.children.iter().rev() {
                stack.push((*child, world));
            }
        }
        out
    }

    /// Advance the render frame counter by one.
    pub fn advance_frame(&mut self) {
        self.frame += 1;
        self.event_log.push(SceneEvent::FrameAdvanced { frame: self.frame });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn cube() -> Renderable {
        Renderable {
            mesh: MeshHandle(0),
            material: MaterialHandle(0),
        }
    }

    #[test]
    fn scene_starts_empty() {
        let s = Scene::new();
        assert_eq!(s.frame(), 0);
        assert_eq!(s.node_count(), 0);
        assert!(s.drawables().is_empty());
    }

    #[test]
    fn spawn_under_missing_parent_fails() {
        let mut s = Scene::new();
        let ghost = NodeId::new();
        assert_eq!(
            s.spawn_group("child", Some(ghost)),
            Err(SceneError::NodeNotFound(ghost))
        );
        assert_eq!(s.node_count(), 0);
    }

    #[test]
    fn only_attached_trees_are_drawn() {
        let mut s = Scene::new();
        let root = s.spawn_group("root", None).unwrap();
        s.spawn_mesh("beam", Some(root), cube()).unwrap();
        assert!(s.drawables().is_empty());

        s.attach(root).unwrap();
        assert_eq!(s.drawables().len(), 1);

        assert!(s.detach(root));
        assert!(s.drawables().is_empty());
        assert_eq!(s.node_count(), 2);
    }

    #[test]
    fn attach_child_is_rejected() {
        let mut s = Scene::new();
        let root = s.spawn_group("root", None).unwrap();
        let child = s.spawn_group("child", Some(root)).unwrap();
        assert_eq!(s.attach(child), Err(SceneError::NotARoot(child)));
    }

    #[test]
    fn hidden_parent_hides_subtree() {
        let mut s = Scene::new();
        let root = s.spawn_group("root", None).unwrap();
        let handle = s.spawn_group("handle", Some(root)).unwrap();
        let grip = s.spawn_mesh("grip", Some(handle), cube()).unwrap();
        s.attach(root).unwrap();

        s.set_visible(handle, false).unwrap();
        assert!(s.drawables().is_empty());
        assert!(!s.is_visible(grip));

        s.set_visible(handle, true).unwrap();
        assert_eq!(s.drawables().len(), 1);
        assert!(s.is_visible(grip));
    }

    #[test]
    fn world_matrix_composes_parents() {
        let mut s = Scene::new();
        let root = s.spawn_group("root", None).unwrap();
        let child = s.spawn_mesh("child", Some(root), cube()).unwrap();
        s.set_transform(root, Transform::from_position(Vec3::new(1.0, 0.0, 0.0)))
            .unwrap();
        s.set_transform(
            child,
            Transform {
                position: Vec3::new(0.0, 2.0, 0.0),
                scale: Vec3::new(2.0, 2.0, 2.0),
                ..Transform::default()
            },
        )
        .unwrap();

        let world = s.world_matrix(child).unwrap();
        let p = world.transform_point3(Vec3::new(0.5, 0.0, 0.0));
        assert!((p - Vec3::new(2.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn drawables_match_world_matrix() {
        let mut s = Scene::new();
        let root = s.spawn_group("root", None).unwrap();
        let child = s.spawn_mesh("child", Some(root), cube()).unwrap();
        s.set_transform(
            root,
            Transform {
                rotation: Quat::from_rotation_y(0.5),
                ..Transform::default()
            },
        )
        .unwrap();
        s.attach(root).unwrap();

        let drawn = s.drawables();
        assert_eq!(drawn[0].node, child);
        assert_eq!(drawn[0].world, s.world_matrix(child).unwrap());
    }

    #[test]
    fn set_renderable_on_group_fails() {
        let mut s = Scene::new();
        let g = s.spawn_group("g", None).unwrap();
        assert_eq!(s.set_renderable(g, cube()), Err(SceneError::NotAMesh(g)));
    }

    #[test]
    fn unchanged_transform_logs_nothing() {
        let mut s = Scene::new();
        let g = s.spawn_group("g", None).unwrap();
        s.drain_events();
        s.set_transform(g, Transform::default()).unwrap();
        assert!(s.events().is_empty());
    }

    #[test]
    fn events_are_recorded() {
        let mut s = Scene::new();
        let g = s.spawn_group("g", None).unwrap();
        s.attach(g).unwrap();
        s.attach(g).unwrap();
        s.advance_frame();
        // spawn + attach + frame; the second attach is a no-op
        assert_eq!(s.events().len(), 3);
        assert_eq!(s.frame(), 1);
    }
}
