use crate::renderer::RenderScene;
use fenestra_assets::Pattern;
use fenestra_common::{MaterialHandle, MeshHandle, NodeId};
use glam::{Mat4, Vec2, Vec3};

/// One mesh instance with its material already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub node: NodeId,
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
    pub world: Mat4,
    /// Linear RGB, alpha carries the material opacity.
    pub color: [f32; 4],
    pub roughness: f32,
    pub metalness: f32,
    pub pattern: Pattern,
    pub uv_repeat: Vec2,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    /// Distance from the eye to the instance origin.
    pub depth: f32,
}

/// The frame's draw calls split into the two passes.
///
/// `opaque` is ordered by mesh so equal meshes batch into one instanced
/// draw; `transparent` is ordered back to front.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    pub opaque: Vec<DrawItem>,
    pub transparent: Vec<DrawItem>,
}

impl DrawList {
    pub fn build(input: &RenderScene<'_>, eye: Vec3) -> Self {
        let mut list = DrawList::default();
        for drawable in input.scene.drawables() {
            let mesh = drawable.renderable.mesh;
            if input.meshes.get(mesh).is_none() {
                tracing::trace!(node = %drawable.node.short(), mesh = mesh.0, "mesh not resident");
                continue;
            }
            let Some(material) = input.materials.get(drawable.renderable.material) else {
                continue;
            };
            if material.pattern == Pattern::Wire {
                continue;
            }

            let mut color = material.base_color.to_linear();
            color[3] *= material.opacity;
            let item = DrawItem {
                node: drawable.node,
                mesh,
                material: drawable.renderable.material,
                world: drawable.world,
                color,
                roughness: material.roughness,
                metalness: material.metalness,
                pattern: material.pattern,
                uv_repeat: material.uv_repeat,
                cast_shadow: material.cast_shadow,
                receive_shadow: material.receive_shadow,
                depth: drawable.world.w_axis.truncate().distance(eye),
            };
            if material.is_transparent() {
                list.transparent.push(item);
            } else {
                list.opaque.push(item);
            }
        }

        list.opaque.sort_by_key(|item| item.mesh);
        list.transparent
            .sort_by(|a, b| b.depth.total_cmp(&a.depth));
        list
    }

    /// Consecutive opaque items sharing a mesh.
    pub fn opaque_batches(&self) -> impl Iterator<Item = &[DrawItem]> + '_ {
        self.opaque.chunk_by(|a, b| a.mesh == b.mesh)
    }

    /// Opaque items that go into the shadow map, with their index in `opaque`.
    /// Blended glass never casts.
    pub fn shadow_casters(&self) -> impl Iterator<Item = (usize, &DrawItem)> + '_ {
        self.opaque
            .iter()
            .enumerate()
            .filter(|(_, item)| item.cast_shadow)
    }

    pub fn len(&self) -> usize {
        self.opaque.len() + self.transparent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Lighting;
    use fenestra_assets::{Material, MaterialRegistry, MeshStore};
    use fenestra_common::{Color, Transform};
    use fenestra_kernel::{NodeKind, Renderable, Scene};
    use fenestra_mesh::Mesh;

    struct Fixture {
        scene: Scene,
        meshes: MeshStore,
        materials: MaterialRegistry,
    }

    impl Fixture {
        fn input(&self) -> RenderScene<'_> {
            RenderScene {
                scene: &self.scene,
                meshes: &self.meshes,
                materials: &self.materials,
                lighting: Lighting::default(),
                floor_y: -1.0,
            }
        }
    }

    fn fixture() -> Fixture {
        let mut scene = Scene::new();
        let mut meshes = MeshStore::new();
        let mut materials = MaterialRegistry::new();
        let cube = meshes.unit_cube();
        let slab = meshes.insert(Mesh::cuboid(Vec3::new(2.0, 2.0, 0.15)));
        let metal = materials.register(Material::metal(Color::WHITE));
        let glass = materials.register(Material::glass());
        let cutter = materials.register(Material::cutter());
        let brick = materials.register(Material::wall());

        let root = scene.spawn_group("root", None).unwrap();
        let mut put = |name: &str, mesh, material, z: f32| {
            scene
                .spawn(
                    name,
                    Some(root),
                    NodeKind::Mesh(Renderable { mesh, material }),
                    Transform::from_position(Vec3::new(0.0, 0.0, z)),
                )
                .unwrap();
        };
        put("beam_a", cube, metal, 0.0);
        put("wall", slab, brick, 0.0);
        put("beam_b", cube, metal, 0.0);
        put("near_pane", cube, glass, 1.0);
        put("far_pane", cube, glass, -1.0);
        put("cutter", cube, cutter, 0.0);
        scene.attach(root).unwrap();
        Fixture {
            scene,
            meshes,
            materials,
        }
    }

    #[test]
    fn splits_opaque_and_transparent() {
        let f = fixture();
        let list = DrawList::build(&f.input(), Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(list.opaque.len(), 3);
        assert_eq!(list.transparent.len(), 2);
        assert!(list.transparent.iter().all(|i| (i.color[3] - 0.2).abs() < 1e-6));
    }

    #[test]
    fn wire_helpers_are_not_drawn() {
        let f = fixture();
        let list = DrawList::build(&f.input(), Vec3::ZERO);
        let names: Vec<&str> = list
            .opaque
            .iter()
            .chain(&list.transparent)
            .map(|i| f.scene.get(i.node).unwrap().name.as_str())
            .collect();
        assert!(!names.contains(&"cutter"));
    }

    #[test]
    fn transparent_sorted_back_to_front() {
        let f = fixture();
        let list = DrawList::build(&f.input(), Vec3::new(0.0, 0.0, 2.0));
        let first = f.scene.get(list.transparent[0].node).unwrap();
        assert_eq!(first.name, "far_pane");
        assert!(list.transparent[0].depth > list.transparent[1].depth);
    }

    #[test]
    fn opaque_batches_group_by_mesh() {
        let f = fixture();
        let list = DrawList::build(&f.input(), Vec3::ZERO);
        let sizes: Vec<usize> = list.opaque_batches().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![2, 1]);
    }

    #[test]
    fn only_the_wall_casts_shadows() {
        let f = fixture();
        let list = DrawList::build(&f.input(), Vec3::ZERO);
        let casters: Vec<(usize, &str)> = list
            .shadow_casters()
            .map(|(i, item)| (i, f.scene.get(item.node).unwrap().name.as_str()))
            .collect();
        assert_eq!(casters.len(), 1);
        let (index, name) = casters[0];
        assert_eq!(name, "wall");
        assert!(list.opaque[index].receive_shadow);
        assert!(list.transparent.iter().all(|i| !i.cast_shadow));
    }

    #[test]
    fn released_meshes_are_skipped() {
        let mut f = fixture();
        let slab = f.meshes.iter().map(|(h, _)| h).max().unwrap();
        f.meshes.release(slab).unwrap();
        let list = DrawList::build(&f.input(), Vec3::ZERO);
        assert_eq!(list.opaque.len(), 2);
    }
}
