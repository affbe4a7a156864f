//! glTF import of the two-part door handle model.

use crate::AssetError;
use fenestra_common::Transform;
use fenestra_mesh::{Mesh, Vertex};
use glam::{Mat4, Vec2, Vec3};
use std::path::Path;

/// Mesh names looked up first; without them the first two meshes are used.
pub const BASE_MESH_NAME: &str = "handle_base";
pub const GRIP_MESH_NAME: &str = "handle_grip";

/// One part of the handle with its placement inside the model.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlePart {
    pub mesh: Mesh,
    pub transform: Transform,
}

/// The base plate and the turning grip of a door handle.
#[derive(Debug, Clone, PartialEq)]
pub struct HandleModel {
    pub base: HandlePart,
    pub grip: HandlePart,
}

/// Load a handle model from a `.gltf` or `.glb` file. Relative buffer URIs
/// resolve against the file's directory.
pub fn import_handle_model(path: impl AsRef<Path>) -> Result<HandleModel, AssetError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let model = import(&bytes, path.parent())?;
    tracing::debug!(path = %path.display(), "handle model imported");
    Ok(model)
}

/// Load a handle model from memory. Only embedded buffers can be resolved.
pub fn import_handle_model_slice(bytes: &[u8]) -> Result<HandleModel, AssetError> {
    import(bytes, None)
}

fn import(bytes: &[u8], base: Option<&Path>) -> Result<HandleModel, AssetError> {
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes)?;
    let buffers = gltf::import_buffers(&document, base, blob)?;

    let mut parts = Vec::new();
    let scene = document.default_scene().or_else(|| document.scenes().next());
    if let Some(scene) = scene {
        for node in scene.nodes() {
            collect(node, Mat4::IDENTITY, &buffers, &mut parts);
        }
    } else {
        for mesh in document.meshes() {
            let geometry = read_mesh(&mesh, &buffers);
            if !geometry.is_empty() {
                let part = HandlePart {
                    mesh: geometry,
                    transform: Transform::default(),
                };
                parts.push((mesh.name().map(str::to_owned), part));
            }
        }
    }

    pick(parts)
}

fn pick(mut parts: Vec<(Option<String>, HandlePart)>) -> Result<HandleModel, AssetError> {
    let found = parts.len();
    let named = |parts: &[(Option<String>, HandlePart)], name: &str| {
        parts.iter().position(|(n, _)| n.as_deref() == Some(name))
    };
    match (named(&parts, BASE_MESH_NAME), named(&parts, GRIP_MESH_NAME)) {
        (Some(b), Some(g)) => {
            let base = parts[b].1.clone();
            let grip = parts[g].1.clone();
            Ok(HandleModel { base, grip })
        }
        _ if found >= 2 => {
            let mut iter = parts.drain(..2).map(|(_, part)| part);
            match (iter.next(), iter.next()) {
                (Some(base), Some(grip)) => Ok(HandleModel { base, grip }),
                _ => Err(AssetError::MissingMesh { found }),
            }
        }
        _ => Err(AssetError::MissingMesh { found }),
    }
}

fn collect(
    node: gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<(Option<String>, HandlePart)>,
) {
    let matrix = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        let geometry = read_mesh(&mesh, buffers);
        if !geometry.is_empty() {
            let (scale, rotation, position) = matrix.to_scale_rotation_translation();
            let part = HandlePart {
                mesh: geometry,
                transform: Transform {
                    position,
                    rotation,
                    scale,
                },
            };
            out.push((mesh.name().map(str::to_owned), part));
        }
    }
    for child in node.children() {
        collect(child, matrix, buffers, out);
    }
}

/// Merge every triangle-list primitive of `mesh`. Primitives with missing
/// positions or out-of-range indices are skipped.
fn read_mesh(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data]) -> Mesh {
    let mut out = Mesh::new();
    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            continue;
        }
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));
        let Some(positions) = reader.read_positions() else {
            continue;
        };
        let positions: Vec<Vec3> = positions.map(Vec3::from).collect();
        let count = positions.len() as u32;
        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..count).collect(),
        };
        if indices.len() % 3 != 0 || indices.iter().any(|i| *i >= count) {
            tracing::warn!(mesh = ?mesh.name(), "skipping primitive with invalid indices");
            continue;
        }
        let normals: Vec<Vec3> = reader
            .read_normals()
            .map(|n| n.map(Vec3::from).collect())
            .unwrap_or_else(|| face_normals(&positions, &indices));
        let uvs: Vec<Vec2> = reader
            .read_tex_coords(0)
            .map(|t| t.into_f32().map(Vec2::from).collect())
            .unwrap_or_default();

        let base = out.vertices.len() as u32;
        for (i, position) in positions.iter().enumerate() {
            let normal = normals.get(i).copied().unwrap_or(Vec3::Z);
            let uv = uvs.get(i).copied().unwrap_or(Vec2::ZERO);
            out.vertices.push(Vertex::new(*position, normal, uv));
        }
        out.indices.extend(indices.iter().map(|i| base + i));
    }
    out
}

/// Area-weighted vertex normals for primitives that ship without them.
fn face_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals.iter().map(|n| n.normalize_or(Vec3::Z)).collect()
}
