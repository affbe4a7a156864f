use crate::AssetError;
use fenestra_common::{Color, MaterialHandle};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Surface pattern a renderer should apply on top of the base color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Pattern {
    #[default]
    Solid,
    /// Tiling brick courses, repeated `uv_repeat` times across a face.
    Brick,
    /// Wireframe helper. Never drawn shaded.
    Wire,
}

/// A PBR-like material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub base_color: Color,
    pub roughness: f32,
    pub metalness: f32,
    /// Below 1.0 the material is drawn in the blended pass.
    pub opacity: f32,
    pub uv_repeat: Vec2,
    pub pattern: Pattern,
    /// Drawn into the directional light's shadow map.
    #[serde(default)]
    pub cast_shadow: bool,
    /// Darkened where the shadow map says the light is blocked.
    #[serde(default)]
    pub receive_shadow: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".into(),
            base_color: Color::WHITE,
            roughness: 1.0,
            metalness: 0.0,
            opacity: 1.0,
            uv_repeat: Vec2::ONE,
            pattern: Pattern::Solid,
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

impl Material {
    /// Frame and handle metal.
    pub fn metal(color: Color) -> Self {
        Self {
            name: "metal".into(),
            base_color: color,
            roughness: 0.5,
            ..Self::default()
        }
    }

    /// Semi-transparent window pane.
    pub fn glass() -> Self {
        Self {
            name: "glass".into(),
            roughness: 0.25,
            metalness: 1.0,
            opacity: 0.2,
            ..Self::default()
        }
    }

    /// Tiling plaster/brick wall surface.
    pub fn wall() -> Self {
        Self {
            name: "wall".into(),
            pattern: Pattern::Brick,
            cast_shadow: true,
            receive_shadow: true,
            ..Self::default()
        }
    }

    /// Invisible CSG cutter; kept for debug views.
    pub fn cutter() -> Self {
        Self {
            name: "cutter".into(),
            base_color: Color::rgb(0.0, 0.0, 1.0),
            pattern: Pattern::Wire,
            ..Self::default()
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }
}

/// Materials addressed by [`MaterialHandle`].
///
/// Assemblies hold handles, not copies, so [`set_color`](Self::set_color)
/// recolors every panel that references the material.
#[derive(Debug, Clone, Default)]
pub struct MaterialRegistry {
    materials: BTreeMap<MaterialHandle, Material>,
    next_id: u64,
}

impl MaterialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, material: Material) -> MaterialHandle {
        self.next_id += 1;
        let handle = MaterialHandle(self.next_id);
        tracing::debug!(?handle, name = %material.name, "material registered");
        self.materials.insert(handle, material);
        handle
    }

    pub fn get(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(&handle)
    }

    pub fn set_color(&mut self, handle: MaterialHandle, color: Color) -> Result<(), AssetError> {
        let material = self.get_mut(handle)?;
        material.base_color = color;
        Ok(())
    }

    pub fn set_uv_repeat(&mut self, handle: MaterialHandle, repeat: Vec2) -> Result<(), AssetError> {
        let material = self.get_mut(handle)?;
        material.uv_repeat = repeat;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialHandle, &Material)> + '_ {
        self.materials.iter().map(|(h, m)| (*h, m))
    }

    fn get_mut(&mut self, handle: MaterialHandle) -> Result<&mut Material, AssetError> {
        self.materials
            .get_mut(&handle)
            .ok_or(AssetError::MaterialNotFound(handle))
    }
}
