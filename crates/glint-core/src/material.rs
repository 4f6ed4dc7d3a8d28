//! Runtime materials.
//!
//! One [`Material`] struct covers every kind the loader produces; the
//! [`MaterialType`] tag tells the renderer which shading model applies and
//! which fields are meaningful.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::ids::MaterialId;
use crate::texture::Texture;
use crate::UserData;

/// Shading model of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialType {
    /// Physically based metallic-roughness.
    Standard,
    /// Unlit.
    Basic,
    /// Specular-glossiness shader material with its own uniform block.
    SpecularGlossiness,
    /// Point sprites.
    Points,
    /// Unlit lines.
    LineBasic,
}

/// Faces rendered by a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// Texture-bearing channels of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureSlot {
    Map,
    MetalnessMap,
    RoughnessMap,
    NormalMap,
    AoMap,
    EmissiveMap,
    SpecularMap,
    GlossinessMap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub id: MaterialId,
    pub name: String,
    pub material_type: MaterialType,
    pub color: [f32; 3],
    pub opacity: f32,
    pub transparent: bool,
    pub alpha_test: f32,
    pub side: Side,
    pub lights: bool,

    pub metalness: f32,
    pub roughness: f32,
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
    pub normal_scale: Option<[f32; 2]>,
    pub ao_map_intensity: f32,

    pub specular: [f32; 3],
    pub glossiness: f32,
    pub refraction_ratio: f32,
    pub env_map_intensity: f32,
    pub defines: BTreeMap<String, String>,

    pub map: Option<Rc<Texture>>,
    pub metalness_map: Option<Rc<Texture>>,
    pub roughness_map: Option<Rc<Texture>>,
    pub normal_map: Option<Rc<Texture>>,
    pub ao_map: Option<Rc<Texture>>,
    pub emissive_map: Option<Rc<Texture>>,
    pub specular_map: Option<Rc<Texture>>,
    pub glossiness_map: Option<Rc<Texture>>,

    pub skinning: bool,
    pub vertex_colors: bool,
    pub flat_shading: bool,
    pub morph_targets: bool,
    pub morph_normals: bool,

    pub user_data: UserData,
}

impl Default for Material {
    fn default() -> Self {
        Self::new(MaterialType::Standard)
    }
}

impl Material {
    pub fn new(material_type: MaterialType) -> Self {
        Self {
            id: MaterialId::next(),
            name: String::new(),
            material_type,
            color: [1.0, 1.0, 1.0],
            opacity: 1.0,
            transparent: false,
            alpha_test: 0.0,
            side: Side::Front,
            lights: !matches!(
                material_type,
                MaterialType::Basic | MaterialType::Points | MaterialType::LineBasic
            ),
            metalness: 0.5,
            roughness: 0.5,
            emissive: [0.0, 0.0, 0.0],
            emissive_intensity: 1.0,
            normal_scale: None,
            ao_map_intensity: 1.0,
            specular: [1.0, 1.0, 1.0],
            glossiness: 1.0,
            refraction_ratio: 0.98,
            env_map_intensity: 1.0,
            defines: BTreeMap::new(),
            map: None,
            metalness_map: None,
            roughness_map: None,
            normal_map: None,
            ao_map: None,
            emissive_map: None,
            specular_map: None,
            glossiness_map: None,
            skinning: false,
            vertex_colors: false,
            flat_shading: false,
            morph_targets: false,
            morph_normals: false,
            user_data: UserData::new(),
        }
    }

    /// The glTF default material: white, fully metallic and rough, opaque,
    /// front faces only.
    pub fn gltf_default() -> Self {
        Self {
            metalness: 1.0,
            roughness: 1.0,
            ..Self::new(MaterialType::Standard)
        }
    }

    pub fn is_specular_glossiness(&self) -> bool {
        self.material_type == MaterialType::SpecularGlossiness
    }

    pub fn texture(&self, slot: TextureSlot) -> Option<&Rc<Texture>> {
        match slot {
            TextureSlot::Map => self.map.as_ref(),
            TextureSlot::MetalnessMap => self.metalness_map.as_ref(),
            TextureSlot::RoughnessMap => self.roughness_map.as_ref(),
            TextureSlot::NormalMap => self.normal_map.as_ref(),
            TextureSlot::AoMap => self.ao_map.as_ref(),
            TextureSlot::EmissiveMap => self.emissive_map.as_ref(),
            TextureSlot::SpecularMap => self.specular_map.as_ref(),
            TextureSlot::GlossinessMap => self.glossiness_map.as_ref(),
        }
    }

    pub fn set_texture(&mut self, slot: TextureSlot, texture: Rc<Texture>) {
        let target = match slot {
            TextureSlot::Map => &mut self.map,
            TextureSlot::MetalnessMap => &mut self.metalness_map,
            TextureSlot::RoughnessMap => &mut self.roughness_map,
            TextureSlot::NormalMap => &mut self.normal_map,
            TextureSlot::AoMap => &mut self.ao_map,
            TextureSlot::EmissiveMap => &mut self.emissive_map,
            TextureSlot::SpecularMap => &mut self.specular_map,
            TextureSlot::GlossinessMap => &mut self.glossiness_map,
        };
        *target = Some(texture);
    }

    /// A copy of this material with a fresh identity.
    pub fn clone_material(&self) -> Self {
        Self {
            id: MaterialId::next(),
            ..self.clone()
        }
    }

    /// A points material copying this material's common state, color and
    /// base color map. Points are not lit.
    pub fn to_points_material(&self) -> Self {
        Self {
            color: self.color,
            map: self.map.clone(),
            ..self.common_copy(MaterialType::Points)
        }
    }

    /// A line material copying this material's common state and color.
    pub fn to_line_material(&self) -> Self {
        Self {
            color: self.color,
            ..self.common_copy(MaterialType::LineBasic)
        }
    }

    fn common_copy(&self, material_type: MaterialType) -> Self {
        let mut material = Material::new(material_type);
        material.name = self.name.clone();
        material.opacity = self.opacity;
        material.transparent = self.transparent;
        material.alpha_test = self.alpha_test;
        material.side = self.side;
        material.user_data = self.user_data.clone();
        material.lights = false;
        material
    }
}

/// Per-draw uniform block of a specular-glossiness material.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShaderUniforms {
    pub opacity: f32,
    pub diffuse: [f32; 3],
    pub emissive: [f32; 3],
    pub specular: [f32; 3],
    pub glossiness: f32,
    pub ao_map_intensity: f32,
    pub env_map_intensity: f32,
    pub refraction_ratio: f32,
    pub map: Option<Rc<Texture>>,
    pub specular_map: Option<Rc<Texture>>,
    pub glossiness_map: Option<Rc<Texture>>,
    pub normal_map: Option<Rc<Texture>>,
    pub ao_map: Option<Rc<Texture>>,
    pub emissive_map: Option<Rc<Texture>>,
    /// Channel whose texture transform drives the shared UV transform.
    pub uv_transform_source: Option<TextureSlot>,
    pub defines: BTreeMap<String, String>,
}

/// Callback run before a mesh is drawn to refresh material uniforms.
#[derive(Clone, Copy)]
pub struct RefreshUniforms(pub fn(&Material, &mut ShaderUniforms));

impl RefreshUniforms {
    pub fn call(&self, material: &Material, uniforms: &mut ShaderUniforms) {
        (self.0)(material, uniforms)
    }
}

impl fmt::Debug for RefreshUniforms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefreshUniforms")
    }
}

impl PartialEq for RefreshUniforms {
    fn eq(&self, other: &Self) -> bool {
        self.0 as usize == other.0 as usize
    }
}
