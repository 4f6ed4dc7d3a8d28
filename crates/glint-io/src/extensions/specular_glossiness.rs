//! `KHR_materials_pbrSpecularGlossiness`: specular-glossiness shader
//! materials.
//!
//! Materials of this type carry their own uniform block, so meshes using one
//! get [`refresh_uniforms`] as their `on_before_render` callback.

use glint_core::material::{Material, MaterialType, RefreshUniforms, ShaderUniforms, TextureSlot};
use serde::Deserialize;

use super::{MaterialExtension, TextureAssignment, KHR_MATERIALS_PBR_SPECULAR_GLOSSINESS};
use crate::document::{MaterialDef, TextureInfo};

pub const USE_GLOSSINESSMAP: &str = "USE_GLOSSINESSMAP";
pub const USE_ROUGHNESSMAP: &str = "USE_ROUGHNESSMAP";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpecularGlossinessDef {
    diffuse_factor: Option<[f32; 4]>,
    diffuse_texture: Option<TextureInfo>,
    specular_factor: Option<[f32; 3]>,
    glossiness_factor: Option<f32>,
    specular_glossiness_texture: Option<TextureInfo>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SpecularGlossinessExtension;

impl SpecularGlossinessExtension {
    /// Callback that keeps a mesh's uniform block in sync with its material.
    pub fn refresh_callback(&self) -> RefreshUniforms {
        RefreshUniforms(refresh_uniforms)
    }
}

impl MaterialExtension for SpecularGlossinessExtension {
    fn material_type(&self) -> MaterialType {
        MaterialType::SpecularGlossiness
    }

    fn extend_params(&self, material: &mut Material, material_def: &MaterialDef) -> Vec<TextureAssignment> {
        let params: SpecularGlossinessDef = material_def
            .extensions
            .get(KHR_MATERIALS_PBR_SPECULAR_GLOSSINESS)
            .and_then(|value| match serde_json::from_value(value.clone()) {
                Ok(params) => Some(params),
                Err(e) => {
                    log::warn!("Ignoring malformed specular-glossiness parameters: {}", e);
                    None
                }
            })
            .unwrap_or_default();

        let mut pending = Vec::new();

        material.color = [1.0, 1.0, 1.0];
        material.opacity = 1.0;
        if let Some([r, g, b, a]) = params.diffuse_factor {
            material.color = [r, g, b];
            material.opacity = a;
        }
        if let Some(texture) = &params.diffuse_texture {
            pending.push(TextureAssignment::new(TextureSlot::Map, texture.index));
        }

        material.emissive = [0.0, 0.0, 0.0];
        material.glossiness = params.glossiness_factor.unwrap_or(1.0);
        material.specular = params.specular_factor.unwrap_or([1.0, 1.0, 1.0]);

        if let Some(texture) = &params.specular_glossiness_texture {
            pending.push(TextureAssignment::new(TextureSlot::GlossinessMap, texture.index));
            pending.push(TextureAssignment::new(TextureSlot::SpecularMap, texture.index));
        }

        pending
    }

    fn create_material(&self, mut material: Material) -> Material {
        material.material_type = MaterialType::SpecularGlossiness;
        material.defines.insert("STANDARD".into(), String::new());
        material.emissive_intensity = 1.0;
        material.ao_map_intensity = 1.0;
        material.env_map_intensity = 1.0;
        material.refraction_ratio = 0.98;
        material
    }

    fn clone_material(&self, material: &Material) -> Material {
        let mut target = material.clone_material();
        target.material_type = MaterialType::SpecularGlossiness;
        target.color = material.color;
        target.map = material.map.clone();
        target.ao_map = material.ao_map.clone();
        target.ao_map_intensity = material.ao_map_intensity;
        target.emissive = material.emissive;
        target.emissive_intensity = material.emissive_intensity;
        target.emissive_map = material.emissive_map.clone();
        target.normal_map = material.normal_map.clone();
        target.specular_map = material.specular_map.clone();
        target.specular = material.specular;
        target.glossiness_map = material.glossiness_map.clone();
        target.glossiness = material.glossiness;
        target.env_map_intensity = material.env_map_intensity;
        target.refraction_ratio = material.refraction_ratio;
        target
    }
}

/// Copies material state into the per-draw uniform block.
pub fn refresh_uniforms(material: &Material, uniforms: &mut ShaderUniforms) {
    if !material.is_specular_glossiness() {
        return;
    }

    uniforms.opacity = material.opacity;
    uniforms.diffuse = material.color;
    uniforms.emissive = material.emissive.map(|c| c * material.emissive_intensity);

    uniforms.map = material.map.clone();
    uniforms.specular_map = material.specular_map.clone();
    uniforms.ao_map = material.ao_map.clone();
    uniforms.ao_map_intensity = material.ao_map_intensity;

    // UV transform source by priority.
    uniforms.uv_transform_source = [
        TextureSlot::Map,
        TextureSlot::SpecularMap,
        TextureSlot::NormalMap,
        TextureSlot::GlossinessMap,
        TextureSlot::EmissiveMap,
    ]
    .into_iter()
    .find(|&slot| material.texture(slot).is_some());

    uniforms.env_map_intensity = material.env_map_intensity;
    uniforms.refraction_ratio = material.refraction_ratio;

    uniforms.specular = material.specular;
    uniforms.glossiness = material.glossiness;
    uniforms.glossiness_map = material.glossiness_map.clone();

    uniforms.emissive_map = material.emissive_map.clone();
    uniforms.normal_map = material.normal_map.clone();

    let has_define = uniforms.defines.contains_key(USE_GLOSSINESSMAP);
    if uniforms.glossiness_map.is_some() && !has_define {
        uniforms.defines.insert(USE_GLOSSINESSMAP.into(), String::new());
        // enables the uv varying
        uniforms.defines.insert(USE_ROUGHNESSMAP.into(), String::new());
    } else if uniforms.glossiness_map.is_none() && has_define {
        uniforms.defines.remove(USE_GLOSSINESSMAP);
        uniforms.defines.remove(USE_ROUGHNESSMAP);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_core::texture::{Texture, TextureFormat, TextureImage};
    use std::rc::Rc;

    fn texture() -> Rc<Texture> {
        Rc::new(Texture::new(Rc::new(TextureImage {
            width: 1,
            height: 1,
            format: TextureFormat::Rgba,
            data: vec![0; 4],
        })))
    }

    fn material_def(json: &str) -> MaterialDef {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_extend_params() {
        let def = material_def(
            r#"{"extensions": {"KHR_materials_pbrSpecularGlossiness": {
                "diffuseFactor": [0.2, 0.4, 0.6, 0.5],
                "specularFactor": [0.1, 0.1, 0.1],
                "specularGlossinessTexture": {"index": 3}
            }}}"#,
        );
        let extension = SpecularGlossinessExtension;
        let mut material = Material::new(extension.material_type());
        let pending = extension.extend_params(&mut material, &def);
        let material = extension.create_material(material);

        assert_eq!(material.color, [0.2, 0.4, 0.6]);
        assert_eq!(material.opacity, 0.5);
        assert_eq!(material.glossiness, 1.0);
        assert_eq!(material.specular, [0.1, 0.1, 0.1]);
        assert!(material.defines.contains_key("STANDARD"));
        assert_eq!(
            pending,
            vec![
                TextureAssignment::new(TextureSlot::GlossinessMap, 3),
                TextureAssignment::new(TextureSlot::SpecularMap, 3),
            ]
        );
    }

    #[test]
    fn test_refresh_toggles_glossiness_defines() {
        let mut material = SpecularGlossinessExtension.create_material(Material::new(MaterialType::SpecularGlossiness));
        material.glossiness_map = Some(texture());
        let mut uniforms = ShaderUniforms::default();

        refresh_uniforms(&material, &mut uniforms);
        assert!(uniforms.defines.contains_key(USE_GLOSSINESSMAP));
        assert!(uniforms.defines.contains_key(USE_ROUGHNESSMAP));
        assert_eq!(uniforms.uv_transform_source, Some(TextureSlot::GlossinessMap));

        material.glossiness_map = None;
        refresh_uniforms(&material, &mut uniforms);
        assert!(!uniforms.defines.contains_key(USE_GLOSSINESSMAP));
        assert_eq!(uniforms.uv_transform_source, None);
    }

    #[test]
    fn test_refresh_ignores_other_materials() {
        let material = Material::gltf_default();
        let mut uniforms = ShaderUniforms::default();
        refresh_uniforms(&material, &mut uniforms);
        assert_eq!(uniforms, ShaderUniforms::default());
    }

    #[test]
    fn test_clone_keeps_parameters() {
        let mut material = Material::new(MaterialType::SpecularGlossiness);
        material.glossiness = 0.3;
        material.specular_map = Some(texture());
        let copy = SpecularGlossinessExtension.clone_material(&material);
        assert_ne!(copy.id, material.id);
        assert_eq!(copy.glossiness, 0.3);
        assert!(copy.specular_map.is_some());
        assert!(copy.is_specular_glossiness());
    }
}
