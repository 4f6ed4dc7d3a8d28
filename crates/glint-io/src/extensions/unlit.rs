//! `KHR_materials_unlit`: constant-color materials.

use glint_core::material::{Material, MaterialType, TextureSlot};

use super::{MaterialExtension, TextureAssignment};
use crate::document::MaterialDef;

#[derive(Debug, Clone, Copy, Default)]
pub struct UnlitExtension;

impl MaterialExtension for UnlitExtension {
    fn material_type(&self) -> MaterialType {
        MaterialType::Basic
    }

    fn extend_params(&self, material: &mut Material, material_def: &MaterialDef) -> Vec<TextureAssignment> {
        let mut pending = Vec::new();
        material.color = [1.0, 1.0, 1.0];
        material.opacity = 1.0;

        if let Some(pbr) = &material_def.pbr_metallic_roughness {
            if let Some([r, g, b, a]) = pbr.base_color_factor {
                material.color = [r, g, b];
                material.opacity = a;
            }
            if let Some(texture) = &pbr.base_color_texture {
                pending.push(TextureAssignment::new(TextureSlot::Map, texture.index));
            }
        }

        pending
    }
}
