//! Materials: metallic-roughness parameters, extension hooks and texture
//! channels.

use std::rc::Rc;

use futures::future::try_join_all;
use glint_core::material::{Material, MaterialType, Side, TextureSlot};
use glint_core::status::{resolve, Result};
use glint_core::texture::Encoding;

use super::{add_unknown_extensions, assign_extras, DependencyType, GltfParser};
use crate::extensions::TextureAssignment;

/// Channels holding color data, stored in sRGB.
const SRGB_SLOTS: [TextureSlot; 3] = [TextureSlot::Map, TextureSlot::EmissiveMap, TextureSlot::SpecularMap];

impl GltfParser {
    pub(super) async fn load_material(self: Rc<Self>, index: usize) -> Result<Rc<Material>> {
        let material_def = resolve(&self.document.materials, index, "material")?;
        let extension = self.extensions.material_extension(material_def);

        let material_type = extension.map_or(MaterialType::Standard, |extension| extension.material_type());
        let mut material = Material::new(material_type);
        let mut pending: Vec<TextureAssignment> = Vec::new();

        match extension {
            Some(extension) => pending.extend(extension.extend_params(&mut material, material_def)),
            None => {
                let pbr = material_def.pbr_metallic_roughness.clone().unwrap_or_default();
                if let Some([r, g, b, a]) = pbr.base_color_factor {
                    material.color = [r, g, b];
                    material.opacity = a;
                }
                material.metalness = pbr.metallic_factor.unwrap_or(1.0);
                material.roughness = pbr.roughness_factor.unwrap_or(1.0);
                if let Some(texture) = &pbr.base_color_texture {
                    pending.push(TextureAssignment::new(TextureSlot::Map, texture.index));
                }
                if let Some(texture) = &pbr.metallic_roughness_texture {
                    pending.push(TextureAssignment::new(TextureSlot::MetalnessMap, texture.index));
                    pending.push(TextureAssignment::new(TextureSlot::RoughnessMap, texture.index));
                }
            }
        }

        if material_def.double_sided {
            material.side = Side::Double;
        }

        match material_def.alpha_mode.as_deref() {
            Some("BLEND") => material.transparent = true,
            Some("MASK") => material.alpha_test = material_def.alpha_cutoff.unwrap_or(0.5),
            _ => {}
        }

        if material_type != MaterialType::Basic {
            if let Some(normal) = &material_def.normal_texture {
                pending.push(TextureAssignment::new(TextureSlot::NormalMap, normal.index));
                let scale = normal.scale.unwrap_or(1.0);
                material.normal_scale = Some([scale, scale]);
            }
            if let Some(occlusion) = &material_def.occlusion_texture {
                pending.push(TextureAssignment::new(TextureSlot::AoMap, occlusion.index));
                if let Some(strength) = occlusion.strength {
                    material.ao_map_intensity = strength;
                }
            }
            if let Some(emissive) = material_def.emissive_factor {
                material.emissive = emissive;
            }
            if let Some(texture) = &material_def.emissive_texture {
                pending.push(TextureAssignment::new(TextureSlot::EmissiveMap, texture.index));
            }
        }

        let textures = try_join_all(pending.iter().map(|assignment| {
            let load = self.get_dependency(DependencyType::Texture, assignment.texture);
            async move { load.await?.texture() }
        }))
        .await?;
        for (assignment, texture) in pending.iter().zip(textures) {
            material.set_texture(assignment.slot, texture);
        }

        let mut material = match extension {
            Some(extension) => extension.create_material(material),
            None => material,
        };

        if let Some(name) = &material_def.name {
            material.name = name.clone();
        }

        if material.material_type == MaterialType::Standard && material.normal_scale.is_none() {
            material.normal_scale = Some([1.0, 1.0]);
        }
        // Normal maps follow the OpenGL tangent-space convention.
        if let Some(scale) = material.normal_scale.as_mut() {
            scale[1] = -scale[1];
        }

        for slot in SRGB_SLOTS {
            if let Some(texture) = material.texture(slot) {
                let encoded = Rc::new(texture.with_encoding(Encoding::Srgb));
                material.set_texture(slot, encoded);
            }
        }

        assign_extras(&mut material.user_data, material_def.extras.as_ref());
        add_unknown_extensions(&self.extensions, &mut material.user_data, &material_def.extensions);

        Ok(Rc::new(material))
    }

    /// The shared material for primitives without one.
    pub(super) fn default_material(&self) -> Rc<Material> {
        self.default_material
            .get_or_init(|| Rc::new(Material::gltf_default()))
            .clone()
    }
}
