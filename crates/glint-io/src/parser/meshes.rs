//! Mesh objects: draw kinds, material variants and morph state.

use std::rc::Rc;

use futures::future::{try_join, try_join_all};
use glint_core::constants::DrawMode;
use glint_core::geometry::Geometry;
use glint_core::material::{Material, MaterialType};
use glint_core::object::{Mesh, MeshKind, MeshMaterial, Object3D, ObjectKind};
use glint_core::status::{resolve, GltfError, Result};
use serde_json::Value;

use super::{assign_extras, DependencyType, GltfParser};
use crate::document::MeshDef;
use crate::extensions::MaterialExtension;

/// Shader features a mesh needs from its material. Materials are shared, so
/// a mesh needing any of these gets its own cached variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MaterialFlags {
    pub skinning: bool,
    pub vertex_colors: bool,
    pub flat_shading: bool,
    pub morph_targets: bool,
    pub morph_normals: bool,
}

impl MaterialFlags {
    pub fn of(kind: MeshKind, geometry: &Geometry) -> Self {
        let morph_targets = geometry.has_morph_targets();
        Self {
            skinning: kind == MeshKind::SkinnedMesh,
            vertex_colors: geometry.has_attribute("color"),
            flat_shading: !geometry.has_attribute("normal"),
            morph_targets,
            morph_normals: morph_targets && geometry.morph_attributes.contains_key("normal"),
        }
    }

    pub fn any(&self) -> bool {
        self.skinning || self.vertex_colors || self.flat_shading || self.morph_targets || self.morph_normals
    }

    fn apply(&self, material: &mut Material) {
        material.skinning = self.skinning;
        material.vertex_colors = self.vertex_colors;
        material.flat_shading = self.flat_shading;
        material.morph_targets = self.morph_targets;
        material.morph_normals = self.morph_normals;
    }
}

fn mesh_kind(mode: u32, skinned: bool) -> Result<(MeshKind, DrawMode)> {
    let draw_mode = DrawMode::from_gl(mode).ok_or(GltfError::UnsupportedPrimitiveMode(mode))?;
    let kind = match draw_mode {
        DrawMode::Triangles | DrawMode::TriangleStrip | DrawMode::TriangleFan if skinned => MeshKind::SkinnedMesh,
        DrawMode::Triangles | DrawMode::TriangleStrip | DrawMode::TriangleFan => MeshKind::Mesh,
        DrawMode::Lines => MeshKind::LineSegments,
        DrawMode::LineStrip => MeshKind::Line,
        DrawMode::LineLoop => MeshKind::LineLoop,
        DrawMode::Points => MeshKind::Points,
    };
    Ok((kind, draw_mode))
}

/// Applies default weights and `extras.targetNames` to a mesh with morph
/// targets.
fn apply_morph_defaults(mesh: &mut Mesh, mesh_def: &MeshDef) {
    mesh.update_morph_targets();

    if let Some(weights) = &mesh_def.weights {
        for (influence, weight) in mesh.morph_target_influences.iter_mut().zip(weights) {
            *influence = *weight;
        }
    }

    let Some(Value::Array(names)) = mesh_def.extras.as_ref().and_then(|extras| extras.get("targetNames")) else {
        return;
    };
    if names.len() != mesh.morph_target_influences.len() {
        log::warn!("Invalid extras.targetNames length. Ignoring names.");
        return;
    }
    mesh.morph_target_dictionary.clear();
    for (i, name) in names.iter().enumerate() {
        let name = match name {
            Value::String(name) => name.clone(),
            other => other.to_string(),
        };
        mesh.morph_target_dictionary.insert(name, i);
    }
}

impl GltfParser {
    pub(super) async fn load_mesh(self: Rc<Self>, index: usize) -> Result<Rc<Object3D>> {
        let mesh_def = resolve(&self.document.meshes, index, "mesh")?;
        let primitives = &mesh_def.primitives;

        let materials = try_join_all(primitives.iter().map(|primitive| {
            let load = primitive
                .material
                .map(|material| self.get_dependency(DependencyType::Material, material));
            let parser = self.clone();
            async move {
                match load {
                    Some(load) => load.await?.material(),
                    None => Ok(parser.default_material()),
                }
            }
        }));
        let (materials, geometries) = try_join(materials, self.load_geometries(index)).await?;

        let multi_material = geometries.len() == 1 && !geometries[0].groups.is_empty();
        let skinned = self.marks.is_skinned_mesh(index);
        let base_name = mesh_def.name.clone().unwrap_or_else(|| format!("mesh_{}", index));

        let mut objects = Vec::with_capacity(geometries.len());
        for (i, geometry) in geometries.iter().enumerate() {
            let primitive = resolve(primitives, i, "primitive")?;
            let (kind, draw_mode) = mesh_kind(primitive.mode(), skinned)?;

            let mesh_materials = if multi_material {
                materials.clone()
            } else {
                vec![resolve(&materials, i, "material")?.clone()]
            };

            let flags = MaterialFlags::of(kind, geometry);
            let mesh_materials: Vec<Rc<Material>> = mesh_materials
                .iter()
                .map(|material| self.material_variant(material, kind, flags))
                .collect();

            let needs_uv2 = mesh_materials.iter().any(|material| material.ao_map.is_some());
            let geometry = if needs_uv2 {
                self.with_uv2(geometry)
            } else {
                geometry.clone()
            };

            let refresh = mesh_materials
                .iter()
                .any(|material| material.is_specular_glossiness())
                .then(|| self.extensions.specular_glossiness().map(|extension| extension.refresh_callback()))
                .flatten();

            let material = if multi_material {
                MeshMaterial::Multi(mesh_materials)
            } else {
                match mesh_materials.into_iter().next() {
                    Some(material) => MeshMaterial::Single(material),
                    None => MeshMaterial::Single(self.default_material()),
                }
            };

            let mut mesh = Mesh::new(kind, draw_mode, geometry, material);
            mesh.on_before_render = refresh;
            if mesh.geometry.has_morph_targets() {
                apply_morph_defaults(&mut mesh, mesh_def);
            }

            let mut name = base_name.clone();
            if geometries.len() > 1 {
                name.push_str(&format!("_{}", i));
            }
            let mut object = Object3D::new(ObjectKind::Mesh(mesh)).with_name(name);
            assign_extras(&mut object.user_data, mesh_def.extras.as_ref());
            objects.push(object);
        }

        if objects.len() == 1 {
            if let Some(object) = objects.pop() {
                return Ok(Rc::new(object));
            }
        }

        let mut group = Object3D::new(ObjectKind::Group);
        for object in objects {
            group.add(object);
        }
        Ok(Rc::new(group))
    }

    /// The material a mesh of `kind` with `flags` draws with: a cached points
    /// or line copy for those kinds, then a cached copy carrying `flags`.
    fn material_variant(&self, material: &Rc<Material>, kind: MeshKind, flags: MaterialFlags) -> Rc<Material> {
        let target_type = match kind {
            MeshKind::Points => Some(MaterialType::Points),
            kind if kind.is_line() => Some(MaterialType::LineBasic),
            _ => None,
        };

        let mut material = material.clone();
        if let Some(target_type) = target_type {
            let key = (material.id, target_type);
            let cached = self.primitive_materials.borrow().get(&key).cloned();
            material = match cached {
                Some(cached) => cached,
                None => {
                    let converted = Rc::new(match target_type {
                        MaterialType::Points => material.to_points_material(),
                        _ => material.to_line_material(),
                    });
                    self.primitive_materials.borrow_mut().insert(key, converted.clone());
                    converted
                }
            };
        }

        if !flags.any() {
            return material;
        }

        let key = (material.id, flags);
        if let Some(cached) = self.material_variants.borrow().get(&key) {
            return cached.clone();
        }
        let mut variant = match self.extensions.specular_glossiness() {
            Some(extension) if material.is_specular_glossiness() => extension.clone_material(&material),
            _ => material.clone_material(),
        };
        flags.apply(&mut variant);
        let variant = Rc::new(variant);
        self.material_variants.borrow_mut().insert(key, variant.clone());
        variant
    }

    /// `geometry` with a `uv2` stream aliasing `uv`, for ambient occlusion
    /// maps. Returned unchanged when it has no `uv` or already has `uv2`.
    fn with_uv2(&self, geometry: &Rc<Geometry>) -> Rc<Geometry> {
        let (Some(uv), false) = (geometry.attribute("uv"), geometry.has_attribute("uv2")) else {
            return geometry.clone();
        };
        if let Some(cached) = self.uv2_geometries.borrow().get(&geometry.id) {
            return cached.clone();
        }
        log::info!("Duplicating uv to uv2 for ambient occlusion map");
        let mut derived = geometry.derive();
        derived.set_attribute("uv2", uv.clone());
        let derived = Rc::new(derived);
        self.uv2_geometries.borrow_mut().insert(geometry.id, derived.clone());
        derived
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_core::attribute::BufferAttribute;
    use glint_core::component::ComponentArray;

    #[test]
    fn test_mesh_kinds() {
        assert_eq!(mesh_kind(4, false).unwrap(), (MeshKind::Mesh, DrawMode::Triangles));
        assert_eq!(mesh_kind(5, true).unwrap(), (MeshKind::SkinnedMesh, DrawMode::TriangleStrip));
        assert_eq!(mesh_kind(1, true).unwrap().0, MeshKind::LineSegments);
        assert_eq!(mesh_kind(3, false).unwrap().0, MeshKind::Line);
        assert_eq!(mesh_kind(2, false).unwrap().0, MeshKind::LineLoop);
        assert_eq!(mesh_kind(0, false).unwrap().0, MeshKind::Points);
        assert_eq!(mesh_kind(9, false).unwrap_err(), GltfError::UnsupportedPrimitiveMode(9));
    }

    #[test]
    fn test_material_flags() {
        let mut geometry = Geometry::new();
        geometry.set_attribute(
            "position",
            BufferAttribute::new(ComponentArray::Float32(vec![0.0; 9]), 3, false).into(),
        );
        let flags = MaterialFlags::of(MeshKind::Mesh, &geometry);
        assert!(flags.flat_shading);
        assert!(!flags.vertex_colors);
        assert!(flags.any());

        geometry.set_attribute(
            "normal",
            BufferAttribute::new(ComponentArray::Float32(vec![0.0; 9]), 3, false).into(),
        );
        assert!(!MaterialFlags::of(MeshKind::Mesh, &geometry).any());
        assert!(MaterialFlags::of(MeshKind::SkinnedMesh, &geometry).skinning);
    }

    #[test]
    fn test_target_names() {
        let mut geometry = Geometry::new();
        let target: glint_core::attribute::Attribute =
            BufferAttribute::new(ComponentArray::Float32(vec![0.0; 3]), 3, false).into();
        geometry.morph_attributes.insert("position".into(), vec![target.clone(), target]);
        let mut mesh = Mesh::new(
            MeshKind::Mesh,
            DrawMode::Triangles,
            Rc::new(geometry),
            MeshMaterial::Single(Rc::new(Material::gltf_default())),
        );

        let mesh_def: MeshDef =
            serde_json::from_str(r#"{"weights": [0.25, 0.5], "extras": {"targetNames": ["smile", "blink"]}}"#).unwrap();
        apply_morph_defaults(&mut mesh, &mesh_def);
        assert_eq!(mesh.morph_target_influences, vec![0.25, 0.5]);
        assert_eq!(mesh.morph_target_dictionary["blink"], 1);

        let short_names: MeshDef = serde_json::from_str(r#"{"extras": {"targetNames": ["only"]}}"#).unwrap();
        apply_morph_defaults(&mut mesh, &short_names);
        assert!(!mesh.morph_target_dictionary.contains_key("only"));
    }
}
