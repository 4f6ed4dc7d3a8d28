//! Primitive geometries, morph targets and per-mesh geometry sets.

use std::collections::BTreeMap;
use std::rc::Rc;

use futures::future::try_join_all;
use glint_core::attribute::{Attribute, BufferAttribute};
use glint_core::component::ComponentArray;
use glint_core::constants::runtime_attribute_name;
use glint_core::geometry::Geometry;
use glint_core::merge::merge_geometries;
use glint_core::status::{resolve, GltfError, Result};

use super::{assign_extras, GltfParser};
use crate::document::PrimitiveDef;
use crate::extensions::DracoExtension;

/// Identity of a primitive's vertex data. Primitives with equal keys share
/// one geometry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrimitiveKey {
    compressed_view: Option<usize>,
    indices: Option<usize>,
    attributes: BTreeMap<String, usize>,
    targets: Vec<BTreeMap<String, usize>>,
}

impl PrimitiveKey {
    pub fn of(primitive: &PrimitiveDef) -> Self {
        let compressed_view = DracoExtension::primitive_info(primitive)
            .ok()
            .flatten()
            .map(|info| info.buffer_view);
        Self {
            compressed_view,
            indices: primitive.indices,
            attributes: primitive.attributes.clone(),
            targets: primitive.targets.clone(),
        }
    }
}

fn attribute_name(semantic: &str) -> String {
    runtime_attribute_name(semantic)
        .map(String::from)
        .unwrap_or_else(|| semantic.to_lowercase())
}

/// Whether the primitives can be drawn as one indexed geometry with one
/// draw group per primitive.
pub fn is_multipass(primitives: &[PrimitiveDef]) -> bool {
    let Some((first, rest)) = primitives.split_first() else {
        return false;
    };
    if rest.is_empty() || first.indices.is_none() {
        return false;
    }
    rest.iter().all(|primitive| {
        primitive.indices.is_some()
            && primitive.mode() == first.mode()
            && primitive.attributes == first.attributes
            && primitive.targets == first.targets
    })
}

/// `target` added onto `base` component-wise, as a float attribute.
fn absolute_morph(base: &Attribute, target: &Attribute, name: String) -> Attribute {
    let base_values = base.to_f32_vec();
    let offsets = target.to_f32_vec();
    let values: Vec<f32> = base_values
        .iter()
        .enumerate()
        .map(|(i, value)| value + offsets.get(i).copied().unwrap_or_default())
        .collect();
    let mut attribute = BufferAttribute::new(ComponentArray::Float32(values), base.item_size(), false);
    attribute.name = name;
    attribute.into()
}

impl GltfParser {
    /// The geometry of one primitive, shared with every primitive that has
    /// the same [`PrimitiveKey`].
    pub(super) async fn primitive_geometry(self: &Rc<Self>, mesh: usize, primitive: usize) -> Result<Rc<Geometry>> {
        let mesh_def = resolve(&self.document.meshes, mesh, "mesh")?;
        let primitive_def = resolve(&mesh_def.primitives, primitive, "primitive")?;
        let parser = self.clone();
        self.primitives
            .get_or_start(PrimitiveKey::of(primitive_def), move || {
                parser.load_primitive(mesh, primitive)
            })
            .await
    }

    async fn load_primitive(self: Rc<Self>, mesh: usize, primitive: usize) -> Result<Rc<Geometry>> {
        let mesh_def = resolve(&self.document.meshes, mesh, "mesh")?;
        let primitive_def = resolve(&mesh_def.primitives, primitive, "primitive")?;

        let mut geometry = match self.decode_compressed(primitive_def).await? {
            Some(geometry) => geometry,
            None => Geometry::new(),
        };

        self.add_primitive_attributes(&mut geometry, primitive_def).await?;
        if !primitive_def.targets.is_empty() {
            self.add_morph_targets(&mut geometry, mesh, primitive_def).await?;
        }
        assign_extras(&mut geometry.user_data, primitive_def.extras.as_ref());

        Ok(Rc::new(geometry))
    }

    async fn decode_compressed(self: &Rc<Self>, primitive_def: &PrimitiveDef) -> Result<Option<Geometry>> {
        let Some(info) = DracoExtension::primitive_info(primitive_def)? else {
            return Ok(None);
        };
        let Some(draco) = self.extensions.draco() else {
            log::warn!("Primitive uses undeclared KHR_draco_mesh_compression, reading it uncompressed");
            return Ok(None);
        };
        let plan = DracoExtension::attribute_plan(&self.document, primitive_def, &info)?;
        let bytes = self.buffer_view_bytes(info.buffer_view).await?;
        draco.decode_primitive(&bytes, &plan).await.map(Some)
    }

    async fn add_primitive_attributes(self: &Rc<Self>, geometry: &mut Geometry, primitive_def: &PrimitiveDef) -> Result<()> {
        let wanted: Vec<(String, usize)> = primitive_def
            .attributes
            .iter()
            .map(|(semantic, &accessor)| (attribute_name(semantic), accessor))
            .filter(|(name, _)| !geometry.has_attribute(name))
            .collect();

        let loaded = try_join_all(wanted.iter().map(|(_, accessor)| self.accessor(*accessor))).await?;
        for ((name, _), attribute) in wanted.into_iter().zip(loaded) {
            if let Some(attribute) = attribute {
                geometry.set_attribute(name, attribute);
            }
        }

        if let (Some(indices), None) = (primitive_def.indices, &geometry.index) {
            if let Some(index) = self.accessor(indices).await? {
                geometry.set_index(index);
            }
        }
        Ok(())
    }

    /// Adds `POSITION` and `NORMAL` morph targets as absolute attributes. A
    /// target without a channel repeats the base attribute.
    async fn add_morph_targets(
        self: &Rc<Self>,
        geometry: &mut Geometry,
        mesh: usize,
        primitive_def: &PrimitiveDef,
    ) -> Result<()> {
        for (semantic, name) in [("POSITION", "position"), ("NORMAL", "normal")] {
            if !primitive_def.targets.iter().any(|target| target.contains_key(semantic)) {
                continue;
            }

            let targets = try_join_all(primitive_def.targets.iter().map(|target| async move {
                match target.get(semantic) {
                    Some(&accessor) => self.accessor(accessor).await,
                    None => Ok(None),
                }
            }))
            .await?;

            let base = geometry
                .attribute(name)
                .cloned()
                .ok_or_else(|| GltfError::invalid_definition("mesh", mesh, format!("morph target without base {} attribute", name)))?;

            let morphs = targets
                .iter()
                .enumerate()
                .map(|(i, target)| match target {
                    Some(target) => absolute_morph(&base, target, format!("morphTarget{}", i)),
                    None => base.clone(),
                })
                .collect();
            geometry.morph_attributes.insert(name.to_string(), morphs);
        }
        Ok(())
    }

    /// The geometries of mesh `mesh`: one per primitive, or a single grouped
    /// geometry when the primitives are multipass or merged.
    pub(super) async fn load_geometries(self: &Rc<Self>, mesh: usize) -> Result<Vec<Rc<Geometry>>> {
        let primitives = &resolve(&self.document.meshes, mesh, "mesh")?.primitives;

        if is_multipass(primitives) {
            return Ok(vec![self.multipass_geometry(mesh, primitives).await?]);
        }

        let geometries = try_join_all((0..primitives.len()).map(|i| self.primitive_geometry(mesh, i))).await?;

        let same_mode = primitives.windows(2).all(|pair| pair[0].mode() == pair[1].mode());
        if self.options.merge_geometries && geometries.len() > 1 && same_mode {
            if let Some(merged) = self.combined_geometry(&geometries) {
                return Ok(vec![merged]);
            }
        }

        Ok(geometries)
    }

    async fn multipass_geometry(self: &Rc<Self>, mesh: usize, primitives: &[PrimitiveDef]) -> Result<Rc<Geometry>> {
        let base = self.primitive_geometry(mesh, 0).await?;
        let key = (base.id, primitives.iter().map(PrimitiveKey::of).collect::<Vec<_>>());
        if let Some(cached) = self.multipass_geometries.borrow().get(&key) {
            return Ok(cached.clone());
        }

        let index_accessors = try_join_all(
            primitives
                .iter()
                .map(|primitive| self.accessor(primitive.indices.unwrap_or_default())),
        )
        .await?;

        let mut geometry = base.derive();
        geometry.groups.clear();
        let mut indices: Vec<u32> = Vec::new();
        for (i, accessor) in index_accessors.iter().enumerate() {
            let values = accessor.as_ref().map(Attribute::to_u32_vec).unwrap_or_default();
            geometry.add_group(indices.len(), values.len(), i);
            indices.extend(values);
        }

        let array = if indices.iter().any(|&index| index > u16::MAX as u32) {
            ComponentArray::Uint32(indices)
        } else {
            ComponentArray::Uint16(indices.into_iter().map(|index| index as u16).collect())
        };
        geometry.set_index(BufferAttribute::new(array, 1, false).into());

        let geometry = Rc::new(geometry);
        self.multipass_geometries.borrow_mut().insert(key, geometry.clone());
        Ok(geometry)
    }

    fn combined_geometry(&self, geometries: &[Rc<Geometry>]) -> Option<Rc<Geometry>> {
        let key: Vec<_> = geometries.iter().map(|geometry| geometry.id).collect();
        if let Some(cached) = self.combined_geometries.borrow().get(&key) {
            return cached.clone();
        }
        let merged = merge_geometries(geometries, true).map(Rc::new);
        if merged.is_none() {
            log::warn!("Mesh primitives could not be merged, keeping one geometry per primitive");
        }
        self.combined_geometries.borrow_mut().insert(key, merged.clone());
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primitives(json: &str) -> Vec<PrimitiveDef> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_multipass_detection() {
        let shared = primitives(
            r#"[
                {"attributes": {"POSITION": 0}, "indices": 1, "material": 0},
                {"attributes": {"POSITION": 0}, "indices": 2, "material": 1}
            ]"#,
        );
        assert!(is_multipass(&shared));

        let unindexed = primitives(r#"[{"attributes": {"POSITION": 0}}, {"attributes": {"POSITION": 0}}]"#);
        assert!(!is_multipass(&unindexed));

        let mixed_modes = primitives(
            r#"[
                {"attributes": {"POSITION": 0}, "indices": 1},
                {"attributes": {"POSITION": 0}, "indices": 2, "mode": 1}
            ]"#,
        );
        assert!(!is_multipass(&mixed_modes));
        assert!(!is_multipass(&shared[..1]));
    }

    #[test]
    fn test_primitive_key_ignores_material() {
        let defs = primitives(
            r#"[
                {"attributes": {"POSITION": 0}, "indices": 1, "material": 0},
                {"attributes": {"POSITION": 0}, "indices": 1, "material": 3},
                {"attributes": {"POSITION": 0}, "indices": 2}
            ]"#,
        );
        assert_eq!(PrimitiveKey::of(&defs[0]), PrimitiveKey::of(&defs[1]));
        assert_ne!(PrimitiveKey::of(&defs[0]), PrimitiveKey::of(&defs[2]));
    }

    #[test]
    fn test_absolute_morph() {
        let base: Attribute = BufferAttribute::new(ComponentArray::Float32(vec![1.0, 2.0, 3.0]), 3, false).into();
        let offset: Attribute = BufferAttribute::new(ComponentArray::Float32(vec![0.5, 0.0, -1.0]), 3, false).into();
        let morph = absolute_morph(&base, &offset, "morphTarget0".into());
        assert_eq!(morph.to_f32_vec(), vec![1.5, 2.0, 2.0]);
        assert_eq!(attribute_name("TEXCOORD_1"), "uv2");
        assert_eq!(attribute_name("_BATCHID"), "_batchid");
    }
}
