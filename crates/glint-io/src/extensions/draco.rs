//! `KHR_draco_mesh_compression`: primitives whose vertex data lives in a
//! compressed bufferView.

use std::collections::BTreeMap;
use std::rc::Rc;

use glint_core::attribute::{Attribute, BufferAttribute};
use glint_core::component::ComponentType;
use glint_core::constants::runtime_attribute_name;
use glint_core::geometry::Geometry;
use glint_core::status::{resolve, GltfError, Result};
use serde::Deserialize;

use super::KHR_DRACO_MESH_COMPRESSION;
use crate::document::{Document, PrimitiveDef};
use crate::traits::DracoDecoder;

/// The extension payload of one primitive.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DracoPrimitive {
    pub buffer_view: usize,
    /// glTF semantic to Draco attribute id.
    #[serde(default)]
    pub attributes: BTreeMap<String, u32>,
}

/// What the decoder is asked for and how its output is post-processed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DracoAttributePlan {
    pub attribute_map: BTreeMap<String, u32>,
    pub attribute_types: BTreeMap<String, ComponentType>,
    pub normalized: BTreeMap<String, bool>,
}

fn runtime_name(semantic: &str) -> String {
    runtime_attribute_name(semantic)
        .map(String::from)
        .unwrap_or_else(|| semantic.to_lowercase())
}

pub struct DracoExtension {
    decoder: Rc<dyn DracoDecoder>,
}

impl DracoExtension {
    pub fn new(decoder: Rc<dyn DracoDecoder>) -> Self {
        Self { decoder }
    }

    /// Reads the compression payload of `primitive`, if it has one.
    pub fn primitive_info(primitive: &PrimitiveDef) -> Result<Option<DracoPrimitive>> {
        match primitive.extensions.get(KHR_DRACO_MESH_COMPRESSION) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// Maps Draco attribute ids to runtime names and collects the declared
    /// component type and normalized flag of every primitive attribute that
    /// is also compressed.
    pub fn attribute_plan(
        document: &Document,
        primitive: &PrimitiveDef,
        info: &DracoPrimitive,
    ) -> Result<DracoAttributePlan> {
        let mut plan = DracoAttributePlan::default();

        for (semantic, &id) in &info.attributes {
            plan.attribute_map.insert(runtime_name(semantic), id);
        }

        for (semantic, &accessor_index) in &primitive.attributes {
            if !info.attributes.contains_key(semantic) {
                continue;
            }
            let name = runtime_name(semantic);
            let accessor = resolve(&document.accessors, accessor_index, "accessor")?;
            plan.attribute_types
                .insert(name.clone(), ComponentType::from_gl(accessor.component_type)?);
            plan.normalized.insert(name, accessor.normalized);
        }

        Ok(plan)
    }

    /// Decodes compressed bytes and applies the document's normalized flags.
    pub async fn decode_primitive(&self, data: &[u8], plan: &DracoAttributePlan) -> Result<Geometry> {
        let mut geometry = self
            .decoder
            .decode(data, &plan.attribute_map, &plan.attribute_types)
            .await
            .map_err(|e| GltfError::DracoDecode(e.to_string()))?;

        for (name, attribute) in geometry.attributes.iter_mut() {
            let Some(&normalized) = plan.normalized.get(name) else {
                continue;
            };
            if attribute.normalized() == normalized {
                continue;
            }
            let updated = match &*attribute {
                Attribute::Buffer(buffer) => Attribute::Buffer(Rc::new(BufferAttribute {
                    normalized,
                    ..(**buffer).clone()
                })),
                Attribute::Interleaved(interleaved) => {
                    let mut interleaved = interleaved.clone();
                    interleaved.normalized = normalized;
                    Attribute::Interleaved(interleaved)
                }
            };
            *attribute = updated;
        }

        Ok(geometry)
    }
}
