//! Merging of several geometries into one.
//!
//! Inputs must agree on index presence, attribute names and layouts, and
//! morph target structure. With `use_groups`, the merged geometry carries one
//! draw group per input so each input can keep its own material.

use std::collections::BTreeMap;

use log::error;

use crate::attribute::{Attribute, BufferAttribute};
use crate::component::ComponentArray;
use crate::geometry::Geometry;

/// Merges `geometries`, or returns `None` (after logging why) when they are
/// not compatible.
pub fn merge_geometries<G: AsRef<Geometry>>(geometries: &[G], use_groups: bool) -> Option<Geometry> {
    let first = geometries.first()?.as_ref();
    let is_indexed = first.index.is_some();
    let attribute_names: Vec<&String> = first.attributes.keys().collect();
    let morph_names: Vec<&String> = first.morph_attributes.keys().collect();

    for (i, geometry) in geometries.iter().enumerate() {
        let geometry = geometry.as_ref();
        if is_indexed != geometry.index.is_some() {
            error!(
                "merge_geometries() failed with geometry at index {}: all geometries must have compatible attributes; make sure index attribute exists among all geometries, or in none of them",
                i
            );
            return None;
        }
        if geometry.attributes.keys().collect::<Vec<_>>() != attribute_names {
            error!(
                "merge_geometries() failed with geometry at index {}: all geometries must have compatible attributes",
                i
            );
            return None;
        }
        if geometry.morph_attributes.keys().collect::<Vec<_>>() != morph_names {
            error!(
                "merge_geometries() failed with geometry at index {}: .morph_attributes must be consistent throughout all geometries",
                i
            );
            return None;
        }
    }

    let mut merged = Geometry::new();
    let mut offset = 0;
    if use_groups {
        for (i, geometry) in geometries.iter().enumerate() {
            let count = geometry.as_ref().draw_count();
            merged.add_group(offset, count, i);
            offset += count;
        }
    }

    if is_indexed {
        let mut indices = Vec::new();
        let mut vertex_offset = 0u32;
        for geometry in geometries {
            let geometry = geometry.as_ref();
            if let Some(index) = &geometry.index {
                indices.extend(index.to_u32_vec().into_iter().map(|i| i + vertex_offset));
            }
            vertex_offset += geometry.vertex_count() as u32;
        }
        merged.set_index(BufferAttribute::new(ComponentArray::Uint32(indices), 1, false).into());
    }

    for name in attribute_names {
        let streams: Vec<&Attribute> = geometries
            .iter()
            .filter_map(|g| g.as_ref().attributes.get(name))
            .collect();
        let attribute = merge_attributes(&streams)?;
        merged.set_attribute(name.clone(), attribute);
    }

    let mut morph_attributes = BTreeMap::new();
    for name in morph_names {
        let target_count = first.morph_attributes[name].len();
        let mut targets = Vec::with_capacity(target_count);
        for target in 0..target_count {
            let mut streams = Vec::with_capacity(geometries.len());
            for geometry in geometries {
                match geometry.as_ref().morph_attributes[name].get(target) {
                    Some(attribute) => streams.push(attribute),
                    None => {
                        error!(
                            "merge_geometries() failed: morph target count for \"{}\" differs between geometries",
                            name
                        );
                        return None;
                    }
                }
            }
            targets.push(merge_attributes(&streams)?);
        }
        morph_attributes.insert(name.clone(), targets);
    }
    merged.morph_attributes = morph_attributes;

    let merged_user_data: Vec<serde_json::Value> = geometries
        .iter()
        .map(|g| &g.as_ref().user_data)
        .filter(|data| !data.is_empty())
        .map(|data| serde_json::Value::Object(data.clone()))
        .collect();
    if !merged_user_data.is_empty() {
        merged
            .user_data
            .insert("mergedUserData".to_string(), serde_json::Value::Array(merged_user_data));
    }

    Some(merged)
}

/// Concatenates attribute streams with identical item size and
/// normalization into one packed attribute typed like the first stream.
pub fn merge_attributes(attributes: &[&Attribute]) -> Option<Attribute> {
    let first = attributes.first()?;
    let item_size = first.item_size();
    let normalized = first.normalized();
    let mut array = ComponentArray::zeros(first.component_type(), 0);

    for attribute in attributes {
        if attribute.item_size() != item_size {
            error!("merge_attributes() failed: item_size must be consistent across matching attributes");
            return None;
        }
        if attribute.normalized() != normalized {
            error!("merge_attributes() failed: normalized must be consistent across matching attributes");
            return None;
        }
        array.extend_from(&attribute.to_buffer_attribute().array);
    }

    Some(BufferAttribute::new(array, item_size, normalized).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn triangle(z: f32, indexed: bool) -> Rc<Geometry> {
        let mut geometry = Geometry::new();
        geometry.set_attribute(
            "position",
            BufferAttribute::new(
                ComponentArray::Float32(vec![0.0, 0.0, z, 1.0, 0.0, z, 0.0, 1.0, z]),
                3,
                false,
            )
            .into(),
        );
        if indexed {
            geometry.set_index(BufferAttribute::new(ComponentArray::Uint16(vec![0, 1, 2]), 1, false).into());
        }
        Rc::new(geometry)
    }

    #[test]
    fn test_merge_indexed_with_groups() {
        let merged = merge_geometries(&[triangle(0.0, true), triangle(1.0, true)], true).unwrap();
        assert_eq!(merged.vertex_count(), 6);
        assert_eq!(
            merged.index.as_ref().unwrap().to_u32_vec(),
            vec![0, 1, 2, 3, 4, 5]
        );
        assert_eq!(merged.groups.len(), 2);
        assert_eq!(merged.groups[1].start, 3);
        assert_eq!(merged.groups[1].material_index, 1);
        assert_eq!(merged.attributes["position"].get_z(4), 1.0);
    }

    #[test]
    fn test_merge_rejects_mixed_indexing() {
        assert!(merge_geometries(&[triangle(0.0, true), triangle(1.0, false)], true).is_none());
    }

    #[test]
    fn test_merge_rejects_attribute_mismatch() {
        let a = triangle(0.0, false);
        let mut b = (*triangle(1.0, false)).clone();
        b.set_attribute(
            "uv",
            BufferAttribute::new(ComponentArray::Float32(vec![0.0; 6]), 2, false).into(),
        );
        assert!(merge_geometries(&[a, Rc::new(b)], true).is_none());
    }
}
