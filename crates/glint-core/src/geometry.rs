//! Indexed or non-indexed attribute geometry with morph targets and draw
//! groups.

use std::collections::BTreeMap;

use crate::attribute::Attribute;
use crate::ids::GeometryId;
use crate::UserData;

/// A draw range within a geometry rendered with material `material_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawGroup {
    pub start: usize,
    pub count: usize,
    pub material_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub id: GeometryId,
    pub name: String,
    /// Attributes keyed by runtime name (`position`, `normal`, `uv`, ...).
    pub attributes: BTreeMap<String, Attribute>,
    pub index: Option<Attribute>,
    /// Absolute morph target attributes keyed by base attribute name.
    pub morph_attributes: BTreeMap<String, Vec<Attribute>>,
    pub groups: Vec<DrawGroup>,
    pub user_data: UserData,
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new()
    }
}

impl Geometry {
    pub fn new() -> Self {
        Self {
            id: GeometryId::next(),
            name: String::new(),
            attributes: BTreeMap::new(),
            index: None,
            morph_attributes: BTreeMap::new(),
            groups: Vec::new(),
            user_data: UserData::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, attribute: Attribute) {
        self.attributes.insert(name.into(), attribute);
    }

    pub fn set_index(&mut self, index: Attribute) {
        self.index = Some(index);
    }

    pub fn add_group(&mut self, start: usize, count: usize, material_index: usize) {
        self.groups.push(DrawGroup {
            start,
            count,
            material_index,
        });
    }

    pub fn has_morph_targets(&self) -> bool {
        !self.morph_attributes.is_empty()
    }

    /// Number of vertices, taken from the position stream when present.
    pub fn vertex_count(&self) -> usize {
        self.attributes
            .get("position")
            .or_else(|| self.attributes.values().next())
            .map(Attribute::count)
            .unwrap_or(0)
    }

    /// Number of elements drawn: index count for indexed geometry, vertex
    /// count otherwise.
    pub fn draw_count(&self) -> usize {
        match &self.index {
            Some(index) => index.count(),
            None => self.vertex_count(),
        }
    }

    /// A copy sharing all attribute storage but carrying a fresh identity.
    pub fn derive(&self) -> Self {
        Self {
            id: GeometryId::next(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::BufferAttribute;
    use crate::component::ComponentArray;

    #[test]
    fn test_counts() {
        let mut geometry = Geometry::new();
        assert_eq!(geometry.vertex_count(), 0);
        geometry.set_attribute(
            "position",
            BufferAttribute::new(ComponentArray::Float32(vec![0.0; 9]), 3, false).into(),
        );
        assert_eq!(geometry.vertex_count(), 3);
        assert_eq!(geometry.draw_count(), 3);
        geometry.set_index(BufferAttribute::new(ComponentArray::Uint16(vec![0, 1, 2, 2, 1, 0]), 1, false).into());
        assert_eq!(geometry.draw_count(), 6);
    }

    #[test]
    fn test_derive_shares_storage() {
        let mut geometry = Geometry::new();
        geometry.set_attribute(
            "uv",
            BufferAttribute::new(ComponentArray::Float32(vec![0.0; 4]), 2, false).into(),
        );
        let derived = geometry.derive();
        assert_ne!(derived.id, geometry.id);
        assert!(derived.attributes["uv"].ptr_eq(&geometry.attributes["uv"]));
    }
}
