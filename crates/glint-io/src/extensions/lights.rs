//! `KHR_lights_punctual`: directional, point and spot lights attached to
//! nodes.

use glint_core::object::{Light, LightKind, Object3D, ObjectKind};
use glint_core::status::{resolve, GltfError, Result};
use serde::Deserialize;

use super::KHR_LIGHTS_PUNCTUAL;
use crate::document::{Document, NodeDef};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LightsDef {
    #[serde(default)]
    lights: Vec<LightDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightDef {
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub light_type: String,
    pub color: Option<[f32; 3]>,
    pub intensity: Option<f32>,
    pub range: Option<f32>,
    pub spot: Option<SpotDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotDef {
    pub inner_cone_angle: Option<f32>,
    pub outer_cone_angle: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct LightsExtension {
    lights: Vec<LightDef>,
}

impl LightsExtension {
    /// Reads the document-level light definitions.
    pub fn from_document(document: &Document) -> Result<Self> {
        let lights = match document.extensions.get(KHR_LIGHTS_PUNCTUAL) {
            Some(value) => serde_json::from_value::<LightsDef>(value.clone())?.lights,
            None => Vec::new(),
        };
        Ok(Self { lights })
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// Light index referenced by a node, if it carries the extension.
    pub fn node_light(node_def: &NodeDef) -> Option<usize> {
        node_def
            .extensions
            .get(KHR_LIGHTS_PUNCTUAL)?
            .get("light")?
            .as_u64()
            .map(|index| index as usize)
    }

    /// Builds the light object for definition `index`.
    pub fn load_light(&self, index: usize) -> Result<Object3D> {
        let light_def = resolve(&self.lights, index, "light")?;
        let color = light_def.color.unwrap_or([1.0, 1.0, 1.0]);

        let mut light = match light_def.light_type.as_str() {
            "directional" => Light::new(LightKind::Directional, color),
            "point" => {
                let mut light = Light::new(LightKind::Point, color);
                light.distance = light_def.range.unwrap_or(0.0);
                light
            }
            "spot" => {
                let mut light = Light::new(LightKind::Spot, color);
                light.distance = light_def.range.unwrap_or(0.0);
                let spot = light_def.spot.clone().unwrap_or_default();
                let inner = spot.inner_cone_angle.unwrap_or(0.0);
                let outer = spot
                    .outer_cone_angle
                    .unwrap_or(std::f32::consts::FRAC_PI_4);
                light.angle = outer;
                light.penumbra = 1.0 - inner / outer;
                light
            }
            other => return Err(GltfError::UnsupportedLightType(other.to_string())),
        };

        light.decay = 2.0;
        if let Some(intensity) = light_def.intensity {
            light.intensity = intensity;
        }

        let name = light_def
            .name
            .clone()
            .unwrap_or_else(|| format!("light_{}", index));
        Ok(Object3D::new(ObjectKind::Light(light)).with_name(name))
    }
}
