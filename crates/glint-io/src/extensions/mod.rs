//! glTF extension handlers.
//!
//! The [`ExtensionRegistry`] is built once per parse from the document's
//! declared extension names. Each recognized name becomes one [`Extension`]
//! variant; later stages ask the registry for the handler they need.
//!
//! | Extension                             | Stage            |
//! |---------------------------------------|------------------|
//! | `KHR_binary_glTF`                     | buffers          |
//! | `KHR_lights_punctual`                 | nodes            |
//! | `KHR_materials_unlit`                 | materials        |
//! | `KHR_materials_pbrSpecularGlossiness` | materials, meshes|
//! | `KHR_draco_mesh_compression`          | geometry         |
//! | `MSFT_texture_dds`                    | textures         |

use std::collections::BTreeMap;
use std::rc::Rc;

use glint_core::material::{Material, MaterialType, TextureSlot};
use glint_core::status::{GltfError, Result};

use crate::document::{Document, MaterialDef};
use crate::traits::{DracoDecoder, TextureDecoder};

pub mod draco;
pub mod lights;
pub mod specular_glossiness;
pub mod texture_dds;
pub mod unlit;

pub use draco::DracoExtension;
pub use lights::LightsExtension;
pub use specular_glossiness::SpecularGlossinessExtension;
pub use texture_dds::TextureDdsExtension;
pub use unlit::UnlitExtension;

pub const KHR_BINARY_GLTF: &str = "KHR_binary_glTF";
pub const KHR_DRACO_MESH_COMPRESSION: &str = "KHR_draco_mesh_compression";
pub const KHR_LIGHTS_PUNCTUAL: &str = "KHR_lights_punctual";
pub const KHR_MATERIALS_PBR_SPECULAR_GLOSSINESS: &str = "KHR_materials_pbrSpecularGlossiness";
pub const KHR_MATERIALS_UNLIT: &str = "KHR_materials_unlit";
pub const MSFT_TEXTURE_DDS: &str = "MSFT_texture_dds";

/// A texture to fetch and store in a material channel once resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureAssignment {
    pub slot: TextureSlot,
    pub texture: usize,
}

impl TextureAssignment {
    pub fn new(slot: TextureSlot, texture: usize) -> Self {
        Self { slot, texture }
    }
}

/// Hooks a material extension provides to the material loader.
pub trait MaterialExtension {
    /// Shading model of materials carrying the extension.
    fn material_type(&self) -> MaterialType;

    /// Fills extension parameters into `material` and returns the textures
    /// it still needs.
    fn extend_params(&self, material: &mut Material, material_def: &MaterialDef) -> Vec<TextureAssignment>;

    /// Finalizes a material once its textures are assigned.
    fn create_material(&self, material: Material) -> Material {
        material
    }

    /// Copies a material of this extension's type with a fresh identity.
    fn clone_material(&self, material: &Material) -> Material {
        material.clone_material()
    }
}

/// One recognized extension.
pub enum Extension {
    BinaryGltf,
    Lights(LightsExtension),
    MaterialsUnlit(UnlitExtension),
    SpecularGlossiness(SpecularGlossinessExtension),
    DracoMeshCompression(DracoExtension),
    TextureDds(TextureDdsExtension),
}

impl Extension {
    pub fn name(&self) -> &'static str {
        match self {
            Extension::BinaryGltf => KHR_BINARY_GLTF,
            Extension::Lights(_) => KHR_LIGHTS_PUNCTUAL,
            Extension::MaterialsUnlit(_) => KHR_MATERIALS_UNLIT,
            Extension::SpecularGlossiness(_) => KHR_MATERIALS_PBR_SPECULAR_GLOSSINESS,
            Extension::DracoMeshCompression(_) => KHR_DRACO_MESH_COMPRESSION,
            Extension::TextureDds(_) => MSFT_TEXTURE_DDS,
        }
    }
}

/// Host decoders extension handlers may need.
#[derive(Clone, Default)]
pub struct ExtensionCollaborators {
    pub draco_decoder: Option<Rc<dyn DracoDecoder>>,
    pub dds_decoder: Option<Rc<dyn TextureDecoder>>,
}

#[derive(Default)]
pub struct ExtensionRegistry {
    extensions: BTreeMap<&'static str, Extension>,
}

impl ExtensionRegistry {
    /// Instantiates a handler for every recognized extension the document
    /// declares. `KHR_binary_glTF` is registered when the input was a GLB
    /// container.
    pub fn from_document(
        document: &Document,
        is_container: bool,
        collaborators: &ExtensionCollaborators,
    ) -> Result<Self> {
        let mut registry = Self::default();
        if is_container {
            registry.insert(Extension::BinaryGltf);
        }

        for name in document.declared_extensions() {
            let extension = match name {
                KHR_BINARY_GLTF => Extension::BinaryGltf,
                KHR_LIGHTS_PUNCTUAL => Extension::Lights(LightsExtension::from_document(document)?),
                KHR_MATERIALS_UNLIT => Extension::MaterialsUnlit(UnlitExtension),
                KHR_MATERIALS_PBR_SPECULAR_GLOSSINESS => {
                    Extension::SpecularGlossiness(SpecularGlossinessExtension)
                }
                KHR_DRACO_MESH_COMPRESSION => {
                    let decoder = collaborators.draco_decoder.clone().ok_or_else(|| {
                        GltfError::MissingCollaborator("no Draco decoder provided".into())
                    })?;
                    Extension::DracoMeshCompression(DracoExtension::new(decoder))
                }
                MSFT_TEXTURE_DDS => {
                    let decoder = collaborators.dds_decoder.clone().ok_or_else(|| {
                        GltfError::MissingCollaborator("no DDS texture decoder provided".into())
                    })?;
                    Extension::TextureDds(TextureDdsExtension::new(decoder))
                }
                unknown => {
                    if document.is_required(unknown) {
                        log::warn!("Unknown extension \"{}\".", unknown);
                    }
                    continue;
                }
            };
            registry.insert(extension);
        }

        Ok(registry)
    }

    fn insert(&mut self, extension: Extension) {
        self.extensions.insert(extension.name(), extension);
    }

    /// Whether a handler exists for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.extensions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.extensions.keys().copied()
    }

    pub fn lights(&self) -> Option<&LightsExtension> {
        match self.extensions.get(KHR_LIGHTS_PUNCTUAL) {
            Some(Extension::Lights(lights)) => Some(lights),
            _ => None,
        }
    }

    pub fn specular_glossiness(&self) -> Option<&SpecularGlossinessExtension> {
        match self.extensions.get(KHR_MATERIALS_PBR_SPECULAR_GLOSSINESS) {
            Some(Extension::SpecularGlossiness(extension)) => Some(extension),
            _ => None,
        }
    }

    pub fn unlit(&self) -> Option<&UnlitExtension> {
        match self.extensions.get(KHR_MATERIALS_UNLIT) {
            Some(Extension::MaterialsUnlit(extension)) => Some(extension),
            _ => None,
        }
    }

    pub fn draco(&self) -> Option<&DracoExtension> {
        match self.extensions.get(KHR_DRACO_MESH_COMPRESSION) {
            Some(Extension::DracoMeshCompression(extension)) => Some(extension),
            _ => None,
        }
    }

    pub fn texture_dds(&self) -> Option<&TextureDdsExtension> {
        match self.extensions.get(MSFT_TEXTURE_DDS) {
            Some(Extension::TextureDds(extension)) => Some(extension),
            _ => None,
        }
    }

    /// The material extension handling `material_def`, if any.
    /// Specular-glossiness takes precedence over unlit.
    pub fn material_extension(&self, material_def: &MaterialDef) -> Option<&dyn MaterialExtension> {
        let declared = |name: &str| material_def.extensions.contains_key(name);
        if declared(KHR_MATERIALS_PBR_SPECULAR_GLOSSINESS) {
            if let Some(extension) = self.specular_glossiness() {
                return Some(extension);
            }
        }
        if declared(KHR_MATERIALS_UNLIT) {
            if let Some(extension) = self.unlit() {
                return Some(extension);
            }
        }
        None
    }
}
