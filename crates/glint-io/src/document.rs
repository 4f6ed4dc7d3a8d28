//! glTF JSON document schema.
//!
//! Deserialized with serde; every top-level array defaults to empty. Unknown
//! fields are ignored. `extras` and `extensions` are kept as raw JSON so
//! extension handlers can read their own payloads and unknown extensions can
//! be carried through to user data.
//!
//! [`Document::from_text`] parses and checks the asset version,
//! [`Document::validate`] checks that every index reference resolves.

use std::collections::BTreeMap;

use glint_core::status::{GltfError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

pub type Extensions = Map<String, Value>;

// ============================================================================
// Root
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub asset: Option<Asset>,
    pub scene: Option<usize>,
    #[serde(default)]
    pub scenes: Vec<SceneDef>,
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
    #[serde(default)]
    pub meshes: Vec<MeshDef>,
    #[serde(default)]
    pub accessors: Vec<AccessorDef>,
    #[serde(default)]
    pub buffer_views: Vec<BufferViewDef>,
    #[serde(default)]
    pub buffers: Vec<BufferDef>,
    #[serde(default)]
    pub materials: Vec<MaterialDef>,
    #[serde(default)]
    pub textures: Vec<TextureDef>,
    #[serde(default)]
    pub images: Vec<ImageDef>,
    #[serde(default)]
    pub samplers: Vec<SamplerDef>,
    #[serde(default)]
    pub skins: Vec<SkinDef>,
    #[serde(default)]
    pub cameras: Vec<CameraDef>,
    #[serde(default)]
    pub animations: Vec<AnimationDef>,
    #[serde(default)]
    pub extensions_used: Vec<String>,
    #[serde(default)]
    pub extensions_required: Vec<String>,
    #[serde(default)]
    pub extensions: Extensions,
    pub extras: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    #[serde(default)]
    pub version: String,
    pub min_version: Option<String>,
    pub generator: Option<String>,
    pub copyright: Option<String>,
    pub extras: Option<Value>,
}

impl Asset {
    /// Major component of `version`, if it parses.
    pub fn major_version(&self) -> Option<u32> {
        self.version.split('.').next()?.trim().parse().ok()
    }
}

// ============================================================================
// Scene graph
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDef {
    pub name: Option<String>,
    #[serde(default)]
    pub nodes: Vec<usize>,
    #[serde(default)]
    pub extensions: Extensions,
    pub extras: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDef {
    pub name: Option<String>,
    #[serde(default)]
    pub children: Vec<usize>,
    /// Column-major local transform; authoritative over TRS when present.
    pub matrix: Option<[f32; 16]>,
    pub translation: Option<[f32; 3]>,
    pub rotation: Option<[f32; 4]>,
    pub scale: Option<[f32; 3]>,
    pub mesh: Option<usize>,
    pub camera: Option<usize>,
    pub skin: Option<usize>,
    pub weights: Option<Vec<f32>>,
    #[serde(default)]
    pub extensions: Extensions,
    pub extras: Option<Value>,
}

// ============================================================================
// Geometry
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshDef {
    pub name: Option<String>,
    #[serde(default)]
    pub primitives: Vec<PrimitiveDef>,
    pub weights: Option<Vec<f32>>,
    pub extras: Option<Value>,
}

/// Default primitive mode (TRIANGLES).
pub const MODE_TRIANGLES: u32 = 4;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimitiveDef {
    #[serde(default)]
    pub attributes: BTreeMap<String, usize>,
    pub indices: Option<usize>,
    pub material: Option<usize>,
    pub mode: Option<u32>,
    #[serde(default)]
    pub targets: Vec<BTreeMap<String, usize>>,
    #[serde(default)]
    pub extensions: Extensions,
    pub extras: Option<Value>,
}

impl PrimitiveDef {
    pub fn mode(&self) -> u32 {
        self.mode.unwrap_or(MODE_TRIANGLES)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessorDef {
    pub name: Option<String>,
    pub buffer_view: Option<usize>,
    #[serde(default)]
    pub byte_offset: usize,
    pub component_type: u32,
    #[serde(default)]
    pub normalized: bool,
    pub count: usize,
    #[serde(rename = "type")]
    pub element_type: String,
    pub sparse: Option<SparseDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseDef {
    pub count: usize,
    pub indices: SparseIndicesDef,
    pub values: SparseValuesDef,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseIndicesDef {
    pub buffer_view: usize,
    #[serde(default)]
    pub byte_offset: usize,
    pub component_type: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseValuesDef {
    pub buffer_view: usize,
    #[serde(default)]
    pub byte_offset: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferViewDef {
    pub buffer: usize,
    #[serde(default)]
    pub byte_offset: usize,
    #[serde(default)]
    pub byte_length: usize,
    pub byte_stride: Option<usize>,
    pub target: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferDef {
    pub uri: Option<String>,
    #[serde(default)]
    pub byte_length: usize,
    /// Legacy buffer type; only `arraybuffer` is accepted.
    #[serde(rename = "type")]
    pub buffer_type: Option<String>,
}

// ============================================================================
// Materials and textures
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialDef {
    pub name: Option<String>,
    pub pbr_metallic_roughness: Option<PbrMetallicRoughnessDef>,
    pub normal_texture: Option<NormalTextureInfo>,
    pub occlusion_texture: Option<OcclusionTextureInfo>,
    pub emissive_texture: Option<TextureInfo>,
    pub emissive_factor: Option<[f32; 3]>,
    pub alpha_mode: Option<String>,
    pub alpha_cutoff: Option<f32>,
    #[serde(default)]
    pub double_sided: bool,
    #[serde(default)]
    pub extensions: Extensions,
    pub extras: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PbrMetallicRoughnessDef {
    pub base_color_factor: Option<[f32; 4]>,
    pub base_color_texture: Option<TextureInfo>,
    pub metallic_factor: Option<f32>,
    pub roughness_factor: Option<f32>,
    pub metallic_roughness_texture: Option<TextureInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureInfo {
    pub index: usize,
    #[serde(default)]
    pub tex_coord: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalTextureInfo {
    pub index: usize,
    #[serde(default)]
    pub tex_coord: usize,
    pub scale: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcclusionTextureInfo {
    pub index: usize,
    #[serde(default)]
    pub tex_coord: usize,
    pub strength: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureDef {
    pub name: Option<String>,
    pub sampler: Option<usize>,
    pub source: Option<usize>,
    #[serde(default)]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDef {
    pub name: Option<String>,
    pub uri: Option<String>,
    pub buffer_view: Option<usize>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplerDef {
    pub mag_filter: Option<u32>,
    pub min_filter: Option<u32>,
    pub wrap_s: Option<u32>,
    pub wrap_t: Option<u32>,
}

// ============================================================================
// Skins, cameras, animations
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkinDef {
    pub name: Option<String>,
    #[serde(default)]
    pub joints: Vec<usize>,
    pub inverse_bind_matrices: Option<usize>,
    pub skeleton: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraDef {
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub camera_type: String,
    pub perspective: Option<PerspectiveDef>,
    pub orthographic: Option<OrthographicDef>,
    pub extras: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerspectiveDef {
    pub yfov: Option<f32>,
    pub aspect_ratio: Option<f32>,
    pub znear: Option<f32>,
    pub zfar: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrthographicDef {
    pub xmag: Option<f32>,
    pub ymag: Option<f32>,
    pub znear: Option<f32>,
    pub zfar: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationDef {
    pub name: Option<String>,
    #[serde(default)]
    pub channels: Vec<ChannelDef>,
    #[serde(default)]
    pub samplers: Vec<AnimationSamplerDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelDef {
    pub sampler: usize,
    pub target: ChannelTargetDef,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelTargetDef {
    pub node: Option<usize>,
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationSamplerDef {
    pub input: usize,
    pub output: usize,
    pub interpolation: Option<String>,
}

// ============================================================================
// Parsing and validation
// ============================================================================

fn check(index: usize, count: usize, kind: &'static str) -> Result<()> {
    if index < count {
        Ok(())
    } else {
        Err(GltfError::invalid_index(kind, index, count))
    }
}

fn check_opt(index: Option<usize>, count: usize, kind: &'static str) -> Result<()> {
    index.map_or(Ok(()), |index| check(index, count, kind))
}

impl Document {
    /// Parses document text and rejects assets older than glTF 2.0.
    pub fn from_text(text: &str) -> Result<Self> {
        let document: Document = serde_json::from_str(text)?;
        let asset = document
            .asset
            .as_ref()
            .ok_or_else(|| GltfError::UnsupportedAssetVersion("missing asset".into()))?;
        match asset.major_version() {
            Some(major) if major >= 2 => Ok(document),
            _ => Err(GltfError::UnsupportedAssetVersion(asset.version.clone())),
        }
    }

    /// Checks that every index reference in the document resolves within its
    /// target array.
    pub fn validate(&self) -> Result<()> {
        let nodes = self.nodes.len();
        let accessors = self.accessors.len();
        let buffer_views = self.buffer_views.len();
        let textures = self.textures.len();

        if !self.scenes.is_empty() || self.scene.is_some() {
            check_opt(self.scene, self.scenes.len(), "scene")?;
        }
        for scene in &self.scenes {
            for &node in &scene.nodes {
                check(node, nodes, "node")?;
            }
        }

        for node in &self.nodes {
            for &child in &node.children {
                check(child, nodes, "node")?;
            }
            check_opt(node.mesh, self.meshes.len(), "mesh")?;
            check_opt(node.camera, self.cameras.len(), "camera")?;
            check_opt(node.skin, self.skins.len(), "skin")?;
        }

        for mesh in &self.meshes {
            for primitive in &mesh.primitives {
                for &accessor in primitive.attributes.values() {
                    check(accessor, accessors, "accessor")?;
                }
                check_opt(primitive.indices, accessors, "accessor")?;
                check_opt(primitive.material, self.materials.len(), "material")?;
                for target in &primitive.targets {
                    for &accessor in target.values() {
                        check(accessor, accessors, "accessor")?;
                    }
                }
            }
        }

        for accessor in &self.accessors {
            check_opt(accessor.buffer_view, buffer_views, "bufferView")?;
            if let Some(sparse) = &accessor.sparse {
                check(sparse.indices.buffer_view, buffer_views, "bufferView")?;
                check(sparse.values.buffer_view, buffer_views, "bufferView")?;
            }
        }

        for view in &self.buffer_views {
            check(view.buffer, self.buffers.len(), "buffer")?;
        }

        for material in &self.materials {
            if let Some(pbr) = &material.pbr_metallic_roughness {
                check_opt(pbr.base_color_texture.as_ref().map(|t| t.index), textures, "texture")?;
                check_opt(
                    pbr.metallic_roughness_texture.as_ref().map(|t| t.index),
                    textures,
                    "texture",
                )?;
            }
            check_opt(material.normal_texture.as_ref().map(|t| t.index), textures, "texture")?;
            check_opt(material.occlusion_texture.as_ref().map(|t| t.index), textures, "texture")?;
            check_opt(material.emissive_texture.as_ref().map(|t| t.index), textures, "texture")?;
        }

        for texture in &self.textures {
            check_opt(texture.sampler, self.samplers.len(), "sampler")?;
            check_opt(texture.source, self.images.len(), "image")?;
        }

        for image in &self.images {
            check_opt(image.buffer_view, buffer_views, "bufferView")?;
        }

        // Unresolvable joints are skipped with a warning when the skeleton
        // is bound.
        for skin in &self.skins {
            check_opt(skin.inverse_bind_matrices, accessors, "accessor")?;
            check_opt(skin.skeleton, nodes, "node")?;
        }

        for animation in &self.animations {
            for channel in &animation.channels {
                check(channel.sampler, animation.samplers.len(), "animation sampler")?;
                check_opt(channel.target.node, nodes, "node")?;
            }
            for sampler in &animation.samplers {
                check(sampler.input, accessors, "accessor")?;
                check(sampler.output, accessors, "accessor")?;
            }
        }

        Ok(())
    }

    /// Every declared extension name, `extensionsUsed` first, without
    /// duplicates.
    pub fn declared_extensions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.extensions_used.iter().chain(&self.extensions_required) {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        names
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.extensions_required.iter().any(|required| required == name)
    }

    /// Number of definitions of the given plural document key.
    pub fn count(&self, kind: &str) -> usize {
        match kind {
            "scene" => self.scenes.len(),
            "node" => self.nodes.len(),
            "mesh" => self.meshes.len(),
            "accessor" => self.accessors.len(),
            "bufferView" => self.buffer_views.len(),
            "buffer" => self.buffers.len(),
            "material" => self.materials.len(),
            "texture" => self.textures.len(),
            "skin" => self.skins.len(),
            "animation" => self.animations.len(),
            "camera" => self.cameras.len(),
            _ => 0,
        }
    }
}
