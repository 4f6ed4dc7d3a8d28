//! Glint Core Library
//!
//! Runtime scene data model produced by the glint glTF loader: typed
//! component arrays and vertex attributes, geometries, materials, textures,
//! an owned scene graph, and keyframe animation with interpolation.
//!
//! Everything here is renderer-agnostic. Heavy payloads are shared through
//! `Rc`, so a mesh, geometry or material referenced from several places in a
//! scene is one value.

#![allow(clippy::too_many_arguments)]

// =============================================================================
// Data model
// =============================================================================

pub mod attribute;
pub mod component;
pub mod constants;
pub mod geometry;
pub mod ids;
pub mod material;
pub mod merge;
pub mod object;
pub mod status;
pub mod texture;

// =============================================================================
// Animation
// =============================================================================

pub mod animation;
pub mod interpolant;

/// Free-form application data attached to objects, materials and
/// geometries. glTF `extras` land here under their original keys.
pub type UserData = serde_json::Map<String, serde_json::Value>;

// =============================================================================
// Re-exports
// =============================================================================

pub use animation::{AnimationClip, Interpolation, KeyframeTrack, TrackKind};
pub use attribute::{Attribute, BufferAttribute, InterleavedBuffer, InterleavedBufferAttribute};
pub use component::{ComponentArray, ComponentType, ElementType};
pub use geometry::{DrawGroup, Geometry};
pub use ids::{BufferId, GeometryId, MaterialId, ObjectId, TextureId};
pub use material::{Material, MaterialType, RefreshUniforms, ShaderUniforms, Side, TextureSlot};
pub use object::{Camera, Light, LightKind, Mesh, MeshKind, MeshMaterial, Object3D, ObjectKind, Skeleton};
pub use status::{ErrorKind, GltfError, Result};
pub use texture::{Encoding, Texture, TextureFormat, TextureImage};
