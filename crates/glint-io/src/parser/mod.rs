//! Lazy, memoized resolution of glTF entities.
//!
//! [`GltfParser`] resolves typed entities on demand. Every `(type, index)`
//! pair is loaded at most once per parse: the first request starts the load
//! and later requests share its in-flight or completed result. Loads that
//! depend on other entities request them through the same memo, so shared
//! buffers, materials and meshes are decoded once.
//!
//! ```text
//! scene ── node ──┬── mesh ──┬── material ── texture ── bufferView/uri
//!                 │          └── accessor ── bufferView ── buffer
//!                 ├── camera
//!                 └── skin ── accessor
//! animation ── node, accessor
//! ```
//!
//! All state lives behind one `Rc`; caches use `RefCell` and are never
//! borrowed across an `.await`.

use std::cell::{OnceCell, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use futures::future::{try_join_all, TryFutureExt};
use glint_core::attribute::{Attribute, InterleavedBuffer};
use glint_core::component::ComponentType;
use glint_core::geometry::Geometry;
use glint_core::ids::{GeometryId, MaterialId};
use glint_core::material::{Material, MaterialType};
use glint_core::object::Object3D;
use glint_core::status::{GltfError, Result};
use glint_core::{AnimationClip, UserData};
use serde_json::Value;

use crate::document::{Document, Extensions};
use crate::extensions::ExtensionRegistry;
use crate::loader::{Gltf, LoaderOptions};
use crate::traits::{FetchService, TextureDecoder};

mod animation;
mod buffers;
pub mod cache;
mod geometry;
mod materials;
mod meshes;
mod nodes;
mod scene;
mod textures;

pub use cache::{SharedLoad, SingleFlight};
pub use geometry::PrimitiveKey;
pub use meshes::MaterialFlags;

/// Kinds of entity the parser resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DependencyType {
    Scene,
    Node,
    Mesh,
    Accessor,
    BufferView,
    Buffer,
    Material,
    Texture,
    Skin,
    Animation,
    Camera,
}

impl DependencyType {
    pub const ALL: [DependencyType; 11] = [
        DependencyType::Scene,
        DependencyType::Node,
        DependencyType::Mesh,
        DependencyType::Accessor,
        DependencyType::BufferView,
        DependencyType::Buffer,
        DependencyType::Material,
        DependencyType::Texture,
        DependencyType::Skin,
        DependencyType::Animation,
        DependencyType::Camera,
    ];

    /// Document key of the type, singular.
    pub fn name(&self) -> &'static str {
        match self {
            DependencyType::Scene => "scene",
            DependencyType::Node => "node",
            DependencyType::Mesh => "mesh",
            DependencyType::Accessor => "accessor",
            DependencyType::BufferView => "bufferView",
            DependencyType::Buffer => "buffer",
            DependencyType::Material => "material",
            DependencyType::Texture => "texture",
            DependencyType::Skin => "skin",
            DependencyType::Animation => "animation",
            DependencyType::Camera => "camera",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved skin: joint node indices and the optional inverse bind
/// matrices accessor.
#[derive(Debug, Clone, PartialEq)]
pub struct SkinEntry {
    pub joints: Vec<usize>,
    pub inverse_bind_matrices: Option<Attribute>,
}

/// A resolved entity.
#[derive(Debug, Clone)]
pub enum Dependency {
    Scene(Rc<Object3D>),
    Node(Rc<Object3D>),
    Mesh(Rc<Object3D>),
    /// `None` for accessors that only declare metadata.
    Accessor(Option<Attribute>),
    BufferView(Rc<Vec<u8>>),
    Buffer(Rc<Vec<u8>>),
    Material(Rc<Material>),
    Texture(Rc<glint_core::texture::Texture>),
    Skin(Rc<SkinEntry>),
    Animation(Rc<AnimationClip>),
    /// `None` when the camera definition lacks its parameters.
    Camera(Option<Rc<Object3D>>),
}

impl Dependency {
    pub fn dependency_type(&self) -> DependencyType {
        match self {
            Dependency::Scene(_) => DependencyType::Scene,
            Dependency::Node(_) => DependencyType::Node,
            Dependency::Mesh(_) => DependencyType::Mesh,
            Dependency::Accessor(_) => DependencyType::Accessor,
            Dependency::BufferView(_) => DependencyType::BufferView,
            Dependency::Buffer(_) => DependencyType::Buffer,
            Dependency::Material(_) => DependencyType::Material,
            Dependency::Texture(_) => DependencyType::Texture,
            Dependency::Skin(_) => DependencyType::Skin,
            Dependency::Animation(_) => DependencyType::Animation,
            Dependency::Camera(_) => DependencyType::Camera,
        }
    }

    fn mismatch(&self, expected: &'static str) -> GltfError {
        GltfError::DependencyMismatch {
            expected,
            found: self.dependency_type().name(),
        }
    }

    /// The object of a scene, node or mesh.
    pub fn object(&self) -> Result<Rc<Object3D>> {
        match self {
            Dependency::Scene(object) | Dependency::Node(object) | Dependency::Mesh(object) => Ok(object.clone()),
            other => Err(other.mismatch("object")),
        }
    }

    pub fn accessor(&self) -> Result<Option<Attribute>> {
        match self {
            Dependency::Accessor(attribute) => Ok(attribute.clone()),
            other => Err(other.mismatch("accessor")),
        }
    }

    /// The bytes of a buffer or bufferView.
    pub fn bytes(&self) -> Result<Rc<Vec<u8>>> {
        match self {
            Dependency::Buffer(bytes) | Dependency::BufferView(bytes) => Ok(bytes.clone()),
            other => Err(other.mismatch("bytes")),
        }
    }

    pub fn material(&self) -> Result<Rc<Material>> {
        match self {
            Dependency::Material(material) => Ok(material.clone()),
            other => Err(other.mismatch("material")),
        }
    }

    pub fn texture(&self) -> Result<Rc<glint_core::texture::Texture>> {
        match self {
            Dependency::Texture(texture) => Ok(texture.clone()),
            other => Err(other.mismatch("texture")),
        }
    }

    pub fn skin(&self) -> Result<Rc<SkinEntry>> {
        match self {
            Dependency::Skin(skin) => Ok(skin.clone()),
            other => Err(other.mismatch("skin")),
        }
    }

    pub fn animation(&self) -> Result<Rc<AnimationClip>> {
        match self {
            Dependency::Animation(clip) => Ok(clip.clone()),
            other => Err(other.mismatch("animation")),
        }
    }

    pub fn camera(&self) -> Result<Option<Rc<Object3D>>> {
        match self {
            Dependency::Camera(camera) => Ok(camera.clone()),
            other => Err(other.mismatch("camera")),
        }
    }
}

/// Resolved entities of several types, keyed by type.
pub type MultiDependencies = BTreeMap<DependencyType, Rc<Vec<Dependency>>>;

/// Facts about the document that no single definition carries, computed
/// once before any entity is resolved.
#[derive(Debug, Clone, Default)]
pub struct Marks {
    bones: HashSet<usize>,
    skinned_meshes: HashSet<usize>,
    mesh_references: HashMap<usize, usize>,
    /// Node index to its use number of a shared mesh, in node order.
    mesh_uses: HashMap<usize, usize>,
    animated_nodes: HashSet<usize>,
}

impl Marks {
    /// Marks bones (skin joints), skinned meshes (meshes referenced by a node
    /// with a skin), shared-mesh uses and animated nodes.
    pub fn from_document(document: &Document) -> Self {
        let mut marks = Marks::default();

        for skin in &document.skins {
            marks.bones.extend(skin.joints.iter().copied());
        }

        for (node_index, node) in document.nodes.iter().enumerate() {
            let Some(mesh) = node.mesh else {
                continue;
            };
            let uses = marks.mesh_references.entry(mesh).or_insert(0);
            marks.mesh_uses.insert(node_index, *uses);
            *uses += 1;
            if node.skin.is_some() {
                marks.skinned_meshes.insert(mesh);
            }
        }

        for animation in &document.animations {
            for channel in &animation.channels {
                if animation.samplers.get(channel.sampler).is_none() {
                    continue;
                }
                if let Some(node) = channel.target.node {
                    marks.animated_nodes.insert(node);
                }
            }
        }

        marks
    }

    pub fn is_bone(&self, node: usize) -> bool {
        self.bones.contains(&node)
    }

    pub fn is_skinned_mesh(&self, mesh: usize) -> bool {
        self.skinned_meshes.contains(&mesh)
    }

    pub fn mesh_references(&self, mesh: usize) -> usize {
        self.mesh_references.get(&mesh).copied().unwrap_or(0)
    }

    /// Which use of its mesh `node` is, counting from zero.
    pub fn mesh_use(&self, node: usize) -> Option<usize> {
        self.mesh_uses.get(&node).copied()
    }

    pub fn is_animated(&self, node: usize) -> bool {
        self.animated_nodes.contains(&node)
    }
}

/// Copies object-valued `extras` into `user_data`. Other JSON values are
/// ignored with a warning.
pub fn assign_extras(user_data: &mut UserData, extras: Option<&Value>) {
    match extras {
        Some(Value::Object(map)) => {
            user_data.extend(map.iter().map(|(key, value)| (key.clone(), value.clone())));
        }
        Some(other) => log::warn!("Ignoring primitive type .extras, {}", other),
        None => {}
    }
}

/// Preserves extensions the registry has no handler for under the
/// `gltfExtensions` user data key.
pub fn add_unknown_extensions(registry: &ExtensionRegistry, user_data: &mut UserData, extensions: &Extensions) {
    for (name, value) in extensions {
        if registry.contains(name) {
            continue;
        }
        let entry = user_data
            .entry("gltfExtensions")
            .or_insert_with(|| Value::Object(Default::default()));
        if let Value::Object(unknown) = entry {
            unknown.insert(name.clone(), value.clone());
        }
    }
}

/// Resolves the entities of one document. Create one per parse.
pub struct GltfParser {
    document: Document,
    extensions: ExtensionRegistry,
    binary_chunk: Option<Rc<Vec<u8>>>,
    options: LoaderOptions,
    fetcher: Option<Rc<dyn FetchService>>,
    texture_decoder: Option<Rc<dyn TextureDecoder>>,
    marks: Marks,

    dependencies: SingleFlight<(DependencyType, usize), Dependency>,
    aggregates: SingleFlight<DependencyType, Rc<Vec<Dependency>>>,

    interleaved_buffers: RefCell<HashMap<(usize, ComponentType), Rc<InterleavedBuffer>>>,
    primitives: SingleFlight<PrimitiveKey, Rc<Geometry>>,
    multipass_geometries: RefCell<HashMap<(GeometryId, Vec<PrimitiveKey>), Rc<Geometry>>>,
    combined_geometries: RefCell<HashMap<Vec<GeometryId>, Option<Rc<Geometry>>>>,
    uv2_geometries: RefCell<HashMap<GeometryId, Rc<Geometry>>>,

    material_variants: RefCell<HashMap<(MaterialId, MaterialFlags), Rc<Material>>>,
    primitive_materials: RefCell<HashMap<(MaterialId, MaterialType), Rc<Material>>>,
    default_material: OnceCell<Rc<Material>>,
}

impl GltfParser {
    pub fn new(
        document: Document,
        extensions: ExtensionRegistry,
        binary_chunk: Option<Vec<u8>>,
        options: LoaderOptions,
        fetcher: Option<Rc<dyn FetchService>>,
        texture_decoder: Option<Rc<dyn TextureDecoder>>,
    ) -> Rc<Self> {
        let marks = Marks::from_document(&document);
        Rc::new(Self {
            document,
            extensions,
            binary_chunk: binary_chunk.map(Rc::new),
            options,
            fetcher,
            texture_decoder,
            marks,
            dependencies: SingleFlight::new(),
            aggregates: SingleFlight::new(),
            interleaved_buffers: RefCell::new(HashMap::new()),
            primitives: SingleFlight::new(),
            multipass_geometries: RefCell::new(HashMap::new()),
            combined_geometries: RefCell::new(HashMap::new()),
            uv2_geometries: RefCell::new(HashMap::new()),
            material_variants: RefCell::new(HashMap::new()),
            primitive_materials: RefCell::new(HashMap::new()),
            default_material: OnceCell::new(),
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    pub fn marks(&self) -> &Marks {
        &self.marks
    }

    /// Resolves every scene, animation and camera and packages the result.
    pub async fn parse(self: Rc<Self>) -> Result<Gltf> {
        let dependencies = self
            .get_multi_dependencies(&[DependencyType::Scene, DependencyType::Animation, DependencyType::Camera])
            .await?;

        let resolved = |ty: DependencyType| dependencies.get(&ty).cloned().unwrap_or_default();

        let scenes = resolved(DependencyType::Scene)
            .iter()
            .map(Dependency::object)
            .collect::<Result<Vec<_>>>()?;
        let animations = resolved(DependencyType::Animation)
            .iter()
            .map(Dependency::animation)
            .collect::<Result<Vec<_>>>()?;
        let mut cameras = Vec::new();
        for camera in resolved(DependencyType::Camera).iter() {
            cameras.extend(camera.camera()?);
        }

        let scene = scenes.get(self.document.scene.unwrap_or(0)).cloned();

        let mut user_data = UserData::new();
        assign_extras(&mut user_data, self.document.extras.as_ref());
        add_unknown_extensions(&self.extensions, &mut user_data, &self.document.extensions);

        log::debug!(
            "Parsed {} scene(s), {} animation(s), {} camera(s)",
            scenes.len(),
            animations.len(),
            cameras.len()
        );

        Ok(Gltf {
            scene,
            scenes,
            cameras,
            animations,
            asset: self.document.asset.clone(),
            user_data,
        })
    }

    /// Memoized load of entity `index` of type `ty`.
    pub fn get_dependency(self: &Rc<Self>, ty: DependencyType, index: usize) -> SharedLoad<Dependency> {
        let parser = self.clone();
        self.dependencies
            .get_or_start((ty, index), move || parser.load_dependency(ty, index))
    }

    /// Every entity of type `ty`, loaded concurrently and memoized.
    pub fn get_dependencies(self: &Rc<Self>, ty: DependencyType) -> SharedLoad<Rc<Vec<Dependency>>> {
        let parser = self.clone();
        self.aggregates.get_or_start(ty, move || async move {
            let count = parser.document.count(ty.name());
            let loads = (0..count).map(|index| parser.get_dependency(ty, index));
            Ok(Rc::new(try_join_all(loads).await?))
        })
    }

    /// Entities of several types, loaded concurrently.
    pub async fn get_multi_dependencies(self: &Rc<Self>, types: &[DependencyType]) -> Result<MultiDependencies> {
        let loads = types
            .iter()
            .map(|&ty| self.get_dependencies(ty).map_ok(move |dependencies| (ty, dependencies)));
        Ok(try_join_all(loads).await?.into_iter().collect())
    }

    async fn load_dependency(self: Rc<Self>, ty: DependencyType, index: usize) -> Result<Dependency> {
        log::debug!("Resolving {} {}", ty, index);
        let dependency = match ty {
            DependencyType::Scene => Dependency::Scene(self.load_scene(index).await?),
            DependencyType::Node => Dependency::Node(self.load_node(index).await?),
            DependencyType::Mesh => Dependency::Mesh(self.load_mesh(index).await?),
            DependencyType::Accessor => Dependency::Accessor(self.load_accessor(index).await?),
            DependencyType::BufferView => Dependency::BufferView(self.load_buffer_view(index).await?),
            DependencyType::Buffer => Dependency::Buffer(self.load_buffer(index).await?),
            DependencyType::Material => Dependency::Material(self.load_material(index).await?),
            DependencyType::Texture => Dependency::Texture(self.load_texture(index).await?),
            DependencyType::Skin => Dependency::Skin(self.load_skin(index).await?),
            DependencyType::Animation => Dependency::Animation(self.load_animation(index).await?),
            DependencyType::Camera => Dependency::Camera(self.load_camera(index)?),
        };
        Ok(dependency)
    }

    async fn accessor(self: &Rc<Self>, index: usize) -> Result<Option<Attribute>> {
        self.get_dependency(DependencyType::Accessor, index).await?.accessor()
    }

    async fn buffer_view_bytes(self: &Rc<Self>, index: usize) -> Result<Rc<Vec<u8>>> {
        self.get_dependency(DependencyType::BufferView, index).await?.bytes()
    }
}
