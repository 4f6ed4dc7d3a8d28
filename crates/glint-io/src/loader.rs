//! Loader entry point.
//!
//! [`GltfLoader`] holds the host collaborators and options; each call to
//! [`GltfLoader::parse`] or [`GltfLoader::load`] runs one independent parse
//! and returns a [`Gltf`].

use std::rc::Rc;

use glint_core::animation::AnimationClip;
use glint_core::object::Object3D;
use glint_core::status::{GltfError, Result};
use glint_core::UserData;

use crate::container::decode_container;
use crate::document::{Asset, Document};
use crate::extensions::{ExtensionCollaborators, ExtensionRegistry};
use crate::parser::GltfParser;
use crate::traits::{DracoDecoder, FetchService, TextureDecoder};
use crate::uri::extract_url_base;

/// Per-parse options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Base path relative URIs resolve against, with trailing separator.
    pub path: String,
    /// Merge the primitives of a mesh into one grouped geometry when their
    /// draw modes agree.
    pub merge_geometries: bool,
}

/// Result of one parse.
#[derive(Debug, Clone)]
pub struct Gltf {
    /// The default scene: `scenes[document.scene]`, else the first scene.
    pub scene: Option<Rc<Object3D>>,
    pub scenes: Vec<Rc<Object3D>>,
    /// Cameras with complete parameters, in document order.
    pub cameras: Vec<Rc<Object3D>>,
    pub animations: Vec<Rc<AnimationClip>>,
    pub asset: Option<Asset>,
    pub user_data: UserData,
}

#[derive(Clone, Default)]
pub struct GltfLoader {
    options: LoaderOptions,
    fetcher: Option<Rc<dyn FetchService>>,
    texture_decoder: Option<Rc<dyn TextureDecoder>>,
    collaborators: ExtensionCollaborators,
}

impl GltfLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.options.path = path.into();
        self
    }

    pub fn with_fetcher(mut self, fetcher: Rc<dyn FetchService>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_texture_decoder(mut self, decoder: Rc<dyn TextureDecoder>) -> Self {
        self.texture_decoder = Some(decoder);
        self
    }

    pub fn with_dds_decoder(mut self, decoder: Rc<dyn TextureDecoder>) -> Self {
        self.collaborators.dds_decoder = Some(decoder);
        self
    }

    pub fn with_draco_decoder(mut self, decoder: Rc<dyn DracoDecoder>) -> Self {
        self.collaborators.draco_decoder = Some(decoder);
        self
    }

    pub fn with_geometry_merge(mut self, enabled: bool) -> Self {
        self.options.merge_geometries = enabled;
        self
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Parses GLB or glTF JSON bytes.
    pub async fn parse(&self, data: &[u8]) -> Result<Gltf> {
        self.parse_with_options(data, self.options.clone()).await
    }

    /// Fetches `url` and parses it. Relative URIs inside the asset resolve
    /// against the directory of `url` unless a path was configured.
    pub async fn load(&self, url: &str) -> Result<Gltf> {
        let fetcher = self
            .fetcher
            .as_ref()
            .ok_or_else(|| GltfError::MissingCollaborator(format!("no fetch service to load \"{}\"", url)))?;
        let fetched = fetcher.fetch(url).await;
        let data = fetched.map_err(|e| GltfError::Fetch {
            uri: url.to_string(),
            reason: e.to_string(),
        })?;

        let mut options = self.options.clone();
        if options.path.is_empty() {
            options.path = extract_url_base(url);
        }
        log::info!("Loaded {} ({} bytes)", url, data.len());
        self.parse_with_options(&data, options).await
    }

    async fn parse_with_options(&self, data: &[u8], options: LoaderOptions) -> Result<Gltf> {
        let container = decode_container(data)?;
        let document = Document::from_text(&container.document_text)?;
        document.validate()?;

        let extensions = ExtensionRegistry::from_document(&document, container.is_container, &self.collaborators)?;
        log::debug!(
            "Extensions: [{}]",
            extensions.names().collect::<Vec<_>>().join(", ")
        );

        let parser = GltfParser::new(
            document,
            extensions,
            container.binary_chunk,
            options,
            self.fetcher.clone(),
            self.texture_decoder.clone(),
        );
        parser.parse().await
    }
}
