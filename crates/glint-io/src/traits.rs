//! Host collaborator interfaces.
//!
//! The loader never touches the network, an image codec or a Draco decoder
//! directly. Hosts hand it implementations of these traits through the
//! builder methods on [`GltfLoader`](crate::loader::GltfLoader).
//!
//! All methods are asynchronous and run on the caller's executor; futures are
//! not required to be `Send`.
//!
//! ```ignore
//! use glint_io::{FetchService, FsFetcher, GltfLoader};
//!
//! struct Memory(Vec<u8>);
//!
//! #[async_trait::async_trait(?Send)]
//! impl FetchService for Memory {
//!     async fn fetch(&self, _uri: &str) -> io::Result<Vec<u8>> {
//!         Ok(self.0.clone())
//!     }
//! }
//!
//! let loader = GltfLoader::new().with_fetcher(Rc::new(Memory(bytes)));
//! ```

use std::collections::BTreeMap;
use std::io;

use async_trait::async_trait;
use glint_core::component::ComponentType;
use glint_core::geometry::Geometry;
use glint_core::texture::TextureImage;

/// Fetches the bytes behind a resolved URI.
#[async_trait(?Send)]
pub trait FetchService {
    async fn fetch(&self, uri: &str) -> io::Result<Vec<u8>>;
}

/// Decodes encoded image bytes into pixels.
#[async_trait(?Send)]
pub trait TextureDecoder {
    /// `mime_type` is the image's declared MIME type, when the document
    /// carries one.
    async fn decode_texture(&self, bytes: &[u8], mime_type: Option<&str>) -> io::Result<TextureImage>;
}

/// Decodes a Draco-compressed primitive.
#[async_trait(?Send)]
pub trait DracoDecoder {
    /// Decodes `data` into a geometry.
    ///
    /// # Arguments
    /// * `data` - Compressed bytes of the primitive's bufferView
    /// * `attribute_map` - Runtime attribute name to Draco attribute id
    /// * `attribute_types` - Runtime attribute name to the component type the
    ///   document declares for it
    async fn decode(
        &self,
        data: &[u8],
        attribute_map: &BTreeMap<String, u32>,
        attribute_types: &BTreeMap<String, ComponentType>,
    ) -> io::Result<Geometry>;
}
