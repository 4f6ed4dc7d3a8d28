//! Glint I/O library: glTF 2.0 and GLB loading.
//!
//! Turns `.gltf` JSON or `.glb` container bytes into the runtime scene model
//! of `glint-core`. Entities are resolved lazily and at most once per parse,
//! so shared buffers, textures, materials and meshes are decoded once.
//!
//! # Stages
//!
//! | Stage                | Module         |
//! |----------------------|----------------|
//! | Container decoding   | [`container`]  |
//! | Document schema      | [`document`]   |
//! | Extension handlers   | [`extensions`] |
//! | Dependency resolver  | [`parser`]     |
//! | Entry point          | [`loader`]     |
//!
//! # Host collaborators
//!
//! Byte fetching, image decoding and Draco decoding are supplied by the host
//! through the async traits in [`traits`]. [`FsFetcher`] reads local files and
//! [`ImageTextureDecoder`] decodes PNG/JPEG (feature `image-decoder`, on by
//! default).
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use glint_io::{FsFetcher, GltfLoader, ImageTextureDecoder};
//!
//! let loader = GltfLoader::new()
//!     .with_fetcher(Rc::new(FsFetcher::new()))
//!     .with_texture_decoder(Rc::new(ImageTextureDecoder::new()));
//! let gltf = futures::executor::block_on(loader.load("assets/DamagedHelmet.glb"))?;
//! println!("{} scene(s)", gltf.scenes.len());
//! ```
//!
//! Everything is single-threaded (`Rc`, `RefCell`); drive the returned
//! futures with any local executor.

pub mod container;
pub mod document;
pub mod extensions;
pub mod fetch;
#[cfg(feature = "image-decoder")]
pub mod image_decoder;
pub mod loader;
pub mod parser;
pub mod traits;
pub mod uri;

pub use container::{decode_container, encode_glb, is_glb, DecodedContainer};
pub use document::Document;
pub use extensions::{ExtensionCollaborators, ExtensionRegistry};
pub use fetch::FsFetcher;
#[cfg(feature = "image-decoder")]
pub use image_decoder::ImageTextureDecoder;
pub use loader::{Gltf, GltfLoader, LoaderOptions};
pub use parser::{Dependency, DependencyType, GltfParser};
pub use traits::{DracoDecoder, FetchService, TextureDecoder};
