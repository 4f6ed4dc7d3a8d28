//! Decoded textures with sampler state.

use std::rc::Rc;

use crate::constants::{Filter, Wrapping};
use crate::ids::TextureId;

/// Pixel layout of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Rgb,
    Rgba,
}

impl TextureFormat {
    /// Format implied by an image MIME type, if it is one the loader knows.
    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        match mime_type {
            "image/png" => Some(TextureFormat::Rgba),
            "image/jpeg" => Some(TextureFormat::Rgb),
            _ => None,
        }
    }
}

/// Color encoding of texel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Linear,
    Srgb,
}

/// Image data produced by a texture decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub id: TextureId,
    pub name: String,
    pub image: Rc<TextureImage>,
    pub format: TextureFormat,
    pub encoding: Encoding,
    pub flip_y: bool,
    pub mag_filter: Filter,
    pub min_filter: Filter,
    pub wrap_s: Wrapping,
    pub wrap_t: Wrapping,
}

impl Texture {
    pub fn new(image: Rc<TextureImage>) -> Self {
        Self {
            id: TextureId::next(),
            name: String::new(),
            format: image.format,
            image,
            encoding: Encoding::Linear,
            flip_y: true,
            mag_filter: Filter::Linear,
            min_filter: Filter::LinearMipMapLinear,
            wrap_s: Wrapping::ClampToEdge,
            wrap_t: Wrapping::ClampToEdge,
        }
    }

    /// A copy of this texture (same identity and image) using `encoding`.
    pub fn with_encoding(&self, encoding: Encoding) -> Self {
        Self {
            encoding,
            ..self.clone()
        }
    }
}
