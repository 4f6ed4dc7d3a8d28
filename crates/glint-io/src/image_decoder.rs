//! PNG/JPEG texture decoding through the `image` crate.

use std::io;

use async_trait::async_trait;
use glint_core::texture::{TextureFormat, TextureImage};
use image::ImageFormat;

use crate::traits::TextureDecoder;

/// [`TextureDecoder`] for PNG and JPEG images.
///
/// PNG decodes to RGBA and JPEG to RGB. Without a MIME type the format is
/// guessed from the bytes and the alpha channel is kept when present.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageTextureDecoder;

impl ImageTextureDecoder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait(?Send)]
impl TextureDecoder for ImageTextureDecoder {
    async fn decode_texture(&self, bytes: &[u8], mime_type: Option<&str>) -> io::Result<TextureImage> {
        let format = match mime_type {
            Some("image/png") => Some(ImageFormat::Png),
            Some("image/jpeg") => Some(ImageFormat::Jpeg),
            _ => None,
        };

        let decoded = match format {
            Some(format) => image::load_from_memory_with_format(bytes, format),
            None => image::load_from_memory(bytes),
        }
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;

        let keep_alpha = match mime_type.and_then(TextureFormat::from_mime_type) {
            Some(texture_format) => texture_format == TextureFormat::Rgba,
            None => decoded.color().has_alpha(),
        };

        let (width, height) = (decoded.width(), decoded.height());
        let image = if keep_alpha {
            TextureImage {
                width,
                height,
                format: TextureFormat::Rgba,
                data: decoded.into_rgba8().into_raw(),
            }
        } else {
            TextureImage {
                width,
                height,
                format: TextureFormat::Rgb,
                data: decoded.into_rgb8().into_raw(),
            }
        };
        Ok(image)
    }
}
