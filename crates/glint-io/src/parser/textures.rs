//! Textures: image bytes, host decoding and sampler state.

use std::rc::Rc;

use glint_core::constants::{Filter, Wrapping};
use glint_core::status::{resolve, GltfError, Result};
use glint_core::texture::{Texture, TextureFormat};

use super::GltfParser;
use crate::extensions::TextureDdsExtension;
use crate::traits::TextureDecoder;
use crate::uri::{decode_data_uri, is_data_uri};

impl GltfParser {
    pub(super) async fn load_texture(self: Rc<Self>, index: usize) -> Result<Rc<Texture>> {
        let texture_def = resolve(&self.document.textures, index, "texture")?;

        let dds = self
            .extensions
            .texture_dds()
            .and_then(|extension| Some((TextureDdsExtension::source(texture_def)?, extension.decoder())));

        let (source, decoder): (Option<usize>, Rc<dyn TextureDecoder>) = match dds {
            Some((source, decoder)) => (Some(source), decoder),
            None => {
                let decoder = self
                    .texture_decoder
                    .clone()
                    .ok_or_else(|| GltfError::MissingCollaborator("no texture decoder provided".into()))?;
                (texture_def.source, decoder)
            }
        };

        let source = source.ok_or_else(|| GltfError::invalid_definition("texture", index, "no image source"))?;
        let image_def = resolve(&self.document.images, source, "image")?;

        let mut mime_type = image_def.mime_type.clone();
        let bytes = match (image_def.buffer_view, &image_def.uri) {
            (Some(view_index), _) => self.buffer_view_bytes(view_index).await?,
            (None, Some(uri)) if is_data_uri(uri) => {
                let data_uri = decode_data_uri(uri)?;
                if mime_type.is_none() {
                    mime_type = data_uri.mime_type;
                }
                Rc::new(data_uri.data)
            }
            (None, Some(uri)) => Rc::new(self.fetch_uri(uri).await?),
            (None, None) => {
                return Err(GltfError::invalid_definition("image", source, "no uri or bufferView"));
            }
        };

        let decoded = decoder.decode_texture(&bytes, mime_type.as_deref()).await;
        let image = decoded.map_err(|e| GltfError::TextureDecode(format!("image {}: {}", source, e)))?;

        let mut texture = Texture::new(Rc::new(image));
        texture.flip_y = false;
        if let Some(name) = &texture_def.name {
            texture.name = name.clone();
        }
        if let Some(format) = mime_type.as_deref().and_then(TextureFormat::from_mime_type) {
            texture.format = format;
        }

        let sampler = texture_def.sampler.and_then(|sampler| self.document.samplers.get(sampler));
        let sampler = sampler.cloned().unwrap_or_default();
        texture.mag_filter = sampler.mag_filter.and_then(Filter::from_gl).unwrap_or(Filter::Linear);
        texture.min_filter = sampler
            .min_filter
            .and_then(Filter::from_gl)
            .unwrap_or(Filter::LinearMipMapLinear);
        texture.wrap_s = sampler.wrap_s.and_then(Wrapping::from_gl).unwrap_or(Wrapping::Repeat);
        texture.wrap_t = sampler.wrap_t.and_then(Wrapping::from_gl).unwrap_or(Wrapping::Repeat);

        log::debug!(
            "Decoded texture {} ({}x{})",
            index,
            texture.image.width,
            texture.image.height
        );
        Ok(Rc::new(texture))
    }
}
