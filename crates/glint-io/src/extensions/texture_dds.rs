//! `MSFT_texture_dds`: textures whose image is DDS-compressed.

use std::rc::Rc;

use serde::Deserialize;

use super::MSFT_TEXTURE_DDS;
use crate::document::TextureDef;
use crate::traits::TextureDecoder;

#[derive(Debug, Clone, Default, Deserialize)]
struct TextureDdsDef {
    source: Option<usize>,
}

pub struct TextureDdsExtension {
    decoder: Rc<dyn TextureDecoder>,
}

impl TextureDdsExtension {
    pub fn new(decoder: Rc<dyn TextureDecoder>) -> Self {
        Self { decoder }
    }

    /// Image index the extension substitutes for the texture's `source`.
    pub fn source(texture_def: &TextureDef) -> Option<usize> {
        let value = texture_def.extensions.get(MSFT_TEXTURE_DDS)?;
        serde_json::from_value::<TextureDdsDef>(value.clone())
            .ok()?
            .source
    }

    pub fn decoder(&self) -> Rc<dyn TextureDecoder> {
        self.decoder.clone()
    }
}
