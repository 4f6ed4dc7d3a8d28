//! Shared fixtures: an in-memory asset builder and stub host collaborators.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::rc::Rc;

use async_trait::async_trait;
use glint_core::component::{ComponentArray, ComponentType};
use glint_core::geometry::Geometry;
use glint_core::texture::{TextureFormat, TextureImage};
use glint_core::BufferAttribute;
use glint_io::{encode_glb, DracoDecoder, FetchService, Gltf, GltfLoader, TextureDecoder};
use serde_json::{json, Value};

pub const FLOAT: u32 = 5126;
pub const UNSIGNED_SHORT: u32 = 5123;
pub const UNSIGNED_BYTE: u32 = 5121;

/// Accumulates one binary buffer plus its bufferViews and accessors, then
/// wraps a document around them.
#[derive(Default)]
pub struct AssetBuilder {
    bin: Vec<u8>,
    buffer_views: Vec<Value>,
    accessors: Vec<Value>,
}

impl AssetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `bytes` as a new bufferView, 4-byte aligned.
    pub fn view(&mut self, bytes: &[u8], byte_stride: Option<usize>) -> usize {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        let mut view = json!({
            "buffer": 0,
            "byteOffset": self.bin.len(),
            "byteLength": bytes.len(),
        });
        if let Some(stride) = byte_stride {
            view["byteStride"] = json!(stride);
        }
        self.bin.extend_from_slice(bytes);
        self.buffer_views.push(view);
        self.buffer_views.len() - 1
    }

    pub fn accessor(&mut self, accessor: Value) -> usize {
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }

    /// A tightly packed float accessor over a fresh bufferView.
    pub fn floats(&mut self, values: &[f32], element_type: &str) -> usize {
        let view = self.view(&f32_bytes(values), None);
        let item_size = item_size(element_type);
        self.accessor(json!({
            "bufferView": view,
            "componentType": FLOAT,
            "count": values.len() / item_size,
            "type": element_type,
        }))
    }

    /// An unsigned short index accessor over a fresh bufferView.
    pub fn indices(&mut self, values: &[u16]) -> usize {
        let view = self.view(&u16_bytes(values), None);
        self.accessor(json!({
            "bufferView": view,
            "componentType": UNSIGNED_SHORT,
            "count": values.len(),
            "type": "SCALAR",
        }))
    }

    /// Fills buffers, bufferViews and accessors into `document`.
    pub fn document(&self, mut document: Value) -> Value {
        if document.get("asset").is_none() {
            document["asset"] = json!({"version": "2.0"});
        }
        if !self.bin.is_empty() {
            document["buffers"] = json!([{"byteLength": self.bin.len()}]);
            document["bufferViews"] = Value::Array(self.buffer_views.clone());
        }
        document["accessors"] = Value::Array(self.accessors.clone());
        document
    }

    pub fn glb(&self, document: Value) -> Vec<u8> {
        let text = self.document(document).to_string();
        let bin = (!self.bin.is_empty()).then_some(self.bin.as_slice());
        encode_glb(&text, bin)
    }

    pub fn bin(&self) -> &[u8] {
        &self.bin
    }
}

pub fn item_size(element_type: &str) -> usize {
    match element_type {
        "SCALAR" => 1,
        "VEC2" => 2,
        "VEC3" => 3,
        "VEC4" | "MAT2" => 4,
        "MAT3" => 9,
        "MAT4" => 16,
        other => panic!("unknown element type {other}"),
    }
}

pub fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn u16_bytes(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub const TRIANGLE: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];

/// Serves fixed bytes per URI and counts fetches.
#[derive(Default)]
pub struct MapFetcher {
    files: HashMap<String, Vec<u8>>,
    pub fetches: RefCell<Vec<String>>,
}

impl MapFetcher {
    pub fn with_file(mut self, uri: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(uri.to_string(), bytes);
        self
    }
}

#[async_trait(?Send)]
impl FetchService for MapFetcher {
    async fn fetch(&self, uri: &str) -> io::Result<Vec<u8>> {
        self.fetches.borrow_mut().push(uri.to_string());
        self.files
            .get(uri)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{uri} not found")))
    }
}

/// Decodes every image to a 1x1 texel holding the first input byte, and
/// records the MIME types it was asked for.
#[derive(Default)]
pub struct SolidTextureDecoder {
    pub calls: Cell<usize>,
    pub mime_types: RefCell<Vec<Option<String>>>,
}

#[async_trait(?Send)]
impl TextureDecoder for SolidTextureDecoder {
    async fn decode_texture(&self, bytes: &[u8], mime_type: Option<&str>) -> io::Result<TextureImage> {
        self.calls.set(self.calls.get() + 1);
        self.mime_types.borrow_mut().push(mime_type.map(String::from));
        let value = *bytes
            .first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "empty image"))?;
        Ok(TextureImage {
            width: 1,
            height: 1,
            format: TextureFormat::Rgba,
            data: vec![value; 4],
        })
    }
}

/// Returns a fixed triangle for any payload and records the attribute map
/// it was asked to decode.
#[derive(Default)]
pub struct StubDracoDecoder {
    pub requests: RefCell<Vec<(BTreeMap<String, u32>, BTreeMap<String, ComponentType>)>>,
}

#[async_trait(?Send)]
impl DracoDecoder for StubDracoDecoder {
    async fn decode(
        &self,
        _data: &[u8],
        attribute_map: &BTreeMap<String, u32>,
        attribute_types: &BTreeMap<String, ComponentType>,
    ) -> io::Result<Geometry> {
        self.requests
            .borrow_mut()
            .push((attribute_map.clone(), attribute_types.clone()));
        let mut geometry = Geometry::new();
        geometry.set_attribute(
            "position",
            BufferAttribute::new(ComponentArray::Float32(TRIANGLE.to_vec()), 3, false).into(),
        );
        geometry.set_index(BufferAttribute::new(ComponentArray::Uint16(vec![0, 1, 2]), 1, false).into());
        Ok(geometry)
    }
}

pub fn parse(loader: &GltfLoader, data: &[u8]) -> glint_core::Result<Gltf> {
    futures::executor::block_on(loader.parse(data))
}

pub fn parse_default(data: &[u8]) -> Gltf {
    parse(&GltfLoader::new(), data).expect("asset should parse")
}

/// A scene with one node per mesh, in mesh order.
pub fn scene_of_meshes(meshes: Value) -> Value {
    let count = meshes.as_array().map_or(0, Vec::len);
    let nodes: Vec<Value> = (0..count).map(|i| json!({"mesh": i})).collect();
    let roots: Vec<usize> = (0..count).collect();
    json!({
        "scene": 0,
        "scenes": [{"nodes": roots}],
        "nodes": nodes,
        "meshes": meshes,
    })
}

pub fn rc_texture_decoder() -> Rc<SolidTextureDecoder> {
    Rc::new(SolidTextureDecoder::default())
}
