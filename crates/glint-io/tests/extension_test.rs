//! Extension handlers and texture loading through full parses.

mod common;

use std::collections::BTreeMap;
use std::rc::Rc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use common::*;
use glint_core::component::ComponentType;
use glint_core::constants::{Filter, Wrapping};
use glint_core::material::{Material, MaterialType, ShaderUniforms};
use glint_core::object::MeshMaterial;
use glint_core::status::{ErrorKind, GltfError};
use glint_core::texture::{Encoding, TextureFormat};
use glint_io::GltfLoader;
use serde_json::{json, Value};

fn single_material(gltf: &glint_io::Gltf) -> Rc<Material> {
    let scene = gltf.scene.as_ref().unwrap();
    match &scene.children[0].mesh().unwrap().material {
        MeshMaterial::Single(material) => material.clone(),
        MeshMaterial::Multi(_) => panic!("expected a single material"),
    }
}

/// A one-triangle scene drawn with `material`.
fn with_material(builder: &mut AssetBuilder, material: Value) -> Value {
    let position = builder.floats(&TRIANGLE, "VEC3");
    let mut document = scene_of_meshes(json!([
        {"primitives": [{"attributes": {"POSITION": position}, "material": 0}]}
    ]));
    document["materials"] = json!([material]);
    document
}

fn draco_document(builder: &mut AssetBuilder) -> Value {
    let compressed = builder.view(&[0xd7; 16], None);
    let position = builder.accessor(json!({"componentType": FLOAT, "count": 3, "type": "VEC3"}));
    let mut document = scene_of_meshes(json!([{"primitives": [{
        "attributes": {"POSITION": position},
        "extensions": {"KHR_draco_mesh_compression": {
            "bufferView": compressed,
            "attributes": {"POSITION": 0}
        }}
    }]}]));
    document["extensionsUsed"] = json!(["KHR_draco_mesh_compression"]);
    document["extensionsRequired"] = json!(["KHR_draco_mesh_compression"]);
    document
}

#[test]
fn test_draco_without_decoder() {
    let mut builder = AssetBuilder::new();
    let document = draco_document(&mut builder);
    let err = parse(&GltfLoader::new(), &builder.glb(document)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(matches!(err, GltfError::MissingCollaborator(_)));
}

#[test]
fn test_draco_primitive_is_decoded() {
    let mut builder = AssetBuilder::new();
    let document = draco_document(&mut builder);
    let decoder = Rc::new(StubDracoDecoder::default());
    let loader = GltfLoader::new().with_draco_decoder(decoder.clone());
    let gltf = parse(&loader, &builder.glb(document)).unwrap();

    let scene = gltf.scene.unwrap();
    let geometry = &scene.children[0].mesh().unwrap().geometry;
    assert_eq!(geometry.attribute("position").unwrap().to_f32_vec(), TRIANGLE.to_vec());
    assert_eq!(geometry.index.as_ref().unwrap().to_u32_vec(), vec![0, 1, 2]);

    let requests = decoder.requests.borrow();
    assert_eq!(requests.len(), 1);
    let (attribute_map, attribute_types) = &requests[0];
    assert_eq!(*attribute_map, BTreeMap::from([("position".to_string(), 0)]));
    assert_eq!(
        *attribute_types,
        BTreeMap::from([("position".to_string(), ComponentType::Float32)])
    );
}

#[test]
fn test_undeclared_draco_reads_uncompressed() {
    let mut builder = AssetBuilder::new();
    let compressed = builder.view(&[0xd7; 16], None);
    let position = builder.floats(&TRIANGLE, "VEC3");
    let document = scene_of_meshes(json!([{"primitives": [{
        "attributes": {"POSITION": position},
        "extensions": {"KHR_draco_mesh_compression": {"bufferView": compressed, "attributes": {"POSITION": 0}}}
    }]}]));

    let gltf = parse_default(&builder.glb(document));
    let scene = gltf.scene.unwrap();
    let geometry = &scene.children[0].mesh().unwrap().geometry;
    assert_eq!(geometry.attribute("position").unwrap().to_f32_vec(), TRIANGLE.to_vec());
}

#[test]
fn test_unlit_material() {
    let mut builder = AssetBuilder::new();
    let mut document = with_material(
        &mut builder,
        json!({
            "name": "Flat",
            "pbrMetallicRoughness": {"baseColorFactor": [0.2, 0.4, 0.6, 0.5]},
            "emissiveFactor": [1.0, 1.0, 1.0],
            "alphaMode": "BLEND",
            "extensions": {"KHR_materials_unlit": {}}
        }),
    );
    document["extensionsUsed"] = json!(["KHR_materials_unlit"]);
    let gltf = parse_default(&builder.glb(document));

    let material = single_material(&gltf);
    assert_eq!(material.name, "Flat");
    assert_eq!(material.material_type, MaterialType::Basic);
    assert_eq!(material.color, [0.2, 0.4, 0.6]);
    assert_eq!(material.opacity, 0.5);
    assert!(material.transparent);
    assert!(!material.lights);
    // Emission is ignored by unlit shading.
    assert_eq!(material.emissive, [0.0, 0.0, 0.0]);
    assert_eq!(material.normal_scale, None);
    assert!(material.user_data.get("gltfExtensions").is_none());
}

#[test]
fn test_undeclared_material_extension_is_preserved() {
    let mut builder = AssetBuilder::new();
    let document = with_material(
        &mut builder,
        json!({"extensions": {"KHR_materials_unlit": {}}, "alphaMode": "MASK"}),
    );
    let gltf = parse_default(&builder.glb(document));

    let material = single_material(&gltf);
    assert_eq!(material.material_type, MaterialType::Standard);
    assert_eq!(material.alpha_test, 0.5);
    assert_eq!(material.user_data["gltfExtensions"], json!({"KHR_materials_unlit": {}}));
}

#[test]
fn test_specular_glossiness_material() {
    let mut builder = AssetBuilder::new();
    let mut document = with_material(
        &mut builder,
        json!({
            "doubleSided": true,
            "extensions": {"KHR_materials_pbrSpecularGlossiness": {
                "diffuseFactor": [0.5, 0.5, 0.5, 1.0],
                "specularFactor": [0.1, 0.2, 0.3],
                "glossinessFactor": 0.3
            }}
        }),
    );
    document["extensionsUsed"] = json!(["KHR_materials_pbrSpecularGlossiness"]);
    let gltf = parse_default(&builder.glb(document));

    let scene = gltf.scene.as_ref().unwrap();
    let mesh = scene.children[0].mesh().unwrap();
    let material = single_material(&gltf);
    assert_eq!(material.material_type, MaterialType::SpecularGlossiness);
    assert_eq!(material.glossiness, 0.3);
    assert_eq!(material.specular, [0.1, 0.2, 0.3]);
    assert!(material.flat_shading);

    let refresh = mesh.on_before_render.as_ref().expect("refresh callback");
    let mut uniforms = ShaderUniforms::default();
    refresh.call(&material, &mut uniforms);
    assert_eq!(uniforms.diffuse, [0.5, 0.5, 0.5]);
    assert_eq!(uniforms.glossiness, 0.3);
    assert_eq!(uniforms.refraction_ratio, 0.98);
}

fn textured_document(builder: &mut AssetBuilder, image: Value) -> Value {
    let mut document = with_material(
        builder,
        json!({
            "pbrMetallicRoughness": {
                "baseColorTexture": {"index": 0},
                "metallicRoughnessTexture": {"index": 0}
            },
            "normalTexture": {"index": 0, "scale": 2.0},
            "occlusionTexture": {"index": 0, "strength": 0.5}
        }),
    );
    document["textures"] = json!([{"name": "Albedo", "source": 0, "sampler": 0}]);
    document["samplers"] = json!([{"magFilter": 9728, "wrapS": 33071}]);
    document["images"] = json!([image]);
    document
}

#[test]
fn test_texture_is_decoded_once() {
    let mut builder = AssetBuilder::new();
    let image = builder.view(&[7, 1, 2, 3], None);
    let document = textured_document(&mut builder, json!({"bufferView": image, "mimeType": "image/png"}));
    let decoder = rc_texture_decoder();
    let loader = GltfLoader::new().with_texture_decoder(decoder.clone());
    let gltf = parse(&loader, &builder.glb(document)).unwrap();

    assert_eq!(decoder.calls.get(), 1);
    assert_eq!(*decoder.mime_types.borrow(), vec![Some("image/png".to_string())]);

    let material = single_material(&gltf);
    let map = material.map.as_ref().unwrap();
    let normal_map = material.normal_map.as_ref().unwrap();
    let metalness_map = material.metalness_map.as_ref().unwrap();
    assert_eq!(map.id, normal_map.id);
    assert!(Rc::ptr_eq(normal_map, metalness_map));
    assert!(Rc::ptr_eq(normal_map, material.roughness_map.as_ref().unwrap()));

    assert_eq!(map.encoding, Encoding::Srgb);
    assert_eq!(normal_map.encoding, Encoding::Linear);
    assert_eq!(map.name, "Albedo");
    assert_eq!(map.format, TextureFormat::Rgba);
    assert_eq!(map.image.data, vec![7; 4]);
    assert!(!map.flip_y);
    assert_eq!(map.mag_filter, Filter::Nearest);
    assert_eq!(map.min_filter, Filter::LinearMipMapLinear);
    assert_eq!(map.wrap_s, Wrapping::ClampToEdge);
    assert_eq!(map.wrap_t, Wrapping::Repeat);

    assert_eq!(material.normal_scale, Some([2.0, -2.0]));
    assert_eq!(material.ao_map_intensity, 0.5);
}

#[test]
fn test_occlusion_map_adds_uv2() {
    let mut builder = AssetBuilder::new();
    let image = builder.view(&[9], None);
    let mut document = textured_document(&mut builder, json!({"bufferView": image, "mimeType": "image/png"}));
    let uv = builder.floats(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0], "VEC2");
    document["meshes"][0]["primitives"][0]["attributes"]["TEXCOORD_0"] = json!(uv);
    let loader = GltfLoader::new().with_texture_decoder(rc_texture_decoder());
    let gltf = parse(&loader, &builder.glb(document)).unwrap();

    let scene = gltf.scene.unwrap();
    let geometry = &scene.children[0].mesh().unwrap().geometry;
    let uv = geometry.attribute("uv").unwrap();
    let uv2 = geometry.attribute("uv2").unwrap();
    assert!(uv.ptr_eq(uv2));
}

#[test]
fn test_data_uri_image_supplies_mime_type() {
    let mut builder = AssetBuilder::new();
    let uri = format!("data:image/jpeg;base64,{}", STANDARD.encode([42u8, 0, 0]));
    let document = textured_document(&mut builder, json!({"uri": uri}));
    let decoder = rc_texture_decoder();
    let loader = GltfLoader::new().with_texture_decoder(decoder.clone());
    let gltf = parse(&loader, &builder.glb(document)).unwrap();

    assert_eq!(*decoder.mime_types.borrow(), vec![Some("image/jpeg".to_string())]);
    assert_eq!(single_material(&gltf).map.as_ref().unwrap().format, TextureFormat::Rgb);
}

#[test]
fn test_texture_without_decoder() {
    let mut builder = AssetBuilder::new();
    let image = builder.view(&[7], None);
    let document = textured_document(&mut builder, json!({"bufferView": image}));
    let err = parse(&GltfLoader::new(), &builder.glb(document)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_texture_decode_failure() {
    let mut builder = AssetBuilder::new();
    let image = builder.view(&[], None);
    let document = textured_document(&mut builder, json!({"bufferView": image}));
    let loader = GltfLoader::new().with_texture_decoder(rc_texture_decoder());
    let err = parse(&loader, &builder.glb(document)).unwrap_err();
    assert!(matches!(err, GltfError::TextureDecode(_)), "{err}");
}

#[test]
fn test_dds_source_takes_precedence() {
    let mut builder = AssetBuilder::new();
    let png = builder.view(&[1], None);
    let dds = builder.view(&[2], None);
    let mut document = textured_document(&mut builder, json!({"bufferView": png, "mimeType": "image/png"}));
    document["images"] = json!([
        {"bufferView": png, "mimeType": "image/png"},
        {"bufferView": dds, "mimeType": "image/vnd-ms.dds"}
    ]);
    document["textures"][0]["extensions"] = json!({"MSFT_texture_dds": {"source": 1}});
    document["extensionsUsed"] = json!(["MSFT_texture_dds"]);

    let images = rc_texture_decoder();
    let dds_images = rc_texture_decoder();
    let loader = GltfLoader::new()
        .with_texture_decoder(images.clone())
        .with_dds_decoder(dds_images.clone());
    let gltf = parse(&loader, &builder.glb(document)).unwrap();

    assert_eq!(images.calls.get(), 0);
    assert_eq!(dds_images.calls.get(), 1);
    assert_eq!(single_material(&gltf).map.as_ref().unwrap().image.data, vec![2; 4]);
}
