mod common;

use common::*;
use glam::Quat;
use glint_core::animation::{Interpolation, TrackKind};
use serde_json::{json, Value};

fn assert_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-5, "{actual:?} vs {expected:?}");
    }
}

/// One node named `Mover` animated by the given sampler output.
fn animated_node(builder: &mut AssetBuilder, path: &str, output: usize, interpolation: &str) -> Value {
    let input = builder.floats(&[0.0, 1.0], "SCALAR");
    json!({
        "scenes": [{"nodes": [0]}],
        "nodes": [{"name": "Mover"}],
        "animations": [{
            "name": "Move",
            "channels": [{"sampler": 0, "target": {"node": 0, "path": path}}],
            "samplers": [{"input": input, "output": output, "interpolation": interpolation}]
        }]
    })
}

#[test]
fn test_cubic_spline_translation() {
    let mut builder = AssetBuilder::new();
    #[rustfmt::skip]
    let output = builder.floats(&[
        0.0, 0.0, 0.0,  0.0, 0.0, 0.0,  0.0, 0.0, 0.0,
        0.0, 0.0, 0.0,  2.0, 0.0, 0.0,  0.0, 0.0, 0.0,
    ], "VEC3");
    let document = animated_node(&mut builder, "translation", output, "CUBICSPLINE");
    let gltf = parse_default(&builder.glb(document));

    let clip = &gltf.animations[0];
    assert_eq!(clip.name, "Move");
    assert_eq!(clip.duration, 1.0);

    let track = &clip.tracks[0];
    assert_eq!(track.name, "Mover.position");
    assert_eq!(track.kind, TrackKind::Vector);
    assert_eq!(track.interpolation, Interpolation::CubicSpline);
    assert_eq!(track.value_size(), 9);

    assert_close(&track.evaluate(0.0), &[0.0, 0.0, 0.0]);
    assert_close(&track.evaluate(0.25), &[0.3125, 0.0, 0.0]);
    assert_close(&track.evaluate(0.5), &[1.0, 0.0, 0.0]);
    assert_close(&track.evaluate(2.0), &[2.0, 0.0, 0.0]);

    assert!(gltf.scene.unwrap().children[0].matrix_auto_update);
}

#[test]
fn test_linear_rotation_slerps() {
    let mut builder = AssetBuilder::new();
    let quarter = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
    let output = builder.floats(&[Quat::IDENTITY.to_array(), quarter.to_array()].concat(), "VEC4");
    let document = animated_node(&mut builder, "rotation", output, "LINEAR");
    let gltf = parse_default(&builder.glb(document));

    let track = &gltf.animations[0].tracks[0];
    assert_eq!(track.name, "Mover.quaternion");
    assert_eq!(track.kind, TrackKind::Quaternion);
    let eighth = Quat::from_rotation_z(std::f32::consts::FRAC_PI_4);
    assert_close(&track.evaluate(0.5), &eighth.to_array());
}

#[test]
fn test_step_interpolation() {
    let mut builder = AssetBuilder::new();
    let output = builder.floats(&[1.0, 1.0, 1.0, 3.0, 3.0, 3.0], "VEC3");
    let document = animated_node(&mut builder, "scale", output, "STEP");
    let gltf = parse_default(&builder.glb(document));

    let track = &gltf.animations[0].tracks[0];
    assert_eq!(track.name, "Mover.scale");
    assert_eq!(track.interpolation, Interpolation::Discrete);
    assert_close(&track.evaluate(0.99), &[1.0, 1.0, 1.0]);
    assert_close(&track.evaluate(1.0), &[3.0, 3.0, 3.0]);
}

#[test]
fn test_unknown_paths_are_skipped() {
    let mut builder = AssetBuilder::new();
    let output = builder.floats(&[0.0, 1.0], "SCALAR");
    let mut document = animated_node(&mut builder, "pointer", output, "LINEAR");
    document["animations"][0]["name"] = Value::Null;
    let gltf = parse_default(&builder.glb(document));

    let clip = &gltf.animations[0];
    assert_eq!(clip.name, "animation_0");
    assert!(clip.tracks.is_empty());
    assert_eq!(clip.duration, 0.0);
}

#[test]
fn test_morph_weights() {
    let mut builder = AssetBuilder::new();
    let position = builder.floats(&TRIANGLE, "VEC3");
    let offset = builder.floats(&[0.0f32, 0.0, 1.0].repeat(3), "VEC3");
    let input = builder.floats(&[0.0, 1.0], "SCALAR");
    let output = builder.floats(&[0.0, 1.0], "SCALAR");
    let data = builder.glb(json!({
        "scenes": [{"nodes": [0]}],
        "nodes": [{"name": "Face", "mesh": 0}],
        "meshes": [{
            "primitives": [{"attributes": {"POSITION": position}, "targets": [{"POSITION": offset}]}],
            "weights": [0.25],
            "extras": {"targetNames": ["Smile"]}
        }],
        "animations": [{
            "channels": [{"sampler": 0, "target": {"node": 0, "path": "weights"}}],
            "samplers": [{"input": input, "output": output}]
        }]
    }));
    let gltf = parse_default(&data);

    let scene = gltf.scene.unwrap();
    let mesh = scene.children[0].mesh().unwrap();
    assert_eq!(mesh.morph_target_influences, vec![0.25]);
    assert_eq!(mesh.morph_target_dictionary.get("Smile"), Some(&0));
    let morph = &mesh.geometry.morph_attributes["position"][0];
    assert_close(&morph.to_f32_vec(), &[0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0]);

    let track = &gltf.animations[0].tracks[0];
    assert_eq!(track.name, "Face.morphTargetInfluences");
    assert_eq!(track.kind, TrackKind::Number);
    assert_close(&track.evaluate(0.5), &[0.5]);
}
