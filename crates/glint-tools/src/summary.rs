//! Human-readable report of a parsed asset.

use std::io::{self, Write};

use glint_core::object::{Camera, MeshMaterial, Object3D, ObjectKind};
use glint_io::Gltf;

fn kind_label(object: &Object3D) -> String {
    match &object.kind {
        ObjectKind::Object => "object".into(),
        ObjectKind::Group => "group".into(),
        ObjectKind::Scene => "scene".into(),
        ObjectKind::Bone => "bone".into(),
        ObjectKind::Mesh(mesh) => format!("{:?}", mesh.kind).to_lowercase(),
        ObjectKind::Camera(Camera::Perspective { .. }) => "perspective camera".into(),
        ObjectKind::Camera(Camera::Orthographic { .. }) => "orthographic camera".into(),
        ObjectKind::Light(light) => format!("{:?} light", light.kind).to_lowercase(),
    }
}

fn write_node(out: &mut impl Write, object: &Object3D, depth: usize) -> io::Result<()> {
    let indent = "  ".repeat(depth);
    let name = if object.name.is_empty() { "<unnamed>" } else { object.name.as_str() };
    write!(out, "{}- {} [{}]", indent, name, kind_label(object))?;

    if let Some(mesh) = object.mesh() {
        let materials: Vec<String> = match &mesh.material {
            MeshMaterial::Single(material) => vec![material.name.clone()],
            MeshMaterial::Multi(materials) => materials.iter().map(|m| m.name.clone()).collect(),
        };
        write!(
            out,
            " vertices={} elements={} materials=[{}]",
            mesh.geometry.vertex_count(),
            mesh.geometry.draw_count(),
            materials.join(", ")
        )?;
        if let Some(skeleton) = &mesh.skeleton {
            write!(out, " bones={}", skeleton.bones.len())?;
        }
        if !mesh.morph_target_influences.is_empty() {
            write!(out, " morph_targets={}", mesh.morph_target_influences.len())?;
        }
    }
    writeln!(out)?;

    for child in &object.children {
        write_node(out, child, depth + 1)?;
    }
    Ok(())
}

/// Writes asset metadata, every scene's node tree, cameras and animations.
pub fn write_summary(out: &mut impl Write, gltf: &Gltf) -> io::Result<()> {
    if let Some(asset) = &gltf.asset {
        write!(out, "asset: glTF {}", asset.version)?;
        if let Some(generator) = &asset.generator {
            write!(out, " ({})", generator)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "scenes: {}", gltf.scenes.len())?;
    for scene in &gltf.scenes {
        let default = gltf
            .scene
            .as_ref()
            .map_or(false, |selected| selected.id == scene.id);
        let name = if scene.name.is_empty() { "<unnamed>" } else { scene.name.as_str() };
        writeln!(out, "scene {}{}", name, if default { " (default)" } else { "" })?;
        for child in &scene.children {
            write_node(out, child, 1)?;
        }
    }

    writeln!(out, "cameras: {}", gltf.cameras.len())?;
    writeln!(out, "animations: {}", gltf.animations.len())?;
    for clip in &gltf.animations {
        writeln!(out, "  {} {:.2}s tracks={}", clip.name, clip.duration, clip.tracks.len())?;
        for track in &clip.tracks {
            writeln!(out, "    {} {:?} keys={}", track.name, track.interpolation, track.times.len())?;
        }
    }
    Ok(())
}
