//! Animation clips.

use std::rc::Rc;

use futures::future::{try_join3, try_join_all};
use glint_core::animation::{AnimationClip, Interpolation, KeyframeTrack, TrackKind};
use glint_core::object::Object3D;
use glint_core::status::{resolve, GltfError, Result};

use super::{DependencyType, GltfParser};
use crate::document::{AnimationSamplerDef, ChannelDef};

/// Animated property and track kind for a channel path.
fn channel_property(path: &str) -> Option<(&'static str, TrackKind)> {
    match path {
        "translation" => Some(("position", TrackKind::Vector)),
        "rotation" => Some(("quaternion", TrackKind::Quaternion)),
        "scale" => Some(("scale", TrackKind::Vector)),
        "weights" => Some(("morphTargetInfluences", TrackKind::Number)),
        _ => None,
    }
}

fn interpolation(sampler: &AnimationSamplerDef) -> Interpolation {
    match sampler.interpolation.as_deref() {
        None | Some("LINEAR") => Interpolation::Linear,
        Some("STEP") => Interpolation::Discrete,
        Some("CUBICSPLINE") => Interpolation::CubicSpline,
        Some(other) => {
            log::warn!("Unknown interpolation \"{}\", using LINEAR", other);
            Interpolation::Linear
        }
    }
}

/// Names of the objects a channel animates. Morph weights drive every mesh
/// with morph targets in the node's subtree.
fn target_names(node: &Object3D, kind: TrackKind) -> Vec<String> {
    if kind != TrackKind::Number {
        return vec![node.target_name()];
    }
    let mut names = Vec::new();
    node.traverse(&mut |object| {
        if object.mesh().map_or(false, |mesh| !mesh.morph_target_influences.is_empty()) {
            names.push(object.target_name());
        }
    });
    names
}

impl GltfParser {
    pub(super) async fn load_animation(self: Rc<Self>, index: usize) -> Result<Rc<AnimationClip>> {
        let animation_def = resolve(&self.document.animations, index, "animation")?;

        let channels: Vec<(&ChannelDef, &AnimationSamplerDef, usize, &'static str, TrackKind)> = animation_def
            .channels
            .iter()
            .filter_map(|channel| {
                let sampler = animation_def.samplers.get(channel.sampler)?;
                let node = channel.target.node?;
                match channel_property(&channel.target.path) {
                    Some((property, kind)) => Some((channel, sampler, node, property, kind)),
                    None => {
                        log::warn!("Unknown animation path \"{}\", skipping channel", channel.target.path);
                        None
                    }
                }
            })
            .collect();

        let loads = channels.iter().map(|&(_, sampler, node, _, _)| {
            let node = self.get_dependency(DependencyType::Node, node);
            let input = self.accessor(sampler.input);
            let output = self.accessor(sampler.output);
            async move { try_join3(async { node.await?.object() }, input, output).await }
        });
        let loaded = try_join_all(loads).await?;

        let mut tracks = Vec::new();
        for ((_, sampler, _, property, kind), (node, input, output)) in channels.into_iter().zip(loaded) {
            let missing = |what: &str| GltfError::invalid_definition("animation", index, format!("sampler {} has no data", what));
            let times = input.ok_or_else(|| missing("input"))?.to_f32_vec();
            let values = output.ok_or_else(|| missing("output"))?.to_f32_vec();
            let interpolation = interpolation(sampler);

            for target in target_names(&node, kind) {
                tracks.push(KeyframeTrack::new(
                    format!("{}.{}", target, property),
                    kind,
                    times.clone(),
                    values.clone(),
                    interpolation,
                ));
            }
        }

        let name = animation_def
            .name
            .clone()
            .unwrap_or_else(|| format!("animation_{}", index));
        log::debug!("Animation {} has {} track(s)", name, tracks.len());
        Ok(Rc::new(AnimationClip::new(name, tracks)))
    }
}
