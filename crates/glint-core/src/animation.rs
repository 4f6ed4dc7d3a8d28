//! Keyframe tracks and animation clips.

use crate::interpolant::{
    CubicSplineInterpolant, DiscreteInterpolant, Interpolant, LinearInterpolant,
    QuaternionLinearInterpolant,
};

/// Value kind animated by a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    /// Vectors such as position and scale.
    Vector,
    /// Rotations stored as `[x, y, z, w]`.
    Quaternion,
    /// Scalars such as morph target influences.
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    Linear,
    Discrete,
    /// glTF CUBICSPLINE: each keyframe stores in-tangent, value and
    /// out-tangent.
    CubicSpline,
}

/// Keyframes animating one property of one object.
///
/// `name` is the property path, `<target>.<property>` such as
/// `Arm.quaternion` or `Face.morphTargetInfluences[Smile]`.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeTrack {
    pub name: String,
    pub kind: TrackKind,
    pub times: Vec<f32>,
    pub values: Vec<f32>,
    pub interpolation: Interpolation,
}

impl KeyframeTrack {
    pub fn new(
        name: impl Into<String>,
        kind: TrackKind,
        times: Vec<f32>,
        values: Vec<f32>,
        interpolation: Interpolation,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            times,
            values,
            interpolation,
        }
    }

    /// Stored components per keyframe. For cubic-spline tracks this is three
    /// times the size of a sampled value.
    pub fn value_size(&self) -> usize {
        if self.times.is_empty() {
            0
        } else {
            self.values.len() / self.times.len()
        }
    }

    /// Time of the last keyframe.
    pub fn duration(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Splits the track name into target and property path.
    pub fn target_and_property(&self) -> (&str, &str) {
        match self.name.find('.') {
            Some(pos) => (&self.name[..pos], &self.name[pos + 1..]),
            None => ("", self.name.as_str()),
        }
    }

    pub fn create_interpolant(&self) -> Box<dyn Interpolant + '_> {
        let value_size = self.value_size();
        match self.interpolation {
            Interpolation::CubicSpline => Box::new(CubicSplineInterpolant::new(
                &self.times,
                &self.values,
                value_size / 3,
            )),
            Interpolation::Discrete => {
                Box::new(DiscreteInterpolant::new(&self.times, &self.values, value_size))
            }
            Interpolation::Linear if self.kind == TrackKind::Quaternion => {
                Box::new(QuaternionLinearInterpolant::new(&self.times, &self.values))
            }
            Interpolation::Linear => {
                Box::new(LinearInterpolant::new(&self.times, &self.values, value_size))
            }
        }
    }

    /// Samples the track at time `t`.
    pub fn evaluate(&self, t: f32) -> Vec<f32> {
        self.create_interpolant().evaluate(t)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    /// Longest track duration.
    pub duration: f32,
    pub tracks: Vec<KeyframeTrack>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, tracks: Vec<KeyframeTrack>) -> Self {
        let duration = tracks
            .iter()
            .map(KeyframeTrack::duration)
            .fold(0.0, f32::max);
        Self {
            name: name.into(),
            duration,
            tracks,
        }
    }
}
