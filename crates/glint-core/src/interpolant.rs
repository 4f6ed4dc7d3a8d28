//! Keyframe interpolation.
//!
//! An [`Interpolant`] samples a keyframe track at an arbitrary time. The
//! shared [`Interpolant::evaluate`] finds the surrounding keyframes and
//! delegates to the implementation; outside the keyframe range it returns
//! the boundary keyframe's value.
//!
//! # Example
//!
//! ```ignore
//! use glint_core::interpolant::{CubicSplineInterpolant, Interpolant};
//!
//! // One scalar channel: in-tangent, value, out-tangent per keyframe.
//! let times = [0.0, 1.0];
//! let values = [0.0, 0.0, 1.0, 1.0, 2.0, 0.0];
//! let spline = CubicSplineInterpolant::new(&times, &values, 1);
//! assert_eq!(spline.evaluate(1.0), vec![2.0]);
//! ```

use glam::Quat;

pub trait Interpolant {
    /// Keyframe times, ascending.
    fn times(&self) -> &[f32];

    /// Number of components produced per sample.
    fn value_size(&self) -> usize;

    /// Writes the stored value of keyframe `index` into `result`.
    fn copy_sample_value(&self, index: usize, result: &mut [f32]);

    /// Interpolates between keyframes `i1 - 1` (at `t0`) and `i1` (at `t1`).
    fn interpolate(&self, i1: usize, t0: f32, t: f32, t1: f32, result: &mut [f32]);

    fn before_start(&self, index: usize, result: &mut [f32]) {
        self.copy_sample_value(index, result);
    }

    fn after_end(&self, index: usize, result: &mut [f32]) {
        self.copy_sample_value(index, result);
    }

    /// Samples the track at time `t`.
    fn evaluate(&self, t: f32) -> Vec<f32> {
        let times = self.times();
        let mut result = vec![0.0; self.value_size()];
        if times.is_empty() {
            return result;
        }

        let i1 = times.partition_point(|&time| time <= t);
        if i1 == 0 {
            self.before_start(0, &mut result);
        } else if i1 == times.len() {
            self.after_end(times.len() - 1, &mut result);
        } else {
            self.interpolate(i1, times[i1 - 1], t, times[i1], &mut result);
        }
        result
    }
}

fn copy_value(values: &[f32], offset: usize, result: &mut [f32]) {
    for (i, slot) in result.iter_mut().enumerate() {
        *slot = values.get(offset + i).copied().unwrap_or_default();
    }
}

/// Component-wise linear interpolation.
pub struct LinearInterpolant<'a> {
    times: &'a [f32],
    values: &'a [f32],
    value_size: usize,
}

impl<'a> LinearInterpolant<'a> {
    pub fn new(times: &'a [f32], values: &'a [f32], value_size: usize) -> Self {
        Self {
            times,
            values,
            value_size,
        }
    }
}

impl Interpolant for LinearInterpolant<'_> {
    fn times(&self) -> &[f32] {
        self.times
    }

    fn value_size(&self) -> usize {
        self.value_size
    }

    fn copy_sample_value(&self, index: usize, result: &mut [f32]) {
        copy_value(self.values, index * self.value_size, result);
    }

    fn interpolate(&self, i1: usize, t0: f32, t: f32, t1: f32, result: &mut [f32]) {
        let offset1 = i1 * self.value_size;
        let offset0 = offset1 - self.value_size;
        let weight1 = (t - t0) / (t1 - t0);
        let weight0 = 1.0 - weight1;
        for (i, slot) in result.iter_mut().enumerate() {
            let v0 = self.values.get(offset0 + i).copied().unwrap_or_default();
            let v1 = self.values.get(offset1 + i).copied().unwrap_or_default();
            *slot = v0 * weight0 + v1 * weight1;
        }
    }
}

/// Spherical linear interpolation of `[x, y, z, w]` quaternions.
pub struct QuaternionLinearInterpolant<'a> {
    times: &'a [f32],
    values: &'a [f32],
}

impl<'a> QuaternionLinearInterpolant<'a> {
    pub fn new(times: &'a [f32], values: &'a [f32]) -> Self {
        Self { times, values }
    }

    fn quaternion(&self, index: usize) -> Quat {
        let mut q = [0.0; 4];
        copy_value(self.values, index * 4, &mut q);
        Quat::from_array(q)
    }
}

impl Interpolant for QuaternionLinearInterpolant<'_> {
    fn times(&self) -> &[f32] {
        self.times
    }

    fn value_size(&self) -> usize {
        4
    }

    fn copy_sample_value(&self, index: usize, result: &mut [f32]) {
        copy_value(self.values, index * 4, result);
    }

    fn interpolate(&self, i1: usize, t0: f32, t: f32, t1: f32, result: &mut [f32]) {
        let alpha = (t - t0) / (t1 - t0);
        let q = self.quaternion(i1 - 1).slerp(self.quaternion(i1), alpha);
        result.copy_from_slice(&q.to_array());
    }
}

/// Step interpolation: holds each keyframe's value until the next one.
pub struct DiscreteInterpolant<'a> {
    times: &'a [f32],
    values: &'a [f32],
    value_size: usize,
}

impl<'a> DiscreteInterpolant<'a> {
    pub fn new(times: &'a [f32], values: &'a [f32], value_size: usize) -> Self {
        Self {
            times,
            values,
            value_size,
        }
    }
}

impl Interpolant for DiscreteInterpolant<'_> {
    fn times(&self) -> &[f32] {
        self.times
    }

    fn value_size(&self) -> usize {
        self.value_size
    }

    fn copy_sample_value(&self, index: usize, result: &mut [f32]) {
        copy_value(self.values, index * self.value_size, result);
    }

    fn interpolate(&self, i1: usize, _t0: f32, _t: f32, _t1: f32, result: &mut [f32]) {
        self.copy_sample_value(i1 - 1, result);
    }
}

/// Hermite spline interpolation over glTF CUBICSPLINE output, laid out as
/// `[in_tangent, value, out_tangent]` per keyframe.
pub struct CubicSplineInterpolant<'a> {
    times: &'a [f32],
    values: &'a [f32],
    value_size: usize,
}

impl<'a> CubicSplineInterpolant<'a> {
    /// `value_size` is the size of one value, a third of a keyframe's
    /// output stride.
    pub fn new(times: &'a [f32], values: &'a [f32], value_size: usize) -> Self {
        Self {
            times,
            values,
            value_size,
        }
    }

    fn value(&self, index: usize) -> f32 {
        self.values.get(index).copied().unwrap_or_default()
    }
}

impl Interpolant for CubicSplineInterpolant<'_> {
    fn times(&self) -> &[f32] {
        self.times
    }

    fn value_size(&self) -> usize {
        self.value_size
    }

    fn copy_sample_value(&self, index: usize, result: &mut [f32]) {
        let offset = index * self.value_size * 3 + self.value_size;
        copy_value(self.values, offset, result);
    }

    fn interpolate(&self, i1: usize, t0: f32, t: f32, t1: f32, result: &mut [f32]) {
        let stride = self.value_size;
        let stride2 = stride * 2;
        let stride3 = stride * 3;

        let td = t1 - t0;
        let p = (t - t0) / td;
        let pp = p * p;
        let ppp = pp * p;

        let offset1 = i1 * stride3;
        let offset0 = offset1 - stride3;

        let s0 = 2.0 * ppp - 3.0 * pp + 1.0;
        let s1 = ppp - 2.0 * pp + p;
        let s2 = -2.0 * ppp + 3.0 * pp;
        let s3 = ppp - pp;

        for (i, slot) in result.iter_mut().enumerate() {
            let p0 = self.value(offset0 + i + stride);
            let m0 = self.value(offset0 + i + stride2) * td;
            let p1 = self.value(offset1 + i + stride);
            let m1 = self.value(offset1 + i) * td;
            *slot = s0 * p0 + s1 * m0 + s2 * p1 + s3 * m1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two keyframes of a vec2: in, value, out.
    const TIMES: [f32; 2] = [0.0, 2.0];
    const SPLINE: [f32; 12] = [
        9.0, 9.0, 1.0, 2.0, 0.5, 0.5, //
        -0.5, -0.5, 3.0, 4.0, 9.0, 9.0,
    ];

    #[test]
    fn test_cubic_spline_hits_keyframes() {
        let spline = CubicSplineInterpolant::new(&TIMES, &SPLINE, 2);
        assert_eq!(spline.evaluate(0.0), vec![1.0, 2.0]);
        assert_eq!(spline.evaluate(2.0), vec![3.0, 4.0]);
    }

    #[test]
    fn test_cubic_spline_clamps_outside_range() {
        let spline = CubicSplineInterpolant::new(&TIMES, &SPLINE, 2);
        assert_eq!(spline.evaluate(-1.0), vec![1.0, 2.0]);
        assert_eq!(spline.evaluate(5.0), vec![3.0, 4.0]);
    }

    #[test]
    fn test_cubic_spline_midpoint() {
        let spline = CubicSplineInterpolant::new(&TIMES, &SPLINE, 2);
        // p = 0.5: s0 = 0.5, s1 = 0.125, s2 = 0.5, s3 = -0.125, td = 2
        let x = 0.5 * 1.0 + 0.125 * (0.5 * 2.0) + 0.5 * 3.0 - 0.125 * (-0.5 * 2.0);
        let result = spline.evaluate(1.0);
        assert!((result[0] - x).abs() < 1e-6);
    }

    #[test]
    fn test_linear_midpoint() {
        let values = [0.0, 10.0, 10.0, 20.0];
        let linear = LinearInterpolant::new(&TIMES, &values, 2);
        assert_eq!(linear.evaluate(1.0), vec![5.0, 15.0]);
        assert_eq!(linear.evaluate(3.0), vec![10.0, 20.0]);
    }

    #[test]
    fn test_discrete_holds_value() {
        let values = [1.0, 2.0];
        let step = DiscreteInterpolant::new(&TIMES, &values, 1);
        assert_eq!(step.evaluate(1.9), vec![1.0]);
        assert_eq!(step.evaluate(2.0), vec![2.0]);
    }

    #[test]
    fn test_quaternion_slerp() {
        let half = std::f32::consts::FRAC_1_SQRT_2;
        let values = [0.0, 0.0, 0.0, 1.0, 0.0, half, 0.0, half];
        let slerp = QuaternionLinearInterpolant::new(&TIMES, &values);
        let q = Quat::from_array(slerp.evaluate(1.0).try_into().unwrap());
        let expected = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4);
        assert!(q.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn test_empty_track() {
        let linear = LinearInterpolant::new(&[], &[], 3);
        assert_eq!(linear.evaluate(0.5), vec![0.0, 0.0, 0.0]);
    }
}
