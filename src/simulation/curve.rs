//! Keyframed response curves
//!
//! Used for the normalized horsepower curve and the speed-dependent
//! steering curve. Keys are stored by time so lookups are a range query.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Bound;

/// A single curve key with Hermite tangents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub in_tangent: f32,
    #[serde(default)]
    pub out_tangent: f32,
}

impl Keyframe {
    pub fn new(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }

    /// Key whose in and out tangents are equal
    pub fn smooth(time: f32, value: f32, tangent: f32) -> Self {
        Self::new(time, value, tangent, tangent)
    }
}

/// Cubic Hermite curve over sorted keyframes
///
/// Evaluation clamps to the first/last key outside the key range and an
/// empty curve evaluates to 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Keyframe>", into = "Vec<Keyframe>")]
pub struct Curve {
    keys: BTreeMap<OrderedFloat<f32>, Keyframe>,
}

impl Curve {
    pub fn new(keys: impl IntoIterator<Item = Keyframe>) -> Self {
        Self {
            keys: keys
                .into_iter()
                .filter(|key| key.time.is_finite())
                .map(|key| (OrderedFloat(key.time), key))
                .collect(),
        }
    }

    /// Piecewise linear curve through `(time, value)` points
    pub fn linear(points: &[(f32, f32)]) -> Self {
        let mut sorted = points.to_vec();
        sorted.sort_by_key(|(time, _)| OrderedFloat(*time));

        let slope = |i: usize| -> f32 {
            let (t0, v0) = sorted[i];
            let (t1, v1) = sorted[i + 1];
            if t1 > t0 {
                (v1 - v0) / (t1 - t0)
            } else {
                0.0
            }
        };

        let keys = (0..sorted.len()).map(|i| {
            let (time, value) = sorted[i];
            let in_tangent = if i > 0 { slope(i - 1) } else { 0.0 };
            let out_tangent = if i + 1 < sorted.len() { slope(i) } else { 0.0 };
            Keyframe::new(time, value, in_tangent, out_tangent)
        });
        Self::new(keys.collect::<Vec<_>>())
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Keyframe> {
        self.keys.values()
    }

    /// Sample the curve at `time`
    pub fn evaluate(&self, time: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.values().next(), self.keys.values().next_back())
        else {
            return 0.0;
        };
        if time.is_nan() || time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        let t = OrderedFloat(time);
        let left = self.keys.range(..=t).next_back().map(|(_, key)| key);
        let right = self
            .keys
            .range((Bound::Excluded(t), Bound::Unbounded))
            .next()
            .map(|(_, key)| key);

        match (left, right) {
            (Some(left), Some(right)) => hermite(left, right, time),
            (Some(key), None) | (None, Some(key)) => key.value,
            (None, None) => 0.0,
        }
    }
}

fn hermite(left: &Keyframe, right: &Keyframe, time: f32) -> f32 {
    let width = right.time - left.time;
    if width <= f32::EPSILON {
        return left.value;
    }
    let s = (time - left.time) / width;
    let s2 = s * s;
    let s3 = s2 * s;

    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;

    h00 * left.value
        + h10 * width * left.out_tangent
        + h01 * right.value
        + h11 * width * right.in_tangent
}

impl From<Vec<Keyframe>> for Curve {
    fn from(keys: Vec<Keyframe>) -> Self {
        Curve::new(keys)
    }
}

impl From<Curve> for Vec<Keyframe> {
    fn from(curve: Curve) -> Self {
        curve.keys.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_curve_evaluates_to_zero() {
        assert_eq!(Curve::default().evaluate(0.5), 0.0);
    }

    #[test]
    fn test_evaluate_hits_keys_and_clamps() {
        let curve = Curve::new([
            Keyframe::smooth(0.0, 0.0, 1.25),
            Keyframe::smooth(0.9, 1.0, -0.065),
            Keyframe::smooth(1.0, 0.0, 0.0),
        ]);
        assert!((curve.evaluate(0.9) - 1.0).abs() < 1e-6);
        assert_eq!(curve.evaluate(-1.0), 0.0);
        assert_eq!(curve.evaluate(2.0), 0.0);
    }

    #[test]
    fn test_linear_curve_interpolates_midpoint() {
        let curve = Curve::linear(&[(40.0, 0.4), (0.0, 1.0)]);
        assert!((curve.evaluate(20.0) - 0.7).abs() < 1e-5);
        assert_eq!(curve.evaluate(100.0), 0.4);
    }

    #[test]
    fn test_keys_are_sorted_regardless_of_input_order() {
        let curve = Curve::new([
            Keyframe::smooth(1.0, 3.0, 0.0),
            Keyframe::smooth(0.0, 1.0, 0.0),
        ]);
        let times: Vec<f32> = curve.keys().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 1.0]);
    }
}
