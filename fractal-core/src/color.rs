use glam::Vec4;

use crate::types::Color;

/// One colour stop of a [`Gradient`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientKey {
    /// Position of the stop in `[0, 1]`.
    pub time: f32,
    pub color: Color,
}

/// A piecewise-linear colour gradient.
///
/// Keys are kept sorted by `time`. Evaluating before the first key or after
/// the last one clamps to that key's colour.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    keys: Vec<GradientKey>,
}

impl Gradient {
    /// Builds a gradient from arbitrary keys.
    ///
    /// Key times are clamped into `[0, 1]` and sorted. An empty key list
    /// yields a gradient that evaluates to opaque white.
    pub fn new(keys: impl IntoIterator<Item = GradientKey>) -> Self {
        let mut keys: Vec<GradientKey> = keys
            .into_iter()
            .map(|k| GradientKey {
                time: k.time.clamp(0.0, 1.0),
                color: k.color,
            })
            .collect();
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    /// A two-stop gradient running from `start` at `0` to `end` at `1`.
    pub fn linear(start: Color, end: Color) -> Self {
        Self::new([
            GradientKey {
                time: 0.0,
                color: start,
            },
            GradientKey {
                time: 1.0,
                color: end,
            },
        ])
    }

    pub fn keys(&self) -> &[GradientKey] {
        &self.keys
    }

    /// Samples the gradient at `t`, clamped into `[0, 1]`.
    pub fn evaluate(&self, t: f32) -> Color {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Vec4::ONE,
        };

        let t = t.clamp(0.0, 1.0);
        if t <= first.time {
            return first.color;
        }
        if t >= last.time {
            return last.color;
        }

        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.time {
                let span = b.time - a.time;
                if span <= 0.0 {
                    return b.color;
                }
                return a.color.lerp(b.color, (t - a.time) / span);
            }
        }
        last.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_gradient_interpolates_between_ends() {
        let g = Gradient::linear(Vec4::ZERO, Vec4::ONE);

        assert_eq!(g.evaluate(0.0), Vec4::ZERO);
        assert_eq!(g.evaluate(1.0), Vec4::ONE);
        assert!(g.evaluate(0.25).abs_diff_eq(Vec4::splat(0.25), 1e-6));
    }

    #[test]
    fn evaluate_clamps_outside_unit_range() {
        let g = Gradient::linear(Vec4::new(1.0, 0.0, 0.0, 1.0), Vec4::new(0.0, 0.0, 1.0, 1.0));

        assert_eq!(g.evaluate(-3.0), Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(g.evaluate(7.5), Vec4::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn keys_are_sorted_and_inner_stops_respected() {
        let red = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let green = Vec4::new(0.0, 1.0, 0.0, 1.0);
        let blue = Vec4::new(0.0, 0.0, 1.0, 1.0);

        let g = Gradient::new([
            GradientKey { time: 1.0, color: blue },
            GradientKey { time: 0.0, color: red },
            GradientKey { time: 0.5, color: green },
        ]);

        let times: Vec<f32> = g.keys().iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 0.5, 1.0]);
        assert_eq!(g.evaluate(0.5), green);
        assert!(g.evaluate(0.75).abs_diff_eq(green.lerp(blue, 0.5), 1e-6));
    }

    #[test]
    fn empty_gradient_is_white() {
        let keys: [GradientKey; 0] = [];
        let g = Gradient::new(keys);
        assert_eq!(g.evaluate(0.3), Vec4::ONE);
    }
}
