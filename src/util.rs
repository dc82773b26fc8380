use std::collections::hash_map::DefaultHasher;
use std::f32::consts::{PI, TAU};
use std::hash::{Hash, Hasher};

use eframe::egui::{Vec2, vec2};

const SEED_RADIUS: f32 = 10.0;

/// Two values in `[-1, 1]` derived from a hash of `id`. Stable across runs.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

/// Offset of the `index`-th point on a phyllotaxis spiral.
///
/// Consecutive indices never coincide, so nodes seeded one after another do
/// not start stacked on the same point.
pub fn phyllotaxis(index: u64) -> Vec2 {
    let golden_angle = PI * (3.0 - 5.0_f32.sqrt());
    let index = index as f32;
    let radius = SEED_RADIUS * (0.5 + index).sqrt();
    let angle = index * golden_angle;
    vec2(angle.cos(), angle.sin()) * radius
}

/// Unit direction used when two points coincide and the real one is undefined.
pub fn coincident_direction(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214 + 0.37) * TAU;
    vec2(angle.cos(), angle.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_pair_is_deterministic_and_bounded() {
        let first = stable_pair("node-7");
        assert_eq!(first, stable_pair("node-7"));
        assert!((-1.0..=1.0).contains(&first.0));
        assert!((-1.0..=1.0).contains(&first.1));
    }

    #[test]
    fn phyllotaxis_points_are_distinct() {
        let points = (0..64).map(phyllotaxis).collect::<Vec<_>>();
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                assert!((*a - *b).length() > 1.0);
            }
        }
    }

    #[test]
    fn coincident_direction_is_unit_length() {
        let direction = coincident_direction(3, 9);
        assert!((direction.length() - 1.0).abs() < 1e-4);
    }
}
