use eframe::egui::{Vec2, vec2};
use serde::{Deserialize, Serialize};

/// Ticks the default decay needs to take alpha from 1 down to `alpha_min`.
const SETTLE_TICKS: f32 = 300.0;

/// Physics constants for the layout engine.
///
/// Missing fields in a config document fall back to the defaults below.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Layout-space point the center and axis forces pull toward.
    pub center: [f32; 2],
    /// Rest length of every link spring.
    pub link_distance: f32,
    /// Fixed spring stiffness. `None` uses `1 / min(degree)` per link.
    pub link_strength: Option<f32>,
    /// Negative values repel.
    pub charge_strength: f32,
    /// Distances below this are clamped before the inverse-square falloff.
    pub charge_distance_min: f32,
    pub center_strength: f32,
    pub axis_strength: f32,
    /// Fraction of velocity kept each tick.
    pub velocity_decay: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    /// Alpha a drag or explicit reheat raises the engine to.
    pub reheat_alpha: f32,
    pub barnes_hut_theta: f32,
    /// Node count above which charge switches to the quadtree approximation.
    pub barnes_hut_threshold: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let alpha_min = 0.001_f32;
        Self {
            center: [0.0, 0.0],
            link_distance: 100.0,
            link_strength: None,
            charge_strength: -300.0,
            charge_distance_min: 1.0,
            center_strength: 1.0,
            axis_strength: 0.1,
            velocity_decay: 0.6,
            alpha_min,
            alpha_decay: 1.0 - alpha_min.powf(1.0 / SETTLE_TICKS),
            reheat_alpha: 0.3,
            barnes_hut_theta: 0.9,
            barnes_hut_threshold: 256,
        }
    }
}

impl SimulationConfig {
    pub fn with_center(mut self, center: Vec2) -> Self {
        self.center = [center.x, center.y];
        self
    }

    pub fn center(&self) -> Vec2 {
        vec2(self.center[0], self.center[1])
    }

    /// Copy with every knob forced into a range the integrator stays stable in.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !self.center[0].is_finite() || !self.center[1].is_finite() {
            self.center = defaults.center;
        }
        self.link_distance = finite_or(self.link_distance, defaults.link_distance).max(0.0);
        self.link_strength = self
            .link_strength
            .filter(|strength| strength.is_finite())
            .map(|strength| strength.clamp(0.0, 2.0));
        self.charge_strength = finite_or(self.charge_strength, defaults.charge_strength);
        self.charge_distance_min =
            finite_or(self.charge_distance_min, defaults.charge_distance_min).max(0.01);
        self.center_strength = finite_or(self.center_strength, defaults.center_strength).clamp(0.0, 1.0);
        self.axis_strength = finite_or(self.axis_strength, defaults.axis_strength).clamp(0.0, 1.0);
        self.velocity_decay = finite_or(self.velocity_decay, defaults.velocity_decay).clamp(0.0, 1.0);
        self.alpha_min = finite_or(self.alpha_min, defaults.alpha_min).clamp(0.0, 1.0);
        self.alpha_decay = finite_or(self.alpha_decay, defaults.alpha_decay).clamp(0.0, 1.0);
        self.reheat_alpha = finite_or(self.reheat_alpha, defaults.reheat_alpha).clamp(0.0, 1.0);
        self.barnes_hut_theta = finite_or(self.barnes_hut_theta, defaults.barnes_hut_theta).max(0.0);
        self
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_decay_settles_in_about_three_hundred_ticks() {
        let config = SimulationConfig::default();
        assert!((config.alpha_decay - 0.0228).abs() < 0.0005);

        let mut alpha = 1.0_f32;
        let mut ticks = 0;
        while alpha > config.alpha_min {
            alpha *= 1.0 - config.alpha_decay;
            ticks += 1;
        }
        assert!((295..=305).contains(&ticks));
    }

    #[test]
    fn partial_document_uses_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{"charge_strength": -120.0}"#).unwrap();
        assert_eq!(config.charge_strength, -120.0);
        assert_eq!(config.link_distance, 100.0);
    }

    #[test]
    fn sanitized_replaces_non_finite_values() {
        let config = SimulationConfig {
            velocity_decay: f32::NAN,
            axis_strength: 7.0,
            ..SimulationConfig::default()
        }
        .sanitized();
        assert_eq!(config.velocity_decay, 0.6);
        assert_eq!(config.axis_strength, 1.0);
    }
}
