//! Independent force terms. Each one turns the current node positions into a
//! velocity delta per node; the engine sums them before integrating.
//!
//! Every term tolerates empty input and coincident nodes. Distances are
//! clamped before any division, so no term produces a non-finite delta from
//! finite positions.

use eframe::egui::Vec2;
use tracing::warn;

use crate::util::coincident_direction;

use super::SimulationConfig;
use super::quadtree::ChargeTree;

/// Squared distances at or below this are treated as coincident points.
const COINCIDENT_DISTANCE_SQ: f32 = 1e-12;
/// Length substituted for the separation of coincident points.
const JIGGLE_DISTANCE: f32 = 1e-3;

/// A link resolved to engine indices, with its spring parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkSpring {
    pub source: usize,
    pub target: usize,
    pub strength: f32,
    /// Share of the correction applied to the target; the source takes the rest.
    pub bias: f32,
}

/// Turns index pairs into springs.
///
/// Self-loops and out-of-range indices are dropped. Without a fixed
/// strength, a link is as stiff as `1 / min(degree)` of its endpoints, and
/// the better-connected endpoint moves less.
pub fn resolve_springs(
    pairs: &[(usize, usize)],
    node_count: usize,
    fixed_strength: Option<f32>,
) -> Vec<LinkSpring> {
    let valid = |&&(source, target): &&(usize, usize)| {
        source < node_count && target < node_count && source != target
    };

    let mut degree = vec![0u32; node_count];
    for &(source, target) in pairs.iter().filter(valid) {
        degree[source] += 1;
        degree[target] += 1;
    }

    pairs
        .iter()
        .filter(valid)
        .map(|&(source, target)| {
            let source_degree = degree[source] as f32;
            let target_degree = degree[target] as f32;
            LinkSpring {
                source,
                target,
                strength: fixed_strength.unwrap_or(1.0 / source_degree.min(target_degree)),
                bias: source_degree / (source_degree + target_degree),
            }
        })
        .collect()
}

fn separation(from: usize, to: usize, delta: Vec2) -> (Vec2, f32) {
    let distance_sq = delta.length_sq();
    if distance_sq > COINCIDENT_DISTANCE_SQ {
        return (delta, distance_sq);
    }

    let direction = coincident_direction(from.min(to), from.max(to));
    let direction = if from < to { direction } else { -direction };
    let delta = direction * JIGGLE_DISTANCE;
    (delta, delta.length_sq())
}

pub(super) fn accumulate_link(
    positions: &[Vec2],
    velocities: &[Vec2],
    springs: &[LinkSpring],
    rest_length: f32,
    alpha: f32,
    deltas: &mut [Vec2],
) {
    for spring in springs {
        let (source, target) = (spring.source, spring.target);
        if source >= positions.len() || target >= positions.len() || source == target {
            continue;
        }

        let predicted_source = positions[source] + velocity_at(velocities, source);
        let predicted_target = positions[target] + velocity_at(velocities, target);
        let (delta, distance_sq) = separation(source, target, predicted_target - predicted_source);
        let distance = distance_sq.sqrt();

        let stretch = (distance - rest_length) / distance * alpha * spring.strength;
        let correction = delta * stretch;

        deltas[target] -= correction * spring.bias;
        deltas[source] += correction * (1.0 - spring.bias);
    }
}

fn velocity_at(velocities: &[Vec2], index: usize) -> Vec2 {
    velocities.get(index).copied().unwrap_or(Vec2::ZERO)
}

fn charge_between(
    from: usize,
    to: usize,
    delta: Vec2,
    weight: f32,
    distance_min_sq: f32,
) -> Vec2 {
    let (delta, distance_sq) = separation(from, to, delta);
    let denominator = if distance_sq < distance_min_sq {
        (distance_min_sq * distance_sq).sqrt()
    } else {
        distance_sq
    };
    delta * (weight / denominator)
}

pub(super) fn accumulate_charge_exact(
    positions: &[Vec2],
    strength: f32,
    distance_min: f32,
    alpha: f32,
    deltas: &mut [Vec2],
) {
    let weight = strength * alpha;
    let distance_min_sq = distance_min * distance_min;
    let node_count = positions.len();

    for i in 0..node_count {
        for j in (i + 1)..node_count {
            let push = charge_between(i, j, positions[j] - positions[i], weight, distance_min_sq);
            deltas[i] += push;
            deltas[j] -= push;
        }
    }
}

pub(super) fn accumulate_charge_approximate(
    positions: &[Vec2],
    strength: f32,
    distance_min: f32,
    alpha: f32,
    theta: f32,
    deltas: &mut [Vec2],
) {
    let Some(tree) = ChargeTree::build(positions, strength) else {
        return;
    };

    let weight = strength * alpha;
    let distance_min_sq = distance_min * distance_min;
    let theta_sq = theta * theta;
    for (index, delta) in deltas.iter_mut().enumerate().take(positions.len()) {
        let point = positions[index];
        tree.visit(|cell| {
            if cell.is_leaf() {
                for other in tree.chain(cell).filter(|&other| other != index) {
                    *delta += charge_between(
                        index,
                        other,
                        positions[other] - point,
                        weight,
                        distance_min_sq,
                    );
                }
                return false;
            }

            // A cell holding the point itself is always opened.
            let offset = cell.centroid - point;
            let distance_sq = offset.length_sq().max(COINCIDENT_DISTANCE_SQ);
            let far = !cell.contains(point) && cell.side() * cell.side() < theta_sq * distance_sq;
            if !far {
                return true;
            }

            let denominator = if distance_sq < distance_min_sq {
                (distance_min_sq * distance_sq).sqrt()
            } else {
                distance_sq
            };
            *delta += offset * (cell.charge * alpha / denominator);
            false
        });
    }
}

pub(super) fn accumulate_center(positions: &[Vec2], center: Vec2, strength: f32, deltas: &mut [Vec2]) {
    if positions.is_empty() {
        return;
    }

    let mut centroid = Vec2::ZERO;
    for position in positions {
        centroid += *position;
    }
    centroid /= positions.len() as f32;

    let shift = (center - centroid) * strength;
    for delta in deltas.iter_mut().take(positions.len()) {
        *delta += shift;
    }
}

pub(super) fn accumulate_axis(
    positions: &[Vec2],
    center: Vec2,
    strength: f32,
    alpha: f32,
    deltas: &mut [Vec2],
) {
    let weight = strength * alpha;
    for (delta, position) in deltas.iter_mut().zip(positions) {
        delta.x += (center.x - position.x) * weight;
        delta.y += (center.y - position.y) * weight;
    }
}

/// Spring pull along every link toward `rest_length`.
pub fn link_force(
    positions: &[Vec2],
    velocities: &[Vec2],
    springs: &[LinkSpring],
    rest_length: f32,
    alpha: f32,
) -> Vec<Vec2> {
    let mut deltas = vec![Vec2::ZERO; positions.len()];
    accumulate_link(positions, velocities, springs, rest_length, alpha, &mut deltas);
    deltas
}

/// Exact pairwise inverse-square charge; negative strength repels.
pub fn charge_force(positions: &[Vec2], strength: f32, distance_min: f32, alpha: f32) -> Vec<Vec2> {
    let mut deltas = vec![Vec2::ZERO; positions.len()];
    accumulate_charge_exact(positions, strength, distance_min, alpha, &mut deltas);
    deltas
}

/// Barnes–Hut approximation of [`charge_force`].
pub fn charge_force_approximate(
    positions: &[Vec2],
    strength: f32,
    distance_min: f32,
    alpha: f32,
    theta: f32,
) -> Vec<Vec2> {
    let mut deltas = vec![Vec2::ZERO; positions.len()];
    accumulate_charge_approximate(positions, strength, distance_min, alpha, theta, &mut deltas);
    deltas
}

/// Moves the centroid of all nodes toward `center`.
pub fn center_force(positions: &[Vec2], center: Vec2, strength: f32) -> Vec<Vec2> {
    let mut deltas = vec![Vec2::ZERO; positions.len()];
    accumulate_center(positions, center, strength, &mut deltas);
    deltas
}

/// Pulls each node's x and y independently toward `center`.
pub fn axis_force(positions: &[Vec2], center: Vec2, strength: f32, alpha: f32) -> Vec<Vec2> {
    let mut deltas = vec![Vec2::ZERO; positions.len()];
    accumulate_axis(positions, center, strength, alpha, &mut deltas);
    deltas
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForceKind {
    Link,
    Charge,
    Center,
    Axis,
}

/// The four force terms evaluated together.
///
/// A term whose output is not finite is dropped for that tick instead of
/// poisoning the sum.
#[derive(Debug, Default)]
pub struct ForceField {
    term: Vec<Vec2>,
}

impl ForceField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every term's contribution into `deltas`, which is resized to the
    /// node count and cleared first.
    pub fn evaluate(
        &mut self,
        config: &SimulationConfig,
        positions: &[Vec2],
        velocities: &[Vec2],
        springs: &[LinkSpring],
        alpha: f32,
        deltas: &mut Vec<Vec2>,
    ) {
        let node_count = positions.len();
        deltas.clear();
        deltas.resize(node_count, Vec2::ZERO);
        if node_count == 0 {
            return;
        }

        let center = config.center();
        for kind in [ForceKind::Link, ForceKind::Charge, ForceKind::Center, ForceKind::Axis] {
            self.term.clear();
            self.term.resize(node_count, Vec2::ZERO);

            match kind {
                ForceKind::Link => accumulate_link(
                    positions,
                    velocities,
                    springs,
                    config.link_distance,
                    alpha,
                    &mut self.term,
                ),
                ForceKind::Charge if node_count > config.barnes_hut_threshold => {
                    accumulate_charge_approximate(
                        positions,
                        config.charge_strength,
                        config.charge_distance_min,
                        alpha,
                        config.barnes_hut_theta,
                        &mut self.term,
                    )
                }
                ForceKind::Charge => accumulate_charge_exact(
                    positions,
                    config.charge_strength,
                    config.charge_distance_min,
                    alpha,
                    &mut self.term,
                ),
                ForceKind::Center => {
                    accumulate_center(positions, center, config.center_strength, &mut self.term)
                }
                ForceKind::Axis => accumulate_axis(
                    positions,
                    center,
                    config.axis_strength,
                    alpha,
                    &mut self.term,
                ),
            }

            if self.term.iter().any(|delta| !delta.x.is_finite() || !delta.y.is_finite()) {
                warn!(?kind, "force term produced non-finite values; skipped this tick");
                continue;
            }

            for (total, delta) in deltas.iter_mut().zip(&self.term) {
                *total += *delta;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;

    fn finite(deltas: &[Vec2]) -> bool {
        deltas.iter().all(|delta| delta.x.is_finite() && delta.y.is_finite())
    }

    fn total(deltas: &[Vec2]) -> Vec2 {
        deltas.iter().fold(Vec2::ZERO, |sum, delta| sum + *delta)
    }

    #[test]
    fn springs_skip_self_loops_and_weight_by_degree() {
        let springs = resolve_springs(&[(0, 1), (0, 2), (1, 1), (0, 9)], 3, None);
        assert_eq!(springs.len(), 2);
        // Node 0 has degree 2, nodes 1 and 2 degree 1.
        assert_eq!(springs[0].strength, 1.0);
        assert!((springs[0].bias - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn stretched_link_pulls_endpoints_together() {
        let positions = [vec2(0.0, 0.0), vec2(300.0, 0.0)];
        let springs = resolve_springs(&[(0, 1)], 2, None);
        let deltas = link_force(&positions, &[], &springs, 100.0, 1.0);
        assert!(deltas[0].x > 0.0);
        assert!(deltas[1].x < 0.0);
        assert!(total(&deltas).length() < 1e-3);
    }

    #[test]
    fn compressed_link_pushes_endpoints_apart() {
        let positions = [vec2(0.0, 0.0), vec2(20.0, 0.0)];
        let springs = resolve_springs(&[(0, 1)], 2, None);
        let deltas = link_force(&positions, &[], &springs, 100.0, 1.0);
        assert!(deltas[0].x < 0.0);
        assert!(deltas[1].x > 0.0);
    }

    #[test]
    fn coincident_link_endpoints_stay_finite() {
        let positions = [vec2(5.0, 5.0), vec2(5.0, 5.0)];
        let springs = resolve_springs(&[(0, 1)], 2, None);
        let deltas = link_force(&positions, &[], &springs, 100.0, 1.0);
        assert!(finite(&deltas));
        assert!(deltas[0].length() > 0.0);
    }

    #[test]
    fn charge_repels_symmetrically() {
        let positions = [vec2(-10.0, 0.0), vec2(10.0, 0.0)];
        let deltas = charge_force(&positions, -300.0, 1.0, 1.0);
        assert!(deltas[0].x < 0.0);
        assert!(deltas[1].x > 0.0);
        assert!((deltas[0] + deltas[1]).length() < 1e-4);
        // |Δv| = |strength| · alpha / distance.
        assert!((deltas[1].x - 15.0).abs() < 1e-3);
    }

    #[test]
    fn charge_on_coincident_nodes_is_bounded() {
        let positions = [vec2(1.0, 1.0); 3];
        let deltas = charge_force(&positions, -300.0, 1.0, 1.0);
        assert!(finite(&deltas));
        for delta in &deltas {
            assert!(delta.length() <= 2.0 * 300.0 + 1e-3);
        }
    }

    fn spiral(count: usize) -> Vec<Vec2> {
        (0..count)
            .map(|index| {
                let angle = index as f32 * 0.7;
                let radius = 20.0 + index as f32 * 3.0;
                vec2(angle.cos() * radius, angle.sin() * radius)
            })
            .collect()
    }

    #[test]
    fn approximate_charge_with_zero_theta_is_exact() {
        let positions = spiral(120);
        let exact = charge_force(&positions, -300.0, 1.0, 1.0);
        let approximate = charge_force_approximate(&positions, -300.0, 1.0, 1.0, 0.0);
        for (a, b) in exact.iter().zip(&approximate) {
            assert!((*a - *b).length() <= 1e-3 * a.length().max(1.0), "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn approximate_charge_summarizes_distant_cluster() {
        let mut positions = spiral(100)
            .into_iter()
            .map(|position| position * 0.1)
            .collect::<Vec<_>>();
        positions.push(vec2(5000.0, 0.0));
        let far = positions.len() - 1;

        let exact = charge_force(&positions, -300.0, 1.0, 1.0);
        let approximate = charge_force_approximate(&positions, -300.0, 1.0, 1.0, 0.9);
        assert!(exact[far].x > 0.0);
        assert!((exact[far] - approximate[far]).length() < 0.02 * exact[far].length());
    }

    #[test]
    fn center_moves_centroid_only() {
        let positions = [vec2(10.0, 0.0), vec2(30.0, 20.0)];
        let deltas = center_force(&positions, Vec2::ZERO, 1.0);
        assert_eq!(deltas[0], deltas[1]);
        assert!((deltas[0] - vec2(-20.0, -10.0)).length() < 1e-4);
    }

    #[test]
    fn axis_pulls_each_node_toward_center() {
        let positions = [vec2(50.0, -20.0)];
        let deltas = axis_force(&positions, vec2(10.0, 10.0), 0.1, 0.5);
        assert!((deltas[0] - vec2(-2.0, 1.5)).length() < 1e-5);
    }

    #[test]
    fn empty_input_is_a_no_op() {
        let mut field = ForceField::new();
        let mut deltas = vec![vec2(1.0, 1.0)];
        field.evaluate(&SimulationConfig::default(), &[], &[], &[], 1.0, &mut deltas);
        assert!(deltas.is_empty());
    }

    #[test]
    fn field_sums_all_terms() {
        let config = SimulationConfig::default();
        let positions = [vec2(-40.0, 5.0), vec2(60.0, -5.0), vec2(0.0, 80.0)];
        let springs = resolve_springs(&[(0, 1)], 3, None);

        let expected = {
            let parts = [
                link_force(&positions, &[], &springs, config.link_distance, 0.5),
                charge_force(&positions, config.charge_strength, config.charge_distance_min, 0.5),
                center_force(&positions, config.center(), config.center_strength),
                axis_force(&positions, config.center(), config.axis_strength, 0.5),
            ];
            (0..3)
                .map(|index| parts.iter().fold(Vec2::ZERO, |sum, part| sum + part[index]))
                .collect::<Vec<_>>()
        };

        let mut field = ForceField::new();
        let mut deltas = Vec::new();
        field.evaluate(&config, &positions, &[], &springs, 0.5, &mut deltas);
        for (a, b) in deltas.iter().zip(&expected) {
            assert!((*a - *b).length() < 1e-3);
        }
    }
}
