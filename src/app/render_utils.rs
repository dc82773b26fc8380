use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use force_graph_editor::interaction::ViewTransform;

pub(super) const NODE_FILL: Color32 = Color32::from_rgb(76, 142, 214);
pub(super) const PINNED_FILL: Color32 = Color32::from_rgb(214, 140, 62);
pub(super) const SELECTED_RING: Color32 = Color32::from_rgb(245, 206, 93);
pub(super) const LINK_COLOR: Color32 = Color32::from_rgba_premultiplied(150, 160, 175, 170);

pub(super) fn to_pos(vector: Vec2) -> Pos2 {
    Pos2::new(vector.x, vector.y)
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, view: ViewTransform) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * view.scale.clamp(0.6, 1.8)).max(20.0);
    let origin = view.translate();

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    !(max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom())
}

/// On-screen node radius; grows slower than the zoom so labels stay legible.
pub(super) fn node_radius(scale: f32) -> f32 {
    (9.0 * scale.powf(0.40)).clamp(3.0, 40.0)
}

/// Triangle for an arrowhead that touches the edge of the target circle.
///
/// `None` when the endpoints are too close to draw a direction.
pub(super) fn arrowhead(from: Pos2, to: Pos2, target_radius: f32, size: f32) -> Option<[Pos2; 3]> {
    let delta = to - from;
    let length = delta.length();
    if length <= target_radius + size {
        return None;
    }

    let direction = delta / length;
    let normal = Vec2::new(-direction.y, direction.x);
    let tip = to - direction * target_radius;
    let base = tip - direction * size;
    Some([tip, base + normal * (size * 0.5), base - normal * (size * 0.5)])
}
