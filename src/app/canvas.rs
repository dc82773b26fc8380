use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Ui, vec2};

use force_graph_editor::graph::NodeId;
use force_graph_editor::interaction::ViewTransform;

use super::EditorApp;
use super::render_utils::{
    LINK_COLOR, NODE_FILL, PINNED_FILL, SELECTED_RING, arrowhead, circle_visible,
    draw_background, edge_visible, node_radius, to_pos,
};

impl EditorApp {
    pub(super) fn draw_canvas(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());

        if !self.canvas.view_initialized && rect.width() > 0.0 {
            let mut view = ViewTransform::centered_on(self.config.center(), rect.size());
            view.pan_by(rect.min.to_vec2());
            self.workspace.controller_mut().set_view(view);
            self.canvas.view_initialized = true;
        }

        self.handle_pointer(ui, rect, &response);

        let painter = ui.painter_at(rect);
        let frame = self.workspace.frame();
        let view = frame.view;
        let graph = self.workspace.graph();
        let radius = node_radius(view.scale);
        let line_width = (1.3 * view.scale.sqrt()).clamp(0.6, 3.0);

        draw_background(&painter, rect, view);

        for link in &frame.snapshot.links {
            let start = to_pos(view.layout_to_screen(link.source.into()));
            let end = to_pos(view.layout_to_screen(link.target.into()));

            if link.source_id == link.target_id {
                let center = start + vec2(0.0, -radius * 1.6);
                if circle_visible(rect, center, radius) {
                    painter.circle_stroke(center, radius, Stroke::new(line_width, LINK_COLOR));
                }
                continue;
            }

            if !edge_visible(rect, start, end, radius) {
                continue;
            }
            painter.line_segment([start, end], Stroke::new(line_width, LINK_COLOR));
            if let Some(points) = arrowhead(start, end, radius, (radius * 0.8).max(5.0)) {
                painter.add(egui::Shape::convex_polygon(
                    points.to_vec(),
                    LINK_COLOR,
                    Stroke::NONE,
                ));
            }
        }

        let hovered = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|pointer| rect.contains(*pointer))
            .and_then(|pointer| {
                self.workspace
                    .controller()
                    .node_at(pointer.to_vec2(), frame.snapshot, radius)
            });

        for node in &frame.snapshot.nodes {
            let position = to_pos(view.layout_to_screen(node.position()));
            if !circle_visible(rect, position, radius) {
                continue;
            }

            let is_selected = self.selected.as_ref() == Some(&node.id);
            let is_hovered = hovered.as_ref() == Some(&node.id);
            let fill = if is_hovered {
                Color32::from_rgb(255, 164, 101)
            } else if node.pinned {
                PINNED_FILL
            } else {
                NODE_FILL
            };

            painter.circle_filled(position, radius, fill);
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190)),
            );
            if is_selected {
                painter.circle_stroke(position, radius + 4.0, Stroke::new(2.0, SELECTED_RING));
            }

            if is_selected || is_hovered || view.scale > 0.45 {
                let label = graph.label(node.id.as_str()).unwrap_or(node.id.as_str());
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    label,
                    FontId::proportional(12.0),
                    Color32::from_gray(238),
                );
            }
        }

        if hovered.is_some() || self.workspace.controller().dragging().is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        painter.text(
            rect.left_bottom() + vec2(10.0, -10.0),
            Align2::LEFT_BOTTOM,
            format!(
                "zoom {:.2}  |  tick {}  |  alpha {:.3}",
                view.scale, frame.snapshot.tick, frame.snapshot.alpha
            ),
            FontId::proportional(12.0),
            Color32::from_gray(170),
        );
    }

    fn handle_pointer(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        let pointer = ui.input(|input| input.pointer.interact_pos());
        let radius = node_radius(self.workspace.controller().view().scale);
        let hit = |app: &Self, at: Pos2| -> Option<NodeId> {
            app.workspace
                .controller()
                .node_at(at.to_vec2(), app.workspace.frame().snapshot, radius)
        };

        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some(pointer) = pointer
        {
            match hit(self, pointer) {
                Some(id) => {
                    self.workspace.controller_mut().on_drag_start(&id);
                    self.select(Some(id));
                }
                None => self.canvas.panning = true,
            }
        }

        if response.dragged_by(egui::PointerButton::Primary) {
            if let Some(id) = self.workspace.controller().dragging().cloned() {
                if let Some(pointer) = pointer {
                    self.workspace
                        .controller_mut()
                        .on_drag_move(&id, pointer.to_vec2());
                }
            } else if self.canvas.panning {
                self.workspace.controller_mut().on_pan(response.drag_delta());
            }
        }

        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.workspace.controller_mut().on_pan(response.drag_delta());
        }

        if response.drag_stopped() {
            if let Some(id) = self.workspace.controller().dragging().cloned() {
                self.workspace.controller_mut().on_drag_end(&id);
            }
            self.canvas.panning = false;
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            let selected = pointer.and_then(|pointer| hit(self, pointer));
            self.select(selected);
        }

        if response.hovered() {
            let scroll = ui.input(|input| input.raw_scroll_delta.y);
            if scroll.abs() > f32::EPSILON {
                let focal = ui
                    .input(|input| input.pointer.hover_pos())
                    .unwrap_or_else(|| rect.center());
                self.workspace
                    .controller_mut()
                    .on_wheel(scroll, focal.to_vec2());
            }
        }
    }
}
