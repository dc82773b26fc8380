//! Pointer input to engine commands, plus the pan/zoom view transform.
//!
//! The view transform lives here and only here: the engine never sees it,
//! and panning or zooming never moves a node in layout space.

use eframe::egui::{Vec2, vec2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::NodeId;
use crate::physics::{Command, CommandSender, Snapshot};

pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 4.0;

/// Maps layout coordinates to screen coordinates: `screen = layout * scale + translate`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub scale: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }
}

impl ViewTransform {
    /// Unit-scale transform that shows `layout_center` in the middle of a
    /// viewport of size `viewport`.
    pub fn centered_on(layout_center: Vec2, viewport: Vec2) -> Self {
        let translate = viewport * 0.5 - layout_center;
        Self {
            scale: 1.0,
            translate_x: translate.x,
            translate_y: translate.y,
        }
    }

    pub fn translate(&self) -> Vec2 {
        vec2(self.translate_x, self.translate_y)
    }

    pub fn layout_to_screen(&self, layout: Vec2) -> Vec2 {
        layout * self.scale + self.translate()
    }

    pub fn screen_to_layout(&self, screen: Vec2) -> Vec2 {
        (screen - self.translate()) / self.scale
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        if !delta.x.is_finite() || !delta.y.is_finite() {
            return;
        }
        self.translate_x += delta.x;
        self.translate_y += delta.y;
    }

    /// Zooms by a wheel delta, keeping the layout point under `focal` fixed.
    pub fn zoom_at(&mut self, wheel_delta: f32, focal: Vec2) {
        if wheel_delta.abs() <= f32::EPSILON || !wheel_delta.is_finite() {
            return;
        }

        let layout_before = self.screen_to_layout(focal);
        let zoom_factor = (1.0 + (wheel_delta * 0.0018)).clamp(0.85, 1.15);
        self.scale = (self.scale * zoom_factor).clamp(MIN_SCALE, MAX_SCALE);

        let translate = focal - layout_before * self.scale;
        self.translate_x = translate.x;
        self.translate_y = translate.y;
    }
}

/// Turns pointer gestures into engine commands.
///
/// Dragging pins the node under the pointer and keeps the engine warm.
/// Releasing lets the energy decay again; by default the node stays pinned
/// where it was dropped.
#[derive(Debug)]
pub struct InteractionController {
    commands: CommandSender,
    view: ViewTransform,
    dragging: Option<NodeId>,
    sticky_pins: bool,
    reheat_alpha: f32,
}

impl InteractionController {
    pub fn new(commands: CommandSender, reheat_alpha: f32) -> Self {
        Self {
            commands,
            view: ViewTransform::default(),
            dragging: None,
            sticky_pins: true,
            reheat_alpha,
        }
    }

    pub fn view(&self) -> ViewTransform {
        self.view
    }

    pub fn set_view(&mut self, view: ViewTransform) {
        self.view = view;
    }

    pub fn dragging(&self) -> Option<&NodeId> {
        self.dragging.as_ref()
    }

    pub fn sticky_pins(&self) -> bool {
        self.sticky_pins
    }

    /// When false, releasing a drag also unpins the node.
    pub fn set_sticky_pins(&mut self, sticky: bool) {
        self.sticky_pins = sticky;
    }

    pub fn set_reheat_alpha(&mut self, alpha: f32) {
        self.reheat_alpha = alpha;
    }

    pub fn on_drag_start(&mut self, id: &NodeId) {
        debug!(%id, "drag start");
        self.commands.send(Command::Reheat);
        self.commands.send(Command::SetAlphaTarget(self.reheat_alpha));
        self.commands.send(Command::Pin {
            id: id.clone(),
            at: None,
        });
        self.dragging = Some(id.clone());
    }

    /// `screen` is the pointer position in screen coordinates.
    pub fn on_drag_move(&mut self, id: &NodeId, screen: Vec2) {
        self.commands.send(Command::MovePin {
            id: id.clone(),
            to: self.view.screen_to_layout(screen),
        });
    }

    pub fn on_drag_end(&mut self, id: &NodeId) {
        debug!(%id, sticky = self.sticky_pins, "drag end");
        self.commands.send(Command::SetAlphaTarget(0.0));
        if !self.sticky_pins {
            self.commands.send(Command::Unpin(id.clone()));
        }
        if self.dragging.as_ref() == Some(id) {
            self.dragging = None;
        }
    }

    pub fn unpin(&self, id: &NodeId) {
        self.commands.send(Command::Unpin(id.clone()));
        self.commands.send(Command::Reheat);
    }

    pub fn release_all(&self) {
        self.commands.send(Command::UnpinAll);
        self.commands.send(Command::Reheat);
    }

    pub fn on_wheel(&mut self, delta: f32, focal: Vec2) {
        self.view.zoom_at(delta, focal);
    }

    pub fn on_pan(&mut self, delta: Vec2) {
        self.view.pan_by(delta);
    }

    /// Nearest node whose screen position lies within `radius` of `screen`.
    pub fn node_at(&self, screen: Vec2, snapshot: &Snapshot, radius: f32) -> Option<NodeId> {
        snapshot
            .nodes
            .iter()
            .filter_map(|node| {
                let distance = (self.view.layout_to_screen(node.position()) - screen).length();
                (distance <= radius).then_some((node, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(node, _)| node.id.clone())
    }
}
