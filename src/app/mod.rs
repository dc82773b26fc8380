use eframe::egui::{self, Context};

use force_graph_editor::graph::NodeId;
use force_graph_editor::physics::SimulationConfig;
use force_graph_editor::workspace::Workspace;

mod canvas;
mod panels;
mod render_utils;

/// Host shell: edit forms on the left, the live layout in the middle.
pub struct EditorApp {
    workspace: Workspace,
    config: SimulationConfig,
    selected: Option<NodeId>,
    link_source: Option<NodeId>,
    link_target: Option<NodeId>,
    new_label: String,
    rename_label: String,
    search: String,
    status: Option<String>,
    canvas: CanvasState,
}

#[derive(Default)]
struct CanvasState {
    view_initialized: bool,
    panning: bool,
}

impl EditorApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        workspace: Workspace,
        config: SimulationConfig,
    ) -> Self {
        Self {
            workspace,
            config,
            selected: None,
            link_source: None,
            link_target: None,
            new_label: String::new(),
            rename_label: String::new(),
            search: String::new(),
            status: None,
            canvas: CanvasState::default(),
        }
    }

    fn select(&mut self, id: Option<NodeId>) {
        self.rename_label = id
            .as_ref()
            .and_then(|id| self.workspace.graph().label(id.as_str()).map(str::to_owned))
            .unwrap_or_default();
        self.selected = id;
    }

    /// Drops references to nodes that no longer exist.
    fn forget_missing(&mut self) {
        let graph = self.workspace.graph();
        for slot in [&mut self.selected, &mut self.link_source, &mut self.link_target] {
            if slot.as_ref().is_some_and(|id| !graph.contains(id.as_str())) {
                *slot = None;
            }
        }
    }
}

impl eframe::App for EditorApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let ticked = self.workspace.tick().is_some();

        egui::SidePanel::left("editor")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_panels(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_canvas(ui));

        if ticked || self.workspace.simulation().is_running() {
            ctx.request_repaint();
        }
    }
}
