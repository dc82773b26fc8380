use eframe::egui::{self, RichText, Ui};

use force_graph_editor::graph::{GraphError, NodeId, search};
use force_graph_editor::physics::Command;

use super::EditorApp;

const SEARCH_RESULTS: usize = 12;

impl EditorApp {
    pub(super) fn draw_panels(&mut self, ui: &mut Ui) {
        egui::ScrollArea::vertical().show(ui, |ui| {
            self.draw_graph_section(ui);
            ui.separator();
            self.draw_selection_section(ui);
            ui.separator();
            self.draw_link_section(ui);
            ui.separator();
            self.draw_engine_section(ui);
            ui.separator();
            self.draw_physics_section(ui);

            if let Some(status) = &self.status {
                ui.separator();
                ui.label(RichText::new(status).color(egui::Color32::from_rgb(241, 146, 94)));
            }
        });
    }

    fn report(&mut self, result: Result<(), GraphError>) {
        self.status = result.err().map(|error| error.to_string());
    }

    fn draw_graph_section(&mut self, ui: &mut Ui) {
        let graph = self.workspace.graph();
        ui.heading("Graph");
        ui.label(format!(
            "nodes: {}  |  links: {}",
            graph.node_count(),
            graph.link_count()
        ));

        ui.horizontal(|ui| {
            let field = ui.add(
                egui::TextEdit::singleline(&mut self.new_label)
                    .hint_text("New node label")
                    .desired_width(180.0),
            );
            let submitted =
                field.lost_focus() && ui.input(|input| input.key_pressed(egui::Key::Enter));
            if ui.button("Add node").clicked() || submitted {
                match self.workspace.add_node(&self.new_label) {
                    Ok(id) => {
                        self.new_label.clear();
                        self.select(Some(id));
                        self.status = None;
                    }
                    Err(error) => self.status = Some(error.to_string()),
                }
            }
        });

        ui.add(
            egui::TextEdit::singleline(&mut self.search)
                .hint_text("Search nodes")
                .desired_width(f32::INFINITY),
        );
        if self.search.trim().is_empty() {
            return;
        }

        let matches = search(&graph, &self.search, SEARCH_RESULTS);
        if matches.is_empty() {
            ui.label(RichText::new("No matches").weak());
        }
        for id in matches {
            let label = graph.label(id.as_str()).unwrap_or(id.as_str());
            let is_selected = self.selected.as_ref() == Some(&id);
            if ui
                .selectable_label(is_selected, format!("{label}  ({id})"))
                .clicked()
            {
                self.select(Some(id));
            }
        }
    }

    fn draw_selection_section(&mut self, ui: &mut Ui) {
        ui.heading("Selection");
        let Some(id) = self.selected.clone() else {
            ui.label(RichText::new("Click a node to select it.").weak());
            return;
        };

        let pinned = self
            .workspace
            .simulation()
            .node(id.as_str())
            .is_some_and(|node| node.is_pinned());
        ui.label(format!("id: {id}{}", if pinned { "  (pinned)" } else { "" }));

        ui.horizontal(|ui| {
            ui.add(egui::TextEdit::singleline(&mut self.rename_label).desired_width(180.0));
            if ui.button("Rename").clicked() {
                let result = self
                    .workspace
                    .rename_node(&id, &self.rename_label)
                    .map(|_| ());
                self.report(result);
            }
        });

        ui.horizontal(|ui| {
            if ui.button("Link from").clicked() {
                self.link_source = Some(id.clone());
            }
            if ui.button("Link to").clicked() {
                self.link_target = Some(id.clone());
            }
            if ui
                .add_enabled(pinned, egui::Button::new("Unpin"))
                .clicked()
            {
                self.workspace.controller().unpin(&id);
            }
            if ui.button("Delete").clicked() {
                let result = self.workspace.delete_node(&id).map(|_| ());
                self.report(result);
                self.forget_missing();
            }
        });
    }

    fn draw_link_section(&mut self, ui: &mut Ui) {
        ui.heading("Links");
        let describe = |slot: &Option<NodeId>| {
            slot.as_ref()
                .map_or_else(|| "none".to_owned(), ToString::to_string)
        };
        ui.label(format!(
            "from: {}  |  to: {}",
            describe(&self.link_source),
            describe(&self.link_target)
        ));

        let ready = self.link_source.is_some() && self.link_target.is_some();
        ui.horizontal(|ui| {
            let add = ui.add_enabled(ready, egui::Button::new("Add link"));
            let delete = ui.add_enabled(ready, egui::Button::new("Delete link"));
            let (Some(source), Some(target)) = (self.link_source.clone(), self.link_target.clone())
            else {
                return;
            };

            if add.clicked() {
                let result = self.workspace.add_link(&source, &target).map(|_| ());
                self.report(result);
            }
            if delete.clicked() {
                let result = self.workspace.delete_link(&source, &target).map(|_| ());
                self.report(result);
            }
        });
    }

    fn draw_engine_section(&mut self, ui: &mut Ui) {
        let simulation = self.workspace.simulation();
        ui.heading("Layout");
        ui.label(format!(
            "state: {:?}  |  alpha {:.3}  |  ticks {}",
            simulation.state(),
            simulation.alpha(),
            simulation.ticks()
        ));

        ui.horizontal(|ui| {
            if ui.button("Start").clicked() {
                self.workspace.simulation().submit(Command::Start);
            }
            if ui.button("Stop").clicked() {
                self.workspace.simulation().submit(Command::Stop);
            }
            if ui.button("Reheat").clicked() {
                self.workspace.simulation().submit(Command::Reheat);
            }
            if ui.button("Unpin all").clicked() {
                self.workspace.controller().release_all();
            }
        });

        let mut sticky = self.workspace.controller().sticky_pins();
        if ui
            .checkbox(&mut sticky, "Keep dragged nodes pinned")
            .on_hover_text("When off, releasing a drag lets the node move freely again.")
            .changed()
        {
            self.workspace.controller_mut().set_sticky_pins(sticky);
        }
    }

    fn draw_physics_section(&mut self, ui: &mut Ui) {
        ui.collapsing("Physics tuning", |ui| {
            let mut changed = false;
            changed |= ui
                .add(
                    egui::Slider::new(&mut self.config.charge_strength, -1000.0..=0.0)
                        .text("Charge")
                        .clamping(egui::SliderClamping::Always),
                )
                .on_hover_text("How strongly nodes push away from each other.")
                .changed();
            changed |= ui
                .add(
                    egui::Slider::new(&mut self.config.link_distance, 10.0..=400.0)
                        .text("Link distance")
                        .clamping(egui::SliderClamping::Always),
                )
                .on_hover_text("Rest length of every link.")
                .changed();
            changed |= ui
                .add(
                    egui::Slider::new(&mut self.config.velocity_decay, 0.1..=0.95)
                        .text("Velocity decay")
                        .clamping(egui::SliderClamping::Always),
                )
                .on_hover_text("Fraction of velocity kept after each step.")
                .changed();
            changed |= ui
                .add(
                    egui::Slider::new(&mut self.config.axis_strength, 0.0..=0.5)
                        .text("Axis pull")
                        .clamping(egui::SliderClamping::Always),
                )
                .on_hover_text("Keeps disconnected pieces from drifting away.")
                .changed();

            if changed {
                self.workspace.configure(self.config);
            }
        });
    }
}
