use eframe::egui;

use crate::screens::INBOX_REFRESH;
use crate::services::scoreboard::BystanderBoard;

pub enum BystanderAction {
    Stay,
    Back,
}

pub fn ui(ui: &mut egui::Ui, board: &mut BystanderBoard) -> BystanderAction {
    if board.pump() {
        ui.ctx().request_repaint();
    }
    ui.ctx().request_repaint_after(INBOX_REFRESH);

    let mut action = BystanderAction::Stay;
    if ui.button("< Home").clicked() {
        action = BystanderAction::Back;
    }
    ui.heading("Live Scoreboard");
    ui.add_space(6.0);

    ui.horizontal(|ui| {
        if board.event_active() {
            ui.colored_label(egui::Color32::LIGHT_GREEN, "Event in progress");
        } else {
            ui.label("No event in progress.");
        }
        if let Some(updated) = board.last_updated() {
            ui.separator();
            ui.label(format!("Last updated {}", updated.format("%H:%M:%S")));
        }
    });
    ui.add_space(10.0);

    if board.performers().is_empty() {
        ui.label("No performers yet.");
        return action;
    }

    egui::ScrollArea::both().show(ui, |ui| {
        egui::Grid::new("bystander-scores")
            .striped(true)
            .num_columns(board.judges().len() + 1)
            .min_col_width(120.0)
            .show(ui, |ui| {
                ui.strong("Performer");
                for judge in board.judges() {
                    ui.strong(&judge.name);
                }
                ui.end_row();

                for performer in board.performers() {
                    ui.label(&performer.name);
                    for judge in board.judges() {
                        ui.label(board.matrix().cell_text(performer.id, judge.judge_id));
                    }
                    ui.end_row();
                }
            });
    });

    action
}
