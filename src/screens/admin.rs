use eframe::egui;
use rfd::FileDialog;
use tracing::error;

use crate::screens::INBOX_REFRESH;
use crate::services::admin_panel::{AdminPanel, ReportState};
use crate::services::api_client::Backend;

pub enum AdminAction {
    Stay,
    Back,
}

/// Admin panel plus the bits of state that only the screen cares about.
pub struct AdminScreen<B: Backend> {
    pub panel: AdminPanel<B>,
    export_message: Option<Result<String, String>>,
}

impl<B: Backend> AdminScreen<B> {
    pub fn new(panel: AdminPanel<B>) -> Self {
        Self {
            panel,
            export_message: None,
        }
    }
}

enum ReportCommand {
    ToggleDetails(usize),
    Export,
    Close,
}

pub fn ui<B: Backend>(ui: &mut egui::Ui, screen: &mut AdminScreen<B>) -> AdminAction {
    let ctx = ui.ctx().clone();
    if screen.panel.pump() {
        ctx.request_repaint();
    }
    ctx.request_repaint_after(INBOX_REFRESH);

    let mut action = AdminAction::Stay;
    if ui.button("< Home").clicked() {
        action = AdminAction::Back;
    }
    ui.heading("Admin Panel");
    ui.add_space(8.0);

    let panel = &mut screen.panel;
    if panel.is_loading() {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Loading...");
        });
        return action;
    }

    let active = panel.event_active();
    ui.label(format!(
        "Event status: {}",
        if active { "In progress" } else { "Not running" }
    ));
    ui.add_space(8.0);

    ui.horizontal(|ui| {
        let toggle_label = if active { "Stop Event" } else { "Start Event" };
        if ui
            .add_enabled(panel.can_toggle(), egui::Button::new(toggle_label))
            .clicked()
        {
            panel.toggle_event();
        }
        if ui
            .add_enabled(
                panel.can_view_report(),
                egui::Button::new("View Full Report"),
            )
            .clicked()
        {
            screen.export_message = None;
            panel.open_report();
        }
    });

    if panel.report().is_open() {
        let command = report_window(&ctx, screen);
        match command {
            Some(ReportCommand::ToggleDetails(index)) => screen.panel.toggle_details(index),
            Some(ReportCommand::Export) => export(screen),
            Some(ReportCommand::Close) => {
                screen.export_message = None;
                screen.panel.close_report();
            }
            None => {}
        }
    }

    action
}

fn export<B: Backend>(screen: &mut AdminScreen<B>) {
    let Some(path) = FileDialog::new()
        .set_directory(".")
        .set_file_name("final-report.json")
        .add_filter("JSON", &["json"])
        .save_file()
    else {
        return;
    };
    screen.export_message = Some(match screen.panel.export_report(&path) {
        Ok(()) => Ok(format!("Saved {}", path.display())),
        Err(err) => {
            error!("Report export failed: {err:#}");
            Err(format!("{err:#}"))
        }
    });
}

fn report_window<B: Backend>(ctx: &egui::Context, screen: &AdminScreen<B>) -> Option<ReportCommand> {
    let mut command = None;
    let mut open = true;
    egui::Window::new("Final Report")
        .open(&mut open)
        .collapsible(false)
        .resizable(true)
        .default_width(900.0)
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .show(ctx, |ui| {
            match screen.panel.report() {
                ReportState::Closed => {}
                ReportState::Loading => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Loading final scores...");
                    });
                }
                ReportState::Failed(message) => {
                    ui.colored_label(egui::Color32::LIGHT_RED, message);
                }
                ReportState::Loaded(rows) if rows.is_empty() => {
                    ui.label("No scores available.");
                }
                ReportState::Loaded(_) => {
                    report_table(ui, screen, &mut command);
                    ui.add_space(8.0);
                    if ui.button("Export JSON...").clicked() {
                        command = Some(ReportCommand::Export);
                    }
                    match &screen.export_message {
                        Some(Ok(message)) => {
                            ui.colored_label(egui::Color32::LIGHT_GREEN, message);
                        }
                        Some(Err(message)) => {
                            ui.colored_label(egui::Color32::LIGHT_RED, message);
                        }
                        None => {}
                    }
                }
            }
            ui.add_space(8.0);
            if ui.button("Close").clicked() {
                command = Some(ReportCommand::Close);
            }
        });
    if !open {
        command = Some(ReportCommand::Close);
    }
    command
}

fn report_table<B: Backend>(
    ui: &mut egui::Ui,
    screen: &AdminScreen<B>,
    command: &mut Option<ReportCommand>,
) {
    egui::ScrollArea::vertical().max_height(480.0).show(ui, |ui| {
        for (index, line) in screen.panel.report_lines().into_iter().enumerate() {
            ui.horizontal(|ui| {
                ui.label(format!("#{}", line.rank));
                ui.strong(&line.performer_name);
                ui.label(format!("Total: {}", line.total));
                let details = if line.expanded { "Hide Details" } else { "Show Details" };
                if ui.button(details).clicked() {
                    *command = Some(ReportCommand::ToggleDetails(index));
                }
            });
            if line.expanded {
                egui::Grid::new(("judge-scores", index))
                    .striped(true)
                    .num_columns(8)
                    .show(ui, |ui| {
                        for header in [
                            "Judge",
                            "Presentation",
                            "Stage Presence",
                            "Choreography",
                            "Timing",
                            "Performance",
                            "Weight",
                            "Weighted Score",
                        ] {
                            ui.strong(header);
                        }
                        ui.end_row();
                        for judge in screen.panel.judge_lines(index) {
                            ui.label(&judge.judge_name);
                            for value in &judge.categories {
                                ui.label(value);
                            }
                            ui.label(&judge.weight);
                            ui.label(&judge.weighted_score);
                            ui.end_row();
                        }
                    });
            }
            ui.separator();
        }
    });
}
