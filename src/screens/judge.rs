use eframe::egui;

use crate::models::{MAX_CATEGORY_SCORE, MIN_CATEGORY_SCORE, ScoreCategory};
use crate::screens::INBOX_REFRESH;
use crate::services::api_client::Backend;
use crate::services::judge_flow::{JudgeSession, NOT_ELIGIBLE_WARNING, NO_EVENT_MESSAGE, NoticeKind};

pub enum JudgeAction {
    Stay,
    Back,
}

pub fn ui<B: Backend>(ui: &mut egui::Ui, session: &mut JudgeSession<B>) -> JudgeAction {
    let ctx = ui.ctx().clone();
    if session.pump() {
        ctx.request_repaint();
    }
    ctx.request_repaint_after(INBOX_REFRESH);

    let mut action = JudgeAction::Stay;
    if ui.button("< Log out").clicked() {
        action = JudgeAction::Back;
    }

    let title = match session.judge() {
        Some(judge) => format!("Judge: {}", judge.name),
        None => "Judge".to_string(),
    };
    ui.heading(title);
    ui.add_space(8.0);

    if !session.event_ongoing() {
        ui.colored_label(egui::Color32::from_rgb(255, 220, 140), NO_EVENT_MESSAGE);
    }
    match session.current_performer() {
        Some(performer) => ui.label(format!("Current performer: {}", performer.name)),
        None => ui.label("No current performer."),
    };
    if !session.can_vote() {
        ui.colored_label(egui::Color32::from_rgb(255, 220, 140), NOT_ELIGIBLE_WARNING);
    }
    ui.add_space(10.0);

    score_form(ui, session);

    if session.is_designated() {
        ui.add_space(16.0);
        ui.separator();
        next_performer(ui, session);
    }

    notice_window(&ctx, session);
    action
}

fn score_form<B: Backend>(ui: &mut egui::Ui, session: &mut JudgeSession<B>) {
    let enabled = session.fields_enabled();
    let mut changes = Vec::new();
    ui.add_enabled_ui(enabled, |ui| {
        egui::Grid::new("score-form")
            .num_columns(2)
            .spacing([24.0, 8.0])
            .show(ui, |ui| {
                for category in ScoreCategory::ALL {
                    ui.label(category.label());
                    let mut value = session.form().get(category);
                    let before = value;
                    egui::ComboBox::from_id_salt(category.label())
                        .selected_text(value.map_or_else(|| "Select".to_string(), |v| v.to_string()))
                        .show_ui(ui, |ui| {
                            ui.selectable_value(&mut value, None, "Select");
                            for score in MIN_CATEGORY_SCORE..=MAX_CATEGORY_SCORE {
                                ui.selectable_value(&mut value, Some(score), score.to_string());
                            }
                        });
                    if value != before {
                        changes.push((category, value));
                    }
                    ui.end_row();
                }
            });
    });
    for (category, value) in changes {
        session.set_score(category, value);
    }

    ui.add_space(10.0);
    if ui
        .add_enabled(enabled, egui::Button::new("Submit Scores"))
        .clicked()
    {
        let _ = session.submit_scores();
    }
}

fn next_performer<B: Backend>(ui: &mut egui::Ui, session: &mut JudgeSession<B>) {
    ui.strong("Next performer");
    let mut selection = session.next_selection();
    let selected_text = selection
        .and_then(|id| session.performers().iter().find(|p| p.id == id))
        .map_or_else(|| "Select a performer".to_string(), |p| p.name.clone());

    ui.horizontal(|ui| {
        egui::ComboBox::from_id_salt("next-performer")
            .selected_text(selected_text)
            .width(260.0)
            .show_ui(ui, |ui| {
                for performer in session.performers() {
                    ui.selectable_value(&mut selection, Some(performer.id), &performer.name);
                }
            });
        let clicked = ui
            .add_enabled(
                session.next_performer_enabled(),
                egui::Button::new("Set Next Performer"),
            )
            .clicked();
        if selection != session.next_selection() {
            session.select_next_performer(selection);
        }
        if clicked {
            let _ = session.set_next_performer();
        }
    });
}

fn notice_window<B: Backend>(ctx: &egui::Context, session: &mut JudgeSession<B>) {
    let Some(notice) = session.notice().cloned() else {
        return;
    };
    let mut dismissed = false;
    egui::Window::new("Notice")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .show(ctx, |ui| {
            match notice.kind {
                NoticeKind::Info => ui.label(&notice.text),
                NoticeKind::Error => ui.colored_label(egui::Color32::LIGHT_RED, &notice.text),
            };
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                dismissed = true;
            }
        });
    if dismissed {
        session.dismiss_notice();
    }
}
