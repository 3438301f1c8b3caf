use eframe::egui;

use crate::models::Judge;
use crate::screens::INBOX_REFRESH;
use crate::services::api_client::Backend;
use crate::services::judge_login::JudgeLogin;

pub enum JudgeLoginAction {
    Stay,
    Back,
    LoggedIn(Judge),
}

pub fn ui<B: Backend>(ui: &mut egui::Ui, login: &mut JudgeLogin<B>) -> JudgeLoginAction {
    if login.pump() {
        ui.ctx().request_repaint();
    }
    if login.is_pending() {
        ui.ctx().request_repaint_after(INBOX_REFRESH);
    }
    if let Some(judge) = login.take_judge() {
        return JudgeLoginAction::LoggedIn(judge);
    }

    let mut action = JudgeLoginAction::Stay;
    if ui.button("< Home").clicked() {
        action = JudgeLoginAction::Back;
    }
    ui.vertical_centered(|ui| {
        ui.heading("Judge Login");
        ui.add_space(12.0);

        ui.label("Email");
        ui.add_sized(
            [420.0, 28.0],
            egui::TextEdit::singleline(&mut login.email).hint_text("judge@example.edu"),
        );
        ui.add_space(6.0);
        ui.label("Password");
        let password = ui.add_sized(
            [420.0, 28.0],
            egui::TextEdit::singleline(&mut login.password).password(true),
        );
        ui.add_space(10.0);

        let submit_with_enter =
            password.lost_focus() && ui.input(|input| input.key_pressed(egui::Key::Enter));
        let clicked = ui
            .add_enabled(!login.is_pending(), egui::Button::new("Log In"))
            .clicked();
        if (clicked || submit_with_enter) && !login.is_pending() {
            login.login();
        }

        if login.is_pending() {
            ui.spinner();
        }
        if let Some(message) = login.error_message() {
            ui.colored_label(egui::Color32::LIGHT_RED, message);
        }
    });
    action
}
