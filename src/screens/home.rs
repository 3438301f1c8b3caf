use eframe::egui;

use crate::services::config_loader::PodiumConfig;

pub enum HomeAction {
    Stay,
    OpenAdmin,
    OpenJudge,
    OpenBystander,
}

pub fn ui(ui: &mut egui::Ui, config: &PodiumConfig) -> HomeAction {
    let mut action = HomeAction::Stay;
    ui.vertical_centered(|ui| {
        ui.heading("Podium");
        ui.add_space(8.0);
        ui.label("Live performance judging");
        ui.label(format!("Backend: {}", config.api_base_url));
        ui.add_space(24.0);

        if ui.add_sized([320.0, 40.0], egui::Button::new("Admin")).clicked() {
            action = HomeAction::OpenAdmin;
        }
        ui.add_space(8.0);
        if ui.add_sized([320.0, 40.0], egui::Button::new("Judge")).clicked() {
            action = HomeAction::OpenJudge;
        }
        ui.add_space(8.0);
        if ui
            .add_sized([320.0, 40.0], egui::Button::new("Live Scoreboard"))
            .clicked()
        {
            action = HomeAction::OpenBystander;
        }
    });
    action
}
