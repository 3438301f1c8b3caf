mod models;
mod screens;
mod services;

use anyhow::Context;
use eframe::egui;
use screens::admin::{AdminAction, AdminScreen};
use screens::bystander::BystanderAction;
use screens::home::HomeAction;
use screens::judge::JudgeAction;
use screens::judge_login::JudgeLoginAction;
use services::admin_panel::AdminPanel;
use services::api_client::HttpBackend;
use services::config_loader::{PodiumConfig, load_podium_config};
use services::judge_flow::JudgeSession;
use services::judge_login::JudgeLogin;
use services::scoreboard::BystanderBoard;
use std::fs;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use tracing_unwrap::ResultExt;

/// One mounted screen at a time. Replacing the state drops the old screen, which
/// cancels every poller it started.
enum PodiumState {
    Home,
    Admin(AdminScreen<HttpBackend>),
    JudgeLogin(JudgeLogin<HttpBackend>),
    Judge(JudgeSession<HttpBackend>),
    Bystander(BystanderBoard),
}

impl PodiumState {
    fn name(&self) -> &'static str {
        match self {
            PodiumState::Home => "Home",
            PodiumState::Admin(_) => "Admin",
            PodiumState::JudgeLogin(_) => "JudgeLogin",
            PodiumState::Judge(_) => "Judge",
            PodiumState::Bystander(_) => "Bystander",
        }
    }

    fn unmount(&mut self) {
        match self {
            PodiumState::Home => {}
            PodiumState::Admin(screen) => screen.panel.unmount(),
            PodiumState::JudgeLogin(login) => login.unmount(),
            PodiumState::Judge(session) => session.unmount(),
            PodiumState::Bystander(board) => board.unmount(),
        }
    }
}

struct PodiumApp {
    state: PodiumState,
    backend: Arc<HttpBackend>,
    config: PodiumConfig,
}

impl PodiumApp {
    fn new(backend: Arc<HttpBackend>, config: PodiumConfig) -> Self {
        Self {
            state: PodiumState::Home,
            backend,
            config,
        }
    }

    fn navigate(&mut self, next: PodiumState) {
        info!("Transition: {} -> {}", self.state.name(), next.name());
        self.state.unmount();
        self.state = next;
    }
}

impl eframe::App for PodiumApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut next = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(8.0);
            match &mut self.state {
                PodiumState::Home => match screens::home::ui(ui, &self.config) {
                    HomeAction::Stay => {}
                    HomeAction::OpenAdmin => {
                        let panel = AdminPanel::mount(Arc::clone(&self.backend));
                        next = Some(PodiumState::Admin(AdminScreen::new(panel)));
                    }
                    HomeAction::OpenJudge => {
                        next = Some(PodiumState::JudgeLogin(JudgeLogin::mount(Arc::clone(
                            &self.backend,
                        ))));
                    }
                    HomeAction::OpenBystander => {
                        next = Some(PodiumState::Bystander(BystanderBoard::mount(
                            Arc::clone(&self.backend),
                            self.config.poll_interval(),
                        )));
                    }
                },
                PodiumState::Admin(screen) => match screens::admin::ui(ui, screen) {
                    AdminAction::Stay => {}
                    AdminAction::Back => next = Some(PodiumState::Home),
                },
                PodiumState::JudgeLogin(login) => match screens::judge_login::ui(ui, login) {
                    JudgeLoginAction::Stay => {}
                    JudgeLoginAction::Back => next = Some(PodiumState::Home),
                    JudgeLoginAction::LoggedIn(judge) => {
                        next = Some(PodiumState::Judge(JudgeSession::mount(
                            Arc::clone(&self.backend),
                            Some(judge),
                            &self.config,
                        )));
                    }
                },
                PodiumState::Judge(session) => match screens::judge::ui(ui, session) {
                    JudgeAction::Stay => {}
                    JudgeAction::Back => next = Some(PodiumState::Home),
                },
                PodiumState::Bystander(board) => match screens::bystander::ui(ui, board) {
                    BystanderAction::Stay => {}
                    BystanderAction::Back => next = Some(PodiumState::Home),
                },
            }
        });
        if let Some(next) = next {
            self.navigate(next);
            ctx.request_repaint();
        }
    }
}

fn init_tracing() -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true);

    let _ = fs::create_dir_all("logs");
    let file_appender = tracing_appender::rolling::daily("logs", "podium.log");
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer)
        .with_target(true);

    let init_result = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    if let Err(err) = init_result {
        eprintln!("tracing init failed: {err}");
        return None;
    }

    Some(file_guard)
}

fn main() -> anyhow::Result<()> {
    let _log_guard = init_tracing();
    info!("Starting Podium");

    let config = load_podium_config().context("Failed to load configuration")?;
    info!(
        "Backend {} polled every {:?}",
        config.api_base_url,
        config.poll_interval()
    );

    // Pollers are spawned from the UI thread, so the runtime stays entered for the
    // whole event loop.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap_or_log();
    let _runtime_guard = runtime.enter();

    let backend = Arc::new(HttpBackend::new(config.api_base_url.clone()));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 720.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Podium",
        options,
        Box::new(move |cc| {
            let mut style = (*cc.egui_ctx.style()).clone();
            style
                .text_styles
                .insert(egui::TextStyle::Heading, egui::FontId::proportional(30.0));
            style
                .text_styles
                .insert(egui::TextStyle::Body, egui::FontId::proportional(18.0));
            style
                .text_styles
                .insert(egui::TextStyle::Button, egui::FontId::proportional(18.0));
            style.spacing.button_padding = egui::vec2(12.0, 7.0);
            cc.egui_ctx.set_style(style);

            Ok(Box::new(PodiumApp::new(backend, config)))
        }),
    )
    .map_err(|err| anyhow::anyhow!("eframe exited with an error: {err}"))
}
