pub mod admin_panel;
pub mod api_client;
pub mod config_loader;
pub mod event_status;
#[cfg(test)]
pub mod fake_backend;
pub mod judge_flow;
pub mod judge_login;
pub mod poller;
pub mod scoreboard;
