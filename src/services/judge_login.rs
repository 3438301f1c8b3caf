use std::sync::Arc;

use tracing::{info, warn};

use crate::models::Judge;
use crate::services::api_client::{ApiResult, Backend};
use crate::services::poller::ViewScope;

pub const MISSING_CREDENTIALS: &str = "Please enter both email and password.";
const LOGIN_FAILED: &str = "Login failed. Please try again.";

#[derive(Debug)]
pub struct LoginMsg {
    generation: u64,
    result: ApiResult<Judge>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoginState {
    Editing,
    Pending,
    Failed(String),
    LoggedIn(Judge),
}

pub struct JudgeLogin<B: Backend> {
    backend: Arc<B>,
    scope: ViewScope<LoginMsg>,
    pub email: String,
    pub password: String,
    state: LoginState,
    generation: u64,
}

impl<B: Backend> JudgeLogin<B> {
    pub fn mount(backend: Arc<B>) -> Self {
        Self {
            backend,
            scope: ViewScope::new(),
            email: String::new(),
            password: String::new(),
            state: LoginState::Editing,
            generation: 0,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == LoginState::Pending
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            LoginState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Hands over the judge once, after a successful login.
    pub fn take_judge(&mut self) -> Option<Judge> {
        match std::mem::replace(&mut self.state, LoginState::Editing) {
            LoginState::LoggedIn(judge) => Some(judge),
            other => {
                self.state = other;
                None
            }
        }
    }

    pub fn login(&mut self) {
        let email = self.email.trim().to_string();
        if email.is_empty() || self.password.is_empty() {
            self.state = LoginState::Failed(MISSING_CREDENTIALS.to_string());
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        let password = self.password.clone();
        let backend = Arc::clone(&self.backend);
        info!("Logging in judge {email}");
        self.state = LoginState::Pending;
        self.scope.spawn_once("judge-login", async move {
            let result = backend.judge_login(email, password).await;
            Some(LoginMsg { generation, result })
        });
    }

    pub fn pump(&mut self) -> bool {
        let mut applied = false;
        while let Some(msg) = self.scope.try_next() {
            self.apply(msg);
            applied = true;
        }
        applied
    }

    #[cfg(test)]
    pub async fn wait_update(&mut self) -> bool {
        match self.scope.next().await {
            Some(msg) => {
                self.apply(msg);
                true
            }
            None => false,
        }
    }

    pub fn unmount(&mut self) {
        self.scope.close();
    }

    fn apply(&mut self, msg: LoginMsg) {
        if msg.generation != self.generation {
            return;
        }
        match msg.result {
            Ok(judge) => {
                info!("Judge {} (id {}) logged in", judge.name, judge.judge_id);
                self.password.clear();
                self.state = LoginState::LoggedIn(judge);
            }
            Err(err) => {
                warn!("Judge login failed: {err}");
                let message = err
                    .server_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| LOGIN_FAILED.to_string());
                self.state = LoginState::Failed(message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::api_client::ApiError;
    use crate::services::fake_backend::{Endpoint, FakeBackend, judge};
    use std::time::Duration;

    fn filled(backend: &Arc<FakeBackend>) -> JudgeLogin<FakeBackend> {
        let mut login = JudgeLogin::mount(Arc::clone(backend));
        login.email = " judge1@sjsu.edu ".to_string();
        login.password = "secret".to_string();
        login
    }

    #[tokio::test]
    async fn empty_fields_never_reach_the_backend() {
        let backend = Arc::new(FakeBackend::default());
        let mut login = JudgeLogin::mount(Arc::clone(&backend));
        login.email = "judge1@sjsu.edu".to_string();
        login.login();
        assert_eq!(login.error_message(), Some(MISSING_CREDENTIALS));
        assert_eq!(backend.calls(Endpoint::JudgeLogin), 0);
    }

    #[tokio::test]
    async fn success_hands_over_judge_once() {
        let backend = Arc::new(FakeBackend::default());
        backend.set_login_result(Ok(judge(1, "J1", Some("judge1@sjsu.edu"))));
        let mut login = filled(&backend);

        login.login();
        assert!(login.is_pending());
        assert!(login.wait_update().await);

        assert!(login.password.is_empty());
        assert_eq!(login.take_judge().map(|j| j.judge_id), Some(1));
        assert!(login.take_judge().is_none());
    }

    #[tokio::test]
    async fn rejection_shows_server_message() {
        let backend = Arc::new(FakeBackend::default());
        let mut login = filled(&backend);

        login.login();
        assert!(login.wait_update().await);
        assert_eq!(login.error_message(), Some("Invalid email or password"));
        assert!(login.take_judge().is_none());
    }

    #[tokio::test]
    async fn transport_failure_uses_generic_message() {
        let backend = Arc::new(FakeBackend::default());
        backend.set_login_result(Err(ApiError::Transport("refused".into())));
        let mut login = filled(&backend);

        login.login();
        assert!(login.wait_update().await);
        assert_eq!(login.error_message(), Some(LOGIN_FAILED));
    }

    #[tokio::test]
    async fn superseded_attempt_is_ignored() {
        let backend = Arc::new(FakeBackend::default());
        let mut login = filled(&backend);

        login.login();
        login.login();
        login.apply(LoginMsg {
            generation: 1,
            result: Ok(judge(9, "Stale", None)),
        });
        assert!(login.is_pending());

        assert!(login.wait_update().await);
        assert!(login.wait_update().await);
        assert_eq!(login.error_message(), Some("Invalid email or password"));
        assert_eq!(backend.calls(Endpoint::JudgeLogin), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unmount_discards_pending_login() {
        let backend = Arc::new(FakeBackend::default());
        backend.set_login_result(Ok(judge(1, "J1", None)));
        backend.set_latency(Endpoint::JudgeLogin, Duration::from_millis(100));
        let mut login = filled(&backend);

        login.login();
        login.unmount();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!login.pump());
        assert!(login.is_pending());
    }
}
