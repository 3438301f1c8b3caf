//! Scripted in-memory backend for view tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::models::{
    FinalScoreEntry, Judge, JudgeId, Performer, PerformerId, ScoreEntry, ScoreSubmission,
};
use crate::services::api_client::{ApiError, ApiResult, Backend};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    EventStatus,
    ChangeEvent,
    FinalScores,
    Roster,
    CurrentScores,
    Performers,
    CurrentPerformer,
    CanVote,
    SubmitScores,
    SetCurrentPerformer,
    JudgeLogin,
}

struct FakeState {
    event_status: ApiResult<bool>,
    change_event_error: Option<ApiError>,
    final_scores: ApiResult<Vec<FinalScoreEntry>>,
    performers: Vec<Performer>,
    judges: Vec<Judge>,
    roster_error: Option<ApiError>,
    current_scores: ApiResult<Vec<ScoreEntry>>,
    current_performer: ApiResult<Option<Performer>>,
    can_vote: ApiResult<bool>,
    submit_result: ApiResult<()>,
    set_performer_result: ApiResult<()>,
    login_result: ApiResult<Judge>,
    submissions: Vec<ScoreSubmission>,
    latency: HashMap<Endpoint, Duration>,
    calls: HashMap<Endpoint, usize>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            event_status: Ok(false),
            change_event_error: None,
            final_scores: Ok(Vec::new()),
            performers: Vec::new(),
            judges: Vec::new(),
            roster_error: None,
            current_scores: Ok(Vec::new()),
            current_performer: Ok(None),
            can_vote: Ok(false),
            submit_result: Ok(()),
            set_performer_result: Ok(()),
            login_result: Err(ApiError::Server {
                status: 401,
                message: "Invalid email or password".to_string(),
            }),
            submissions: Vec::new(),
            latency: HashMap::new(),
            calls: HashMap::new(),
        }
    }
}

#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

pub fn performer(id: PerformerId, name: &str) -> Performer {
    Performer {
        id,
        name: name.to_string(),
    }
}

pub fn judge(judge_id: JudgeId, name: &str, email: Option<&str>) -> Judge {
    Judge {
        judge_id,
        name: name.to_string(),
        email: email.map(str::to_string),
        weight: Some(1.0),
    }
}

pub fn server_error(message: &str) -> ApiError {
    ApiError::Server {
        status: 400,
        message: message.to_string(),
    }
}

impl FakeBackend {
    fn with_state<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    async fn hit(&self, endpoint: Endpoint) {
        let delay = self.with_state(|state| {
            *state.calls.entry(endpoint).or_default() += 1;
            state.latency.get(&endpoint).copied()
        });
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.with_state(|state| state.calls.get(&endpoint).copied().unwrap_or(0))
    }

    pub fn set_latency(&self, endpoint: Endpoint, delay: Duration) {
        self.with_state(|state| {
            state.latency.insert(endpoint, delay);
        });
    }

    pub fn set_event_ongoing(&self, ongoing: bool) {
        self.with_state(|state| state.event_status = Ok(ongoing));
    }

    pub fn set_event_status(&self, result: ApiResult<bool>) {
        self.with_state(|state| state.event_status = result);
    }

    pub fn fail_change_event(&self, err: ApiError) {
        self.with_state(|state| state.change_event_error = Some(err));
    }

    pub fn set_final_scores(&self, result: ApiResult<Vec<FinalScoreEntry>>) {
        self.with_state(|state| state.final_scores = result);
    }

    pub fn set_roster(&self, performers: Vec<Performer>, judges: Vec<Judge>) {
        self.with_state(|state| {
            state.performers = performers;
            state.judges = judges;
        });
    }

    pub fn fail_roster(&self, err: ApiError) {
        self.with_state(|state| state.roster_error = Some(err));
    }

    pub fn set_current_scores(&self, result: ApiResult<Vec<ScoreEntry>>) {
        self.with_state(|state| state.current_scores = result);
    }

    pub fn set_current_performer_result(&self, result: ApiResult<Option<Performer>>) {
        self.with_state(|state| state.current_performer = result);
    }

    pub fn set_can_vote(&self, result: ApiResult<bool>) {
        self.with_state(|state| state.can_vote = result);
    }

    pub fn set_submit_result(&self, result: ApiResult<()>) {
        self.with_state(|state| state.submit_result = result);
    }

    pub fn set_next_performer_result(&self, result: ApiResult<()>) {
        self.with_state(|state| state.set_performer_result = result);
    }

    pub fn set_login_result(&self, result: ApiResult<Judge>) {
        self.with_state(|state| state.login_result = result);
    }

    pub fn submissions(&self) -> Vec<ScoreSubmission> {
        self.with_state(|state| state.submissions.clone())
    }
}

impl Backend for FakeBackend {
    async fn event_status(&self) -> ApiResult<bool> {
        self.hit(Endpoint::EventStatus).await;
        self.with_state(|state| state.event_status.clone())
    }

    async fn change_event(&self) -> ApiResult<bool> {
        self.hit(Endpoint::ChangeEvent).await;
        self.with_state(|state| {
            if let Some(err) = state.change_event_error.clone() {
                return Err(err);
            }
            let current = state.event_status.clone().unwrap_or(false);
            state.event_status = Ok(!current);
            Ok(!current)
        })
    }

    async fn final_scores(&self) -> ApiResult<Vec<FinalScoreEntry>> {
        self.hit(Endpoint::FinalScores).await;
        self.with_state(|state| state.final_scores.clone())
    }

    async fn roster(&self) -> ApiResult<(Vec<Performer>, Vec<Judge>)> {
        self.hit(Endpoint::Roster).await;
        self.with_state(|state| match state.roster_error.clone() {
            Some(err) => Err(err),
            None => Ok((state.performers.clone(), state.judges.clone())),
        })
    }

    async fn current_scores(&self) -> ApiResult<Vec<ScoreEntry>> {
        self.hit(Endpoint::CurrentScores).await;
        self.with_state(|state| state.current_scores.clone())
    }

    async fn performers(&self) -> ApiResult<Vec<Performer>> {
        self.hit(Endpoint::Performers).await;
        self.with_state(|state| match state.roster_error.clone() {
            Some(err) => Err(err),
            None => Ok(state.performers.clone()),
        })
    }

    async fn current_performer(&self) -> ApiResult<Option<Performer>> {
        self.hit(Endpoint::CurrentPerformer).await;
        self.with_state(|state| state.current_performer.clone())
    }

    async fn can_vote(&self, _judge_id: JudgeId) -> ApiResult<bool> {
        self.hit(Endpoint::CanVote).await;
        self.with_state(|state| state.can_vote.clone())
    }

    async fn submit_scores(&self, submission: ScoreSubmission) -> ApiResult<()> {
        self.hit(Endpoint::SubmitScores).await;
        self.with_state(|state| {
            let result = state.submit_result.clone();
            if result.is_ok() {
                state.submissions.push(submission);
            }
            result
        })
    }

    async fn set_current_performer(&self, performer_id: PerformerId) -> ApiResult<()> {
        self.hit(Endpoint::SetCurrentPerformer).await;
        self.with_state(|state| {
            let result = state.set_performer_result.clone();
            if result.is_ok() {
                let next = state
                    .performers
                    .iter()
                    .find(|performer| performer.id == performer_id)
                    .cloned();
                state.current_performer = Ok(next);
            }
            result
        })
    }

    async fn judge_login(&self, _email: String, _password: String) -> ApiResult<Judge> {
        self.hit(Endpoint::JudgeLogin).await;
        self.with_state(|state| state.login_result.clone())
    }
}
