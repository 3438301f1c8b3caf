use std::future::Future;

use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::models::{
    CanVoteResponse, ChangeEventResponse, CurrentPerformerResponse, CurrentScoresResponse,
    EventStatusResponse, FinalScoreEntry, FinalScoresResponse, Judge, JudgeId, LoginRequest,
    LoginResponse, Performer, PerformerId, PerformersResponse, RosterResponse, ScoreEntry,
    ScoreSubmission, SetCurrentPerformerRequest,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// The message the backend put in its `error` field, if this came from the backend.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Server { message, .. } => Some(message),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Everything the views need from the scoring backend.
pub trait Backend: Send + Sync + 'static {
    fn event_status(&self) -> impl Future<Output = ApiResult<bool>> + Send;
    fn change_event(&self) -> impl Future<Output = ApiResult<bool>> + Send;
    fn final_scores(&self) -> impl Future<Output = ApiResult<Vec<FinalScoreEntry>>> + Send;
    fn roster(&self) -> impl Future<Output = ApiResult<(Vec<Performer>, Vec<Judge>)>> + Send;
    fn current_scores(&self) -> impl Future<Output = ApiResult<Vec<ScoreEntry>>> + Send;
    fn performers(&self) -> impl Future<Output = ApiResult<Vec<Performer>>> + Send;
    fn current_performer(&self) -> impl Future<Output = ApiResult<Option<Performer>>> + Send;
    fn can_vote(&self, judge_id: JudgeId) -> impl Future<Output = ApiResult<bool>> + Send;
    fn submit_scores(
        &self,
        submission: ScoreSubmission,
    ) -> impl Future<Output = ApiResult<()>> + Send;
    fn set_current_performer(
        &self,
        performer_id: PerformerId,
    ) -> impl Future<Output = ApiResult<()>> + Send;
    fn judge_login(
        &self,
        email: String,
        password: String,
    ) -> impl Future<Output = ApiResult<Judge>> + Send;
}

pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send::<T, ()>(Method::GET, path, None).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> ApiResult<T> {
        self.send(Method::POST, path, body).await
    }

    async fn send<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ApiResult<T> {
        let url = self.url(path);
        debug!("{method} {url}");
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        decode_body(status, &bytes)
    }
}

/// Maps a backend response onto the error taxonomy. A body carrying an `error`
/// field is an application error even when the status is 2xx.
pub fn decode_body<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> ApiResult<T> {
    let value: serde_json::Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(err) if status.is_success() => return Err(ApiError::Decode(err.to_string())),
        Err(_) => {
            return Err(ApiError::Server {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string(),
            });
        }
    };

    if let Some(message) = value.get("error").and_then(error_text) {
        return Err(ApiError::Server {
            status: status.as_u16(),
            message,
        });
    }
    if !status.is_success() {
        return Err(ApiError::Server {
            status: status.as_u16(),
            message: status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        });
    }

    serde_json::from_value(value).map_err(|err| ApiError::Decode(err.to_string()))
}

fn error_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

#[derive(serde::Deserialize, Debug)]
struct Ignored {}

impl Backend for HttpBackend {
    async fn event_status(&self) -> ApiResult<bool> {
        let response: EventStatusResponse = self.get("/event-status").await?;
        Ok(response.is_ongoing)
    }

    async fn change_event(&self) -> ApiResult<bool> {
        let response: ChangeEventResponse = self.post::<_, ()>("/change-event", None).await?;
        Ok(response.new_status)
    }

    async fn final_scores(&self) -> ApiResult<Vec<FinalScoreEntry>> {
        let response: FinalScoresResponse = self.get("/final-scores").await?;
        Ok(response.scores)
    }

    async fn roster(&self) -> ApiResult<(Vec<Performer>, Vec<Judge>)> {
        let response: RosterResponse = self.get("/performers-and-judges").await?;
        Ok((response.performers, response.judges))
    }

    async fn current_scores(&self) -> ApiResult<Vec<ScoreEntry>> {
        let response: CurrentScoresResponse = self.get("/current-scores").await?;
        Ok(response.scores)
    }

    async fn performers(&self) -> ApiResult<Vec<Performer>> {
        let response: PerformersResponse = self.get("/performers").await?;
        Ok(response.performers)
    }

    async fn current_performer(&self) -> ApiResult<Option<Performer>> {
        let response: CurrentPerformerResponse = self.get("/current-performer").await?;
        Ok(response.performer)
    }

    async fn can_vote(&self, judge_id: JudgeId) -> ApiResult<bool> {
        let response: CanVoteResponse = self.get(&format!("/canVote/{judge_id}")).await?;
        Ok(response.can_vote)
    }

    async fn submit_scores(&self, submission: ScoreSubmission) -> ApiResult<()> {
        let _: Ignored = self.post("/scores", Some(&submission)).await?;
        Ok(())
    }

    async fn set_current_performer(&self, performer_id: PerformerId) -> ApiResult<()> {
        let body = SetCurrentPerformerRequest { performer_id };
        let _: Ignored = self.post("/set-current-performer", Some(&body)).await?;
        Ok(())
    }

    async fn judge_login(&self, email: String, password: String) -> ApiResult<Judge> {
        let body = LoginRequest { email, password };
        let response: LoginResponse = self.post("/judge/login", Some(&body)).await?;
        Ok(response.judge)
    }
}
