//! Judge scoring session: three independent pollers feeding an explicit phase machine.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::models::{
    CategoryScores, Judge, JudgeId, MAX_CATEGORY_SCORE, MIN_CATEGORY_SCORE, Performer,
    PerformerId, ScoreCategory, ScoreSubmission,
};
use crate::services::api_client::{ApiError, ApiResult, Backend};
use crate::services::config_loader::PodiumConfig;
use crate::services::event_status::{EventStatus, watch_event_status};
use crate::services::poller::{Cadence, ViewScope};

pub const NOT_ELIGIBLE_WARNING: &str = "You are not eligible to vote yet. Please wait for your turn.";
pub const NO_EVENT_MESSAGE: &str = "No event in progress.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JudgePhase {
    /// No event running.
    #[default]
    Idle,
    /// Event running, the server has not cleared this judge to score yet.
    WaitingTurn,
    Eligible,
    /// Scores sent; stays ineligible until a poll says otherwise.
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseInput {
    EventStatus(bool),
    Eligibility(bool),
    PerformerChanged,
    ScoresAccepted,
    NextPerformerSet,
}

impl JudgePhase {
    pub fn next(self, input: PhaseInput) -> JudgePhase {
        use JudgePhase::*;
        match (self, input) {
            (_, PhaseInput::EventStatus(false)) => Idle,
            (Idle, PhaseInput::EventStatus(true)) => WaitingTurn,
            (phase, PhaseInput::EventStatus(true)) => phase,
            (Idle, _) => Idle,
            (_, PhaseInput::Eligibility(true)) => Eligible,
            (Eligible, PhaseInput::Eligibility(false)) => WaitingTurn,
            (phase, PhaseInput::Eligibility(false)) => phase,
            (Eligible, PhaseInput::ScoresAccepted) => Submitted,
            (phase, PhaseInput::ScoresAccepted) => phase,
            (_, PhaseInput::PerformerChanged | PhaseInput::NextPerformerSet) => WaitingTurn,
        }
    }

    pub fn can_vote(self) -> bool {
        self == JudgePhase::Eligible
    }

    pub fn event_ongoing(self) -> bool {
        self != JudgePhase::Idle
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Judge or current performer information is missing.")]
    MissingContext,
    #[error("You are not eligible to vote at this time.")]
    NotEligible,
    #[error("Please select a score for every category.")]
    IncompleteScores,
    #[error("Please select a performer.")]
    NoPerformerSelected,
    #[error("Only the designated judge can change the current performer.")]
    NotDesignatedJudge,
    #[error("A request is already in progress.")]
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// A message the judge has to acknowledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScoreForm {
    values: [Option<u8>; 5],
}

impl ScoreForm {
    fn slot(category: ScoreCategory) -> usize {
        match category {
            ScoreCategory::Presentation => 0,
            ScoreCategory::StagePresence => 1,
            ScoreCategory::Choreography => 2,
            ScoreCategory::Timing => 3,
            ScoreCategory::Performance => 4,
        }
    }

    pub fn get(&self, category: ScoreCategory) -> Option<u8> {
        self.values[Self::slot(category)]
    }

    /// Out-of-range values are ignored.
    pub fn set(&mut self, category: ScoreCategory, value: Option<u8>) {
        if let Some(value) = value
            && !(MIN_CATEGORY_SCORE..=MAX_CATEGORY_SCORE).contains(&value)
        {
            warn!("Ignoring out of range score {value} for {}", category.label());
            return;
        }
        self.values[Self::slot(category)] = value;
    }

    pub fn complete(&self) -> Option<CategoryScores> {
        let [presentation, stage_presence, choreography, timing, performance] = self.values;
        Some(CategoryScores {
            presentation: presentation?,
            stage_presence: stage_presence?,
            choreography: choreography?,
            timing: timing?,
            performance: performance?,
        })
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    pub fn clear(&mut self) {
        self.values = [None; 5];
    }
}

#[derive(Debug)]
pub enum JudgeMsg {
    Status(ApiResult<bool>),
    Performers(ApiResult<Vec<Performer>>),
    CurrentPerformer(ApiResult<Option<Performer>>),
    Eligibility(ApiResult<bool>),
    ScoresSubmitted(ApiResult<()>),
    NextPerformerSet(ApiResult<()>),
}

pub struct JudgeSession<B: Backend> {
    backend: Arc<B>,
    scope: ViewScope<JudgeMsg>,
    judge: Option<Judge>,
    designated: bool,
    status: EventStatus,
    ongoing_tx: watch::Sender<bool>,
    phase: JudgePhase,
    performers: Vec<Performer>,
    current_performer: Option<Performer>,
    current_performer_loaded: bool,
    form: ScoreForm,
    next_selection: Option<PerformerId>,
    submit_in_flight: bool,
    next_in_flight: bool,
    notice: Option<Notice>,
}

impl<B: Backend> JudgeSession<B> {
    pub fn mount(backend: Arc<B>, judge: Option<Judge>, config: &PodiumConfig) -> Self {
        let interval = config.poll_interval();
        let designated = config.is_designated_judge(judge.as_ref().and_then(|j| j.email.as_deref()));
        let (ongoing_tx, ongoing_rx) = watch::channel(false);
        let mut scope = ViewScope::new();

        let roster_backend = Arc::clone(&backend);
        scope.spawn_once("performers", async move {
            Some(JudgeMsg::Performers(roster_backend.performers().await))
        });
        watch_event_status(&mut scope, &backend, Cadence::Every(interval), JudgeMsg::Status);
        watch_current_performer(&mut scope, &backend, interval);
        watch_eligibility(
            &mut scope,
            &backend,
            interval,
            judge.as_ref().map(|j| j.judge_id),
            ongoing_rx,
        );

        match &judge {
            Some(judge) => info!(
                "Judge session mounted for {} (id {}, designated={designated})",
                judge.name, judge.judge_id
            ),
            None => warn!("Judge session mounted without a judge identity"),
        }

        Self {
            backend,
            scope,
            judge,
            designated,
            status: EventStatus::default(),
            ongoing_tx,
            phase: JudgePhase::Idle,
            performers: Vec::new(),
            current_performer: None,
            current_performer_loaded: false,
            form: ScoreForm::default(),
            next_selection: None,
            submit_in_flight: false,
            next_in_flight: false,
            notice: None,
        }
    }

    pub fn judge(&self) -> Option<&Judge> {
        self.judge.as_ref()
    }

    #[cfg(test)]
    pub fn phase(&self) -> JudgePhase {
        self.phase
    }

    pub fn event_ongoing(&self) -> bool {
        self.phase.event_ongoing()
    }

    pub fn can_vote(&self) -> bool {
        self.phase.can_vote()
    }

    pub fn is_designated(&self) -> bool {
        self.designated
    }

    pub fn fields_enabled(&self) -> bool {
        self.can_vote() && !self.submit_in_flight
    }

    pub fn next_performer_enabled(&self) -> bool {
        self.designated && self.event_ongoing() && !self.next_in_flight
    }

    pub fn performers(&self) -> &[Performer] {
        &self.performers
    }

    pub fn current_performer(&self) -> Option<&Performer> {
        self.current_performer.as_ref()
    }

    pub fn form(&self) -> &ScoreForm {
        &self.form
    }

    pub fn set_score(&mut self, category: ScoreCategory, value: Option<u8>) {
        self.form.set(category, value);
    }

    pub fn next_selection(&self) -> Option<PerformerId> {
        self.next_selection
    }

    pub fn select_next_performer(&mut self, performer_id: Option<PerformerId>) {
        self.next_selection = performer_id;
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn submit_scores(&mut self) -> Result<(), ActionError> {
        let result = self.start_submit();
        if let Err(err) = &result {
            warn!("Score submission rejected: {err}");
            self.notice = Some(Notice::error(err.to_string()));
        }
        result
    }

    fn start_submit(&mut self) -> Result<(), ActionError> {
        let (Some(judge), Some(performer)) = (&self.judge, &self.current_performer) else {
            return Err(ActionError::MissingContext);
        };
        if !self.can_vote() {
            return Err(ActionError::NotEligible);
        }
        if self.submit_in_flight {
            return Err(ActionError::Busy);
        }
        let scores = self.form.complete().ok_or(ActionError::IncompleteScores)?;

        let submission = ScoreSubmission {
            judge_id: judge.judge_id,
            performer_id: performer.id,
            scores,
        };
        info!(
            "Submitting scores for performer {} as judge {}",
            submission.performer_id, submission.judge_id
        );
        self.submit_in_flight = true;
        let backend = Arc::clone(&self.backend);
        self.scope.spawn_once("submit-scores", async move {
            Some(JudgeMsg::ScoresSubmitted(backend.submit_scores(submission).await))
        });
        Ok(())
    }

    pub fn set_next_performer(&mut self) -> Result<(), ActionError> {
        let result = self.start_set_next();
        if let Err(err) = &result {
            warn!("Next performer rejected: {err}");
            self.notice = Some(Notice::error(err.to_string()));
        }
        result
    }

    fn start_set_next(&mut self) -> Result<(), ActionError> {
        if !self.designated {
            return Err(ActionError::NotDesignatedJudge);
        }
        let performer_id = self.next_selection.ok_or(ActionError::NoPerformerSelected)?;
        if self.next_in_flight {
            return Err(ActionError::Busy);
        }

        info!("Setting current performer to {performer_id}");
        self.next_in_flight = true;
        let backend = Arc::clone(&self.backend);
        self.scope.spawn_once("set-current-performer", async move {
            Some(JudgeMsg::NextPerformerSet(
                backend.set_current_performer(performer_id).await,
            ))
        });
        Ok(())
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
        info!("Judge session unmounted");
        self.scope.close();
    }

    fn transition(&mut self, input: PhaseInput) {
        let next = self.phase.next(input);
        if next != self.phase {
            info!("Judge phase {:?} -> {:?} on {:?}", self.phase, next, input);
            self.phase = next;
        }
    }

    fn refresh_current_performer(&mut self) {
        let backend = Arc::clone(&self.backend);
        self.scope.spawn_once("current-performer-refresh", async move {
            Some(JudgeMsg::CurrentPerformer(backend.current_performer().await))
        });
    }

    fn refresh_eligibility(&mut self) {
        let backend = Arc::clone(&self.backend);
        let judge_id = self.judge.as_ref().map(|judge| judge.judge_id);
        let ongoing = self.status.is_ongoing();
        self.scope.spawn_once("can-vote-refresh", async move {
            Some(JudgeMsg::Eligibility(
                check_eligibility(backend.as_ref(), judge_id, ongoing).await,
            ))
        });
    }

    fn apply(&mut self, msg: JudgeMsg) {
        match msg {
            JudgeMsg::Status(result) => {
                let failed = result.is_err();
                let changed = self.status.apply(result);
                if failed {
                    return;
                }
                let ongoing = self.status.is_ongoing();
                self.ongoing_tx.send_replace(ongoing);
                self.transition(PhaseInput::EventStatus(ongoing));
                if changed {
                    self.refresh_eligibility();
                }
            }
            JudgeMsg::Performers(Ok(performers)) => {
                debug!("Fetched {} performers", performers.len());
                self.performers = performers;
            }
            JudgeMsg::Performers(Err(err)) => {
                error!("Error fetching performers: {err}");
            }
            JudgeMsg::CurrentPerformer(result) => {
                let next = match result {
                    Ok(performer) => performer,
                    Err(err) => {
                        error!("Error fetching current performer: {err}");
                        None
                    }
                };
                let previous_id = self.current_performer.as_ref().map(|p| p.id);
                let next_id = next.as_ref().map(|p| p.id);
                if self.current_performer_loaded && previous_id != next_id {
                    info!("Current performer changed: {previous_id:?} -> {next_id:?}");
                    self.transition(PhaseInput::PerformerChanged);
                }
                self.current_performer = next;
                self.current_performer_loaded = true;
            }
            JudgeMsg::Eligibility(result) => {
                let can_vote = result.unwrap_or_else(|err| {
                    error!("Error checking voting eligibility: {err}");
                    false
                });
                self.transition(PhaseInput::Eligibility(can_vote));
            }
            JudgeMsg::ScoresSubmitted(result) => {
                self.submit_in_flight = false;
                match result {
                    Ok(()) => {
                        info!("Scores submitted");
                        self.form.clear();
                        self.transition(PhaseInput::ScoresAccepted);
                        self.notice = Some(Notice::info("Scores submitted successfully!"));
                    }
                    Err(err) => {
                        error!("Error submitting scores: {err}");
                        self.notice = Some(Notice::error(failure_text(
                            &err,
                            "An error occurred while submitting scores.",
                        )));
                    }
                }
            }
            JudgeMsg::NextPerformerSet(result) => {
                self.next_in_flight = false;
                match result {
                    Ok(()) => {
                        self.next_selection = None;
                        self.refresh_current_performer();
                        self.transition(PhaseInput::NextPerformerSet);
                        self.notice =
                            Some(Notice::info("Current performer updated successfully!"));
                    }
                    Err(err) => {
                        error!("Error updating current performer: {err}");
                        self.notice = Some(Notice::error(failure_text(
                            &err,
                            "An error occurred while updating the current performer.",
                        )));
                    }
                }
            }
        }
    }
}

/// Server-reported failures show the backend's message; anything else gets `fallback`.
fn failure_text(err: &ApiError, fallback: &str) -> String {
    match err.server_message() {
        Some(message) => format!("Error: {message}"),
        None => fallback.to_string(),
    }
}

/// Without a judge or a running event the answer is `false` and no request is made.
async fn check_eligibility<B: Backend>(
    backend: &B,
    judge_id: Option<JudgeId>,
    event_ongoing: bool,
) -> ApiResult<bool> {
    match judge_id {
        Some(judge_id) if event_ongoing => backend.can_vote(judge_id).await,
        _ => Ok(false),
    }
}

fn watch_current_performer<B: Backend>(
    scope: &mut ViewScope<JudgeMsg>,
    backend: &Arc<B>,
    interval: Duration,
) {
    let backend = Arc::clone(backend);
    scope.spawn_poll("current-performer", Cadence::Every(interval), move || {
        let backend = Arc::clone(&backend);
        async move { Some(JudgeMsg::CurrentPerformer(backend.current_performer().await)) }
    });
}

fn watch_eligibility<B: Backend>(
    scope: &mut ViewScope<JudgeMsg>,
    backend: &Arc<B>,
    interval: Duration,
    judge_id: Option<JudgeId>,
    ongoing_rx: watch::Receiver<bool>,
) {
    let backend = Arc::clone(backend);
    scope.spawn_poll("can-vote", Cadence::Every(interval), move || {
        let backend = Arc::clone(&backend);
        let ongoing = *ongoing_rx.borrow();
        async move {
            Some(JudgeMsg::Eligibility(
                check_eligibility(backend.as_ref(), judge_id, ongoing).await,
            ))
        }
    });
}
