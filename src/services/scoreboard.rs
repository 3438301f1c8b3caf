use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{error, info};

use crate::models::{Judge, JudgeId, Performer, PerformerId, ScoreEntry};
use crate::services::api_client::{ApiResult, Backend};
use crate::services::event_status::{EventStatus, watch_event_status};
use crate::services::poller::{Cadence, ViewScope};

pub const MISSING_SCORE: &str = "N/A";

#[derive(Debug)]
pub enum BoardMsg {
    Status(ApiResult<bool>),
    Roster(ApiResult<(Vec<Performer>, Vec<Judge>)>),
    Scores(ApiResult<Vec<ScoreEntry>>),
}

/// Running totals keyed by (performer, judge). Rebuilt from scratch on every refresh.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScoreMatrix {
    cells: HashMap<(PerformerId, JudgeId), f64>,
}

impl ScoreMatrix {
    pub fn from_entries(entries: &[ScoreEntry]) -> Self {
        let cells = entries
            .iter()
            .map(|entry| ((entry.performer_id, entry.judge_id), entry.total_score))
            .collect();
        Self { cells }
    }

    pub fn get(&self, performer_id: PerformerId, judge_id: JudgeId) -> Option<f64> {
        self.cells.get(&(performer_id, judge_id)).copied()
    }

    pub fn cell_text(&self, performer_id: PerformerId, judge_id: JudgeId) -> String {
        match self.get(performer_id, judge_id) {
            Some(total) => total.to_string(),
            None => MISSING_SCORE.to_string(),
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

pub struct BystanderBoard {
    scope: ViewScope<BoardMsg>,
    status: EventStatus,
    performers: Vec<Performer>,
    judges: Vec<Judge>,
    matrix: ScoreMatrix,
    last_updated: Option<DateTime<Local>>,
}

impl BystanderBoard {
    /// Mounts the board: the roster is fetched once, scores and status on `interval`.
    pub fn mount<B: Backend>(backend: Arc<B>, interval: Duration) -> Self {
        let mut scope = ViewScope::new();

        let roster_backend = Arc::clone(&backend);
        scope.spawn_once("roster", async move {
            Some(BoardMsg::Roster(roster_backend.roster().await))
        });

        let scores_backend = Arc::clone(&backend);
        scope.spawn_poll("current-scores", Cadence::Every(interval), move || {
            let backend = Arc::clone(&scores_backend);
            async move { Some(BoardMsg::Scores(backend.current_scores().await)) }
        });

        watch_event_status(
            &mut scope,
            &backend,
            Cadence::Every(interval),
            BoardMsg::Status,
        );
        info!("Bystander board mounted");

        Self {
            scope,
            status: EventStatus::default(),
            performers: Vec::new(),
            judges: Vec::new(),
            matrix: ScoreMatrix::default(),
            last_updated: None,
        }
    }

    pub fn performers(&self) -> &[Performer] {
        &self.performers
    }

    pub fn judges(&self) -> &[Judge] {
        &self.judges
    }

    pub fn matrix(&self) -> &ScoreMatrix {
        &self.matrix
    }

    pub fn event_active(&self) -> bool {
        self.status.is_ongoing()
    }

    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        self.last_updated
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
        info!("Bystander board unmounted");
        self.scope.close();
    }

    fn apply(&mut self, msg: BoardMsg) {
        match msg {
            BoardMsg::Status(result) => {
                self.status.apply(result);
            }
            BoardMsg::Roster(Ok((performers, judges))) => {
                info!(
                    "Roster loaded: {} performers, {} judges",
                    performers.len(),
                    judges.len()
                );
                self.performers = performers;
                self.judges = judges;
            }
            BoardMsg::Roster(Err(err)) => {
                error!("Failed to fetch performers and judges: {err}");
            }
            BoardMsg::Scores(Ok(entries)) => {
                self.matrix = ScoreMatrix::from_entries(&entries);
                self.last_updated = Some(Local::now());
            }
            BoardMsg::Scores(Err(err)) => {
                error!("Failed to fetch current scores: {err}");
            }
        }
    }
}
