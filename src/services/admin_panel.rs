use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, error, info, warn};

use crate::models::{FinalScoreEntry, JudgeScore};
use crate::services::api_client::{ApiResult, Backend};
use crate::services::event_status::{EventStatus, watch_event_status};
use crate::services::poller::{Cadence, ViewScope};

pub const REPORT_ERROR_MESSAGE: &str = "Error fetching final scores.";

#[derive(Debug)]
pub enum AdminMsg {
    Status(ApiResult<bool>),
    Toggled(ApiResult<bool>),
    Report {
        generation: u64,
        result: ApiResult<Vec<FinalScoreEntry>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub entry: FinalScoreEntry,
    pub expanded: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ReportState {
    #[default]
    Closed,
    Loading,
    Loaded(Vec<ReportRow>),
    Failed(String),
}

impl ReportState {
    pub fn is_open(&self) -> bool {
        !matches!(self, ReportState::Closed)
    }
}

/// Display-ready line of the final report table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub rank: usize,
    pub performer_name: String,
    pub total: String,
    pub expanded: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JudgeScoreLine {
    pub judge_name: String,
    pub categories: [String; 5],
    pub weight: String,
    pub weighted_score: String,
}

impl From<&JudgeScore> for JudgeScoreLine {
    fn from(score: &JudgeScore) -> Self {
        Self {
            judge_name: score.judge_name.clone(),
            categories: [
                score.presentation.to_string(),
                score.stage_presence.to_string(),
                score.choreography.to_string(),
                score.timing.to_string(),
                score.performance.to_string(),
            ],
            weight: score.weight.to_string(),
            weighted_score: format_score(score.weighted_score),
        }
    }
}

pub fn format_score(score: f64) -> String {
    format!("{score:.2}")
}

pub struct AdminPanel<B: Backend> {
    backend: Arc<B>,
    scope: ViewScope<AdminMsg>,
    status: EventStatus,
    toggle_in_flight: bool,
    report: ReportState,
    report_generation: u64,
}

impl<B: Backend> AdminPanel<B> {
    /// Mounts the panel: the event status is fetched once.
    pub fn mount(backend: Arc<B>) -> Self {
        let mut scope = ViewScope::new();
        watch_event_status(&mut scope, &backend, Cadence::Once, AdminMsg::Status);
        info!("Admin panel mounted");
        Self {
            backend,
            scope,
            status: EventStatus::default(),
            toggle_in_flight: false,
            report: ReportState::Closed,
            report_generation: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        !self.status.is_loaded()
    }

    pub fn event_active(&self) -> bool {
        self.status.is_ongoing()
    }

    #[cfg(test)]
    pub fn toggle_in_flight(&self) -> bool {
        self.toggle_in_flight
    }

    /// Reports only make sense once scoring has stopped.
    pub fn can_view_report(&self) -> bool {
        !self.status.is_ongoing()
    }

    pub fn report(&self) -> &ReportState {
        &self.report
    }

    /// The event cannot be started or stopped while a toggle is pending or the
    /// report is on screen.
    pub fn can_toggle(&self) -> bool {
        !self.toggle_in_flight && !self.report.is_open()
    }

    pub fn toggle_event(&mut self) {
        if !self.can_toggle() {
            debug!("Toggle ignored: in flight or report open");
            return;
        }
        self.toggle_in_flight = true;
        let backend = Arc::clone(&self.backend);
        self.scope.spawn_once("change-event", async move {
            Some(AdminMsg::Toggled(backend.change_event().await))
        });
    }

    pub fn open_report(&mut self) {
        if !self.can_view_report() {
            warn!("Report requested while the event is active");
            return;
        }
        self.report_generation += 1;
        self.report = ReportState::Loading;
        let generation = self.report_generation;
        let backend = Arc::clone(&self.backend);
        self.scope.spawn_once("final-scores", async move {
            Some(AdminMsg::Report {
                generation,
                result: backend.final_scores().await,
            })
        });
    }

    pub fn toggle_details(&mut self, index: usize) {
        if let ReportState::Loaded(rows) = &mut self.report
            && let Some(row) = rows.get_mut(index)
        {
            row.expanded = !row.expanded;
        }
    }

    pub fn close_report(&mut self) {
        // Bumping the generation drops any response still in flight.
        self.report_generation += 1;
        self.report = ReportState::Closed;
    }

    pub fn report_lines(&self) -> Vec<ReportLine> {
        match &self.report {
            ReportState::Loaded(rows) => rows
                .iter()
                .enumerate()
                .map(|(index, row)| ReportLine {
                    rank: index + 1,
                    performer_name: row.entry.performer_name.clone(),
                    total: format_score(row.entry.total_score),
                    expanded: row.expanded,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn judge_lines(&self, index: usize) -> Vec<JudgeScoreLine> {
        match &self.report {
            ReportState::Loaded(rows) => rows
                .get(index)
                .map(|row| row.entry.judge_scores.iter().map(JudgeScoreLine::from).collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    pub fn export_report(&self, path: &Path) -> anyhow::Result<()> {
        let ReportState::Loaded(rows) = &self.report else {
            anyhow::bail!("No report loaded");
        };
        let entries: Vec<&FinalScoreEntry> = rows.iter().map(|row| &row.entry).collect();
        let json = serde_json::to_string_pretty(&entries)?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Report exported to {}", path.display());
        Ok(())
    }

    /// Applies every message that has arrived since the last frame.
    pub fn pump(&mut self) -> bool {
        let mut applied = false;
        while let Some(msg) = self.scope.try_next() {
            self.apply(msg);
            applied = true;
        }
        applied
    }

    /// Waits for one message and applies it. Returns false once the panel is closed.
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
        info!("Admin panel unmounted");
        self.scope.close();
    }

    fn apply(&mut self, msg: AdminMsg) {
        match msg {
            AdminMsg::Status(result) => {
                self.status.apply(result);
            }
            AdminMsg::Toggled(result) => {
                self.toggle_in_flight = false;
                match result {
                    Ok(new_status) => {
                        info!("Event toggled, ongoing={new_status}");
                        self.status.confirm(new_status);
                    }
                    Err(err) => error!("Error toggling event status: {err}"),
                }
            }
            AdminMsg::Report { generation, result } => {
                if generation != self.report_generation || self.report != ReportState::Loading {
                    debug!("Discarding stale report response {generation}");
                    return;
                }
                self.report = match result {
                    Ok(entries) => {
                        info!("Loaded final report with {} performers", entries.len());
                        ReportState::Loaded(
                            entries
                                .into_iter()
                                .map(|entry| ReportRow {
                                    entry,
                                    expanded: false,
                                })
                                .collect(),
                        )
                    }
                    Err(err) => {
                        error!("Error fetching final scores: {err}");
                        ReportState::Failed(REPORT_ERROR_MESSAGE.to_string())
                    }
                };
            }
        }
    }
}
