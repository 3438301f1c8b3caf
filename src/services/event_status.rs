use std::sync::Arc;

use tracing::{info, warn};

use crate::services::api_client::{ApiResult, Backend};
use crate::services::poller::{Cadence, ViewScope};

/// Last known on/off state of the event as seen by one view.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EventStatus {
    is_ongoing: bool,
    loaded: bool,
}

impl EventStatus {
    pub fn is_ongoing(&self) -> bool {
        self.is_ongoing
    }

    /// True once the first fetch finished, whether it succeeded or not.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Applies a poll result. Failures keep the previous value. Returns true when
    /// the ongoing flag changed.
    pub fn apply(&mut self, result: ApiResult<bool>) -> bool {
        self.loaded = true;
        match result {
            Ok(is_ongoing) => {
                let changed = self.is_ongoing != is_ongoing;
                if changed {
                    info!("Event status changed: ongoing={is_ongoing}");
                }
                self.is_ongoing = is_ongoing;
                changed
            }
            Err(err) => {
                warn!("Error fetching event status: {err}");
                false
            }
        }
    }

    /// Adopts a state confirmed by the server outside the regular poll.
    pub fn confirm(&mut self, is_ongoing: bool) {
        self.loaded = true;
        self.is_ongoing = is_ongoing;
    }
}

/// Starts the event status poller on `scope`, mapping each result into the view's
/// own message type.
pub fn watch_event_status<B, M>(
    scope: &mut ViewScope<M>,
    backend: &Arc<B>,
    cadence: Cadence,
    wrap: fn(ApiResult<bool>) -> M,
) where
    B: Backend,
    M: Send + 'static,
{
    let backend = Arc::clone(backend);
    scope.spawn_poll("event-status", cadence, move || {
        let backend = Arc::clone(&backend);
        async move { Some(wrap(backend.event_status().await)) }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::api_client::ApiError;
    use crate::services::fake_backend::{Endpoint, FakeBackend};
    use std::time::Duration;

    #[test]
    fn failure_keeps_previous_value_but_marks_loaded() {
        let mut status = EventStatus::default();
        assert!(!status.is_loaded());
        assert!(status.apply(Ok(true)));
        assert!(!status.apply(Err(ApiError::Transport("refused".into()))));
        assert!(status.is_ongoing());
        assert!(status.is_loaded());
    }

    #[test]
    fn first_failure_still_ends_loading() {
        let mut status = EventStatus::default();
        status.apply(Err(ApiError::Transport("refused".into())));
        assert!(status.is_loaded());
        assert!(!status.is_ongoing());
    }

    #[tokio::test(start_paused = true)]
    async fn repeating_watch_polls_until_closed() {
        let backend = Arc::new(FakeBackend::default());
        backend.set_event_ongoing(true);
        let mut scope: ViewScope<ApiResult<bool>> = ViewScope::new();
        watch_event_status(
            &mut scope,
            &backend,
            Cadence::Every(Duration::from_secs(5)),
            |result| result,
        );

        assert_eq!(scope.next().await, Some(Ok(true)));
        tokio::time::sleep(Duration::from_millis(5_100)).await;
        assert_eq!(backend.calls(Endpoint::EventStatus), 2);

        scope.close();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.calls(Endpoint::EventStatus), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn once_watch_fetches_a_single_time() {
        let backend = Arc::new(FakeBackend::default());
        let mut scope: ViewScope<ApiResult<bool>> = ViewScope::new();
        watch_event_status(&mut scope, &backend, Cadence::Once, |result| result);

        assert_eq!(scope.next().await, Some(Ok(false)));
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.calls(Endpoint::EventStatus), 1);
    }
}
