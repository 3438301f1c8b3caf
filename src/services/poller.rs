//! Cancellable polling scoped to a view's lifetime.
//!
//! A [`ViewScope`] owns one cancellation token per mounted view. Every repeating
//! poller and every one-shot request the view issues runs under a child of that
//! token, so dropping the scope stops all of them. Results travel back to the UI
//! thread through an unbounded channel and are only sent while the scope is live.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Fetch once at activation.
    Once,
    /// Fetch at activation, then every period until cancelled.
    Every(Duration),
}

/// Sending half handed to poll tasks. Drops messages once the owning scope is closed.
pub struct Outbox<M> {
    tx: UnboundedSender<M>,
    token: CancellationToken,
}

impl<M> Clone for Outbox<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            token: self.token.clone(),
        }
    }
}

impl<M> Outbox<M> {
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Returns false when the view is gone and the message was discarded.
    pub fn deliver(&self, msg: M) -> bool {
        if !self.is_active() {
            return false;
        }
        self.tx.send(msg).is_ok()
    }
}

pub struct PollHandle {
    name: &'static str,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

pub struct ViewScope<M> {
    token: CancellationToken,
    outbox: Outbox<M>,
    inbox: UnboundedReceiver<M>,
    pollers: Vec<PollHandle>,
}

impl<M: Send + 'static> ViewScope<M> {
    pub fn new() -> Self {
        let token = CancellationToken::new();
        let (tx, inbox) = mpsc::unbounded_channel();
        Self {
            outbox: Outbox {
                tx,
                token: token.clone(),
            },
            token,
            inbox,
            pollers: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn outbox(&self) -> Outbox<M> {
        self.outbox.clone()
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Starts a poller. `fetch` is called once per tick and its result is handed
    /// to the view unless the scope has been closed in the meantime.
    pub fn spawn_poll<F, Fut>(&mut self, name: &'static str, cadence: Cadence, mut fetch: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Option<M>> + Send + 'static,
    {
        let token = self.token.child_token();
        let outbox = Outbox {
            tx: self.outbox.tx.clone(),
            token: token.clone(),
        };
        let task_token = token.clone();
        let task = tokio::spawn(async move {
            match cadence {
                Cadence::Once => {
                    run_tick(name, &task_token, &outbox, fetch()).await;
                }
                Cadence::Every(period) => {
                    let mut interval = tokio::time::interval(period);
                    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    loop {
                        tokio::select! {
                            biased;
                            _ = task_token.cancelled() => break,
                            _ = interval.tick() => {}
                        }
                        if !run_tick(name, &task_token, &outbox, fetch()).await {
                            break;
                        }
                    }
                }
            }
            debug!("poller {name} stopped");
        });
        self.pollers.push(PollHandle { name, token, task });
    }

    /// Runs a single out-of-cadence request under this scope.
    pub fn spawn_once<Fut>(&mut self, name: &'static str, request: Fut)
    where
        Fut: Future<Output = Option<M>> + Send + 'static,
    {
        let mut request = Some(request);
        self.spawn_poll(name, Cadence::Once, move || {
            let pending = request.take();
            async move {
                match pending {
                    Some(request) => request.await,
                    None => None,
                }
            }
        });
        self.pollers.retain(|handle| !handle.is_finished());
    }

    pub fn try_next(&mut self) -> Option<M> {
        self.inbox.try_recv().ok()
    }

    /// Waits for the next message. Returns `None` once the scope is closed.
    #[cfg(test)]
    pub async fn next(&mut self) -> Option<M> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            msg = self.inbox.recv() => msg,
        }
    }

    #[cfg(test)]
    pub fn active_pollers(&self) -> usize {
        self.pollers
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    pub fn close(&mut self) {
        if self.is_active() {
            debug!(
                "closing view scope with pollers {:?}",
                self.pollers.iter().map(PollHandle::name).collect::<Vec<_>>()
            );
        }
        self.token.cancel();
        for handle in &self.pollers {
            handle.cancel();
        }
    }
}

impl<M: Send + 'static> Default for ViewScope<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Drop for ViewScope<M> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Returns false if the scope was cancelled while the fetch was in flight.
async fn run_tick<M, Fut>(
    name: &'static str,
    token: &CancellationToken,
    outbox: &Outbox<M>,
    fetch: Fut,
) -> bool
where
    Fut: Future<Output = Option<M>>,
{
    let result = tokio::select! {
        biased;
        _ = token.cancelled() => return false,
        result = fetch => result,
    };
    if let Some(msg) = result
        && !outbox.deliver(msg)
    {
        debug!("poller {name}: result discarded, view closed");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_fetch(
        counter: &Arc<AtomicUsize>,
    ) -> impl FnMut() -> std::future::Ready<Option<usize>> + Send + 'static {
        let counter = Arc::clone(counter);
        move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(Some(n))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn every_fires_immediately_then_on_cadence() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut scope = ViewScope::new();
        scope.spawn_poll(
            "count",
            Cadence::Every(Duration::from_secs(5)),
            counting_fetch(&calls),
        );

        assert_eq!(scope.next().await, Some(1));
        tokio::time::sleep(Duration::from_millis(10_100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(scope.try_next(), Some(2));
        assert_eq!(scope.try_next(), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn once_fires_a_single_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut scope = ViewScope::new();
        scope.spawn_poll("once", Cadence::Once, counting_fetch(&calls));

        assert_eq!(scope.next().await, Some(1));
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(scope.active_pollers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn close_stops_further_ticks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut scope = ViewScope::new();
        scope.spawn_poll(
            "count",
            Cadence::Every(Duration::from_secs(5)),
            counting_fetch(&calls),
        );
        assert_eq!(scope.next().await, Some(1));

        scope.close();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(scope.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_scope_stops_ticks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut scope = ViewScope::new();
        scope.spawn_poll(
            "count",
            Cadence::Every(Duration::from_secs(5)),
            counting_fetch(&calls),
        );
        assert_eq!(scope.next().await, Some(1));

        drop(scope);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_result_is_discarded_after_close() {
        let mut scope: ViewScope<&'static str> = ViewScope::new();
        let outbox = scope.outbox();
        scope.spawn_once("slow", async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Some("late")
        });

        scope.close();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!outbox.is_active());
        assert_eq!(scope.try_next(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn pollers_keep_independent_clocks() {
        let fast = Arc::new(AtomicUsize::new(0));
        let slow = Arc::new(AtomicUsize::new(0));
        let mut scope = ViewScope::new();
        scope.spawn_poll(
            "fast",
            Cadence::Every(Duration::from_secs(2)),
            counting_fetch(&fast),
        );
        tokio::time::sleep(Duration::from_secs(1)).await;
        scope.spawn_poll(
            "slow",
            Cadence::Every(Duration::from_secs(5)),
            counting_fetch(&slow),
        );

        tokio::time::sleep(Duration::from_millis(9_500)).await;
        // fast: t=0,2,4,6,8,10  slow: t=1,6
        assert_eq!(fast.load(Ordering::SeqCst), 6);
        assert_eq!(slow.load(Ordering::SeqCst), 2);
    }
}
