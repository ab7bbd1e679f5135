// ABOUTME: Cancellable delayed triggers built on tokio tasks
// ABOUTME: Schedules anchor refreshes after content changes, tree mutations and resizes

use parallax_logging::trace;
use parallax_types::{AnchorConfig, RefreshTrigger};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Runs only the most recently scheduled action, `delay` after scheduling it
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace any pending action with `action`.
    pub fn schedule<F>(&mut self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        }));
    }

    /// Drop the pending action, if any.
    pub fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Turns change notifications into anchor refresh triggers.
///
/// Content changes and rendered-tree mutations are debounced with their own
/// delays. Resizes are delivered immediately.
#[derive(Debug)]
pub struct AnchorRefreshScheduler {
    content: Debouncer,
    mutation: Debouncer,
    tx: mpsc::UnboundedSender<RefreshTrigger>,
}

impl AnchorRefreshScheduler {
    pub fn new(config: &AnchorConfig) -> (Self, mpsc::UnboundedReceiver<RefreshTrigger>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            content: Debouncer::new(config.content_debounce()),
            mutation: Debouncer::new(config.mutation_debounce()),
            tx,
        };
        (scheduler, rx)
    }

    pub fn content_changed(&mut self) {
        Self::schedule(&mut self.content, &self.tx, RefreshTrigger::ContentChanged);
    }

    pub fn tree_mutated(&mut self) {
        Self::schedule(&mut self.mutation, &self.tx, RefreshTrigger::Mutation);
    }

    pub fn resized(&self) {
        trace!("Anchor refresh requested by resize");
        let _ = self.tx.send(RefreshTrigger::Resize);
    }

    pub fn is_pending(&self) -> bool {
        self.content.is_pending() || self.mutation.is_pending()
    }

    /// Cancel every pending refresh.
    pub fn cancel(&mut self) {
        self.content.cancel();
        self.mutation.cancel();
    }

    fn schedule(
        debouncer: &mut Debouncer,
        tx: &mpsc::UnboundedSender<RefreshTrigger>,
        trigger: RefreshTrigger,
    ) {
        trace!(trigger = ?trigger, delay_ms = debouncer.delay().as_millis() as u64, "Scheduling anchor refresh");
        let tx = tx.clone();
        debouncer.schedule(move || {
            let _ = tx.send(trigger);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_only_last_action_runs() {
        let runs = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(120));

        for value in 1..=3 {
            let runs = runs.clone();
            let last = last.clone();
            debouncer.schedule(move || {
                runs.fetch_add(1, Ordering::SeqCst);
                last.store(value, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(last.load(Ordering::SeqCst), 3);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_run() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(30));
        let counter = runs.clone();
        debouncer.schedule(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_delays() {
        let (mut scheduler, mut rx) = AnchorRefreshScheduler::new(&AnchorConfig::default());

        scheduler.resized();
        assert_eq!(rx.try_recv(), Ok(RefreshTrigger::Resize));

        scheduler.content_changed();
        scheduler.tree_mutated();
        tokio::time::sleep(Duration::from_millis(31)).await;
        assert_eq!(rx.try_recv(), Ok(RefreshTrigger::Mutation));
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(90)).await;
        assert_eq!(rx.try_recv(), Ok(RefreshTrigger::ContentChanged));
        assert!(!scheduler.is_pending());
    }
}
