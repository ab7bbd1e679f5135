// ABOUTME: Observes the editor's scroll offset through subscriptions or polling
// ABOUTME: Both strategies deliver notifications through one channel and stop on dispose

use parallax_core::{ScrollCallback, ScrollEventSource, SubscriptionId};
use parallax_logging::{debug, trace};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// The editor's scroll offset changed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollNotification {
    pub offset: f32,
}

/// How the observer learns about scrolls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverStrategy {
    Subscription,
    Polling,
}

/// Watches one editor's scroll offset until disposed
pub struct ScrollOffsetObserver {
    source: Arc<dyn ScrollEventSource>,
    strategy: ObserverStrategy,
    subscription: Option<SubscriptionId>,
    poll_task: Option<JoinHandle<()>>,
    last_offset: Arc<Mutex<Option<f32>>>,
}

impl ScrollOffsetObserver {
    /// Attach to `source`, preferring its subscription capability.
    ///
    /// Sources without subscriptions, or whose subscriptions are unreliable,
    /// are polled every `poll_interval`; a notification is sent only when the
    /// offset differs from the last one seen. Must be called inside a tokio
    /// runtime when polling is needed.
    pub fn attach(
        source: Arc<dyn ScrollEventSource>,
        poll_interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<ScrollNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let last_offset = Arc::new(Mutex::new(None));

        let subscription = if source.is_reliable() {
            let tx = tx.clone();
            let last = last_offset.clone();
            let callback: ScrollCallback = Arc::new(move |offset| {
                *last.lock() = Some(offset);
                let _ = tx.send(ScrollNotification { offset });
            });
            source.subscribe_scroll(callback)
        } else {
            None
        };

        let mut observer = Self {
            source,
            strategy: ObserverStrategy::Subscription,
            subscription,
            poll_task: None,
            last_offset,
        };

        if observer.subscription.is_none() {
            observer.strategy = ObserverStrategy::Polling;
            observer.poll_task = Some(observer.spawn_poll(poll_interval, tx));
        }

        debug!(strategy = ?observer.strategy, "Attached scroll observer");
        (observer, rx)
    }

    fn spawn_poll(
        &self,
        interval: Duration,
        tx: mpsc::UnboundedSender<ScrollNotification>,
    ) -> JoinHandle<()> {
        let source = self.source.clone();
        let last_offset = self.last_offset.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(offset) = source.scroll_top() else {
                    continue;
                };

                let changed = {
                    let mut last = last_offset.lock();
                    let changed = *last != Some(offset);
                    *last = Some(offset);
                    changed
                };
                if changed {
                    trace!(offset, "Polled scroll offset changed");
                    if tx.send(ScrollNotification { offset }).is_err() {
                        break;
                    }
                }
            }
        })
    }

    pub fn strategy(&self) -> ObserverStrategy {
        self.strategy
    }

    /// Offset seen most recently, if any.
    pub fn last_offset(&self) -> Option<f32> {
        *self.last_offset.lock()
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some() || self.poll_task.is_some()
    }

    /// Stop observing. Safe to call more than once.
    pub fn dispose(&mut self) {
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
        if let Some(id) = self.subscription.take() {
            self.source.unsubscribe_scroll(id);
        }
    }
}

impl Drop for ScrollOffsetObserver {
    fn drop(&mut self) {
        self.dispose();
    }
}
