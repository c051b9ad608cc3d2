//! Status poller - fixed-delay refresh for in-flight publishes
//!
//! Watches the selected target while its newest history record is pending
//! (status 202) and refreshes the status on a fixed delay until the attempt
//! resolves. Each watch is a cancellable task keyed by target name; a
//! generation counter fences late completions so a stale timer result is
//! never applied after the watch was cancelled or replaced.
//!
//! A failed refresh does not retry immediately; it is logged and the next
//! attempt follows the normal fixed-delay schedule.

use crate::core::types::{PublishHistoryRecord, PublishTarget};
use crate::services::traits::PublishService;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Options for poller behavior
#[derive(Debug, Clone)]
pub struct PollerOptions {
    /// Fixed delay between refresh attempts
    pub delay: Duration,
}

impl Default for PollerOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(crate::core::config::DEFAULT_POLL_INTERVAL_SECS),
        }
    }
}

/// Result of one scheduled status refresh
#[derive(Debug)]
pub struct PollUpdate {
    /// Target the refresh was issued for
    pub target: String,

    /// Generation of the watch that produced this update
    pub generation: u64,

    /// The refreshed record, or the refresh failure
    pub outcome: anyhow::Result<PublishHistoryRecord>,
}

struct Watch {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Fixed-delay status poller keyed by target name
///
/// Updates are delivered through the receiver returned by [`StatusPoller::new`];
/// the consumer validates them with [`StatusPoller::is_current`] before
/// applying, then calls [`StatusPoller::sync`] again with the refreshed view.
pub struct StatusPoller {
    project_id: String,
    service: Arc<dyn PublishService>,
    delay: Duration,
    watches: Arc<Mutex<HashMap<String, Watch>>>,
    next_generation: AtomicU64,
    tx: UnboundedSender<PollUpdate>,
}

impl StatusPoller {
    /// Create a poller and the channel its updates arrive on
    pub fn new(
        project_id: impl Into<String>,
        service: Arc<dyn PublishService>,
        options: PollerOptions,
    ) -> (Self, UnboundedReceiver<PollUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let poller = Self {
            project_id: project_id.into(),
            service,
            delay: options.delay,
            watches: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
            tx,
        };
        (poller, rx)
    }

    /// Reconcile the watch state with the current selection and its history
    ///
    /// `target` is the resolved selected target (`None` for the "all" view).
    /// Enters Pending-watch when the newest record is pending, or immediately
    /// refreshes when history is empty but the target was published before.
    /// Any watch for a different target is cancelled.
    pub fn sync(&self, target: Option<&PublishTarget>, history: &[PublishHistoryRecord]) {
        let Some(target) = target else {
            self.cancel_all();
            return;
        };

        self.cancel_others(&target.name);

        let pending = history.first().map(|r| r.is_pending()).unwrap_or(false);
        let published_without_history = history.is_empty() && target.last_published.is_some();

        if pending {
            self.ensure_watch(target, false);
        } else if published_without_history {
            self.ensure_watch(target, true);
        } else {
            self.cancel(&target.name);
        }
    }

    /// Whether an update still belongs to the live watch for its target
    pub fn is_current(&self, update: &PollUpdate) -> bool {
        self.watches
            .lock()
            .unwrap()
            .get(&update.target)
            .map(|w| w.generation == update.generation)
            .unwrap_or(false)
    }

    /// Whether a target currently has a live watch
    pub fn is_watching(&self, target_name: &str) -> bool {
        self.watches
            .lock()
            .unwrap()
            .get(target_name)
            .map(|w| !w.handle.is_finished())
            .unwrap_or(false)
    }

    /// Cancel the watch for one target
    pub fn cancel(&self, target_name: &str) {
        if let Some(watch) = self.watches.lock().unwrap().remove(target_name) {
            watch.handle.abort();
        }
    }

    /// Cancel every watch
    pub fn cancel_all(&self) {
        let mut watches = self.watches.lock().unwrap();
        for (_, watch) in watches.drain() {
            watch.handle.abort();
        }
    }

    /// Start a watch for a target unless a live one already exists
    ///
    /// With `immediate` the first refresh fires right away; otherwise it is
    /// scheduled after the fixed delay.
    fn ensure_watch(&self, target: &PublishTarget, immediate: bool) -> u64 {
        let mut watches = self.watches.lock().unwrap();

        if let Some(watch) = watches.get(&target.name) {
            if !watch.handle.is_finished() {
                return watch.generation;
            }
        }

        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let service = Arc::clone(&self.service);
        let project_id = self.project_id.clone();
        let target = target.clone();
        let target_name = target.name.clone();
        let delay = self.delay;
        let tx = self.tx.clone();

        let handle = tokio::spawn(async move {
            let mut first = true;
            loop {
                if !(immediate && first) {
                    sleep(delay).await;
                }
                first = false;

                let outcome = service.fetch_publish_status(&project_id, &target).await;
                let resolved = matches!(&outcome, Ok(record) if !record.is_pending());

                if let Err(error) = &outcome {
                    tracing::warn!(
                        profile = %target.name,
                        %error,
                        "status refresh failed; next attempt follows the fixed delay"
                    );
                }

                let update = PollUpdate {
                    target: target.name.clone(),
                    generation,
                    outcome,
                };
                if tx.send(update).is_err() {
                    break;
                }
                if resolved {
                    break;
                }
            }
        });

        watches.insert(target_name, Watch { generation, handle });
        generation
    }

    /// Cancel every watch except the one for `keep`
    fn cancel_others(&self, keep: &str) {
        let mut watches = self.watches.lock().unwrap();
        let stale: Vec<String> = watches.keys().filter(|k| *k != keep).cloned().collect();
        for name in stale {
            if let Some(watch) = watches.remove(&name) {
                watch.handle.abort();
            }
        }
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
