//! Sandbox health monitor.
//!
//! A [`Monitor`] owns one watchdog task per sandbox. The task wakes up on
//! a fixed interval, probes the hypervisor process and then the guest
//! agent, and broadcasts any failure to every registered [`Watcher`].
//!
//! # Lifecycle
//!
//! The watchdog starts lazily with the first [`Monitor::new_watcher`] call
//! and is shared by all later watchers. [`Monitor::stop`] cancels it,
//! waits until it has exited and closes every watcher channel. A stopped
//! monitor starts again on the next `new_watcher` call.
//!
//! # Delivery
//!
//! Each watcher is a bounded channel of [`WATCHER_CHANNEL_SIZE`] slots.
//! Delivery never blocks: when a watcher's buffer is full the notification
//! is dropped for that watcher only. Watchers should not close their own
//! receiver; if one does, it is logged and forgotten.

use sandvm_core::{AgentProbe, Error, HealthCheck, HypervisorProbe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(1);
pub const WATCHER_CHANNEL_SIZE: usize = 128;

/// Receiving end of a monitor subscription.
///
/// Yields `None` once the monitor is stopped.
pub type Watcher = mpsc::Receiver<Arc<Error>>;

#[derive(Clone)]
struct Watchdog {
    generation: u64,
    stop: CancellationToken,
    done: CancellationToken,
}

enum State {
    Idle,
    Running(Watchdog),
    Stopping(Watchdog),
}

struct Shared {
    state: State,
    watchers: Vec<mpsc::Sender<Arc<Error>>>,
    generation: u64,
}

struct MonitorInner {
    hypervisor: Arc<dyn HypervisorProbe>,
    agent: Arc<dyn AgentProbe>,
    check_interval: Duration,
    shared: Mutex<Shared>,
}

impl MonitorInner {
    fn shared(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, err: Error) {
        self.agent.mark_dead();

        let err = Arc::new(err);
        let mut shared = self.shared();

        if !matches!(shared.state, State::Running(_)) {
            return;
        }

        shared.watchers.retain(|watcher| match watcher.try_send(Arc::clone(&err)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(
                    channel_size = WATCHER_CHANNEL_SIZE,
                    "watcher channel is full, dropping notification"
                );
                true
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!("watcher closed its channel, removing it");
                false
            }
        });
    }

    async fn watch_hypervisor(&self) {
        if let Err(e) = self.hypervisor.check().await {
            self.notify(Error::check_failed(HealthCheck::Hypervisor, e));
        }
    }

    async fn watch_agent(&self) {
        if let Err(e) = self.agent.check().await {
            self.notify(Error::check_failed(HealthCheck::Agent, e));
        }
    }
}

impl Drop for MonitorInner {
    fn drop(&mut self) {
        let shared = self.shared.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let State::Running(watchdog) | State::Stopping(watchdog) = &shared.state {
            watchdog.stop.cancel();
        }
    }
}

/// Watches a sandbox's hypervisor and agent and fans failures out to
/// subscribers.
///
/// `Monitor` is cheap to clone; clones share the same watchdog and
/// watchers.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

impl Monitor {
    pub fn new(hypervisor: Arc<dyn HypervisorProbe>, agent: Arc<dyn AgentProbe>) -> Self {
        Self::with_check_interval(hypervisor, agent, DEFAULT_CHECK_INTERVAL)
    }

    pub fn with_check_interval(
        hypervisor: Arc<dyn HypervisorProbe>,
        agent: Arc<dyn AgentProbe>,
        check_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                hypervisor,
                agent,
                check_interval,
                shared: Mutex::new(Shared {
                    state: State::Idle,
                    watchers: Vec::new(),
                    generation: 0,
                }),
            }),
        }
    }

    pub fn check_interval(&self) -> Duration {
        self.inner.check_interval
    }

    /// Registers a new watcher, starting the watchdog if needed.
    ///
    /// Starting the watchdog fails outside a tokio runtime.
    pub fn new_watcher(&self) -> sandvm_core::Result<Watcher> {
        let (tx, rx) = mpsc::channel(WATCHER_CHANNEL_SIZE);

        let mut shared = self.inner.shared();
        if matches!(shared.state, State::Running(_)) {
            shared.watchers.push(tx);
            return Ok(rx);
        }

        let runtime = Handle::try_current()
            .map_err(|e| Error::Runtime(format!("cannot start sandbox monitor: {e}")))?;

        shared.watchers.push(tx);
        let previous = match &shared.state {
            State::Stopping(watchdog) => Some(watchdog.done.clone()),
            _ => None,
        };

        shared.generation += 1;
        let watchdog = Watchdog {
            generation: shared.generation,
            stop: CancellationToken::new(),
            done: CancellationToken::new(),
        };

        runtime.spawn(run_watchdog(
            Arc::downgrade(&self.inner),
            self.inner.check_interval,
            watchdog.clone(),
            previous,
        ));
        tracing::info!(
            interval = ?self.inner.check_interval,
            "sandbox monitor started"
        );

        shared.state = State::Running(watchdog);
        Ok(rx)
    }

    /// Marks the agent dead and delivers `err` to every watcher.
    ///
    /// Does nothing beyond marking the agent when the monitor is not
    /// running.
    pub fn notify(&self, err: Error) {
        self.inner.notify(err);
    }

    /// Stops the watchdog, waits for it to exit and closes all watchers.
    ///
    /// Safe to call on a monitor that is not running.
    pub async fn stop(&self) {
        let watchdog = {
            let mut shared = self.inner.shared();
            match std::mem::replace(&mut shared.state, State::Idle) {
                State::Idle => return,
                State::Running(watchdog) => {
                    // Dropping the senders closes the watcher channels.
                    shared.watchers.clear();
                    shared.state = State::Stopping(watchdog.clone());
                    watchdog
                }
                State::Stopping(watchdog) => {
                    shared.state = State::Stopping(watchdog.clone());
                    watchdog
                }
            }
        };

        watchdog.stop.cancel();
        watchdog.done.cancelled().await;

        let mut shared = self.inner.shared();
        if let State::Stopping(current) = &shared.state {
            if current.generation == watchdog.generation {
                shared.state = State::Idle;
            }
        }
        tracing::info!("sandbox monitor stopped");
    }

    pub fn is_running(&self) -> bool {
        matches!(self.inner.shared().state, State::Running(_))
    }

    pub fn watcher_count(&self) -> usize {
        self.inner.shared().watchers.len()
    }
}

async fn run_watchdog(
    inner: Weak<MonitorInner>,
    check_interval: Duration,
    watchdog: Watchdog,
    previous: Option<CancellationToken>,
) {
    let _done = watchdog.done.drop_guard();

    // A watchdog restarted during a stop waits for its predecessor to exit.
    if let Some(previous) = previous {
        tokio::select! {
            _ = watchdog.stop.cancelled() => return,
            _ = previous.cancelled() => {}
        }
    }

    let mut ticker = tokio::time::interval_at(Instant::now() + check_interval, check_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = watchdog.stop.cancelled() => break,
            _ = ticker.tick() => {
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                inner.watch_hypervisor().await;
                inner.watch_agent().await;
            }
        }
    }

    tracing::debug!(generation = watchdog.generation, "watchdog exited");
}
