//! Idle-timeout monitor.
//!
//! Activity signals reset a deadline. When the deadline passes with no signal the callback runs
//! once and the monitor disarms; it stays quiet until [`IdleMonitor::rearm`] is called.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use radmin_client::AuthInterceptor;
use radmin_core::ClientConfig;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// User activity that counts as "not idle". Covers pointer and keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivitySignal {
    PointerMove,
    KeyPress,
    Click,
    Touch,
    Scroll,
}

pub type IdleCallback = Arc<dyn Fn() + Send + Sync>;

/// Callback that ends the session through the same path as a rejected token.
#[must_use]
pub fn logout_on_idle(interceptor: AuthInterceptor) -> IdleCallback {
    Arc::new(move || interceptor.force_logout("idle timeout"))
}

#[derive(Default)]
struct Running {
    tx: Option<mpsc::UnboundedSender<ActivitySignal>>,
    task: Option<JoinHandle<()>>,
}

pub struct IdleMonitor {
    timeout: Duration,
    callback: IdleCallback,
    armed: Arc<AtomicBool>,
    running: Mutex<Running>,
}

impl fmt::Debug for IdleMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdleMonitor")
            .field("timeout", &self.timeout)
            .field("armed", &self.is_armed())
            .finish_non_exhaustive()
    }
}

impl IdleMonitor {
    /// Arms a monitor that calls `callback` after `timeout` without activity.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn start(timeout: Duration, callback: IdleCallback) -> Self {
        let monitor = Self {
            timeout,
            callback,
            armed: Arc::new(AtomicBool::new(false)),
            running: Mutex::new(Running::default()),
        };
        monitor.arm(&mut monitor.lock());
        monitor
    }

    #[must_use]
    pub fn from_config(config: &ClientConfig, callback: IdleCallback) -> Self {
        Self::start(config.idle_timeout, callback)
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// Resets the deadline. Ignored once the monitor has fired or been stopped.
    pub fn record_activity(&self, signal: ActivitySignal) {
        if let Some(tx) = &self.lock().tx {
            if tx.send(signal).is_err() {
                tracing::trace!(?signal, "idle monitor not running, activity ignored");
            }
        }
    }

    /// Starts a fresh countdown after the monitor fired or was stopped. Returns `false` when
    /// it is still armed.
    pub fn rearm(&self) -> bool {
        let mut running = self.lock();
        if self.is_armed() {
            return false;
        }
        self.arm(&mut running);
        true
    }

    /// Cancels the countdown without invoking the callback.
    pub fn stop(&self) {
        let mut running = self.lock();
        running.tx = None;
        if let Some(task) = running.task.take() {
            task.abort();
        }
        self.armed.store(false, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, Running> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn arm(&self, running: &mut Running) {
        if let Some(task) = running.task.take() {
            task.abort();
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.armed.store(true, Ordering::SeqCst);
        running.tx = Some(tx);
        running.task = Some(tokio::spawn(countdown(
            self.timeout,
            rx,
            Arc::clone(&self.callback),
            Arc::clone(&self.armed),
        )));
        tracing::debug!(timeout_ms = self.timeout.as_millis(), "idle monitor armed");
    }
}

impl Drop for IdleMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn countdown(
    timeout: Duration,
    mut rx: mpsc::UnboundedReceiver<ActivitySignal>,
    callback: IdleCallback,
    armed: Arc<AtomicBool>,
) {
    let mut deadline = Instant::now() + timeout;
    loop {
        tokio::select! {
            () = tokio::time::sleep_until(deadline) => {
                armed.store(false, Ordering::SeqCst);
                tracing::info!(timeout_ms = timeout.as_millis(), "idle timeout reached");
                callback();
                return;
            },
            signal = rx.recv() => match signal {
                Some(_) => deadline = Instant::now() + timeout,
                None => return,
            },
        }
    }
}
