//! Once-per-second progress ticks and the elapsed-time display they drive
//!
//! A [`Ticker`] is a cancellable periodic task on the global runtime. Ticks
//! only reach the display through a [`SessionToken`], and a token stops
//! working the moment its session ends. The check happens under the display
//! lock, so a tick already in flight when `end_session` runs cannot write.

use crate::tokio_runtime;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Interval between progress ticks
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Shared elapsed-time text shown while a session runs
#[derive(Clone, Debug, Default)]
pub struct ElapsedDisplay {
    inner: Arc<Mutex<DisplayInner>>,
}

#[derive(Debug, Default)]
struct DisplayInner {
    text: Option<String>,
    session: u64,
    live: bool,
    updates: u64,
}

impl ElapsedDisplay {
    pub fn new(text: Option<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(DisplayInner {
                text,
                ..DisplayInner::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DisplayInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn text(&self) -> Option<String> {
        self.lock().text.clone()
    }

    /// Number of writes accepted from ticks
    pub fn updates(&self) -> u64 {
        self.lock().updates
    }

    /// Start a new session, invalidating every earlier token
    pub fn begin_session(&self, text: Option<String>) -> SessionToken {
        let mut inner = self.lock();
        inner.session += 1;
        inner.live = true;
        inner.text = text;
        SessionToken {
            display: self.clone(),
            session: inner.session,
        }
    }

    /// End the current session and show `text`
    pub fn end_session(&self, text: Option<String>) {
        let mut inner = self.lock();
        inner.live = false;
        inner.text = text;
    }
}

/// Write access to the display for one session
#[derive(Clone, Debug)]
pub struct SessionToken {
    display: ElapsedDisplay,
    session: u64,
}

impl SessionToken {
    /// Show `text` if the session is still live; returns whether it was shown
    pub fn publish(&self, text: String) -> bool {
        let mut inner = self.display.lock();
        if !inner.live || inner.session != self.session {
            return false;
        }
        inner.text = Some(text);
        inner.updates += 1;
        true
    }
}

/// Cancellable periodic callback
///
/// The first tick fires immediately. The ticker ends when cancelled, when
/// dropped, or when `on_tick` returns false.
pub struct Ticker {
    alive: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn start<F>(interval: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let alive = Arc::new(AtomicBool::new(true));
        let flag = alive.clone();

        let task = tokio_runtime::handle().spawn(async move {
            let mut interval = tokio::time::interval(interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !flag.load(Ordering::SeqCst) || !on_tick() {
                    break;
                }
            }
            flag.store(false, Ordering::SeqCst);
        });

        Self {
            alive,
            task: Some(task),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    pub fn cancel(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread::sleep;

    #[test]
    fn test_token_is_dead_after_session_ends() {
        let display = ElapsedDisplay::new(None);
        let token = display.begin_session(Some("00:00:00".to_string()));
        assert!(token.publish("00:00:01".to_string()));
        assert_eq!(display.text().as_deref(), Some("00:00:01"));

        display.end_session(Some("00:00:00".to_string()));
        assert!(!token.publish("00:00:02".to_string()));
        assert_eq!(display.text().as_deref(), Some("00:00:00"));
        assert_eq!(display.updates(), 1);
    }

    #[test]
    fn test_stale_token_cannot_write_into_next_session() {
        let display = ElapsedDisplay::new(None);
        let first = display.begin_session(None);
        display.end_session(None);
        let second = display.begin_session(None);

        assert!(!first.publish("stale".to_string()));
        assert!(second.publish("fresh".to_string()));
        assert_eq!(display.text().as_deref(), Some("fresh"));
    }

    #[test]
    fn test_ticker_fires_until_cancelled() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let mut ticker = Ticker::start(Duration::from_millis(5), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });

        sleep(Duration::from_millis(60));
        assert!(ticker.is_alive());
        ticker.cancel();
        assert!(!ticker.is_alive());
        sleep(Duration::from_millis(10));
        let fired = count.load(Ordering::SeqCst);
        assert!(fired >= 2, "expected several ticks, got {}", fired);

        sleep(Duration::from_millis(40));
        assert_eq!(count.load(Ordering::SeqCst), fired);
    }

    #[test]
    fn test_ticker_ends_when_callback_declines() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let ticker = Ticker::start(Duration::from_millis(5), move || {
            counter.fetch_add(1, Ordering::SeqCst) < 2
        });

        sleep(Duration::from_millis(80));
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(!ticker.is_alive());
    }
}
