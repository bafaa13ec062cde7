//! # Reminder Scheduler
//!
//! One-shot delayed tasks keyed by chat id. Scheduling a new task for a
//! key aborts whatever was pending for it, so a chat never carries more
//! than one live reminder.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Default)]
pub struct ReminderScheduler {
    jobs: Mutex<HashMap<i64, JoinHandle<()>>>,
}

impl ReminderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `fut` after `delay`, replacing any pending job for `key`
    pub fn schedule<F>(&self, key: i64, delay: Duration, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fut.await;
        });

        let mut jobs = match self.jobs.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(old) = jobs.insert(key, handle) {
            debug!(key, "Replacing pending reminder");
            old.abort();
        }
    }

    /// Cancel the pending job for `key`, if any
    pub fn cancel(&self, key: i64) -> bool {
        let mut jobs = match self.jobs.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match jobs.remove(&key) {
            Some(handle) => {
                handle.abort();
                debug!(key, "Cancelled pending reminder");
                true
            }
            None => false,
        }
    }

    /// Number of pending jobs, including finished ones not yet reaped
    pub fn pending(&self) -> usize {
        match self.jobs.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_schedule_fires_after_delay() {
        let scheduler = ReminderScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired2 = fired.clone();

        scheduler.schedule(1, Duration::from_millis(10), async move {
            fired2.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_prevents_firing() {
        let scheduler = ReminderScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired2 = fired.clone();

        scheduler.schedule(1, Duration::from_millis(50), async move {
            fired2.fetch_add(1, Ordering::SeqCst);
        });
        assert!(scheduler.cancel(1));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reschedule_replaces_pending_job() {
        let scheduler = ReminderScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let first = fired.clone();
        scheduler.schedule(7, Duration::from_millis(50), async move {
            first.fetch_add(10, Ordering::SeqCst);
        });
        let second = fired.clone();
        scheduler.schedule(7, Duration::from_millis(10), async move {
            second.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending(), 1);
    }

    #[tokio::test]
    async fn test_cancel_missing_key_is_noop() {
        let scheduler = ReminderScheduler::new();
        assert!(!scheduler.cancel(99));
    }
}
