//! Debounced flush scheduling.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use nuzlocke_domain::PlaythroughId;
use tokio::task::JoinHandle;

#[derive(Default)]
struct Pending {
    timer: Option<JoinHandle<()>>,
    /// Bumped whenever the current timer is replaced or cancelled. A timer
    /// task only acts if its generation is still current.
    generation: u64,
    dirty: BTreeSet<PlaythroughId>,
}

/// Owns at most one pending flush.
///
/// Every `schedule` call marks an id dirty and restarts the timer. When the
/// timer fires, all ids marked since the last flush are handed to the flush
/// callback together. Once the callback has started it is no longer
/// cancellable: a new `schedule` starts a fresh timer instead of aborting a
/// write in progress.
pub struct FlushScheduler {
    delay: Duration,
    pending: Arc<Mutex<Pending>>,
}

impl FlushScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(Mutex::new(Pending::default())),
        }
    }

    /// Mark `id` dirty and (re)start the timer. Must be called from within a
    /// tokio runtime.
    pub fn schedule<F, Fut>(&self, id: PlaythroughId, flush: F)
    where
        F: FnOnce(Vec<PlaythroughId>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut pending = lock(&self.pending);
        pending.dirty.insert(id);
        let generation = pending.restart();

        let delay = self.delay;
        let shared = Arc::clone(&self.pending);
        pending.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(ids) = claim(&shared, generation) {
                flush(ids).await;
            }
        }));
    }

    /// Cancel the timer and return everything that was waiting for it.
    pub fn take_pending(&self) -> Vec<PlaythroughId> {
        let mut pending = lock(&self.pending);
        pending.restart();
        std::mem::take(&mut pending.dirty).into_iter().collect()
    }

    /// Forget `id` without cancelling the timer (used when its record is gone).
    pub fn discard(&self, id: PlaythroughId) {
        lock(&self.pending).dirty.remove(&id);
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.pending).timer.is_some()
    }
}

impl Drop for FlushScheduler {
    fn drop(&mut self) {
        lock(&self.pending).restart();
    }
}

impl Pending {
    /// Cancel the current timer and start a new generation.
    fn restart(&mut self) -> u64 {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.generation += 1;
        self.generation
    }
}

/// Hand the dirty ids to the timer of `generation`, if it is still the
/// current one. A superseded timer that woke before its abort landed leaves
/// both the newer timer and the dirty set alone.
fn claim(pending: &Mutex<Pending>, generation: u64) -> Option<Vec<PlaythroughId>> {
    let mut pending = lock(pending);
    if pending.generation != generation {
        return None;
    }
    pending.timer = None;
    let ids = std::mem::take(&mut pending.dirty);
    (!ids.is_empty()).then(|| ids.into_iter().collect())
}

fn lock(pending: &Mutex<Pending>) -> std::sync::MutexGuard<'_, Pending> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_coalesce_into_one_flush() {
        let scheduler = FlushScheduler::new(Duration::from_millis(500));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let a = PlaythroughId::new();
        let b = PlaythroughId::new();

        for id in [a, b, a, a, b] {
            let tx = tx.clone();
            scheduler.schedule(id, move |ids| async move {
                let _ = tx.send(ids);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        tokio::time::sleep(Duration::from_millis(600)).await;

        let flushed = rx.try_recv().unwrap();
        assert_eq!(flushed.len(), 2);
        assert!(flushed.contains(&a) && flushed.contains(&b));
        assert!(rx.try_recv().is_err());
        assert!(!scheduler.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_flushes_before_the_delay() {
        let scheduler = FlushScheduler::new(Duration::from_millis(500));
        let (tx, mut rx) = mpsc::unbounded_channel();

        scheduler.schedule(PlaythroughId::new(), move |ids| async move {
            let _ = tx.send(ids);
        });
        tokio::time::sleep(Duration::from_millis(499)).await;

        assert!(rx.try_recv().is_err());
        assert!(scheduler.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn take_pending_cancels_the_timer() {
        let scheduler = FlushScheduler::new(Duration::from_millis(500));
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<PlaythroughId>>();
        let id = PlaythroughId::new();

        scheduler.schedule(id, move |ids| async move {
            let _ = tx.send(ids);
        });
        assert_eq!(scheduler.take_pending(), vec![id]);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_timer_leaves_newer_one_alone() {
        let scheduler = FlushScheduler::new(Duration::from_millis(500));
        let id = PlaythroughId::new();
        scheduler.schedule(id, |_| async {});
        let stale = lock(&scheduler.pending).generation;
        scheduler.schedule(id, |_| async {});

        assert_eq!(claim(&scheduler.pending, stale), None);
        assert!(scheduler.is_pending());

        let current = lock(&scheduler.pending).generation;
        assert_eq!(claim(&scheduler.pending, current), Some(vec![id]));
        assert!(!scheduler.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn timer_after_take_pending_does_not_flush_new_edits() {
        let scheduler = FlushScheduler::new(Duration::from_millis(500));
        let id = PlaythroughId::new();
        scheduler.schedule(id, |_| async {});
        let stale = lock(&scheduler.pending).generation;
        scheduler.take_pending();

        lock(&scheduler.pending).dirty.insert(id);
        assert_eq!(claim(&scheduler.pending, stale), None);
        assert_eq!(lock(&scheduler.pending).dirty.len(), 1);
    }
}
