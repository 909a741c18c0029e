//! Observable in-memory state for all playthroughs.
//!
//! The store is the single source of truth while the engine runs. Durable
//! storage only ever receives snapshots read from here.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use nuzlocke_domain::{LocationId, Playthrough, PlaythroughId};

/// What changed in the store. Sent to subscribers after the change is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Slots at these locations changed (including variant keys).
    EncountersChanged {
        playthrough_id: PlaythroughId,
        locations: Vec<LocationId>,
    },
    /// Name, game mode or custom locations changed.
    PlaythroughChanged { playthrough_id: PlaythroughId },
    PlaythroughAdded { playthrough_id: PlaythroughId },
    PlaythroughRemoved { playthrough_id: PlaythroughId },
    ActiveChanged { playthrough_id: Option<PlaythroughId> },
    /// Everything was replaced from durable storage.
    Loaded,
}

/// Handle returned by [`PlaythroughStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&StoreEvent) + Send + Sync + 'static>;

#[derive(Default)]
struct State {
    /// Insertion order is the order shown to the user and written to the index.
    playthroughs: Vec<Playthrough>,
    active: Option<PlaythroughId>,
}

impl State {
    fn position(&self, id: PlaythroughId) -> Option<usize> {
        self.playthroughs.iter().position(|run| run.id() == id)
    }
}

/// Playthrough state container with subscribe/emit.
///
/// All mutation goes through closures run under the write lock, so a change
/// is fully applied before anyone (reader, subscriber, flush) can observe it.
/// Subscribers are invoked after the lock is released and may call back into
/// the store.
#[derive(Default)]
pub struct PlaythroughStore {
    state: RwLock<State>,
    subscribers: Mutex<Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: AtomicU64,
}

impl PlaythroughStore {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn active_id(&self) -> Option<PlaythroughId> {
        self.read_state().active
    }

    /// Ids in display order.
    pub fn ids(&self) -> Vec<PlaythroughId> {
        self.read_state()
            .playthroughs
            .iter()
            .map(Playthrough::id)
            .collect()
    }

    pub fn get(&self, id: PlaythroughId) -> Option<Playthrough> {
        self.read(id, Clone::clone)
    }

    pub fn active(&self) -> Option<Playthrough> {
        self.read_active(Clone::clone)
    }

    pub fn list(&self) -> Vec<Playthrough> {
        self.read_state().playthroughs.clone()
    }

    /// Run `f` against one playthrough without cloning it.
    pub fn read<R>(&self, id: PlaythroughId, f: impl FnOnce(&Playthrough) -> R) -> Option<R> {
        let state = self.read_state();
        state.position(id).map(|i| f(&state.playthroughs[i]))
    }

    pub fn read_active<R>(&self, f: impl FnOnce(&Playthrough) -> R) -> Option<R> {
        let state = self.read_state();
        let id = state.active?;
        state.position(id).map(|i| f(&state.playthroughs[i]))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Apply `f` to the active playthrough. `None` if nothing is active.
    pub fn update_active<R>(
        &self,
        f: impl FnOnce(&mut Playthrough) -> R,
    ) -> Option<(PlaythroughId, R)> {
        let mut state = self.write_state();
        let id = state.active?;
        let index = state.position(id)?;
        Some((id, f(&mut state.playthroughs[index])))
    }

    /// Apply `f` to one playthrough. `None` if the id is unknown.
    pub fn update<R>(&self, id: PlaythroughId, f: impl FnOnce(&mut Playthrough) -> R) -> Option<R> {
        let mut state = self.write_state();
        let index = state.position(id)?;
        Some(f(&mut state.playthroughs[index]))
    }

    /// Add a playthrough, replacing any with the same id.
    pub fn insert(&self, playthrough: Playthrough) {
        let mut state = self.write_state();
        match state.position(playthrough.id()) {
            Some(index) => state.playthroughs[index] = playthrough,
            None => state.playthroughs.push(playthrough),
        }
    }

    /// Remove a playthrough. If it was active, the first remaining one becomes
    /// active (or none, if the store is now empty).
    pub fn remove(&self, id: PlaythroughId) -> Option<Playthrough> {
        let mut state = self.write_state();
        let index = state.position(id)?;
        let removed = state.playthroughs.remove(index);
        if state.active == Some(id) {
            state.active = state.playthroughs.first().map(Playthrough::id);
        }
        Some(removed)
    }

    /// Switch the active playthrough. Returns `false` for an unknown id or if
    /// it is already active.
    pub fn set_active(&self, id: Option<PlaythroughId>) -> bool {
        let mut state = self.write_state();
        if state.active == id {
            return false;
        }
        if let Some(id) = id {
            if state.position(id).is_none() {
                return false;
            }
        }
        state.active = id;
        true
    }

    /// Replace everything, e.g. after loading from durable storage. An active
    /// id that is not among `playthroughs` falls back to the first one.
    pub fn replace_all(&self, playthroughs: Vec<Playthrough>, active: Option<PlaythroughId>) {
        let mut state = self.write_state();
        let active = active
            .filter(|id| playthroughs.iter().any(|run| run.id() == *id))
            .or_else(|| playthroughs.first().map(Playthrough::id));
        *state = State {
            playthroughs,
            active,
        };
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    pub fn subscribe(&self, callback: impl Fn(&StoreEvent) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(callback)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        let before = subscribers.len();
        subscribers.retain(|(sub, _)| *sub != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Notify every subscriber. Callbacks run on the caller's thread, outside
    /// any store lock.
    pub fn emit(&self, event: StoreEvent) {
        let subscribers: Vec<Subscriber> = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in subscribers {
            callback(&event);
        }
    }

    // Mutations are all-or-nothing, so a poisoned lock never guards a
    // half-applied change.
    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
