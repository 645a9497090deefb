// src/observable/observable_state.rs
//
// Observable state container.
//
// DESIGN PRINCIPLES:
// 1. Synchronous - observers run inside `set`, on the caller's thread
// 2. Deterministic - observers run in subscription order
// 3. No deduplication - assigning an equal value still broadcasts
// 4. Serialized - concurrent `set` calls broadcast one after another
// 5. Reentrancy-safe - an observer calling `set` on the same cell is queued
//    and applied once the current broadcast completes

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use uuid::Uuid;

/// A change notification: the value before and after a mutation.
///
/// Replays and forced broadcasts carry the current value on both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<T> {
    pub previous: T,
    pub next: T,
}

impl<T: PartialEq> Transition<T> {
    /// True when the value did not actually change.
    pub fn is_replay(&self) -> bool {
        self.previous == self.next
    }
}

/// Opaque handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverToken(Uuid);

impl std::fmt::Display for ObserverToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Observer<T> = Arc<dyn Fn(&Transition<T>) + Send + Sync>;

enum PendingChange<T> {
    Set(T),
    Broadcast,
}

struct Inner<T> {
    value: T,
    observers: Vec<(ObserverToken, Observer<T>)>,
    pending: VecDeque<PendingChange<T>>,
    dispatching_on: Option<ThreadId>,
}

/// A single mutable value that notifies every registered observer on each
/// mutation.
///
/// The container owns its observer list; observers never own the container.
/// Observers added or removed during a broadcast take effect from the next
/// broadcast on.
pub struct ObservableState<T> {
    inner: Mutex<Inner<T>>,

    /// Held for the whole of a broadcast so that broadcasts never interleave
    dispatch: Mutex<()>,
}

impl<T> ObservableState<T>
where
    T: Clone + Send + 'static,
{
    /// Create a cell holding `initial`, with no observers.
    pub fn new(initial: T) -> Self {
        Self {
            inner: Mutex::new(Inner {
                value: initial,
                observers: Vec::new(),
                pending: VecDeque::new(),
                dispatching_on: None,
            }),
            dispatch: Mutex::new(()),
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.lock_inner().value.clone()
    }

    /// Replace the value and notify every observer, even if `value` equals
    /// the current value.
    pub fn set(&self, value: T) {
        self.submit(PendingChange::Set(value));
    }

    /// Re-send `{previous: current, next: current}` to every observer without
    /// touching the value.
    pub fn broadcast_current(&self) {
        self.submit(PendingChange::Broadcast);
    }

    /// Register an observer for subsequent mutations. Does not invoke it.
    pub fn subscribe<F>(&self, observer: F) -> ObserverToken
    where
        F: Fn(&Transition<T>) + Send + Sync + 'static,
    {
        let token = ObserverToken(Uuid::new_v4());
        self.lock_inner().observers.push((token, Arc::new(observer)));
        log::debug!("observer {} subscribed", token);
        token
    }

    /// Invoke `observer` once with the current value on both sides, then
    /// register it.
    ///
    /// No mutation can slip in between the replay and the registration. A
    /// `set` issued by the replay itself is queued and broadcast, to the new
    /// observer included, once it is registered.
    pub fn subscribe_and_replay<F>(&self, observer: F) -> ObserverToken
    where
        F: Fn(&Transition<T>) + Send + Sync + 'static,
    {
        let observer: Observer<T> = Arc::new(observer);

        if self.is_dispatching_here() {
            // Already inside a broadcast on this thread: the outer dispatch
            // drains anything the replay queues.
            return self.replay_and_register(observer);
        }

        let _dispatch = self.dispatch.lock().unwrap_or_else(PoisonError::into_inner);
        let _active = DispatchGuard::begin(&self.inner);
        let token = self.replay_and_register(observer);
        self.drain_pending();
        token
    }

    /// Remove an observer. Unknown tokens are ignored.
    pub fn unsubscribe(&self, token: ObserverToken) {
        let mut inner = self.lock_inner();
        let before = inner.observers.len();
        inner.observers.retain(|(registered, _)| *registered != token);
        if inner.observers.len() < before {
            log::debug!("observer {} unsubscribed", token);
        }
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.lock_inner().observers.len()
    }

    // ========================================================================
    // INTERNAL DISPATCH
    // ========================================================================

    fn submit(&self, change: PendingChange<T>) {
        {
            let mut inner = self.lock_inner();
            if inner.dispatching_on == Some(thread::current().id()) {
                log::warn!("reentrant update queued until the current broadcast completes");
                inner.pending.push_back(change);
                return;
            }
        }

        let _dispatch = self.dispatch.lock().unwrap_or_else(PoisonError::into_inner);
        let _active = DispatchGuard::begin(&self.inner);
        self.apply(change);
        self.drain_pending();
    }

    /// Applies queued changes in order until none are left.
    fn drain_pending(&self) {
        loop {
            let next = self.lock_inner().pending.pop_front();
            match next {
                Some(change) => self.apply(change),
                None => break,
            }
        }
    }

    fn replay_and_register(&self, observer: Observer<T>) -> ObserverToken {
        let current = self.get();
        let replay = Transition {
            previous: current.clone(),
            next: current,
        };
        let token = ObserverToken(Uuid::new_v4());
        notify(token, &observer, &replay);
        self.lock_inner().observers.push((token, observer));
        log::debug!("observer {} subscribed with replay", token);
        token
    }

    fn apply(&self, change: PendingChange<T>) {
        let (transition, observers) = {
            let mut inner = self.lock_inner();
            let transition = match change {
                PendingChange::Set(value) => {
                    let previous = std::mem::replace(&mut inner.value, value);
                    Transition {
                        previous,
                        next: inner.value.clone(),
                    }
                }
                PendingChange::Broadcast => Transition {
                    previous: inner.value.clone(),
                    next: inner.value.clone(),
                },
            };
            let observers: Vec<(ObserverToken, Observer<T>)> = inner
                .observers
                .iter()
                .map(|(token, observer)| (*token, Arc::clone(observer)))
                .collect();
            (transition, observers)
        };

        log::debug!("broadcasting transition to {} observers", observers.len());

        for (token, observer) in &observers {
            notify(*token, observer, &transition);
        }
    }

    fn is_dispatching_here(&self) -> bool {
        self.lock_inner().dispatching_on == Some(thread::current().id())
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for ObservableState<T>
where
    T: Clone + Default + Send + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> std::fmt::Debug for ObservableState<T>
where
    T: Clone + Send + std::fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock_inner();
        f.debug_struct("ObservableState")
            .field("value", &inner.value)
            .field("observers", &inner.observers.len())
            .finish()
    }
}

/// Marks the current thread as dispatching for as long as it lives.
///
/// Cleared on drop, unwinding included, so a panic in the middle of a
/// broadcast never leaves the cell queueing updates forever. Changes still
/// queued at that point are discarded.
struct DispatchGuard<'a, T> {
    inner: &'a Mutex<Inner<T>>,
}

impl<'a, T> DispatchGuard<'a, T> {
    fn begin(inner: &'a Mutex<Inner<T>>) -> Self {
        inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .dispatching_on = Some(thread::current().id());
        Self { inner }
    }
}

impl<T> Drop for DispatchGuard<'_, T> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.dispatching_on = None;
        if !inner.pending.is_empty() {
            log::warn!(
                "dropping {} queued updates after an interrupted broadcast",
                inner.pending.len()
            );
            inner.pending.clear();
        }
    }
}

/// A panicking observer must not prevent the others from running.
fn notify<T>(token: ObserverToken, observer: &Observer<T>, transition: &Transition<T>) {
    let result = catch_unwind(AssertUnwindSafe(|| observer(transition)));
    if result.is_err() {
        log::error!("observer {} panicked while handling a transition", token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::RwLock;

    fn recorder() -> (
        Arc<RwLock<Vec<Transition<i32>>>>,
        impl Fn(&Transition<i32>) + Send + Sync + 'static,
    ) {
        let seen = Arc::new(RwLock::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |t: &Transition<i32>| sink.write().unwrap().push(t.clone()))
    }

    #[test]
    fn test_subscribe_does_not_invoke() {
        let state = ObservableState::new(1);
        let (seen, observer) = recorder();
        state.subscribe(observer);
        assert!(seen.read().unwrap().is_empty());
    }

    #[test]
    fn test_set_broadcasts_previous_and_next() {
        let state = ObservableState::new(1);
        let (seen, observer) = recorder();
        state.subscribe(observer);

        state.set(2);

        assert_eq!(state.get(), 2);
        assert_eq!(
            *seen.read().unwrap(),
            vec![Transition { previous: 1, next: 2 }]
        );
    }

    #[test]
    fn test_setting_equal_value_still_broadcasts() {
        let state = ObservableState::new(5);
        let (seen, observer) = recorder();
        state.subscribe(observer);

        state.set(5);
        state.set(5);

        let seen = seen.read().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|t| t.is_replay()));
    }

    #[test]
    fn test_subscribe_and_replay_delivers_exactly_once() {
        let state = ObservableState::new("X".to_string());
        let count = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(RwLock::new(None));

        let count_clone = Arc::clone(&count);
        let last_clone = Arc::clone(&last);
        state.subscribe_and_replay(move |t: &Transition<String>| {
            count_clone.fetch_add(1, Ordering::SeqCst);
            *last_clone.write().unwrap() = Some(t.clone());
        });

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(
            *last.read().unwrap(),
            Some(Transition {
                previous: "X".to_string(),
                next: "X".to_string()
            })
        );
        assert_eq!(state.observer_count(), 1);
    }

    #[test]
    fn test_unsubscribe_stops_only_that_observer() {
        let state = ObservableState::new(0);
        let (removed_seen, removed) = recorder();
        let (kept_seen, kept) = recorder();

        let token = state.subscribe(removed);
        state.subscribe(kept);
        state.unsubscribe(token);
        state.set(1);

        assert!(removed_seen.read().unwrap().is_empty());
        assert_eq!(kept_seen.read().unwrap().len(), 1);
    }

    #[test]
    fn test_unsubscribe_unknown_token_is_noop() {
        let state = ObservableState::new(0);
        let token = state.subscribe(|_| {});
        state.unsubscribe(token);
        state.unsubscribe(token);
        assert_eq!(state.observer_count(), 0);
    }

    #[test]
    fn test_broadcast_current_keeps_value() {
        let state = ObservableState::new(7);
        let (seen, observer) = recorder();
        state.subscribe(observer);

        state.broadcast_current();

        assert_eq!(state.get(), 7);
        assert_eq!(
            *seen.read().unwrap(),
            vec![Transition { previous: 7, next: 7 }]
        );
    }

    #[test]
    fn test_observers_run_in_subscription_order() {
        let state = ObservableState::new(0);
        let sequence = Arc::new(RwLock::new(Vec::new()));

        for id in 1..=3 {
            let seq = Arc::clone(&sequence);
            state.subscribe(move |_| seq.write().unwrap().push(id));
        }

        state.set(1);
        assert_eq!(*sequence.read().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_reentrant_set_is_queued() {
        let state = Arc::new(ObservableState::new(0));

        // Observers must not own the cell, so hold a weak reference.
        let weak = Arc::downgrade(&state);
        state.subscribe(move |t: &Transition<i32>| {
            if t.next == 1 {
                if let Some(state) = weak.upgrade() {
                    state.set(2);
                }
            }
        });
        let (seen, observer) = recorder();
        state.subscribe(observer);

        state.set(1);

        assert_eq!(state.get(), 2);
        assert_eq!(
            *seen.read().unwrap(),
            vec![
                Transition { previous: 0, next: 1 },
                Transition { previous: 1, next: 2 },
            ]
        );
    }

    #[test]
    fn test_observer_may_read_and_unsubscribe_during_broadcast() {
        let state = Arc::new(ObservableState::new(0));
        let observed = Arc::new(AtomicUsize::new(0));

        let weak = Arc::downgrade(&state);
        let observed_clone = Arc::clone(&observed);
        state.subscribe(move |_| {
            if let Some(state) = weak.upgrade() {
                observed_clone.store(state.get() as usize, Ordering::SeqCst);
                let _ = state.observer_count();
            }
        });

        state.set(9);
        assert_eq!(observed.load(Ordering::SeqCst), 9);
    }

    #[test]
    fn test_panicking_observer_does_not_break_others() {
        let state = ObservableState::new(0);
        let counter = Arc::new(AtomicUsize::new(0));

        state.subscribe(|_| panic!("Intentional panic"));
        let counter_clone = Arc::clone(&counter);
        state.subscribe(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        state.set(1);
        state.set(2);

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(state.get(), 2);
    }

    #[test]
    fn test_concurrent_sets_are_all_observed() {
        let state = Arc::new(ObservableState::new(0usize));
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        state.subscribe(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let state = Arc::clone(&state);
                thread::spawn(move || {
                    for j in 0..25 {
                        state.set(i * 100 + j);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.load(Ordering::SeqCst), 200);
    }

    #[test]
    fn test_tokens_are_unique() {
        let state = ObservableState::new(());
        let a = state.subscribe(|_| {});
        let b = state.subscribe(|_| {});
        assert_ne!(a, b);
    }

    #[test]
    fn test_set_from_replay_is_queued_and_broadcast() {
        let (done_tx, done_rx) = std::sync::mpsc::channel();

        // Run off the test thread so a lock-up fails instead of hanging
        thread::spawn(move || {
            let state = Arc::new(ObservableState::new(0));
            let (seen, observer) = recorder();
            state.subscribe(observer);

            let weak = Arc::downgrade(&state);
            let replays = Arc::new(RwLock::new(Vec::new()));
            let replay_sink = Arc::clone(&replays);
            state.subscribe_and_replay(move |t: &Transition<i32>| {
                replay_sink.write().unwrap().push(t.clone());
                if t.next == 0 {
                    if let Some(state) = weak.upgrade() {
                        state.set(1);
                    }
                }
            });

            let result = (
                state.get(),
                seen.read().unwrap().clone(),
                replays.read().unwrap().clone(),
            );
            let _ = done_tx.send(result);
        });

        let (value, seen, replays) = done_rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("set from a replay callback locked up");

        assert_eq!(value, 1);
        assert_eq!(seen, vec![Transition { previous: 0, next: 1 }]);
        assert_eq!(
            replays,
            vec![
                Transition { previous: 0, next: 0 },
                Transition { previous: 0, next: 1 },
            ]
        );
    }

    #[test]
    fn test_broadcast_from_replay_is_queued() {
        let (done_tx, done_rx) = std::sync::mpsc::channel();

        thread::spawn(move || {
            let state = Arc::new(ObservableState::new(1));
            let (seen, observer) = recorder();
            state.subscribe(observer);

            let weak = Arc::downgrade(&state);
            let fired = Arc::new(AtomicUsize::new(0));
            let fired_clone = Arc::clone(&fired);
            state.subscribe_and_replay(move |_: &Transition<i32>| {
                if fired_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                    if let Some(state) = weak.upgrade() {
                        state.broadcast_current();
                    }
                }
            });

            let result = (
                state.get(),
                seen.read().unwrap().clone(),
                fired.load(Ordering::SeqCst),
            );
            let _ = done_tx.send(result);
        });

        let (value, seen, fired) = done_rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("broadcast from a replay callback locked up");

        assert_eq!(value, 1);
        assert_eq!(seen, vec![Transition { previous: 1, next: 1 }]);
        // The replay itself plus the queued broadcast
        assert_eq!(fired, 2);
    }

    #[test]
    fn test_nested_subscribe_and_replay_inside_broadcast() {
        let state = Arc::new(ObservableState::new(0));
        let (seen, observer) = recorder();

        let weak = Arc::downgrade(&state);
        let late = std::sync::Mutex::new(Some(observer));
        state.subscribe(move |t: &Transition<i32>| {
            if t.next == 1 {
                let observer = late.lock().unwrap().take();
                if let (Some(state), Some(observer)) = (weak.upgrade(), observer) {
                    state.subscribe_and_replay(observer);
                }
            }
        });

        state.set(1);
        state.set(2);

        assert_eq!(
            *seen.read().unwrap(),
            vec![
                Transition { previous: 1, next: 1 },
                Transition { previous: 1, next: 2 },
            ]
        );
    }

    #[derive(Debug)]
    struct Fragile {
        value: i32,
        explode: Arc<std::sync::atomic::AtomicBool>,
    }

    impl Clone for Fragile {
        fn clone(&self) -> Self {
            if self.explode.load(Ordering::SeqCst) {
                panic!("clone failed");
            }
            Self {
                value: self.value,
                explode: Arc::clone(&self.explode),
            }
        }
    }

    #[test]
    fn test_panicking_clone_does_not_wedge_later_sets() {
        let explode = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let fragile = |value| Fragile {
            value,
            explode: Arc::clone(&explode),
        };

        let state = ObservableState::new(fragile(1));
        let seen = Arc::new(RwLock::new(Vec::new()));
        let sink = Arc::clone(&seen);
        state.subscribe(move |t: &Transition<Fragile>| {
            sink.write().unwrap().push(t.next.value);
        });

        explode.store(true, Ordering::SeqCst);
        let result = catch_unwind(AssertUnwindSafe(|| state.set(fragile(2))));
        assert!(result.is_err());
        explode.store(false, Ordering::SeqCst);

        state.set(fragile(3));

        assert_eq!(state.get().value, 3);
        assert_eq!(*seen.read().unwrap(), vec![3]);
    }
}
