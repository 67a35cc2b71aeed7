//! Explicit observer registry for unit notifications.
//!
//! Every subscription is identified by a [`SubscriptionId`] so owners can
//! unsubscribe deterministically (on death, on battle end) instead of relying
//! on drop order.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::state::UnitId;

pub type SignalCallback = Arc<dyn Fn(UnitId) + Send + Sync>;

/// Handle returned by [`Signal::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: BTreeMap<SubscriptionId, SignalCallback>,
    fired: bool,
}

/// A named notification channel with subscribe/unsubscribe.
///
/// A `once` signal delivers at most one emission over its lifetime; later
/// emissions are dropped.
pub struct Signal {
    name: &'static str,
    once: bool,
    registry: Mutex<Registry>,
}

impl Signal {
    pub fn repeatable(name: &'static str) -> Self {
        Self::with_mode(name, false)
    }

    pub fn once(name: &'static str) -> Self {
        Self::with_mode(name, true)
    }

    fn with_mode(name: &'static str, once: bool) -> Self {
        Self {
            name,
            once,
            registry: Mutex::new(Registry::default()),
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(UnitId) + Send + Sync + 'static,
    {
        let mut registry = self.registry();
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;
        registry.subscribers.insert(id, Arc::new(callback));
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.registry().subscribers.remove(&id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry().subscribers.len()
    }

    pub fn has_fired(&self) -> bool {
        self.registry().fired
    }

    /// Delivers `unit` to every current subscriber.
    ///
    /// Callbacks run after the registry lock is released, so a callback may
    /// unsubscribe itself or others. Returns `false` when a `once` signal had
    /// already fired.
    pub fn emit(&self, unit: UnitId) -> bool {
        let callbacks: Vec<SignalCallback> = {
            let mut registry = self.registry();
            if self.once && registry.fired {
                return false;
            }
            registry.fired = true;
            registry.subscribers.values().cloned().collect()
        };

        tracing::trace!(signal = self.name, %unit, subscribers = callbacks.len(), "emit");
        for callback in callbacks {
            callback(unit);
        }
        true
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry();
        f.debug_struct("Signal")
            .field("name", &self.name)
            .field("once", &self.once)
            .field("subscribers", &registry.subscribers.len())
            .field("fired", &registry.fired)
            .finish()
    }
}

/// The two channels every unit publishes.
#[derive(Debug)]
pub struct UnitSignals {
    pub death: Signal,
    pub speed_changed: Signal,
}

impl UnitSignals {
    pub fn new() -> Self {
        Self {
            death: Signal::once("death"),
            speed_changed: Signal::repeatable("speed_changed"),
        }
    }

    pub fn notify_death(&self, unit: UnitId) -> bool {
        self.death.emit(unit)
    }

    pub fn notify_speed_changed(&self, unit: UnitId) -> bool {
        self.speed_changed.emit(unit)
    }
}

impl Default for UnitSignals {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn once_signal_fires_at_most_once() {
        let signal = Signal::once("death");
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        signal.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(signal.emit(UnitId(1)));
        assert!(!signal.emit(UnitId(1)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribed_callback_is_not_invoked() {
        let signal = Signal::repeatable("speed_changed");
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let id = signal.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        signal.emit(UnitId(3));
        assert!(signal.unsubscribe(id));
        assert!(!signal.unsubscribe(id));
        signal.emit(UnitId(3));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn callback_may_unsubscribe_itself() {
        let signal = Arc::new(Signal::repeatable("speed_changed"));
        let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));

        let weak = Arc::downgrade(&signal);
        let own_id = Arc::clone(&slot);
        let id = signal.subscribe(move |_| {
            if let (Some(signal), Some(id)) = (weak.upgrade(), *own_id.lock().unwrap()) {
                signal.unsubscribe(id);
            }
        });
        *slot.lock().unwrap() = Some(id);

        signal.emit(UnitId(0));
        assert_eq!(signal.subscriber_count(), 0);
    }
}
