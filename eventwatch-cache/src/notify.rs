//! Listener registry and change notification.

use std::fmt;
use std::sync::Arc;

use eventwatch_types::GroupedEvent;
use parking_lot::RwLock;

/// A change listener, called with the current and previous merged events.
///
/// Listeners are compared by `Arc` identity: registering a clone of the same
/// `Arc` twice keeps a single entry.
pub type Listener = Arc<dyn Fn(&[GroupedEvent], &[GroupedEvent]) + Send + Sync>;

/// Wrap a closure as a [`Listener`].
///
/// Keep the returned `Arc` to remove the listener later.
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&[GroupedEvent], &[GroupedEvent]) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Ordered registry of change listeners.
#[derive(Default)]
pub struct Notifier {
    listeners: RwLock<Vec<Listener>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener unless it is already registered.
    ///
    /// Returns `true` if the listener was added.
    pub fn register(&self, listener: Listener) -> bool {
        let mut listeners = self.listeners.write();
        if listeners.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Remove a listener. Returns `true` if it was registered.
    pub fn unregister(&self, listener: &Listener) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|l| !same_listener(l, listener));
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    /// Call every listener in registration order. Returns how many were called.
    ///
    /// The registry is not locked while listeners run, so a listener may
    /// register or remove listeners; that takes effect from the next call.
    /// A panicking listener unwinds out of this call and the listeners after
    /// it are not called.
    pub fn notify(&self, current: &[GroupedEvent], previous: &[GroupedEvent]) -> usize {
        let listeners = self.listeners.read().clone();
        for listener in &listeners {
            listener(current, previous);
        }
        listeners.len()
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.len())
            .finish()
    }
}

// Compare data pointers only; vtable pointers for the same closure may differ
// between codegen units.
fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting() -> (Listener, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let listener = listener(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (listener, calls)
    }

    #[test]
    fn register_same_listener_twice_keeps_one_entry() {
        let notifier = Notifier::new();
        let (listener, calls) = counting();

        assert!(notifier.register(listener.clone()));
        assert!(!notifier.register(listener.clone()));
        assert_eq!(notifier.len(), 1);

        notifier.notify(&[], &[]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn distinct_listeners_with_same_body_are_both_kept() {
        let notifier = Notifier::new();
        let (a, _) = counting();
        let (b, _) = counting();

        assert!(notifier.register(a));
        assert!(notifier.register(b));
        assert_eq!(notifier.len(), 2);
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let notifier = Notifier::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let order = order.clone();
            notifier.register(listener(move |_, _| order.lock().push(name)));
        }

        assert_eq!(notifier.notify(&[], &[]), 3);
        assert_eq!(*order.lock(), ["first", "second", "third"]);
    }

    #[test]
    fn listeners_receive_current_then_previous() {
        let notifier = Notifier::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        notifier.register(listener(move |current, previous| {
            *sink.lock() = Some((current.len(), previous.len()));
        }));

        let current = vec![GroupedEvent::new("r1", "a1"), GroupedEvent::new("r1", "a2")];
        let previous = vec![GroupedEvent::new("r1", "a1")];
        notifier.notify(&current, &previous);

        assert_eq!(*seen.lock(), Some((2, 1)));
    }

    #[test]
    fn unregister_removes_listener() {
        let notifier = Notifier::new();
        let (listener, calls) = counting();
        notifier.register(listener.clone());

        assert!(notifier.unregister(&listener));
        assert!(!notifier.unregister(&listener));
        assert!(notifier.is_empty());

        notifier.notify(&[], &[]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn listener_may_register_during_notify() {
        let notifier = Arc::new(Notifier::new());
        let (late, late_calls) = counting();

        let registry = Arc::downgrade(&notifier);
        notifier.register(listener(move |_, _| {
            if let Some(registry) = registry.upgrade() {
                registry.register(late.clone());
            }
        }));

        assert_eq!(notifier.notify(&[], &[]), 1);
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);

        assert_eq!(notifier.notify(&[], &[]), 2);
        assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    }
}
