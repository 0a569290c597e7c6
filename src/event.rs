use crate::arena::SlotArena;
use crate::subscription::{EventId, Subscription};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Callback shape for events that carry no data.
pub type Handler0 = dyn Fn() + Send + Sync;

/// Callback shape for events that carry one borrowed payload.
///
/// Use a tuple or a struct as `A` when more than one value is published.
pub type Handler<A> = dyn Fn(&A) + Send + Sync;

/// Thread-safe publish/subscribe registry.
///
/// `F` is the callback trait object the registry stores, for example
/// [`Handler<A>`] or `dyn Fn(EventId, &T) + Send + Sync`. Every method takes
/// `&self`; the slot storage sits behind one `RwLock` per registry.
///
/// # Subscriptions
///
/// [`subscribe`](Self::subscribe) returns a [`Subscription`] naming the slot and
/// generation the callback was stored under. [`unsubscribe`](Self::unsubscribe)
/// only honours handles issued by this registry whose generation still matches;
/// anything else is silently ignored, so cleanup code never needs to track
/// whether a handle was already released.
///
/// # Dispatch
///
/// [`dispatch_with`](Self::dispatch_with) takes the read lock just long enough
/// to snapshot the live entries in ascending slot order, then invokes them on the
/// calling thread with no lock held:
///
/// - callbacks may subscribe, unsubscribe (including themselves) or dispatch
///   again without deadlocking;
/// - an entry whose removal becomes visible before its turn is skipped;
/// - entries added after the snapshot are not invoked until the next dispatch;
/// - an invocation that already started always runs to completion.
///
/// [`unsubscribe`](Self::unsubscribe) does not wait for dispatches running on
/// other threads. A dispatch that checked the entry just before the removal
/// may still start the callback once after `unsubscribe` has returned `true`.
/// Callbacks that capture state torn down right after unsubscribing must
/// tolerate that late call.
///
/// Code that should only subscribe, such as the consumers of a read-only view,
/// gets a [`Subscriber`] from [`subscriber`](Self::subscriber) instead of the
/// registry itself.
///
/// ```ignore
/// let event: Event<Handler<u32>> = Event::new();
/// let mut handle = event.subscribe(Box::new(|n: &u32| println!("got {n}")));
/// event.dispatch(&7);
/// event.unsubscribe(&mut handle);
/// ```
pub struct Event<F: ?Sized> {
    id: EventId,
    slots: RwLock<SlotArena<F>>,
}

impl<F: ?Sized> Event<F> {
    /// Create an empty registry with a fresh identity
    pub fn new() -> Self {
        Self {
            id: EventId::next(),
            slots: RwLock::new(SlotArena::new()),
        }
    }

    /// Identity of this registry instance
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Subscribe-only access to this registry
    pub fn subscriber(&self) -> Subscriber<'_, F> {
        Subscriber { event: self }
    }

    /// Register a callback and return the handle needed to remove it.
    pub fn subscribe(&self, callback: Box<F>) -> Subscription {
        self.subscribe_arc(Arc::from(callback))
    }

    /// Register a callback that may also be registered elsewhere.
    pub fn subscribe_arc(&self, callback: Arc<F>) -> Subscription {
        let (index, generation) = self.slots.write().insert(callback);
        trace!(event = %self.id, index, generation, "subscribed");
        Subscription::new(self.id, index, generation)
    }

    /// Register an optional callback.
    ///
    /// `None` is rejected with an unbound handle that every registry ignores.
    pub fn subscribe_opt(&self, callback: Option<Box<F>>) -> Subscription {
        match callback {
            Some(callback) => self.subscribe(callback),
            None => {
                cov_mark::hit!(empty_callback_rejected);
                debug!(event = %self.id, "rejected empty callback");
                Subscription::unbound()
            }
        }
    }

    /// Remove the subscription named by `handle`.
    ///
    /// On success the slot is released, its generation bumped (so every clone of
    /// the handle goes stale) and `handle` moves to
    /// [`Unsubscribed`](crate::SubscriptionState::Unsubscribed). Unbound, foreign,
    /// stale and already released handles are left untouched.
    ///
    /// Returns whether a subscription was removed.
    pub fn unsubscribe(&self, handle: &mut Subscription) -> bool {
        if handle.owner != Some(self.id) {
            if handle.owner.is_some() {
                cov_mark::hit!(foreign_handle_ignored);
                debug!(event = %self.id, index = handle.index, "ignored handle from another event");
            }
            return false;
        }

        let released = self
            .slots
            .write()
            .remove(handle.index, handle.generation);

        if released {
            trace!(event = %self.id, index = handle.index, generation = handle.generation, "unsubscribed");
            handle.release();
        } else {
            cov_mark::hit!(stale_handle_ignored);
            debug!(
                event = %self.id,
                index = handle.index,
                generation = handle.generation,
                "ignored stale handle"
            );
        }
        released
    }

    /// True if `handle` still names a live subscription of this registry.
    ///
    /// Unlike [`Subscription::is_subscribed`], this also detects clones that went
    /// stale because another clone unsubscribed.
    pub fn is_subscribed(&self, handle: &Subscription) -> bool {
        handle.owner == Some(self.id) && self.slots.read().contains(handle.index, handle.generation)
    }

    /// Invoke every live callback through `invoke`, in slot order.
    pub fn dispatch_with(&self, mut invoke: impl FnMut(&F)) {
        let snapshot = self.slots.read().snapshot();
        for entry in &snapshot {
            if entry.is_active() {
                invoke(entry.callback());
            } else {
                cov_mark::hit!(removed_entry_skipped);
            }
        }
    }

    /// Number of live subscriptions
    pub fn subscribed(&self) -> usize {
        self.slots.read().len()
    }

    /// True if nothing is subscribed
    pub fn is_empty(&self) -> bool {
        self.subscribed() == 0
    }

    /// Drop every subscription at once.
    ///
    /// Meant for test fixtures; only built for this crate's tests or with the
    /// `test-util` feature. Outstanding handles go stale.
    #[cfg(any(test, feature = "test-util"))]
    pub fn clear(&self) {
        let mut slots = self.slots.write();
        trace!(event = %self.id, dropped = slots.len(), "cleared");
        slots.clear();
    }

    /// Move all subscriptions out, leaving an empty registry behind.
    ///
    /// The returned registry keeps this registry's identity, so outstanding
    /// handles keep working against it. `self` is given a fresh identity and
    /// rejects every handle issued before the call.
    pub fn take(&mut self) -> Self {
        let taken = std::mem::take(self);
        trace!(event = %taken.id, replacement = %self.id, "taken");
        taken
    }
}

impl Event<Handler0> {
    /// Invoke every live callback
    pub fn dispatch(&self) {
        self.dispatch_with(|callback| callback());
    }
}

impl<A: ?Sized> Event<Handler<A>> {
    /// Invoke every live callback with `args`
    pub fn dispatch(&self, args: &A) {
        self.dispatch_with(|callback| callback(args));
    }
}

impl<F: ?Sized> Default for Event<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep copy: the clone stores the same callbacks in fresh entries under a new
/// identity. Handles issued by the original are not honoured by the clone.
impl<F: ?Sized> Clone for Event<F> {
    fn clone(&self) -> Self {
        Self {
            id: EventId::next(),
            slots: RwLock::new(self.slots.read().duplicate()),
        }
    }
}

/// Subscribe-only handle on an [`Event`].
///
/// Offers registration, removal and inspection of subscriptions but neither
/// dispatch nor bulk removal, so whoever holds one can neither forge
/// notifications nor drop other parties' callbacks.
///
/// ```compile_fail
/// use evented::Observable;
///
/// let var = Observable::new(0);
/// let id = var.on_change().id();
/// var.read_only().on_change().dispatch_with(|cb| cb(id, &999));
/// ```
pub struct Subscriber<'a, F: ?Sized> {
    event: &'a Event<F>,
}

impl<'a, F: ?Sized> Subscriber<'a, F> {
    /// Identity of the underlying registry
    pub fn id(&self) -> EventId {
        self.event.id()
    }

    /// See [`Event::subscribe`]
    pub fn subscribe(&self, callback: Box<F>) -> Subscription {
        self.event.subscribe(callback)
    }

    /// See [`Event::subscribe_arc`]
    pub fn subscribe_arc(&self, callback: Arc<F>) -> Subscription {
        self.event.subscribe_arc(callback)
    }

    /// See [`Event::subscribe_opt`]
    pub fn subscribe_opt(&self, callback: Option<Box<F>>) -> Subscription {
        self.event.subscribe_opt(callback)
    }

    /// See [`Event::unsubscribe`]
    pub fn unsubscribe(&self, handle: &mut Subscription) -> bool {
        self.event.unsubscribe(handle)
    }

    /// See [`Event::is_subscribed`]
    pub fn is_subscribed(&self, handle: &Subscription) -> bool {
        self.event.is_subscribed(handle)
    }

    /// Number of live subscriptions
    pub fn subscribed(&self) -> usize {
        self.event.subscribed()
    }
}

impl<F: ?Sized> Clone for Subscriber<'_, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F: ?Sized> Copy for Subscriber<'_, F> {}

impl<'a, F: ?Sized> From<&'a Event<F>> for Subscriber<'a, F> {
    fn from(event: &'a Event<F>) -> Self {
        event.subscriber()
    }
}

impl<F: ?Sized> fmt::Debug for Subscriber<'_, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.event.id)
            .field("subscribed", &self.subscribed())
            .finish()
    }
}

impl<F: ?Sized> fmt::Debug for Event<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id)
            .field("subscribed", &self.subscribed())
            .finish()
    }
}
