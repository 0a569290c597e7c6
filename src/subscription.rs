use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of event identities. Zero is never handed out.
static NEXT_EVENT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of one [`Event`](crate::Event) instance.
///
/// Every registry draws a fresh id when it is constructed (including clones and
/// the empty registry left behind by [`Event::take`](crate::Event::take)). The id
/// is passed to observable callbacks so a single callback shared across several
/// sources can tell which registry fired.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct EventId(NonZeroU64);

impl EventId {
    pub(crate) fn next() -> Self {
        let raw = NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed);
        // u64 exhaustion would take centuries of constant allocation
        Self(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
    }

    /// Raw numeric value, useful for logging.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event#{}", self.0)
    }
}

/// Lifecycle of a [`Subscription`] as seen by the handle itself.
///
/// ```text
/// Unbound --subscribe--> Subscribed --unsubscribe--> Unsubscribed
/// ```
///
/// `Unsubscribed` is terminal. A rejected unsubscribe (foreign or stale handle)
/// leaves the state untouched.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum SubscriptionState {
    /// Never attached to a registry (default handle, or an empty callback was rejected)
    #[default]
    Unbound,
    /// Returned by a successful subscribe and not yet released through this handle
    Subscribed,
    /// Released through this handle
    Unsubscribed,
}

/// Capability returned by [`Event::subscribe`](crate::Event::subscribe), required
/// to unsubscribe.
///
/// A handle names one slot of one registry at one generation. It is only honoured
/// by the registry that issued it, and only while that slot still holds the same
/// generation, so a handle can release its own subscription at most once and can
/// never release whatever subscription later reuses the slot.
///
/// Clones share the capability: whichever clone unsubscribes first wins and the
/// others become stale (they keep reporting [`SubscriptionState::Subscribed`]
/// locally; ask the registry with [`Event::is_subscribed`](crate::Event::is_subscribed)
/// for the authoritative answer).
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Subscription {
    pub(crate) owner: Option<EventId>,
    pub(crate) index: usize,
    pub(crate) generation: u64,
    pub(crate) state: SubscriptionState,
}

impl Subscription {
    pub(crate) fn new(owner: EventId, index: usize, generation: u64) -> Self {
        Self {
            owner: Some(owner),
            index,
            generation,
            state: SubscriptionState::Subscribed,
        }
    }

    /// A handle that no registry will ever accept.
    pub fn unbound() -> Self {
        Self::default()
    }

    /// True until this handle is used to unsubscribe (false for unbound handles).
    pub fn is_subscribed(&self) -> bool {
        self.state == SubscriptionState::Subscribed
    }

    /// Current lifecycle state of this handle.
    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    /// Identity of the issuing registry, if any.
    pub fn owner(&self) -> Option<EventId> {
        self.owner
    }

    /// Moves the handle into its terminal state.
    pub(crate) fn release(&mut self) {
        self.owner = None;
        self.state = SubscriptionState::Unsubscribed;
    }
}
