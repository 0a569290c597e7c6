use crate::event::Event;
use crate::read_only::ReadOnlyTracked;
use crate::subscription::EventId;
use std::fmt;
use std::ops::{AddAssign, Deref, DerefMut, SubAssign};

/// Callback shape for [`Tracked`] notifications: the id of the registry that
/// fired, the previous value and the new value.
pub type TransitionHandler<T> = dyn Fn(EventId, &T, &T) + Send + Sync;

/// A value that announces each transition as an `(old, new)` pair.
///
/// Unlike [`Observable`](crate::Observable) there is no separate before-change
/// registry: a single [`on_change`](Self::on_change) fires after every mutation
/// with both values. Operations that cannot hand back the old value by
/// themselves (the compound operators, [`with`](Self::with), [`modify`](Self::modify))
/// clone it first and therefore need `T: Clone`.
///
/// The same threading rules as for `Observable` apply: the registry is
/// thread-safe, the value is not.
pub struct Tracked<T> {
    value: T,
    on_change: Event<TransitionHandler<T>>,
}

impl<T> Tracked<T> {
    /// Wrap `value` with an empty registry
    pub fn new(value: T) -> Self {
        Self {
            value,
            on_change: Event::new(),
        }
    }

    /// Registry notified after each change with `(old, new)`
    pub fn on_change(&self) -> &Event<TransitionHandler<T>> {
        &self.on_change
    }

    /// Borrow the current value
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Copy out the current value
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.clone()
    }

    /// Assign a new value
    pub fn set(&mut self, value: T) {
        self.replace(value);
    }

    /// Assign a new value and return the previous one.
    ///
    /// Needs no `Clone`: the displaced value is published and then returned.
    pub fn replace(&mut self, value: T) -> T {
        let old = std::mem::replace(&mut self.value, value);
        self.dispatch_from(&old);
        old
    }

    /// Add one and return the new value
    pub fn increment(&mut self) -> &T
    where
        T: AddAssign + From<u8> + Clone,
    {
        self.mutate(|value| *value += T::from(1));
        &self.value
    }

    /// Subtract one and return the new value
    pub fn decrement(&mut self) -> &T
    where
        T: SubAssign + From<u8> + Clone,
    {
        self.mutate(|value| *value -= T::from(1));
        &self.value
    }

    /// Add one and return the value it had before
    pub fn post_increment(&mut self) -> T
    where
        T: AddAssign + From<u8> + Clone,
    {
        let old = self.value.clone();
        self.value += T::from(1);
        self.dispatch_from(&old);
        old
    }

    /// Subtract one and return the value it had before
    pub fn post_decrement(&mut self) -> T
    where
        T: SubAssign + From<u8> + Clone,
    {
        let old = self.value.clone();
        self.value -= T::from(1);
        self.dispatch_from(&old);
        old
    }

    /// Open a [`TrackedContext`] for direct mutable access.
    ///
    /// The current value is cloned now; `on_change` fires once with
    /// `(old, final)` when the context is dropped.
    pub fn with(&mut self) -> TrackedContext<'_, T>
    where
        T: Clone,
    {
        TrackedContext::open(self)
    }

    /// Mutate through a closure, publishing one transition.
    pub fn modify<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R
    where
        T: Clone,
    {
        let mut context = self.with();
        f(&mut *context)
    }

    /// Announce a transition that happened out of sight, from `old` to the
    /// current value.
    pub fn dispatch_from(&self, old: &T) {
        let id = self.on_change.id();
        self.on_change
            .dispatch_with(|callback| callback(id, old, &self.value));
    }

    /// Read-only projection suitable for handing out to consumers
    pub fn read_only(&self) -> ReadOnlyTracked<'_, T> {
        ReadOnlyTracked::new(self)
    }

    /// Unwrap the value, dropping all subscriptions
    pub fn into_inner(self) -> T {
        self.value
    }

    fn mutate<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R
    where
        T: Clone,
    {
        let old = self.value.clone();
        let result = f(&mut self.value);
        self.dispatch_from(&old);
        result
    }
}

compound_assign!(Tracked [+ Clone] =>
    AddAssign::add_assign,
    SubAssign::sub_assign,
    MulAssign::mul_assign,
    DivAssign::div_assign,
    RemAssign::rem_assign,
    BitAndAssign::bitand_assign,
    BitOrAssign::bitor_assign,
    BitXorAssign::bitxor_assign,
);

impl<T: Default> Default for Tracked<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for Tracked<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Clone> Clone for Tracked<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            on_change: self.on_change.clone(),
        }
    }
}

impl<T: PartialEq> PartialEq<T> for Tracked<T> {
    fn eq(&self, other: &T) -> bool {
        self.value == *other
    }
}

impl<T: fmt::Debug> fmt::Debug for Tracked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracked")
            .field("value", &self.value)
            .field("on_change", &self.on_change)
            .finish()
    }
}

/// Scoped mutable access to a [`Tracked`] value.
///
/// Keeps a copy of the value taken when the scope opened and publishes
/// `(old, final)` exactly once when dropped, including during unwinding.
#[must_use = "the change notification fires when the context is dropped"]
pub struct TrackedContext<'a, T> {
    owner: &'a mut Tracked<T>,
    old: T,
}

impl<'a, T: Clone> TrackedContext<'a, T> {
    fn open(owner: &'a mut Tracked<T>) -> Self {
        let old = owner.value.clone();
        Self { owner, old }
    }
}

impl<T> TrackedContext<'_, T> {
    /// Value at the moment the context was opened
    pub fn old(&self) -> &T {
        &self.old
    }

    /// End the scope now, publishing the transition
    pub fn close(self) {}
}

impl<T> Deref for TrackedContext<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.owner.value
    }
}

impl<T> DerefMut for TrackedContext<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.owner.value
    }
}

impl<T> Drop for TrackedContext<'_, T> {
    fn drop(&mut self) {
        self.owner.dispatch_from(&self.old);
    }
}
