use crate::event::Subscriber;
use crate::observable::{ChangeHandler, Observable};
use crate::tracked::{Tracked, TransitionHandler};
use std::fmt;

/// Read-only projection of an [`Observable`].
///
/// Hands out subscription access and the current value but none of the
/// mutation operations. Its registries come as [`Subscriber`]s, which cannot
/// dispatch or clear, so an owner can keep its `Observable` private and
/// publish only this view:
///
/// ```ignore
/// struct Thermometer {
///     celsius: Observable<f64>,
/// }
///
/// impl Thermometer {
///     pub fn celsius(&self) -> ReadOnly<'_, f64> {
///         self.celsius.read_only()
///     }
/// }
/// ```
///
/// The view borrows the observable, so it can never outlive it. Subscriptions
/// made through a view stay registered after the view is gone.
pub struct ReadOnly<'a, T> {
    source: &'a Observable<T>,
}

impl<'a, T> ReadOnly<'a, T> {
    /// View `source`
    pub fn new(source: &'a Observable<T>) -> Self {
        Self { source }
    }

    /// Subscribe to the notification fired before each change, with the old value
    pub fn on_changing(&self) -> Subscriber<'a, ChangeHandler<T>> {
        self.source.on_changing().subscriber()
    }

    /// Subscribe to the notification fired after each change, with the new value
    pub fn on_change(&self) -> Subscriber<'a, ChangeHandler<T>> {
        self.source.on_change().subscriber()
    }

    /// Borrow the current value
    pub fn value(&self) -> &'a T {
        self.source.value()
    }

    /// Copy out the current value
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.source.get()
    }
}

impl<T> Clone for ReadOnly<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ReadOnly<'_, T> {}

impl<'a, T> From<&'a Observable<T>> for ReadOnly<'a, T> {
    fn from(source: &'a Observable<T>) -> Self {
        Self::new(source)
    }
}

impl<T: PartialEq> PartialEq<T> for ReadOnly<'_, T> {
    fn eq(&self, other: &T) -> bool {
        self.source.value() == other
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadOnly<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadOnly").field(self.source.value()).finish()
    }
}

/// Read-only projection of a [`Tracked`] value.
pub struct ReadOnlyTracked<'a, T> {
    source: &'a Tracked<T>,
}

impl<'a, T> ReadOnlyTracked<'a, T> {
    /// View `source`
    pub fn new(source: &'a Tracked<T>) -> Self {
        Self { source }
    }

    /// Subscribe to the `(old, new)` notification fired after each change
    pub fn on_change(&self) -> Subscriber<'a, TransitionHandler<T>> {
        self.source.on_change().subscriber()
    }

    /// Borrow the current value
    pub fn value(&self) -> &'a T {
        self.source.value()
    }

    /// Copy out the current value
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.source.get()
    }
}

impl<T> Clone for ReadOnlyTracked<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ReadOnlyTracked<'_, T> {}

impl<'a, T> From<&'a Tracked<T>> for ReadOnlyTracked<'a, T> {
    fn from(source: &'a Tracked<T>) -> Self {
        Self::new(source)
    }
}

impl<T: PartialEq> PartialEq<T> for ReadOnlyTracked<'_, T> {
    fn eq(&self, other: &T) -> bool {
        self.source.value() == other
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadOnlyTracked<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadOnlyTracked")
            .field(self.source.value())
            .finish()
    }
}
