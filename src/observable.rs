use crate::event::Event;
use crate::read_only::ReadOnly;
use crate::subscription::EventId;
use std::fmt;
use std::ops::{AddAssign, Deref, DerefMut, SubAssign};

/// Callback shape for [`Observable`] notifications: the id of the registry that
/// fired, and the value at that moment.
pub type ChangeHandler<T> = dyn Fn(EventId, &T) + Send + Sync;

/// A value that announces its changes.
///
/// Two registries are attached:
/// - [`on_changing`](Self::on_changing) fires *before* a mutation with the old value;
/// - [`on_change`](Self::on_change) fires *after* it with the new value.
///
/// Subscribing only needs `&self`. Mutating needs `&mut self`, so the borrow
/// checker confines writes to one place at a time; the registries are thread-safe
/// but the value itself is not synchronized. Share an `Observable` across
/// threads behind your own lock if several threads must write it.
///
/// A callback must not mutate the observable that is notifying it. With a
/// plain `Observable` the borrow checker rejects that, since the callback would
/// need a `&mut` to it. Once the observable sits behind a lock of your own,
/// such as `Arc<Mutex<Observable<T>>>`, the attempt deadlocks on that lock
/// instead, so callbacks must not write back into their source.
///
/// ```ignore
/// let mut level = Observable::new(0);
/// level.on_change().subscribe(Box::new(|_: EventId, v: &i32| println!("level is now {v}")));
/// level.set(10);
/// level += 5;
/// ```
pub struct Observable<T> {
    value: T,
    on_changing: Event<ChangeHandler<T>>,
    on_change: Event<ChangeHandler<T>>,
}

impl<T> Observable<T> {
    /// Wrap `value` with empty registries
    pub fn new(value: T) -> Self {
        Self {
            value,
            on_changing: Event::new(),
            on_change: Event::new(),
        }
    }

    /// Registry notified before each change, with the old value
    pub fn on_changing(&self) -> &Event<ChangeHandler<T>> {
        &self.on_changing
    }

    /// Registry notified after each change, with the new value
    pub fn on_change(&self) -> &Event<ChangeHandler<T>> {
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

    /// Assign a new value and return the previous one
    pub fn replace(&mut self, value: T) -> T {
        self.mutate(|current| std::mem::replace(current, value))
    }

    /// Add one and return the new value
    pub fn increment(&mut self) -> &T
    where
        T: AddAssign + From<u8>,
    {
        self.mutate(|value| *value += T::from(1));
        &self.value
    }

    /// Subtract one and return the new value
    pub fn decrement(&mut self) -> &T
    where
        T: SubAssign + From<u8>,
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
        self.increment();
        old
    }

    /// Subtract one and return the value it had before
    pub fn post_decrement(&mut self) -> T
    where
        T: SubAssign + From<u8> + Clone,
    {
        let old = self.value.clone();
        self.decrement();
        old
    }

    /// Open a [`Context`] for direct mutable access.
    ///
    /// `on_changing` fires now with the current value; `on_change` fires once
    /// when the context is dropped, whether or not anything was changed.
    pub fn with(&mut self) -> Context<'_, T> {
        Context::open(self)
    }

    /// Mutate through a closure, bracketed by one pair of notifications.
    pub fn modify<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut context = self.with();
        f(&mut *context)
    }

    /// Re-announce the current value through `on_change`.
    pub fn dispatch(&self) {
        Self::notify(&self.on_change, &self.value);
    }

    /// Announce a change that happened out of sight: `on_changing` with `old`,
    /// then `on_change` with the current value.
    pub fn dispatch_from(&self, old: &T) {
        Self::notify(&self.on_changing, old);
        Self::notify(&self.on_change, &self.value);
    }

    /// Read-only projection suitable for handing out to consumers
    pub fn read_only(&self) -> ReadOnly<'_, T> {
        ReadOnly::new(self)
    }

    /// Unwrap the value, dropping all subscriptions
    pub fn into_inner(self) -> T {
        self.value
    }

    fn mutate<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
        Self::notify(&self.on_changing, &self.value);
        let result = f(&mut self.value);
        Self::notify(&self.on_change, &self.value);
        result
    }

    fn notify(event: &Event<ChangeHandler<T>>, value: &T) {
        let id = event.id();
        event.dispatch_with(|callback| callback(id, value));
    }
}

compound_assign!(Observable [] =>
    AddAssign::add_assign,
    SubAssign::sub_assign,
    MulAssign::mul_assign,
    DivAssign::div_assign,
    RemAssign::rem_assign,
    BitAndAssign::bitand_assign,
    BitOrAssign::bitor_assign,
    BitXorAssign::bitxor_assign,
);

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for Observable<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

/// Copies the value and both registries. The copies get their own identities,
/// so handles issued by the original do not apply to them.
impl<T: Clone> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            on_changing: self.on_changing.clone(),
            on_change: self.on_change.clone(),
        }
    }
}

impl<T: PartialEq> PartialEq<T> for Observable<T> {
    fn eq(&self, other: &T) -> bool {
        self.value == *other
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.value)
            .field("on_changing", &self.on_changing)
            .field("on_change", &self.on_change)
            .finish()
    }
}

/// Scoped mutable access to an [`Observable`]'s value.
///
/// Created by [`Observable::with`], which has already fired `on_changing`.
/// Dereferences to the value. Dropping the context (at the end of the scope,
/// through [`close`](Self::close), or while unwinding from a panic) fires
/// `on_change` exactly once with the final value.
///
/// The context holds the observable's only mutable borrow, so a second context
/// cannot be opened while this one is alive and the context cannot outlive
/// its observable.
///
/// A callback that panics while the context is being dropped during an
/// unrelated unwind aborts the process, as any panic inside `Drop` would.
#[must_use = "the after-change notification fires when the context is dropped"]
pub struct Context<'a, T> {
    owner: &'a mut Observable<T>,
}

impl<'a, T> Context<'a, T> {
    fn open(owner: &'a mut Observable<T>) -> Self {
        Observable::notify(&owner.on_changing, &owner.value);
        Self { owner }
    }

    /// End the scope now, firing `on_change`
    pub fn close(self) {}
}

impl<T> Deref for Context<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.owner.value
    }
}

impl<T> DerefMut for Context<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.owner.value
    }
}

impl<T> Drop for Context<'_, T> {
    fn drop(&mut self) {
        Observable::notify(&self.owner.on_change, &self.owner.value);
    }
}

impl<T: fmt::Debug> fmt::Debug for Context<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("value", &self.owner.value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    type Log<T> = Arc<Mutex<Vec<(&'static str, T)>>>;

    fn record<T: Clone + Send + 'static>(observable: &Observable<T>) -> Log<T> {
        let log: Log<T> = Arc::new(Mutex::new(Vec::new()));
        {
            let log = log.clone();
            observable
                .on_changing()
                .subscribe(Box::new(move |_: EventId, value: &T| {
                    log.lock().push(("before", value.clone()));
                }));
        }
        {
            let log = log.clone();
            observable
                .on_change()
                .subscribe(Box::new(move |_: EventId, value: &T| {
                    log.lock().push(("after", value.clone()));
                }));
        }
        log
    }

    #[test]
    fn assignment_publishes_old_then_new() {
        let mut var = Observable::new(0);
        let log = record(&var);

        var.set(10);
        assert_eq!(var, 10);
        assert_eq!(*log.lock(), vec![("before", 0), ("after", 10)]);
    }

    #[test]
    fn replace_returns_previous_value() {
        let mut var = Observable::new(String::from("a"));
        assert_eq!(var.replace("b".into()), "a");
        assert_eq!(var.value(), "b");
    }

    #[test]
    fn increments_and_decrements() {
        let mut var = Observable::new(0i32);
        assert_eq!(var.post_increment(), 0);
        assert_eq!(var, 1);
        assert_eq!(var.post_decrement(), 1);
        assert_eq!(var, 0);
        assert_eq!(*var.increment(), 1);
        assert_eq!(*var.decrement(), 0);
    }

    #[test]
    fn compound_operators() {
        let mut var = Observable::new(0);
        var += 1;
        assert_eq!(var, 1);
        var -= 1;
        assert_eq!(var, 0);
        var.set(10);
        var *= 10;
        assert_eq!(var, 100);
        var /= 10;
        assert_eq!(var, 10);
        var.set(0b01);
        var |= 0b10;
        assert_eq!(var, 0b11);
        var &= 0b10;
        assert_eq!(var, 0b10);
        var.set(10);
        var %= 3;
        assert_eq!(var, 1);
        var.set(0b01);
        var ^= 0b10;
        assert_eq!(var, 0b11);
    }

    #[test]
    fn each_operator_fires_one_pair() {
        let mut var = Observable::new(3u32);
        let log = record(&var);

        var += 2;
        var.increment();
        var.post_decrement();

        assert_eq!(
            *log.lock(),
            vec![
                ("before", 3),
                ("after", 5),
                ("before", 5),
                ("after", 6),
                ("before", 6),
                ("after", 5),
            ]
        );
    }

    #[test]
    fn callbacks_receive_the_firing_registry() {
        let mut var = Observable::new(1);
        let ids = Arc::new(Mutex::new(Vec::new()));
        let callback: Arc<ChangeHandler<i32>> = {
            let ids = ids.clone();
            Arc::new(move |id: EventId, _: &i32| ids.lock().push(id))
        };
        var.on_changing().subscribe_arc(callback.clone());
        var.on_change().subscribe_arc(callback);

        var.set(2);
        assert_eq!(
            *ids.lock(),
            vec![var.on_changing().id(), var.on_change().id()]
        );
    }

    #[test]
    fn context_brackets_mutations() {
        let mut var = Observable::new(vec![1]);
        let log = record(&var);

        {
            let mut ctx = var.with();
            ctx.push(2);
            ctx.push(3);
        }

        assert_eq!(var, vec![1, 2, 3]);
        assert_eq!(
            *log.lock(),
            vec![("before", vec![1]), ("after", vec![1, 2, 3])]
        );
    }

    #[test]
    fn context_without_mutation_still_announces() {
        let mut var = Observable::new(7);
        let log = record(&var);

        var.with().close();
        assert_eq!(*log.lock(), vec![("before", 7), ("after", 7)]);
    }

    #[test]
    fn context_closes_during_unwind() {
        let mut var = Observable::new(1);
        let log = record(&var);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut ctx = var.with();
            *ctx = 2;
            panic!("mutation failed halfway");
        }));

        assert!(result.is_err());
        assert_eq!(*log.lock(), vec![("before", 1), ("after", 2)]);
    }

    #[test]
    fn modify_returns_closure_result() {
        let mut var = Observable::new(vec![1, 2]);
        let log = record(&var);

        let popped = var.modify(|v| v.pop());
        assert_eq!(popped, Some(2));
        assert_eq!(log.lock().len(), 2);
    }

    #[test]
    fn manual_dispatch() {
        let var = Observable::new(5);
        let log = record(&var);

        var.dispatch();
        var.dispatch_from(&4);
        assert_eq!(
            *log.lock(),
            vec![("after", 5), ("before", 4), ("after", 5)]
        );
    }

    #[test]
    fn clone_copies_value_and_subscriptions_independently() {
        let source = Observable::new(100);
        let _log = record(&source);
        let mut copy = source.clone();

        assert_eq!(copy, 100);
        assert_eq!(copy.on_change().subscribed(), 1);
        copy.on_change().subscribe(Box::new(|_: EventId, _: &i32| {}));
        assert_eq!(copy.on_change().subscribed(), 2);
        assert_eq!(source.on_change().subscribed(), 1);

        copy.set(1);
        assert_eq!(source, 100);
    }

    #[test]
    fn moves_keep_value() {
        let source = Observable::from(100);
        let dest = source;
        assert_eq!(dest, 100);
        assert_eq!(dest.into_inner(), 100);
    }

    #[test]
    fn default_uses_default_value() {
        let var: Observable<u8> = Observable::default();
        assert_eq!(var.get(), 0);
    }
}
