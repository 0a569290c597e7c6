#![deny(missing_docs)]

//! Thread-safe events with generation-checked subscriptions, and observable
//! variables built on top of them.
//!
//! # Quick Start
//!
//! ```ignore
//! use evented::{Event, EventId, Handler, Observable};
//!
//! // A bare event carrying one borrowed payload
//! let clicked: Event<Handler<(u16, u16)>> = Event::new();
//! let mut handle = clicked.subscribe(Box::new(|pos: &(u16, u16)| println!("{pos:?}")));
//! clicked.dispatch(&(3, 4));
//! clicked.unsubscribe(&mut handle);   // releases the callback
//! clicked.unsubscribe(&mut handle);   // already released: no-op
//!
//! // A value that announces its changes
//! let mut volume = Observable::new(5u8);
//! volume.on_change().subscribe(Box::new(|_: EventId, v: &u8| println!("volume {v}")));
//! volume += 1;
//!
//! // Several mutations, one pair of notifications
//! let mut settings = Observable::new(vec![1, 2]);
//! {
//!     let mut ctx = settings.with();   // on_changing fires here
//!     ctx.push(3);
//!     ctx.retain(|n| n % 2 == 1);
//! }                                    // on_change fires here
//! ```
//!
//! # Core Types
//!
//! - [`Event<F>`] - Callback registry. Stores callbacks of trait-object type `F`
//!   in reusable slots and dispatches to them synchronously.
//! - [`Subscriber`] - Subscribe-only access to an `Event`, without dispatch or
//!   clear. Handed out by the read-only views.
//! - [`Subscription`] - Handle returned by `subscribe`. Names one slot at one
//!   generation of one registry; unsubscribing with it works at most once.
//! - [`Observable<T>`] - Owns a value, fires `on_changing(id, &old)` before and
//!   `on_change(id, &new)` after every mutation.
//! - [`Tracked<T>`] - Owns a value, fires `on_change(id, &old, &new)` after
//!   every mutation.
//! - [`Context`] / [`TrackedContext`] - Guards granting direct mutable access,
//!   publishing exactly once when they go out of scope.
//! - [`ReadOnly`] / [`ReadOnlyTracked`] - Borrowing views exposing subscription
//!   and read access only.
//!
//! # Threading
//!
//! Registries are `Sync`: subscribe, unsubscribe and dispatch may be called
//! from any thread at any time, including from inside a running callback.
//! Callbacks always run on the dispatching thread, with no registry lock held.
//! The values wrapped by observables are *not* synchronized; mutation needs
//! `&mut`, which keeps writers confined unless you add a lock of your own.
//!
//! # Misuse
//!
//! Unsubscribing with an unbound, foreign, stale or already released handle is
//! a silent no-op (`unsubscribe` returns `false`), so cleanup paths can call it
//! unconditionally. Rejections are reported through `tracing` at debug level.

// Internal modules
pub(crate) mod arena;
#[macro_use]
mod ops;
mod event;
mod observable;
mod read_only;
mod subscription;
mod tracked;

// Registry
pub use event::{Event, Handler, Handler0, Subscriber};
pub use subscription::{EventId, Subscription, SubscriptionState};

// Observable values
pub use observable::{ChangeHandler, Context, Observable};
pub use read_only::{ReadOnly, ReadOnlyTracked};
pub use tracked::{Tracked, TrackedContext, TransitionHandler};
