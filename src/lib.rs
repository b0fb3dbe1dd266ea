//! # rxkit: push-based reactive streams
//!
//! An [`Observable`] delivers `Next*` followed by at most one terminal
//! `Error` or `Complete` to each subscribed [`Observer`]. Operators are
//! methods on `Observable` returning new observables; schedulers decide when
//! and where work runs; a virtual-time harness in [`testing`] makes timing
//! behaviour reproducible.
//!
//! ```rust
//! use rxkit::prelude::*;
//!
//! let seen = std::sync::Arc::new(parking_lot::Mutex::new(vec![]));
//! let sink = seen.clone();
//! observable::from_iter(0..10)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .subscribe_next(move |v| sink.lock().push(v));
//! assert_eq!(*seen.lock(), vec![0, 4, 8, 12, 16]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | Cloneable handle to a producer, carrying every operator |
//! | [`Observer`] | Consumes `next`, `error` and `complete` |
//! | [`Subscription`] | Handle that cancels an active subscription |
//! | [`Scheduler`] | Runs actions now, later or periodically |
//! | [`Subject`] | Observer and observable at once, multicasting its input |
//!
//! ## Feature Flags
//!
//! - **`futures-scheduler`** (default): `ThreadPoolScheduler` over a `futures`
//!   thread pool
//! - **`timer`** (default): `futures-time` sleeps for that thread pool
//! - **`tokio-scheduler`**: `TokioScheduler` on a tokio runtime
//!
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription
//! [`Scheduler`]: scheduler::Scheduler
//! [`Subject`]: subject::Subject
pub mod error;
pub mod notification;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod scheduler;
pub mod subject;
pub mod subscription;
pub mod testing;

pub use prelude::*;
