//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Errors and notifications
pub use crate::{error::RxError, notification::Notification};
// Factories, reachable as `observable::of(..)` etc.
pub use crate::observable;
// Core types
pub use crate::observable::{ConnectableObservable, CoreObservable, Observable, SubjectLike};
// Observers
pub use crate::observer::{BoxedObserver, FnMutObserver, Observer, ObserverFns, Subscriber};
// Operator helper types
pub use crate::ops::GroupedObservable;
// Schedulers
pub use crate::scheduler::{
  schedule_periodic, schedule_recursive, CurrentThreadScheduler, ImmediateScheduler, NewThreadScheduler, Scheduler,
  SchedulerRef, VirtualTimeScheduler,
};
#[cfg(all(feature = "futures-scheduler", feature = "timer"))]
pub use crate::scheduler::ThreadPoolScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioScheduler;
// Subjects
pub use crate::subject::*;
// Subscriptions
pub use crate::subscription::*;
