//! Virtual-time test harness.
//!
//! A [`TestScheduler`] owns a virtual clock. Hot and cold observables are
//! built from recorded messages, and [`TestScheduler::start`] creates,
//! subscribes and disposes the observable under test at fixed virtual times,
//! returning a [`MockObserver`] with every `(time, notification)` it saw.
//!
//! ```
//! use rxkit::prelude::*;
//! use rxkit::testing::{ReactiveTest, TestScheduler};
//!
//! let scheduler = TestScheduler::new();
//! let xs = scheduler.create_hot_observable(vec![
//!   ReactiveTest::on_next(150, 1),
//!   ReactiveTest::on_next(210, 2),
//!   ReactiveTest::on_completed(250),
//! ]);
//! let source = xs.as_observable();
//! let res = scheduler.start(move || source.map(|v| v * 10));
//! assert_eq!(
//!   res.messages(),
//!   vec![ReactiveTest::on_next(210, 20), ReactiveTest::on_completed(250)]
//! );
//! assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 250)]);
//! ```
use std::time::Duration;

mod cold_observable;
mod hot_observable;
mod mock_observer;
mod reactive_test;
mod recorded;
mod test_scheduler;

pub use cold_observable::ColdObservable;
pub use hot_observable::HotObservable;
pub use mock_observer::MockObserver;
pub use reactive_test::ReactiveTest;
pub use recorded::{Recorded, SubscriptionRecord};
pub use test_scheduler::{TestScheduler, Timing};

/// `n` virtual ticks as a [`Duration`] (one tick is one millisecond).
#[inline]
pub fn ticks(n: u64) -> Duration { Duration::from_millis(n) }
