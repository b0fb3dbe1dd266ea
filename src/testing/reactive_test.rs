use super::{Recorded, SubscriptionRecord};
use crate::{error::RxError, notification::Notification};

/// Constants and record constructors used to write expected message logs.
pub struct ReactiveTest;

impl ReactiveTest {
  pub const CREATED: u64 = 100;
  pub const SUBSCRIBED: u64 = 200;
  pub const DISPOSED: u64 = 1000;

  pub fn on_next<T>(time: u64, value: T) -> Recorded<T> { Recorded::new(time, Notification::Next(value)) }

  pub fn on_completed<T>(time: u64) -> Recorded<T> { Recorded::new(time, Notification::Complete) }

  pub fn on_error<T>(time: u64, err: impl Into<RxError>) -> Recorded<T> {
    Recorded::new(time, Notification::Error(err.into()))
  }

  pub fn subscribe(start: u64, end: u64) -> SubscriptionRecord { SubscriptionRecord::new(start, end) }

  /// A subscription that was never disposed.
  pub fn subscribe_open(start: u64) -> SubscriptionRecord {
    SubscriptionRecord::new(start, SubscriptionRecord::INFINITE)
  }
}
