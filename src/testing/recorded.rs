use std::fmt;

use crate::notification::Notification;

/// A notification stamped with the virtual time it was observed at.
#[derive(Clone, Debug, PartialEq)]
pub struct Recorded<T> {
  pub time: u64,
  pub value: Notification<T>,
}

impl<T> Recorded<T> {
  pub fn new(time: u64, value: Notification<T>) -> Self { Recorded { time, value } }
}

impl<T: fmt::Debug> fmt::Display for Recorded<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.value {
      Notification::Next(v) => write!(f, "{:?}@{}", v, self.time),
      Notification::Error(e) => write!(f, "error({})@{}", e, self.time),
      Notification::Complete => write!(f, "complete@{}", self.time),
    }
  }
}

/// The virtual-time interval of one subscription to a test observable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriptionRecord {
  pub subscribe: u64,
  pub unsubscribe: u64,
}

impl SubscriptionRecord {
  /// End marker of a subscription that is still active.
  pub const INFINITE: u64 = u64::MAX;

  pub fn new(subscribe: u64, unsubscribe: u64) -> Self { SubscriptionRecord { subscribe, unsubscribe } }

  pub fn is_open(&self) -> bool { self.unsubscribe == Self::INFINITE }
}

impl fmt::Display for SubscriptionRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_open() {
      write!(f, "({}, infinite)", self.subscribe)
    } else {
      write!(f, "({}, {})", self.subscribe, self.unsubscribe)
    }
  }
}
