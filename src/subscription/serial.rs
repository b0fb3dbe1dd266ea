use std::sync::Arc;

use parking_lot::Mutex;

use super::{Subscription, SubscriptionLike};

/// Holds one replaceable inner subscription; setting a new one unsubscribes
/// the previous one.
#[derive(Clone, Default)]
pub struct SerialSubscription(Arc<Mutex<SerialState>>);

#[derive(Default)]
struct SerialState {
  closed: bool,
  current: Option<Subscription>,
}

impl SerialSubscription {
  pub fn new() -> Self { Self::default() }

  pub fn set(&self, subscription: Subscription) {
    let previous = {
      let mut state = self.0.lock();
      if state.closed {
        Some(subscription)
      } else {
        state.current.replace(subscription)
      }
    };
    if let Some(previous) = previous {
      previous.unsubscribe();
    }
  }

  pub fn get(&self) -> Option<Subscription> { self.0.lock().current.clone() }
}

impl SubscriptionLike for SerialSubscription {
  fn unsubscribe(&self) {
    let current = {
      let mut state = self.0.lock();
      if state.closed {
        return;
      }
      state.closed = true;
      state.current.take()
    };
    if let Some(current) = current {
      current.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.0.lock().closed }
}

impl From<SerialSubscription> for Subscription {
  fn from(s: SerialSubscription) -> Self { Subscription::from_like(s) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxkit_macro::test]
  fn replacing_disposes_previous() {
    let serial = SerialSubscription::new();
    let a = Subscription::empty();
    let b = Subscription::empty();
    serial.set(a.clone());
    serial.set(b.clone());
    assert!(a.is_closed());
    assert!(!b.is_closed());
    serial.unsubscribe();
    assert!(b.is_closed());
    let c = Subscription::empty();
    serial.set(c.clone());
    assert!(c.is_closed());
  }
}
