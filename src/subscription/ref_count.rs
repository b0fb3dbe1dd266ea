use std::sync::Arc;

use parking_lot::Mutex;

use super::{Subscription, SubscriptionLike};

/// Releases the underlying subscription only after the primary handle and
/// every dependent reference have been unsubscribed.
#[derive(Clone)]
pub struct RefCountSubscription(Arc<Inner>);

struct Inner {
  underlying: Subscription,
  state: Mutex<RefState>,
}

#[derive(Default)]
struct RefState {
  count: usize,
  primary_released: bool,
  disposed: bool,
}

impl RefCountSubscription {
  pub fn new(underlying: Subscription) -> Self {
    RefCountSubscription(Arc::new(Inner { underlying, state: Mutex::new(RefState::default()) }))
  }

  /// Returns a dependent handle. Once the underlying resource is gone, an
  /// already closed handle is returned.
  pub fn get_reference(&self) -> Subscription {
    {
      let mut state = self.0.state.lock();
      if state.disposed {
        return closed();
      }
      state.count += 1;
    }
    let inner = self.0.clone();
    Subscription::new(move || {
      let release = {
        let mut state = inner.state.lock();
        state.count -= 1;
        if state.primary_released && state.count == 0 && !state.disposed {
          state.disposed = true;
          true
        } else {
          false
        }
      };
      if release {
        inner.underlying.unsubscribe();
      }
    })
  }
}

fn closed() -> Subscription {
  let s = Subscription::empty();
  s.unsubscribe();
  s
}

impl SubscriptionLike for RefCountSubscription {
  fn unsubscribe(&self) {
    let release = {
      let mut state = self.0.state.lock();
      if state.primary_released {
        return;
      }
      state.primary_released = true;
      if state.count == 0 && !state.disposed {
        state.disposed = true;
        true
      } else {
        false
      }
    };
    if release {
      self.0.underlying.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.0.state.lock().disposed }
}

impl From<RefCountSubscription> for Subscription {
  fn from(s: RefCountSubscription) -> Self { Subscription::from_like(s) }
}
