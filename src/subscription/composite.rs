use std::{
  panic::{catch_unwind, resume_unwind, AssertUnwindSafe},
  sync::Arc,
};

use parking_lot::Mutex;
use smallvec::SmallVec;

use super::{Subscription, SubscriptionLike};

/// An ordered group of subscriptions released together.
#[derive(Clone, Default)]
pub struct CompositeSubscription(Arc<Mutex<Inner>>);

#[derive(Default)]
struct Inner {
  closed: bool,
  teardown: SmallVec<[Subscription; 1]>,
}

impl CompositeSubscription {
  pub fn new() -> Self { Self::default() }

  /// Adds `subscription`; if the group is already closed it is released
  /// immediately instead.
  pub fn add(&self, subscription: Subscription) {
    let rejected = {
      let mut inner = self.0.lock();
      if inner.closed {
        Some(subscription)
      } else {
        inner.teardown.retain(|s| !s.is_closed());
        inner.teardown.push(subscription);
        None
      }
    };
    if let Some(rejected) = rejected {
      rejected.unsubscribe();
    }
  }

  /// Removes `subscription` from the group and unsubscribes it. Returns
  /// whether it was found.
  pub fn remove(&self, subscription: &Subscription) -> bool {
    let removed = {
      let mut inner = self.0.lock();
      let before = inner.teardown.len();
      inner.teardown.retain(|s| !s.ptr_eq(subscription));
      before != inner.teardown.len()
    };
    if removed {
      subscription.unsubscribe();
    }
    removed
  }

  /// Unsubscribes and drops every member without closing the group.
  pub fn clear(&self) {
    let members = std::mem::take(&mut self.0.lock().teardown);
    release(members);
  }

  pub fn len(&self) -> usize { self.0.lock().teardown.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl SubscriptionLike for CompositeSubscription {
  fn unsubscribe(&self) {
    let members = {
      let mut inner = self.0.lock();
      if inner.closed {
        return;
      }
      inner.closed = true;
      std::mem::take(&mut inner.teardown)
    };
    release(members);
  }

  fn is_closed(&self) -> bool { self.0.lock().closed }
}

/// Unsubscribes every member even when a teardown panics; the first panic
/// is resumed once all members are released.
fn release(members: SmallVec<[Subscription; 1]>) {
  let mut first_panic = None;
  for s in members {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| s.unsubscribe())) {
      tracing::error!("a subscription teardown panicked");
      first_panic.get_or_insert(payload);
    }
  }
  if let Some(payload) = first_panic {
    resume_unwind(payload);
  }
}

impl From<CompositeSubscription> for Subscription {
  fn from(s: CompositeSubscription) -> Self { Subscription::from_like(s) }
}
