//! Cancellable handles returned by `subscribe` and by every scheduling call.
//!
//! All handles are cheap to clone, safe to share between threads and
//! idempotent: unsubscribing twice is the same as unsubscribing once.
use std::{
  fmt::{Debug, Formatter},
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use parking_lot::Mutex;

mod boolean;
mod composite;
mod ref_count;
mod scheduled;
mod serial;
mod single;

pub use boolean::BooleanSubscription;
pub use composite::CompositeSubscription;
pub use ref_count::RefCountSubscription;
pub use scheduled::ScheduledSubscription;
pub use serial::SerialSubscription;
pub use single::SingleSubscription;

pub trait SubscriptionLike: Send + Sync {
  /// Releases the resources held by this handle. Must be idempotent.
  fn unsubscribe(&self);

  fn is_closed(&self) -> bool;
}

/// Type-erased subscription handle.
#[derive(Clone)]
pub struct Subscription(Arc<dyn SubscriptionLike>);

impl Subscription {
  /// A subscription that runs `teardown` the first time it is unsubscribed.
  pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
    Subscription(Arc::new(ClosureSubscription {
      closed: AtomicBool::new(false),
      teardown: Mutex::new(Some(Box::new(teardown))),
    }))
  }

  /// A subscription with nothing to release.
  pub fn empty() -> Self { BooleanSubscription::default().into() }

  pub fn from_like(inner: impl SubscriptionLike + 'static) -> Self { Subscription(Arc::new(inner)) }

  #[inline]
  pub fn unsubscribe(&self) { self.0.unsubscribe() }

  #[inline]
  pub fn is_closed(&self) -> bool { self.0.is_closed() }

  /// Identity comparison: true when both handles share the same resource.
  pub fn ptr_eq(&self, other: &Subscription) -> bool { Arc::ptr_eq(&self.0, &other.0) }

  /// Activates "RAII" behavior for this subscription. That means
  /// `unsubscribe()` will be called automatically as soon as the returned
  /// value goes out of scope.
  ///
  /// **Attention:** If you don't assign the return value to a variable,
  /// `unsubscribe()` is called immediately, which is probably not what you
  /// want!
  pub fn unsubscribe_when_dropped(self) -> SubscriptionGuard { SubscriptionGuard(self) }
}

impl SubscriptionLike for Subscription {
  #[inline]
  fn unsubscribe(&self) { self.0.unsubscribe() }
  #[inline]
  fn is_closed(&self) -> bool { self.0.is_closed() }
}

impl Debug for Subscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription").field("is_closed", &self.is_closed()).finish()
  }
}

struct ClosureSubscription {
  closed: AtomicBool,
  teardown: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl SubscriptionLike for ClosureSubscription {
  fn unsubscribe(&self) {
    if !self.closed.swap(true, Ordering::AcqRel) {
      let teardown = self.teardown.lock().take();
      if let Some(teardown) = teardown {
        teardown();
      }
    }
  }

  fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
#[derive(Debug)]
#[must_use]
pub struct SubscriptionGuard(Subscription);

impl SubscriptionGuard {
  pub fn new(subscription: Subscription) -> Self { SubscriptionGuard(subscription) }
}

impl Drop for SubscriptionGuard {
  #[inline]
  fn drop(&mut self) { self.0.unsubscribe() }
}
