use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use super::{Subscription, SubscriptionLike};

/// A flag that can be polled to find out whether it was unsubscribed.
#[derive(Clone, Default, Debug)]
pub struct BooleanSubscription(Arc<AtomicBool>);

impl BooleanSubscription {
  pub fn new() -> Self { Self::default() }
}

impl SubscriptionLike for BooleanSubscription {
  #[inline]
  fn unsubscribe(&self) { self.0.store(true, Ordering::Release) }
  #[inline]
  fn is_closed(&self) -> bool { self.0.load(Ordering::Acquire) }
}

impl From<BooleanSubscription> for Subscription {
  fn from(s: BooleanSubscription) -> Self { Subscription::from_like(s) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxkit_macro::test]
  fn clones_share_the_flag() {
    let flag = BooleanSubscription::new();
    let handle: Subscription = flag.clone().into();
    handle.unsubscribe();
    assert!(flag.is_closed());
  }
}
