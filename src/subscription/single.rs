use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use once_cell::sync::OnceCell;

use super::{Subscription, SubscriptionLike};

/// Holds at most one inner subscription, assigned once.
///
/// If the holder is already unsubscribed when the inner value arrives, the
/// inner value is unsubscribed immediately. A second assignment is a bug in
/// the caller: it is logged and the newcomer is unsubscribed.
#[derive(Clone, Default)]
pub struct SingleSubscription(Arc<Inner>);

#[derive(Default)]
struct Inner {
  closed: AtomicBool,
  cell: OnceCell<Subscription>,
}

impl SingleSubscription {
  pub fn new() -> Self { Self::default() }

  pub fn set(&self, subscription: Subscription) {
    match self.0.cell.set(subscription) {
      Ok(()) => {
        if self.0.closed.load(Ordering::Acquire) {
          if let Some(inner) = self.0.cell.get() {
            inner.unsubscribe();
          }
        }
      }
      Err(rejected) => {
        tracing::warn!("single subscription assigned twice; disposing the newcomer");
        rejected.unsubscribe();
      }
    }
  }

  pub fn get(&self) -> Option<Subscription> { self.0.cell.get().cloned() }
}

impl SubscriptionLike for SingleSubscription {
  fn unsubscribe(&self) {
    if !self.0.closed.swap(true, Ordering::AcqRel) {
      if let Some(inner) = self.0.cell.get() {
        inner.unsubscribe();
      }
    }
  }

  fn is_closed(&self) -> bool { self.0.closed.load(Ordering::Acquire) }
}

impl From<SingleSubscription> for Subscription {
  fn from(s: SingleSubscription) -> Self { Subscription::from_like(s) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxkit_macro::test]
  fn late_assignment_is_disposed() {
    let single = SingleSubscription::new();
    single.unsubscribe();
    let inner = Subscription::empty();
    single.set(inner.clone());
    assert!(inner.is_closed());
  }

  #[rxkit_macro::test]
  fn second_assignment_rejected() {
    let single = SingleSubscription::new();
    let first = Subscription::empty();
    let second = Subscription::empty();
    single.set(first.clone());
    single.set(second.clone());
    assert!(second.is_closed());
    assert!(!first.is_closed());
    single.unsubscribe();
    assert!(first.is_closed());
  }
}
