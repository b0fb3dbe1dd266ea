use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use super::{Subscription, SubscriptionLike};
use crate::scheduler::SchedulerRef;

/// Unsubscribes its inner subscription as a task on `scheduler` rather than
/// on the calling thread.
#[derive(Clone)]
pub struct ScheduledSubscription {
  scheduler: SchedulerRef,
  inner: Subscription,
  closed: Arc<AtomicBool>,
}

impl ScheduledSubscription {
  pub fn new(scheduler: SchedulerRef, inner: Subscription) -> Self {
    ScheduledSubscription { scheduler, inner, closed: Arc::new(AtomicBool::new(false)) }
  }
}

impl SubscriptionLike for ScheduledSubscription {
  fn unsubscribe(&self) {
    if !self.closed.swap(true, Ordering::AcqRel) {
      let inner = self.inner.clone();
      self.scheduler.schedule(Box::new(move || inner.unsubscribe()));
    }
  }

  fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) }
}

impl From<ScheduledSubscription> for Subscription {
  fn from(s: ScheduledSubscription) -> Self { Subscription::from_like(s) }
}
