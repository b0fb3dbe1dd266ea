use std::time::{Duration, Instant};

use super::{Action, Scheduler};
use crate::subscription::{BooleanSubscription, Subscription, SubscriptionLike};

/// Spawns a new OS thread for every scheduled action.
#[derive(Clone, Copy, Debug)]
pub struct NewThreadScheduler {
  epoch: Instant,
}

impl NewThreadScheduler {
  pub fn new() -> Self { NewThreadScheduler { epoch: Instant::now() } }
}

impl Default for NewThreadScheduler {
  fn default() -> Self { Self::new() }
}

impl Scheduler for NewThreadScheduler {
  fn now(&self) -> Duration { self.epoch.elapsed() }

  fn schedule_relative(&self, delay: Duration, action: Action) -> Subscription {
    let cancel = BooleanSubscription::new();
    let flag = cancel.clone();
    let spawned = std::thread::Builder::new().name("rxkit-new-thread".into()).spawn(move || {
      if !delay.is_zero() {
        std::thread::sleep(delay);
      }
      if !flag.is_closed() {
        action();
      }
    });
    if let Err(err) = spawned {
      tracing::error!(error = %err, "failed to spawn scheduler thread");
    }
    cancel.into()
  }
}
