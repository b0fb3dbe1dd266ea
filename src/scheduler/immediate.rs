use std::time::{Duration, Instant};

use super::{Action, Scheduler};
use crate::subscription::Subscription;

/// Runs every action synchronously on the calling thread. A relative delay
/// blocks the caller for that long first.
#[derive(Clone, Copy, Debug)]
pub struct ImmediateScheduler {
  epoch: Instant,
}

impl ImmediateScheduler {
  pub fn new() -> Self { ImmediateScheduler { epoch: Instant::now() } }
}

impl Default for ImmediateScheduler {
  fn default() -> Self { Self::new() }
}

impl Scheduler for ImmediateScheduler {
  fn now(&self) -> Duration { self.epoch.elapsed() }

  fn schedule_relative(&self, delay: Duration, action: Action) -> Subscription {
    if !delay.is_zero() {
      std::thread::sleep(delay);
    }
    action();
    let done = Subscription::empty();
    done.unsubscribe();
    done
  }
}
