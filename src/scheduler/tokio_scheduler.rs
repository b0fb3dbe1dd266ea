use std::time::{Duration, Instant};

use tokio::runtime::Handle;

use super::{Action, Scheduler};
use crate::{error::RxError, subscription::Subscription};

/// Spawns actions onto a tokio runtime.
#[derive(Clone)]
pub struct TokioScheduler {
  handle: Handle,
  epoch: Instant,
}

impl TokioScheduler {
  pub fn new(handle: Handle) -> Self { TokioScheduler { handle, epoch: Instant::now() } }

  /// Uses the runtime the caller is running on.
  pub fn current() -> Result<Self, RxError> {
    Handle::try_current().map(Self::new).map_err(RxError::wrap)
  }
}

impl Scheduler for TokioScheduler {
  fn now(&self) -> Duration { self.epoch.elapsed() }

  fn schedule_relative(&self, delay: Duration, action: Action) -> Subscription {
    let task = self.handle.spawn(async move {
      if !delay.is_zero() {
        tokio::time::sleep(delay).await;
      }
      action();
    });
    Subscription::new(move || task.abort())
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  use super::*;

  #[rxkit_macro::test(shared)]
  async fn runs_on_runtime() {
    let scheduler = TokioScheduler::current().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    scheduler.schedule_relative(
      Duration::from_millis(5),
      Box::new(move || {
        h.fetch_add(1, Ordering::SeqCst);
      }),
    );
    let h = hits.clone();
    scheduler
      .schedule_relative(
        Duration::from_millis(50),
        Box::new(move || {
          h.fetch_add(1, Ordering::SeqCst);
        }),
      )
      .unsubscribe();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }
}
