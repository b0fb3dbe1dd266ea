use std::{
  future::Future,
  pin::Pin,
  task::{Context, Poll},
  time::{Duration, Instant},
};

use futures::executor::ThreadPool;
use pin_project_lite::pin_project;

use super::{Action, Scheduler};
use crate::{
  error::RxError,
  subscription::{BooleanSubscription, Subscription, SubscriptionLike},
};

/// Runs actions on a `futures` thread pool; delays are timer futures, so no
/// pool thread is blocked while waiting.
#[derive(Clone)]
pub struct ThreadPoolScheduler {
  pool: ThreadPool,
  epoch: Instant,
}

impl ThreadPoolScheduler {
  pub fn new() -> Result<Self, RxError> {
    let pool = ThreadPool::builder().name_prefix("rxkit-pool-").create().map_err(RxError::wrap)?;
    Ok(ThreadPoolScheduler { pool, epoch: Instant::now() })
  }

  pub fn from_pool(pool: ThreadPool) -> Self { ThreadPoolScheduler { pool, epoch: Instant::now() } }
}

pin_project! {
    struct DelayedAction {
        #[pin]
        sleep: futures_time::task::Sleep,
        action: Option<Action>,
        cancel: BooleanSubscription,
    }
}

impl Future for DelayedAction {
  type Output = ();

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
    let this = self.project();
    if this.cancel.is_closed() {
      return Poll::Ready(());
    }
    match this.sleep.poll(cx) {
      Poll::Pending => Poll::Pending,
      Poll::Ready(_) => {
        if let Some(action) = this.action.take() {
          if !this.cancel.is_closed() {
            action();
          }
        }
        Poll::Ready(())
      }
    }
  }
}

impl Scheduler for ThreadPoolScheduler {
  fn now(&self) -> Duration { self.epoch.elapsed() }

  fn schedule_relative(&self, delay: Duration, action: Action) -> Subscription {
    let cancel = BooleanSubscription::new();
    self.pool.spawn_ok(DelayedAction {
      sleep: futures_time::task::sleep(delay.into()),
      action: Some(action),
      cancel: cancel.clone(),
    });
    cancel.into()
  }
}
