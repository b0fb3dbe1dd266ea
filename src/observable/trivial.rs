use std::time::Duration;

use crate::{
  error::RxError,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer},
  scheduler::{trampoline_or, SchedulerRef},
  subscription::Subscription,
};

const ONE_TICK: Duration = Duration::from_millis(1);

struct EmptyOp;

struct NeverOp;

struct ThrowOp(RxError);

/// Completes without emitting, one tick (1 ms) after subscription on the
/// supplied scheduler, or synchronously when there is none.
pub fn empty<T: Send + 'static>() -> Observable<T> { Observable::new(EmptyOp) }

/// Never emits and never terminates.
pub fn never<T: Send + 'static>() -> Observable<T> { Observable::new(NeverOp) }

/// Emits only `Error(err)`, from a task scheduled at subscription.
pub fn throw<T: Send + 'static>(err: impl Into<RxError>) -> Observable<T> {
  Observable::new(ThrowOp(err.into()))
}

impl<T: Send + 'static> CoreObservable<T> for EmptyOp {
  fn actual_subscribe(
    &self, mut observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>,
  ) -> Subscription {
    let complete = Box::new(move || observer.complete());
    match scheduler {
      Some(scheduler) => scheduler.schedule_relative(ONE_TICK, complete),
      None => trampoline_or(&None).schedule(complete),
    }
  }
}

impl<T: Send + 'static> CoreObservable<T> for NeverOp {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, _: Option<SchedulerRef>) -> Subscription {
    // keep the observer alive for as long as the subscription is
    Subscription::new(move || drop(observer))
  }
}

impl<T: Send + 'static> CoreObservable<T> for ThrowOp {
  fn actual_subscribe(
    &self, mut observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>,
  ) -> Subscription {
    let err = self.0.clone();
    trampoline_or(&scheduler).schedule(Box::new(move || observer.error(err)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::{ReactiveTest, TestScheduler};

  #[rxkit_macro::test]
  fn empty_completes_next_tick() {
    let scheduler = TestScheduler::new();
    let res = scheduler.start(empty::<i32>);
    assert_eq!(res.messages(), vec![ReactiveTest::on_completed(201)]);
  }

  #[rxkit_macro::test]
  fn never_is_silent() {
    let scheduler = TestScheduler::new();
    let res = scheduler.start(never::<i32>);
    assert!(res.messages().is_empty());
  }

  #[rxkit_macro::test]
  fn throw_errors_at_subscription() {
    let scheduler = TestScheduler::new();
    let res = scheduler.start(|| throw::<i32>("ex"));
    assert_eq!(res.messages(), vec![ReactiveTest::on_error(200, "ex")]);
  }

  #[rxkit_macro::test]
  fn empty_without_scheduler_is_synchronous() {
    let done = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let d = done.clone();
    empty::<i32>().subscribe_all(|_| {}, |_| {}, move || {
      d.store(true, std::sync::atomic::Ordering::SeqCst)
    });
    assert!(done.load(std::sync::atomic::Ordering::SeqCst));
  }
}
