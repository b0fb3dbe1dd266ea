use std::time::Duration;

use crate::{
  error::RxError,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer},
  scheduler::{timeout_or, SchedulerRef},
  subscription::Subscription,
};

impl<T: Send + 'static> Observable<T> {
  /// Emits a value, then ignores the source until `duration` has passed
  /// since that emission.
  pub fn throttle_first(&self, duration: Duration) -> Observable<T> { self.throttle_first_on(duration, None) }

  /// [`throttle_first`](Self::throttle_first) measured on the clock of
  /// `scheduler`.
  pub fn throttle_first_on(&self, duration: Duration, scheduler: Option<SchedulerRef>) -> Observable<T> {
    Observable::new(ThrottleFirstOp { source: self.clone(), duration, scheduler })
  }
}

struct ThrottleFirstOp<T> {
  source: Observable<T>,
  duration: Duration,
  scheduler: Option<SchedulerRef>,
}

struct ThrottleFirstObserver<T> {
  observer: BoxedObserver<T>,
  scheduler: SchedulerRef,
  duration: Duration,
  last_emit: Option<Duration>,
}

impl<T: Send + 'static> CoreObservable<T> for ThrottleFirstOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let observer = ThrottleFirstObserver {
      observer,
      scheduler: timeout_or(&self.scheduler.clone().or_else(|| scheduler.clone())),
      duration: self.duration,
      last_emit: None,
    };
    self.source.actual_subscribe(Box::new(observer), scheduler)
  }
}

impl<T> Observer<T> for ThrottleFirstObserver<T> {
  fn next(&mut self, value: T) {
    let now = self.scheduler.now();
    let open = match self.last_emit {
      Some(last) => now.saturating_sub(last) >= self.duration,
      None => true,
    };
    if open {
      self.last_emit = Some(now);
      self.observer.next(value);
    }
  }

  fn error(&mut self, err: RxError) { self.observer.error(err) }

  fn complete(&mut self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
