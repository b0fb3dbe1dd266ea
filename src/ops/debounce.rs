use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{
  error::RxError,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer, Subscriber},
  scheduler::{timeout_or, SchedulerRef},
  subscription::{SerialSubscription, Subscription, SubscriptionLike},
};

impl<T: Send + 'static> Observable<T> {
  /// Emits a value only once `duration` has passed without another value.
  /// Completion flushes the pending value first; an error drops it.
  pub fn debounce(&self, duration: Duration) -> Observable<T> { self.debounce_on(duration, None) }

  /// [`debounce`](Self::debounce) with its timers on `scheduler`.
  pub fn debounce_on(&self, duration: Duration, scheduler: Option<SchedulerRef>) -> Observable<T> {
    Observable::new(DebounceOp { source: self.clone(), duration, scheduler })
  }
}

struct DebounceOp<T> {
  source: Observable<T>,
  duration: Duration,
  scheduler: Option<SchedulerRef>,
}

struct Debounce<T> {
  observer: Subscriber<T>,
  scheduler: SchedulerRef,
  duration: Duration,
  timer: SerialSubscription,
  // pending value, tagged with the id of the timer that may emit it
  pending: Mutex<(u64, Option<T>)>,
}

struct DebounceObserver<T>(Arc<Debounce<T>>);

impl<T: Send + 'static> CoreObservable<T> for DebounceOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let state = Arc::new(Debounce {
      observer: Subscriber::from_boxed(observer),
      scheduler: timeout_or(&self.scheduler.clone().or_else(|| scheduler.clone())),
      duration: self.duration,
      timer: SerialSubscription::new(),
      pending: Mutex::new((0, None)),
    });
    let source = self.source.actual_subscribe(Box::new(DebounceObserver(state.clone())), scheduler);
    Subscription::new(move || {
      source.unsubscribe();
      state.timer.unsubscribe();
      state.observer.unsubscribe();
    })
  }
}

impl<T: Send + 'static> Debounce<T> {
  fn take_pending(&self) -> Option<T> {
    let mut pending = self.pending.lock();
    pending.0 += 1;
    pending.1.take()
  }
}

impl<T: Send + 'static> Observer<T> for DebounceObserver<T> {
  fn next(&mut self, value: T) {
    let id = {
      let mut pending = self.0.pending.lock();
      pending.0 += 1;
      pending.1 = Some(value);
      pending.0
    };
    let state = self.0.clone();
    let timer = self.0.scheduler.schedule_relative(
      self.0.duration,
      Box::new(move || {
        let value = {
          let mut pending = state.pending.lock();
          if pending.0 == id { pending.1.take() } else { None }
        };
        if let Some(value) = value {
          state.observer.clone().next(value);
        }
      }),
    );
    self.0.timer.set(timer);
  }

  fn error(&mut self, err: RxError) {
    self.0.timer.unsubscribe();
    self.0.take_pending();
    self.0.observer.clone().error(err);
  }

  fn complete(&mut self) {
    self.0.timer.unsubscribe();
    let mut observer = self.0.observer.clone();
    if let Some(value) = self.0.take_pending() {
      observer.next(value);
    }
    observer.complete();
  }

  fn is_closed(&self) -> bool { self.0.observer.is_closed() }
}
