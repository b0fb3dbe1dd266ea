use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{
  error::RxError,
  observable::{throw, CoreObservable, Observable},
  observer::{BoxedObserver, Observer, Subscriber},
  scheduler::{timeout_or, SchedulerRef},
  subscription::{SerialSubscription, Subscription, SubscriptionLike},
};

impl<T: Send + 'static> Observable<T> {
  /// Mirrors the source while every value arrives within `due` of the
  /// previous one (or of the subscription). When a gap is longer, the
  /// source is released and `other` takes over; without `other` the output
  /// errors with [`RxError::Timeout`].
  pub fn timeout(&self, due: Duration, other: Option<Observable<T>>) -> Observable<T> {
    self.timeout_on(due, other, None)
  }

  /// [`timeout`](Self::timeout) with its timers on `scheduler`.
  pub fn timeout_on(
    &self, due: Duration, other: Option<Observable<T>>, scheduler: Option<SchedulerRef>,
  ) -> Observable<T> {
    let other = other.unwrap_or_else(|| throw(RxError::Timeout));
    Observable::new(TimeoutOp { source: self.clone(), due, other, scheduler })
  }
}

struct TimeoutOp<T> {
  source: Observable<T>,
  due: Duration,
  other: Observable<T>,
  scheduler: Option<SchedulerRef>,
}

struct Timeout<T> {
  observer: Subscriber<T>,
  timers: SchedulerRef,
  scheduler: Option<SchedulerRef>,
  due: Duration,
  other: Observable<T>,
  source: SerialSubscription,
  timer: SerialSubscription,
  // id of the live timer, and whether `other` has taken over
  state: Mutex<(u64, bool)>,
}

struct TimeoutObserver<T>(Arc<Timeout<T>>);

impl<T: Send + 'static> CoreObservable<T> for TimeoutOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let state = Arc::new(Timeout {
      observer: Subscriber::from_boxed(observer),
      timers: timeout_or(&self.scheduler.clone().or_else(|| scheduler.clone())),
      scheduler: scheduler.clone(),
      due: self.due,
      other: self.other.clone(),
      source: SerialSubscription::new(),
      timer: SerialSubscription::new(),
      state: Mutex::new((0, false)),
    });
    state.start_timer();
    state.source.set(self.source.subscribe_gated(Box::new(TimeoutObserver(state.clone())), scheduler));
    Subscription::new(move || {
      state.observer.unsubscribe();
      state.source.unsubscribe();
      state.timer.unsubscribe();
    })
  }
}

impl<T: Send + 'static> Timeout<T> {
  fn start_timer(self: &Arc<Self>) {
    let id = self.state.lock().0;
    let this = self.clone();
    let timer = self.timers.schedule_relative(
      self.due,
      Box::new(move || {
        let switch = {
          let mut state = this.state.lock();
          let fire = state.0 == id && !state.1;
          state.1 |= fire;
          fire
        };
        if switch {
          tracing::trace!("timeout elapsed, switching to the fallback");
          let fallback = this.other.subscribe_gated(Box::new(this.observer.clone()), this.scheduler.clone());
          this.source.set(fallback);
        }
      }),
    );
    self.timer.set(timer);
  }

  /// Marks the source as the winner of its race with the timer; false once
  /// the fallback has taken over.
  fn source_wins(&self) -> bool {
    let mut state = self.state.lock();
    if state.1 {
      return false;
    }
    state.0 += 1;
    true
  }
}

impl<T: Send + 'static> Observer<T> for TimeoutObserver<T> {
  fn next(&mut self, value: T) {
    if self.0.source_wins() {
      self.0.observer.clone().next(value);
      self.0.start_timer();
    }
  }

  fn error(&mut self, err: RxError) {
    if self.0.source_wins() {
      self.0.timer.unsubscribe();
      self.0.observer.clone().error(err);
    }
  }

  fn complete(&mut self) {
    if self.0.source_wins() {
      self.0.timer.unsubscribe();
      self.0.observer.clone().complete();
    }
  }

  fn is_closed(&self) -> bool { self.0.observer.is_closed() || self.0.state.lock().1 }
}

#[cfg(test)]
mod tests {
  use crate::{
    error::RxError,
    testing::{ticks, ReactiveTest, TestScheduler},
  };

  #[rxkit_macro::test]
  fn values_in_time_pass_through() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(210, 1),
      ReactiveTest::on_next(240, 2),
      ReactiveTest::on_next(310, 3),
      ReactiveTest::on_completed(320),
    ]);
    let ys = scheduler.create_cold_observable(vec![ReactiveTest::on_next(10, -1)]);
    let (src, other) = (xs.as_observable(), ys.as_observable());
    let res = scheduler.start(move || src.timeout(ticks(100), Some(other)));
    assert_eq!(
      res.messages(),
      vec![
        ReactiveTest::on_next(210, 1),
        ReactiveTest::on_next(240, 2),
        ReactiveTest::on_next(310, 3),
        ReactiveTest::on_completed(320),
      ]
    );
    assert!(ys.subscriptions().is_empty());
  }

  #[rxkit_macro::test]
  fn switches_to_the_fallback() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(70, 1),
      ReactiveTest::on_next(130, 2),
      ReactiveTest::on_next(310, 3),
      ReactiveTest::on_next(400, 4),
      ReactiveTest::on_completed(500),
    ]);
    let ys = scheduler.create_cold_observable(vec![
      ReactiveTest::on_next(50, -1),
      ReactiveTest::on_next(200, -2),
      ReactiveTest::on_next(310, -3),
      ReactiveTest::on_completed(320),
    ]);
    let (src, other) = (xs.as_observable(), ys.as_observable());
    let res = scheduler.start(move || src.timeout(ticks(100), Some(other)));
    assert_eq!(
      res.messages(),
      vec![
        ReactiveTest::on_next(350, -1),
        ReactiveTest::on_next(500, -2),
        ReactiveTest::on_next(610, -3),
        ReactiveTest::on_completed(620),
      ]
    );
    assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 300)]);
    assert_eq!(ys.subscriptions(), vec![ReactiveTest::subscribe(300, 620)]);
  }

  #[rxkit_macro::test]
  fn errors_without_a_fallback() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(210, 1),
      ReactiveTest::on_next(300, 2),
      ReactiveTest::on_completed(400),
    ]);
    let src = xs.as_observable();
    let res = scheduler.start(move || src.timeout(ticks(50), None));
    assert_eq!(res.messages(), vec![ReactiveTest::on_next(210, 1), ReactiveTest::on_error(260, RxError::Timeout)]);
    assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 260)]);
  }
}
