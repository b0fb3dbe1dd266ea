use std::sync::Arc;

use crate::{
  error::RxError,
  observable::{empty, CoreObservable, Observable},
  observer::{BoxedObserver, Observer, Subscriber},
  scheduler::SchedulerRef,
  subscription::{CompositeSubscription, Subscription},
};

struct TakeOp<T> {
  source: Observable<T>,
  count: usize,
}

struct TakeObserver<T> {
  observer: BoxedObserver<T>,
  remaining: usize,
}

type Predicate<T> = dyn Fn(&T) -> Result<bool, RxError> + Send + Sync;

struct TakeWhileOp<T> {
  source: Observable<T>,
  predicate: Arc<Predicate<T>>,
}

struct TakeWhileObserver<T> {
  observer: BoxedObserver<T>,
  predicate: Arc<Predicate<T>>,
  done: bool,
}

struct TakeUntilOp<T, N> {
  source: Observable<T>,
  notifier: Observable<N>,
}

struct TakeUntilNotifier<T> {
  observer: Subscriber<T>,
}

impl<T: Send + 'static> Observable<T> {
  /// Emits the first `count` values, then completes. `take(0)` completes
  /// without subscribing to the source.
  pub fn take(&self, count: usize) -> Observable<T> {
    if count == 0 {
      return empty();
    }
    Observable::new(TakeOp { source: self.clone(), count })
  }

  /// Emits values while `predicate` holds, and completes at the first value
  /// for which it does not.
  pub fn take_while(&self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Observable<T> {
    self.try_take_while(move |v| Ok(predicate(v)))
  }

  pub fn try_take_while(
    &self, predicate: impl Fn(&T) -> Result<bool, RxError> + Send + Sync + 'static,
  ) -> Observable<T> {
    Observable::new(TakeWhileOp { source: self.clone(), predicate: Arc::new(predicate) })
  }

  /// Emits values until `notifier` emits a value or errors. A notifier that
  /// completes without emitting has no effect.
  pub fn take_until<N: Send + 'static>(&self, notifier: Observable<N>) -> Observable<T> {
    Observable::new(TakeUntilOp { source: self.clone(), notifier })
  }
}

impl<T: Send + 'static> CoreObservable<T> for TakeOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    self.source.actual_subscribe(Box::new(TakeObserver { observer, remaining: self.count }), scheduler)
  }
}

impl<T> Observer<T> for TakeObserver<T> {
  fn next(&mut self, value: T) {
    if self.remaining == 0 {
      return;
    }
    self.remaining -= 1;
    self.observer.next(value);
    if self.remaining == 0 {
      self.observer.complete();
    }
  }

  fn error(&mut self, err: RxError) { self.observer.error(err) }

  fn complete(&mut self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.remaining == 0 || self.observer.is_closed() }
}

impl<T: Send + 'static> CoreObservable<T> for TakeWhileOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let observer = TakeWhileObserver { observer, predicate: self.predicate.clone(), done: false };
    self.source.actual_subscribe(Box::new(observer), scheduler)
  }
}

impl<T> Observer<T> for TakeWhileObserver<T> {
  fn next(&mut self, value: T) {
    if self.done {
      return;
    }
    match (self.predicate)(&value) {
      Ok(true) => self.observer.next(value),
      Ok(false) => {
        self.done = true;
        self.observer.complete();
      }
      Err(err) => {
        self.done = true;
        self.observer.error(err);
      }
    }
  }

  fn error(&mut self, err: RxError) { self.observer.error(err) }

  fn complete(&mut self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.done || self.observer.is_closed() }
}

impl<T: Send + 'static, N: Send + 'static> CoreObservable<T> for TakeUntilOp<T, N> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let observer = Subscriber::from_boxed(observer);
    let group = CompositeSubscription::new();
    group.add(self.notifier.subscribe_gated(
      Box::new(TakeUntilNotifier { observer: observer.clone() }),
      scheduler.clone(),
    ));
    if !observer.is_closed() {
      group.add(self.source.actual_subscribe(Box::new(observer), scheduler));
    }
    group.into()
  }
}

impl<T: Send + 'static, N> Observer<N> for TakeUntilNotifier<T> {
  fn next(&mut self, _: N) { self.observer.complete() }

  fn error(&mut self, err: RxError) { self.observer.error(err) }

  fn complete(&mut self) {}

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    observable::{from_iter, never},
    testing::{ReactiveTest, TestScheduler},
  };

  #[rxkit_macro::test]
  fn take_first_values() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(210, 1),
      ReactiveTest::on_next(220, 2),
      ReactiveTest::on_next(230, 3),
      ReactiveTest::on_completed(300),
    ]);
    let src = xs.as_observable();
    let res = scheduler.start(move || src.take(2));
    assert_eq!(
      res.messages(),
      vec![ReactiveTest::on_next(210, 1), ReactiveTest::on_next(220, 2), ReactiveTest::on_completed(220)]
    );
    assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 220)]);
  }

  #[rxkit_macro::test]
  fn take_zero_never_subscribes() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![ReactiveTest::on_next(210, 1)]);
    let src = xs.as_observable();
    let res = scheduler.start(move || src.take(0));
    assert_eq!(res.messages(), vec![ReactiveTest::on_completed(201)]);
    assert!(xs.subscriptions().is_empty());
  }

  #[rxkit_macro::test]
  fn take_stops_a_synchronous_source() {
    let seen = Arc::new(parking_lot::Mutex::new(vec![]));
    let s = seen.clone();
    from_iter(0..).take(3).subscribe_next(move |v| s.lock().push(v));
    assert_eq!(*seen.lock(), vec![0, 1, 2]);
  }

  #[rxkit_macro::test]
  fn take_while_completes_at_first_failure() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(210, 2),
      ReactiveTest::on_next(220, 4),
      ReactiveTest::on_next(230, 5),
      ReactiveTest::on_next(240, 6),
      ReactiveTest::on_completed(300),
    ]);
    let src = xs.as_observable();
    let res = scheduler.start(move || src.take_while(|v| v % 2 == 0));
    assert_eq!(
      res.messages(),
      vec![ReactiveTest::on_next(210, 2), ReactiveTest::on_next(220, 4), ReactiveTest::on_completed(230)]
    );
    assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 230)]);
  }

  #[rxkit_macro::test]
  fn take_until_notifier_fires() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(210, 1),
      ReactiveTest::on_next(230, 2),
      ReactiveTest::on_next(250, 3),
      ReactiveTest::on_completed(300),
    ]);
    let ys = scheduler.create_hot_observable(vec![ReactiveTest::on_next(240, "stop")]);
    let (src, other) = (xs.as_observable(), ys.as_observable());
    let res = scheduler.start(move || src.take_until(other));
    assert_eq!(
      res.messages(),
      vec![ReactiveTest::on_next(210, 1), ReactiveTest::on_next(230, 2), ReactiveTest::on_completed(240)]
    );
    assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 240)]);
    assert_eq!(ys.subscriptions(), vec![ReactiveTest::subscribe(200, 240)]);
  }

  #[rxkit_macro::test]
  fn take_until_empty_notifier_is_a_no_op() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(210, 1),
      ReactiveTest::on_next(260, 2),
      ReactiveTest::on_completed(300),
    ]);
    let ys = scheduler.create_hot_observable::<i32>(vec![ReactiveTest::on_completed(220)]);
    let (src, other) = (xs.as_observable(), ys.as_observable());
    let res = scheduler.start(move || src.take_until(other));
    assert_eq!(
      res.messages(),
      vec![ReactiveTest::on_next(210, 1), ReactiveTest::on_next(260, 2), ReactiveTest::on_completed(300)]
    );
  }

  #[rxkit_macro::test]
  fn take_until_notifier_error() {
    let scheduler = TestScheduler::new();
    let ys = scheduler.create_hot_observable::<i32>(vec![ReactiveTest::on_error(220, "ex")]);
    let other = ys.as_observable();
    let res = scheduler.start(move || never::<i32>().take_until(other));
    assert_eq!(res.messages(), vec![ReactiveTest::on_error(220, "ex")]);
  }
}
