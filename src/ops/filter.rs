use std::sync::Arc;

use crate::{
  error::RxError,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer},
  scheduler::SchedulerRef,
  subscription::Subscription,
};

type Predicate<T> = dyn Fn(&T, usize) -> Result<bool, RxError> + Send + Sync;

struct FilterOp<T> {
  source: Observable<T>,
  predicate: Arc<Predicate<T>>,
}

struct FilterObserver<T> {
  observer: BoxedObserver<T>,
  predicate: Arc<Predicate<T>>,
  index: usize,
  done: bool,
}

impl<T: Send + 'static> Observable<T> {
  /// Emits only the values for which `predicate` holds.
  pub fn filter(&self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Observable<T> {
    self.try_filter_indexed(move |v, _| Ok(predicate(v)))
  }

  pub fn try_filter(
    &self, predicate: impl Fn(&T) -> Result<bool, RxError> + Send + Sync + 'static,
  ) -> Observable<T> {
    self.try_filter_indexed(move |v, _| predicate(v))
  }

  pub fn filter_indexed(&self, predicate: impl Fn(&T, usize) -> bool + Send + Sync + 'static) -> Observable<T> {
    self.try_filter_indexed(move |v, i| Ok(predicate(v, i)))
  }

  pub fn try_filter_indexed(
    &self, predicate: impl Fn(&T, usize) -> Result<bool, RxError> + Send + Sync + 'static,
  ) -> Observable<T> {
    Observable::new(FilterOp { source: self.clone(), predicate: Arc::new(predicate) })
  }

  /// Maps and filters in one step: `Some` values are emitted, `None` are
  /// dropped.
  pub fn filter_map<U: Send + 'static>(&self, f: impl Fn(T) -> Option<U> + Send + Sync + 'static) -> Observable<U> {
    self.map(f).flat_option()
  }
}

impl<T: Send + 'static> Observable<Option<T>> {
  fn flat_option(&self) -> Observable<T> {
    Observable::new(FlattenOptionOp { source: self.clone() })
  }
}

struct FlattenOptionOp<T> {
  source: Observable<Option<T>>,
}

struct FlattenOptionObserver<T>(BoxedObserver<T>);

impl<T: Send + 'static> CoreObservable<T> for FlattenOptionOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    self.source.actual_subscribe(Box::new(FlattenOptionObserver(observer)), scheduler)
  }
}

impl<T> Observer<Option<T>> for FlattenOptionObserver<T> {
  fn next(&mut self, value: Option<T>) {
    if let Some(value) = value {
      self.0.next(value);
    }
  }

  fn error(&mut self, err: RxError) { self.0.error(err) }

  fn complete(&mut self) { self.0.complete() }

  fn is_closed(&self) -> bool { self.0.is_closed() }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
  /// Splits the source in two: values satisfying `predicate`, and the
  /// rest. Both halves share a single subscription to the source.
  pub fn partition(
    &self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
  ) -> (Observable<T>, Observable<T>) {
    let shared = self.share();
    let predicate = Arc::new(predicate);
    let p = predicate.clone();
    (shared.filter(move |v| p(v)), shared.filter(move |v| !predicate(v)))
  }
}

impl<T: Send + 'static> CoreObservable<T> for FilterOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let observer = FilterObserver { observer, predicate: self.predicate.clone(), index: 0, done: false };
    self.source.actual_subscribe(Box::new(observer), scheduler)
  }
}

impl<T> Observer<T> for FilterObserver<T> {
  fn next(&mut self, value: T) {
    if self.done {
      return;
    }
    let index = self.index;
    self.index += 1;
    match (self.predicate)(&value, index) {
      Ok(true) => self.observer.next(value),
      Ok(false) => {}
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

#[cfg(test)]
mod tests {
  use parking_lot::Mutex;

  use super::*;
  use crate::{
    observable::from_iter,
    testing::{ReactiveTest, TestScheduler},
  };

  #[rxkit_macro::test]
  fn fork_and_filter() {
    let seen = Arc::new(Mutex::new(vec![]));
    let s = seen.clone();
    from_iter(0..10).filter(|v| v % 2 == 0).filter_indexed(|_, i| i < 3).subscribe_next(move |v| s.lock().push(v));
    assert_eq!(*seen.lock(), vec![0, 2, 4]);
  }

  #[rxkit_macro::test]
  fn filter_map_drops_none() {
    let seen = Arc::new(Mutex::new(vec![]));
    let s = seen.clone();
    from_iter(vec!["1", "x", "3"]).filter_map(|v| v.parse::<i32>().ok()).subscribe_next(move |v| s.lock().push(v));
    assert_eq!(*seen.lock(), vec![1, 3]);
  }

  #[rxkit_macro::test]
  fn predicate_error() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(210, 1),
      ReactiveTest::on_next(220, -1),
      ReactiveTest::on_next(230, 3),
    ]);
    let src = xs.as_observable();
    let res = scheduler.start(move || src.try_filter(|v| if *v < 0 { Err("negative".into()) } else { Ok(true) }));
    assert_eq!(res.messages(), vec![ReactiveTest::on_next(210, 1), ReactiveTest::on_error(220, "negative")]);
    assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 220)]);
  }

  #[rxkit_macro::test]
  fn partition_shares_the_source() {
    let scheduler = TestScheduler::new();
    let xs = scheduler.create_hot_observable(vec![
      ReactiveTest::on_next(210, 1),
      ReactiveTest::on_next(220, 2),
      ReactiveTest::on_next(230, 3),
      ReactiveTest::on_completed(300),
    ]);
    let (evens, odds) = xs.as_observable().partition(|v| v % 2 == 0);
    let (even_res, odd_res) = (scheduler.create_observer(), scheduler.create_observer());
    let (e, o) = (even_res.clone(), odd_res.clone());
    scheduler.schedule_at(200, move || {
      evens.subscribe(e);
      odds.subscribe(o);
    });
    scheduler.start_scheduler();
    assert_eq!(even_res.messages(), vec![ReactiveTest::on_next(220, 2), ReactiveTest::on_completed(300)]);
    assert_eq!(
      odd_res.messages(),
      vec![ReactiveTest::on_next(210, 1), ReactiveTest::on_next(230, 3), ReactiveTest::on_completed(300)]
    );
    assert_eq!(xs.subscriptions(), vec![ReactiveTest::subscribe(200, 300)]);
  }
}
