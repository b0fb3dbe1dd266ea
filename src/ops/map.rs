use std::sync::Arc;

use crate::{
  error::RxError,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer},
  scheduler::SchedulerRef,
  subscription::Subscription,
};

type MapFn<T, U> = dyn Fn(T, usize) -> Result<U, RxError> + Send + Sync;

struct MapOp<T, U> {
  source: Observable<T>,
  func: Arc<MapFn<T, U>>,
}

struct MapObserver<T, U> {
  observer: BoxedObserver<U>,
  func: Arc<MapFn<T, U>>,
  index: usize,
  done: bool,
}

impl<T: Send + 'static> Observable<T> {
  /// Emits `f(x)` for every source value `x`.
  pub fn map<U: Send + 'static>(&self, f: impl Fn(T) -> U + Send + Sync + 'static) -> Observable<U> {
    self.try_map_indexed(move |v, _| Ok(f(v)))
  }

  pub fn try_map<U: Send + 'static>(
    &self, f: impl Fn(T) -> Result<U, RxError> + Send + Sync + 'static,
  ) -> Observable<U> {
    self.try_map_indexed(move |v, _| f(v))
  }

  /// Like [`map`](Self::map); `f` also receives the 0-based index of the
  /// value.
  pub fn map_indexed<U: Send + 'static>(
    &self, f: impl Fn(T, usize) -> U + Send + Sync + 'static,
  ) -> Observable<U> {
    self.try_map_indexed(move |v, i| Ok(f(v, i)))
  }

  pub fn try_map_indexed<U: Send + 'static>(
    &self, f: impl Fn(T, usize) -> Result<U, RxError> + Send + Sync + 'static,
  ) -> Observable<U> {
    Observable::new(MapOp { source: self.clone(), func: Arc::new(f) })
  }

  /// Replaces every value with a clone of `value`.
  pub fn map_to<U: Clone + Send + Sync + 'static>(&self, value: U) -> Observable<U> {
    self.map(move |_| value.clone())
  }
}

impl<T: Send + 'static, U: Send + 'static> CoreObservable<U> for MapOp<T, U> {
  fn actual_subscribe(&self, observer: BoxedObserver<U>, scheduler: Option<SchedulerRef>) -> Subscription {
    let observer = MapObserver { observer, func: self.func.clone(), index: 0, done: false };
    self.source.actual_subscribe(Box::new(observer), scheduler)
  }
}

impl<T, U> Observer<T> for MapObserver<T, U> {
  fn next(&mut self, value: T) {
    if self.done {
      return;
    }
    let index = self.index;
    self.index += 1;
    match (self.func)(value, index) {
      Ok(v) => self.observer.next(v),
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
