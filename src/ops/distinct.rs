use std::{collections::HashSet, hash::Hash, sync::Arc};

use crate::{
  error::RxError,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer},
  scheduler::SchedulerRef,
  subscription::Subscription,
};

type KeyFn<T, K> = dyn Fn(&T) -> Result<K, RxError> + Send + Sync;

struct DistinctOp<T, K> {
  source: Observable<T>,
  key: Arc<KeyFn<T, K>>,
}

struct DistinctObserver<T, K> {
  observer: BoxedObserver<T>,
  key: Arc<KeyFn<T, K>>,
  seen: HashSet<K>,
  done: bool,
}

impl<T: Send + 'static> Observable<T> {
  /// Emits only the values not seen before.
  pub fn distinct(&self) -> Observable<T>
  where
    T: Clone + Eq + Hash + Sync,
  {
    self.distinct_by_key(T::clone)
  }

  /// Emits only the values whose key was not seen before.
  pub fn distinct_by_key<K>(&self, key: impl Fn(&T) -> K + Send + Sync + 'static) -> Observable<T>
  where
    K: Eq + Hash + Send + 'static,
  {
    self.try_distinct_by_key(move |v| Ok(key(v)))
  }

  pub fn try_distinct_by_key<K>(
    &self, key: impl Fn(&T) -> Result<K, RxError> + Send + Sync + 'static,
  ) -> Observable<T>
  where
    K: Eq + Hash + Send + 'static,
  {
    Observable::new(DistinctOp { source: self.clone(), key: Arc::new(key) })
  }
}

impl<T: Send + 'static, K: Eq + Hash + Send + 'static> CoreObservable<T> for DistinctOp<T, K> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let observer = DistinctObserver { observer, key: self.key.clone(), seen: HashSet::new(), done: false };
    self.source.actual_subscribe(Box::new(observer), scheduler)
  }
}

impl<T, K: Eq + Hash + Send> Observer<T> for DistinctObserver<T, K> {
  fn next(&mut self, value: T) {
    if self.done {
      return;
    }
    match (self.key)(&value) {
      Ok(key) => {
        if self.seen.insert(key) {
          self.observer.next(value);
        }
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
