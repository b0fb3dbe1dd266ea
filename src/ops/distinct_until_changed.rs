use std::sync::Arc;

use crate::{
  error::RxError,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer},
  scheduler::SchedulerRef,
  subscription::Subscription,
};

type KeyFn<T, K> = dyn Fn(&T) -> Result<K, RxError> + Send + Sync;
type Comparer<K> = dyn Fn(&K, &K) -> Result<bool, RxError> + Send + Sync;

struct DistinctUntilChangedOp<T, K> {
  source: Observable<T>,
  key: Arc<KeyFn<T, K>>,
  comparer: Arc<Comparer<K>>,
}

struct DistinctUntilChangedObserver<T, K> {
  observer: BoxedObserver<T>,
  key: Arc<KeyFn<T, K>>,
  comparer: Arc<Comparer<K>>,
  last: Option<K>,
  done: bool,
}

impl<T: Send + 'static> Observable<T> {
  /// Drops values equal to the one emitted just before them.
  pub fn distinct_until_changed(&self) -> Observable<T>
  where
    T: Clone + PartialEq + Send + Sync,
  {
    self.distinct_until_key_changed(T::clone)
  }

  /// Drops values whose key equals the key of the previous value.
  pub fn distinct_until_key_changed<K>(&self, key: impl Fn(&T) -> K + Send + Sync + 'static) -> Observable<T>
  where
    K: PartialEq + Send + 'static,
  {
    self.try_distinct_until_changed_with(move |v| Ok(key(v)), |a, b| Ok(a == b))
  }

  /// The general form: `comparer` decides whether two consecutive keys are
  /// equal.
  pub fn distinct_until_changed_with<K: Send + 'static>(
    &self, key: impl Fn(&T) -> K + Send + Sync + 'static,
    comparer: impl Fn(&K, &K) -> bool + Send + Sync + 'static,
  ) -> Observable<T> {
    self.try_distinct_until_changed_with(move |v| Ok(key(v)), move |a, b| Ok(comparer(a, b)))
  }

  pub fn try_distinct_until_changed_with<K: Send + 'static>(
    &self, key: impl Fn(&T) -> Result<K, RxError> + Send + Sync + 'static,
    comparer: impl Fn(&K, &K) -> Result<bool, RxError> + Send + Sync + 'static,
  ) -> Observable<T> {
    Observable::new(DistinctUntilChangedOp {
      source: self.clone(),
      key: Arc::new(key),
      comparer: Arc::new(comparer),
    })
  }
}

impl<T: Send + 'static, K: Send + 'static> CoreObservable<T> for DistinctUntilChangedOp<T, K> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let observer = DistinctUntilChangedObserver {
      observer,
      key: self.key.clone(),
      comparer: self.comparer.clone(),
      last: None,
      done: false,
    };
    self.source.actual_subscribe(Box::new(observer), scheduler)
  }
}

impl<T, K: Send> DistinctUntilChangedObserver<T, K> {
  fn changed(&self, value: &T) -> Result<(bool, K), RxError> {
    let key = (self.key)(value)?;
    let changed = match &self.last {
      Some(last) => !(self.comparer)(last, &key)?,
      None => true,
    };
    Ok((changed, key))
  }
}

impl<T, K: Send> Observer<T> for DistinctUntilChangedObserver<T, K> {
  fn next(&mut self, value: T) {
    if self.done {
      return;
    }
    match self.changed(&value) {
      Ok((true, key)) => {
        self.last = Some(key);
        self.observer.next(value);
      }
      Ok((false, _)) => {}
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
