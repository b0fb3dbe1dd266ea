use std::sync::Arc;

use crate::{
  error::RxError,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer},
  scheduler::SchedulerRef,
  subscription::Subscription,
};

type Accumulator<A, T> = dyn Fn(A, T) -> Result<A, RxError> + Send + Sync;

struct ScanOp<T, A> {
  source: Observable<T>,
  seed: Seed<A, T>,
  func: Arc<Accumulator<A, T>>,
}

/// Where the first accumulator value comes from.
enum Seed<A, T> {
  Value(A),
  First(Arc<dyn Fn(T) -> A + Send + Sync>),
}

impl<A: Clone, T> Clone for Seed<A, T> {
  fn clone(&self) -> Self {
    match self {
      Seed::Value(v) => Seed::Value(v.clone()),
      Seed::First(f) => Seed::First(f.clone()),
    }
  }
}

struct ScanObserver<T, A> {
  observer: BoxedObserver<A>,
  func: Arc<Accumulator<A, T>>,
  seed: Option<Seed<A, T>>,
  acc: Option<A>,
  done: bool,
}

impl<T: Send + 'static> Observable<T> {
  /// Emits each intermediate accumulation, starting from `seed`.
  pub fn scan_initial<A>(&self, seed: A, f: impl Fn(A, T) -> A + Send + Sync + 'static) -> Observable<A>
  where
    A: Clone + Send + Sync + 'static,
  {
    self.try_scan_initial(seed, move |acc, v| Ok(f(acc, v)))
  }

  pub fn try_scan_initial<A>(
    &self, seed: A, f: impl Fn(A, T) -> Result<A, RxError> + Send + Sync + 'static,
  ) -> Observable<A>
  where
    A: Clone + Send + Sync + 'static,
  {
    Observable::new(ScanOp { source: self.clone(), seed: Seed::Value(seed), func: Arc::new(f) })
  }

  /// Like [`scan_initial`](Self::scan_initial), but the first value is the
  /// seed and is emitted unchanged.
  pub fn scan(&self, f: impl Fn(T, T) -> T + Send + Sync + 'static) -> Observable<T>
  where
    T: Clone + Sync,
  {
    self.try_scan(move |acc, v| Ok(f(acc, v)))
  }

  pub fn try_scan(&self, f: impl Fn(T, T) -> Result<T, RxError> + Send + Sync + 'static) -> Observable<T>
  where
    T: Clone + Sync,
  {
    Observable::new(ScanOp { source: self.clone(), seed: Seed::First(Arc::new(|v: T| v)), func: Arc::new(f) })
  }
}

impl<T, A> CoreObservable<A> for ScanOp<T, A>
where
  T: Send + 'static,
  A: Clone + Send + Sync + 'static,
{
  fn actual_subscribe(&self, observer: BoxedObserver<A>, scheduler: Option<SchedulerRef>) -> Subscription {
    let observer =
      ScanObserver { observer, func: self.func.clone(), seed: Some(self.seed.clone()), acc: None, done: false };
    self.source.actual_subscribe(Box::new(observer), scheduler)
  }
}

impl<T, A: Clone + Send> Observer<T> for ScanObserver<T, A> {
  fn next(&mut self, value: T) {
    if self.done {
      return;
    }
    let acc = match (self.acc.take(), self.seed.take()) {
      (Some(acc), _) | (None, Some(Seed::Value(acc))) => (self.func)(acc, value),
      (None, Some(Seed::First(first))) => Ok(first(value)),
      (None, None) => return,
    };
    match acc {
      Ok(acc) => {
        self.acc = Some(acc.clone());
        self.observer.next(acc);
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
