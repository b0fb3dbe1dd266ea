use crate::{
  error::RxError,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer},
  scheduler::SchedulerRef,
  subscription::Subscription,
};

struct PairwiseOp<T> {
  source: Observable<T>,
}

struct PairwiseObserver<T> {
  observer: BoxedObserver<(T, T)>,
  previous: Option<T>,
}

impl<T: Clone + Send + 'static> Observable<T> {
  /// Emits `(previous, current)` for every value after the first.
  pub fn pairwise(&self) -> Observable<(T, T)> { Observable::new(PairwiseOp { source: self.clone() }) }
}

impl<T: Clone + Send + 'static> CoreObservable<(T, T)> for PairwiseOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<(T, T)>, scheduler: Option<SchedulerRef>) -> Subscription {
    self.source.actual_subscribe(Box::new(PairwiseObserver { observer, previous: None }), scheduler)
  }
}

impl<T: Clone + Send> Observer<T> for PairwiseObserver<T> {
  fn next(&mut self, value: T) {
    if let Some(previous) = self.previous.replace(value.clone()) {
      self.observer.next((previous, value));
    }
  }

  fn error(&mut self, err: RxError) { self.observer.error(err) }

  fn complete(&mut self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
