use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  error::RxError,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer, Subscriber},
  scheduler::SchedulerRef,
  subscription::{CompositeSubscription, Subscription},
};

struct WithLatestFromOp<T, U> {
  source: Observable<T>,
  others: Vec<Observable<U>>,
}

type Latest<U> = Arc<Mutex<Vec<Option<U>>>>;

struct PrimaryObserver<T, U> {
  observer: Subscriber<(T, Vec<U>)>,
  latest: Latest<U>,
}

struct OtherObserver<T, U> {
  index: usize,
  observer: Subscriber<(T, Vec<U>)>,
  latest: Latest<U>,
}

impl<T: Send + 'static> Observable<T> {
  /// On every value of `self`, emits it together with the latest value of
  /// `other`. Values arriving before `other` has emitted are dropped.
  pub fn with_latest_from<U: Clone + Send + 'static>(&self, other: Observable<U>) -> Observable<(T, U)> {
    self.with_latest_from_all(vec![other]).filter_map(|(value, latest)| latest.into_iter().next().map(|u| (value, u)))
  }

  /// [`with_latest_from`](Self::with_latest_from) over several other
  /// sources; nothing is emitted until each of them has emitted.
  pub fn with_latest_from_all<U: Clone + Send + 'static>(
    &self, others: Vec<Observable<U>>,
  ) -> Observable<(T, Vec<U>)> {
    Observable::new(WithLatestFromOp { source: self.clone(), others })
  }
}

impl<T: Send + 'static, U: Clone + Send + 'static> CoreObservable<(T, Vec<U>)> for WithLatestFromOp<T, U> {
  fn actual_subscribe(
    &self, observer: BoxedObserver<(T, Vec<U>)>, scheduler: Option<SchedulerRef>,
  ) -> Subscription {
    let observer = Subscriber::from_boxed(observer);
    let latest: Latest<U> = Arc::new(Mutex::new(self.others.iter().map(|_| None).collect()));
    let group = CompositeSubscription::new();
    for (index, other) in self.others.iter().enumerate() {
      let input = OtherObserver { index, observer: observer.clone(), latest: latest.clone() };
      group.add(other.subscribe_gated(Box::new(input), scheduler.clone()));
    }
    group.add(self.source.subscribe_gated(Box::new(PrimaryObserver { observer, latest }), scheduler));
    group.into()
  }
}

impl<T: Send + 'static, U: Clone + Send + 'static> Observer<T> for PrimaryObserver<T, U> {
  fn next(&mut self, value: T) {
    let row: Option<Vec<U>> = self.latest.lock().iter().cloned().collect();
    if let Some(row) = row {
      self.observer.next((value, row));
    }
  }

  fn error(&mut self, err: RxError) { self.observer.error(err) }

  fn complete(&mut self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<T: Send + 'static, U: Send + 'static> Observer<U> for OtherObserver<T, U> {
  fn next(&mut self, value: U) { self.latest.lock()[self.index] = Some(value); }

  fn error(&mut self, err: RxError) { self.observer.error(err) }

  fn complete(&mut self) {}

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
