use crate::{
  error::RxError,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer},
  scheduler::SchedulerRef,
  subscription::Subscription,
};

struct LastOp<T> {
  source: Observable<T>,
  default: Option<T>,
}

struct LastObserver<T> {
  observer: BoxedObserver<T>,
  last: Option<T>,
  default: Option<T>,
}

struct DefaultIfEmptyOp<T> {
  source: Observable<T>,
  default: T,
}

struct DefaultIfEmptyObserver<T> {
  observer: BoxedObserver<T>,
  default: Option<T>,
}

impl<T: Send + 'static> Observable<T> {
  /// Emits only the last value, on completion. An empty source errors with
  /// [`RxError::SequenceContainsNoElements`].
  pub fn last(&self) -> Observable<T>
  where
    T: Clone + Sync,
  {
    self.last_or(None)
  }

  /// Like [`last`](Self::last), but an empty source yields `default`.
  pub fn last_or_default(&self, default: T) -> Observable<T>
  where
    T: Clone + Sync,
  {
    self.last_or(Some(default))
  }

  pub(crate) fn last_or(&self, default: Option<T>) -> Observable<T>
  where
    T: Clone + Sync,
  {
    Observable::new(LastOp { source: self.clone(), default })
  }

  /// Emits `default` if the source completes without emitting.
  pub fn default_if_empty(&self, default: T) -> Observable<T>
  where
    T: Clone + Sync,
  {
    Observable::new(DefaultIfEmptyOp { source: self.clone(), default })
  }

  /// Drops every value; only the terminal notification goes through.
  pub fn ignore_elements(&self) -> Observable<T> { self.filter(|_| false) }
}

impl<T: Clone + Send + Sync + 'static> CoreObservable<T> for LastOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let observer = LastObserver { observer, last: None, default: self.default.clone() };
    self.source.actual_subscribe(Box::new(observer), scheduler)
  }
}

impl<T: Send> Observer<T> for LastObserver<T> {
  fn next(&mut self, value: T) { self.last = Some(value); }

  fn error(&mut self, err: RxError) { self.observer.error(err) }

  fn complete(&mut self) {
    match self.last.take().or_else(|| self.default.take()) {
      Some(value) => {
        self.observer.next(value);
        self.observer.complete();
      }
      None => self.observer.error(RxError::SequenceContainsNoElements),
    }
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<T: Clone + Send + Sync + 'static> CoreObservable<T> for DefaultIfEmptyOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let observer = DefaultIfEmptyObserver { observer, default: Some(self.default.clone()) };
    self.source.actual_subscribe(Box::new(observer), scheduler)
  }
}

impl<T: Send> Observer<T> for DefaultIfEmptyObserver<T> {
  fn next(&mut self, value: T) {
    self.default = None;
    self.observer.next(value);
  }

  fn error(&mut self, err: RxError) { self.observer.error(err) }

  fn complete(&mut self) {
    if let Some(value) = self.default.take() {
      self.observer.next(value);
    }
    self.observer.complete();
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
