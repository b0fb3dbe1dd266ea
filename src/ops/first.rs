use crate::{
  error::RxError,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer},
  scheduler::SchedulerRef,
  subscription::Subscription,
};

struct FirstOp<T> {
  source: Observable<T>,
  default: Option<T>,
}

struct FirstObserver<T> {
  observer: BoxedObserver<T>,
  default: Option<T>,
  done: bool,
}

struct SingleOp<T> {
  source: Observable<T>,
  default: Option<T>,
}

struct SingleObserver<T> {
  observer: BoxedObserver<T>,
  value: Option<T>,
  default: Option<T>,
  done: bool,
}

impl<T: Send + 'static> Observable<T> {
  /// Emits the first value and completes at once. An empty source errors
  /// with [`RxError::SequenceContainsNoElements`].
  pub fn first(&self) -> Observable<T>
  where
    T: Clone + Sync,
  {
    Observable::new(FirstOp { source: self.clone(), default: None })
  }

  /// Like [`first`](Self::first), but an empty source yields `default`.
  pub fn first_or_default(&self, default: T) -> Observable<T>
  where
    T: Clone + Sync,
  {
    Observable::new(FirstOp { source: self.clone(), default: Some(default) })
  }

  /// Emits the only value of the source when it completes. A second value
  /// errors with [`RxError::SequenceContainsMoreThanOneElement`]; an empty
  /// source with [`RxError::SequenceContainsNoElements`].
  pub fn single(&self) -> Observable<T>
  where
    T: Clone + Sync,
  {
    Observable::new(SingleOp { source: self.clone(), default: None })
  }

  /// Like [`single`](Self::single), but an empty source yields `default`.
  pub fn single_or_default(&self, default: T) -> Observable<T>
  where
    T: Clone + Sync,
  {
    Observable::new(SingleOp { source: self.clone(), default: Some(default) })
  }
}

impl<T: Clone + Send + Sync + 'static> CoreObservable<T> for FirstOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let observer = FirstObserver { observer, default: self.default.clone(), done: false };
    self.source.actual_subscribe(Box::new(observer), scheduler)
  }
}

impl<T: Send> Observer<T> for FirstObserver<T> {
  fn next(&mut self, value: T) {
    if self.done {
      return;
    }
    self.done = true;
    self.observer.next(value);
    self.observer.complete();
  }

  fn error(&mut self, err: RxError) { self.observer.error(err) }

  fn complete(&mut self) {
    match self.default.take() {
      Some(value) => {
        self.observer.next(value);
        self.observer.complete();
      }
      None => self.observer.error(RxError::SequenceContainsNoElements),
    }
  }

  fn is_closed(&self) -> bool { self.done || self.observer.is_closed() }
}

impl<T: Clone + Send + Sync + 'static> CoreObservable<T> for SingleOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let observer = SingleObserver { observer, value: None, default: self.default.clone(), done: false };
    self.source.actual_subscribe(Box::new(observer), scheduler)
  }
}

impl<T: Send> Observer<T> for SingleObserver<T> {
  fn next(&mut self, value: T) {
    if self.done {
      return;
    }
    if self.value.is_some() {
      self.done = true;
      self.value = None;
      self.observer.error(RxError::SequenceContainsMoreThanOneElement);
    } else {
      self.value = Some(value);
    }
  }

  fn error(&mut self, err: RxError) { self.observer.error(err) }

  fn complete(&mut self) {
    match self.value.take().or_else(|| self.default.take()) {
      Some(value) => {
        self.observer.next(value);
        self.observer.complete();
      }
      None => self.observer.error(RxError::SequenceContainsNoElements),
    }
  }

  fn is_closed(&self) -> bool { self.done || self.observer.is_closed() }
}
