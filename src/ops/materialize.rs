use crate::{
  error::RxError,
  notification::Notification,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer},
  scheduler::SchedulerRef,
  subscription::Subscription,
};

struct MaterializeOp<T> {
  source: Observable<T>,
}

struct MaterializeObserver<T> {
  observer: BoxedObserver<Notification<T>>,
}

struct DematerializeOp<T> {
  source: Observable<Notification<T>>,
}

struct DematerializeObserver<T> {
  observer: BoxedObserver<T>,
}

impl<T: Send + 'static> Observable<T> {
  /// Turns every notification, terminal ones included, into a value. The
  /// output completes right after the source terminates.
  pub fn materialize(&self) -> Observable<Notification<T>> {
    Observable::new(MaterializeOp { source: self.clone() })
  }
}

impl<T: Send + 'static> Observable<Notification<T>> {
  /// The inverse of [`materialize`](Observable::materialize).
  pub fn dematerialize(&self) -> Observable<T> { Observable::new(DematerializeOp { source: self.clone() }) }
}

impl<T: Send + 'static> CoreObservable<Notification<T>> for MaterializeOp<T> {
  fn actual_subscribe(
    &self, observer: BoxedObserver<Notification<T>>, scheduler: Option<SchedulerRef>,
  ) -> Subscription {
    self.source.actual_subscribe(Box::new(MaterializeObserver { observer }), scheduler)
  }
}

impl<T> Observer<T> for MaterializeObserver<T> {
  fn next(&mut self, value: T) { self.observer.next(Notification::Next(value)) }

  fn error(&mut self, err: RxError) {
    self.observer.next(Notification::Error(err));
    self.observer.complete();
  }

  fn complete(&mut self) {
    self.observer.next(Notification::Complete);
    self.observer.complete();
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<T: Send + 'static> CoreObservable<T> for DematerializeOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    self.source.actual_subscribe(Box::new(DematerializeObserver { observer }), scheduler)
  }
}

impl<T> Observer<Notification<T>> for DematerializeObserver<T> {
  fn next(&mut self, value: Notification<T>) { value.accept(&mut self.observer) }

  fn error(&mut self, err: RxError) { self.observer.error(err) }

  fn complete(&mut self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
