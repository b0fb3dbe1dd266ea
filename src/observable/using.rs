use std::sync::Arc;

use crate::{
  error::RxError,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer},
  scheduler::SchedulerRef,
  subscription::{Subscription, SubscriptionLike},
};

struct UsingOp<R, T> {
  resource: Arc<dyn Fn() -> R + Send + Sync>,
  factory: Arc<dyn Fn(&R) -> Observable<T> + Send + Sync>,
}

struct UsingObserver<T> {
  observer: BoxedObserver<T>,
  resource: Subscription,
}

/// Acquires a resource per subscription and builds the source from it. The
/// resource is released when the source terminates or the subscription is
/// released, whichever comes first.
pub fn using<R, T>(
  resource: impl Fn() -> R + Send + Sync + 'static,
  factory: impl Fn(&R) -> Observable<T> + Send + Sync + 'static,
) -> Observable<T>
where
  R: SubscriptionLike + 'static,
  T: Send + 'static,
{
  Observable::new(UsingOp { resource: Arc::new(resource), factory: Arc::new(factory) })
}

impl<R, T> CoreObservable<T> for UsingOp<R, T>
where
  R: SubscriptionLike + 'static,
  T: Send + 'static,
{
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let acquired = (self.resource)();
    let source = (self.factory)(&acquired);
    let resource = Subscription::from_like(acquired);
    let upstream = source.actual_subscribe(
      Box::new(UsingObserver { observer, resource: resource.clone() }),
      scheduler,
    );
    Subscription::new(move || {
      upstream.unsubscribe();
      resource.unsubscribe();
    })
  }
}

impl<T: Send + 'static> Observer<T> for UsingObserver<T> {
  fn next(&mut self, value: T) { self.observer.next(value) }

  fn error(&mut self, err: RxError) {
    self.observer.error(err);
    self.resource.unsubscribe();
  }

  fn complete(&mut self) {
    self.observer.complete();
    self.resource.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
