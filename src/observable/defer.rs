use std::sync::Arc;

use crate::{
  error::RxError,
  observable::{throw, CoreObservable, Observable},
  observer::BoxedObserver,
  scheduler::SchedulerRef,
  subscription::Subscription,
};

type Factory<T> = dyn Fn() -> Result<Observable<T>, RxError> + Send + Sync;

struct DeferOp<T>(Arc<Factory<T>>);

/// Calls `factory` on every subscription and subscribes to what it returns.
pub fn defer<T, F>(factory: F) -> Observable<T>
where
  T: Send + 'static,
  F: Fn() -> Observable<T> + Send + Sync + 'static,
{
  try_defer(move || Ok(factory()))
}

/// Like [`defer`]; an `Err` from `factory` is delivered as the error of the
/// subscription.
pub fn try_defer<T, F>(factory: F) -> Observable<T>
where
  T: Send + 'static,
  F: Fn() -> Result<Observable<T>, RxError> + Send + Sync + 'static,
{
  Observable::new(DeferOp(Arc::new(factory)))
}

impl<T: Send + 'static> CoreObservable<T> for DeferOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let source = (self.0)().unwrap_or_else(|err| throw(err));
    source.actual_subscribe(observer, scheduler)
  }
}
