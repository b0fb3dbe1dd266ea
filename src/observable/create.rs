use std::{marker::PhantomData, sync::Arc};

use crate::{
  error::RxError,
  observable::{CoreObservable, Observable},
  observer::{BoxedObserver, Observer, Subscriber},
  scheduler::SchedulerRef,
  subscription::Subscription,
};

type Producer<T> =
  dyn Fn(Subscriber<T>, Option<SchedulerRef>) -> Result<Subscription, RxError> + Send + Sync;

/// Observable created from a function.
pub struct CreateOp<T> {
  producer: Arc<Producer<T>>,
  _p: PhantomData<fn() -> T>,
}

/// Lifts `producer` into an observable. The producer runs once per
/// subscription, receives a [`Subscriber`] it may keep and feed from any
/// thread, and returns the subscription that stops it.
///
/// ```
/// use rxkit::prelude::*;
///
/// let source = observable::create(|mut s: Subscriber<i32>, _| {
///   s.next(1);
///   s.next(2);
///   s.complete();
///   Subscription::empty()
/// });
/// source.subscribe_next(|v| println!("{v}"));
/// ```
pub fn create<T, F>(producer: F) -> Observable<T>
where
  T: Send + 'static,
  F: Fn(Subscriber<T>, Option<SchedulerRef>) -> Subscription + Send + Sync + 'static,
{
  try_create(move |s, scheduler| Ok(producer(s, scheduler)))
}

/// Like [`create`], but an `Err` returned by the producer is delivered as an
/// error notification.
pub fn try_create<T, F>(producer: F) -> Observable<T>
where
  T: Send + 'static,
  F: Fn(Subscriber<T>, Option<SchedulerRef>) -> Result<Subscription, RxError>
    + Send
    + Sync
    + 'static,
{
  Observable::new(CreateOp { producer: Arc::new(producer), _p: PhantomData })
}

impl<T: Send + 'static> CoreObservable<T> for CreateOp<T> {
  fn actual_subscribe(
    &self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>,
  ) -> Subscription {
    let subscriber = Subscriber::from_boxed(observer);
    match (self.producer)(subscriber.clone(), scheduler) {
      Ok(subscription) => subscription,
      Err(err) => {
        let mut subscriber = subscriber;
        subscriber.error(err);
        Subscription::empty()
      }
    }
  }
}
