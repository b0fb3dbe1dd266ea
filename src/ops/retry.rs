//! Recovery and resubscription: `retry`, `repeat` and `catch_with`.
use std::{iter, sync::Arc};

use crate::{
  error::RxError,
  observable::{catch_iter, concat_iter, CoreObservable, Observable},
  observer::{BoxedObserver, Observer, Subscriber},
  scheduler::SchedulerRef,
  subscription::{SerialSubscription, SingleSubscription, Subscription, SubscriptionLike},
};

type HandlerFn<T> = dyn Fn(RxError) -> Result<Observable<T>, RxError> + Send + Sync;

fn attempts<T: Clone>(source: T, count: Option<usize>) -> iter::Take<iter::Repeat<T>> {
  iter::repeat(source).take(count.unwrap_or(usize::MAX))
}

impl<T: Send + 'static> Observable<T> {
  /// Resubscribes after an error, for `count` subscriptions in total
  /// (forever with `None`). Values from failed attempts are kept. Once the
  /// attempts run out, the last error is delivered.
  pub fn retry(&self, count: Option<usize>) -> Observable<T> {
    let source = self.clone();
    catch_iter(move || attempts(source.clone(), count))
  }

  /// Resubscribes after completion, for `count` subscriptions in total
  /// (forever with `None`).
  pub fn repeat(&self, count: Option<usize>) -> Observable<T> {
    let source = self.clone();
    concat_iter(move || attempts(source.clone(), count))
  }

  /// On an error from the source, continues with `handler(err)`.
  pub fn catch_with(&self, handler: impl Fn(RxError) -> Observable<T> + Send + Sync + 'static) -> Observable<T> {
    self.try_catch_with(move |err| Ok(handler(err)))
  }

  pub fn try_catch_with(
    &self, handler: impl Fn(RxError) -> Result<Observable<T>, RxError> + Send + Sync + 'static,
  ) -> Observable<T> {
    Observable::new(CatchOp { source: self.clone(), handler: Arc::new(handler) })
  }
}

struct CatchOp<T> {
  source: Observable<T>,
  handler: Arc<HandlerFn<T>>,
}

struct CatchObserver<T> {
  observer: Subscriber<T>,
  handler: Arc<HandlerFn<T>>,
  serial: SerialSubscription,
  scheduler: Option<SchedulerRef>,
}

impl<T: Send + 'static> CoreObservable<T> for CatchOp<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, scheduler: Option<SchedulerRef>) -> Subscription {
    let observer = Subscriber::from_boxed(observer);
    let serial = SerialSubscription::new();
    let source = SingleSubscription::new();
    serial.set(source.clone().into());
    let catcher = CatchObserver {
      observer: observer.clone(),
      handler: self.handler.clone(),
      serial: serial.clone(),
      scheduler: scheduler.clone(),
    };
    source.set(self.source.subscribe_gated(Box::new(catcher), scheduler));
    Subscription::new(move || {
      observer.unsubscribe();
      serial.unsubscribe();
    })
  }
}

impl<T: Send + 'static> Observer<T> for CatchObserver<T> {
  fn next(&mut self, value: T) { self.observer.next(value) }

  fn error(&mut self, err: RxError) {
    match (self.handler)(err) {
      Ok(fallback) => {
        let subscription = fallback.subscribe_gated(Box::new(self.observer.clone()), self.scheduler.clone());
        self.serial.set(subscription);
      }
      Err(err) => self.observer.error(err),
    }
  }

  fn complete(&mut self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
