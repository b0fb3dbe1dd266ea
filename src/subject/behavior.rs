use std::sync::Arc;

use parking_lot::Mutex;

use super::{warn_disposed, SubjectCore};
use crate::{
  error::RxError,
  notification::Notification,
  observable::{CoreObservable, Observable, SubjectLike},
  observer::{BoxedObserver, Observer},
  scheduler::SchedulerRef,
  subscription::Subscription,
};

/// A subject holding a current value. A new subscriber gets that value
/// first. Once terminated, late subscribers only get the terminal
/// notification.
pub struct BehaviorSubject<T> {
  core: Arc<SubjectCore<T>>,
  value: Arc<Mutex<Option<T>>>,
}

impl<T> Clone for BehaviorSubject<T> {
  fn clone(&self) -> Self { BehaviorSubject { core: self.core.clone(), value: self.value.clone() } }
}

impl<T: Clone + Send + Sync + 'static> BehaviorSubject<T> {
  pub fn new(value: T) -> Self {
    BehaviorSubject { core: Arc::default(), value: Arc::new(Mutex::new(Some(value))) }
  }

  /// The current value.
  pub fn value(&self) -> Result<T, RxError> { self.value.lock().clone().ok_or(RxError::Disposed) }

  pub fn try_next(&self, value: T) -> Result<(), RxError> { self.push(Notification::Next(value)) }

  pub fn try_error(&self, err: RxError) -> Result<(), RxError> { self.push(Notification::Error(err)) }

  pub fn try_complete(&self) -> Result<(), RxError> { self.push(Notification::Complete) }

  fn push(&self, item: Notification<T>) -> Result<(), RxError> {
    self.core.serialize(item, |item| {
      if let Notification::Next(value) = &item {
        if !self.core.is_stopped() {
          *self.value.lock() = Some(value.clone());
        }
      }
      self.core.publish(item);
    })
  }

  pub fn try_subscribe(&self, observer: impl Observer<T> + 'static) -> Result<Subscription, RxError> {
    self.subscribe_core(Box::new(observer)).map_err(|_| RxError::Disposed)
  }

  fn subscribe_core(&self, observer: BoxedObserver<T>) -> Result<Subscription, BoxedObserver<T>> {
    let value = self.value.clone();
    self.core.subscribe(observer, move |subscriber, terminal| {
      if terminal.is_none() {
        let current = value.lock().clone();
        if let Some(current) = current {
          subscriber.next(current);
        }
      }
    })
  }

  /// Drops every subscriber and the held value.
  pub fn dispose(&self) {
    self.core.dispose();
    self.value.lock().take();
  }

  pub fn is_disposed(&self) -> bool { self.core.is_disposed() }

  pub fn observer_count(&self) -> usize { self.core.observer_count() }

  pub fn as_observable(&self) -> Observable<T> { Observable::new(self.clone()) }
}

impl<T: Clone + Send + Sync + 'static> Observer<T> for BehaviorSubject<T> {
  fn next(&mut self, value: T) { warn_disposed(self.try_next(value)) }

  fn error(&mut self, err: RxError) { warn_disposed(self.try_error(err)) }

  fn complete(&mut self) { warn_disposed(self.try_complete()) }

  fn is_closed(&self) -> bool { self.core.is_stopped() || self.core.is_disposed() }
}

impl<T: Clone + Send + Sync + 'static> CoreObservable<T> for BehaviorSubject<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, _: Option<SchedulerRef>) -> Subscription {
    self.subscribe_core(observer).unwrap_or_else(|mut observer| {
      observer.error(RxError::Disposed);
      Subscription::empty()
    })
  }
}

impl<T: Clone + Send + Sync + 'static> SubjectLike<T> for BehaviorSubject<T> {
  fn as_observer(&self) -> BoxedObserver<T> { Box::new(self.clone()) }

  fn as_observable(&self) -> Observable<T> { BehaviorSubject::as_observable(self) }
}
