use std::sync::Arc;

use parking_lot::Mutex;

use super::{warn_disposed, SubjectCore, Terminal};
use crate::{
  error::RxError,
  notification::Notification,
  observable::{CoreObservable, Observable, SubjectLike},
  observer::{BoxedObserver, Observer},
  scheduler::SchedulerRef,
  subscription::Subscription,
};

/// Emits only the last value pushed into it, and only once it completes.
/// An error is forwarded alone.
pub struct AsyncSubject<T> {
  core: Arc<SubjectCore<T>>,
  last: Arc<Mutex<Option<T>>>,
}

impl<T> Clone for AsyncSubject<T> {
  fn clone(&self) -> Self { AsyncSubject { core: self.core.clone(), last: self.last.clone() } }
}

impl<T> Default for AsyncSubject<T> {
  fn default() -> Self { AsyncSubject { core: Arc::default(), last: Arc::default() } }
}

impl<T: Clone + Send + Sync + 'static> AsyncSubject<T> {
  pub fn new() -> Self { Self::default() }

  pub fn try_next(&self, value: T) -> Result<(), RxError> { self.push(Notification::Next(value)) }

  pub fn try_error(&self, err: RxError) -> Result<(), RxError> { self.push(Notification::Error(err)) }

  pub fn try_complete(&self) -> Result<(), RxError> { self.push(Notification::Complete) }

  fn push(&self, item: Notification<T>) -> Result<(), RxError> {
    self.core.serialize(item, |item| match Terminal::from_notification(item) {
      Err(value) => {
        if !self.core.is_stopped() {
          *self.last.lock() = Some(value);
        }
      }
      Ok(terminal) => {
        let targets = match self.core.terminate(&terminal) {
          Ok(Some(targets)) => targets,
          _ => return,
        };
        if terminal == Terminal::Complete {
          let last = self.last.lock().clone();
          if let Some(last) = last {
            SubjectCore::broadcast(targets.clone(), last);
          }
        }
        SubjectCore::deliver_terminal(targets, &terminal);
      }
    })
  }

  pub fn try_subscribe(&self, observer: impl Observer<T> + 'static) -> Result<Subscription, RxError> {
    self.subscribe_core(Box::new(observer)).map_err(|_| RxError::Disposed)
  }

  fn subscribe_core(&self, observer: BoxedObserver<T>) -> Result<Subscription, BoxedObserver<T>> {
    let last = self.last.clone();
    self.core.subscribe(observer, move |subscriber, terminal| {
      if terminal == Some(&Terminal::Complete) {
        let last = last.lock().clone();
        if let Some(last) = last {
          subscriber.next(last);
        }
      }
    })
  }

  pub fn dispose(&self) {
    self.core.dispose();
    self.last.lock().take();
  }

  pub fn is_disposed(&self) -> bool { self.core.is_disposed() }

  pub fn observer_count(&self) -> usize { self.core.observer_count() }

  pub fn as_observable(&self) -> Observable<T> { Observable::new(self.clone()) }
}

impl<T: Clone + Send + Sync + 'static> Observer<T> for AsyncSubject<T> {
  fn next(&mut self, value: T) { warn_disposed(self.try_next(value)) }

  fn error(&mut self, err: RxError) { warn_disposed(self.try_error(err)) }

  fn complete(&mut self) { warn_disposed(self.try_complete()) }

  fn is_closed(&self) -> bool { self.core.is_stopped() || self.core.is_disposed() }
}

impl<T: Clone + Send + Sync + 'static> CoreObservable<T> for AsyncSubject<T> {
  fn actual_subscribe(&self, observer: BoxedObserver<T>, _: Option<SchedulerRef>) -> Subscription {
    self.subscribe_core(observer).unwrap_or_else(|mut observer| {
      observer.error(RxError::Disposed);
      Subscription::empty()
    })
  }
}

impl<T: Clone + Send + Sync + 'static> SubjectLike<T> for AsyncSubject<T> {
  fn as_observer(&self) -> BoxedObserver<T> { Box::new(self.clone()) }

  fn as_observable(&self) -> Observable<T> { AsyncSubject::as_observable(self) }
}
